pub mod commands;
pub mod options;
pub mod timing;
pub mod types;

pub use commands::{HostCommand, ScreenEvent};
pub use options::{COOLDOWN_FACTOR, ItemConfig, ItemOverrides, Options};
pub use timing::{Direction, Easing, LoopCount, Progress, Timing, travel_offset};
pub use types::{ItemId, LaneOccupant, LaneState, PlayState, SurfaceSize};
