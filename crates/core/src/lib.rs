//! Lane allocation and admission scheduling for bullet screens.
//!
//! A [`BulletScreen`] spreads a stream of horizontally moving bullets over
//! `floor(height / lane_height)` lanes so that bullets on screen together do
//! not overlap. Rendering is left to a [`Host`], which receives
//! [`HostCommand`](barrage_protocol::HostCommand)s and reports back when a
//! bullet is fully visible and when its transit ends.
//!
//! ```text
//!   push ──▶ TrackScheduler ──lane──▶ admit ──Render──▶ Host
//!               │   ▲                                     │
//!            none   └── LaneRegistry / occupancy ◀────────┤ notify_visible
//!               ▼                                         │ notify_completed
//!          PendingQueue ◀──── drain on visible / arrival ─┘
//! ```

pub mod clock;
pub mod error;
pub mod host;
pub mod lanes;
pub mod occupancy;
pub mod queue;
pub mod scheduler;
pub mod screen;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{ConfigError, MAX_LANES};
pub use host::{BufferedHost, Host};
pub use lanes::LaneRegistry;
pub use queue::{PendingItem, PendingQueue};
pub use scheduler::TrackScheduler;
pub use screen::{BulletScreen, ItemState};
