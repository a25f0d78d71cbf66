use serde::{Deserialize, Serialize};

use crate::options::ItemConfig;
use crate::types::{ItemId, PlayState};

/// A single instruction from the scheduler to the host.
///
/// The core emits these in order; each one carries everything the host needs,
/// so hosts can apply them one by one or ship them across a boundary as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostCommand<C> {
    /// Start displaying a bullet in `lane` at vertical offset `top`. Bullets
    /// always start running; the screen queues arrivals while paused.
    #[serde(rename_all = "camelCase")]
    Render {
        id: ItemId,
        lane: usize,
        top: f64,
        config: ItemConfig,
        hidden: bool,
        content: C,
    },

    /// Tear down a bullet's visual element.
    Remove { id: ItemId },

    /// Pause or resume a bullet's transit.
    SetPlayState { id: ItemId, state: PlayState },

    /// Toggle a bullet's visibility. Scheduling is unaffected.
    SetHidden { id: ItemId, hidden: bool },
}

impl<C> HostCommand<C> {
    /// The bullet this command targets.
    pub fn id(&self) -> ItemId {
        match self {
            Self::Render { id, .. }
            | Self::Remove { id }
            | Self::SetPlayState { id, .. }
            | Self::SetHidden { id, .. } => *id,
        }
    }
}

/// Lifecycle notifications for the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScreenEvent {
    /// No lane was available (or the screen is paused); the bullet waits.
    Queued { id: ItemId },
    /// The bullet was admitted into `lane` and rendered.
    Started { id: ItemId, lane: usize },
    /// The bullet finished its transit, was cleared, or stalled out.
    Ended { id: ItemId },
}
