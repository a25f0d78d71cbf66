use serde::{Deserialize, Serialize};

/// Identifier of one bullet. Doubles as the host-side handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dimensions of the surface bullets fly across, in host units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Occupancy state of a single lane.
///
/// ```text
///   Idle ──admit──▶ JustAssigned ──cooldown──▶ Occupied
///    ▲                                           │
///    └────────── zero weight observed ───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneState {
    /// Nothing in the lane. Preferred admission target.
    #[default]
    Idle,
    /// Holds content but may take another bullet.
    Occupied,
    /// Received a bullet within the cooldown window. Blocked from reuse.
    JustAssigned,
}

/// Animation play state of a rendered bullet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayState {
    Running,
    Paused,
}

impl PlayState {
    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }
}

/// One entry of a host occupancy report: a displayed item, its lane and its
/// rendered width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneOccupant {
    pub id: ItemId,
    pub lane: usize,
    pub width: f64,
}

impl LaneOccupant {
    pub fn new(id: ItemId, lane: usize, width: f64) -> Self {
        Self { id, lane, width }
    }
}
