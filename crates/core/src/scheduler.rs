use std::time::Duration;

use barrage_protocol::{LaneOccupant, LaneState};
use rand::Rng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::lanes::LaneRegistry;
use crate::occupancy;

/// Admission algorithm: picks the lane a new bullet enters.
///
/// Policy, in order:
/// 1. A uniformly random idle lane.
/// 2. After reconciling lanes the host reports as empty, a random one of
///    those.
/// 3. The least-weighted lane that is not in cooldown. Ties go to the lane
///    holding the earliest-admitted live bullet, then to the lowest index.
/// 4. Nothing: the caller queues the bullet.
///
/// Whatever lane is returned has been marked `JustAssigned`.
#[derive(Debug)]
pub struct TrackScheduler {
    cooldown: Duration,
    rng: SmallRng,
}

impl TrackScheduler {
    pub fn new(cooldown: Duration, rng: SmallRng) -> Self {
        Self { cooldown, rng }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Choose and claim a lane. `occupants` must list live bullets in
    /// admission order.
    pub fn choose_lane(
        &mut self,
        registry: &mut LaneRegistry,
        occupants: &[LaneOccupant],
        now: Duration,
    ) -> Option<usize> {
        let lane = self
            .pick_idle(&registry.idle_lanes())
            .or_else(|| {
                let weights = occupancy::compute_weights(occupants, registry.len());
                let freed = occupancy::reconcile(registry, &weights);
                self.pick_idle(&freed)
                    .or_else(|| least_loaded(registry, &weights, occupants))
            })?;

        registry.mark_just_assigned(lane, now + self.cooldown);
        debug!(lane, "lane chosen");
        Some(lane)
    }

    /// Claim a specific lane if it exists and is not in cooldown.
    pub fn claim(&self, registry: &mut LaneRegistry, lane: usize, now: Duration) -> bool {
        match registry.state(lane) {
            Some(LaneState::Idle | LaneState::Occupied) => {
                registry.mark_just_assigned(lane, now + self.cooldown);
                true
            }
            Some(LaneState::JustAssigned) | None => false,
        }
    }

    fn pick_idle(&mut self, idle: &[usize]) -> Option<usize> {
        if idle.is_empty() {
            None
        } else {
            Some(idle[self.rng.random_range(0..idle.len())])
        }
    }
}

/// Minimum-weight lane outside cooldown, with the documented tiebreak.
fn least_loaded(
    registry: &LaneRegistry,
    weights: &[f64],
    occupants: &[LaneOccupant],
) -> Option<usize> {
    let eligible = |lane: &usize| registry.state(*lane) != Some(LaneState::JustAssigned);

    let min = (0..weights.len())
        .filter(eligible)
        .map(|lane| weights[lane])
        .min_by(f64::total_cmp)?;

    let candidates: Vec<usize> = (0..weights.len())
        .filter(eligible)
        .filter(|&lane| weights[lane] == min)
        .collect();

    occupants
        .iter()
        .map(|occ| occ.lane)
        .find(|lane| candidates.contains(lane))
        .or_else(|| candidates.first().copied())
}
