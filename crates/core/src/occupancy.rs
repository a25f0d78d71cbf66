//! Per-lane crowding estimate, computed from a host occupancy snapshot.

use barrage_protocol::{LaneOccupant, LaneState};
use tracing::trace;

use crate::lanes::LaneRegistry;

/// Sum the rendered widths of `occupants` per lane.
///
/// Occupants outside `0..lane_count` are ignored; negative or non-finite
/// widths count as zero, so every weight is finite and non-negative.
pub fn compute_weights(occupants: &[LaneOccupant], lane_count: usize) -> Vec<f64> {
    let mut weights = vec![0.0; lane_count];
    for occ in occupants {
        if let Some(w) = weights.get_mut(occ.lane)
            && occ.width.is_finite()
            && occ.width > 0.0
        {
            *w += occ.width;
        }
    }
    weights
}

/// Reclassify `Occupied` lanes with zero weight as idle. Returns the lanes
/// that changed.
///
/// `JustAssigned` lanes are left alone: their bullet may not have been laid
/// out yet, and freeing them would allow a second admission inside the
/// cooldown window.
pub fn reconcile(registry: &mut LaneRegistry, weights: &[f64]) -> Vec<usize> {
    let freed: Vec<usize> = weights
        .iter()
        .enumerate()
        .filter(|&(lane, &w)| w == 0.0 && registry.state(lane) == Some(LaneState::Occupied))
        .map(|(lane, _)| lane)
        .collect();

    for &lane in &freed {
        registry.mark_idle(lane);
    }
    if !freed.is_empty() {
        trace!(lanes = ?freed, "reconciled empty lanes to idle");
    }
    freed
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use barrage_protocol::ItemId;

    use super::*;

    fn occ(id: u64, lane: usize, width: f64) -> LaneOccupant {
        LaneOccupant::new(ItemId(id), lane, width)
    }

    #[test]
    fn sums_widths_per_lane() {
        let weights = compute_weights(
            &[occ(1, 0, 30.0), occ(2, 2, 10.0), occ(3, 0, 5.5), occ(4, 9, 100.0)],
            3,
        );
        assert_eq!(weights, vec![35.5, 0.0, 10.0]);
    }

    #[test]
    fn bad_widths_do_not_go_negative() {
        let weights = compute_weights(&[occ(1, 0, -4.0), occ(2, 0, f64::NAN), occ(3, 1, 2.0)], 2);
        assert_eq!(weights, vec![0.0, 2.0]);
    }

    #[test]
    fn reconcile_frees_only_occupied_lanes() {
        let mut reg = LaneRegistry::new(3);
        reg.mark_just_assigned(0, Duration::ZERO);
        reg.mark_just_assigned(1, Duration::ZERO);
        reg.mark_just_assigned(2, Duration::from_secs(10));
        reg.expire(Duration::ZERO);
        // 0 and 1 occupied, 2 still just-assigned; none hold anything.
        let freed = reconcile(&mut reg, &[0.0, 12.0, 0.0]);
        assert_eq!(freed, vec![0]);
        assert_eq!(
            reg.snapshot(),
            &[LaneState::Idle, LaneState::Occupied, LaneState::JustAssigned]
        );
    }
}
