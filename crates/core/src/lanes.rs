use std::time::Duration;

use barrage_protocol::LaneState;
use tracing::trace;

/// A deferred `JustAssigned -> Occupied` demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cooldown {
    lane: usize,
    due: Duration,
    generation: u64,
}

/// State of every lane plus the pending cooldown demotions.
///
/// Cooldowns are stamped with the registry generation at the time they were
/// scheduled. `reset_all` bumps the generation, so a cooldown scheduled before
/// a reset can never demote a lane of the new layout.
#[derive(Debug, Clone, Default)]
pub struct LaneRegistry {
    states: Vec<LaneState>,
    cooldowns: Vec<Cooldown>,
    generation: u64,
}

impl LaneRegistry {
    /// `count` lanes, all idle.
    pub fn new(count: usize) -> Self {
        Self {
            states: vec![LaneState::Idle; count],
            cooldowns: Vec::new(),
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Lane states, index-aligned.
    pub fn snapshot(&self) -> &[LaneState] {
        &self.states
    }

    pub fn state(&self, lane: usize) -> Option<LaneState> {
        self.states.get(lane).copied()
    }

    /// Indices of all idle lanes, ascending.
    pub fn idle_lanes(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, st)| **st == LaneState::Idle)
            .map(|(i, _)| i)
            .collect()
    }

    /// Current reset generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Block `lane` from reuse until `due`.
    pub fn mark_just_assigned(&mut self, lane: usize, due: Duration) {
        let Some(st) = self.states.get_mut(lane) else {
            return;
        };
        *st = LaneState::JustAssigned;
        self.cooldowns.push(Cooldown {
            lane,
            due,
            generation: self.generation,
        });
    }

    pub fn mark_idle(&mut self, lane: usize) {
        if let Some(st) = self.states.get_mut(lane) {
            *st = LaneState::Idle;
        }
    }

    /// Replace the layout with `count` idle lanes and cancel every pending
    /// cooldown.
    pub fn reset_all(&mut self, count: usize) {
        self.generation += 1;
        self.states = vec![LaneState::Idle; count];
        self.cooldowns.clear();
    }

    /// Fire every cooldown due at or before `now`. Returns the lanes that were
    /// demoted to `Occupied`.
    pub fn expire(&mut self, now: Duration) -> Vec<usize> {
        let generation = self.generation;
        let mut demoted = Vec::new();
        let states = &mut self.states;

        self.cooldowns.retain(|cd| {
            if cd.due > now {
                return true;
            }
            if cd.generation != generation {
                return false;
            }
            if let Some(st) = states.get_mut(cd.lane)
                && *st == LaneState::JustAssigned
            {
                *st = LaneState::Occupied;
                demoted.push(cd.lane);
            }
            false
        });

        if !demoted.is_empty() {
            trace!(lanes = ?demoted, "cooldown expired");
        }
        demoted
    }

    /// Earliest pending cooldown deadline, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.cooldowns.iter().map(|cd| cd.due).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn starts_idle() {
        for n in 1..8 {
            let reg = LaneRegistry::new(n);
            assert_eq!(reg.len(), n);
            assert!(reg.snapshot().iter().all(|s| *s == LaneState::Idle));
            assert_eq!(reg.idle_lanes(), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn cooldown_demotes_after_due() {
        let mut reg = LaneRegistry::new(2);
        reg.mark_just_assigned(1, 100 * MS);
        assert_eq!(reg.state(1), Some(LaneState::JustAssigned));
        assert_eq!(reg.next_due(), Some(100 * MS));

        assert!(reg.expire(99 * MS).is_empty());
        assert_eq!(reg.expire(100 * MS), vec![1]);
        assert_eq!(reg.state(1), Some(LaneState::Occupied));
        assert_eq!(reg.next_due(), None);
    }

    #[test]
    fn reset_cancels_stale_cooldowns() {
        let mut reg = LaneRegistry::new(3);
        reg.mark_just_assigned(0, 10 * MS);
        reg.reset_all(3);
        assert_eq!(reg.generation(), 1);

        // Same index assigned in the new generation; the old cooldown must not
        // have survived to demote it early.
        reg.mark_just_assigned(0, 500 * MS);
        assert!(reg.expire(20 * MS).is_empty());
        assert_eq!(reg.state(0), Some(LaneState::JustAssigned));
    }

    #[test]
    fn expiry_skips_lanes_no_longer_just_assigned() {
        let mut reg = LaneRegistry::new(1);
        reg.mark_just_assigned(0, 10 * MS);
        reg.mark_idle(0);
        assert!(reg.expire(10 * MS).is_empty());
        assert_eq!(reg.state(0), Some(LaneState::Idle));
    }

    #[test]
    fn out_of_range_marks_are_ignored() {
        let mut reg = LaneRegistry::new(1);
        reg.mark_just_assigned(5, MS);
        reg.mark_idle(5);
        assert_eq!(reg.next_due(), None);
        assert_eq!(reg.snapshot(), &[LaneState::Idle]);
    }
}
