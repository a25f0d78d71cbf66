//! Property tests: random interleavings of arrivals, host signals and time
//! never break the lane invariants.

use std::collections::HashSet;
use std::time::Duration;

use barrage_core::{BufferedHost, BulletScreen, ManualClock};
use barrage_protocol::{HostCommand, ItemId, LaneState, Options, ScreenEvent, SurfaceSize};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push,
    Visible(usize),
    Complete(usize),
    Width(usize, u16),
    Advance(u16),
    PauseAll,
    ResumeAll,
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => Just(Op::Push),
        3 => any::<usize>().prop_map(Op::Visible),
        2 => any::<usize>().prop_map(Op::Complete),
        3 => (any::<usize>(), 0u16..200).prop_map(|(i, w)| Op::Width(i, w)),
        3 => (0u16..900).prop_map(Op::Advance),
        1 => Just(Op::PauseAll),
        1 => Just(Op::ResumeAll),
        1 => Just(Op::Clear),
    ]
}

type Screen = BulletScreen<BufferedHost<u32>, ManualClock>;

fn build(lanes: usize, seed: u64) -> (Screen, ManualClock) {
    let clock = ManualClock::new();
    let host = BufferedHost::new(Some(SurfaceSize::new(640.0, lanes as f64 * 40.0)));
    let options = Options {
        lane_height: 40.0,
        seed: Some(seed),
        ..Options::default()
    };
    let screen = BulletScreen::new(host, clock.clone(), options).expect("valid screen setup");
    (screen, clock)
}

fn pick(ids: &[ItemId], i: usize) -> Option<ItemId> {
    (!ids.is_empty()).then(|| ids[i % ids.len()])
}

proptest! {
    #[test]
    fn fresh_screen_is_all_idle(lanes in 1usize..40) {
        let (screen, _) = build(lanes, 0);
        prop_assert_eq!(screen.lane_count(), lanes);
        prop_assert!(screen.lane_states().iter().all(|s| *s == LaneState::Idle));
    }

    #[test]
    fn admission_never_reuses_a_cooling_lane(
        lanes in 1usize..6,
        seed in any::<u64>(),
        ops in prop::collection::vec(op(), 1..120),
    ) {
        let (mut screen, clock) = build(lanes, seed);
        let mut pushed = 0u32;

        for op in ops {
            // Apply due cooldowns so the snapshot is what admission will see.
            screen.tick();
            let before: Vec<LaneState> = screen.lane_states().to_vec();
            let queued_before = screen.queue_len();
            screen.host_mut().take_commands();

            match op {
                Op::Push => {
                    pushed += 1;
                    let id = screen.push(pushed);
                    prop_assert!(screen.item_state(id).is_some());
                }
                Op::Visible(i) => {
                    if let Some(id) = pick(&screen.live_ids(), i) {
                        screen.notify_visible(id);
                    }
                }
                Op::Complete(i) => {
                    if let Some(id) = pick(&screen.live_ids(), i) {
                        prop_assert!(screen.notify_completed(id));
                    }
                }
                Op::Width(i, w) => {
                    if let Some(id) = pick(&screen.live_ids(), i) {
                        screen.host_mut().set_width(id, f64::from(w));
                    }
                }
                Op::Advance(ms) => clock.advance(Duration::from_millis(u64::from(ms))),
                Op::PauseAll => screen.pause_all(),
                Op::ResumeAll => screen.resume_all(),
                Op::Clear => {
                    screen.clear();
                    prop_assert_eq!(screen.queue_len(), 0);
                    prop_assert_eq!(screen.live_len(), 0);
                    prop_assert!(screen.lane_states().iter().all(|s| *s == LaneState::Idle));
                    continue;
                }
            }

            let rendered: Vec<usize> = screen
                .host()
                .commands()
                .iter()
                .filter_map(|cmd| match cmd {
                    HostCommand::Render { lane, .. } => Some(*lane),
                    _ => None,
                })
                .collect();
            let distinct: HashSet<usize> = rendered.iter().copied().collect();
            prop_assert_eq!(distinct.len(), rendered.len(), "two admissions into one lane");
            for lane in &rendered {
                prop_assert_ne!(before[*lane], LaneState::JustAssigned);
                prop_assert_eq!(screen.lane_states()[*lane], LaneState::JustAssigned);
            }

            // A push grows the queue by at most one; admissions shrink it one each.
            let grown = usize::from(matches!(op, Op::Push));
            prop_assert!(screen.queue_len() <= queued_before + grown);
        }
    }

    #[test]
    fn started_bullets_follow_arrival_order(
        seed in any::<u64>(),
        ops in prop::collection::vec(op(), 1..150),
    ) {
        let (mut screen, clock) = build(2, seed);
        let mut pushed = 0u32;
        for op in ops {
            match op {
                Op::Push => {
                    pushed += 1;
                    screen.push(pushed);
                }
                Op::Visible(i) => {
                    if let Some(id) = pick(&screen.live_ids(), i) {
                        screen.notify_visible(id);
                    }
                }
                Op::Complete(i) => {
                    if let Some(id) = pick(&screen.live_ids(), i) {
                        screen.notify_completed(id);
                    }
                }
                Op::Width(i, w) => {
                    if let Some(id) = pick(&screen.live_ids(), i) {
                        screen.host_mut().set_width(id, f64::from(w));
                    }
                }
                Op::Advance(ms) => clock.advance(Duration::from_millis(u64::from(ms))),
                Op::PauseAll => screen.pause_all(),
                Op::ResumeAll => screen.resume_all(),
                Op::Clear => screen.clear(),
            }
        }

        let started: Vec<ItemId> = screen
            .drain_events()
            .into_iter()
            .filter_map(|ev| match ev {
                ScreenEvent::Started { id, .. } => Some(id),
                _ => None,
            })
            .collect();
        prop_assert!(started.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", started);
    }
}
