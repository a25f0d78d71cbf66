use std::collections::HashMap;
use std::time::Duration;

use barrage_protocol::{
    HostCommand, ItemId, ItemOverrides, LaneOccupant, LaneState, Options, PlayState, ScreenEvent,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{self, ConfigError};
use crate::host::Host;
use crate::lanes::LaneRegistry;
use crate::queue::{PendingItem, PendingQueue};
use crate::scheduler::TrackScheduler;

/// Where a bullet is in its lifecycle. Completed bullets are forgotten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ItemState {
    Queued,
    Admitted { lane: usize },
    Visible { lane: usize },
}

#[derive(Debug, Clone)]
struct LiveItem {
    id: ItemId,
    lane: usize,
    visible: bool,
    paused: bool,
    /// Paused by a click; hover-leave must not resume it.
    clicked: bool,
    pause_on_hover: bool,
    pause_on_click: bool,
    /// Admission time, or the latest resume. Stall timeouts count from here.
    stall_anchor: Duration,
}

/// A bullet screen: owns the lanes, the pending queue and the live set, and
/// drives a [`Host`] through their transitions.
///
/// All scheduler state lives here and is only touched through `&mut self`,
/// so admissions and their queue drains never interleave.
pub struct BulletScreen<H: Host, K: Clock = MonotonicClock> {
    host: H,
    clock: K,
    options: Options,
    lanes: LaneRegistry,
    scheduler: TrackScheduler,
    queue: PendingQueue<H::Content>,
    /// Admitted bullets, oldest admission first.
    live: Vec<LiveItem>,
    next_id: u64,
    paused: bool,
    hidden: bool,
    events: Vec<ScreenEvent>,
}

impl<H: Host, K: Clock> BulletScreen<H, K> {
    /// Measure the host surface and lay out `floor(height / lane_height)`
    /// idle lanes.
    pub fn new(host: H, clock: K, options: Options) -> Result<Self, ConfigError> {
        error::validate(&options)?;
        let surface = host.measure().ok_or(ConfigError::SurfaceUnavailable)?;
        let count = error::lane_count(surface, options.lane_height)?;
        if count == 0 {
            return Err(ConfigError::NoLanes {
                height: surface.height,
                lane_height: options.lane_height,
            });
        }

        let cooldown = Duration::from_millis(options.cooldown_ms());
        let scheduler = TrackScheduler::new(cooldown, seed_rng(options.seed));
        debug!(lanes = count, ?cooldown, "bullet screen ready");

        Ok(Self {
            host,
            clock,
            options,
            lanes: LaneRegistry::new(count),
            scheduler,
            queue: PendingQueue::new(),
            live: Vec::new(),
            next_id: 1,
            paused: false,
            hidden: false,
            events: Vec::new(),
        })
    }

    /// Push a bullet with the screen-wide options.
    pub fn push(&mut self, content: H::Content) -> ItemId {
        self.push_with(content, &ItemOverrides::default())
    }

    /// Push a bullet with per-item overrides. It is admitted right away if a
    /// lane is free, nothing older is waiting and the screen is not paused;
    /// otherwise it is queued.
    pub fn push_with(&mut self, content: H::Content, overrides: &ItemOverrides) -> ItemId {
        let now = self.sync();
        let id = ItemId(self.next_id);
        self.next_id += 1;
        let item = PendingItem {
            id,
            content,
            config: error::resolve_item(&self.options, overrides),
        };

        if self.paused {
            self.enqueue(item);
            return id;
        }

        self.drain_queue(now);
        if !self.queue.is_empty() {
            self.enqueue(item);
            return id;
        }

        let occupants = self.occupants();
        match self.scheduler.choose_lane(&mut self.lanes, &occupants, now) {
            Some(lane) => self.admit(item, lane, now),
            None => self.enqueue(item),
        }
        id
    }

    /// Host signal: the bullet is fully inside the surface. The head of the
    /// queue may follow it into the same lane once that lane is out of
    /// cooldown. Returns `false` for unknown ids.
    pub fn notify_visible(&mut self, id: ItemId) -> bool {
        let now = self.sync();
        let Some(idx) = self.position(id) else {
            debug!(%id, "visibility signal for unknown bullet");
            return false;
        };

        let item = &mut self.live[idx];
        if item.visible {
            return true;
        }
        item.visible = true;
        let lane = item.lane;

        if !self.paused
            && !self.queue.is_empty()
            && self.scheduler.claim(&mut self.lanes, lane, now)
            && let Some(next) = self.queue.dequeue()
        {
            debug!(%id, lane, next = %next.id, "draining queue behind visible bullet");
            self.admit(next, lane, now);
        }
        true
    }

    /// Host signal: the bullet's transit ended. Removes it from the live set.
    /// Returns `false` for unknown ids.
    pub fn notify_completed(&mut self, id: ItemId) -> bool {
        self.sync();
        if self.retire(id) {
            true
        } else {
            debug!(%id, "completion signal for unknown bullet");
            false
        }
    }

    /// Fire due cooldowns and drop stalled bullets. Hosts call this on their
    /// frame or timer cadence; every other operation also syncs cooldowns.
    /// Returns the ids dropped for stalling.
    pub fn tick(&mut self) -> Vec<ItemId> {
        let now = self.sync();
        let Some(limit) = self
            .options
            .stall_timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        else {
            return Vec::new();
        };

        let paused = self.paused;
        let stalled: Vec<ItemId> = self
            .live
            .iter()
            .filter(|item| !paused && !item.paused)
            .filter(|item| now.saturating_sub(item.stall_anchor) >= limit)
            .map(|item| item.id)
            .collect();

        for &id in &stalled {
            warn!(%id, ?limit, "bullet never completed; dropping it");
            self.retire(id);
        }
        stalled
    }

    /// Pause every bullet and hold new arrivals in the queue.
    pub fn pause_all(&mut self) {
        let now = self.sync();
        self.paused = true;
        for idx in 0..self.live.len() {
            self.set_item_paused(idx, true, now);
        }
    }

    /// Resume every bullet, clear click-pauses and admit whatever the queue
    /// can place.
    pub fn resume_all(&mut self) {
        let now = self.sync();
        self.paused = false;
        for idx in 0..self.live.len() {
            self.live[idx].clicked = false;
            self.set_item_paused(idx, false, now);
        }
        self.drain_queue(now);
    }

    pub fn pause_item(&mut self, id: ItemId) -> bool {
        let now = self.sync();
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.set_item_paused(idx, true, now);
        true
    }

    pub fn resume_item(&mut self, id: ItemId) -> bool {
        let now = self.sync();
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.live[idx].clicked = false;
        self.set_item_paused(idx, false, now);
        true
    }

    /// Pointer entered or left a bullet. With pause-on-hover, entering pauses
    /// it; leaving resumes it unless the screen is paused or it was
    /// click-paused. Returns whether the bullet's play state changed.
    pub fn hover(&mut self, id: ItemId, entered: bool) -> bool {
        let now = self.sync();
        let Some(idx) = self.position(id) else {
            return false;
        };
        let LiveItem {
            pause_on_hover,
            clicked,
            ..
        } = self.live[idx];
        if !pause_on_hover {
            return false;
        }

        if entered {
            self.set_item_paused(idx, true, now)
        } else if !self.paused && !clicked {
            self.set_item_paused(idx, false, now)
        } else {
            false
        }
    }

    /// Toggle a click-pause on a bullet, if it has pause-on-click. Returns
    /// whether the bullet's play state changed.
    pub fn click(&mut self, id: ItemId) -> bool {
        let now = self.sync();
        let Some(idx) = self.position(id) else {
            return false;
        };
        let item = &mut self.live[idx];
        if !item.pause_on_click {
            return false;
        }

        if item.paused && item.clicked {
            item.clicked = false;
            self.set_item_paused(idx, false, now)
        } else {
            item.clicked = true;
            self.set_item_paused(idx, true, now)
        }
    }

    /// Hide every bullet. Scheduling carries on; new bullets render hidden.
    pub fn hide(&mut self) {
        self.set_hidden(true);
    }

    pub fn show(&mut self) {
        self.set_hidden(false);
    }

    /// Remove every bullet, empty the queue and re-measure the surface.
    /// All lanes come back idle and cooldowns scheduled before now are void.
    pub fn clear(&mut self) {
        self.sync();
        for item in self.live.drain(..) {
            self.host.apply(HostCommand::Remove { id: item.id });
            self.events.push(ScreenEvent::Ended { id: item.id });
        }
        self.queue.clear();

        let count = match self.host.measure() {
            Some(surface) => match error::lane_count(surface, self.options.lane_height) {
                Ok(count) => count,
                Err(err) => {
                    warn!(%err, "surface re-measure failed; keeping lane layout");
                    self.lanes.len()
                }
            },
            None => {
                warn!("surface unavailable on clear; keeping lane layout");
                self.lanes.len()
            }
        };
        if count == 0 {
            warn!("surface fits no lane; bullets will queue until the next clear");
        }
        self.lanes.reset_all(count);
        debug!(lanes = count, "screen cleared");
    }

    /// Remove one bullet, live or queued.
    pub fn clear_item(&mut self, id: ItemId) -> bool {
        self.sync();
        self.retire(id) || self.queue.remove(id).is_some()
    }

    pub fn item_state(&self, id: ItemId) -> Option<ItemState> {
        if let Some(item) = self.live.iter().find(|item| item.id == id) {
            return Some(if item.visible {
                ItemState::Visible { lane: item.lane }
            } else {
                ItemState::Admitted { lane: item.lane }
            });
        }
        self.queue.contains(id).then_some(ItemState::Queued)
    }

    /// Lane states, index-aligned. Cooldowns due by the last operation have
    /// been applied; call [`tick`](Self::tick) first for an up-to-date view.
    pub fn lane_states(&self) -> &[LaneState] {
        self.lanes.snapshot()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queued_ids(&self) -> Vec<ItemId> {
        self.queue.ids().collect()
    }

    pub fn live_len(&self) -> usize {
        self.live.len()
    }

    /// Admitted bullets, oldest first.
    pub fn live_ids(&self) -> Vec<ItemId> {
        self.live.iter().map(|item| item.id).collect()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// When the next cooldown falls due, for hosts that schedule `tick`.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.lanes.next_due()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Lifecycle events since the last drain, in order.
    pub fn drain_events(&mut self) -> Vec<ScreenEvent> {
        std::mem::take(&mut self.events)
    }

    fn sync(&mut self) -> Duration {
        let now = self.clock.now();
        self.lanes.expire(now);
        now
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.live.iter().position(|item| item.id == id)
    }

    /// Host occupancy restricted to the live set, in admission order.
    fn occupants(&self) -> Vec<LaneOccupant> {
        let widths: HashMap<ItemId, f64> = self
            .host
            .occupancy()
            .into_iter()
            .map(|occ| (occ.id, occ.width))
            .collect();
        self.live
            .iter()
            .filter_map(|item| {
                widths
                    .get(&item.id)
                    .map(|&width| LaneOccupant::new(item.id, item.lane, width))
            })
            .collect()
    }

    /// Admit queued bullets, oldest first, while lanes are available.
    fn drain_queue(&mut self, now: Duration) {
        while !self.queue.is_empty() {
            let occupants = self.occupants();
            let Some(lane) = self.scheduler.choose_lane(&mut self.lanes, &occupants, now) else {
                break;
            };
            if let Some(item) = self.queue.dequeue() {
                self.admit(item, lane, now);
            }
        }
    }

    fn admit(&mut self, item: PendingItem<H::Content>, lane: usize, now: Duration) {
        let PendingItem {
            id,
            content,
            config,
        } = item;
        let top = config
            .top
            .unwrap_or(lane as f64 * self.options.lane_height);

        self.live.push(LiveItem {
            id,
            lane,
            visible: false,
            paused: false,
            clicked: false,
            pause_on_hover: config.pause_on_hover,
            pause_on_click: config.pause_on_click,
            stall_anchor: now,
        });
        self.host.apply(HostCommand::Render {
            id,
            lane,
            top,
            config,
            hidden: self.hidden,
            content,
        });
        self.events.push(ScreenEvent::Started { id, lane });
        debug!(%id, lane, top, "bullet admitted");
    }

    fn enqueue(&mut self, item: PendingItem<H::Content>) {
        let id = item.id;
        self.queue.enqueue(item);
        self.events.push(ScreenEvent::Queued { id });
        debug!(%id, queued = self.queue.len(), paused = self.paused, "bullet queued");
    }

    /// Drop a live bullet. The lane is left as is; reconciliation frees it
    /// once the host reports it empty.
    fn retire(&mut self, id: ItemId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let item = self.live.remove(idx);
        self.host.apply(HostCommand::Remove { id });
        self.events.push(ScreenEvent::Ended { id });
        debug!(%id, lane = item.lane, "bullet retired");
        true
    }

    fn set_item_paused(&mut self, idx: usize, paused: bool, now: Duration) -> bool {
        let item = &mut self.live[idx];
        if item.paused == paused {
            return false;
        }
        item.paused = paused;
        if !paused {
            item.stall_anchor = now;
        }
        let state = if paused {
            PlayState::Paused
        } else {
            PlayState::Running
        };
        self.host.apply(HostCommand::SetPlayState { id: item.id, state });
        true
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.sync();
        self.hidden = hidden;
        for item in &self.live {
            self.host.apply(HostCommand::SetHidden {
                id: item.id,
                hidden,
            });
        }
    }
}

fn seed_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        #[cfg(feature = "os-rng")]
        None => SmallRng::from_os_rng(),
        #[cfg(not(feature = "os-rng"))]
        None => SmallRng::seed_from_u64(0x6261_7272_6167_6521),
    }
}
