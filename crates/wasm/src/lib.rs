//! Browser bridge. JavaScript owns the DOM: it renders the commands taken
//! from [`BulletScreen::take_commands`], measures bullet widths, and reports
//! visibility and completion back by id.

use std::time::Duration;

use barrage_core::{BufferedHost, ConfigError, ManualClock};
use barrage_protocol::{ItemId, ItemOverrides, LaneState, Options, SurfaceSize};
use serde::Serialize;
use wasm_bindgen::prelude::*;

type Screen = barrage_core::BulletScreen<BufferedHost<String>, ManualClock>;

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn to_json(value: &impl Serialize) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(js_err)
}

fn surface(width: f64, height: f64) -> Option<SurfaceSize> {
    (width > 0.0 && height > 0.0).then(|| SurfaceSize::new(width, height))
}

/// Seed for screens built without one, so lane picks differ between page
/// loads.
fn default_seed(now_ms: f64) -> u64 {
    now_ms.to_bits() ^ host_entropy()
}

#[cfg(target_arch = "wasm32")]
fn host_entropy() -> u64 {
    (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64
}

#[cfg(not(target_arch = "wasm32"))]
fn host_entropy() -> u64 {
    0
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    lanes: &'a [LaneState],
    live: usize,
    queued: usize,
    paused: bool,
    hidden: bool,
}

/// One bullet screen bound to a DOM container of the given size.
#[wasm_bindgen]
pub struct BulletScreen {
    screen: Screen,
    clock: ManualClock,
}

impl BulletScreen {
    fn build(
        width: f64,
        height: f64,
        mut options: Options,
        now_ms: f64,
    ) -> Result<Self, ConfigError> {
        if options.seed.is_none() {
            options.seed = Some(default_seed(now_ms));
        }
        let clock = ManualClock::new();
        clock.set(millis(now_ms));
        let host = BufferedHost::new(surface(width, height));
        let screen = Screen::new(host, clock.clone(), options)?;
        Ok(Self { screen, clock })
    }

    fn push_item(&mut self, content: String, overrides: &ItemOverrides) -> u64 {
        self.screen.push_with(content, overrides).get()
    }

    fn snapshot(&self) -> Status<'_> {
        Status {
            lanes: self.screen.lane_states(),
            live: self.screen.live_len(),
            queued: self.screen.queue_len(),
            paused: self.screen.is_paused(),
            hidden: self.screen.is_hidden(),
        }
    }
}

#[wasm_bindgen]
impl BulletScreen {
    /// `options_json` is a partial camelCase options object. Without a
    /// `seed`, one is drawn from `Math.random` and `now_ms`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: f64,
        height: f64,
        options_json: Option<String>,
        now_ms: f64,
    ) -> Result<BulletScreen, JsError> {
        let options: Options = match options_json.as_deref() {
            Some(json) => serde_json::from_str(json).map_err(js_err)?,
            None => Options::default(),
        };
        Self::build(width, height, options, now_ms).map_err(js_err)
    }

    /// Move scheduler time to `now_ms` (e.g. `performance.now()`).
    #[wasm_bindgen(js_name = setTime)]
    pub fn set_time(&mut self, now_ms: f64) {
        self.clock.set(millis(now_ms));
    }

    /// Push a bullet; `overrides_json` holds per-item options.
    pub fn push(&mut self, content: String, overrides_json: Option<String>) -> Result<u64, JsError> {
        let overrides: ItemOverrides = match overrides_json.as_deref() {
            Some(json) => serde_json::from_str(json).map_err(js_err)?,
            None => ItemOverrides::default(),
        };
        Ok(self.push_item(content, &overrides))
    }

    /// Report the measured width of a rendered bullet.
    #[wasm_bindgen(js_name = setItemWidth)]
    pub fn set_item_width(&mut self, id: u64, width: f64) -> bool {
        self.screen.host_mut().set_width(ItemId(id), width)
    }

    #[wasm_bindgen(js_name = notifyVisible)]
    pub fn notify_visible(&mut self, id: u64) -> bool {
        self.screen.notify_visible(ItemId(id))
    }

    #[wasm_bindgen(js_name = notifyCompleted)]
    pub fn notify_completed(&mut self, id: u64) -> bool {
        self.screen.notify_completed(ItemId(id))
    }

    /// Set the time, fire cooldowns and return the ids dropped for stalling.
    pub fn tick(&mut self, now_ms: f64) -> Vec<u64> {
        self.set_time(now_ms);
        self.screen.tick().into_iter().map(ItemId::get).collect()
    }

    #[wasm_bindgen(js_name = pauseAll)]
    pub fn pause_all(&mut self) {
        self.screen.pause_all();
    }

    #[wasm_bindgen(js_name = resumeAll)]
    pub fn resume_all(&mut self) {
        self.screen.resume_all();
    }

    #[wasm_bindgen(js_name = pauseItem)]
    pub fn pause_item(&mut self, id: u64) -> bool {
        self.screen.pause_item(ItemId(id))
    }

    #[wasm_bindgen(js_name = resumeItem)]
    pub fn resume_item(&mut self, id: u64) -> bool {
        self.screen.resume_item(ItemId(id))
    }

    pub fn hover(&mut self, id: u64, entered: bool) -> bool {
        self.screen.hover(ItemId(id), entered)
    }

    pub fn click(&mut self, id: u64) -> bool {
        self.screen.click(ItemId(id))
    }

    pub fn hide(&mut self) {
        self.screen.hide();
    }

    pub fn show(&mut self) {
        self.screen.show();
    }

    /// Drop every bullet and recount lanes against the new container size.
    pub fn clear(&mut self, width: f64, height: f64) {
        self.screen.host_mut().resize(surface(width, height));
        self.screen.clear();
    }

    #[wasm_bindgen(js_name = clearItem)]
    pub fn clear_item(&mut self, id: u64) -> bool {
        self.screen.clear_item(ItemId(id))
    }

    /// Pending host commands as a JSON array, oldest first.
    #[wasm_bindgen(js_name = takeCommands)]
    pub fn take_commands(&mut self) -> Result<String, JsError> {
        to_json(&self.screen.host_mut().take_commands())
    }

    /// Lifecycle events since the last call, as a JSON array.
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> Result<String, JsError> {
        to_json(&self.screen.drain_events())
    }

    /// `{"state": ...}` for a known id, `null` otherwise.
    #[wasm_bindgen(js_name = itemState)]
    pub fn item_state(&self, id: u64) -> Result<String, JsError> {
        to_json(&self.screen.item_state(ItemId(id)))
    }

    /// Lane states and counters as JSON.
    pub fn status(&self) -> Result<String, JsError> {
        to_json(&self.snapshot())
    }
}

fn millis(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or_default()
}
