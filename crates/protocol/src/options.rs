use serde::{Deserialize, Serialize};

use crate::timing::{Direction, Easing, LoopCount, Timing};

/// Cooldown length as a multiple of the configured send rate.
pub const COOLDOWN_FACTOR: u32 = 3;

/// Screen-wide configuration. Every field has a default, so hosts can
/// deserialize a partial JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Height of one lane in host units. Lane count is
    /// `floor(surface height / lane_height)`.
    pub lane_height: f64,
    /// Free space a bullet must leave behind itself before it counts as fully
    /// visible.
    pub gap: f64,
    /// Host-side animation name, passed through untouched.
    pub animation: String,
    pub pause_on_hover: bool,
    pub pause_on_click: bool,
    #[serde(flatten)]
    pub timing: Timing,
    /// Expected interval between pushes in milliseconds. Lanes stay blocked
    /// for `COOLDOWN_FACTOR * send_rate` after an admission.
    pub send_rate: u64,
    /// Fixed vertical offset for every bullet instead of `lane * lane_height`.
    pub top: Option<f64>,
    /// Seconds after which an admitted bullet the host never completed is
    /// dropped. `None` keeps it until the host signals.
    pub stall_timeout: Option<f64>,
    /// Seed for lane selection. `None` draws one at construction.
    pub seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            lane_height: 50.0,
            gap: 10.0,
            animation: "RightToLeft".to_owned(),
            pause_on_hover: false,
            pause_on_click: true,
            timing: Timing::default(),
            send_rate: 200,
            top: None,
            stall_timeout: None,
            seed: None,
        }
    }
}

impl Options {
    /// How long a lane stays `JustAssigned`, in milliseconds.
    pub fn cooldown_ms(&self) -> u64 {
        self.send_rate.saturating_mul(u64::from(COOLDOWN_FACTOR))
    }

    /// Merge per-push overrides over these options.
    pub fn resolve(&self, overrides: &ItemOverrides) -> ItemConfig {
        ItemConfig {
            top: overrides.top.or(self.top),
            animation: overrides
                .animation
                .clone()
                .unwrap_or_else(|| self.animation.clone()),
            timing: Timing {
                duration: overrides.duration.unwrap_or(self.timing.duration),
                delay: overrides.delay.unwrap_or(self.timing.delay),
                loop_count: overrides.loop_count.unwrap_or(self.timing.loop_count),
                direction: overrides.direction.unwrap_or(self.timing.direction),
                easing: overrides.easing.unwrap_or(self.timing.easing),
            },
            pause_on_hover: overrides.pause_on_hover.unwrap_or(self.pause_on_hover),
            pause_on_click: overrides.pause_on_click.unwrap_or(self.pause_on_click),
        }
    }
}

/// Per-push overrides. `None` falls back to the screen options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemOverrides {
    pub top: Option<f64>,
    pub animation: Option<String>,
    pub duration: Option<f64>,
    pub delay: Option<f64>,
    pub loop_count: Option<LoopCount>,
    pub direction: Option<Direction>,
    pub easing: Option<Easing>,
    pub pause_on_hover: Option<bool>,
    pub pause_on_click: Option<bool>,
}

/// Fully resolved configuration of one bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConfig {
    pub top: Option<f64>,
    pub animation: String,
    pub timing: Timing,
    pub pause_on_hover: bool,
    pub pause_on_click: bool,
}
