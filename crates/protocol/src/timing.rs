use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Per-bullet animation timing. Opaque to the scheduler; hosts use it to
/// drive the transit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timing {
    /// Length of one iteration in seconds.
    pub duration: f64,
    /// Seconds before the first iteration starts.
    pub delay: f64,
    pub loop_count: LoopCount,
    pub direction: Direction,
    pub easing: Easing,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            duration: 10.0,
            delay: 0.0,
            loop_count: LoopCount::Finite(1),
            direction: Direction::Normal,
            easing: Easing::Linear,
        }
    }
}

/// Where an animation is at a given moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Still inside the start delay.
    Pending,
    /// Eased progress in `[0, 1]` within the current iteration, direction
    /// already applied.
    Running(f64),
    /// All iterations are done.
    Finished,
}

impl Timing {
    /// Total run time in seconds, or `None` for infinitely looping bullets.
    pub fn total(&self) -> Option<f64> {
        match self.loop_count {
            LoopCount::Finite(n) => Some(self.delay + self.duration * f64::from(n)),
            LoopCount::Infinite => None,
        }
    }

    /// Progress after `elapsed` seconds of (unpaused) play.
    pub fn progress_at(&self, elapsed: f64) -> Progress {
        if elapsed < self.delay {
            return Progress::Pending;
        }
        if self.duration <= 0.0 || !self.duration.is_finite() {
            return Progress::Finished;
        }

        let active = elapsed - self.delay;
        let iteration = (active / self.duration).floor();
        if let LoopCount::Finite(n) = self.loop_count
            && iteration >= f64::from(n)
        {
            return Progress::Finished;
        }

        let linear = (active - iteration * self.duration) / self.duration;
        let odd = iteration % 2.0 == 1.0;
        let reversed = match self.direction {
            Direction::Normal => false,
            Direction::Reverse => true,
            Direction::Alternate => odd,
            Direction::AlternateReverse => !odd,
        };
        let t = if reversed { 1.0 - linear } else { linear };
        Progress::Running(self.easing.apply(t))
    }
}

/// Horizontal position of a bullet's leading edge for a right-to-left
/// transit: `surface_width` at progress 0, `-item_width` at progress 1.
pub fn travel_offset(surface_width: f64, item_width: f64, progress: f64) -> f64 {
    surface_width - progress * (surface_width + item_width)
}

/// Number of iterations a bullet runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Finite(u32),
    Infinite,
}

impl Serialize for LoopCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(n) => serializer.serialize_u32(*n),
            Self::Infinite => serializer.serialize_str("infinite"),
        }
    }
}

impl<'de> Deserialize<'de> for LoopCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Self::Finite(n)),
            Raw::Word(word) if word.eq_ignore_ascii_case("infinite") => Ok(Self::Infinite),
            Raw::Word(word) => word.trim().parse().map(Self::Finite).map_err(|_| {
                serde::de::Error::custom(format!("invalid loop count: {word:?}"))
            }),
        }
    }
}

/// Playback direction per iteration, as in CSS `animation-direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Normal,
    Reverse,
    Alternate,
    AlternateReverse,
}

/// Timing function applied to linear iteration progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` to eased progress. Both are clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
        }
    }
}

/// Evaluate a CSS `cubic-bezier(x1, y1, x2, y2)` at `x = t`.
///
/// The x polynomial is monotonic for control points in `[0, 1]`, so bisection
/// always converges.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
    fn axis(p1: f64, p2: f64, s: f64) -> f64 {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut s = t;
    for _ in 0..40 {
        let x = axis(x1, x2, s);
        if (x - t).abs() < 1e-7 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    axis(y1, y2, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(p: Progress) -> f64 {
        if let Progress::Running(v) = p {
            v
        } else {
            f64::NAN
        }
    }

    #[test]
    fn easing_endpoints_are_fixed() {
        for easing in [
            Easing::Linear,
            Easing::Ease,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing:?} at 1");
        }
    }

    #[test]
    fn ease_in_starts_slow() {
        assert!(Easing::EaseIn.apply(0.25) < 0.25);
        assert!(Easing::EaseOut.apply(0.25) > 0.25);
    }

    #[test]
    fn delay_then_single_iteration() {
        let timing = Timing {
            duration: 4.0,
            delay: 1.0,
            ..Timing::default()
        };
        assert_eq!(timing.progress_at(0.5), Progress::Pending);
        assert!((running(timing.progress_at(3.0)) - 0.5).abs() < 1e-9);
        assert_eq!(timing.progress_at(5.0), Progress::Finished);
        assert_eq!(timing.total(), Some(5.0));
    }

    #[test]
    fn alternate_runs_backwards_on_odd_iterations() {
        let timing = Timing {
            duration: 2.0,
            loop_count: LoopCount::Finite(2),
            direction: Direction::Alternate,
            ..Timing::default()
        };
        assert!((running(timing.progress_at(0.5)) - 0.25).abs() < 1e-9);
        assert!((running(timing.progress_at(2.5)) - 0.75).abs() < 1e-9);
        assert_eq!(timing.progress_at(4.0), Progress::Finished);
    }

    #[test]
    fn infinite_never_finishes() {
        let timing = Timing {
            duration: 1.0,
            loop_count: LoopCount::Infinite,
            ..Timing::default()
        };
        assert!(matches!(timing.progress_at(1e6 + 0.5), Progress::Running(_)));
        assert_eq!(timing.total(), None);
    }

    #[test]
    fn travel_spans_surface_plus_item() {
        assert_eq!(travel_offset(100.0, 20.0, 0.0), 100.0);
        assert_eq!(travel_offset(100.0, 20.0, 1.0), -20.0);
    }

    #[test]
    fn loop_count_accepts_numbers_and_infinite() {
        let n: LoopCount = serde_json::from_str("3").unwrap_or(LoopCount::Infinite);
        assert_eq!(n, LoopCount::Finite(3));
        let s: LoopCount = serde_json::from_str("\"2\"").unwrap_or(LoopCount::Infinite);
        assert_eq!(s, LoopCount::Finite(2));
        let inf: LoopCount = serde_json::from_str("\"infinite\"").unwrap_or(LoopCount::Finite(0));
        assert_eq!(inf, LoopCount::Infinite);
        assert!(serde_json::from_str::<LoopCount>("\"forever\"").is_err());
    }
}
