use barrage_protocol::{ItemConfig, ItemOverrides, Options, SurfaceSize};
use thiserror::Error;
use tracing::warn;

/// Upper bound on the lane count. A surface that divides into more lanes than
/// this is treated as a mis-measurement or a degenerate lane height.
pub const MAX_LANES: usize = u16::MAX as usize;

/// Setup failures. Fatal: the screen is not constructed.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("host has no surface to display bullets on")]
    SurfaceUnavailable,
    #[error("surface height {height} is not a usable size")]
    InvalidSurface { height: f64 },
    #[error("lane height {0} must be a positive number")]
    InvalidLaneHeight(f64),
    #[error("surface height {height} fits no lane of height {lane_height}")]
    NoLanes { height: f64, lane_height: f64 },
    #[error(
        "surface height {height} splits into more than {max} lanes of height {lane_height}",
        max = MAX_LANES
    )]
    TooManyLanes { height: f64, lane_height: f64 },
    #[error("option `{name}` must be a non-negative number, got {value}")]
    InvalidOption { name: &'static str, value: f64 },
}

/// Check options for values no host could honour.
pub fn validate(options: &Options) -> Result<(), ConfigError> {
    let lh = options.lane_height;
    if !lh.is_finite() || lh <= 0.0 {
        return Err(ConfigError::InvalidLaneHeight(lh));
    }

    let mut checks = vec![
        ("gap", options.gap),
        ("duration", options.timing.duration),
        ("delay", options.timing.delay),
    ];
    checks.extend(options.top.map(|top| ("top", top)));
    checks.extend(options.stall_timeout.map(|t| ("stallTimeout", t)));

    for (name, value) in checks {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidOption { name, value });
        }
    }
    Ok(())
}

fn usable(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Resolve per-item overrides. Values `validate` would reject fall back to
/// the screen-wide setting.
pub fn resolve_item(options: &Options, overrides: &ItemOverrides) -> ItemConfig {
    let mut config = options.resolve(overrides);
    if !usable(config.timing.duration) {
        warn!(value = config.timing.duration, "ignoring per-item duration");
        config.timing.duration = options.timing.duration;
    }
    if !usable(config.timing.delay) {
        warn!(value = config.timing.delay, "ignoring per-item delay");
        config.timing.delay = options.timing.delay;
    }
    if let Some(top) = config.top
        && !usable(top)
    {
        warn!(value = top, "ignoring per-item top");
        config.top = options.top;
    }
    config
}

/// Lane count for a measured surface: `floor(height / lane_height)`.
pub fn lane_count(surface: SurfaceSize, lane_height: f64) -> Result<usize, ConfigError> {
    let height = surface.height;
    if !height.is_finite() || height < 0.0 {
        return Err(ConfigError::InvalidSurface { height });
    }
    if !lane_height.is_finite() || lane_height <= 0.0 {
        return Err(ConfigError::InvalidLaneHeight(lane_height));
    }
    let count = (height / lane_height).floor();
    if count > MAX_LANES as f64 {
        return Err(ConfigError::TooManyLanes {
            height,
            lane_height,
        });
    }
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate(&Options::default()), Ok(()));
    }

    #[test]
    fn rejects_bad_numbers() {
        let bad_lane = Options {
            lane_height: 0.0,
            ..Options::default()
        };
        assert_eq!(validate(&bad_lane), Err(ConfigError::InvalidLaneHeight(0.0)));

        let mut bad_delay = Options::default();
        bad_delay.timing.delay = -1.0;
        assert_eq!(
            validate(&bad_delay),
            Err(ConfigError::InvalidOption {
                name: "delay",
                value: -1.0
            })
        );
    }

    #[test]
    fn lane_count_floors() {
        assert_eq!(lane_count(SurfaceSize::new(800.0, 150.0), 50.0), Ok(3));
        assert_eq!(lane_count(SurfaceSize::new(800.0, 149.9), 50.0), Ok(2));
        assert_eq!(lane_count(SurfaceSize::new(800.0, 10.0), 50.0), Ok(0));
        assert!(lane_count(SurfaceSize::new(800.0, f64::NAN), 50.0).is_err());
    }

    #[test]
    fn bad_item_overrides_fall_back() {
        let options = Options {
            top: Some(12.0),
            ..Options::default()
        };
        let config = resolve_item(
            &options,
            &ItemOverrides {
                duration: Some(-3.0),
                delay: Some(f64::INFINITY),
                top: Some(f64::NAN),
                ..ItemOverrides::default()
            },
        );
        assert_eq!(config.timing.duration, options.timing.duration);
        assert_eq!(config.timing.delay, options.timing.delay);
        assert_eq!(config.top, Some(12.0));

        let fine = resolve_item(
            &options,
            &ItemOverrides {
                duration: Some(4.0),
                top: Some(0.0),
                ..ItemOverrides::default()
            },
        );
        assert_eq!(fine.timing.duration, 4.0);
        assert_eq!(fine.top, Some(0.0));
    }

    #[test]
    fn lane_count_is_bounded() {
        assert_eq!(
            lane_count(SurfaceSize::new(800.0, MAX_LANES as f64), 1.0),
            Ok(MAX_LANES)
        );
        assert_eq!(
            lane_count(SurfaceSize::new(800.0, 1e30), 50.0),
            Err(ConfigError::TooManyLanes {
                height: 1e30,
                lane_height: 50.0
            })
        );
        assert!(matches!(
            lane_count(SurfaceSize::new(800.0, 600.0), 1e-9),
            Err(ConfigError::TooManyLanes { .. })
        ));
    }
}
