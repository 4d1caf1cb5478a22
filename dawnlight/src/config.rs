//! Installation constants.
//!
//! There is no persisted configuration format. The daemon starts from
//! [`LightingConfig::default`] and applies command-line overrides, then
//! validates before anything is wired together.

use std::time::Duration;

use crate::types::{ColourSpace, Rgb8};

/// Minutes in a simulated day.
pub const MINUTES_PER_DAY: u16 = 1440;

#[derive(Debug, Clone)]
pub struct LightingConfig {
    /// Target for `Day` and `ClockDay`.
    pub day_colour: Rgb8,

    /// Target for `Night` and `ClockNight`.
    pub night_colour: Rgb8,

    /// Intermediate colour clock fades pass through, giving dawn and dusk
    /// their reddish tint.
    pub mid_colour: Rgb8,

    /// Output while `Off` and after shutdown.
    pub off_colour: Rgb8,

    /// Minute of day at which the virtual clock turns to day.
    pub dawn_minute: u16,

    /// Minute of day at which the virtual clock turns to night. Must be
    /// later than `dawn_minute`.
    pub dusk_minute: u16,

    /// Minute the virtual clock is armed at when clock mode is entered.
    pub clock_start_minute: u16,

    /// Real time per simulated minute. Smaller is faster.
    pub clock_tick_interval: Duration,

    /// Duration of one fade leg.
    pub fade_duration: Duration,

    /// Interpolation steps per fade leg.
    pub fade_steps: u32,

    pub fade_space: ColourSpace,

    /// Gamma exponent applied to every frame, `None` to disable.
    pub gamma: Option<f32>,

    /// Presses held at least this long classify as hold.
    pub hold_threshold: Duration,

    /// Button polling period; also the debounce granularity.
    pub poll_interval: Duration,

    /// Pause between attempts to repaint a target colour the sink
    /// rejected.
    pub repaint_interval: Duration,

    /// Upper bound on how long a state's exit waits for its background
    /// task to wind down.
    pub exit_drain: Duration,
}

impl LightingConfig {
    /// Check internal consistency. Any error here is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, minute) in [
            ("dawn_minute", self.dawn_minute),
            ("dusk_minute", self.dusk_minute),
            ("clock_start_minute", self.clock_start_minute),
        ] {
            if minute >= MINUTES_PER_DAY {
                return Err(ConfigError::MinuteOutOfRange { name, minute });
            }
        }

        if self.dusk_minute <= self.dawn_minute {
            return Err(ConfigError::DuskNotAfterDawn {
                dawn: self.dawn_minute,
                dusk: self.dusk_minute,
            });
        }

        if self.fade_steps == 0 {
            return Err(ConfigError::ZeroFadeSteps);
        }

        for (name, duration) in [
            ("clock_tick_interval", self.clock_tick_interval),
            ("poll_interval", self.poll_interval),
            ("hold_threshold", self.hold_threshold),
            ("repaint_interval", self.repaint_interval),
        ] {
            if duration.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        match self.gamma {
            Some(gamma) if !(gamma.is_finite() && gamma > 0.0) => {
                return Err(ConfigError::InvalidGamma(gamma));
            }
            _ => {}
        }

        Ok(())
    }

    /// Pause between two frames of a fade leg.
    pub fn fade_step_duration(&self) -> Duration {
        self.fade_duration / self.fade_steps.max(1)
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            day_colour: Rgb8::new(255, 190, 120),
            night_colour: Rgb8::new(10, 20, 80),
            mid_colour: Rgb8::new(200, 40, 10),
            off_colour: Rgb8::BLACK,
            dawn_minute: 6 * 60 + 30,
            dusk_minute: 20 * 60,
            clock_start_minute: 12 * 60,
            clock_tick_interval: Duration::from_millis(250),
            fade_duration: Duration::from_secs(90),
            fade_steps: 100,
            fade_space: ColourSpace::Rgb,
            gamma: Some(2.2),
            hold_threshold: Duration::from_millis(750),
            poll_interval: Duration::from_millis(20),
            repaint_interval: Duration::from_secs(1),
            exit_drain: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("dusk minute {dusk} must be later than dawn minute {dawn}")]
    DuskNotAfterDawn { dawn: u16, dusk: u16 },

    #[error("{name} is {minute}, must be below {MINUTES_PER_DAY}")]
    MinuteOutOfRange { name: &'static str, minute: u16 },

    #[error("fade_steps must be at least 1")]
    ZeroFadeSteps,

    #[error("{0} must be non-zero")]
    ZeroDuration(&'static str),

    #[error("gamma must be a positive number, got {0}")]
    InvalidGamma(f32),
}
