// ============================================================================
// ANGLE MODEL
// ============================================================================

//! Roll, pitch and yaw storage with the wrap/clamp rules of the instrument.
//!
//! Every setter normalizes its input before storing it, so a reader never
//! observes an angle outside its domain:
//!
//! | angle | domain        | rule  |
//! |-------|---------------|-------|
//! | roll  | `(-180, 180]` | wrap  |
//! | pitch | `[-90, 90]`   | clamp |
//! | yaw   | `[0, 360)`    | wrap  |

use log::warn;

/// Lower and upper bounds of the roll domain, `(-180, 180]`.
pub const ROLL_RANGE: (f64, f64) = (-180.0, 180.0);
/// Bounds of the pitch domain, `[-90, 90]`.
pub const PITCH_RANGE: (f64, f64) = (-90.0, 90.0);
/// Bounds of the yaw domain, `[0, 360)`.
pub const YAW_RANGE: (f64, f64) = (0.0, 360.0);
/// Field of view used when none is configured.
pub const DEFAULT_FOV: f64 = 40.0;
/// Accepted field of view, in degrees.
pub const FOV_RANGE: (f64, f64) = (1.0, 90.0);

/// Modular wraparound for both real and integer angles.
pub trait Wrap: Sized {
    /// Wraps into `[min, max)`.
    fn wrap(self, min: Self, max: Self) -> Self;
    /// Wraps into `(min, max]`.
    fn wrap_upper(self, min: Self, max: Self) -> Self;
}

impl Wrap for f64 {
    fn wrap(self, min: f64, max: f64) -> f64 {
        let span = max - min;
        let wrapped = (self - min).rem_euclid(span) + min;
        // rem_euclid and the re-offset can both round up onto `max`
        if wrapped >= max {
            min
        } else {
            wrapped
        }
    }

    fn wrap_upper(self, min: f64, max: f64) -> f64 {
        let span = max - min;
        let wrapped = (self - min).rem_euclid(span) + min;
        if wrapped <= min || wrapped > max {
            max
        } else {
            wrapped
        }
    }
}

impl Wrap for i32 {
    fn wrap(self, min: i32, max: i32) -> i32 {
        (self - min).rem_euclid(max - min) + min
    }

    fn wrap_upper(self, min: i32, max: i32) -> i32 {
        match (self - min).rem_euclid(max - min) {
            0 => max,
            offset => offset + min,
        }
    }
}

/// Snapshot of everything the composer needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentState {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub fov: f64,
    pub supersample: bool,
}

impl InstrumentState {
    /// Raster resolution multiplier: 2 with supersampling, 1 without.
    pub const fn supersample_factor(&self) -> u32 {
        if self.supersample {
            2
        } else {
            1
        }
    }
}

impl Default for InstrumentState {
    fn default() -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            fov: DEFAULT_FOV,
            supersample: true,
        }
    }
}

/// Change notification emitted by every successful setter, carrying the
/// stored (normalized) value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleChange {
    Roll(f64),
    Pitch(f64),
    Yaw(f64),
    Supersample(bool),
}

/// Owner of the instrument angles.
#[derive(Debug, Clone)]
pub struct AngleModel {
    state: InstrumentState,
}

impl AngleModel {
    /// `fov` is kept within [`FOV_RANGE`]; zero, negative or non-finite
    /// values fall back to [`DEFAULT_FOV`].
    pub fn new(fov: f64, supersample: bool) -> Self {
        Self {
            state: InstrumentState {
                fov: normalize_fov(fov),
                supersample,
                ..InstrumentState::default()
            },
        }
    }

    pub fn state(&self) -> InstrumentState {
        self.state
    }

    pub fn roll(&self) -> f64 {
        self.state.roll
    }

    pub fn pitch(&self) -> f64 {
        self.state.pitch
    }

    pub fn yaw(&self) -> f64 {
        self.state.yaw
    }

    pub fn fov(&self) -> f64 {
        self.state.fov
    }

    pub fn supersample(&self) -> bool {
        self.state.supersample
    }

    /// Stores `value` wrapped into `(-180, 180]`. Non-finite input is ignored.
    pub fn set_roll(&mut self, value: f64) -> Option<AngleChange> {
        if !value.is_finite() {
            return None;
        }
        self.state.roll = value.wrap_upper(ROLL_RANGE.0, ROLL_RANGE.1);
        Some(AngleChange::Roll(self.state.roll))
    }

    /// Stores `value` clamped to `[-90, 90]`. NaN is ignored, infinities
    /// saturate.
    pub fn set_pitch(&mut self, value: f64) -> Option<AngleChange> {
        if value.is_nan() {
            return None;
        }
        self.state.pitch = value.clamp(PITCH_RANGE.0, PITCH_RANGE.1);
        Some(AngleChange::Pitch(self.state.pitch))
    }

    /// Stores `value` wrapped into `[0, 360)`. Non-finite input is ignored.
    pub fn set_yaw(&mut self, value: f64) -> Option<AngleChange> {
        if !value.is_finite() {
            return None;
        }
        self.state.yaw = value.wrap(YAW_RANGE.0, YAW_RANGE.1);
        Some(AngleChange::Yaw(self.state.yaw))
    }

    pub fn set_supersample(&mut self, enabled: bool) -> AngleChange {
        self.state.supersample = enabled;
        AngleChange::Supersample(enabled)
    }

    pub fn roll_by(&mut self, delta: f64) -> Option<AngleChange> {
        self.set_roll(self.state.roll + delta)
    }

    pub fn pitch_by(&mut self, delta: f64) -> Option<AngleChange> {
        self.set_pitch(self.state.pitch + delta)
    }

    pub fn yaw_by(&mut self, delta: f64) -> Option<AngleChange> {
        self.set_yaw(self.state.yaw + delta)
    }
}

fn normalize_fov(fov: f64) -> f64 {
    if !fov.is_finite() || fov <= 0.0 {
        warn!("field of view {fov} is unusable, using {DEFAULT_FOV}");
        return DEFAULT_FOV;
    }
    let clamped = fov.clamp(FOV_RANGE.0, FOV_RANGE.1);
    if clamped != fov {
        warn!("field of view {fov} clamped to {clamped}");
    }
    clamped
}

impl Default for AngleModel {
    fn default() -> Self {
        Self::new(DEFAULT_FOV, true)
    }
}
