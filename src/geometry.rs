// ============================================================================
// GEOMETRY PROJECTION
// ============================================================================

//! Pure mapping from instrument angles to primitives in the normalized
//! instrument square, which spans roughly `[-0.5, 0.5]` on both axes with
//! y pointing down. The composer scales the results to device pixels.

use crate::angles::Wrap;
use crate::transform::Point;

/// Below this raster side (in display pixels) weak graduations are dropped.
pub const WEAK_TICK_MIN_PENSIZE: f64 = 256.0;

const GRADUATION_STEP: i32 = 5;
const STRONG_RUNG_HALF_LENGTH: f64 = 5.0 / 32.0;
const WEAK_RUNG_HALF_LENGTH: f64 = 3.0 / 32.0;
const STRONG_HEADING_TICK: f64 = 1.0 / 32.0;
const WEAK_HEADING_TICK: f64 = 1.0 / 64.0;
const HORIZON_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Strong,
    Weak,
}

impl Strength {
    /// Multiples of ten are strong, other multiples of five weak.
    pub fn of_graduation(value: i32) -> Self {
        if value % 10 == 0 {
            Strength::Strong
        } else {
            Strength::Weak
        }
    }

    fn legible(self, pensize: f64) -> bool {
        self == Strength::Strong || pensize >= WEAK_TICK_MIN_PENSIZE
    }
}

/// Horizon boundary: the chord at `y = -y` splitting sky from ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonChord {
    /// Half-length of the horizon chord.
    pub x: f64,
    /// Vertical offset; the horizon sits at `-y` on screen.
    pub y: f64,
    /// Angular half-span `atan2(y, x)` in degrees.
    pub g: f64,
}

impl HorizonChord {
    /// Sky arc as `(start, span)` in counter-clockwise screen degrees.
    pub fn sky_arc(&self) -> (f64, f64) {
        (self.g, 180.0 - 2.0 * self.g)
    }

    /// Ground arc, the complement of [`HorizonChord::sky_arc`].
    pub fn ground_arc(&self) -> (f64, f64) {
        (self.g, -(180.0 + 2.0 * self.g))
    }

    /// Horizon line endpoints, or `None` when the chord has collapsed to a
    /// point at the top or bottom of the disk.
    pub fn segment(&self) -> Option<(Point, Point)> {
        if self.x <= HORIZON_EPSILON {
            return None;
        }
        Some((Point::new(-self.x, -self.y), Point::new(self.x, -self.y)))
    }
}

pub fn horizon_chord(pitch: f64, fov: f64) -> HorizonChord {
    // beyond +-fov the display is all sky or all ground
    let clamped = pitch.clamp(-fov, fov);
    let y = 0.5 * clamped / fov;
    let x = (0.25 - y * y).max(0.0).sqrt();
    let g = y.atan2(x).to_degrees();
    HorizonChord { x, y, g }
}

/// One pitch-ladder graduation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rung {
    pub value: i32,
    pub strength: Strength,
    pub y: f64,
    pub half_length: f64,
    pub label: Option<String>,
}

impl Rung {
    pub fn endpoints(&self) -> (Point, Point) {
        (
            Point::new(-self.half_length, self.y),
            Point::new(self.half_length, self.y),
        )
    }
}

/// Rungs every 5 degrees over the visible window plus one step of margin on
/// each side, limited to `[-90, 90]`. Zero is skipped: the horizon line
/// already marks it.
pub fn pitch_ladder_rungs(pitch: f64, fov: f64, pensize: f64) -> Vec<Rung> {
    let step = f64::from(GRADUATION_STEP);
    let bottom = (((pitch - fov) / step - 1.0).floor() as i32 * GRADUATION_STEP).max(-90);
    let top = (((pitch + fov) / step + 1.0).ceil() as i32 * GRADUATION_STEP).min(90);

    (bottom..=top)
        .step_by(GRADUATION_STEP as usize)
        .filter(|&value| value != 0)
        .filter_map(|value| {
            let strength = Strength::of_graduation(value);
            if !strength.legible(pensize) {
                return None;
            }
            let (half_length, label) = match strength {
                Strength::Strong => (STRONG_RUNG_HALF_LENGTH, Some(value.abs().to_string())),
                Strength::Weak => (WEAK_RUNG_HALF_LENGTH, None),
            };
            Some(Rung {
                value,
                strength,
                y: 0.5 * (f64::from(value) - pitch) / fov,
                half_length,
                label,
            })
        })
        .collect()
}

/// One heading-tape graduation.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingTick {
    pub value: i32,
    pub strength: Strength,
    pub x: f64,
    /// Signed tick length; positive values extend up toward the sky.
    pub length: f64,
    pub label: Option<String>,
}

/// Which way heading ticks extend from the horizon: up (`1`) while the
/// nose is level or low, down (`-1`) once it is above the horizon so the
/// tape stays inside the disk.
pub fn heading_direction(pitch: f64) -> i32 {
    if pitch > 0.0 {
        -1
    } else {
        1
    }
}

pub fn heading_tape_ticks(yaw: f64, pitch: f64, fov: f64, pensize: f64) -> Vec<HeadingTick> {
    let dir = f64::from(heading_direction(pitch));
    let step = f64::from(GRADUATION_STEP);
    let left = ((yaw - fov * 0.5) / step).floor() as i32 * GRADUATION_STEP;
    let right = ((yaw + fov * 0.5) / step + 1.0).ceil() as i32 * GRADUATION_STEP;

    (left..=right)
        .step_by(GRADUATION_STEP as usize)
        .filter_map(|value| {
            let strength = Strength::of_graduation(value);
            if !strength.legible(pensize) {
                return None;
            }
            let (length, label) = match strength {
                Strength::Strong => (STRONG_HEADING_TICK, Some(value.wrap(0, 360).to_string())),
                Strength::Weak => (WEAK_HEADING_TICK, None),
            };
            Some(HeadingTick {
                value,
                strength,
                x: (f64::from(value) - yaw) / fov,
                length: length * dir,
                label,
            })
        })
        .collect()
}

/// Fixed graduation on the roll arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollMark {
    pub angle: f64,
    pub strength: Strength,
}

impl RollMark {
    const fn new(angle: f64, strength: Strength) -> Self {
        Self { angle, strength }
    }

    /// Tick length measured inward from the bezel.
    pub fn length(&self) -> f64 {
        match self.strength {
            Strength::Strong => 1.0 / 20.0,
            Strength::Weak => 1.0 / 40.0,
        }
    }
}

pub static ROLL_MARKS: [RollMark; 13] = [
    RollMark::new(-90.0, Strength::Strong),
    RollMark::new(-60.0, Strength::Strong),
    RollMark::new(-45.0, Strength::Weak),
    RollMark::new(-30.0, Strength::Strong),
    RollMark::new(-20.0, Strength::Weak),
    RollMark::new(-10.0, Strength::Weak),
    RollMark::new(0.0, Strength::Strong),
    RollMark::new(10.0, Strength::Weak),
    RollMark::new(20.0, Strength::Weak),
    RollMark::new(30.0, Strength::Strong),
    RollMark::new(45.0, Strength::Weak),
    RollMark::new(60.0, Strength::Strong),
    RollMark::new(90.0, Strength::Strong),
];

pub fn roll_scale_ticks() -> &'static [RollMark] {
    &ROLL_MARKS
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn level_horizon_is_full_diameter() {
        let chord = horizon_chord(0.0, 40.0);
        assert_eq!(chord.y, 0.0);
        assert_eq!(chord.x, 0.5);
        assert_eq!(chord.g, 0.0);
        assert_eq!(chord.sky_arc(), (0.0, 180.0));
        assert_eq!(chord.ground_arc(), (0.0, -180.0));
        let (a, b) = chord.segment().expect("level horizon has a segment");
        assert_eq!(a.distance(b), 1.0);
    }

    #[test]
    fn horizon_collapses_at_the_fov_limit() {
        let chord = horizon_chord(40.0, 40.0);
        assert_eq!(chord.y, 0.5);
        assert_eq!(chord.x, 0.0);
        assert_relative_eq!(chord.g, 90.0);
        assert!(chord.segment().is_none());
        // sky arc empty, ground covers the whole disk
        assert_relative_eq!(chord.sky_arc().1, 0.0);
        assert_relative_eq!(chord.ground_arc().1, -360.0);
    }

    #[test]
    fn pitch_beyond_fov_is_clamped_for_the_horizon_only() {
        assert_eq!(horizon_chord(75.0, 40.0), horizon_chord(40.0, 40.0));
        assert_eq!(horizon_chord(-75.0, 40.0), horizon_chord(-40.0, 40.0));
    }

    #[test]
    fn heading_ticks_carry_wrapped_labels() {
        let ticks = heading_tape_ticks(0.0, 0.0, 40.0, 512.0);
        let first = ticks.first().expect("ticks");
        assert_eq!(first.value, -20);
        assert_eq!(first.label.as_deref(), Some("340"));
        assert!(ticks.iter().all(|t| t.length > 0.0));
        let zero = ticks.iter().find(|t| t.value == 0).expect("zero tick");
        assert_eq!(zero.x, 0.0);
        assert_eq!(zero.label.as_deref(), Some("0"));
    }

    #[test]
    fn heading_ticks_flip_when_nose_high() {
        let ticks = heading_tape_ticks(90.0, 10.0, 40.0, 512.0);
        assert!(ticks.iter().all(|t| t.length < 0.0));
    }

    #[test]
    fn roll_marks_are_symmetric() {
        let marks = roll_scale_ticks();
        assert_eq!(marks.len(), 13);
        for (low, high) in marks.iter().zip(marks.iter().rev()) {
            assert_eq!(low.angle, -high.angle);
            assert_eq!(low.strength, high.strength);
        }
    }
}
