use std::path::PathBuf;

use bon::Builder;

use crate::angles::DEFAULT_FOV;

/// Smallest instrument side the host allows, in logical pixels.
pub const SIZE_MIN: u32 = 200;
/// Largest instrument side the host allows, in logical pixels.
pub const SIZE_MAX: u32 = 600;

/// Color representation for instrument elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Colors of every painted element
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub sky: Color,
    pub ground: Color,
    pub horizon: Color,
    pub pitch_ladder: Color,
    pub heading_tape: Color,
    pub furniture: Color,
    pub roll_pointer: Color,
    pub window_background: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            sky: Color::new(48, 172, 220),
            ground: Color::new(247, 168, 21),
            horizon: Color::WHITE,
            pitch_ladder: Color::WHITE,
            heading_tape: Color::new(0x00, 0xff, 0x00),
            furniture: Color::BLACK,
            roll_pointer: Color::new(0x00, 0x80, 0x00),
            window_background: Color::new(0xef, 0xef, 0xef),
        }
    }
}

/// Stroke widths in display pixels; the composer multiplies them by the
/// supersample factor.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeConfig {
    pub horizon: f32,
    pub pitch_ladder: f32,
    pub heading_tape: f32,
    pub bezel: f32,
    pub roll_pointer: f32,
    pub target: f32,
    pub roll_ticks: f32,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            horizon: 2.0,
            pitch_ladder: 2.0,
            heading_tape: 2.0,
            bezel: 2.0,
            roll_pointer: 2.0,
            target: 4.0,
            roll_ticks: 2.0,
        }
    }
}

/// Label sizing and placement, in display pixels and points
#[derive(Debug, Clone, PartialEq)]
pub struct LabelConfig {
    pub min_points: f32,
    pub max_points: f32,
    /// Points per 1000 pixels of instrument side.
    pub points_per_kilopixel: f32,
    pub pitch_margin: f32,
    pub heading_margin: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            min_points: 8.0,
            max_points: 32.0,
            points_per_kilopixel: 32.0,
            pitch_margin: 5.0,
            heading_margin: 2.0,
        }
    }
}

impl LabelConfig {
    const PIXELS_PER_POINT: f32 = 96.0 / 72.0;

    /// Label height in raster pixels for a display side of `pensize`.
    pub fn pixel_size(&self, pensize: f64, supersample_factor: u32) -> f32 {
        let points = (self.points_per_kilopixel * pensize as f32 / 1000.0)
            .clamp(self.min_points, self.max_points);
        points * Self::PIXELS_PER_POINT * supersample_factor as f32
    }
}

/// Everything the composer needs besides the angles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub palette: Palette,
    pub strokes: StrokeConfig,
    pub labels: LabelConfig,
}

#[derive(Debug, Clone, Builder)]
pub struct IndicatorConfig {
    #[builder(default = "Attitude Indicator".to_string())]
    pub title: String,

    /// Degrees; normalized by [`AngleModel::new`](crate::angles::AngleModel::new).
    #[builder(default = DEFAULT_FOV)]
    pub fov: f64,
    #[builder(default = true)]
    pub supersample: bool,

    // Initial attitude
    #[builder(default = 0.0)]
    pub roll: f64,
    #[builder(default = 0.0)]
    pub pitch: f64,
    #[builder(default = 0.0)]
    pub yaw: f64,

    // Window configuration
    #[builder(default = SIZE_MIN)]
    pub window_size: u32,
    #[builder(default = 60.0)]
    pub max_framerate: f64,

    // Keyboard steps, in degrees
    #[builder(default = 1.0)]
    pub key_step: f64,

    #[builder(default)]
    pub style: Style,

    /// TrueType/OpenType file for labels; without one labels are omitted.
    pub font_path: Option<PathBuf>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IndicatorConfig {
    /// Instrument side the host should open with, kept within
    /// [`SIZE_MIN`]..=[`SIZE_MAX`].
    pub fn clamped_window_size(&self) -> u32 {
        self.window_size.clamp(SIZE_MIN, SIZE_MAX)
    }
}
