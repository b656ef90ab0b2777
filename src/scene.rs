// ============================================================================
// RETAINED MODE SCENE & COMPOSITION
// ============================================================================

//! Turns an [`InstrumentState`] into an ordered list of device-space draw
//! commands, then replays that list into a [`Frame`].
//!
//! Draw order, each step in its own transform scope:
//!
//! 1. background: sky and ground chords plus the horizon line, rotated by roll
//! 2. pitch ladder: rungs and labels in the label frame
//! 3. heading tape: ticks and labels in the label frame
//! 4. overlay: roll pointer, target, bezel and roll scale, always on top
//!
//! The label frame keeps rotation but drops the aggregate zoom, so strokes
//! there are measured in raster pixels and labels can be placed upright.

use std::ops::Range;

use log::trace;
use rusttype::Font;

use crate::angles::InstrumentState;
use crate::config::{Color, Style};
use crate::geometry::{
    heading_direction, heading_tape_ticks, horizon_chord, pitch_ladder_rungs, roll_scale_ticks,
};
use crate::raster::{Blend, Frame};
use crate::text::TextMeasure;
use crate::transform::{Point, Transform, TransformStack};

/// Aircraft symbol, a polyline in the unit square (drawn under a half turn).
pub const TARGET_GLYPH: [Point; 5] = [
    Point::new(-1.0 / 4.0, 0.0),
    Point::new(-1.0 / 16.0, 0.0),
    Point::new(0.0, -1.0 / 32.0),
    Point::new(1.0 / 16.0, 0.0),
    Point::new(1.0 / 4.0, 0.0),
];

/// Fixed roll pointer, a closed triangle just inside the bezel.
pub const ROLL_POINTER_GLYPH: [Point; 3] = [
    Point::new(-1.0 / 32.0, 14.0 / 32.0),
    Point::new(0.0, 15.0 / 32.0),
    Point::new(1.0 / 32.0, 14.0 / 32.0),
];

const BEZEL_RADIUS: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    /// Region between an arc and its chord; angles in counter-clockwise
    /// screen degrees.
    Chord {
        center: Point,
        radius: f64,
        start: f64,
        span: f64,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        thickness: f32,
        color: Color,
        blend: Blend,
    },
    Path {
        points: Vec<Point>,
        closed: bool,
        fill: Option<Color>,
        stroke: Option<(Color, f32)>,
    },
    Circle {
        center: Point,
        radius: f64,
        thickness: f32,
        color: Color,
    },
    /// Upright text centered on `center`.
    Text {
        center: Point,
        text: String,
        size: f32,
        color: Color,
        blend: Blend,
    },
}

/// Composition steps, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Background,
    PitchLadder,
    HeadingTape,
    Overlay,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
    steps: Vec<(Step, usize)>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Marks the start of `step`; later commands belong to it.
    pub fn begin(&mut self, step: Step) {
        self.steps.push((step, self.commands.len()));
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands emitted by `step`, empty if the step never ran.
    pub fn step(&self, step: Step) -> &[DrawCommand] {
        &self.commands[self.step_range(step)]
    }

    fn step_range(&self, step: Step) -> Range<usize> {
        let Some(pos) = self.steps.iter().position(|(s, _)| *s == step) else {
            return 0..0;
        };
        let start = self.steps[pos].1;
        let end = self
            .steps
            .get(pos + 1)
            .map_or(self.commands.len(), |(_, next)| *next);
        start..end
    }

    /// Replays every command into `frame`. Text is skipped without a font.
    pub fn render(&self, frame: &mut Frame, font: Option<&Font>) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => frame.clear(*color),
                DrawCommand::Chord {
                    center,
                    radius,
                    start,
                    span,
                    color,
                } => frame.fill_chord(*center, *radius, *start, *span, *color),
                DrawCommand::Line {
                    from,
                    to,
                    thickness,
                    color,
                    blend,
                } => frame.draw_thick_line_aa(*from, *to, *thickness, *color, *blend),
                DrawCommand::Path {
                    points,
                    closed,
                    fill,
                    stroke,
                } => {
                    if let Some(color) = fill {
                        frame.fill_polygon(points, *color);
                    }
                    if let Some((color, thickness)) = stroke {
                        frame.stroke_polyline(points, *closed, *thickness, *color);
                    }
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    thickness,
                    color,
                } => frame.stroke_circle(*center, *radius, *thickness, *color),
                DrawCommand::Text {
                    center,
                    text,
                    size,
                    color,
                    blend,
                } => {
                    if let Some(font) = font {
                        frame.draw_text(*center, text, font, *size, *color, *blend);
                    }
                }
            }
        }
    }
}

/// Raster geometry for one render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Side of the square raster buffer in pixels.
    pub side: f64,
    /// Side of the displayed instrument, before supersampling. Drives label
    /// size and the weak graduation cutoff.
    pub pensize: f64,
    pub factor: u32,
}

impl Viewport {
    pub fn new(output_size: u32, factor: u32) -> Self {
        Self {
            side: f64::from(output_size) * f64::from(factor),
            pensize: f64::from(output_size),
            factor,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.side / 2.0, self.side / 2.0)
    }

    /// Maps the normalized instrument square onto the raster buffer.
    pub fn base_transform(&self) -> Transform {
        let center = self.center();
        Transform::IDENTITY
            .translate(center.x, center.y)
            .scale(self.side, self.side)
    }

    fn stroke(&self, display_pixels: f32) -> f32 {
        display_pixels * self.factor as f32
    }
}

struct Composer<'a> {
    state: InstrumentState,
    viewport: Viewport,
    style: &'a Style,
    text: Option<&'a dyn TextMeasure>,
    scene: Scene,
}

/// Builds the full scene. Pass `None` for `text` to omit labels.
pub fn compose(
    state: &InstrumentState,
    viewport: Viewport,
    style: &Style,
    text: Option<&dyn TextMeasure>,
) -> Scene {
    let mut composer = Composer {
        state: *state,
        viewport,
        style,
        text,
        scene: Scene::new(),
    };
    composer.scene.add_command(DrawCommand::Clear(Color::TRANSPARENT));

    let mut stack = TransformStack::new(viewport.base_transform());
    stack.scoped(|s| composer.background(s));
    stack.scoped(|s| composer.pitch_ladder(s));
    stack.scoped(|s| composer.heading_tape(s));
    stack.scoped(|s| composer.overlay(s));
    debug_assert_eq!(stack.current(), viewport.base_transform());

    trace!(
        "composed {} commands for roll={} pitch={} yaw={}",
        composer.scene.commands.len(),
        state.roll,
        state.pitch,
        state.yaw
    );
    composer.scene
}

impl Composer<'_> {
    fn background(&mut self, s: &mut TransformStack) {
        self.scene.begin(Step::Background);
        let palette = &self.style.palette;
        s.rotate(self.state.roll);

        let chord = horizon_chord(self.state.pitch, self.state.fov);
        let t = s.current();
        let center = t.map(Point::default());
        let radius = BEZEL_RADIUS * t.scale_factor();
        let rotation = t.rotation_degrees();

        for ((start, span), color) in [
            (chord.sky_arc(), palette.sky),
            (chord.ground_arc(), palette.ground),
        ] {
            self.scene.add_command(DrawCommand::Chord {
                center,
                radius,
                start: start - rotation,
                span,
                color,
            });
        }

        if let Some((left, right)) = chord.segment() {
            self.scene.add_command(DrawCommand::Line {
                from: t.map(left),
                to: t.map(right),
                thickness: self.viewport.stroke(self.style.strokes.horizon),
                color: palette.horizon,
                blend: Blend::SourceOver,
            });
        }
    }

    /// Rotates by roll and switches to the label frame. Returns the
    /// unrotated mapper used to place points before the frame applies.
    fn enter_label_frame(&self, s: &mut TransformStack) -> Transform {
        let mapper = s.current();
        s.rotate(self.state.roll);
        s.overlay(self.viewport.side, self.viewport.center());
        mapper
    }

    fn pitch_ladder(&mut self, s: &mut TransformStack) {
        self.scene.begin(Step::PitchLadder);
        let mapper = self.enter_label_frame(s);
        let frame = s.current();
        let color = self.style.palette.pitch_ladder;
        let thickness = self.viewport.stroke(self.style.strokes.pitch_ladder);
        let margin = f64::from(self.viewport.stroke(self.style.labels.pitch_margin));
        let size = self
            .style
            .labels
            .pixel_size(self.viewport.pensize, self.viewport.factor);

        for rung in pitch_ladder_rungs(self.state.pitch, self.state.fov, self.viewport.pensize) {
            let (left, right) = rung.endpoints();
            let (left, right) = (mapper.map(left), mapper.map(right));
            self.scene.add_command(DrawCommand::Line {
                from: frame.map(left),
                to: frame.map(right),
                thickness,
                color,
                blend: Blend::SourceAtop,
            });

            let (Some(label), Some(measure)) = (rung.label, self.text) else {
                continue;
            };
            let bounds = measure.text_box(&label, size);
            let anchors = [
                Point::new(left.x - margin - bounds.width / 2.0, left.y),
                Point::new(right.x + margin + bounds.width / 2.0, right.y),
            ];
            for anchor in anchors {
                self.scene.add_command(DrawCommand::Text {
                    center: frame.map(anchor),
                    text: label.clone(),
                    size,
                    color,
                    blend: Blend::SourceAtop,
                });
            }
        }
    }

    fn heading_tape(&mut self, s: &mut TransformStack) {
        self.scene.begin(Step::HeadingTape);
        let horizon_y = horizon_chord(self.state.pitch, self.state.fov).y;
        let mapper = self.enter_label_frame(s);
        let frame = s.current();
        let color = self.style.palette.heading_tape;
        let thickness = self.viewport.stroke(self.style.strokes.heading_tape);
        let gap = f64::from(self.viewport.stroke(self.style.labels.heading_margin));
        let upward = heading_direction(self.state.pitch) > 0;
        let size = self
            .style
            .labels
            .pixel_size(self.viewport.pensize, self.viewport.factor);

        let ticks = heading_tape_ticks(
            self.state.yaw,
            self.state.pitch,
            self.state.fov,
            self.viewport.pensize,
        );
        for tick in ticks {
            let root = mapper.map(Point::new(tick.x, -horizon_y));
            let tip = mapper.map(Point::new(tick.x, -horizon_y - tick.length));
            self.scene.add_command(DrawCommand::Line {
                from: frame.map(root),
                to: frame.map(tip),
                thickness,
                color,
                blend: Blend::SourceAtop,
            });

            let (Some(label), Some(measure)) = (tick.label, self.text) else {
                continue;
            };
            let bounds = measure.text_box(&label, size);
            let offset = gap + bounds.height / 2.0;
            let anchor = if upward {
                Point::new(tip.x, tip.y - offset)
            } else {
                Point::new(tip.x, tip.y + offset)
            };
            self.scene.add_command(DrawCommand::Text {
                center: frame.map(anchor),
                text: label,
                size,
                color,
                blend: Blend::SourceAtop,
            });
        }
    }

    fn overlay(&mut self, s: &mut TransformStack) {
        self.scene.begin(Step::Overlay);
        let palette = &self.style.palette;
        let strokes = &self.style.strokes;

        s.rotate(180.0);
        let t = s.current();
        self.scene.add_command(DrawCommand::Path {
            points: ROLL_POINTER_GLYPH.iter().map(|&p| t.map(p)).collect(),
            closed: true,
            fill: Some(palette.roll_pointer),
            stroke: Some((palette.furniture, self.viewport.stroke(strokes.roll_pointer))),
        });
        self.scene.add_command(DrawCommand::Path {
            points: TARGET_GLYPH.iter().map(|&p| t.map(p)).collect(),
            closed: false,
            fill: None,
            stroke: Some((palette.furniture, self.viewport.stroke(strokes.target))),
        });

        s.rotate(self.state.roll);
        let t = s.current();
        self.scene.add_command(DrawCommand::Circle {
            center: t.map(Point::default()),
            radius: BEZEL_RADIUS * t.scale_factor(),
            thickness: self.viewport.stroke(strokes.bezel),
            color: palette.furniture,
        });

        let base = Point::new(0.0, BEZEL_RADIUS);
        let thickness = self.viewport.stroke(strokes.roll_ticks);
        for mark in roll_scale_ticks() {
            let (from, to) = s.scoped(|s| {
                s.rotate(-mark.angle);
                (
                    s.map(base),
                    s.map(Point::new(0.0, BEZEL_RADIUS - mark.length())),
                )
            });
            self.scene.add_command(DrawCommand::Line {
                from,
                to,
                thickness,
                color: palette.furniture,
                blend: Blend::SourceOver,
            });
        }
    }
}
