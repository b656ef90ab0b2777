use approx::assert_relative_eq;
use attitude_indicator::scene::{compose, DrawCommand, Scene, Step, Viewport};
use attitude_indicator::text::{TextBox, TextMeasure};
use attitude_indicator::transform::Point;
use attitude_indicator::{Color, InstrumentState, Style};

/// Every glyph half as wide as it is tall.
struct FixedAdvance;

impl TextMeasure for FixedAdvance {
    fn text_box(&self, text: &str, size: f32) -> TextBox {
        TextBox {
            width: text.len() as f64 * f64::from(size) * 0.5,
            height: f64::from(size),
        }
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn state(roll: f64, pitch: f64, yaw: f64) -> InstrumentState {
    InstrumentState {
        roll,
        pitch,
        yaw,
        ..InstrumentState::default()
    }
}

fn scene(state: InstrumentState, output_size: u32, factor: u32) -> Scene {
    compose(
        &state,
        Viewport::new(output_size, factor),
        &Style::default(),
        Some(&FixedAdvance),
    )
}

fn lines(commands: &[DrawCommand]) -> Vec<(Point, Point, f32)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Line {
                from, to, thickness, ..
            } => Some((*from, *to, *thickness)),
            _ => None,
        })
        .collect()
}

fn texts(commands: &[DrawCommand]) -> Vec<(Point, String)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Text { center, text, .. } => Some((*center, text.clone())),
            _ => None,
        })
        .collect()
}

fn chords(commands: &[DrawCommand]) -> Vec<(Point, f64, f64, f64)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Chord {
                center,
                radius,
                start,
                span,
                ..
            } => Some((*center, *radius, *start, *span)),
            _ => None,
        })
        .collect()
}

#[test]
fn level_flight_splits_the_disk_in_half() {
    init();
    let scene = scene(state(0.0, 0.0, 0.0), 200, 1);
    assert_eq!(scene.commands()[0], DrawCommand::Clear(Color::TRANSPARENT));

    let background = scene.step(Step::Background);
    let chords = chords(background);
    assert_eq!(chords.len(), 2);
    let (center, radius, start, span) = chords[0];
    assert_eq!(center, Point::new(100.0, 100.0));
    assert_relative_eq!(radius, 100.0);
    assert_relative_eq!(start, 0.0);
    assert_relative_eq!(span, 180.0);
    let (_, _, start, span) = chords[1];
    assert_relative_eq!(start, 0.0);
    assert_relative_eq!(span, -180.0);

    let horizon = lines(background);
    assert_eq!(horizon.len(), 1);
    let (from, to, thickness) = horizon[0];
    assert_relative_eq!(from.distance(to), 200.0, epsilon = 1e-9);
    assert_relative_eq!(from.y, 100.0, epsilon = 1e-9);
    assert_eq!(thickness, 2.0);
}

#[test]
fn roll_turns_the_background_but_not_the_labels() {
    init();
    let scene = scene(state(30.0, 0.0, 0.0), 200, 1);
    let chords = chords(scene.step(Step::Background));
    assert_relative_eq!(chords[0].2, -30.0, epsilon = 1e-9);
    assert_relative_eq!(chords[1].2, -30.0, epsilon = 1e-9);

    let ladder = scene.step(Step::PitchLadder);
    let rungs = lines(ladder);
    let labels = texts(ladder);
    assert_eq!(labels.len(), 2 * 8);

    // each strong rung owns a label pair placed symmetrically about its middle
    for (rung, pair) in rungs.iter().zip(labels.chunks(2)) {
        let (from, to, _) = *rung;
        let rung_mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
        let (left, right) = (pair[0].0, pair[1].0);
        assert_eq!(pair[0].1, pair[1].1);
        assert_relative_eq!((left.x + right.x) / 2.0, rung_mid.x, epsilon = 1e-9);
        assert_relative_eq!((left.y + right.y) / 2.0, rung_mid.y, epsilon = 1e-9);
        // labels sit on the rotated rung axis, beyond its ends
        assert!(left.distance(right) > from.distance(to));
        let slope = (to.y - from.y) / (to.x - from.x);
        let label_slope = (right.y - left.y) / (right.x - left.x);
        assert_relative_eq!(slope, label_slope, epsilon = 1e-9);
    }
}

#[test]
fn weak_rungs_need_a_large_enough_instrument() {
    init();
    let small = scene(state(0.0, 0.0, 0.0), 200, 1);
    assert_eq!(lines(small.step(Step::PitchLadder)).len(), 8);

    let large = scene(state(0.0, 0.0, 0.0), 300, 1);
    assert_eq!(lines(large.step(Step::PitchLadder)).len(), 18);
    // only strong rungs are labeled
    assert_eq!(texts(large.step(Step::PitchLadder)).len(), 16);
}

#[test]
fn pitch_labels_read_unsigned() {
    init();
    let scene = scene(state(0.0, 0.0, 0.0), 200, 1);
    let labels: Vec<String> = texts(scene.step(Step::PitchLadder))
        .into_iter()
        .map(|(_, text)| text)
        .collect();
    assert!(labels.iter().all(|l| !l.starts_with('-')));
    assert_eq!(labels.iter().filter(|l| *l == "10").count(), 4);
}

#[test]
fn horizon_line_vanishes_at_the_field_of_view_edge() {
    init();
    for pitch in [40.0, 60.0, -40.0, -90.0] {
        let scene = scene(state(0.0, pitch, 0.0), 200, 1);
        let background = scene.step(Step::Background);
        assert_eq!(chords(background).len(), 2);
        assert!(lines(background).is_empty(), "pitch {pitch}");
    }
}

#[test]
fn heading_tape_labels_wrap_through_north() {
    init();
    let scene = scene(state(0.0, 0.0, 0.0), 300, 1);
    let tape = scene.step(Step::HeadingTape);
    assert_eq!(lines(tape).len(), 10);
    let labels: Vec<String> = texts(tape).into_iter().map(|(_, t)| t).collect();
    assert_eq!(labels, ["340", "350", "0", "10", "20"]);

    // level nose: ticks and labels rise above the horizon
    for (from, to, _) in lines(tape) {
        assert!(to.y < from.y);
    }
    for (center, _) in texts(tape) {
        assert!(center.y < 150.0);
    }
}

#[test]
fn heading_tape_hangs_below_a_high_horizon() {
    init();
    let scene = scene(state(0.0, 10.0, 90.0), 300, 1);
    let tape = scene.step(Step::HeadingTape);
    for (from, to, _) in lines(tape) {
        assert!(to.y > from.y);
    }
}

#[test]
fn overlay_draws_last_with_a_fixed_roll_scale() {
    init();
    let scene = scene(state(0.0, 0.0, 0.0), 200, 1);
    let overlay = scene.step(Step::Overlay);
    let total = scene.commands().len();
    assert_eq!(&scene.commands()[total - overlay.len()..], overlay);

    let paths = overlay
        .iter()
        .filter(|c| matches!(c, DrawCommand::Path { .. }))
        .count();
    let circles = overlay
        .iter()
        .filter(|c| matches!(c, DrawCommand::Circle { .. }))
        .count();
    assert_eq!((paths, circles), (2, 1));

    let ticks = lines(overlay);
    assert_eq!(ticks.len(), 13);
    // the zero mark hangs from the top of the bezel
    let (from, to, _) = ticks[6];
    assert_relative_eq!(from.x, 100.0, epsilon = 1e-9);
    assert_relative_eq!(from.y, 0.0, epsilon = 1e-9);
    assert_relative_eq!(to.y, 10.0, epsilon = 1e-9);

    // the roll pointer sits at the top, inside the bezel
    let Some(DrawCommand::Path { points, closed, .. }) = overlay.first() else {
        panic!("roll pointer missing");
    };
    assert!(*closed);
    assert!(points.iter().all(|p| p.y < 100.0 && p.y > 0.0));
}

fn paths(commands: &[DrawCommand]) -> Vec<Vec<Point>> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Path { points, .. } => Some(points.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn roll_turns_the_scale_but_not_the_pointer_or_target() {
    init();
    let level = scene(state(0.0, 0.0, 0.0), 200, 1);
    let banked = scene(state(30.0, 0.0, 0.0), 200, 1);
    let overlay = banked.step(Step::Overlay);

    // pointer and target are fixed furniture
    assert_eq!(paths(overlay), paths(level.step(Step::Overlay)));

    // the zero mark follows roll around the bezel
    let (from, to, _) = lines(overlay)[6];
    let angle = 30.0_f64.to_radians();
    assert_relative_eq!(from.x, 100.0 + 100.0 * angle.sin(), epsilon = 1e-9);
    assert_relative_eq!(from.y, 100.0 - 100.0 * angle.cos(), epsilon = 1e-9);
    assert_relative_eq!(to.x, 100.0 + 90.0 * angle.sin(), epsilon = 1e-9);
    assert_relative_eq!(to.y, 100.0 - 90.0 * angle.cos(), epsilon = 1e-9);

    // every mark keeps its place relative to the zero mark
    for ((from, _, _), (level_from, _, _)) in lines(overlay)
        .into_iter()
        .zip(lines(level.step(Step::Overlay)))
    {
        let center = Point::new(100.0, 100.0);
        assert_relative_eq!(from.distance(center), 100.0, epsilon = 1e-9);
        let turned = (from.y - 100.0).atan2(from.x - 100.0)
            - (level_from.y - 100.0).atan2(level_from.x - 100.0);
        let turned = turned.to_degrees().rem_euclid(360.0);
        assert_relative_eq!(turned, 30.0, epsilon = 1e-6);
    }

    let Some(DrawCommand::Circle { center, .. }) = overlay
        .iter()
        .find(|c| matches!(c, DrawCommand::Circle { .. }))
    else {
        panic!("bezel missing");
    };
    assert_relative_eq!(center.x, 100.0, epsilon = 1e-9);
    assert_relative_eq!(center.y, 100.0, epsilon = 1e-9);
}

#[test]
fn banked_heading_labels_stay_on_their_tick_axis() {
    init();
    let scene = scene(state(30.0, 0.0, 0.0), 300, 1);
    let tape = scene.step(Step::HeadingTape);
    let ticks = lines(tape);
    let labels = texts(tape);
    assert_eq!(labels.len(), 5);

    // labels are upright glyph runs anchored beyond the rotated tick tip
    for (center, text) in &labels {
        let (from, to, _) = ticks
            .iter()
            .copied()
            .min_by(|a, b| a.1.distance(*center).total_cmp(&b.1.distance(*center)))
            .expect("tick for label");
        let axis = Point::new(to.x - from.x, to.y - from.y);
        let offset = Point::new(center.x - to.x, center.y - to.y);
        let cross = axis.x * offset.y - axis.y * offset.x;
        let dot = axis.x * offset.x + axis.y * offset.y;
        assert_relative_eq!(cross, 0.0, epsilon = 1e-6);
        assert!(dot > 0.0, "label {text} points back into its tick");
    }
}

#[test]
fn supersampling_doubles_buffer_geometry() {
    init();
    let plain = scene(state(0.0, 0.0, 0.0), 200, 1);
    let doubled = scene(state(0.0, 0.0, 0.0), 200, 2);
    let (from, to, thickness) = lines(doubled.step(Step::Background))[0];
    assert_relative_eq!(from.distance(to), 400.0, epsilon = 1e-9);
    assert_eq!(thickness, 4.0);
    // pensize is the displayed side, so graduation density is unchanged
    assert_eq!(
        lines(plain.step(Step::PitchLadder)).len(),
        lines(doubled.step(Step::PitchLadder)).len()
    );
}

#[test]
fn labels_are_omitted_without_a_measure() {
    init();
    let scene = compose(
        &state(0.0, 0.0, 0.0),
        Viewport::new(300, 1),
        &Style::default(),
        None,
    );
    assert!(texts(scene.commands()).is_empty());
    assert_eq!(lines(scene.step(Step::PitchLadder)).len(), 18);
}
