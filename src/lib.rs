// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

//! Software-rendered attitude indicator.
//!
//! Roll, pitch and yaw go in through [`AttitudeIndicator`]; a square RGBA
//! image of the instrument comes out, redrawn only after something changed.
//! The pipeline is [`angles`] → [`geometry`] → [`scene`] → [`raster`], with
//! [`cache`] deciding when it has to run.

pub mod angles;
pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod raster;
pub mod scene;
pub mod text;
pub mod transform;

pub use angles::{AngleChange, AngleModel, InstrumentState, Wrap};
pub use cache::{CacheState, RenderCache, RenderResources};
pub use config::{Color, IndicatorConfig, Palette, Style, SIZE_MAX, SIZE_MIN};
pub use error::IndicatorError;
pub use raster::Frame;

// External crate imports
use log::{debug, error, info, trace, warn};
use pixels::{Pixels, SurfaceTexture};
use rusttype::Font;

// Standard library imports
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Command enum for updates posted from other threads
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorCommand {
    SetRoll(f64),
    SetPitch(f64),
    SetYaw(f64),
    SetAttitude(f64, f64, f64), // roll, pitch, yaw
    RollBy(f64),
    PitchBy(f64),
    YawBy(f64),
    SetSupersample(bool),
    ToggleSupersample,
}

type Listener = Box<dyn FnMut(AngleChange)>;

/// Host adapter: owns the angle model and the render cache and wires them to
/// a window, or to any caller-provided RGBA surface via
/// [`AttitudeIndicator::render_to`].
pub struct AttitudeIndicator {
    config: IndicatorConfig,
    model: AngleModel,
    cache: RenderCache,
    resources: RenderResources,
    surface_size: (u32, u32),
    listeners: Vec<Listener>,
}

impl AttitudeIndicator {
    /// Loads the label font named in `config`, if any.
    pub fn new(config: IndicatorConfig) -> Result<Self, IndicatorError> {
        let font = config
            .font_path
            .as_deref()
            .map(text::load_font)
            .transpose()?;
        if font.is_none() {
            warn!("no label font configured, pitch and heading labels are disabled");
        }
        Ok(Self::with_font(config, font))
    }

    pub fn with_font(config: IndicatorConfig, font: Option<Font<'static>>) -> Self {
        let mut model = AngleModel::new(config.fov, config.supersample);
        model.set_roll(config.roll);
        model.set_pitch(config.pitch);
        model.set_yaw(config.yaw);
        let side = config.clamped_window_size();
        let resources = RenderResources::new(config.style.clone(), font);
        Self {
            config,
            model,
            cache: RenderCache::new(),
            resources,
            surface_size: (side, side),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn state(&self) -> InstrumentState {
        self.model.state()
    }

    pub fn roll(&self) -> f64 {
        self.model.roll()
    }

    pub fn pitch(&self) -> f64 {
        self.model.pitch()
    }

    pub fn yaw(&self) -> f64 {
        self.model.yaw()
    }

    pub fn supersample(&self) -> bool {
        self.model.supersample()
    }

    /// Registers a callback run after every stored change.
    pub fn subscribe(&mut self, listener: impl FnMut(AngleChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn set_roll(&mut self, value: f64) {
        let change = self.model.set_roll(value);
        self.notify(change);
    }

    pub fn set_pitch(&mut self, value: f64) {
        let change = self.model.set_pitch(value);
        self.notify(change);
    }

    pub fn set_yaw(&mut self, value: f64) {
        let change = self.model.set_yaw(value);
        self.notify(change);
    }

    pub fn set_supersample(&mut self, enabled: bool) {
        let change = self.model.set_supersample(enabled);
        self.notify(Some(change));
    }

    pub fn on_roll_delta(&mut self, degrees: f64) {
        let change = self.model.roll_by(degrees);
        self.notify(change);
    }

    pub fn on_pitch_delta(&mut self, degrees: f64) {
        let change = self.model.pitch_by(degrees);
        self.notify(change);
    }

    pub fn on_yaw_delta(&mut self, degrees: f64) {
        let change = self.model.yaw_by(degrees);
        self.notify(change);
    }

    /// Records the new surface size. The raster is kept while the short side,
    /// and so the instrument, stays the same.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        let previous = self.output_size();
        self.surface_size = (width, height);
        if self.output_size() != previous {
            debug!("surface resized to {width}x{height}");
            self.cache.invalidate();
        }
    }

    /// Side of the square instrument inside the current surface.
    pub fn output_size(&self) -> u32 {
        self.surface_size.0.min(self.surface_size.1)
    }

    pub fn needs_redraw(&self) -> bool {
        self.cache.is_dirty()
    }

    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    pub fn render_passes(&self) -> u64 {
        self.cache.render_passes()
    }

    pub fn apply(&mut self, command: IndicatorCommand) {
        trace!("applying {command:?}");
        match command {
            IndicatorCommand::SetRoll(value) => self.set_roll(value),
            IndicatorCommand::SetPitch(value) => self.set_pitch(value),
            IndicatorCommand::SetYaw(value) => self.set_yaw(value),
            IndicatorCommand::SetAttitude(roll, pitch, yaw) => {
                self.set_roll(roll);
                self.set_pitch(pitch);
                self.set_yaw(yaw);
            }
            IndicatorCommand::RollBy(delta) => self.on_roll_delta(delta),
            IndicatorCommand::PitchBy(delta) => self.on_pitch_delta(delta),
            IndicatorCommand::YawBy(delta) => self.on_yaw_delta(delta),
            IndicatorCommand::SetSupersample(enabled) => self.set_supersample(enabled),
            IndicatorCommand::ToggleSupersample => self.set_supersample(!self.supersample()),
        }
    }

    /// Arrow keys roll and pitch, Shift+Left/Right turn the heading, `S`
    /// toggles supersampling. Returns whether the key was used.
    pub fn handle_key(&mut self, key: &Key, shift: bool) -> bool {
        let step = self.config.key_step;
        match key {
            Key::Named(NamedKey::ArrowLeft) if shift => self.on_yaw_delta(-step),
            Key::Named(NamedKey::ArrowRight) if shift => self.on_yaw_delta(step),
            Key::Named(NamedKey::ArrowLeft) => self.on_roll_delta(-step),
            Key::Named(NamedKey::ArrowRight) => self.on_roll_delta(step),
            Key::Named(NamedKey::ArrowUp) => self.on_pitch_delta(step),
            Key::Named(NamedKey::ArrowDown) => self.on_pitch_delta(-step),
            Key::Character(c) if c.eq_ignore_ascii_case("s") => {
                self.set_supersample(!self.supersample())
            }
            _ => return false,
        }
        true
    }

    /// Rendered instrument for the current surface, regenerated only if the
    /// cache is dirty.
    pub fn request_frame(&mut self) -> &Frame {
        let side = self.output_size();
        self.cache
            .request_frame(side, &self.model.state(), &self.resources)
    }

    /// Paints the window background and the instrument, centered and
    /// smoothly scaled, into an RGBA `surface` of `width` x `height`.
    pub fn render_to(&mut self, surface: &mut [u8], width: u32, height: u32) {
        let background = self.resources.style.palette.window_background;
        for chunk in surface.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[background.r, background.g, background.b, 0xff]);
        }
        self.on_resize(width, height);
        let side = self.output_size();
        let left = i64::from((width - side) / 2);
        let top = i64::from((height - side) / 2);
        let frame = self.request_frame();
        frame.blit_scaled(
            surface,
            width as usize,
            height as usize,
            left,
            top,
            side as usize,
        );
    }

    fn notify(&mut self, change: Option<AngleChange>) {
        let Some(change) = change else {
            return;
        };
        trace!("{change:?}");
        self.cache.invalidate();
        for listener in &mut self.listeners {
            listener(change);
        }
    }

    pub fn show(&mut self) -> Result<(), IndicatorError> {
        self.run_window(None)
    }

    pub fn show_with_commands(
        &mut self,
        receiver: Receiver<IndicatorCommand>,
    ) -> Result<(), IndicatorError> {
        self.run_window(Some(receiver))
    }

    fn run_window(
        &mut self,
        receiver: Option<Receiver<IndicatorCommand>>,
    ) -> Result<(), IndicatorError> {
        let side = f64::from(self.config.clamped_window_size());
        let min = f64::from(SIZE_MIN);
        let max = f64::from(SIZE_MAX);

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(side, side))
            .with_min_inner_size(LogicalSize::new(min, min))
            .with_max_inner_size(LogicalSize::new(max, max))
            .with_resizable(true)
            .build(&event_loop)?;

        let window = std::sync::Arc::new(window);
        let window_clone = window.clone();
        let size = window.inner_size();
        let mut fb_width = size.width;
        let mut fb_height = size.height;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;
        info!("opened {}x{} instrument window", fb_width, fb_height);

        let frame_duration = Duration::from_secs_f64(1.0 / self.config.max_framerate.max(1.0));
        let mut shift = false;
        window.request_redraw();

        event_loop.run(move |event, window_target| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => window_target.exit(),
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        return;
                    }
                    fb_width = new_size.width;
                    fb_height = new_size.height;
                    let resized = pixels
                        .resize_buffer(fb_width, fb_height)
                        .and_then(|()| pixels.resize_surface(fb_width, fb_height));
                    if let Err(err) = resized {
                        error!("{}", IndicatorError::from(err));
                        window_target.exit();
                        return;
                    }
                    self.on_resize(fb_width, fb_height);
                    window_clone.request_redraw();
                }
                WindowEvent::ModifiersChanged(modifiers) => {
                    shift = modifiers.state().shift_key();
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    if logical_key == Key::Named(NamedKey::Escape) {
                        window_target.exit();
                    } else if self.handle_key(&logical_key, shift) && self.needs_redraw() {
                        window_clone.request_redraw();
                    }
                }
                WindowEvent::RedrawRequested => {
                    self.render_to(pixels.frame_mut(), fb_width, fb_height);
                    if let Err(err) = pixels.render() {
                        error!("{}", IndicatorError::from(err));
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => match receiver {
                Some(ref receiver) => {
                    while let Ok(command) = receiver.try_recv() {
                        self.apply(command);
                    }
                    if self.needs_redraw() {
                        window_clone.request_redraw();
                    }
                    window_target
                        .set_control_flow(ControlFlow::WaitUntil(Instant::now() + frame_duration));
                }
                None => window_target.set_control_flow(ControlFlow::Wait),
            },
            _ => {}
        })?;

        Ok(())
    }
}
