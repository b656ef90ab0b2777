// ============================================================================
// RENDER CACHE
// ============================================================================

//! Holds the rasterized instrument and regenerates it only when something it
//! depends on has changed.
//!
//! ```text
//!            invalidate() / size change
//!   Clean  ----------------------------->  Dirty
//!          <-----------------------------
//!            request_frame() raster pass
//! ```
//!
//! The cache starts dirty. Nothing time-based ever invalidates it.

use log::debug;
use rusttype::Font;

use crate::angles::InstrumentState;
use crate::config::Style;
use crate::raster::Frame;
use crate::scene::{compose, Viewport};
use crate::text::TextMeasure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Clean,
    Dirty,
}

/// Fonts and styling shared by every raster pass.
pub struct RenderResources {
    pub style: Style,
    pub font: Option<Font<'static>>,
}

impl RenderResources {
    pub fn new(style: Style, font: Option<Font<'static>>) -> Self {
        Self { style, font }
    }
}

#[derive(Debug)]
pub struct RenderCache {
    frame: Frame,
    state: CacheState,
    output_size: u32,
    factor: u32,
    render_passes: u64,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderCache {
    pub fn new() -> Self {
        Self {
            frame: Frame::default(),
            state: CacheState::Dirty,
            output_size: 0,
            factor: 0,
            render_passes: 0,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == CacheState::Dirty
    }

    /// Display side the cached frame was rendered for.
    pub fn output_size(&self) -> u32 {
        self.output_size
    }

    /// Number of full raster passes run so far.
    pub fn render_passes(&self) -> u64 {
        self.render_passes
    }

    pub fn invalidate(&mut self) {
        if self.state == CacheState::Clean {
            debug!("render cache invalidated");
        }
        self.state = CacheState::Dirty;
    }

    /// Returns the instrument rendered at `output_size * factor` pixels per
    /// side, re-rasterizing only when dirty or when the size or factor changed.
    /// The caller scales the result down to `output_size` for display.
    ///
    /// A zero `output_size` yields an empty frame and no raster pass.
    pub fn request_frame(
        &mut self,
        output_size: u32,
        instrument: &InstrumentState,
        resources: &RenderResources,
    ) -> &Frame {
        let factor = instrument.supersample_factor();
        if output_size != self.output_size || factor != self.factor {
            self.output_size = output_size;
            self.factor = factor;
            self.state = CacheState::Dirty;
        }
        if output_size == 0 {
            self.frame.resize(0, 0);
            return &self.frame;
        }
        if self.state == CacheState::Clean {
            return &self.frame;
        }

        let viewport = Viewport::new(output_size, factor);
        let side = viewport.side as usize;
        self.frame.resize(side, side);

        let measure = resources.font.as_ref().map(|f| f as &dyn TextMeasure);
        let scene = compose(instrument, viewport, &resources.style, measure);
        scene.render(&mut self.frame, resources.font.as_ref());

        self.render_passes += 1;
        self.state = CacheState::Clean;
        debug!(
            "render pass {}: {}px at {}x ({} commands)",
            self.render_passes,
            output_size,
            factor,
            scene.commands().len()
        );
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources() -> RenderResources {
        RenderResources::new(Style::default(), None)
    }

    #[test]
    fn starts_dirty_and_cleans_on_first_request() {
        let mut cache = RenderCache::new();
        assert_eq!(cache.state(), CacheState::Dirty);
        let frame = cache.request_frame(200, &InstrumentState::default(), &resources());
        assert_eq!((frame.width(), frame.height()), (400, 400));
        assert_eq!(cache.state(), CacheState::Clean);
        assert_eq!(cache.render_passes(), 1);
    }

    #[test]
    fn zero_size_is_a_no_op() {
        let mut cache = RenderCache::new();
        let frame = cache.request_frame(0, &InstrumentState::default(), &resources());
        assert!(frame.is_empty());
        assert_eq!(cache.render_passes(), 0);
        assert!(cache.is_dirty());
    }
}
