// ============================================================================
// TEXT MEASUREMENT
// ============================================================================

use std::path::Path;

use rusttype::{point, Font, PositionedGlyph, Rect, Scale};

use crate::error::IndicatorError;

/// Pixel extent of a laid-out string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub width: f64,
    pub height: f64,
}

/// Bounding boxes for short numeric labels. The composer only places
/// labels; drawing the glyphs is the rasterizer's job.
pub trait TextMeasure {
    fn text_box(&self, text: &str, size: f32) -> TextBox;
}

impl TextMeasure for Font<'_> {
    fn text_box(&self, text: &str, size: f32) -> TextBox {
        GlyphRun::layout(self, text, size).text_box()
    }
}

/// Laid-out glyphs of one label and the union of their pixel boxes. Shared by
/// measurement and drawing so a label lands where it was measured.
pub(crate) struct GlyphRun<'f> {
    pub glyphs: Vec<PositionedGlyph<'f>>,
    pub bounds: Option<Rect<i32>>,
}

impl<'f> GlyphRun<'f> {
    pub fn layout(font: &'f Font<'f>, text: &str, size: f32) -> Self {
        let scale = Scale::uniform(size);
        let ascent = font.v_metrics(scale).ascent;
        let glyphs: Vec<PositionedGlyph> = font.layout(text, scale, point(0.0, ascent)).collect();
        let bounds = pixel_union(glyphs.iter().filter_map(|g| g.pixel_bounding_box()));
        Self { glyphs, bounds }
    }

    pub fn text_box(&self) -> TextBox {
        self.bounds.map_or(TextBox { width: 0.0, height: 0.0 }, |bb| TextBox {
            width: f64::from(bb.width()),
            height: f64::from(bb.height()),
        })
    }
}

/// Smallest box holding every input box, `None` if nothing has area.
fn pixel_union(boxes: impl IntoIterator<Item = Rect<i32>>) -> Option<Rect<i32>> {
    let (min_x, max_x, min_y, max_y) = boxes.into_iter().fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    (min_x < max_x && min_y < max_y).then(|| Rect {
        min: point(min_x, min_y),
        max: point(max_x, max_y),
    })
}

pub fn load_font(path: &Path) -> Result<Font<'static>, IndicatorError> {
    let data = std::fs::read(path).map_err(|source| IndicatorError::FontIo {
        path: path.to_path_buf(),
        source,
    })?;
    Font::try_from_vec(data).ok_or_else(|| IndicatorError::FontParse {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Rect<i32> {
        Rect {
            min: point(min_x, min_y),
            max: point(max_x, max_y),
        }
    }

    #[test]
    fn glyph_boxes_merge_into_one_label_box() {
        let union = pixel_union([rect(0, 2, 5, 10), rect(6, 0, 11, 9)]);
        assert_eq!(union, Some(rect(0, 0, 11, 10)));
        let run = GlyphRun {
            glyphs: Vec::new(),
            bounds: union,
        };
        assert_eq!(run.text_box(), TextBox { width: 11.0, height: 10.0 });
    }

    #[test]
    fn blank_labels_have_no_box() {
        assert_eq!(pixel_union(std::iter::empty()), None);
        let run = GlyphRun {
            glyphs: Vec::new(),
            bounds: None,
        };
        assert_eq!(run.text_box(), TextBox { width: 0.0, height: 0.0 });
    }

    #[test]
    fn missing_font_file_is_reported_with_its_path() {
        let path = Path::new("/nonexistent/labels.ttf");
        match load_font(path) {
            Err(IndicatorError::FontIo { path: reported, .. }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("loaded a font from a missing file"),
        }
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        let path = std::env::temp_dir().join("attitude-indicator-not-a-font.ttf");
        std::fs::write(&path, b"definitely not a font").expect("write temp file");
        let result = load_font(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(IndicatorError::FontParse { .. })));
    }
}
