// ============================================================================
// RASTER BUFFER & DRAWING PRIMITIVES
// ============================================================================

//! Software rasterizer for the instrument. All coverage is computed from
//! distances to the shape edge, one sample per pixel center; supersampling
//! happens one level up by rendering into a larger [`Frame`].

use rusttype::Font;

use crate::config::Color;
use crate::text::GlyphRun;
use crate::transform::Point;

/// How a source color combines with what is already in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Blend {
    /// Standard alpha blending
    #[default]
    SourceOver,
    /// Paints only where the destination already has coverage and keeps
    /// the destination alpha
    SourceAtop,
}

/// Owned RGBA8 image, straight alpha, row-major.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl Frame {
    /// Transparent frame of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    /// Reallocates only when the size actually changes.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = Frame::new(width, height);
        }
    }

    pub fn clear(&mut self, color: Color) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f32, blend: Blend) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let sa = coverage.clamp(0.0, 1.0) * f32::from(color.a) / 255.0;
        if sa <= 0.0 {
            return;
        }
        let src = [f32::from(color.r), f32::from(color.g), f32::from(color.b)];
        let dst = &mut self.pixels[idx..idx + 4];
        let da = f32::from(dst[3]) / 255.0;
        match blend {
            Blend::SourceOver => {
                let oa = sa + da * (1.0 - sa);
                for c in 0..3 {
                    let d = f32::from(dst[c]);
                    dst[c] = ((src[c] * sa + d * da * (1.0 - sa)) / oa).round() as u8;
                }
                dst[3] = (oa * 255.0).round() as u8;
            }
            Blend::SourceAtop => {
                if da <= 0.0 {
                    return;
                }
                for c in 0..3 {
                    let d = f32::from(dst[c]);
                    dst[c] = (src[c] * sa + d * (1.0 - sa)).round() as u8;
                }
            }
        }
    }

    /// Straight segment with round caps. Zero-length segments draw nothing.
    pub fn draw_thick_line_aa(
        &mut self,
        from: Point,
        to: Point,
        thickness: f32,
        color: Color,
        blend: Blend,
    ) {
        let (x0, y0, x1, y1) = (from.x as f32, from.y as f32, to.x as f32, to.y as f32);
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len_sq = dx * dx + dy * dy;
        if len_sq <= f32::EPSILON {
            return;
        }
        let pad = thickness / 2.0 + 1.0;
        let min_x = (x0.min(x1) - pad).floor() as i32;
        let max_x = (x0.max(x1) + pad).ceil() as i32;
        let min_y = (y0.min(y1) - pad).floor() as i32;
        let max_y = (y0.max(y1) + pad).ceil() as i32;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
                let t = (((cx - x0) * dx + (cy - y0) * dy) / len_sq).clamp(0.0, 1.0);
                let lx = x0 + t * dx;
                let ly = y0 + t * dy;
                let dist = ((lx - cx).powi(2) + (ly - cy).powi(2)).sqrt();
                let aa = (thickness / 2.0 - dist + 0.5).clamp(0.0, 1.0);
                if aa > 0.01 {
                    self.blend_pixel(x, y, color, aa, blend);
                }
            }
        }
    }

    pub fn stroke_polyline(
        &mut self,
        points: &[Point],
        closed: bool,
        thickness: f32,
        color: Color,
    ) {
        for pair in points.windows(2) {
            self.draw_thick_line_aa(pair[0], pair[1], thickness, color, Blend::SourceOver);
        }
        if closed {
            if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                self.draw_thick_line_aa(last, first, thickness, color, Blend::SourceOver);
            }
        }
    }

    /// Even-odd fill with a one pixel antialiased edge.
    pub fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if points.len() < 3 {
            return;
        }
        let (mut min_x, mut min_y, mut max_x, mut max_y) =
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        for y in (min_y.floor() as i32 - 1)..=(max_y.ceil() as i32 + 1) {
            for x in (min_x.floor() as i32 - 1)..=(max_x.ceil() as i32 + 1) {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let edge = distance_to_outline(points, p);
                let aa = if contains(points, p) {
                    0.5 + edge
                } else {
                    0.5 - edge
                };
                if aa > 0.01 {
                    self.blend_pixel(x, y, color, aa as f32, Blend::SourceOver);
                }
            }
        }
    }

    pub fn stroke_circle(&mut self, center: Point, radius: f64, thickness: f32, color: Color) {
        let half = f64::from(thickness) / 2.0;
        let reach = radius + half + 1.0;
        for y in (center.y - reach).floor() as i32..=(center.y + reach).ceil() as i32 {
            for x in (center.x - reach).floor() as i32..=(center.x + reach).ceil() as i32 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let off = (p.distance(center) - radius).abs();
                let aa = (half - off + 0.5).clamp(0.0, 1.0);
                if aa > 0.01 {
                    self.blend_pixel(x, y, color, aa as f32, Blend::SourceOver);
                }
            }
        }
    }

    /// Fills the region between an arc and the straight chord joining its
    /// ends. Angles are degrees, counter-clockwise on screen from +x; a
    /// negative span runs clockwise.
    pub fn fill_chord(&mut self, center: Point, radius: f64, start: f64, span: f64, color: Color) {
        const SPAN_EPSILON: f64 = 1e-9;
        if span.abs() < SPAN_EPSILON || radius <= 0.0 {
            return;
        }
        let on_circle = |deg: f64| {
            let rad = deg.to_radians();
            Point::new(center.x + radius * rad.cos(), center.y - radius * rad.sin())
        };
        let full_disk = span.abs() >= 360.0 - SPAN_EPSILON;
        let p1 = on_circle(start);
        let p2 = on_circle(start + span);
        let mid = on_circle(start + span / 2.0);
        let edge = p2 - p1;
        let edge_len = edge.x.hypot(edge.y);
        let side = cross(edge, mid - p1).signum();

        let reach = radius + 1.0;
        for y in (center.y - reach).floor() as i32..=(center.y + reach).ceil() as i32 {
            for x in (center.x - reach).floor() as i32..=(center.x + reach).ceil() as i32 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let radial = (radius - p.distance(center) + 0.5).clamp(0.0, 1.0);
                if radial <= 0.0 {
                    continue;
                }
                let linear = if full_disk || edge_len <= SPAN_EPSILON {
                    1.0
                } else {
                    (side * cross(edge, p - p1) / edge_len + 0.5).clamp(0.0, 1.0)
                };
                let aa = radial * linear;
                if aa > 0.01 {
                    self.blend_pixel(x, y, color, aa as f32, Blend::SourceOver);
                }
            }
        }
    }

    /// Draws `text` upright with its pixel bounding box centered on `center`.
    pub fn draw_text(
        &mut self,
        center: Point,
        text: &str,
        font: &Font,
        size: f32,
        color: Color,
        blend: Blend,
    ) {
        let run = GlyphRun::layout(font, text, size);
        let Some(bounds) = run.bounds else {
            return;
        };
        let offset_x = (center.x - f64::from(bounds.width()) / 2.0).round() as i32;
        let offset_y = (center.y - f64::from(bounds.height()) / 2.0).round() as i32;
        for glyph in &run.glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    let px = offset_x + gx as i32 + bb.min.x - bounds.min.x;
                    let py = offset_y + gy as i32 + bb.min.y - bounds.min.y;
                    self.blend_pixel(px, py, color, v, blend);
                });
            }
        }
    }

    /// Composites this frame, bilinearly resampled to a `side` x `side`
    /// square at (`left`, `top`), onto an opaque RGBA `surface`.
    pub fn blit_scaled(
        &self,
        surface: &mut [u8],
        surface_width: usize,
        surface_height: usize,
        left: i64,
        top: i64,
        side: usize,
    ) {
        if self.is_empty() || side == 0 || surface.len() < surface_width * surface_height * 4 {
            return;
        }
        let sx = self.width as f64 / side as f64;
        let sy = self.height as f64 / side as f64;
        for j in 0..side {
            let dy = top + j as i64;
            if dy < 0 || dy as usize >= surface_height {
                continue;
            }
            let v = (j as f64 + 0.5) * sy - 0.5;
            for i in 0..side {
                let dx = left + i as i64;
                if dx < 0 || dx as usize >= surface_width {
                    continue;
                }
                let u = (i as f64 + 0.5) * sx - 0.5;
                let [r, g, b, a] = self.sample_premultiplied(u, v);
                if a <= 0.0 {
                    continue;
                }
                let idx = (dy as usize * surface_width + dx as usize) * 4;
                let dst = &mut surface[idx..idx + 4];
                for (c, s) in [r, g, b].into_iter().enumerate() {
                    dst[c] = (s + f64::from(dst[c]) * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
                }
                dst[3] = 0xff;
            }
        }
    }

    fn sample_premultiplied(&self, u: f64, v: f64) -> [f64; 4] {
        let max_x = self.width as f64 - 1.0;
        let max_y = self.height as f64 - 1.0;
        let u = u.clamp(0.0, max_x);
        let v = v.clamp(0.0, max_y);
        let (x0, y0) = (u.floor() as usize, v.floor() as usize);
        let (x1, y1) = ((x0 + 1).min(self.width - 1), (y0 + 1).min(self.height - 1));
        let (fx, fy) = (u - x0 as f64, v - y0 as f64);
        let mut out = [0.0; 4];
        for (x, y, w) in [
            (x0, y0, (1.0 - fx) * (1.0 - fy)),
            (x1, y0, fx * (1.0 - fy)),
            (x0, y1, (1.0 - fx) * fy),
            (x1, y1, fx * fy),
        ] {
            let idx = (y * self.width + x) * 4;
            let a = f64::from(self.pixels[idx + 3]) / 255.0;
            for c in 0..3 {
                out[c] += f64::from(self.pixels[idx + c]) * a * w;
            }
            out[3] += a * w;
        }
        out
    }
}

fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

fn contains(points: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn distance_to_outline(points: &[Point], p: Point) -> f64 {
    let mut best = f64::MAX;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[j], points[i]);
        let ab = b - a;
        let len_sq = ab.x * ab.x + ab.y * ab.y;
        let t = if len_sq > 0.0 {
            (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        best = best.min(p.distance(Point::new(a.x + t * ab.x, a.y + t * ab.y)));
        j = i;
    }
    best
}
