// Software canvas module
// Immediate-mode drawing into a BGRA shared-memory buffer

use crate::image_loader::ImageData;
use cosmic_text::{Attrs, Buffer, FontSystem, Metrics, Shaping, SwashCache};

/// Pointer or pixel position in window coordinates
pub type Point = (f32, f32);

/// Straight-alpha RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const ORANGE: Color = Color::rgb(255, 161, 0);
    pub const RED: Color = Color::rgb(230, 41, 55);
    pub const LIGHT_GRAY: Color = Color::rgb(200, 200, 200);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build a color from a `0xRRGGBBAA` literal
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: (hex >> 24) as u8,
            g: (hex >> 16) as u8,
            b: (hex >> 8) as u8,
            a: hex as u8,
        }
    }
}

/// Axis-aligned rectangle in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the right and bottom edges belong to the neighbour
    pub fn contains(&self, (px, py): Point) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn center(&self) -> Point {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow or shrink around the center
    pub fn scaled_about_center(&self, factor: f32) -> Rect {
        let (cx, cy) = self.center();
        let width = self.width * factor;
        let height = self.height * factor;
        Rect::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Largest rectangle with the given aspect ratio centered inside `self`
    pub fn fit(&self, content_width: u32, content_height: u32) -> Rect {
        if content_width == 0 || content_height == 0 {
            return Rect::new(self.x, self.y, 0.0, 0.0);
        }
        let scale = (self.width / content_width as f32).min(self.height / content_height as f32);
        let width = content_width as f32 * scale;
        let height = content_height as f32 * scale;
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }
}

/// Shapes and rasterizes UI labels
pub struct TextRenderer {
    font_system: FontSystem,
    cache: SwashCache,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            cache: SwashCache::new(),
        }
    }

    fn layout(&mut self, text: &str, size: f32) -> Buffer {
        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(size, size * 1.2));
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(&mut self.font_system, text, Attrs::new(), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Width in pixels of the widest line of `text`
    pub fn measure(&mut self, text: &str, size: f32) -> f32 {
        self.layout(text, size)
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable view over a BGRA8888 pixel buffer
pub struct Canvas<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        for pixel in self.data.chunks_exact_mut(4) {
            pixel[0] = color.b;
            pixel[1] = color.g;
            pixel[2] = color.r;
            pixel[3] = color.a;
        }
    }

    /// Source-over blend of a single pixel, silently clipped
    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height || color.a == 0 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let Some(dst) = self.data.get_mut(idx..idx + 4) else {
            return;
        };

        if color.a == 255 {
            dst[0] = color.b;
            dst[1] = color.g;
            dst[2] = color.r;
            dst[3] = 255;
            return;
        }

        let a = color.a as u32;
        let inv = 255 - a;
        dst[0] = ((color.b as u32 * a + dst[0] as u32 * inv) / 255) as u8;
        dst[1] = ((color.g as u32 * a + dst[1] as u32 * inv) / 255) as u8;
        dst[2] = ((color.r as u32 * a + dst[2] as u32 * inv) / 255) as u8;
        dst[3] = (a + dst[3] as u32 * inv / 255) as u8;
    }

    /// Clip a rectangle to whole pixel bounds `(x0, y0, x1, y1)`
    fn clip(&self, rect: Rect) -> (i32, i32, i32, i32) {
        let x0 = rect.x.round().max(0.0) as i32;
        let y0 = rect.y.round().max(0.0) as i32;
        let x1 = (rect.x + rect.width).round().min(self.width as f32) as i32;
        let y1 = (rect.y + rect.height).round().min(self.height as f32) as i32;
        (x0, y0, x1, y1)
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let (x0, y0, x1, y1) = self.clip(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x, y, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, thickness: f32, color: Color) {
        let t = thickness.min(rect.width / 2.0).min(rect.height / 2.0);
        self.fill_rect(Rect::new(rect.x, rect.y, rect.width, t), color);
        self.fill_rect(
            Rect::new(rect.x, rect.y + rect.height - t, rect.width, t),
            color,
        );
        self.fill_rect(
            Rect::new(rect.x, rect.y + t, t, rect.height - 2.0 * t),
            color,
        );
        self.fill_rect(
            Rect::new(rect.x + rect.width - t, rect.y + t, t, rect.height - 2.0 * t),
            color,
        );
    }

    /// Draw a texture stretched into `dest`, rotated by `rotation` degrees
    /// clockwise around the center of `dest`
    pub fn draw_texture(&mut self, image: &ImageData, dest: Rect, rotation: f32) {
        if dest.width < 1.0 || dest.height < 1.0 {
            return;
        }
        let level = image.level_for(dest.width as u32, dest.height as u32);
        if level.width == 0 || level.height == 0 {
            return;
        }

        let (cx, cy) = dest.center();
        let (sin, cos) = rotation.to_radians().sin_cos();
        let half_w = dest.width / 2.0;
        let half_h = dest.height / 2.0;

        // Bounding box of the rotated destination
        let extent_x = (half_w * cos).abs() + (half_h * sin).abs();
        let extent_y = (half_w * sin).abs() + (half_h * cos).abs();
        let (x0, y0, x1, y1) = self.clip(Rect::new(
            cx - extent_x,
            cy - extent_y,
            extent_x * 2.0,
            extent_y * 2.0,
        ));

        for y in y0..y1 {
            for x in x0..x1 {
                let px = x as f32 + 0.5 - cx;
                let py = y as f32 + 0.5 - cy;

                // Inverse rotation back into destination-local space
                let lx = px * cos + py * sin + half_w;
                let ly = -px * sin + py * cos + half_h;
                if lx < 0.0 || ly < 0.0 || lx >= dest.width || ly >= dest.height {
                    continue;
                }

                let sx = ((lx / dest.width * level.width as f32) as u32).min(level.width - 1);
                let sy = ((ly / dest.height * level.height as f32) as u32).min(level.height - 1);
                let idx = ((sy * level.width + sx) * 4) as usize;
                if let Some(src) = level.data.get(idx..idx + 4) {
                    self.blend_pixel(x, y, Color::rgba(src[2], src[1], src[0], src[3]));
                }
            }
        }
    }

    /// Draw a single line of text with its top-left corner at `(x, y)`
    pub fn draw_text(
        &mut self,
        text: &mut TextRenderer,
        label: &str,
        (x, y): Point,
        size: f32,
        color: Color,
    ) {
        let buffer = text.layout(label, size);
        let fg = cosmic_text::Color::rgba(color.r, color.g, color.b, color.a);
        let origin_x = x.round() as i32;
        let origin_y = y.round() as i32;
        let TextRenderer { font_system, cache } = text;

        buffer.draw(font_system, cache, fg, |gx, gy, w, h, c| {
            let glyph_color = Color::rgba(c.r(), c.g(), c.b(), c.a());
            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    self.blend_pixel(origin_x + gx + dx, origin_y + gy + dy, glyph_color);
                }
            }
        });
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = ((y * self.width + x) * 4) as usize;
        Color::rgba(
            self.data[idx + 2],
            self.data[idx + 1],
            self.data[idx],
            self.data[idx + 3],
        )
    }
}
