// Views module
// Background, single image, thumbnail grid, about screen and status line

use crate::canvas::{Canvas, Color, Point, Rect, TextRenderer};
use crate::image_loader::{ImageRecord, ImageStore};
use crate::viewer::ViewerState;
use std::ops::Range;

/// Side of a thumbnail cell in grid view
pub const THUMB_SIZE: f32 = 120.0;
/// Gap between thumbnail cells and around the wall
pub const GRID_PADDING: f32 = 10.0;
/// Pixels scrolled per wheel notch in grid view
pub const GRID_SCROLL_STEP: f32 = 60.0;

const CAPTION_HEIGHT: f32 = 22.0;
const CHECKER_DARK: Color = Color::from_hex(0x181818ff);
const CHECKER_LIGHT: Color = Color::from_hex(0x212121ff);
const CELL_COLOR: Color = Color::from_hex(0x2a2a2aff);
const CAPTION_BG: Color = Color::from_hex(0x000000c0);
const STATUS_FONT_SIZE: f32 = 13.0;

const ABOUT_LINES: &[&str] = &[
    "Right click        open the menu",
    "Left / Right       previous / next image",
    "+ / -              zoom in / out",
    "r / R              rotate clockwise / counter-clockwise",
    "0                  reset zoom and rotation",
    "s / c              scaled / centered display",
    "g                  toggle the thumbnail grid",
    "F1                 this screen",
    "Esc                close the menu, this screen or the grid",
    "q                  quit",
];

/// Checkerboard filling the whole canvas
pub fn draw_background(canvas: &mut Canvas, grid_step: u32) {
    let step = grid_step.max(1);
    let (width, height) = (canvas.width(), canvas.height());
    canvas.clear(Color::BLACK);

    for (row, y) in (0..height).step_by(step as usize).enumerate() {
        for (col, x) in (0..width).step_by(step as usize).enumerate() {
            let color = if (row + col) % 2 == 0 {
                CHECKER_DARK
            } else {
                CHECKER_LIGHT
            };
            canvas.fill_rect(
                Rect::new(x as f32, y as f32, step as f32, step as f32),
                color,
            );
        }
    }
}

/// Draw the current image according to the viewer's mode, zoom and rotation
pub fn draw_single(canvas: &mut Canvas, record: &ImageRecord, viewer: &ViewerState) {
    let dest = viewer.image_rect(canvas.width() as f32, canvas.height() as f32);
    canvas.draw_texture(&record.texture, dest, viewer.rotation());
}

/// Placement of thumbnails on the scrollable wall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    cols: usize,
    total: usize,
    height: f32,
    scroll: f32,
}

impl GridLayout {
    pub fn new(total: usize, width: f32, height: f32, scroll: f32) -> Self {
        let cols = ((width - GRID_PADDING) / (THUMB_SIZE + GRID_PADDING)).floor();
        Self {
            cols: (cols.max(1.0)) as usize,
            total,
            height,
            scroll,
        }
    }

    #[cfg(test)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn rows(&self) -> usize {
        self.total.div_ceil(self.cols)
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        let row = index / self.cols;
        let col = index % self.cols;
        Rect::new(
            GRID_PADDING + col as f32 * (THUMB_SIZE + GRID_PADDING),
            GRID_PADDING + row as f32 * (THUMB_SIZE + GRID_PADDING) - self.scroll,
            THUMB_SIZE,
            THUMB_SIZE,
        )
    }

    pub fn content_height(&self) -> f32 {
        GRID_PADDING + self.rows() as f32 * (THUMB_SIZE + GRID_PADDING)
    }

    pub fn max_scroll(&self) -> f32 {
        (self.content_height() - self.height).max(0.0)
    }

    /// Indices whose cells intersect the viewport
    pub fn visible_range(&self) -> Range<usize> {
        let pitch = THUMB_SIZE + GRID_PADDING;
        let first_row = ((self.scroll - GRID_PADDING) / pitch).floor().max(0.0) as usize;
        let last_row = ((self.scroll + self.height) / pitch).ceil().max(0.0) as usize;
        let start = (first_row * self.cols).min(self.total);
        let end = (last_row * self.cols + self.cols).min(self.total);
        start..end
    }

    /// Thumbnail under `point`, ignoring the gaps between cells
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.visible_range()
            .find(|&index| self.cell_rect(index).contains(point))
    }
}

/// Thumbnail wall with the hovered cell outlined and named in a caption bar
pub fn draw_grid(
    canvas: &mut Canvas,
    text: &mut TextRenderer,
    store: &ImageStore,
    layout: &GridLayout,
    hovered: Option<usize>,
) {
    let visible = layout.visible_range();
    for (index, record) in store.iter().enumerate().skip(visible.start).take(visible.len()) {
        let cell = layout.cell_rect(index);
        canvas.fill_rect(cell, CELL_COLOR);
        let thumb = cell.fit(record.texture.width, record.texture.height);
        canvas.draw_texture(&record.texture, thumb, 0.0);

        if hovered == Some(index) {
            canvas.stroke_rect(cell, 2.0, Color::ORANGE);
        }
    }

    let Some(record) = hovered.and_then(|index| store.get(index)) else {
        return;
    };
    let height = canvas.height() as f32;
    let bar = Rect::new(0.0, height - CAPTION_HEIGHT, canvas.width() as f32, CAPTION_HEIGHT);
    canvas.fill_rect(bar, CAPTION_BG);
    let caption = format!(
        "{}  {}x{}",
        record.file_name(),
        record.texture.width,
        record.texture.height
    );
    canvas.draw_text(
        text,
        &caption,
        (bar.x + 6.0, bar.y + 3.0),
        STATUS_FONT_SIZE,
        Color::WHITE,
    );
}

pub fn draw_about(canvas: &mut Canvas, text: &mut TextRenderer) {
    let panel = Rect::new(
        40.0,
        40.0,
        (canvas.width() as f32 - 80.0).max(0.0),
        (canvas.height() as f32 - 80.0).max(0.0),
    );
    canvas.fill_rect(panel, Color::from_hex(0x101010e0));
    canvas.stroke_rect(panel, 1.0, Color::ORANGE);

    let mut y = panel.y + 16.0;
    let title = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    canvas.draw_text(text, &title, (panel.x + 16.0, y), 22.0, Color::ORANGE);
    y += 32.0;
    canvas.draw_text(
        text,
        env!("CARGO_PKG_DESCRIPTION"),
        (panel.x + 16.0, y),
        STATUS_FONT_SIZE,
        Color::LIGHT_GRAY,
    );
    y += 28.0;

    for line in ABOUT_LINES {
        canvas.draw_text(text, line, (panel.x + 16.0, y), STATUS_FONT_SIZE, Color::WHITE);
        y += 18.0;
    }

    canvas.draw_text(
        text,
        "Click anywhere to close",
        (panel.x + 16.0, panel.y + panel.height - 24.0),
        STATUS_FONT_SIZE,
        Color::LIGHT_GRAY,
    );
}

/// One-line summary of mode and position, shown in the top-left corner
pub fn status_line(viewer: &ViewerState, store: &ImageStore) -> String {
    let mode = format!("ImageMode: {}", viewer.mode().label());
    match viewer.current(store.len()).and_then(|index| store.get(index).map(|r| (index, r))) {
        Some((index, record)) => format!(
            "{}  |  {}/{}  {}",
            mode,
            index + 1,
            store.len(),
            record.file_name()
        ),
        None => format!("{}  |  no images in {}", mode, store.directory().display()),
    }
}

pub fn draw_status(canvas: &mut Canvas, text: &mut TextRenderer, line: &str) {
    canvas.draw_text(text, line, (5.0, 5.0), STATUS_FONT_SIZE, Color::ORANGE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::DisplayMode;

    #[test]
    fn background_alternates_checker_cells() {
        let mut data = vec![0u8; 8 * 8 * 4];
        let mut canvas = Canvas::new(&mut data, 8, 8);
        draw_background(&mut canvas, 4);

        assert_eq!(canvas.pixel(0, 0), CHECKER_DARK);
        assert_eq!(canvas.pixel(4, 0), CHECKER_LIGHT);
        assert_eq!(canvas.pixel(0, 4), CHECKER_LIGHT);
        assert_eq!(canvas.pixel(7, 7), CHECKER_DARK);
    }

    #[test]
    fn grid_columns_fit_the_width() {
        assert_eq!(GridLayout::new(10, 100.0, 400.0, 0.0).cols(), 1);
        assert_eq!(GridLayout::new(10, 400.0, 400.0, 0.0).cols(), 3);
        assert_eq!(GridLayout::new(10, 530.0, 400.0, 0.0).cols(), 4);
    }

    #[test]
    fn hit_test_maps_points_to_cells() {
        let layout = GridLayout::new(5, 400.0, 400.0, 0.0);
        assert_eq!(layout.hit_test((15.0, 15.0)), Some(0));
        assert_eq!(layout.hit_test((145.0, 15.0)), Some(1));
        assert_eq!(layout.hit_test((15.0, 145.0)), Some(3));
        // Gap between the first two cells
        assert_eq!(layout.hit_test((132.0, 15.0)), None);
        // Cell slot past the last image
        assert_eq!(layout.hit_test((275.0, 145.0)), None);
    }

    #[test]
    fn scrolling_moves_cells_up() {
        let layout = GridLayout::new(9, 400.0, 200.0, 130.0);
        assert_eq!(layout.hit_test((15.0, 15.0)), Some(3));
        assert_eq!(layout.cell_rect(0).y, GRID_PADDING - 130.0);
    }

    #[test]
    fn max_scroll_covers_overflow_only() {
        let short = GridLayout::new(3, 400.0, 400.0, 0.0);
        assert_eq!(short.max_scroll(), 0.0);

        let tall = GridLayout::new(9, 400.0, 200.0, 0.0);
        assert_eq!(tall.content_height(), 10.0 + 3.0 * 130.0);
        assert_eq!(tall.max_scroll(), 400.0 - 200.0);
    }

    #[test]
    fn visible_range_is_bounded_by_total() {
        let layout = GridLayout::new(4, 400.0, 1000.0, 0.0);
        assert_eq!(layout.visible_range(), 0..4);
        assert_eq!(GridLayout::new(0, 400.0, 400.0, 0.0).visible_range(), 0..0);
    }

    #[test]
    fn status_line_reports_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::scan(dir.path());
        let viewer = ViewerState::new(DisplayMode::Centered);

        let line = status_line(&viewer, &store);
        assert!(line.starts_with("ImageMode: centered"));
        assert!(line.contains("no images"));
    }

    #[test]
    fn status_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::new(2, 2)
            .save(dir.path().join("one.png"))
            .unwrap();
        let store = ImageStore::scan(dir.path());
        let viewer = ViewerState::new(DisplayMode::Scaled);

        assert_eq!(status_line(&viewer, &store), "ImageMode: scale  |  1/1  one.png");
    }
}
