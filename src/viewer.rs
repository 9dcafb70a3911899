// Viewer state module
// Which image is shown and how: index, display mode, zoom, rotation, active view

use crate::canvas::Rect;
use log::debug;

pub const ZOOM_STEP: f32 = 0.1;
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;
pub const ROTATION_STEP: f32 = 90.0;

/// How the current image is placed in the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Stretched over the whole window
    Scaled,
    /// Half the window size, centered
    #[default]
    Centered,
}

impl DisplayMode {
    /// Decode the `defaultMode` config value (1 = scaled, 2 = centered)
    pub fn from_config_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(DisplayMode::Scaled),
            2 => Some(DisplayMode::Centered),
            _ => None,
        }
    }

    pub fn config_value(self) -> i64 {
        match self {
            DisplayMode::Scaled => 1,
            DisplayMode::Centered => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Scaled => "scale",
            DisplayMode::Centered => "centered",
        }
    }

    /// Destination rectangle for a window of `width` x `height`
    pub fn dest_rect(self, width: f32, height: f32) -> Rect {
        match self {
            DisplayMode::Scaled => Rect::new(0.0, 0.0, width, height),
            DisplayMode::Centered => Rect::new(width / 4.0, height / 4.0, width / 2.0, height / 2.0),
        }
    }
}

/// Which screen is currently drawn under the popup menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Single,
    Grid,
    About,
}

/// Map any angle in degrees into `[0, 360)`
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    index: usize,
    mode: DisplayMode,
    scale: f32,
    rotation: f32,
    grid_view: bool,
    grid_scroll: f32,
    about_visible: bool,
}

impl ViewerState {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            index: 0,
            mode,
            scale: 1.0,
            rotation: 0.0,
            grid_view: false,
            grid_scroll: 0.0,
            about_visible: false,
        }
    }

    /// Index of the displayed image, or `None` when there is nothing to show
    pub fn current(&self, len: usize) -> Option<usize> {
        (self.index < len).then_some(self.index)
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Step through a collection of `len` images, wrapping at both ends
    pub fn advance(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let len = len as isize;
        self.index = (self.index as isize % len + delta).rem_euclid(len) as usize;
        debug!("Image index -> {}", self.index);
    }

    /// Jump to `index`; ignored when out of range
    pub fn select(&mut self, index: usize, len: usize) -> bool {
        if index >= len {
            return false;
        }
        self.index = index;
        true
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale - ZOOM_STEP);
    }

    fn set_scale(&mut self, scale: f32) {
        // Round to the step grid so repeated steps do not drift
        let snapped = (scale / ZOOM_STEP).round() * ZOOM_STEP;
        self.scale = snapped.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(self.rotation + degrees);
    }

    pub fn reset_view(&mut self) {
        self.scale = 1.0;
        self.rotation = 0.0;
    }

    pub fn is_grid_view(&self) -> bool {
        self.grid_view
    }

    pub fn toggle_grid(&mut self) {
        self.grid_view = !self.grid_view;
    }

    pub fn set_grid_view(&mut self, enabled: bool) {
        self.grid_view = enabled;
    }

    pub fn grid_scroll(&self) -> f32 {
        self.grid_scroll
    }

    /// Scroll the thumbnail wall, keeping the offset within `[0, max]`
    pub fn scroll_grid(&mut self, delta: f32, max: f32) {
        self.grid_scroll = (self.grid_scroll + delta).clamp(0.0, max.max(0.0));
    }

    pub fn is_about_visible(&self) -> bool {
        self.about_visible
    }

    pub fn set_about_visible(&mut self, visible: bool) {
        self.about_visible = visible;
    }

    pub fn view(&self) -> View {
        if self.about_visible {
            View::About
        } else if self.grid_view {
            View::Grid
        } else {
            View::Single
        }
    }

    /// Destination of the current image: mode rectangle, then zoom about its center
    pub fn image_rect(&self, width: f32, height: f32) -> Rect {
        self.mode
            .dest_rect(width, height)
            .scaled_about_center(self.scale)
    }

    /// Called after the image collection was replaced
    pub fn reset_for_new_collection(&mut self) {
        self.index = 0;
        self.grid_scroll = 0.0;
        self.reset_view();
    }
}
