// Application state module
// Owns the image store, viewer state, popup menu and seek buttons, and runs
// one update/draw cycle per frame

use crate::button::{Button, SEEK_MARGIN};
use crate::canvas::{Canvas, Color, TextRenderer};
use crate::config::Config;
use crate::image_loader::{ImageRecord, ImageStore};
use crate::input::{FrameInput, Key};
use crate::menu::{PopupMenu, ENTRY_COLOR};
use crate::viewer::{DisplayMode, View, ViewerState, ROTATION_STEP};
use crate::views::{self, GridLayout, GRID_SCROLL_STEP};
use log::{info, warn};
use std::path::{Path, PathBuf};

pub const LICENSE_URL: &str = "https://opensource.org/licenses/MIT";

/// Resting color of the menu entry for the active display mode
const ACTIVE_ENTRY_COLOR: Color = Color::from_hex(0xc8c8c8ff);

/// Everything a menu entry, button or shortcut can ask the application to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    OpenDirectory,
    SetMode(DisplayMode),
    Previous,
    Next,
    ZoomIn,
    ZoomOut,
    RotateClockwise,
    RotateCounterClockwise,
    ResetView,
    ToggleGrid,
    /// Show the image at this index in single view
    Select(usize),
    Configure,
    About,
    License,
    Exit,
}

/// Desktop services the viewer hands work off to
pub trait Platform {
    /// Ask the user for a directory; `None` when the dialog is cancelled
    fn pick_directory(&mut self, start: &Path) -> Option<PathBuf>;

    /// Open a URL or file with the system's default handler, without waiting
    fn open_external(&mut self, target: &str);
}

/// Native file dialog and system opener
pub struct DesktopPlatform;

impl Platform for DesktopPlatform {
    fn pick_directory(&mut self, start: &Path) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Open Dir")
            .set_directory(start)
            .pick_folder()
    }

    fn open_external(&mut self, target: &str) {
        if let Err(e) = open::that_detached(target) {
            warn!("Failed to open {}: {}", target, e);
        }
    }
}

/// The fixed popup menu, in display order
fn build_menu() -> PopupMenu {
    let mut menu = PopupMenu::new();
    menu.append_item("Open Dir", Command::OpenDirectory);
    menu.append_separator();
    menu.append_item("Scale Image", Command::SetMode(DisplayMode::Scaled));
    menu.append_item("Center Image", Command::SetMode(DisplayMode::Centered));
    menu.append_separator();
    menu.append_item("Go Left (<<)", Command::Previous);
    menu.append_item("Go Right (>>)", Command::Next);
    menu.append_separator();
    menu.append_item("Grid View", Command::ToggleGrid);
    menu.append_item("Zoom In", Command::ZoomIn);
    menu.append_item("Zoom Out", Command::ZoomOut);
    menu.append_item("Rotate", Command::RotateClockwise);
    menu.append_item("Reset View", Command::ResetView);
    menu.append_separator();
    menu.append_item("Configure", Command::Configure);
    menu.append_separator();
    menu.append_item("About", Command::About);
    menu.append_item("License", Command::License);
    menu.append_separator();
    menu.append_item("Exit", Command::Exit);
    menu
}

fn command_for_key(key: Key) -> Option<Command> {
    match key {
        Key::Left => Some(Command::Previous),
        Key::Right => Some(Command::Next),
        Key::F1 => Some(Command::About),
        Key::Char('+') | Key::Char('=') => Some(Command::ZoomIn),
        Key::Char('-') => Some(Command::ZoomOut),
        Key::Char('r') => Some(Command::RotateClockwise),
        Key::Char('R') => Some(Command::RotateCounterClockwise),
        Key::Char('0') => Some(Command::ResetView),
        Key::Char('g') => Some(Command::ToggleGrid),
        Key::Char('s') => Some(Command::SetMode(DisplayMode::Scaled)),
        Key::Char('c') => Some(Command::SetMode(DisplayMode::Centered)),
        Key::Char('q') => Some(Command::Exit),
        Key::Escape | Key::Char(_) => None,
    }
}

pub struct App {
    config: Config,
    config_path: Option<PathBuf>,
    store: ImageStore,
    viewer: ViewerState,
    menu: PopupMenu,
    seek_left: Button,
    seek_right: Button,
    platform: Box<dyn Platform>,
    viewport: (f32, f32),
    hovered_thumbnail: Option<usize>,
    should_exit: bool,
}

impl App {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        store: ImageStore,
        platform: Box<dyn Platform>,
    ) -> Self {
        let mut app = Self {
            viewer: ViewerState::new(config.default_mode),
            config,
            config_path,
            store,
            menu: build_menu(),
            seek_left: Button::seek_left(),
            seek_right: Button::seek_right(),
            platform,
            viewport: (0.0, 0.0),
            hovered_thumbnail: None,
            should_exit: false,
        };
        app.sync_menu_marks();
        app
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    #[cfg(test)]
    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    #[cfg(test)]
    pub fn viewer(&self) -> &ViewerState {
        &self.viewer
    }

    #[cfg(test)]
    pub fn menu(&self) -> &PopupMenu {
        &self.menu
    }

    fn current_record(&self) -> Option<&ImageRecord> {
        self.viewer
            .current(self.store.len())
            .and_then(|index| self.store.get(index))
    }

    /// Track the window size and keep the seek buttons on its edges
    pub fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        self.viewport = (w, h);

        let y = h / 2.0;
        self.seek_left.set_position(SEEK_MARGIN, y);
        let right_x = w - SEEK_MARGIN - self.seek_right.rect().width;
        self.seek_right.set_position(right_x, y);

        // A taller window may leave the grid scrolled past its content
        let max_scroll = self.grid_layout().max_scroll();
        self.viewer.scroll_grid(0.0, max_scroll);
    }

    fn grid_layout(&self) -> GridLayout {
        let (width, height) = self.viewport;
        GridLayout::new(self.store.len(), width, height, self.viewer.grid_scroll())
    }

    /// Run one frame: menu first, then the active view, then keyboard shortcuts
    pub fn update(&mut self, input: &FrameInput, dt: f32, width: u32, height: u32) {
        self.resize(width, height);

        let menu_was_visible = self.menu.is_visible();
        let mut commands: Vec<Command> = Vec::new();
        commands.extend(self.menu.update(input, dt));

        // Clicks and wheel belong to the menu while it is open
        let scene_input = if menu_was_visible || input.right_pressed {
            input.without_pointer_actions()
        } else {
            input.clone()
        };

        match self.viewer.view() {
            View::About => {
                self.hovered_thumbnail = None;
                // Any click closes it; a right click still opens the menu on top
                let right_click = input.right_pressed && !menu_was_visible;
                if scene_input.left_pressed || right_click {
                    self.viewer.set_about_visible(false);
                }
            }
            View::Grid => {
                let layout = self.grid_layout();
                if scene_input.wheel != 0.0 {
                    self.viewer
                        .scroll_grid(-scene_input.wheel * GRID_SCROLL_STEP, layout.max_scroll());
                }
                self.hovered_thumbnail = self.grid_layout().hit_test(scene_input.pointer);
                if scene_input.left_pressed {
                    commands.extend(self.hovered_thumbnail.map(Command::Select));
                }
            }
            View::Single => {
                self.hovered_thumbnail = None;
                commands.extend(self.seek_left.update(&scene_input));
                commands.extend(self.seek_right.update(&scene_input));
                if scene_input.wheel > 0.0 {
                    commands.push(Command::ZoomIn);
                } else if scene_input.wheel < 0.0 {
                    commands.push(Command::ZoomOut);
                }
            }
        }

        for &key in &input.keys {
            if key == Key::Escape {
                self.handle_escape();
            } else {
                commands.extend(command_for_key(key));
            }
        }

        for command in commands {
            self.dispatch(command);
        }
        self.sync_menu_marks();
    }

    /// Close the topmost layer: menu, about screen, then grid view
    fn handle_escape(&mut self) {
        if self.menu.is_visible() {
            self.menu.hide();
        } else if self.viewer.is_about_visible() {
            self.viewer.set_about_visible(false);
        } else if self.viewer.is_grid_view() {
            self.viewer.set_grid_view(false);
        }
    }

    /// Apply a command. Every state change requested by the UI goes through here.
    pub fn dispatch(&mut self, command: Command) {
        info!("Command: {:?}", command);
        let len = self.store.len();

        match command {
            Command::OpenDirectory => match self.platform.pick_directory(self.store.directory()) {
                Some(directory) => self.open_directory(&directory),
                None => info!("Directory selection cancelled"),
            },
            Command::SetMode(mode) => self.viewer.set_mode(mode),
            Command::Previous => self.viewer.advance(-1, len),
            Command::Next => self.viewer.advance(1, len),
            Command::ZoomIn => self.viewer.zoom_in(),
            Command::ZoomOut => self.viewer.zoom_out(),
            Command::RotateClockwise => self.viewer.rotate(ROTATION_STEP),
            Command::RotateCounterClockwise => self.viewer.rotate(-ROTATION_STEP),
            Command::ResetView => self.viewer.reset_view(),
            Command::ToggleGrid => {
                self.viewer.set_about_visible(false);
                self.viewer.toggle_grid();
            }
            Command::Select(index) => {
                if self.viewer.select(index, len) {
                    self.viewer.set_grid_view(false);
                }
            }
            Command::Configure => match &self.config_path {
                Some(path) => self.platform.open_external(&path.to_string_lossy()),
                None => warn!("No config file location available"),
            },
            Command::About => self.viewer.set_about_visible(true),
            Command::License => self.platform.open_external(LICENSE_URL),
            Command::Exit => self.should_exit = true,
        }
    }

    /// Swap in the images of another directory
    pub fn open_directory(&mut self, directory: &Path) {
        info!("Opening directory {}", directory.display());
        self.store.replace(directory);
        self.viewer.reset_for_new_collection();
        self.hovered_thumbnail = None;
    }

    fn sync_menu_marks(&mut self) {
        for mode in [DisplayMode::Scaled, DisplayMode::Centered] {
            let color = if mode == self.viewer.mode() {
                ACTIVE_ENTRY_COLOR
            } else {
                ENTRY_COLOR
            };
            self.menu.set_base_color_for(Command::SetMode(mode), color);
        }
    }

    /// Draw the frame back to front; the popup menu always ends on top
    pub fn draw(&self, canvas: &mut Canvas, text: &mut TextRenderer) {
        views::draw_background(canvas, self.config.grid_step);

        match self.viewer.view() {
            View::About => views::draw_about(canvas, text),
            View::Grid => views::draw_grid(
                canvas,
                text,
                &self.store,
                &self.grid_layout(),
                self.hovered_thumbnail,
            ),
            View::Single => {
                if let Some(record) = self.current_record() {
                    views::draw_single(canvas, record, &self.viewer);
                }
                self.seek_left.draw(canvas, text);
                self.seek_right.draw(canvas, text);
            }
        }

        views::draw_status(canvas, text, &views::status_line(&self.viewer, &self.store));
        self.menu.draw(canvas, text);
    }
}
