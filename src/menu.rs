// Popup menu module
// Right-click context menu: layout, hover tracking, hit-testing and click dispatch

use crate::app::Command;
use crate::canvas::{Canvas, Color, Point, Rect, TextRenderer};
use crate::input::FrameInput;
use log::debug;

/// Height of an interactive entry
pub const ITEM_HEIGHT: f32 = 16.0;
/// Height of the bar drawn for a separator
pub const SEPARATOR_HEIGHT: f32 = 1.0;
/// Extra room around a separator bar, split above and below it
pub const SEPARATOR_SPACING: f32 = 4.0;
/// Menu width per character of the longest label
pub const CHAR_WIDTH: f32 = 10.0;
/// Trimmed from the summed entry heights to close the gap under the last entry
pub const HEIGHT_CALIBRATION: f32 = 1.5;

const SHADOW_OFFSET: f32 = 4.0;
const LABEL_INSET: f32 = 5.0;
const LABEL_FONT_SIZE: f32 = 12.0;

const PANEL_COLOR: Color = Color::from_hex(0xaaaaaaff);
const SHADOW_COLOR: Color = Color::from_hex(0x00000080);
pub const ENTRY_COLOR: Color = Color::from_hex(0xaaaaaaff);
pub const HOVER_COLOR: Color = Color::ORANGE;

/// Context menu state
#[derive(Debug, Clone, Copy, PartialEq)]
enum MenuState {
    Hidden,
    Visible,
}

/// One row of the popup menu: a clickable label or a separator bar
#[derive(Debug, Clone)]
pub struct MenuEntry {
    label: String,
    separator: bool,
    rect: Rect,
    hovered: bool,
    /// Color drawn this frame
    color: Color,
    /// Color restored whenever the pointer is not over the entry
    base_color: Color,
    action: Option<Command>,
}

impl MenuEntry {
    fn item(label: String, action: Option<Command>) -> Self {
        Self {
            label,
            separator: false,
            rect: Rect::new(0.0, 0.0, 0.0, ITEM_HEIGHT),
            hovered: false,
            color: ENTRY_COLOR,
            base_color: ENTRY_COLOR,
            action,
        }
    }

    fn separator() -> Self {
        Self {
            label: String::new(),
            separator: true,
            rect: Rect::new(0.0, 0.0, 0.0, SEPARATOR_HEIGHT),
            hovered: false,
            color: Color::BLACK,
            base_color: Color::BLACK,
            action: None,
        }
    }

    #[cfg(test)]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[cfg(test)]
    pub fn is_separator(&self) -> bool {
        self.separator
    }

    #[cfg(test)]
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    #[cfg(test)]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[cfg(test)]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Vertical room the entry takes in the menu
    fn slot_height(&self) -> f32 {
        if self.separator {
            SEPARATOR_HEIGHT + SEPARATOR_SPACING
        } else {
            ITEM_HEIGHT
        }
    }

    /// Place the entry at the top of its slot; returns the y of the next slot
    fn place(&mut self, x: f32, y: f32, width: f32) -> f32 {
        let top = if self.separator {
            y + SEPARATOR_SPACING / 2.0
        } else {
            y
        };
        self.rect = Rect::new(x, top, width, self.rect.height);
        y + self.slot_height()
    }

    pub fn set_base_color(&mut self, color: Color) {
        self.base_color = color;
        if !self.hovered {
            self.color = color;
        }
    }

    /// Recompute hover. `within_menu` is false when the pointer is outside the
    /// menu box, which can clip the bottom of the last entry.
    pub fn update(&mut self, pointer: Point, within_menu: bool, _dt: f32) {
        if self.separator {
            return;
        }
        self.hovered = within_menu && self.rect.contains(pointer);
        self.color = if self.hovered {
            HOVER_COLOR
        } else {
            self.base_color
        };
    }

    pub fn draw(&self, canvas: &mut Canvas, text: &mut TextRenderer) {
        canvas.fill_rect(self.rect, self.color);
        if self.separator {
            return;
        }
        canvas.draw_text(
            text,
            &self.label,
            (self.rect.x + LABEL_INSET, self.rect.y + 1.0),
            LABEL_FONT_SIZE,
            Color::BLACK,
        );
    }
}

/// Vertically stacked entries anchored at the point of the last right click
#[derive(Debug, Clone)]
pub struct PopupMenu {
    rect: Rect,
    state: MenuState,
    entries: Vec<MenuEntry>,
}

impl PopupMenu {
    pub fn new() -> Self {
        Self {
            rect: Rect::default(),
            state: MenuState::Hidden,
            entries: Vec::new(),
        }
    }

    /// Append a clickable entry. The whole menu widens to fit the longest label.
    pub fn append_item(&mut self, label: impl Into<String>, action: impl Into<Option<Command>>) {
        self.entries.push(MenuEntry::item(label.into(), action.into()));
        self.recompute_bounds();
    }

    pub fn append_separator(&mut self) {
        self.entries.push(MenuEntry::separator());
        self.recompute_bounds();
    }

    fn recompute_bounds(&mut self) {
        let longest = self
            .entries
            .iter()
            .map(|entry| entry.label.chars().count())
            .max()
            .unwrap_or(0);
        self.rect.width = longest as f32 * CHAR_WIDTH;

        let total: f32 = self.entries.iter().map(MenuEntry::slot_height).sum();
        self.rect.height = if self.entries.is_empty() {
            0.0
        } else {
            total - HEIGHT_CALIBRATION
        };
        self.layout_entries();
    }

    /// Stack entries top to bottom from the anchor, all at the menu's width
    fn layout_entries(&mut self) {
        let x = self.rect.x;
        let width = self.rect.width;
        let mut y = self.rect.y;
        for entry in &mut self.entries {
            y = entry.place(x, y, width);
        }
    }

    #[cfg(test)]
    pub fn bounds(&self) -> Rect {
        self.rect
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn is_visible(&self) -> bool {
        self.state == MenuState::Visible
    }

    /// Open with the top-left corner at `anchor`
    pub fn show_at(&mut self, anchor: Point) {
        self.state = MenuState::Visible;
        self.rect.x = anchor.0;
        self.rect.y = anchor.1;
        self.layout_entries();
        debug!("Menu opened at {:?}", anchor);
    }

    pub fn hide(&mut self) {
        self.state = MenuState::Hidden;
    }

    /// Set the resting color of every entry bound to `action`
    pub fn set_base_color_for(&mut self, action: Command, color: Color) {
        for entry in self
            .entries
            .iter_mut()
            .filter(|entry| entry.action == Some(action))
        {
            entry.set_base_color(color);
        }
    }

    /// Run one frame of the menu. Returns the command of the entry clicked this frame.
    pub fn update(&mut self, input: &FrameInput, dt: f32) -> Option<Command> {
        let pointer = input.pointer;
        let mut clicked = false;

        if input.right_pressed {
            // A second right click moves the open menu
            self.show_at(pointer);
        } else if input.left_pressed && self.is_visible() {
            if self.rect.contains(pointer) {
                clicked = true;
            } else {
                self.hide();
            }
        }

        if !self.is_visible() {
            return None;
        }

        self.layout_entries();
        let within_menu = self.rect.contains(pointer);
        let mut fired = None;
        for entry in &mut self.entries {
            entry.update(pointer, within_menu, dt);
            if clicked && entry.hovered && fired.is_none() {
                fired = entry.action;
            }
        }
        fired
    }

    pub fn draw(&self, canvas: &mut Canvas, text: &mut TextRenderer) {
        if !self.is_visible() {
            return;
        }
        canvas.fill_rect(self.rect.offset(SHADOW_OFFSET, SHADOW_OFFSET), SHADOW_COLOR);
        canvas.fill_rect(self.rect, PANEL_COLOR);
        for entry in &self.entries {
            entry.draw(canvas, text);
        }
    }
}

impl Default for PopupMenu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right_click(at: Point) -> FrameInput {
        FrameInput {
            pointer: at,
            right_pressed: true,
            ..FrameInput::default()
        }
    }

    fn left_click(at: Point) -> FrameInput {
        FrameInput {
            pointer: at,
            left_pressed: true,
            ..FrameInput::default()
        }
    }

    fn hover(at: Point) -> FrameInput {
        FrameInput {
            pointer: at,
            ..FrameInput::default()
        }
    }

    fn sample_menu() -> PopupMenu {
        let mut menu = PopupMenu::new();
        menu.append_item("Go Left (<<)", Command::Previous);
        menu.append_item("Go Right (>>)", Command::Next);
        menu.append_separator();
        menu.append_item("Exit", Command::Exit);
        menu
    }

    #[test]
    fn height_is_sum_of_entries_minus_calibration() {
        for labels in [vec!["a"], vec!["a", "bb", "a much longer label"], vec![]] {
            let mut menu = PopupMenu::new();
            for label in &labels {
                menu.append_item(*label, Command::Next);
            }
            menu.append_separator();

            let expected = labels.len() as f32 * ITEM_HEIGHT + SEPARATOR_HEIGHT
                + SEPARATOR_SPACING
                - HEIGHT_CALIBRATION;
            assert_eq!(menu.bounds().height, expected, "labels {:?}", labels);
        }
    }

    #[test]
    fn empty_menu_has_no_area() {
        let menu = PopupMenu::new();
        assert_eq!(menu.bounds().width, 0.0);
        assert_eq!(menu.bounds().height, 0.0);
    }

    #[test]
    fn width_follows_longest_label_retroactively() {
        let mut menu = PopupMenu::new();
        menu.append_item("Open", Command::OpenDirectory);
        assert_eq!(menu.bounds().width, 4.0 * CHAR_WIDTH);

        menu.append_item("Center Image", Command::Exit);
        assert_eq!(menu.bounds().width, 12.0 * CHAR_WIDTH);

        menu.append_separator();
        assert_eq!(menu.bounds().width, 12.0 * CHAR_WIDTH);

        // Every entry is laid out at the container width
        assert!(menu.entries().iter().all(|e| e.rect().width == menu.bounds().width));
    }

    #[test]
    fn right_click_while_hidden_opens_at_pointer() {
        let mut menu = sample_menu();
        assert!(!menu.is_visible());

        let fired = menu.update(&right_click((40.0, 70.0)), 0.016);

        assert!(fired.is_none());
        assert!(menu.is_visible());
        assert_eq!((menu.bounds().x, menu.bounds().y), (40.0, 70.0));
        assert_eq!(menu.entries()[0].rect().y, 70.0);
        assert_eq!(menu.entries()[1].rect().y, 70.0 + ITEM_HEIGHT);
    }

    #[test]
    fn right_click_while_visible_reanchors() {
        let mut menu = sample_menu();
        menu.update(&right_click((10.0, 10.0)), 0.016);
        menu.update(&right_click((200.0, 150.0)), 0.016);

        assert!(menu.is_visible());
        assert_eq!((menu.bounds().x, menu.bounds().y), (200.0, 150.0));
    }

    #[test]
    fn left_click_outside_hides() {
        let mut menu = sample_menu();
        menu.update(&right_click((10.0, 10.0)), 0.016);

        let fired = menu.update(&left_click((500.0, 500.0)), 0.016);
        assert!(fired.is_none());
        assert!(!menu.is_visible());
    }

    #[test]
    fn left_click_on_item_fires_its_command_once() {
        let mut menu = sample_menu();
        menu.update(&right_click((0.0, 0.0)), 0.016);

        let second_row = (5.0, ITEM_HEIGHT + 3.0);
        assert_eq!(menu.update(&left_click(second_row), 0.016), Some(Command::Next));
        assert!(menu.is_visible());

        // Pointer stays on the entry but no new click
        assert_eq!(menu.update(&hover(second_row), 0.016), None);
    }

    #[test]
    fn click_inside_menu_but_on_no_item_fires_nothing() {
        let mut menu = sample_menu();
        menu.update(&right_click((0.0, 0.0)), 0.016);

        // Spacing strip above the separator bar
        let gap = (5.0, 2.0 * ITEM_HEIGHT + 0.5);
        assert!(menu.bounds().contains(gap));

        assert_eq!(menu.update(&left_click(gap), 0.016), None);
        assert!(menu.is_visible());
        assert!(menu.entries().iter().all(|e| !e.is_hovered()));
    }

    #[test]
    fn clicking_the_separator_bar_fires_nothing() {
        let mut menu = sample_menu();
        menu.update(&right_click((0.0, 0.0)), 0.016);

        let bar = menu.entries()[2].rect();
        assert_eq!(menu.update(&left_click((bar.x + 1.0, bar.y)), 0.016), None);
        assert!(!menu.entries()[2].is_hovered());
    }

    #[test]
    fn entry_without_action_fires_nothing() {
        let mut menu = PopupMenu::new();
        menu.append_item("Heading", None::<Command>);
        menu.update(&right_click((0.0, 0.0)), 0.016);

        assert_eq!(menu.update(&left_click((3.0, 3.0)), 0.016), None);
        assert!(menu.entries()[0].is_hovered());
    }

    #[test]
    fn left_click_while_hidden_does_nothing() {
        let mut menu = sample_menu();
        assert_eq!(menu.update(&left_click((1.0, 1.0)), 0.016), None);
        assert!(!menu.is_visible());
    }

    #[test]
    fn hover_highlights_and_reverts_to_base_color() {
        let mut menu = sample_menu();
        menu.update(&right_click((0.0, 0.0)), 0.016);

        menu.update(&hover((5.0, 5.0)), 0.016);
        assert!(menu.entries()[0].is_hovered());
        assert_eq!(menu.entries()[0].color(), HOVER_COLOR);
        assert_eq!(menu.entries()[1].color(), ENTRY_COLOR);

        menu.update(&hover((5.0, ITEM_HEIGHT + 5.0)), 0.016);
        assert_eq!(menu.entries()[0].color(), ENTRY_COLOR);
        assert_eq!(menu.entries()[1].color(), HOVER_COLOR);
    }

    #[test]
    fn base_color_is_per_entry_and_survives_hover() {
        let mut menu = sample_menu();
        let marked = Color::rgb(120, 200, 120);
        menu.update(&right_click((0.0, 0.0)), 0.016);

        // Changing the base color while hovered keeps the highlight
        menu.update(&hover((5.0, 5.0)), 0.016);
        menu.set_base_color_for(Command::Previous, marked);
        assert_eq!(menu.entries()[0].color(), HOVER_COLOR);

        menu.update(&hover((5.0, ITEM_HEIGHT + 5.0)), 0.016);
        assert_eq!(menu.entries()[0].color(), marked);
        assert_eq!(menu.entries()[1].color(), HOVER_COLOR);

        menu.update(&hover((500.0, 500.0)), 0.016);
        assert_eq!(menu.entries()[1].color(), ENTRY_COLOR);
        assert_eq!(menu.entries()[3].color(), ENTRY_COLOR);
    }

    #[test]
    fn reopening_reevaluates_hover_at_new_anchor() {
        let mut menu = sample_menu();
        menu.update(&right_click((0.0, 0.0)), 0.016);
        menu.update(&hover((5.0, ITEM_HEIGHT + 5.0)), 0.016);
        assert!(menu.entries()[1].is_hovered());
        menu.update(&left_click((900.0, 900.0)), 0.016);

        // The pointer sits on the anchor, which is the first entry
        menu.update(&right_click((300.0, 300.0)), 0.016);
        assert!(menu.entries()[0].is_hovered());
        assert!(!menu.entries()[1].is_hovered());
        assert_eq!(menu.entries()[1].color(), ENTRY_COLOR);
    }

    #[test]
    fn bottom_strip_of_last_entry_is_outside_the_menu() {
        let mut menu = sample_menu();
        menu.update(&right_click((0.0, 0.0)), 0.016);

        let last = menu.entries()[3].rect();
        let below_bounds = (5.0, menu.bounds().height + 0.5);
        assert!(last.contains(below_bounds));

        menu.update(&hover(below_bounds), 0.016);
        assert!(!menu.entries()[3].is_hovered());
        assert_eq!(menu.entries()[3].color(), ENTRY_COLOR);

        assert_eq!(menu.update(&left_click(below_bounds), 0.016), None);
        assert!(!menu.is_visible());
    }

    fn draw_menu(menu: &PopupMenu, data: &mut [u8]) {
        let mut text = TextRenderer::new();
        let mut canvas = Canvas::new(data, 200, 100);
        menu.draw(&mut canvas, &mut text);
    }

    #[test]
    fn hidden_menu_draws_nothing() {
        let menu = sample_menu();
        let mut data = vec![0u8; 200 * 100 * 4];
        draw_menu(&menu, &mut data);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn draw_puts_shadow_under_panel_and_entries_at_menu_width() {
        let mut menu = sample_menu();
        menu.update(&right_click((10.0, 10.0)), 0.016);
        // Hover the far right end of the first entry
        menu.update(&hover((135.0, 12.0)), 0.016);

        let mut data = vec![0u8; 200 * 100 * 4];
        draw_menu(&menu, &mut data);
        let canvas = Canvas::new(&mut data, 200, 100);

        let bounds = menu.bounds();
        assert_eq!((bounds.x, bounds.width), (10.0, 130.0));

        // Shadow shows only past the panel edge
        let shadow = Color::rgba(0, 0, 0, 128);
        assert_eq!(canvas.pixel(142, 30), shadow);
        assert_eq!(canvas.pixel(20, 10 + bounds.height as u32 + 3), shadow);
        assert_eq!(canvas.pixel(8, 30), Color::rgba(0, 0, 0, 0));

        // Hovered entry reaches the right edge of the menu
        assert_eq!(canvas.pixel(139, 20), HOVER_COLOR);

        // Separator bar: black, full width, no text, panel around it
        let bar_y = 10 + 2 * ITEM_HEIGHT as u32 + 2;
        assert_eq!(canvas.pixel(10, bar_y), Color::BLACK);
        assert_eq!(canvas.pixel(75, bar_y), Color::BLACK);
        assert_eq!(canvas.pixel(139, bar_y), Color::BLACK);
        assert_eq!(canvas.pixel(140, bar_y), shadow);
        assert_eq!(canvas.pixel(135, bar_y - 1), PANEL_COLOR);
        assert_eq!(canvas.pixel(135, bar_y + 1), PANEL_COLOR);
    }
}
