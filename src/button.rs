// Seek button module
// The "<<" and ">>" buttons drawn at the window edges in single-image view

use crate::app::Command;
use crate::canvas::{Canvas, Color, Rect, TextRenderer};
use crate::input::FrameInput;

const SEEK_FONT_SIZE: f32 = 20.0;
const SEEK_UNIT_WIDTH: f32 = 30.0;
const SEEK_HEIGHT: f32 = 35.0;
/// Distance between a seek button and the window edge
pub const SEEK_MARGIN: f32 = 30.0;

const BUTTON_BG: Color = Color::from_hex(0x181818ff);

#[derive(Debug, Clone)]
pub struct Button {
    label: &'static str,
    font_size: f32,
    bg: Color,
    fg: Color,
    /// Foreground restored when the pointer leaves
    base_fg: Color,
    rect: Rect,
    hovered: bool,
    command: Command,
}

impl Button {
    /// Button whose width scales with the label length
    pub fn new(label: &'static str, command: Command, unit_width: f32, height: f32) -> Self {
        let width = unit_width * label.chars().count() as f32;
        Self {
            label,
            font_size: SEEK_FONT_SIZE,
            bg: BUTTON_BG,
            fg: Color::RED,
            base_fg: Color::RED,
            rect: Rect::new(0.0, 0.0, width, height),
            hovered: false,
            command,
        }
    }

    pub fn seek_left() -> Self {
        Self::new("<<", Command::Previous, SEEK_UNIT_WIDTH, SEEK_HEIGHT)
    }

    pub fn seek_right() -> Self {
        Self::new(">>", Command::Next, SEEK_UNIT_WIDTH, SEEK_HEIGHT)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    #[cfg(test)]
    pub fn fg(&self) -> Color {
        self.fg
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.rect.x = x;
        self.rect.y = y;
    }

    /// Track hover; a left click on the button yields its command
    pub fn update(&mut self, input: &FrameInput) -> Option<Command> {
        self.hovered = self.rect.contains(input.pointer);
        self.fg = if self.hovered { Color::ORANGE } else { self.base_fg };
        (self.hovered && input.left_pressed).then_some(self.command)
    }

    pub fn draw(&self, canvas: &mut Canvas, text: &mut TextRenderer) {
        canvas.fill_rect(self.rect, self.bg);
        canvas.stroke_rect(self.rect, 1.0, self.fg);

        let label_width = text.measure(self.label, self.font_size);
        let x = self.rect.x + (self.rect.width - label_width) / 2.0;
        let y = self.rect.y + (self.rect.height - self.font_size * 1.2) / 2.0;
        canvas.draw_text(text, self.label, (x, y), self.font_size, self.fg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_at(x: f32, y: f32, click: bool) -> FrameInput {
        FrameInput {
            pointer: (x, y),
            left_pressed: click,
            ..FrameInput::default()
        }
    }

    #[test]
    fn width_scales_with_label() {
        let button = Button::seek_left();
        assert_eq!(button.rect().width, 60.0);
        assert_eq!(button.rect().height, SEEK_HEIGHT);
    }

    #[test]
    fn click_on_hovered_button_yields_command() {
        let mut button = Button::seek_right();
        button.set_position(100.0, 100.0);

        assert_eq!(button.update(&input_at(110.0, 110.0, false)), None);
        assert_eq!(button.fg(), Color::ORANGE);
        assert_eq!(
            button.update(&input_at(110.0, 110.0, true)),
            Some(Command::Next)
        );
    }

    #[test]
    fn click_elsewhere_does_nothing_and_restores_color() {
        let mut button = Button::seek_left();
        button.set_position(30.0, 200.0);
        button.update(&input_at(40.0, 210.0, false));

        assert_eq!(button.update(&input_at(5.0, 5.0, true)), None);
        assert_eq!(button.fg(), Color::RED);
    }
}
