// Input module
// Per-frame snapshot of pointer, wheel and keyboard state

use crate::canvas::Point;

/// Keys the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Escape,
    F1,
    /// Any key producing a printable character
    Char(char),
}

/// Input gathered since the previous frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Last known pointer position (persists across frames)
    pub pointer: Point,
    pub left_pressed: bool,
    pub right_pressed: bool,
    /// Accumulated wheel movement, positive when scrolling up
    pub wheel: f32,
    pub keys: Vec<Key>,
}

impl FrameInput {
    pub fn press_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    /// Same pointer and keys, but with clicks and wheel swallowed
    pub fn without_pointer_actions(&self) -> FrameInput {
        FrameInput {
            pointer: self.pointer,
            left_pressed: false,
            right_pressed: false,
            wheel: 0.0,
            keys: self.keys.clone(),
        }
    }

    /// Forget the edge-triggered state once a frame has consumed it
    pub fn end_frame(&mut self) {
        self.left_pressed = false;
        self.right_pressed = false;
        self.wheel = 0.0;
        self.keys.clear();
    }
}
