//! Per-tick input snapshots
//!
//! The simulation never polls the keyboard directly: each frame samples
//! macroquad's input state into a plain struct that gets handed to the
//! active tool's tick. Edge-triggered flags (jump, dash, clicks, editor
//! hotkeys) are cleared for catch-up ticks so a slow frame can never
//! double-fire them.

use macroquad::prelude::*;

/// One tick of game input.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameInput {
    pub left: bool,
    pub right: bool,
    /// Jump key went down this frame.
    pub jump: bool,
    /// Dash key went down this frame.
    pub dash: bool,
}

impl GameInput {
    pub fn sample() -> Self {
        Self {
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
            jump: is_key_pressed(KeyCode::Up)
                || is_key_pressed(KeyCode::W)
                || is_key_pressed(KeyCode::Space),
            dash: is_key_pressed(KeyCode::X),
        }
    }

    /// Requested horizontal direction: -1, 0, or 1.
    pub fn axis(&self) -> f32 {
        (self.right as i32 - self.left as i32) as f32
    }

    /// The same snapshot with one-shot flags cleared, for extra
    /// accumulator ticks within the same frame.
    pub fn held_only(mut self) -> Self {
        self.jump = false;
        self.dash = false;
        self
    }
}

/// One tick of editor input. The cursor is already mapped into the
/// 320x240 display space.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditorInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub cursor: Vec2,
    pub paint_held: bool,
    /// Paint button went down this frame (off-grid placement is per-press).
    pub paint_pressed: bool,
    pub erase_held: bool,
    pub shift: bool,
    /// Wheel notches this frame: negative away, positive toward.
    pub wheel: i32,
    pub toggle_grid: bool,
    pub run_autotile: bool,
    pub save: bool,
}

impl EditorInput {
    /// `view` is the letterboxed window rectangle the display is drawn
    /// into; the mouse is mapped through it into display pixels.
    pub fn sample(view: Rect, display_size: Vec2) -> Self {
        let (mx, my) = mouse_position();
        let (_, wheel_y) = mouse_wheel();
        Self {
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
            up: is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
            down: is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
            cursor: vec2(
                (mx - view.x) * display_size.x / view.w,
                (my - view.y) * display_size.y / view.h,
            ),
            paint_held: is_mouse_button_down(MouseButton::Left),
            paint_pressed: is_mouse_button_pressed(MouseButton::Left),
            erase_held: is_mouse_button_down(MouseButton::Right),
            shift: is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
            wheel: if wheel_y > 0.0 {
                1
            } else if wheel_y < 0.0 {
                -1
            } else {
                0
            },
            toggle_grid: is_key_pressed(KeyCode::G),
            run_autotile: is_key_pressed(KeyCode::T),
            save: is_key_pressed(KeyCode::O),
        }
    }

    /// Scroll direction from the held movement keys.
    pub fn movement(&self) -> Vec2 {
        vec2(
            (self.right as i32 - self.left as i32) as f32,
            (self.down as i32 - self.up as i32) as f32,
        )
    }

    /// Snapshot with one-shot flags cleared, for catch-up ticks.
    pub fn held_only(mut self) -> Self {
        self.paint_pressed = false;
        self.wheel = 0;
        self.toggle_grid = false;
        self.run_autotile = false;
        self.save = false;
        self
    }
}
