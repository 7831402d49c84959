//! Application state and tool management
//!
//! Fixed set of tools, each with its own persistent state: the game
//! itself and the level editor. Both stay alive while the other is
//! active, so switching back and forth costs nothing.

use crate::editor::EditorState;
use crate::game::GameState;

/// Logical display resolution; the window shows this upscaled.
pub const DISPLAY_WIDTH: u32 = 320;
pub const DISPLAY_HEIGHT: u32 = 240;

/// The available tools (fixed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Game,
    Editor,
}

impl Tool {
    /// Display label for the window title.
    #[allow(dead_code)]
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Game => "Game",
            Tool::Editor => "Editor",
        }
    }
}

/// Main application state containing all tool states.
pub struct AppState {
    pub active_tool: Tool,
    pub game: GameState,
    pub editor: EditorState,
}

impl AppState {
    pub fn new(game: GameState, editor: EditorState, active_tool: Tool) -> Self {
        Self {
            active_tool,
            game,
            editor,
        }
    }

    pub fn toggle_tool(&mut self) {
        self.active_tool = match self.active_tool {
            Tool::Game => Tool::Editor,
            Tool::Editor => Tool::Game,
        };
    }
}
