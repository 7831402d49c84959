//! Level editor tool

pub mod state;

pub use state::EditorState;
