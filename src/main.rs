//! GALE: a dash-heavy 2D platformer with a built-in level editor
//!
//! One macroquad app hosting two tools, toggled with F2:
//! - Game: arrows/WASD move, Up/W/Space jumps, X dashes
//! - Editor: arrows/WASD scroll, left click paints, right click erases,
//!   wheel cycles tile groups (shift+wheel variants), G toggles grid
//!   snap, T autotiles, O saves
//!
//! Simulation runs at a fixed 60 Hz tick behind a frame-time
//! accumulator; rendering goes to a 320x240 target upscaled to the
//! window with nearest filtering.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod animation;
mod app;
mod assets;
mod editor;
mod game;
mod input;
mod tilemap;

use std::path::PathBuf;

use macroquad::prelude::*;
use macroquad::rand::gen_range;

use app::{AppState, Tool, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use assets::Assets;
use editor::EditorState;
use game::GameState;
use input::{EditorInput, GameInput};

/// Length of one simulation tick.
const TICK_DT: f32 = 1.0 / 60.0;
/// Frame-time cap so a long stall cannot spiral the accumulator.
const MAX_FRAME_TIME: f32 = 0.25;

const IMAGES_DIR: &str = "data/images";
const MAPS_DIR: &str = "data/maps";

fn window_conf() -> Conf {
    Conf {
        window_title: format!("GALE v{}", VERSION),
        window_width: 640,
        window_height: 480,
        window_resizable: true,
        ..Default::default()
    }
}

struct LaunchOptions {
    start_in_editor: bool,
    edit_map: PathBuf,
}

fn parse_args() -> LaunchOptions {
    let mut options = LaunchOptions {
        start_in_editor: false,
        edit_map: PathBuf::from(MAPS_DIR).join("0.json"),
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--editor" | "-e" => options.start_in_editor = true,
            path => options.edit_map = PathBuf::from(path),
        }
    }
    options
}

/// Where the upscaled display lands in the window, letterboxed to keep
/// the 4:3 aspect.
fn display_rect() -> Rect {
    let aspect = DISPLAY_WIDTH as f32 / DISPLAY_HEIGHT as f32;
    let (sw, sh) = (screen_width(), screen_height());
    if sw / sh > aspect {
        let w = sh * aspect;
        Rect::new((sw - w) * 0.5, 0.0, w, sh)
    } else {
        let h = sw / aspect;
        Rect::new(0.0, (sh - h) * 0.5, sw, h)
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    macroquad::rand::srand(miniquad::date::now() as u64);
    let options = parse_args();

    let assets = match Assets::load(IMAGES_DIR) {
        Ok(assets) => assets,
        Err(e) => {
            eprintln!("Failed to load assets: {}", e);
            return;
        }
    };

    let game = match GameState::new(
        PathBuf::from(MAPS_DIR),
        assets.anim_catalog(),
        assets.tile_catalog(),
        assets.cloud_count(),
    ) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Failed to start the game: {}", e);
            return;
        }
    };

    let editor = match EditorState::open(options.edit_map, assets.tile_catalog()) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to open the editor map: {}", e);
            return;
        }
    };

    let mut app = AppState::new(
        game,
        editor,
        if options.start_in_editor {
            Tool::Editor
        } else {
            Tool::Game
        },
    );

    let display = render_target(DISPLAY_WIDTH, DISPLAY_HEIGHT);
    display.texture.set_filter(FilterMode::Nearest);
    let display_camera = Camera2D {
        zoom: vec2(2.0 / DISPLAY_WIDTH as f32, 2.0 / DISPLAY_HEIGHT as f32),
        target: vec2(DISPLAY_WIDTH as f32 / 2.0, DISPLAY_HEIGHT as f32 / 2.0),
        render_target: Some(display.clone()),
        ..Default::default()
    };
    let display_size = vec2(DISPLAY_WIDTH as f32, DISPLAY_HEIGHT as f32);

    let mut accumulator = 0.0f32;
    loop {
        if is_key_pressed(KeyCode::F2) {
            app.toggle_tool();
        }

        // Fixed-step simulation; only the first tick of a frame sees the
        // edge-triggered input flags.
        accumulator += get_frame_time().min(MAX_FRAME_TIME);
        let mut fresh = true;
        while accumulator >= TICK_DT {
            match app.active_tool {
                Tool::Game => {
                    let mut snapshot = GameInput::sample();
                    if !fresh {
                        snapshot = snapshot.held_only();
                    }
                    if let Err(e) = app.game.tick(&snapshot) {
                        eprintln!("Level load failed: {}", e);
                        return;
                    }
                }
                Tool::Editor => {
                    let mut snapshot = EditorInput::sample(display_rect(), display_size);
                    if !fresh {
                        snapshot = snapshot.held_only();
                    }
                    app.editor.tick(&snapshot);
                }
            }
            fresh = false;
            accumulator -= TICK_DT;
        }

        set_camera(&display_camera);
        clear_background(BLACK);
        match app.active_tool {
            Tool::Game => app.game.render(&assets),
            Tool::Editor => {
                let cursor = EditorInput::sample(display_rect(), display_size).cursor;
                app.editor.render(&assets, cursor);
            }
        }
        set_default_camera();
        clear_background(BLACK);

        // Screen-shake jitters the final blit.
        let shake = match app.active_tool {
            Tool::Game => app.game.screenshake,
            Tool::Editor => 0.0,
        };
        let jitter = if shake > 0.0 {
            vec2(
                gen_range(-shake * 0.5, shake * 0.5),
                gen_range(-shake * 0.5, shake * 0.5),
            )
        } else {
            Vec2::ZERO
        };

        let view = display_rect();
        draw_texture_ex(
            &display.texture,
            view.x + jitter.x,
            view.y + jitter.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(view.w, view.h)),
                ..Default::default()
            },
        );

        next_frame().await;
    }
}
