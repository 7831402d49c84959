//! Editor state
//!
//! Mouse-driven tile painting over the shared tilemap: grid-snapped or
//! free placement, right-click erase, wheel palette cycling, and the
//! autotile/save hotkeys. Works entirely in the 320x240 display space;
//! the shell maps the mouse into it before ticking.

use std::path::PathBuf;

use macroquad::prelude::*;

use crate::app::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::assets::Assets;
use crate::input::EditorInput;
use crate::tilemap::{MapError, OffgridTile, Tile, TileCatalog, TileKind, Tilemap, TILE_SIZE};

/// Camera pan speed in pixels per tick.
pub const SCROLL_SPEED: f32 = 2.0;

pub struct EditorState {
    pub tilemap: Tilemap,
    pub scroll: Vec2,
    /// Index into [`TileKind::ALL`].
    pub group: usize,
    pub variant: usize,
    /// Grid-snapped placement vs free placement.
    pub ongrid: bool,
    path: PathBuf,
    catalog: TileCatalog,
}

impl EditorState {
    /// Open a map for editing. A missing file means a fresh map; any
    /// other failure is surfaced so a malformed map never gets silently
    /// replaced (and later overwritten) by an empty one.
    pub fn open(path: PathBuf, catalog: TileCatalog) -> Result<Self, MapError> {
        let tilemap = match Tilemap::load(&path) {
            Ok(map) => {
                map.validate(&catalog)?;
                map
            }
            Err(e) if e.is_not_found() => {
                println!("{} not found, starting with an empty map", path.display());
                Tilemap::new(TILE_SIZE)
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            tilemap,
            scroll: Vec2::ZERO,
            group: 0,
            variant: 0,
            ongrid: true,
            path,
            catalog,
        })
    }

    pub fn current_kind(&self) -> TileKind {
        TileKind::ALL[self.group]
    }

    /// The grid cell under the cursor, given the current camera scroll.
    pub fn hovered_cell(&self, cursor: Vec2) -> IVec2 {
        self.tilemap.cell_of(cursor + self.scroll)
    }

    pub fn tick(&mut self, input: &EditorInput) {
        self.scroll += input.movement() * SCROLL_SPEED;

        if input.toggle_grid {
            self.ongrid = !self.ongrid;
        }
        if input.run_autotile {
            self.tilemap.autotile();
        }
        if input.save {
            match self.tilemap.save(&self.path) {
                Ok(()) => println!(
                    "Saved {} ({} grid tiles, {} off-grid)",
                    self.path.display(),
                    self.tilemap.grid_len(),
                    self.tilemap.offgrid_tiles().len()
                ),
                Err(e) => eprintln!("Failed to save {}: {}", self.path.display(), e),
            }
        }

        if input.wheel != 0 {
            // Wheel up steps backward through the palette, down forward.
            let delta = -input.wheel as isize;
            if input.shift {
                self.cycle_variant(delta);
            } else {
                self.cycle_group(delta);
            }
        }

        let cursor_world = input.cursor + self.scroll;
        let cell = self.tilemap.cell_of(cursor_world);

        if input.paint_held && self.ongrid {
            self.tilemap.set_tile(
                cell,
                Tile {
                    kind: self.current_kind(),
                    variant: self.variant as u8,
                },
            );
        } else if input.paint_pressed && !self.ongrid {
            self.tilemap.place_offgrid(OffgridTile {
                kind: self.current_kind(),
                variant: self.variant as u8,
                pos: cursor_world,
            });
        }

        if input.erase_held {
            self.tilemap.remove_tile(cell);
            let catalog = &self.catalog;
            self.tilemap.erase_offgrid_at(cursor_world, |kind, variant| {
                catalog
                    .size_of(kind, variant)
                    .unwrap_or(vec2(TILE_SIZE as f32, TILE_SIZE as f32))
            });
        }
    }

    fn cycle_group(&mut self, delta: isize) {
        let count = TileKind::ALL.len() as isize;
        self.group = (self.group as isize + delta).rem_euclid(count) as usize;
        self.variant = 0;
    }

    fn cycle_variant(&mut self, delta: isize) {
        let count = self.catalog.variant_count(self.current_kind()).max(1) as isize;
        self.variant = (self.variant as isize + delta).rem_euclid(count) as usize;
    }

    pub fn render(&self, assets: &Assets, cursor: Vec2) {
        let offset = IVec2::new(self.scroll.x as i32, self.scroll.y as i32);
        let view = vec2(DISPLAY_WIDTH as f32, DISPLAY_HEIGHT as f32);
        self.tilemap.render(assets, offset, view);

        // Translucent preview of the tile about to be placed.
        let preview = assets.tile(self.current_kind(), self.variant as u8);
        let ghost = Color::new(1.0, 1.0, 1.0, 0.4);
        if self.ongrid {
            let cell = self.hovered_cell(cursor);
            let ts = TILE_SIZE as i32;
            draw_texture(
                preview,
                (cell.x * ts - offset.x) as f32,
                (cell.y * ts - offset.y) as f32,
                ghost,
            );
        } else {
            draw_texture(preview, cursor.x, cursor.y, ghost);
        }

        // Palette swatch in the corner.
        draw_texture(preview, 5.0, 5.0, WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TileCatalog {
        let mut catalog = TileCatalog::new();
        for kind in TileKind::ALL {
            let count = if kind == TileKind::Spawners { 2 } else { 9 };
            catalog.set_variants(kind, vec![vec2(16.0, 16.0); count]);
        }
        catalog
    }

    fn fresh_editor(dir: &std::path::Path) -> EditorState {
        EditorState::open(dir.join("map.json"), catalog()).unwrap()
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let editor = fresh_editor(dir.path());
        assert_eq!(editor.tilemap.grid_len(), 0);
        assert!(editor.ongrid);
    }

    #[test]
    fn test_open_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(EditorState::open(path, catalog()).is_err());
    }

    #[test]
    fn test_paint_and_erase_grid_cell() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());

        let paint = EditorInput {
            cursor: vec2(40.0, 40.0),
            paint_held: true,
            ..Default::default()
        };
        editor.tick(&paint);
        let cell = IVec2::new(2, 2);
        assert_eq!(
            editor.tilemap.tile_at(cell),
            Some(&Tile {
                kind: TileKind::Decor,
                variant: 0
            })
        );

        let erase = EditorInput {
            cursor: vec2(40.0, 40.0),
            erase_held: true,
            ..Default::default()
        };
        editor.tick(&erase);
        assert!(editor.tilemap.tile_at(cell).is_none());
    }

    #[test]
    fn test_paint_respects_scroll() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        editor.scroll = vec2(64.0, 0.0);

        let paint = EditorInput {
            cursor: vec2(8.0, 8.0),
            paint_held: true,
            ..Default::default()
        };
        editor.tick(&paint);
        assert!(editor.tilemap.tile_at(IVec2::new(4, 0)).is_some());
    }

    #[test]
    fn test_offgrid_placement_is_per_press() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        editor.ongrid = false;

        let press = EditorInput {
            cursor: vec2(33.5, 21.0),
            paint_held: true,
            paint_pressed: true,
            ..Default::default()
        };
        editor.tick(&press);
        // Held without a fresh press adds nothing.
        let held = EditorInput {
            cursor: vec2(35.0, 22.0),
            paint_held: true,
            ..Default::default()
        };
        editor.tick(&held);

        assert_eq!(editor.tilemap.offgrid_tiles().len(), 1);
        assert_eq!(editor.tilemap.offgrid_tiles()[0].pos, vec2(33.5, 21.0));
    }

    #[test]
    fn test_erase_hits_offgrid_by_point() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        editor.tilemap.place_offgrid(OffgridTile {
            kind: TileKind::Decor,
            variant: 0,
            pos: vec2(30.0, 30.0),
        });

        let miss = EditorInput {
            cursor: vec2(10.0, 10.0),
            erase_held: true,
            ..Default::default()
        };
        editor.tick(&miss);
        assert_eq!(editor.tilemap.offgrid_tiles().len(), 1);

        let hit = EditorInput {
            cursor: vec2(38.0, 38.0),
            erase_held: true,
            ..Default::default()
        };
        editor.tick(&hit);
        assert!(editor.tilemap.offgrid_tiles().is_empty());
    }

    #[test]
    fn test_wheel_cycles_groups_and_variants() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        assert_eq!(editor.current_kind(), TileKind::Decor);

        // Wheel down moves forward through the palette.
        let next = EditorInput {
            wheel: -1,
            ..Default::default()
        };
        editor.tick(&next);
        assert_eq!(editor.current_kind(), TileKind::Grass);

        // Wheel up from the first group wraps to the last.
        editor.group = 0;
        let prev = EditorInput {
            wheel: 1,
            ..Default::default()
        };
        editor.tick(&prev);
        assert_eq!(editor.current_kind(), TileKind::Spawners);

        // Shift+wheel cycles variants within the group, wrapping at the
        // catalog count (spawners have 2).
        editor.variant = 1;
        let next_variant = EditorInput {
            wheel: -1,
            shift: true,
            ..Default::default()
        };
        editor.tick(&next_variant);
        assert_eq!(editor.variant, 0);
        assert_eq!(editor.current_kind(), TileKind::Spawners);
    }

    #[test]
    fn test_group_cycling_resets_variant() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        editor.variant = 5;
        editor.tick(&EditorInput {
            wheel: -1,
            ..Default::default()
        });
        assert_eq!(editor.variant, 0);
    }

    #[test]
    fn test_autotile_hotkey_runs_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        for x in 0..3 {
            for y in 0..3 {
                editor.tilemap.set_tile(
                    IVec2::new(x, y),
                    Tile {
                        kind: TileKind::Grass,
                        variant: 0,
                    },
                );
            }
        }
        editor.tick(&EditorInput {
            run_autotile: true,
            ..Default::default()
        });
        assert_eq!(editor.tilemap.tile_at(IVec2::new(1, 1)).unwrap().variant, 8);
    }

    #[test]
    fn test_save_writes_loadable_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        editor.tick(&EditorInput {
            cursor: vec2(0.0, 0.0),
            paint_held: true,
            ..Default::default()
        });
        editor.tick(&EditorInput {
            save: true,
            ..Default::default()
        });

        let loaded = Tilemap::load(dir.path().join("map.json")).unwrap();
        assert_eq!(loaded.grid_len(), 1);
    }

    #[test]
    fn test_scroll_moves_with_movement_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = fresh_editor(dir.path());
        editor.tick(&EditorInput {
            right: true,
            down: true,
            ..Default::default()
        });
        assert_eq!(editor.scroll, vec2(SCROLL_SPEED, SCROLL_SPEED));
    }
}
