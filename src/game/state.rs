//! Game session
//!
//! Owns a loaded level plus everything alive in it and runs the fixed
//! per-tick order: shake decay, level transitions, death/respawn
//! counters, camera scroll, ambient leaf emission, clouds, enemies, the
//! player, projectiles, then the effect pools. Collection removal always
//! goes through `retain_mut`; nothing is mutated while being traversed.

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use macroquad::prelude::*;
use macroquad::rand::gen_range;

use crate::animation::AnimCatalog;
use crate::app::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::assets::Assets;
use crate::input::GameInput;
use crate::tilemap::{MapError, TileCatalog, TileKind, Tilemap, TILE_SIZE};

use super::clouds::Clouds;
use super::enemy::Enemy;
use super::particles::Effects;
use super::physics::rect_contains;
use super::player::{Player, FALL_DEATH_TICKS};
use super::projectile::Projectile;

/// Ticks of fade on each side of a level change.
pub const TRANSITION_TICKS: i32 = 30;
/// Ticks a death lingers before the level reloads.
pub const RESPAWN_DELAY: u32 = 40;
/// Shake magnitude injected by deaths and kills.
pub const SHAKE_HIT: f32 = 16.0;

pub const CLOUD_COUNT: usize = 16;

#[derive(Debug)]
pub struct GameState {
    pub tilemap: Tilemap,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub effects: Effects,
    pub clouds: Clouds,
    /// Canopy rectangles that shed leaves, in pixel space.
    pub leaf_spawners: Vec<Rect>,

    pub scroll: Vec2,
    /// 0 = alive; counts ticks since death otherwise.
    pub dead: u32,
    /// Fade counter: -30 fading in, +30 fully faded out.
    pub transition: i32,
    pub screenshake: f32,

    pub level: usize,
    pub level_count: usize,

    maps_dir: PathBuf,
    anim_catalog: AnimCatalog,
    tile_catalog: TileCatalog,
}

impl GameState {
    /// Discover the level sequence under `maps_dir` and load level 0.
    pub fn new(
        maps_dir: PathBuf,
        anim_catalog: AnimCatalog,
        tile_catalog: TileCatalog,
        cloud_images: usize,
    ) -> Result<Self, MapError> {
        let level_count = discover_level_count(&maps_dir)?;

        let mut state = Self {
            tilemap: Tilemap::new(TILE_SIZE),
            player: Player::new(vec2(50.0, 50.0), &anim_catalog),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            effects: Effects::new(),
            clouds: Clouds::new(CLOUD_COUNT, cloud_images),
            leaf_spawners: Vec::new(),
            scroll: Vec2::ZERO,
            dead: 0,
            transition: -TRANSITION_TICKS,
            screenshake: 0.0,
            level: 0,
            level_count,
            maps_dir,
            anim_catalog,
            tile_catalog,
        };
        state.load_level(0)?;
        Ok(state)
    }

    /// Load a level file, pull out its markers, and reset the live sets.
    /// Level files are contiguous by contract, so any failure here is
    /// propagated as fatal.
    pub fn load_level(&mut self, index: usize) -> Result<(), MapError> {
        let path = self.maps_dir.join(format!("{}.json", index));
        let tilemap = Tilemap::load(&path)?;
        tilemap.validate(&self.tile_catalog)?;
        self.tilemap = tilemap;
        self.level = index;

        self.leaf_spawners = self
            .tilemap
            .extract(&[(TileKind::LargeDecor, 2)], true)
            .into_iter()
            .map(|tree| Rect::new(tree.pos.x + 4.0, tree.pos.y + 4.0, 23.0, 13.0))
            .collect();

        self.enemies.clear();
        for spawner in self
            .tilemap
            .extract(&[(TileKind::Spawners, 0), (TileKind::Spawners, 1)], false)
        {
            if spawner.variant == 0 {
                self.player.respawn(spawner.pos);
            } else {
                self.enemies.push(Enemy::new(spawner.pos, &self.anim_catalog));
            }
        }

        self.projectiles.clear();
        self.effects.clear();
        self.scroll = Vec2::ZERO;
        self.dead = 0;
        self.transition = -TRANSITION_TICKS;

        println!(
            "Loaded level {} ({} enemies, {} leaf spawners)",
            index,
            self.enemies.len(),
            self.leaf_spawners.len()
        );
        Ok(())
    }

    /// One fixed 60 Hz tick.
    pub fn tick(&mut self, input: &GameInput) -> Result<(), MapError> {
        self.screenshake = (self.screenshake - 1.0).max(0.0);

        // Level cleared: fade out, then advance (clamped to the last level).
        if self.enemies.is_empty() {
            self.transition += 1;
            if self.transition > TRANSITION_TICKS {
                let next = (self.level + 1).min(self.level_count - 1);
                self.load_level(next)?;
            }
        }
        if self.transition < 0 {
            self.transition += 1;
        }

        if self.dead > 0 {
            self.dead += 1;
            if self.dead == 10 {
                self.transition = (self.transition + 1).min(TRANSITION_TICKS);
            }
            if self.dead > RESPAWN_DELAY {
                let level = self.level;
                self.load_level(level)?;
                return Ok(());
            }
        }

        // Camera eases toward the player center.
        let target = self.player.center()
            - vec2(DISPLAY_WIDTH as f32 / 2.0, DISPLAY_HEIGHT as f32 / 2.0);
        self.scroll += (target - self.scroll) / 30.0;

        // Canopies shed leaves with probability proportional to their area.
        for rect in &self.leaf_spawners {
            if gen_range(0.0, 49999.0) < rect.w * rect.h {
                let pos = vec2(
                    gen_range(rect.x, rect.x + rect.w),
                    gen_range(rect.y, rect.y + rect.h),
                );
                self.effects.spawn_leaf(pos, &self.anim_catalog);
            }
        }

        self.clouds.update();

        let tilemap = &self.tilemap;
        let catalog = &self.anim_catalog;
        let player = &self.player;
        let projectiles = &mut self.projectiles;
        let effects = &mut self.effects;
        let mut killed_any = false;
        self.enemies.retain_mut(|enemy| {
            let killed = enemy.update(tilemap, catalog, player, projectiles, effects);
            killed_any |= killed;
            !killed
        });
        if killed_any {
            self.screenshake = self.screenshake.max(SHAKE_HIT);
        }

        if self.dead == 0 {
            self.player
                .update(&self.tilemap, &self.anim_catalog, input, &mut self.effects);
            if self.player.air_time > FALL_DEATH_TICKS {
                if self.dead == 0 {
                    self.screenshake = self.screenshake.max(SHAKE_HIT);
                }
                self.dead += 1;
            }
        }

        let tilemap = &self.tilemap;
        let catalog = &self.anim_catalog;
        let player = &self.player;
        let effects = &mut self.effects;
        let dead = &mut self.dead;
        let screenshake = &mut self.screenshake;
        self.projectiles.retain_mut(|shot| {
            shot.advance();
            if tilemap.is_solid_at(shot.pos) || shot.expired() {
                let base = if shot.direction > 0.0 { PI } else { 0.0 };
                effects.impact_sparks(shot.pos, base);
                false
            } else if player.vulnerable() && rect_contains(&player.rect(), shot.pos) {
                *dead += 1;
                *screenshake = screenshake.max(SHAKE_HIT);
                effects.death_burst(player.center(), catalog);
                false
            } else {
                true
            }
        });

        self.effects.update();
        Ok(())
    }

    /// Draw one frame of the session into display space.
    pub fn render(&self, assets: &Assets) {
        draw_texture_ex(
            &assets.background,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(DISPLAY_WIDTH as f32, DISPLAY_HEIGHT as f32)),
                ..Default::default()
            },
        );

        let offset = IVec2::new(self.scroll.x as i32, self.scroll.y as i32);
        let view = vec2(DISPLAY_WIDTH as f32, DISPLAY_HEIGHT as f32);

        self.clouds.render(assets, offset, view);
        self.tilemap.render(assets, offset, view);
        for enemy in &self.enemies {
            enemy.render(assets, offset);
        }
        if self.dead == 0 {
            self.player.render(assets, offset);
        }
        for shot in &self.projectiles {
            shot.render(assets, offset);
        }
        self.effects.render(assets, offset);

        if self.transition != 0 {
            let strength = self.transition.abs() as f32 / TRANSITION_TICKS as f32;
            draw_rectangle(
                0.0,
                0.0,
                view.x,
                view.y,
                Color::new(0.0, 0.0, 0.0, strength),
            );
        }
    }
}

/// Count the contiguous `<index>.json` sequence in a maps directory by
/// its highest index.
fn discover_level_count(dir: &Path) -> Result<usize, MapError> {
    let mut max_index: Option<usize> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let index = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<usize>().ok());
        if let Some(index) = index {
            max_index = Some(max_index.map_or(index, |m| m.max(index)));
        }
    }
    match max_index {
        Some(max) => Ok(max + 1),
        None => Err(MapError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no level files in {}", dir.display()),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tile;

    fn write_level(dir: &Path, index: usize, with_enemy: bool) {
        let mut map = Tilemap::new(16);
        for x in -4..16 {
            map.set_tile(
                IVec2::new(x, 2),
                Tile {
                    kind: TileKind::Grass,
                    variant: 0,
                },
            );
        }
        map.set_tile(
            IVec2::new(3, 1),
            Tile {
                kind: TileKind::Spawners,
                variant: 0,
            },
        );
        if with_enemy {
            map.set_tile(
                IVec2::new(8, 1),
                Tile {
                    kind: TileKind::Spawners,
                    variant: 1,
                },
            );
        }
        map.save(dir.join(format!("{}.json", index))).unwrap();
    }

    fn catalogs() -> (AnimCatalog, TileCatalog) {
        let mut tiles = TileCatalog::new();
        for kind in TileKind::ALL {
            tiles.set_variants(kind, vec![vec2(16.0, 16.0); 9]);
        }
        (AnimCatalog::new(), tiles)
    }

    fn session(dir: &Path) -> GameState {
        let (anims, tiles) = catalogs();
        GameState::new(dir.to_path_buf(), anims, tiles, 1).unwrap()
    }

    #[test]
    fn test_new_discovers_levels_and_extracts_spawners() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), 0, true);
        write_level(dir.path(), 1, false);

        let state = session(dir.path());
        assert_eq!(state.level_count, 2);
        assert_eq!(state.level, 0);
        // Spawner markers position actors and leave the grid.
        assert_eq!(state.player.body.pos, vec2(48.0, 16.0));
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].body.pos, vec2(128.0, 16.0));
        assert!(state.tilemap.tile_at(IVec2::new(3, 1)).is_none());
        assert!(state.tilemap.tile_at(IVec2::new(8, 1)).is_none());
    }

    #[test]
    fn test_empty_maps_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (anims, tiles) = catalogs();
        let err = GameState::new(dir.path().to_path_buf(), anims, tiles, 1).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_level_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), 0, false);

        let mut state = session(dir.path());
        let err = state.load_level(7).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_level_advances_once_cleared() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), 0, false);
        write_level(dir.path(), 1, false);

        let mut state = session(dir.path());
        let mut advanced = false;
        for _ in 0..100 {
            state.tick(&GameInput::default()).unwrap();
            if state.level == 1 {
                advanced = true;
                break;
            }
        }
        assert!(advanced);
        // Fresh level fades back in from black.
        assert!(state.transition < 0);
    }

    #[test]
    fn test_last_level_does_not_advance_past_end() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), 0, false);

        let mut state = session(dir.path());
        for _ in 0..3 * TRANSITION_TICKS {
            state.tick(&GameInput::default()).unwrap();
        }
        assert_eq!(state.level, 0);
    }

    #[test]
    fn test_projectile_hit_kills_and_respawns() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), 0, false);

        let mut state = session(dir.path());
        state
            .projectiles
            .push(Projectile::new(state.player.center(), 1.5));
        state.tick(&GameInput::default()).unwrap();

        assert_eq!(state.dead, 1);
        assert!(state.projectiles.is_empty());
        assert!(state.screenshake >= SHAKE_HIT - 1.0);
        assert!(!state.effects.sparks.is_empty());

        let mut respawned = false;
        for _ in 0..RESPAWN_DELAY + 5 {
            state.tick(&GameInput::default()).unwrap();
            if state.dead == 0 {
                respawned = true;
                break;
            }
        }
        assert!(respawned);
        assert_eq!(state.player.body.pos, vec2(48.0, 16.0));
    }

    #[test]
    fn test_dashing_player_shrugs_off_projectiles() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), 0, false);

        let mut state = session(dir.path());
        state.player.dash();
        state
            .projectiles
            .push(Projectile::new(state.player.center(), 0.0));
        state.tick(&GameInput::default()).unwrap();

        assert_eq!(state.dead, 0);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn test_camera_eases_toward_player() {
        let dir = tempfile::tempdir().unwrap();
        write_level(dir.path(), 0, false);

        let mut state = session(dir.path());
        assert_eq!(state.scroll, Vec2::ZERO);
        state.tick(&GameInput::default()).unwrap();

        let target = state.player.center()
            - vec2(DISPLAY_WIDTH as f32 / 2.0, DISPLAY_HEIGHT as f32 / 2.0);
        // One tick moves 1/30 of the way.
        assert!(state.scroll.x != 0.0);
        assert!(state.scroll.x.abs() <= target.x.abs());
    }
}
