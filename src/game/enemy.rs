//! Enemies
//!
//! Patrol-and-shoot gunners. They wander for randomized stretches,
//! probing the ground ahead so they turn at ledges and walls, and fire
//! at a player who shares their height band on the facing side with a
//! clear horizontal line to them. Dashing through one kills it.

use std::f32::consts::PI;

use macroquad::prelude::*;
use macroquad::rand::gen_range;

use crate::animation::{AnimCatalog, AnimKey};
use crate::assets::Assets;
use crate::tilemap::Tilemap;

use super::particles::Effects;
use super::physics::{rects_overlap, PhysicsBody};
use super::player::{Player, DASH_COAST};
use super::projectile::Projectile;

pub const ENEMY_SIZE: Vec2 = Vec2::new(8.0, 15.0);
/// Patrol speed in pixels per tick.
pub const WALK_SPEED: f32 = 0.5;
/// Horizontal muzzle offset from the body center.
pub const GUN_REACH: f32 = 7.0;
/// Vertical band within which the player is a valid target.
pub const AIM_BAND: f32 = 16.0;
/// Projectile speed toward the player.
pub const SHOT_SPEED: f32 = 1.5;

#[derive(Debug)]
pub struct Enemy {
    pub body: PhysicsBody,
    /// Remaining patrol ticks; zero means standing around.
    pub walking: u32,
}

impl Enemy {
    pub fn new(pos: Vec2, catalog: &AnimCatalog) -> Self {
        Self {
            body: PhysicsBody::new(pos, ENEMY_SIZE, catalog.animation(AnimKey::EnemyIdle)),
            walking: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    /// Advance one tick. Returns true when the enemy died and should be
    /// removed from the live set.
    pub fn update(
        &mut self,
        tilemap: &Tilemap,
        catalog: &AnimCatalog,
        player: &Player,
        projectiles: &mut Vec<Projectile>,
        effects: &mut Effects,
    ) -> bool {
        let mut movement = Vec2::ZERO;

        if self.walking > 0 {
            let ahead = if self.body.flip { -GUN_REACH } else { GUN_REACH };
            let foot_probe = vec2(self.rect().center().x + ahead, self.body.pos.y + 23.0);
            if tilemap.is_solid_at(foot_probe) {
                if self.body.collisions.right || self.body.collisions.left {
                    self.body.flip = !self.body.flip;
                } else {
                    movement.x = if self.body.flip { -WALK_SPEED } else { WALK_SPEED };
                }
            } else {
                // Ledge ahead: turn around instead of walking off.
                self.body.flip = !self.body.flip;
            }

            self.walking -= 1;
            if self.walking == 0 {
                self.try_shoot(tilemap, player, projectiles, effects);
            }
        } else if gen_range(0.0, 1.0) < 0.01 {
            self.walking = gen_range(30, 121);
        }

        self.body.update(tilemap, movement);

        if movement.x != 0.0 {
            self.body.set_action(AnimKey::EnemyRun, catalog);
        } else {
            self.body.set_action(AnimKey::EnemyIdle, catalog);
        }

        // A dashing player shreds anything they pass through.
        if player.dashing.abs() >= DASH_COAST && rects_overlap(&self.rect(), &player.rect()) {
            let center = self.body.center();
            effects.death_burst(center, catalog);
            effects
                .sparks
                .push(super::particles::Spark::new(center, 0.0, gen_range(5.0, 6.0)));
            effects
                .sparks
                .push(super::particles::Spark::new(center, PI, gen_range(5.0, 6.0)));
            return true;
        }

        false
    }

    /// Fire at the player if they sit in the aim band on the facing side
    /// and no solid tile blocks the horizontal line between muzzle and
    /// target.
    fn try_shoot(
        &self,
        tilemap: &Tilemap,
        player: &Player,
        projectiles: &mut Vec<Projectile>,
        effects: &mut Effects,
    ) {
        let to_player = player.body.pos - self.body.pos;
        if to_player.y.abs() >= AIM_BAND {
            return;
        }

        let center = self.rect().center();
        if self.body.flip && to_player.x < 0.0 {
            let muzzle = vec2(center.x - GUN_REACH, center.y);
            if sight_clear(tilemap, muzzle, player.center()) {
                projectiles.push(Projectile::new(muzzle, -SHOT_SPEED));
                effects.impact_sparks(muzzle, PI);
            }
        } else if !self.body.flip && to_player.x > 0.0 {
            let muzzle = vec2(center.x + GUN_REACH, center.y);
            if sight_clear(tilemap, muzzle, player.center()) {
                projectiles.push(Projectile::new(muzzle, SHOT_SPEED));
                effects.impact_sparks(muzzle, 0.0);
            }
        }
    }

    pub fn render(&self, assets: &Assets, offset: IVec2) {
        self.body.render(assets, offset);

        let gun = &assets.gun;
        let center = self.rect().center();
        let (x, flip) = if self.body.flip {
            (center.x - 4.0 - gun.width(), true)
        } else {
            (center.x + 4.0, false)
        };
        draw_texture_ex(
            gun,
            x - offset.x as f32,
            center.y - offset.y as f32,
            WHITE,
            DrawTextureParams {
                flip_x: flip,
                ..Default::default()
            },
        );
    }
}

/// Sample the horizontal segment between two points at half-tile steps;
/// any solid sample blocks the shot.
fn sight_clear(tilemap: &Tilemap, from: Vec2, to: Vec2) -> bool {
    let step = tilemap.tile_size() as f32 / 2.0;
    let span = to.x - from.x;
    let samples = (span.abs() / step).ceil() as i32;
    for i in 0..=samples {
        let t = if samples == 0 { 0.0 } else { i as f32 / samples as f32 };
        let probe = vec2(from.x + span * t, from.y);
        if tilemap.is_solid_at(probe) {
            return false;
        }
    }
    true
}
