//! Entity physics
//!
//! Axis-separated collision resolution against tile rectangles. Motion is
//! resolved horizontally first, then vertically, never diagonally, which
//! keeps push-out against axis-aligned rectangles exact and order
//! independent. A rectangle flush against a tile edge is not a collision;
//! only area overlap counts.

use macroquad::prelude::*;

use crate::animation::{AnimCatalog, Animation, AnimKey};
use crate::assets::Assets;
use crate::tilemap::Tilemap;

/// Downward acceleration per tick.
pub const GRAVITY: f32 = 0.1;
/// Terminal fall speed.
pub const MAX_FALL_SPEED: f32 = 5.0;

/// Sprites are drawn slightly up-left of the collision box.
pub const SPRITE_OFFSET: Vec2 = Vec2::new(-3.0, -3.0);

/// Which sides touched a solid tile this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collisions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Area overlap with strict inequalities: rectangles sharing only an edge
/// do not collide, so entities resting flush against tiles never stick.
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Point-in-rectangle with the half-open convention (left/top edges in,
/// right/bottom edges out).
pub fn rect_contains(rect: &Rect, point: Vec2) -> bool {
    point.x >= rect.x && point.x < rect.x + rect.w && point.y >= rect.y && point.y < rect.y + rect.h
}

/// Shared positional state of every moving actor: the player and enemies
/// embed one and drive it with their per-tick movement request.
#[derive(Debug, Clone)]
pub struct PhysicsBody {
    /// Top-left corner of the collision box.
    pub pos: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub collisions: Collisions,
    /// Facing: false = right, true = left.
    pub flip: bool,
    pub last_movement: Vec2,
    pub anim: Animation,
}

impl PhysicsBody {
    pub fn new(pos: Vec2, size: Vec2, anim: Animation) -> Self {
        Self {
            pos,
            size,
            velocity: Vec2::ZERO,
            collisions: Collisions::default(),
            flip: false,
            last_movement: Vec2::ZERO,
            anim,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Switch animation strips, restarting only on an actual change.
    pub fn set_action(&mut self, key: AnimKey, catalog: &AnimCatalog) {
        if self.anim.key() != key {
            self.anim = catalog.animation(key);
        }
    }

    /// Advance one tick: apply movement + velocity with axis-separated
    /// collision resolution, update facing, accumulate clamped gravity,
    /// and step the animation. Vertical contact kills vertical velocity;
    /// horizontal contact only stops penetration for this tick.
    pub fn update(&mut self, tilemap: &Tilemap, movement: Vec2) {
        self.collisions = Collisions::default();
        let frame_movement = movement + self.velocity;

        self.pos.x += frame_movement.x;
        let mut rect = self.rect();
        for tile_rect in tilemap.physics_rects_near(self.pos) {
            if rects_overlap(&rect, &tile_rect) {
                if frame_movement.x > 0.0 {
                    rect.x = tile_rect.x - rect.w;
                    self.collisions.right = true;
                }
                if frame_movement.x < 0.0 {
                    rect.x = tile_rect.x + tile_rect.w;
                    self.collisions.left = true;
                }
                self.pos.x = rect.x;
            }
        }

        self.pos.y += frame_movement.y;
        let mut rect = self.rect();
        for tile_rect in tilemap.physics_rects_near(self.pos) {
            if rects_overlap(&rect, &tile_rect) {
                if frame_movement.y > 0.0 {
                    rect.y = tile_rect.y - rect.h;
                    self.collisions.down = true;
                }
                if frame_movement.y < 0.0 {
                    rect.y = tile_rect.y + tile_rect.h;
                    self.collisions.up = true;
                }
                self.pos.y = rect.y;
            }
        }

        if movement.x > 0.0 {
            self.flip = false;
        }
        if movement.x < 0.0 {
            self.flip = true;
        }
        self.last_movement = movement;

        self.velocity.y = (self.velocity.y + GRAVITY).min(MAX_FALL_SPEED);
        if self.collisions.down || self.collisions.up {
            self.velocity.y = 0.0;
        }

        self.anim.update();
    }

    pub fn render(&self, assets: &Assets, offset: IVec2) {
        let frame = assets.anim_frame(self.anim.key(), self.anim.current_index());
        draw_texture_ex(
            frame,
            self.pos.x + SPRITE_OFFSET.x - offset.x as f32,
            self.pos.y + SPRITE_OFFSET.y - offset.y as f32,
            WHITE,
            DrawTextureParams {
                flip_x: self.flip,
                ..Default::default()
            },
        );
    }
}
