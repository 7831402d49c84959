//! Enemy projectiles
//!
//! Straight horizontal shots. The session loop owns the impact rules
//! (tiles, age ceiling, the player); this type only carries the motion.

use macroquad::prelude::*;

use crate::assets::Assets;

/// Ticks a shot survives before despawning mid-air.
pub const MAX_AGE: u32 = 360;

#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub pos: Vec2,
    /// Signed horizontal speed in pixels per tick.
    pub direction: f32,
    pub age: u32,
}

impl Projectile {
    pub fn new(pos: Vec2, direction: f32) -> Self {
        Self {
            pos,
            direction,
            age: 0,
        }
    }

    pub fn advance(&mut self) {
        self.pos.x += self.direction;
        self.age += 1;
    }

    pub fn expired(&self) -> bool {
        self.age > MAX_AGE
    }

    pub fn render(&self, assets: &Assets, offset: IVec2) {
        let img = &assets.projectile;
        draw_texture(
            img,
            self.pos.x - img.width() / 2.0 - offset.x as f32,
            self.pos.y - img.height() / 2.0 - offset.y as f32,
            WHITE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_advances_and_expires() {
        let mut shot = Projectile::new(vec2(10.0, 4.0), -1.5);
        shot.advance();
        assert_eq!(shot.pos, vec2(8.5, 4.0));
        assert!(!shot.expired());

        for _ in 0..MAX_AGE {
            shot.advance();
        }
        assert!(shot.expired());
    }
}
