//! Player
//!
//! The one persistent actor of a session. Carries the jump/dash budgets,
//! the wall-slide state, and the signed dash timer on top of a shared
//! physics body. Repositioned (never recreated) on level load and
//! respawn.

use macroquad::prelude::*;

use crate::animation::{AnimCatalog, AnimKey};
use crate::assets::Assets;
use crate::input::GameInput;
use crate::tilemap::Tilemap;

use super::particles::Effects;
use super::physics::PhysicsBody;

pub const PLAYER_SIZE: Vec2 = Vec2::new(8.0, 15.0);

/// Upward impulse of a normal jump.
pub const JUMP_SPEED: f32 = -3.0;
/// Impulse of a wall jump: horizontal push away from the wall plus lift.
pub const WALL_JUMP_SPEED: Vec2 = Vec2::new(3.5, -2.5);
/// Fall speed cap while pressed against a wall.
pub const WALL_SLIDE_SPEED: f32 = 0.5;
/// Minimum downward speed before a wall counts as slideable.
pub const WALL_SLIDE_MIN_FALL: f32 = 0.0;
/// Ticks of air time before the player counts as airborne.
pub const AIRBORNE_GRACE: u32 = 4;
/// Ticks of free fall before the player is considered lost.
pub const FALL_DEATH_TICKS: u32 = 120;

/// Full length of the dash timer.
pub const DASH_TICKS: i32 = 60;
/// While |timer| is above this the dash is in its burst phase; at or
/// above it the player shrugs off projectiles.
pub const DASH_COAST: i32 = 50;
/// Forced horizontal speed during the burst.
pub const DASH_SPEED: f32 = 8.0;

pub const MAX_JUMPS: u32 = 1;
pub const MAX_DASHES: u32 = 1;

#[derive(Debug)]
pub struct Player {
    pub body: PhysicsBody,
    /// Ticks since the player last stood on ground.
    pub air_time: u32,
    pub jumps: u32,
    pub wall_slide: bool,
    /// Signed dash timer: positive dashes right, negative left, zero idle.
    pub dashing: i32,
    pub dashes: u32,
}

impl Player {
    pub fn new(pos: Vec2, catalog: &AnimCatalog) -> Self {
        Self {
            body: PhysicsBody::new(pos, PLAYER_SIZE, catalog.animation(AnimKey::PlayerIdle)),
            air_time: 0,
            jumps: MAX_JUMPS,
            wall_slide: false,
            dashing: 0,
            dashes: MAX_DASHES,
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    /// Move to a spawn point and shed all transient state.
    pub fn respawn(&mut self, pos: Vec2) {
        self.body.pos = pos;
        self.body.velocity = Vec2::ZERO;
        self.body.collisions = Default::default();
        self.air_time = 0;
        self.jumps = MAX_JUMPS;
        self.wall_slide = false;
        self.dashing = 0;
        self.dashes = MAX_DASHES;
    }

    /// Projectiles pass through the player for the whole dash window.
    pub fn vulnerable(&self) -> bool {
        self.dashing.abs() < DASH_COAST
    }

    pub fn update(
        &mut self,
        tilemap: &Tilemap,
        catalog: &AnimCatalog,
        input: &GameInput,
        effects: &mut Effects,
    ) {
        let movement = vec2(input.axis(), 0.0);
        self.body.update(tilemap, movement);

        self.air_time += 1;
        if self.body.collisions.down {
            self.air_time = 0;
            self.jumps = MAX_JUMPS;
            if self.dashing == 0 {
                self.dashes = MAX_DASHES;
            }
        }

        self.wall_slide = false;
        let airborne = self.air_time > AIRBORNE_GRACE;
        let falling = self.body.velocity.y > WALL_SLIDE_MIN_FALL;
        let wall_ahead = (self.body.collisions.right && !self.body.flip)
            || (self.body.collisions.left && self.body.flip);
        if airborne && falling && wall_ahead {
            self.wall_slide = true;
            self.body.velocity.y = self.body.velocity.y.min(WALL_SLIDE_SPEED);
        }

        if self.wall_slide {
            self.body.set_action(AnimKey::PlayerWallSlide, catalog);
        } else if airborne {
            self.body.set_action(AnimKey::PlayerJump, catalog);
        } else if movement.x != 0.0 {
            self.body.set_action(AnimKey::PlayerRun, catalog);
        } else {
            self.body.set_action(AnimKey::PlayerIdle, catalog);
        }

        if input.jump {
            self.jump();
        }
        if input.dash {
            self.dash();
        }

        // Burst endpoints throw out a ring of dust.
        if self.dashing.abs() == DASH_TICKS || self.dashing.abs() == DASH_COAST {
            effects.dash_ring(self.center(), catalog);
        }
        if self.dashing > 0 {
            self.dashing = (self.dashing - 1).max(0);
        }
        if self.dashing < 0 {
            self.dashing = (self.dashing + 1).min(0);
        }
        if self.dashing.abs() > DASH_COAST {
            let direction = self.dashing.signum() as f32;
            self.body.velocity.x = direction * DASH_SPEED;
            // Kill most of the speed at the burst/coast boundary.
            if self.dashing.abs() == DASH_COAST + 1 {
                self.body.velocity.x *= 0.1;
            }
            // The burst overrides gravity for its duration.
            self.body.velocity.y = 0.0;
            effects.dash_trail(self.center(), direction, catalog);
        }

        if self.body.velocity.x > 0.0 {
            self.body.velocity.x = (self.body.velocity.x - 0.1).max(0.0);
        } else {
            self.body.velocity.x = (self.body.velocity.x + 0.1).min(0.0);
        }
    }

    /// Try to jump. Wall jumps are always available while sliding and
    /// only saturate the budget; normal jumps require budget.
    pub fn jump(&mut self) -> bool {
        if self.wall_slide {
            if self.body.flip && self.body.last_movement.x < 0.0 {
                self.body.velocity.x = WALL_JUMP_SPEED.x;
                self.body.velocity.y = WALL_JUMP_SPEED.y;
                self.air_time = AIRBORNE_GRACE + 1;
                self.jumps = self.jumps.saturating_sub(1);
                return true;
            } else if !self.body.flip && self.body.last_movement.x > 0.0 {
                self.body.velocity.x = -WALL_JUMP_SPEED.x;
                self.body.velocity.y = WALL_JUMP_SPEED.y;
                self.air_time = AIRBORNE_GRACE + 1;
                self.jumps = self.jumps.saturating_sub(1);
                return true;
            }
        } else if self.jumps > 0 {
            self.body.velocity.y = JUMP_SPEED;
            self.jumps -= 1;
            self.air_time = AIRBORNE_GRACE + 1;
            return true;
        }
        false
    }

    /// Start a dash in the facing direction if the budget allows.
    pub fn dash(&mut self) {
        if self.dashing == 0 && self.dashes > 0 {
            self.dashes -= 1;
            self.dashing = if self.body.flip { -DASH_TICKS } else { DASH_TICKS };
        }
    }

    /// The player sprite vanishes during the dash burst.
    pub fn render(&self, assets: &Assets, offset: IVec2) {
        if self.dashing.abs() <= DASH_COAST {
            self.body.render(assets, offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::{Tile, TileKind};

    fn platform_map() -> Tilemap {
        let mut map = Tilemap::new(16);
        for x in -2..8 {
            map.set_tile(
                IVec2::new(x, 2),
                Tile {
                    kind: TileKind::Grass,
                    variant: 0,
                },
            );
        }
        map
    }

    fn wall_map() -> Tilemap {
        let mut map = Tilemap::new(16);
        for y in 0..6 {
            map.set_tile(
                IVec2::new(1, y),
                Tile {
                    kind: TileKind::Grass,
                    variant: 0,
                },
            );
        }
        map
    }

    fn tick(player: &mut Player, map: &Tilemap, input: GameInput) {
        let catalog = AnimCatalog::new();
        let mut effects = Effects::new();
        player.update(map, &catalog, &input, &mut effects);
    }

    fn grounded_player(map: &Tilemap) -> Player {
        let catalog = AnimCatalog::new();
        let mut player = Player::new(vec2(4.0, 14.0), &catalog);
        player.body.velocity.y = 3.0;
        for _ in 0..5 {
            tick(&mut player, map, GameInput::default());
            if player.body.collisions.down {
                break;
            }
        }
        assert!(player.body.collisions.down, "setup: player must be grounded");
        player
    }

    #[test]
    fn test_jump_consumes_budget_and_landing_restores_it() {
        let map = platform_map();
        let mut player = grounded_player(&map);

        tick(&mut player, &map, GameInput { jump: true, ..Default::default() });
        assert_eq!(player.jumps, 0);
        assert_eq!(player.body.velocity.y, JUMP_SPEED);

        // A second jump mid-air does nothing.
        tick(&mut player, &map, GameInput { jump: true, ..Default::default() });
        assert!(player.body.velocity.y < 0.0);
        assert_eq!(player.jumps, 0);

        // Ride the arc back down to the platform.
        for _ in 0..200 {
            tick(&mut player, &map, GameInput::default());
            if player.body.collisions.down {
                break;
            }
        }
        assert!(player.body.collisions.down);
        assert_eq!(player.jumps, MAX_JUMPS);
    }

    #[test]
    fn test_wall_slide_clamps_fall_speed() {
        let map = wall_map();
        let catalog = AnimCatalog::new();
        let mut player = Player::new(vec2(8.0, 0.0), &catalog);

        let push_right = GameInput { right: true, ..Default::default() };
        for _ in 0..8 {
            tick(&mut player, &map, push_right);
        }
        assert!(player.wall_slide);
        assert!(player.body.velocity.y <= WALL_SLIDE_SPEED);
        assert_eq!(player.body.anim.key(), AnimKey::PlayerWallSlide);
    }

    #[test]
    fn test_wall_jump_works_with_empty_jump_budget() {
        let map = wall_map();
        let catalog = AnimCatalog::new();
        let mut player = Player::new(vec2(8.0, 0.0), &catalog);
        player.jumps = 0;

        let push_right = GameInput { right: true, ..Default::default() };
        for _ in 0..8 {
            tick(&mut player, &map, push_right);
        }
        assert!(player.wall_slide);

        let jumped = player.jump();
        assert!(jumped);
        // Pushed away from the right-hand wall.
        assert_eq!(player.body.velocity.x, -WALL_JUMP_SPEED.x);
        assert_eq!(player.body.velocity.y, WALL_JUMP_SPEED.y);
        assert_eq!(player.jumps, 0);
    }

    #[test]
    fn test_dash_timer_strictly_decreases_and_forces_burst_speed() {
        let map = platform_map();
        let mut player = grounded_player(&map);

        tick(&mut player, &map, GameInput { dash: true, ..Default::default() });
        assert_eq!(player.dashing, DASH_TICKS - 1);
        assert_eq!(player.dashes, 0);
        // Forced to dash speed, then the universal 0.1 decay.
        assert_eq!(player.body.velocity.x, DASH_SPEED - 0.1);

        let mut last = player.dashing;
        while player.dashing != 0 {
            tick(&mut player, &map, GameInput::default());
            assert!(player.dashing.abs() < last.abs(), "timer must strictly decrease");
            last = player.dashing;
            if player.dashing.abs() > DASH_COAST + 1 {
                assert!(player.body.velocity.x >= DASH_SPEED - 0.2);
            }
        }
        // Once the timer is spent the burst speed is long gone.
        assert!(player.body.velocity.x < DASH_SPEED / 2.0);
    }

    #[test]
    fn test_dash_faces_left_when_flipped() {
        let map = platform_map();
        let mut player = grounded_player(&map);
        tick(&mut player, &map, GameInput { left: true, ..Default::default() });
        assert!(player.body.flip);

        tick(&mut player, &map, GameInput { dash: true, ..Default::default() });
        assert_eq!(player.dashing, -(DASH_TICKS - 1));
        assert!(player.body.velocity.x < 0.0);
    }

    #[test]
    fn test_dash_budget_replenishes_only_on_ground() {
        let map = platform_map();
        let mut player = grounded_player(&map);

        tick(&mut player, &map, GameInput { dash: true, ..Default::default() });
        assert_eq!(player.dashes, 0);

        // Mid-dash, grounded or not, the budget stays spent.
        tick(&mut player, &map, GameInput { dash: true, ..Default::default() });
        assert_eq!(player.dashes, 0);
        assert!(player.dashing > 0);

        // Run out the timer while standing on the platform.
        for _ in 0..DASH_TICKS + 2 {
            tick(&mut player, &map, GameInput::default());
        }
        assert_eq!(player.dashing, 0);
        assert_eq!(player.dashes, MAX_DASHES);
    }

    #[test]
    fn test_dash_invulnerability_window() {
        let map = platform_map();
        let mut player = grounded_player(&map);
        assert!(player.vulnerable());

        tick(&mut player, &map, GameInput { dash: true, ..Default::default() });
        assert!(!player.vulnerable());

        for _ in 0..(DASH_TICKS - DASH_COAST) {
            tick(&mut player, &map, GameInput::default());
        }
        assert!(player.dashing.abs() < DASH_COAST);
        assert!(player.vulnerable());
    }

    #[test]
    fn test_respawn_clears_transient_state() {
        let map = platform_map();
        let mut player = grounded_player(&map);
        tick(&mut player, &map, GameInput { dash: true, ..Default::default() });

        player.respawn(vec2(50.0, 50.0));
        assert_eq!(player.body.pos, vec2(50.0, 50.0));
        assert_eq!(player.body.velocity, Vec2::ZERO);
        assert_eq!(player.dashing, 0);
        assert_eq!(player.dashes, MAX_DASHES);
        assert_eq!(player.air_time, 0);
    }
}
