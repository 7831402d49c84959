//! Particles and sparks
//!
//! Purely cosmetic simulation objects: kinematic integrators with no
//! tile collision. Particles die when their animation strip completes,
//! sparks when their speed decays to zero. The [`Effects`] pool owns both
//! sets and every emission helper (leaf drops, dash trails, muzzle
//! flashes, death explosions).

use std::f32::consts::PI;

use macroquad::prelude::*;
use macroquad::rand::gen_range;

use crate::animation::{AnimCatalog, Animation, AnimKey};
use crate::assets::Assets;

/// Animated particle category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Leaf,
    Dust,
}

impl ParticleKind {
    pub fn anim_key(self) -> AnimKey {
        match self {
            ParticleKind::Leaf => AnimKey::Leaf,
            ParticleKind::Dust => AnimKey::Dust,
        }
    }
}

/// A drifting sprite with its own animation instance.
#[derive(Debug, Clone)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub velocity: Vec2,
    pub anim: Animation,
}

impl Particle {
    pub fn new(
        kind: ParticleKind,
        pos: Vec2,
        velocity: Vec2,
        start_frame: u32,
        catalog: &AnimCatalog,
    ) -> Self {
        Self {
            kind,
            pos,
            velocity,
            anim: catalog.animation(kind.anim_key()).with_start_frame(start_frame),
        }
    }

    /// Advance one tick. Returns true when the particle is spent.
    pub fn update(&mut self) -> bool {
        let kill = self.anim.done();

        self.pos += self.velocity;
        // Leaves drift side to side as they fall.
        if self.kind == ParticleKind::Leaf {
            self.pos.x += (self.anim.frame() as f32 * 0.035).sin() * 0.35;
        }
        self.anim.update();

        kill
    }

    pub fn render(&self, assets: &Assets, offset: IVec2) {
        let frame = assets.anim_frame(self.anim.key(), self.anim.current_index());
        draw_texture(
            frame,
            self.pos.x - frame.width() / 2.0 - offset.x as f32,
            self.pos.y - frame.height() / 2.0 - offset.y as f32,
            WHITE,
        );
    }
}

/// A fading streak of light, rendered as a diamond stretched along its
/// direction of travel.
#[derive(Debug, Clone, Copy)]
pub struct Spark {
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
}

impl Spark {
    pub fn new(pos: Vec2, angle: f32, speed: f32) -> Self {
        Self { pos, angle, speed }
    }

    /// Advance one tick. Returns true once the spark has burned out.
    pub fn update(&mut self) -> bool {
        self.pos += vec2(self.angle.cos(), self.angle.sin()) * self.speed;
        self.speed = (self.speed - 0.1).max(0.0);
        self.speed == 0.0
    }

    pub fn render(&self, offset: IVec2) {
        let at = self.pos - vec2(offset.x as f32, offset.y as f32);
        let polar = |angle: f32, len: f32| at + vec2(angle.cos(), angle.sin()) * len;
        let front = polar(self.angle, self.speed * 3.0);
        let right = polar(self.angle + PI * 0.5, self.speed * 0.5);
        let back = polar(self.angle + PI, self.speed * 3.0);
        let left = polar(self.angle - PI * 0.5, self.speed * 0.5);
        draw_triangle(front, right, back, WHITE);
        draw_triangle(back, left, front, WHITE);
    }
}

/// Owns every live particle and spark for a level.
#[derive(Debug, Clone, Default)]
pub struct Effects {
    pub particles: Vec<Particle>,
    pub sparks: Vec<Spark>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.sparks.clear();
    }

    /// Advance and drop spent effects.
    pub fn update(&mut self) {
        self.sparks.retain_mut(|spark| !spark.update());
        self.particles.retain_mut(|particle| !particle.update());
    }

    /// A single leaf shed by a tree canopy.
    pub fn spawn_leaf(&mut self, pos: Vec2, catalog: &AnimCatalog) {
        let velocity = vec2(gen_range(0.1, 0.4), gen_range(0.2, 0.4));
        let start = gen_range(0, 21);
        self.particles
            .push(Particle::new(ParticleKind::Leaf, pos, velocity, start, catalog));
    }

    /// Ring of dust thrown out at the start and end of a dash burst.
    pub fn dash_ring(&mut self, center: Vec2, catalog: &AnimCatalog) {
        for _ in 0..20 {
            let angle = gen_range(0.0, PI * 2.0);
            let speed = gen_range(0.5, 1.0);
            let velocity = vec2(angle.cos(), angle.sin()) * speed;
            let start = gen_range(0, 8);
            self.particles
                .push(Particle::new(ParticleKind::Dust, center, velocity, start, catalog));
        }
    }

    /// Dust streaming off the player while the dash burst lasts.
    pub fn dash_trail(&mut self, center: Vec2, direction: f32, catalog: &AnimCatalog) {
        let velocity = vec2(direction * gen_range(0.0, 3.0), 0.0);
        let start = gen_range(0, 8);
        self.particles
            .push(Particle::new(ParticleKind::Dust, center, velocity, start, catalog));
    }

    /// Four short sparks fanned around `base_angle` (muzzle flashes and
    /// projectile impacts).
    pub fn impact_sparks(&mut self, pos: Vec2, base_angle: f32) {
        for _ in 0..4 {
            let angle = base_angle + gen_range(-0.5, 0.5);
            self.sparks.push(Spark::new(pos, angle, gen_range(2.0, 3.0)));
        }
    }

    /// The big omnidirectional burst used for deaths: 30 sparks plus 30
    /// dust particles blown out the opposite way.
    pub fn death_burst(&mut self, center: Vec2, catalog: &AnimCatalog) {
        for _ in 0..30 {
            let angle = gen_range(0.0, PI * 2.0);
            let speed = gen_range(0.0, 5.0);
            self.sparks
                .push(Spark::new(center, angle, gen_range(2.0, 3.0)));
            let velocity = vec2(
                (angle + PI).cos() * speed * 0.5,
                (angle + PI).sin() * speed * 0.5,
            );
            let start = gen_range(0, 8);
            self.particles
                .push(Particle::new(ParticleKind::Dust, center, velocity, start, catalog));
        }
    }

    /// Draw order: sparks under particles.
    pub fn render(&self, assets: &Assets, offset: IVec2) {
        for spark in &self.sparks {
            spark.render(offset);
        }
        for particle in &self.particles {
            particle.render(assets, offset);
        }
    }
}
