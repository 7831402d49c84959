//! Parallax cloud layer
//!
//! Clouds drift slowly rightward and scroll at a fraction of the camera
//! offset proportional to their depth, wrapping around the view.

use macroquad::prelude::*;
use macroquad::rand::gen_range;

use crate::assets::Assets;

#[derive(Debug, Clone, Copy)]
struct Cloud {
    pos: Vec2,
    image: usize,
    speed: f32,
    depth: f32,
}

#[derive(Debug, Clone)]
pub struct Clouds {
    clouds: Vec<Cloud>,
}

impl Clouds {
    /// Scatter `count` clouds over a wide band, picking from
    /// `image_count` cloud sprites.
    pub fn new(count: usize, image_count: usize) -> Self {
        let clouds = (0..count)
            .map(|_| Cloud {
                pos: vec2(gen_range(0.0, 99999.0), gen_range(0.0, 99999.0)),
                image: gen_range(0, image_count.max(1)),
                speed: gen_range(0.05, 0.1),
                depth: gen_range(0.2, 0.8),
            })
            .collect();
        Self { clouds }
    }

    pub fn update(&mut self) {
        for cloud in &mut self.clouds {
            cloud.pos.x += cloud.speed;
        }
    }

    pub fn render(&self, assets: &Assets, offset: IVec2, view: Vec2) {
        for cloud in &self.clouds {
            let img = &assets.clouds[cloud.image % assets.clouds.len()];
            let render_pos = cloud.pos - vec2(offset.x as f32, offset.y as f32) * cloud.depth;
            // Wrap into the view band, one sprite of slack on each side.
            let x = render_pos.x.rem_euclid(view.x + img.width()) - img.width();
            let y = render_pos.y.rem_euclid(view.y + img.height()) - img.height();
            draw_texture(img, x, y, WHITE);
        }
    }
}
