//! Asset table
//!
//! Loads every image the game and editor draw from, once, at startup.
//! PNGs are decoded with the `image` crate so the pure-black color key
//! can be turned into transparency before upload; everything is filtered
//! nearest for crisp pixels. A missing or undecodable file is fatal:
//! nothing can render without its full asset set.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use macroquad::prelude::*;

use crate::animation::{AnimCatalog, AnimKey};
use crate::tilemap::{TileCatalog, TileKind};

/// Error type for asset loading
#[derive(Debug)]
pub enum AssetError {
    Io { path: PathBuf, source: std::io::Error },
    Decode { path: PathBuf, source: image::ImageError },
    Empty(PathBuf),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io { path, source } => {
                write!(f, "IO error reading {}: {}", path.display(), source)
            }
            AssetError::Decode { path, source } => {
                write!(f, "Failed to decode {}: {}", path.display(), source)
            }
            AssetError::Empty(path) => write!(f, "No images in {}", path.display()),
        }
    }
}

pub struct Assets {
    tiles: HashMap<TileKind, Vec<Texture2D>>,
    anims: HashMap<AnimKey, Vec<Texture2D>>,
    pub background: Texture2D,
    pub gun: Texture2D,
    pub projectile: Texture2D,
    pub clouds: Vec<Texture2D>,
}

impl Assets {
    /// Load the full asset tree rooted at `base` (tile folders per kind,
    /// animation strips, clouds, and the single images).
    pub fn load<P: AsRef<Path>>(base: P) -> Result<Self, AssetError> {
        let base = base.as_ref();

        let mut tiles = HashMap::new();
        for kind in TileKind::ALL {
            let dir = base.join("tiles").join(kind.tag());
            tiles.insert(kind, load_images(&dir)?);
        }

        let mut anims = HashMap::new();
        for key in AnimKey::ALL {
            anims.insert(key, load_images(&base.join(key.dir()))?);
        }

        Ok(Self {
            tiles,
            anims,
            background: load_image(&base.join("background.png"))?,
            gun: load_image(&base.join("gun.png"))?,
            projectile: load_image(&base.join("projectile.png"))?,
            clouds: load_images(&base.join("clouds"))?,
        })
    }

    /// Variant image of a tile kind. Maps are validated against the
    /// catalog at load time, so the index is always in range.
    pub fn tile(&self, kind: TileKind, variant: u8) -> &Texture2D {
        &self.tiles[&kind][variant as usize]
    }

    /// Frame of an animation strip, clamped to the strip length.
    pub fn anim_frame(&self, key: AnimKey, index: usize) -> &Texture2D {
        let frames = &self.anims[&key];
        &frames[index.min(frames.len() - 1)]
    }

    pub fn cloud_count(&self) -> usize {
        self.clouds.len()
    }

    /// Per-kind variant sizes, for map validation and the editor palette.
    pub fn tile_catalog(&self) -> TileCatalog {
        let mut catalog = TileCatalog::new();
        for kind in TileKind::ALL {
            let sizes = self.tiles[&kind]
                .iter()
                .map(|tex| vec2(tex.width(), tex.height()))
                .collect();
            catalog.set_variants(kind, sizes);
        }
        catalog
    }

    /// Frame counts per strip, for animation instances.
    pub fn anim_catalog(&self) -> AnimCatalog {
        let mut catalog = AnimCatalog::new();
        for key in AnimKey::ALL {
            catalog.set_count(key, self.anims[&key].len() as u32);
        }
        catalog
    }
}

/// Decode a PNG, turn the pure-black color key transparent, and upload
/// it as a nearest-filtered texture.
fn load_image(path: &Path) -> Result<Texture2D, AssetError> {
    let img = image::open(path).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rgba = img.to_rgba8();
    for pixel in rgba.pixels_mut() {
        if pixel[0] == 0 && pixel[1] == 0 && pixel[2] == 0 {
            pixel[3] = 0;
        }
    }
    let texture = Texture2D::from_rgba8(rgba.width() as u16, rgba.height() as u16, &rgba);
    texture.set_filter(FilterMode::Nearest);
    Ok(texture)
}

/// Load every PNG in a folder, ordered by file name.
fn load_images(dir: &Path) -> Result<Vec<Texture2D>, AssetError> {
    let entries = fs::read_dir(dir).map_err(|source| AssetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("png"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(AssetError::Empty(dir.to_path_buf()));
    }
    paths.iter().map(|path| load_image(path)).collect()
}
