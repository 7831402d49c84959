//! Tilemap
//!
//! Sparse grid of placed tiles plus free-floating decorative tiles.
//! Owns spatial queries (neighborhood lookups, solid checks, collision
//! rectangles), the autotiling pass, and the JSON map document format
//! shared by the game and the editor.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use macroquad::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assets::Assets;

/// Pixels per grid cell unless a loaded map says otherwise.
pub const TILE_SIZE: u32 = 16;

/// Tile kinds that generate collision rectangles.
pub const SOLID_KINDS: [TileKind; 2] = [TileKind::Grass, TileKind::Stone];

/// Tile kinds whose variant is rewritten by the autotile pass.
pub const AUTOTILE_KINDS: [TileKind; 2] = [TileKind::Grass, TileKind::Stone];

/// The grid cell itself plus its 8 neighbors.
pub const NEIGHBOR_OFFSETS: [IVec2; 9] = [
    IVec2::new(-1, 0),
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(1, 0),
    IVec2::new(0, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Every tile category the asset set knows about.
///
/// Serialized as the snake_case tag used by the map document and the
/// on-disk asset folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Decor = 0,
    Grass = 1,
    LargeDecor = 2,
    Stone = 3,
    Spawners = 4,
}

impl TileKind {
    pub const COUNT: usize = 5;

    /// Editor palette order.
    pub const ALL: [TileKind; TileKind::COUNT] = [
        TileKind::Decor,
        TileKind::Grass,
        TileKind::LargeDecor,
        TileKind::Stone,
        TileKind::Spawners,
    ];

    /// The document tag, also the asset folder name under `tiles/`.
    pub fn tag(self) -> &'static str {
        match self {
            TileKind::Decor => "decor",
            TileKind::Grass => "grass",
            TileKind::LargeDecor => "large_decor",
            TileKind::Stone => "stone",
            TileKind::Spawners => "spawners",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A grid-aligned tile. Its cell coordinate is the map key, so two tiles
/// can never share a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileKind,
    pub variant: u8,
}

/// A decorative tile at an arbitrary pixel position. Does not participate
/// in physics. Also the shape returned by [`Tilemap::extract`], which
/// scales grid matches into pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffgridTile {
    pub kind: TileKind,
    pub variant: u8,
    pub pos: Vec2,
}

/// Per-kind variant inventory discovered from the loaded assets.
/// Used to validate map documents and to drive the editor palette.
#[derive(Debug, Clone, Default)]
pub struct TileCatalog {
    variants: [Vec<Vec2>; TileKind::COUNT],
}

impl TileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pixel sizes of every variant of `kind`, in variant order.
    pub fn set_variants(&mut self, kind: TileKind, sizes: Vec<Vec2>) {
        self.variants[kind.index()] = sizes;
    }

    pub fn variant_count(&self, kind: TileKind) -> usize {
        self.variants[kind.index()].len()
    }

    pub fn size_of(&self, kind: TileKind, variant: u8) -> Option<Vec2> {
        self.variants[kind.index()].get(variant as usize).copied()
    }
}

/// Errors from loading, saving, or validating a map document.
#[derive(Debug)]
pub enum MapError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidKey(String),
    InvalidTile { kind: TileKind, variant: u8 },
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        MapError::Io(e)
    }
}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        MapError::Parse(e)
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::Io(e) => write!(f, "IO error: {}", e),
            MapError::Parse(e) => write!(f, "Parse error: {}", e),
            MapError::InvalidKey(msg) => write!(f, "Invalid grid key: {}", msg),
            MapError::InvalidTile { kind, variant } => {
                write!(f, "Tile {}/{} not present in the asset set", kind.tag(), variant)
            }
        }
    }
}

impl MapError {
    /// True when loading failed only because the file does not exist.
    /// Callers that treat a missing map as "start empty" branch on this.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MapError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

// =============================================================================
// Map document (serialized shape)
// =============================================================================

#[derive(Serialize, Deserialize)]
struct TileRecord {
    #[serde(rename = "type")]
    kind: TileKind,
    variant: u8,
    pos: [i32; 2],
}

#[derive(Serialize, Deserialize)]
struct OffgridRecord {
    #[serde(rename = "type")]
    kind: TileKind,
    variant: u8,
    pos: [f32; 2],
}

/// The on-disk shape. All three fields are required; a partial document
/// is ambiguous and rejected at parse time.
#[derive(Serialize, Deserialize)]
struct MapDoc {
    tilemap: BTreeMap<String, TileRecord>,
    tile_size: u32,
    offgrid: Vec<OffgridRecord>,
}

fn grid_key(cell: IVec2) -> String {
    format!("{};{}", cell.x, cell.y)
}

fn parse_grid_key(key: &str) -> Result<IVec2, MapError> {
    let mut parts = key.splitn(2, ';');
    let x = parts.next().and_then(|s| s.parse::<i32>().ok());
    let y = parts.next().and_then(|s| s.parse::<i32>().ok());
    match (x, y) {
        (Some(x), Some(y)) => Ok(IVec2::new(x, y)),
        _ => Err(MapError::InvalidKey(format!("\"{}\"", key))),
    }
}

// =============================================================================
// Tilemap
// =============================================================================

#[derive(Debug)]
pub struct Tilemap {
    tile_size: u32,
    grid: HashMap<IVec2, Tile>,
    offgrid: Vec<OffgridTile>,
    solid_kinds: HashSet<TileKind>,
    autotile_kinds: HashSet<TileKind>,
}

impl Tilemap {
    pub fn new(tile_size: u32) -> Self {
        Self {
            tile_size,
            grid: HashMap::new(),
            offgrid: Vec::new(),
            solid_kinds: SOLID_KINDS.into_iter().collect(),
            autotile_kinds: AUTOTILE_KINDS.into_iter().collect(),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Override which tile kinds count as solid.
    pub fn set_solid_kinds(&mut self, kinds: impl IntoIterator<Item = TileKind>) {
        self.solid_kinds = kinds.into_iter().collect();
    }

    /// The grid cell containing a pixel position.
    pub fn cell_of(&self, pos: Vec2) -> IVec2 {
        let ts = self.tile_size as f32;
        IVec2::new((pos.x / ts).floor() as i32, (pos.y / ts).floor() as i32)
    }

    pub fn tile_at(&self, cell: IVec2) -> Option<&Tile> {
        self.grid.get(&cell)
    }

    pub fn set_tile(&mut self, cell: IVec2, tile: Tile) {
        self.grid.insert(cell, tile);
    }

    pub fn remove_tile(&mut self, cell: IVec2) -> Option<Tile> {
        self.grid.remove(&cell)
    }

    pub fn place_offgrid(&mut self, tile: OffgridTile) {
        self.offgrid.push(tile);
    }

    pub fn offgrid_tiles(&self) -> &[OffgridTile] {
        &self.offgrid
    }

    pub fn grid_len(&self) -> usize {
        self.grid.len()
    }

    /// Remove every off-grid tile whose rectangle contains `point`.
    /// `size_of` supplies the pixel size of a variant (the tilemap itself
    /// does not know image dimensions).
    pub fn erase_offgrid_at(&mut self, point: Vec2, size_of: impl Fn(TileKind, u8) -> Vec2) {
        self.offgrid.retain(|tile| {
            let size = size_of(tile.kind, tile.variant);
            !(point.x >= tile.pos.x
                && point.x < tile.pos.x + size.x
                && point.y >= tile.pos.y
                && point.y < tile.pos.y + size.y)
        });
    }

    /// Every existing tile in the 3x3 cell neighborhood around a pixel
    /// position, paired with its cell coordinate.
    pub fn tiles_near(&self, pos: Vec2) -> Vec<(IVec2, Tile)> {
        let center = self.cell_of(pos);
        let mut tiles = Vec::new();
        for offset in NEIGHBOR_OFFSETS {
            let cell = center + offset;
            if let Some(tile) = self.grid.get(&cell) {
                tiles.push((cell, *tile));
            }
        }
        tiles
    }

    /// Pixel-space rectangles of the solid tiles near a position.
    pub fn physics_rects_near(&self, pos: Vec2) -> Vec<Rect> {
        let ts = self.tile_size as f32;
        self.tiles_near(pos)
            .into_iter()
            .filter(|(_, tile)| self.solid_kinds.contains(&tile.kind))
            .map(|(cell, _)| Rect::new(cell.x as f32 * ts, cell.y as f32 * ts, ts, ts))
            .collect()
    }

    /// True when the grid cell containing `pos` holds a solid tile.
    pub fn is_solid_at(&self, pos: Vec2) -> bool {
        self.grid
            .get(&self.cell_of(pos))
            .map(|tile| self.solid_kinds.contains(&tile.kind))
            .unwrap_or(false)
    }

    /// Pull out every tile matching one of `id_pairs`, from the grid and
    /// the off-grid set. Grid matches are returned with their position
    /// scaled to pixel space. With `keep` set, matches stay in the map.
    pub fn extract(&mut self, id_pairs: &[(TileKind, u8)], keep: bool) -> Vec<OffgridTile> {
        let mut matches = Vec::new();

        let hit = |kind: TileKind, variant: u8| id_pairs.contains(&(kind, variant));

        for tile in &self.offgrid {
            if hit(tile.kind, tile.variant) {
                matches.push(*tile);
            }
        }
        if !keep {
            self.offgrid.retain(|tile| !hit(tile.kind, tile.variant));
        }

        let ts = self.tile_size as f32;
        let mut cells: Vec<IVec2> = self
            .grid
            .iter()
            .filter(|(_, tile)| hit(tile.kind, tile.variant))
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort_by_key(|cell| (cell.y, cell.x));
        for cell in cells {
            let tile = self.grid[&cell];
            matches.push(OffgridTile {
                kind: tile.kind,
                variant: tile.variant,
                pos: vec2(cell.x as f32 * ts, cell.y as f32 * ts),
            });
            if !keep {
                self.grid.remove(&cell);
            }
        }

        matches
    }

    /// Rewrite the variant of every autotile-eligible tile from which of
    /// its four axis neighbors share its kind. Unmatched neighbor patterns
    /// are left alone. Running the pass twice is the same as running it
    /// once: it reads kinds and writes only variants.
    pub fn autotile(&mut self) {
        let mut updates = Vec::new();
        for (&cell, tile) in &self.grid {
            if !self.autotile_kinds.contains(&tile.kind) {
                continue;
            }
            let same = |offset: IVec2| {
                self.grid
                    .get(&(cell + offset))
                    .map(|n| n.kind == tile.kind)
                    .unwrap_or(false)
            };
            let left = same(IVec2::new(-1, 0));
            let right = same(IVec2::new(1, 0));
            let up = same(IVec2::new(0, -1));
            let down = same(IVec2::new(0, 1));
            if let Some(variant) = autotile_variant(left, right, up, down) {
                updates.push((cell, variant));
            }
        }
        for (cell, variant) in updates {
            if let Some(tile) = self.grid.get_mut(&cell) {
                tile.variant = variant;
            }
        }
    }

    /// Check every tile reference against the loaded asset inventory.
    pub fn validate(&self, catalog: &TileCatalog) -> Result<(), MapError> {
        let check = |kind: TileKind, variant: u8| {
            if (variant as usize) < catalog.variant_count(kind) {
                Ok(())
            } else {
                Err(MapError::InvalidTile { kind, variant })
            }
        };
        for tile in self.grid.values() {
            check(tile.kind, tile.variant)?;
        }
        for tile in &self.offgrid {
            check(tile.kind, tile.variant)?;
        }
        Ok(())
    }

    // =========================================================================
    // Document IO
    // =========================================================================

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        let doc = MapDoc {
            tilemap: self
                .grid
                .iter()
                .map(|(&cell, tile)| {
                    (
                        grid_key(cell),
                        TileRecord {
                            kind: tile.kind,
                            variant: tile.variant,
                            pos: [cell.x, cell.y],
                        },
                    )
                })
                .collect(),
            tile_size: self.tile_size,
            offgrid: self
                .offgrid
                .iter()
                .map(|tile| OffgridRecord {
                    kind: tile.kind,
                    variant: tile.variant,
                    pos: [tile.pos.x, tile.pos.y],
                })
                .collect(),
        };
        fs::write(path, serde_json::to_string(&doc)?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let contents = fs::read_to_string(path)?;
        let doc: MapDoc = serde_json::from_str(&contents)?;

        let mut grid = HashMap::with_capacity(doc.tilemap.len());
        for (key, record) in doc.tilemap {
            let cell = parse_grid_key(&key)?;
            if record.pos != [cell.x, cell.y] {
                return Err(MapError::InvalidKey(format!(
                    "key \"{}\" disagrees with tile pos {:?}",
                    key, record.pos
                )));
            }
            grid.insert(
                cell,
                Tile {
                    kind: record.kind,
                    variant: record.variant,
                },
            );
        }

        Ok(Self {
            tile_size: doc.tile_size,
            grid,
            offgrid: doc
                .offgrid
                .into_iter()
                .map(|record| OffgridTile {
                    kind: record.kind,
                    variant: record.variant,
                    pos: vec2(record.pos[0], record.pos[1]),
                })
                .collect(),
            solid_kinds: SOLID_KINDS.into_iter().collect(),
            autotile_kinds: AUTOTILE_KINDS.into_iter().collect(),
        })
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Draw off-grid tiles in placement order, then only the grid cells
    /// overlapping the view rectangle (plus a row/column of slack for
    /// partial-tile scroll). Never walks the whole sparse grid.
    pub fn render(&self, assets: &Assets, offset: IVec2, view: Vec2) {
        for tile in &self.offgrid {
            draw_texture(
                assets.tile(tile.kind, tile.variant),
                tile.pos.x - offset.x as f32,
                tile.pos.y - offset.y as f32,
                WHITE,
            );
        }

        // div_euclid floors, so negative offsets still start at the
        // correct leftmost/topmost cell.
        let ts = self.tile_size as i32;
        let x_range = offset.x.div_euclid(ts)..(offset.x + view.x as i32).div_euclid(ts) + 1;
        let y_range = offset.y.div_euclid(ts)..(offset.y + view.y as i32).div_euclid(ts) + 1;
        for x in x_range {
            for y in y_range.clone() {
                let cell = IVec2::new(x, y);
                if let Some(tile) = self.tile_at(cell) {
                    draw_texture(
                        assets.tile(tile.kind, tile.variant),
                        (cell.x * ts - offset.x) as f32,
                        (cell.y * ts - offset.y) as f32,
                        WHITE,
                    );
                }
            }
        }
    }
}

/// The nine neighbor patterns with a dedicated variant: four corners,
/// four edges, and the interior.
fn autotile_variant(left: bool, right: bool, up: bool, down: bool) -> Option<u8> {
    match (left, right, up, down) {
        (false, true, false, true) => Some(0),
        (true, true, false, true) => Some(1),
        (true, false, false, true) => Some(2),
        (true, false, true, true) => Some(3),
        (true, false, true, false) => Some(4),
        (true, true, true, false) => Some(5),
        (false, true, true, false) => Some(6),
        (false, true, true, true) => Some(7),
        (true, true, true, true) => Some(8),
        _ => None,
    }
}
