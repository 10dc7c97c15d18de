// Tile identities, logical tile entries and the entry resolver.
//
// A `TileRef` names one concrete tile (`tileset` + `index`). A tile *entry*
// is a logical family of tiles addressed by a variant offset: a wall style
// has west/north/corner/door-cut/window-cut variants, a roof slope style has
// one tile per slope direction and row, and so on. The compositor never
// stores concrete tiles for entries; it stores `(EntryId, offset, rotation)`
// and leaves resolution to the renderer, except where it needs a tile's
// identity itself (grime classification).
//
// `EntryId::NONE` is the "no tile" sentinel. Resolving it, an unknown id or
// an offset the entry does not define yields `None`, never an error.
//
// Variant offsets per category are declared with `tile_variants!`, which
// gives each enum a stable `offset()` and an `ALL` table in offset order.
//
// See also: `cell.rs` for the slots that hold `(EntryId, offset)` pairs,
// `properties.rs` for the metadata keyed by `TileRef`.

use crate::types::{Edge, Facing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Concrete tiles
// ---------------------------------------------------------------------------

/// Identity of one concrete tile. Displays as `tileset_index`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileRef {
    pub tileset: String,
    pub index: u32,
}

impl TileRef {
    pub fn new(tileset: impl Into<String>, index: u32) -> Self {
        Self {
            tileset: tileset.into(),
            index,
        }
    }
}

impl fmt::Display for TileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.tileset, self.index)
    }
}

impl FromStr for TileRef {
    type Err = String;

    /// Parse `tileset_index`; the tileset name may itself contain underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tileset, index) = s
            .rsplit_once('_')
            .ok_or_else(|| format!("tile name '{s}' has no '_index' suffix"))?;
        if tileset.is_empty() {
            return Err(format!("tile name '{s}' has an empty tileset"));
        }
        let index = index
            .parse::<u32>()
            .map_err(|e| format!("tile name '{s}': bad index: {e}"))?;
        Ok(Self::new(tileset, index))
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Handle to a logical tile entry. `EntryId::NONE` means "no tile".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u32);

impl EntryId {
    pub const NONE: EntryId = EntryId(0);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// `Some(self)` unless this is the sentinel.
    pub fn some(self) -> Option<EntryId> {
        (!self.is_none()).then_some(self)
    }
}

/// A logical family of tiles, indexed by variant offset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEntry {
    pub name: String,
    pub category: String,
    /// Tile per variant offset; `None` where the style has no art.
    pub tiles: Vec<Option<TileRef>>,
}

impl TileEntry {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            tiles: Vec::new(),
        }
    }

    /// Builder: set the tile for `offset`, growing the table as needed.
    pub fn with_tile(mut self, offset: usize, tile: TileRef) -> Self {
        if self.tiles.len() <= offset {
            self.tiles.resize(offset + 1, None);
        }
        self.tiles[offset] = Some(tile);
        self
    }

    /// Builder: assign consecutive indices of one tileset to offsets 0..count.
    pub fn with_run(mut self, tileset: &str, first_index: u32, count: usize) -> Self {
        for offset in 0..count {
            self = self.with_tile(offset, TileRef::new(tileset, first_index + offset as u32));
        }
        self
    }

    pub fn tile(&self, offset: usize) -> Option<&TileRef> {
        self.tiles.get(offset).and_then(Option::as_ref)
    }
}

/// Resolves `(entry, offset)` to a concrete tile.
pub trait TileEntryResolver: Sync {
    fn resolve(&self, entry: EntryId, offset: usize) -> Option<&TileRef>;
}

/// A list of entries addressed by `EntryId`. Id `n` is `entries[n - 1]`, so
/// the sentinel never aliases a real entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCatalog {
    pub entries: Vec<TileEntry>,
}

impl TileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: TileEntry) -> EntryId {
        self.entries.push(entry);
        EntryId(self.entries.len() as u32)
    }

    pub fn get(&self, id: EntryId) -> Option<&TileEntry> {
        if id.is_none() {
            return None;
        }
        self.entries.get(id.0 as usize - 1)
    }

    /// Look an entry up by name (first match).
    pub fn find(&self, name: &str) -> Option<EntryId> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .map(|i| EntryId(i as u32 + 1))
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl TileEntryResolver for TileCatalog {
    fn resolve(&self, entry: EntryId, offset: usize) -> Option<&TileRef> {
        self.get(entry).and_then(|e| e.tile(offset))
    }
}

// ---------------------------------------------------------------------------
// Variant offsets
// ---------------------------------------------------------------------------

macro_rules! tile_variants {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in offset order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn offset(self) -> usize {
                self as usize
            }

            pub fn from_offset(offset: usize) -> Option<Self> {
                Self::ALL.get(offset).copied()
            }
        }
    };
}

tile_variants!(
    /// Wall entries. Trim entries share this layout.
    WallTile {
        West,
        North,
        NorthWest,
        SouthEast,
        WestWindow,
        NorthWindow,
        WestDoor,
        NorthDoor,
    }
);

impl WallTile {
    pub const fn plain(facing: Facing) -> Self {
        match facing {
            Facing::West => WallTile::West,
            Facing::North => WallTile::North,
        }
    }

    pub const fn door(facing: Facing) -> Self {
        match facing {
            Facing::West => WallTile::WestDoor,
            Facing::North => WallTile::NorthDoor,
        }
    }

    pub const fn window(facing: Facing) -> Self {
        match facing {
            Facing::West => WallTile::WestWindow,
            Facing::North => WallTile::NorthWindow,
        }
    }

    pub const fn is_plain(self) -> bool {
        matches!(self, WallTile::West | WallTile::North)
    }

    /// Door-cut or window-cut art.
    pub const fn is_opening(self) -> bool {
        matches!(
            self,
            WallTile::WestWindow | WallTile::NorthWindow | WallTile::WestDoor | WallTile::NorthDoor
        )
    }
}

tile_variants!(
    /// Wall grime entries.
    GrimeWallTile {
        West,
        North,
        NorthWest,
        SouthEast,
        WestWindow,
        NorthWindow,
        WestDoor,
        NorthDoor,
        WestTrim,
        NorthTrim,
        NorthWestTrim,
        SouthEastTrim,
        WestDoubleLeft,
        WestDoubleRight,
        NorthDoubleLeft,
        NorthDoubleRight,
    }
);

tile_variants!(
    /// Floor grime entries.
    GrimeFloorTile {
        West,
        North,
        East,
        South,
        NorthWest,
        SouthEast,
    }
);

tile_variants!(
    /// Door entries.
    DoorTile { West, North }
);

tile_variants!(
    /// Door frame entries.
    FrameTile { West, North }
);

tile_variants!(
    /// Window entries.
    WindowTile { West, North }
);

tile_variants!(
    /// Curtain entries carry distinct art for all four sides.
    CurtainsTile { West, North, East, South }
);

tile_variants!(
    /// Shutter entries: two leaves for each wall orientation.
    ShuttersTile {
        WestAbove,
        WestBelow,
        NorthLeft,
        NorthRight,
    }
);

tile_variants!(
    /// Stair entries: three visible steps per orientation.
    StairsTile {
        West1,
        West2,
        West3,
        North1,
        North2,
        North3,
    }
);

tile_variants!(
    /// Room floor entries.
    FloorTile { Floor }
);

macro_rules! facing_variant {
    ($ty:ident, $facing:expr) => {
        match $facing {
            Facing::West => $ty::West,
            Facing::North => $ty::North,
        }
    };
}

impl DoorTile {
    pub const fn for_facing(facing: Facing) -> Self {
        facing_variant!(DoorTile, facing)
    }
}

impl FrameTile {
    pub const fn for_facing(facing: Facing) -> Self {
        facing_variant!(FrameTile, facing)
    }
}

impl WindowTile {
    pub const fn for_facing(facing: Facing) -> Self {
        facing_variant!(WindowTile, facing)
    }
}

impl CurtainsTile {
    /// Curtain art for the side of the cell the curtain hangs on.
    pub const fn for_edge(edge: Edge) -> Self {
        match edge {
            Edge::W => CurtainsTile::West,
            Edge::N => CurtainsTile::North,
            Edge::E => CurtainsTile::East,
            Edge::S => CurtainsTile::South,
        }
    }
}

impl StairsTile {
    /// Step `step` (0..3) of the west- or north-running art.
    pub fn step(facing: Facing, step: usize) -> Self {
        let base = match facing {
            Facing::West => 0,
            Facing::North => 3,
        };
        Self::ALL[base + step.min(2)]
    }
}

// ---------------------------------------------------------------------------
// Roof variants
// ---------------------------------------------------------------------------

/// One row of a roof slope band: the full rows at heights 0..3 and the half
/// rows that end a band whose depth has an odd half step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoofRow {
    /// Height of the row's lower edge in whole levels (0, 1 or 2).
    pub level: u8,
    pub half: bool,
}

impl RoofRow {
    const fn index(self) -> usize {
        let level = if self.level > 2 { 2 } else { self.level as usize };
        if self.half { 3 + level } else { level }
    }
}

const fn eave_index(eave: Edge) -> usize {
    match eave {
        Edge::W => 0,
        Edge::N => 1,
        Edge::E => 2,
        Edge::S => 3,
    }
}

tile_variants!(
    /// Roof slope entries: six rows per eave direction, then corners.
    RoofSlopeTile {
        SlopeW1,
        SlopeW2,
        SlopeW3,
        SlopeWPt5,
        SlopeWOnePt5,
        SlopeWTwoPt5,
        SlopeN1,
        SlopeN2,
        SlopeN3,
        SlopeNPt5,
        SlopeNOnePt5,
        SlopeNTwoPt5,
        SlopeE1,
        SlopeE2,
        SlopeE3,
        SlopeEPt5,
        SlopeEOnePt5,
        SlopeETwoPt5,
        SlopeS1,
        SlopeS2,
        SlopeS3,
        SlopeSPt5,
        SlopeSOnePt5,
        SlopeSTwoPt5,
        Inner1,
        Inner2,
        Inner3,
        Outer1,
        Outer2,
        Outer3,
    }
);

impl RoofSlopeTile {
    /// Slope art for a band whose eave is on `eave`.
    pub fn slope(eave: Edge, row: RoofRow) -> Self {
        Self::ALL[eave_index(eave) * 6 + row.index()]
    }

    pub fn inner(level: u8) -> Self {
        Self::ALL[24 + level.min(2) as usize]
    }

    pub fn outer(level: u8) -> Self {
        Self::ALL[27 + level.min(2) as usize]
    }
}

tile_variants!(
    /// Roof cap entries: gable caps per slope direction, then flat-top edges.
    RoofCapTile {
        CapW1,
        CapW2,
        CapW3,
        CapWPt5,
        CapWOnePt5,
        CapWTwoPt5,
        CapN1,
        CapN2,
        CapN3,
        CapNPt5,
        CapNOnePt5,
        CapNTwoPt5,
        CapE1,
        CapE2,
        CapE3,
        CapEPt5,
        CapEOnePt5,
        CapETwoPt5,
        CapS1,
        CapS2,
        CapS3,
        CapSPt5,
        CapSOnePt5,
        CapSTwoPt5,
        FlatW,
        FlatN,
    }
);

impl RoofCapTile {
    /// Gable cap for the band row of a roof whose eave is on `eave`.
    pub fn gable(eave: Edge, row: RoofRow) -> Self {
        Self::ALL[eave_index(eave) * 6 + row.index()]
    }

    /// Cap along a flat top's edge.
    pub const fn flat(vertical: bool) -> Self {
        if vertical {
            RoofCapTile::FlatW
        } else {
            RoofCapTile::FlatN
        }
    }
}

tile_variants!(
    /// Flat roof top entries by orientation and height.
    RoofTopTile {
        West1,
        West2,
        West3,
        North1,
        North2,
        North3,
    }
);

impl RoofTopTile {
    /// `level` is clamped to 1..=3.
    pub fn new(facing: Facing, level: u8) -> Self {
        let base = match facing {
            Facing::West => 0,
            Facing::North => 3,
        };
        Self::ALL[base + level.clamp(1, 3) as usize - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_ref_parses_tileset_with_underscores() {
        let t: TileRef = "walls_exterior_house_01_17".parse().unwrap();
        assert_eq!(t, TileRef::new("walls_exterior_house_01", 17));
        assert_eq!(t.to_string(), "walls_exterior_house_01_17");
        assert!("nounderscore".parse::<TileRef>().is_err());
        assert!("walls_x".parse::<TileRef>().is_err());
    }

    #[test]
    fn none_entry_never_resolves() {
        let mut catalog = TileCatalog::new();
        let id = catalog.add(TileEntry::new("w", "Walls").with_run("walls", 0, 8));
        assert!(!id.is_none());
        assert_eq!(catalog.resolve(EntryId::NONE, 0), None);
        assert_eq!(catalog.resolve(EntryId(99), 0), None);
        assert_eq!(catalog.resolve(id, 8), None);
        assert_eq!(
            catalog.resolve(id, WallTile::NorthWest.offset()),
            Some(&TileRef::new("walls", 2))
        );
        assert_eq!(catalog.find("w"), Some(id));
    }

    #[test]
    fn variant_offsets_follow_declaration_order() {
        assert_eq!(WallTile::NorthDoor.offset(), 7);
        assert_eq!(GrimeWallTile::NorthDoubleRight.offset(), 15);
        assert_eq!(WallTile::from_offset(2), Some(WallTile::NorthWest));
        assert_eq!(WallTile::from_offset(8), None);
    }

    #[test]
    fn roof_slope_rows_map_per_eave() {
        let full = |level| RoofRow { level, half: false };
        let half = |level| RoofRow { level, half: true };
        assert_eq!(RoofSlopeTile::slope(Edge::S, full(0)), RoofSlopeTile::SlopeS1);
        assert_eq!(RoofSlopeTile::slope(Edge::S, full(2)), RoofSlopeTile::SlopeS3);
        assert_eq!(RoofSlopeTile::slope(Edge::W, half(1)), RoofSlopeTile::SlopeWOnePt5);
        assert_eq!(RoofSlopeTile::slope(Edge::E, half(0)), RoofSlopeTile::SlopeEPt5);
        assert_eq!(RoofSlopeTile::outer(5), RoofSlopeTile::Outer3);
        assert_eq!(RoofCapTile::gable(Edge::N, full(1)), RoofCapTile::CapN2);
    }

    #[test]
    fn roof_top_level_is_clamped() {
        assert_eq!(RoofTopTile::new(Facing::North, 0), RoofTopTile::North1);
        assert_eq!(RoofTopTile::new(Facing::West, 9), RoofTopTile::West3);
    }
}
