// Tile-property lookup and wall classification for grime selection.
//
// Tile metadata lives in an external, independently maintained property
// database keyed by tile identity (`tileset`, `index`). The compositor only
// reads it through `TilePropertyLookup`; how the database is loaded or
// refreshed is the collaborator's business. `TilePropertyDb` is the plain
// in-memory implementation used by the CLI and tests.
//
// `WallClass::classify()` turns raw properties into the three facts the grime
// resolver and wall suppression care about:
// - shape: which wall face(s) the art draws (`WallW`, `WallN`, `WallNW`,
//   `WallSE`, plus the door/window flags that imply a face),
// - opening: door-cut (`DoorWallW`/`DoorWallN`) or window-cut
//   (`WindowW`/`WindowN`),
// - style: the `GrimeType` string (`Trim`, `DoubleLeft`, `DoubleRight`).
// A tile with no wall flag at all is unclassified.
//
// See also: `grime.rs` (consumer), `compositor.rs` (wall suppression against
// user-painted walls).

use crate::tiles::TileRef;
use crate::types::{Edge, Facing, Rotation};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// String-keyed properties of one tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileProperties {
    values: FxHashMap<String, String>,
}

impl TileProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    /// Builder for a boolean flag.
    pub fn with_flag(self, key: &str) -> Self {
        self.with(key, "")
    }

    /// True when the key is present and not explicitly `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.values
            .get(key)
            .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read-only access to tile metadata.
pub trait TilePropertyLookup: Sync {
    fn properties(&self, tile: &TileRef) -> Option<&TileProperties>;
}

/// In-memory property database.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TilePropertyDb {
    tilesets: FxHashMap<String, FxHashMap<u32, TileProperties>>,
}

impl TilePropertyDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tile: &TileRef, props: TileProperties) {
        self.tilesets
            .entry(tile.tileset.clone())
            .or_default()
            .insert(tile.index, props);
    }

    pub fn len(&self) -> usize {
        self.tilesets.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl TilePropertyLookup for TilePropertyDb {
    fn properties(&self, tile: &TileRef) -> Option<&TileProperties> {
        self.tilesets.get(&tile.tileset)?.get(&tile.index)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Which wall face(s) a tile's art draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WallShape {
    West,
    North,
    /// Corner piece drawing both the west and north faces.
    NorthWest,
    /// Corner post at the end of a run.
    SouthEast,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WallOpening {
    #[default]
    None,
    Door,
    Window,
}

/// Decorative sub-variant selecting the grime art family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GrimeStyle {
    #[default]
    Plain,
    Trim,
    DoubleLeft,
    DoubleRight,
}

/// Classification of a wall tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WallClass {
    pub shape: WallShape,
    pub opening: WallOpening,
    pub style: GrimeStyle,
}

impl WallClass {
    /// Classify a tile from its properties. `None` when no wall flag is set.
    pub fn classify(props: &TileProperties) -> Option<Self> {
        let door_w = props.flag("DoorWallW");
        let door_n = props.flag("DoorWallN");
        let window_w = props.flag("WindowW");
        let window_n = props.flag("WindowN");

        let shape = if props.flag("WallNW") {
            WallShape::NorthWest
        } else if props.flag("WallSE") {
            WallShape::SouthEast
        } else if props.flag("WallW") || door_w || window_w {
            WallShape::West
        } else if props.flag("WallN") || door_n || window_n {
            WallShape::North
        } else {
            return None;
        };

        let opening = if door_w || door_n {
            WallOpening::Door
        } else if window_w || window_n {
            WallOpening::Window
        } else {
            WallOpening::None
        };

        let style = match props.value("GrimeType") {
            Some("Trim") => GrimeStyle::Trim,
            Some("DoubleLeft") => GrimeStyle::DoubleLeft,
            Some("DoubleRight") => GrimeStyle::DoubleRight,
            _ => GrimeStyle::Plain,
        };

        Some(Self {
            shape,
            opening,
            style,
        })
    }

    /// Look a tile up and classify it.
    pub fn of(lookup: &dyn TilePropertyLookup, tile: &TileRef) -> Option<Self> {
        lookup.properties(tile).and_then(Self::classify)
    }

    /// Edges of a cell this tile draws when painted with `rotation`.
    ///
    /// Straight walls go through the edge art table. The NW corner only
    /// counts unrotated, where it covers N and W. The SE post draws no edge.
    pub fn edges(&self, rotation: Rotation) -> (Option<Edge>, Option<Edge>) {
        match self.shape {
            WallShape::West => (Edge::from_art(Facing::West, rotation), None),
            WallShape::North => (Edge::from_art(Facing::North, rotation), None),
            WallShape::NorthWest if rotation == Rotation::R0 => (Some(Edge::N), Some(Edge::W)),
            WallShape::NorthWest | WallShape::SouthEast => (None, None),
        }
    }
}
