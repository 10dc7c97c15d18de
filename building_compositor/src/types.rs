// Core types shared across the compositor.
//
// Defines object facings (`Direction`), the four edge records of a composited
// cell (`Edge`), clockwise quarter-turn rotation tags (`Rotation`), the two
// families of directional art (`Facing`), and the room identifier.
//
// ## Edge art convention
//
// Tilesets only ship west- and north-facing art for walls, trims, grime,
// frames, doors and windows. East and south edges reuse that art with a
// rotation tag the renderer applies:
//
//   N -> (North, R0)   W -> (West, R0)   E -> (North, R90)   S -> (West, R180)
//
// `Edge::art()` is the single source of this table and `Edge::from_art()` is
// its inverse, used to classify a rotated user-painted tile back to an edge.
//
// See also: `geometry.rs` for points/rects/regions, `cell.rs` for the edge
// records these indices address, `grime.rs` for the inverse-table lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Directions and edges
// ---------------------------------------------------------------------------

/// Facing of a placed object. `Invalid` marks omnidirectional objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    S,
    E,
    W,
    #[default]
    Invalid,
}

impl Direction {
    /// The edge record an object with this facing claims on its own cell.
    pub fn edge(self) -> Option<Edge> {
        match self {
            Direction::N => Some(Edge::N),
            Direction::S => Some(Edge::S),
            Direction::E => Some(Edge::E),
            Direction::W => Some(Edge::W),
            Direction::Invalid => None,
        }
    }

    /// Quarter turn clockwise.
    pub fn rotated_right(self) -> Self {
        match self {
            Direction::N => Direction::E,
            Direction::E => Direction::S,
            Direction::S => Direction::W,
            Direction::W => Direction::N,
            Direction::Invalid => Direction::Invalid,
        }
    }

    /// Mirror across the vertical axis (west <-> east).
    pub fn flipped_horizontal(self) -> Self {
        match self {
            Direction::E => Direction::W,
            Direction::W => Direction::E,
            other => other,
        }
    }
}

/// One of the four edge records of a composited cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Edge {
    N,
    W,
    E,
    S,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::N, Edge::W, Edge::E, Edge::S];

    /// Index into edge arrays and edge-ordered section quads.
    pub const fn index(self) -> usize {
        match self {
            Edge::N => 0,
            Edge::W => 1,
            Edge::E => 2,
            Edge::S => 3,
        }
    }

    /// The edge on the other side of the cell.
    pub const fn opposite(self) -> Edge {
        match self {
            Edge::N => Edge::S,
            Edge::S => Edge::N,
            Edge::W => Edge::E,
            Edge::E => Edge::W,
        }
    }

    /// Offset to the neighbour that shares this edge's boundary.
    pub const fn neighbor_offset(self) -> (i32, i32) {
        match self {
            Edge::N => (0, -1),
            Edge::S => (0, 1),
            Edge::W => (-1, 0),
            Edge::E => (1, 0),
        }
    }

    /// Whether this edge's boundary runs north-south.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Edge::W | Edge::E)
    }

    /// Art family and rotation tag used to draw directional art on this edge.
    pub const fn art(self) -> (Facing, Rotation) {
        match self {
            Edge::N => (Facing::North, Rotation::R0),
            Edge::W => (Facing::West, Rotation::R0),
            Edge::E => (Facing::North, Rotation::R90),
            Edge::S => (Facing::West, Rotation::R180),
        }
    }

    /// Inverse of `art()`. Combinations outside the table map to no edge.
    pub fn from_art(facing: Facing, rotation: Rotation) -> Option<Edge> {
        Edge::ALL.into_iter().find(|e| e.art() == (facing, rotation))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Edge::N => "N",
            Edge::W => "W",
            Edge::E => "E",
            Edge::S => "S",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Art families and rotation
// ---------------------------------------------------------------------------

/// Which directional art family an entry variant belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    West,
    North,
}

/// Clockwise quarter-turn rotation tag carried by a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::R0,
            1 => Rotation::R90,
            2 => Rotation::R180,
            _ => Rotation::R270,
        }
    }

    /// Compose two rotations.
    pub const fn then(self, other: Rotation) -> Self {
        Rotation::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Index of a room in `Building::rooms`. Floors reference rooms, never own them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u32);

/// Index of an object in its floor's object list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectIndex(pub u32);
