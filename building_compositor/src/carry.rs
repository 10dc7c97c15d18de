// State carried from one floor's composition to the next floor up.
//
// Composing floor N returns a `FloorCarry` next to its grid: the stairs
// placed on N (each punches a hole in N+1's floor) and the flat roof tops
// whose depth reaches N+1 (drawn on N+1 instead of N). The next call takes
// it by shared reference and never changes it, so composition of each floor
// is a pure function of (floor, carry from below).
//
// See also: `compositor.rs` phases 9, 10 (producers) and 15 (consumer).

use crate::geometry::{Point, Region};
use crate::tiles::{EntryId, RoofTopTile};
use crate::types::Direction;
use serde::{Deserialize, Serialize};

/// A stair on the floor below. Its three step cells are open on this floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StairwellHole {
    pub pos: Point,
    pub dir: Direction,
}

impl StairwellHole {
    /// The cells carrying step art: offsets 1..=3 from the anchor along the
    /// stair's axis (x for W/E, y for N/S).
    pub fn cells(&self) -> [Point; 3] {
        let (dx, dy) = match self.dir {
            Direction::W | Direction::E => (1, 0),
            _ => (0, 1),
        };
        [1, 2, 3].map(|k| self.pos.offset(dx * k, dy * k))
    }
}

/// A flat roof top drawn on the floor above the roof's own floor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredRoofTop {
    /// Cells of the flat top, in floor coordinates.
    pub region: Region,
    pub entry: EntryId,
    pub variant: RoofTopTile,
}

/// Everything floor N hands to floor N+1.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorCarry {
    /// Level of the floor that produced this carry.
    pub level: i32,
    pub stairs: Vec<StairwellHole>,
    pub flat_roofs: Vec<DeferredRoofTop>,
}

impl FloorCarry {
    pub fn new(level: i32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stairs.is_empty() && self.flat_roofs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn north_stair_holes_run_down_y() {
        let hole = StairwellHole {
            pos: Point::new(4, 2),
            dir: Direction::N,
        };
        assert_eq!(
            hole.cells(),
            [Point::new(4, 3), Point::new(4, 4), Point::new(4, 5)]
        );
    }

    #[test]
    fn west_stair_holes_run_along_x() {
        let hole = StairwellHole {
            pos: Point::new(0, 1),
            dir: Direction::W,
        };
        assert_eq!(hole.cells()[2], Point::new(3, 1));
    }
}
