// Objects placed on a floor: doors, windows, stairs, wall segments,
// furniture and roofs.
//
// `BuildingObject` carries what every object has (anchor position and
// facing) and a closed `ObjectKind` sum type for what differs. There is no
// trait object hierarchy: the set of kinds is fixed, and the compositor
// dispatches on it with `match`.
//
// ## Anchors and footprints
//
// - Door / Window: one cell; the facing names the edge record they claim.
// - Stairs: five cells along the facing axis (x for W/E, y for N/S)
//   starting at the anchor. Only cells 1..=3 carry step art.
// - Wall: `length` cells from the anchor, running along y for W/E walls and
//   along x for N/S walls.
// - Furniture: the furniture tile's width x height.
// - Roof: width x height, omnidirectional (`Direction::Invalid`).
//
// `rotate_right()` and `flip_horizontal()` transform an object the way the
// editor's whole-floor rotate/flip does: the new anchor is the top-left of
// the transformed footprint and edge facings turn with it.
//
// See also: `model.rs` (floors own objects), `roof.rs` (roof decomposition),
// `compositor.rs` (the phases that consume each kind).

use crate::geometry::{Point, Rect};
use crate::tiles::{EntryId, TileRef};
use crate::types::Direction;
use serde::{Deserialize, Serialize};

/// Cells spanned by a stair object along its axis.
pub const STAIRS_LENGTH: i32 = 5;

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// An object placed on a floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingObject {
    pub pos: Point,
    pub dir: Direction,
    pub kind: ObjectKind,
}

/// What an object is, with the tile entries it draws with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Door {
        door: EntryId,
        frame: EntryId,
    },
    Window {
        window: EntryId,
        curtains: EntryId,
        shutters: EntryId,
    },
    Stairs {
        stairs: EntryId,
    },
    Wall {
        exterior: EntryId,
        interior: EntryId,
        exterior_trim: EntryId,
        interior_trim: EntryId,
        length: i32,
    },
    Furniture {
        tile: FurnitureTile,
    },
    Roof(RoofObject),
}

impl BuildingObject {
    pub fn new(pos: Point, dir: Direction, kind: ObjectKind) -> Self {
        Self { pos, dir, kind }
    }

    pub fn door(pos: Point, dir: Direction, door: EntryId, frame: EntryId) -> Self {
        Self::new(pos, dir, ObjectKind::Door { door, frame })
    }

    pub fn window(
        pos: Point,
        dir: Direction,
        window: EntryId,
        curtains: EntryId,
        shutters: EntryId,
    ) -> Self {
        Self::new(
            pos,
            dir,
            ObjectKind::Window {
                window,
                curtains,
                shutters,
            },
        )
    }

    pub fn stairs(pos: Point, dir: Direction, stairs: EntryId) -> Self {
        Self::new(pos, dir, ObjectKind::Stairs { stairs })
    }

    pub fn furniture(pos: Point, tile: FurnitureTile) -> Self {
        let dir = tile.orient.direction();
        Self::new(pos, dir, ObjectKind::Furniture { tile })
    }

    pub fn roof(pos: Point, roof: RoofObject) -> Self {
        Self::new(pos, Direction::Invalid, ObjectKind::Roof(roof))
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn is_w(&self) -> bool {
        self.dir == Direction::W
    }

    pub fn is_n(&self) -> bool {
        self.dir == Direction::N
    }

    pub fn is_e(&self) -> bool {
        self.dir == Direction::E
    }

    pub fn is_s(&self) -> bool {
        self.dir == Direction::S
    }

    /// Whether the object runs along the y axis (W/E facing).
    fn runs_vertically(&self) -> bool {
        matches!(self.dir, Direction::W | Direction::E)
    }

    /// Cells covered by the object.
    pub fn bounds(&self) -> Rect {
        let Point { x, y } = self.pos;
        match &self.kind {
            ObjectKind::Door { .. } | ObjectKind::Window { .. } => Rect::new(x, y, 1, 1),
            ObjectKind::Stairs { .. } => {
                if self.runs_vertically() {
                    Rect::new(x, y, STAIRS_LENGTH, 1)
                } else {
                    Rect::new(x, y, 1, STAIRS_LENGTH)
                }
            }
            ObjectKind::Wall { length, .. } => {
                if self.runs_vertically() {
                    Rect::new(x, y, 1, *length)
                } else {
                    Rect::new(x, y, *length, 1)
                }
            }
            ObjectKind::Furniture { tile } => Rect::new(x, y, tile.width, tile.height),
            ObjectKind::Roof(roof) => Rect::new(x, y, roof.width, roof.height),
        }
    }

    /// Every tile entry the object references, `NONE`s included.
    pub fn entries(&self) -> Vec<EntryId> {
        match &self.kind {
            ObjectKind::Door { door, frame } => vec![*door, *frame],
            ObjectKind::Window {
                window,
                curtains,
                shutters,
            } => vec![*window, *curtains, *shutters],
            ObjectKind::Stairs { stairs } => vec![*stairs],
            ObjectKind::Wall {
                exterior,
                interior,
                exterior_trim,
                interior_trim,
                ..
            } => vec![*exterior, *interior, *exterior_trim, *interior_trim],
            ObjectKind::Furniture { .. } => Vec::new(),
            ObjectKind::Roof(roof) => vec![roof.cap_tiles, roof.slope_tiles, roof.top_tiles],
        }
    }

    /// Quarter turn clockwise of the whole floor, whose height is
    /// `floor_height` before the turn.
    pub fn rotate_right(&mut self, floor_height: i32) {
        let b = self.bounds();
        self.pos = Point::new(floor_height - b.y - b.height, b.x);
        self.dir = self.dir.rotated_right();
        match &mut self.kind {
            ObjectKind::Furniture { tile } => tile.rotate_right(),
            ObjectKind::Roof(roof) => roof.rotate_right(),
            _ => {}
        }
        if let ObjectKind::Furniture { tile } = &self.kind {
            self.dir = tile.orient.direction();
        }
    }

    /// Mirror the whole floor (of width `floor_width`) west to east.
    pub fn flip_horizontal(&mut self, floor_width: i32) {
        let b = self.bounds();
        self.pos = Point::new(floor_width - b.x - b.width, b.y);
        self.dir = self.dir.flipped_horizontal();
        match &mut self.kind {
            ObjectKind::Furniture { tile } => tile.flip_horizontal(),
            ObjectKind::Roof(roof) => roof.flip_horizontal(),
            _ => {}
        }
        if let ObjectKind::Furniture { tile } = &self.kind {
            self.dir = tile.orient.direction();
        }
    }
}

// ---------------------------------------------------------------------------
// Furniture
// ---------------------------------------------------------------------------

/// The layer a furniture tile draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FurnitureLayer {
    /// Replaces wall art outright.
    Walls,
    RoofCap,
    WallOverlay,
    WallFurniture,
    Frames,
    Doors,
    Furniture,
    Roof,
}

impl FurnitureLayer {
    /// Layers that hang on a wall line and so shift one cell for E/S facings.
    pub const fn is_wall_attached(self) -> bool {
        matches!(
            self,
            FurnitureLayer::RoofCap
                | FurnitureLayer::WallOverlay
                | FurnitureLayer::WallFurniture
                | FurnitureLayer::Frames
                | FurnitureLayer::Doors
        )
    }
}

/// Orientation of a resolved furniture tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FurnitureOrient {
    W,
    N,
    E,
    S,
    SW,
    NW,
    NE,
    SE,
    #[default]
    Unknown,
}

impl FurnitureOrient {
    pub const fn is_w(self) -> bool {
        matches!(self, FurnitureOrient::W)
    }

    pub const fn is_n(self) -> bool {
        matches!(self, FurnitureOrient::N)
    }

    pub const fn is_e(self) -> bool {
        matches!(self, FurnitureOrient::E)
    }

    pub const fn is_s(self) -> bool {
        matches!(self, FurnitureOrient::S)
    }

    /// The object facing implied by a straight orientation.
    pub const fn direction(self) -> Direction {
        match self {
            FurnitureOrient::W => Direction::W,
            FurnitureOrient::N => Direction::N,
            FurnitureOrient::E => Direction::E,
            FurnitureOrient::S => Direction::S,
            _ => Direction::Invalid,
        }
    }

    fn rotated_right(self) -> Self {
        use FurnitureOrient::*;
        match self {
            W => N,
            N => E,
            E => S,
            S => W,
            SW => NW,
            NW => NE,
            NE => SE,
            SE => SW,
            Unknown => Unknown,
        }
    }

    fn flipped_horizontal(self) -> Self {
        use FurnitureOrient::*;
        match self {
            W => E,
            E => W,
            SW => SE,
            SE => SW,
            NW => NE,
            NE => NW,
            other => other,
        }
    }
}

/// A furniture piece resolved to one size and orientation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FurnitureTile {
    pub layer: FurnitureLayer,
    pub orient: FurnitureOrient,
    pub width: i32,
    pub height: i32,
    /// Row-major, `width * height` long.
    pub tiles: Vec<Option<TileRef>>,
}

impl FurnitureTile {
    pub fn new(layer: FurnitureLayer, orient: FurnitureOrient, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            layer,
            orient,
            width,
            height,
            tiles: vec![None; (width * height) as usize],
        }
    }

    /// Builder: set the tile at `(dx, dy)`. Out-of-range is ignored.
    pub fn with_tile(mut self, dx: i32, dy: i32, tile: TileRef) -> Self {
        if let Some(i) = self.index(dx, dy) {
            self.tiles[i] = Some(tile);
        }
        self
    }

    fn index(&self, dx: i32, dy: i32) -> Option<usize> {
        (dx >= 0 && dy >= 0 && dx < self.width && dy < self.height)
            .then(|| (dx + dy * self.width) as usize)
    }

    pub fn tile_at(&self, dx: i32, dy: i32) -> Option<&TileRef> {
        self.index(dx, dy)
            .and_then(|i| self.tiles.get(i))
            .and_then(Option::as_ref)
    }

    /// Occupied footprint cells as `(dx, dy, tile)`, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32, &TileRef)> + '_ {
        (0..self.height).flat_map(move |dy| {
            (0..self.width).filter_map(move |dx| self.tile_at(dx, dy).map(|t| (dx, dy, t)))
        })
    }

    fn rotate_right(&mut self) {
        let (w, h) = (self.width, self.height);
        let mut tiles = vec![None; self.tiles.len()];
        for dy in 0..h {
            for dx in 0..w {
                // (dx, dy) -> (h - 1 - dy, dx) in a grid of width h.
                let to = ((h - 1 - dy) + dx * h) as usize;
                tiles[to] = self.tile_at(dx, dy).cloned();
            }
        }
        self.tiles = tiles;
        self.width = h;
        self.height = w;
        self.orient = self.orient.rotated_right();
    }

    fn flip_horizontal(&mut self) {
        let w = self.width;
        for row in self.tiles.chunks_mut(w.max(1) as usize) {
            row.reverse();
        }
        self.orient = self.orient.flipped_horizontal();
    }
}

// ---------------------------------------------------------------------------
// Roofs
// ---------------------------------------------------------------------------

/// Roof shapes. Slope names give the side the eave is on; corners name the
/// corner where their two eaves meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoofType {
    SlopeW,
    SlopeN,
    SlopeE,
    SlopeS,
    PeakWE,
    PeakNS,
    FlatTop,
    CornerInnerSW,
    CornerInnerNW,
    CornerInnerNE,
    CornerInnerSE,
    CornerOuterSW,
    CornerOuterNW,
    CornerOuterNE,
    CornerOuterSE,
}

impl RoofType {
    fn rotated_right(self) -> Self {
        use RoofType::*;
        match self {
            SlopeW => SlopeN,
            SlopeN => SlopeE,
            SlopeE => SlopeS,
            SlopeS => SlopeW,
            PeakWE => PeakNS,
            PeakNS => PeakWE,
            FlatTop => FlatTop,
            CornerInnerSW => CornerInnerNW,
            CornerInnerNW => CornerInnerNE,
            CornerInnerNE => CornerInnerSE,
            CornerInnerSE => CornerInnerSW,
            CornerOuterSW => CornerOuterNW,
            CornerOuterNW => CornerOuterNE,
            CornerOuterNE => CornerOuterSE,
            CornerOuterSE => CornerOuterSW,
        }
    }

    fn flipped_horizontal(self) -> Self {
        use RoofType::*;
        match self {
            SlopeW => SlopeE,
            SlopeE => SlopeW,
            CornerInnerSW => CornerInnerSE,
            CornerInnerSE => CornerInnerSW,
            CornerInnerNW => CornerInnerNE,
            CornerInnerNE => CornerInnerNW,
            CornerOuterSW => CornerOuterSE,
            CornerOuterSE => CornerOuterSW,
            CornerOuterNW => CornerOuterNE,
            CornerOuterNE => CornerOuterNW,
            other => other,
        }
    }
}

/// Roof height in half levels. `Three` is the maximum: a flat top at that
/// depth is level with the floor above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoofDepth {
    Zero,
    Point5,
    One,
    OnePoint5,
    Two,
    TwoPoint5,
    #[default]
    Three,
}

impl RoofDepth {
    pub const MAX: RoofDepth = RoofDepth::Three;

    pub const fn half_steps(self) -> u8 {
        self as u8
    }

    pub const fn is_max(self) -> bool {
        matches!(self, RoofDepth::Three)
    }

    /// Rows in a slope band: the depth rounded up to whole rows.
    pub const fn band_rows(self) -> i32 {
        (self.half_steps() as i32 + 1) / 2
    }

    /// Whole levels, rounding half steps down.
    pub const fn whole_levels(self) -> u8 {
        self.half_steps() / 2
    }
}

/// A roof placed over a rectangle of cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoofObject {
    pub width: i32,
    pub height: i32,
    pub roof_type: RoofType,
    pub depth: RoofDepth,
    pub capped_w: bool,
    pub capped_n: bool,
    pub capped_e: bool,
    pub capped_s: bool,
    pub cap_tiles: EntryId,
    pub slope_tiles: EntryId,
    pub top_tiles: EntryId,
}

impl RoofObject {
    /// Uncapped roof with no tiles assigned.
    pub fn new(width: i32, height: i32, roof_type: RoofType, depth: RoofDepth) -> Self {
        Self {
            width,
            height,
            roof_type,
            depth,
            capped_w: false,
            capped_n: false,
            capped_e: false,
            capped_s: false,
            cap_tiles: EntryId::NONE,
            slope_tiles: EntryId::NONE,
            top_tiles: EntryId::NONE,
        }
    }

    pub fn with_tiles(mut self, cap: EntryId, slope: EntryId, top: EntryId) -> Self {
        self.cap_tiles = cap;
        self.slope_tiles = slope;
        self.top_tiles = top;
        self
    }

    pub fn with_caps(mut self, w: bool, n: bool, e: bool, s: bool) -> Self {
        self.capped_w = w;
        self.capped_n = n;
        self.capped_e = e;
        self.capped_s = s;
        self
    }

    fn rotate_right(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
        self.roof_type = self.roof_type.rotated_right();
        // Old west becomes north, north becomes east, and so on.
        let (w, n, e, s) = (self.capped_w, self.capped_n, self.capped_e, self.capped_s);
        self.capped_n = w;
        self.capped_e = n;
        self.capped_s = e;
        self.capped_w = s;
    }

    fn flip_horizontal(&mut self) {
        self.roof_type = self.roof_type.flipped_horizontal();
        std::mem::swap(&mut self.capped_w, &mut self.capped_e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stairs_bounds_follow_axis() {
        let n = BuildingObject::stairs(Point::new(2, 1), Direction::N, EntryId(1));
        assert_eq!(n.bounds(), Rect::new(2, 1, 1, 5));
        let w = BuildingObject::stairs(Point::new(2, 1), Direction::W, EntryId(1));
        assert_eq!(w.bounds(), Rect::new(2, 1, 5, 1));
    }

    #[test]
    fn entries_list_every_referenced_tile() {
        let d = BuildingObject::door(Point::new(0, 0), Direction::N, EntryId(4), EntryId::NONE);
        assert_eq!(d.entries(), vec![EntryId(4), EntryId::NONE]);
        let roof = RoofObject::new(2, 2, RoofType::FlatTop, RoofDepth::One)
            .with_tiles(EntryId(1), EntryId(2), EntryId(3));
        let r = BuildingObject::roof(Point::new(0, 0), roof);
        assert_eq!(r.entries(), vec![EntryId(1), EntryId(2), EntryId(3)]);
    }

    #[test]
    fn rotating_a_west_door_makes_it_north() {
        // Door on the W edge of (1, 0) in a floor 4 tall: the boundary
        // between (0,0) and (1,0) becomes the one between (3,0) and (3,1).
        let mut d = BuildingObject::door(Point::new(1, 0), Direction::W, EntryId(1), EntryId(2));
        d.rotate_right(4);
        assert_eq!(d.pos, Point::new(3, 1));
        assert_eq!(d.dir, Direction::N);
    }

    #[test]
    fn four_rotations_restore_object() {
        let roof = RoofObject::new(3, 2, RoofType::CornerOuterSW, RoofDepth::Two)
            .with_caps(true, false, false, true);
        let original = BuildingObject::roof(Point::new(1, 2), roof);
        let mut o = original.clone();
        let (mut w, mut h) = (6, 5);
        for _ in 0..4 {
            o.rotate_right(h);
            std::mem::swap(&mut w, &mut h);
        }
        assert_eq!(o, original);
        let _ = w;
    }

    #[test]
    fn flip_moves_anchor_and_facing() {
        let mut wall = BuildingObject::new(
            Point::new(0, 1),
            Direction::W,
            ObjectKind::Wall {
                exterior: EntryId(1),
                interior: EntryId(2),
                exterior_trim: EntryId::NONE,
                interior_trim: EntryId::NONE,
                length: 3,
            },
        );
        wall.flip_horizontal(5);
        assert_eq!(wall.pos, Point::new(4, 1));
        assert_eq!(wall.dir, Direction::E);
        assert_eq!(wall.bounds(), Rect::new(4, 1, 1, 3));
    }

    #[test]
    fn furniture_rotation_transposes_tiles() {
        let t = |i| TileRef::new("furniture", i);
        let ft = FurnitureTile::new(FurnitureLayer::Furniture, FurnitureOrient::W, 2, 1)
            .with_tile(0, 0, t(0))
            .with_tile(1, 0, t(1));
        let mut obj = BuildingObject::furniture(Point::new(0, 0), ft);
        obj.rotate_right(3);
        let ObjectKind::Furniture { tile } = &obj.kind else {
            panic!("kind changed");
        };
        assert_eq!((tile.width, tile.height), (1, 2));
        assert_eq!(tile.tile_at(0, 0), Some(&t(0)));
        assert_eq!(tile.tile_at(0, 1), Some(&t(1)));
        assert_eq!(obj.dir, Direction::N);
        assert_eq!(obj.pos, Point::new(2, 0));
    }

    #[test]
    fn depth_rows() {
        assert_eq!(RoofDepth::Zero.band_rows(), 0);
        assert_eq!(RoofDepth::Point5.band_rows(), 1);
        assert_eq!(RoofDepth::One.band_rows(), 1);
        assert_eq!(RoofDepth::TwoPoint5.band_rows(), 3);
        assert_eq!(RoofDepth::Three.band_rows(), 3);
        assert!(RoofDepth::MAX.is_max());
        assert_eq!(RoofDepth::OnePoint5.whole_levels(), 1);
    }
}
