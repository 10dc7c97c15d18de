// Shared fixtures for the compositor integration tests.
//
// Provides a tile catalog whose entries cover every variant layout the
// compositor writes, a property database that classifies the wall tilesets
// the way a real tileset's metadata does, and a small building builder. The
// entry ids are fixed so tests can assert on them directly.
//
// See also: `tests/` for the scenarios.

use building_compositor::ComposedFloor;
use building_compositor::cell::Slot;
use building_compositor::compose_building;
use building_compositor::config::CompositorConfig;
use building_compositor::geometry::Rect;
use building_compositor::model::{Building, Room};
use building_compositor::properties::{TileProperties, TilePropertyDb};
use building_compositor::tiles::{
    CurtainsTile, DoorTile, EntryId, FloorTile, FrameTile, GrimeFloorTile, GrimeWallTile,
    RoofCapTile, RoofSlopeTile, RoofTopTile, ShuttersTile, StairsTile, TileCatalog, TileEntry,
    TileRef, WallTile, WindowTile,
};
use building_compositor::types::{RoomId, Rotation};

pub const EXTERIOR_WALL: EntryId = EntryId(1);
pub const EXTERIOR_TRIM: EntryId = EntryId(2);
pub const INTERIOR_WALL: EntryId = EntryId(3);
pub const INTERIOR_TRIM: EntryId = EntryId(4);
pub const FLOOR: EntryId = EntryId(5);
pub const DOOR: EntryId = EntryId(6);
pub const FRAME: EntryId = EntryId(7);
pub const WINDOW: EntryId = EntryId(8);
pub const CURTAINS: EntryId = EntryId(9);
pub const SHUTTERS: EntryId = EntryId(10);
pub const STAIRS: EntryId = EntryId(11);
pub const ROOF_CAP: EntryId = EntryId(12);
pub const ROOF_SLOPE: EntryId = EntryId(13);
pub const ROOF_TOP: EntryId = EntryId(14);
pub const GRIME_WALL: EntryId = EntryId(15);
pub const GRIME_FLOOR: EntryId = EntryId(16);

pub const EXTERIOR_TILESET: &str = "walls_exterior";
pub const INTERIOR_TILESET: &str = "walls_interior";

/// Catalog with one entry per constant above, in id order.
pub fn catalog() -> TileCatalog {
    let runs: [(&str, &str, usize); 16] = [
        ("exterior", EXTERIOR_TILESET, WallTile::ALL.len()),
        ("exterior trim", "trim_exterior", WallTile::ALL.len()),
        ("interior", INTERIOR_TILESET, WallTile::ALL.len()),
        ("interior trim", "trim_interior", WallTile::ALL.len()),
        ("floor", "floors", FloorTile::ALL.len()),
        ("door", "doors", DoorTile::ALL.len()),
        ("frame", "frames", FrameTile::ALL.len()),
        ("window", "windows", WindowTile::ALL.len()),
        ("curtains", "curtains", CurtainsTile::ALL.len()),
        ("shutters", "shutters", ShuttersTile::ALL.len()),
        ("stairs", "stairs", StairsTile::ALL.len()),
        ("roof cap", "roof_caps", RoofCapTile::ALL.len()),
        ("roof slope", "roof_slopes", RoofSlopeTile::ALL.len()),
        ("roof top", "roof_tops", RoofTopTile::ALL.len()),
        ("wall grime", "grime_walls", GrimeWallTile::ALL.len()),
        ("floor grime", "grime_floors", GrimeFloorTile::ALL.len()),
    ];
    let mut catalog = TileCatalog::new();
    for (name, tileset, count) in runs {
        catalog.add(TileEntry::new(name, "Fixtures").with_run(tileset, 0, count));
    }
    catalog
}

/// Property flags a tileset's metadata gives each wall variant.
pub fn wall_properties(tile: WallTile) -> TileProperties {
    let flag = match tile {
        WallTile::West => "WallW",
        WallTile::North => "WallN",
        WallTile::NorthWest => "WallNW",
        WallTile::SouthEast => "WallSE",
        WallTile::WestWindow => "WindowW",
        WallTile::NorthWindow => "WindowN",
        WallTile::WestDoor => "DoorWallW",
        WallTile::NorthDoor => "DoorWallN",
    };
    TileProperties::new().with_flag(flag)
}

/// Classifies both wall tilesets. Trim tilesets stay unclassified.
pub fn properties() -> TilePropertyDb {
    let mut db = TilePropertyDb::new();
    for tileset in [EXTERIOR_TILESET, INTERIOR_TILESET] {
        for &tile in WallTile::ALL {
            db.insert(
                &TileRef::new(tileset, tile.offset() as u32),
                wall_properties(tile),
            );
        }
    }
    db
}

/// A `width` x `height` building with one empty ground floor and the
/// fixture's exterior tiles.
pub fn building(width: i32, height: i32) -> Building {
    let mut b = Building::new(width, height);
    b.tiles.exterior_wall = EXTERIOR_WALL;
    b.tiles.exterior_wall_trim = EXTERIOR_TRIM;
    b.tiles.grime_wall = GRIME_WALL;
    b.add_floor();
    b
}

/// A room using every fixture interior entry.
pub fn room(name: &str) -> Room {
    Room {
        interior_wall: INTERIOR_WALL,
        interior_wall_trim: INTERIOR_TRIM,
        floor: FLOOR,
        grime_floor: GRIME_FLOOR,
        grime_wall: GRIME_WALL,
        ..Room::new(name)
    }
}

/// Building with a single room covering `rect` of the ground floor.
pub fn single_room(width: i32, height: i32, rect: Rect) -> (Building, RoomId) {
    let mut b = building(width, height);
    let id = b.add_room(room("room"));
    b.floors[0].fill_rect(rect, Some(id));
    (b, id)
}

pub fn compose(b: &Building) -> Vec<ComposedFloor> {
    compose_with(b, &CompositorConfig::sequential())
}

pub fn compose_with(b: &Building, config: &CompositorConfig) -> Vec<ComposedFloor> {
    compose_building(b, &catalog(), &properties(), config)
}

pub fn wall(entry: EntryId, tile: WallTile, rotation: Rotation) -> Slot {
    Slot::entry(entry, tile.offset(), rotation)
}
