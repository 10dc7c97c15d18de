// Building and floor model consumed by the compositor.
//
// A `Building` owns its rooms, its building-wide tile entries and an ordered
// list of floors. A `Floor` owns a width x height grid of room references
// (`None` = no room, i.e. outdoors), its placed objects and one
// `UserTileGrid` per named override layer. Floors reference rooms by
// `RoomId` (index into `Building::rooms`) and never own them.
//
// The model is editor-owned state. The compositor only reads it; nothing in
// `compositor.rs` takes `&mut Floor`.
//
// See also: `object.rs` for `BuildingObject`, `user_tiles.rs` for the override
// grids, `compositor.rs` for the consumer.
//
// **Determinism.** User layers are kept in a `BTreeMap` so iteration order is
// stable across runs.

use crate::geometry::Rect;
use crate::object::{BuildingObject, ObjectKind};
use crate::tiles::EntryId;
use crate::types::RoomId;
use crate::user_tiles::UserTileGrid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Rooms and building-wide tiles
// ---------------------------------------------------------------------------

/// A room and the tile entries its cells draw with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    /// Treat the room's cells as outdoors (porches, yards).
    #[serde(default)]
    pub exterior: bool,
    #[serde(default)]
    pub interior_wall: EntryId,
    #[serde(default)]
    pub interior_wall_trim: EntryId,
    #[serde(default)]
    pub floor: EntryId,
    #[serde(default)]
    pub grime_floor: EntryId,
    #[serde(default)]
    pub grime_wall: EntryId,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Entries shared by the whole building.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTiles {
    #[serde(default)]
    pub exterior_wall: EntryId,
    /// Only drawn on the ground floor.
    #[serde(default)]
    pub exterior_wall_trim: EntryId,
    /// Exterior wall grime; ground floor only.
    #[serde(default)]
    pub grime_wall: EntryId,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub tiles: BuildingTiles,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub floors: Vec<Floor>,
}

impl Building {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn add_room(&mut self, room: Room) -> RoomId {
        self.rooms.push(room);
        RoomId(self.rooms.len() as u32 - 1)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0 as usize)
    }

    /// Append an empty floor sized to the building and return it.
    pub fn add_floor(&mut self) -> &mut Floor {
        let level = self.floors.iter().map(|f| f.level + 1).max().unwrap_or(0);
        self.floors.push(Floor::new(level, self.width, self.height));
        let last = self.floors.len() - 1;
        &mut self.floors[last]
    }

    pub fn floor(&self, level: i32) -> Option<&Floor> {
        self.floors.iter().find(|f| f.level == level)
    }

    pub fn floor_mut(&mut self, level: i32) -> Option<&mut Floor> {
        self.floors.iter_mut().find(|f| f.level == level)
    }

    /// Floors in increasing level order.
    pub fn floors_by_level(&self) -> Vec<&Floor> {
        let mut floors: Vec<&Floor> = self.floors.iter().collect();
        floors.sort_by_key(|f| f.level);
        floors
    }

    /// Check model consistency: floor sizes match the building, room
    /// references exist and levels are unique.
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= 0 || self.height <= 0 {
            return Err(format!(
                "building size {}x{} is not positive",
                self.width, self.height
            ));
        }
        let mut levels = std::collections::BTreeSet::new();
        for floor in &self.floors {
            if !levels.insert(floor.level) {
                return Err(format!("duplicate floor level {}", floor.level));
            }
            if floor.width != self.width || floor.height != self.height {
                return Err(format!(
                    "floor {} is {}x{}, building is {}x{}",
                    floor.level, floor.width, floor.height, self.width, self.height
                ));
            }
            if floor.rooms.len() != (floor.width * floor.height) as usize {
                return Err(format!(
                    "floor {} room grid has {} cells, expected {}",
                    floor.level,
                    floor.rooms.len(),
                    floor.width * floor.height
                ));
            }
            if let Some(bad) = floor
                .rooms
                .iter()
                .flatten()
                .find(|id| self.room(**id).is_none())
            {
                return Err(format!(
                    "floor {} references missing room {}",
                    floor.level, bad.0
                ));
            }
            for (name, grid) in &floor.user_tiles {
                if grid.width() != floor.width || grid.height() != floor.height {
                    return Err(format!(
                        "floor {} layer '{name}' is {}x{}",
                        floor.level,
                        grid.width(),
                        grid.height()
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Floor
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub level: i32,
    pub width: i32,
    pub height: i32,
    /// Row-major room grid, `width * height` long.
    pub rooms: Vec<Option<RoomId>>,
    #[serde(default)]
    pub objects: Vec<BuildingObject>,
    #[serde(default)]
    pub user_tiles: BTreeMap<String, UserTileGrid>,
}

impl Floor {
    pub fn new(level: i32, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            level,
            width,
            height,
            rooms: vec![None; (width * height) as usize],
            objects: Vec::new(),
            user_tiles: BTreeMap::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height)
            .then(|| (x + y * self.width) as usize)
    }

    /// Room owning the cell; `None` outdoors or out of range.
    pub fn room_at(&self, x: i32, y: i32) -> Option<RoomId> {
        self.index(x, y).and_then(|i| self.rooms.get(i).copied().flatten())
    }

    /// Out-of-range writes are ignored.
    pub fn set_room_at(&mut self, x: i32, y: i32, room: Option<RoomId>) {
        if let Some(i) = self.index(x, y) {
            self.rooms[i] = room;
        }
    }

    /// Assign every cell of `rect` (clipped) to `room`.
    pub fn fill_rect(&mut self, rect: Rect, room: Option<RoomId>) {
        for p in rect.intersected(&self.bounds()).points() {
            self.set_room_at(p.x, p.y, room);
        }
    }

    pub fn user_grid(&self, layer: &str) -> Option<&UserTileGrid> {
        self.user_tiles.get(layer)
    }

    /// The named layer, created empty at floor size if missing.
    pub fn user_grid_mut(&mut self, layer: &str) -> &mut UserTileGrid {
        let (w, h) = (self.width, self.height);
        self.user_tiles
            .entry(layer.to_string())
            .or_insert_with(|| UserTileGrid::new(w, h))
    }

    pub fn add_object(&mut self, object: BuildingObject) {
        self.objects.push(object);
    }

    pub fn stairs(&self) -> impl Iterator<Item = &BuildingObject> + '_ {
        self.objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Stairs { .. }))
    }

    /// Quarter turn clockwise: rooms, objects and user layers.
    pub fn rotate_right(&mut self) {
        let (w, h) = (self.width, self.height);
        let mut rooms = vec![None; self.rooms.len()];
        for y in 0..h {
            for x in 0..w {
                let to = ((h - 1 - y) + x * h) as usize;
                rooms[to] = self.room_at(x, y);
            }
        }
        for object in &mut self.objects {
            object.rotate_right(h);
        }
        for grid in self.user_tiles.values_mut() {
            let mut rotated = UserTileGrid::new(h, w);
            for (p, tile) in grid.iter_occupied() {
                let mut tile = tile.clone();
                tile.rotation = tile.rotation.then(crate::types::Rotation::R90);
                rotated.set_at(h - 1 - p.y, p.x, Some(tile));
            }
            *grid = rotated;
        }
        self.rooms = rooms;
        self.width = h;
        self.height = w;
    }

    /// Mirror west to east: rooms, objects and user layers.
    pub fn flip_horizontal(&mut self) {
        let w = self.width;
        for row in self.rooms.chunks_mut(w.max(1) as usize) {
            row.reverse();
        }
        for object in &mut self.objects {
            object.flip_horizontal(w);
        }
        for grid in self.user_tiles.values_mut() {
            let mut flipped = UserTileGrid::new(grid.width(), grid.height());
            for (p, tile) in grid.iter_occupied() {
                flipped.set_at(w - 1 - p.x, p.y, Some(tile.clone()));
            }
            *grid = flipped;
        }
    }
}
