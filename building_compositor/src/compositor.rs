// Layout compiler: one floor of a building into a grid of composited cells.
//
// `compose_floor()` is a pure function of the building, one of its floors,
// the carry from the floor below, the two tile collaborators and the
// config. It allocates a fresh (W+1) x (H+1) grid every call; the extra row
// and column hold walls on the building's south and east border, because a
// wall always lives on the N/W edge of the cell south/east of its boundary.
//
// Phases run strictly in order, and each only reads what earlier phases
// wrote:
//
//  1. initialize the grid
//  2. room classification (room + exterior flag per cell)
//  3. automatic walls on every boundary between differing rooms, minus
//     those a user-painted wall or a wall object already draws
//  4. wall objects overwrite the automatic wall and trim on their edges
//  5. Walls-layer furniture replaces wall art on the edge its orientation
//     implies
//  6. pillars where a wall from above meets a wall from the left at a cell
//     with no wall of its own
//  7. doors and windows claim their edge record (last write wins)
//  8. other furniture is pushed into its layer's slot group
//  9. stairs write three steps and record a stairwell for the floor above
// 10. roofs: slopes, corners, caps, and the flat top (deferred upward at
//     maximum depth)
// 11. wall variants: plain / door-cut / window-cut / pillar, then the
//     north-west merge of matching plain walls
// 12. east and south edges take north/west art with a rotation tag
// 13. legacy slot order swap of the north and west wall slots
// 14. frame, door, window, curtain and shutter art
// 15. floor tiles, stairwell holes and deferred roof tops from below
// 16. grime (see `grime.rs`)
//
// Per-cell phases (2, 3, 6, 11, 16) compute results into a vector in cell
// order and write them back afterwards, which lets them fan out over rayon
// (`CompositorConfig::use_parallel`) without changing the output. The
// north-west merge and the legacy swap run only after all of phase 11's
// per-cell work is collected.
//
// Malformed placements (objects partly or wholly outside the grid) are
// dropped cell by cell with a `trace!`; the compositor never fails.
//
// See also: `cell.rs` for the output record, `roof.rs`, `grime.rs`,
// `carry.rs`, and `model.rs` / `object.rs` for the input model.
//
// **Determinism.** No randomness and no hashing-order dependence: objects
// are visited in list order and cells in row-major order.

use crate::carry::{DeferredRoofTop, FloorCarry, StairwellHole};
use crate::cell::{CompositedCell, Section, Slot, SlotGroup, WallOverride, WallType};
use crate::config::CompositorConfig;
use crate::geometry::Point;
use crate::grime;
use crate::model::{Building, Floor, Room};
use crate::object::{BuildingObject, FurnitureLayer, FurnitureOrient, ObjectKind};
use crate::properties::{TilePropertyLookup, WallClass, WallOpening};
use crate::roof;
use crate::tiles::{
    CurtainsTile, DoorTile, EntryId, FloorTile, FrameTile, ShuttersTile, StairsTile,
    TileEntryResolver, WallTile, WindowTile,
};
use crate::types::{Direction, Edge, Facing, ObjectIndex, RoomId, Rotation};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The composited grid of one floor plus what it hands to the floor above.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComposedFloor {
    pub level: i32,
    /// Grid width: the floor's width plus one.
    pub width: i32,
    /// Grid height: the floor's height plus one.
    pub height: i32,
    /// Row-major, `width * height` long.
    pub cells: Vec<CompositedCell>,
    pub carry: FloorCarry,
}

impl ComposedFloor {
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height)
            .then(|| (x + y * self.width) as usize)
    }

    /// `None` outside the grid.
    pub fn cell(&self, x: i32, y: i32) -> Option<&CompositedCell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn slot(&self, x: i32, y: i32, section: Section) -> Option<&Slot> {
        self.cell(x, y).map(|c| c.slot(section))
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Compose one floor. `below` is the carry returned for the floor one level
/// down, if any.
pub fn compose_floor(
    building: &Building,
    floor: &Floor,
    below: Option<&FloorCarry>,
    entries: &dyn TileEntryResolver,
    props: &dyn TilePropertyLookup,
    config: &CompositorConfig,
) -> ComposedFloor {
    debug_assert_eq!(
        floor.rooms.len(),
        (floor.width.max(0) * floor.height.max(0)) as usize,
        "floor {} room grid does not match its size",
        floor.level
    );
    debug_assert!(
        floor.width == building.width && floor.height == building.height,
        "floor {} size differs from the building",
        floor.level
    );
    debug!(
        level = floor.level,
        width = floor.width,
        height = floor.height,
        objects = floor.objects.len(),
        "composing floor"
    );

    let ctx = Context::new(building, floor, entries, props, config);
    let mut carry = FloorCarry::new(floor.level);

    let mut cells = ctx.classify_rooms();
    ctx.place_auto_walls(&mut cells);
    ctx.overlay_wall_objects(&mut cells);
    ctx.overlay_wall_furniture(&mut cells);
    ctx.detect_pillars(&mut cells);
    ctx.place_openings(&mut cells);
    ctx.place_furniture(&mut cells);
    ctx.place_stairs(&mut cells, &mut carry);
    ctx.place_roofs(&mut cells, &mut carry);
    ctx.resolve_wall_variants(&mut cells);
    for cell in &mut cells {
        legacy_swap(cell);
    }
    ctx.place_opening_art(&mut cells);
    ctx.place_floor_tiles(&mut cells, below);
    if config.grime {
        grime::resolve(&ctx, &mut cells);
    }

    debug!(
        level = floor.level,
        stairs = carry.stairs.len(),
        deferred_roofs = carry.flat_roofs.len(),
        "floor composed"
    );
    ComposedFloor {
        level: floor.level,
        width: ctx.width,
        height: ctx.height,
        cells,
        carry,
    }
}

/// Compose every floor bottom-up, handing each floor's carry to the next
/// level.
pub fn compose_building(
    building: &Building,
    entries: &dyn TileEntryResolver,
    props: &dyn TilePropertyLookup,
    config: &CompositorConfig,
) -> Vec<ComposedFloor> {
    let mut composed: Vec<ComposedFloor> = Vec::with_capacity(building.floors.len());
    for floor in building.floors_by_level() {
        let below = composed
            .last()
            .map(|f| &f.carry)
            .filter(|c| c.level == floor.level - 1);
        let out = compose_floor(building, floor, below, entries, props, config);
        composed.push(out);
    }
    composed
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Read-only inputs of one composition, shared by every phase.
pub(crate) struct Context<'a> {
    pub(crate) building: &'a Building,
    pub(crate) floor: &'a Floor,
    pub(crate) entries: &'a dyn TileEntryResolver,
    pub(crate) props: &'a dyn TilePropertyLookup,
    pub(crate) config: &'a CompositorConfig,
    /// Grid size, one more than the floor in each axis.
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl<'a> Context<'a> {
    fn new(
        building: &'a Building,
        floor: &'a Floor,
        entries: &'a dyn TileEntryResolver,
        props: &'a dyn TilePropertyLookup,
        config: &'a CompositorConfig,
    ) -> Self {
        Self {
            building,
            floor,
            entries,
            props,
            config,
            width: floor.width.max(0) + 1,
            height: floor.height.max(0) + 1,
        }
    }

    pub(crate) fn index(&self, x: i32, y: i32) -> Option<usize> {
        (x >= 0 && y >= 0 && x < self.width && y < self.height)
            .then(|| (x + y * self.width) as usize)
    }

    pub(crate) fn room(&self, id: Option<RoomId>) -> Option<&'a Room> {
        id.and_then(|id| self.building.room(id))
    }

    /// The cell across `edge` from `(x, y)`.
    pub(crate) fn neighbor<'c>(
        &self,
        cells: &'c [CompositedCell],
        x: i32,
        y: i32,
        edge: Edge,
    ) -> Option<&'c CompositedCell> {
        let (dx, dy) = edge.neighbor_offset();
        self.index(x + dx, y + dy).map(|i| &cells[i])
    }

    fn cell_mut<'c>(
        &self,
        cells: &'c mut [CompositedCell],
        p: Point,
    ) -> Option<&'c mut CompositedCell> {
        match self.index(p.x, p.y) {
            Some(i) => Some(&mut cells[i]),
            None => {
                trace!(x = p.x, y = p.y, "dropping placement outside the grid");
                None
            }
        }
    }

    /// Run `f` for every grid cell in row-major order, on rayon when the
    /// config allows it for this grid size.
    pub(crate) fn per_cell<T, F>(&self, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(i32, i32) -> T + Sync + Send,
    {
        let w = self.width;
        let n = (self.width * self.height) as usize;
        if self.config.use_parallel(n) {
            (0..n)
                .into_par_iter()
                .map(|i| f(i as i32 % w, i as i32 / w))
                .collect()
        } else {
            (0..n).map(|i| f(i as i32 % w, i as i32 / w)).collect()
        }
    }

    fn objects(&self) -> impl Iterator<Item = (ObjectIndex, &'a BuildingObject)> {
        self.floor
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| (ObjectIndex(i as u32), o))
    }

    // -----------------------------------------------------------------------
    // Phases 1-2: rooms
    // -----------------------------------------------------------------------

    fn classify_rooms(&self) -> Vec<CompositedCell> {
        self.per_cell(|x, y| {
            let room = self.floor.room_at(x, y);
            CompositedCell::new(room, self.room(room).is_none_or(|r| r.exterior))
        })
    }

    // -----------------------------------------------------------------------
    // Phase 3: automatic walls
    // -----------------------------------------------------------------------

    fn place_auto_walls(&self, cells: &mut [CompositedCell]) {
        let wall_objects: FxHashSet<(Point, Edge)> = self
            .floor
            .objects
            .iter()
            .flat_map(wall_segments)
            .collect();
        let placed = {
            let cells: &[CompositedCell] = cells;
            self.per_cell(|x, y| {
                [Edge::N, Edge::W].map(|edge| self.auto_wall(cells, &wall_objects, x, y, edge))
            })
        };
        for (cell, walls) in cells.iter_mut().zip(placed) {
            for (edge, wall) in [Edge::N, Edge::W].into_iter().zip(walls) {
                if let Some((entry, trim)) = wall {
                    let record = cell.edge_mut(edge);
                    record.entry = entry;
                    record.trim = trim;
                }
            }
        }
    }

    /// Wall and trim entries for the N or W boundary of `(x, y)`, if one
    /// belongs there.
    fn auto_wall(
        &self,
        cells: &[CompositedCell],
        wall_objects: &FxHashSet<(Point, Edge)>,
        x: i32,
        y: i32,
        edge: Edge,
    ) -> Option<(EntryId, EntryId)> {
        let here = &cells[self.index(x, y)?];
        let there = self.neighbor(cells, x, y, edge);
        // Outdoor cells all share one class; beyond the grid is outdoors.
        let class = |c: &CompositedCell| if c.exterior { None } else { c.room };
        if class(here) == there.and_then(class) {
            return None;
        }

        let (dx, dy) = edge.neighbor_offset();
        let across = Point::new(x + dx, y + dy);
        if self.painted_wall_faces(across, edge.opposite()) {
            trace!(x, y, %edge, "automatic wall suppressed by painted wall");
            return None;
        }
        if wall_objects.contains(&(Point::new(x, y), edge))
            || wall_objects.contains(&(across, edge.opposite()))
        {
            trace!(x, y, %edge, "automatic wall suppressed by wall object");
            return None;
        }

        let exterior = here.exterior || there.is_none_or(|c| c.exterior);
        let entry = if exterior {
            self.building.tiles.exterior_wall
        } else {
            self.room(here.room)
                .map_or(EntryId::NONE, |r| r.interior_wall)
        };
        Some((entry, self.trim_for(here)))
    }

    /// Trim for a wall owned by `cell`.
    fn trim_for(&self, cell: &CompositedCell) -> EntryId {
        if cell.exterior {
            if self.floor.level == 0 || !self.config.exterior_trim_ground_only {
                self.building.tiles.exterior_wall_trim
            } else {
                EntryId::NONE
            }
        } else {
            self.room(cell.room)
                .map_or(EntryId::NONE, |r| r.interior_wall_trim)
        }
    }

    /// Whether a user wall tile on `p` already draws its `edge` side.
    fn painted_wall_faces(&self, p: Point, edge: Edge) -> bool {
        self.config
            .suppress_layers
            .iter()
            .filter_map(|layer| self.floor.user_grid(layer))
            .filter_map(|grid| grid.at(p.x, p.y))
            .any(|user| {
                WallClass::of(self.props, &user.tile).is_some_and(|class| {
                    let (a, b) = class.edges(user.rotation);
                    a == Some(edge) || b == Some(edge)
                })
            })
    }

    // -----------------------------------------------------------------------
    // Phases 4-6: wall objects, wall furniture, pillars
    // -----------------------------------------------------------------------

    fn overlay_wall_objects(&self, cells: &mut [CompositedCell]) {
        for (_, object) in self.objects() {
            let ObjectKind::Wall {
                exterior,
                interior,
                exterior_trim,
                interior_trim,
                ..
            } = &object.kind
            else {
                continue;
            };
            for (p, edge) in wall_segments(object) {
                let Some(cell) = self.cell_mut(cells, p) else {
                    continue;
                };
                let outdoors = cell.exterior;
                let record = cell.edge_mut(edge);
                if outdoors {
                    record.entry = *exterior;
                    record.trim = *exterior_trim;
                } else {
                    record.entry = *interior;
                    record.trim = *interior_trim;
                }
            }
        }
    }

    fn overlay_wall_furniture(&self, cells: &mut [CompositedCell]) {
        for (index, object) in self.objects() {
            let ObjectKind::Furniture { tile: furniture } = &object.kind else {
                continue;
            };
            if furniture.layer != FurnitureLayer::Walls {
                continue;
            }
            for (dx, dy, tile) in furniture.occupied() {
                let p = object.pos.offset(dx, dy);
                let (p, edge) = match furniture.orient {
                    FurnitureOrient::W => (p, Edge::W),
                    FurnitureOrient::N => (p, Edge::N),
                    FurnitureOrient::E => (p.offset(1, 0), Edge::W),
                    FurnitureOrient::S => (p.offset(0, 1), Edge::N),
                    other => {
                        trace!(?other, "wall furniture without a straight orientation");
                        continue;
                    }
                };
                if let Some(cell) = self.cell_mut(cells, p) {
                    cell.edge_mut(edge).furniture = Some(WallOverride {
                        tile: tile.clone(),
                        object: index,
                    });
                }
            }
        }
    }

    fn detect_pillars(&self, cells: &mut [CompositedCell]) {
        let pillars = {
            let cells: &[CompositedCell] = cells;
            self.per_cell(|x, y| self.pillar_at(cells, x, y))
        };
        for (cell, pillar) in cells.iter_mut().zip(pillars) {
            if let Some((entry, trim)) = pillar {
                let record = cell.edge_mut(Edge::W);
                record.entry = entry;
                record.trim = trim;
                record.wall_type = WallType::Pillar;
            }
        }
    }

    fn pillar_at(&self, cells: &[CompositedCell], x: i32, y: i32) -> Option<(EntryId, EntryId)> {
        let here = &cells[self.index(x, y)?];
        if here.edge(Edge::N).has_wall() || here.edge(Edge::W).has_wall() {
            return None;
        }
        let from_above = self.neighbor(cells, x, y, Edge::N)?.edge(Edge::W);
        let from_left = self.neighbor(cells, x, y, Edge::W)?.edge(Edge::N);
        if !from_above.has_wall() || !from_left.has_wall() {
            return None;
        }
        let source = if from_above.entry.is_none() {
            from_left
        } else {
            from_above
        };
        source.entry.some().map(|entry| (entry, source.trim))
    }

    // -----------------------------------------------------------------------
    // Phases 7-10: openings, furniture, stairs, roofs
    // -----------------------------------------------------------------------

    fn place_openings(&self, cells: &mut [CompositedCell]) {
        for (index, object) in self.objects() {
            let is_door = match object.kind {
                ObjectKind::Door { .. } => true,
                ObjectKind::Window { .. } => false,
                _ => continue,
            };
            let Some(edge) = object.dir.edge() else {
                trace!(index = index.0, "opening without a facing");
                continue;
            };
            if let Some(cell) = self.cell_mut(cells, object.pos) {
                if is_door {
                    cell.edge_mut(edge).set_door(index);
                } else {
                    cell.edge_mut(edge).set_window(index);
                }
            }
        }
    }

    fn place_furniture(&self, cells: &mut [CompositedCell]) {
        for (_, object) in self.objects() {
            let ObjectKind::Furniture { tile: furniture } = &object.kind else {
                continue;
            };
            let Some(group) = furniture_group(furniture.layer, furniture.orient) else {
                continue;
            };
            let shift = if furniture.layer.is_wall_attached() {
                match furniture.orient {
                    FurnitureOrient::E => (1, 0),
                    FurnitureOrient::S => (0, 1),
                    _ => (0, 0),
                }
            } else {
                (0, 0)
            };
            for (dx, dy, tile) in furniture.occupied() {
                let p = object.pos.offset(dx + shift.0, dy + shift.1);
                if let Some(cell) = self.cell_mut(cells, p)
                    && let Some(evicted) = cell.push_slot(group, Slot::tile(tile.clone()))
                {
                    trace!(x = p.x, y = p.y, ?evicted, "slot group full, oldest evicted");
                }
            }
        }
    }

    fn place_stairs(&self, cells: &mut [CompositedCell], carry: &mut FloorCarry) {
        for (index, object) in self.objects() {
            let ObjectKind::Stairs { stairs } = object.kind else {
                continue;
            };
            let (facing, reversed) = match object.dir {
                Direction::W => (Facing::West, false),
                Direction::E => (Facing::West, true),
                Direction::N => (Facing::North, false),
                Direction::S => (Facing::North, true),
                Direction::Invalid => {
                    trace!(index = index.0, "stairs without a facing");
                    continue;
                }
            };
            let hole = StairwellHole {
                pos: object.pos,
                dir: object.dir,
            };
            for (k, p) in hole.cells().into_iter().enumerate() {
                let (step, rotation) = if reversed {
                    (2 - k, Rotation::R180)
                } else {
                    (k, Rotation::R0)
                };
                let slot = Slot::entry(stairs, StairsTile::step(facing, step).offset(), rotation);
                if let Some(cell) = self.cell_mut(cells, p) {
                    cell.push_slot(SlotGroup::FURNITURE, slot);
                }
            }
            carry.stairs.push(hole);
        }
    }

    fn place_roofs(&self, cells: &mut [CompositedCell], carry: &mut FloorCarry) {
        for (index, object) in self.objects() {
            let ObjectKind::Roof(roof) = &object.kind else {
                continue;
            };
            let layout = roof::layout(object.pos, roof);
            for (p, tile) in &layout.slopes {
                if let Some(cell) = self.cell_mut(cells, *p) {
                    cell.push_slot(
                        SlotGroup::ROOF,
                        Slot::entry(roof.slope_tiles, tile.offset(), Rotation::R0),
                    );
                }
            }
            for (p, cap) in &layout.caps {
                if let Some(cell) = self.cell_mut(cells, *p) {
                    cell.push_slot(
                        SlotGroup::ROOF_CAP,
                        Slot::entry(roof.cap_tiles, cap.offset(), Rotation::R0),
                    );
                }
            }
            if layout.flat.is_empty() {
                continue;
            }
            if roof.depth.is_max() {
                trace!(index = index.0, "flat roof top deferred to the floor above");
                carry.flat_roofs.push(DeferredRoofTop {
                    region: layout.flat,
                    entry: roof.top_tiles,
                    variant: layout.top,
                });
                continue;
            }
            let top = Slot::entry(roof.top_tiles, layout.top.offset(), Rotation::R0);
            for rect in layout.flat.rects() {
                for p in rect.points() {
                    if let Some(cell) = self.cell_mut(cells, p) {
                        cell.set_slot(Section::RoofTop, top.clone());
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phases 11-12: wall variants
    // -----------------------------------------------------------------------

    fn resolve_wall_variants(&self, cells: &mut [CompositedCell]) {
        let resolved = {
            let cells: &[CompositedCell] = cells;
            self.per_cell(|x, y| self.resolve_cell_walls(cells, x, y))
        };
        for (cell, (walls, trims)) in cells.iter_mut().zip(resolved) {
            for (edge, (wall, trim)) in Edge::ALL.into_iter().zip(walls.into_iter().zip(trims)) {
                cell.set_slot(Section::Wall.for_edge(edge), wall);
                cell.set_slot(Section::WallTrim.for_edge(edge), trim);
            }
        }
        // The merge reads fully resolved slots of a single cell.
        for cell in cells.iter_mut() {
            merge_north_west(cell);
        }
    }

    fn resolve_cell_walls(
        &self,
        cells: &[CompositedCell],
        x: i32,
        y: i32,
    ) -> ([Slot; 4], [Slot; 4]) {
        let mut walls: [Slot; 4] = Default::default();
        let mut trims: [Slot; 4] = Default::default();
        let Some(i) = self.index(x, y) else {
            return (walls, trims);
        };
        let cell = &cells[i];
        for edge in Edge::ALL {
            let record = cell.edge(edge);
            if !record.has_wall() {
                continue;
            }
            if let Some(furniture) = &record.furniture {
                walls[edge.index()] = Slot::tile(furniture.tile.clone());
                continue;
            }
            let (facing, rotation) = edge.art();
            let variant = if record.wall_type == WallType::Pillar {
                WallTile::SouthEast
            } else {
                match self.opening(cells, x, y, edge) {
                    WallOpening::Door => WallTile::door(facing),
                    WallOpening::Window => WallTile::window(facing),
                    WallOpening::None => WallTile::plain(facing),
                }
            };
            walls[edge.index()] = Slot::entry(record.entry, variant.offset(), rotation);
            trims[edge.index()] = Slot::entry(record.trim, variant.offset(), rotation);
        }
        (walls, trims)
    }

    /// Opening on `edge` of `(x, y)`, or on the mirrored edge across it.
    /// A door wins over a window.
    fn opening(&self, cells: &[CompositedCell], x: i32, y: i32, edge: Edge) -> WallOpening {
        let mut records = Vec::with_capacity(2);
        if let Some(i) = self.index(x, y) {
            records.push(cells[i].edge(edge));
        }
        if let Some(n) = self.neighbor(cells, x, y, edge) {
            records.push(n.edge(edge.opposite()));
        }
        if records.iter().any(|r| r.door().is_some()) {
            WallOpening::Door
        } else if records.iter().any(|r| r.window().is_some()) {
            WallOpening::Window
        } else {
            WallOpening::None
        }
    }

    // -----------------------------------------------------------------------
    // Phase 14: opening art
    // -----------------------------------------------------------------------

    fn place_opening_art(&self, cells: &mut [CompositedCell]) {
        for (index, object) in self.objects() {
            let Some(edge) = object.dir.edge() else {
                continue;
            };
            let Some(i) = self.index(object.pos.x, object.pos.y) else {
                continue;
            };
            let (facing, rotation) = edge.art();
            match &object.kind {
                ObjectKind::Door { door, frame } => {
                    if cells[i].edge(edge).door() != Some(index) {
                        continue;
                    }
                    let cell = &mut cells[i];
                    cell.set_slot(
                        Section::Door.for_edge(edge),
                        Slot::entry(*door, DoorTile::for_facing(facing).offset(), rotation),
                    );
                    cell.set_slot(
                        Section::Frame.for_edge(edge),
                        Slot::entry(*frame, FrameTile::for_facing(facing).offset(), rotation),
                    );
                }
                ObjectKind::Window {
                    window,
                    curtains,
                    shutters,
                } => {
                    if cells[i].edge(edge).window() != Some(index) {
                        continue;
                    }
                    cells[i].set_slot(
                        Section::Window.for_edge(edge),
                        Slot::entry(*window, WindowTile::for_facing(facing).offset(), rotation),
                    );
                    let exterior_wall = self.is_exterior_wall(cells, object.pos, edge);
                    self.place_curtains(cells, object.pos, edge, exterior_wall, *curtains);
                    if exterior_wall {
                        self.place_shutters(cells, object.pos, edge, *shutters);
                    }
                }
                _ => {}
            }
        }
    }

    fn is_exterior_wall(&self, cells: &[CompositedCell], p: Point, edge: Edge) -> bool {
        let here = self.index(p.x, p.y).is_none_or(|i| cells[i].exterior);
        here || self
            .neighbor(cells, p.x, p.y, edge)
            .is_none_or(|c| c.exterior)
    }

    /// Curtains hang inside the room: on an exterior wall whose own cell is
    /// outdoors they move to the room cell across the edge.
    fn place_curtains(
        &self,
        cells: &mut [CompositedCell],
        p: Point,
        edge: Edge,
        exterior_wall: bool,
        curtains: EntryId,
    ) {
        if curtains.is_none() {
            return;
        }
        let (dx, dy) = edge.neighbor_offset();
        let across = p.offset(dx, dy);
        let here_outdoors = self.index(p.x, p.y).is_none_or(|i| cells[i].exterior);
        let across_indoors = self
            .index(across.x, across.y)
            .is_some_and(|i| !cells[i].exterior);
        let (target, side) = if exterior_wall && here_outdoors && across_indoors {
            (across, edge.opposite())
        } else {
            (p, edge)
        };
        if let Some(cell) = self.cell_mut(cells, target) {
            cell.set_slot(
                Section::Curtains.for_edge(side),
                Slot::entry(curtains, CurtainsTile::for_edge(side).offset(), Rotation::R0),
            );
        }
    }

    /// Shutter leaves go into the furniture group of the two cells flanking
    /// the window along the wall line.
    fn place_shutters(&self, cells: &mut [CompositedCell], p: Point, edge: Edge, shutters: EntryId) {
        if shutters.is_none() {
            return;
        }
        let (facing, rotation) = edge.art();
        let leaves = match facing {
            Facing::West => [ShuttersTile::WestAbove, ShuttersTile::WestBelow],
            Facing::North => [ShuttersTile::NorthLeft, ShuttersTile::NorthRight],
        };
        let flanks = if edge.is_vertical() {
            [p.offset(0, -1), p.offset(0, 1)]
        } else {
            [p.offset(-1, 0), p.offset(1, 0)]
        };
        for (leaf, at) in leaves.into_iter().zip(flanks) {
            if let Some(cell) = self.cell_mut(cells, at) {
                cell.push_slot(
                    SlotGroup::FURNITURE,
                    Slot::entry(shutters, leaf.offset(), rotation),
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 15: floor tiles and effects from below
    // -----------------------------------------------------------------------

    fn place_floor_tiles(&self, cells: &mut [CompositedCell], below: Option<&FloorCarry>) {
        for y in 0..self.floor.height {
            for x in 0..self.floor.width {
                let Some(i) = self.index(x, y) else {
                    continue;
                };
                let cell = &mut cells[i];
                if let Some(room) = self.room(cell.room) {
                    cell.set_slot(
                        Section::Floor,
                        Slot::entry(room.floor, FloorTile::Floor.offset(), Rotation::R0),
                    );
                }
            }
        }
        let Some(below) = below else {
            return;
        };
        for hole in &below.stairs {
            for p in hole.cells() {
                if let Some(cell) = self.cell_mut(cells, p) {
                    cell.set_slot(Section::Floor, Slot::Empty);
                }
            }
        }
        for top in &below.flat_roofs {
            let slot = Slot::entry(top.entry, top.variant.offset(), Rotation::R0);
            for rect in top.region.rects() {
                for p in rect.points() {
                    let Some(cell) = self.cell_mut(cells, p) else {
                        continue;
                    };
                    if cell.slot(Section::Floor).is_empty() {
                        cell.set_slot(Section::Floor, slot.clone());
                    } else {
                        cell.set_slot(Section::RoofTop, slot.clone());
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Edge records a wall object occupies. N/W walls run along x/y from the
/// anchor; E/S walls occupy the E/S records of the same cells.
fn wall_segments(object: &BuildingObject) -> Vec<(Point, Edge)> {
    let ObjectKind::Wall { length, .. } = object.kind else {
        return Vec::new();
    };
    let Some(edge) = object.dir.edge() else {
        return Vec::new();
    };
    (0..length.max(0))
        .map(|k| {
            let p = if edge.is_vertical() {
                object.pos.offset(0, k)
            } else {
                object.pos.offset(k, 0)
            };
            (p, edge)
        })
        .collect()
}

/// Slot group a non-wall furniture layer pushes into.
fn furniture_group(layer: FurnitureLayer, orient: FurnitureOrient) -> Option<SlotGroup> {
    let es = orient.is_e() || orient.is_s();
    let pick = |wn: SlotGroup, es_group: SlotGroup| if es { es_group } else { wn };
    let group = match layer {
        FurnitureLayer::Walls => return None,
        FurnitureLayer::RoofCap => SlotGroup::ROOF_CAP,
        FurnitureLayer::WallOverlay => pick(SlotGroup::WALL_OVERLAY_WN, SlotGroup::WALL_OVERLAY_ES),
        FurnitureLayer::WallFurniture => {
            pick(SlotGroup::WALL_FURNITURE_WN, SlotGroup::WALL_FURNITURE_ES)
        }
        FurnitureLayer::Frames => pick(SlotGroup::FRAME_WN, SlotGroup::FRAME_ES),
        FurnitureLayer::Doors => pick(SlotGroup::DOOR_WN, SlotGroup::DOOR_ES),
        FurnitureLayer::Furniture => SlotGroup::FURNITURE,
        FurnitureLayer::Roof => SlotGroup::ROOF,
    };
    Some(group)
}

fn plain_variant(slot: &Slot, facing: Facing) -> bool {
    slot.variant() == Some(WallTile::plain(facing).offset())
}

/// Merge equal plain N and W walls into one north-west corner in the N
/// slot. Trims merge along with them when they are equal too.
fn merge_north_west(cell: &mut CompositedCell) {
    let (n, w) = (cell.slot(Section::Wall), cell.slot(Section::Wall2));
    let Some(entry) = n.entry_id() else {
        return;
    };
    if w.entry_id() != Some(entry) || !plain_variant(n, Facing::North) || !plain_variant(w, Facing::West)
    {
        return;
    }
    cell.set_slot(
        Section::Wall,
        Slot::entry(entry, WallTile::NorthWest.offset(), Rotation::R0),
    );
    cell.set_slot(Section::Wall2, Slot::Empty);

    let (tn, tw) = (cell.slot(Section::WallTrim), cell.slot(Section::WallTrim2));
    if let Some(trim) = tn.entry_id()
        && tw.entry_id() == Some(trim)
        && plain_variant(tn, Facing::North)
        && plain_variant(tw, Facing::West)
    {
        cell.set_slot(
            Section::WallTrim,
            Slot::entry(trim, WallTile::NorthWest.offset(), Rotation::R0),
        );
        cell.set_slot(Section::WallTrim2, Slot::Empty);
    }
}

/// Historical stacking order: a plain wall sits in the first slot below a
/// door- or window-cut partner, and a lone wall always sits first. Swaps the
/// wall slots (and their trims) when the N slot holds an opening over a
/// plain W wall, or is empty while W is not.
fn legacy_swap(cell: &mut CompositedCell) {
    let wall_tile = |slot: &Slot| slot.variant().and_then(WallTile::from_offset);
    let (n, w) = (cell.slot(Section::Wall), cell.slot(Section::Wall2));
    let opening_over_plain = wall_tile(n).is_some_and(WallTile::is_opening)
        && wall_tile(w).is_some_and(WallTile::is_plain);
    if opening_over_plain || (n.is_empty() && !w.is_empty()) {
        cell.swap_slots(Section::Wall, Section::Wall2);
        cell.swap_slots(Section::WallTrim, Section::WallTrim2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::object::{FurnitureTile, RoofDepth, RoofObject, RoofType};
    use crate::properties::{TileProperties, TilePropertyDb};
    use crate::tiles::{TileCatalog, TileEntry, TileRef};
    use crate::user_tiles::UserTile;

    const EXTERIOR: EntryId = EntryId(1);
    const INTERIOR: EntryId = EntryId(2);
    const FLOOR: EntryId = EntryId(3);

    fn catalog() -> TileCatalog {
        let mut c = TileCatalog::new();
        c.add(TileEntry::new("exterior", "Walls").with_run("walls_ext", 0, 8));
        c.add(TileEntry::new("interior", "Walls").with_run("walls_int", 0, 8));
        c.add(TileEntry::new("floor", "Floors").with_run("floors", 0, 1));
        c
    }

    /// A building of `w` x `h` with one room covering `room`.
    fn building(w: i32, h: i32, room: Rect) -> Building {
        let mut b = Building::new(w, h);
        b.tiles.exterior_wall = EXTERIOR;
        let id = b.add_room(Room {
            interior_wall: INTERIOR,
            floor: FLOOR,
            ..Room::new("room")
        });
        b.add_floor().fill_rect(room, Some(id));
        b
    }

    fn compose(b: &Building) -> ComposedFloor {
        compose_with(b, &TilePropertyDb::new())
    }

    fn compose_with(b: &Building, props: &TilePropertyDb) -> ComposedFloor {
        compose_floor(
            b,
            &b.floors[0],
            None,
            &catalog(),
            props,
            &CompositorConfig::sequential(),
        )
    }

    fn wall(entry: EntryId, tile: WallTile, rotation: Rotation) -> Slot {
        Slot::entry(entry, tile.offset(), rotation)
    }

    #[test]
    fn grid_has_border_row_and_column() {
        let out = compose(&building(3, 2, Rect::new(0, 0, 3, 2)));
        assert_eq!((out.width, out.height), (4, 3));
        assert_eq!(out.cells.len(), 12);
        assert!(out.cell(3, 0).unwrap().room.is_none());
        assert!(out.cell(4, 0).is_none());
    }

    #[test]
    fn room_next_to_outdoors_gets_exterior_walls() {
        let out = compose(&building(3, 3, Rect::new(1, 1, 1, 1)));
        // The room cell owns its N and W walls and merges them.
        assert_eq!(
            out.slot(1, 1, Section::Wall),
            Some(&wall(EXTERIOR, WallTile::NorthWest, Rotation::R0))
        );
        assert_eq!(out.slot(1, 1, Section::Wall2), Some(&Slot::Empty));
        // East and south boundaries belong to the outdoor neighbours.
        assert_eq!(
            out.slot(2, 1, Section::Wall),
            Some(&wall(EXTERIOR, WallTile::West, Rotation::R0))
        );
        assert_eq!(
            out.slot(1, 2, Section::Wall),
            Some(&wall(EXTERIOR, WallTile::North, Rotation::R0))
        );
    }

    #[test]
    fn walls_between_rooms_use_owning_room_interior() {
        let mut b = building(4, 1, Rect::new(0, 0, 2, 1));
        let other = b.add_room(Room {
            interior_wall: EntryId(3),
            ..Room::new("other")
        });
        b.floors[0].fill_rect(Rect::new(2, 0, 2, 1), Some(other));
        let out = compose(&b);
        let record = out.cell(2, 0).unwrap().edge(Edge::W);
        assert_eq!(record.entry, EntryId(3));
        // Same room on both sides: no wall.
        assert!(!out.cell(1, 0).unwrap().edge(Edge::W).has_wall());
    }

    #[test]
    fn painted_wall_suppresses_automatic_wall() {
        let mut b = building(3, 1, Rect::new(1, 0, 2, 1));
        let painted = TileRef::new("walls_user", 0);
        let mut props = TilePropertyDb::new();
        props.insert(&painted, TileProperties::new().with_flag("WallN"));
        // North art rotated 90 draws the east side of (0, 0).
        b.floors[0]
            .user_grid_mut("Wall")
            .set_at(0, 0, Some(UserTile::rotated(painted, Rotation::R90)));
        let out = compose_with(&b, &props);
        assert!(!out.cell(1, 0).unwrap().edge(Edge::W).has_wall());
        assert!(out.cell(1, 0).unwrap().edge(Edge::N).has_wall());
    }

    #[test]
    fn wall_object_takes_edge_and_suppresses_mirror() {
        let mut b = building(3, 1, Rect::new(1, 0, 2, 1));
        b.floors[0].add_object(BuildingObject::new(
            Point::new(0, 0),
            Direction::E,
            ObjectKind::Wall {
                exterior: EntryId(7),
                interior: EntryId(8),
                exterior_trim: EntryId::NONE,
                interior_trim: EntryId::NONE,
                length: 1,
            },
        ));
        let out = compose(&b);
        assert!(!out.cell(1, 0).unwrap().edge(Edge::W).has_wall());
        assert_eq!(out.cell(0, 0).unwrap().edge(Edge::E).entry, EntryId(7));
        // East edges draw north art turned a quarter.
        assert_eq!(
            out.slot(0, 0, Section::Wall3),
            Some(&wall(EntryId(7), WallTile::North, Rotation::R90))
        );
    }

    #[test]
    fn door_cuts_the_wall_it_sits_in() {
        let mut b = building(2, 2, Rect::new(0, 0, 2, 1));
        b.floors[0].add_object(BuildingObject::door(
            Point::new(0, 1),
            Direction::N,
            EntryId(9),
            EntryId(10),
        ));
        let out = compose(&b);
        assert_eq!(
            out.slot(0, 1, Section::Wall),
            Some(&wall(EXTERIOR, WallTile::NorthDoor, Rotation::R0))
        );
        assert_eq!(
            out.slot(0, 1, Section::Door),
            Some(&Slot::entry(EntryId(9), DoorTile::North.offset(), Rotation::R0))
        );
        assert_eq!(
            out.slot(0, 1, Section::Frame),
            Some(&Slot::entry(EntryId(10), FrameTile::North.offset(), Rotation::R0))
        );
    }

    #[test]
    fn pillar_closes_an_outside_corner() {
        // Room at (0,0): walls end at the top-left corner of (1,1).
        let out = compose(&building(3, 3, Rect::new(0, 0, 1, 1)));
        let record = out.cell(1, 1).unwrap().edge(Edge::W);
        assert_eq!(record.wall_type, WallType::Pillar);
        assert_eq!(record.entry, EXTERIOR);
        // Pillar art lands in the first wall slot after the legacy swap.
        assert_eq!(
            out.slot(1, 1, Section::Wall),
            Some(&wall(EXTERIOR, WallTile::SouthEast, Rotation::R0))
        );
    }

    #[test]
    fn stairs_write_three_steps() {
        let mut b = building(1, 6, Rect::new(0, 0, 1, 6));
        b.floors[0].add_object(BuildingObject::stairs(Point::new(0, 0), Direction::N, EntryId(5)));
        let out = compose(&b);
        assert!(out.slot(0, 0, Section::Furniture).unwrap().is_empty());
        for (k, y) in (1..=3).enumerate() {
            assert_eq!(
                out.slot(0, y, Section::Furniture),
                Some(&Slot::entry(EntryId(5), StairsTile::step(Facing::North, k).offset(), Rotation::R0))
            );
        }
        assert_eq!(out.carry.stairs.len(), 1);
    }

    #[test]
    fn furniture_fifo_keeps_newest_four() {
        let mut b = building(1, 1, Rect::new(0, 0, 1, 1));
        for i in 0..5 {
            let ft = FurnitureTile::new(FurnitureLayer::Furniture, FurnitureOrient::W, 1, 1)
                .with_tile(0, 0, TileRef::new("furniture", i));
            b.floors[0].add_object(BuildingObject::furniture(Point::new(0, 0), ft));
        }
        let out = compose(&b);
        let group = out.cell(0, 0).unwrap().group(SlotGroup::FURNITURE);
        assert_eq!(group[0], Slot::tile(TileRef::new("furniture", 1)));
        assert_eq!(group[3], Slot::tile(TileRef::new("furniture", 4)));
    }

    #[test]
    fn east_wall_overlay_shifts_one_cell() {
        let mut b = building(2, 1, Rect::new(0, 0, 2, 1));
        let ft = FurnitureTile::new(FurnitureLayer::WallOverlay, FurnitureOrient::E, 1, 1)
            .with_tile(0, 0, TileRef::new("overlay", 0));
        b.floors[0].add_object(BuildingObject::furniture(Point::new(0, 0), ft));
        let out = compose(&b);
        assert_eq!(
            out.slot(1, 0, Section::WallOverlay3),
            Some(&Slot::tile(TileRef::new("overlay", 0)))
        );
        assert!(out.slot(0, 0, Section::WallOverlay3).unwrap().is_empty());
    }

    #[test]
    fn shallow_flat_roof_stays_on_its_floor() {
        let mut b = building(2, 2, Rect::new(0, 0, 2, 2));
        let roof = RoofObject::new(2, 2, RoofType::FlatTop, RoofDepth::One).with_tiles(
            EntryId::NONE,
            EntryId::NONE,
            EntryId(6),
        );
        b.floors[0].add_object(BuildingObject::roof(Point::new(0, 0), roof));
        let out = compose(&b);
        assert!(!out.slot(1, 1, Section::RoofTop).unwrap().is_empty());
        assert!(out.carry.flat_roofs.is_empty());
    }

    #[test]
    fn out_of_range_objects_are_dropped() {
        let mut b = building(2, 2, Rect::new(0, 0, 2, 2));
        b.floors[0].add_object(BuildingObject::door(
            Point::new(10, 10),
            Direction::W,
            EntryId(9),
            EntryId(10),
        ));
        b.floors[0].add_object(BuildingObject::stairs(Point::new(1, -3), Direction::N, EntryId(5)));
        let out = compose(&b);
        assert_eq!(out.cells.len(), 9);
        assert!(out.cells.iter().all(|c| c.edges.iter().all(|e| e.door().is_none())));
    }

    #[test]
    fn legacy_swap_moves_lone_west_wall_first() {
        let mut cell = CompositedCell::default();
        cell.set_slot(Section::Wall2, wall(INTERIOR, WallTile::West, Rotation::R0));
        legacy_swap(&mut cell);
        assert_eq!(cell.slot(Section::Wall), &wall(INTERIOR, WallTile::West, Rotation::R0));
        assert!(cell.slot(Section::Wall2).is_empty());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let mut b = building(70, 70, Rect::new(3, 3, 50, 40));
        b.floors[0].add_object(BuildingObject::window(
            Point::new(10, 3),
            Direction::N,
            EntryId(1),
            EntryId(2),
            EntryId(3),
        ));
        let seq = compose(&b);
        let config = CompositorConfig {
            parallel_min_cells: 1,
            ..CompositorConfig::default()
        };
        let par = compose_floor(&b, &b.floors[0], None, &catalog(), &TilePropertyDb::new(), &config);
        assert_eq!(seq, par);
    }
}
