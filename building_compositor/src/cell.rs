// Output record of the compositor: one `CompositedCell` per grid coordinate.
//
// A cell holds four edge records (N, W, E, S) describing the wall state on
// each side, plus 50 named slots ("sections") the renderer maps to drawing
// layers. Sections come in groups:
//
//   Floor | FloorGrime x4 | Wall x4 | WallTrim x4 | WallGrime x4 |
//   WallOverlay x4 | WallFurniture x4 | RoofCap x2 | Frame x4 | Door x4 |
//   Window x4 | Curtains x4 | Furniture x4 | Roof x2 | RoofTop
//
// Edge-indexed quads (wall, trim, grime, frame, door, window, curtains) use
// `Edge::index()` order. Furniture-fed groups are FIFO stacks addressed by
// `SlotGroup`: a push fills the first empty slot, and a push into a full
// group evicts the oldest occupant (the first slot), shifts the rest down
// and writes the newcomer into the last slot.
//
// A `Slot` is either empty, a tile entry with a variant offset and rotation,
// or a raw tile (furniture art that bypasses entry resolution). The two
// filled forms are separate enum variants, so a slot can never hold both.
//
// See also: `compositor.rs` which fills these, `tiles.rs` for the variant
// offsets stored in `Slot::Entry`.

use crate::tiles::{EntryId, TileRef};
use crate::types::{Edge, ObjectIndex, Rotation, RoomId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

macro_rules! sections {
    ($($variant:ident),+ $(,)?) => {
        /// Named output slots of a cell, in storage order.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Section {
            $($variant),+
        }

        impl Section {
            pub const ALL: &'static [Section] = &[$(Section::$variant),+];

            /// Layer name the renderer maps this section to.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Section::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

sections!(
    Floor,
    FloorGrime,
    FloorGrime2,
    FloorGrime3,
    FloorGrime4,
    Wall,
    Wall2,
    Wall3,
    Wall4,
    WallTrim,
    WallTrim2,
    WallTrim3,
    WallTrim4,
    WallGrime,
    WallGrime2,
    WallGrime3,
    WallGrime4,
    WallOverlay,
    WallOverlay2,
    WallOverlay3,
    WallOverlay4,
    WallFurniture,
    WallFurniture2,
    WallFurniture3,
    WallFurniture4,
    RoofCap,
    RoofCap2,
    Frame,
    Frame2,
    Frame3,
    Frame4,
    Door,
    Door2,
    Door3,
    Door4,
    Window,
    Window2,
    Window3,
    Window4,
    Curtains,
    Curtains2,
    Curtains3,
    Curtains4,
    Furniture,
    Furniture2,
    Furniture3,
    Furniture4,
    Roof,
    Roof2,
    RoofTop,
);

impl Section {
    pub const COUNT: usize = Section::ALL.len();

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The section `k` places after this one, if any.
    pub fn nth(self, k: usize) -> Option<Section> {
        Section::ALL.get(self.index() + k).copied()
    }

    /// Slot of an edge-indexed quad starting at `self`.
    pub fn for_edge(self, edge: Edge) -> Section {
        Section::ALL[self.index() + edge.index()]
    }
}

/// A contiguous run of sections filled as a FIFO stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotGroup {
    pub first: Section,
    pub len: usize,
}

impl SlotGroup {
    pub const WALL_OVERLAY_WN: SlotGroup = SlotGroup::new(Section::WallOverlay, 2);
    pub const WALL_OVERLAY_ES: SlotGroup = SlotGroup::new(Section::WallOverlay3, 2);
    pub const WALL_FURNITURE_WN: SlotGroup = SlotGroup::new(Section::WallFurniture, 2);
    pub const WALL_FURNITURE_ES: SlotGroup = SlotGroup::new(Section::WallFurniture3, 2);
    pub const ROOF_CAP: SlotGroup = SlotGroup::new(Section::RoofCap, 2);
    pub const FRAME_WN: SlotGroup = SlotGroup::new(Section::Frame, 2);
    pub const FRAME_ES: SlotGroup = SlotGroup::new(Section::Frame3, 2);
    pub const DOOR_WN: SlotGroup = SlotGroup::new(Section::Door, 2);
    pub const DOOR_ES: SlotGroup = SlotGroup::new(Section::Door3, 2);
    pub const FURNITURE: SlotGroup = SlotGroup::new(Section::Furniture, 4);
    pub const ROOF: SlotGroup = SlotGroup::new(Section::Roof, 2);

    pub const fn new(first: Section, len: usize) -> Self {
        Self { first, len }
    }

    fn range(self) -> std::ops::Range<usize> {
        let start = self.first.index();
        start..(start + self.len).min(Section::COUNT)
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// One resolved tile assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[default]
    Empty,
    Entry {
        entry: EntryId,
        variant: usize,
        rotation: Rotation,
    },
    /// Raw tile, used where furniture replaces computed art.
    Tile { tile: TileRef, rotation: Rotation },
}

impl Slot {
    /// Entry slot, or `Empty` for the `NONE` entry.
    pub fn entry(entry: EntryId, variant: usize, rotation: Rotation) -> Self {
        if entry.is_none() {
            Slot::Empty
        } else {
            Slot::Entry {
                entry,
                variant,
                rotation,
            }
        }
    }

    pub fn tile(tile: TileRef) -> Self {
        Slot::Tile {
            tile,
            rotation: Rotation::R0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn entry_id(&self) -> Option<EntryId> {
        match self {
            Slot::Entry { entry, .. } => Some(*entry),
            _ => None,
        }
    }

    pub fn variant(&self) -> Option<usize> {
        match self {
            Slot::Entry { variant, .. } => Some(*variant),
            _ => None,
        }
    }

    pub fn rotation(&self) -> Rotation {
        match self {
            Slot::Empty => Rotation::R0,
            Slot::Entry { rotation, .. } | Slot::Tile { rotation, .. } => *rotation,
        }
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallType {
    #[default]
    Plain,
    /// Corner post at the end of a run; always drawn with the corner variant.
    Pillar,
}

/// Walls-layer furniture art standing in for a wall.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallOverride {
    pub tile: TileRef,
    pub object: ObjectIndex,
}

/// Wall state of one side of a cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallEdge {
    pub entry: EntryId,
    pub trim: EntryId,
    door: Option<ObjectIndex>,
    window: Option<ObjectIndex>,
    pub furniture: Option<WallOverride>,
    pub wall_type: WallType,
}

impl WallEdge {
    pub fn has_wall(&self) -> bool {
        !self.entry.is_none() || self.furniture.is_some()
    }

    pub fn door(&self) -> Option<ObjectIndex> {
        self.door
    }

    pub fn window(&self) -> Option<ObjectIndex> {
        self.window
    }

    /// Claim the edge for a door. Clears any window.
    pub fn set_door(&mut self, door: ObjectIndex) {
        self.door = Some(door);
        self.window = None;
    }

    /// Claim the edge for a window. Clears any door.
    pub fn set_window(&mut self, window: ObjectIndex) {
        self.window = Some(window);
        self.door = None;
    }

    pub fn has_opening(&self) -> bool {
        self.door.is_some() || self.window.is_some()
    }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositedCell {
    pub room: Option<RoomId>,
    /// No room, or a room flagged as outdoors.
    pub exterior: bool,
    /// Indexed by `Edge::index()`.
    pub edges: [WallEdge; 4],
    slots: Vec<Slot>,
}

impl Default for CompositedCell {
    fn default() -> Self {
        Self {
            room: None,
            exterior: true,
            edges: Default::default(),
            slots: vec![Slot::Empty; Section::COUNT],
        }
    }
}

impl CompositedCell {
    pub fn new(room: Option<RoomId>, exterior: bool) -> Self {
        Self {
            room,
            exterior,
            ..Self::default()
        }
    }

    pub fn edge(&self, edge: Edge) -> &WallEdge {
        &self.edges[edge.index()]
    }

    pub fn edge_mut(&mut self, edge: Edge) -> &mut WallEdge {
        &mut self.edges[edge.index()]
    }

    pub fn slot(&self, section: Section) -> &Slot {
        &self.slots[section.index()]
    }

    pub fn set_slot(&mut self, section: Section, slot: Slot) {
        self.slots[section.index()] = slot;
    }

    pub fn swap_slots(&mut self, a: Section, b: Section) {
        self.slots.swap(a.index(), b.index());
    }

    pub fn group(&self, group: SlotGroup) -> &[Slot] {
        &self.slots[group.range()]
    }

    /// FIFO push into a slot group. Returns the evicted occupant, if any.
    /// Empty slots are never pushed.
    pub fn push_slot(&mut self, group: SlotGroup, slot: Slot) -> Option<Slot> {
        if slot.is_empty() {
            return None;
        }
        let range = group.range();
        let slots = &mut self.slots[range];
        if let Some(free) = slots.iter_mut().find(|s| s.is_empty()) {
            *free = slot;
            return None;
        }
        let last = slots.len().checked_sub(1)?;
        let evicted = std::mem::take(&mut slots[0]);
        slots.rotate_left(1);
        slots[last] = slot;
        Some(evicted)
    }

    /// Sections holding something, in storage order.
    pub fn occupied(&self) -> impl Iterator<Item = (Section, &Slot)> + '_ {
        Section::ALL
            .iter()
            .zip(&self.slots)
            .filter(|(_, s)| !s.is_empty())
            .map(|(sec, s)| (*sec, s))
    }
}
