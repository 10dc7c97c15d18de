// Grime resolution (compositor phase 16).
//
// Wall grime is chosen from the *classification* of the wall art a cell
// draws, not from which slot the art ended up in: after the north-west merge
// and the legacy swap, slot order no longer says which side a tile faces.
//
// ## Sources
//
// For each of the four wall slots `k` the grime source is, in order:
// 1. the user tile on layer `config.grime_layers[k]` at this cell, if it is
//    present *and* classified by the property lookup;
// 2. otherwise the tile the slot resolves to (entry + variant through the
//    resolver, or the raw furniture tile).
// Unclassified tiles and tiles without properties contribute nothing.
//
// Each classified source claims the edges its art draws (`WallClass::edges`
// with the tile's rotation). A SouthEast post claims the W slot. When two
// sources claim one edge, user tiles beat resolved tiles and straight walls
// beat corners; ties go to the lower slot.
//
// ## North-west corners
//
// A NorthWest corner tile that alone covers both N and W gets one NorthWest
// (or NorthWestTrim) grime in the N slot. If another tile also claims N or
// W, one corner grime cannot serve both tiles: the corner degrades to plain
// straight grime (North on N, West or WestTrim on W) on whichever side it
// still wins.
//
// ## Floor grime
//
// Room cells with a floor-grime entry get one grime per walled side (own
// edge or the neighbour's mirrored edge). N+W collapse to NorthWest in the
// first slot and E+S to SouthEast in the third.
//
// Grime entries come from the owning room; outdoor cells use the building's
// grime on the ground floor only.
//
// See also: `properties.rs` for classification, `compositor.rs`.

use crate::cell::{CompositedCell, Section, Slot};
use crate::compositor::Context;
use crate::properties::{GrimeStyle, WallClass, WallOpening, WallShape};
use crate::tiles::{EntryId, GrimeFloorTile, GrimeWallTile, TileRef};
use crate::types::{Edge, Facing, Rotation};
use smallvec::SmallVec;

/// A classified wall tile standing in one wall slot.
#[derive(Clone, Copy, Debug)]
struct Source {
    slot: usize,
    user: bool,
    class: WallClass,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ClaimKind {
    Straight,
    Corner,
    Post,
}

#[derive(Clone, Copy, Debug)]
struct Claim {
    source: usize,
    kind: ClaimKind,
}

/// Grime slots computed for one cell.
#[derive(Clone, Debug, Default)]
struct CellGrime {
    wall: [Slot; 4],
    floor: [Slot; 4],
}

pub(crate) fn resolve(ctx: &Context<'_>, cells: &mut [CompositedCell]) {
    let grime = {
        let cells: &[CompositedCell] = cells;
        ctx.per_cell(|x, y| cell_grime(ctx, cells, x, y))
    };
    for (cell, grime) in cells.iter_mut().zip(grime) {
        for (k, (wall, floor)) in grime.wall.into_iter().zip(grime.floor).enumerate() {
            if let Some(section) = Section::WallGrime.nth(k) {
                cell.set_slot(section, wall);
            }
            if let Some(section) = Section::FloorGrime.nth(k) {
                cell.set_slot(section, floor);
            }
        }
    }
}

fn cell_grime(ctx: &Context<'_>, cells: &[CompositedCell], x: i32, y: i32) -> CellGrime {
    let mut out = CellGrime::default();
    let Some(i) = ctx.index(x, y) else {
        return out;
    };
    let cell = &cells[i];
    let room = ctx.room(cell.room);

    let wall_grime = if cell.exterior {
        if ctx.floor.level == 0 {
            ctx.building.tiles.grime_wall
        } else {
            EntryId::NONE
        }
    } else {
        room.map_or(EntryId::NONE, |r| r.grime_wall)
    };
    if !wall_grime.is_none() {
        out.wall = wall_grime_slots(ctx, cell, x, y, wall_grime);
    }

    if let Some(room) = room
        && !cell.exterior
        && !room.grime_floor.is_none()
    {
        out.floor = floor_grime_slots(ctx, cells, cell, x, y, room.grime_floor);
    }
    out
}

// ---------------------------------------------------------------------------
// Wall grime
// ---------------------------------------------------------------------------

/// Classified source of wall slot `k`.
fn source(ctx: &Context<'_>, cell: &CompositedCell, x: i32, y: i32, k: usize) -> Option<(Source, Rotation)> {
    let user = ctx.config.grime_layers.get(k).and_then(|layer| {
        let tile = ctx.floor.user_grid(layer)?.at(x, y)?;
        let class = WallClass::of(ctx.props, &tile.tile)?;
        Some((class, tile.rotation))
    });
    if let Some((class, rotation)) = user {
        return Some((
            Source {
                slot: k,
                user: true,
                class,
            },
            rotation,
        ));
    }

    let section = Section::Wall.nth(k)?;
    let (tile, rotation): (&TileRef, Rotation) = match cell.slot(section) {
        Slot::Empty => return None,
        Slot::Entry {
            entry,
            variant,
            rotation,
        } => (ctx.entries.resolve(*entry, *variant)?, *rotation),
        Slot::Tile { tile, rotation } => (tile, *rotation),
    };
    let class = WallClass::of(ctx.props, tile)?;
    Some((
        Source {
            slot: k,
            user: false,
            class,
        },
        rotation,
    ))
}

fn wall_grime_slots(
    ctx: &Context<'_>,
    cell: &CompositedCell,
    x: i32,
    y: i32,
    grime: EntryId,
) -> [Slot; 4] {
    let mut sources: SmallVec<[Source; 4]> = SmallVec::new();
    let mut claims: [SmallVec<[Claim; 2]>; 4] = Default::default();
    for k in 0..4 {
        let Some((src, rotation)) = source(ctx, cell, x, y, k) else {
            continue;
        };
        let id = sources.len();
        sources.push(src);
        let mut claim = |edge: Edge, kind| claims[edge.index()].push(Claim { source: id, kind });
        match src.class.shape {
            WallShape::West | WallShape::North => {
                if let (Some(edge), _) = src.class.edges(rotation) {
                    claim(edge, ClaimKind::Straight);
                }
            }
            WallShape::NorthWest => {
                if let (Some(n), Some(w)) = src.class.edges(rotation) {
                    claim(n, ClaimKind::Corner);
                    claim(w, ClaimKind::Corner);
                }
            }
            WallShape::SouthEast => claim(Edge::W, ClaimKind::Post),
        }
    }

    let winner = |edge: Edge| -> Option<Claim> {
        claims[edge.index()].iter().copied().min_by_key(|c| {
            let src = &sources[c.source];
            (!src.user, c.kind == ClaimKind::Corner, src.slot)
        })
    };

    let mut slots: [Slot; 4] = Default::default();
    let (n, w) = (winner(Edge::N), winner(Edge::W));
    if let (Some(n), Some(w)) = (n, w)
        && n.kind == ClaimKind::Corner
        && w.kind == ClaimKind::Corner
        && n.source == w.source
        && claims[Edge::N.index()].len() == 1
        && claims[Edge::W.index()].len() == 1
    {
        let tile = corner_grime(sources[n.source].class);
        slots[Edge::N.index()] = Slot::entry(grime, tile.offset(), Rotation::R0);
        return slots;
    }

    for edge in Edge::ALL {
        let Some(claim) = winner(edge) else {
            continue;
        };
        let class = sources[claim.source].class;
        let (tile, rotation) = match claim.kind {
            ClaimKind::Post => (post_grime(class), Rotation::R0),
            // A corner that lost its partner edge draws straight grime.
            ClaimKind::Straight | ClaimKind::Corner => {
                let (facing, rotation) = edge.art();
                (straight_grime(facing, class), rotation)
            }
        };
        slots[edge.index()] = Slot::entry(grime, tile.offset(), rotation);
    }
    slots
}

fn straight_grime(facing: Facing, class: WallClass) -> GrimeWallTile {
    use GrimeWallTile::*;
    let west = facing == Facing::West;
    let pick = |w: GrimeWallTile, n: GrimeWallTile| if west { w } else { n };
    match (class.opening, class.style) {
        (WallOpening::Door, _) => pick(WestDoor, NorthDoor),
        (WallOpening::Window, _) => pick(WestWindow, NorthWindow),
        (WallOpening::None, GrimeStyle::Trim) => pick(WestTrim, NorthTrim),
        (WallOpening::None, GrimeStyle::DoubleLeft) => pick(WestDoubleLeft, NorthDoubleLeft),
        (WallOpening::None, GrimeStyle::DoubleRight) => pick(WestDoubleRight, NorthDoubleRight),
        (WallOpening::None, GrimeStyle::Plain) => pick(West, North),
    }
}

fn corner_grime(class: WallClass) -> GrimeWallTile {
    if class.style == GrimeStyle::Trim {
        GrimeWallTile::NorthWestTrim
    } else {
        GrimeWallTile::NorthWest
    }
}

fn post_grime(class: WallClass) -> GrimeWallTile {
    if class.style == GrimeStyle::Trim {
        GrimeWallTile::SouthEastTrim
    } else {
        GrimeWallTile::SouthEast
    }
}

// ---------------------------------------------------------------------------
// Floor grime
// ---------------------------------------------------------------------------

fn floor_grime_slots(
    ctx: &Context<'_>,
    cells: &[CompositedCell],
    cell: &CompositedCell,
    x: i32,
    y: i32,
    grime: EntryId,
) -> [Slot; 4] {
    let walled = Edge::ALL.map(|edge| {
        cell.edge(edge).has_wall()
            || ctx
                .neighbor(cells, x, y, edge)
                .is_some_and(|n| n.edge(edge.opposite()).has_wall())
    });
    let [n, w, e, s] = walled;
    let slot = |tile: GrimeFloorTile| Slot::entry(grime, tile.offset(), Rotation::R0);

    let mut slots: [Slot; 4] = Default::default();
    if n && w {
        slots[0] = slot(GrimeFloorTile::NorthWest);
    } else {
        if n {
            slots[0] = slot(GrimeFloorTile::North);
        }
        if w {
            slots[1] = slot(GrimeFloorTile::West);
        }
    }
    if e && s {
        slots[2] = slot(GrimeFloorTile::SouthEast);
    } else {
        if e {
            slots[2] = slot(GrimeFloorTile::East);
        }
        if s {
            slots[3] = slot(GrimeFloorTile::South);
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(shape: WallShape, opening: WallOpening, style: GrimeStyle) -> WallClass {
        WallClass {
            shape,
            opening,
            style,
        }
    }

    #[test]
    fn openings_beat_styles() {
        let c = class(WallShape::West, WallOpening::Window, GrimeStyle::Trim);
        assert_eq!(straight_grime(Facing::West, c), GrimeWallTile::WestWindow);
        let c = class(WallShape::North, WallOpening::None, GrimeStyle::DoubleRight);
        assert_eq!(straight_grime(Facing::North, c), GrimeWallTile::NorthDoubleRight);
    }

    #[test]
    fn corner_and_post_trim_variants() {
        let trim = class(WallShape::NorthWest, WallOpening::None, GrimeStyle::Trim);
        assert_eq!(corner_grime(trim), GrimeWallTile::NorthWestTrim);
        let plain = class(WallShape::SouthEast, WallOpening::None, GrimeStyle::Plain);
        assert_eq!(post_grime(plain), GrimeWallTile::SouthEast);
    }
}
