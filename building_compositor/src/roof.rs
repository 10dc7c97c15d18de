// Roof decomposition: a `RoofObject` footprint into slope, corner, cap and
// flat-top tiles.
//
// Every footprint cell is classified by its distance (in cells) from the
// roof's eave edge(s):
//
// - Single slopes (SlopeW/N/E/S) have one eave. Cells within `band` rows of
//   it are slope rows, the rest is flat top.
// - Peaks (PeakWE/PeakNS) have eaves on both sides; each cell takes the
//   nearer one and the band is clamped to half the span so the two slopes
//   meet at the ridge.
// - Corners name the corner where their two eaves meet. Outer corners use
//   the smaller of the two distances, inner corners the larger. Cells on
//   the diagonal (equal distances) get the corner tile.
// - FlatTop is flat everywhere.
//
// `band` is the depth rounded up to whole rows. With an odd number of half
// steps the innermost row is a half row (the `Pt5` art).
//
// Caps are emitted only on edges whose `capped_*` flag is set. A cap on the
// W or N edge sits on the edge cell itself; a cap on the E or S edge sits one
// cell outside the footprint, where the gable face is drawn. Slope rows that
// run into a capped edge get a gable cap for their row; flat cells on a
// capped edge get a flat-edge cap (`FlatW` on vertical edges, `FlatN` on
// horizontal ones) unless the roof has zero depth.
//
// See also: `object.rs` for `RoofObject`, `compositor.rs` phase 10 which
// writes the layout and defers max-depth flat tops, `carry.rs`.

use crate::geometry::{Point, Rect, Region};
use crate::object::{RoofDepth, RoofObject, RoofType};
use crate::tiles::{RoofCapTile, RoofRow, RoofSlopeTile, RoofTopTile};
use crate::types::{Edge, Facing};

/// Tiles produced by one roof, in floor coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoofLayout {
    pub slopes: Vec<(Point, RoofSlopeTile)>,
    pub caps: Vec<(Point, RoofCapTile)>,
    pub flat: Region,
    pub top: RoofTopTile,
}

/// What one footprint cell is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Piece {
    Slope { eave: Edge, row: RoofRow },
    Inner(u8),
    Outer(u8),
    Flat,
}

/// Distances from a footprint cell to each side of the footprint.
#[derive(Clone, Copy)]
struct Distances {
    w: i32,
    n: i32,
    e: i32,
    s: i32,
}

impl Distances {
    fn to(self, edge: Edge) -> i32 {
        match edge {
            Edge::W => self.w,
            Edge::N => self.n,
            Edge::E => self.e,
            Edge::S => self.s,
        }
    }
}

fn row(depth: RoofDepth, k: i32) -> RoofRow {
    RoofRow {
        level: k as u8,
        half: k >= depth.whole_levels() as i32,
    }
}

fn corner_eaves(roof_type: RoofType) -> Option<(Edge, Edge, bool)> {
    use RoofType::*;
    let (a, b, inner) = match roof_type {
        CornerInnerSW => (Edge::S, Edge::W, true),
        CornerInnerNW => (Edge::N, Edge::W, true),
        CornerInnerNE => (Edge::N, Edge::E, true),
        CornerInnerSE => (Edge::S, Edge::E, true),
        CornerOuterSW => (Edge::S, Edge::W, false),
        CornerOuterNW => (Edge::N, Edge::W, false),
        CornerOuterNE => (Edge::N, Edge::E, false),
        CornerOuterSE => (Edge::S, Edge::E, false),
        _ => return None,
    };
    Some((a, b, inner))
}

/// Slope band thickness in rows, after clamping peaks to half their span.
pub fn band_rows(roof: &RoofObject) -> i32 {
    let band = roof.depth.band_rows();
    match roof.roof_type {
        RoofType::PeakWE => band.min(roof.width / 2),
        RoofType::PeakNS => band.min(roof.height / 2),
        RoofType::FlatTop => 0,
        _ => band,
    }
}

fn piece(roof: &RoofObject, band: i32, d: Distances) -> Piece {
    let slope = |eave: Edge, k: i32| {
        if k < band {
            Piece::Slope {
                eave,
                row: row(roof.depth, k),
            }
        } else {
            Piece::Flat
        }
    };
    match roof.roof_type {
        RoofType::SlopeW => slope(Edge::W, d.w),
        RoofType::SlopeN => slope(Edge::N, d.n),
        RoofType::SlopeE => slope(Edge::E, d.e),
        RoofType::SlopeS => slope(Edge::S, d.s),
        RoofType::PeakWE if d.w <= d.e => slope(Edge::W, d.w),
        RoofType::PeakWE => slope(Edge::E, d.e),
        RoofType::PeakNS if d.n <= d.s => slope(Edge::N, d.n),
        RoofType::PeakNS => slope(Edge::S, d.s),
        RoofType::FlatTop => Piece::Flat,
        corner => {
            let Some((a, b, inner)) = corner_eaves(corner) else {
                return Piece::Flat;
            };
            let (da, db) = (d.to(a), d.to(b));
            let k = if inner { da.max(db) } else { da.min(db) };
            if k >= band {
                Piece::Flat
            } else if da == db {
                if inner {
                    Piece::Inner(k as u8)
                } else {
                    Piece::Outer(k as u8)
                }
            } else if (da < db) != inner {
                slope(a, da)
            } else {
                slope(b, db)
            }
        }
    }
}

/// Art family of the flat top.
fn top_facing(roof_type: RoofType) -> Facing {
    match roof_type {
        RoofType::SlopeN | RoofType::SlopeS | RoofType::PeakNS => Facing::North,
        _ => Facing::West,
    }
}

/// Decompose a roof anchored at `pos`.
pub fn layout(pos: Point, roof: &RoofObject) -> RoofLayout {
    let (w, h) = (roof.width.max(0), roof.height.max(0));
    let band = band_rows(roof);
    let piece_at = |dx: i32, dy: i32| {
        piece(
            roof,
            band,
            Distances {
                w: dx,
                n: dy,
                e: w - 1 - dx,
                s: h - 1 - dy,
            },
        )
    };

    let mut slopes = Vec::new();
    let mut flat = Region::new();
    for dy in 0..h {
        // Flat cells are gathered as horizontal runs.
        let mut run_start: Option<i32> = None;
        for dx in 0..=w {
            let p = if dx < w { Some(piece_at(dx, dy)) } else { None };
            match p {
                Some(Piece::Flat) => {
                    run_start.get_or_insert(dx);
                }
                other => {
                    if let Some(start) = run_start.take() {
                        flat.add_rect(Rect::new(pos.x + start, pos.y + dy, dx - start, 1));
                    }
                    let tile = match other {
                        Some(Piece::Slope { eave, row }) => Some(RoofSlopeTile::slope(eave, row)),
                        Some(Piece::Inner(level)) => Some(RoofSlopeTile::inner(level)),
                        Some(Piece::Outer(level)) => Some(RoofSlopeTile::outer(level)),
                        _ => None,
                    };
                    if let Some(tile) = tile {
                        slopes.push((pos.offset(dx, dy), tile));
                    }
                }
            }
        }
    }

    let mut caps = Vec::new();
    let flat_caps = roof.depth > RoofDepth::Zero;
    let mut cap_edge = |cells: &mut dyn Iterator<Item = (i32, i32)>, edge: Edge, outside: (i32, i32)| {
        for (dx, dy) in cells {
            let cap = match piece_at(dx, dy) {
                // Gables close slopes that run into this edge.
                Piece::Slope { eave, row } if eave.is_vertical() != edge.is_vertical() => {
                    Some(RoofCapTile::gable(eave, row))
                }
                Piece::Flat if flat_caps => Some(RoofCapTile::flat(edge.is_vertical())),
                _ => None,
            };
            if let Some(cap) = cap {
                caps.push((pos.offset(dx + outside.0, dy + outside.1), cap));
            }
        }
    };
    if w > 0 && h > 0 {
        if roof.capped_w {
            cap_edge(&mut (0..h).map(|dy| (0, dy)), Edge::W, (0, 0));
        }
        if roof.capped_n {
            cap_edge(&mut (0..w).map(|dx| (dx, 0)), Edge::N, (0, 0));
        }
        if roof.capped_e {
            cap_edge(&mut (0..h).map(|dy| (w - 1, dy)), Edge::E, (1, 0));
        }
        if roof.capped_s {
            cap_edge(&mut (0..w).map(|dx| (dx, h - 1)), Edge::S, (0, 1));
        }
    }

    RoofLayout {
        slopes,
        caps,
        flat,
        top: RoofTopTile::new(top_facing(roof.roof_type), roof.depth.band_rows() as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(level: u8) -> RoofRow {
        RoofRow { level, half: false }
    }

    #[test]
    fn slope_s_band_and_flat_top() {
        let roof = RoofObject::new(2, 5, RoofType::SlopeS, RoofDepth::Two);
        let l = layout(Point::new(0, 0), &roof);
        // Rows 4 and 3 from the bottom are the band.
        assert_eq!(l.slopes.len(), 4);
        assert!(l.slopes.contains(&(Point::new(0, 4), RoofSlopeTile::slope(Edge::S, full(0)))));
        assert!(l.slopes.contains(&(Point::new(1, 3), RoofSlopeTile::slope(Edge::S, full(1)))));
        assert_eq!(l.flat.bounding_rect(), Rect::new(0, 0, 2, 3));
        assert_eq!(l.top, RoofTopTile::North2);
        assert!(l.caps.is_empty());
    }

    #[test]
    fn odd_depth_ends_with_half_row() {
        let roof = RoofObject::new(1, 4, RoofType::SlopeN, RoofDepth::OnePoint5);
        let l = layout(Point::new(0, 0), &roof);
        assert_eq!(
            l.slopes,
            vec![
                (Point::new(0, 0), RoofSlopeTile::SlopeN1),
                (Point::new(0, 1), RoofSlopeTile::SlopeNOnePt5),
            ]
        );
    }

    #[test]
    fn peak_clamps_band_to_half_span() {
        let roof = RoofObject::new(4, 1, RoofType::PeakWE, RoofDepth::Three);
        let l = layout(Point::new(0, 0), &roof);
        assert_eq!(band_rows(&roof), 2);
        assert!(l.flat.is_empty());
        let tiles: Vec<_> = l.slopes.iter().map(|(_, t)| *t).collect();
        assert_eq!(
            tiles,
            vec![
                RoofSlopeTile::SlopeW1,
                RoofSlopeTile::SlopeW2,
                RoofSlopeTile::SlopeE2,
                RoofSlopeTile::SlopeE1,
            ]
        );
    }

    #[test]
    fn flat_top_level_follows_roof_depth() {
        let deep = RoofObject::new(3, 3, RoofType::FlatTop, RoofDepth::Three);
        assert_eq!(layout(Point::new(0, 0), &deep).top, RoofTopTile::West3);
        let half = RoofObject::new(3, 3, RoofType::FlatTop, RoofDepth::Point5);
        assert_eq!(layout(Point::new(0, 0), &half).top, RoofTopTile::West1);
        // The slope band clamps to half the span; the top keeps the full depth.
        let narrow = RoofObject::new(6, 2, RoofType::PeakNS, RoofDepth::Three);
        assert_eq!(band_rows(&narrow), 1);
        assert_eq!(layout(Point::new(0, 0), &narrow).top, RoofTopTile::North3);
    }

    #[test]
    fn outer_corner_diagonal_gets_corner_tiles() {
        let roof = RoofObject::new(3, 3, RoofType::CornerOuterSW, RoofDepth::Two);
        let l = layout(Point::new(0, 0), &roof);
        let at = |x, y| {
            l.slopes
                .iter()
                .find(|(p, _)| *p == Point::new(x, y))
                .map(|(_, t)| *t)
        };
        assert_eq!(at(0, 2), Some(RoofSlopeTile::Outer1));
        assert_eq!(at(1, 1), Some(RoofSlopeTile::Outer2));
        assert_eq!(at(2, 2), Some(RoofSlopeTile::SlopeS1));
        assert_eq!(at(0, 0), Some(RoofSlopeTile::SlopeW1));
        assert_eq!(at(2, 0), None);
        assert!(l.flat.contains(Point::new(2, 0)));
    }

    #[test]
    fn inner_corner_flat_region_is_l_shaped() {
        let roof = RoofObject::new(4, 4, RoofType::CornerInnerSW, RoofDepth::One);
        let l = layout(Point::new(0, 0), &roof);
        // Only the SW cell is within one row of both eaves.
        assert_eq!(l.slopes, vec![(Point::new(0, 3), RoofSlopeTile::Inner1)]);
        assert!(l.flat.contains(Point::new(0, 0)));
        assert!(l.flat.contains(Point::new(3, 3)));
    }

    #[test]
    fn caps_only_on_flagged_edges() {
        let roof = RoofObject::new(3, 2, RoofType::SlopeS, RoofDepth::One).with_caps(false, false, true, false);
        let l = layout(Point::new(5, 5), &roof);
        // East edge: flat row then the slope row, one cell outside.
        assert_eq!(
            l.caps,
            vec![
                (Point::new(8, 5), RoofCapTile::FlatW),
                (Point::new(8, 6), RoofCapTile::CapS1),
            ]
        );
    }

    #[test]
    fn zero_depth_has_no_flat_caps() {
        let roof = RoofObject::new(2, 2, RoofType::FlatTop, RoofDepth::Zero).with_caps(true, true, true, true);
        let l = layout(Point::new(0, 0), &roof);
        assert!(l.caps.is_empty());
        assert_eq!(l.flat.bounding_rect(), Rect::new(0, 0, 2, 2));
    }
}
