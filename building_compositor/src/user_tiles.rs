// Per-layer grid of user-painted tile overrides.
//
// Each floor keeps one `UserTileGrid` per named layer ("Wall", "Wall2",
// "Floor", ...). Most layers are nearly empty, so cells start out in a
// sparse `FxHashMap` keyed by flat index `x + y * width`. Once more than a
// third of the cells are occupied the grid switches to a dense
// `Vec<Option<UserTile>>` for O(1) access. The switch is one-way (only
// `clear()` returns to sparse) and has no observable effect on reads.
//
// Out-of-range reads return `None`; out-of-range writes are no-ops, the same
// clamping rule the composited grid uses.
//
// See also: `model.rs` where floors own these grids, `compositor.rs` and
// `grime.rs` which read the wall layers.

use crate::geometry::{Point, Rect, Region};
use crate::tiles::TileRef;
use crate::types::Rotation;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One painted cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserTile {
    pub tile: TileRef,
    #[serde(default)]
    pub rotation: Rotation,
}

impl UserTile {
    pub fn new(tile: TileRef) -> Self {
        Self {
            tile,
            rotation: Rotation::R0,
        }
    }

    pub fn rotated(tile: TileRef, rotation: Rotation) -> Self {
        Self { tile, rotation }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum Storage {
    Sparse(FxHashMap<usize, UserTile>),
    Dense(Vec<Option<UserTile>>),
}

/// Width x height grid of optional user tiles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridData")]
pub struct UserTileGrid {
    width: i32,
    height: i32,
    storage: Storage,
    /// Occupied cell count, kept in step with `storage`.
    count: usize,
}

/// Wire form of `UserTileGrid`, checked before it becomes a grid. A stored
/// `count` is ignored and recomputed from the cells.
#[derive(Deserialize)]
struct GridData {
    width: i32,
    height: i32,
    storage: Storage,
}

impl TryFrom<GridData> for UserTileGrid {
    type Error = String;

    fn try_from(data: GridData) -> Result<Self, String> {
        if data.width < 0 || data.height < 0 {
            return Err(format!("user tile grid size {}x{} is negative", data.width, data.height));
        }
        let total = data.width as usize * data.height as usize;
        let count = match &data.storage {
            Storage::Sparse(map) => {
                if let Some(bad) = map.keys().find(|&&i| i >= total) {
                    return Err(format!("user tile index {bad} outside {total} cells"));
                }
                map.len()
            }
            Storage::Dense(cells) => {
                if cells.len() != total {
                    return Err(format!(
                        "dense user tile grid has {} cells, expected {total}",
                        cells.len()
                    ));
                }
                cells.iter().filter(|c| c.is_some()).count()
            }
        };
        Ok(Self {
            width: data.width,
            height: data.height,
            storage: data.storage,
            count,
        })
    }
}

impl UserTileGrid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
            storage: Storage::Sparse(FxHashMap::default()),
            count: 0,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether storage has switched to the dense form. Diagnostic only.
    pub fn is_dense(&self) -> bool {
        matches!(self.storage, Storage::Dense(_))
    }

    fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            Some(x as usize + y as usize * self.width as usize)
        } else {
            None
        }
    }

    /// Read a cell. `None` for empty or out-of-range cells.
    pub fn at(&self, x: i32, y: i32) -> Option<&UserTile> {
        let i = self.index(x, y)?;
        match &self.storage {
            Storage::Sparse(map) => map.get(&i),
            Storage::Dense(cells) => cells[i].as_ref(),
        }
    }

    /// Write a cell. No-op out of range.
    pub fn set_at(&mut self, x: i32, y: i32, tile: Option<UserTile>) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let previous = match &mut self.storage {
            Storage::Sparse(map) => match tile {
                Some(t) => map.insert(i, t),
                None => map.remove(&i),
            },
            Storage::Dense(cells) => std::mem::replace(&mut cells[i], tile),
        };
        let now_occupied = self.is_occupied_index(i);
        match (previous.is_some(), now_occupied) {
            (false, true) => self.count += 1,
            (true, false) => self.count -= 1,
            _ => {}
        }
        self.maybe_densify();
    }

    fn is_occupied_index(&self, i: usize) -> bool {
        match &self.storage {
            Storage::Sparse(map) => map.contains_key(&i),
            Storage::Dense(cells) => cells[i].is_some(),
        }
    }

    fn maybe_densify(&mut self) {
        if self.count * 3 <= self.cell_count() {
            return;
        }
        let total = self.cell_count();
        let Storage::Sparse(map) = &mut self.storage else {
            return;
        };
        let mut cells = vec![None; total];
        for (i, tile) in map.drain() {
            cells[i] = Some(tile);
        }
        self.storage = Storage::Dense(cells);
    }

    /// Fill a rect (clipped to the grid) with one tile, or clear it.
    pub fn replace_rect(&mut self, rect: Rect, tile: Option<&UserTile>) {
        let clipped = rect.intersected(&self.bounds());
        for p in clipped.points() {
            self.set_at(p.x, p.y, tile.cloned());
        }
    }

    /// Copy `source` into the cells of `region`. Cell `p` of this grid takes
    /// `source` cell `p - origin`; empty source cells clear the target.
    pub fn replace_region(&mut self, region: &Region, source: &UserTileGrid, origin: Point) {
        let bounds = self.bounds();
        for rect in region.rects() {
            for p in rect.intersected(&bounds).points() {
                let tile = source.at(p.x - origin.x, p.y - origin.y).cloned();
                self.set_at(p.x, p.y, tile);
            }
        }
    }

    /// Copy all of `source` with its top-left at `origin`.
    pub fn replace_grid(&mut self, origin: Point, source: &UserTileGrid) {
        let region = Region::from_rect(source.bounds().translated(origin.x, origin.y));
        self.replace_region(&region, source, origin);
    }

    /// New grid of `rect`'s size holding this grid's cells under `rect`.
    /// With a mask, cells outside the mask (in this grid's coordinates) are
    /// left empty.
    pub fn clone_rect(&self, rect: Rect, mask: Option<&Region>) -> UserTileGrid {
        let mut out = UserTileGrid::new(rect.width, rect.height);
        for p in rect.intersected(&self.bounds()).points() {
            if mask.is_some_and(|m| !m.contains(p)) {
                continue;
            }
            if let Some(tile) = self.at(p.x, p.y) {
                out.set_at(p.x - rect.x, p.y - rect.y, Some(tile.clone()));
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.storage = Storage::Sparse(FxHashMap::default());
        self.count = 0;
    }

    /// Occupied cells in row-major order.
    pub fn iter_occupied(&self) -> impl Iterator<Item = (Point, &UserTile)> + '_ {
        self.bounds()
            .points()
            .filter_map(move |p| self.at(p.x, p.y).map(|t| (p, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(i: u32) -> UserTile {
        UserTile::new(TileRef::new("walls_01", i))
    }

    #[test]
    fn deserialize_rejects_short_dense_storage() {
        let json = r#"{"width":2,"height":2,"storage":{"Dense":[]},"count":0}"#;
        let err = serde_json::from_str::<UserTileGrid>(json).unwrap_err();
        assert!(err.to_string().contains("expected 4"), "{err}");
    }

    #[test]
    fn deserialize_rejects_sparse_index_out_of_range() {
        let json = r#"{"width":2,"height":2,"storage":{"Sparse":{"4":{"tile":{"tileset":"walls_01","index":0}}}},"count":1}"#;
        assert!(serde_json::from_str::<UserTileGrid>(json).is_err());
    }

    #[test]
    fn deserialize_recounts_occupied_cells() {
        let json = r#"{"width":2,"height":1,"storage":{"Dense":[{"tile":{"tileset":"walls_01","index":3}},null]},"count":0}"#;
        let mut g: UserTileGrid = serde_json::from_str(json).unwrap();
        assert_eq!(g.count(), 1);
        g.set_at(0, 0, None);
        assert!(g.is_empty());
        assert_eq!(g.at(1, 0), None);
    }

    #[test]
    fn iter_occupied_walks_row_major() {
        let mut g = UserTileGrid::new(3, 2);
        g.set_at(2, 0, Some(tile(1)));
        g.set_at(0, 1, Some(tile(2)));
        let seen: Vec<(Point, u32)> = g.iter_occupied().map(|(p, t)| (p, t.tile.index)).collect();
        assert_eq!(seen, vec![(Point::new(2, 0), 1), (Point::new(0, 1), 2)]);
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut g = UserTileGrid::new(3, 3);
        g.set_at(-1, 0, Some(tile(0)));
        g.set_at(3, 0, Some(tile(0)));
        assert!(g.is_empty());
        assert_eq!(g.at(5, 5), None);
    }

    #[test]
    fn densifies_past_one_third() {
        let mut g = UserTileGrid::new(3, 3);
        for x in 0..3 {
            g.set_at(x, 0, Some(tile(x as u32)));
        }
        // 3 of 9 is exactly one third: still sparse.
        assert!(!g.is_dense());
        g.set_at(0, 1, Some(tile(9)));
        assert!(g.is_dense());
        assert_eq!(g.count(), 4);
        assert_eq!(g.at(2, 0), Some(&tile(2)));
        assert_eq!(g.at(0, 1), Some(&tile(9)));
        assert_eq!(g.at(1, 1), None);
    }

    #[test]
    fn reads_agree_across_storage_forms() {
        let mut sparse = UserTileGrid::new(4, 4);
        let mut dense = UserTileGrid::new(4, 4);
        dense.replace_rect(Rect::new(0, 0, 4, 4), Some(&tile(1)));
        dense.replace_rect(Rect::new(0, 0, 4, 4), None);
        assert!(dense.is_dense());
        for g in [&mut sparse, &mut dense] {
            g.set_at(1, 2, Some(tile(5)));
            g.set_at(3, 3, Some(tile(6)));
            g.set_at(3, 3, None);
        }
        assert_eq!(sparse.count(), dense.count());
        let a: Vec<_> = sparse.iter_occupied().collect();
        let b: Vec<_> = dense.iter_occupied().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn overwrite_keeps_count() {
        let mut g = UserTileGrid::new(10, 10);
        g.set_at(1, 1, Some(tile(0)));
        g.set_at(1, 1, Some(tile(1)));
        assert_eq!(g.count(), 1);
        assert_eq!(g.at(1, 1), Some(&tile(1)));
    }

    #[test]
    fn replace_rect_is_clipped() {
        let mut g = UserTileGrid::new(4, 4);
        g.replace_rect(Rect::new(2, 2, 10, 10), Some(&tile(3)));
        assert_eq!(g.count(), 4);
        assert_eq!(g.at(3, 3), Some(&tile(3)));
        assert_eq!(g.at(1, 1), None);
    }

    #[test]
    fn replace_region_copies_empties_too() {
        let mut target = UserTileGrid::new(5, 5);
        target.replace_rect(Rect::new(0, 0, 5, 5), Some(&tile(0)));
        let mut source = UserTileGrid::new(2, 2);
        source.set_at(0, 0, Some(tile(7)));
        let region = Region::from_rect(Rect::new(1, 1, 2, 2));
        target.replace_region(&region, &source, Point::new(1, 1));
        assert_eq!(target.at(1, 1), Some(&tile(7)));
        assert_eq!(target.at(2, 1), None);
        assert_eq!(target.at(2, 2), None);
        assert_eq!(target.at(3, 3), Some(&tile(0)));
        assert_eq!(target.count(), 25 - 3);
    }

    #[test]
    fn clone_rect_with_mask() {
        let mut g = UserTileGrid::new(4, 4);
        g.replace_rect(Rect::new(0, 0, 4, 4), Some(&tile(2)));
        let mask = Region::from_rect(Rect::new(1, 1, 1, 1));
        let part = g.clone_rect(Rect::new(1, 1, 2, 2), Some(&mask));
        assert_eq!((part.width(), part.height()), (2, 2));
        assert_eq!(part.count(), 1);
        assert_eq!(part.at(0, 0), Some(&tile(2)));

        let unmasked = g.clone_rect(Rect::new(3, 3, 2, 2), None);
        assert_eq!(unmasked.count(), 1);
    }

    #[test]
    fn replace_grid_places_at_origin() {
        let mut target = UserTileGrid::new(4, 4);
        let mut stamp = UserTileGrid::new(1, 2);
        stamp.set_at(0, 1, Some(tile(4)));
        target.replace_grid(Point::new(3, 2), &stamp);
        assert_eq!(target.at(3, 3), Some(&tile(4)));
        assert_eq!(target.count(), 1);
    }
}
