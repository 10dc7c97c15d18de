// building_compositor: building floors to renderable tile layers.
//
// Turns one floor of a building (a grid of room assignments plus placed
// walls, doors, windows, stairs, furniture and roofs) into a dense grid of
// resolved tile assignments organised into named sections (floor, walls,
// trims, grime, openings, furniture, roofs). A renderer maps each section to
// a drawing layer; this crate never draws, loads tilesets or touches files.
//
// Module overview:
// - `compositor.rs`: The layout compiler: `compose_floor` / `compose_building`, phases 1-15.
// - `grime.rs`:      Wall and floor grime selection (phase 16).
// - `roof.rs`:       Roof footprint decomposition into slopes, corners, caps and flat tops.
// - `cell.rs`:       `CompositedCell`, its 50 sections, slots and FIFO slot groups.
// - `carry.rs`:      `FloorCarry`, stairwells and deferred roof tops handed upward.
// - `model.rs`:      Building, floors and rooms (read-only input).
// - `object.rs`:     Placed objects as a closed `ObjectKind` sum type.
// - `user_tiles.rs`: Sparse/dense grid of user-painted tile overrides.
// - `tiles.rs`:      Tile identities, entries, the entry resolver and variant offsets.
// - `properties.rs`: Tile-property lookup and wall classification.
// - `config.rs`:     `CompositorConfig`.
// - `geometry.rs`:   Points, rects and regions.
// - `types.rs`:      Directions, edges, rotations and the edge art table.
//
// **Critical constraint: determinism.** Composition is a pure function of
// `(building, floor, carry from below, collaborators, config)`. Same inputs
// give the same grid, with or without rayon.

pub mod carry;
pub mod cell;
pub mod compositor;
pub mod config;
pub mod geometry;
mod grime;
pub mod model;
pub mod object;
pub mod properties;
pub mod roof;
pub mod tiles;
pub mod types;
pub mod user_tiles;

pub use compositor::{ComposedFloor, compose_building, compose_floor};
