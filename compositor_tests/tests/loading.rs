// JSON loading of the compositor inputs, as the `compose` binary does it,
// and model checks run before composition.

use building_compositor::compose_building;
use building_compositor::config::CompositorConfig;
use building_compositor::geometry::{Point, Rect};
use building_compositor::model::Building;
use building_compositor::object::BuildingObject;
use building_compositor::properties::TilePropertyDb;
use building_compositor::tiles::{TileCatalog, TileRef};
use building_compositor::types::{Direction, RoomId};
use building_compositor::user_tiles::UserTile;
use compositor_tests::*;

fn furnished() -> Building {
    let (mut b, _) = single_room(5, 4, Rect::new(0, 0, 4, 3));
    b.floors[0].add_object(BuildingObject::door(Point::new(2, 3), Direction::N, DOOR, FRAME));
    b.floors[0].add_object(BuildingObject::window(
        Point::new(0, 1),
        Direction::W,
        WINDOW,
        CURTAINS,
        SHUTTERS,
    ));
    b
}

#[test]
fn loaded_inputs_compose_like_the_originals() {
    let b = furnished();
    let building = Building::from_json(&b.to_json().unwrap()).unwrap();
    let catalog = TileCatalog::from_json(&serde_json::to_string(&catalog()).unwrap()).unwrap();
    let props = TilePropertyDb::from_json(&serde_json::to_string(&properties()).unwrap()).unwrap();

    assert_eq!(building, b);
    let config = CompositorConfig::sequential();
    assert_eq!(
        compose_building(&building, &catalog, &props, &config),
        compose(&b)
    );
}

#[test]
fn validate_accepts_fixture_buildings() {
    assert_eq!(furnished().validate(), Ok(()));
}

#[test]
fn validate_rejects_dangling_room() {
    let mut b = furnished();
    b.floors[0].set_room_at(4, 3, Some(RoomId(99)));
    let err = b.validate().unwrap_err();
    assert!(err.contains("missing room 99"), "{err}");
}

#[test]
fn validate_rejects_mismatched_floor() {
    let mut b = furnished();
    b.floors[0].width = 3;
    assert!(b.validate().is_err());
}

#[test]
fn flipping_a_floor_twice_restores_its_composition() {
    let b = furnished();
    let mut flipped = b.clone();
    flipped.floors[0].flip_horizontal();
    assert_ne!(compose(&flipped), compose(&b));
    flipped.floors[0].flip_horizontal();
    assert_eq!(compose(&flipped), compose(&b));
}

#[test]
fn truncated_dense_layer_is_rejected_on_load() {
    let mut b = furnished();
    let painted = UserTile::new(TileRef::new(EXTERIOR_TILESET, 0));
    let grid = b.floors[0].user_grid_mut("Wall");
    grid.replace_rect(Rect::new(0, 0, 5, 2), Some(&painted));
    assert!(grid.is_dense());

    let mut json: serde_json::Value = serde_json::from_str(&b.to_json().unwrap()).unwrap();
    let cells = json["floors"][0]["user_tiles"]["Wall"]["storage"]["Dense"]
        .as_array_mut()
        .unwrap();
    cells.truncate(3);
    let err = Building::from_json(&json.to_string()).unwrap_err();
    assert!(err.to_string().contains("expected 20"), "{err}");
}

#[test]
fn stale_layer_count_is_recomputed_on_load() {
    let mut b = furnished();
    let painted = UserTile::new(TileRef::new(EXTERIOR_TILESET, 0));
    b.floors[0].user_grid_mut("Wall").set_at(1, 1, Some(painted));

    let mut json: serde_json::Value = serde_json::from_str(&b.to_json().unwrap()).unwrap();
    json["floors"][0]["user_tiles"]["Wall"]["count"] = serde_json::json!(0);
    let mut loaded = Building::from_json(&json.to_string()).unwrap();
    assert_eq!(loaded, b);
    loaded.floors[0].user_grid_mut("Wall").set_at(1, 1, None);
    assert!(loaded.floors[0].user_grid("Wall").unwrap().is_empty());
}
