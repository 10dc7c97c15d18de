// Benchmarks for floor composition.
//
// Builds square test buildings of several sizes divided into 8x8 rooms with
// a door and a window per room, then composes the ground floor with the
// sequential and the rayon paths.

use building_compositor::compose_floor;
use building_compositor::config::CompositorConfig;
use building_compositor::geometry::{Point, Rect};
use building_compositor::model::{Building, Room};
use building_compositor::object::BuildingObject;
use building_compositor::properties::TilePropertyDb;
use building_compositor::tiles::{EntryId, TileCatalog, TileEntry};
use building_compositor::types::Direction;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

const ROOM: i32 = 8;

fn catalog() -> TileCatalog {
    let mut c = TileCatalog::new();
    c.add(TileEntry::new("exterior", "Walls").with_run("walls_ext", 0, 8));
    c.add(TileEntry::new("interior", "Walls").with_run("walls_int", 0, 8));
    c.add(TileEntry::new("floor", "Floors").with_run("floors", 0, 1));
    c.add(TileEntry::new("door", "Doors").with_run("doors", 0, 4));
    c.add(TileEntry::new("frame", "Frames").with_run("frames", 0, 4));
    c.add(TileEntry::new("window", "Windows").with_run("windows", 0, 4));
    c
}

fn building(size: i32) -> Building {
    let mut b = Building::new(size, size);
    b.tiles.exterior_wall = EntryId(1);
    let rooms: Vec<_> = (0..4)
        .map(|i| {
            b.add_room(Room {
                interior_wall: EntryId(2),
                floor: EntryId(3),
                ..Room::new(format!("room{i}"))
            })
        })
        .collect();
    let floor = b.add_floor();
    let mut i = 0;
    for y in (0..size).step_by(ROOM as usize) {
        for x in (0..size).step_by(ROOM as usize) {
            floor.fill_rect(Rect::new(x, y, ROOM, ROOM), Some(rooms[i % rooms.len()]));
            floor.add_object(BuildingObject::door(
                Point::new(x + 2, y),
                Direction::N,
                EntryId(4),
                EntryId(5),
            ));
            floor.add_object(BuildingObject::window(
                Point::new(x, y + 3),
                Direction::W,
                EntryId(6),
                EntryId::NONE,
                EntryId::NONE,
            ));
            i += 1;
        }
    }
    b
}

fn bench_compose(c: &mut Criterion) {
    let catalog = catalog();
    let props = TilePropertyDb::new();
    let mut group = c.benchmark_group("compose_floor");
    for size in [32, 64, 128] {
        let b = building(size);
        group.throughput(Throughput::Elements((size * size) as u64));
        for (name, config) in [
            ("sequential", CompositorConfig::sequential()),
            (
                "parallel",
                CompositorConfig {
                    parallel_min_cells: 1,
                    ..CompositorConfig::default()
                },
            ),
        ] {
            group.bench_function(BenchmarkId::new(name, size), |bench| {
                bench.iter(|| {
                    black_box(compose_floor(
                        &b,
                        &b.floors[0],
                        None,
                        &catalog,
                        &props,
                        &config,
                    ))
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compose);
criterion_main!(benches);
