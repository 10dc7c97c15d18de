// Building compositor CLI entry point.
//
// Loads a building, a tile catalog and a tile-property database from JSON,
// composes every floor bottom-up and prints how many cells occupy each
// section per floor (or the full composed grids as JSON).
//
// Usage:
//   cargo run -p building_compositor --bin compose -- building.json
//     [--catalog catalog.json] [--props props.json] [--config config.json]
//     [--level N] [--json]
//
// Missing catalog/props files mean "no entries" / "no properties": walls are
// still placed, but nothing resolves to a concrete tile and no grime is drawn.
//
// Logging goes to stderr and is filtered by `RUST_LOG` (default `warn`), e.g.
// `RUST_LOG=building_compositor=trace` shows per-floor and per-drop events.

use building_compositor::cell::Section;
use building_compositor::config::CompositorConfig;
use building_compositor::model::Building;
use building_compositor::properties::TilePropertyDb;
use building_compositor::tiles::TileCatalog;
use building_compositor::{ComposedFloor, compose_building};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(building_path) = args.get(1).filter(|s| !s.starts_with("--")) else {
        eprintln!("usage: compose <building.json> [--catalog F] [--props F] [--config F] [--level N] [--json]");
        return ExitCode::FAILURE;
    };
    let catalog_path: Option<String> = parse_flag(&args, "--catalog");
    let props_path: Option<String> = parse_flag(&args, "--props");
    let config_path: Option<String> = parse_flag(&args, "--config");
    let only_level: Option<i32> = parse_flag(&args, "--level");
    let as_json = args.iter().any(|a| a == "--json");

    match run(
        building_path,
        catalog_path.as_deref(),
        props_path.as_deref(),
        config_path.as_deref(),
        only_level,
        as_json,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    building_path: &str,
    catalog_path: Option<&str>,
    props_path: Option<&str>,
    config_path: Option<&str>,
    only_level: Option<i32>,
    as_json: bool,
) -> Result<(), String> {
    let building = Building::from_json(&read(building_path)?)
        .map_err(|e| format!("{building_path}: {e}"))?;
    building.validate()?;
    debug!(
        floors = building.floors.len(),
        rooms = building.rooms.len(),
        "loaded building"
    );

    let catalog = match catalog_path {
        Some(path) => TileCatalog::from_json(&read(path)?).map_err(|e| format!("{path}: {e}"))?,
        None => TileCatalog::new(),
    };
    debug!(entries = catalog.entries.len(), "loaded tile catalog");
    warn_dangling_entries(&building, &catalog);

    let props = match props_path {
        Some(path) => TilePropertyDb::from_json(&read(path)?).map_err(|e| format!("{path}: {e}"))?,
        None => TilePropertyDb::new(),
    };
    debug!(tiles = props.len(), "loaded tile properties");

    let config = match config_path {
        Some(path) => {
            CompositorConfig::from_json(&read(path)?).map_err(|e| format!("{path}: {e}"))?
        }
        None => CompositorConfig::default(),
    };

    let floors: Vec<ComposedFloor> = compose_building(&building, &catalog, &props, &config)
        .into_iter()
        .filter(|f| only_level.is_none_or(|level| f.level == level))
        .collect();

    if as_json {
        let json = serde_json::to_string_pretty(&floors).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    println!("=== Building {}x{} ===", building.width, building.height);
    for floor in &floors {
        print_summary(floor);
    }
    Ok(())
}

fn print_summary(floor: &ComposedFloor) {
    println!();
    println!(
        "Floor {} ({}x{} cells incl. border)",
        floor.level, floor.width, floor.height
    );
    let mut counts = [0usize; Section::COUNT];
    for cell in &floor.cells {
        for (section, _) in cell.occupied() {
            counts[section.index()] += 1;
        }
    }
    for (section, count) in Section::ALL.iter().zip(counts) {
        if count > 0 {
            println!("  {:<16} {count}", section.name());
        }
    }
    println!(
        "  stairs carried up: {}, roof tops deferred: {}",
        floor.carry.stairs.len(),
        floor.carry.flat_roofs.len()
    );
}

/// Objects naming entries the catalog lacks still compose; those tiles just
/// stay empty. Report them so a stale catalog is easy to spot.
fn warn_dangling_entries(building: &Building, catalog: &TileCatalog) {
    for floor in &building.floors {
        for (i, object) in floor.objects.iter().enumerate() {
            for entry in object.entries() {
                if !entry.is_none() && catalog.get(entry).is_none() {
                    warn!(
                        level = floor.level,
                        object = i,
                        entry = entry.0,
                        "object references a missing tile entry"
                    );
                }
            }
        }
    }
}

fn read(path: &str) -> Result<String, String> {
    std::fs::read_to_string(Path::new(path)).map_err(|e| format!("{path}: {e}"))
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
