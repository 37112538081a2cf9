use chrono::{DateTime, Utc};
use std::env;
use tripreplay_core::state::derive_trip_state;
use tripreplay_core::triplog::{load_trip_log, TripId};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: inspect_trip <trip_log.json> <rfc3339 time>");
        return;
    }

    let path = &args[1];
    let sim_time = match DateTime::parse_from_rfc3339(&args[2]) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            eprintln!("Invalid time '{}': {}", args[2], e);
            std::process::exit(1);
        }
    };
    println!("Inspecting: {} at {}", path, sim_time);

    match load_trip_log(path) {
        Ok(log) => {
            println!("Events: {}", log.len());
            println!("Planned distance: {} km", log.planned_distance_km());
            println!("Window: {:?} .. {:?}", log.start_time(), log.end_time());

            let state = derive_trip_state(Some(&log), sim_time, TripId(1), "");
            println!("\nStatus: {}", state.status);
            println!("Progress: {:.1}%", state.progress);
            println!("Speed: {} km/h", state.speed_kmh);
            println!("Position: {:?}", state.position);
            println!("Path points: {}", state.path.len());
            println!("Alerts: {:?}", state.alert_labels());

            println!("\nRecent events:");
            for event in &state.recent_events {
                println!("  - {:?} {}", event.timestamp, event.event_type.as_str());
            }
        }
        Err(e) => {
            eprintln!("Failed to load trip log: {}", e);
            std::process::exit(1);
        }
    }
}
