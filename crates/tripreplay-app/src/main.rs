//! TripReplay headless runner
//!
//! Plays a fleet back in real time and writes every snapshot to stdout as
//! one JSON line. Logs go to stderr (`RUST_LOG`, default `info`).
//!
//! A fleet with no usable trip data is not fatal: the snapshot carries
//! `dataError: true` and time stays put until interrupted. With
//! `--until-end` the runner exits after that first snapshot.

mod args;

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tripreplay_core::clock::PlaybackClock;
use tripreplay_core::config::ReplayConfig;
use tripreplay_core::demo::DemoGenerator;
use tripreplay_core::driver::PlaybackDriver;
use tripreplay_core::replay::{ReplaySession, ReplaySnapshot};

use args::{Args, USAGE};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn build_session(args: &Args) -> Result<ReplaySession> {
    let config = match &args.config {
        Some(path) => ReplayConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReplayConfig::default(),
    };

    let mut session = if args.demo {
        let trips = DemoGenerator::new(args.seed, config.start_time).generate_fleet();
        let end = trips
            .iter()
            .filter_map(|t| t.log.as_ref()?.end_time())
            .max()
            .unwrap_or(config.max_time);
        tracing::info!("Generated demo fleet of {} trips (seed {})", trips.len(), args.seed);
        ReplaySession::new(trips, PlaybackClock::new(config.start_time, end))
    } else {
        ReplaySession::new(config.load_fleet(), config.build_clock())
    };

    if let Some(speed) = args.speed {
        session.set_speed(speed);
    }
    Ok(session)
}

/// Whether `--until-end` playback is finished: the end was reached, or
/// the fleet has no usable data so time can never advance
fn playback_finished(args: &Args, snapshot: &ReplaySnapshot, max_time: DateTime<Utc>) -> bool {
    args.until_end && (snapshot.data_error || snapshot.sim_time >= max_time)
}

fn emit(out: &mut impl Write, snapshot: &ReplaySnapshot) -> Result<()> {
    serde_json::to_writer(&mut *out, snapshot)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = Args::parse(std::env::args().skip(1)).context(USAGE)?;
    let session = build_session(&args)?;
    let mut stdout = std::io::stdout().lock();

    let max_time = session.clock().max_time();
    let initial = session.snapshot();
    emit(&mut stdout, &initial)?;
    if initial.data_error {
        tracing::warn!("No valid trip data; check the trip log files and reload");
    }
    if playback_finished(&args, &initial, max_time) {
        return Ok(());
    }

    let mut driver = PlaybackDriver::new(session);
    let mut updates = driver.subscribe();
    updates.borrow_and_update();
    driver.play().await;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                emit(&mut stdout, &snapshot)?;
                if playback_finished(&args, &snapshot, max_time) {
                    tracing::info!("Reached end of playback at {}", snapshot.sim_time);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    driver.pause().await;
    Ok(())
}
