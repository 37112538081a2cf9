//! Replay configuration
//!
//! Describes the fleet to load and the simulated time window. Stored as
//! JSON; every field has a default matching the recorded five-trip fleet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::{default_max_time, default_start_time, PlaybackClock, PlaybackSpeed};
use crate::error::{ReplayError, Result};
use crate::triplog::{load_trip_log, Trip, TripId};

/// One trip entry in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripConfig {
    /// Trip identifier
    pub id: TripId,
    /// Display name
    pub name: String,
    /// Display color
    #[serde(default)]
    pub color: String,
    /// Display icon
    #[serde(default)]
    pub icon: String,
    /// Log file, relative to the data directory
    pub file: PathBuf,
}

impl TripConfig {
    fn new(id: u32, name: &str, color: &str, icon: &str, file: &str) -> Self {
        Self {
            id: TripId(id),
            name: name.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
            file: PathBuf::from(file),
        }
    }
}

fn default_trips() -> Vec<TripConfig> {
    vec![
        TripConfig::new(1, "Cross-Country Long Haul", "#1976d2", "🚛", "trip_1_cross_country.json"),
        TripConfig::new(2, "Urban Dense Delivery", "#f50057", "📦", "trip_2_urban_dense.json"),
        TripConfig::new(3, "Mountain Route Cancelled", "#d32f2f", "⛰️", "trip_3_mountain_cancelled.json"),
        TripConfig::new(4, "Southern Technical Issues", "#ed6c02", "🔧", "trip_4_southern_technical.json"),
        TripConfig::new(5, "Regional Logistics", "#2196f3", "🛣️", "trip_5_regional_logistics.json"),
    ]
}

/// Playback and fleet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Simulated start instant
    pub start_time: DateTime<Utc>,
    /// Simulated time never advances past this instant
    pub max_time: DateTime<Utc>,
    /// Speed when playback starts
    pub initial_speed: PlaybackSpeed,
    /// Directory holding the trip log files
    pub data_dir: PathBuf,
    /// Trips to load
    pub trips: Vec<TripConfig>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            max_time: default_max_time(),
            initial_speed: PlaybackSpeed::X1,
            data_dir: PathBuf::from("data"),
            trips: default_trips(),
        }
    }
}

impl ReplayConfig {
    /// Load configuration from a JSON file.
    ///
    /// A relative `data_dir` is resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ReplayConfig =
            serde_json::from_str(&content).map_err(|source| ReplayError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the time window and trip ids
    pub fn validate(&self) -> Result<()> {
        if self.max_time < self.start_time {
            return Err(ReplayError::InvalidConfig(format!(
                "max_time {} precedes start_time {}",
                self.max_time, self.start_time
            )));
        }

        let mut seen = HashSet::new();
        for trip in &self.trips {
            if !seen.insert(trip.id) {
                return Err(ReplayError::InvalidConfig(format!(
                    "duplicate trip id {}",
                    trip.id
                )));
            }
        }
        Ok(())
    }

    /// Paused clock over the configured window at the initial speed
    pub fn build_clock(&self) -> PlaybackClock {
        let mut clock = PlaybackClock::new(self.start_time, self.max_time);
        clock.set_speed(self.initial_speed);
        clock
    }

    /// Load every configured trip.
    ///
    /// A log that cannot be read leaves the trip without a log, which
    /// derives to the `error` status rather than failing the fleet.
    pub fn load_fleet(&self) -> Vec<Trip> {
        let trips: Vec<Trip> = self
            .trips
            .iter()
            .map(|tc| {
                let log = match load_trip_log(self.data_dir.join(&tc.file)) {
                    Ok(log) => Some(log),
                    Err(e) => {
                        tracing::warn!("Trip {} ({}) unavailable: {}", tc.id, tc.name, e);
                        None
                    }
                };
                Trip::new(tc.id, tc.name.clone(), log)
                    .with_color(tc.color.clone())
                    .with_icon(tc.icon.clone())
            })
            .collect();

        let loaded = trips.iter().filter(|t| t.log.is_some()).count();
        tracing::info!("Loaded {}/{} trip logs from {}", loaded, trips.len(), self.data_dir.display());
        trips
    }
}
