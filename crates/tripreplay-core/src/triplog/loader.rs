//! Trip log file loading

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::TripLog;
use crate::error::{ReplayError, Result};

/// Read a trip log from a JSON file containing an array of events
pub fn load_trip_log<P: AsRef<Path>>(path: P) -> Result<TripLog> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ReplayError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let log = TripLog::from_value(&value)
        .ok_or_else(|| ReplayError::NotAnArray(path.to_path_buf()))?;
    tracing::debug!("Loaded {} events from {}", log.len(), path.display());
    Ok(log)
}
