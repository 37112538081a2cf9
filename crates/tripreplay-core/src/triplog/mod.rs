//! Trip Logs
//!
//! Immutable, chronologically ordered event histories for recorded trips.
//!
//! Events are parsed leniently: a log element that is not an object, or
//! whose fields carry the wrong JSON type, still occupies its slot in the
//! log but has no timestamp, so the time filter never includes it.

mod event;
mod loader;

pub use event::{Event, EventType, FieldName, Location, DISTANCE_FIELDS};
pub use loader::load_trip_log;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a tracked trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub u32);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TripId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Ordered event history for one trip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripLog {
    events: Vec<Event>,
}

impl TripLog {
    /// Create a log from already parsed events
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Build a log from a JSON value.
    ///
    /// Returns `None` when the value is not an array. Individual elements
    /// never cause a failure.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        Some(Self {
            events: items.iter().map(Event::from_value).collect(),
        })
    }

    /// Number of events, including ones without a usable timestamp
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Planned distance for the whole trip, read from the first event only
    pub fn planned_distance_km(&self) -> f64 {
        self.events
            .first()
            .and_then(|e| e.planned_distance_km)
            .unwrap_or(0.0)
    }

    /// Timestamp of the earliest event that has one
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.events.iter().filter_map(|e| e.timestamp).min()
    }

    /// Timestamp of the latest event that has one
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.events.iter().filter_map(|e| e.timestamp).max()
    }

    /// Events whose timestamp is at or before `sim_time`, in log order.
    ///
    /// Every event is checked; the log is not assumed to stop matching at
    /// the first later timestamp.
    pub fn events_until(&self, sim_time: DateTime<Utc>) -> impl Iterator<Item = &Event> {
        self.events
            .iter()
            .filter(move |e| e.timestamp.is_some_and(|ts| ts <= sim_time))
    }
}

impl FromIterator<Event> for TripLog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A tracked trip: display metadata plus its event log.
///
/// `log` is `None` when the trip's data could not be read or was not a
/// sequence of events.
#[derive(Debug, Clone)]
pub struct Trip {
    /// Trip identifier
    pub id: TripId,
    /// Display name
    pub name: String,
    /// Display color tag, passed through to trip states
    pub color: String,
    /// Display icon
    pub icon: String,
    /// Event log
    pub log: Option<TripLog>,
}

impl Trip {
    /// Create a trip with the given log
    pub fn new(id: TripId, name: impl Into<String>, log: Option<TripLog>) -> Self {
        Self {
            id,
            name: name.into(),
            color: String::new(),
            icon: String::new(),
            log,
        }
    }

    /// Set the display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the display icon
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Planned distance of this trip, 0 when the log is missing
    pub fn planned_distance_km(&self) -> f64 {
        self.log
            .as_ref()
            .map(TripLog::planned_distance_km)
            .unwrap_or(0.0)
    }
}
