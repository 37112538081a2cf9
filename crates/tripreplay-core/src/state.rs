//! Trip State Processor
//!
//! Derives a trip's point-in-time status from its event log and the
//! simulated time. Derivation is pure and total: every input, including a
//! missing or empty log, maps to a fully populated [`TripState`].

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::triplog::{Event, EventType, Location, TripId, TripLog};

/// Number of most recent events kept on a trip state
pub const RECENT_EVENTS_WINDOW: usize = 5;

/// Status of a trip at a given simulated time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    /// Valid data, but simulated time precedes the trip's first event
    Idle,
    /// Trip under way
    Active,
    /// Latest event is `trip_completed`
    Completed,
    /// Latest event is `trip_cancelled`
    Cancelled,
    /// Log missing, malformed or empty
    Error,
}

impl TripStatus {
    /// Status label
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Idle => "idle",
            TripStatus::Active => "active",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
            TripStatus::Error => "error",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert active on a trip at the current instant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Alert {
    /// Latest event flagged overspeed
    Overspeed,
    /// Latest event is `signal_lost`
    SignalLost,
    /// Latest event is `fuel_level_low` or flagged battery low
    LowFuelOrBattery,
    /// Trip cancelled, with the recorded reason if any
    Cancelled(Option<String>),
    /// Trip log could not be used
    DataInvalid,
}

impl Alert {
    /// Display label of the alert
    pub fn label(&self) -> &str {
        match self {
            Alert::Overspeed => "Overspeed Alert",
            Alert::SignalLost => "Signal Lost",
            Alert::LowFuelOrBattery => "Low Fuel/Battery",
            Alert::Cancelled(Some(reason)) => reason,
            Alert::Cancelled(None) => "Cancelled",
            Alert::DataInvalid => "Data Invalid",
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Alert {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Derived state of one trip at one simulated instant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripState {
    /// Trip identifier
    pub trip_id: TripId,
    /// Current status
    pub status: TripStatus,
    /// Progress percentage in [0, 100]
    pub progress: f64,
    /// Last known position
    pub position: Option<Location>,
    /// Last known instantaneous speed, 0 if unknown
    pub speed_kmh: f64,
    /// Positions visited up to the simulated time, in log order
    pub path: Vec<Location>,
    /// Alerts raised by the latest event
    pub alerts: Vec<Alert>,
    /// The last few events at or before the simulated time
    pub recent_events: Vec<Event>,
    /// Length of the whole log regardless of time
    pub total_events: usize,
    /// Display color tag, passed through unchanged
    pub color: String,
}

impl TripState {
    fn invalid(trip_id: TripId, color: &str) -> Self {
        Self {
            trip_id,
            status: TripStatus::Error,
            progress: 0.0,
            position: None,
            speed_kmh: 0.0,
            path: Vec::new(),
            alerts: vec![Alert::DataInvalid],
            recent_events: Vec::new(),
            total_events: 0,
            color: color.to_string(),
        }
    }

    fn idle(trip_id: TripId, color: &str, total_events: usize) -> Self {
        Self {
            status: TripStatus::Idle,
            alerts: Vec::new(),
            total_events,
            ..Self::invalid(trip_id, color)
        }
    }

    /// Alert labels in evaluation order
    pub fn alert_labels(&self) -> Vec<&str> {
        self.alerts.iter().map(Alert::label).collect()
    }
}

/// Derive the state of a trip at `sim_time`.
///
/// A missing or empty log yields `Error` with a "Data Invalid" alert. A
/// valid log with no event at or before `sim_time` yields `Idle`.
pub fn derive_trip_state(
    log: Option<&TripLog>,
    sim_time: DateTime<Utc>,
    trip_id: TripId,
    color: &str,
) -> TripState {
    let log = match log {
        Some(log) if !log.is_empty() => log,
        _ => {
            tracing::warn!("Invalid data for trip {}", trip_id);
            return TripState::invalid(trip_id, color);
        }
    };

    let filtered: Vec<&Event> = log.events_until(sim_time).collect();
    let Some(latest) = filtered.last().copied() else {
        return TripState::idle(trip_id, color, log.len());
    };

    let recent_start = filtered.len().saturating_sub(RECENT_EVENTS_WINDOW);

    TripState {
        trip_id,
        status: classify_status(latest),
        progress: progress_percent(latest.distance_travelled_km(), log.planned_distance_km()),
        position: latest.location,
        speed_kmh: latest.speed_kmh.unwrap_or(0.0),
        path: filtered.iter().filter_map(|e| e.location).collect(),
        alerts: active_alerts(latest),
        recent_events: filtered[recent_start..].iter().map(|e| (*e).clone()).collect(),
        total_events: log.len(),
        color: color.to_string(),
    }
}

/// Status implied by the latest event: `Active` unless it completes or
/// cancels the trip. Cancellation is checked last and wins.
pub fn classify_status(latest: &Event) -> TripStatus {
    let mut status = TripStatus::Active;
    if latest.event_type == EventType::TripCompleted {
        status = TripStatus::Completed;
    }
    if latest.event_type == EventType::TripCancelled {
        status = TripStatus::Cancelled;
    }
    status
}

/// Alerts raised by a single event, in fixed order.
///
/// Only the latest event is consulted, so an earlier alert clears as soon
/// as a later event without it arrives.
pub fn active_alerts(latest: &Event) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if latest.overspeed {
        alerts.push(Alert::Overspeed);
    }
    if latest.event_type == EventType::SignalLost {
        alerts.push(Alert::SignalLost);
    }
    if latest.event_type == EventType::FuelLevelLow || latest.battery_low {
        alerts.push(Alert::LowFuelOrBattery);
    }
    if latest.event_type == EventType::TripCancelled {
        alerts.push(Alert::Cancelled(latest.cancellation_reason.clone()));
    }
    alerts
}

/// Progress percentage, clamped to 100. Zero when no planned distance.
pub fn progress_percent(travelled_km: f64, planned_km: f64) -> f64 {
    if planned_km > 0.0 {
        (travelled_km / planned_km * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(50.0, 100.0), 50.0);
        assert_eq!(progress_percent(250.0, 100.0), 100.0);
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
        assert_eq!(progress_percent(-5.0, 100.0), 0.0);
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(&Event::new(t0(), EventType::TripCompleted)), TripStatus::Completed);
        assert_eq!(classify_status(&Event::new(t0(), EventType::TripCancelled)), TripStatus::Cancelled);
        assert_eq!(classify_status(&Event::new(t0(), EventType::SignalLost)), TripStatus::Active);
        assert_eq!(
            classify_status(&Event::new(t0(), EventType::Other("location_update".into()))),
            TripStatus::Active
        );
    }

    #[test]
    fn test_alert_order_is_fixed() {
        let mut event = Event::new(t0(), EventType::TripCancelled);
        event.overspeed = true;
        event.battery_low = true;

        let labels: Vec<String> = active_alerts(&event).iter().map(|a| a.to_string()).collect();
        assert_eq!(labels, vec!["Overspeed Alert", "Low Fuel/Battery", "Cancelled"]);
    }

    #[test]
    fn test_fuel_low_event_alert() {
        let event = Event::new(t0(), EventType::FuelLevelLow);
        assert_eq!(active_alerts(&event), vec![Alert::LowFuelOrBattery]);
        let event = Event::new(t0(), EventType::SignalLost);
        assert_eq!(active_alerts(&event), vec![Alert::SignalLost]);
    }

    #[test]
    fn test_recent_events_window() {
        let log: TripLog = (0..8)
            .map(|i| Event::new(t0() + Duration::minutes(i), EventType::default()))
            .collect();

        let state = derive_trip_state(Some(&log), t0() + Duration::minutes(6), TripId(1), "#fff");
        assert_eq!(state.recent_events.len(), RECENT_EVENTS_WINDOW);
        assert_eq!(state.recent_events[0].timestamp, Some(t0() + Duration::minutes(2)));
        assert_eq!(state.recent_events[4].timestamp, Some(t0() + Duration::minutes(6)));
        assert_eq!(state.total_events, 8);

        let state = derive_trip_state(Some(&log), t0() + Duration::minutes(1), TripId(1), "#fff");
        assert_eq!(state.recent_events.len(), 2);
    }

    #[test]
    fn test_invalid_log_states() {
        let expected = TripState::invalid(TripId(4), "#ed6c02");
        assert_eq!(derive_trip_state(None, t0(), TripId(4), "#ed6c02"), expected);
        assert_eq!(
            derive_trip_state(Some(&TripLog::default()), t0(), TripId(4), "#ed6c02"),
            expected
        );
        assert_eq!(expected.alert_labels(), vec!["Data Invalid"]);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TripStatus::Cancelled).unwrap(), "\"cancelled\"");
        assert_eq!(
            serde_json::to_string(&Alert::Cancelled(Some("flat tyre".into()))).unwrap(),
            "\"flat tyre\""
        );
    }
}
