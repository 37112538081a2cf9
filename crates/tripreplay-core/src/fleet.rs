//! Fleet Aggregator
//!
//! Rolls the current trip states up into fleet-wide summary metrics.

use serde::Serialize;
use std::collections::HashMap;

use crate::state::{TripState, TripStatus};
use crate::triplog::{Trip, TripId};

/// Fleet-wide summary at one simulated instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetMetrics {
    /// Trips currently active
    pub active: usize,
    /// Trips completed
    pub completed: usize,
    /// Trips cancelled
    pub cancelled: usize,
    /// Sum of distance covered, from progress and planned distance (km)
    pub total_distance_km: f64,
    /// Unweighted mean of instantaneous speed across all trips (km/h)
    pub avg_speed_kmh: f64,
    /// Number of alerts active across all trips
    pub total_alerts: usize,
}

/// Planned distance per trip, as used by [`aggregate`]
pub fn planned_distances(trips: &[Trip]) -> HashMap<TripId, f64> {
    trips
        .iter()
        .map(|t| (t.id, t.planned_distance_km()))
        .collect()
}

/// Aggregate trip states into fleet metrics.
///
/// Every state counts, including `error` ones: each adds its zero speed to
/// the mean and its "Data Invalid" alert to `total_alerts`. Callers that
/// want the mean over usable trips only must filter before aggregating.
/// Trips without an entry in `planned_km` contribute no distance. An empty
/// slice yields all-zero metrics.
pub fn aggregate(states: &[TripState], planned_km: &HashMap<TripId, f64>) -> FleetMetrics {
    let mut metrics = FleetMetrics::default();
    let mut speed_sum = 0.0;

    for state in states {
        match state.status {
            TripStatus::Active => metrics.active += 1,
            TripStatus::Completed => metrics.completed += 1,
            TripStatus::Cancelled => metrics.cancelled += 1,
            TripStatus::Idle | TripStatus::Error => {}
        }
        let planned = planned_km.get(&state.trip_id).copied().unwrap_or(0.0);
        metrics.total_distance_km += state.progress / 100.0 * planned;
        speed_sum += state.speed_kmh;
        metrics.total_alerts += state.alerts.len();
    }

    if !states.is_empty() {
        metrics.avg_speed_kmh = speed_sum / states.len() as f64;
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Alert;
    use pretty_assertions::assert_eq;

    fn state(id: u32, status: TripStatus, progress: f64, speed: f64) -> TripState {
        TripState {
            trip_id: TripId(id),
            status,
            progress,
            position: None,
            speed_kmh: speed,
            path: Vec::new(),
            alerts: Vec::new(),
            recent_events: Vec::new(),
            total_events: 1,
            color: String::new(),
        }
    }

    #[test]
    fn test_empty_fleet_is_zero() {
        assert_eq!(aggregate(&[], &HashMap::new()), FleetMetrics::default());
    }

    #[test]
    fn test_counts_distance_and_speed() {
        let mut cancelled = state(3, TripStatus::Cancelled, 40.0, 0.0);
        cancelled.alerts = vec![Alert::Cancelled(Some("landslide".into()))];
        let states = vec![
            state(1, TripStatus::Active, 50.0, 90.0),
            state(2, TripStatus::Completed, 100.0, 0.0),
            cancelled,
            state(4, TripStatus::Idle, 0.0, 0.0),
            state(5, TripStatus::Active, 10.0, 30.0),
        ];
        let planned = HashMap::from([
            (TripId(1), 1000.0),
            (TripId(2), 20.0),
            (TripId(3), 150.0),
            (TripId(5), 100.0),
        ]);

        let metrics = aggregate(&states, &planned);
        assert_eq!(metrics.active, 2);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.cancelled, 1);
        assert!((metrics.total_distance_km - (500.0 + 20.0 + 60.0 + 10.0)).abs() < 1e-9);
        assert!((metrics.avg_speed_kmh - 24.0).abs() < 1e-9);
        assert_eq!(metrics.total_alerts, 1);
    }

    #[test]
    fn test_unknown_trip_contributes_no_distance() {
        let states = vec![state(9, TripStatus::Active, 75.0, 60.0)];
        let metrics = aggregate(&states, &HashMap::new());
        assert_eq!(metrics.total_distance_km, 0.0);
        assert_eq!(metrics.avg_speed_kmh, 60.0);
    }

    #[test]
    fn test_error_states_count_toward_speed_and_alerts() {
        let mut broken = state(2, TripStatus::Error, 0.0, 0.0);
        broken.alerts = vec![Alert::DataInvalid];
        let states = vec![state(1, TripStatus::Active, 50.0, 80.0), broken];

        let metrics = aggregate(&states, &HashMap::new());
        assert_eq!(metrics.active, 1);
        assert_eq!(metrics.avg_speed_kmh, 40.0);
        assert_eq!(metrics.total_alerts, 1);
    }
}
