//! Demo Fleet - Synthetic trip log generator
//!
//! Generates recorded-style trip logs for testing and demos without real
//! telemetry files. Output is the same JSON shape as the recorded data, so
//! it goes through the regular lenient parser. Generation is seeded and
//! therefore reproducible.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use crate::triplog::{FieldName, Location, Trip, TripId, TripLog, DISTANCE_FIELDS};

/// How a demo trip ends
#[derive(Debug, Clone, PartialEq)]
pub enum DemoOutcome {
    /// Reaches the destination
    Completed,
    /// Abandoned part way
    Cancelled {
        /// Share of the route covered before cancelling, 0 to 1
        at_fraction: f64,
        /// Reason recorded on the final event
        reason: String,
    },
}

/// A route to synthesize a trip for
#[derive(Debug, Clone, PartialEq)]
pub struct DemoRoute {
    /// Display name
    pub name: String,
    /// Display color
    pub color: String,
    /// Starting point
    pub origin: Location,
    /// End point
    pub destination: Location,
    /// Planned distance (km)
    pub planned_distance_km: f64,
    /// Typical cruising speed (km/h)
    pub cruise_speed_kmh: f64,
    /// Departure offset from the generator's start time
    pub departure: Duration,
    /// Which distance field the "vehicle" reports
    pub distance_field: FieldName,
    /// How the trip ends
    pub outcome: DemoOutcome,
}

/// Speed above which an event is flagged overspeed (km/h)
const OVERSPEED_KMH: f64 = 110.0;

/// Default demo routes, one per recorded-fleet scenario
pub fn default_routes() -> Vec<DemoRoute> {
    vec![
        DemoRoute {
            name: "Cross-Country Long Haul".into(),
            color: "#1976d2".into(),
            origin: Location::new(40.7128, -74.0060),
            destination: Location::new(34.0522, -118.2437),
            planned_distance_km: 4500.0,
            cruise_speed_kmh: 95.0,
            departure: Duration::zero(),
            distance_field: DISTANCE_FIELDS[0],
            outcome: DemoOutcome::Completed,
        },
        DemoRoute {
            name: "Urban Dense Delivery".into(),
            color: "#f50057".into(),
            origin: Location::new(41.8781, -87.6298),
            destination: Location::new(41.9742, -87.9073),
            planned_distance_km: 35.0,
            cruise_speed_kmh: 30.0,
            departure: Duration::minutes(30),
            distance_field: DISTANCE_FIELDS[1],
            outcome: DemoOutcome::Completed,
        },
        DemoRoute {
            name: "Mountain Route Cancelled".into(),
            color: "#d32f2f".into(),
            origin: Location::new(39.7392, -104.9903),
            destination: Location::new(39.6403, -106.3742),
            planned_distance_km: 160.0,
            cruise_speed_kmh: 60.0,
            departure: Duration::hours(1),
            distance_field: DISTANCE_FIELDS[2],
            outcome: DemoOutcome::Cancelled {
                at_fraction: 0.4,
                reason: "Road closure due to avalanche".into(),
            },
        },
    ]
}

/// Seeded generator of synthetic trip logs
pub struct DemoGenerator {
    rng: StdRng,
    start_time: DateTime<Utc>,
    sample_interval: Duration,
}

impl DemoGenerator {
    /// Create a generator; logs start at `start_time` plus each route's
    /// departure offset
    pub fn new(seed: u64, start_time: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            start_time,
            sample_interval: Duration::minutes(5),
        }
    }

    /// Set the simulated time between location updates
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        if interval > Duration::zero() {
            self.sample_interval = interval;
        }
        self
    }

    /// Generate a fleet from [`default_routes`], ids starting at 1
    pub fn generate_fleet(&mut self) -> Vec<Trip> {
        default_routes()
            .iter()
            .zip(1u32..)
            .map(|(route, id)| self.generate_trip(id, route))
            .collect()
    }

    /// Generate one trip
    pub fn generate_trip(&mut self, id: u32, route: &DemoRoute) -> Trip {
        let log = TripLog::from_value(&self.generate_log(route));
        Trip::new(TripId(id), route.name.clone(), log).with_color(route.color.clone())
    }

    /// Generate the raw JSON event array for a route
    pub fn generate_log(&mut self, route: &DemoRoute) -> Value {
        let hours_per_sample = self.sample_interval.num_seconds() as f64 / 3600.0;
        let km_per_sample = (route.cruise_speed_kmh * hours_per_sample).max(0.1);
        let samples = (route.planned_distance_km / km_per_sample).ceil().max(1.0) as u32;
        let stop_fraction = match &route.outcome {
            DemoOutcome::Completed => 1.0,
            DemoOutcome::Cancelled { at_fraction, .. } => at_fraction.clamp(0.0, 1.0),
        };

        let departure = self.start_time + route.departure;
        let mut events = vec![json!({
            "timestamp": departure.to_rfc3339(),
            "event_type": "trip_started",
            "planned_distance_km": route.planned_distance_km,
            "location": location_json(route.origin),
            "movement": {"speed_kmh": 0.0},
        })];

        let mut i = 1;
        while i < samples && (i as f64 / samples as f64) < stop_fraction {
            let fraction = i as f64 / samples as f64;
            let timestamp = departure + self.sample_interval * i as i32;
            let speed = (route.cruise_speed_kmh + self.rng.gen_range(-15.0..20.0)).max(0.0);

            let mut event = Map::new();
            event.insert("timestamp".into(), json!(timestamp.to_rfc3339()));
            event.insert(
                route.distance_field.snake.into(),
                json!(route.planned_distance_km * fraction),
            );
            event.insert("movement".into(), json!({"speed_kmh": speed}));

            let roll: f64 = self.rng.gen();
            if roll < 0.04 {
                // No position while the signal is gone
                event.insert("event_type".into(), json!("signal_lost"));
            } else {
                let event_type = if roll < 0.07 { "fuel_level_low" } else { "location_update" };
                event.insert("event_type".into(), json!(event_type));
                event.insert(
                    "location".into(),
                    location_json(interpolate(route.origin, route.destination, fraction)),
                );
            }
            if speed > OVERSPEED_KMH {
                event.insert("overspeed".into(), json!(true));
            }
            if self.rng.gen_bool(0.02) {
                event.insert("battery_low".into(), json!(true));
            }

            events.push(Value::Object(event));
            i += 1;
        }

        let end_time = departure + self.sample_interval * i as i32;
        let final_event = match &route.outcome {
            DemoOutcome::Completed => json!({
                "timestamp": end_time.to_rfc3339(),
                "event_type": "trip_completed",
                route.distance_field.snake: route.planned_distance_km,
                "location": location_json(route.destination),
                "movement": {"speed_kmh": 0.0},
            }),
            DemoOutcome::Cancelled { reason, .. } => json!({
                "timestamp": end_time.to_rfc3339(),
                "event_type": "trip_cancelled",
                route.distance_field.snake: route.planned_distance_km * stop_fraction,
                "location": location_json(interpolate(route.origin, route.destination, stop_fraction)),
                "movement": {"speed_kmh": 0.0},
                "cancellation_reason": reason,
            }),
        };
        events.push(final_event);

        Value::Array(events)
    }
}

fn interpolate(from: Location, to: Location, fraction: f64) -> Location {
    Location::new(
        from.lat + (to.lat - from.lat) * fraction,
        from.lng + (to.lng - from.lng) * fraction,
    )
}

fn location_json(loc: Location) -> Value {
    json!({"lat": loc.lat, "lng": loc.lng})
}
