//! Trip log events
//!
//! One recorded telemetry event and the lenient JSON field lookup used to
//! read it. Recorded files use `snake_case` keys; camelCase keys are
//! accepted as well.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A JSON field name in both accepted spellings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldName {
    /// Key as written in recorded data files
    pub snake: &'static str,
    /// Alternate camelCase key
    pub camel: &'static str,
}

impl FieldName {
    const fn new(snake: &'static str, camel: &'static str) -> Self {
        Self { snake, camel }
    }

    fn lookup<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a Value> {
        obj.get(self.snake)
            .or_else(|| obj.get(self.camel))
            .filter(|v| !v.is_null())
    }
}

/// Distance-travelled fields, probed in priority order. The first one
/// present on an event wins.
pub const DISTANCE_FIELDS: [FieldName; 3] = [
    FieldName::new("distance_travelled_km", "distanceTravelledKm"),
    FieldName::new("total_distance_km", "totalDistanceKm"),
    FieldName::new("distance_completed_km", "distanceCompletedKm"),
];

const TIMESTAMP: FieldName = FieldName::new("timestamp", "timestamp");
const EVENT_TYPE: FieldName = FieldName::new("event_type", "eventType");
const LOCATION: FieldName = FieldName::new("location", "location");
const MOVEMENT: FieldName = FieldName::new("movement", "movement");
const SPEED_KMH: FieldName = FieldName::new("speed_kmh", "speedKmh");
const PLANNED_DISTANCE: FieldName = FieldName::new("planned_distance_km", "plannedDistanceKm");
const OVERSPEED: FieldName = FieldName::new("overspeed", "overspeed");
const BATTERY_LOW: FieldName = FieldName::new("battery_low", "batteryLow");
const CANCELLATION_REASON: FieldName =
    FieldName::new("cancellation_reason", "cancellationReason");

/// Kind of a recorded event. Unrecognized kinds are ordinary progress events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Trip reached its destination
    TripCompleted,
    /// Trip was abandoned
    TripCancelled,
    /// Vehicle stopped reporting position
    SignalLost,
    /// Fuel level dropped below threshold
    FuelLevelLow,
    /// Any other event kind (empty when the field is missing)
    Other(String),
}

impl EventType {
    /// Parse an event type string
    pub fn parse(s: &str) -> Self {
        match s {
            "trip_completed" => EventType::TripCompleted,
            "trip_cancelled" => EventType::TripCancelled,
            "signal_lost" => EventType::SignalLost,
            "fuel_level_low" => EventType::FuelLevelLow,
            other => EventType::Other(other.to_string()),
        }
    }

    /// Get the wire name of this event type
    pub fn as_str(&self) -> &str {
        match self {
            EventType::TripCompleted => "trip_completed",
            EventType::TripCancelled => "trip_cancelled",
            EventType::SignalLost => "signal_lost",
            EventType::FuelLevelLow => "fuel_level_low",
            EventType::Other(s) => s,
        }
    }
}

impl Default for EventType {
    fn default() -> Self {
        EventType::Other(String::new())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

impl Location {
    /// Create a new location
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A single trip log event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event time; `None` if missing or unparseable
    pub timestamp: Option<DateTime<Utc>>,
    /// Event kind
    pub event_type: EventType,
    /// Reported position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Instantaneous speed from `movement.speed_kmh`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<f64>,
    /// Readings for each of [`DISTANCE_FIELDS`], same order
    #[serde(skip)]
    pub distance_readings: [Option<f64>; 3],
    /// Planned total distance (normally only on the first event)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_distance_km: Option<f64>,
    /// Overspeed flag
    pub overspeed: bool,
    /// Low battery flag
    pub battery_low: bool,
    /// Reason given on cancellation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl Event {
    /// Create an event of the given type at the given time
    pub fn new(timestamp: DateTime<Utc>, event_type: EventType) -> Self {
        Self {
            timestamp: Some(timestamp),
            event_type,
            ..Default::default()
        }
    }

    /// Parse an event from a JSON value.
    ///
    /// Never fails: non-objects and mistyped fields yield defaults.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let mut distance_readings = [None; 3];
        for (slot, field) in distance_readings.iter_mut().zip(DISTANCE_FIELDS.iter()) {
            *slot = field.lookup(obj).and_then(Value::as_f64);
        }

        Self {
            timestamp: TIMESTAMP.lookup(obj).and_then(parse_timestamp),
            event_type: EVENT_TYPE
                .lookup(obj)
                .and_then(Value::as_str)
                .map(EventType::parse)
                .unwrap_or_default(),
            location: LOCATION.lookup(obj).and_then(parse_location),
            speed_kmh: MOVEMENT
                .lookup(obj)
                .and_then(Value::as_object)
                .and_then(|m| SPEED_KMH.lookup(m))
                .and_then(Value::as_f64),
            distance_readings,
            planned_distance_km: PLANNED_DISTANCE.lookup(obj).and_then(Value::as_f64),
            overspeed: OVERSPEED.lookup(obj).and_then(Value::as_bool) == Some(true),
            battery_low: BATTERY_LOW.lookup(obj).and_then(Value::as_bool) == Some(true),
            cancellation_reason: CANCELLATION_REASON
                .lookup(obj)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Distance travelled so far: the first present reading in
    /// [`DISTANCE_FIELDS`] order, or 0.
    pub fn distance_travelled_km(&self) -> f64 {
        self.distance_readings
            .iter()
            .find_map(|r| *r)
            .unwrap_or(0.0)
    }

    /// Set the reading for one of the [`DISTANCE_FIELDS`]
    pub fn with_distance(mut self, field: FieldName, km: f64) -> Self {
        if let Some(idx) = DISTANCE_FIELDS.iter().position(|f| *f == field) {
            self.distance_readings[idx] = Some(km);
        }
        self
    }

    /// Set the location
    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some(Location::new(lat, lng));
        self
    }

    /// Set the instantaneous speed
    pub fn with_speed(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = Some(speed_kmh);
        self
    }

    /// Set the planned trip distance
    pub fn with_planned_distance(mut self, km: f64) -> Self {
        self.planned_distance_km = Some(km);
        self
    }
}

/// Parse a timestamp: RFC 3339, naive ISO-8601 (taken as UTC) or epoch
/// milliseconds.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn parse_location(value: &Value) -> Option<Location> {
    let obj = value.as_object()?;
    Some(Location {
        lat: obj.get("lat")?.as_f64()?,
        lng: obj.get("lng")?.as_f64()?,
    })
}
