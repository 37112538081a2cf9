//! Replay Session
//!
//! Holds the single piece of mutable playback state (the clock) together
//! with the fleet and the derived snapshot. Every change of simulated time
//! re-derives all trip states and then the fleet metrics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::clock::{PlaybackClock, PlaybackSpeed, PlaybackState};
use crate::fleet::{aggregate, planned_distances, FleetMetrics};
use crate::state::{derive_trip_state, TripState, TripStatus};
use crate::triplog::{Trip, TripId};

/// Everything a renderer needs for one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySnapshot {
    /// Current simulated time
    pub sim_time: DateTime<Utc>,
    /// Play/pause state
    pub playback: PlaybackState,
    /// Speed multiplier
    pub speed: PlaybackSpeed,
    /// One state per trip, in fleet order
    pub states: Vec<TripState>,
    /// Fleet-wide metrics
    pub metrics: FleetMetrics,
    /// No trip produced a usable state
    pub data_error: bool,
    /// Trip chosen for emphasis, if any
    pub selected_trip: Option<TripId>,
}

/// A fleet being played back
#[derive(Debug)]
pub struct ReplaySession {
    trips: Vec<Trip>,
    planned_km: HashMap<TripId, f64>,
    clock: PlaybackClock,
    selected_trip: Option<TripId>,
    states: Vec<TripState>,
    metrics: FleetMetrics,
    data_error: bool,
}

impl ReplaySession {
    /// Create a session and derive the initial snapshot
    pub fn new(trips: Vec<Trip>, clock: PlaybackClock) -> Self {
        let mut session = Self {
            planned_km: planned_distances(&trips),
            trips,
            clock,
            selected_trip: None,
            states: Vec::new(),
            metrics: FleetMetrics::default(),
            data_error: false,
        };
        session.recompute();
        session
    }

    /// Get the trips
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    /// Get the clock
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Current trip states
    pub fn states(&self) -> &[TripState] {
        &self.states
    }

    /// State of one trip
    pub fn state(&self, id: TripId) -> Option<&TripState> {
        self.states.iter().find(|s| s.trip_id == id)
    }

    /// Current fleet metrics
    pub fn metrics(&self) -> &FleetMetrics {
        &self.metrics
    }

    /// True when no trip produced a usable state
    pub fn data_error(&self) -> bool {
        self.data_error
    }

    /// Selected trip
    pub fn selected_trip(&self) -> Option<TripId> {
        self.selected_trip
    }

    /// Copy of the current derived output
    pub fn snapshot(&self) -> ReplaySnapshot {
        ReplaySnapshot {
            sim_time: self.clock.sim_time(),
            playback: self.clock.state(),
            speed: self.clock.speed(),
            states: self.states.clone(),
            metrics: self.metrics,
            data_error: self.data_error,
            selected_trip: self.selected_trip,
        }
    }

    /// Start playback
    pub fn play(&mut self) {
        self.clock.play();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Switch between playing and paused
    pub fn toggle_play(&mut self) {
        self.clock.toggle_play();
    }

    /// Change playback speed
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.clock.set_speed(speed);
    }

    /// Set or clear the selected trip. Has no effect on derived values.
    pub fn select_trip(&mut self, id: Option<TripId>) {
        self.selected_trip = id;
    }

    /// Select `id`, or clear the selection if `id` is already selected
    pub fn toggle_trip_selection(&mut self, id: TripId) {
        self.selected_trip = if self.selected_trip == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    /// Advance the clock one tick and re-derive if simulated time moved.
    ///
    /// Ticks are ignored while the fleet has no usable data.
    pub fn tick(&mut self) -> bool {
        if self.data_error {
            return false;
        }
        let moved = self.clock.tick();
        if moved {
            self.recompute();
        }
        moved
    }

    /// Replace the fleet (e.g. after regenerating data files) and re-derive
    /// at the current simulated time.
    pub fn reload(&mut self, trips: Vec<Trip>) {
        tracing::info!("Reloading fleet with {} trips", trips.len());
        self.planned_km = planned_distances(&trips);
        self.trips = trips;
        self.recompute();
    }

    /// Return the clock to its start instant and re-derive
    pub fn rewind(&mut self) {
        self.clock.rewind();
        self.recompute();
    }

    /// Re-derive every trip state and the fleet metrics
    pub fn recompute(&mut self) {
        let sim_time = self.clock.sim_time();
        self.states = self
            .trips
            .iter()
            .map(|trip| derive_trip_state(trip.log.as_ref(), sim_time, trip.id, &trip.color))
            .collect();
        self.metrics = aggregate(&self.states, &self.planned_km);

        let data_error = !self.states.iter().any(|s| s.status != TripStatus::Error);
        if data_error && !self.data_error {
            tracing::error!("No valid trip data found in fleet of {} trips", self.trips.len());
        }
        self.data_error = data_error;
    }
}
