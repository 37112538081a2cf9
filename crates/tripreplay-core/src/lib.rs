//! # TripReplay Core Library
//!
//! Core functionality for the TripReplay fleet playback engine.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Trip log parsing (recorded vehicle telemetry events)
//! - Per-trip state derivation at a simulated instant
//! - A playback clock with discrete speed multipliers
//! - Fleet-wide metric aggregation
//! - An async playback driver publishing snapshots
//! - Seeded demo fleet generation
//!
//! ## Example
//!
//! ```rust,ignore
//! use tripreplay_core::prelude::*;
//!
//! let config = ReplayConfig::from_file("fleet.json")?;
//! let mut session = ReplaySession::new(config.load_fleet(), config.build_clock());
//!
//! session.play();
//! session.tick();
//! for state in session.states() {
//!     println!("{} {} {:.1}%", state.trip_id, state.status, state.progress);
//! }
//! ```

pub mod clock;
pub mod config;
pub mod demo;
pub mod driver;
pub mod error;
pub mod fleet;
pub mod replay;
pub mod state;
pub mod triplog;

pub use error::{ReplayError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{PlaybackClock, PlaybackSpeed, PlaybackState};
    pub use crate::config::{ReplayConfig, TripConfig};
    pub use crate::driver::PlaybackDriver;
    pub use crate::error::ReplayError;
    pub use crate::fleet::{aggregate, FleetMetrics};
    pub use crate::replay::{ReplaySession, ReplaySnapshot};
    pub use crate::state::{derive_trip_state, Alert, TripState, TripStatus};
    pub use crate::triplog::{Event, EventType, Location, Trip, TripId, TripLog};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
