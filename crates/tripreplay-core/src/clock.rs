//! Playback Clock
//!
//! Owns simulated time and the play/pause/speed state. Each tick advances
//! simulated time by `1s * multiplier`; the driver fires ticks every
//! `1000ms / multiplier` (see [`PlaybackSpeed::tick_interval`]). Simulated
//! time never passes the clock's maximum instant.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{ReplayError, Result};

/// Allowed playback speed multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PlaybackSpeed {
    /// 1x
    #[default]
    X1,
    /// 2x
    X2,
    /// 5x
    X5,
}

impl PlaybackSpeed {
    /// Every allowed speed, slowest first
    pub const ALL: [PlaybackSpeed; 3] = [PlaybackSpeed::X1, PlaybackSpeed::X2, PlaybackSpeed::X5];

    /// Get the numeric multiplier
    pub fn multiplier(self) -> u32 {
        match self {
            PlaybackSpeed::X1 => 1,
            PlaybackSpeed::X2 => 2,
            PlaybackSpeed::X5 => 5,
        }
    }

    /// Look up a speed by multiplier
    pub fn from_multiplier(multiplier: u32) -> Result<Self> {
        match multiplier {
            1 => Ok(PlaybackSpeed::X1),
            2 => Ok(PlaybackSpeed::X2),
            5 => Ok(PlaybackSpeed::X5),
            other => Err(ReplayError::InvalidSpeed(other)),
        }
    }

    /// Wall-clock period between ticks: `1000ms / multiplier`
    pub fn tick_interval(self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.multiplier()))
    }

    /// Simulated time added by one tick: `1s * multiplier`
    pub fn step(self) -> chrono::Duration {
        chrono::Duration::seconds(i64::from(self.multiplier()))
    }
}

impl TryFrom<u32> for PlaybackSpeed {
    type Error = ReplayError;

    fn try_from(multiplier: u32) -> Result<Self> {
        Self::from_multiplier(multiplier)
    }
}

impl From<PlaybackSpeed> for u32 {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.multiplier()
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier())
    }
}

/// Play/pause state of the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Ticks are ignored
    Paused,
    /// Ticks advance simulated time
    Playing,
}

/// Default simulated start instant of the recorded fleet
pub fn default_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 8, 0, 0)
        .single()
        .expect("valid start date")
}

/// Default maximum simulated instant of the recorded fleet
pub fn default_max_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 8, 0, 0, 0)
        .single()
        .expect("valid end date")
}

/// Simulated playback clock
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    state: PlaybackState,
    speed: PlaybackSpeed,
    sim_time: DateTime<Utc>,
    start_time: DateTime<Utc>,
    max_time: DateTime<Utc>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(default_start_time(), default_max_time())
    }
}

impl PlaybackClock {
    /// Create a paused clock at `start_time`, running at 1x.
    ///
    /// `max_time` earlier than `start_time` is raised to `start_time`.
    pub fn new(start_time: DateTime<Utc>, max_time: DateTime<Utc>) -> Self {
        Self {
            state: PlaybackState::Paused,
            speed: PlaybackSpeed::X1,
            sim_time: start_time,
            start_time,
            max_time: max_time.max(start_time),
        }
    }

    /// Current simulated time
    pub fn sim_time(&self) -> DateTime<Utc> {
        self.sim_time
    }

    /// Simulated start instant
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Maximum simulated instant
    pub fn max_time(&self) -> DateTime<Utc> {
        self.max_time
    }

    /// Play/pause state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Current speed
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Wall-clock period between ticks at the current speed
    pub fn tick_interval(&self) -> Duration {
        self.speed.tick_interval()
    }

    /// Check if simulated time has reached the maximum
    pub fn is_at_end(&self) -> bool {
        self.sim_time >= self.max_time
    }

    /// Start playing. No effect when already playing.
    pub fn play(&mut self) {
        if self.state == PlaybackState::Paused {
            tracing::debug!("Playback started at {}", self.sim_time);
            self.state = PlaybackState::Playing;
        }
    }

    /// Pause. No effect when already paused.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            tracing::debug!("Playback paused at {}", self.sim_time);
            self.state = PlaybackState::Paused;
        }
    }

    /// Switch between playing and paused
    pub fn toggle_play(&mut self) {
        match self.state {
            PlaybackState::Paused => self.play(),
            PlaybackState::Playing => self.pause(),
        }
    }

    /// Change the speed; applies from the next tick
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        if speed != self.speed {
            tracing::debug!("Playback speed {} -> {}", self.speed, speed);
            self.speed = speed;
        }
    }

    /// Advance simulated time by one step.
    ///
    /// Returns `true` if simulated time changed. Paused clocks and clocks
    /// already at the maximum instant ignore the tick; playback is not
    /// paused when the end is reached.
    pub fn tick(&mut self) -> bool {
        if !self.is_playing() || self.is_at_end() {
            return false;
        }
        let next = self.sim_time + self.speed.step();
        self.sim_time = next.min(self.max_time);
        true
    }

    /// Return to the start instant, keeping play state and speed
    pub fn rewind(&mut self) {
        self.sim_time = self.start_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let clock = PlaybackClock::default();
        assert_eq!(clock.state(), PlaybackState::Paused);
        assert_eq!(clock.speed(), PlaybackSpeed::X1);
        assert_eq!(clock.sim_time(), default_start_time());
    }

    #[test]
    fn test_tick_only_while_playing() {
        let mut clock = PlaybackClock::default();
        assert!(!clock.tick());
        assert_eq!(clock.sim_time(), default_start_time());

        clock.play();
        assert!(clock.tick());
        assert_eq!(clock.sim_time(), default_start_time() + chrono::Duration::seconds(1));

        clock.pause();
        assert!(!clock.tick());
        assert_eq!(clock.sim_time(), default_start_time() + chrono::Duration::seconds(1));
    }

    #[test]
    fn test_speed_sets_step_and_interval() {
        assert_eq!(PlaybackSpeed::X1.tick_interval(), Duration::from_millis(1000));
        assert_eq!(PlaybackSpeed::X2.tick_interval(), Duration::from_millis(500));
        assert_eq!(PlaybackSpeed::X5.tick_interval(), Duration::from_millis(200));

        let mut clock = PlaybackClock::default();
        clock.play();
        clock.set_speed(PlaybackSpeed::X5);
        clock.tick();
        assert_eq!(clock.sim_time(), default_start_time() + chrono::Duration::seconds(5));
    }

    #[test]
    fn test_from_multiplier() {
        assert_eq!(PlaybackSpeed::from_multiplier(2).unwrap(), PlaybackSpeed::X2);
        assert!(matches!(
            PlaybackSpeed::from_multiplier(3),
            Err(ReplayError::InvalidSpeed(3))
        ));
        assert_eq!(serde_json::to_string(&PlaybackSpeed::X5).unwrap(), "5");
        assert!(serde_json::from_str::<PlaybackSpeed>("4").is_err());
    }

    #[test]
    fn test_clamp_at_max_time() {
        let start = default_start_time();
        let max = start + chrono::Duration::seconds(7);
        let mut clock = PlaybackClock::new(start, max);
        clock.set_speed(PlaybackSpeed::X5);
        clock.play();

        assert!(clock.tick());
        assert!(clock.tick());
        assert_eq!(clock.sim_time(), max);
        assert!(clock.is_at_end());

        assert!(!clock.tick());
        assert_eq!(clock.sim_time(), max);
        assert!(clock.is_playing());
    }

    #[test]
    fn test_toggle_and_rewind() {
        let mut clock = PlaybackClock::default();
        clock.toggle_play();
        assert!(clock.is_playing());
        clock.tick();
        clock.rewind();
        assert_eq!(clock.sim_time(), default_start_time());
        clock.toggle_play();
        assert!(!clock.is_playing());
    }
}
