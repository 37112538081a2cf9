//! Playback Driver
//!
//! Runs a [`ReplaySession`] against wall-clock time on the tokio runtime.
//! A ticker task fires every [`PlaybackClock::tick_interval`] while
//! playing and publishes each new snapshot on a watch channel.
//!
//! [`PlaybackClock::tick_interval`]: crate::clock::PlaybackClock::tick_interval

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::PlaybackSpeed;
use crate::replay::{ReplaySession, ReplaySnapshot};
use crate::triplog::{Trip, TripId};

/// Drives a replay session from a periodic timer
pub struct PlaybackDriver {
    session: Arc<Mutex<ReplaySession>>,
    updates: Arc<watch::Sender<Arc<ReplaySnapshot>>>,
    ticker: Option<JoinHandle<()>>,
}

impl PlaybackDriver {
    /// Wrap a session. The driver starts idle regardless of the session's
    /// play state; call [`PlaybackDriver::play`] to start ticking.
    pub fn new(mut session: ReplaySession) -> Self {
        session.pause();
        let (updates, _) = watch::channel(Arc::new(session.snapshot()));
        Self {
            session: Arc::new(Mutex::new(session)),
            updates: Arc::new(updates),
            ticker: None,
        }
    }

    /// Subscribe to snapshots. The receiver sees the latest one immediately.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ReplaySnapshot>> {
        self.updates.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<ReplaySnapshot> {
        Arc::clone(&self.updates.borrow())
    }

    /// Check if the ticker task is running
    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Start playback. No effect when already playing.
    pub async fn play(&mut self) {
        let period = {
            let mut session = self.session.lock().await;
            if session.clock().is_playing() && self.ticker.is_some() {
                return;
            }
            session.play();
            self.publish(&session);
            session.clock().tick_interval()
        };
        self.spawn_ticker(period);
    }

    /// Pause playback. Once this returns no further tick takes effect.
    pub async fn pause(&mut self) {
        {
            let mut session = self.session.lock().await;
            session.pause();
            self.publish(&session);
        }
        self.stop_ticker();
    }

    /// Switch between playing and paused
    pub async fn toggle_play(&mut self) {
        let playing = self.session.lock().await.clock().is_playing();
        if playing {
            self.pause().await;
        } else {
            self.play().await;
        }
    }

    /// Change speed. While playing, the ticker restarts at the new period
    /// and the new step applies from the next tick.
    pub async fn set_speed(&mut self, speed: PlaybackSpeed) {
        let restart = {
            let mut session = self.session.lock().await;
            session.set_speed(speed);
            self.publish(&session);
            session
                .clock()
                .is_playing()
                .then(|| session.clock().tick_interval())
        };
        if let Some(period) = restart {
            self.stop_ticker();
            self.spawn_ticker(period);
        }
    }

    /// Set or clear the selected trip
    pub async fn select_trip(&mut self, id: Option<TripId>) {
        let mut session = self.session.lock().await;
        session.select_trip(id);
        self.publish(&session);
    }

    /// Replace the fleet and re-derive
    pub async fn reload(&mut self, trips: Vec<Trip>) {
        let mut session = self.session.lock().await;
        session.reload(trips);
        self.publish(&session);
    }

    fn publish(&self, session: &ReplaySession) {
        self.updates.send_replace(Arc::new(session.snapshot()));
    }

    fn spawn_ticker(&mut self, period: Duration) {
        let session = Arc::clone(&self.session);
        let updates = Arc::clone(&self.updates);

        tracing::info!("Playback ticker started, period {:?}", period);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let mut session = session.lock().await;
                if session.tick() {
                    updates.send_replace(Arc::new(session.snapshot()));
                }
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            tracing::info!("Playback ticker stopped");
        }
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{default_start_time, PlaybackClock, PlaybackState};
    use crate::triplog::{Event, EventType, TripLog};

    fn driver() -> PlaybackDriver {
        let log = TripLog::new(vec![Event::new(default_start_time(), EventType::default())]);
        let session = ReplaySession::new(vec![Trip::new(TripId(1), "Test", Some(log))], PlaybackClock::default());
        PlaybackDriver::new(session)
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_ticks_once_per_period() {
        let mut driver = driver();
        driver.play().await;
        assert!(driver.is_running());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let snapshot = driver.snapshot();
        assert_eq!(snapshot.sim_time, default_start_time() + chrono::Duration::seconds(3));
        assert_eq!(snapshot.playback, PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_ticks() {
        let mut driver = driver();
        driver.play().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        driver.pause().await;
        assert!(!driver.is_running());

        let paused_at = driver.snapshot().sim_time;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(driver.snapshot().sim_time, paused_at);
        assert_eq!(driver.snapshot().playback, PlaybackState::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_change_restarts_ticker() {
        let mut driver = driver();
        driver.play().await;
        driver.set_speed(PlaybackSpeed::X5).await;

        // 200ms period, 5s step
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            driver.snapshot().sim_time,
            default_start_time() + chrono::Duration::seconds(25)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticker() {
        let mut driver = driver();
        let rx = driver.subscribe();
        driver.play().await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let before = rx.borrow().sim_time;
        assert_eq!(before, default_start_time() + chrono::Duration::seconds(1));
        drop(driver);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.borrow().sim_time, before);
    }

    #[tokio::test]
    async fn test_subscribers_see_commands() {
        let mut driver = driver();
        let mut rx = driver.subscribe();
        rx.borrow_and_update();

        driver.select_trip(Some(TripId(1))).await;
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.selected_trip, Some(TripId(1)));

        let initial = ReplaySession::new(
            vec![Trip::new(TripId(1), "Test", Some(TripLog::new(vec![Event::new(
                default_start_time(),
                EventType::default(),
            )])))],
            PlaybackClock::default(),
        )
        .snapshot();
        assert_eq!(snapshot.states, initial.states);
        assert_eq!(snapshot.metrics, initial.metrics);
    }
}
