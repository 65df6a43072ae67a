//! Quiescence-window debouncing for the waypoint buffer.
//!
//! The timer is a plain state machine driven by the caller's clock: every
//! mutation cancels the pending fire and schedules a new one `window` later;
//! `poll` publishes the latest value once that deadline has passed.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::waypoint::Waypoint;

/// Default quiescence window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    live: T,
    debounced: T,
    window: Duration,
    deadline: Option<Instant>,
    initial_pending: bool,
}

impl<T: Clone> Debouncer<T> {
    /// Creates a debouncer whose live and debounced views both start at
    /// `initial`. The initial value is reported once by the first `poll`.
    pub fn new(initial: T, window: Duration) -> Self {
        Self {
            debounced: initial.clone(),
            live: initial,
            window,
            deadline: None,
            initial_pending: true,
        }
    }

    /// Replaces the live value and restarts the quiescence timer.
    pub fn set(&mut self, value: T, now: Instant) {
        self.live = value;
        self.restart(now);
    }

    /// Mutates the live value in place and restarts the quiescence timer.
    pub fn update(&mut self, now: Instant, f: impl FnOnce(&mut T)) {
        f(&mut self.live);
        self.restart(now);
    }

    /// Publishes the live value if the window has elapsed since the last
    /// mutation. Returns the newly published value, at most once per burst.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.debounced = self.live.clone();
                debug!("debounce window elapsed, publishing latest value");
                Some(&self.debounced)
            }
            Some(_) => None,
            None if self.initial_pending => {
                self.initial_pending = false;
                Some(&self.debounced)
            }
            None => None,
        }
    }

    /// The most recent value, including unpublished mutations.
    pub fn live(&self) -> &T {
        &self.live
    }

    /// The last published value.
    pub fn debounced(&self) -> &T {
        &self.debounced
    }

    /// When the pending fire is due, if a mutation is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn restart(&mut self, now: Instant) {
        // A mutation supersedes the initial value before it was reported.
        self.initial_pending = false;
        self.deadline = Some(now + self.window);
    }
}

/// The session's waypoint sequence behind a debounced view.
pub type WaypointBuffer = Debouncer<Vec<Waypoint>>;

impl Debouncer<Vec<Waypoint>> {
    /// Appends a waypoint in click order.
    pub fn push(&mut self, waypoint: Waypoint, now: Instant) {
        self.update(now, |waypoints| waypoints.push(waypoint));
    }

    /// Replaces the whole sequence.
    pub fn replace(&mut self, waypoints: Vec<Waypoint>, now: Instant) {
        self.set(waypoints, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_initial_value_reported_once() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(vec![1], DEFAULT_WINDOW);
        assert_eq!(debouncer.poll(start), Some(&vec![1]));
        assert_eq!(debouncer.poll(start + ms(10)), None);
    }

    #[test]
    fn test_burst_publishes_only_final_state() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(0, DEFAULT_WINDOW);
        let mutations = [(0, 1), (100, 2), (200, 3), (600, 4)];
        let mut published = Vec::new();

        for tick in 0..2000u64 {
            if let Some((_, value)) = mutations.iter().find(|(at, _)| *at == tick) {
                debouncer.set(*value, start + ms(tick));
            }
            if let Some(value) = debouncer.poll(start + ms(tick)) {
                published.push((tick, *value));
            }
        }

        assert_eq!(published, vec![(1100, 4)]);
        assert_eq!(*debouncer.debounced(), 4);
    }

    #[test]
    fn test_debounced_view_lags_live() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(0, DEFAULT_WINDOW);
        debouncer.set(7, start);
        assert_eq!(*debouncer.live(), 7);
        assert_eq!(*debouncer.debounced(), 0);
        assert_eq!(debouncer.poll(start + ms(499)), None);
        assert_eq!(debouncer.poll(start + ms(500)), Some(&7));
        assert_eq!(debouncer.next_deadline(), None);
    }

    #[test]
    fn test_mutation_restarts_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(0, ms(300));
        debouncer.set(1, start);
        assert_eq!(debouncer.next_deadline(), Some(start + ms(300)));
        debouncer.set(2, start + ms(200));
        assert_eq!(debouncer.next_deadline(), Some(start + ms(500)));
        assert_eq!(debouncer.poll(start + ms(400)), None);
    }

    #[test]
    fn test_waypoint_buffer_push_and_replace() {
        let start = Instant::now();
        let mut buffer = WaypointBuffer::new(Vec::new(), DEFAULT_WINDOW);
        buffer.push(Waypoint::new(1.0, 2.0).unwrap(), start);
        buffer.push(Waypoint::new(3.0, 4.0).unwrap(), start + ms(50));
        assert_eq!(buffer.live().len(), 2);
        assert!(buffer.debounced().is_empty());

        let published = buffer.poll(start + ms(550)).cloned().unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[1].to_array(), [3.0, 4.0]);

        buffer.replace(Vec::new(), start + ms(600));
        assert_eq!(buffer.poll(start + ms(1100)), Some(&Vec::new()));
    }
}
