//! Accelerated virtual time of day.
//!
//! A minute counter advanced once per `tick_interval` of real time. The
//! day/night phase is derived from the counter against the dawn and dusk
//! thresholds, and a boundary event is pushed to the mailbox exactly
//! once per crossing.
//!
//! ```text
//!   0 ────── dawn ───────────── dusk ────── 1439 ─┐
//!   │ Night  │        Day         │  Night        │
//!   └────────┴────────────────────┴───────────────┘ (wraps)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::MINUTES_PER_DAY;
use crate::output::{STATUS_ROW_CLOCK, Status};
use crate::sync::Mailbox;
use crate::tracing::prelude::*;
use crate::types::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Phase {
    Day,
    Night,
}

impl Phase {
    /// Day covers `dawn..dusk`, night the rest of the circle.
    pub fn at(minute: u16, dawn: u16, dusk: u16) -> Phase {
        if (dawn..dusk).contains(&minute) {
            Phase::Day
        } else {
            Phase::Night
        }
    }

    fn boundary_event(self) -> Event {
        match self {
            Phase::Day => Event::day_trigger(),
            Phase::Night => Event::night_trigger(),
        }
    }
}

/// The counter and its crossing detector, without any timing.
#[derive(Debug, Clone)]
pub struct ClockFace {
    minute: u16,
    dawn: u16,
    dusk: u16,
    phase: Phase,
}

impl ClockFace {
    /// `believed` is the phase the consumer currently thinks it is in. If
    /// it differs from the phase at `minute`, the first tick that lands in
    /// the other phase still counts as a crossing.
    pub fn new(minute: u16, dawn: u16, dusk: u16, believed: Phase) -> Self {
        Self {
            minute: minute % MINUTES_PER_DAY,
            dawn,
            dusk,
            phase: believed,
        }
    }

    /// Advance one simulated minute. Returns the boundary event if the
    /// phase just changed.
    pub fn advance(&mut self) -> Option<Event> {
        self.minute = (self.minute + 1) % MINUTES_PER_DAY;
        let phase = Phase::at(self.minute, self.dawn, self.dusk);
        if phase == self.phase {
            return None;
        }
        self.phase = phase;
        Some(phase.boundary_event())
    }

    pub fn minute(&self) -> u16 {
        self.minute
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl fmt::Display for ClockFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minute / 60, self.minute % 60)
    }
}

struct Running {
    face: Arc<Mutex<ClockFace>>,
    cancel: CancellationToken,
}

/// The ticking clock. Cheap to share; start and stop from any task.
pub struct VirtualClock {
    tick_interval: Duration,
    mailbox: Arc<Mailbox<Event>>,
    status: Option<Status>,
    running: Mutex<Option<Running>>,
}

impl VirtualClock {
    pub fn new(
        tick_interval: Duration,
        mailbox: Arc<Mailbox<Event>>,
        status: Option<Status>,
    ) -> Self {
        Self {
            tick_interval,
            mailbox,
            status,
            running: Mutex::new(None),
        }
    }

    /// Arm the clock at `initial_minute`, replacing any running instance.
    ///
    /// The clock is armed believing it is day: clock mode is always
    /// entered through its day state, and a night start minute then
    /// raises a night trigger on the first crossing tick.
    pub fn start(&self, initial_minute: u16, dawn_minute: u16, dusk_minute: u16) {
        self.stop();

        let face = Arc::new(Mutex::new(ClockFace::new(
            initial_minute,
            dawn_minute,
            dusk_minute,
            Phase::Day,
        )));
        let cancel = CancellationToken::new();

        let time = face.lock().to_string();
        info!(
            time = %time,
            dawn = dawn_minute,
            dusk = dusk_minute,
            interval = ?self.tick_interval,
            "Virtual clock started"
        );

        tokio::spawn(tick_loop(
            face.clone(),
            self.tick_interval,
            self.mailbox.clone(),
            self.status.clone(),
            cancel.clone(),
        ));

        *self.running.lock() = Some(Running { face, cancel });
    }

    /// Stop ticking. Idempotent.
    ///
    /// A tick already pushing its boundary event finishes that push; the
    /// event then reaches whichever state is active and is ignored there
    /// if it no longer applies.
    pub fn stop(&self) {
        if let Some(running) = self.running.lock().take() {
            running.cancel.cancel();
            let time = running.face.lock().to_string();
            info!(time = %time, "Virtual clock stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Current counter value and phase, if running.
    pub fn reading(&self) -> Option<(u16, Phase)> {
        self.running.lock().as_ref().map(|running| {
            let face = running.face.lock();
            (face.minute(), face.phase())
        })
    }
}

impl Drop for VirtualClock {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_loop(
    face: Arc<Mutex<ClockFace>>,
    tick_interval: Duration,
    mailbox: Arc<Mailbox<Event>>,
    status: Option<Status>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let (event, time) = {
            let mut face = face.lock();
            (face.advance(), face.to_string())
        };
        trace!(time = %time, "Clock tick");

        if let Some(status) = &status {
            status.write_line(STATUS_ROW_CLOCK, &time).await;
        }

        if let Some(event) = event {
            info!(time = %time, event = %event, "Day/night boundary crossed");
            // Not raced against cancellation: a push in flight completes
            // and the mailbox's backpressure orders it against whatever
            // the machine is doing.
            if mailbox.put(event).await.is_err() {
                debug!("Mailbox closed, clock exiting");
                break;
            }
        }
    }

    trace!("Clock task stopped");
}

#[cfg(test)]
mod tests {
    use tokio::time;

    use super::*;

    #[test]
    fn phase_boundaries_are_half_open() {
        assert_eq!(Phase::at(389, 390, 1200), Phase::Night);
        assert_eq!(Phase::at(390, 390, 1200), Phase::Day);
        assert_eq!(Phase::at(1199, 390, 1200), Phase::Day);
        assert_eq!(Phase::at(1200, 390, 1200), Phase::Night);
    }

    #[test]
    fn fires_once_per_crossing_across_midnight() {
        let mut face = ClockFace::new(1438, 0, 1439, Phase::Day);

        assert_eq!(face.advance(), Some(Event::night_trigger()));
        assert_eq!(face.minute(), 1439);
        assert_eq!(face.advance(), Some(Event::day_trigger()));
        assert_eq!(face.minute(), 0);

        for _ in 0..100 {
            assert_eq!(face.advance(), None);
        }
    }

    #[test]
    fn two_crossings_per_simulated_day() {
        let mut face = ClockFace::new(0, 390, 1200, Phase::Night);
        let events: Vec<Event> = (0..MINUTES_PER_DAY * 3)
            .filter_map(|_| face.advance())
            .collect();

        assert_eq!(events.len(), 6);
        for pair in events.chunks(2) {
            assert_eq!(pair, [Event::day_trigger(), Event::night_trigger()]);
        }
    }

    #[test]
    fn mismatched_belief_resolves_on_first_tick() {
        let mut face = ClockFace::new(100, 390, 1200, Phase::Day);
        assert_eq!(face.advance(), Some(Event::night_trigger()));
        assert_eq!(face.advance(), None);
    }

    #[test]
    fn displays_as_hours_and_minutes() {
        assert_eq!(ClockFace::new(0, 1, 2, Phase::Day).to_string(), "00:00");
        assert_eq!(ClockFace::new(1439, 1, 2, Phase::Day).to_string(), "23:59");
        assert_eq!(ClockFace::new(390, 1, 2, Phase::Day).to_string(), "06:30");
    }

    #[tokio::test(start_paused = true)]
    async fn pushes_boundary_events_into_mailbox() {
        let mailbox = Arc::new(Mailbox::new());
        let clock = VirtualClock::new(Duration::from_secs(1), mailbox.clone(), None);

        clock.start(1438, 0, 1439);
        assert_eq!(mailbox.get().await.unwrap(), Event::night_trigger());
        assert_eq!(mailbox.get().await.unwrap(), Event::day_trigger());

        let quiet = time::timeout(Duration::from_secs(100), mailbox.get()).await;
        assert!(quiet.is_err(), "no events between crossings");
        assert_eq!(clock.reading().map(|(_, phase)| phase), Some(Phase::Day));
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_stop() {
        let mailbox = Arc::new(Mailbox::new());
        let clock = VirtualClock::new(Duration::from_secs(1), mailbox.clone(), None);

        clock.start(1430, 0, 1439);
        time::sleep(Duration::from_secs(3)).await;
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.reading(), None);

        let quiet = time::timeout(Duration::from_secs(60), mailbox.get()).await;
        assert!(quiet.is_err(), "stopped clock must not push");
    }

    #[tokio::test(start_paused = true)]
    async fn push_in_flight_completes_after_stop() {
        let mailbox = Arc::new(Mailbox::new());
        mailbox.put(Event::auto()).await.unwrap();
        let clock = VirtualClock::new(Duration::from_secs(1), mailbox.clone(), None);

        // Crossing on the first tick; the push blocks behind the pending
        // item.
        clock.start(1438, 0, 1439);
        time::sleep(Duration::from_millis(1500)).await;
        clock.stop();

        assert_eq!(mailbox.get().await.unwrap(), Event::auto());
        assert_eq!(mailbox.get().await.unwrap(), Event::night_trigger());
        let quiet = time::timeout(Duration::from_secs(60), mailbox.get()).await;
        assert!(quiet.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn writes_time_to_status_display() {
        use crate::output::memory::MemoryDisplay;

        let display = MemoryDisplay::new();
        let status = Status::new(Box::new(display.clone()));
        let mailbox = Arc::new(Mailbox::new());
        let clock = VirtualClock::new(Duration::from_secs(1), mailbox, Some(status));

        clock.start(719, 390, 1200);
        time::sleep(Duration::from_millis(2500)).await;
        clock.stop();

        assert_eq!(display.row(STATUS_ROW_CLOCK).as_deref(), Some("12:01"));
    }
}
