//! A restartable countdown to a wall-clock instant.
//!
//! The timer knows nothing about pomodoros. It is armed with an end instant,
//! asks to be woken up often enough to refresh a seconds display, and reports
//! once when the instant has passed. Wake-ups carry the timer's id and arm
//! generation so a wake-up scheduled before a `reset` or a new `start` is
//! ignored.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Identifies one component instance (a timer, a prompt) in event messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

/// Hands out process-unique component ids.
///
/// One factory is created at startup and passed to every constructor that
/// needs an id.
#[derive(Debug, Default)]
pub struct IdFactory {
    last: u64,
}

impl IdFactory {
    pub fn new() -> IdFactory {
        IdFactory::default()
    }

    pub fn next_id(&mut self) -> ComponentId {
        self.last += 1;
        ComponentId(self.last)
    }
}

/// Display refresh cadence. Half a second keeps the blinking colon honest.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Active,
    TimedOut,
}

/// A scheduled wake-up for one particular arming of one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub id: ComponentId,
    arm: u64,
}

/// A request to deliver `tick` back to the timer after `after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wakeup {
    pub after: Duration,
    pub tick: Tick,
}

/// What a delivered tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale or foreign tick; nothing changed.
    Ignored,
    /// Still counting down; schedule the next wake-up.
    Pending(Wakeup),
    /// The deadline passed. Reported exactly once per arming.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct IntervalTimer {
    id: ComponentId,
    state: TimerState,
    end: Option<DateTime<Utc>>,
    arm: u64,
}

impl IntervalTimer {
    pub fn new(ids: &mut IdFactory) -> IntervalTimer {
        IntervalTimer {
            id: ids.next_id(),
            state: TimerState::Idle,
            end: None,
            arm: 0,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TimerState::Active
    }

    /// Deadline of the current arming, if active.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Arms the timer for `end`, superseding any earlier arming.
    pub fn start(&mut self, end: DateTime<Utc>, now: DateTime<Utc>) -> Wakeup {
        self.arm += 1;
        self.state = TimerState::Active;
        self.end = Some(end);
        self.next_wakeup(now)
    }

    /// Back to idle. Outstanding wake-ups become no-ops.
    pub fn reset(&mut self) {
        self.arm += 1;
        self.state = TimerState::Idle;
        self.end = None;
    }

    pub fn on_tick(&mut self, tick: Tick, now: DateTime<Utc>) -> TickOutcome {
        if tick.id != self.id || tick.arm != self.arm || self.state != TimerState::Active {
            return TickOutcome::Ignored;
        }
        match self.end {
            Some(end) if now < end => TickOutcome::Pending(self.next_wakeup(now)),
            _ => {
                self.state = TimerState::TimedOut;
                self.end = None;
                TickOutcome::TimedOut
            }
        }
    }

    /// Time left until the deadline; zero unless active.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match (self.state, self.end) {
            (TimerState::Active, Some(end)) => (end - now).to_std().unwrap_or_default(),
            _ => Duration::ZERO,
        }
    }

    /// Remaining time formatted for display.
    pub fn view(&self, now: DateTime<Utc>) -> String {
        format_remaining(self.remaining(now))
    }

    fn next_wakeup(&self, now: DateTime<Utc>) -> Wakeup {
        // land just past the next half-second boundary of the remaining time
        let remaining = self.remaining(now);
        let step = TICK_INTERVAL.as_millis() as u64;
        let after = Duration::from_millis((remaining.as_millis() as u64) % step + 1);
        Wakeup {
            after,
            tick: Tick {
                id: self.id,
                arm: self.arm,
            },
        }
    }
}

/// Formats `remaining` as `MM:SS`, or `HH:MM:SS` from one hour up.
///
/// Seconds round up so the display only reads `00:00` once time is out.
/// The colon turns into a space during the first half of each second.
pub fn format_remaining(remaining: Duration) -> String {
    let nanos = remaining.subsec_nanos();
    let mut seconds = remaining.as_secs();
    if nanos > 0 {
        seconds += 1;
    }

    let minutes = seconds / 60;
    let seconds = seconds % 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;

    let colon = if nanos > 0 && nanos <= 500_000_000 { " " } else { ":" };

    if hours > 0 {
        format!("{hours:02}{colon}{minutes:02}{colon}{seconds:02}")
    } else {
        format!("{minutes:02}{colon}{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 13, 0, 0).unwrap()
    }

    #[test]
    fn ids_are_unique_per_factory() {
        let mut ids = IdFactory::new();
        let a = IntervalTimer::new(&mut ids);
        let b = IntervalTimer::new(&mut ids);
        assert_ne!(a.id(), b.id());
        assert!(a.id() < b.id());
    }

    #[test]
    fn format_rounds_up_and_blinks() {
        assert_eq!(format_remaining(Duration::from_secs(15 * 60)), "15:00");
        assert_eq!(format_remaining(Duration::from_millis(14 * 60_000 + 59_900)), "15:00");
        assert_eq!(format_remaining(Duration::from_millis(14 * 60_000 + 59_300)), "15 00");
        assert_eq!(format_remaining(Duration::from_millis(1)), "00 01");
        assert_eq!(format_remaining(Duration::ZERO), "00:00");
        assert_eq!(format_remaining(Duration::from_secs(3600 + 61)), "01:01:01");
    }

    #[test]
    fn idle_timer_has_nothing_left() {
        let mut ids = IdFactory::new();
        let timer = IntervalTimer::new(&mut ids);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(t0()), Duration::ZERO);
        assert_eq!(timer.view(t0()), "00:00");
    }

    #[test]
    fn ticks_until_the_deadline_then_times_out_once() {
        let mut ids = IdFactory::new();
        let mut timer = IntervalTimer::new(&mut ids);
        let end = t0() + chrono::Duration::seconds(2);
        let wakeup = timer.start(end, t0());
        assert!(wakeup.after <= TICK_INTERVAL);
        assert_eq!(timer.remaining(t0()), Duration::from_secs(2));

        let outcome = timer.on_tick(wakeup.tick, t0() + chrono::Duration::seconds(1));
        let TickOutcome::Pending(next) = outcome else {
            panic!("expected another wake-up, got {outcome:?}");
        };

        assert_eq!(timer.on_tick(next.tick, end), TickOutcome::TimedOut);
        assert_eq!(timer.state(), TimerState::TimedOut);
        assert_eq!(timer.on_tick(next.tick, end), TickOutcome::Ignored);
    }

    #[test]
    fn wakeups_align_to_half_seconds() {
        let mut ids = IdFactory::new();
        let mut timer = IntervalTimer::new(&mut ids);
        let end = t0() + chrono::Duration::milliseconds(10_200);
        let wakeup = timer.start(end, t0());
        assert_eq!(wakeup.after, Duration::from_millis(201));
    }

    #[test]
    fn stale_ticks_are_ignored_after_reset_or_restart() {
        let mut ids = IdFactory::new();
        let mut timer = IntervalTimer::new(&mut ids);
        let first = timer.start(t0() + chrono::Duration::seconds(1), t0());

        timer.reset();
        let late = t0() + chrono::Duration::seconds(5);
        assert_eq!(timer.on_tick(first.tick, late), TickOutcome::Ignored);
        assert_eq!(timer.state(), TimerState::Idle);

        let second = timer.start(t0() + chrono::Duration::minutes(5), t0());
        assert_eq!(timer.on_tick(first.tick, late), TickOutcome::Ignored);
        assert!(timer.is_active());
        assert!(matches!(timer.on_tick(second.tick, late), TickOutcome::Pending(_)));
    }

    #[test]
    fn ticks_for_other_timers_are_ignored() {
        let mut ids = IdFactory::new();
        let mut a = IntervalTimer::new(&mut ids);
        let mut b = IntervalTimer::new(&mut ids);
        let end = t0() + chrono::Duration::seconds(1);
        a.start(end, t0());
        let wb = b.start(end, t0());
        assert_eq!(a.on_tick(wb.tick, end), TickOutcome::Ignored);
        assert!(a.is_active());
    }
}
