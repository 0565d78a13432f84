//! The pomodoro session state machine.
//!
//! [`Pomodoro`] owns the current session, the lifecycle phase derived from
//! it, the interval timer and the pending-save bookkeeping. It never sleeps
//! or touches the terminal: every call returns the [`Effect`]s the event loop
//! has to carry out (wake-ups to schedule, board contents to replace, errors
//! to show, alerts to raise).

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::lifecycle::{break_kind, derive_state, start_of_day, PomoState};
use crate::models::{Session, Status, Task};
use crate::storage::Store;
use crate::timer::{IdFactory, IntervalTimer, Tick, TickOutcome, Wakeup};

/// Quiet period after the last task edit before the session is written.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(250);

pub const POMODORO_OVER: &str =
    "Pomodoro completed! Update your task statuses and start your break!";
pub const BREAK_OVER: &str = "Break's over! Time to start another pomodoro!";

/// Work for the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver the wake-up's tick back through [`Pomodoro::on_tick`].
    Wake(Wakeup),
    /// Call [`Pomodoro::save_due`] with `tag` after `after`.
    ScheduleSave { tag: u64, after: Duration },
    /// Replace the board's tasks.
    SetTasks(Vec<Task>),
    /// Show a transient error.
    Error(String),
    /// Beep and raise a desktop notification.
    Alert(&'static str),
}

pub struct Pomodoro<S: Store> {
    store: S,
    config: Config,

    state: PomoState,
    current: Session,
    /// Pomodoros completed today, oldest first.
    previous: Vec<Session>,

    timer: IntervalTimer,

    dirty: bool,
    tag: u64,
}

impl<S: Store> Pomodoro<S> {
    pub fn new(store: S, config: Config, ids: &mut IdFactory) -> Pomodoro<S> {
        Pomodoro {
            store,
            config,
            state: PomoState::Idle,
            current: Session::default(),
            previous: Vec::new(),
            timer: IntervalTimer::new(ids),
            dirty: false,
            tag: 0,
        }
    }

    pub fn state(&self) -> PomoState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.current
    }

    /// Today's completed pomodoros.
    pub fn previous(&self) -> &[Session] {
        &self.previous
    }

    pub fn completed_today(&self) -> usize {
        self.previous.len()
    }

    /// The in-memory session differs from what was last written.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Reads the current session and today's history, then recovers the
    /// lifecycle phase from the timestamps as seen at `now`.
    ///
    /// `now`'s time zone decides where "today" starts.
    pub fn load<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Effect> {
        let mut effects = Vec::new();
        let now_utc = now.with_timezone(&Utc);

        self.current = match self.store.get_current() {
            Ok(session) => session,
            Err(err) => {
                error!(%err, "reading current pomodoro");
                effects.push(Effect::Error(format!("reading current pomodoro: {err}")));
                Session::default()
            }
        };

        self.previous = match self.store.list_history(Some(start_of_day(now)), None) {
            Ok(previous) => previous,
            Err(err) => {
                error!(%err, "listing today's pomodoros");
                effects.push(Effect::Error(format!("listing today's pomodoros: {err}")));
                Vec::new()
            }
        };

        let derived = derive_state(&self.current, self.previous.len(), now);
        self.state = derived.state;
        self.dirty = false;

        match derived.timer_deadline {
            Some(deadline) => effects.push(Effect::Wake(self.timer.start(deadline, now_utc))),
            None => self.timer.reset(),
        }

        info!(state = %self.state, completed = self.previous.len(), "loaded current pomodoro");

        if derived.clear_stale_break {
            info!("dropping break marker from a previous day");
            self.current.clear_times();
            effects.extend(self.persist());
        }

        effects.push(Effect::SetTasks(self.current.tasks.clone()));
        effects
    }

    /// Idle or BreakEnded → Active.
    pub fn start_pomodoro(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if !self.state.can_start() {
            return Vec::new();
        }
        let end = now + self.config.pomodoro;
        self.state = PomoState::Active;
        self.current.start = Some(now);
        self.current.end = Some(end);
        info!(%end, "pomodoro started");

        let mut effects = vec![Effect::Wake(self.timer.start(end, now))];
        effects.extend(self.persist());
        effects
    }

    /// Active → Idle, discarding the interval.
    pub fn cancel_pomodoro(&mut self) -> Vec<Effect> {
        if self.state != PomoState::Active {
            return Vec::new();
        }
        info!("pomodoro cancelled");
        self.state = PomoState::Idle;
        self.current.clear_times();
        self.timer.reset();
        self.persist()
    }

    /// Break or LongBreak → Idle.
    pub fn cancel_break(&mut self) -> Vec<Effect> {
        if !self.state.on_break() {
            return Vec::new();
        }
        info!("break cancelled");
        self.state = PomoState::Idle;
        self.current.clear_times();
        self.timer.reset();
        self.persist()
    }

    /// Ended → Break or LongBreak.
    ///
    /// `tasks` is the board as it stands. Tasks past `Todo` go into the
    /// history record; tasks short of `Done` carry over into the new session.
    /// If the history record cannot be written nothing changes.
    pub fn complete_pomodoro(&mut self, tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Effect> {
        if self.state != PomoState::Ended {
            return Vec::new();
        }

        let (incomplete, worked_on) = partition_tasks(&tasks);
        let completed = Session {
            start: self.current.start,
            end: self.current.end,
            tasks: worked_on,
        };
        if let Err(err) = self.store.save_pomodoro(&completed) {
            error!(%err, "saving pomodoro");
            return vec![Effect::Error(format!("saving pomodoro: {err}"))];
        }
        self.previous.push(completed);

        self.state = break_kind(self.previous.len());
        let duration = if self.state == PomoState::LongBreak {
            self.config.long_break
        } else {
            self.config.short_break
        };
        let break_end = now + duration;
        self.current = Session {
            start: Some(break_end),
            end: None,
            tasks: incomplete.clone(),
        };
        info!(state = %self.state, %break_end, completed = self.previous.len(), "pomodoro completed");

        let mut effects = Vec::new();
        if let Err(err) = self.store.save_current(&self.current) {
            error!(%err, "updating current pomodoro");
            self.dirty = true;
            effects.push(Effect::Error(format!("updating current pomodoro: {err}")));
        } else {
            self.dirty = false;
        }

        effects.push(Effect::Wake(self.timer.start(break_end, now)));
        effects.push(Effect::SetTasks(incomplete));
        effects
    }

    /// Handles a timer wake-up.
    pub fn on_tick(&mut self, tick: Tick, now: DateTime<Utc>) -> Vec<Effect> {
        match self.timer.on_tick(tick, now) {
            TickOutcome::Ignored => Vec::new(),
            TickOutcome::Pending(wakeup) => vec![Effect::Wake(wakeup)],
            TickOutcome::TimedOut => match self.state {
                PomoState::Active => {
                    info!("pomodoro ended");
                    self.state = PomoState::Ended;
                    self.timer.reset();
                    vec![Effect::Alert(POMODORO_OVER)]
                }
                PomoState::Break | PomoState::LongBreak => {
                    info!("break ended");
                    self.state = PomoState::BreakEnded;
                    vec![Effect::Alert(BREAK_OVER)]
                }
                state => {
                    debug!(%state, "timer expired with nothing to end");
                    Vec::new()
                }
            },
        }
    }

    /// Records the board's latest contents and schedules a debounced save.
    pub fn tasks_changed(&mut self, tasks: Vec<Task>) -> Vec<Effect> {
        self.current.tasks = tasks;
        self.dirty = true;
        self.tag += 1;
        debug!(tag = self.tag, "tasks modified");
        vec![Effect::ScheduleSave {
            tag: self.tag,
            after: SAVE_DEBOUNCE,
        }]
    }

    /// A debounced save came due. Only the newest request is honoured.
    pub fn save_due(&mut self, tag: u64) -> Vec<Effect> {
        if tag != self.tag {
            debug!(tag, current = self.tag, "dropping superseded save");
            return Vec::new();
        }
        self.persist()
    }

    /// Writes pending changes immediately, e.g. on quit.
    pub fn flush(&mut self) -> Vec<Effect> {
        if !self.dirty {
            return Vec::new();
        }
        self.tag += 1;
        self.persist()
    }

    fn persist(&mut self) -> Vec<Effect> {
        match self.store.save_current(&self.current) {
            Ok(()) => {
                self.dirty = false;
                Vec::new()
            }
            Err(err) => {
                error!(%err, "saving current pomodoro");
                self.dirty = true;
                vec![Effect::Error(format!("saving current pomodoro: {err}"))]
            }
        }
    }
}

/// Splits tasks into (still open, worked on).
///
/// A task in `Doing` lands in both.
pub fn partition_tasks(tasks: &[Task]) -> (Vec<Task>, Vec<Task>) {
    let incomplete = tasks
        .iter()
        .filter(|t| t.status < Status::Done)
        .cloned()
        .collect();
    let worked_on = tasks
        .iter()
        .filter(|t| t.status > Status::Todo)
        .cloned()
        .collect();
    (incomplete, worked_on)
}
