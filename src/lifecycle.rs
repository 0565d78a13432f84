//! Pomodoro lifecycle phases and how they are recovered from a stored session.
//!
//! The phase is never persisted. It is recomputed from the session's start
//! and end instants every time the session is loaded, which keeps the program
//! correct no matter how long it was closed.

use std::fmt;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use crate::models::Session;

/// Every n-th completed pomodoro of the day earns a long break.
pub const LONG_BREAK_EVERY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PomoState {
    /// No timer is running.
    #[default]
    Idle,
    /// A pomodoro timer is running.
    Active,
    /// A pomodoro has finished and the user is reporting what they did.
    Ended,
    /// A short break timer is running.
    Break,
    /// A long break timer is running.
    LongBreak,
    /// A break timer has finished.
    BreakEnded,
}

impl PomoState {
    pub fn on_break(self) -> bool {
        matches!(self, PomoState::Break | PomoState::LongBreak)
    }

    /// A new pomodoro may be started from here.
    pub fn can_start(self) -> bool {
        matches!(self, PomoState::Idle | PomoState::BreakEnded)
    }
}

impl fmt::Display for PomoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PomoState::Idle => "idle",
            PomoState::Active => "active",
            PomoState::Ended => "ended",
            PomoState::Break => "break",
            PomoState::LongBreak => "long break",
            PomoState::BreakEnded => "break ended",
        };
        f.write_str(s)
    }
}

/// Break flavour earned after `completed` pomodoros today.
pub fn break_kind(completed: usize) -> PomoState {
    if completed > 0 && completed % LONG_BREAK_EVERY == 0 {
        PomoState::LongBreak
    } else {
        PomoState::Break
    }
}

/// Result of [`derive_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub state: PomoState,
    /// Instant the interval timer must be armed for, if any.
    pub timer_deadline: Option<DateTime<Utc>>,
    /// The session holds a break marker from a previous day that has to be
    /// dropped (and the session rewritten).
    pub clear_stale_break: bool,
}

impl Derivation {
    fn new(state: PomoState) -> Derivation {
        Derivation {
            state,
            timer_deadline: None,
            clear_stale_break: false,
        }
    }

    fn armed(state: PomoState, deadline: DateTime<Utc>) -> Derivation {
        Derivation {
            state,
            timer_deadline: Some(deadline),
            clear_stale_break: false,
        }
    }
}

/// Midnight at the start of `now`'s calendar day, in `now`'s time zone.
///
/// When local midnight does not exist (a DST gap at 00:00) the earliest
/// valid instant after the gap is used.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    let tz = now.timezone();
    if let Some(t) = tz.from_local_datetime(&midnight).earliest() {
        return t.with_timezone(&Utc);
    }
    (1..=24 * 4)
        .map(|quarters| midnight + chrono::Duration::minutes(15 * quarters))
        .find_map(|t| tz.from_local_datetime(&t).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

/// Infers the lifecycle phase of `session` at `now`.
///
/// | phase       | start         | end    |
/// |-------------|---------------|--------|
/// | idle        | unset         | any    |
/// | break       | now or later  | any    |
/// | active      | past          | future |
/// | ended       | past          | past   |
/// | break ended | earlier today | unset  |
/// | idle        | before today  | unset  |
///
/// Rows are checked top to bottom. `completed_today` picks between a short
/// and a long break.
pub fn derive_state<Tz: TimeZone>(
    session: &Session,
    completed_today: usize,
    now: &DateTime<Tz>,
) -> Derivation {
    let now_utc = now.with_timezone(&Utc);

    let Some(start) = session.start else {
        return Derivation::new(PomoState::Idle);
    };
    if start >= now_utc {
        return Derivation::armed(break_kind(completed_today), start);
    }
    // start < now from here on
    match session.end {
        Some(end) if end > now_utc => Derivation::armed(PomoState::Active, end),
        Some(_) => Derivation::new(PomoState::Ended),
        // end unset from here on
        None if start > start_of_day(now) => Derivation::new(PomoState::BreakEnded),
        None => Derivation {
            state: PomoState::Idle,
            timer_deadline: None,
            clear_stale_break: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime};

    fn at(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Session {
        Session {
            start,
            end,
            tasks: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 13, 0, 0).unwrap()
    }

    #[test]
    fn unset_start_is_idle_whatever_the_end() {
        for end in [None, Some(now() - Duration::hours(1)), Some(now() + Duration::hours(1))] {
            let d = derive_state(&at(None, end), 7, &now());
            assert_eq!(d.state, PomoState::Idle);
            assert_eq!(d.timer_deadline, None);
            assert!(!d.clear_stale_break);
        }
    }

    #[test]
    fn future_start_is_a_break() {
        let start = now() + Duration::minutes(3);
        for count in [0, 1, 2, 3, 5, 7] {
            let d = derive_state(&at(Some(start), None), count, &now());
            assert_eq!(d.state, PomoState::Break, "count {count}");
            assert_eq!(d.timer_deadline, Some(start));
        }
    }

    #[test]
    fn every_fourth_completion_is_a_long_break() {
        let start = now() + Duration::minutes(10);
        for count in [4, 8, 12] {
            let d = derive_state(&at(Some(start), None), count, &now());
            assert_eq!(d.state, PomoState::LongBreak, "count {count}");
        }
    }

    #[test]
    fn start_equal_to_now_is_still_a_break() {
        let d = derive_state(&at(Some(now()), Some(now() + Duration::minutes(1))), 0, &now());
        assert_eq!(d.state, PomoState::Break);
    }

    #[test]
    fn running_pomodoro_is_active() {
        let session = at(Some(now() - Duration::minutes(10)), Some(now() + Duration::minutes(15)));
        let d = derive_state(&session, 0, &now());
        assert_eq!(d.state, PomoState::Active);
        assert_eq!(d.timer_deadline, session.end);
    }

    #[test]
    fn finished_pomodoro_is_ended() {
        let session = at(Some(now() - Duration::minutes(40)), Some(now() - Duration::minutes(15)));
        let d = derive_state(&session, 0, &now());
        assert_eq!(d.state, PomoState::Ended);
        assert_eq!(d.timer_deadline, None);

        let exactly = at(Some(now() - Duration::minutes(25)), Some(now()));
        assert_eq!(derive_state(&exactly, 0, &now()).state, PomoState::Ended);
    }

    #[test]
    fn break_over_earlier_today() {
        let d = derive_state(&at(Some(now() - Duration::hours(2)), None), 2, &now());
        assert_eq!(d.state, PomoState::BreakEnded);
        assert!(!d.clear_stale_break);
    }

    #[test]
    fn break_over_before_today_is_cleared() {
        let yesterday = Utc.with_ymd_and_hms(2024, 5, 13, 14, 0, 0).unwrap();
        let d = derive_state(&at(Some(yesterday), None), 0, &now());
        assert_eq!(d.state, PomoState::Idle);
        assert!(d.clear_stale_break);
    }

    #[test]
    fn today_follows_the_callers_time_zone() {
        // 01:00 on the 14th in UTC+3 is 22:00 on the 13th in UTC.
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 5, 14, 9, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 13, 22, 0, 0).unwrap();
        let d = derive_state(&at(Some(start), None), 0, &now);
        assert_eq!(d.state, PomoState::BreakEnded);

        let start = Utc.with_ymd_and_hms(2024, 5, 13, 20, 59, 0).unwrap();
        let d = derive_state(&at(Some(start), None), 0, &now);
        assert_eq!(d.state, PomoState::Idle);
        assert!(d.clear_stale_break);
    }

    #[test]
    fn start_of_day_in_fixed_offset() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 1, 2, 23, 30, 0).unwrap();
        assert_eq!(start_of_day(&now), Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap());
    }

    /// Clocks jump from UTC+0 to UTC+1 at 2024-03-10 00:00 UTC, so local
    /// times from 00:00 to 01:00 on the 10th never happen.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn switch() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 10)
                .unwrap()
                .and_time(NaiveTime::MIN)
        }

        fn before() -> FixedOffset {
            FixedOffset::east_opt(0).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let switch = Self::switch();
            if *local < switch {
                LocalResult::Single(Self::before())
            } else if *local < switch + Duration::hours(1) {
                LocalResult::None
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn start_of_day_skips_a_missing_midnight() {
        let noon = Utc.with_ymd_and_hms(2024, 3, 10, 11, 0, 0).unwrap();
        let now = noon.with_timezone(&MidnightGap);
        assert_eq!(now.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        // first local quarter hour after the gap is 01:00, i.e. 00:00 UTC
        assert_eq!(start_of_day(&now), Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());

        let next_day = (noon + Duration::days(1)).with_timezone(&MidnightGap);
        assert_eq!(
            start_of_day(&next_day),
            Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap()
        );
    }
}
