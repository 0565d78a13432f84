use chrono::{DateTime, Duration, Local, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::error::StoreError;
use crate::lifecycle::start_of_day;
use crate::models::{Session, Status};
use crate::storage::{FileStore, Store};

/// Completed pomodoros from the last `days` local days, today included.
///
/// A window reaching past the earliest representable date lists everything.
pub fn load_history(
    store: &FileStore,
    days: u32,
    now: DateTime<Local>,
) -> Result<Vec<Session>, StoreError> {
    let from = Duration::try_days(i64::from(days.max(1)) - 1)
        .and_then(|back| now.checked_sub_signed(back))
        .map(|day| start_of_day(&day));
    store.list_history(from, None)
}

/// Renders history records as a table.
pub fn history_table(records: &[Session]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Start").add_attribute(Attribute::Bold),
            Cell::new("End").add_attribute(Attribute::Bold),
            Cell::new("Length").add_attribute(Attribute::Bold),
            Cell::new("Tasks").add_attribute(Attribute::Bold),
        ]);

    for (i, r) in records.iter().enumerate() {
        let tasks = r
            .tasks
            .iter()
            .map(|t| match t.status {
                Status::Done => format!("✓ {}", t.name),
                _ => format!("… {}", t.name),
            })
            .collect::<Vec<_>>()
            .join("\n");
        let length = r
            .duration()
            .map(|d| format!("{}m", d.num_minutes()))
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(local_time(r.start)),
            Cell::new(local_time(r.end)),
            Cell::new(length),
            Cell::new(tasks).fg(if r.tasks.is_empty() { Color::Grey } else { Color::Reset }),
        ]);
    }
    table
}

fn local_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Prints completed pomodoros from the last `days` days.
pub fn cmd_history(store: &FileStore, days: u32) -> Result<(), StoreError> {
    let records = load_history(store, days, Local::now())?;
    if records.is_empty() {
        println!("No pomodoros found.");
        return Ok(());
    }
    println!("{}", history_table(&records));
    let noun = if records.len() == 1 { "pomodoro" } else { "pomodoros" };
    println!("{} {}", records.len(), noun);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use chrono::TimeZone;

    #[test]
    fn table_lists_tasks_per_record() {
        let end = Utc::now();
        let records = vec![Session {
            start: Some(end - Duration::minutes(25)),
            end: Some(end),
            tasks: vec![
                Task::new(Status::Doing, "Wax the car", ""),
                Task::new(Status::Done, "Sand the floor", ""),
            ],
        }];
        let rendered = history_table(&records).to_string();
        assert!(rendered.contains("25m"));
        assert!(rendered.contains("✓ Sand the floor"));
        assert!(rendered.contains("… Wax the car"));
    }

    #[test]
    fn history_window_starts_at_local_midnight() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();
        let now = Local::now();
        let today = Session {
            start: Some(start_of_day(&now)),
            end: Some(start_of_day(&now) + Duration::seconds(1)),
            tasks: Vec::new(),
        };
        let last_week = Session {
            start: Some(start_of_day(&now) - Duration::days(6)),
            end: Some(start_of_day(&now) - Duration::days(6) + Duration::minutes(25)),
            tasks: Vec::new(),
        };
        store.save_pomodoro(&today).unwrap();
        store.save_pomodoro(&last_week).unwrap();

        assert_eq!(load_history(&store, 1, now).unwrap().len(), 1);
        assert_eq!(load_history(&store, 8, now).unwrap().len(), 2);
    }

    #[test]
    fn huge_day_counts_list_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();
        let end = Utc.with_ymd_and_hms(1999, 12, 31, 23, 0, 0).unwrap();
        let old = Session {
            start: Some(end - Duration::minutes(25)),
            end: Some(end),
            tasks: Vec::new(),
        };
        store.save_pomodoro(&old).unwrap();

        let records = load_history(&store, u32::MAX, Local::now()).unwrap();
        assert_eq!(records, vec![old]);
    }

    #[test]
    fn history_command_reports_unreadable_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let key = crate::storage::time_key(Utc::now());
        std::fs::write(dir.path().join(format!("history/{key}.json")), "not json").unwrap();

        let err = cmd_history(&store, 1).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }
}
