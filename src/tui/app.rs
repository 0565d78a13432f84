use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::config::Config;
use crate::lifecycle::PomoState;
use crate::models::Task;
use crate::notify::{alert, Notifier};
use crate::pomodoro::{Effect, Pomodoro};
use crate::scheduler::Scheduler;
use crate::storage::Store;
use crate::timer::{IdFactory, Tick};

use super::board::Board;
use super::editor::{Editor, EditorOutcome};
use super::prompt::{Prompt, PromptAnswer};

/// How long an error stays in the footer.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(2);

/// Everything the event loop feeds into [`App::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Key(KeyEvent),
    Tick(Tick),
    SaveDue(u64),
    ClearError(u64),
}

/// Wall-clock and monotonic "now", read once per message.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    pub wall: DateTime<Local>,
    pub mono: Instant,
}

impl Clock {
    pub fn now() -> Clock {
        Clock {
            wall: Local::now(),
            mono: Instant::now(),
        }
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.wall.with_timezone(&Utc)
    }
}

/// What a confirmed prompt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DeleteTask,
    CancelPomodoro,
    CompletePomodoro,
    CancelBreak,
}

pub enum Mode {
    Normal,
    NewTask(Editor),
    EditTask(Editor),
    Confirm(Prompt<Action>),
}

pub struct App<S: Store> {
    pub pomodoro: Pomodoro<S>,
    pub board: Board,
    pub mode: Mode,
    pub show_help: bool,
    pub error: Option<String>,
    error_tag: u64,
    should_quit: bool,
    ids: IdFactory,
    notifier: Box<dyn Notifier>,
    scheduler: Scheduler<Msg>,
}

impl<S: Store> App<S> {
    /// Creates the app and loads the stored session as of `clock`.
    pub fn new(store: S, config: Config, notifier: Box<dyn Notifier>, clock: Clock) -> App<S> {
        let mut ids = IdFactory::new();
        let pomodoro = Pomodoro::new(store, config, &mut ids);
        let mut app = App {
            pomodoro,
            board: Board::default(),
            mode: Mode::Normal,
            show_help: false,
            error: None,
            error_tag: 0,
            should_quit: false,
            ids,
            notifier,
            scheduler: Scheduler::new(),
        };
        let effects = app.pomodoro.load(&clock.wall);
        app.apply(effects, clock);
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn scheduler(&self) -> &Scheduler<Msg> {
        &self.scheduler
    }

    /// Hands out every scheduled message that is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Msg> {
        self.scheduler.pop_due(now)
    }

    pub fn update(&mut self, msg: Msg, clock: Clock) {
        match msg {
            Msg::Key(key) => {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key, clock);
                }
            }
            Msg::Tick(tick) => {
                let effects = self.pomodoro.on_tick(tick, clock.utc());
                self.apply(effects, clock);
            }
            Msg::SaveDue(tag) => {
                let effects = self.pomodoro.save_due(tag);
                self.apply(effects, clock);
            }
            Msg::ClearError(tag) => {
                if tag == self.error_tag {
                    self.error = None;
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, clock: Clock) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit(clock);
            return;
        }

        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.handle_normal_key(key, clock),
            Mode::NewTask(mut editor) => match editor.handle_key(key) {
                EditorOutcome::Pending => self.mode = Mode::NewTask(editor),
                EditorOutcome::Cancel => {}
                EditorOutcome::Save(task) => {
                    let changed = self.board.append_select(stamp(task, clock));
                    self.board_changed(changed, clock);
                }
            },
            Mode::EditTask(mut editor) => match editor.handle_key(key) {
                EditorOutcome::Pending => self.mode = Mode::EditTask(editor),
                EditorOutcome::Cancel => {}
                EditorOutcome::Save(task) => {
                    let changed = self.board.set_selected(stamp(task, clock));
                    self.board_changed(changed, clock);
                }
            },
            Mode::Confirm(prompt) => match prompt.handle_key(key) {
                Some(answer) => self.answer(prompt, answer, clock),
                None => self.mode = Mode::Confirm(prompt),
            },
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, clock: Clock) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let state = self.pomodoro.state();

        let changed = match key.code {
            KeyCode::Char('q') => {
                self.quit(clock);
                false
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
                false
            }

            KeyCode::Char('s') if state.can_start() => {
                let effects = self.pomodoro.start_pomodoro(clock.utc());
                self.apply(effects, clock);
                false
            }
            KeyCode::Char('x') if state == PomoState::Active => {
                self.confirm("Cancel pomodoro?", Action::CancelPomodoro);
                false
            }
            KeyCode::Char('x') if state.on_break() => {
                self.confirm("Cancel break early?", Action::CancelBreak);
                false
            }
            KeyCode::Char('b') if state == PomoState::Ended => {
                self.confirm("Complete pomodoro and start break?", Action::CompletePomodoro);
                false
            }

            KeyCode::Char('n') => {
                let task = Task::new(self.board.focus(), "", "");
                self.mode = Mode::NewTask(Editor::new(task));
                false
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(task) = self.board.selected() {
                    self.mode = Mode::EditTask(Editor::new(task.clone()));
                }
                false
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task) = self.board.selected() {
                    let text = format!("Delete task {:?}?", task.name);
                    self.confirm(text, Action::DeleteTask);
                }
                false
            }

            KeyCode::Left if shift => self.board.move_left(),
            KeyCode::Right if shift => self.board.move_right(),
            KeyCode::Up if shift => self.board.move_up(),
            KeyCode::Down if shift => self.board.move_down(),
            KeyCode::Char('H') => self.board.move_left(),
            KeyCode::Char('L') => self.board.move_right(),
            KeyCode::Char('K') => self.board.move_up(),
            KeyCode::Char('J') => self.board.move_down(),

            KeyCode::Left | KeyCode::Char('h') => {
                self.board.left();
                false
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.board.right();
                false
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.board.up();
                false
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.board.down();
                false
            }
            _ => false,
        };
        self.board_changed(changed, clock);
    }

    fn confirm(&mut self, text: impl Into<String>, action: Action) {
        self.mode = Mode::Confirm(Prompt::new(&mut self.ids, text, action));
    }

    fn answer(&mut self, prompt: Prompt<Action>, answer: PromptAnswer, clock: Clock) {
        if !prompt.answers(answer) {
            self.mode = Mode::Confirm(prompt);
            return;
        }
        let Some(action) = prompt.confirmed(answer) else {
            return;
        };
        debug!(?action, "prompt confirmed");
        let effects = match action {
            Action::DeleteTask => {
                let removed = self.board.remove_selected().is_some();
                self.board_changed(removed, clock);
                return;
            }
            Action::CancelPomodoro => self.pomodoro.cancel_pomodoro(),
            Action::CancelBreak => self.pomodoro.cancel_break(),
            Action::CompletePomodoro => {
                self.pomodoro.complete_pomodoro(self.board.tasks(), clock.utc())
            }
        };
        self.apply(effects, clock);
    }

    fn board_changed(&mut self, changed: bool, clock: Clock) {
        if changed {
            let effects = self.pomodoro.tasks_changed(self.board.tasks());
            self.apply(effects, clock);
        }
    }

    fn quit(&mut self, clock: Clock) {
        let effects = self.pomodoro.flush();
        self.apply(effects, clock);
        self.should_quit = true;
    }

    fn apply(&mut self, effects: Vec<Effect>, clock: Clock) {
        for effect in effects {
            match effect {
                Effect::Wake(wakeup) => {
                    self.scheduler
                        .schedule(clock.mono, wakeup.after, Msg::Tick(wakeup.tick));
                }
                Effect::ScheduleSave { tag, after } => {
                    self.scheduler.schedule(clock.mono, after, Msg::SaveDue(tag));
                }
                Effect::SetTasks(tasks) => self.board.set_tasks(tasks),
                Effect::Error(message) => {
                    self.error = Some(message);
                    self.error_tag += 1;
                    self.scheduler
                        .schedule(clock.mono, ERROR_DISPLAY, Msg::ClearError(self.error_tag));
                }
                Effect::Alert(body) => alert(self.notifier.as_ref(), body),
            }
        }
    }
}

fn stamp(mut task: Task, clock: Clock) -> Task {
    task.updated_at = Some(clock.utc());
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, Status};
    use crate::notify::NoopNotifier;
    use crate::storage::FileStore;

    fn press(app: &mut App<FileStore>, code: KeyCode, clock: Clock) {
        app.update(Msg::Key(KeyEvent::new(code, KeyModifiers::NONE)), clock);
    }

    fn type_str(app: &mut App<FileStore>, s: &str, clock: Clock) {
        for c in s.chars() {
            press(app, KeyCode::Char(c), clock);
        }
    }

    /// Delivers every scheduled message due by `until`.
    fn drain(app: &mut App<FileStore>, clock: Clock, until: Instant) {
        while let Some(msg) = app.pop_due(until) {
            app.update(msg, Clock { mono: until, ..clock });
        }
    }

    fn app_in(dir: &std::path::Path) -> (App<FileStore>, Clock) {
        let store = FileStore::new(dir).unwrap();
        let clock = Clock::now();
        let app = App::new(store, Config::default(), Box::new(NoopNotifier), clock);
        (app, clock)
    }

    #[test]
    fn new_task_is_saved_after_the_debounce() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = app_in(dir.path());

        press(&mut app, KeyCode::Char('n'), clock);
        type_str(&mut app, "Wax the car", clock);
        press(&mut app, KeyCode::Enter, clock);

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.pomodoro.is_dirty());
        assert_eq!(app.pomodoro.store().get_current().unwrap(), Session::default());

        drain(&mut app, clock, clock.mono + Duration::from_secs(1));
        assert!(!app.pomodoro.is_dirty());
        let saved = app.pomodoro.store().get_current().unwrap();
        assert_eq!(saved.tasks.len(), 1);
        assert_eq!(saved.tasks[0].name, "Wax the car");
        assert_eq!(saved.tasks[0].status, Status::Todo);
        assert!(saved.tasks[0].updated_at.is_some());
    }

    #[test]
    fn delete_needs_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = app_in(dir.path());
        press(&mut app, KeyCode::Char('n'), clock);
        type_str(&mut app, "Mow the lawn", clock);
        press(&mut app, KeyCode::Enter, clock);

        press(&mut app, KeyCode::Char('d'), clock);
        press(&mut app, KeyCode::Esc, clock);
        assert_eq!(app.board.tasks().len(), 1);

        press(&mut app, KeyCode::Char('d'), clock);
        press(&mut app, KeyCode::Char('y'), clock);
        assert!(app.board.tasks().is_empty());
    }

    #[test]
    fn start_and_cancel_a_pomodoro() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = app_in(dir.path());

        press(&mut app, KeyCode::Char('s'), clock);
        assert_eq!(app.pomodoro.state(), PomoState::Active);
        assert!(!app.scheduler().is_empty());

        press(&mut app, KeyCode::Char('x'), clock);
        assert!(matches!(app.mode, Mode::Confirm(_)));
        press(&mut app, KeyCode::Enter, clock);
        assert_eq!(app.pomodoro.state(), PomoState::Idle);
        assert_eq!(app.pomodoro.store().get_current().unwrap().start, None);
    }

    #[test]
    fn moving_a_task_right_changes_its_status() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = app_in(dir.path());
        press(&mut app, KeyCode::Char('n'), clock);
        type_str(&mut app, "Paint the fence", clock);
        press(&mut app, KeyCode::Enter, clock);

        app.update(
            Msg::Key(KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT)),
            clock,
        );
        assert_eq!(app.board.focus(), Status::Doing);
        assert_eq!(app.pomodoro.session().tasks[0].status, Status::Doing);
    }

    #[test]
    fn errors_clear_themselves() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = app_in(dir.path());
        app.apply(vec![Effect::Error("boom".into())], clock);
        assert_eq!(app.error.as_deref(), Some("boom"));

        drain(&mut app, clock, clock.mono + Duration::from_secs(1));
        assert!(app.error.is_some());
        drain(&mut app, clock, clock.mono + ERROR_DISPLAY);
        assert!(app.error.is_none());
    }

    #[test]
    fn q_quits() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, clock) = app_in(dir.path());
        press(&mut app, KeyCode::Char('q'), clock);
        assert!(app.should_quit());
    }
}
