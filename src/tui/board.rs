//! The kanban board: one column per task status.
//!
//! Mutating methods return `true` when the task list changed so the caller
//! can report it to the pomodoro state machine.

use ratatui::widgets::ListState;

use crate::models::{Status, Task};

#[derive(Debug, Default)]
pub struct Column {
    pub tasks: Vec<Task>,
    pub state: ListState,
}

impl Column {
    fn selected(&self) -> Option<usize> {
        self.state.selected().filter(|&i| i < self.tasks.len())
    }

    /// Clamps the selection into range, selecting the first task if none is.
    fn select(&mut self, index: Option<usize>) {
        let index = match (index, self.tasks.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.state.select(index);
    }
}

#[derive(Debug, Default)]
pub struct Board {
    columns: [Column; 3],
    focus: Status,
}

impl Board {
    pub fn new(tasks: Vec<Task>) -> Board {
        let mut board = Board::default();
        board.set_tasks(tasks);
        board
    }

    /// Replaces every column's contents, keeping selections where possible.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        for column in self.columns.iter_mut() {
            column.tasks.clear();
        }
        for task in tasks {
            self.columns[task.status.index()].tasks.push(task);
        }
        for column in self.columns.iter_mut() {
            let selected = column.state.selected();
            column.select(selected);
        }
    }

    /// All tasks, column by column.
    pub fn tasks(&self) -> Vec<Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter().cloned())
            .collect()
    }

    pub fn columns(&self) -> &[Column; 3] {
        &self.columns
    }

    pub fn column_state_mut(&mut self, status: Status) -> &mut ListState {
        &mut self.columns[status.index()].state
    }

    /// The focused column.
    pub fn focus(&self) -> Status {
        self.focus
    }

    pub fn selected(&self) -> Option<&Task> {
        let column = self.column();
        column.selected().map(|i| &column.tasks[i])
    }

    pub fn up(&mut self) {
        let column = self.column_mut();
        if let Some(i) = column.selected() {
            column.select(Some(i.saturating_sub(1)));
        }
    }

    pub fn down(&mut self) {
        let column = self.column_mut();
        if let Some(i) = column.selected() {
            column.select(Some(i + 1));
        }
    }

    pub fn left(&mut self) {
        if let Some(status) = self.focus.index().checked_sub(1).and_then(Status::from_index) {
            self.set_focus(status);
        }
    }

    pub fn right(&mut self) {
        if let Some(status) = Status::from_index(self.focus.index() + 1) {
            self.set_focus(status);
        }
    }

    /// Moves focus to `status`, carrying the row position across.
    fn set_focus(&mut self, status: Status) {
        let row = self.column().selected();
        self.focus = status;
        self.column_mut().select(row);
    }

    #[must_use]
    pub fn move_up(&mut self) -> bool {
        let column = self.column_mut();
        match column.selected() {
            Some(i) if i > 0 => {
                column.tasks.swap(i, i - 1);
                column.select(Some(i - 1));
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn move_down(&mut self) -> bool {
        let column = self.column_mut();
        match column.selected() {
            Some(i) if i + 1 < column.tasks.len() => {
                column.tasks.swap(i, i + 1);
                column.select(Some(i + 1));
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn move_left(&mut self) -> bool {
        match self.focus.index().checked_sub(1).and_then(Status::from_index) {
            Some(status) => self.move_to(status),
            None => false,
        }
    }

    #[must_use]
    pub fn move_right(&mut self) -> bool {
        match Status::from_index(self.focus.index() + 1) {
            Some(status) => self.move_to(status),
            None => false,
        }
    }

    /// Moves the selected task into `status`'s column at the same row and
    /// follows it there.
    fn move_to(&mut self, status: Status) -> bool {
        let Some(i) = self.column().selected() else {
            return false;
        };
        let mut task = self.column_mut().tasks.remove(i);
        self.column_mut().select(Some(i));

        task.status = status;
        self.focus = status;
        let target = self.column_mut();
        let at = i.min(target.tasks.len());
        target.tasks.insert(at, task);
        target.select(Some(at));
        true
    }

    /// Adds `task` to the end of its status column and selects it.
    #[must_use]
    pub fn append_select(&mut self, task: Task) -> bool {
        self.focus = task.status;
        let column = self.column_mut();
        column.tasks.push(task);
        let last = column.tasks.len() - 1;
        column.select(Some(last));
        true
    }

    /// Replaces the selected task.
    #[must_use]
    pub fn set_selected(&mut self, mut task: Task) -> bool {
        let focus = self.focus;
        let column = self.column_mut();
        match column.selected() {
            Some(i) => {
                task.status = focus;
                column.tasks[i] = task;
                true
            }
            None => false,
        }
    }

    /// Removes and returns the selected task.
    pub fn remove_selected(&mut self) -> Option<Task> {
        let column = self.column_mut();
        let i = column.selected()?;
        let task = column.tasks.remove(i);
        column.select(Some(i));
        Some(task)
    }

    fn column(&self) -> &Column {
        &self.columns[self.focus.index()]
    }

    fn column_mut(&mut self) -> &mut Column {
        &mut self.columns[self.focus.index()]
    }
}
