use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::models::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Notes,
}

#[derive(Debug, PartialEq, Eq)]
pub enum EditorOutcome {
    /// Still editing.
    Pending,
    Save(Task),
    Cancel,
}

/// Two-field form for creating or editing a task.
#[derive(Debug)]
pub struct Editor {
    task: Task,
    pub name: String,
    pub notes: String,
    pub field: Field,
    pub error: Option<&'static str>,
}

impl Editor {
    pub fn new(task: Task) -> Editor {
        Editor {
            name: task.name.clone(),
            notes: task.notes.clone(),
            task,
            field: Field::Name,
            error: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorOutcome {
        match key.code {
            KeyCode::Esc => return EditorOutcome::Cancel,
            KeyCode::Enter => return self.save(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.field = match self.field {
                    Field::Name => Field::Notes,
                    Field::Notes => Field::Name,
                };
            }
            KeyCode::Backspace => {
                self.buffer_mut().pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.buffer_mut().push(c);
                self.error = None;
            }
            _ => {}
        }
        EditorOutcome::Pending
    }

    fn save(&mut self) -> EditorOutcome {
        let name = self.name.trim();
        if name.is_empty() {
            self.error = Some("name cannot be empty");
            self.field = Field::Name;
            return EditorOutcome::Pending;
        }
        let mut task = self.task.clone();
        task.name = name.to_string();
        task.notes = self.notes.trim_end().to_string();
        EditorOutcome::Save(task)
    }

    fn buffer_mut(&mut self) -> &mut String {
        match self.field {
            Field::Name => &mut self.name,
            Field::Notes => &mut self.notes,
        }
    }
}
