use crossterm::event::{KeyCode, KeyEvent};

use crate::timer::{ComponentId, IdFactory};

/// Answer from a prompt, tagged with the prompt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Confirm(ComponentId),
    Cancel(ComponentId),
}

/// A yes/no question that runs `action` when confirmed.
#[derive(Debug, Clone)]
pub struct Prompt<A> {
    id: ComponentId,
    pub text: String,
    action: A,
}

impl<A: Copy> Prompt<A> {
    pub fn new(ids: &mut IdFactory, text: impl Into<String>, action: A) -> Prompt<A> {
        Prompt {
            id: ids.next_id(),
            text: text.into(),
            action,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn handle_key(&self, key: KeyEvent) -> Option<PromptAnswer> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                Some(PromptAnswer::Confirm(self.id))
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                Some(PromptAnswer::Cancel(self.id))
            }
            _ => None,
        }
    }

    /// The action to run for `answer`, if it confirms this prompt.
    pub fn confirmed(&self, answer: PromptAnswer) -> Option<A> {
        match answer {
            PromptAnswer::Confirm(id) if id == self.id => Some(self.action),
            _ => None,
        }
    }

    /// `answer` closes this prompt.
    pub fn answers(&self, answer: PromptAnswer) -> bool {
        match answer {
            PromptAnswer::Confirm(id) | PromptAnswer::Cancel(id) => id == self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn answers_from_other_prompts_are_ignored() {
        let mut ids = IdFactory::new();
        let old = Prompt::new(&mut ids, "Delete task?", 1);
        let new = Prompt::new(&mut ids, "Cancel pomodoro?", 2);

        let stale = old
            .handle_key(KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE))
            .unwrap();
        assert_eq!(new.confirmed(stale), None);
        assert!(!new.answers(stale));
        assert_eq!(old.confirmed(stale), Some(1));
    }

    #[test]
    fn cancel_closes_without_action() {
        let mut ids = IdFactory::new();
        let p = Prompt::new(&mut ids, "Cancel break early?", ());
        let answer = p
            .handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
            .unwrap();
        assert!(p.answers(answer));
        assert_eq!(p.confirmed(answer), None);
    }
}
