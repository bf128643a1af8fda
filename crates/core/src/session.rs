use crate::models::{Mode, Turn};
use uuid::Uuid;

/// Per-session chat state, owned by the host and passed into every turn.
///
/// History only grows through [`Session::record_exchange`], two turns at a time.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    history: Vec<Turn>,
    mode: Mode,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
            mode: Mode::default(),
        }
    }

    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::new()
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Last write wins; recorded history is left untouched.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.history.reserve(2);
        self.history.push(Turn::user(question));
        self.history.push(Turn::assistant(answer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn new_session_starts_empty_in_document_search() {
        let session = Session::new();
        assert!(session.history().is_empty());
        assert_eq!(session.mode(), Mode::DocumentSearch);
    }

    #[test]
    fn exchange_appends_user_then_assistant() {
        let mut session = Session::new();
        session.record_exchange("where is the leave policy?", "b.csv");

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, Role::User);
        assert_eq!(session.history()[1], Turn::assistant("b.csv"));
    }

    #[test]
    fn switching_mode_keeps_history() {
        let mut session = Session::new();
        session.record_exchange("q1", "a1");
        let before = session.history().to_vec();

        session.set_mode(Mode::Inquiry);

        assert_eq!(session.history(), before.as_slice());
        assert_eq!(session.mode(), Mode::Inquiry);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }
}
