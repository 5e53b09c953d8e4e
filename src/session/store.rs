//! In-memory state of one interview attempt.
//!
//! `SessionStore` is a plain reducer: every operation is synchronous, never
//! fails and performs no I/O. Inputs are trusted to have been validated by
//! the orchestrator; the only correction applied here is cursor clamping in
//! `next_question` / `previous_question`.

use std::collections::HashMap;

use serde::Serialize;

use super::types::{Answer, Question, Session};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStore {
    session: Option<Session>,
    questions: Vec<Question>,
    answers: HashMap<String, Answer>,
    current_index: usize,
    is_loading: bool,
    is_submitting: bool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Replace session metadata wholesale.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Replace the question list. Answers and cursor are left alone.
    pub fn set_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
    }

    /// Insert or overwrite the answer for `question_id`.
    pub fn save_answer(&mut self, question_id: impl Into<String>, answer: Answer) {
        self.answers.insert(question_id.into(), answer);
    }

    /// Set the cursor verbatim. Callers clamp.
    pub fn set_current_index(&mut self, index: usize) {
        self.current_index = index;
    }

    /// Advance the cursor; no-op on the last question.
    pub fn next_question(&mut self) {
        let last = self.questions.len().saturating_sub(1);
        self.current_index = (self.current_index + 1).min(last);
    }

    /// Step the cursor back; no-op on the first question.
    pub fn previous_question(&mut self) {
        self.current_index = self.current_index.saturating_sub(1);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.is_submitting = submitting;
    }

    /// Back to the initial empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn answers(&self) -> &HashMap<String, Answer> {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Number of loaded questions that have an answer.
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.answers.contains_key(&q.id))
            .count()
    }

    /// Fraction of questions answered, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.answered_count() as f64 / self.questions.len() as f64
    }

    /// True iff every required question has an answer.
    pub fn can_submit(&self) -> bool {
        self.questions
            .iter()
            .filter(|q| q.is_required)
            .all(|q| self.answers.contains_key(&q.id))
    }

    /// Ids of required questions still lacking an answer, in question order.
    pub fn missing_required(&self) -> Vec<&str> {
        self.questions
            .iter()
            .filter(|q| q.is_required && !self.answers.contains_key(&q.id))
            .map(|q| q.id.as_str())
            .collect()
    }

    pub fn can_go_next(&self) -> bool {
        self.current_index + 1 < self.questions.len()
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_index > 0
    }

    pub fn is_last_question(&self) -> bool {
        !self.questions.is_empty() && self.current_index == self.questions.len() - 1
    }
}
