//! Storage seam between the HTTP handlers and the backends.
//!
//! Two backends implement [`PollStore`]: the MongoDB repos in [`crate::db`]
//! (the production store, constraints enforced by unique indexes) and the
//! in-memory store in [`memory`] (handler tests and no-database dev runs).
//! Both must enforce the same uniqueness rules: question text is unique
//! case-insensitively across all questions, choice text is unique
//! case-insensitively within its question.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::errors::StoreError;
use crate::models::poll_api_model::{ChoiceRequest, NewQuestionRequest};
use crate::models::question::{clean_text, uniqueness_key, Choice, Question};

pub mod memory;

#[async_trait]
pub trait PollStore: Send + Sync {
    /// Persists a question together with its initial choices, all or
    /// nothing. Fails with the duplicate errors on constraint violations.
    async fn insert_question(&self, new: NewQuestionRequest) -> Result<Question, StoreError>;

    /// Published questions only (`pub_date <= now`), newest first, plus the
    /// total count of published questions for pagination.
    async fn latest_questions(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Question>, u64), StoreError>;

    async fn get_question(&self, id: &str) -> Result<Option<Question>, StoreError>;

    /// Choices of a question in insertion order.
    async fn choices_for(&self, question_id: &str) -> Result<Vec<Choice>, StoreError>;

    async fn insert_choice(
        &self,
        question_id: &str,
        new: ChoiceRequest,
    ) -> Result<Choice, StoreError>;

    /// Adds one vote to a choice, scoped to the given question. A choice id
    /// that exists under a different question is [`StoreError::UnknownChoice`].
    async fn record_vote(&self, question_id: &str, choice_id: &str)
        -> Result<Choice, StoreError>;

    /// Removes the question and cascades to its choices. `false` when no
    /// question matched.
    async fn delete_question(&self, id: &str) -> Result<bool, StoreError>;
}

/// Validates a creation request and builds the records to store. Duplicates
/// inside the request's own choice list are rejected here; duplicates against
/// stored rows are the backend's job.
pub(crate) fn new_question_records(
    new: NewQuestionRequest,
) -> Result<(Question, Vec<Choice>), StoreError> {
    let created = Utc::now();
    let question_text = clean_text("Question text", &new.question_text)?;
    let question = Question::new(question_text, new.pub_date.unwrap_or(created));
    let mut seen = HashSet::new();
    let mut choices = Vec::with_capacity(new.choices.len());
    for (position, choice) in new.choices.into_iter().enumerate() {
        let choice_text = clean_text("Choice text", &choice.choice_text)?;
        if !seen.insert(uniqueness_key(&choice_text)) {
            return Err(StoreError::DuplicateChoice);
        }
        let mut choice = Choice::new(&question.id, choice_text);
        // Stored stamps truncate to milliseconds; spacing a batch keeps its
        // listing order intact.
        choice.inserted_at = created + Duration::milliseconds(position as i64);
        choices.push(choice);
    }
    Ok((question, choices))
}

pub(crate) fn new_choice_record(
    question_id: &str,
    new: ChoiceRequest,
) -> Result<Choice, StoreError> {
    let choice_text = clean_text("Choice text", &new.choice_text)?;
    Ok(Choice::new(question_id, choice_text))
}
