use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::models::poll_api_model::{ChoiceRequest, NewQuestionRequest};
use crate::models::question::{uniqueness_key, Choice, Question};
use crate::store::{new_choice_record, new_question_records, PollStore};

/// Table-per-vector store guarded by one lock. Enforces the same constraints
/// the MongoDB indexes do, which is what makes it a valid stand-in for
/// handler tests and quick-start runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    questions: Vec<Question>,
    choices: Vec<Choice>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn question_text_taken(&self, text: &str) -> bool {
        let key = uniqueness_key(text);
        self.questions
            .iter()
            .any(|q| uniqueness_key(&q.question_text) == key)
    }

    fn choice_text_taken(&self, question_id: &str, text: &str) -> bool {
        let key = uniqueness_key(text);
        self.choices
            .iter()
            .any(|c| c.question_id == question_id && uniqueness_key(&c.choice_text) == key)
    }

    fn has_question(&self, id: &str) -> bool {
        self.questions.iter().any(|q| q.id == id)
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn insert_question(&self, new: NewQuestionRequest) -> Result<Question, StoreError> {
        let (question, choices) = new_question_records(new)?;
        let mut tables = self.inner.write().await;
        if tables.question_text_taken(&question.question_text) {
            return Err(StoreError::DuplicateQuestion);
        }
        tables.questions.push(question.clone());
        tables.choices.extend(choices);
        Ok(question)
    }

    async fn latest_questions(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Question>, u64), StoreError> {
        let now = Utc::now();
        let tables = self.inner.read().await;
        let mut published: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.pub_date <= now)
            .cloned()
            .collect();
        published.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        let total = published.len() as u64;
        let skip = page.max(1).saturating_sub(1).saturating_mul(per_page);
        let questions = published
            .into_iter()
            .skip(skip as usize)
            .take(per_page as usize)
            .collect();
        Ok((questions, total))
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn choices_for(&self, question_id: &str) -> Result<Vec<Choice>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .choices
            .iter()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn insert_choice(
        &self,
        question_id: &str,
        new: ChoiceRequest,
    ) -> Result<Choice, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.has_question(question_id) {
            return Err(StoreError::UnknownQuestion);
        }
        let choice = new_choice_record(question_id, new)?;
        if tables.choice_text_taken(question_id, &choice.choice_text) {
            return Err(StoreError::DuplicateChoice);
        }
        tables.choices.push(choice.clone());
        Ok(choice)
    }

    async fn record_vote(
        &self,
        question_id: &str,
        choice_id: &str,
    ) -> Result<Choice, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.has_question(question_id) {
            return Err(StoreError::UnknownQuestion);
        }
        let choice = tables
            .choices
            .iter_mut()
            .find(|c| c.id == choice_id && c.question_id == question_id)
            .ok_or(StoreError::UnknownChoice)?;
        choice.votes += 1;
        Ok(choice.clone())
    }

    async fn delete_question(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().await;
        let before = tables.questions.len();
        tables.questions.retain(|q| q.id != id);
        if tables.questions.len() == before {
            return Ok(false);
        }
        tables.choices.retain(|c| c.question_id != id);
        Ok(true)
    }
}
