use anyhow::Context;
use async_trait::async_trait;
use choices_repo::ChoicesRepo;
use log::{error, info};
use mongodb::error::{Error, ErrorKind, WriteFailure};
use mongodb::options::{Collation, CollationStrength};
use mongodb::Client;
use questions_repo::QuestionsRepo;
use tokio::try_join;

use crate::errors::StoreError;
use crate::models::poll_api_model::{ChoiceRequest, NewQuestionRequest};
use crate::models::question::{Choice, Question};
use crate::store::{new_choice_record, new_question_records, PollStore};

pub mod choices_repo;
pub mod questions_repo;

pub struct DB {
    pub questions: QuestionsRepo,
    pub choices: ChoicesRepo,
}

impl DB {
    pub async fn init(db_url: &str, db_name: &str) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(db_url)
            .await
            .context("failed connecting to the database")?;
        let database = client.database(db_name);
        let (questions, choices) = try_join!(
            QuestionsRepo::init(&database),
            ChoicesRepo::init(&database)
        )
        .context("failed initializing collections")?;
        info!("Connected to database `{}`", db_name);
        Ok(DB { questions, choices })
    }

    async fn remove_question_records(&self, question_id: &str) -> Result<(), StoreError> {
        self.choices.delete_for_question(question_id).await?;
        self.questions.delete(question_id).await?;
        Ok(())
    }
}

#[async_trait]
impl PollStore for DB {
    async fn insert_question(&self, new: NewQuestionRequest) -> Result<Question, StoreError> {
        let (question, choices) = new_question_records(new)?;
        self.questions.insert(&question).await?;
        for choice in &choices {
            if let Err(e) = self.choices.insert(choice).await {
                // Creation is all-or-nothing: undo the partial write.
                if let Err(cleanup) = self.remove_question_records(&question.id).await {
                    error!(
                        "failed rolling back question {}: {}",
                        question.id, cleanup
                    );
                }
                return Err(e);
            }
        }
        Ok(question)
    }

    async fn latest_questions(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Question>, u64), StoreError> {
        self.questions.published(page, per_page).await
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>, StoreError> {
        self.questions.get(id).await
    }

    async fn choices_for(&self, question_id: &str) -> Result<Vec<Choice>, StoreError> {
        self.choices.for_question(question_id).await
    }

    async fn insert_choice(
        &self,
        question_id: &str,
        new: ChoiceRequest,
    ) -> Result<Choice, StoreError> {
        if self.questions.get(question_id).await?.is_none() {
            return Err(StoreError::UnknownQuestion);
        }
        let choice = new_choice_record(question_id, new)?;
        self.choices.insert(&choice).await?;
        // A delete may have raced us between the parent check and the
        // insert; reap the stranded choice instead of leaving an orphan.
        if self.questions.get(question_id).await?.is_none() {
            if let Err(cleanup) = self.choices.delete_for_question(question_id).await {
                error!(
                    "failed reaping choices of deleted question {}: {}",
                    question_id, cleanup
                );
            }
            return Err(StoreError::UnknownQuestion);
        }
        Ok(choice)
    }

    async fn record_vote(
        &self,
        question_id: &str,
        choice_id: &str,
    ) -> Result<Choice, StoreError> {
        match self.choices.inc_vote(question_id, choice_id).await? {
            Some(choice) => Ok(choice),
            None => {
                if self.questions.get(question_id).await?.is_some() {
                    Err(StoreError::UnknownChoice)
                } else {
                    Err(StoreError::UnknownQuestion)
                }
            }
        }
    }

    async fn delete_question(&self, id: &str) -> Result<bool, StoreError> {
        // The question goes first and the sweep always runs, so a choice
        // inserted concurrently is caught either here or by the re-check in
        // `insert_choice`, and a retried delete reaps what a failed sweep
        // left behind.
        let deleted = self.questions.delete(id).await?;
        self.choices.delete_for_question(id).await?;
        Ok(deleted)
    }
}

/// Collation under which the unique indexes compare text case-insensitively.
pub(crate) fn case_insensitive_collation() -> Collation {
    Collation::builder()
        .locale("en".to_string())
        .strength(CollationStrength::Secondary)
        .build()
}

pub(crate) fn is_duplicate_key(err: &Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}
