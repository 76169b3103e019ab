use futures::TryStreamExt;
use log::info;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};

use crate::db::{case_insensitive_collation, is_duplicate_key};
use crate::errors::StoreError;
use crate::models::question::Choice;

pub struct ChoicesRepo {
    collection: Collection<Choice>,
}

impl ChoicesRepo {
    pub async fn init(db: &Database) -> Result<Self, mongodb::error::Error> {
        let collection: Collection<Choice> = db.collection("choices");
        let index = IndexModel::builder()
            .keys(doc! {"question_id": 1, "choice_text": 1})
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(Some("question_choice_text_unique".to_string()))
                    .collation(Some(case_insensitive_collation()))
                    .build(),
            )
            .build();
        collection.create_index(index).await?;
        info!("Ensured unique index on `(question_id, choice_text)`");
        Ok(Self { collection })
    }

    pub async fn insert(&self, choice: &Choice) -> Result<(), StoreError> {
        self.collection.insert_one(choice).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::DuplicateChoice
            } else {
                StoreError::Database(e)
            }
        })?;
        Ok(())
    }

    /// Choices of the question in the order they were added.
    pub async fn for_question(&self, question_id: &str) -> Result<Vec<Choice>, StoreError> {
        let cursor = self
            .collection
            .find(doc! {"question_id": question_id})
            .sort(doc! {"inserted_at": 1, "_id": 1})
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Atomically adds one vote to the choice, scoped to its question.
    /// `None` when no choice matched the (question, choice) pair.
    pub async fn inc_vote(
        &self,
        question_id: &str,
        choice_id: &str,
    ) -> Result<Option<Choice>, StoreError> {
        Ok(self
            .collection
            .find_one_and_update(
                doc! {"_id": choice_id, "question_id": question_id},
                doc! {"$inc": {"votes": 1}},
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete_for_question(&self, question_id: &str) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_many(doc! {"question_id": question_id})
            .await?;
        Ok(result.deleted_count)
    }
}
