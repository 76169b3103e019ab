use futures::TryStreamExt;
use log::info;
use mongodb::{
    bson::{doc, DateTime},
    options::IndexOptions,
    Collection, Database, IndexModel,
};

use crate::db::{case_insensitive_collation, is_duplicate_key};
use crate::errors::StoreError;
use crate::models::question::Question;

pub struct QuestionsRepo {
    collection: Collection<Question>,
}

impl QuestionsRepo {
    pub async fn init(db: &Database) -> Result<Self, mongodb::error::Error> {
        let collection: Collection<Question> = db.collection("questions");
        let index = IndexModel::builder()
            .keys(doc! {"question_text": 1})
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(Some("question_text_unique".to_string()))
                    .collation(Some(case_insensitive_collation()))
                    .build(),
            )
            .build();
        collection.create_index(index).await?;
        info!("Ensured unique index on `question_text`");
        Ok(Self { collection })
    }

    pub async fn insert(&self, question: &Question) -> Result<(), StoreError> {
        self.collection.insert_one(question).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::DuplicateQuestion
            } else {
                StoreError::Database(e)
            }
        })?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Question>, StoreError> {
        Ok(self.collection.find_one(doc! {"_id": id}).await?)
    }

    /// Published questions only, newest first, with the total published count.
    pub async fn published(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Question>, u64), StoreError> {
        let filter = doc! {"pub_date": {"$lte": DateTime::now()}};
        let total = self.collection.count_documents(filter.clone()).await?;
        let skip = page.max(1).saturating_sub(1).saturating_mul(per_page);
        let limit = i64::try_from(per_page).unwrap_or(i64::MAX);
        let cursor = self
            .collection
            .find(filter)
            .sort(doc! {"pub_date": -1})
            .skip(skip)
            .limit(limit)
            .await?;
        let questions = cursor.try_collect().await?;
        Ok((questions, total))
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.collection.delete_one(doc! {"_id": id}).await?;
        Ok(result.deleted_count > 0)
    }
}
