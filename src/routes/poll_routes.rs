use actix_web::{
    web::{self, Data, Json, Path, ServiceConfig},
    HttpResponse,
};
use serde::Deserialize;

use crate::{
    errors::{AppError, StoreError},
    models::poll_api_model::{
        ChoiceRequest, ChoiceSummary, NewQuestionRequest, QuestionDetail, QuestionPage,
        QuestionResults, QuestionSummary, VoteRequest,
    },
    store::PollStore,
    utils::json_responder::Response,
};

const MAX_PER_PAGE: u64 = 100;

#[derive(Deserialize)]
struct PaginationParams {
    page: Option<u64>,
    per_page: Option<u64>,
}

#[actix_web::get("")]
pub async fn list_questions(
    store: Data<dyn PollStore>,
    web::Query(params): web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(5).clamp(1, MAX_PER_PAGE);

    let (questions, total) = store.latest_questions(page, per_page).await?;
    let questions: Vec<QuestionSummary> = questions.iter().map(QuestionSummary::from).collect();
    let message = if questions.is_empty() {
        Some("No polls are available.".to_string())
    } else {
        None
    };

    Ok(Response::ok(QuestionPage {
        questions,
        message,
        page,
        per_page,
        total_questions: total,
        total_pages: (total as f64 / per_page as f64).ceil() as u64,
    }))
}

#[actix_web::post("/new")]
pub async fn create_question(
    store: Data<dyn PollStore>,
    req: Json<NewQuestionRequest>,
) -> Result<HttpResponse, AppError> {
    let question = store.insert_question(req.into_inner()).await?;
    Ok(Response::created(QuestionSummary::from(&question)))
}

#[actix_web::get("/{id}")]
pub async fn get_question(
    store: Data<dyn PollStore>,
    id: Path<String>,
) -> Result<HttpResponse, AppError> {
    let question = store
        .get_question(&id)
        .await?
        .ok_or(StoreError::UnknownQuestion)?;
    let choices = store.choices_for(&question.id).await?;
    Ok(Response::ok(QuestionDetail::new(&question, &choices)))
}

#[actix_web::post("/{id}/choices")]
pub async fn add_choice(
    store: Data<dyn PollStore>,
    id: Path<String>,
    req: Json<ChoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let choice = store.insert_choice(&id, req.into_inner()).await?;
    Ok(Response::created(ChoiceSummary::from(&choice)))
}

#[actix_web::post("/{id}/vote")]
pub async fn cast_vote(
    store: Data<dyn PollStore>,
    id: Path<String>,
    req: Json<VoteRequest>,
) -> Result<HttpResponse, AppError> {
    let choice_id = req
        .into_inner()
        .choice_id
        .filter(|c| !c.trim().is_empty())
        .ok_or(AppError::NoChoiceSelected)?;

    match store.record_vote(&id, &choice_id).await {
        // Voting lands the client on the refreshed results.
        Ok(_) => Ok(Response::ok(results_payload(store.get_ref(), &id).await?)),
        Err(StoreError::UnknownChoice) => Err(AppError::NoChoiceSelected),
        Err(e) => Err(e.into()),
    }
}

#[actix_web::get("/{id}/results")]
pub async fn get_results(
    store: Data<dyn PollStore>,
    id: Path<String>,
) -> Result<HttpResponse, AppError> {
    Ok(Response::ok(results_payload(store.get_ref(), &id).await?))
}

#[actix_web::delete("/{id}")]
pub async fn delete_question(
    store: Data<dyn PollStore>,
    id: Path<String>,
) -> Result<HttpResponse, AppError> {
    if store.delete_question(&id).await? {
        Ok(Response::ok("Question deleted"))
    } else {
        Err(StoreError::UnknownQuestion.into())
    }
}

async fn results_payload(
    store: &dyn PollStore,
    question_id: &str,
) -> Result<QuestionResults, AppError> {
    let question = store
        .get_question(question_id)
        .await?
        .ok_or(StoreError::UnknownQuestion)?;
    let choices = store.choices_for(question_id).await?;
    Ok(QuestionResults::tally(&question, &choices))
}

pub fn init(cnf: &mut ServiceConfig) {
    cnf.service(create_question)
        .service(list_questions)
        .service(get_question)
        .service(add_choice)
        .service(cast_vote)
        .service(get_results)
        .service(delete_question);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, App};
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::question::{Choice, Question};
    use crate::store::memory::MemoryStore;
    use crate::utils::json_responder::Status;

    const QUESTION_TEXT: &str = "Demo question text";

    fn test_store() -> Data<dyn PollStore> {
        Data::from(Arc::new(MemoryStore::new()) as Arc<dyn PollStore>)
    }

    macro_rules! test_app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data($store.clone())
                    .service(web::scope("/polls").configure(init)),
            )
            .await
        };
    }

    async fn create_question(store: &dyn PollStore, text: &str, days: i64) -> Question {
        store
            .insert_question(NewQuestionRequest {
                question_text: text.to_string(),
                pub_date: Some(Utc::now() + Duration::days(days)),
                choices: Vec::new(),
            })
            .await
            .expect("question should insert")
    }

    async fn create_choice(store: &dyn PollStore, question_id: &str, text: &str) -> Choice {
        store
            .insert_choice(
                question_id,
                ChoiceRequest {
                    choice_text: text.to_string(),
                },
            )
            .await
            .expect("choice should insert")
    }

    #[actix_web::test]
    async fn test_no_questions() {
        let store = test_store();
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/polls").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Response<QuestionPage> = test::read_body_json(resp).await;
        let page = body.result.expect("page payload");
        assert!(page.questions.is_empty());
        assert_eq!(page.message.as_deref(), Some("No polls are available."));
    }

    #[actix_web::test]
    async fn test_index_lists_current_question() {
        let store = test_store();
        create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/polls").to_request();
        let body: Response<QuestionPage> = test::call_and_read_body_json(&app, req).await;
        let page = body.result.expect("page payload");
        assert_eq!(page.questions.len(), 1);
        assert_eq!(page.questions[0].question_text, QUESTION_TEXT);
        assert!(page.questions[0].was_published_recently);
        assert!(page.message.is_none());
    }

    #[actix_web::test]
    async fn test_index_hides_future_questions() {
        let store = test_store();
        create_question(store.get_ref(), QUESTION_TEXT, 30).await;
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/polls").to_request();
        let body: Response<QuestionPage> = test::call_and_read_body_json(&app, req).await;
        let page = body.result.expect("page payload");
        assert!(page.questions.is_empty());
        assert_eq!(page.message.as_deref(), Some("No polls are available."));
    }

    #[actix_web::test]
    async fn test_index_orders_newest_first_and_paginates() {
        let store = test_store();
        create_question(store.get_ref(), "Old question", -5).await;
        create_question(store.get_ref(), "Recent question", -1).await;
        create_question(store.get_ref(), "Current question", 0).await;
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/polls").to_request();
        let body: Response<QuestionPage> = test::call_and_read_body_json(&app, req).await;
        let texts: Vec<String> = body
            .result
            .expect("page payload")
            .questions
            .iter()
            .map(|q| q.question_text.clone())
            .collect();
        assert_eq!(
            texts,
            vec!["Current question", "Recent question", "Old question"]
        );

        let req = test::TestRequest::get()
            .uri("/polls?page=2&per_page=2")
            .to_request();
        let body: Response<QuestionPage> = test::call_and_read_body_json(&app, req).await;
        let page = body.result.expect("page payload");
        assert_eq!(page.questions.len(), 1);
        assert_eq!(page.questions[0].question_text, "Old question");
        assert_eq!(page.total_questions, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[actix_web::test]
    async fn test_index_survives_extreme_pagination_params() {
        let store = test_store();
        create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        let app = test_app!(store);

        let req = test::TestRequest::get()
            .uri("/polls?page=18446744073709551615&per_page=2")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Response<QuestionPage> = test::read_body_json(resp).await;
        assert!(body.result.expect("page payload").questions.is_empty());

        let req = test::TestRequest::get()
            .uri("/polls?per_page=18446744073709551615")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Response<QuestionPage> = test::read_body_json(resp).await;
        let page = body.result.expect("page payload");
        assert_eq!(page.per_page, MAX_PER_PAGE);
        assert_eq!(page.questions.len(), 1);
    }

    #[actix_web::test]
    async fn test_non_existent_question() {
        let store = test_store();
        let app = test_app!(store);

        let req = test::TestRequest::get().uri("/polls/12").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Response<QuestionDetail> = test::read_body_json(resp).await;
        assert_eq!(body.status, Status::Error);
        assert!(body.error.expect("error message").contains("No question"));
    }

    #[actix_web::test]
    async fn test_detail_shows_question_and_choices() {
        let store = test_store();
        let question = create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        create_choice(store.get_ref(), &question.id, "true").await;
        create_choice(store.get_ref(), &question.id, "false").await;
        let app = test_app!(store);

        let req = test::TestRequest::get()
            .uri(&format!("/polls/{}", question.id))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let body = std::str::from_utf8(&body).expect("utf8 body");
        assert!(body.contains(QUESTION_TEXT));
        assert!(body.contains("true"));
        assert!(body.contains("false"));
    }

    #[actix_web::test]
    async fn test_create_question_with_choices() {
        let store = test_store();
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/polls/new")
            .set_json(serde_json::json!({
                "question_text": QUESTION_TEXT,
                "choices": [
                    {"choice_text": "True"},
                    {"choice_text": "False"}
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Response<QuestionSummary> = test::read_body_json(resp).await;
        let created = body.result.expect("created question");
        assert_eq!(created.question_text, QUESTION_TEXT);

        let req = test::TestRequest::get()
            .uri(&format!("/polls/{}", created.id))
            .to_request();
        let body: Response<QuestionDetail> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.result.expect("detail").choices.len(), 2);
    }

    #[actix_web::test]
    async fn test_create_rejects_duplicate_question_text() {
        let store = test_store();
        create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/polls/new")
            .set_json(serde_json::json!({"question_text": "demo QUESTION text"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body: Response<QuestionSummary> = test::read_body_json(resp).await;
        assert_eq!(body.error.as_deref(), Some("Question text must be unique"));
    }

    #[actix_web::test]
    async fn test_create_rejects_blank_question_text() {
        let store = test_store();
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/polls/new")
            .set_json(serde_json::json!({"question_text": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_add_choice_rejects_duplicate_text() {
        let store = test_store();
        let question = create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        let app = test_app!(store);

        let uri = format!("/polls/{}/choices", question.id);
        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(serde_json::json!({"choice_text": "True"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(serde_json::json!({"choice_text": " TRUE "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let body: Response<ChoiceSummary> = test::read_body_json(resp).await;
        assert_eq!(
            body.error.as_deref(),
            Some("Choice text must be unique for a question")
        );
    }

    #[actix_web::test]
    async fn test_add_choice_to_missing_question() {
        let store = test_store();
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/polls/12/choices")
            .set_json(serde_json::json!({"choice_text": "True"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_vote_increments_and_returns_results() {
        let store = test_store();
        let question = create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        let first = create_choice(store.get_ref(), &question.id, "True").await;
        let second = create_choice(store.get_ref(), &question.id, "False").await;
        let app = test_app!(store);

        let uri = format!("/polls/{}/vote", question.id);
        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(serde_json::json!({"choice_id": first.id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Response<QuestionResults> = test::read_body_json(resp).await;
        let results = body.result.expect("results payload");
        assert_eq!(results.total_votes, 1);
        let voted = results.choices.iter().find(|c| c.id == first.id).unwrap();
        assert_eq!(voted.votes, 1);
        assert_eq!(voted.percentage, 100.0);

        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(serde_json::json!({"choice_id": second.id}))
            .to_request();
        let body: Response<QuestionResults> = test::call_and_read_body_json(&app, req).await;
        let results = body.result.expect("results payload");
        assert_eq!(results.total_votes, 2);
        assert!(results.choices.iter().all(|c| c.percentage == 50.0));
    }

    #[actix_web::test]
    async fn test_vote_without_choice_is_rejected() {
        let store = test_store();
        let question = create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        create_choice(store.get_ref(), &question.id, "True").await;
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri(&format!("/polls/{}/vote", question.id))
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Response<QuestionResults> = test::read_body_json(resp).await;
        assert_eq!(body.error.as_deref(), Some("You didn't select a choice."));
    }

    #[actix_web::test]
    async fn test_vote_for_foreign_choice_is_rejected() {
        let store = test_store();
        let question = create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        let other = create_question(store.get_ref(), "Another question", 0).await;
        let foreign = create_choice(store.get_ref(), &other.id, "True").await;
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri(&format!("/polls/{}/vote", question.id))
            .set_json(serde_json::json!({"choice_id": foreign.id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // The foreign choice kept its tally.
        let req = test::TestRequest::get()
            .uri(&format!("/polls/{}/results", other.id))
            .to_request();
        let body: Response<QuestionResults> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.result.expect("results payload").total_votes, 0);
    }

    #[actix_web::test]
    async fn test_vote_on_missing_question() {
        let store = test_store();
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/polls/12/vote")
            .set_json(serde_json::json!({"choice_id": "whatever"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_delete_question_cascades() {
        let store = test_store();
        let question = create_question(store.get_ref(), QUESTION_TEXT, 0).await;
        create_choice(store.get_ref(), &question.id, "True").await;
        let app = test_app!(store);

        let uri = format!("/polls/{}", question.id);
        let req = test::TestRequest::delete().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        assert!(store
            .choices_for(&question.id)
            .await
            .expect("choices query")
            .is_empty());

        let req = test::TestRequest::delete().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
