use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::utils::json_responder::Response;

/// Errors surfaced by the storage layer. The duplicate variants carry the
/// constraint violation messages clients are shown.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Question text must be unique")]
    DuplicateQuestion,

    #[error("Choice text must be unique for a question")]
    DuplicateChoice,

    #[error("No question found with that id")]
    UnknownQuestion,

    #[error("No such choice for this question")]
    UnknownChoice,

    #[error("{0}")]
    InvalidText(String),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Handler-level error, rendered through the JSON envelope.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("You didn't select a choice.")]
    NoChoiceSelected,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(StoreError::DuplicateQuestion)
            | AppError::Store(StoreError::DuplicateChoice) => StatusCode::CONFLICT,
            AppError::Store(StoreError::UnknownQuestion) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::UnknownChoice) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::InvalidText(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NoChoiceSelected => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Database failures are logged in full but not leaked to clients.
        if let AppError::Store(StoreError::Database(e)) = self {
            error!("store failure: {:?}", e);
            return Response::<()>::error("Something went wrong!", self.status_code());
        }
        Response::<()>::error(&self.to_string(), self.status_code())
    }
}
