pub mod poll_api_model;
pub mod question;
