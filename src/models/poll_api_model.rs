use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::{Choice, Question};

#[derive(Deserialize, Serialize, Debug)]
pub struct NewQuestionRequest {
    pub question_text: String,
    /// Defaults to the time of creation when omitted.
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    /// Initial choices, may be empty; more can be added later.
    #[serde(default)]
    pub choices: Vec<ChoiceRequest>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ChoiceRequest {
    pub choice_text: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct VoteRequest {
    pub choice_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionSummary {
    pub id: String,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub was_published_recently: bool,
}

impl From<&Question> for QuestionSummary {
    fn from(question: &Question) -> Self {
        QuestionSummary {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            pub_date: question.pub_date,
            was_published_recently: question.was_published_recently(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionPage {
    pub questions: Vec<QuestionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub page: u64,
    pub per_page: u64,
    pub total_questions: u64,
    pub total_pages: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChoiceSummary {
    pub id: String,
    pub choice_text: String,
    pub votes: i64,
}

impl From<&Choice> for ChoiceSummary {
    fn from(choice: &Choice) -> Self {
        ChoiceSummary {
            id: choice.id.clone(),
            choice_text: choice.choice_text.clone(),
            votes: choice.votes,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionDetail {
    pub id: String,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub was_published_recently: bool,
    pub choices: Vec<ChoiceSummary>,
}

impl QuestionDetail {
    pub fn new(question: &Question, choices: &[Choice]) -> Self {
        QuestionDetail {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            pub_date: question.pub_date,
            was_published_recently: question.was_published_recently(),
            choices: choices.iter().map(ChoiceSummary::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChoiceTally {
    pub id: String,
    pub choice_text: String,
    pub votes: i64,
    pub percentage: f64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct QuestionResults {
    pub id: String,
    pub question_text: String,
    pub total_votes: i64,
    pub choices: Vec<ChoiceTally>,
}

impl QuestionResults {
    pub fn tally(question: &Question, choices: &[Choice]) -> Self {
        let total_votes: i64 = choices.iter().map(|c| c.votes).sum();
        let tallies = choices
            .iter()
            .map(|choice| ChoiceTally {
                id: choice.id.clone(),
                choice_text: choice.choice_text.clone(),
                votes: choice.votes,
                percentage: if total_votes > 0 {
                    choice.votes as f64 * 100.0 / total_votes as f64
                } else {
                    0.0
                },
            })
            .collect();
        QuestionResults {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            total_votes,
            choices: tallies,
        }
    }
}
