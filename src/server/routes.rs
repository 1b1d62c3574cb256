//! Request handlers for the web interface.

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use serde::Deserialize;

use super::pages;
use super::state::AppState;
use crate::models::{Answer, FeedbackRecord, MAX_TRUST_SCORE, Rating};

#[derive(Debug, Deserialize)]
pub struct AskQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackForm {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub sources: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub rating: String,
    /// Score shown next to the answer; recomputed when absent.
    #[serde(default)]
    pub trust_score: String,
}

fn bad_request(question: &str, message: &str) -> (StatusCode, Html<String>) {
    (
        StatusCode::BAD_REQUEST,
        Html(pages::error_page(question, message)),
    )
}

/// GET / - question form, plus the answer when `q` is given.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<AskQuery>,
) -> (StatusCode, Html<String>) {
    let question = query.q.as_deref().map(str::trim).unwrap_or_default();
    if question.is_empty() {
        return (StatusCode::OK, Html(pages::index_page()));
    }

    tracing::info!("Question: \"{}\"", question);

    match state.pipeline().ask(question).await {
        Ok(answer) => (StatusCode::OK, Html(pages::answer_page(&answer))),
        Err(e) => {
            tracing::error!("Failed to answer question: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Html(pages::error_page(question, &format!("Could not answer: {e}"))),
            )
        }
    }
}

/// POST /feedback - append one record to the feedback log.
pub async fn feedback(
    State(state): State<AppState>,
    Form(form): Form<FeedbackForm>,
) -> (StatusCode, Html<String>) {
    let rating = match form.rating.trim().parse::<u8>().map(Rating::try_from) {
        Ok(Ok(rating)) => rating,
        _ => {
            return bad_request(
                &form.question,
                &format!(
                    "Rating must be between {} and {}.",
                    Rating::MIN,
                    Rating::MAX
                ),
            );
        }
    };

    let shown_score = match form.trust_score.trim() {
        "" => None,
        value => match value.parse::<u32>() {
            Ok(score) if score <= MAX_TRUST_SCORE => Some(score),
            _ => {
                return bad_request(
                    &form.question,
                    &format!("Trust score must be between 0 and {MAX_TRUST_SCORE}."),
                );
            }
        },
    };

    let sources = form
        .sources
        .split(", ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    // Browsers submit textarea and hidden-field line breaks as CRLF.
    let answer = Answer::new(form.question, form.answer.replace("\r\n", "\n"), sources);
    let mut record = FeedbackRecord::new(&answer, rating, form.comment.trim());
    if let Some(score) = shown_score {
        record.trust_score = score;
    }

    let log = state.feedback().lock().await;
    match log.append(&record) {
        Ok(()) => (StatusCode::OK, Html(pages::feedback_page())),
        Err(e) => {
            tracing::error!("Failed to record feedback: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::error_page(
                    &answer.question,
                    "Feedback could not be saved.",
                )),
            )
        }
    }
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}
