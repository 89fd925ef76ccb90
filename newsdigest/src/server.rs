use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, post, routes, Build, Rocket, State};
use serde::{Deserialize, Serialize};
use tracing::error;

use common::Config;

use crate::digest;
use crate::llm::{ChatProvider, ChatRequest};
use crate::news::NewsClient;
use crate::prompts::{build_prompt, canonical_tone, TaskKind};

/// Application state stored inside Rocket managed state.
/// Built once in `main`; nothing here is mutated after startup.
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    pub news: NewsClient,
    pub llm: Arc<dyn ChatProvider>,
}

/// JSON error body returned for 4xx/5xx responses.
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiFailure = (Status, Json<ApiError>);

fn unprocessable(msg: impl Into<String>) -> ApiFailure {
    (
        Status::UnprocessableEntity,
        Json(ApiError { error: msg.into() }),
    )
}

fn server_error(msg: impl Into<String>) -> ApiFailure {
    (
        Status::InternalServerError,
        Json(ApiError { error: msg.into() }),
    )
}

/// Request body for the news-driven endpoints.
#[derive(Deserialize)]
struct KeywordsRequest {
    keywords: Vec<String>,
    from_date: NaiveDate,
    to_date: NaiveDate,
}

/// Request body for the single-text endpoints.
#[derive(Deserialize)]
struct TextRequest {
    text: String,
}

/// Paraphrase accepts an optional tone qualifier.
#[derive(Deserialize)]
struct ParaphraseRequest {
    text: String,
    tone: Option<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Serialize)]
struct ParaphraseResponse {
    paraphrases: Vec<String>,
}

#[derive(Serialize)]
struct ToneResponse {
    tone: String,
}

#[derive(Serialize)]
struct CorrectedResponse {
    corrected: String,
}

#[derive(Serialize)]
struct SynonymsResponse {
    synonyms: Vec<String>,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    deployment: String,
    news_language: String,
}

/// Split a completion into its non-empty lines, preserving order.
/// Used by the routes whose answers are numbered lists.
fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Shared flow of the five single-completion endpoints: validate the text,
/// build the task prompt and relay one completion call.
async fn run_completion(
    state: &AppState,
    task: TaskKind,
    text: &str,
) -> Result<String, ApiFailure> {
    if text.trim().is_empty() {
        return Err(unprocessable("field 'text' must not be empty"));
    }

    let request = ChatRequest::from(build_prompt(&task, text));
    match state.llm.complete(request).await {
        Ok(response) => Ok(response.content),
        Err(e) => {
            error!("completion provider failed: {:#}", e);
            Err(server_error("completion provider failed"))
        }
    }
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning simple JSON with uptime and basic config info.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    let uptime = (now - state.started_at).num_seconds();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        deployment: state
            .config
            .llm
            .deployment
            .clone()
            .unwrap_or_else(|| "gpt-35-turbo".to_string()),
        news_language: state
            .config
            .news
            .language
            .clone()
            .unwrap_or_else(|| "en".to_string()),
    })
}

/// Fetch article bodies for a keyword list, keyword order preserved.
/// News provider failures are skipped per keyword, so this always returns 200
/// with a possibly partial (or empty) list.
#[post("/fetchDataFromKeywords", data = "<body>")]
async fn fetch_data_from_keywords(
    state: &State<AppState>,
    body: Json<KeywordsRequest>,
) -> Json<Vec<String>> {
    let articles = state
        .news
        .fetch_articles(&body.keywords, body.from_date, body.to_date)
        .await;
    Json(articles)
}

/// Fetch articles for the keywords, then summarize each one in order and
/// concatenate the summaries.
#[post("/summaryFromKeywords", data = "<body>")]
async fn summary_from_keywords(
    state: &State<AppState>,
    body: Json<KeywordsRequest>,
) -> Result<Json<SummaryResponse>, ApiFailure> {
    let articles = state
        .news
        .fetch_articles(&body.keywords, body.from_date, body.to_date)
        .await;

    match digest::summarize_articles(state.llm.as_ref(), &articles).await {
        Ok(summary) => Ok(Json(SummaryResponse { summary })),
        Err(e) => {
            error!("digest generation failed: {:#}", e);
            Err(server_error("completion provider failed"))
        }
    }
}

#[post("/getSummaryForArticle", data = "<body>")]
async fn get_summary_for_article(
    state: &State<AppState>,
    body: Json<TextRequest>,
) -> Result<Json<SummaryResponse>, ApiFailure> {
    let summary = run_completion(state, TaskKind::SummarizeArticle, &body.text).await?;
    Ok(Json(SummaryResponse { summary }))
}

#[post("/paraphraseText", data = "<body>")]
async fn paraphrase_text(
    state: &State<AppState>,
    body: Json<ParaphraseRequest>,
) -> Result<Json<ParaphraseResponse>, ApiFailure> {
    let task = TaskKind::Paraphrase {
        tone: body.tone.clone(),
    };
    let content = run_completion(state, task, &body.text).await?;
    Ok(Json(ParaphraseResponse {
        paraphrases: split_lines(&content),
    }))
}

#[post("/analyseTone", data = "<body>")]
async fn analyse_tone(
    state: &State<AppState>,
    body: Json<TextRequest>,
) -> Result<Json<ToneResponse>, ApiFailure> {
    let content = run_completion(state, TaskKind::AnalyseTone, &body.text).await?;
    Ok(Json(ToneResponse {
        tone: canonical_tone(&content),
    }))
}

#[post("/correctGrammarAndSpellings", data = "<body>")]
async fn correct_grammar_and_spellings(
    state: &State<AppState>,
    body: Json<TextRequest>,
) -> Result<Json<CorrectedResponse>, ApiFailure> {
    let corrected = run_completion(state, TaskKind::CorrectGrammar, &body.text).await?;
    Ok(Json(CorrectedResponse { corrected }))
}

#[post("/giveSynonyms", data = "<body>")]
async fn give_synonyms(
    state: &State<AppState>,
    body: Json<TextRequest>,
) -> Result<Json<SynonymsResponse>, ApiFailure> {
    let content = run_completion(state, TaskKind::Synonyms, &body.text).await?;
    Ok(Json(SynonymsResponse {
        synonyms: split_lines(&content),
    }))
}

#[catch(400)]
fn bad_request() -> Json<ApiError> {
    Json(ApiError {
        error: "malformed request body".to_string(),
    })
}

#[catch(404)]
fn not_found() -> Json<ApiError> {
    Json(ApiError {
        error: "no such endpoint".to_string(),
    })
}

#[catch(422)]
fn unprocessable_entity() -> Json<ApiError> {
    Json(ApiError {
        error: "request body is missing required fields or malformed".to_string(),
    })
}

#[catch(500)]
fn internal_error() -> Json<ApiError> {
    Json(ApiError {
        error: "internal server error".to_string(),
    })
}

/// Build the Rocket instance with all routes and catchers mounted.
/// Kept separate from `launch_rocket` so tests can drive it with a local client.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount(
            "/",
            routes![
                health,
                status,
                fetch_data_from_keywords,
                summary_from_keywords,
                get_summary_for_article,
                paraphrase_text,
                analyse_tone,
                correct_grammar_and_spellings,
                give_synonyms,
            ],
        )
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable_entity, internal_error],
        )
}

/// Launch the Rocket server, binding address and port from configuration.
pub async fn launch_rocket(state: AppState) -> Result<()> {
    let address = state
        .config
        .server
        .address
        .clone()
        .unwrap_or_else(|| "0.0.0.0".to_string());
    let port = state.config.server.port.unwrap_or(8000);

    let figment = rocket::Config::figment()
        .merge(("address", address))
        .merge(("port", port));

    build_rocket(state)
        .configure(figment)
        .launch()
        .await
        .context("Rocket server failed")?;

    Ok(())
}
