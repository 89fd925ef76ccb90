use std::sync::Arc;

use chrono::Utc;
use mockito::Matcher;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;

use newsdigest::llm::remote::RemoteChatProvider;
use newsdigest::news::NewsClient;
use newsdigest::prompts::TONE_LABELS;
use newsdigest::server::{build_rocket, AppState};

const CHAT_PATH: &str = "/openai/deployments/gpt-35-turbo/chat/completions";

fn test_config() -> common::Config {
    common::Config {
        news: common::NewsConfig {
            language: Some("en".to_string()),
            ..Default::default()
        },
        llm: common::LlmConfig {
            deployment: Some("gpt-35-turbo".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Wire an app whose two providers point at the given mock servers.
fn app_state(news_url: &str, llm_url: &str) -> AppState {
    let news = NewsClient::new(news_url, "test-news-key").expect("news client");
    let llm = RemoteChatProvider::new(
        llm_url,
        "test-llm-key",
        "gpt-35-turbo",
        "2023-03-15-preview",
    );
    AppState {
        started_at: Utc::now(),
        config: Arc::new(test_config()),
        news,
        llm: Arc::new(llm),
    }
}

async fn test_client(news_url: &str, llm_url: &str) -> Client {
    Client::tracked(build_rocket(app_state(news_url, llm_url)))
        .await
        .expect("rocket client")
}

/// Stub one completion call returning the given content.
async fn mock_completion(
    server: &mut mockito::ServerGuard,
    content: &str,
    hits: usize,
) -> mockito::Mock {
    server
        .mock("POST", CHAT_PATH)
        .match_query(Matcher::Any)
        .expect(hits)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "model": "gpt-35-turbo",
                "choices": [{"message": {"role": "assistant", "content": content}}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
            })
            .to_string(),
        )
        .create_async()
        .await
}

fn news_body(contents: &[&str]) -> String {
    let results: Vec<_> = contents
        .iter()
        .map(|c| serde_json::json!({ "content": c }))
        .collect();
    serde_json::json!({ "status": "success", "results": results }).to_string()
}

#[tokio::test]
async fn test_health() {
    let news = mockito::Server::new_async().await;
    let llm = mockito::Server::new_async().await;
    let client = test_client(&news.url(), &llm.url()).await;

    let response = client.get("/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_fetch_data_from_keywords_end_to_end() {
    let mut news = mockito::Server::new_async().await;
    let llm = mockito::Server::new_async().await;

    news.mock("GET", "/")
        .match_query(Matcher::UrlEncoded("q".into(), "oil".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(news_body(&["A"]))
        .create_async()
        .await;
    news.mock("GET", "/")
        .match_query(Matcher::UrlEncoded("q".into(), "gas".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(news_body(&["B"]))
        .create_async()
        .await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/fetchDataFromKeywords")
        .header(ContentType::JSON)
        .body(r#"{"keywords": ["oil", "gas"], "from_date": "2023-05-01", "to_date": "2023-05-07"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: Vec<String> = response.into_json().await.expect("json body");
    assert_eq!(body, vec!["A".to_string(), "B".to_string()]);
}

#[tokio::test]
async fn test_get_summary_for_article() {
    let news = mockito::Server::new_async().await;
    let mut llm = mockito::Server::new_async().await;
    let mock = mock_completion(&mut llm, "X", 1).await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/getSummaryForArticle")
        .header(ContentType::JSON)
        .body(r#"{"text": "hello"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.expect("json body");
    assert_eq!(body["summary"], "X");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_summary_from_keywords_concatenates_summaries() {
    let mut news = mockito::Server::new_async().await;
    let mut llm = mockito::Server::new_async().await;

    news.mock("GET", "/")
        .match_query(Matcher::UrlEncoded("q".into(), "oil".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(news_body(&["first article", "second article"]))
        .create_async()
        .await;

    // One completion call per article, in order
    let mock = mock_completion(&mut llm, "S", 2).await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/summaryFromKeywords")
        .header(ContentType::JSON)
        .body(r#"{"keywords": ["oil"], "from_date": "2023-05-01", "to_date": "2023-05-07"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.expect("json body");
    assert_eq!(body["summary"], "S\n\nS\n\n");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_paraphrase_splits_lines() {
    let news = mockito::Server::new_async().await;
    let mut llm = mockito::Server::new_async().await;
    mock_completion(&mut llm, "1. one\n2. two\n\n3. three", 1).await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/paraphraseText")
        .header(ContentType::JSON)
        .body(r#"{"text": "T", "tone": "formal"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.expect("json body");
    let paraphrases = body["paraphrases"].as_array().expect("array");
    assert_eq!(paraphrases.len(), 3);
    assert_eq!(paraphrases[0], "1. one");
    assert_eq!(paraphrases[2], "3. three");
}

#[tokio::test]
async fn test_give_synonyms_splits_numbered_list() {
    let news = mockito::Server::new_async().await;
    let mut llm = mockito::Server::new_async().await;
    mock_completion(&mut llm, "1. quick\n2. rapid\n3. swift\n4. speedy\n5. brisk", 1).await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/giveSynonyms")
        .header(ContentType::JSON)
        .body(r#"{"text": "fast"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.expect("json body");
    let synonyms = body["synonyms"].as_array().expect("array");
    assert_eq!(synonyms.len(), 5);
    assert_eq!(synonyms[0], "1. quick");
    assert_eq!(synonyms[4], "5. brisk");
}

#[tokio::test]
async fn test_analyse_tone_returns_known_label() {
    let news = mockito::Server::new_async().await;

    for label in TONE_LABELS {
        let mut llm = mockito::Server::new_async().await;
        // Model answers with trailing punctuation; route normalizes it
        mock_completion(&mut llm, &format!("{}.", label), 1).await;

        let client = test_client(&news.url(), &llm.url()).await;
        let response = client
            .post("/analyseTone")
            .header(ContentType::JSON)
            .body(r#"{"text": "some text"}"#)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.expect("json body");
        let tone = body["tone"].as_str().expect("tone string");
        assert!(TONE_LABELS.contains(&tone), "unexpected tone {}", tone);
        assert_eq!(tone, label);
    }
}

#[tokio::test]
async fn test_correct_grammar() {
    let news = mockito::Server::new_async().await;
    let mut llm = mockito::Server::new_async().await;
    mock_completion(&mut llm, "This is the corrected text.", 1).await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/correctGrammarAndSpellings")
        .header(ContentType::JSON)
        .body(r#"{"text": "this are the text"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.expect("json body");
    assert_eq!(body["corrected"], "This is the corrected text.");
}

#[tokio::test]
async fn test_missing_text_field_is_client_error() {
    let news = mockito::Server::new_async().await;
    let llm = mockito::Server::new_async().await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/analyseTone")
        .header(ContentType::JSON)
        .body(r#"{"wrong_field": 1}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body: serde_json::Value = response.into_json().await.expect("json error body");
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_empty_text_is_client_error() {
    let news = mockito::Server::new_async().await;
    let llm = mockito::Server::new_async().await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/getSummaryForArticle")
        .header(ContentType::JSON)
        .body(r#"{"text": "   "}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body: serde_json::Value = response.into_json().await.expect("json error body");
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("text"));
}

#[tokio::test]
async fn test_completion_failure_is_server_error() {
    let news = mockito::Server::new_async().await;
    let mut llm = mockito::Server::new_async().await;

    llm.mock("POST", CHAT_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error": {"message": "quota exceeded"}}"#)
        .create_async()
        .await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/getSummaryForArticle")
        .header(ContentType::JSON)
        .body(r#"{"text": "hello"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::InternalServerError);
}

#[tokio::test]
async fn test_news_failure_still_returns_ok_with_empty_list() {
    let mut news = mockito::Server::new_async().await;
    let llm = mockito::Server::new_async().await;

    news.mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;

    let client = test_client(&news.url(), &llm.url()).await;
    let response = client
        .post("/fetchDataFromKeywords")
        .header(ContentType::JSON)
        .body(r#"{"keywords": ["oil"], "from_date": "2023-05-01", "to_date": "2023-05-07"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body: Vec<String> = response.into_json().await.expect("json body");
    assert!(body.is_empty());
}
