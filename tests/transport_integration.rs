//! HTTP round trips against an in-process mock knowledge base.

mod common;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use kb_chat::Error;
use kb_chat::transport::{
    AnswerLength, AskParams, HttpKnowledgeBase, KnowledgeBase, Language, SearchParams,
};

use common::{RequestLog, chunked_body, search_fixture, spawn};

fn recording_router(log: RequestLog) -> Router {
    Router::new()
        .route(
            "/api/search",
            post(
                |State(log): State<RequestLog>, Json(body): Json<serde_json::Value>| async move {
                    let query = body["query"].as_str().unwrap_or_default().to_string();
                    log.lock().unwrap().push(body);
                    Json(search_fixture(&query))
                },
            ),
        )
        .route(
            "/api/ask",
            post(
                |State(log): State<RequestLog>, Json(body): Json<serde_json::Value>| async move {
                    log.lock().unwrap().push(body);
                    chunked_body(vec![
                        &b"Data"[..],
                        &b"link is "[..],
                        &b"required. Caf\xC3"[..],
                        &b"\xA9 closed."[..],
                    ])
                },
            ),
        )
        .with_state(log)
}

fn status_router(status: StatusCode) -> Router {
    Router::new()
        .route("/api/search", post(move || async move { (status, "nope").into_response() }))
        .route("/api/ask", post(move || async move { (status, "nope").into_response() }))
}

#[tokio::test]
async fn search_sends_tuning_and_decodes_response() {
    let log = RequestLog::default();
    let base = spawn(recording_router(Arc::clone(&log))).await;
    let kb = HttpKnowledgeBase::new(&base)
        .unwrap()
        .with_search_params(SearchParams {
            similarity_threshold: 0.25,
            max_results: 8,
        });

    let resp = kb.search("westbound hours").await.unwrap();

    assert_eq!(resp.query, "westbound hours");
    assert_eq!(resp.total_results, 1);
    assert_eq!(resp.results[0].chunk_id, 42);
    assert_eq!(resp.results[0].metadata.page_ranges[0].page_text_length, 2400);
    assert!(resp.answer().starts_with("From 1130"));

    let sent = log.lock().unwrap();
    assert_eq!(sent[0]["query"], "westbound hours");
    assert_eq!(sent[0]["similarity_threshold"], 0.25);
    assert_eq!(sent[0]["max_results"], 8);
}

#[tokio::test]
async fn ask_once_returns_whole_body_and_sends_params() {
    let log = RequestLog::default();
    let base = spawn(recording_router(Arc::clone(&log))).await;
    let kb = HttpKnowledgeBase::new(&base).unwrap();
    let params = AskParams {
        temperature: 0.5,
        language: Language::German,
        length: AnswerLength::Medium,
    };

    let text = kb.ask_once("datalink?", params).await.unwrap();

    assert_eq!(text, "Datalink is required. Café closed.");
    let sent = log.lock().unwrap();
    assert_eq!(
        sent[0],
        serde_json::json!({
            "query": "datalink?",
            "temperature": 0.5,
            "language": "GERMAN",
            "length": "MEDIUM"
        })
    );
}

#[tokio::test]
async fn stream_ask_delivers_fragments_in_order() {
    let base = spawn(recording_router(RequestLog::default())).await;
    let kb = HttpKnowledgeBase::new(&base).unwrap();
    let fragments = Mutex::new(Vec::new());

    kb.stream_ask_with("datalink?", AskParams::default(), &mut |f: &str| {
        fragments.lock().unwrap().push(f.to_string());
    })
    .await
    .unwrap();

    let fragments = fragments.into_inner().unwrap();
    assert!(fragments.iter().all(|f| !f.is_empty()));
    assert_eq!(fragments.concat(), "Datalink is required. Café closed.");
}

#[tokio::test]
async fn error_status_is_transport_error() {
    let base = spawn(status_router(StatusCode::INTERNAL_SERVER_ERROR)).await;
    let kb = HttpKnowledgeBase::new(&base).unwrap();

    let err = kb.search("q").await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: Some(500), ref message } if message == "nope"));

    let err = kb.ask_once("q", AskParams::default()).await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: Some(500), .. }));

    let err = kb
        .stream_ask("q", AskParams::default())
        .await
        .err()
        .expect("stream should not open");
    assert!(matches!(err, Error::Transport { status: Some(500), .. }));
}

#[tokio::test]
async fn stream_without_body_is_transport_error() {
    let base = spawn(status_router(StatusCode::NO_CONTENT)).await;
    let kb = HttpKnowledgeBase::new(&base).unwrap();

    let err = kb
        .stream_ask("q", AskParams::default())
        .await
        .err()
        .expect("stream should not open");
    assert!(matches!(err, Error::Transport { status: Some(204), .. }));
}

#[tokio::test]
async fn malformed_search_body_is_decode_error() {
    let router = Router::new().route(
        "/api/search",
        post(|| async { Json(serde_json::json!({"results": "not a list"})) }),
    );
    let base = spawn(router).await;
    let kb = HttpKnowledgeBase::new(&base).unwrap();

    assert!(matches!(kb.search("q").await, Err(Error::Decode(_))));
}

#[tokio::test]
async fn invalid_utf8_answer_is_decode_error() {
    let router = Router::new().route(
        "/api/ask",
        post(|| async { Response::new(axum::body::Body::from(&b"bad \xFF byte"[..])) }),
    );
    let base = spawn(router).await;
    let kb = HttpKnowledgeBase::new(&base).unwrap();

    assert!(matches!(
        kb.ask_once("q", AskParams::default()).await,
        Err(Error::Decode(_))
    ));
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let kb = HttpKnowledgeBase::new(format!("http://{addr}")).unwrap();
    assert!(matches!(
        kb.search("q").await,
        Err(Error::Transport { status: None, .. })
    ));
}
