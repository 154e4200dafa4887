//! In-process mock of the knowledge-base service.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use futures::StreamExt;

/// Request bodies received by the mock, in arrival order.
pub type RequestLog = Arc<Mutex<Vec<serde_json::Value>>>;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}

/// A body that trickles out `chunks` with a short pause before each.
pub fn chunked_body(chunks: Vec<&'static [u8]>) -> Body {
    let stream = futures::stream::iter(chunks).then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, std::io::Error>(Bytes::from_static(chunk))
    });
    Body::from_stream(stream)
}

/// A body that sends `first` and then never finishes.
pub fn stalled_body(first: &'static [u8]) -> Body {
    let stream = futures::stream::once(async move { Ok::<_, std::io::Error>(Bytes::from_static(first)) })
        .chain(futures::stream::pending());
    Body::from_stream(stream)
}

pub fn search_fixture(query: &str) -> serde_json::Value {
    serde_json::json!({
        "results": [{
            "chunk_id": 42,
            "chunk_text": "Westbound tracks are valid from 1130 UTC to 1900 UTC.",
            "similarity": 0.87,
            "metadata": {
                "pages": [12],
                "start_char": 1024,
                "end_char": 1536,
                "num_words": 88,
                "chunk_size": 512,
                "chunk_index": 3,
                "page_ranges": [{
                    "page_number": 12,
                    "start_in_page": 100,
                    "end_in_page": 612,
                    "page_text_length": 2400
                }],
                "is_first_chunk": false,
                "is_last_chunk": false,
                "num_sentences": 4,
                "spans_multiple_pages": false
            }
        }],
        "total_results": 1,
        "query": query,
        "analysis": {
            "answer": "From 1130 to 1900 UTC.\nSOURCES:\n- Page 12: \"valid from 1130 UTC to 1900 UTC\""
        }
    })
}
