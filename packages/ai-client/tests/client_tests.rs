//! Client tests against a local stand-in for the Workers AI endpoint.

use std::sync::{Arc, Mutex};

use ai_client::{Message, TextGenerationRequest, TranslationRequest, WorkersAiClient, WorkersAiError};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Recorded {
    model: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Stub {
    reply: (StatusCode, Value),
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

async fn run_model(
    State(stub): State<Stub>,
    Path((_account, model)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.recorded.lock().unwrap().push(Recorded {
        model,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });
    (stub.reply.0, Json(stub.reply.1.clone()))
}

/// Serve `reply` for every run call; returns the client and the call log.
async fn serve(status: StatusCode, reply: Value) -> (WorkersAiClient, Arc<Mutex<Vec<Recorded>>>) {
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub {
        reply: (status, reply),
        recorded: recorded.clone(),
    };
    let app = Router::new()
        .route("/accounts/:account/ai/run/*model", post(run_model))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = WorkersAiClient::new("acct-1", "secret").with_base_url(format!("http://{}", addr));
    (client, recorded)
}

#[tokio::test]
async fn test_text_generation_sends_messages_and_reads_response() {
    let (client, recorded) = serve(
        StatusCode::OK,
        json!({"result": {"response": "short summary"}, "success": true, "errors": []}),
    )
    .await;

    let summary = client
        .run_text_generation(
            "@cf/meta/llama-3.2-3b-instruct",
            &TextGenerationRequest::new(vec![
                Message::system("summarize provided document"),
                Message::user("long text"),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(summary.as_deref(), Some("short summary"));
    let calls = recorded.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "@cf/meta/llama-3.2-3b-instruct");
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer secret"));
    assert_eq!(calls[0].body["messages"][1]["content"], "long text");
}

#[tokio::test]
async fn test_translation_sends_languages() {
    let (client, recorded) = serve(
        StatusCode::OK,
        json!({"result": {"translated_text": "안녕하세요"}, "success": true, "errors": []}),
    )
    .await;

    let text = client
        .run_translation("@cf/meta/m2m100-1.2b", &TranslationRequest::new("Hello", "en", "ko"))
        .await
        .unwrap();

    assert_eq!(text.as_deref(), Some("안녕하세요"));
    let calls = recorded.lock().unwrap().clone();
    assert_eq!(
        calls[0].body,
        json!({"text": "Hello", "source_lang": "en", "target_lang": "ko"})
    );
}

#[tokio::test]
async fn test_missing_translated_text_is_none() {
    let (client, _) = serve(StatusCode::OK, json!({"result": {}, "success": true, "errors": []})).await;

    let text = client
        .run_translation("@cf/meta/m2m100-1.2b", &TranslationRequest::new("Hello", "en", "ko"))
        .await
        .unwrap();

    assert!(text.is_none());
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_api_error() {
    let (client, _) = serve(
        StatusCode::OK,
        json!({"result": null, "success": false, "errors": [{"code": 5007, "message": "model not found"}]}),
    )
    .await;

    let err = client
        .run_text_generation("@cf/missing", &TextGenerationRequest::new(vec![Message::user("x")]))
        .await
        .unwrap_err();

    match err {
        WorkersAiError::Api(message) => assert!(message.contains("model not found")),
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_status_is_api_error() {
    let (client, _) = serve(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"success": false, "errors": [{"code": 3040, "message": "capacity"}]}),
    )
    .await;

    let err = client
        .run_translation("@cf/meta/m2m100-1.2b", &TranslationRequest::new("Hello", "en", "ko"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkersAiError::Api(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let client = WorkersAiClient::new("acct", "token").with_base_url("http://127.0.0.1:1");

    let err = client
        .run_translation("@cf/meta/m2m100-1.2b", &TranslationRequest::new("Hello", "en", "ko"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkersAiError::Network(_)));
}
