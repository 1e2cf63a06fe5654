//! Integration tests for the HTTP clients against stub servers on ephemeral ports.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, post};
use axum::{Json, Router};
use competition_watch::conversation::Message;
use competition_watch::llm::{CompletionRequest, LlmClient, LlmError, ModelTurn, OpenAiClient};
use competition_watch::tools::{
    BrowserError, BrowserProvider, GetAllHackerNewsPosts, RemoteBrowser, Tool, ToolOutput, ToolSpec,
};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    reply: Arc<Mutex<Option<(StatusCode, Value)>>>,
}

impl Recorder {
    fn record(&self, what: impl Into<String>, body: Value) {
        self.requests.lock().unwrap().push((what.into(), body));
    }

    fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    fn set_reply(&self, status: StatusCode, body: Value) {
        *self.reply.lock().unwrap() = Some((status, body));
    }

    fn reply(&self) -> (StatusCode, Value) {
        self.reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or((StatusCode::OK, json!({"result": null})))
    }
}

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ---------------------------------------------------------------------------
// Chat completions
// ---------------------------------------------------------------------------

async fn completions(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    rec.record(bearer(&headers), body);
    let (status, reply) = rec.reply();
    (status, Json(reply))
}

async fn openai_stub(rec: Recorder) -> String {
    let router = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(rec);
    format!("{}/v1", spawn_stub(router).await)
}

fn lookup_tool() -> ToolSpec {
    ToolSpec {
        name: "get_all_hackernews_posts".into(),
        description: "Get the top posts from Hacker News.".into(),
        parameters: json!({"type": "object", "properties": {}}),
    }
}

#[tokio::test]
async fn test_openai_client_sends_system_prompt_and_tools() {
    let rec = Recorder::default();
    rec.set_reply(
        StatusCode::OK,
        json!({"choices": [{"message": {"role": "assistant", "content": "Nothing new today."}}]}),
    );
    let base = openai_stub(rec.clone()).await;
    let client = OpenAiClient::new("sk-test".into(), &base, Duration::from_secs(5)).unwrap();

    let messages = vec![Message::user("What's new?")];
    let tools = vec![lookup_tool()];
    let turn = client
        .chat_completion(CompletionRequest {
            model: "gpt-4o",
            temperature: 0.0,
            system_prompt: Some("You watch competitors."),
            messages: &messages,
            tools: &tools,
        })
        .await
        .unwrap();
    assert_eq!(turn, ModelTurn::Final("Nothing new today.".into()));

    let requests = rec.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth, "Bearer sk-test");
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You watch competitors.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "get_all_hackernews_posts");
}

#[tokio::test]
async fn test_openai_client_parses_tool_calls() {
    let rec = Recorder::default();
    rec.set_reply(
        StatusCode::OK,
        json!({"choices": [{"message": {
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {"id": "call_a", "type": "function",
                 "function": {"name": "get_all_hackernews_posts", "arguments": "{}"}},
                {"id": "call_b", "type": "function",
                 "function": {"name": "read_more_hackernews", "arguments": "{\"url\":\"https://example.com\"}"}}
            ]
        }}]}),
    );
    let base = openai_stub(rec).await;
    let client = OpenAiClient::new("sk-test".into(), &base, Duration::from_secs(5)).unwrap();

    let messages = vec![Message::user("Summarize today's top posts")];
    let turn = client
        .chat_completion(CompletionRequest {
            model: "gpt-4o",
            temperature: 0.0,
            system_prompt: None,
            messages: &messages,
            tools: &[],
        })
        .await
        .unwrap();

    let ModelTurn::ToolCalls { content, calls } = turn else {
        panic!("expected tool calls, got {:?}", turn);
    };
    assert_eq!(content, None);
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].id, "call_a");
    assert_eq!(calls[1].name, "read_more_hackernews");
    assert_eq!(calls[1].arguments, json!({"url": "https://example.com"}));
}

#[tokio::test]
async fn test_openai_client_maps_http_errors() {
    let rec = Recorder::default();
    rec.set_reply(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "rate limited"}}),
    );
    let base = openai_stub(rec).await;
    let client = OpenAiClient::new("sk-test".into(), &base, Duration::from_secs(5)).unwrap();

    let messages = vec![Message::user("hi")];
    let err = client
        .chat_completion(CompletionRequest {
            model: "gpt-4o",
            temperature: 0.0,
            system_prompt: None,
            messages: &messages,
            tools: &[],
        })
        .await
        .unwrap_err();

    match err {
        LlmError::Http { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Browser automation service
// ---------------------------------------------------------------------------

async fn open_session(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.record(format!("open {}", bearer(&headers)), body);
    Json(json!({"session_id": "s-1"}))
}

async fn act(
    State(rec): State<Recorder>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let action = body["action"].as_str().unwrap_or_default().to_string();
    rec.record(format!("{} {}", id, action), body);
    if action == "extract" {
        let (status, reply) = rec.reply();
        return (status, Json(reply));
    }
    (StatusCode::OK, Json(json!({"result": null})))
}

async fn close_session(State(rec): State<Recorder>, Path(id): Path<String>) -> StatusCode {
    rec.record(format!("close {}", id), Value::Null);
    StatusCode::NO_CONTENT
}

async fn browser_stub(rec: Recorder) -> String {
    let router = Router::new()
        .route("/api/v1/sessions", post(open_session))
        .route("/api/v1/sessions/:id", delete(close_session))
        .route("/api/v1/sessions/:id/actions", post(act))
        .with_state(rec);
    format!("{}/api/v1", spawn_stub(router).await)
}

#[tokio::test]
async fn test_remote_browser_session_lifecycle() {
    let rec = Recorder::default();
    rec.set_reply(StatusCode::OK, json!({"result": {"title": "Example"}}));
    let base = browser_stub(rec.clone()).await;
    let browser = RemoteBrowser::new(&base, "dk-test".into(), Duration::from_secs(5)).unwrap();

    let session = browser.open(Some("outlook.live.com")).await.unwrap();
    session.goto("https://example.com").await.unwrap();
    let mut fields = BTreeMap::new();
    fields.insert("subject_field".to_string(), "Weekly digest".to_string());
    session.fill_fields(&fields).await.unwrap();
    let schema = json!({"type": "object"});
    let extracted = session.extract("the title", Some(&schema)).await.unwrap();
    session.close().await.unwrap();

    assert_eq!(extracted, json!({"title": "Example"}));

    let requests = rec.requests();
    let labels: Vec<&str> = requests.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "open Bearer dk-test",
            "s-1 goto",
            "s-1 fill_fields",
            "s-1 extract",
            "close s-1"
        ]
    );
    assert_eq!(requests[0].1["auth"], "outlook.live.com");
    assert_eq!(requests[1].1["url"], "https://example.com");
    assert_eq!(requests[2].1["fields"]["subject_field"], "Weekly digest");
    assert_eq!(requests[3].1["schema"], schema);
}

#[tokio::test]
async fn test_remote_browser_reports_action_errors() {
    let rec = Recorder::default();
    rec.set_reply(StatusCode::OK, json!({"result": null, "error": "element not found"}));
    let base = browser_stub(rec).await;
    let browser = RemoteBrowser::new(&base, "dk-test".into(), Duration::from_secs(5)).unwrap();

    let session = browser.open(None).await.unwrap();
    let err = session.extract("missing thing", None).await.unwrap_err();
    match err {
        BrowserError::Action { action, reason } => {
            assert_eq!(action, "extract");
            assert_eq!(reason, "element not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_remote_browser_maps_http_errors() {
    let rec = Recorder::default();
    rec.set_reply(StatusCode::SERVICE_UNAVAILABLE, json!({"detail": "overloaded"}));
    let base = browser_stub(rec).await;
    let browser = RemoteBrowser::new(&base, "dk-test".into(), Duration::from_secs(5)).unwrap();

    let session = browser.open(None).await.unwrap();
    let err = session.extract("anything", None).await.unwrap_err();
    assert!(matches!(err, BrowserError::Http { status: 503, .. }), "{err}");
}

#[tokio::test]
async fn test_hackernews_tool_over_remote_browser() {
    let rec = Recorder::default();
    rec.set_reply(
        StatusCode::OK,
        json!({"result": "1. Alpha (120 points, 40 comments)"}),
    );
    let base = browser_stub(rec.clone()).await;
    let browser: Arc<dyn BrowserProvider> =
        Arc::new(RemoteBrowser::new(&base, "dk-test".into(), Duration::from_secs(5)).unwrap());

    let tool = GetAllHackerNewsPosts::new(browser);
    let output = tool.execute(json!({})).await.unwrap();
    assert_eq!(
        output,
        ToolOutput::Text("1. Alpha (120 points, 40 comments)".into())
    );

    let labels: Vec<String> = rec.requests().into_iter().map(|(l, _)| l).collect();
    assert_eq!(labels.first().map(String::as_str), Some("open Bearer dk-test"));
    assert_eq!(labels.last().map(String::as_str), Some("close s-1"));
    assert!(labels.iter().any(|l| l == "s-1 wait_for"));
}
