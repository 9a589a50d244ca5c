//! In-process stand-in for the AnkiConnect add-on, used by tests.

use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

type Handler = Arc<dyn Fn(&str, &Value) -> Value + Send + Sync>;
type Requests = Arc<Mutex<Vec<Value>>>;

pub(crate) struct TestServer {
    pub(crate) url: String,
    requests: Requests,
}

impl TestServer {
    /// Request bodies received so far, in order.
    pub(crate) fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

pub(crate) fn reply_ok(result: Value) -> Value {
    json!({"result": result, "error": null})
}

pub(crate) fn reply_error(message: &str) -> Value {
    json!({"result": null, "error": message})
}

/// Serve on a free local port; `handler` maps (action, body) to a reply.
pub(crate) fn spawn<F>(handler: F) -> TestServer
where
    F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let handler: Handler = Arc::new(handler);
    let state = (handler, requests.clone());

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let app = Router::new().route("/", post(respond)).with_state(state);
            axum::serve(listener, app).await.unwrap();
        });
    });

    TestServer { url, requests }
}

async fn respond(
    State((handler, requests)): State<(Handler, Requests)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    requests.lock().unwrap().push(body.clone());
    let action = body["action"].as_str().unwrap_or_default().to_string();
    Json(handler(&action, &body))
}
