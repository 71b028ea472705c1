//! msgboard web server
//!
//! Axum server for the board page, message submission, JSON listing and the
//! `/cable` WebSocket that streams new messages to viewers.

pub mod params;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::{
    routing::{get, post},
    Router,
};
use msgboard_cable::{relay_from_redis, Broadcaster, CableHub, RedisBroadcaster};
use msgboard_core::{Config, MessageService, MESSAGE_TOPIC};
use msgboard_db::DbPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::home::index))
        .route("/message", post(routes::home::create_message))
        .route("/messages.json", get(routes::api::list_messages))
        .route("/cable", get(websocket::ws_handler))
        .route("/internal/broadcast", post(routes::internal::broadcast))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pick the broadcast transport for a server process.
///
/// With Redis configured, saves publish to Redis and a background task
/// relays Redis traffic into the local hub; otherwise saves publish straight
/// to the hub.
async fn build_broadcaster(config: &Config, hub: &CableHub) -> anyhow::Result<Arc<dyn Broadcaster>> {
    let Some(url) = config.redis_url.clone() else {
        return Ok(Arc::new(hub.clone()));
    };

    let redis = RedisBroadcaster::connect(&url).await?;
    let relay_hub = hub.clone();
    tokio::spawn(async move {
        if let Err(e) = relay_from_redis(&url, &[MESSAGE_TOPIC.to_string()], relay_hub).await {
            error!(error = %e, "Redis relay stopped");
        }
    });
    Ok(Arc::new(redis))
}

/// Run the web server until Ctrl+C.
pub async fn run_server(config: Config, db: DbPool) -> anyhow::Result<()> {
    let hub = CableHub::new(config.channel_capacity);
    let broadcaster = build_broadcaster(&config, &hub).await?;
    let messages = MessageService::from_config(db, broadcaster, &config);
    let internal_relay = config.is_loopback();
    if !internal_relay {
        warn!(host = %config.host, "Not a loopback address, /internal/broadcast disabled");
    }
    let app = create_router(AppState::new(messages, hub).with_internal_relay(internal_relay));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        redis = config.redis_url.is_some(),
        policy = %config.broadcast_failure,
        "Web server listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use msgboard_cable::{CableError, CableResult, HttpRelay};
    use msgboard_core::Message;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct DownBroadcaster;

    #[async_trait]
    impl Broadcaster for DownBroadcaster {
        async fn publish(&self, _topic: &str, _payload: &Value) -> CableResult<usize> {
            Err(CableError::Unavailable("transport down".to_string()))
        }
    }

    fn test_state() -> AppState {
        let hub = CableHub::default();
        let messages = MessageService::new(DbPool::in_memory().unwrap(), Arc::new(hub.clone()));
        AppState::new(messages, hub).with_internal_relay(true)
    }

    fn relay_post(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/internal/broadcast")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/message")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_post(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/message")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_create_redirects_and_broadcasts() {
        let state = test_state();
        let mut rx = state.hub.subscribe();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(form_post("message%5Bmessage%5D=hello&commit=Send"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "message");
        assert_eq!(event.payload, json!({"data": "hello"}));
        assert!(rx.try_recv().is_err());

        let page = body_string(app.oneshot(get("/")).await.unwrap()).await;
        assert!(page.contains("hello"));
    }

    #[tokio::test]
    async fn test_json_submission_is_whitelisted() {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(json_post(json!({
                "message": {"message": "hi", "admin": true, "id": "forged"},
                "created_at": "1970-01-01T00:00:00Z"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);

        let response = app.oneshot(get("/messages.json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listed: Vec<Value> = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(listed.len(), 1);

        let record = listed[0].as_object().unwrap();
        assert_eq!(record["content"], "hi");
        assert_ne!(record["id"], "forged");
        assert_ne!(record["created_at"], "1970-01-01T00:00:00Z");
        assert!(!record.contains_key("admin"));
    }

    #[tokio::test]
    async fn test_missing_params_are_client_errors() {
        let state = test_state();
        let app = create_router(state.clone());

        for body in ["", "message=hello", "message%5Bbody%5D=hello", "other=1"] {
            let response = app.clone().oneshot(form_post(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {:?}", body);
        }
        let response = app.oneshot(json_post(json!({"message": {}}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(state.messages.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_message_rerenders_form() {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app.oneshot(form_post("message%5Bmessage%5D=+++")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let page = body_string(response).await;
        assert!(page.contains("blank"));
        assert!(page.contains("class=\"error\""));
        assert_eq!(state.messages.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_server_error() {
        let hub = CableHub::default();
        let messages = MessageService::new(DbPool::in_memory().unwrap(), Arc::new(DownBroadcaster));
        let state = AppState::new(messages, hub);
        let app = create_router(state.clone());

        let response = app.oneshot(form_post("message%5Bmessage%5D=hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.messages.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_index_lists_newest_first() {
        let state = test_state();
        for content in ["first-entry", "second-entry", "third-entry"] {
            state.messages.create(content).await.unwrap();
        }

        let response = create_router(state).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_string(response).await;

        let first = page.find("first-entry").unwrap();
        let second = page.find("second-entry").unwrap();
        let third = page.find("third-entry").unwrap();
        assert!(third < second && second < first);
        assert!(page.contains("name=\"message[message]\" value=\"\""));
    }

    #[tokio::test]
    async fn test_index_escapes_content() {
        let state = test_state();
        state.messages.create("<script>alert(1)</script>").await.unwrap();

        let page = body_string(create_router(state).oneshot(get("/")).await.unwrap()).await;
        assert!(!page.contains("<script>alert(1)</script>"));
    }

    #[tokio::test]
    async fn test_http_relay_reaches_server_subscribers() {
        let state = test_state();
        let mut rx = state.hub.subscribe();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = create_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // A second writer with its own store, relaying through the server.
        let relay = HttpRelay::with_url(&format!("http://{}", addr));
        let writer = MessageService::new(DbPool::in_memory().unwrap(), Arc::new(relay));
        let message: Message = writer.create("from elsewhere").await.unwrap();
        assert_eq!(message.content, "from elsewhere");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "message");
        assert_eq!(event.payload, json!({"data": "from elsewhere"}));
    }

    #[tokio::test]
    async fn test_internal_relay_fans_out() {
        let state = test_state();
        let mut rx = state.hub.subscribe();

        let response = create_router(state)
            .oneshot(relay_post(json!({"topic": "message", "payload": {"data": "relayed"}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(ack, json!({"receivers": 1}));
        assert_eq!(rx.recv().await.unwrap().payload, json!({"data": "relayed"}));
    }

    #[tokio::test]
    async fn test_internal_relay_refused_when_disabled() {
        let state = test_state().with_internal_relay(false);
        let mut rx = state.hub.subscribe();

        let response = create_router(state)
            .oneshot(relay_post(json!({"topic": "message", "payload": {"data": "forged"}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(rx.try_recv().is_err());
    }
}
