use axum::{extract::DefaultBodyLimit, routing::get, Router};
use database::ItemRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod extract;
pub mod handlers;

/// Item bodies are tiny; anything near this is not a valid request.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemRepository>,
}

/// Builds the full route table on top of the given repository.
pub fn create_router(items: Arc<dyn ItemRepository>) -> Router {
    let app_state = Arc::new(AppState { items });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/items/:id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .with_state(app_state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}

/// Binds `addr` and serves until Ctrl+C or SIGTERM, letting in-flight
/// requests finish.
pub async fn run_server(addr: SocketAddr, items: Arc<dyn ItemRepository>) -> anyhow::Result<()> {
    let app = create_router(items);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C, shutting down gracefully.");
        }
        _ = terminate => {
            tracing::warn!("Received SIGTERM, shutting down gracefully.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use core_types::{Item, ItemId, NewItem};
    use database::{DbError, InMemoryRepository};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router() -> Router {
        create_router(Arc::new(InMemoryRepository::new()))
    }

    /// Sends one request and returns the status plus the decoded JSON body
    /// (`None` when the body is empty).
    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Option<Value>) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(raw) => {
                request = request.header("content-type", "application/json");
                Body::from(raw.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes).unwrap())
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send(&test_router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!({ "status": "ok" })));
    }

    #[tokio::test]
    async fn widget_lifecycle() {
        let app = test_router();

        let (status, body) =
            send(&app, "POST", "/items", Some(r#"{"name":"Widget","price":100}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, Some(json!({ "id": 1, "name": "Widget", "price": 100 })));

        let (status, body) = send(&app, "GET", "/items/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!({ "id": 1, "name": "Widget", "price": 100 })));

        let (status, body) =
            send(&app, "PUT", "/items/1", Some(r#"{"name":"Widget2","price":150}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!({ "id": 1, "name": "Widget2", "price": 150 })));

        let (status, body) = send(&app, "GET", "/items/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!({ "id": 1, "name": "Widget2", "price": 150 })));

        let (status, body) = send(&app, "DELETE", "/items/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, None);

        let (status, body) = send(&app, "GET", "/items/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, Some(json!({ "error": "Item not found" })));
    }

    #[tokio::test]
    async fn list_returns_every_item() {
        let app = test_router();

        let (status, body) = send(&app, "GET", "/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!([])));

        send(&app, "POST", "/items", Some(r#"{"name":"A","price":1}"#)).await;
        send(&app, "POST", "/items", Some(r#"{"name":"B","price":2}"#)).await;

        let (status, body) = send(&app, "GET", "/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            Some(json!([
                { "id": 1, "name": "A", "price": 1 },
                { "id": 2, "name": "B", "price": 2 }
            ]))
        );
    }

    #[tokio::test]
    async fn unknown_ids_are_404_for_every_method() {
        let app = test_router();
        let not_found = Some(json!({ "error": "Item not found" }));

        let (status, body) = send(&app, "GET", "/items/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, not_found);

        let (status, body) =
            send(&app, "PUT", "/items/999", Some(r#"{"name":"Ghost","price":1}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, not_found);

        let (status, body) = send(&app, "DELETE", "/items/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, not_found);
    }

    #[tokio::test]
    async fn malformed_create_bodies_are_400_and_create_nothing() {
        let app = test_router();

        for raw in [
            r#"{"price":100}"#,
            r#"{"name":"Widget","price":"abc"}"#,
            r#"{"name":"Widget","price":1.5}"#,
            r#"{"name":"  ","price":1}"#,
            r#"{"name":"Widget""#,
        ] {
            let (status, body) = send(&app, "POST", "/items", Some(raw)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw}");
            assert!(body.unwrap()["error"].is_string());
        }

        let (_, body) = send(&app, "GET", "/items", None).await;
        assert_eq!(body, Some(json!([])));
    }

    #[tokio::test]
    async fn create_without_json_content_type_is_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .body(Body::from(r#"{"name":"Widget","price":100}"#))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_update_body_is_400_and_leaves_row_alone() {
        let app = test_router();
        send(&app, "POST", "/items", Some(r#"{"name":"Widget","price":100}"#)).await;

        let (status, _) = send(&app, "PUT", "/items/1", Some(r#"{"name":"Widget2"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", "/items/1", None).await;
        assert_eq!(body, Some(json!({ "id": 1, "name": "Widget", "price": 100 })));
    }

    #[tokio::test]
    async fn ids_outside_the_serial_range_are_404() {
        let app = test_router();
        let not_found = Some(json!({ "error": "Item not found" }));

        for uri in ["/items/2147483648", "/items/-2147483649"] {
            for (method, body) in [
                ("GET", None),
                ("PUT", Some(r#"{"name":"Widget","price":1}"#)),
                ("DELETE", None),
            ] {
                let (status, json) = send(&app, method, uri, body).await;
                assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
                assert_eq!(json, not_found);
            }
        }
    }

    #[tokio::test]
    async fn non_integer_id_is_400() {
        let app = test_router();

        for (method, body) in [
            ("GET", None),
            ("PUT", Some(r#"{"name":"Widget","price":1}"#)),
            ("DELETE", None),
        ] {
            let (status, json) = send(&app, method, "/items/abc", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
            assert!(json.unwrap()["error"].is_string());
        }
    }

    #[tokio::test]
    async fn concurrent_posts_get_distinct_ids() {
        let app = test_router();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move {
                    let raw = format!(r#"{{"name":"Item {i}","price":{i}}}"#);
                    send(&app, "POST", "/items", Some(&raw)).await
                })
            })
            .collect();

        let mut ids = std::collections::HashSet::new();
        for task in tasks {
            let (status, body) = task.await.unwrap();
            assert_eq!(status, StatusCode::CREATED);
            assert!(ids.insert(body.unwrap()["id"].as_i64().unwrap()));
        }
        assert_eq!(ids.len(), 16);
    }

    /// Every call fails the way a dropped database connection would.
    struct UnavailableRepository;

    fn unavailable() -> DbError {
        DbError::Query(database::sqlx::Error::PoolClosed)
    }

    #[async_trait]
    impl ItemRepository for UnavailableRepository {
        async fn list_items(&self) -> Result<Vec<Item>, DbError> {
            Err(unavailable())
        }
        async fn get_item(&self, _id: ItemId) -> Result<Item, DbError> {
            Err(unavailable())
        }
        async fn create_item(&self, _item: NewItem) -> Result<Item, DbError> {
            Err(unavailable())
        }
        async fn update_item(&self, _id: ItemId, _item: NewItem) -> Result<Item, DbError> {
            Err(unavailable())
        }
        async fn delete_item(&self, _id: ItemId) -> Result<(), DbError> {
            Err(unavailable())
        }
    }

    #[tokio::test]
    async fn store_failures_are_500() {
        let app = create_router(Arc::new(UnavailableRepository));
        let expected = Some(json!({ "error": "An internal database error occurred" }));

        for (method, uri, body) in [
            ("GET", "/items", None),
            ("GET", "/items/1", None),
            ("POST", "/items", Some(r#"{"name":"Widget","price":1}"#)),
            ("PUT", "/items/1", Some(r#"{"name":"Widget","price":1}"#)),
            ("DELETE", "/items/1", None),
        ] {
            let (status, json) = send(&app, method, uri, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
            assert_eq!(json, expected);
        }
    }

    #[tokio::test]
    async fn health_does_not_touch_the_store() {
        let app = create_router(Arc::new(UnavailableRepository));
        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
