//! HTTP router.

use crate::{handlers, state::AppState};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the application router.
///
/// # Routes
///
/// - `GET /health`
/// - `GET /api/v1/schemas`, `GET /api/v1/schemas/{name}/validation`
/// - `POST /api/v1/plans`, `POST /api/v1/whatif`
/// - `GET /api/v1/analyses`, `GET /api/v1/analyses/{id}`, `GET /api/v1/analyses/{id}/graph`
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Schema panel
        .route("/schemas", get(handlers::schemas::list_schemas))
        .route(
            "/schemas/{name}/validation",
            get(handlers::schemas::validate_schema),
        )
        // Query panel
        .route("/plans", post(handlers::plans::create_plan))
        .route("/whatif", post(handlers::plans::create_whatif))
        // Results and visualisation
        .route("/analyses", get(handlers::analyses::list_analyses))
        .route("/analyses/{id}", get(handlers::analyses::get_analysis))
        .route("/analyses/{id}/graph", get(handlers::analyses::get_graph));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api)
        // Browser front-ends are served from another origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::plan::Modifications,
        services::{
            analysis_store::{AnalysisStore, tests::analysis},
            graphviz::Graphviz,
        },
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// State whose pool never connects; only handlers that fail before
    /// touching the database can be exercised.
    fn test_state() -> AppState {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy_with(config.connect_options());

        AppState {
            pool,
            store: AnalysisStore::new(10),
            graphviz: Graphviz::new("qep-lens-no-such-graphviz-binary", 1_000),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn invalid_queries_are_rejected_before_planning() {
        let app = router(test_state());

        let response = app
            .oneshot(post_json(
                "/api/v1/plans",
                json!({ "query": "DELETE FROM orders" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "invalid_query");
    }

    #[tokio::test]
    async fn whatif_rejects_multiple_statements() {
        let app = router(test_state());

        let response = app
            .oneshot(post_json(
                "/api/v1/whatif",
                json!({
                    "query": "SELECT 1; SELECT 2",
                    "modifications": { "node_type": "Merge Join" }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "invalid_query");
    }

    #[tokio::test]
    async fn whatif_without_a_question_is_a_bad_request() {
        let app = router(test_state());

        let response = app
            .oneshot(post_json(
                "/api/v1/whatif",
                json!({ "query": "SELECT * FROM orders" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn unknown_analysis_is_not_found() {
        let app = router(test_state());
        let uri = format!("/api/v1/analyses/{}", uuid::Uuid::new_v4());

        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "analysis_not_found"
        );
    }

    #[tokio::test]
    async fn stored_analyses_are_listed_and_fetched() {
        let state = test_state();
        let stored = analysis("SELECT * FROM nation");
        let id = stored.id;
        state.store.insert(stored).await;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/analyses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        assert_eq!(list.as_array().map(Vec::len), Some(1));
        assert_eq!(list[0]["kind"], "plan");
        assert_eq!(list[0]["total_cost"], 52.32);

        let response = app
            .oneshot(
                Request::get(format!("/api/v1/analyses/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["qep"]["Plan"]["Node Type"], "Hash Join");
        assert_eq!(body["qep_tree"]["nodes"].as_array().map(Vec::len), Some(4));
        assert!(body["aqp_tree"].is_null());
    }

    #[tokio::test]
    async fn graph_as_dot_needs_no_graphviz() {
        let state = test_state();
        let mut stored = analysis("SELECT * FROM customer");
        stored.modifications = Some(Modifications {
            target_node_type: Some("Seq Scan".into()),
            ..Default::default()
        });
        let id = stored.id;
        state.store.insert(stored).await;

        let response = router(state)
            .oneshot(
                Request::get(format!("/api/v1/analyses/{id}/graph?format=dot"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/vnd.graphviz; charset=utf-8"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let dot = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(dot.starts_with("digraph plan {"));
        assert!(dot.contains("QEP (total cost 52.32)"));
        assert_eq!(dot.matches("fillcolor").count(), 1);
    }

    #[tokio::test]
    async fn graph_of_missing_plan_is_unavailable() {
        let state = test_state();
        let stored = analysis("SELECT 1");
        let id = stored.id;
        state.store.insert(stored).await;

        let response = router(state)
            .oneshot(
                Request::get(format!("/api/v1/analyses/{id}/graph?plan=aqp&format=dot"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "plan_unavailable");
    }

    #[tokio::test]
    async fn image_rendering_without_graphviz_is_unavailable() {
        let state = test_state();
        let stored = analysis("SELECT 1");
        let id = stored.id;
        state.store.insert(stored).await;

        let response = router(state)
            .oneshot(
                Request::get(format!("/api/v1/analyses/{id}/graph?format=svg"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unsupported_graph_format_is_a_bad_request() {
        let state = test_state();
        let stored = analysis("SELECT 1");
        let id = stored.id;
        state.store.insert(stored).await;

        let response = router(state)
            .oneshot(
                Request::get(format!("/api/v1/analyses/{id}/graph?format=gif"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
