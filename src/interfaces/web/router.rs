use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware,
    middleware::Next,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::handlers::{analytics, config, connectors, executions, status, templates, workflows};
use super::{AppState, web_static_handler};

fn build_localhost_cors(port: u16) -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
}

pub(crate) fn build_router(state: AppState) -> Router {
    let port = state.port;

    Router::new()
        .route("/api/status", get(status::get_status))
        .route(
            "/api/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/api/workflows/{id}",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route(
            "/api/workflows/{id}/activate",
            post(workflows::activate_workflow),
        )
        .route(
            "/api/workflows/{id}/deactivate",
            post(workflows::deactivate_workflow),
        )
        .route(
            "/api/workflows/{id}/execute",
            post(workflows::execute_workflow),
        )
        .route("/api/executions", get(executions::list_executions))
        .route("/api/executions/{id}", get(executions::get_execution))
        .route("/api/analytics", get(analytics::get_analytics))
        .route(
            "/api/config",
            get(config::get_config).put(config::put_config),
        )
        .route("/api/templates", get(templates::list_templates))
        .route("/api/templates/categories", get(templates::list_categories))
        .route("/api/templates/{id}", get(templates::get_template))
        .route(
            "/api/templates/{id}/deploy",
            post(templates::deploy_template),
        )
        .route("/api/connectors", get(connectors::list_connectors))
        .route("/api/connectors/{slug}", get(connectors::get_connector))
        .fallback(web_static_handler)
        .layer(middleware::from_fn(security_headers))
        .layer(build_localhost_cors(port))
        .with_state(state)
}

async fn security_headers(req: Request<Body>, next: Next) -> axum::response::Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'",
        ),
    );
    response
}
