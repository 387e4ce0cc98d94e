use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_user::create_user;
use super::handlers::get_user::get_user;
use super::handlers::index::index;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::protected::protected;
use super::handlers::update_user::update_user;
use super::middleware::require_session;
use crate::domain::login::ports::LoginServicePort;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub login_service: Arc<dyn LoginServicePort>,
    pub authenticator: Arc<Authenticator>,
}

pub fn create_router(
    user_service: Arc<dyn UserServicePort>,
    login_service: Arc<dyn LoginServicePort>,
    authenticator: Arc<Authenticator>,
) -> Router {
    let state = AppState {
        user_service,
        login_service,
        authenticator,
    };

    let public_routes = Router::new()
        .route("/", get(index))
        .route("/user", get(list_users).post(create_user))
        .route("/user/:id", get(get_user).put(update_user))
        .route("/login", post(login));

    let protected_routes = Router::new()
        .route("/protected", get(protected))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // Headers are left out of the span: Authorization carries the session token.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
