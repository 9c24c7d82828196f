// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, profile, quiz, subscription},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public: registration and sign-in.
/// * Signed in: quizzes, sessions, subscriptions, profile, admin registration.
/// * Admin only: quiz authoring, results and analytics.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/sign-in", post(auth::sign_in));

    let user_routes = Router::new()
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/me", get(auth::me))
        .route("/api/quizzes", get(quiz::list_quizzes))
        .route("/api/quizzes/{id}/sessions", post(quiz::begin_session))
        .route("/api/sessions/{id}", get(quiz::get_session))
        .route("/api/sessions/{id}/access", post(quiz::validate_access))
        .route("/api/sessions/{id}/answers", post(quiz::submit_answer))
        .route("/api/sessions/{id}/result", get(quiz::get_result))
        .route("/api/subscriptions", get(subscription::list_subscriptions))
        .route(
            "/api/subscriptions/{admin_id}",
            post(subscription::subscribe).delete(subscription::unsubscribe),
        )
        .route("/api/admins", get(subscription::list_admins))
        .route("/api/profile/results", get(profile::my_results))
        .route("/api/profile/overview", get(profile::overview))
        .route(
            "/api/admin/register",
            post(admin::register_admin).delete(admin::remove_admin),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/api/admin/quizzes",
            get(admin::list_quizzes).post(admin::create_quiz),
        )
        .route("/api/admin/quizzes/{id}", delete(admin::delete_quiz))
        .route("/api/admin/quizzes/{id}/auth-code", put(admin::set_auth_code))
        .route("/api/admin/quizzes/{id}/questions", post(admin::add_question))
        .route(
            "/api/admin/quizzes/{id}/questions/{index}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/api/admin/quizzes/{id}/results", get(admin::quiz_results))
        .route("/api/admin/quizzes/{id}/analytics", get(admin::quiz_analytics))
        // Double middleware protection: Auth first, then Admin check
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::Config, store::MemoryStore};

    fn app() -> Router {
        let state = AppState::new(Config::for_tests("router_secret"), Arc::new(MemoryStore::new()));
        create_router(state)
    }

    async fn status_of(method: Method, uri: &str) -> u16 {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app().oneshot(request).await.unwrap().status().as_u16()
    }

    #[tokio::test]
    async fn unknown_paths_are_404_even_without_a_token() {
        assert_eq!(status_of(Method::GET, "/api/nope").await, 404);
    }

    #[tokio::test]
    async fn guarded_routes_are_401_without_a_token() {
        assert_eq!(status_of(Method::GET, "/api/quizzes").await, 401);
        assert_eq!(status_of(Method::GET, "/api/admin/quizzes").await, 401);
        assert_eq!(status_of(Method::POST, "/api/auth/sign-out").await, 401);
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/quizzes")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }
}
