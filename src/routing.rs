//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_user,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    student::{create_student_endpoint, get_new_student_modal},
    transaction::{create_transaction_endpoint, get_transaction_modal},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::NEW_STUDENT_VIEW, get(get_new_student_modal))
        .route(endpoints::NEW_TRANSACTION_VIEW, get(get_transaction_modal))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST routes need to use the HX-REDIRECT header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::STUDENTS_API, post(create_student_endpoint))
            .route(
                endpoints::STUDENT_TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{AppState, build_router, endpoints};

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "42",
            "Asia/Jakarta",
        )
        .unwrap();

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn dashboard_redirects_to_log_in_without_session() {
        let server = get_test_server();

        let response = server.get(endpoints::DASHBOARD_VIEW).await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header("location");
        let location = location.to_str().unwrap();
        assert!(
            location.starts_with(endpoints::LOG_IN_VIEW),
            "want redirect to log in page, got {location}"
        );
        assert!(
            location.contains("redirect_url=%2Fdashboard"),
            "want redirect URL back to the dashboard, got {location}"
        );
    }

    #[tokio::test]
    async fn api_redirects_to_log_in_with_hx_redirect() {
        let server = get_test_server();

        let response = server
            .post(endpoints::STUDENTS_API)
            .form(&[("nama", "Ahmad"), ("kelas", "1A"), ("saldo", "0")])
            .await;

        response.assert_status_ok();
        let hx_redirect = response.header("hx-redirect");
        assert!(
            hx_redirect
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn log_in_page_is_public() {
        let server = get_test_server();

        server.get(endpoints::LOG_IN_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let server = get_test_server();

        server
            .get("/definitely/not/a/route")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
