// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{assignments, auth, courses, dashboard, enrollments, forum, quizzes, submissions},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, tutor_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, courses, enrollments, assignments,
///   submissions, quizzes, forum, dashboard).
/// * Applies global middleware (Trace, CORS) and serves uploaded files.
/// * Injects global state (pool, config, mailer).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    // Credentials are required for the httpOnly session cookie.
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/logout", get(auth::logout))
        // Protected profile routes
        .merge(
            Router::new()
                .route("/profile", get(auth::get_profile).put(auth::update_profile))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let course_routes = Router::new()
        .route("/", get(courses::list_courses))
        .route("/{id}", get(courses::get_course))
        .merge(
            Router::new()
                .route("/", post(courses::create_course))
                .route("/{id}", put(courses::update_course))
                .layer(middleware::from_fn(tutor_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let enrollment_routes = Router::new()
        .route("/my", get(enrollments::my_enrollments))
        .route("/check/{course_id}", get(enrollments::check_enrollment))
        .merge(
            Router::new()
                .route("/", post(enrollments::enroll))
                .layer(middleware::from_fn(student_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let assignment_routes = Router::new()
        .route(
            "/course/{course_id}",
            get(assignments::list_course_assignments),
        )
        .route("/{id}", get(assignments::get_assignment))
        .merge(
            Router::new()
                .route("/", post(assignments::create_assignment))
                .route("/tutor/my", get(assignments::tutor_assignments))
                .layer(middleware::from_fn(tutor_middleware)),
        )
        .merge(
            Router::new()
                .route("/student/my", get(assignments::my_assignments))
                .layer(middleware::from_fn(student_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let submission_routes = Router::new()
        .merge(
            Router::new()
                .route("/", post(submissions::submit))
                .route("/my/{assignment_id}", get(submissions::my_submission))
                .layer(middleware::from_fn(student_middleware)),
        )
        .merge(
            Router::new()
                .route(
                    "/assignment/{assignment_id}",
                    get(submissions::list_for_assignment),
                )
                .route("/{id}/grade", put(submissions::grade_submission))
                .layer(middleware::from_fn(tutor_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/course/{course_id}", get(quizzes::list_course_quizzes))
        .route("/{id}", get(quizzes::get_quiz))
        .merge(
            Router::new()
                .route("/", post(quizzes::create_quiz))
                .layer(middleware::from_fn(tutor_middleware)),
        )
        .merge(
            Router::new()
                .route("/{id}/submit", post(quizzes::submit_quiz))
                .layer(middleware::from_fn(student_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let forum_routes = Router::new()
        .route("/", post(forum::create_post))
        .route("/course/{course_id}", get(forum::list_posts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let dashboard_routes = Router::new()
        .route("/", get(dashboard::get_dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/enrollments", enrollment_routes)
        .nest("/api/assignments", assignment_routes)
        .nest("/api/submissions", submission_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/forum", forum_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest_service("/uploads", uploads)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
