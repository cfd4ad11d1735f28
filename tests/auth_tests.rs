// tests/auth_tests.rs

use std::sync::Arc;

use simplylearn::{config::Config, routes, state::AppState, utils::mailer::LogMailer};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> (String, PgPool) {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        port: 0,
        upload_dir: std::env::temp_dir()
            .join("simplylearn_test_uploads")
            .to_string_lossy()
            .to_string(),
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        mailer: Arc::new(LogMailer),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

fn unique_email(prefix: &str) -> String {
    format!(
        "{}_{}@test.com",
        prefix,
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

async fn register(client: &reqwest::Client, address: &str, email: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Test Student",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register request failed")
}

async fn stored_otp(pool: &PgPool, email: &str) -> String {
    sqlx::query_scalar::<_, Option<String>>("SELECT otp_code FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("User row should exist")
        .expect("OTP should be set")
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_on_malformed_email() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Someone",
            "email": "not-an-email",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("dup");

    assert_eq!(register(&client, &address, &email).await.status().as_u16(), 201);
    assert_eq!(register(&client, &address, &email).await.status().as_u16(), 409);
}

#[tokio::test]
async fn registration_verification_and_login_flow() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("flow");

    // 1. Register: account starts unverified, no token issued
    let reg = register(&client, &address, &email).await;
    assert_eq!(reg.status().as_u16(), 201);
    let reg_body: serde_json::Value = reg.json().await.unwrap();
    assert_eq!(reg_body["is_verified"], false);
    assert!(reg_body.get("password_hash").is_none(), "hash must not leak");
    assert!(reg_body.get("otp_code").is_none(), "OTP must not leak");

    // 2. Login before verification is refused
    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 401);
    let body: serde_json::Value = login.json().await.unwrap();
    assert!(
        body["error"].as_str().unwrap().contains("verify"),
        "expected a verify-first message, got: {}",
        body
    );

    // 3. Verify with the emailed code (read back from the database)
    let otp = stored_otp(&pool, &email).await;
    let verify = client
        .post(format!("{}/api/auth/verify-email", address))
        .json(&serde_json::json!({"email": email, "otp": otp}))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status().as_u16(), 200);
    let verify_body: serde_json::Value = verify.json().await.unwrap();
    assert!(verify_body["token"].as_str().is_some());

    // OTP fields are cleared after verification
    let cleared =
        sqlx::query_scalar::<_, Option<String>>("SELECT otp_code FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(cleared.is_none());

    // 4. Login now succeeds and delivers the httpOnly cookie
    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 200);

    let cookie = login
        .headers()
        .get("set-cookie")
        .expect("login must set the session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let login_body: serde_json::Value = login.json().await.unwrap();
    assert_eq!(login_body["is_verified"], true);
    let token = login_body["token"].as_str().unwrap();

    // 5. The bearer fallback works for non-browser clients
    let profile = client
        .get(format!("{}/api/auth/profile", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(profile.status().as_u16(), 200);
    let profile_body: serde_json::Value = profile.json().await.unwrap();
    assert_eq!(profile_body["email"], email);
}

#[tokio::test]
async fn verification_fails_with_wrong_code() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("wrongotp");

    register(&client, &address, &email).await;

    // Derive a code guaranteed to differ from the stored one.
    let stored = stored_otp(&pool, &email).await;
    let wrong = if stored == "123456" { "654321" } else { "123456" };

    let verify = client
        .post(format!("{}/api/auth/verify-email", address))
        .json(&serde_json::json!({"email": email, "otp": wrong}))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status().as_u16(), 400);
}

#[tokio::test]
async fn verification_fails_after_expiry_even_with_correct_code() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("expotp");

    register(&client, &address, &email).await;
    let otp = stored_otp(&pool, &email).await;

    // Age the code past its window.
    sqlx::query("UPDATE users SET otp_expires_at = NOW() - INTERVAL '1 minute' WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();

    let verify = client
        .post(format!("{}/api/auth/verify-email", address))
        .json(&serde_json::json!({"email": email, "otp": otp}))
        .send()
        .await
        .unwrap();
    assert_eq!(verify.status().as_u16(), 400);
    let body: serde_json::Value = verify.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn account_locks_after_three_failed_logins() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("lockout");

    register(&client, &address, &email).await;

    // Manual verification
    sqlx::query("UPDATE users SET is_verified = TRUE WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();

    // 1-3: wrong password, still plain 401s
    for _ in 0..3 {
        let resp = client
            .post(format!("{}/api/auth/login", address))
            .json(&serde_json::json!({"email": email, "password": "wrongpassword"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 401);
    }

    // 4: correct password, but the lock window is active
    let locked = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status().as_u16(), 403);
    let body: serde_json::Value = locked.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("locked"), "got: {}", message);
    assert!(message.contains("minute"), "got: {}", message);

    // Simulate the window passing; the expiry check at login time lets
    // a correct password through and resets the lockout fields.
    sqlx::query("UPDATE users SET lock_until = NOW() - INTERVAL '1 second' WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();

    let unlocked = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(unlocked.status().as_u16(), 200);

    let attempts =
        sqlx::query_scalar::<_, i32>("SELECT failed_login_attempts FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(attempts, 0);
}

#[tokio::test]
async fn profile_update_issues_fresh_token() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email("profile");

    register(&client, &address, &email).await;
    sqlx::query("UPDATE users SET is_verified = TRUE WHERE email = $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap();

    let updated: serde_json::Value = client
        .put(format!("{}/api/auth/profile", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "name": "  Renamed Student  ",
            "bio": "<script>alert(1)</script><b>hello</b>"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(updated["name"], "Renamed Student");
    assert!(updated["token"].as_str().is_some());

    // Script content is gone, the harmless tag survives the allowlist.
    let bio = sqlx::query_scalar::<_, String>("SELECT bio FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!bio.contains("script"));
    assert!(bio.contains("<b>hello</b>"));
}
