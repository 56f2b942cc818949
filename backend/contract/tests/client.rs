use axum::{Json, Router, http::StatusCode, routing::post};
use contract::{
    ApiResponse, AuthClient, ClientError, LoginRequest, LoginResponse, Role, SignUpRequest,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    format!("http://{addr}")
}

fn login_request() -> LoginRequest {
    LoginRequest {
        email: "login@test.com".to_string(),
        password: "securepassword123".to_string(),
    }
}

#[tokio::test]
async fn login_returns_envelope_data() {
    let app = Router::new().route(
        "/api/v1/auth/login",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["email"], "login@test.com");

            Json(ApiResponse::success(LoginResponse {
                access_token: "mocked.jwt.access.token".to_string(),
                user_id: 1,
                email: "login@test.com".to_string(),
                nickname: "newbie".to_string(),
                role: Role::User,
            }))
        }),
    );
    let client = AuthClient::new(spawn(app).await);

    let response = client.login(&login_request()).await.expect("login");

    assert_eq!(response.access_token, "mocked.jwt.access.token");
    assert_eq!(response.user_id, 1);
}

#[tokio::test]
async fn failure_envelope_surfaces_server_message() {
    let app = Router::new().route(
        "/api/v1/auth/login",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::failure(
                    "INVALID_CREDENTIALS",
                    "Email or password does not match.",
                )),
            )
        }),
    );
    let client = AuthClient::new(spawn(app).await);

    let err = client.login(&login_request()).await.unwrap_err();

    assert_eq!(err.to_string(), "Email or password does not match.");
    assert!(matches!(err, ClientError::Api { ref code, .. } if code == "INVALID_CREDENTIALS"));
}

#[tokio::test]
async fn failure_without_message_falls_back() {
    let app = Router::new().route(
        "/api/v1/auth/signup",
        post(|| async { Json(json!({ "success": false, "data": null, "error": null })) }),
    );
    let client = AuthClient::new(spawn(app).await);

    let err = client
        .sign_up(&SignUpRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unknown error");
}

#[tokio::test]
async fn error_status_with_success_envelope_is_rejected() {
    let app = Router::new().route(
        "/api/v1/auth/login",
        post(|| async { (StatusCode::BAD_GATEWAY, Json(ApiResponse::success(json!({})))) }),
    );
    let client = AuthClient::new(spawn(app).await);

    let err = client.login(&login_request()).await.unwrap_err();

    assert!(matches!(err, ClientError::Status(s) if s == StatusCode::BAD_GATEWAY));
    assert_eq!(err.to_string(), "HTTP error: 502 Bad Gateway");
}

#[tokio::test]
async fn non_json_error_reports_status() {
    let app = Router::new().route(
        "/api/v1/auth/login",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let client = AuthClient::new(format!("{}/", spawn(app).await));

    let err = client.login(&login_request()).await.unwrap_err();

    assert!(matches!(err, ClientError::Status(s) if s == StatusCode::SERVICE_UNAVAILABLE));
}
