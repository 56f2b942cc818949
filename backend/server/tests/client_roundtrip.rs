use std::sync::Arc;

use board::{
    app,
    config::{Config, parse_origins},
    state::AppState,
    user::MemoryStore,
};
use contract::{AuthClient, ClientError, LoginRequest, Role, Session, SignUpRequest, UserInfo};
use tokio::net::TcpListener;

async fn spawn_server() -> String {
    let config = Config {
        port: 0,
        redis_url: None,
        jwt_secret: "c3RhbmRhcmQtYm9hcmQtdGVzdC1zZWNyZXQta2V5LTAxMjM0NTY3ODk=".to_string(),
        jwt_expiration_ms: 60_000,
        bcrypt_cost: 4,
        cors_origins: parse_origins("http://localhost:5173"),
    };
    let state = AppState::with_store(config, Arc::new(MemoryStore::new())).expect("state");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app(state)).await.expect("serve app") });

    format!("http://{addr}")
}

fn sign_up_request() -> SignUpRequest {
    SignUpRequest {
        email: "login@test.com".to_string(),
        password: "securepassword123".to_string(),
        nickname: "newbie".to_string(),
    }
}

#[tokio::test]
async fn client_signs_up_logs_in_and_reads_profile() {
    let client = AuthClient::new(spawn_server().await);

    let created = client.sign_up(&sign_up_request()).await.expect("sign up");
    assert_eq!(created.role, Role::User);

    let login = client
        .login(&LoginRequest {
            email: "login@test.com".to_string(),
            password: "securepassword123".to_string(),
        })
        .await
        .expect("login");
    assert_eq!(login.user_id, created.id);

    let mut session = Session::default();
    session.login(UserInfo::from(&login), login.access_token.clone());
    assert!(session.is_authenticated);

    let me = client.me(&login.access_token).await.expect("me");
    assert_eq!(me, created);
}

#[tokio::test]
async fn client_surfaces_server_messages() {
    let client = AuthClient::new(spawn_server().await);
    client.sign_up(&sign_up_request()).await.expect("sign up");

    let err = client.sign_up(&sign_up_request()).await.unwrap_err();
    assert_eq!(err.to_string(), "Email is already in use.");

    let err = client
        .login(&LoginRequest {
            email: "login@test.com".to_string(),
            password: "wrongpassword".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { ref code, .. } if code == "INVALID_CREDENTIALS"));

    let err = client.me("expired.or.bogus").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { ref code, .. } if code == "UNAUTHORIZED"));
}
