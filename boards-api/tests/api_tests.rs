/// HTTP tests for the Boards API
///
/// These run the full router (principal layer, error mapping, security
/// headers) against the in-memory store.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use boards_shared::models::notification::NotificationKind;
use common::{account_id, test_config, token, TestContext, PASSWORD};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_reports_connected_store() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_signup_then_me() {
    let ctx = TestContext::new();

    let session = ctx.signup("juan", "juan@example.com").await;
    assert_eq!(session["username"], "juan");
    assert!(session.get("password_hash").is_none());
    assert_eq!(session["accounts"].as_array().unwrap().len(), 1);

    let (status, me) = ctx.send("GET", "/v1/users/me", Some(token(&session)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "juan@example.com");

    let (status, boards) = ctx.send("GET", "/v1/boards", Some(token(&session)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(boards.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_signup_with_emailed_request_token() {
    let ctx = TestContext::with_config(test_config(false, false));

    let (status, _) = ctx
        .send(
            "POST",
            "/v1/auth/signup_request",
            None,
            Some(json!({ "email": "ana@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let signup_token = ctx.last_token(NotificationKind::SignupRequest).await;
    let (status, session) = ctx
        .send(
            "POST",
            "/v1/auth/signup",
            None,
            Some(json!({
                "username": "ana",
                "email": "ana@example.com",
                "password": PASSWORD,
                "signup_request_token": signup_token
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", session);
    assert!(session["token"].is_string());
}

#[tokio::test]
async fn test_validation_errors_are_field_maps() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send("POST", "/v1/auth/signup", None, Some(json!({ "email": "nope" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["username"].is_array());
    assert!(body["password"].is_array());
    assert!(body["email"].is_array());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/auth/signin")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signin_issues_usable_token() {
    let ctx = TestContext::new();
    ctx.signup("juan", "juan@example.com").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/signin",
            None,
            Some(json!({ "username": "juan", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["non_field_errors"].is_array());

    let (status, session) = ctx
        .send(
            "POST",
            "/v1/auth/signin",
            None,
            Some(json!({ "username": "JUAN", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send("GET", "/v1/users/me", Some(token(&session)), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_and_invalid_tokens() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.send("GET", "/v1/boards", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_shared_board_is_readable_anonymously() {
    let ctx = TestContext::new();
    let session = ctx.signup("juan", "juan@example.com").await;

    let (status, shared) = ctx
        .send(
            "POST",
            "/v1/boards",
            Some(token(&session)),
            Some(json!({ "name": "Roadmap", "account": account_id(&session), "is_shared": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", shared);

    let (status, private) = ctx
        .send(
            "POST",
            "/v1/boards",
            Some(token(&session)),
            Some(json!({ "name": "Notes", "account": account_id(&session) })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/v1/boards/{}", shared["id"].as_str().unwrap());
    let (status, body) = ctx.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Roadmap");

    let (status, _) = ctx.send("PUT", &uri, None, Some(json!({ "name": "Mine" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let uri = format!("/v1/boards/{}", private["id"].as_str().unwrap());
    let (status, _) = ctx.send("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let other = ctx.signup("ana", "ana@example.com").await;
    let (status, body) = ctx.send("GET", &uri, Some(token(&other)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_bulk_collaborators_report_aligned_errors() {
    let ctx = TestContext::new();
    let session = ctx.signup("juan", "juan@example.com").await;
    let (_, boards) = ctx.send("GET", "/v1/boards", Some(token(&session)), None).await;
    let board_id = boards[0]["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/boards/collaborators",
            Some(token(&session)),
            Some(json!([
                { "board": board_id, "email": "ana@example.com", "permission": "read" },
                { "board": board_id, "email": "leo@example.com" }
            ])),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], json!({}));
    assert!(items[1]["permission"].is_array());

    let uri = format!("/v1/boards/collaborators?board={}", board_id);
    let (status, listed) = ctx.send("GET", &uri, Some(token(&session)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, created) = ctx
        .send(
            "POST",
            "/v1/boards/collaborators",
            Some(token(&session)),
            Some(json!([{ "board": board_id, "email": "ana@example.com", "permission": "read" }])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.as_array().unwrap().len(), 1);
    assert_eq!(created[0]["user_data"]["is_invited"], true);
}

#[tokio::test]
async fn test_single_collaborator_add_answers_with_object() {
    let ctx = TestContext::new();
    let owner = ctx.signup("juan", "juan@example.com").await;
    let member = ctx.signup("ana", "ana@example.com").await;
    let (_, boards) = ctx.send("GET", "/v1/boards", Some(token(&owner)), None).await;
    let board_id = boards[0]["id"].as_str().unwrap().to_string();

    let payload = json!({
        "board": board_id,
        "user": member["id"],
        "permission": "write"
    });

    let (status, created) = ctx
        .send("POST", "/v1/boards/collaborators", Some(token(&owner)), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["permission"], "write");
    assert_eq!(created["user_data"]["username"], "ana");

    let (status, body) = ctx
        .send("POST", "/v1/boards/collaborators", Some(token(&owner)), Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["user"].is_array());

    let uri = format!("/v1/boards/{}/leave", board_id);
    let (status, _) = ctx.send("POST", &uri, Some(token(&member)), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_collaborator_request_lifecycle() {
    let ctx = TestContext::new();
    let owner = ctx.signup("juan", "juan@example.com").await;
    let (_, boards) = ctx.send("GET", "/v1/boards", Some(token(&owner)), None).await;
    let board_id = boards[0]["id"].as_str().unwrap().to_string();

    let (status, request) = ctx
        .send(
            "POST",
            "/v1/boards/collaborators/requests",
            None,
            Some(json!({ "email": "ana@example.com", "board": board_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", request);
    assert_eq!(request["status"], "pending");

    let (status, listed) = ctx
        .send("GET", "/v1/boards/collaborators/requests", Some(token(&owner)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let uri = format!(
        "/v1/boards/collaborators/requests/{}/accept",
        request["id"].as_str().unwrap()
    );
    let (status, accepted) = ctx.send("PUT", &uri, Some(token(&owner)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (status, again) = ctx.send("PUT", &uri, Some(token(&owner)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["status"], "accepted");
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let ctx = TestContext::with_config(test_config(true, true));

    let response = ctx
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_some());
}

#[tokio::test]
async fn test_change_password_and_cancel_account() {
    let ctx = TestContext::new();
    let session = ctx.signup("juan", "juan@example.com").await;

    let (status, _) = ctx
        .send(
            "PUT",
            "/v1/users/me/password",
            Some(token(&session)),
            Some(json!({
                "current_password": PASSWORD,
                "password1": "N3w$ecretPass",
                "password2": "N3w$ecretPass"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(
            "POST",
            "/v1/users/me/cancel",
            Some(token(&session)),
            Some(json!({ "current_password": "N3w$ecretPass" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send("GET", "/v1/users/me", Some(token(&session)), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
