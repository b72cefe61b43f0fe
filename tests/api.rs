//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{QueuedModel, conversation, rate_limited_router, router, spoken_conversation};

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = router(conversation(QueuedModel::replying(&[])));

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
    assert_eq!(json["sessions"], 0);
    assert_eq!(json["model"], "queued-test-model");
}

#[tokio::test]
async fn test_conversation_end_to_end() {
    let model = QueuedModel::replying(&["Hi Alice!"]);
    let app = router(conversation(model.clone()));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/conversation",
            &json!({"text": "Hello", "userId": "alice"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "response": "Hi Alice!", "conversationId": "alice"})
    );

    let response = app.oneshot(get("/api/conversation/alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["conversationId"], "alice");
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "Hello");
    assert_eq!(history[1]["role"], "assistant");
    assert_eq!(history[1]["content"], "Hi Alice!");
    assert!(history[0]["createdAt"].is_string());
    assert_eq!(json["profile"]["name"], "User");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].user, "Hello");
    assert!(prompts[0].history.is_empty());
}

#[tokio::test]
async fn test_conversation_without_user_id_uses_default() {
    let app = router(conversation(QueuedModel::replying(&["Hey there"])));

    let response = app
        .oneshot(post_json("/api/conversation", &json!({"text": "Hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["conversationId"], "default");
}

#[tokio::test]
async fn test_blank_text_is_rejected_without_model_call() {
    let model = QueuedModel::replying(&["unused"]);
    let app = router(conversation(model.clone()));

    for body in [
        json!({"text": "   ", "userId": "bob"}),
        json!({"userId": "bob"}),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/conversation", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("text is required"));
        assert!(json.get("details").is_none());
    }

    assert!(model.prompts().is_empty());
    let response = app.oneshot(get("/api/conversation/bob")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = router(conversation(QueuedModel::replying(&[])));

    let request = Request::builder()
        .method("POST")
        .uri("/api/conversation")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_model_failure_returns_500_and_keeps_history() {
    let app = router(conversation(QueuedModel::failing("HTTP 503: overloaded")));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/conversation",
            &json!({"text": "Hello", "userId": "carol"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "language model request failed");
    assert_eq!(json["details"], "HTTP 503: overloaded");

    let response = app.oneshot(get("/api/conversation/carol")).await.unwrap();
    let json = body_json(response).await;
    assert!(json["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let app = router(conversation(QueuedModel::replying(&[])));

    let response = app.oneshot(get("/api/conversation/nobody")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn test_profile_update_feeds_next_prompt() {
    let model = QueuedModel::replying(&["Hi Dana!"]);
    let app = router(conversation(model.clone()));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/profile",
            &json!({"userId": "dana", "profile": {"name": "Dana", "memoryTopics": ["climbing"]}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["profile"]["name"], "Dana");
    assert_eq!(json["profile"]["memoryTopics"], json!(["climbing"]));
    assert_eq!(json["profile"]["preferences"], json!([]));

    // Absent keys survive a second partial update
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/profile",
            &json!({"userId": "dana", "profile": {"preferences": ["short answers"]}}),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["profile"]["name"], "Dana");
    assert_eq!(json["profile"]["preferences"], json!(["short answers"]));

    app.oneshot(post_json(
        "/api/conversation",
        &json!({"text": "Hello", "userId": "dana"}),
    ))
    .await
    .unwrap();

    let system = &model.prompts()[0].system;
    assert!(system.contains("Dana"));
    assert!(system.contains("climbing"));
    assert!(system.contains("short answers"));
}

#[tokio::test]
async fn test_user_id_is_used_verbatim_across_endpoints() {
    let model = QueuedModel::replying(&["Hi Bobby!"]);
    let app = router(conversation(model.clone()));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/profile",
            &json!({"userId": "bob ", "profile": {"name": "Bobby"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/conversation",
            &json!({"text": "Hello", "userId": "bob "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["conversationId"], "bob ");
    assert!(model.prompts()[0].system.contains("Bobby"));

    let response = app.oneshot(get("/api/conversation/bob%20")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["profile"]["name"], "Bobby");
    assert_eq!(json["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_profile_requires_user_and_profile() {
    let app = router(conversation(QueuedModel::replying(&[])));

    for body in [
        json!({"profile": {"name": "Eve"}}),
        json!({"userId": "eve"}),
        json!({"userId": "", "profile": {"name": "Eve"}}),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/profile", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn test_audio_reply_is_mpeg_with_conversation_header() {
    let app = router(spoken_conversation(QueuedModel::replying(&["Hello Frank"])));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/conversation/audio",
            &json!({"text": "Hi", "userId": "frank", "voiceId": "onyx"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(response.headers()["x-conversation-id"], "frank");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"onyx:Hello Frank");

    let response = app.oneshot(get("/api/conversation/frank")).await.unwrap();
    assert_eq!(body_json(response).await["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_audio_conversation_header_is_percent_encoded() {
    let app = router(spoken_conversation(QueuedModel::replying(&["Hola"])));

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/conversation/audio",
            &json!({"text": "Hi", "userId": "José"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-conversation-id"], "Jos%C3%A9");

    let response = app
        .oneshot(get("/api/conversation/Jos%C3%A9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["conversationId"], "José");
}

#[tokio::test]
async fn test_audio_with_unknown_voice_is_not_found() {
    let model = QueuedModel::replying(&["unused"]);
    let app = router(spoken_conversation(model.clone()));

    let response = app
        .oneshot(post_json(
            "/api/conversation/audio",
            &json!({"text": "Hi", "userId": "gus", "voiceId": "darth"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn test_audio_without_tts_is_unavailable() {
    let app = router(conversation(QueuedModel::replying(&["unused"])));

    let response = app
        .oneshot(post_json("/api/conversation/audio", &json!({"text": "Hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_voices_listing() {
    let app = router(spoken_conversation(QueuedModel::replying(&[])));
    let response = app.oneshot(get("/api/voices")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["defaultVoice"], "nova");
    assert_eq!(json["voices"].as_array().unwrap().len(), 6);

    let app = router(conversation(QueuedModel::replying(&[])));
    let json = body_json(app.oneshot(get("/api/voices")).await.unwrap()).await;
    assert!(json["voices"].as_array().unwrap().is_empty());
    assert!(json.get("defaultVoice").is_none());
}

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let app = rate_limited_router(conversation(QueuedModel::replying(&[])), 1);

    let first = app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await["success"], false);
}

#[tokio::test]
async fn test_cors_preflight_allows_post() {
    let app = router(conversation(QueuedModel::replying(&[])));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/conversation")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_static_dir_falls_back_to_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>voicechat</h1>").unwrap();

    let app = voicechat_gateway::ApiServerBuilder::new(
        std::sync::Arc::new(conversation(QueuedModel::replying(&[]))),
        0,
    )
    .static_dir(Some(dir.path().to_path_buf()))
    .build()
    .router();

    let response = app.oneshot(get("/some/client/route")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>voicechat</h1>");
}
