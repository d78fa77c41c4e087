use std::{collections::HashMap, time::Duration};

use axum::{
    body::Bytes,
    extract::Query,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use crackdefend_console::{
    commands::{Command, ListKind},
    error::FetchError,
    fetcher::{ApiClient, Backend},
    models::{Channel, ChannelSnapshot},
};
use serde_json::{json, Value};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(2)).unwrap()
}

fn lab() -> Router {
    Router::new()
        .route(
            "/stats",
            get(|| async {
                Json(json!({
                    "attacks": 4, "success": 1, "fail": 2, "blocked": 1, "emails_sent": 1,
                    "recent": [
                        {"time": "08:00:01", "user": "bob", "ip": "10.0.0.1", "pwd": "a", "status": "FAIL"},
                        {"time": "08:00:02", "user": "bob", "ip": "10.0.0.1", "pwd": "b", "status": "SUCCESS"}
                    ],
                    "most_targeted_email": "bob", "most_used_pwd": "a",
                    "most_aggressive_ip": "10.0.0.1", "geoip_country": "N/A", "geoip_city": "N/A",
                    "total_last_hour": 4
                }))
            }),
        )
        .route(
            "/mailhog",
            get(|| async { Json(json!([{"time": "08:00:03", "to": "soc@lab", "subject": "Block"}])) }),
        )
        .route("/blocked", get(|| async { Json(json!({"blocked": ["mallory"]})) }))
        .route("/whitelist", get(|| async { Json(json!({"whitelist": ["10.0.0.5"]})) }))
        .route("/users", get(|| async { Json(json!({"users": ["alice", "bob"]})) }))
        .route("/passwords", get(|| async { "not json" }))
        .route("/reset_stats", post(|| async { Json(json!({"status": "reset"})) }))
        .route(
            "/unblock",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({"status": "unblocked", "user": q.get("user")}))
            }),
        )
        .route(
            "/add_user",
            post(|Json(body): Json<Value>| async move {
                Json(json!({"status": "added", "echo": body}))
            }),
        )
        .route(
            "/upload_list",
            post(|headers: HeaderMap, body: Bytes| async move {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "content_type": content_type,
                    "body": String::from_utf8_lossy(&body),
                }))
            }),
        )
}

fn reply_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn fetches_stats_snapshot() {
    let api = client(&serve(lab()).await);
    match api.fetch(Channel::Stats).await.unwrap() {
        ChannelSnapshot::Stats(stats) => {
            assert_eq!(stats.attacks, 4);
            assert_eq!(stats.recent.len(), 2);
            assert_eq!(stats.most_aggressive_ip, "10.0.0.1");
        }
        other => panic!("unexpected snapshot {other:?}"),
    }
}

#[tokio::test]
async fn mail_log_accepts_bare_list() {
    let api = client(&serve(lab()).await);
    let snap = api.fetch(Channel::MailLog).await.unwrap();
    match snap {
        ChannelSnapshot::MailLog(entries) => assert_eq!(entries[0].to, "soc@lab"),
        other => panic!("unexpected snapshot {other:?}"),
    }
}

#[tokio::test]
async fn access_lists_combine_both_endpoints() {
    let api = client(&serve(lab()).await);
    assert_eq!(
        api.fetch(Channel::AccessLists).await.unwrap(),
        ChannelSnapshot::AccessLists {
            blocked: vec!["mallory".to_string()],
            whitelist: vec!["10.0.0.5".to_string()],
        }
    );
}

#[tokio::test]
async fn access_lists_fail_as_a_unit() {
    let app = Router::new()
        .route("/blocked", get(|| async { Json(json!({"blocked": ["mallory"]})) }))
        .route("/whitelist", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let api = client(&serve(app).await);
    let err = api.fetch(Channel::AccessLists).await.unwrap_err();
    assert!(
        matches!(err, FetchError::Status { status: 500, ref path } if path == "/whitelist"),
        "{err:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let api = client(&serve(lab()).await);
    let err = api.fetch(Channel::Passwords).await.unwrap_err();
    assert_eq!(err.kind(), "decode");
}

#[tokio::test]
async fn closed_port_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(&format!("http://{addr}"));
    let err = api.fetch(Channel::Users).await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn reset_reply_carries_status_field() {
    let api = client(&serve(lab()).await);
    let reply = api.execute(&Command::ResetStats).await.unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.status_field().as_deref(), Some("reset"));
}

#[tokio::test]
async fn unblock_sends_user_as_query() {
    let api = client(&serve(lab()).await);
    let reply = api
        .execute(&Command::UnblockUser {
            user: "bob@lab.local".into(),
        })
        .await
        .unwrap();
    assert_eq!(reply_json(&reply.body)["user"], "bob@lab.local");
}

#[tokio::test]
async fn add_user_posts_json_body() {
    let api = client(&serve(lab()).await);
    let reply = api
        .execute(&Command::AddUser {
            username: "carol".into(),
            password: "Winter2024!".into(),
        })
        .await
        .unwrap();
    assert_eq!(
        reply_json(&reply.body)["echo"],
        json!({"username": "carol", "password": "Winter2024!"})
    );
}

#[tokio::test]
async fn upload_is_multipart_with_type_and_file() {
    let api = client(&serve(lab()).await);
    let reply = api
        .execute(&Command::UploadList {
            kind: ListKind::Password,
            file_name: "mini.txt".into(),
            contents: b"hunter2\nletmein\n".to_vec(),
        })
        .await
        .unwrap();
    let echoed = reply_json(&reply.body);
    assert!(echoed["content_type"]
        .as_str()
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = echoed["body"].as_str().unwrap();
    assert!(body.contains("name=\"type\""));
    assert!(body.contains("password"));
    assert!(body.contains("filename=\"mini.txt\""));
    assert!(body.contains("letmein"));
}

#[tokio::test]
async fn missing_route_is_status_error() {
    let api = client(&serve(Router::new()).await);
    let err = api
        .execute(&Command::StartModule("attacker".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}
