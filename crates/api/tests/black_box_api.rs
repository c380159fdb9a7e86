use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pickline_api::app::{AppServices, build_app};
use pickline_auth::{JwtClaims, Role};
use reqwest::StatusCode;
use serde_json::{Value, json};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = build_app(SECRET.to_string(), Arc::new(AppServices::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: "admin".to_string(),
        roles,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn admin_token() -> String {
    mint_jwt(SECRET, vec![Role::admin()])
}

async fn post_json(client: &reqwest::Client, url: String, token: &str, body: Value) -> reqwest::Response {
    client.post(url).bearer_auth(token).json(&body).send().await.unwrap()
}

async fn patch_json(client: &reqwest::Client, url: String, body: Value) -> reqwest::Response {
    client.patch(url).json(&body).send().await.unwrap()
}

async fn create_actor(client: &reqwest::Client, srv: &TestServer, kind: &str, name: &str) -> i64 {
    let res = post_json(client, srv.url(&format!("/{kind}")), &admin_token(), json!({ "name": name })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

async fn create_order(client: &reqwest::Client, srv: &TestServer, so: &str) -> i64 {
    let res = post_json(
        client,
        srv.url("/orders"),
        &admin_token(),
        json!({ "so_number": so, "size": "L", "delivery_type": "PICKUP" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "UNASSIGNED");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_are_not_found_without_a_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/orders/1/bogus")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_required_for_admin_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/orders", "/orders/export"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let forged = mint_jwt("other-secret", vec![Role::admin()]);
    let res = client.get(srv.url("/orders")).bearer_auth(forged).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(srv.url("/whoami"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], "admin");
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn supervisor_can_read_but_not_create() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(SECRET, vec![Role::supervisor()]);

    let res = client.get(srv.url("/orders")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = post_json(
        &client,
        srv.url("/orders"),
        &token,
        json!({ "so_number": "SO-1", "size": "S", "delivery_type": "PICKUP" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn full_lifecycle_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let picker = create_actor(&client, &srv, "pickers", "Amy").await;
    let checker = create_actor(&client, &srv, "checkers", "Cat").await;
    let order = create_order(&client, &srv, "SO-1001").await;

    let res = client
        .patch(srv.url(&format!("/orders/{order}/assign")))
        .bearer_auth(admin_token())
        .json(&json!({ "picker_id": picker }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Stage endpoints need no token.
    let res = patch_json(&client, srv.url(&format!("/orders/{order}/start-picking")), json!({ "picker_id": picker })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = patch_json(&client, srv.url(&format!("/orders/{order}/end-picking")), json!({ "picker_id": picker })).await;
    let picked: Value = res.json().await.unwrap();
    assert_eq!(picked["status"], "PICKED");
    assert_eq!(picked["picker_end"], picked["idle_start"]);

    let res = patch_json(&client, srv.url(&format!("/orders/{order}/start-checking")), json!({ "checker_id": checker })).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = patch_json(&client, srv.url(&format!("/orders/{order}/end-checking")), json!({ "checker_id": checker })).await;
    let done: Value = res.json().await.unwrap();
    assert_eq!(done["status"], "DONE");

    let res = client
        .get(srv.url("/orders"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    let listing: Value = res.json().await.unwrap();
    assert_eq!(listing[0]["picker_name"], "Amy");
    assert_eq!(listing[0]["checker_name"], "Cat");
    assert!(listing[0]["total_time"].is_string());

    let res = client
        .get(srv.url("/orders/export"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let rows: Value = res.json().await.unwrap();
    assert_eq!(rows[0]["SO Number"], "SO-1001");
    assert_eq!(rows[0]["Status"], "DONE");
    assert_eq!(rows[0]["Date"], Utc::now().date_naive().to_string());
}

#[tokio::test]
async fn guard_rejections_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let checker = create_actor(&client, &srv, "checkers", "Cat").await;
    let order = create_order(&client, &srv, "SO-2").await;

    let res = patch_json(&client, srv.url(&format!("/orders/{order}/start-picking")), json!({ "picker_id": 1 })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transition");

    let res = patch_json(&client, srv.url(&format!("/orders/{order}/start-checking")), json!({ "checker_id": checker })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_ready");

    let res = patch_json(&client, srv.url("/orders/999/end-picking"), json!({ "picker_id": 1 })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = patch_json(&client, srv.url("/orders/abc/end-picking"), json!({ "picker_id": 1 })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn roster_soft_delete_hides_from_listing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let zed = create_actor(&client, &srv, "pickers", "Zed").await;
    create_actor(&client, &srv, "pickers", "Amy").await;

    let listed: Value = reqwest::get(srv.url("/pickers")).await.unwrap().json().await.unwrap();
    let names: Vec<&str> = listed.as_array().unwrap().iter().map(|a| a["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Amy", "Zed"]);

    let res = client
        .delete(srv.url(&format!("/pickers/{zed}")))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Picker removed");

    let listed: Value = reqwest::get(srv.url("/pickers")).await.unwrap().json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = client
        .delete(srv.url("/pickers/404"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_input_and_bad_dates_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_json(
        &client,
        srv.url("/orders"),
        &admin_token(),
        json!({ "so_number": "  ", "size": "L", "delivery_type": "PICKUP" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post_json(&client, srv.url("/checkers"), &admin_token(), json!({ "name": "" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url("/orders/export?date=yesterday"))
        .bearer_auth(admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
