use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use warden_api::app::dto::LoginResponse;
use warden_infra::{InMemoryCredentialStore, ServiceConfig, Services, SharedStore, seed_admin};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "P@ssw0rd!";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory store, bound to an ephemeral port.
        let store: SharedStore = Arc::new(InMemoryCredentialStore::new());
        let services = Services::new(
            store,
            ServiceConfig {
                bcrypt_cost: 4,
                token_ttl: None,
            },
        );
        seed_admin(&services).await.expect("failed to seed admin");

        let app = warden_api::app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/v1/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn admin_token(&self) -> String {
        let res = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(res.status(), StatusCode::OK);
        res.json::<LoginResponse>().await.unwrap().token
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn create_role(&self, token: &str, name: &str) -> i64 {
        let res = self.post("/v1/roles", token, json!({ "name": name })).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["role"]["id"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn jane(role_id: i64) -> Value {
    json!({
        "full_name": "Jane Doe",
        "email": "jane@x.com",
        "password": "P@ssw0rd1",
        "password_confirmation": "P@ssw0rd1",
        "role_id": role_id,
    })
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    for path in ["/v1/users", "/v1/roles", "/v1/profile", "/v1/users/1"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Unauthenticated.");
    }

    let res = srv
        .client
        .post(srv.url("/v1/logout"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn jane_lifecycle_login_profile_logout() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let role_id = srv.create_role(&admin, "Editor").await;

    let res = srv.post("/v1/users", &admin, jane(role_id)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["user"]["email"], "jane@x.com");
    assert!(created["user"].get("password").is_none());

    let res = srv.login("jane@x.com", "P@ssw0rd1").await;
    assert_eq!(res.status(), StatusCode::OK);
    let login: LoginResponse = res.json().await.unwrap();
    assert_eq!(login.message, "Login successful");
    assert!(!login.token.is_empty());

    let res = srv.get("/v1/profile", &login.token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let profile: Value = res.json().await.unwrap();
    assert_eq!(profile["full_name"], "Jane Doe");
    assert_eq!(profile["role_id"], role_id);

    let res = srv.post("/v1/logout", &login.token, json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully");

    let res = srv.get("/v1/profile", &login.token).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // The admin's own session is untouched by Jane's logout.
    let res = srv.get("/v1/profile", &admin).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn weak_password_names_unmet_rules() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let role_id = srv.create_role(&admin, "Editor").await;

    let mut body = jane(role_id);
    body["password"] = json!("short");
    body["password_confirmation"] = json!("short");

    let res = srv.post("/v1/users", &admin, body).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    let messages = body["errors"]["password"].as_array().unwrap();
    assert!(messages.iter().any(|m| m.as_str().unwrap().contains("at least 8 characters")));
    assert!(body["message"].as_str().unwrap().starts_with("The password"));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let srv = TestServer::spawn().await;

    let wrong = srv.login(ADMIN_EMAIL, "Wr0ng@pass").await;
    let unknown = srv.login("ghost@example.com", ADMIN_PASSWORD).await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let wrong: Value = wrong.json().await.unwrap();
    let unknown: Value = unknown.json().await.unwrap();
    assert_eq!(wrong, unknown);
    assert!(wrong.get("token").is_none());
}

#[tokio::test]
async fn concurrent_duplicate_email_creates_one_user() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let role_id = srv.create_role(&admin, "Editor").await;

    let mut other = jane(role_id);
    other["full_name"] = json!("Janet Doe");

    let (a, b) = tokio::join!(
        srv.post("/v1/users", &admin, jane(role_id)),
        srv.post("/v1/users", &admin, other),
    );
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::UNPROCESSABLE_ENTITY]);

    let users: Vec<Value> = srv.get("/v1/users", &admin).await.json().await.unwrap();
    let janes = users.iter().filter(|u| u["email"] == "jane@x.com").count();
    assert_eq!(janes, 1);
}

#[tokio::test]
async fn partial_update_keeps_password() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let role_id = srv.create_role(&admin, "Editor").await;
    let created: Value = srv.post("/v1/users", &admin, jane(role_id)).await.json().await.unwrap();
    let id = created["user"]["id"].as_i64().unwrap();

    let res = srv
        .put(&format!("/v1/users/{id}"), &admin, json!({ "email": "jane.doe@x.com" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["user"]["email"], "jane.doe@x.com");
    assert_eq!(updated["user"]["full_name"], "Jane Doe");
    assert_eq!(updated["user"]["role_id"], role_id);

    let res = srv.login("jane.doe@x.com", "P@ssw0rd1").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn users_list_embeds_role() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let users: Vec<Value> = srv.get("/v1/users", &admin).await.json().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], ADMIN_EMAIL);
    assert_eq!(users[0]["role"]["name"], "Admin");
}

#[tokio::test]
async fn missing_and_malformed_ids_are_404() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    for path in ["/v1/users/999", "/v1/roles/999", "/v1/users/abc", "/v1/roles/-"] {
        let res = srv.delete(path, &admin).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
    }

    let res = srv.get("/v1/users/999", &admin).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn role_lifecycle_and_conflict() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .post("/v1/roles", &admin, json!({ "name": "Editor", "description": "Edits <b>" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let role_id = srv.create_role(&admin, "Editor").await;
    let res = srv.post("/v1/roles", &admin, json!({ "name": "Editor" })).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"]["name"][0], "The name has already been taken.");

    let res = srv
        .client
        .patch(srv.url(&format!("/v1/roles/{role_id}")))
        .bearer_auth(&admin)
        .json(&json!({ "description": "Edits content" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"]["description"], "Edits content");

    let created: Value = srv.post("/v1/users", &admin, jane(role_id)).await.json().await.unwrap();
    let user_id = created["user"]["id"].as_i64().unwrap();

    let res = srv.delete(&format!("/v1/roles/{role_id}"), &admin).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv.delete(&format!("/v1/users/{user_id}"), &admin).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv.delete(&format!("/v1/roles/{role_id}"), &admin).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv.get(&format!("/v1/roles/{role_id}"), &admin).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_role_reference_is_rejected() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv.post("/v1/users", &admin, jane(4242)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"]["role_id"][0], "The selected role id is invalid.");
}

#[tokio::test]
async fn deleted_user_token_stops_working() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let role_id = srv.create_role(&admin, "Editor").await;
    let created: Value = srv.post("/v1/users", &admin, jane(role_id)).await.json().await.unwrap();
    let user_id = created["user"]["id"].as_i64().unwrap();

    let token = srv
        .login("jane@x.com", "P@ssw0rd1")
        .await
        .json::<LoginResponse>()
        .await
        .unwrap()
        .token;

    srv.delete(&format!("/v1/users/{user_id}"), &admin).await;
    let res = srv.get("/v1/profile", &token).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_is_422() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/v1/login"))
        .header("Content-Type", "application/json")
        .body("{\"email\":")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn wrong_field_types_are_field_errors() {
    let srv = TestServer::spawn().await;
    let token = srv.admin_token().await;
    let role_id = srv.create_role(&token, "Editor").await;

    let mut body = jane(role_id);
    body["full_name"] = json!(123);
    let res = srv.post("/v1/users", &token, body).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["errors"]["full_name"],
        json!(["The full name field must be a string."])
    );
    assert_eq!(body["message"], "The full name field must be a string.");

    let mut body = jane(role_id);
    body["role_id"] = json!("abc");
    let res = srv.post("/v1/users", &token, body).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["errors"]["role_id"],
        json!(["The role id field must be an integer."])
    );

    let users: Value = srv.get("/v1/users", &token).await.json().await.unwrap();
    assert_eq!(users.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn long_password_must_match_past_72_bytes() {
    let srv = TestServer::spawn().await;
    let token = srv.admin_token().await;
    let role_id = srv.create_role(&token, "Editor").await;

    let base = format!("Aa1@{}", "a".repeat(80));
    let password = format!("{base}X");
    let mut body = jane(role_id);
    body["password"] = json!(password);
    body["password_confirmation"] = json!(password);
    let res = srv.post("/v1/users", &token, body).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = srv.login("jane@x.com", &format!("{base}Y")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = srv.login("jane@x.com", &password).await;
    assert_eq!(res.status(), StatusCode::OK);
}
