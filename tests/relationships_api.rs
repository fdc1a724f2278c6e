use chrono::TimeDelta;
use cpnet_service::api;
use cpnet_service::common::state::{AppState, ServiceConfig};
use cpnet_service::entities::posts::CreatePostArgs;
use cpnet_service::repositories::memory::InMemoryStore;
use cpnet_service::repositories::relationships::RelationshipsRepository;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

struct TestServer {
    base: String,
    client: reqwest::Client,
    store: Arc<InMemoryStore>,
}

struct TestUser {
    id: i64,
    token: String,
}

impl TestServer {
    async fn start() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let config = ServiceConfig {
            password_hash_cost: 4,
            ..Default::default()
        };
        let state = AppState::in_memory(store.clone(), config);
        let app = api::router().with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn user(&self, name: &str) -> TestUser {
        let response = self
            .client
            .post(self.url("/users"))
            .json(&json!({
                "name": name,
                "email": format!("{name}@example.com"),
                "password": "hunter22",
            }))
            .send()
            .await
            .expect("register");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("token json");
        let token = body["token"].as_str().expect("token").to_string();

        let response = self
            .client
            .post(self.url("/profile"))
            .bearer_auth(&token)
            .json(&json!({
                "country": "PL",
                "dateOfBirth": "2001-02-03",
                "skills": "dp, graphs",
            }))
            .send()
            .await
            .expect("profile");
        assert_eq!(response.status(), StatusCode::OK);
        let profile: Value = response.json().await.expect("profile json");
        let id = profile["user"]["id"].as_i64().expect("user id");
        TestUser { id, token }
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        user: &TestUser,
    ) -> (StatusCode, Value) {
        let response = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("request");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }
}

#[tokio::test]
async fn request_accept_and_overview() {
    let server = TestServer::start().await;
    let alice = server.user("alice").await;
    let bob = server.user("bob").await;

    let (status, created) = server
        .send(reqwest::Method::POST, &format!("/relationships/{}", bob.id), &alice)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["initiator"], alice.id);
    assert_eq!(created["acceptor"], bob.id);
    assert_eq!(created["initiatorName"], "alice");
    assert_eq!(created["acceptorName"], "bob");
    assert!(created["isAccepted"].is_null());
    let id = created["id"].as_i64().expect("relationship id");

    let (status, body) = server
        .send(reqwest::Method::POST, &format!("/relationships/{}", alice.id), &bob)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "relationships.already_exists");

    let (status, body) = server
        .send(reqwest::Method::PUT, &format!("/relationships/{id}/accept"), &alice)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "relationships.forbidden");

    let (status, accepted) = server
        .send(reqwest::Method::PUT, &format!("/relationships/{id}/accept"), &bob)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["isAccepted"], true);

    let (status, _) = server
        .send(reqwest::Method::PUT, &format!("/relationships/{id}/decline"), &bob)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, overview) = server
        .send(reqwest::Method::GET, "/relationships/overview", &alice)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["friends"][0]["id"], id);
    assert_eq!(overview["incoming"], json!([]));
    assert_eq!(overview["outgoing"], json!([]));

    let (status, between) = server
        .send(reqwest::Method::GET, &format!("/relationships/{}", alice.id), &bob)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(between["id"], id);
}

#[tokio::test]
async fn declined_requests_disappear_from_overview() {
    let server = TestServer::start().await;
    let carol = server.user("carol").await;
    let dave = server.user("dave").await;

    let (_, created) = server
        .send(reqwest::Method::POST, &format!("/relationships/{}", dave.id), &carol)
        .await;
    let id = created["id"].as_i64().expect("relationship id");

    let (_, overview) = server
        .send(reqwest::Method::GET, "/relationships/overview", &dave)
        .await;
    assert_eq!(overview["incoming"][0]["id"], id);

    let (status, declined) = server
        .send(reqwest::Method::PUT, &format!("/relationships/{id}/decline"), &dave)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(declined["isAccepted"], false);

    let (_, overview) = server
        .send(reqwest::Method::GET, "/relationships/overview", &carol)
        .await;
    assert_eq!(overview, json!({"friends": [], "incoming": [], "outgoing": []}));

    let (_, all) = server
        .send(reqwest::Method::GET, "/relationships", &carol)
        .await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn missing_or_bogus_tokens_are_rejected() {
    let server = TestServer::start().await;
    let response = server
        .client
        .get(server.url("/relationships"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .get(server.url("/relationships"))
        .bearer_auth("not-a-session")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("error json");
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn new_activity_is_anchored_to_relationship_creation() {
    let server = TestServer::start().await;
    let erin = server.user("erin").await;
    let frank = server.user("frank").await;
    let grace = server.user("grace").await;

    server
        .send(reqwest::Method::POST, &format!("/relationships/{}", frank.id), &erin)
        .await;
    let relationship = RelationshipsRepository::fetch_between(server.store.as_ref(), erin.id, frank.id)
        .await
        .expect("store")
        .expect("relationship");

    let post_id = server
        .store
        .insert_post_at(
            CreatePostArgs {
                user_id: frank.id,
                name: "frank".to_string(),
                avatar: String::new(),
                title: Some("Div 2 E".to_string()),
                text: "finally solved it".to_string(),
            },
            relationship.acceptor_checked_at + TimeDelta::seconds(1),
        )
        .await;

    let path = format!("/posts/new/{}", frank.id);
    for _ in 0..2 {
        let (status, activity) = server.send(reqwest::Method::GET, &path, &erin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(activity.as_array().map(Vec::len), Some(1));
        assert_eq!(activity[0]["id"], post_id);
        assert_eq!(activity[0]["activity"], "posted");
    }

    let (status, body) = server
        .send(reqwest::Method::GET, &format!("/posts/new/{}", grace.id), &erin)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "relationships.not_found");
}

#[tokio::test]
async fn malformed_bodies_are_validation_errors() {
    let server = TestServer::start().await;
    let response = server
        .client
        .post(server.url("/users"))
        .header("content-type", "application/json")
        .body("{\"name\": 1}")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("error json");
    assert_eq!(body["code"], "decoding_request_failed");
}

#[tokio::test]
async fn education_entries_and_account_deletion() {
    let server = TestServer::start().await;
    let heidi = server.user("heidi").await;

    let response = server
        .client
        .post(server.url("/profile/education"))
        .bearer_auth(&heidi.token)
        .json(&json!({
            "school": "University of Warsaw",
            "fieldOfStudy": "Computer Science",
            "from": "2019-10-01",
            "current": true,
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let profile: Value = response.json().await.expect("profile json");
    assert_eq!(profile["education"][0]["school"], "University of Warsaw");
    let education_id = profile["education"][0]["id"].as_i64().expect("education id");

    let (status, profile) = server
        .send(
            reqwest::Method::DELETE,
            &format!("/profile/education/{education_id}"),
            &heidi,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["education"], json!([]));

    let (status, body) = server
        .send(
            reqwest::Method::DELETE,
            &format!("/profile/education/{education_id}"),
            &heidi,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "profiles.education_not_found");

    let (status, _) = server.send(reqwest::Method::DELETE, "/profile", &heidi).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server.send(reqwest::Method::GET, "/profile/me", &heidi).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}
