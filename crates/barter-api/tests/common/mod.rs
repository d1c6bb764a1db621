#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use barter_api::{AppState, AppStateInner, auth::issue_token};
use barter_db::Database;
use barter_types::forms::AdInput;
use barter_types::models::{Category, Condition, ProposalStatus};

pub const SECRET: &str = "test-secret";

pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub token: String,
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        let state = AppStateInner::new(db, SECRET);
        let router = barter_api::router(state.clone());
        Self { state, router }
    }

    /// Inserts a user directly; the password hash is never checked.
    pub fn user(&self, name: &str) -> TestUser {
        let id = Uuid::new_v4();
        self.state
            .db
            .create_user(&id.to_string(), name, "unused-hash")
            .unwrap();
        TestUser {
            id,
            name: name.to_string(),
            token: issue_token(SECRET, id, name).unwrap(),
        }
    }

    pub fn ad(&self, owner: &TestUser, title: &str, category: Category, condition: Condition) -> i64 {
        self.state
            .db
            .insert_ad(
                owner.id,
                &AdInput {
                    title: title.to_string(),
                    description: format!("About {title}"),
                    image_url: None,
                    category,
                    condition,
                },
            )
            .unwrap()
    }

    pub fn proposal(&self, from: &TestUser, sender_ad: i64, receiver_ad: i64) -> i64 {
        self.state
            .db
            .insert_proposal(from.id, sender_ad, receiver_ad, None)
            .unwrap()
            .unwrap()
    }

    pub fn status_of(&self, proposal_id: i64) -> Option<ProposalStatus> {
        self.state
            .db
            .get_proposal(proposal_id)
            .unwrap()
            .map(|p| p.status)
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response<Body> {
        self.send(Method::GET, path, user, None).await
    }

    pub async fn post(&self, path: &str, user: Option<&TestUser>, body: Value) -> Response<Body> {
        self.send(Method::POST, path, user, Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", user.token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Asserts a flash redirect and returns its message.
pub async fn expect_redirect(response: Response<Body>, to: &str) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), to);
    let body = body_json(response).await;
    assert_eq!(body["location"], to);
    body["message"].as_str().unwrap().to_string()
}

pub fn ad_form(title: &str, category: &str, condition: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": format!("{title} in good shape"),
        "image_url": "https://example.com/item.jpg",
        "category": category,
        "condition": condition,
    })
}
