use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// A user record as the fixture API stores and returns it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial update; absent fields keep their value.
#[derive(Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
    }
}

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub type Users = Arc<RwLock<HashMap<Uuid, User>>>;

type NotFound = (StatusCode, Json<Value>);

pub fn app() -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/slow/{ms}", get(slow))
        .route("/text", get(text))
        .with_state(Users::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn create_user(
    State(users): State<Users>,
    Json(input): Json<NewUser>,
) -> (StatusCode, Json<User>) {
    let user = User {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
    };
    users.write().await.insert(user.id, user.clone());
    tracing::debug!(id = %user.id, "user created");
    (StatusCode::CREATED, Json(user))
}

async fn get_user(
    State(users): State<Users>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, NotFound> {
    let user = users.read().await.get(&id).cloned();
    user.map(Json).ok_or_else(not_found)
}

async fn update_user(
    State(users): State<Users>,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, NotFound> {
    let mut users = users.write().await;
    let Some(user) = users.get_mut(&id) else {
        return Err(not_found());
    };
    patch.apply(user);
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(users): State<Users>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, NotFound> {
    let removed = users.write().await.remove(&id);
    match removed {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(not_found()),
    }
}

/// 404 with the JSON body clients are expected to surface.
fn not_found() -> NotFound {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" })))
}

async fn echo(
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        query,
        content_type,
        headers,
        body,
    })
}

async fn status(Path(code): Path<u16>) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(json!({ "error": "requested", "code": status.as_u16() })))
}

async fn slow(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({ "slept_ms": ms }))
}

async fn text() -> &'static str {
    "plain text response"
}
