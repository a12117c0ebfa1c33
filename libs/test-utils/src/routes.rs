//! Request handlers of the fake backend

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde_json::{Value, json};

use crate::state::{BackendState, RecordedRequest};

pub type Shared = Arc<Mutex<BackendState>>;

type Reply = Result<Response, Response>;

/// Create the router serving everything below `/api`
pub fn create_router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login/", post(login))
        .route("/auth/register/", post(register))
        .route("/auth/logout/", post(logout))
        .route("/auth/refresh/", post(refresh))
        .route("/users/me/", get(me))
        .route("/users/search/", get(search_users))
        .route("/users/:id/", get(get_user))
        .route("/users/:id/update/", patch(update_user))
        .route("/users/:id/avatar/", post(upload_avatar))
        .route("/posts/", get(list_posts).post(create_post))
        .route("/posts/user/:id/", get(list_user_posts))
        .route(
            "/posts/:id/",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/posts/:id/like/", post(like_post).delete(unlike_post))
        .route("/friend-groups/", get(list_groups).post(create_group))
        .route(
            "/friend-groups/:id/",
            get(get_group).patch(rename_group).delete(delete_group),
        )
        .route("/friend-groups/:id/members/", get(list_members))
        .route("/friend-groups/:id/members/add/", post(add_member))
        .route(
            "/friend-groups/:id/members/:user_id/",
            delete(remove_member),
        );

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state)
}

/// Record every request and apply forced failures before routing
async fn record_request(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .uri()
        .path()
        .trim_start_matches("/api")
        .to_string();
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(str::to_string);

    let forced = {
        let mut s = state.lock().unwrap();
        s.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            authorization,
        });
        s.failures.get(&(method, path)).copied()
    };

    if let Some(code) = forced {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return reply(status, json!({"detail": "Forced failure"}));
    }
    next.run(request).await
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn ok(body: Value) -> Reply {
    Ok(reply(StatusCode::OK, body))
}

fn created(body: Value) -> Reply {
    Ok(reply(StatusCode::CREATED, body))
}

fn no_content() -> Reply {
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, json!({"detail": "Not found."}))
}

fn forbidden() -> Response {
    reply(
        StatusCode::FORBIDDEN,
        json!({"detail": "You do not have permission to perform this action."}),
    )
}

fn bad_request(body: Value) -> Response {
    reply(StatusCode::BAD_REQUEST, body)
}

fn viewer(s: &BackendState, headers: &HeaderMap) -> Result<i64, Response> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .and_then(|token| s.user_by_access(token))
        .ok_or_else(|| {
            reply(
                StatusCode::UNAUTHORIZED,
                json!({
                    "detail": "Given token not valid for any token type",
                    "code": "token_not_valid",
                }),
            )
        })
}

fn text(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn page_param(query: &HashMap<String, String>) -> usize {
    query
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut s = state.lock().unwrap();
    let email = text(&body, "email");
    let password = text(&body, "password");

    let user_id = s
        .users
        .values()
        .find(|u| u.email == email && u.password == password)
        .map(|u| u.id)
        .ok_or_else(|| {
            reply(
                StatusCode::UNAUTHORIZED,
                json!({"detail": "No active account found with the given credentials"}),
            )
        })?;

    let (access, refresh) = s.issue_pair(user_id);
    ok(json!({"access": access, "refresh": refresh}))
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut s = state.lock().unwrap();
    let email = text(&body, "email");
    let username = text(&body, "username");

    let mut errors = serde_json::Map::new();
    if s.users.values().any(|u| u.email == email) {
        errors.insert(
            "email".to_string(),
            json!(["user with this email already exists."]),
        );
    }
    if s.users.values().any(|u| u.username == username) {
        errors.insert(
            "username".to_string(),
            json!(["A user with that username already exists."]),
        );
    }
    if text(&body, "password") != text(&body, "password_confirm") {
        errors.insert(
            "password_confirm".to_string(),
            json!(["Passwords do not match."]),
        );
    }
    if !errors.is_empty() {
        return Err(bad_request(Value::Object(errors)));
    }

    let id = s.add_user(&username, &email, &text(&body, "password"));
    if let Some(user) = s.users.get_mut(&id) {
        user.first_name = text(&body, "first_name");
        user.last_name = text(&body, "last_name");
    }
    let (access, refresh) = s.issue_pair(id);
    created(json!({
        "user": s.user_json(id),
        "tokens": {"access": access, "refresh": refresh},
    }))
}

async fn logout(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut s = state.lock().unwrap();
    s.refresh_tokens.remove(&text(&body, "refresh"));
    ok(json!({}))
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut s = state.lock().unwrap();
    let token = text(&body, "refresh");

    let user_id = match s.refresh_tokens.get(&token) {
        Some(id) if !s.refresh_fails => *id,
        _ => {
            return Err(reply(
                StatusCode::UNAUTHORIZED,
                json!({"detail": "Token is invalid or expired", "code": "token_not_valid"}),
            ));
        }
    };

    let access = s.issue_access(user_id);
    ok(json!({"access": access}))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    ok(s.user_json(viewer))
}

async fn get_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Reply {
    let s = state.lock().unwrap();
    viewer(&s, &headers)?;
    if !s.users.contains_key(&id) {
        return Err(not_found());
    }
    ok(s.user_json(id))
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    if viewer != id {
        return Err(forbidden());
    }

    if let Some(username) = body.get("username").and_then(Value::as_str) {
        if s.users.values().any(|u| u.username == username && u.id != id) {
            return Err(bad_request(
                json!({"username": ["A user with that username already exists."]}),
            ));
        }
    }

    let user = s.users.get_mut(&id).ok_or_else(not_found)?;
    if let Some(username) = body.get("username").and_then(Value::as_str) {
        user.username = username.to_string();
    }
    if let Some(first_name) = body.get("first_name").and_then(Value::as_str) {
        user.first_name = first_name.to_string();
    }
    if let Some(last_name) = body.get("last_name").and_then(Value::as_str) {
        user.last_name = last_name.to_string();
    }
    if let Some(bio) = body.get("bio").and_then(Value::as_str) {
        user.bio = bio.to_string();
    }
    ok(s.user_json(id))
}

async fn upload_avatar(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Reply {
    let mut file_name = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("avatar") {
            file_name = field.file_name().map(str::to_string);
            let _ = field.bytes().await;
        }
    }

    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    if viewer != id {
        return Err(forbidden());
    }
    let Some(file_name) = file_name else {
        return Err(bad_request(json!({"avatar": ["No file was submitted."]})));
    };

    let user = s.users.get_mut(&id).ok_or_else(not_found)?;
    user.avatar = Some(format!("http://media.test/avatars/{}", file_name));
    ok(s.user_json(id))
}

async fn search_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let needle = query.get("q").cloned().unwrap_or_default().to_lowercase();

    let results: Vec<Value> = s
        .users
        .values()
        .filter(|u| u.id != viewer)
        .filter(|u| {
            u.username.to_lowercase().contains(&needle)
                || u.first_name.to_lowercase().contains(&needle)
                || u.last_name.to_lowercase().contains(&needle)
        })
        .map(|u| s.user_json(u.id))
        .collect();

    ok(json!({
        "count": results.len(),
        "next": null,
        "previous": null,
        "results": results,
    }))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

async fn list_posts(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let items: Vec<Value> = s
        .posts
        .values()
        .rev()
        .filter(|p| s.can_see(viewer, p))
        .map(|p| s.post_json(p, viewer))
        .collect();
    ok(s.page("http://testserver/api/posts/", items, page_param(&query)))
}

async fn list_user_posts(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(author): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let items: Vec<Value> = s
        .posts
        .values()
        .rev()
        .filter(|p| p.author == author && s.can_see(viewer, p))
        .map(|p| s.post_json(p, viewer))
        .collect();
    let base = format!("http://testserver/api/posts/user/{}/", author);
    ok(s.page(&base, items, page_param(&query)))
}

async fn create_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Reply {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut groups: Vec<i64> = Vec::new();
    let mut media_file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "media_file" {
            media_file = field.file_name().map(str::to_string);
            let _ = field.bytes().await;
        } else if let Ok(value) = field.text().await {
            if name == "audience_groups" {
                groups.extend(value.parse::<i64>().ok());
            } else {
                fields.insert(name, value);
            }
        }
    }

    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let field = |key: &str| fields.get(key).cloned().unwrap_or_default();

    let audience = field("audience_type");
    if audience == "groups" && groups.is_empty() {
        return Err(bad_request(
            json!({"audience_groups": ["Select at least one group."]}),
        ));
    }
    if field("content_type") == "text" && field("text_content").trim().is_empty() {
        return Err(bad_request(
            json!({"text_content": ["This field may not be blank."]}),
        ));
    }

    let id = s.add_post(viewer, &field("text_content"), &audience, groups);
    if let Some(post) = s.posts.get_mut(&id) {
        post.content_type = field("content_type");
        post.media_type = fields.get("media_type").cloned();
        post.media_url = fields.get("media_url").cloned();
        post.media_file = media_file.map(|name| format!("http://media.test/posts/{}", name));
    }
    let post = s.posts.get(&id).ok_or_else(not_found)?;
    created(s.post_json(post, viewer))
}

async fn get_post(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let post = s
        .posts
        .get(&id)
        .filter(|p| s.can_see(viewer, p))
        .ok_or_else(not_found)?;
    ok(s.post_json(post, viewer))
}

async fn update_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let post = s.posts.get_mut(&id).ok_or_else(not_found)?;
    if post.author != viewer {
        return Err(forbidden());
    }

    if let Some(text) = body.get("text_content").and_then(Value::as_str) {
        post.text_content = text.to_string();
    }
    if let Some(audience) = body.get("audience_type").and_then(Value::as_str) {
        post.audience_type = audience.to_string();
    }
    if let Some(groups) = body.get("audience_groups").and_then(Value::as_array) {
        post.audience_groups = groups.iter().filter_map(Value::as_i64).collect();
    }

    let post = s.posts.get(&id).ok_or_else(not_found)?;
    ok(s.post_json(post, viewer))
}

async fn delete_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let post = s.posts.get(&id).ok_or_else(not_found)?;
    if post.author != viewer {
        return Err(forbidden());
    }
    s.posts.remove(&id);
    no_content()
}

async fn like_post(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Reply {
    set_like(state, headers, id, true)
}

async fn unlike_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    set_like(state, headers, id, false)
}

fn set_like(state: Shared, headers: HeaderMap, id: i64, liked: bool) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let visible = s.posts.get(&id).is_some_and(|p| s.can_see(viewer, p));
    if !visible {
        return Err(not_found());
    }

    let post = s.posts.get_mut(&id).ok_or_else(not_found)?;
    post.likers.retain(|u| *u != viewer);
    if liked {
        post.likers.push(viewer);
    }
    let post = s.posts.get(&id).ok_or_else(not_found)?;
    ok(s.like_json(post, viewer))
}

// ---------------------------------------------------------------------------
// Friend groups
// ---------------------------------------------------------------------------

async fn list_groups(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let items: Vec<Value> = s
        .groups
        .values()
        .filter(|g| g.owner == viewer)
        .map(|g| s.group_json(g))
        .collect();
    ok(s.page("http://testserver/api/friend-groups/", items, 1))
}

async fn create_group(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let name = text(&body, "name");
    if s.groups.values().any(|g| g.owner == viewer && g.name == name) {
        return Err(bad_request(
            json!({"name": ["Group with this name already exists."]}),
        ));
    }
    let id = s.add_group(viewer, &name, Vec::new());
    let group = s.groups.get(&id).ok_or_else(not_found)?;
    created(s.group_json(group))
}

async fn get_group(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let group = s
        .groups
        .get(&id)
        .filter(|g| g.owner == viewer)
        .ok_or_else(not_found)?;
    ok(s.group_json(group))
}

async fn rename_group(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let group = s
        .groups
        .get_mut(&id)
        .filter(|g| g.owner == viewer)
        .ok_or_else(not_found)?;
    group.name = text(&body, "name");
    let group = s.groups.get(&id).ok_or_else(not_found)?;
    ok(s.group_json(group))
}

async fn delete_group(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    if !s.groups.get(&id).is_some_and(|g| g.owner == viewer) {
        return Err(not_found());
    }
    s.groups.remove(&id);
    no_content()
}

async fn list_members(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let group = s
        .groups
        .get(&id)
        .filter(|g| g.owner == viewer)
        .ok_or_else(not_found)?;
    let members: Vec<Value> = group.members.iter().map(|m| s.user_json(*m)).collect();
    ok(json!({
        "count": members.len(),
        "next": null,
        "previous": null,
        "results": members,
    }))
}

async fn add_member(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let user_id = body.get("user_id").and_then(Value::as_i64).unwrap_or_default();
    if !s.users.contains_key(&user_id) {
        return Err(reply(
            StatusCode::NOT_FOUND,
            json!({"detail": "User not found"}),
        ));
    }

    let group = s
        .groups
        .get_mut(&id)
        .filter(|g| g.owner == viewer)
        .ok_or_else(not_found)?;
    if group.members.contains(&user_id) {
        return Err(bad_request(
            json!({"detail": "User is already in this group"}),
        ));
    }
    group.members.push(user_id);
    created(json!({"detail": "Member added"}))
}

async fn remove_member(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Reply {
    let mut s = state.lock().unwrap();
    let viewer = viewer(&s, &headers)?;
    let group = s
        .groups
        .get_mut(&id)
        .filter(|g| g.owner == viewer)
        .ok_or_else(not_found)?;
    group.members.retain(|m| *m != user_id);
    no_content()
}
