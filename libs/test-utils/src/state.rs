//! In-memory state of the fake backend

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FakePost {
    pub id: i64,
    pub author: i64,
    pub content_type: String,
    pub text_content: String,
    pub media_type: Option<String>,
    pub media_file: Option<String>,
    pub media_url: Option<String>,
    pub audience_type: String,
    pub audience_groups: Vec<i64>,
    pub likers: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FakeGroup {
    pub id: i64,
    pub owner: i64,
    pub name: String,
    pub members: Vec<i64>,
}

/// One request as seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below the `/api` prefix, e.g. `/posts/1/like/`
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Debug)]
pub struct BackendState {
    pub users: BTreeMap<i64, FakeUser>,
    pub posts: BTreeMap<i64, FakePost>,
    pub groups: BTreeMap<i64, FakeGroup>,
    pub access_tokens: HashMap<String, i64>,
    pub refresh_tokens: HashMap<String, i64>,
    pub requests: Vec<RecordedRequest>,
    /// Forced status per (method, path)
    pub failures: HashMap<(String, String), u16>,
    pub refresh_fails: bool,
    /// Reject every access token, including freshly refreshed ones
    pub reject_all_access: bool,
    pub page_size: usize,
    next_id: i64,
    token_seq: u64,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            posts: BTreeMap::new(),
            groups: BTreeMap::new(),
            access_tokens: HashMap::new(),
            refresh_tokens: HashMap::new(),
            requests: Vec::new(),
            failures: HashMap::new(),
            refresh_fails: false,
            reject_all_access: false,
            page_size: 10,
            next_id: 1,
            token_seq: 0,
        }
    }
}

impl BackendState {
    pub fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn issue_access(&mut self, user_id: i64) -> String {
        self.token_seq += 1;
        let token = format!("access-{}-{}", user_id, self.token_seq);
        self.access_tokens.insert(token.clone(), user_id);
        token
    }

    pub fn issue_pair(&mut self, user_id: i64) -> (String, String) {
        let access = self.issue_access(user_id);
        self.token_seq += 1;
        let refresh = format!("refresh-{}-{}", user_id, self.token_seq);
        self.refresh_tokens.insert(refresh.clone(), user_id);
        (access, refresh)
    }

    pub fn user_by_access(&self, token: &str) -> Option<i64> {
        if self.reject_all_access {
            return None;
        }
        self.access_tokens.get(token).copied()
    }

    pub fn add_user(&mut self, username: &str, email: &str, password: &str) -> i64 {
        let id = self.next_id();
        self.users.insert(
            id,
            FakeUser {
                id,
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                bio: String::new(),
                avatar: None,
            },
        );
        id
    }

    pub fn add_post(&mut self, author: i64, text: &str, audience: &str, groups: Vec<i64>) -> i64 {
        let id = self.next_id();
        // Later posts are newer
        let created_at = Utc::now() - Duration::hours(1) + Duration::seconds(id);
        self.posts.insert(
            id,
            FakePost {
                id,
                author,
                content_type: "text".to_string(),
                text_content: text.to_string(),
                media_type: None,
                media_file: None,
                media_url: None,
                audience_type: audience.to_string(),
                audience_groups: groups,
                likers: Vec::new(),
                created_at,
            },
        );
        id
    }

    pub fn add_group(&mut self, owner: i64, name: &str, members: Vec<i64>) -> i64 {
        let id = self.next_id();
        self.groups.insert(
            id,
            FakeGroup {
                id,
                owner,
                name: name.to_string(),
                members,
            },
        );
        id
    }

    pub fn can_see(&self, viewer: i64, post: &FakePost) -> bool {
        if post.author == viewer {
            return true;
        }
        match post.audience_type.as_str() {
            "everyone" => true,
            "groups" => post.audience_groups.iter().any(|g| {
                self.groups
                    .get(g)
                    .is_some_and(|group| group.members.contains(&viewer))
            }),
            _ => false,
        }
    }

    pub fn user_json(&self, user_id: i64) -> Value {
        match self.users.get(&user_id) {
            Some(u) => json!({
                "id": u.id,
                "username": u.username,
                "first_name": u.first_name,
                "last_name": u.last_name,
                "email": u.email,
                "avatar": u.avatar,
                "bio": u.bio,
                "is_superuser": false,
            }),
            None => Value::Null,
        }
    }

    pub fn like_json(&self, post: &FakePost, viewer: i64) -> Value {
        let recent: Vec<Value> = post
            .likers
            .iter()
            .rev()
            .take(3)
            .map(|id| self.user_json(*id))
            .collect();
        json!({
            "likes_count": post.likers.len(),
            "is_liked": post.likers.contains(&viewer),
            "recent_likers": recent,
        })
    }

    pub fn post_json(&self, post: &FakePost, viewer: i64) -> Value {
        let details: Vec<Value> = post
            .audience_groups
            .iter()
            .filter_map(|g| self.groups.get(g))
            .map(|g| json!({"id": g.id, "name": g.name}))
            .collect();
        let likes = self.like_json(post, viewer);
        json!({
            "id": post.id,
            "author": self.user_json(post.author),
            "content_type": post.content_type,
            "text_content": post.text_content,
            "media_type": post.media_type,
            "media_file": post.media_file,
            "media_url": post.media_url,
            "audience_type": post.audience_type,
            "audience_groups": post.audience_groups,
            "audience_groups_detail": details,
            "likes_count": likes["likes_count"],
            "is_liked": likes["is_liked"],
            "recent_likers": likes["recent_likers"],
            "created_at": post.created_at.to_rfc3339(),
            "updated_at": post.created_at.to_rfc3339(),
        })
    }

    pub fn group_json(&self, group: &FakeGroup) -> Value {
        let members: Vec<Value> = group.members.iter().map(|m| self.user_json(*m)).collect();
        json!({
            "id": group.id,
            "name": group.name,
            "members": members,
            "members_count": group.members.len(),
        })
    }

    /// Slice `items` into a paged envelope
    pub fn page(&self, base: &str, items: Vec<Value>, page: usize) -> Value {
        let page = page.max(1);
        let start = (page - 1) * self.page_size;
        let count = items.len();
        let results: Vec<Value> = items.into_iter().skip(start).take(self.page_size).collect();
        let next = (start + self.page_size < count).then(|| format!("{}?page={}", base, page + 1));
        let previous = (page > 1).then(|| format!("{}?page={}", base, page - 1));
        json!({
            "count": count,
            "next": next,
            "previous": previous,
            "results": results,
        })
    }
}
