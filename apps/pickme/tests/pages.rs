use api::models::Audience;
use api::{ErrorKind, Upload};
use common::{ClientConfig, FileStore, TokenStore};
use pickme::views::{
    account, post_card, CreatePostPage, EditProfilePage, GroupDetailPage, GroupsPage,
    PostDetailPage, PostList, SearchPage,
};
use pickme::{AppError, AppState, Level, Route};
use test_utils::FakeBackend;

fn app_for(backend: &FakeBackend, tokens: &TokenStore) -> AppState {
    let config = ClientConfig::for_api(&backend.base_url).unwrap();
    AppState::new(config, tokens.clone()).unwrap()
}

async fn signed_in(backend: &FakeBackend, user_id: i64) -> (AppState, TokenStore) {
    let tokens = TokenStore::in_memory();
    tokens.save(&backend.issue_tokens(user_id)).unwrap();
    let mut state = app_for(backend, &tokens);
    assert_eq!(state.init(Route::Feed).await.unwrap(), Route::Feed);
    (state, tokens)
}

fn error_notices(state: &mut AppState) -> Vec<String> {
    state
        .notices
        .drain()
        .into_iter()
        .filter(|n| n.level == Level::Error)
        .map(|n| n.message)
        .collect()
}

#[tokio::test]
async fn test_anonymous_user_lands_on_login() {
    let backend = FakeBackend::start().await;
    let tokens = TokenStore::in_memory();
    let mut state = app_for(&backend, &tokens);

    assert_eq!(state.init(Route::Groups).await.unwrap(), Route::Login);
    assert_eq!(state.navigate(Route::PostDetail(1)), Route::Login);
    assert_eq!(state.navigate(Route::Register), Route::Register);
}

#[tokio::test]
async fn test_login_goes_to_feed_and_public_pages_redirect() {
    let backend = FakeBackend::start().await;
    backend.seed_user("alice", "alice@example.com", "password123");
    let tokens = TokenStore::in_memory();
    let mut state = app_for(&backend, &tokens);
    state.init(Route::Login).await.unwrap();

    account::login(&mut state, "alice@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(state.navigator.current(), Route::Feed);
    assert_eq!(state.viewer().unwrap().username, "alice");
    assert_eq!(state.navigate(Route::Login), Route::Feed);

    account::logout(&mut state).await.unwrap();
    assert_eq!(state.navigator.current(), Route::Login);
    assert!(tokens.access_token().unwrap().is_none());
}

#[tokio::test]
async fn test_failed_login_reports_server_message() {
    let backend = FakeBackend::start().await;
    backend.seed_user("alice", "alice@example.com", "password123");
    let tokens = TokenStore::in_memory();
    let mut state = app_for(&backend, &tokens);
    state.init(Route::Login).await.unwrap();

    let result = account::login(&mut state, "alice@example.com", "wrong-password").await;
    assert!(state.settle(result, None, "Login failed").is_err());
    assert_eq!(
        error_notices(&mut state),
        vec!["No active account found with the given credentials".to_string()]
    );
    assert_eq!(state.navigator.current(), Route::Login);
}

#[tokio::test]
async fn test_session_expiry_sends_user_to_login() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let (mut state, tokens) = signed_in(&backend, alice).await;
    state.navigate(Route::Groups);

    backend.expire_access_tokens();
    backend.fail_refresh();

    let result = GroupsPage::load(state.services()).await;
    let err = state.settle(result, None, "Failed to load groups").err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    assert_eq!(state.navigator.current(), Route::Login);
    assert!(!state.session.is_authenticated());
    assert!(tokens.access_token().unwrap().is_none());
    assert!(tokens.refresh_token().unwrap().is_none());
    assert_eq!(
        error_notices(&mut state),
        vec!["Session expired, please sign in again".to_string()]
    );
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_transparently() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    backend.seed_group(alice, "Family", vec![]);
    let (mut state, _tokens) = signed_in(&backend, alice).await;

    backend.expire_access_tokens();
    let result = GroupsPage::load(state.services()).await;
    let page = state.settle(result, None, "Failed to load groups").unwrap();

    assert_eq!(page.groups.len(), 1);
    assert_eq!(backend.refresh_calls(), 1);
    assert!(state.session.is_authenticated());
    assert!(state.notices.is_empty());
}

#[tokio::test]
async fn test_feed_pages_append_without_duplicates() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    backend.set_page_size(2);
    let ids: Vec<i64> = (1..=5)
        .map(|n| backend.seed_post(alice, &format!("post {}", n)))
        .collect();
    let (state, _tokens) = signed_in(&backend, alice).await;

    let mut list = PostList::feed(state.services().posts.clone());
    list.load().await.unwrap();
    assert_eq!(list.posts().len(), 2);
    assert_eq!(list.posts()[0].id, ids[4]);

    // A new post shifts page two by one, repeating the last post of page one
    let newest = backend.seed_post(alice, "post 6");
    assert!(list.load_more().await.unwrap());
    let loaded: Vec<i64> = list.posts().iter().map(|p| p.id).collect();
    assert_eq!(loaded, vec![ids[4], ids[3], ids[2]]);
    assert!(!loaded.contains(&newest));

    while list.load_more().await.unwrap() {}
    let loaded: Vec<i64> = list.posts().iter().map(|p| p.id).collect();
    assert_eq!(loaded, vec![ids[4], ids[3], ids[2], ids[1], ids[0]]);
    assert!(!list.has_more());
    assert!(!list.load_more().await.unwrap());
}

#[tokio::test]
async fn test_failed_page_keeps_list_and_can_be_retried() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    backend.set_page_size(2);
    for n in 1..=3 {
        backend.seed_post(alice, &format!("post {}", n));
    }
    let (state, _tokens) = signed_in(&backend, alice).await;

    let mut list = PostList::feed(state.services().posts.clone());
    list.load().await.unwrap();

    backend.fail("GET", "/posts/", 500);
    assert!(list.load_more().await.is_err());
    assert_eq!(list.posts().len(), 2);
    assert!(list.has_more());

    backend.clear_failures();
    assert!(list.load_more().await.unwrap());
    assert_eq!(list.posts().len(), 3);
}

#[tokio::test]
async fn test_like_failure_rolls_back() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let bob = backend.seed_user("bob", "bob@example.com", "password123");
    let post_id = backend.seed_post(alice, "hello");
    let (mut state, _tokens) = signed_in(&backend, bob).await;

    let mut list = PostList::feed(state.services().posts.clone());
    list.load().await.unwrap();

    backend.fail("POST", &format!("/posts/{}/like/", post_id), 500);
    let result = list.toggle_like(post_id).await;
    assert!(state.settle(result, None, "Failed to update like").is_err());

    let post = list.get(post_id).unwrap();
    assert!(!post.is_liked);
    assert_eq!(post.likes_count, 0);
    assert_eq!(error_notices(&mut state).len(), 1);

    backend.clear_failures();
    list.toggle_like(post_id).await.unwrap();
    let post = list.get(post_id).unwrap();
    assert!(post.is_liked);
    assert_eq!(post.likes_count, 1);
    assert_eq!(post.recent_likers[0].id, bob);
}

#[tokio::test]
async fn test_like_reconciles_with_server_count() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let bob = backend.seed_user("bob", "bob@example.com", "password123");
    let carol = backend.seed_user("carol", "carol@example.com", "password123");
    let post_id = backend.seed_post(alice, "hello");
    let (state, _tokens) = signed_in(&backend, bob).await;

    let mut list = PostList::feed(state.services().posts.clone());
    list.load().await.unwrap();

    // Someone else liked it after the list was loaded
    backend.like_as(post_id, carol);
    let pending = list.begin_like(post_id).unwrap();
    assert_eq!(list.get(post_id).unwrap().likes_count, 1);

    let result = post_card::send_like(&state.services().posts, &pending).await;
    list.complete_like(pending, result).unwrap();
    assert_eq!(list.get(post_id).unwrap().likes_count, 2);
}

#[tokio::test]
async fn test_overlapping_like_toggles_settle_on_last_response() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let bob = backend.seed_user("bob", "bob@example.com", "password123");
    let post_id = backend.seed_post(alice, "hello");
    let (state, _tokens) = signed_in(&backend, bob).await;
    let posts = state.services().posts.clone();

    let mut list = PostList::feed(posts.clone());
    list.load().await.unwrap();

    let like = list.begin_like(post_id).unwrap();
    let unlike = list.begin_like(post_id).unwrap();
    assert!(!list.get(post_id).unwrap().is_liked);

    let liked = post_card::send_like(&posts, &like).await;
    let unliked = post_card::send_like(&posts, &unlike).await;
    let last = liked.as_ref().unwrap().clone();

    list.complete_like(unlike, unliked).unwrap();
    list.complete_like(like, liked).unwrap();

    let post = list.get(post_id).unwrap();
    assert_eq!(post.like_status(), last);
    assert!(post.is_liked);
    assert_eq!(post.likes_count, 1);
}

#[tokio::test]
async fn test_delete_removes_post_from_list() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let bob = backend.seed_user("bob", "bob@example.com", "password123");
    let own = backend.seed_post(alice, "mine");
    let other = backend.seed_post(bob, "not mine");
    let (state, _tokens) = signed_in(&backend, alice).await;

    let mut list = PostList::feed(state.services().posts.clone());
    list.load().await.unwrap();

    list.delete(own, alice).await.unwrap();
    assert!(list.get(own).is_none());
    assert!(backend.post(own).is_none());

    let err = list.delete(other, alice).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(list.get(other).is_some());
    assert!(
        backend
            .requests_to(&format!("/posts/{}/", other))
            .iter()
            .all(|r| r.method != "DELETE")
    );
}

#[tokio::test]
async fn test_groups_audience_without_groups_never_reaches_server() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let family = backend.seed_group(alice, "Family", vec![]);
    let (mut state, _tokens) = signed_in(&backend, alice).await;

    let mut page = CreatePostPage::load(state.services()).await.unwrap();
    assert_eq!(page.groups.len(), 1);
    page.form.text = "family only".to_string();
    page.form.audience = Audience::Groups;

    let result = page.submit(state.services()).await;
    assert!(state.settle(result, None, "Failed to create post").is_err());
    assert_eq!(
        error_notices(&mut state),
        vec!["audience_groups: Select at least one group".to_string()]
    );
    assert!(
        backend
            .requests_to("/posts/")
            .iter()
            .all(|r| r.method != "POST")
    );

    page.form.toggle_group(family);
    let result = page.submit(state.services()).await;
    let post = state
        .settle(result, Some("Post published"), "Failed to create post")
        .unwrap();
    assert_eq!(post.audience, Audience::Groups);
    assert_eq!(post.audience_groups, vec![family]);
}

#[tokio::test]
async fn test_create_page_opens_when_groups_fail_to_load() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    backend.seed_group(alice, "Family", vec![]);
    let (mut state, _tokens) = signed_in(&backend, alice).await;

    backend.fail("GET", "/friend-groups/", 500);
    let mut page = CreatePostPage::load(state.services()).await.unwrap();
    assert!(page.groups.is_empty());

    page.form.text = "hello".to_string();
    let result = page.submit(state.services()).await;
    let post = state
        .settle(result, Some("Post published"), "Failed to create post")
        .unwrap();
    assert_eq!(post.audience, Audience::Everyone);
    assert_eq!(backend.post(post.id).unwrap().audience_type, "everyone");
}

#[tokio::test]
async fn test_post_edit_applies_zero_groups_rule() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let bob = backend.seed_user("bob", "bob@example.com", "password123");
    let family = backend.seed_group(alice, "Family", vec![bob]);
    let post_id = backend.seed_post(alice, "hello");
    let (state, _tokens) = signed_in(&backend, alice).await;

    let mut page = PostDetailPage::load(state.services(), post_id).await.unwrap();
    assert!(page.is_own(state.viewer_id()));
    assert!(matches!(page.start_edit(Some(bob)), Err(AppError::Forbidden(_))));

    let form = page.start_edit(state.viewer_id()).unwrap();
    form.audience = Audience::Groups;
    let err = page.save(state.services()).await.unwrap_err();
    assert!(err.field_errors().and_then(|f| f.get("audience_groups")).is_some());
    assert!(
        backend
            .requests_to(&format!("/posts/{}/", post_id))
            .iter()
            .all(|r| r.method != "PATCH")
    );

    let form = page.start_edit(state.viewer_id()).unwrap();
    form.text = "hello family".to_string();
    form.audience = Audience::Groups;
    form.toggle_group(family);
    page.save(state.services()).await.unwrap();

    assert!(page.editing().is_none());
    assert_eq!(page.post.text_content, "hello family");
    assert_eq!(page.post.audience_groups, vec![family]);
    assert_eq!(backend.post(post_id).unwrap().audience_type, "groups");
}

#[tokio::test]
async fn test_avatar_upload_failure_restores_previous_avatar() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let (mut state, _tokens) = signed_in(&backend, alice).await;
    let mut page = EditProfilePage::open(&state.session).unwrap();
    assert_eq!(page.avatar(), None);

    let err = page
        .upload_avatar(&mut state.session, Upload::new("notes.txt", "text/plain", vec![1]))
        .await
        .unwrap_err();
    assert_eq!(err.field_errors().and_then(|f| f.get("avatar")), Some("Choose an image file"));

    let path = format!("/users/{}/avatar/", alice);
    backend.fail("POST", &path, 500);
    let result = page
        .upload_avatar(&mut state.session, Upload::new("me.png", "image/png", vec![1, 2, 3]))
        .await;
    assert!(result.is_err());
    assert_eq!(page.avatar(), None);
    assert_eq!(state.viewer().unwrap().avatar, None);

    backend.clear_failures();
    page.upload_avatar(&mut state.session, Upload::new("me.png", "image/png", vec![1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(page.avatar(), Some("http://media.test/avatars/me.png"));
    assert_eq!(
        state.viewer().unwrap().avatar.as_deref(),
        Some("http://media.test/avatars/me.png")
    );
}

#[tokio::test]
async fn test_profile_save_updates_session_user() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let (mut state, _tokens) = signed_in(&backend, alice).await;

    let mut page = EditProfilePage::open(&state.session).unwrap();
    page.form.first_name = "Alice".to_string();
    page.form.bio = "Hello there".to_string();
    page.save(&mut state.session).await.unwrap();

    assert_eq!(state.viewer().unwrap().display_name(), "Alice");
    assert_eq!(backend.user(alice).unwrap().bio, "Hello there");
}

#[tokio::test]
async fn test_group_member_search_skips_members() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let bob = backend.seed_user("bob", "bob@example.com", "password123");
    let bobcat = backend.seed_user("bobcat", "bobcat@example.com", "password123");
    let group = backend.seed_group(alice, "Friends", vec![bob]);
    let (mut state, _tokens) = signed_in(&backend, alice).await;

    let mut page = GroupDetailPage::load(state.services(), group).await.unwrap();
    assert_eq!(page.members.len(), 1);

    let found: Vec<i64> = page
        .search(state.services(), "bob")
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(found, vec![bobcat]);

    page.add_member(state.services(), bobcat).await.unwrap();
    assert_eq!(page.members.len(), 2);
    assert_eq!(page.group.members_count, 2);
    assert!(page.candidates.is_empty());

    let result = page.add_member(state.services(), bob).await;
    assert!(state.settle(result, None, "Failed to add member").is_err());
    assert_eq!(
        error_notices(&mut state),
        vec!["User is already in this group".to_string()]
    );

    page.remove_member(state.services(), bob).await.unwrap();
    assert_eq!(backend.group(group).unwrap().members, vec![bobcat]);
}

#[tokio::test]
async fn test_short_search_query_is_rejected_locally() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let group = backend.seed_group(alice, "Friends", vec![]);
    let (state, _tokens) = signed_in(&backend, alice).await;

    let mut page = GroupDetailPage::load(state.services(), group).await.unwrap();
    let err = page.search(state.services(), " b ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(backend.requests_to("/users/search/").is_empty());
}

#[tokio::test]
async fn test_failed_search_drops_previous_results() {
    let backend = FakeBackend::start().await;
    let alice = backend.seed_user("alice", "alice@example.com", "password123");
    let bob = backend.seed_user("bob", "bob@example.com", "password123");
    let (state, _tokens) = signed_in(&backend, alice).await;

    let mut page = SearchPage::new();
    let found: Vec<i64> = page
        .search(state.services(), "bob")
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(found, vec![bob]);

    backend.fail("GET", "/users/search/", 500);
    assert!(page.search(state.services(), "carol").await.is_err());
    assert_eq!(page.query, "carol");
    assert!(page.results.is_empty());
    assert_eq!(page.to_string(), "Nobody matches \"carol\"\n");
}

#[tokio::test]
async fn test_tokens_persist_across_runs() {
    let backend = FakeBackend::start().await;
    backend.seed_user("alice", "alice@example.com", "password123");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    let tokens = TokenStore::new(FileStore::open(&path).unwrap());
    let mut state = app_for(&backend, &tokens);
    state.init(Route::Login).await.unwrap();
    account::login(&mut state, "alice@example.com", "password123")
        .await
        .unwrap();

    let tokens = TokenStore::new(FileStore::open(&path).unwrap());
    let mut state = app_for(&backend, &tokens);
    assert_eq!(state.init(Route::Groups).await.unwrap(), Route::Groups);
    assert_eq!(state.viewer().unwrap().username, "alice");

    account::logout(&mut state).await.unwrap();
    let tokens = TokenStore::new(FileStore::open(&path).unwrap());
    let mut state = app_for(&backend, &tokens);
    assert_eq!(state.init(Route::Groups).await.unwrap(), Route::Login);
}
