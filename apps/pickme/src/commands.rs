//! Runs one command against the pages and renders the result

use api::models::{Audience, MediaType, NewUser, UserId};
use pickme::views::{
    account, CreatePostPage, EditProfilePage, GroupDetailPage, GroupsPage, PostCard,
    PostDetailPage, PostList, ProfilePage, SearchPage,
};
use pickme::{AppResult, AppState, Route};

use crate::cli::{Command, GroupCommand, PostCommand};

/// Text to print plus the notice for a successful action
struct Outcome {
    text: String,
    success: Option<&'static str>,
}

impl Outcome {
    fn show(text: impl ToString) -> Self {
        Self {
            text: text.to_string(),
            success: None,
        }
    }

    fn done(message: &'static str) -> Self {
        Self {
            text: String::new(),
            success: Some(message),
        }
    }

    fn with_text(mut self, text: impl ToString) -> Self {
        self.text = text.to_string();
        self
    }
}

fn fallback_message(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } => "Login failed",
        Command::Register { .. } => "Registration failed",
        Command::Logout => "Logout failed",
        Command::EditProfile { .. } => "Failed to update profile",
        Command::Post(PostCommand::Create { .. }) => "Failed to create post",
        Command::Post(PostCommand::Edit { .. }) => "Failed to update post",
        Command::Post(PostCommand::Delete { .. }) => "Failed to delete post",
        Command::Post(PostCommand::Like { .. } | PostCommand::Unlike { .. }) => {
            "Failed to update like"
        }
        Command::Groups(GroupCommand::Create { .. }) => "Failed to create group",
        Command::Groups(GroupCommand::Add { .. }) => "Failed to add member",
        Command::Groups(GroupCommand::Remove { .. }) => "Failed to remove member",
        Command::Search { .. } | Command::Groups(GroupCommand::Find { .. }) => "Search failed",
        _ => "Failed to load page",
    }
}

/// Run `command`, leaving notices in `state` and returning the text to print
pub async fn execute(state: &mut AppState, command: Command) -> AppResult<String> {
    let fallback = fallback_message(&command);
    let (result, success) = match run(state, command).await {
        Ok(outcome) => (Ok(outcome.text), outcome.success),
        Err(e) => (Err(e), None),
    };
    state.settle(result, success, fallback)
}

async fn run(state: &mut AppState, command: Command) -> AppResult<Outcome> {
    match command {
        Command::Login { email, password } => {
            account::login(state, &email, &password).await?;
            let name = state.viewer()?.display_name();
            Ok(Outcome::done("Signed in").with_text(format!("Welcome, {}", name)))
        }
        Command::Register {
            email,
            username,
            password,
            password_confirm,
            first_name,
            last_name,
        } => {
            let form = NewUser {
                email,
                username,
                password,
                password_confirm,
                first_name,
                last_name,
            };
            account::register(state, &form).await?;
            Ok(Outcome::done("Account created"))
        }
        Command::Logout => {
            account::logout(state).await?;
            Ok(Outcome::done("Signed out"))
        }
        Command::Whoami => {
            let user = state.viewer()?;
            Ok(Outcome::show(format!(
                "#{} {} (@{}) <{}>",
                user.id,
                user.display_name(),
                user.username,
                user.email
            )))
        }
        Command::Feed { pages } => feed(state, pages).await,
        Command::Profile { user_id, pages } => {
            let user_id = match user_id {
                Some(id) => id,
                None => state.viewer()?.id,
            };
            profile(state, user_id, pages).await
        }
        Command::EditProfile {
            username,
            first_name,
            last_name,
            bio,
            avatar,
        } => {
            let mut page = EditProfilePage::open(&state.session)?;
            let changed = username.is_some()
                || first_name.is_some()
                || last_name.is_some()
                || bio.is_some();
            if let Some(username) = username {
                page.form.username = username;
            }
            if let Some(first_name) = first_name {
                page.form.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                page.form.last_name = last_name;
            }
            if let Some(bio) = bio {
                page.form.bio = bio;
            }
            if changed {
                page.save(&mut state.session).await?;
            }
            if let Some(path) = avatar {
                page.upload_avatar_file(&mut state.session, &path).await?;
            }
            Ok(Outcome::done("Profile updated"))
        }
        Command::Post(action) => post(state, action).await,
        Command::Groups(action) => groups(state, action).await,
        Command::Search { query } => {
            let mut page = SearchPage::new();
            page.search(state.services(), &query).await?;
            Ok(Outcome::show(page))
        }
        Command::Open { path } => {
            let route = state.navigate(Route::parse(&path));
            open(state, route).await
        }
    }
}

async fn feed(state: &mut AppState, pages: u32) -> AppResult<Outcome> {
    let mut list = PostList::feed(state.services().posts.clone());
    list.load().await?;
    for _ in 1..pages {
        if !list.load_more().await? {
            break;
        }
    }
    Ok(Outcome::show(list.render(state.viewer_id())))
}

async fn profile(state: &mut AppState, user_id: UserId, pages: u32) -> AppResult<Outcome> {
    let mut page = ProfilePage::load(state.services(), user_id, state.viewer_id()).await?;
    for _ in 1..pages {
        if !page.posts.load_more().await? {
            break;
        }
    }
    Ok(Outcome::show(page))
}

async fn post(state: &mut AppState, action: PostCommand) -> AppResult<Outcome> {
    let viewer = state.viewer_id();
    match action {
        PostCommand::Show { id } => {
            let page = PostDetailPage::load(state.services(), id).await?;
            Ok(Outcome::show(PostCard::new(&page.post, viewer)))
        }
        PostCommand::Create {
            text,
            media,
            url,
            file,
            audience,
            groups,
        } => {
            let mut page = CreatePostPage::load(state.services()).await?;
            page.form.content_type = PostCommand::content_type(media);
            page.form.text = text;
            page.form.media_type = media.map(MediaType::from);
            page.form.media_url = url.unwrap_or_default();
            if let Some(path) = file {
                page.form.attach_file(&path)?;
            }
            page.form.audience = Audience::from(audience);
            for group in groups {
                page.form.toggle_group(group);
            }
            let post = page.submit(state.services()).await?;
            Ok(Outcome::done("Post published").with_text(PostCard::new(&post, viewer)))
        }
        PostCommand::Edit {
            id,
            text,
            audience,
            groups,
        } => {
            let mut page = PostDetailPage::load(state.services(), id).await?;
            let form = page.start_edit(viewer)?;
            if let Some(text) = text {
                form.text = text;
            }
            if let Some(audience) = audience {
                form.audience = audience.into();
            }
            for group in groups {
                form.toggle_group(group);
            }
            page.save(state.services()).await?;
            Ok(Outcome::done("Post updated").with_text(PostCard::new(&page.post, viewer)))
        }
        PostCommand::Delete { id } => {
            let page = PostDetailPage::load(state.services(), id).await?;
            page.delete(state.services(), viewer).await?;
            state.navigate(Route::Feed);
            Ok(Outcome::done("Post deleted"))
        }
        PostCommand::Like { id } => set_like(state, id, true).await,
        PostCommand::Unlike { id } => set_like(state, id, false).await,
    }
}

async fn set_like(state: &mut AppState, post_id: i64, liked: bool) -> AppResult<Outcome> {
    let mut page = PostDetailPage::load(state.services(), post_id).await?;
    if page.post.is_liked != liked {
        page.toggle_like(state.services()).await?;
    }
    Ok(Outcome::show(PostCard::new(&page.post, state.viewer_id())))
}

async fn groups(state: &mut AppState, action: GroupCommand) -> AppResult<Outcome> {
    let services = state.services();
    match action {
        GroupCommand::List => Ok(Outcome::show(GroupsPage::load(services).await?)),
        GroupCommand::Create { name } => {
            let mut page = GroupsPage::load(services).await?;
            page.create(services, &name).await?;
            Ok(Outcome::done("Group created").with_text(page))
        }
        GroupCommand::Delete { id } => {
            let mut page = GroupsPage::load(services).await?;
            page.delete(services, id).await?;
            Ok(Outcome::done("Group deleted").with_text(page))
        }
        GroupCommand::Show { id } => Ok(Outcome::show(GroupDetailPage::load(services, id).await?)),
        GroupCommand::Rename { id, name } => {
            let mut page = GroupDetailPage::load(services, id).await?;
            page.rename(services, &name).await?;
            Ok(Outcome::done("Group renamed").with_text(page))
        }
        GroupCommand::Find { id, query } => {
            let mut page = GroupDetailPage::load(services, id).await?;
            let found = page.search(services, &query).await?;
            if found.is_empty() {
                return Ok(Outcome::show(format!("Nobody to add for \"{}\"", query.trim())));
            }
            let lines: Vec<String> = found
                .iter()
                .map(|u| format!("#{} {} (@{})", u.id, u.display_name(), u.username))
                .collect();
            Ok(Outcome::show(lines.join("\n")))
        }
        GroupCommand::Add { id, user_id } => {
            let mut page = GroupDetailPage::load(services, id).await?;
            page.add_member(services, user_id).await?;
            Ok(Outcome::done("Member added").with_text(page))
        }
        GroupCommand::Remove { id, user_id } => {
            let mut page = GroupDetailPage::load(services, id).await?;
            page.remove_member(services, user_id).await?;
            Ok(Outcome::done("Member removed").with_text(page))
        }
    }
}

/// Render whatever page `route` names
async fn open(state: &mut AppState, route: Route) -> AppResult<Outcome> {
    match route {
        Route::Login => Ok(Outcome::show(
            "Sign in with `pickme login --email <email> --password <password>`",
        )),
        Route::Register => Ok(Outcome::show("Create an account with `pickme register`")),
        Route::Feed => feed(state, 1).await,
        Route::Profile(id) => profile(state, id, 1).await,
        Route::EditProfile => {
            let page = EditProfilePage::open(&state.session)?;
            let form = &page.form;
            Ok(Outcome::show(format!(
                "username: {}\nfirst name: {}\nlast name: {}\nbio: {}\navatar: {}",
                form.username,
                form.first_name,
                form.last_name,
                form.bio,
                page.avatar().unwrap_or("none")
            )))
        }
        Route::Groups => groups(state, GroupCommand::List).await,
        Route::GroupDetail(id) => groups(state, GroupCommand::Show { id }).await,
        Route::CreatePost => {
            let page = CreatePostPage::load(state.services()).await?;
            let mut text = String::from("Publish with `pickme post create`. Audience groups:\n");
            for group in &page.groups {
                text.push_str(&format!("  #{} {}\n", group.id, group.name));
            }
            Ok(Outcome::show(text))
        }
        Route::PostDetail(id) => post(state, PostCommand::Show { id }).await,
        Route::Search => Ok(Outcome::show("Search with `pickme search <query>`")),
    }
}
