//! Command line definition

use std::path::PathBuf;

use api::models::{Audience, ContentType, GroupId, MediaType, PostId, UserId};
use clap::{Parser, Subcommand, ValueEnum};
use pickme::Route;

#[derive(Parser, Debug)]
#[command(name = "pickme", version, about = "Client for the PickMe social network")]
pub struct Cli {
    /// REST API base URL, overrides PICKME_API_URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        password_confirm: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Sign out and forget the stored tokens
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show the feed
    Feed {
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show a profile, your own by default
    Profile {
        user_id: Option<UserId>,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Edit your profile
    EditProfile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Image file to use as avatar
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Work with posts
    #[command(subcommand)]
    Post(PostCommand),
    /// Work with friend groups
    #[command(subcommand)]
    Groups(GroupCommand),
    /// Search users by name or username
    Search { query: String },
    /// Open a page by its path, e.g. `/groups/3`
    Open { path: String },
}

#[derive(Subcommand, Debug)]
pub enum PostCommand {
    Show {
        id: PostId,
    },
    Create {
        #[arg(long, default_value = "")]
        text: String,
        /// Attach media of this kind
        #[arg(long, value_enum)]
        media: Option<MediaArg>,
        /// URL for link media
        #[arg(long)]
        url: Option<String>,
        /// File for photo or video media
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = AudienceArg::Everyone)]
        audience: AudienceArg,
        /// Audience group, repeatable
        #[arg(long = "group")]
        groups: Vec<GroupId>,
    },
    Edit {
        id: PostId,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_enum)]
        audience: Option<AudienceArg>,
        /// Toggle an audience group, repeatable
        #[arg(long = "group")]
        groups: Vec<GroupId>,
    },
    Delete {
        id: PostId,
    },
    Like {
        id: PostId,
    },
    Unlike {
        id: PostId,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    List,
    Create { name: String },
    Delete { id: GroupId },
    Show { id: GroupId },
    Rename { id: GroupId, name: String },
    /// Find users to add to a group
    Find { id: GroupId, query: String },
    Add { id: GroupId, user_id: UserId },
    Remove { id: GroupId, user_id: UserId },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AudienceArg {
    Everyone,
    Groups,
    OnlyMe,
}

impl From<AudienceArg> for Audience {
    fn from(arg: AudienceArg) -> Self {
        match arg {
            AudienceArg::Everyone => Audience::Everyone,
            AudienceArg::Groups => Audience::Groups,
            AudienceArg::OnlyMe => Audience::OnlyMe,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MediaArg {
    Photo,
    Video,
    Link,
}

impl From<MediaArg> for MediaType {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::Photo => MediaType::Photo,
            MediaArg::Video => MediaType::Video,
            MediaArg::Link => MediaType::Link,
        }
    }
}

impl PostCommand {
    pub fn content_type(media: Option<MediaArg>) -> ContentType {
        if media.is_some() {
            ContentType::Media
        } else {
            ContentType::Text
        }
    }
}

impl Command {
    /// Page the command acts on, used for the sign-in gate
    pub fn route(&self) -> Route {
        match self {
            Command::Login { .. } => Route::Login,
            Command::Register { .. } => Route::Register,
            Command::Logout | Command::Whoami | Command::Feed { .. } => Route::Feed,
            Command::Profile { user_id, .. } => user_id.map(Route::Profile).unwrap_or(Route::Feed),
            Command::EditProfile { .. } => Route::EditProfile,
            Command::Post(PostCommand::Create { .. }) => Route::CreatePost,
            Command::Post(
                PostCommand::Show { id }
                | PostCommand::Edit { id, .. }
                | PostCommand::Delete { id }
                | PostCommand::Like { id }
                | PostCommand::Unlike { id },
            ) => Route::PostDetail(*id),
            Command::Groups(GroupCommand::List | GroupCommand::Create { .. }) => Route::Groups,
            Command::Groups(
                GroupCommand::Delete { id }
                | GroupCommand::Show { id }
                | GroupCommand::Rename { id, .. }
                | GroupCommand::Find { id, .. }
                | GroupCommand::Add { id, .. }
                | GroupCommand::Remove { id, .. },
            ) => Route::GroupDetail(*id),
            Command::Search { .. } => Route::Search,
            Command::Open { path } => Route::parse(path),
        }
    }
}
