//! Friend group pages

use std::fmt;

use api::models::{FriendGroup, GroupId, User, UserId};
use api::Services;
use auth::validation;
use common::FieldErrors;
use tracing::info;

use crate::error::AppResult;
use crate::views::search::check_search_query;

fn check_group_name(name: &str) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("name", validation::validate_group_name(name));
    errors.into_result()?;
    Ok(name.trim().to_string())
}

/// The viewer's groups
pub struct GroupsPage {
    pub groups: Vec<FriendGroup>,
}

impl GroupsPage {
    pub async fn load(services: &Services) -> AppResult<Self> {
        Ok(Self {
            groups: services.groups.list().await?,
        })
    }

    pub async fn create(&mut self, services: &Services, name: &str) -> AppResult<&FriendGroup> {
        let name = check_group_name(name)?;
        let group = services.groups.create(&name).await?;
        info!("Created group {} ({})", group.name, group.id);
        self.groups.push(group);
        Ok(&self.groups[self.groups.len() - 1])
    }

    pub async fn delete(&mut self, services: &Services, group_id: GroupId) -> AppResult<()> {
        services.groups.delete(group_id).await?;
        self.groups.retain(|g| g.id != group_id);
        Ok(())
    }
}

impl fmt::Display for GroupsPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return writeln!(f, "No groups yet");
        }
        for group in &self.groups {
            writeln!(
                f,
                "#{} {} ({} members)",
                group.id, group.name, group.members_count
            )?;
        }
        Ok(())
    }
}

/// One group with its members and the member search
pub struct GroupDetailPage {
    pub group: FriendGroup,
    pub members: Vec<User>,
    /// Users found by the last search, minus current members
    pub candidates: Vec<User>,
}

impl GroupDetailPage {
    pub async fn load(services: &Services, group_id: GroupId) -> AppResult<Self> {
        let mut page = Self {
            group: services.groups.get(group_id).await?,
            members: Vec::new(),
            candidates: Vec::new(),
        };
        page.members = services.groups.members(group_id).await?;
        Ok(page)
    }

    async fn reload(&mut self, services: &Services) -> AppResult<()> {
        self.group = services.groups.get(self.group.id).await?;
        self.members = services.groups.members(self.group.id).await?;
        Ok(())
    }

    pub async fn rename(&mut self, services: &Services, name: &str) -> AppResult<()> {
        let name = check_group_name(name)?;
        self.group = services.groups.rename(self.group.id, &name).await?;
        Ok(())
    }

    /// Search users to add; current members are left out
    pub async fn search(&mut self, services: &Services, query: &str) -> AppResult<&[User]> {
        let query = check_search_query(query)?;
        let found = services.users.search(&query).await?;
        self.candidates = found
            .into_iter()
            .filter(|u| !self.members.iter().any(|m| m.id == u.id))
            .collect();
        Ok(&self.candidates)
    }

    pub async fn add_member(&mut self, services: &Services, user_id: UserId) -> AppResult<()> {
        services.groups.add_member(self.group.id, user_id).await?;
        self.reload(services).await?;
        self.candidates.retain(|u| u.id != user_id);
        info!("Added user {} to group {}", user_id, self.group.id);
        Ok(())
    }

    pub async fn remove_member(&mut self, services: &Services, user_id: UserId) -> AppResult<()> {
        services.groups.remove_member(self.group.id, user_id).await?;
        self.members.retain(|m| m.id != user_id);
        self.group.members_count = self.members.len() as u64;
        Ok(())
    }
}

impl fmt::Display for GroupDetailPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#{} {}", self.group.id, self.group.name)?;
        if self.members.is_empty() {
            writeln!(f, "No members yet")?;
        }
        for member in &self.members {
            writeln!(f, "  #{} {} (@{})", member.id, member.display_name(), member.username)?;
        }
        Ok(())
    }
}
