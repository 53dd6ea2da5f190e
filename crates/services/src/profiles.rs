//! # Profile Service
//!
//! Local user records, their profiles and the tabs shown on a profile page.
//! A profile email and the user email are kept identical.

use std::str::FromStr;
use std::sync::Arc;

use domains::{
    Comment, CommentRepository, Identity, Post, PostRepository, Profile, ProfileChanges,
    ProfilePage, Result, ServiceError, UserRepository, ValidationErrors,
};
use tracing::{info, instrument, warn};
use validator::ValidateEmail;

pub const MAX_DISPLAY_NAME_LEN: usize = 20;
pub const MAX_LOCATION_LEN: usize = 20;

/// The alternative listings of a profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTab {
    TopPosts,
    TopComments,
    LikedPosts,
}

impl FromStr for ProfileTab {
    type Err = ValidationErrors;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "top-posts" => Ok(ProfileTab::TopPosts),
            "top-comments" => Ok(ProfileTab::TopComments),
            "liked-posts" => Ok(ProfileTab::LikedPosts),
            other => Err(ValidationErrors::single("tab", format!("Unknown tab {other}."))),
        }
    }
}

/// What a tab renders: either a list of posts or a list of comments.
#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Posts(Vec<Post>),
    Comments(Vec<Comment>),
}

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
        }
    }

    /// Idempotent; called for every authenticated request.
    pub async fn register(&self, identity: &Identity) -> Result<Profile> {
        Ok(self.users.register(identity.clone()).await?)
    }

    pub async fn profile(&self, username: &str) -> Result<ProfilePage> {
        let profile = self.find_by_username(username).await?;
        let posts = self.posts.list_by_author(profile.user_id).await?;
        Ok(ProfilePage { profile, posts })
    }

    pub async fn own_profile(&self, identity: &Identity) -> Result<Profile> {
        self.users
            .find_profile(identity.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Profile", identity.id.to_string()))
    }

    pub async fn tab(&self, username: &str, tab: ProfileTab) -> Result<TabContent> {
        let profile = self.find_by_username(username).await?;
        let user_id = profile.user_id;
        Ok(match tab {
            ProfileTab::TopPosts => TabContent::Posts(self.posts.top_by_likes(Some(user_id)).await?),
            ProfileTab::TopComments => {
                TabContent::Comments(self.comments.top_by_likes(Some(user_id)).await?)
            }
            ProfileTab::LikedPosts => TabContent::Posts(self.posts.liked_by(user_id).await?),
        })
    }

    /// Replaces the editable fields. Blank values clear the field.
    #[instrument(skip(self, identity, changes), fields(user = %identity.username))]
    pub async fn update(&self, identity: &Identity, changes: ProfileChanges) -> Result<Profile> {
        let changes = normalize(changes);
        let mut errors = ValidationErrors::new();

        check_len("display_name", changes.display_name.as_deref(), MAX_DISPLAY_NAME_LEN, &mut errors);
        check_len("location", changes.location.as_deref(), MAX_LOCATION_LEN, &mut errors);
        if let Some(email) = changes.email.as_deref() {
            if !email.validate_email() {
                errors.add("email", "Enter a valid email address.");
            } else if let Some(owner) = self.users.find_user_by_email(email).await? {
                if owner != identity.id {
                    errors.add("email", "Profile with this Email already exists.");
                }
            }
        }
        errors.into_result()?;

        let profile = self.users.update_profile(identity.id, changes).await?;
        info!("profile updated");
        Ok(profile)
    }

    /// Removes the user; posts and comments stay with no owner.
    #[instrument(skip(self, identity), fields(user = %identity.username))]
    pub async fn delete_account(&self, identity: &Identity) -> Result<()> {
        if !self.users.delete_user(identity.id).await? {
            warn!("account already gone");
            return Err(ServiceError::NotFound("User", identity.id.to_string()));
        }
        info!("account deleted");
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Profile> {
        self.users
            .find_profile_by_username(username)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Profile", username.to_string()))
    }
}

fn normalize(changes: ProfileChanges) -> ProfileChanges {
    fn clean(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
    ProfileChanges {
        display_name: clean(changes.display_name),
        avatar: clean(changes.avatar),
        bio: clean(changes.bio),
        location: clean(changes.location),
        email: clean(changes.email).map(|e| e.to_lowercase()),
    }
}

fn check_len(field: &'static str, value: Option<&str>, max: usize, errors: &mut ValidationErrors) {
    if let Some(value) = value {
        let len = value.chars().count();
        if len > max {
            errors.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {len})."),
            );
        }
    }
}
