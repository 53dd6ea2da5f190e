//! Page and fragment templates. Domain models are flattened into plain
//! strings and flags before rendering so the templates stay logic-free.

use askama::Template;
use chrono::{DateTime, Utc};
use domains::{Author, Comment, Identity, Post, Profile, Reply, Sidebar, Tag, ValidationErrors};
use uuid::Uuid;

const ANONYMOUS: &str = "Anonymous";

fn date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

fn author_name(author: &Option<Author>) -> String {
    author
        .as_ref()
        .map(|a| a.username.clone())
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

pub struct Viewer {
    pub signed_in: bool,
    pub username: String,
}

impl Viewer {
    pub fn of(identity: Option<&Identity>) -> Self {
        Self {
            signed_in: identity.is_some(),
            username: identity.map(|i| i.username.clone()).unwrap_or_default(),
        }
    }
}

pub struct TagChip {
    pub slug: String,
    pub name: String,
    pub icon: String,
}

impl From<&Tag> for TagChip {
    fn from(tag: &Tag) -> Self {
        Self {
            slug: tag.slug.clone(),
            name: tag.name.clone(),
            icon: tag.icon.clone().unwrap_or_default(),
        }
    }
}

/// A tag as a checkbox of the post form.
pub struct TagOption {
    pub slug: String,
    pub name: String,
    pub checked: bool,
}

impl TagOption {
    pub fn list(all: &[Tag], selected: &[String]) -> Vec<Self> {
        all.iter()
            .map(|t| Self {
                slug: t.slug.clone(),
                name: t.name.clone(),
                checked: selected.contains(&t.slug),
            })
            .collect()
    }
}

pub struct PostCard {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub image: String,
    pub url: String,
    pub body: String,
    pub author: String,
    /// Empty once the author is gone
    pub author_url: String,
    pub tags: Vec<TagChip>,
    pub like_count: i64,
    pub created: String,
}

impl From<&Post> for PostCard {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            artist: post.artist.clone(),
            image: post.image.clone(),
            url: post.url.clone(),
            body: post.body.clone(),
            author: author_name(&post.author),
            author_url: post
                .author
                .as_ref()
                .map(|a| format!("/profile/{}", a.username))
                .unwrap_or_default(),
            tags: post.tags.iter().map(TagChip::from).collect(),
            like_count: post.like_count,
            created: date(&post.created_at),
        }
    }
}

pub fn cards(posts: &[Post]) -> Vec<PostCard> {
    posts.iter().map(PostCard::from).collect()
}

pub struct ReplyView {
    pub id: String,
    pub author: String,
    pub body: String,
    pub like_count: i64,
    pub created: String,
    pub can_delete: bool,
}

impl ReplyView {
    fn build(reply: &Reply, viewer: Option<Uuid>) -> Self {
        Self {
            id: reply.id.to_string(),
            author: author_name(&reply.author),
            body: reply.body.clone(),
            like_count: reply.like_count,
            created: date(&reply.created_at),
            can_delete: viewer.is_some_and(|v| reply.is_owned_by(v)),
        }
    }
}

pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub body: String,
    pub like_count: i64,
    pub created: String,
    pub can_delete: bool,
    pub can_reply: bool,
    pub replies: Vec<ReplyView>,
}

impl CommentView {
    pub fn build(comment: &Comment, viewer: Option<Uuid>) -> Self {
        Self {
            id: comment.id.to_string(),
            post_id: comment.post_id.to_string(),
            author: author_name(&comment.author),
            body: comment.body.clone(),
            like_count: comment.like_count,
            created: date(&comment.created_at),
            can_delete: viewer.is_some_and(|v| comment.is_owned_by(v)),
            can_reply: viewer.is_some(),
            replies: comment
                .replies
                .iter()
                .map(|r| ReplyView::build(r, viewer))
                .collect(),
        }
    }

    pub fn list(comments: &[Comment], viewer: Option<Uuid>) -> Vec<Self> {
        comments.iter().map(|c| Self::build(c, viewer)).collect()
    }
}

pub struct SidebarView {
    pub categories: Vec<TagChip>,
    /// Slug of the category being browsed, empty on the home feed
    pub active: String,
    pub top_posts: Vec<PostCard>,
    pub top_comments: Vec<CommentView>,
}

impl SidebarView {
    pub fn build(sidebar: &Sidebar, active: Option<&str>) -> Self {
        Self {
            categories: sidebar.categories.iter().map(TagChip::from).collect(),
            active: active.unwrap_or_default().to_string(),
            top_posts: cards(&sidebar.top_posts),
            top_comments: CommentView::list(&sidebar.top_comments, None),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub viewer: Viewer,
    pub heading: String,
    pub posts: Vec<PostCard>,
    pub sidebar: SidebarView,
}

#[derive(Template)]
#[template(path = "partials/feed.html")]
pub struct FeedPartial {
    pub posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "partials/comments.html")]
pub struct CommentsPartial {
    pub comments: Vec<CommentView>,
}

/// Field messages of the post form; empty strings mean "no problem".
#[derive(Default)]
pub struct FormErrors {
    pub url: String,
    pub caption: String,
    pub tags: String,
    /// Failures not tied to one field (fetch, extraction, store)
    pub general: String,
}

impl FormErrors {
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let field = |name: &str| errors.message_for(name).unwrap_or_default().to_string();
        Self {
            url: field("url"),
            caption: field("caption"),
            tags: field("tags"),
            general: String::new(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            general: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormPage {
    pub viewer: Viewer,
    pub url: String,
    pub caption: String,
    pub tags: Vec<TagOption>,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostPageView {
    pub viewer: Viewer,
    pub post: PostCard,
    pub comments: Vec<CommentView>,
    pub can_edit: bool,
    pub can_like: bool,
    pub tags: Vec<TagOption>,
    pub sidebar: SidebarView,
}

pub struct ProfileView {
    pub username: String,
    pub name: String,
    pub avatar: String,
    pub bio: String,
    pub location: String,
    pub email: String,
    pub joined: String,
}

impl From<&Profile> for ProfileView {
    fn from(profile: &Profile) -> Self {
        Self {
            username: profile.username.clone(),
            name: profile.name().to_string(),
            avatar: profile.avatar.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            location: profile.location.clone().unwrap_or_default(),
            email: profile.email.clone().unwrap_or_default(),
            joined: date(&profile.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePageView {
    pub viewer: Viewer,
    pub profile: ProfileView,
    /// Active tab slug, empty for the default listing
    pub tab: String,
    pub posts: Vec<PostCard>,
    pub comments: Vec<CommentView>,
    pub show_comments: bool,
    pub is_own: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(author: Option<Author>) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: "Sunset <3".into(),
            artist: "Jane".into(),
            url: "https://example.com/photo/1".into(),
            image: "https://live.staticflickr.com/x.jpg".into(),
            body: "nice".into(),
            author,
            tags: vec![Tag {
                slug: "nature".into(),
                name: "Nature".into(),
                position: None,
                icon: None,
            }],
            like_count: 3,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn card_of_orphaned_post_is_anonymous() {
        let card = PostCard::from(&post(None));
        assert_eq!(card.author, ANONYMOUS);
        assert!(card.author_url.is_empty());
    }

    #[test]
    fn feed_escapes_titles() {
        let html = FeedPartial {
            posts: vec![PostCard::from(&post(Some(Author {
                id: Uuid::new_v4(),
                username: "jane".into(),
            })))],
        }
        .render()
        .unwrap();
        assert!(html.contains("Sunset &#60;3") || html.contains("Sunset &lt;3"));
        assert!(html.contains(">jane</a>"));
        assert!(html.contains(">Nature</a>"));
    }

    #[test]
    fn form_errors_pick_field_messages() {
        let mut v = ValidationErrors::new();
        v.add("tags", "This field is required.");
        let errors = FormErrors::from_validation(&v);
        assert!(errors.url.is_empty());
        assert_eq!(errors.tags, "This field is required.");
    }
}
