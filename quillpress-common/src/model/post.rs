use crate::model::{
    Id,
    user::{EmailAddress, UserMarker},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A stored post with its author resolved to the public projection.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: PostTitle,
    pub subtitle: Option<String>,
    pub content: PostBody,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub status: PostStatus,
    pub published_at: Option<UtcDateTime>,
    pub views: u64,
    #[serde(skip)]
    pub author_id: Id<UserMarker>,
    pub author: Author,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

/// Public author projection: only email and name leave the server.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Author {
    pub email: EmailAddress,
    pub name: Option<String>,
}

/// Body of `POST /api/posts`. The author never comes from the body; unknown
/// fields (including any supplied `author` or `publishedAt`) are ignored.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: PostTitle,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub content: PostBody,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
}

/// Body of `PUT /api/posts/{id}`. A field that is present overwrites the
/// stored value, including present-but-empty optional strings; an absent
/// field keeps it.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChanges {
    #[serde(default)]
    pub title: Option<PostTitle>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Option<PostBody>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub status: Option<PostStatus>,
}

impl PostChanges {
    /// Merges the changes into `post` and re-derives `published_at` from the
    /// resulting status.
    pub fn apply(self, post: &mut Post, now: UtcDateTime) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(subtitle) = self.subtitle {
            post.subtitle = Some(subtitle);
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(summary) = self.summary {
            post.summary = Some(summary);
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
        if let Some(category) = self.category {
            post.category = Some(category);
        }
        if let Some(cover_image) = self.cover_image {
            post.cover_image = Some(cover_image);
        }
        if let Some(status) = self.status {
            post.status = status;
        }

        post.published_at = resolve_published_at(post.published_at, post.status, now);
    }
}

/// The single place `published_at` is decided. A post entering or staying
/// `published` keeps its first publication time; a draft has none.
#[must_use]
pub fn resolve_published_at(
    previous: Option<UtcDateTime>,
    status: PostStatus,
    now: UtcDateTime,
) -> Option<UtcDateTime> {
    match status {
        PostStatus::Published => previous.or(Some(now)),
        PostStatus::Draft => None,
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown post status: {0}")]
pub struct InvalidPostStatusError(String);

impl PostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = InvalidPostStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(InvalidPostStatusError(other.to_owned())),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The post title must not be empty")]
pub struct InvalidPostTitleError;

impl PostTitle {
    /// Trims surrounding whitespace; the remaining title must be non-empty.
    pub fn new(title: &str) -> Result<Self, InvalidPostTitleError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            Err(InvalidPostTitleError)
        } else {
            Ok(PostTitle(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PostTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostTitle::new(&inner)
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"a non-empty title"))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostBody(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The post content must not be empty")]
pub struct InvalidPostBodyError;

impl PostBody {
    pub fn new(content: String) -> Result<Self, InvalidPostBodyError> {
        if content.is_empty() {
            Err(InvalidPostBodyError)
        } else {
            Ok(PostBody(content))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PostBody {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostBody::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"non-empty content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::utc_datetime;
    use uuid::Uuid;

    const NOW: UtcDateTime = utc_datetime!(2025-06-01 12:00);
    const EARLIER: UtcDateTime = utc_datetime!(2025-05-01 09:30);

    fn sample_post() -> Post {
        Post {
            id: Uuid::new_v4().into(),
            title: PostTitle::new("First post").unwrap(),
            subtitle: Some("A subtitle".to_owned()),
            content: PostBody::new("Hello".to_owned()).unwrap(),
            summary: None,
            tags: vec!["intro".to_owned()],
            category: None,
            cover_image: None,
            status: PostStatus::Draft,
            published_at: None,
            views: 0,
            author_id: Uuid::new_v4().into(),
            author: Author {
                email: EmailAddress::new("author@example.com".to_owned()).unwrap(),
                name: Some("Author".to_owned()),
            },
            created_at: EARLIER,
            updated_at: EARLIER,
        }
    }

    #[test]
    fn publishing_sets_published_at_once() {
        assert_eq!(
            resolve_published_at(None, PostStatus::Published, NOW),
            Some(NOW)
        );
        assert_eq!(
            resolve_published_at(Some(EARLIER), PostStatus::Published, NOW),
            Some(EARLIER)
        );
    }

    #[test]
    fn drafts_have_no_published_at() {
        assert_eq!(resolve_published_at(Some(EARLIER), PostStatus::Draft, NOW), None);
        assert_eq!(resolve_published_at(None, PostStatus::Draft, NOW), None);
    }

    #[test]
    fn absent_fields_keep_stored_values() {
        let mut post = sample_post();
        let changes = PostChanges {
            title: Some(PostTitle::new("Renamed").unwrap()),
            ..PostChanges::default()
        };

        changes.apply(&mut post, NOW);

        assert_eq!(post.title.get(), "Renamed");
        assert_eq!(post.subtitle.as_deref(), Some("A subtitle"));
        assert_eq!(post.content.get(), "Hello");
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[test]
    fn present_empty_string_overwrites() {
        let mut post = sample_post();
        let changes: PostChanges =
            serde_json::from_str(r#"{"subtitle": "", "tags": []}"#).unwrap();

        changes.apply(&mut post, NOW);

        assert_eq!(post.subtitle.as_deref(), Some(""));
        assert!(post.tags.is_empty());
    }

    #[test]
    fn status_change_drives_published_at() {
        let mut post = sample_post();
        let publish = PostChanges {
            status: Some(PostStatus::Published),
            ..PostChanges::default()
        };
        publish.apply(&mut post, NOW);
        assert_eq!(post.published_at, Some(NOW));

        let unpublish = PostChanges {
            status: Some(PostStatus::Draft),
            ..PostChanges::default()
        };
        unpublish.apply(&mut post, NOW);
        assert_eq!(post.published_at, None);
    }

    #[test]
    fn update_without_status_keeps_published_at_consistent() {
        let mut post = sample_post();
        post.status = PostStatus::Published;
        post.published_at = Some(EARLIER);

        let changes = PostChanges {
            summary: Some("New summary".to_owned()),
            ..PostChanges::default()
        };
        changes.apply(&mut post, NOW);

        assert_eq!(post.published_at, Some(EARLIER));
        assert_eq!(post.summary.as_deref(), Some("New summary"));
    }

    #[test]
    fn new_post_defaults_to_draft() {
        let new_post: NewPost =
            serde_json::from_str(r#"{"title": "A", "content": "B"}"#).unwrap();
        assert_eq!(new_post.status, PostStatus::Draft);
        assert!(new_post.tags.is_empty());
    }

    #[test]
    fn new_post_requires_title_and_content() {
        let missing_title: Result<NewPost, _> =
            serde_json::from_str(r#"{"content": "B"}"#);
        assert!(missing_title.is_err());

        let empty_title: Result<NewPost, _> =
            serde_json::from_str(r#"{"title": "   ", "content": "B"}"#);
        assert!(empty_title.is_err());

        let empty_content: Result<NewPost, _> =
            serde_json::from_str(r#"{"title": "A", "content": ""}"#);
        assert!(empty_content.is_err());
    }

    #[test]
    fn new_post_ignores_author_and_published_at_fields() {
        let new_post: Result<NewPost, _> = serde_json::from_str(
            r#"{"title": "A", "content": "B", "author": "someone-else", "publishedAt": "2020-01-01"}"#,
        );
        assert!(new_post.is_ok());
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!("draft".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!(
            "published".parse::<PostStatus>().unwrap(),
            PostStatus::Published
        );
        assert!("archived".parse::<PostStatus>().is_err());
        assert_eq!(PostStatus::Published.to_string(), "published");
    }

    #[test]
    fn title_is_trimmed() {
        let title = PostTitle::new("  Spaced out  ").unwrap();
        assert_eq!(title.get(), "Spaced out");
    }
}
