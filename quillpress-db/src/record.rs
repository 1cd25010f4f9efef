use quillpress_common::model::post::{Author, Post, PostBody, PostTitle};
use quillpress_common::model::user::{EmailAddress, User, UserCredentials};
use quillpress_common::model::ModelValidationError;
use quillpress_common::password::PasswordHashString;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

/// A posts row joined with its author's email and name.
#[derive(Clone, Debug, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
    pub status: String,
    pub published_at: Option<OffsetDateTime>,
    pub views: i64,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_email: String,
    pub author_name: Option<String>,
}

impl TryFrom<UserRecord> for UserCredentials {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: User {
                id: value.user_id.into(),
                email: EmailAddress::new(value.email)?,
                name: value.name,
            },
            password_hash: PasswordHashString::from(value.password_hash),
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.into(),
            title: PostTitle::new(&value.title)?,
            subtitle: value.subtitle,
            content: PostBody::new(value.content)?,
            summary: value.summary,
            tags: value.tags,
            category: value.category,
            cover_image: value.cover_image,
            status: value.status.parse()?,
            published_at: value.published_at.map(OffsetDateTime::to_utc),
            views: value.views.cast_unsigned(),
            author_id: value.author_id.into(),
            author: Author {
                email: EmailAddress::new(value.author_email)?,
                name: value.author_name,
            },
            created_at: value.created_at.to_utc(),
            updated_at: value.updated_at.to_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quillpress_common::model::post::PostStatus;
    use time::macros::datetime;

    fn sample_record() -> PostRecord {
        PostRecord {
            post_id: Uuid::new_v4(),
            title: "First post".to_owned(),
            subtitle: None,
            content: "Hello".to_owned(),
            summary: None,
            tags: vec!["intro".to_owned()],
            category: None,
            cover_image: None,
            status: "published".to_owned(),
            published_at: Some(datetime!(2025-06-01 12:00 UTC)),
            views: 3,
            author_id: Uuid::new_v4(),
            created_at: datetime!(2025-05-01 09:30 UTC),
            updated_at: datetime!(2025-06-01 12:00 UTC),
            author_email: "author@example.com".to_owned(),
            author_name: Some("Author".to_owned()),
        }
    }

    #[test]
    fn post_record_converts() {
        let record = sample_record();
        let post = Post::try_from(record.clone()).unwrap();

        assert_eq!(post.id.uuid(), record.post_id);
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.views, 3);
        assert_eq!(post.author.email.get(), "author@example.com");
        assert!(post.published_at.is_some());
    }

    #[test]
    fn unknown_status_is_invalid_data() {
        let mut record = sample_record();
        record.status = "archived".to_owned();

        assert!(Post::try_from(record).is_err());
    }

    #[test]
    fn empty_title_is_invalid_data() {
        let mut record = sample_record();
        record.title = String::new();

        assert!(Post::try_from(record).is_err());
    }

    #[test]
    fn user_record_converts_with_hash() {
        let record = UserRecord {
            user_id: Uuid::new_v4(),
            email: "reader@example.com".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            name: None,
        };

        let credentials = UserCredentials::try_from(record.clone()).unwrap();
        assert_eq!(credentials.user.id.uuid(), record.user_id);
        assert_eq!(credentials.password_hash.get(), "$argon2id$stub");
    }
}
