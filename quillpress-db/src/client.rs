use crate::record::{PostRecord, UserRecord};
use quillpress_common::model::post::{NewPost, Post, PostMarker};
use quillpress_common::model::user::{CreateUser, EmailAddress, User, UserCredentials, UserMarker};
use quillpress_common::model::{Id, ModelValidationError};
use quillpress_common::util::PageNumber;
use sqlx::migrate::Migrator;
use sqlx::{PgPool, query, query_as, query_scalar};
use thiserror::Error;
use time::{OffsetDateTime, UtcDateTime};
use uuid::Uuid;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// Fixed feed page size.
pub const POSTS_PER_PAGE: u64 = 10;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("The email address is already registered")]
    DuplicateEmail,
    #[error("Running migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        // The only unique constraint reachable from client input is users.email.
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Self::DuplicateEmail,
            _ => Self::Sqlx(err),
        }
    }
}

pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(PgPool::connect(url).await.map_err(DbError::Sqlx)?))
    }

    /// Builds a client whose pool connects on first use. Lets routing and
    /// extraction be exercised without a reachable database.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        Ok(Self::new(PgPool::connect_lazy(url).map_err(DbError::Sqlx)?))
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let user_id: Uuid = query_scalar(
            "
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING user_id
            ",
        )
        .bind(user.email.get())
        .bind(user.password_hash.get())
        .bind(user.name.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(User {
            id: user_id.into(),
            email: user.email.clone(),
            name: user.name.clone(),
        })
    }

    pub async fn fetch_user_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserCredentials>> {
        let record: Option<UserRecord> = query_as(
            "
            SELECT user_id, email, password_hash, name
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.get())
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record.map(UserCredentials::try_from).transpose()?;
        Ok(credentials)
    }

    /// Fetches a post regardless of status, with the author joined in.
    /// Visibility rules are the caller's concern.
    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record: Option<PostRecord> = query_as(
            "
            SELECT
                posts.post_id, posts.title, posts.subtitle, posts.content, posts.summary,
                posts.tags, posts.category, posts.cover_image, posts.status,
                posts.published_at, posts.views, posts.author_id, posts.created_at,
                posts.updated_at, users.email AS author_email, users.name AS author_name
            FROM posts
            JOIN users ON users.user_id = posts.author_id
            WHERE posts.post_id = $1
            ",
        )
        .bind(post_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    /// One page of the public feed: published posts, newest publication
    /// first.
    pub async fn fetch_published_page(&self, page: PageNumber) -> Result<Vec<Post>> {
        let records: Vec<PostRecord> = query_as(
            "
            SELECT
                posts.post_id, posts.title, posts.subtitle, posts.content, posts.summary,
                posts.tags, posts.category, posts.cover_image, posts.status,
                posts.published_at, posts.views, posts.author_id, posts.created_at,
                posts.updated_at, users.email AS author_email, users.name AS author_name
            FROM posts
            JOIN users ON users.user_id = posts.author_id
            WHERE posts.status = 'published'
            ORDER BY posts.published_at DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(POSTS_PER_PAGE.cast_signed())
        .bind(page.offset(POSTS_PER_PAGE).cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, ModelValidationError>>()?;
        Ok(posts)
    }

    /// Atomically bumps the view counter, returning the new count, or `None`
    /// when the post no longer exists.
    pub async fn record_view(&self, post_id: Id<PostMarker>) -> Result<Option<u64>> {
        let views: Option<i64> = query_scalar(
            "
            UPDATE posts
            SET views = views + 1
            WHERE post_id = $1
            RETURNING views
            ",
        )
        .bind(post_id.uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(views.map(i64::cast_unsigned))
    }

    pub async fn create_post(
        &self,
        author: Id<UserMarker>,
        post: &NewPost,
        published_at: Option<UtcDateTime>,
    ) -> Result<Id<PostMarker>> {
        let post_id: Uuid = query_scalar(
            "
            INSERT INTO posts
                (title, subtitle, content, summary, tags, category, cover_image,
                 status, published_at, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING post_id
            ",
        )
        .bind(post.title.get())
        .bind(post.subtitle.as_deref())
        .bind(post.content.get())
        .bind(post.summary.as_deref())
        .bind(&post.tags)
        .bind(post.category.as_deref())
        .bind(post.cover_image.as_deref())
        .bind(post.status.as_str())
        .bind(published_at.map(OffsetDateTime::from))
        .bind(author.uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(post_id.into())
    }

    /// Persists the content fields of an already-merged post. The author
    /// column is never touched.
    pub async fn update_post(&self, post: &Post) -> Result<()> {
        query(
            "
            UPDATE posts
            SET title = $2, subtitle = $3, content = $4, summary = $5, tags = $6,
                category = $7, cover_image = $8, status = $9, published_at = $10,
                updated_at = now()
            WHERE post_id = $1
            ",
        )
        .bind(post.id.uuid())
        .bind(post.title.get())
        .bind(post.subtitle.as_deref())
        .bind(post.content.get())
        .bind(post.summary.as_deref())
        .bind(&post.tags)
        .bind(post.category.as_deref())
        .bind(post.cover_image.as_deref())
        .bind(post.status.as_str())
        .bind(post.published_at.map(OffsetDateTime::from))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<()> {
        query("DELETE FROM posts WHERE post_id = $1")
            .bind(post_id.uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
