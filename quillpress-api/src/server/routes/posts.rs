use crate::server::{
    Result, ServerError, ServerRouter,
    identity::AuthenticatedUser,
    json::{ApiResponse, Json},
};
use axum::{
    extract::{FromRequestParts, Query as AxumQuery, State},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use quillpress_common::{
    model::{
        Id,
        post::{NewPost, Post, PostChanges, PostMarker, PostStatus, resolve_published_at},
    },
    util::PageNumber,
};
use quillpress_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use time::UtcDateTime;
use tracing::debug;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_get(get_post)
        .typed_post(create_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts", rejection(ServerError))]
struct PostsPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

#[derive(FromRequestParts, Debug, Clone, Copy, Default)]
#[from_request(via(AxumQuery), rejection(ServerError))]
struct Query<T>(T);

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    page: Option<i64>,
}

async fn list_posts(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>> {
    let page = query.page.map_or(PageNumber::FIRST, PageNumber::new);
    let posts = db.fetch_published_page(page).await?;

    Ok(Json(ApiResponse::ok("List of posts", posts)))
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<ApiResponse<Post>>> {
    let mut post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostNotVisible(id))?;

    if post.status != PostStatus::Published {
        return Err(ServerError::PostNotVisible(id));
    }

    let views = db
        .record_view(id)
        .await?
        .ok_or(ServerError::PostNotVisible(id))?;
    post.views = views;

    Ok(Json(ApiResponse::ok("Post detail", post)))
}

async fn create_post(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(new_post): Json<NewPost>,
) -> Result<(StatusCode, Json<ApiResponse<Post>>)> {
    debug!(author = %user.email(), name = ?user.name(), "Creating post");

    let published_at = resolve_published_at(None, new_post.status, UtcDateTime::now());

    let id = db
        .create_post(user.user_id(), &new_post, published_at)
        .await?;
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Post created", post)),
    ))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(changes): Json<PostChanges>,
) -> Result<Json<ApiResponse<Post>>> {
    let mut post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.author_id != user.user_id() {
        return Err(ServerError::NotAuthor);
    }

    changes.apply(&mut post, UtcDateTime::now());
    db.update_post(&post).await?;

    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(ApiResponse::ok("Post updated", post)))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<()>>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if post.author_id != user.user_id() {
        return Err(ServerError::NotAuthor);
    }

    db.delete_post(id).await?;

    Ok(Json(ApiResponse::acknowledgement("Post deleted")))
}
