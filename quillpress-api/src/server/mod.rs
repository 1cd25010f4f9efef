use crate::server::json::{ApiResponse, Json};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use quillpress_common::{
    model::{
        Id,
        auth::{TokenSignError, TokenSigner, TokenVerifyError},
        post::PostMarker,
    },
    password::PasswordHashError,
};
use quillpress_db::client::{DbClient, DbError};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod identity;
mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub token_signer: Arc<TokenSigner>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("No credential was presented")]
    MissingCredential,
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The presented token could not be verified: {0}")]
    InvalidToken(#[from] TokenVerifyError),
    #[error("Issuing a token failed: {0}")]
    TokenIssue(#[from] TokenSignError),
    #[error("Working with a password hash failed: {0}")]
    PasswordHash(#[from] PasswordHashError),
    #[error("Email or password did not match a user")]
    InvalidCredentials,
    #[error("The email address is already registered")]
    EmailTaken,
    #[error("The authenticated user is not the post's author")]
    NotAuthor,
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Post with id {0} is not publicly visible.")]
    PostNotVisible(Id<PostMarker>),
    #[error(transparent)]
    Database(DbError),
}

impl From<DbError> for ServerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateEmail => Self::EmailTaken,
            other => Self::Database(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::PostNotVisible(_) => StatusCode::NOT_FOUND,
            ServerError::PathRejection(_)
            | ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_) => StatusCode::BAD_REQUEST,
            ServerError::MissingCredential
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidToken(_)
            | ServerError::NotAuthor => StatusCode::FORBIDDEN,
            ServerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServerError::EmailTaken => StatusCode::CONFLICT,
            ServerError::JsonResponse(_)
            | ServerError::TokenIssue(_)
            | ServerError::PasswordHash(_)
            | ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message put on the wire. Internal detail stays in the logs.
    pub fn message(&self) -> String {
        match self {
            ServerError::UnknownRoute(_) => "Not found".to_owned(),
            ServerError::PathRejection(_) => "Invalid post ID".to_owned(),
            ServerError::QueryRejection(_) => "Invalid query string".to_owned(),
            ServerError::JsonRejection(rejection) => rejection.body_text(),
            ServerError::MissingCredential
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidToken(_) => "Unauthorized".to_owned(),
            ServerError::InvalidCredentials => "Invalid email or password".to_owned(),
            ServerError::EmailTaken => "Email is already registered".to_owned(),
            ServerError::NotAuthor => "You are not the author".to_owned(),
            ServerError::PostByIdNotFound(_) => "Post not found".to_owned(),
            ServerError::PostNotVisible(_) => "Post not found or not published".to_owned(),
            ServerError::JsonResponse(_)
            | ServerError::TokenIssue(_)
            | ServerError::PasswordHash(_)
            | ServerError::Database(_) => "Server error".to_owned(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let body = ApiResponse::<()>::failure(self.message());
        (status, Json(body)).into_response()
    }
}
