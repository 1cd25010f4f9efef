use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::{
    TypedHeader,
    extract::cookie::{Cookie, CookieJar},
};
use headers::{Authorization, authorization::Bearer};
use quillpress_common::model::{
    Id,
    auth::{Claims, TokenSigner},
    user::{EmailAddress, UserMarker},
};
use std::sync::Arc;

/// Cookie holding the credential for browser clients.
pub const TOKEN_COOKIE: &str = "token";
/// Request header by which non-browser clients opt into header transport.
pub const CLIENT_HEADER: &str = "client";
pub const NON_BROWSER_CLIENT: &str = "not-browser";

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The verified identity a handler receives. Constructed only by the
/// extractor below; there is no other way in.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AuthenticatedUser {
    id: Id<UserMarker>,
    email: EmailAddress,
    name: Option<String>,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(&self) -> Id<UserMarker> {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

fn is_non_browser(headers: &HeaderMap) -> bool {
    headers
        .get(CLIENT_HEADER)
        .is_some_and(|value| value.as_bytes() == NON_BROWSER_CLIENT.as_bytes())
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenSigner>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = if is_non_browser(&parts.headers) {
            AuthorizationHeader::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidAuthorizationHeader)?
                .token()
                .to_owned()
        } else {
            CookieJar::from_headers(&parts.headers)
                .get(TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_owned())
                .ok_or(ServerError::MissingCredential)?
        };

        let claims = Arc::<TokenSigner>::from_ref(state).verify(&token)?;

        Ok(claims.into())
    }
}

#[must_use]
pub fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .path("/")
        .build()
}

#[must_use]
pub fn stale_auth_cookie() -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE).path("/").build()
}
