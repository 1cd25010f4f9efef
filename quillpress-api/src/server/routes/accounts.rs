use crate::server::{
    Result, ServerError, ServerRouter,
    identity::{auth_cookie, stale_auth_cookie},
    json::{ApiResponse, Json},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::{
    extract::cookie::CookieJar,
    routing::{RouterExt, TypedPath},
};
use quillpress_common::{
    model::{
        auth::TokenSigner,
        user::{CreateUser, EmailAddress},
    },
    password::{self, Password},
};
use quillpress_db::client::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::UtcDateTime;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(register)
        .typed_post(login)
        .typed_post(logout)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/auth/register", rejection(ServerError))]
struct RegisterPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/auth/login", rejection(ServerError))]
struct LoginPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/api/auth/logout", rejection(ServerError))]
struct LogoutPath();

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct RegisterBody {
    email: EmailAddress,
    password: Password,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
struct LoginBody {
    email: EmailAddress,
    password: Password,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct IssuedToken {
    token: String,
}

async fn register(
    RegisterPath(): RegisterPath,
    State(db): State<Arc<DbClient>>,
    State(signer): State<Arc<TokenSigner>>,
    jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<IssuedToken>>)> {
    let password_hash = password::hash(&body.password)?;

    let user = db
        .create_user(&CreateUser {
            email: body.email,
            password_hash,
            name: body.name,
        })
        .await?;

    let token = signer.issue(&user, UtcDateTime::now())?;
    let jar = jar.add(auth_cookie(token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(ApiResponse::ok("Account created", IssuedToken { token })),
    ))
}

async fn login(
    LoginPath(): LoginPath,
    State(db): State<Arc<DbClient>>,
    State(signer): State<Arc<TokenSigner>>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, Json<ApiResponse<IssuedToken>>)> {
    // Unknown email and wrong password answer identically.
    let credentials = db
        .fetch_user_by_email(&body.email)
        .await?
        .ok_or(ServerError::InvalidCredentials)?;

    if !password::verify(&body.password, &credentials.password_hash)? {
        return Err(ServerError::InvalidCredentials);
    }

    let token = signer.issue(&credentials.user, UtcDateTime::now())?;
    let jar = jar.add(auth_cookie(token.clone()));

    Ok((
        jar,
        Json(ApiResponse::ok("Logged in", IssuedToken { token })),
    ))
}

async fn logout(
    LogoutPath(): LogoutPath,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    let jar = jar.remove(stale_auth_cookie());

    (jar, Json(ApiResponse::acknowledgement("Logged out")))
}

#[cfg(test)]
mod tests {
    use crate::server::ServerState;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use quillpress_common::{model::auth::TokenSigner, util::PositiveDuration};
    use quillpress_db::client::DbClient;
    use std::sync::Arc;
    use time::Duration;
    use tower::ServiceExt;

    fn test_state() -> ServerState {
        ServerState {
            db_client: Arc::new(
                DbClient::connect_lazy("postgres://localhost/quillpress_test").unwrap(),
            ),
            token_signer: Arc::new(TokenSigner::new(
                b"test-secret",
                PositiveDuration::new_unchecked(Duration::hours(1)),
            )),
        }
    }

    async fn respond(request: Request<Body>) -> StatusCode {
        let app = crate::server::routes().with_state(test_state());
        app.oneshot(request).await.unwrap().status()
    }

    fn register_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/auth/register")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn registration_rejects_short_passwords() {
        let request =
            register_request(r#"{"email": "reader@example.com", "password": "short"}"#);
        assert_eq!(respond(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn registration_rejects_invalid_emails() {
        let request =
            register_request(r#"{"email": "not-an-email", "password": "long enough"}"#);
        assert_eq!(respond(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_needs_no_credential() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .body(Body::empty())
            .unwrap();

        assert_eq!(respond(request).await, StatusCode::OK);
    }
}
