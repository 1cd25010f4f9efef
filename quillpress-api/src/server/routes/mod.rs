use crate::server::ServerRouter;
use axum::Router;

mod accounts;
mod posts;

pub fn routes() -> ServerRouter {
    Router::new().merge(posts::routes()).merge(accounts::routes())
}
