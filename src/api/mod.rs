use crate::common::error::AppError;
use crate::common::init;
use crate::common::state::AppState;
use crate::settings::AppSettings;
use axum::extract::{FromRequest, Request};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub mod posts;
pub mod profiles;
pub mod relationships;
pub mod sessions;
pub mod users;

/// A JSON request body whose decoding failures render as [`AppError`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(e) => {
                warn!("Failed to decode request body: {e}");
                Err(AppError::DecodingRequestFailed)
            }
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/users", post(users::register))
        .route("/sessions", post(sessions::login).delete(sessions::logout))
        .route("/relationships", get(relationships::fetch_all))
        .route("/relationships/overview", get(relationships::fetch_overview))
        .route(
            "/relationships/{id}",
            get(relationships::fetch_between).post(relationships::create_request),
        )
        .route("/relationships/{id}/accept", put(relationships::accept))
        .route("/relationships/{id}/decline", put(relationships::decline))
        .route("/posts", get(posts::fetch_all).post(posts::create))
        .route("/posts/new/{user_id}", get(posts::fetch_new_activity))
        .route(
            "/posts/{id}",
            get(posts::fetch_one)
                .put(posts::update)
                .delete(posts::delete),
        )
        .route("/posts/like/{id}", put(posts::like))
        .route("/posts/unlike/{id}", put(posts::dislike))
        .route("/posts/comment/{id}", post(posts::comment))
        .route(
            "/posts/comment/{id}/{comment_id}",
            delete(posts::delete_comment),
        )
        .route(
            "/profile",
            get(profiles::fetch_all)
                .post(profiles::upsert)
                .delete(profiles::delete_account),
        )
        .route("/profile/education", post(profiles::add_education))
        .route(
            "/profile/education/{id}",
            put(profiles::update_education).delete(profiles::delete_education),
        )
        .route("/profile/me", get(profiles::fetch_me))
        .route("/profile/user/{user_id}", get(profiles::fetch_one))
        .route(
            "/profile/codeforces/{handle}",
            get(profiles::fetch_codeforces),
        )
}

pub async fn index() -> &'static str {
    "Running cpnet-service v0.1"
}

pub async fn serve(settings: &AppSettings) -> anyhow::Result<()> {
    let state = init::initialize_state(settings).await?;
    let app = router().with_state(state);

    let addr = SocketAddr::new(settings.app_host, settings.app_port);
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
