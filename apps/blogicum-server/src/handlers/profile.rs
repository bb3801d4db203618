//! Profile pages.

use actix_web::{HttpResponse, web};

use blogicum_core::input::ProfileInput;
use blogicum_shared::dto::{PageQuery, ProfilePageResponse};

use crate::handlers::posts::page_request;
use crate::handlers::render;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/profile/{username}/?page=
pub async fn show(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let requester = identity.requester();
    let listing = state
        .blog
        .profile(&username, &requester, page_request(&query)?)
        .await?;

    Ok(HttpResponse::Ok().json(ProfilePageResponse {
        profile: render::profile(listing.user, &requester),
        posts: render::page(listing.posts, |entry| render::post(entry, &requester)),
    }))
}

/// POST /api/profile/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileInput>,
) -> AppResult<HttpResponse> {
    let user = state
        .blog
        .update_profile(identity.user_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(render::user(user)))
}
