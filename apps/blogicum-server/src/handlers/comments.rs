//! Comment handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::input::CommentInput;

use crate::handlers::render;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/posts/{post_id}/comment/
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    post_id: web::Path<Uuid>,
    body: web::Json<CommentInput>,
) -> AppResult<HttpResponse> {
    let entry = state
        .blog
        .create_comment(*post_id, identity.user_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(render::comment(entry, &identity.requester())))
}

/// POST /api/posts/{post_id}/edit_comment/{id}/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentInput>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let entry = state
        .blog
        .update_comment(post_id, comment_id, identity.user_id, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(render::comment(entry, &identity.requester())))
}

/// POST /api/posts/{post_id}/delete_comment/{id}/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    state
        .blog
        .delete_comment(post_id, comment_id, identity.user_id)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
