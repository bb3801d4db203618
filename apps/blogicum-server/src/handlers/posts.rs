//! Post listings, detail view and post management.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::DomainError;
use blogicum_core::input::PostInput;
use blogicum_core::pagination::PageRequest;
use blogicum_core::policy::Requester;
use blogicum_shared::dto::{CategoryPageResponse, PageQuery, PostDetailResponse};

use crate::handlers::render;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(crate) fn page_request(query: &PageQuery) -> AppResult<PageRequest> {
    PageRequest::parse(query.page.as_deref()).map_err(|e| DomainError::from(e).into())
}

pub(crate) fn detail_path(id: Uuid) -> String {
    format!("/api/posts/{id}/")
}

async fn render_detail(
    state: &AppState,
    id: Uuid,
    requester: &Requester,
) -> AppResult<PostDetailResponse> {
    let detail = state.blog.post_detail(id, requester).await?;

    Ok(PostDetailResponse {
        post: render::post(detail.entry, requester),
        comments: detail
            .comments
            .into_iter()
            .map(|entry| render::comment(entry, requester))
            .collect(),
    })
}

/// GET /api/?page=
pub async fn index(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let requester = identity.requester();
    let page = state.blog.index(page_request(&query)?).await?;

    Ok(HttpResponse::Ok().json(render::page(page, |entry| render::post(entry, &requester))))
}

/// GET /api/category/{slug}/?page=
pub async fn category(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let requester = identity.requester();
    let listing = state
        .blog
        .category_posts(&slug, page_request(&query)?)
        .await?;

    Ok(HttpResponse::Ok().json(CategoryPageResponse {
        category: render::category(listing.category),
        posts: render::page(listing.posts, |entry| render::post(entry, &requester)),
    }))
}

/// GET /api/posts/{id}/
pub async fn detail(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let response = render_detail(&state, *id, &identity.requester()).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/posts/create/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostInput>,
) -> AppResult<HttpResponse> {
    let post = state
        .blog
        .create_post(identity.user_id, body.into_inner())
        .await?;
    let response = render_detail(&state, post.id, &identity.requester()).await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, detail_path(post.id)))
        .json(response))
}

/// POST /api/posts/{id}/edit/
///
/// Non-authors are sent back to the post instead of getting an error.
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
    body: web::Json<PostInput>,
) -> AppResult<HttpResponse> {
    let id = id.into_inner();
    state
        .blog
        .update_post(id, identity.user_id, body.into_inner())
        .await
        .map_err(|e| match e {
            DomainError::Forbidden => {
                tracing::debug!(post_id = %id, user_id = %identity.user_id, "Edit by non-author");
                AppError::Redirect(detail_path(id))
            }
            other => other.into(),
        })?;
    let response = render_detail(&state, id, &identity.requester()).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/posts/{id}/delete/
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.blog.delete_post(*id, identity.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
