//! Read-only view of the admin registry.

use actix_web::{HttpResponse, web};

use crate::state::AppState;

/// GET /api/admin/models/
pub async fn models(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.admin.as_ref())
}
