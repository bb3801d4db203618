//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod comments;
mod health;
mod posts;
mod profile;
mod render;


use actix_web::web;

use crate::middleware::error::AppError;

/// Malformed JSON bodies are answered with a problem document.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/", web::get().to(posts::index))
            .route("/category/{slug}/", web::get().to(posts::category))
            .route("/admin/models/", web::get().to(admin::models))
            // Profiles
            .route("/profile/edit/", web::post().to(profile::edit))
            .route("/profile/{username}/", web::get().to(profile::show))
            // Posts and comments
            .service(
                web::scope("/posts")
                    .route("/create/", web::post().to(posts::create))
                    .route("/{id}/", web::get().to(posts::detail))
                    .route("/{id}/edit/", web::post().to(posts::edit))
                    .route("/{id}/delete/", web::post().to(posts::delete))
                    .route("/{post_id}/comment/", web::post().to(comments::add))
                    .route(
                        "/{post_id}/edit_comment/{id}/",
                        web::post().to(comments::edit),
                    )
                    .route(
                        "/{post_id}/delete_comment/{id}/",
                        web::post().to(comments::delete),
                    ),
            )
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/registration/", web::post().to(auth::register))
                    .route("/login/", web::post().to(auth::login))
                    .route("/logout/", web::post().to(auth::logout))
                    .route("/me/", web::get().to(auth::me)),
            ),
    );
}
