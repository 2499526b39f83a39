//! HTTP handlers and route configuration.

mod client_nonce;
mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::home))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/post")
                .route("", web::get().to(posts::index))
                .service(
                    web::resource("/new")
                        .route(web::get().to(posts::new_form))
                        .route(web::post().to(posts::new_submit)),
                )
                .service(
                    web::resource("/{id}/edit")
                        .route(web::get().to(posts::edit_form))
                        .route(web::post().to(posts::edit_submit)),
                )
                .service(
                    web::resource("/delete/{id}")
                        .route(web::get().to(posts::delete_confirm))
                        .route(web::post().to(posts::delete_submit)),
                ),
        );
}
