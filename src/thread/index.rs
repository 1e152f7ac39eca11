use super::controller::{add_comment, create_thread, get_thread, list_threads};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn thread_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/threads")
            .service(
                web::resource("")
                    .route(web::get().to(list_threads))
                    .route(web::post().to(create_thread).wrap(HttpAuthentication::bearer(verify_token))),
            )
            .route("/{id}", web::get().to(get_thread))
            .service(
                web::resource("/{id}/comments")
                    .route(web::post().to(add_comment).wrap(HttpAuthentication::bearer(verify_token))),
            ),
    );
}
