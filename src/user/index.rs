use super::controller::{get_user, get_user_threads, list_users, my_activity, update_me};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .service(
                web::resource("")
                    .route(web::get().to(list_users).wrap(HttpAuthentication::bearer(verify_token))),
            )
            .service(
                web::resource("/me")
                    .route(web::put().to(update_me).wrap(HttpAuthentication::bearer(verify_token))),
            )
            .service(
                web::resource("/me/activity")
                    .route(web::get().to(my_activity).wrap(HttpAuthentication::bearer(verify_token))),
            )
            .route("/{id}", web::get().to(get_user))
            .route("/{id}/threads", web::get().to(get_user_threads)),
    );
}
