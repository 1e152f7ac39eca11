use crate::layout;
use crate::thread::index::thread_routes;
use crate::user::index::user_routes;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(layout::index);
    cfg.configure(thread_routes);
    cfg.configure(user_routes);
}
