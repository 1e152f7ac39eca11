//! The page shell: site metadata served at the root. Authenticated route
//! groups are wrapped with bearer verification in their `index` modules.

use actix_web::{Responder, get};
use serde::Serialize;

use crate::utils::response;

#[derive(Debug, Serialize)]
pub struct SiteMetadata {
    pub title: &'static str,
    pub description: &'static str,
}

pub const METADATA: SiteMetadata = SiteMetadata {
    title: "Threads",
    description: "Short posts, replies and communities",
};

#[get("/")]
pub async fn index() -> impl Responder {
    response::ok("Welcome to Threads", &METADATA)
}
