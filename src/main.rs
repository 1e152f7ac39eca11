use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::info;

mod cache;
mod community;
mod config;
mod database;
mod layout;
mod middleware;
mod router;
mod state;
mod thread;
mod user;
mod utils;

#[cfg(test)]
mod test_support;

use config::AppConfig;
use middleware::error_handler::json_errors;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    let bind = (config.host.clone(), config.port);

    let state = AppState::connect(config)
        .await
        .map_err(std::io::Error::other)?;

    info!("Starting server on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(move |cfg| state.configure(cfg))
            .wrap(json_errors())
    })
    .bind(bind)?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
