use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    web::{scope, Data},
    App, HttpResponse, HttpServer,
};
use log::{info, warn};

use crate::config::app_config::AppConfig;
use crate::db::DB;
use crate::store::memory::MemoryStore;
use crate::store::PollStore;

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;

#[actix_web::get("/")]
async fn home() -> HttpResponse {
    HttpResponse::Ok().json("Welcome to polls backend")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let app_config = AppConfig::init();

    let store: Arc<dyn PollStore> = match &app_config.db_url {
        Some(db_url) => Arc::new(DB::init(db_url, &app_config.db_name).await?),
        None => {
            warn!("DB_URL not set, serving from the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    let store: Data<dyn PollStore> = Data::from(store);

    let client_origin = app_config.client_origin.clone();
    info!("Starting server on {}", app_config.server_addr);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&client_origin)
            .allow_any_method()
            .allow_any_header();
        App::new()
            .wrap(cors)
            .service(home)
            .app_data(store.clone())
            .service(scope("/polls").configure(routes::poll_routes::init))
    })
    .bind(app_config.server_addr)?
    .run()
    .await?;
    Ok(())
}
