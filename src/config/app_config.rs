use dotenv::dotenv;
use log::warn;
use std::env;

pub struct AppConfig {
    pub server_addr: String,
    /// Unset means "run on the in-memory store" (quick start, no database).
    pub db_url: Option<String>,
    pub db_name: String,
    pub client_origin: String,
}

impl AppConfig {
    pub fn init() -> Self {
        dotenv().ok();
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| {
            warn!("SERVER_ADDR not set, using localhost:5000");
            String::from("localhost:5000")
        });
        let db_url = env::var("DB_URL").ok();
        let db_name = env::var("DB_NAME").unwrap_or_else(|_| String::from("polls-app"));
        let client_origin = env::var("CLIENT_ORIGIN").unwrap_or_else(|_| {
            warn!("CLIENT_ORIGIN not set, allowing http://localhost:3000");
            String::from("http://localhost:3000")
        });
        Self {
            server_addr,
            db_url,
            db_name,
            client_origin,
        }
    }
}
