use std::sync::{Arc, Mutex};

use anyhow::Result;

mod api;
mod config;
mod db;
mod error;
mod report;
mod schema;
mod utils;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env()?;

    let mut db = db::Db::connect(&config.database_url)?;
    db.init()?;
    log::info!("hive database ready at {}", config.database_url);

    api::new_http_server(Arc::new(Mutex::new(db)), &config).await?;
    log::info!("shut down");
    Ok(())
}
