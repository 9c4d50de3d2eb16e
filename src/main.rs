use actix_web::{App, HttpServer};
use color_eyre::eyre::Report;
use dotenv::dotenv;
use tracing::info;

use agora_server::{config::Config, db, log, server};

#[actix_rt::main]
async fn main() -> Result<(), Report> {
    dotenv().ok();
    color_eyre::install()?;
    log::init();

    let config = Config::from_env()?;
    let pool = db::new_pool(&config.database_url, config.database_max_connections).await?;
    let bind_addr = format!("{}:{}", config.host, config.port);
    info!("Starting poll server on {}", bind_addr);

    HttpServer::new(move || {
        let pool = pool.clone();
        let config = config.clone();
        App::new().configure(move |cfg| server::configure(cfg, pool, config))
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
