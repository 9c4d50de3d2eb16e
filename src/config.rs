use color_eyre::eyre::{Report, WrapErr};
use std::env;

/// Runtime configuration, read once from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Config, Report> {
        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned()),
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL").wrap_err("DATABASE_URL must be set")?,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: env::var("JWT_SECRET").wrap_err("JWT_SECRET must be set")?,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T, Report>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .wrap_err_with(|| format!("{key} is not a valid value")),
        Err(_) => Ok(default),
    }
}
