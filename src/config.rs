use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expires_minutes: i64,
    pub uploads_dir: PathBuf,
    pub password_reset_url: String,
    pub mail_from: String,
    pub mail_webhook_url: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let jwt_expires_minutes: i64 = get_env_parse_or("JWT_EXPIRES_MINUTES", 60)?;
        if jwt_expires_minutes <= 0 {
            return Err(Error::Config(
                "JWT_EXPIRES_MINUTES must be a positive number".to_string(),
            ));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            db_max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", 20)?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_issuer: get_env_or("JWT_ISSUER", "job-board"),
            jwt_audience: get_env_or("JWT_AUDIENCE", "job-board-clients"),
            jwt_expires_minutes,
            uploads_dir: PathBuf::from(get_env_or("UPLOADS_DIR", "./Uploads")),
            password_reset_url: get_env_or(
                "PASSWORD_RESET_URL",
                "http://localhost:3000/reset-password",
            ),
            mail_from: get_env_or("MAIL_FROM", "no-reply@job-board.local"),
            mail_webhook_url: get_optional("MAIL_WEBHOOK_URL"),
            admin_email: get_optional("ADMIN_EMAIL"),
            admin_password: get_optional("ADMIN_PASSWORD"),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    get_optional(name).unwrap_or_else(|| default.to_string())
}

fn get_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}
