use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::auth::AuthConfig;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
const MIN_SECRET_BYTES: usize = 32;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
    pub policies_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = lookup("BIND")
            .unwrap_or_else(|| DEFAULT_BIND.into())
            .parse::<SocketAddr>()
            .context("invalid BIND address")?;

        let secret = lookup("JWT_SECRET_BASE64").context("JWT_SECRET_BASE64 missing")?;
        let secret_bytes = STANDARD
            .decode(secret.trim())
            .context("invalid JWT_SECRET_BASE64")?;
        if secret_bytes.len() < MIN_SECRET_BYTES {
            return Err(anyhow!(
                "JWT_SECRET_BASE64 must decode to at least {MIN_SECRET_BYTES} bytes"
            ));
        }

        let token_ttl_minutes = match lookup("TOKEN_TTL_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .with_context(|| format!("TOKEN_TTL_MINUTES must be a positive integer, got {raw:?}"))?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let policies_file = lookup("ROUTE_POLICIES_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind,
            auth: AuthConfig::new(secret_bytes, token_ttl_minutes),
            cors_allowed_origins,
            policies_file,
        })
    }
}
