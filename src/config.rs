use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

/// Rejection text the master registry uses when a write-back carries no photo.
pub const DEFAULT_EMPTY_PHOTO_MESSAGE: &str = "photo field is required";

/// Location and timeout of one registry port.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendEndpoint {
    pub url: String,
    pub timeout_secs: u64,
}

impl BackendEndpoint {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub legal_entity: BackendEndpoint,
    pub master_registry: BackendEndpoint,
    pub fallback_registry: BackendEndpoint,
    pub write_back: BackendEndpoint,
    /// Write-back failures whose message contains this text are absorbed.
    pub write_back_empty_photo_message: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            legal_entity: endpoint_from_env("LEGAL_ENTITY", 30)?,
            master_registry: endpoint_from_env("MASTER_REGISTRY", 30)?,
            fallback_registry: endpoint_from_env("FALLBACK_REGISTRY", 60)?,
            write_back: endpoint_from_env("WRITE_BACK", 30)?,
            write_back_empty_photo_message: std::env::var("WRITE_BACK_EMPTY_PHOTO_MESSAGE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EMPTY_PHOTO_MESSAGE.to_string()),
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Legal entity URL: {}", config.legal_entity.url);
        tracing::debug!("Master registry URL: {}", config.master_registry.url);
        tracing::debug!("Fallback registry URL: {}", config.fallback_registry.url);
        tracing::debug!("Write-back URL: {}", config.write_back.url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Reads `{PREFIX}_URL` (required) and `{PREFIX}_TIMEOUT_SECS` (optional).
fn endpoint_from_env(prefix: &str, default_timeout_secs: u64) -> anyhow::Result<BackendEndpoint> {
    let url_var = format!("{}_URL", prefix);
    let timeout_var = format!("{}_TIMEOUT_SECS", prefix);

    let url = std::env::var(&url_var)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", url_var))?;
    let url = validate_url(&url_var, url)?;

    let timeout_secs = match std::env::var(&timeout_var) {
        Ok(raw) => parse_timeout(&timeout_var, &raw)?,
        Err(_) => default_timeout_secs,
    };

    Ok(BackendEndpoint { url, timeout_secs })
}

fn validate_url(name: &str, url: String) -> anyhow::Result<String> {
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    let url = url.trim().to_string();
    let parsed = url::Url::parse(&url).with_context(|| format!("{} is not a valid URL", name))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url)
}

fn parse_timeout(name: &str, raw: &str) -> anyhow::Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds", name))?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", name);
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("X_URL", "https://registry.local".into()).is_ok());
        assert!(validate_url("X_URL", "  ".into()).is_err());
        assert!(validate_url("X_URL", "ftp://registry.local".into()).is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("X", "15").unwrap(), 15);
        assert!(parse_timeout("X", "0").is_err());
        assert!(parse_timeout("X", "soon").is_err());
    }

    #[test]
    fn test_endpoint_timeout() {
        let endpoint = BackendEndpoint::new("http://localhost", 5);
        assert_eq!(endpoint.timeout(), Duration::from_secs(5));
    }
}
