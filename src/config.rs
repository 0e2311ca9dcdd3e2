use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Bounded timeout for the lead-source webhook fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// How long a tenant's ingested lead collection stays cached.
    pub leads_cache_ttl_secs: u64,
    /// Session lifetime. The original front end used 24 hours.
    pub session_ttl_secs: u64,
    /// Break-glass admin login, checked before the `user_profiles` table.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FETCH_TIMEOUT_SECS must be a positive number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("FETCH_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(secs)
                })?,
            leads_cache_ttl_secs: std::env::var("LEADS_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LEADS_CACHE_TTL_SECS must be a positive number"))?,
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SESSION_TTL_SECS must be a positive number"))?,
            admin_email: std::env::var("ADMIN_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Lead source fetch timeout: {}s", config.fetch_timeout_secs);
        tracing::debug!("Leads cache TTL: {}s", config.leads_cache_ttl_secs);
        tracing::debug!("Session TTL: {}s", config.session_ttl_secs);
        if config.admin_email.is_some() {
            tracing::info!("Bootstrap admin account configured");
        }

        Ok(config)
    }
}
