use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub ai_gateway_url: String,
    pub ai_api_key: String,
    pub ai_model: String,
    pub resend_base_url: String,
    pub resend_api_key: String,
    pub email_from: String,
    pub public_site_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            ai_gateway_url: std::env::var("AI_GATEWAY_URL")
                .unwrap_or_else(|_| "https://ai.gateway.lovable.dev".to_string())
                .trim_end_matches('/')
                .to_string(),
            ai_api_key: std::env::var("AI_API_KEY")
                .or_else(|_| std::env::var("LOVABLE_API_KEY"))
                .map_err(|_| {
                    anyhow::anyhow!("AI_API_KEY or LOVABLE_API_KEY environment variable required")
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("AI_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            ai_model: std::env::var("AI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "google/gemini-2.5-flash".to_string()),
            resend_base_url: std::env::var("RESEND_BASE_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            resend_api_key: std::env::var("RESEND_API_KEY")
                .map_err(|_| anyhow::anyhow!("RESEND_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("RESEND_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            email_from: std::env::var("EMAIL_FROM")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "MerchBase <onboarding@resend.dev>".to_string()),
            public_site_url: std::env::var("PUBLIC_SITE_URL")
                .map_err(|_| anyhow::anyhow!("PUBLIC_SITE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("PUBLIC_SITE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("PUBLIC_SITE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("AI gateway: {} (model {})", config.ai_gateway_url, config.ai_model);
        tracing::debug!("Resend base URL: {}", config.resend_base_url);
        tracing::debug!("Public site URL: {}", config.public_site_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
