
/// Default location of the shipped churn model.
pub const DEFAULT_MODEL_PATH: &str = "models/telco_churn_logreg_tuned.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub model_path: String,
    /// Expected SHA-256 of the model artifact; unchecked when absent.
    pub model_sha256: Option<String>,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            model_sha256: None,
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or(defaults.model_path)
                .trim()
                .to_string(),
            model_sha256: std::env::var("MODEL_SHA256")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|digest| {
                    let digest = digest.trim().to_ascii_lowercase();
                    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                        anyhow::bail!("MODEL_SHA256 must be 64 hexadecimal characters");
                    }
                    Ok(digest)
                })
                .transpose()?,
            rate_limit_per_second: std::env::var("RATE_LIMIT_PER_SECOND")
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a positive integer"))?
                .unwrap_or(defaults.rate_limit_per_second),
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .ok()
                .map(|v| v.parse::<u32>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a positive integer"))?
                .unwrap_or(defaults.rate_limit_burst),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .map(|v| v.parse::<usize>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a positive integer"))?
                .unwrap_or(defaults.max_body_bytes),
        };

        if config.model_path.is_empty() {
            anyhow::bail!("MODEL_PATH cannot be empty");
        }
        if config.rate_limit_per_second == 0 || config.rate_limit_burst == 0 {
            anyhow::bail!("RATE_LIMIT_PER_SECOND and RATE_LIMIT_BURST must be greater than zero");
        }
        if config.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be greater than zero");
        }

        tracing::debug!("Model path: {}", config.model_path);
        if config.model_sha256.is_some() {
            tracing::info!("Model checksum pinning enabled");
        }
        tracing::debug!(
            "Rate limit: {}/s, burst {}",
            config.rate_limit_per_second,
            config.rate_limit_burst
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
