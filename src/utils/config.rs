use std::time::Duration;

/// Runtime configuration, collected from the environment once at startup.
///
/// `.env` files are honored via `dotenv` in `main`. Only `DATABASE_URL`,
/// `JWT_MONEROPAY_SECRET` and `LWS_HOOK_TOKEN` are mandatory; everything else
/// has a sane default.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub moneropay_url: String,
    /// HMAC secret for the MoneroPay callback JWT.
    pub jwt_moneropay_secret: String,
    /// Shared secret expected on the LWS wallet hook.
    pub lws_hook_token: String,
    pub sweep_interval: Duration,
    pub pending_retention: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = require("DATABASE_URL")?;
        let jwt_moneropay_secret = require("JWT_MONEROPAY_SECRET")?;
        let lws_hook_token = require("LWS_HOOK_TOKEN")?;

        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let moneropay_url = std::env::var("MONEROPAY_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());
        let sweep_interval = Duration::from_secs(parse_or("SWEEP_INTERVAL_SECS", 30)?);
        let pending_retention =
            Duration::from_secs(parse_or("PENDING_RETENTION_HOURS", 24)? * 3600);

        Ok(Self {
            database_url,
            bind_addr,
            moneropay_url,
            jwt_moneropay_secret,
            lws_hook_token,
            sweep_interval,
            pending_retention,
        })
    }
}

fn require(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("{} not set", key))
}

fn parse_or(key: &str, default: u64) -> Result<u64, String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("{} must be a positive integer, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default_when_unset() {
        std::env::remove_var("MONEROPOS_TEST_UNSET");
        assert_eq!(parse_or("MONEROPOS_TEST_UNSET", 30).unwrap(), 30);
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        std::env::set_var("MONEROPOS_TEST_GARBAGE", "soon");
        assert!(parse_or("MONEROPOS_TEST_GARBAGE", 30).is_err());
        std::env::remove_var("MONEROPOS_TEST_GARBAGE");
    }
}
