use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub host: IpAddr,
    pub port: u16,
    /// Public URL of the web client; reset links point here.
    pub base_url: String,
    pub max_body_size: usize,
    pub log_level: String,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub enum MailConfig {
    Disabled,
    Smtp(SmtpConfig),
    Resend(ResendConfig),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub api_url: String,
    pub from: String,
}

const DEFAULT_FROM: &str = "TailTrack <noreply@tailtrack.app>";
const TOKEN_TTL_HOURS: std::ops::RangeInclusive<i64> = 1..=8760;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| format!("Missing required environment variable: {key}"))
        };
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 16 {
            return Err("JWT_SECRET must be at least 16 characters".to_string());
        }

        let db_max_connections: u32 = or("TAILTRACK_DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid TAILTRACK_DB_MAX_CONNECTIONS: {e}"))?;

        let token_ttl_hours: i64 = or("TAILTRACK_TOKEN_TTL_HOURS", "168")
            .parse()
            .map_err(|e| format!("Invalid TAILTRACK_TOKEN_TTL_HOURS: {e}"))?;
        if !TOKEN_TTL_HOURS.contains(&token_ttl_hours) {
            return Err(format!(
                "TAILTRACK_TOKEN_TTL_HOURS must be between {} and {}",
                TOKEN_TTL_HOURS.start(),
                TOKEN_TTL_HOURS.end()
            ));
        }

        let host: IpAddr = or("TAILTRACK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid TAILTRACK_HOST: {e}"))?;

        let port: u16 = or("TAILTRACK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid TAILTRACK_PORT: {e}"))?;

        let base_url = or("TAILTRACK_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let max_body_size: usize = or("TAILTRACK_MAX_BODY_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid TAILTRACK_MAX_BODY_SIZE: {e}"))?;

        let log_level = or("TAILTRACK_LOG_LEVEL", "info");

        let from = or("TAILTRACK_MAIL_FROM", DEFAULT_FROM);

        let smtp = match (
            lookup("TAILTRACK_SMTP_HOST"),
            lookup("TAILTRACK_SMTP_PORT"),
            lookup("TAILTRACK_SMTP_USER"),
            lookup("TAILTRACK_SMTP_PASS"),
        ) {
            (Some(host), Some(port), Some(user), Some(pass)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid TAILTRACK_SMTP_PORT: {e}"))?,
                user,
                pass,
                from: from.clone(),
            }),
            _ => None,
        };

        // Resend wins when both are configured.
        let mail = match (lookup("TAILTRACK_RESEND_API_KEY"), smtp) {
            (Some(api_key), _) => MailConfig::Resend(ResendConfig {
                api_key,
                api_url: or("TAILTRACK_RESEND_API_URL", "https://api.resend.com/emails"),
                from,
            }),
            (None, Some(smtp)) => MailConfig::Smtp(smtp),
            (None, None) => MailConfig::Disabled,
        };

        Ok(Config {
            database_url,
            db_max_connections,
            jwt_secret,
            token_ttl_hours,
            host,
            port,
            base_url,
            max_body_size,
            log_level,
            mail,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, String> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    const BASE: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/tailtrack"),
        ("JWT_SECRET", "a-secret-of-sufficient-length"),
    ];

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let config = config(&BASE).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_ttl_hours, 168);
        assert_eq!(config.base_url, "http://0.0.0.0:3000");
        assert!(matches!(config.mail, MailConfig::Disabled));
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = config(&[("JWT_SECRET", "a-secret-of-sufficient-length")]).unwrap_err();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let mut pairs = BASE.to_vec();
        pairs.push(("TAILTRACK_BASE_URL", "https://tailtrack.app/"));
        assert_eq!(config(&pairs).unwrap().base_url, "https://tailtrack.app");
    }

    #[test]
    fn resend_takes_precedence_over_smtp() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("TAILTRACK_SMTP_HOST", "smtp.example.com"),
            ("TAILTRACK_SMTP_PORT", "587"),
            ("TAILTRACK_SMTP_USER", "user"),
            ("TAILTRACK_SMTP_PASS", "pass"),
            ("TAILTRACK_RESEND_API_KEY", "re_123"),
        ]);
        assert!(matches!(config(&pairs).unwrap().mail, MailConfig::Resend(_)));
    }

    #[test]
    fn token_ttl_outside_one_hour_to_one_year_is_rejected() {
        for ttl in ["0", "-5", "8761", "9223372036854775807"] {
            let mut pairs = BASE.to_vec();
            pairs.push(("TAILTRACK_TOKEN_TTL_HOURS", ttl));
            assert!(config(&pairs).unwrap_err().contains("TAILTRACK_TOKEN_TTL_HOURS"));
        }
        let mut pairs = BASE.to_vec();
        pairs.push(("TAILTRACK_TOKEN_TTL_HOURS", "8760"));
        assert_eq!(config(&pairs).unwrap().token_ttl_hours, 8760);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut pairs = BASE.to_vec();
        pairs.push(("TAILTRACK_PORT", "eighty"));
        assert!(config(&pairs).unwrap_err().contains("TAILTRACK_PORT"));
    }
}
