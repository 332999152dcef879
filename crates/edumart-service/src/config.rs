//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Fallback certificate signing secret for local development.
pub const DEV_CERTIFICATE_SECRET: &str = "dev-certificate-secret";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/edumart").
    pub data_dir: String,

    /// Shared key the identity gateway sends in `x-gateway-key`.
    /// When unset, the header is not checked.
    pub gateway_key: Option<String>,

    /// HMAC secret for certificate signatures.
    pub certificate_secret: String,

    /// Commission used until an admin stores a platform setting.
    pub default_commission_percent: u8,

    /// Emails that are registered with the admin role.
    pub admin_emails: Vec<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Secrets file structure.
#[derive(Debug, Default, Deserialize)]
struct EdumartSecrets {
    #[serde(default)]
    gateway_key: Option<String>,
    #[serde(default)]
    certificate_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the secrets file.
    #[must_use]
    pub fn from_env() -> Self {
        let secrets = load_secrets();

        let gateway_key = secrets
            .gateway_key
            .or_else(|| std::env::var("GATEWAY_KEY").ok())
            .filter(|k| !k.is_empty());

        let certificate_secret = secrets
            .certificate_secret
            .or_else(|| std::env::var("CERTIFICATE_SECRET").ok())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("CERTIFICATE_SECRET not set - using development secret");
                DEV_CERTIFICATE_SECRET.into()
            });

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/edumart".into()),
            gateway_key,
            certificate_secret,
            default_commission_percent: std::env::var("DEFAULT_COMMISSION_PERCENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|pct| *pct <= 100)
                .unwrap_or(20),
            admin_emails: parse_emails(&std::env::var("ADMIN_EMAILS").unwrap_or_default()),
            cors_origins: parse_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()),
            ),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ServiceConfig {
    /// Whether an email is on the admin bootstrap list.
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e.eq_ignore_ascii_case(email))
    }
}

/// Load secrets from the first secrets file found.
fn load_secrets() -> EdumartSecrets {
    let secret_paths = [
        ".secrets/edumart.json",
        "edumart/.secrets/edumart.json",
        "../.secrets/edumart.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<EdumartSecrets>(path) {
            tracing::info!(path = %path, "Loaded secrets from file");
            return secrets;
        }
    }

    tracing::debug!("Secrets file not found, using environment variables");
    EdumartSecrets::default()
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/edumart".into(),
            gateway_key: None,
            certificate_secret: DEV_CERTIFICATE_SECRET.into(),
            default_commission_percent: 20,
            admin_emails: Vec::new(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example ,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn admin_emails_match_case_insensitively() {
        let config = ServiceConfig {
            admin_emails: parse_emails(" Root@Example.com ,"),
            ..ServiceConfig::default()
        };
        assert!(config.is_admin_email("root@example.COM"));
        assert!(!config.is_admin_email("other@example.com"));
    }

    #[test]
    fn secrets_fields_are_optional() {
        let secrets: EdumartSecrets = serde_json::from_str(r#"{"gateway_key":"k"}"#).unwrap();
        assert_eq!(secrets.gateway_key.as_deref(), Some("k"));
        assert!(secrets.certificate_secret.is_none());
    }

    #[test]
    fn missing_secrets_file_is_not_found() {
        let err = load_secrets_file::<EdumartSecrets>("does/not/exist.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.default_commission_percent, 20);
        assert!(config.gateway_key.is_none());
    }
}
