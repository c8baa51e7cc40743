use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_IDLE_PER_HOST: usize = 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub secret: Secret<String>,
    pub timeout: Duration,
    pub insecure: bool,
    pub max_idle_per_host: usize,
    pub user_agent: String,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ClientConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClientConfig", 6)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("secret", "[REDACTED]")?;
        state.serialize_field("timeout_ms", &(self.timeout.as_millis() as u64))?;
        state.serialize_field("insecure", &self.insecure)?;
        state.serialize_field("max_idle_per_host", &self.max_idle_per_host)?;
        state.serialize_field("user_agent", &self.user_agent)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClientConfigHelper {
            base_url: String,
            #[serde(default)]
            secret: String,
            timeout_ms: Option<u64>,
            #[serde(default)]
            insecure: bool,
            max_idle_per_host: Option<usize>,
            user_agent: Option<String>,
        }

        let helper = ClientConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            base_url: helper.base_url,
            secret: Secret::new(helper.secret),
            timeout: helper
                .timeout_ms
                .map_or(DEFAULT_TIMEOUT, Duration::from_millis),
            insecure: helper.insecure,
            max_idle_per_host: helper
                .max_idle_per_host
                .unwrap_or(DEFAULT_MAX_IDLE_PER_HOST),
            user_agent: helper.user_agent.unwrap_or_else(default_user_agent),
        })
    }
}

fn default_user_agent() -> String {
    format!("centrix/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create a configuration for a client that signs every API request
    #[must_use]
    pub fn new(base_url: String, secret: String) -> Self {
        Self {
            base_url,
            secret: Secret::new(secret),
            timeout: DEFAULT_TIMEOUT,
            insecure: false,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            user_agent: default_user_agent(),
        }
    }

    /// Create a configuration for a client that never signs API requests.
    ///
    /// Only useful when the server's `/api/` endpoint is protected at the
    /// network level (firewall, private network).
    #[must_use]
    pub fn insecure(base_url: String) -> Self {
        Self {
            insecure: true,
            ..Self::new(base_url, String::new())
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_URL` (e.g., `CENTRIX_URL`)
    /// - `{PREFIX}_SECRET` (required unless insecure)
    /// - `{PREFIX}_INSECURE` (optional, defaults to false)
    /// - `{PREFIX}_TIMEOUT_MS` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let url_var = format!("{}_URL", prefix);
        let secret_var = format!("{}_SECRET", prefix);
        let insecure_var = format!("{}_INSECURE", prefix);
        let timeout_var = format!("{}_TIMEOUT_MS", prefix);

        let base_url =
            env::var(&url_var).map_err(|_| ConfigError::MissingEnvironmentVariable(url_var))?;

        let insecure = env::var(&insecure_var)
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let mut config = if insecure {
            Self::insecure(base_url)
        } else {
            let secret = env::var(&secret_var)
                .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_var))?;
            Self::new(base_url, secret)
        };

        if let Ok(raw) = env::var(&timeout_var) {
            let millis = raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidConfiguration(format!("{}='{}': {}", timeout_var, raw, e))
            })?;
            config.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Create configuration from .env file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific .env file path
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // .env file doesn't exist, fall back to system env vars
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    #[must_use]
    pub const fn with_max_idle_per_host(mut self, max_idle_per_host: usize) -> Self {
        self.max_idle_per_host = max_idle_per_host;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Full API endpoint: trailing slashes trimmed, `/api` appended when
    /// missing, and a single trailing slash.
    pub fn api_endpoint(&self) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.ends_with("/api") {
            format!("{}/", trimmed)
        } else {
            format!("{}/api/", trimmed)
        }
    }

    /// Whether requests built from this configuration carry a signature
    pub fn signs_requests(&self) -> bool {
        !self.insecure
    }

    /// Get the shared secret (use carefully - exposes secret)
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidConfiguration(
                "base URL must not be empty".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidConfiguration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if !self.insecure && self.secret().is_empty() {
            return Err(ConfigError::InvalidConfiguration(
                "secret is required unless the client is insecure".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
