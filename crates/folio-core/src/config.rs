//! Configuration types for the folio system
//!
//! Every component receives its configuration explicitly at construction.
//! Nothing here is read from process-wide state; the `folioctl` binary is
//! the only place that looks at environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Production endpoint of the Namecheap XML API
pub const NAMECHEAP_API_URL: &str = "https://api.namecheap.com/xml.response";

/// Sandbox endpoint of the Namecheap XML API
pub const NAMECHEAP_SANDBOX_API_URL: &str = "https://api.sandbox.namecheap.com/xml.response";

/// Main folio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioConfig {
    /// Directory holding one sub-directory per domain
    pub workspace_root: PathBuf,

    /// DNS provider credentials; `None` disables pull/push
    #[serde(default)]
    pub provider: Option<ProviderConfig>,

    /// Synchronizer and HTTP settings
    #[serde(default)]
    pub sync: SyncConfig,
}

impl FolioConfig {
    /// Create a configuration rooted at `workspace_root` with no provider
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            provider: None,
            sync: SyncConfig::default(),
        }
    }

    /// Attach provider credentials
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the sync settings
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.workspace_root.as_os_str().is_empty() {
            return Err(crate::Error::config("Workspace root cannot be empty"));
        }

        if let Some(provider) = &self.provider {
            provider.validate()?;
        }

        self.sync.validate()
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Namecheap XML API
    Namecheap {
        /// API user
        api_user: String,
        /// API key
        /// ⚠️ NEVER log this value
        api_key: String,
        /// Account user name
        username: String,
        /// Whitelisted client IP
        client_ip: String,
        /// Use the sandbox endpoint
        #[serde(default)]
        sandbox: bool,
        /// Endpoint override (tests, proxies)
        #[serde(default)]
        endpoint: Option<String>,
    },
}

impl ProviderConfig {
    /// Convenience constructor for production Namecheap credentials
    pub fn namecheap(
        api_user: impl Into<String>,
        api_key: impl Into<String>,
        username: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        ProviderConfig::Namecheap {
            api_user: api_user.into(),
            api_key: api_key.into(),
            username: username.into(),
            client_ip: client_ip.into(),
            sandbox: false,
            endpoint: None,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Namecheap {
                api_user,
                api_key,
                username,
                client_ip,
                endpoint,
                ..
            } => {
                for (name, value) in [
                    ("api_user", api_user),
                    ("api_key", api_key),
                    ("username", username),
                    ("client_ip", client_ip),
                ] {
                    if value.trim().is_empty() {
                        return Err(crate::Error::config(format!(
                            "Namecheap {} cannot be empty",
                            name
                        )));
                    }
                }

                if client_ip.parse::<std::net::IpAddr>().is_err() {
                    return Err(crate::Error::config(format!(
                        "Namecheap client_ip is not an IP address: {}",
                        client_ip
                    )));
                }

                if let Some(url) = endpoint
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Namecheap endpoint must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }

                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::Namecheap { .. } => "namecheap",
        }
    }

    /// Endpoint the client should talk to
    pub fn endpoint(&self) -> &str {
        match self {
            ProviderConfig::Namecheap {
                endpoint: Some(url),
                ..
            } => url,
            ProviderConfig::Namecheap { sandbox: true, .. } => NAMECHEAP_SANDBOX_API_URL,
            ProviderConfig::Namecheap { .. } => NAMECHEAP_API_URL,
        }
    }
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Namecheap {
                api_user,
                username,
                client_ip,
                sandbox,
                endpoint,
                ..
            } => f
                .debug_struct("Namecheap")
                .field("api_user", api_user)
                .field("api_key", &"<REDACTED>")
                .field("username", username)
                .field("client_ip", client_ip)
                .field("sandbox", sandbox)
                .field("endpoint", endpoint)
                .finish(),
        }
    }
}

/// Synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Retry attempts for transient (network) provider failures
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between retry attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Timeout applied to every provider HTTP request (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Validate the sync configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_retries > 10 {
            return Err(crate::Error::config(format!(
                "max_retries must be between 0 and 10. Got: {}",
                self.max_retries
            )));
        }
        if self.retry_delay_secs > 300 {
            return Err(crate::Error::config(format!(
                "retry_delay_secs must be at most 300. Got: {}",
                self.retry_delay_secs
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(crate::Error::config("http_timeout_secs must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_selection() {
        let live = ProviderConfig::namecheap("user", "key", "user", "198.51.100.7");
        assert_eq!(live.endpoint(), NAMECHEAP_API_URL);

        let sandbox = ProviderConfig::Namecheap {
            api_user: "user".to_string(),
            api_key: "key".to_string(),
            username: "user".to_string(),
            client_ip: "198.51.100.7".to_string(),
            sandbox: true,
            endpoint: None,
        };
        assert_eq!(sandbox.endpoint(), NAMECHEAP_SANDBOX_API_URL);

        let overridden = ProviderConfig::Namecheap {
            api_user: "user".to_string(),
            api_key: "key".to_string(),
            username: "user".to_string(),
            client_ip: "198.51.100.7".to_string(),
            sandbox: true,
            endpoint: Some("http://127.0.0.1:9999/xml.response".to_string()),
        };
        assert_eq!(overridden.endpoint(), "http://127.0.0.1:9999/xml.response");
    }

    #[test]
    fn test_provider_validation() {
        assert!(
            ProviderConfig::namecheap("user", "key", "user", "198.51.100.7")
                .validate()
                .is_ok()
        );
        assert!(
            ProviderConfig::namecheap("user", "", "user", "198.51.100.7")
                .validate()
                .is_err()
        );
        assert!(
            ProviderConfig::namecheap("user", "key", "user", "not-an-ip")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let config = ProviderConfig::namecheap("user", "secret_key_12345", "user", "198.51.100.7");
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_sync_defaults_are_valid() {
        let config = FolioConfig::new("/srv/sites");
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.http_timeout_secs, 30);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: FolioConfig = serde_json::from_value(serde_json::json!({
            "workspace_root": "/srv/sites",
            "provider": {
                "type": "namecheap",
                "api_user": "user",
                "api_key": "key",
                "username": "user",
                "client_ip": "198.51.100.7"
            }
        }))
        .unwrap();

        assert_eq!(config.sync.max_retries, 2);
        assert_eq!(config.provider.unwrap().type_name(), "namecheap");
    }
}
