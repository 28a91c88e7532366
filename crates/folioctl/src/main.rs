// # folioctl - Domain Workspace CLI
//
// This binary is a THIN integration layer. Domain, record and sync logic
// lives in folio-core; the Namecheap client lives in folio-provider-namecheap.
//
// The folioctl binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the repository, provider and synchronizer together
// 4. Running one command and mapping the outcome to an exit code
//
// ## Commands
//
// - `folioctl create <domain>`: provision a domain workspace
// - `folioctl delete <domain>`: remove a domain workspace
// - `folioctl list`: list provisioned domains
// - `folioctl pull <domain>`: replace local DNS records with the provider's
// - `folioctl push <domain>`: replace the provider's DNS records with local ones
// - `folioctl domains`: list domains registered at the provider
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Workspace
// - `FOLIO_WORKSPACE_ROOT`: Directory holding one sub-directory per domain (default `.`)
//
// ### DNS Provider (optional; required by pull, push and domains)
// - `NAMECHEAP_API_USER`: API user
// - `NAMECHEAP_API_KEY`: API key
// - `NAMECHEAP_USERNAME`: Account user name (defaults to the API user)
// - `NAMECHEAP_CLIENT_IP`: Whitelisted client IP
// - `NAMECHEAP_SANDBOX`: `true` to use the sandbox endpoint
//
// ### Synchronizer
// - `FOLIO_MAX_RETRIES`: Retry attempts for network failures (0-10)
// - `FOLIO_RETRY_DELAY_SECS`: Delay between retries
// - `FOLIO_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export FOLIO_WORKSPACE_ROOT=/srv/sites
// export NAMECHEAP_API_USER=acme
// export NAMECHEAP_API_KEY=your_key
// export NAMECHEAP_CLIENT_IP=198.51.100.7
//
// folioctl create example.com
// folioctl pull example.com
// ```

use anyhow::{Context, Result};
use folio_core::{
    DnsProvider, DomainRepository, Error as FolioError, FolioConfig, ProviderConfig, SyncConfig,
    Synchronizer,
};
use folio_provider_namecheap::NamecheapClient;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Command succeeded
/// - 1: Configuration or usage error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolioExitCode {
    /// Command succeeded
    Success = 0,
    /// Configuration error, usage error or missing provider
    ConfigError = 1,
    /// Runtime error (I/O, provider, network)
    RuntimeError = 2,
}

impl From<FolioExitCode> for ExitCode {
    fn from(code: FolioExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

const USAGE: &str = "Usage: folioctl <create|delete|pull|push> <domain>\n       folioctl <list|domains>";

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Create(String),
    Delete(String),
    List,
    Pull(String),
    Push(String),
    Domains,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let domain = || {
            args.get(1)
                .cloned()
                .with_context(|| format!("'{}' needs a domain argument\n{}", args[0], USAGE))
        };

        match args.first().map(String::as_str) {
            Some("create") => Ok(Command::Create(domain()?)),
            Some("delete") => Ok(Command::Delete(domain()?)),
            Some("list") => Ok(Command::List),
            Some("pull") => Ok(Command::Pull(domain()?)),
            Some("push") => Ok(Command::Push(domain()?)),
            Some("domains") => Ok(Command::Domains),
            Some(other) => anyhow::bail!("Unknown command '{}'\n{}", other, USAGE),
            None => anyhow::bail!("{}", USAGE),
        }
    }

    fn needs_provider(&self) -> bool {
        matches!(self, Command::Pull(_) | Command::Push(_) | Command::Domains)
    }
}

/// Application configuration
struct Config {
    workspace_root: PathBuf,
    api_user: Option<String>,
    api_key: Option<String>,
    username: Option<String>,
    client_ip: Option<String>,
    sandbox: bool,
    max_retries: Option<usize>,
    retry_delay_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            workspace_root: env::var("FOLIO_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            api_user: non_empty_var("NAMECHEAP_API_USER"),
            api_key: non_empty_var("NAMECHEAP_API_KEY"),
            username: non_empty_var("NAMECHEAP_USERNAME"),
            client_ip: non_empty_var("NAMECHEAP_CLIENT_IP"),
            sandbox: env::var("NAMECHEAP_SANDBOX")
                .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            max_retries: parse_var("FOLIO_MAX_RETRIES")?,
            retry_delay_secs: parse_var("FOLIO_RETRY_DELAY_SECS")?,
            log_level: env::var("FOLIO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "FOLIO_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        // Partial credentials are a mistake, not "no provider"
        let set = [&self.api_user, &self.api_key, &self.client_ip]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if set != 0 && set != 3 {
            anyhow::bail!(
                "Namecheap credentials are incomplete. \
                Set NAMECHEAP_API_USER, NAMECHEAP_API_KEY and NAMECHEAP_CLIENT_IP together"
            );
        }

        self.folio_config().validate()?;
        Ok(())
    }

    /// Library configuration
    fn folio_config(&self) -> FolioConfig {
        let defaults = SyncConfig::default();
        let sync = SyncConfig {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay_secs: self.retry_delay_secs.unwrap_or(defaults.retry_delay_secs),
            ..defaults
        };

        let config = FolioConfig::new(&self.workspace_root).with_sync(sync);
        match (&self.api_user, &self.api_key, &self.client_ip) {
            (Some(api_user), Some(api_key), Some(client_ip)) => {
                config.with_provider(ProviderConfig::Namecheap {
                    api_user: api_user.clone(),
                    api_key: api_key.clone(),
                    username: self.username.clone().unwrap_or_else(|| api_user.clone()),
                    client_ip: client_ip.clone(),
                    sandbox: self.sandbox,
                    endpoint: None,
                })
            }
            _ => config,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} is not valid ({}). Got: {}", name, e, value)),
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return FolioExitCode::ConfigError.into();
        }
    };

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return FolioExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return FolioExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FolioExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FolioExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(command, config.folio_config()).await {
            Ok(()) => FolioExitCode::Success,
            Err(e) => {
                error!("{}", e);
                exit_code_for(&e)
            }
        }
    })
    .into()
}

/// Map a failed command to its exit code
fn exit_code_for(error: &anyhow::Error) -> FolioExitCode {
    match error.downcast_ref::<FolioError>() {
        Some(
            FolioError::NotConfigured(_)
            | FolioError::Config(_)
            | FolioError::InvalidCredentials { .. },
        ) => FolioExitCode::ConfigError,
        _ => FolioExitCode::RuntimeError,
    }
}

/// Run one command
async fn run(command: Command, config: FolioConfig) -> Result<()> {
    let repo = Arc::new(DomainRepository::from_config(&config));
    debug!("Workspace root: {}", repo.root().display());

    let client = match (&config.provider, command.needs_provider()) {
        (Some(provider), true) => Some(Arc::new(NamecheapClient::from_config(
            provider,
            &config.sync,
        )?)),
        _ => None,
    };

    match command {
        Command::Create(domain) => {
            let path = repo.create_domain(&domain).await?;
            println!("Created {}", path.display());
        }
        Command::Delete(domain) => {
            repo.delete_domain(&domain).await?;
            println!("Deleted {}", domain);
        }
        Command::List => {
            for domain in repo.list_domains().await? {
                println!("{}", domain);
            }
        }
        Command::Pull(domain) => {
            let provider = client.map(|c| c as Arc<dyn DnsProvider>);
            let (sync, mut events) = Synchronizer::new(repo, provider, &config.sync)?;
            let result = sync.pull(&domain).await;
            drain_events(&mut events);
            println!("Pulled {} DNS records for {}", result?, domain);
        }
        Command::Push(domain) => {
            let provider = client.map(|c| c as Arc<dyn DnsProvider>);
            let (sync, mut events) = Synchronizer::new(repo, provider, &config.sync)?;
            let result = sync.push(&domain).await;
            drain_events(&mut events);
            let report = result?;
            println!(
                "Pushed {} DNS records for {} ({} other provider hosts kept)",
                report.records, domain, report.preserved
            );
        }
        Command::Domains => {
            let client = client.ok_or_else(|| {
                FolioError::not_configured(
                    "Namecheap credentials are not set; export NAMECHEAP_API_USER, \
                     NAMECHEAP_API_KEY and NAMECHEAP_CLIENT_IP",
                )
            })?;
            for domain in client.get_domains().await? {
                println!(
                    "{}\texpires {}\t{}",
                    domain.name,
                    domain.expires,
                    if domain.is_locked { "locked" } else { "unlocked" }
                );
            }
        }
    }

    info!("Done");
    Ok(())
}

/// Log the sync events of a finished command
fn drain_events(events: &mut tokio::sync::mpsc::Receiver<folio_core::SyncEvent>) {
    while let Ok(event) = events.try_recv() {
        debug!("Sync event: {:?}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(&args(&["create", "example.com"])).unwrap(),
            Command::Create("example.com".to_string())
        );
        assert_eq!(Command::parse(&args(&["list"])).unwrap(), Command::List);
        assert_eq!(Command::parse(&args(&["domains"])).unwrap(), Command::Domains);
        assert!(Command::parse(&args(&["pull"])).is_err());
        assert!(Command::parse(&args(&["sync", "example.com"])).is_err());
        assert!(Command::parse(&[]).is_err());
    }

    #[test]
    fn test_provider_errors_map_to_exit_codes() {
        let not_configured = anyhow::Error::from(FolioError::not_configured("no provider"));
        assert_eq!(exit_code_for(&not_configured), FolioExitCode::ConfigError);

        let network = anyhow::Error::from(FolioError::network("timeout"));
        assert_eq!(exit_code_for(&network), FolioExitCode::RuntimeError);
    }

    #[test]
    fn test_partial_credentials_are_rejected() {
        let config = Config {
            workspace_root: PathBuf::from("/srv/sites"),
            api_user: Some("acme".to_string()),
            api_key: None,
            username: None,
            client_ip: None,
            sandbox: false,
            max_retries: None,
            retry_delay_secs: None,
            log_level: "info".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
