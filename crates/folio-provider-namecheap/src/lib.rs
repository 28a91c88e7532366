// # Namecheap DNS Provider
//
// This crate provides the Namecheap XML API client for folio.
//
// ## Behaviour
//
// - One HTTP request per call; retries are owned by the `Synchronizer`
// - HTTP timeout taken from `SyncConfig::http_timeout_secs`
// - Transport failures and non-2xx statuses map to `Error::Network`
// - Unparseable bodies map to `Error::Protocol`
// - `Status="ERROR"` responses map to `Error::Provider`; code 1011102 maps to
//   `Error::InvalidCredentials`
//
// ## Security Requirements
//
// - The API key NEVER appears in logs, `Debug` output or error messages
// - Request URLs carry the key as a query parameter, so transport errors are
//   stripped of their URL before being surfaced
//
// ## API Reference
//
// - Endpoint: GET `https://api.namecheap.com/xml.response?Command=...`
// - `namecheap.domains.dns.getHosts` (SLD, TLD)
// - `namecheap.domains.dns.setHosts` (SLD, TLD, HostName1..N, RecordType1..N,
//   Address1..N, TTL1..N, MXPref1..N). Replaces the whole host list.
// - `namecheap.domains.dns.setDefault` (SLD, TLD)
// - `namecheap.domains.getList` (Page, PageSize)

pub mod xml;

use async_trait::async_trait;
use chrono::NaiveDate;
use folio_core::config::{ProviderConfig, SyncConfig};
use folio_core::domain_name;
use folio_core::model::{DEFAULT_TTL, DomainInfo, HostEntry, HostRecord};
use folio_core::traits::DnsProvider;
use folio_core::{Error, Result};
use std::time::Duration;

use crate::xml::Element;

/// Provider name used in errors and logs
const PROVIDER: &str = "namecheap";

/// Error number Namecheap returns for a bad key or disabled API access
pub const INVALID_API_KEY_CODE: u32 = 1011102;

/// Domains requested per `getList` page (API maximum)
const DOMAIN_PAGE_SIZE: usize = 100;

/// Namecheap XML API client
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct NamecheapClient {
    /// API user
    api_user: String,

    /// API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Account user name
    username: String,

    /// Whitelisted client IP
    client_ip: String,

    /// XML API endpoint
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for NamecheapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamecheapClient")
            .field("api_user", &self.api_user)
            .field("api_key", &"<REDACTED>")
            .field("username", &self.username)
            .field("client_ip", &self.client_ip)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl NamecheapClient {
    /// Create a client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: XML API URL, see [`folio_core::config::NAMECHEAP_API_URL`]
    /// - `timeout`: applied to every request
    pub fn new(
        api_user: impl Into<String>,
        api_key: impl Into<String>,
        username: impl Into<String>,
        client_ip: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("Namecheap API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_user: api_user.into(),
            api_key,
            username: username.into(),
            client_ip: client_ip.into(),
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Create a client from validated configuration
    pub fn from_config(provider: &ProviderConfig, sync: &SyncConfig) -> Result<Self> {
        provider.validate()?;
        sync.validate()?;

        let ProviderConfig::Namecheap {
            api_user,
            api_key,
            username,
            client_ip,
            sandbox,
            ..
        } = provider;

        tracing::info!(
            "Initialized Namecheap client ({})",
            if *sandbox { "sandbox" } else { "production" }
        );

        Self::new(
            api_user.as_str(),
            api_key.as_str(),
            username.as_str(),
            client_ip.as_str(),
            provider.endpoint(),
            Duration::from_secs(sync.http_timeout_secs),
        )
    }

    /// XML API endpoint in use
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// All host records of `domain`
    pub async fn get_dns_records(&self, domain: &str) -> Result<Vec<HostRecord>> {
        let root = self
            .request("namecheap.domains.dns.getHosts", domain_params(domain)?)
            .await?;

        let hosts = root
            .find_all("host")
            .into_iter()
            .map(parse_host)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Fetched {} hosts for {}", hosts.len(), domain);
        Ok(hosts)
    }

    /// Replace the complete host list of `domain`
    pub async fn set_hosts(&self, domain: &str, hosts: &[HostEntry]) -> Result<()> {
        let mut params = domain_params(domain)?;
        params.extend(host_params(hosts));

        let root = self
            .request("namecheap.domains.dns.setHosts", params)
            .await?;
        expect_flag(&root, "DomainDNSSetHostsResult", "IsSuccess", domain)?;

        tracing::info!("Set {} hosts for {}", hosts.len(), domain);
        Ok(())
    }

    /// Point `domain` back at Namecheap's default DNS servers
    pub async fn set_default_dns(&self, domain: &str) -> Result<()> {
        let root = self
            .request("namecheap.domains.dns.setDefault", domain_params(domain)?)
            .await?;
        expect_flag(&root, "DomainDNSSetDefaultResult", "Updated", domain)?;

        tracing::info!("Switched {} to default DNS", domain);
        Ok(())
    }

    /// Domains registered in the account, across all result pages
    pub async fn get_domains(&self) -> Result<Vec<DomainInfo>> {
        let mut domains = Vec::new();
        let mut page = 1;

        loop {
            let params = vec![
                ("Page".to_string(), page.to_string()),
                ("PageSize".to_string(), DOMAIN_PAGE_SIZE.to_string()),
            ];
            let root = self.request("namecheap.domains.getList", params).await?;

            let list = root
                .find("DomainGetListResult")
                .or_else(|| root.find("DomainDNSGetListResult"));
            let batch = match list {
                Some(list) => list
                    .find_all("Domain")
                    .into_iter()
                    .map(parse_domain)
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };

            let fetched = batch.len();
            domains.extend(batch);

            let total = root
                .find("TotalItems")
                .and_then(|e| e.text.trim().parse::<usize>().ok())
                .unwrap_or(domains.len());
            if fetched == 0 || domains.len() >= total {
                break;
            }
            page += 1;
        }

        tracing::debug!("Fetched {} domains", domains.len());
        Ok(domains)
    }

    /// Perform one API call and return the parsed `ApiResponse` element
    async fn request(&self, command: &str, params: Vec<(String, String)>) -> Result<Element> {
        tracing::debug!("Namecheap request: {} ({} params)", command, params.len());

        let auth = [
            ("ApiUser", self.api_user.as_str()),
            ("ApiKey", self.api_key.as_str()),
            ("UserName", self.username.as_str()),
            ("ClientIp", self.client_ip.as_str()),
            ("Command", command),
        ];

        let response = self
            .client
            .get(&self.endpoint)
            .query(&auth)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "Namecheap API returned HTTP {} for {}",
                status, command
            )));
        }

        let body = response.text().await.map_err(|e| {
            Error::network(format!("Failed to read response: {}", e.without_url()))
        })?;

        let root = xml::parse(&body)?;
        match root.attr("Status") {
            Some(s) if s.eq_ignore_ascii_case("OK") => Ok(root),
            Some(s) if s.eq_ignore_ascii_case("ERROR") => Err(api_error(&root)),
            other => Err(Error::protocol(format!(
                "Unexpected response status: {}",
                other.unwrap_or("<missing>")
            ))),
        }
    }
}

/// Map an error response to the matching error variant
fn api_error(root: &Element) -> Error {
    let Some(error) = root.find("Error") else {
        tracing::error!("Namecheap API error without an error message");
        return Error::provider(PROVIDER, None, "Unknown error - no error message found in response");
    };

    let code = error.attr("Number").and_then(|n| n.trim().parse::<u32>().ok());
    let message = error.text.trim();
    tracing::error!(
        "Namecheap API Error #{}: {}",
        error.attr("Number").unwrap_or("unknown"),
        message
    );

    match code {
        Some(INVALID_API_KEY_CODE) => Error::invalid_credentials(PROVIDER, INVALID_API_KEY_CODE),
        _ => Error::provider(PROVIDER, code, message),
    }
}

/// Fail unless `result_name` reports `flag="true"`
fn expect_flag(root: &Element, result_name: &str, flag: &str, domain: &str) -> Result<()> {
    let result = root.find(result_name).ok_or_else(|| {
        Error::protocol(format!("Response for {} has no {}", domain, result_name))
    })?;

    match result.attr(flag) {
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(()),
        other => Err(Error::provider(
            PROVIDER,
            None,
            format!(
                "{} reported {}={} for {}",
                result_name,
                flag,
                other.unwrap_or("<missing>"),
                domain
            ),
        )),
    }
}

fn domain_params(domain: &str) -> Result<Vec<(String, String)>> {
    let parts = domain_name::split(domain)?;
    Ok(vec![
        ("SLD".to_string(), parts.sld),
        ("TLD".to_string(), parts.tld),
    ])
}

/// Numbered `setHosts` parameters; `MXPref` only for MX hosts
fn host_params(hosts: &[HostEntry]) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(hosts.len() * 5 + 1);

    for (index, host) in hosts.iter().enumerate() {
        let n = index + 1;
        params.push((format!("HostName{}", n), host.name.clone()));
        params.push((format!("RecordType{}", n), host.record_type.to_ascii_uppercase()));
        params.push((format!("Address{}", n), host.address.clone()));
        params.push((format!("TTL{}", n), host.ttl.to_string()));
        if host.is_mx()
            && let Some(mx_pref) = host.mx_pref
        {
            params.push((format!("MXPref{}", n), mx_pref.to_string()));
        }
    }

    // MX hosts are only kept when the mail mode says so
    if hosts.iter().any(HostEntry::is_mx) {
        params.push(("EmailType".to_string(), "MX".to_string()));
    }

    params
}

fn parse_host(host: &Element) -> Result<HostRecord> {
    let required = |name: &str| {
        host.attr(name)
            .map(str::to_string)
            .ok_or_else(|| Error::protocol(format!("host element is missing {}", name)))
    };

    let mx_pref = match host.attr("MXPref") {
        Some(value) if !value.trim().is_empty() => Some(value.trim().parse::<u16>().map_err(|e| {
            Error::protocol(format!("Invalid MXPref '{}': {}", value, e))
        })?),
        _ => None,
    };
    let ttl = match host.attr("TTL") {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|e| Error::protocol(format!("Invalid TTL '{}': {}", value, e)))?,
        None => DEFAULT_TTL,
    };

    Ok(HostRecord {
        host_id: required("HostId")?,
        name: required("Name")?,
        record_type: required("Type")?,
        address: required("Address")?,
        mx_pref,
        ttl,
    })
}

fn parse_domain(domain: &Element) -> Result<DomainInfo> {
    let name = domain
        .attr("Name")
        .ok_or_else(|| Error::protocol("Domain element is missing Name"))?;
    let expires = domain
        .attr("Expires")
        .ok_or_else(|| Error::protocol(format!("Domain {} is missing Expires", name)))?;
    let expires = NaiveDate::parse_from_str(expires.trim(), "%m/%d/%Y").map_err(|e| {
        Error::protocol(format!("Invalid expiry date '{}' for {}: {}", expires, name, e))
    })?;

    Ok(DomainInfo {
        name: name.to_string(),
        expires,
        is_locked: domain
            .attr("IsLocked")
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
    })
}

#[async_trait]
impl DnsProvider for NamecheapClient {
    async fn get_hosts(&self, domain: &str) -> Result<Vec<HostRecord>> {
        self.get_dns_records(domain).await
    }

    async fn set_hosts(&self, domain: &str, hosts: &[HostEntry]) -> Result<()> {
        NamecheapClient::set_hosts(self, domain, hosts).await
    }

    async fn get_domains(&self) -> Result<Vec<DomainInfo>> {
        NamecheapClient::get_domains(self).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
