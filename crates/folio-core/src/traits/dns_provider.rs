// # DNS Provider Trait
//
// Defines the interface for reading and writing a domain's host records at
// the registrar.
//
// ## Implementations
//
// - Namecheap: `folio-provider-namecheap` crate
//
// ## Replace Semantics
//
// Providers are modelled on whole-list replacement: `set_hosts` makes the
// given entries the complete host set of the domain. Single-record helpers
// are provided on top of that as read-modify-write cycles.
//
// ## Usage
//
// ```rust,ignore
// use folio_core::DnsProvider;
//
// async fn show(provider: &dyn DnsProvider) -> folio_core::Result<()> {
//     for host in provider.get_hosts("example.com").await? {
//         println!("{} {} {}", host.record_type, host.name, host.address);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{DomainInfo, HostEntry, HostRecord};

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Retries
///
/// Providers perform a single API call per method and return the error as
/// is. Retrying transient failures is owned by the
/// [`Synchronizer`](crate::sync::Synchronizer).
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Current host records of `domain`
    async fn get_hosts(&self, domain: &str) -> Result<Vec<HostRecord>>;

    /// Replace the complete host set of `domain` with `hosts`
    ///
    /// Any host not in `hosts` is removed at the provider.
    async fn set_hosts(&self, domain: &str, hosts: &[HostEntry]) -> Result<()>;

    /// Domains registered in the account
    async fn get_domains(&self) -> Result<Vec<DomainInfo>>;

    /// Provider name used in logs and errors
    fn provider_name(&self) -> &'static str;

    /// Add one host, keeping every existing one
    async fn add_host(&self, domain: &str, entry: HostEntry) -> Result<()> {
        let mut hosts = entries(self.get_hosts(domain).await?);
        hosts.push(entry);
        self.set_hosts(domain, &hosts).await
    }

    /// Replace the host with provider id `host_id`
    ///
    /// Fails with [`Error::NotFound`] without writing when no host has that id.
    async fn update_host(&self, domain: &str, host_id: &str, entry: HostEntry) -> Result<()> {
        let current = self.get_hosts(domain).await?;
        let Some(position) = current.iter().position(|h| h.host_id == host_id) else {
            return Err(Error::not_found(format!(
                "Host {} not found at {} for {}",
                host_id,
                self.provider_name(),
                domain
            )));
        };

        let mut hosts = entries(current);
        hosts[position] = entry;
        self.set_hosts(domain, &hosts).await
    }

    /// Remove the host with provider id `host_id`
    ///
    /// Returns `Ok(false)` without writing when no host has that id.
    async fn delete_host(&self, domain: &str, host_id: &str) -> Result<bool> {
        let current = self.get_hosts(domain).await?;
        let before = current.len();
        let remaining: Vec<HostRecord> =
            current.into_iter().filter(|h| h.host_id != host_id).collect();
        if remaining.len() == before {
            return Ok(false);
        }

        self.set_hosts(domain, &entries(remaining)).await?;
        Ok(true)
    }
}

fn entries(hosts: Vec<HostRecord>) -> Vec<HostEntry> {
    hosts.iter().map(HostRecord::to_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every `set_hosts` call against a fixed host list
    struct FixedProvider {
        hosts: Vec<HostRecord>,
        written: Mutex<Vec<Vec<HostEntry>>>,
    }

    impl FixedProvider {
        fn new() -> Self {
            let host = |id: &str, name: &str, record_type: &str, address: &str| HostRecord {
                host_id: id.to_string(),
                name: name.to_string(),
                record_type: record_type.to_string(),
                address: address.to_string(),
                mx_pref: None,
                ttl: 1800,
            };
            Self {
                hosts: vec![
                    host("10", "@", "A", "203.0.113.5"),
                    host("11", "@", "AAAA", "2001:db8::1"),
                ],
                written: Mutex::new(Vec::new()),
            }
        }

        fn writes(&self) -> Vec<Vec<HostEntry>> {
            self.written.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DnsProvider for FixedProvider {
        async fn get_hosts(&self, _domain: &str) -> Result<Vec<HostRecord>> {
            Ok(self.hosts.clone())
        }

        async fn set_hosts(&self, _domain: &str, hosts: &[HostEntry]) -> Result<()> {
            self.written.lock().unwrap().push(hosts.to_vec());
            Ok(())
        }

        async fn get_domains(&self) -> Result<Vec<DomainInfo>> {
            Ok(Vec::new())
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn www_entry() -> HostEntry {
        HostEntry {
            name: "www".to_string(),
            record_type: "CNAME".to_string(),
            address: "example.github.io".to_string(),
            ttl: 1800,
            mx_pref: None,
        }
    }

    #[tokio::test]
    async fn test_add_host_keeps_unmanaged_types() {
        let provider = FixedProvider::new();
        provider.add_host("example.com", www_entry()).await.unwrap();

        let writes = provider.writes();
        assert_eq!(writes.len(), 1);
        let types: Vec<&str> = writes[0].iter().map(|h| h.record_type.as_str()).collect();
        assert_eq!(types, vec!["A", "AAAA", "CNAME"]);
    }

    #[tokio::test]
    async fn test_update_unknown_host_writes_nothing() {
        let provider = FixedProvider::new();
        let err = provider
            .update_host("example.com", "99", www_entry())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(provider.writes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_host() {
        let provider = FixedProvider::new();

        assert!(!provider.delete_host("example.com", "99").await.unwrap());
        assert!(provider.writes().is_empty());

        assert!(provider.delete_host("example.com", "10").await.unwrap());
        let writes = provider.writes();
        assert_eq!(writes[0].len(), 1);
        assert_eq!(writes[0][0].record_type, "AAAA");
    }
}
