//! DNS synchronizer
//!
//! The Synchronizer moves DNS state between a domain's `dns.json` and the
//! provider:
//!
//! - **pull**: remote overwrites local. The provider's hosts become the new
//!   document; provider host ids become local ids.
//! - **push**: local overwrites remote. The complete local record set, plus
//!   any provider hosts of a type not kept locally, is sent in a single
//!   replace call, which is the provider's unit of atomicity.
//!
//! ## Event Flow
//!
//! 1. Operation starts and a `*Started` event is emitted
//! 2. Provider call is attempted, retrying transient failures
//! 3. On success the result is persisted (pull) and `*Succeeded` is emitted
//! 4. On failure nothing is written and `*Failed` is emitted
//!
//! Both operations are all-or-nothing: a failed pull leaves `dns.json`
//! untouched and a failed push leaves the provider unchanged.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::model::{DnsDocument, DnsRecordSet, HostEntry, HostRecord};
use crate::repository::DomainRepository;
use crate::store::DnsRecordStore;
use crate::traits::DnsProvider;

/// Events emitted by the Synchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Pull started
    PullStarted { domain: String },

    /// Pull replaced the local document
    PullSucceeded {
        domain: String,
        /// Records written locally
        records: usize,
        /// Provider hosts of a type not kept locally
        skipped: usize,
    },

    /// Pull failed; the local document is unchanged
    ///
    /// `retry_count` is the number of retries actually made.
    PullFailed {
        domain: String,
        error: String,
        retry_count: usize,
    },

    /// Push started
    PushStarted { domain: String, records: usize },

    /// Push replaced the provider's host set
    PushSucceeded { domain: String, records: usize },

    /// Push failed; the provider is unchanged
    PushFailed {
        domain: String,
        error: String,
        retry_count: usize,
    },
}

/// Outcome of a successful push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushReport {
    /// Local records sent in the replace call
    pub records: usize,
    /// Provider hosts of a type not kept locally, sent back unchanged
    pub preserved: usize,
    /// Provider calls that failed transiently before the one that succeeded
    pub retries: usize,
}

/// Pull/push orchestration between a domain's DNS document and the provider
pub struct Synchronizer {
    /// Repository, used for the provisioning check
    repo: Arc<DomainRepository>,

    /// Local DNS documents
    dns: DnsRecordStore,

    /// Remote provider; `None` makes every operation fail with NotConfigured
    provider: Option<Arc<dyn DnsProvider>>,

    /// Maximum retry attempts for transient failures
    max_retries: usize,

    /// Delay between retries (in seconds)
    retry_delay_secs: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl Synchronizer {
    /// Create a new synchronizer
    ///
    /// # Returns
    ///
    /// A tuple of (synchronizer, event_receiver) where event_receiver yields
    /// sync events. Events are dropped when the receiver falls behind.
    pub fn new(
        repo: Arc<DomainRepository>,
        provider: Option<Arc<dyn DnsProvider>>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let synchronizer = Self {
            dns: DnsRecordStore::new(Arc::clone(&repo)),
            repo,
            provider,
            max_retries: config.max_retries,
            retry_delay_secs: config.retry_delay_secs,
            event_tx: tx,
        };

        Ok((synchronizer, rx))
    }

    /// Whether a provider is attached
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Replace the local DNS document with the provider's hosts
    ///
    /// Returns the number of records written. Hosts of a type not kept
    /// locally (AAAA, URL redirects, ...) are skipped with a debug log.
    pub async fn pull(&self, domain: &str) -> Result<usize> {
        let provider = self.provider()?;
        self.repo.require_domain(domain).await?;

        self.emit_event(SyncEvent::PullStarted {
            domain: domain.to_string(),
        });

        let (fetched, retries) = self
            .with_retry("Pull", domain, move || provider.get_hosts(domain))
            .await;
        let hosts = match fetched {
            Ok(hosts) => hosts,
            Err(e) => {
                self.emit_event(SyncEvent::PullFailed {
                    domain: domain.to_string(),
                    error: e.to_string(),
                    retry_count: retries,
                });
                return Err(e);
            }
        };

        let mut records = DnsRecordSet::default();
        let mut skipped = 0;
        for host in &hosts {
            match host.to_local() {
                Some((record_type, record)) => records.bucket_mut(record_type).push(record),
                None => {
                    debug!(
                        "Skipping {} host {} for {}: type not kept locally",
                        host.record_type, host.host_id, domain
                    );
                    skipped += 1;
                }
            }
        }

        let mut document = DnsDocument::empty();
        document.records = records;
        let count = document.records.len();

        if let Err(e) = self.dns.replace(domain, &document).await {
            self.emit_event(SyncEvent::PullFailed {
                domain: domain.to_string(),
                error: e.to_string(),
                retry_count: retries,
            });
            return Err(e);
        }

        info!(
            "Pulled {} DNS records for {} from {}",
            count,
            domain,
            provider.provider_name()
        );
        self.emit_event(SyncEvent::PullSucceeded {
            domain: domain.to_string(),
            records: count,
            skipped,
        });
        Ok(count)
    }

    /// Make the provider's host set match the local DNS document
    ///
    /// The provider's current hosts are fetched first; hosts of a type not
    /// kept locally are carried over unchanged. The merged set then goes out
    /// in one replace call. An empty document clears the kept types only.
    pub async fn push(&self, domain: &str) -> Result<PushReport> {
        let provider = self.provider()?;
        let document = self.dns.get_all(domain).await?.ok_or_else(|| {
            Error::not_found(format!("No DNS records document for {}", domain))
        })?;

        let local = document.host_entries();
        let records = local.len();

        self.emit_event(SyncEvent::PushStarted {
            domain: domain.to_string(),
            records,
        });

        let (fetched, mut retries) = self
            .with_retry("Push", domain, move || provider.get_hosts(domain))
            .await;
        let current = match fetched {
            Ok(hosts) => hosts,
            Err(e) => return Err(self.push_failed(domain, e, retries)),
        };

        let mut hosts: Vec<HostEntry> = current
            .iter()
            .filter(|host| host.local_type().is_none())
            .map(HostRecord::to_entry)
            .collect();
        let preserved = hosts.len();
        hosts.extend(local);
        let entries = hosts.as_slice();

        let (written, set_retries) = self
            .with_retry("Push", domain, move || provider.set_hosts(domain, entries))
            .await;
        retries += set_retries;
        if let Err(e) = written {
            return Err(self.push_failed(domain, e, retries));
        }

        info!(
            "Pushed {} DNS records for {} to {} ({} unmanaged hosts kept)",
            records,
            domain,
            provider.provider_name(),
            preserved
        );
        self.emit_event(SyncEvent::PushSucceeded {
            domain: domain.to_string(),
            records,
        });
        Ok(PushReport {
            records,
            preserved,
            retries,
        })
    }

    fn push_failed(&self, domain: &str, error: Error, retry_count: usize) -> Error {
        self.emit_event(SyncEvent::PushFailed {
            domain: domain.to_string(),
            error: error.to_string(),
            retry_count,
        });
        error
    }

    fn provider(&self) -> Result<&Arc<dyn DnsProvider>> {
        self.provider.as_ref().ok_or_else(|| {
            Error::not_configured("DNS provider client is not configured; set the provider credentials")
        })
    }

    /// Run `call`, retrying transient failures up to `max_retries` times
    ///
    /// Returns the outcome together with the number of retries made.
    async fn with_retry<T, F, Fut>(&self, operation: &str, domain: &str, mut call: F) -> (Result<T>, usize)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    warn!(
                        "{} attempt {} failed for {}: {}",
                        operation, attempt, domain, e
                    );
                    attempt += 1;
                    tokio::time::sleep(tokio::time::Duration::from_secs(self.retry_delay_secs))
                        .await;
                }
                Err(e) => {
                    error!("{} failed for {}: {}", operation, domain, e);
                    return (Err(e), attempt);
                }
            }
        }
    }

    /// Emit a sync event, logging a warning if the channel is full
    fn emit_event(&self, event: SyncEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Sync event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
