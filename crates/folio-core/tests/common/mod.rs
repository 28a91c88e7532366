//! Test doubles and common utilities for folio-core contract tests

#![allow(dead_code)]

use folio_core::error::{Error, Result};
use folio_core::model::DomainInfo;
use folio_core::{DnsProvider, DomainRepository, HostEntry, HostRecord, SyncConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A fresh workspace directory with a repository rooted in it
///
/// The `TempDir` must be kept alive for the duration of the test.
pub fn workspace() -> (TempDir, Arc<DomainRepository>) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(DomainRepository::new(dir.path()));
    (dir, repo)
}

/// Sync settings with no retry delay
pub fn fast_sync_config(max_retries: usize) -> SyncConfig {
    SyncConfig {
        max_retries,
        retry_delay_secs: 0,
        ..SyncConfig::default()
    }
}

/// Build a provider host record
pub fn host(id: &str, name: &str, record_type: &str, address: &str, ttl: u32) -> HostRecord {
    HostRecord {
        host_id: id.to_string(),
        name: name.to_string(),
        record_type: record_type.to_string(),
        address: address.to_string(),
        mx_pref: None,
        ttl,
    }
}

/// Comparable view of a host set: (name, type, address, ttl), sorted
pub fn host_shape(hosts: &[HostEntry]) -> Vec<(String, String, String, u32)> {
    let mut shape: Vec<_> = hosts
        .iter()
        .map(|h| (h.name.clone(), h.record_type.clone(), h.address.clone(), h.ttl))
        .collect();
    shape.sort();
    shape
}

/// A mock DnsProvider holding one in-memory host list
///
/// `set_hosts` replaces the list and assigns fresh host ids, the way a
/// registrar does on a full replace.
pub struct MockDnsProvider {
    /// Current host list
    hosts: Arc<Mutex<Vec<HostRecord>>>,
    /// Every host set received by set_hosts(), in order
    written: Arc<Mutex<Vec<Vec<HostEntry>>>>,
    /// Call counter for get_hosts()
    get_call_count: Arc<AtomicUsize>,
    /// Call counter for set_hosts()
    set_call_count: Arc<AtomicUsize>,
    /// Remaining calls that fail with a network error
    transient_failures: Arc<AtomicUsize>,
    /// Fail every call with a provider error
    reject: Arc<AtomicBool>,
    /// Next host id handed out by set_hosts()
    next_host_id: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new(hosts: Vec<HostRecord>) -> Self {
        Self {
            hosts: Arc::new(Mutex::new(hosts)),
            written: Arc::new(Mutex::new(Vec::new())),
            get_call_count: Arc::new(AtomicUsize::new(0)),
            set_call_count: Arc::new(AtomicUsize::new(0)),
            transient_failures: Arc::new(AtomicUsize::new(0)),
            reject: Arc::new(AtomicBool::new(false)),
            next_host_id: Arc::new(AtomicUsize::new(1000)),
        }
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            hosts: Arc::clone(&other.hosts),
            written: Arc::clone(&other.written),
            get_call_count: Arc::clone(&other.get_call_count),
            set_call_count: Arc::clone(&other.set_call_count),
            transient_failures: Arc::clone(&other.transient_failures),
            reject: Arc::clone(&other.reject),
            next_host_id: Arc::clone(&other.next_host_id),
        }
    }

    /// Make the next `n` calls fail with a network error
    pub fn fail_transiently(&self, n: usize) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    /// Make every call fail with a provider error response
    pub fn reject_all(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    /// Get the number of times get_hosts() was called
    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times set_hosts() was called
    pub fn set_call_count(&self) -> usize {
        self.set_call_count.load(Ordering::SeqCst)
    }

    /// Host sets received by successful set_hosts() calls
    pub fn written(&self) -> Vec<Vec<HostEntry>> {
        self.written.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", Some(2019166), "Domain not found"));
        }
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::network("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn get_hosts(&self, _domain: &str) -> Result<Vec<HostRecord>> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.hosts.lock().unwrap().clone())
    }

    async fn set_hosts(&self, _domain: &str, hosts: &[HostEntry]) -> Result<()> {
        self.set_call_count.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let replaced = hosts
            .iter()
            .map(|entry| HostRecord {
                host_id: self.next_host_id.fetch_add(1, Ordering::SeqCst).to_string(),
                name: entry.name.clone(),
                record_type: entry.record_type.clone(),
                address: entry.address.clone(),
                mx_pref: entry.mx_pref,
                ttl: entry.ttl,
            })
            .collect();
        *self.hosts.lock().unwrap() = replaced;
        self.written.lock().unwrap().push(hosts.to_vec());
        Ok(())
    }

    async fn get_domains(&self) -> Result<Vec<DomainInfo>> {
        Ok(Vec::new())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
