//! Contract Test: Pull/Push Synchronization
//!
//! Constraints verified:
//! - Pull replaces the local document; provider host ids become local ids
//! - Pull is all-or-nothing: a failed fetch leaves `dns.json` untouched
//! - Push sends the complete record set in exactly one replace call
//! - Push keeps provider hosts of a type not stored locally
//! - Pull followed by push with no edits sends back what was fetched
//! - Only transient (network) failures are retried, as configured

mod common;

use common::*;
use folio_core::error::Error;
use folio_core::model::NewDnsRecord;
use folio_core::{DnsProvider, DnsRecordStore, DnsRecordType, SyncEvent, Synchronizer};
use std::sync::Arc;

fn remote_hosts() -> Vec<folio_core::HostRecord> {
    let mut mx = host("12", "@", "MX", "mx1.example.net", 3600);
    mx.mx_pref = Some(10);
    vec![
        host("10", "@", "A", "203.0.113.5", 1800),
        host("11", "www", "CNAME", "example.github.io", 1800),
        mx,
        host("13", "@", "TXT", "v=spf1 include:example.net -all", 1800),
    ]
}

fn synchronizer(
    repo: Arc<folio_core::DomainRepository>,
    provider: MockDnsProvider,
    max_retries: usize,
) -> (Synchronizer, tokio::sync::mpsc::Receiver<SyncEvent>) {
    let provider: Arc<dyn DnsProvider> = Arc::new(provider);
    Synchronizer::new(repo, Some(provider), &fast_sync_config(max_retries)).unwrap()
}

#[tokio::test]
async fn pull_replaces_local_document() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();
    let store = DnsRecordStore::new(repo.clone());

    // Local-only record, lost on pull
    store
        .add("example.com", DnsRecordType::Ns, NewDnsRecord::new("@", "ns1.example.org"))
        .await
        .unwrap();

    let provider = MockDnsProvider::new(remote_hosts());
    let (sync, _events) = synchronizer(repo, provider, 0);

    assert_eq!(sync.pull("example.com").await.unwrap(), 4);

    let document = store.get_all("example.com").await.unwrap().unwrap();
    assert!(document.records.bucket(DnsRecordType::Ns).is_empty());

    let a = document.records.bucket(DnsRecordType::A);
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].id, "10");
    assert_eq!(a[0].value, "203.0.113.5");

    let mx = document.records.bucket(DnsRecordType::Mx);
    assert_eq!(mx[0].id, "12");
    assert_eq!(mx[0].mx_pref, Some(10));
    assert_eq!(mx[0].ttl, 3600);
}

#[tokio::test]
async fn pull_skips_types_not_kept_locally() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();

    let mut hosts = remote_hosts();
    hosts.push(host("14", "@", "AAAA", "2001:db8::1", 1800));
    let (sync, mut events) = synchronizer(repo, MockDnsProvider::new(hosts), 0);

    assert_eq!(sync.pull("example.com").await.unwrap(), 4);

    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::PullStarted {
            domain: "example.com".to_string()
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SyncEvent::PullSucceeded {
            domain: "example.com".to_string(),
            records: 4,
            skipped: 1,
        }
    );
}

#[tokio::test]
async fn failed_pull_leaves_document_untouched() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();
    let store = DnsRecordStore::new(repo.clone());
    store
        .add("example.com", DnsRecordType::A, NewDnsRecord::new("@", "198.51.100.7"))
        .await
        .unwrap();

    let path = repo.dns_path("example.com").unwrap();
    let before = std::fs::read(&path).unwrap();

    let provider = MockDnsProvider::new(remote_hosts());
    provider.reject_all();
    let (sync, _events) = synchronizer(repo, provider, 2);

    let err = sync.pull("example.com").await.unwrap_err();
    assert!(err.is_provider_error());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test]
async fn pull_of_unprovisioned_domain_does_not_call_provider() {
    let (_dir, repo) = workspace();
    let provider = MockDnsProvider::new(remote_hosts());
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, _events) = synchronizer(repo, provider, 0);

    let err = sync.pull("missing.example").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(observer.get_call_count(), 0);
}

#[tokio::test]
async fn push_sends_full_set_in_one_call() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();
    let store = DnsRecordStore::new(repo.clone());
    store
        .add("example.com", DnsRecordType::A, NewDnsRecord::new("@", "203.0.113.5"))
        .await
        .unwrap();
    store
        .add("example.com", DnsRecordType::Cname, NewDnsRecord::new("www", "example.github.io"))
        .await
        .unwrap();
    store
        .add(
            "example.com",
            DnsRecordType::Mx,
            NewDnsRecord::new("@", "mx1.example.net").with_mx_pref(10),
        )
        .await
        .unwrap();

    let provider = MockDnsProvider::new(Vec::new());
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, _events) = synchronizer(repo, provider, 0);

    let report = sync.push("example.com").await.unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(report.preserved, 0);
    assert_eq!(report.retries, 0);
    assert_eq!(observer.set_call_count(), 1);

    let written = observer.written();
    assert_eq!(written[0].len(), 3);
    let mx = written[0].iter().find(|h| h.record_type == "MX").unwrap();
    assert_eq!(mx.mx_pref, Some(10));
    assert!(written[0].iter().filter(|h| !h.is_mx()).all(|h| h.mx_pref.is_none()));
}

#[tokio::test]
async fn pull_then_push_round_trips() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();

    let mut fetched = remote_hosts();
    fetched.push(host("14", "@", "AAAA", "2001:db8::1", 1800));
    fetched.push(host("15", "www", "URL301", "https://example.org", 1800));
    let provider = MockDnsProvider::new(fetched.clone());
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, _events) = synchronizer(repo, provider, 0);

    assert_eq!(sync.pull("example.com").await.unwrap(), 4);
    let report = sync.push("example.com").await.unwrap();
    assert_eq!(report.records, 4);
    assert_eq!(report.preserved, 2);

    let expected: Vec<_> = fetched.iter().map(|h| h.to_entry()).collect();
    let written = observer.written();
    assert_eq!(written.len(), 1);
    assert_eq!(host_shape(&written[0]), host_shape(&expected));
}

#[tokio::test]
async fn push_without_document_fails() {
    let (_dir, repo) = workspace();
    let provider = MockDnsProvider::new(Vec::new());
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, _events) = synchronizer(repo, provider, 0);

    let err = sync.push("missing.example").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(observer.set_call_count(), 0);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();

    let provider = MockDnsProvider::new(remote_hosts());
    provider.fail_transiently(2);
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, _events) = synchronizer(repo, provider, 2);

    assert_eq!(sync.pull("example.com").await.unwrap(), 4);
    assert_eq!(observer.get_call_count(), 3);
}

#[tokio::test]
async fn retries_can_be_disabled_via_config() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();

    let provider = MockDnsProvider::new(remote_hosts());
    provider.fail_transiently(1);
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, mut events) = synchronizer(repo, provider, 0);

    let err = sync.push("example.com").await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(observer.get_call_count(), 1);
    assert_eq!(observer.set_call_count(), 0);

    events.recv().await.unwrap();
    match events.recv().await.unwrap() {
        SyncEvent::PushFailed {
            domain,
            retry_count,
            ..
        } => {
            assert_eq!(domain, "example.com");
            assert_eq!(retry_count, 0);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn provider_errors_are_not_retried() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();

    let provider = MockDnsProvider::new(remote_hosts());
    provider.reject_all();
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, mut events) = synchronizer(repo, provider, 3);

    assert!(sync.push("example.com").await.is_err());
    assert_eq!(observer.get_call_count(), 1);
    assert_eq!(observer.set_call_count(), 0);

    events.recv().await.unwrap();
    match events.recv().await.unwrap() {
        SyncEvent::PushFailed { retry_count, .. } => assert_eq!(retry_count, 0),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn failed_event_reports_retries_made() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();

    let provider = MockDnsProvider::new(remote_hosts());
    provider.fail_transiently(10);
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, mut events) = synchronizer(repo, provider, 2);

    assert!(sync.pull("example.com").await.unwrap_err().is_transient());
    assert_eq!(observer.get_call_count(), 3);

    events.recv().await.unwrap();
    match events.recv().await.unwrap() {
        SyncEvent::PullFailed { retry_count, .. } => assert_eq!(retry_count, 2),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn push_keeps_hosts_not_stored_locally() {
    let (_dir, repo) = workspace();
    repo.create_domain("example.com").await.unwrap();
    let store = DnsRecordStore::new(repo.clone());
    store
        .add("example.com", DnsRecordType::A, NewDnsRecord::new("@", "198.51.100.7"))
        .await
        .unwrap();

    let provider = MockDnsProvider::new(vec![
        host("20", "@", "A", "203.0.113.5", 1800),
        host("21", "@", "AAAA", "2001:db8::1", 1800),
        host("22", "www", "URL301", "https://example.org", 1800),
    ]);
    let observer = MockDnsProvider::sharing_state_with(&provider);
    let (sync, _events) = synchronizer(repo, provider, 0);

    let report = sync.push("example.com").await.unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(report.preserved, 2);
    assert_eq!(observer.set_call_count(), 1);

    // The stale remote A record is replaced, the other types survive
    let written = observer.written();
    assert_eq!(
        host_shape(&written[0]),
        vec![
            ("@".to_string(), "A".to_string(), "198.51.100.7".to_string(), 1800),
            ("@".to_string(), "AAAA".to_string(), "2001:db8::1".to_string(), 1800),
            ("www".to_string(), "URL301".to_string(), "https://example.org".to_string(), 1800),
        ]
    );
}
