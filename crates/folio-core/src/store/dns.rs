//! DNS record store (`content/records/dns.json`)
//!
//! The document always carries the five type buckets (A, CNAME, MX, TXT,
//! NS). Mutations require a provisioned document and bump both the record's
//! `updated_at` and the document's `last_updated`.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::logged;
use crate::error::{Error, Result};
use crate::model::{
    DnsDocument, DnsRecord, DnsRecordPatch, DnsRecordType, NewDnsRecord, next_id,
};
use crate::repository::{DomainRepository, DomainWriteGuard};

/// CRUD over a domain's DNS document
#[derive(Debug, Clone)]
pub struct DnsRecordStore {
    repo: Arc<DomainRepository>,
}

impl DnsRecordStore {
    /// Create a store on top of a repository
    pub fn new(repo: Arc<DomainRepository>) -> Self {
        Self { repo }
    }

    /// The whole DNS document, or `None` if the domain has none yet
    pub async fn get_all(&self, domain: &str) -> Result<Option<DnsDocument>> {
        logged("get DNS records", domain, self.load(domain).await)
    }

    /// Records of one type; empty when the domain has no document yet
    pub async fn get(&self, domain: &str, record_type: DnsRecordType) -> Result<Vec<DnsRecord>> {
        let document = logged("get DNS records", domain, self.load(domain).await)?;
        Ok(document
            .map(|doc| doc.records.bucket(record_type).clone())
            .unwrap_or_default())
    }

    async fn load(&self, domain: &str) -> Result<Option<DnsDocument>> {
        let path = self.repo.dns_path(domain)?;
        self.repo.load_document(&path).await
    }

    /// Append a DNS record and return it
    pub async fn add(
        &self,
        domain: &str,
        record_type: DnsRecordType,
        record: NewDnsRecord,
    ) -> Result<DnsRecord> {
        logged(
            "add DNS record",
            domain,
            self.add_inner(domain, record_type, record).await,
        )
    }

    async fn add_inner(
        &self,
        domain: &str,
        record_type: DnsRecordType,
        record: NewDnsRecord,
    ) -> Result<DnsRecord> {
        validate_new(record_type, &record)?;
        let (path, _guard, mut document) = self.load_for_write(domain).await?;

        let bucket = document.records.bucket_mut(record_type);
        let id = next_id(bucket.iter().map(|r| r.id.as_str()));
        let record = record.into_record(id);
        bucket.push(record.clone());
        document.touch();

        self.repo.replace_document(&path, &document).await?;
        debug!("Added {} record {} to {}", record_type, record.id, domain);
        Ok(record)
    }

    /// Apply `patch` to a DNS record and return the updated record
    ///
    /// Fails with [`Error::NotFound`] when the id does not exist and with
    /// [`Error::Validation`] when the patched record would be invalid; nothing
    /// is written in either case.
    pub async fn update(
        &self,
        domain: &str,
        record_type: DnsRecordType,
        record_id: &str,
        patch: DnsRecordPatch,
    ) -> Result<DnsRecord> {
        logged(
            "update DNS record",
            domain,
            self.update_inner(domain, record_type, record_id, patch).await,
        )
    }

    async fn update_inner(
        &self,
        domain: &str,
        record_type: DnsRecordType,
        record_id: &str,
        patch: DnsRecordPatch,
    ) -> Result<DnsRecord> {
        let (path, _guard, mut document) = self.load_for_write(domain).await?;

        let record = document
            .records
            .bucket_mut(record_type)
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "{} record {} not found for {}",
                    record_type, record_id, domain
                ))
            })?;

        let mut updated = record.clone();
        patch.apply(&mut updated);
        validate_fields(record_type, &updated.name, &updated.value)?;
        *record = updated.clone();
        document.touch();

        self.repo.replace_document(&path, &document).await?;
        debug!("Updated {} record {} for {}", record_type, record_id, domain);
        Ok(updated)
    }

    /// Remove a DNS record
    ///
    /// Idempotent: returns `Ok(false)` and leaves the document untouched when
    /// nothing matched. Still fails if the domain has no DNS document.
    pub async fn delete(
        &self,
        domain: &str,
        record_type: DnsRecordType,
        record_id: &str,
    ) -> Result<bool> {
        logged(
            "delete DNS record",
            domain,
            self.delete_inner(domain, record_type, record_id).await,
        )
    }

    async fn delete_inner(
        &self,
        domain: &str,
        record_type: DnsRecordType,
        record_id: &str,
    ) -> Result<bool> {
        let (path, _guard, mut document) = self.load_for_write(domain).await?;

        let bucket = document.records.bucket_mut(record_type);
        let before = bucket.len();
        bucket.retain(|r| r.id != record_id);
        if bucket.len() == before {
            debug!(
                "No {} record {} to delete for {}",
                record_type, record_id, domain
            );
            return Ok(false);
        }
        document.touch();

        self.repo.replace_document(&path, &document).await?;
        debug!("Deleted {} record {} from {}", record_type, record_id, domain);
        Ok(true)
    }

    /// Replace the whole document (used by pull)
    ///
    /// Requires a provisioned domain; the previous document is discarded.
    pub async fn replace(&self, domain: &str, document: &DnsDocument) -> Result<()> {
        logged(
            "replace DNS document",
            domain,
            self.replace_inner(domain, document).await,
        )
    }

    async fn replace_inner(&self, domain: &str, document: &DnsDocument) -> Result<()> {
        self.repo.require_domain(domain).await?;
        let path = self.repo.dns_path(domain)?;
        let _guard = self.repo.lock(domain).await;

        self.repo.replace_document(&path, document).await?;
        debug!(
            "Replaced DNS document for {} ({} records)",
            domain,
            document.records.len()
        );
        Ok(())
    }

    /// Lock the domain and load its document, failing if it was never provisioned
    async fn load_for_write(
        &self,
        domain: &str,
    ) -> Result<(PathBuf, DomainWriteGuard, DnsDocument)> {
        let path = self.repo.dns_path(domain)?;
        let guard = self.repo.lock(domain).await;
        let document = self.repo.load_document(&path).await?.ok_or_else(|| {
            Error::not_found(format!(
                "DNS records for {} are not initialized; provision the domain first",
                domain
            ))
        })?;
        Ok((path, guard, document))
    }
}

fn validate_new(record_type: DnsRecordType, record: &NewDnsRecord) -> Result<()> {
    validate_fields(record_type, &record.name, &record.value)
}

/// Checks shared by add and update; run on the record as it will be stored
fn validate_fields(record_type: DnsRecordType, name: &str, value: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("DNS record name cannot be empty"));
    }
    if value.trim().is_empty() {
        return Err(Error::validation("DNS record value cannot be empty"));
    }
    if record_type == DnsRecordType::A && value.parse::<std::net::Ipv4Addr>().is_err() {
        return Err(Error::validation(format!(
            "A record value must be an IPv4 address. Got: {}",
            value
        )));
    }
    Ok(())
}
