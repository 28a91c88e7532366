//! Content record store (`content/records/data.json`)

use std::sync::Arc;
use tracing::debug;

use super::logged;
use crate::error::{Error, Result};
use crate::model::{Fields, Record, RecordDocument, next_id};
use crate::repository::DomainRepository;

/// CRUD over a domain's free-form content records
///
/// # Example
///
/// ```rust,no_run
/// use folio_core::{DomainRepository, RecordStore};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repo = Arc::new(DomainRepository::new("/srv/sites"));
///     let store = RecordStore::new(repo);
///
///     let fields = serde_json::json!({"author": "Ada", "quote": "Lovely stay"});
///     let record = store
///         .add("example.com", "testimonial", fields.as_object().cloned().unwrap_or_default())
///         .await?;
///     assert_eq!(record.id, "1");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RecordStore {
    repo: Arc<DomainRepository>,
}

impl RecordStore {
    /// Create a store on top of a repository
    pub fn new(repo: Arc<DomainRepository>) -> Self {
        Self { repo }
    }

    /// Append a record of `record_type` and return it
    pub async fn add(&self, domain: &str, record_type: &str, fields: Fields) -> Result<Record> {
        logged("add record", domain, self.add_inner(domain, record_type, fields).await)
    }

    async fn add_inner(&self, domain: &str, record_type: &str, fields: Fields) -> Result<Record> {
        validate_record_type(record_type)?;
        self.repo.require_domain(domain).await?;
        let path = self.repo.records_path(domain)?;
        let _guard = self.repo.lock(domain).await;

        let mut document: RecordDocument =
            self.repo.load_document(&path).await?.unwrap_or_default();
        let records = document.entry(record_type.to_string()).or_default();

        let id = next_id(records.iter().map(|r| r.id.as_str()));
        let record = Record::new(id, fields);
        records.push(record.clone());

        self.repo.replace_document(&path, &document).await?;
        debug!("Added {} record {} to {}", record_type, record.id, domain);
        Ok(record)
    }

    /// Records of one type; empty when the document or the type is absent
    pub async fn get(&self, domain: &str, record_type: &str) -> Result<Vec<Record>> {
        let document = logged("get records", domain, self.load(domain).await)?;
        Ok(document.get(record_type).cloned().unwrap_or_default())
    }

    /// The whole document; empty when absent
    pub async fn get_all(&self, domain: &str) -> Result<RecordDocument> {
        logged("get records", domain, self.load(domain).await)
    }

    async fn load(&self, domain: &str) -> Result<RecordDocument> {
        let path = self.repo.records_path(domain)?;
        Ok(self.repo.load_document(&path).await?.unwrap_or_default())
    }

    /// Merge `patch` into a record and return the updated record
    ///
    /// Fails with [`Error::NotFound`] when the type or the id does not exist;
    /// nothing is written in that case.
    pub async fn update(
        &self,
        domain: &str,
        record_type: &str,
        record_id: &str,
        patch: Fields,
    ) -> Result<Record> {
        logged(
            "update record",
            domain,
            self.update_inner(domain, record_type, record_id, patch).await,
        )
    }

    async fn update_inner(
        &self,
        domain: &str,
        record_type: &str,
        record_id: &str,
        patch: Fields,
    ) -> Result<Record> {
        let path = self.repo.records_path(domain)?;
        let _guard = self.repo.lock(domain).await;

        let mut document: RecordDocument = self
            .repo
            .load_document(&path)
            .await?
            .ok_or_else(|| Error::not_found(format!("No records document for {}", domain)))?;

        let record = document
            .get_mut(record_type)
            .ok_or_else(|| {
                Error::not_found(format!("Record type '{}' not found for {}", record_type, domain))
            })?
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "Record {} of type '{}' not found for {}",
                    record_id, record_type, domain
                ))
            })?;

        record.apply(patch);
        let updated = record.clone();

        self.repo.replace_document(&path, &document).await?;
        debug!("Updated {} record {} for {}", record_type, record_id, domain);
        Ok(updated)
    }

    /// Remove a record
    ///
    /// Idempotent: returns `Ok(false)` and leaves the document untouched when
    /// nothing matched.
    pub async fn delete(&self, domain: &str, record_type: &str, record_id: &str) -> Result<bool> {
        logged(
            "delete record",
            domain,
            self.delete_inner(domain, record_type, record_id).await,
        )
    }

    async fn delete_inner(&self, domain: &str, record_type: &str, record_id: &str) -> Result<bool> {
        let path = self.repo.records_path(domain)?;
        let _guard = self.repo.lock(domain).await;

        let Some(mut document) = self.repo.load_document::<RecordDocument>(&path).await? else {
            return Ok(false);
        };
        let Some(records) = document.get_mut(record_type) else {
            return Ok(false);
        };

        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            debug!(
                "No {} record {} to delete for {}",
                record_type, record_id, domain
            );
            return Ok(false);
        }

        self.repo.replace_document(&path, &document).await?;
        debug!("Deleted {} record {} from {}", record_type, record_id, domain);
        Ok(true)
    }
}

fn validate_record_type(record_type: &str) -> Result<()> {
    if record_type.trim().is_empty() {
        return Err(Error::validation("Record type cannot be empty"));
    }
    Ok(())
}
