// # Document Stores
//
// CRUD over the two per-domain JSON documents:
//
// - `records`: free-form content records keyed by record type (`data.json`)
// - `dns`: the fixed five-type DNS document (`dns.json`)
//
// Stores hold no document state. Each call takes the domain's write lock,
// loads the document, mutates it and replaces it. A failed call leaves the
// document untouched and logs the cause before returning it.

pub mod dns;
pub mod records;

pub use dns::DnsRecordStore;
pub use records::RecordStore;

use crate::error::Result;

/// Log a failed store operation at its boundary and hand the error back
pub(crate) fn logged<T>(operation: &str, domain: &str, result: Result<T>) -> Result<T> {
    result.inspect_err(|e| tracing::warn!("{} failed for {}: {}", operation, domain, e))
}
