//! Data model shared by the stores, the synchronizer and providers
//!
//! - [`Record`]: free-form content record (`data.json`)
//! - [`DnsDocument`] / [`DnsRecord`]: the five-type DNS document (`dns.json`)
//! - [`HostRecord`] / [`HostEntry`] / [`DomainInfo`]: provider-side shapes

pub mod content;
pub mod dns;
pub mod host;

pub use content::{Fields, Record, RecordDocument};
pub use dns::{DnsDocument, DnsRecord, DnsRecordPatch, DnsRecordSet, DnsRecordType, NewDnsRecord};
pub use host::{DEFAULT_TTL, DomainInfo, HostEntry, HostRecord};

/// Keys owned by the stores; caller-supplied values for them are discarded
pub const RESERVED_KEYS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Current local wall-clock time, as stored in documents
pub fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Pick the id for a new record appended to a sequence of `existing` ids
///
/// Sequential ids are `len + 1`. After a delete that id can already be in
/// use, in which case the next id after the highest numeric one is used.
pub(crate) fn next_id<'a>(existing: impl Iterator<Item = &'a str> + Clone) -> String {
    let candidate = existing.clone().count() + 1;
    let candidate_str = candidate.to_string();

    if !existing.clone().any(|id| id == candidate_str) {
        return candidate_str;
    }

    let highest = existing
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (highest + 1).to_string()
}
