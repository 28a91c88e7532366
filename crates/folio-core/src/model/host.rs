//! Provider-side shapes: host records and registered domains

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dns::{DnsRecord, DnsRecordType};

/// Default TTL applied when none is given (seconds)
pub const DEFAULT_TTL: u32 = 1800;

/// A host record as reported by the provider
///
/// `record_type` is kept as the raw provider string: providers report types
/// (AAAA, URL redirects, ...) that are not kept locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Provider-assigned host id
    pub host_id: String,
    /// Host label
    pub name: String,
    /// Record type as reported by the provider
    pub record_type: String,
    /// Record value
    pub address: String,
    /// MX preference, if reported
    pub mx_pref: Option<u16>,
    /// TTL in seconds
    pub ttl: u32,
}

impl HostRecord {
    /// Local record type, if this host maps onto one of the five kept types
    pub fn local_type(&self) -> Option<DnsRecordType> {
        self.record_type.parse().ok()
    }

    /// Convert into the shape sent back on a replace call
    ///
    /// Types not kept locally are carried through unchanged, so a
    /// read-modify-write of the provider's host list does not drop them.
    pub fn to_entry(&self) -> HostEntry {
        HostEntry {
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            address: self.address.clone(),
            ttl: self.ttl,
            mx_pref: self.mx_pref,
        }
    }

    /// Convert into a local DNS record, keeping the provider host id as id
    pub fn to_local(&self) -> Option<(DnsRecordType, DnsRecord)> {
        let record_type = self.local_type()?;
        let now = super::now();
        Some((
            record_type,
            DnsRecord {
                id: self.host_id.clone(),
                name: self.name.clone(),
                value: self.address.clone(),
                ttl: self.ttl,
                mx_pref: match record_type {
                    DnsRecordType::Mx => self.mx_pref,
                    _ => None,
                },
                created_at: now,
                updated_at: now,
            },
        ))
    }
}

/// One entry of the complete host set sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    /// Host label
    pub name: String,
    /// Record type as sent on the wire (`A`, `CNAME`, `MX`, ...)
    pub record_type: String,
    /// Record value
    pub address: String,
    /// TTL in seconds
    pub ttl: u32,
    /// MX preference; ignored unless `record_type` is MX
    pub mx_pref: Option<u16>,
}

impl HostEntry {
    /// Whether this entry is an MX record
    pub fn is_mx(&self) -> bool {
        self.record_type.eq_ignore_ascii_case("MX")
    }
}

/// A domain registered with the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Domain name
    pub name: String,
    /// Expiry date
    pub expires: NaiveDate,
    /// Registrar lock status
    pub is_locked: bool,
}
