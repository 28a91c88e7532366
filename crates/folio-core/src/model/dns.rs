//! DNS records and the per-domain DNS document
//!
//! ## File Format
//!
//! ```json
//! {
//!   "records": {
//!     "A": [
//!       {
//!         "id": "1",
//!         "name": "@",
//!         "value": "203.0.113.5",
//!         "ttl": 1800,
//!         "created_at": "2025-01-09T12:00:00.123456",
//!         "updated_at": "2025-01-09T12:00:00.123456"
//!       }
//!     ],
//!     "CNAME": [],
//!     "MX": [],
//!     "TXT": [],
//!     "NS": []
//!   },
//!   "last_updated": "2025-01-09T12:00:00.123456"
//! }
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::host::{DEFAULT_TTL, HostEntry};
use crate::error::Error;

/// The closed set of DNS record types kept locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DnsRecordType {
    A,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "MX")]
    Mx,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "NS")]
    Ns,
}

impl DnsRecordType {
    /// All types, in document order
    pub const ALL: [DnsRecordType; 5] = [
        DnsRecordType::A,
        DnsRecordType::Cname,
        DnsRecordType::Mx,
        DnsRecordType::Txt,
        DnsRecordType::Ns,
    ];

    /// Wire / document name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsRecordType::A => "A",
            DnsRecordType::Cname => "CNAME",
            DnsRecordType::Mx => "MX",
            DnsRecordType::Txt => "TXT",
            DnsRecordType::Ns => "NS",
        }
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DnsRecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(DnsRecordType::A),
            "CNAME" => Ok(DnsRecordType::Cname),
            "MX" => Ok(DnsRecordType::Mx),
            "TXT" => Ok(DnsRecordType::Txt),
            "NS" => Ok(DnsRecordType::Ns),
            other => Err(Error::validation(format!(
                "Unsupported DNS record type '{}'. Supported types: A, CNAME, MX, TXT, NS",
                other
            ))),
        }
    }
}

/// A locally stored DNS record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Local id, or the provider's host id after a pull
    pub id: String,

    /// Host label (`@`, `www`, ...)
    pub name: String,

    /// Record value (IP, target host, text)
    #[serde(alias = "address")]
    pub value: String,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// MX preference, only meaningful for MX records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx_pref: Option<u16>,

    /// Creation timestamp (local clock)
    pub created_at: NaiveDateTime,

    /// Last modification timestamp (local clock)
    pub updated_at: NaiveDateTime,
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

impl DnsRecord {
    /// Convert into the provider's host shape for the given bucket
    pub fn to_host_entry(&self, record_type: DnsRecordType) -> HostEntry {
        HostEntry {
            name: self.name.clone(),
            record_type: record_type.as_str().to_string(),
            address: self.value.clone(),
            ttl: self.ttl,
            mx_pref: match record_type {
                DnsRecordType::Mx => self.mx_pref,
                _ => None,
            },
        }
    }
}

/// Input for a new DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDnsRecord {
    /// Host label
    pub name: String,
    /// Record value
    #[serde(alias = "address")]
    pub value: String,
    /// TTL in seconds, 1800 when absent
    #[serde(default)]
    pub ttl: Option<u32>,
    /// MX preference
    #[serde(default)]
    pub mx_pref: Option<u16>,
}

impl NewDnsRecord {
    /// Create an input record with the default TTL
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ttl: None,
            mx_pref: None,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the MX preference
    pub fn with_mx_pref(mut self, mx_pref: u16) -> Self {
        self.mx_pref = Some(mx_pref);
        self
    }

    pub(crate) fn into_record(self, id: String) -> DnsRecord {
        let now = super::now();
        DnsRecord {
            id,
            name: self.name,
            value: self.value,
            ttl: self.ttl.unwrap_or(DEFAULT_TTL),
            mx_pref: self.mx_pref,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a DNS record; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecordPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "address")]
    pub value: Option<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub mx_pref: Option<u16>,
}

impl DnsRecordPatch {
    pub(crate) fn apply(self, record: &mut DnsRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(value) = self.value {
            record.value = value;
        }
        if let Some(ttl) = self.ttl {
            record.ttl = ttl;
        }
        if let Some(mx_pref) = self.mx_pref {
            record.mx_pref = Some(mx_pref);
        }
        record.updated_at = super::now();
    }
}

/// The five type buckets of a DNS document
///
/// Each bucket is a named field, so a document always carries exactly the
/// five keys no matter what was on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsRecordSet {
    #[serde(rename = "A", default)]
    pub a: Vec<DnsRecord>,
    #[serde(rename = "CNAME", default)]
    pub cname: Vec<DnsRecord>,
    #[serde(rename = "MX", default)]
    pub mx: Vec<DnsRecord>,
    #[serde(rename = "TXT", default)]
    pub txt: Vec<DnsRecord>,
    #[serde(rename = "NS", default)]
    pub ns: Vec<DnsRecord>,
}

impl DnsRecordSet {
    /// Records of one type
    pub fn bucket(&self, record_type: DnsRecordType) -> &Vec<DnsRecord> {
        match record_type {
            DnsRecordType::A => &self.a,
            DnsRecordType::Cname => &self.cname,
            DnsRecordType::Mx => &self.mx,
            DnsRecordType::Txt => &self.txt,
            DnsRecordType::Ns => &self.ns,
        }
    }

    /// Mutable records of one type
    pub fn bucket_mut(&mut self, record_type: DnsRecordType) -> &mut Vec<DnsRecord> {
        match record_type {
            DnsRecordType::A => &mut self.a,
            DnsRecordType::Cname => &mut self.cname,
            DnsRecordType::Mx => &mut self.mx,
            DnsRecordType::Txt => &mut self.txt,
            DnsRecordType::Ns => &mut self.ns,
        }
    }

    /// Iterate all records with their type, in document order
    pub fn iter(&self) -> impl Iterator<Item = (DnsRecordType, &DnsRecord)> {
        DnsRecordType::ALL
            .into_iter()
            .flat_map(move |t| self.bucket(t).iter().map(move |r| (t, r)))
    }

    /// Total number of records across all types
    pub fn len(&self) -> usize {
        DnsRecordType::ALL
            .into_iter()
            .map(|t| self.bucket(t).len())
            .sum()
    }

    /// Whether every bucket is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The `dns.json` document of a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsDocument {
    /// Records grouped by type
    pub records: DnsRecordSet,

    /// Timestamp of the last mutation
    pub last_updated: NaiveDateTime,
}

impl DnsDocument {
    /// A document with all five buckets empty
    pub fn empty() -> Self {
        Self {
            records: DnsRecordSet::default(),
            last_updated: super::now(),
        }
    }

    /// Mark the document as modified now
    pub(crate) fn touch(&mut self) {
        self.last_updated = super::now();
    }

    /// The complete desired host set, ready for a provider replace call
    pub fn host_entries(&self) -> Vec<HostEntry> {
        self.records
            .iter()
            .map(|(record_type, record)| record.to_host_entry(record_type))
            .collect()
    }
}
