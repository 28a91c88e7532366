// # folio-core
//
// Core library for managing a portfolio of static-site domains.
//
// ## Architecture Overview
//
// - **DomainRepository**: Owns the per-domain directory tree and its JSON documents
// - **RecordStore**: CRUD over free-form content records (`data.json`)
// - **DnsRecordStore**: CRUD over the five-type DNS document (`dns.json`)
// - **DnsProvider**: Trait for talking to the remote DNS provider
// - **Synchronizer**: Pulls provider state into `dns.json` and pushes it back
//
// ## Design Principles
//
// 1. **Stateless stores**: Every operation re-reads its document from disk,
//    mutates it and writes it back
// 2. **Single writer per domain**: Read-modify-write cycles are serialized
//    through a per-domain lock owned by the repository
// 3. **Whole-set sync**: The provider replaces its full host list on every
//    write, so pushes always send the complete record set in one call
// 4. **Library-first**: The `folioctl` binary is a thin layer over this crate

pub mod config;
pub mod domain_name;
pub mod error;
pub mod model;
pub mod repository;
pub mod store;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use config::{FolioConfig, ProviderConfig, SyncConfig};
pub use error::{Error, Result};
pub use model::{DnsDocument, DnsRecord, DnsRecordType, HostEntry, HostRecord, Record};
pub use repository::DomainRepository;
pub use store::{DnsRecordStore, RecordStore};
pub use sync::{PushReport, SyncEvent, Synchronizer};
pub use traits::DnsProvider;
