//! Core traits for the folio system
//!
//! - [`DnsProvider`]: Read and replace a domain's host records at the provider

pub mod dns_provider;

pub use dns_provider::DnsProvider;
