//! Domain name validation and registrable-domain splitting
//!
//! The provider addresses a domain as a second-level label (`SLD`) plus a
//! public suffix (`TLD`). Splitting on the first dot breaks multi-label
//! suffixes such as `co.uk` or `com.au`, so the split is driven by the
//! public suffix list instead.

use crate::error::{Error, Result};

/// Normalize a domain name: trim, lowercase, strip a trailing root dot
pub fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::validation("Domain name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(Error::validation(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(Error::validation(format!(
            "Domain name needs at least two labels: '{}'",
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::validation(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::validation(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::validation(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::validation(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Second-level label and public suffix of a registrable domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParts {
    /// Label directly below the public suffix (`example` in `www.example.co.uk`)
    pub sld: String,
    /// Public suffix (`co.uk` in `www.example.co.uk`)
    pub tld: String,
}

/// Split a domain into its registrable SLD and public suffix
///
/// Sub-domains are reduced to their registrable domain first, so
/// `www.example.com` yields `example` / `com`. Unknown suffixes fall back to
/// the last label, which is what the provider expects for them.
pub fn split(domain: &str) -> Result<DomainParts> {
    let domain = normalize(domain);
    validate(&domain)?;

    let suffix = psl::suffix_str(&domain).ok_or_else(|| {
        Error::validation(format!("No public suffix found for domain: {}", domain))
    })?;

    let registrable = psl::domain_str(&domain).ok_or_else(|| {
        Error::validation(format!(
            "Domain '{}' is a public suffix, not a registrable domain",
            domain
        ))
    })?;

    let sld = registrable
        .strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|sld| !sld.is_empty())
        .ok_or_else(|| {
            Error::validation(format!("Cannot derive second-level label from: {}", domain))
        })?;

    Ok(DomainParts {
        sld: sld.to_string(),
        tld: suffix.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(sld: &str, tld: &str) -> DomainParts {
        DomainParts {
            sld: sld.to_string(),
            tld: tld.to_string(),
        }
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(split("example.com").unwrap(), parts("example", "com"));
        assert_eq!(split("Example.COM.").unwrap(), parts("example", "com"));
    }

    #[test]
    fn test_split_multi_label_suffix() {
        assert_eq!(split("example.co.uk").unwrap(), parts("example", "co.uk"));
        assert_eq!(split("shop.com.au").unwrap(), parts("shop", "com.au"));
    }

    #[test]
    fn test_split_subdomain_uses_registrable_domain() {
        assert_eq!(split("www.example.com").unwrap(), parts("example", "com"));
    }

    #[test]
    fn test_split_unknown_suffix_uses_last_label() {
        assert_eq!(split("acme.test").unwrap(), parts("acme", "test"));
    }

    #[test]
    fn test_split_rejects_bare_suffix() {
        assert!(split("co.uk").is_err());
        assert!(split("com").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(validate("example.com").is_ok());
        assert!(validate("my-site.example.com").is_ok());
        assert!(validate("").is_err());
        assert!(validate("localhost").is_err());
        assert!(validate("bad..example.com").is_err());
        assert!(validate("-bad.example.com").is_err());
        assert!(validate("bad_label.example.com").is_err());
        assert!(validate(&format!("{}.com", "a".repeat(64))).is_err());
    }
}
