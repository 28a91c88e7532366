// # Domain Repository
//
// Owns the on-disk tree of every domain in the workspace and the JSON
// documents inside it. The stores never touch the filesystem directly; they
// go through `load_document` / `replace_document` while holding the
// domain's write lock.
//
// ## Layout
//
// ```text
// <workspace_root>/<domain>/
// ├── content/
// │   ├── context.md
// │   ├── pages/
// │   ├── blog/
// │   └── records/
// │       ├── data.json      content records
// │       ├── schema.json
// │       └── dns.json       DNS document
// ├── assets/
// │   ├── images/{logos,hero,gallery}/
// │   └── media/
// └── config/
//     ├── settings.json
//     └── seo.json
// ```
//
// ## Writes
//
// - Atomic: new content goes to a temporary file which is then renamed
// - Serialized: one async mutex per domain, held across read-modify-write
// - Pretty-printed JSON, 2-space indent, UTF-8

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, trace, warn};

use crate::config::FolioConfig;
use crate::domain_name;
use crate::error::{Error, Result};
use crate::model::DnsDocument;

mod layout;

pub use layout::{DIRECTORIES, default_seo, default_settings};

/// Guard proving the holder is the only in-process writer of a domain
pub type DomainWriteGuard = OwnedMutexGuard<()>;

/// Per-domain directory and document owner
#[derive(Debug)]
pub struct DomainRepository {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl DomainRepository {
    /// Create a repository rooted at `root`
    ///
    /// Nothing is touched on disk until a domain is provisioned.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a repository from configuration
    pub fn from_config(config: &FolioConfig) -> Self {
        Self::new(config.workspace_root.clone())
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a domain
    ///
    /// The name is validated first, so it can never escape the workspace.
    pub fn domain_path(&self, domain: &str) -> Result<PathBuf> {
        let domain = domain_name::normalize(domain);
        domain_name::validate(&domain)?;
        Ok(self.root.join(domain))
    }

    /// Path of the content records document
    pub fn records_path(&self, domain: &str) -> Result<PathBuf> {
        Ok(self.records_dir(domain)?.join("data.json"))
    }

    /// Path of the DNS document
    pub fn dns_path(&self, domain: &str) -> Result<PathBuf> {
        Ok(self.records_dir(domain)?.join("dns.json"))
    }

    /// Path of the free-form context notes
    pub fn context_path(&self, domain: &str) -> Result<PathBuf> {
        Ok(self.domain_path(domain)?.join("content").join("context.md"))
    }

    fn records_dir(&self, domain: &str) -> Result<PathBuf> {
        Ok(self.domain_path(domain)?.join("content").join("records"))
    }

    /// Whether a domain has been provisioned
    pub async fn exists(&self, domain: &str) -> Result<bool> {
        let path = self.domain_path(domain)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Fail with [`Error::NotFound`] unless the domain has been provisioned
    pub async fn require_domain(&self, domain: &str) -> Result<()> {
        if self.exists(domain).await? {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "Domain {} is not provisioned",
                domain_name::normalize(domain)
            )))
        }
    }

    /// Provision a domain: directory tree plus default documents
    ///
    /// Fails with [`Error::AlreadyExists`] if the domain directory exists.
    pub async fn create_domain(&self, domain: &str) -> Result<PathBuf> {
        let domain = domain_name::normalize(domain);
        let base = self.domain_path(&domain)?;
        let _guard = self.lock(&domain).await;

        if fs::try_exists(&base).await? {
            return Err(Error::already_exists(format!(
                "Domain {} already exists",
                domain
            )));
        }

        if let Err(e) = self.provision(&domain, &base).await {
            // Leave nothing behind, so a retry does not hit AlreadyExists
            match fs::remove_dir_all(&base).await {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => warn!(
                    "Failed to remove partial tree {}: {}",
                    base.display(),
                    cleanup
                ),
                _ => {}
            }
            return Err(e);
        }

        info!("Created domain: {}", domain);
        Ok(base)
    }

    /// Directory tree plus default documents below `base`
    async fn provision(&self, domain: &str, base: &Path) -> Result<()> {
        for dir in DIRECTORIES {
            fs::create_dir_all(base.join(dir)).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create {}/{}: {}",
                    base.display(),
                    dir,
                    e
                ))
            })?;
        }

        fs::write(
            self.context_path(domain)?,
            format!("# {}\n\n## Domain Information\n\n", domain),
        )
        .await?;

        let config_dir = base.join("config");
        self.replace_document(&config_dir.join("settings.json"), &default_settings(domain))
            .await?;
        self.replace_document(&config_dir.join("seo.json"), &default_seo(domain))
            .await?;

        let records_dir = self.records_dir(domain)?;
        let empty = serde_json::Map::new();
        self.replace_document(&records_dir.join("data.json"), &empty)
            .await?;
        self.replace_document(&records_dir.join("schema.json"), &empty)
            .await?;
        self.replace_document(&self.dns_path(domain)?, &DnsDocument::empty())
            .await?;
        Ok(())
    }

    /// Remove a domain and everything below it
    pub async fn delete_domain(&self, domain: &str) -> Result<()> {
        let domain = domain_name::normalize(domain);
        let base = self.domain_path(&domain)?;
        let _guard = self.lock(&domain).await;

        if !fs::try_exists(&base).await? {
            return Err(Error::not_found(format!("Domain {} does not exist", domain)));
        }

        fs::remove_dir_all(&base).await.map_err(|e| {
            Error::store(format!("Failed to delete {}: {}", base.display(), e))
        })?;

        info!("Deleted domain: {}", domain);
        Ok(())
    }

    /// Names of all provisioned domains, sorted
    pub async fn list_domains(&self) -> Result<Vec<String>> {
        if !fs::try_exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut domains = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && domain_name::validate(name).is_ok()
            {
                domains.push(name.to_string());
            }
        }

        domains.sort();
        Ok(domains)
    }

    /// Read the context notes of a domain
    pub async fn read_context(&self, domain: &str) -> Result<String> {
        let path = self.context_path(domain)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::not_found(
                format!("Context file for {} does not exist", domain),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the context notes of a domain
    ///
    /// The file must already exist (the domain must be provisioned).
    pub async fn update_context(&self, domain: &str, content: &str) -> Result<()> {
        let path = self.context_path(domain)?;
        let _guard = self.lock(domain).await;

        if !fs::try_exists(&path).await? {
            return Err(Error::not_found(format!(
                "Context file for {} does not exist",
                domain
            )));
        }

        write_atomic(&path, content.as_bytes()).await?;
        debug!("Updated context for {}", domain);
        Ok(())
    }

    /// Acquire the single-writer lock of a domain
    ///
    /// Hold the guard across the whole read-modify-write cycle.
    pub async fn lock(&self, domain: &str) -> DomainWriteGuard {
        let key = domain_name::normalize(domain);
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(key).or_default())
        };
        mutex.lock_owned().await
    }

    /// Load a JSON document
    ///
    /// Returns `Ok(None)` when the file does not exist or is empty.
    pub async fn load_document<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("Document does not exist: {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let document = serde_json::from_str(&content).map_err(|e| {
            Error::store(format!(
                "Failed to parse {}: {}. File may be corrupted.",
                path.display(),
                e
            ))
        })?;

        Ok(Some(document))
    }

    /// Replace a JSON document atomically
    pub async fn replace_document<T: Serialize>(&self, path: &Path, document: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| Error::store(format!("Failed to serialize document: {}", e)))?;
        write_atomic(path, json.as_bytes()).await
    }
}

/// Write to a temporary sibling, then rename over the target
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path(path);
    {
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            Error::store(format!(
                "Failed to create temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.write_all(bytes).await.map_err(|e| {
            Error::store(format!(
                "Failed to write to temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::store(format!(
                "Failed to flush temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
    }

    fs::rename(&temp_path, path).await.map_err(|e| {
        Error::store(format!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })?;

    trace!("Document written: {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
