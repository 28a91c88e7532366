//! Directory tree and default documents of a freshly provisioned domain

use serde_json::{Value, json};

/// Directories created for every domain, relative to the domain root
pub const DIRECTORIES: [&str; 8] = [
    "content/pages",
    "content/blog",
    "content/records",
    "assets/images/logos",
    "assets/images/hero",
    "assets/images/gallery",
    "assets/media",
    "config",
];

/// Default `config/settings.json`
pub fn default_settings(domain: &str) -> Value {
    json!({
        "domain": domain,
        "theme": "default",
        "features": [],
        "integrations": {
            "brevo": {
                "enabled": false,
                "form_id": ""
            }
        }
    })
}

/// Default `config/seo.json`
pub fn default_seo(domain: &str) -> Value {
    json!({
        "title": domain,
        "description": format!("Welcome to {}", domain),
        "keywords": [],
        "social": {
            "og_image": "",
            "twitter_card": ""
        }
    })
}
