//! Asset service catalog served by `GET /storage/service`.

use std::path::Path;

use anyhow::Context;
use congen_core::models::{ServiceEntry, ServiceType};

#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    entries: Vec<ServiceEntry>,
}

impl ServiceCatalog {
    pub fn new(entries: Vec<ServiceEntry>) -> Self {
        Self { entries }
    }

    /// One placeholder entry per service type, used until a catalog file is configured.
    pub fn placeholder() -> Self {
        Self::new(vec![
            ServiceEntry {
                id: 1,
                service_type: ServiceType::Template as i64,
                url: "https://some-url-to-resource.mp4".to_string(),
            },
            ServiceEntry {
                id: 1,
                service_type: ServiceType::Music as i64,
                url: "https://some-url-to-resource.mp3".to_string(),
            },
            ServiceEntry {
                id: 1,
                service_type: ServiceType::Audio as i64,
                url: "https://some-url-to-resource.mp3".to_string(),
            },
        ])
    }

    /// Load a JSON array of `{id, type, url}` entries.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service catalog {}", path.display()))?;
        let entries: Vec<ServiceEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid service catalog {}", path.display()))?;

        if let Some(entry) = entries
            .iter()
            .find(|entry| ServiceType::from_value(entry.service_type).is_none())
        {
            anyhow::bail!(
                "Service catalog entry {} has unknown type {}",
                entry.id,
                entry.service_type
            );
        }

        Ok(Self::new(entries))
    }

    pub fn entries_for(&self, service_type: ServiceType) -> Vec<ServiceEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.is_of(service_type))
            .cloned()
            .collect()
    }
}
