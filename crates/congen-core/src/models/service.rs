use serde::{Deserialize, Serialize};

/// Kind of external asset service listed by `GET /storage/service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Template = 1,
    Music = 2,
    Audio = 3,
}

impl ServiceType {
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(ServiceType::Template),
            2 => Some(ServiceType::Music),
            3 => Some(ServiceType::Audio),
            _ => None,
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub service_type: i64,
    pub url: String,
}

impl ServiceEntry {
    pub fn is_of(&self, service_type: ServiceType) -> bool {
        self.service_type == service_type as i64
    }
}
