//! Agent/actor registry listing

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Filters accepted by the registry listing.
///
/// The cache key embeds the JSON encoding of the filters. Field order is
/// fixed by the struct definition, so equal filters always encode to the
/// same string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryFilters {
    pub entity_type: Option<String>,
    pub search: Option<String>,
    pub on_chain_only: bool,
    pub sort_by: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl RegistryFilters {
    /// Canonical encoding used as the key segment
    pub fn cache_segment(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub agent_id: Option<String>,
    pub on_chain: bool,
    pub reputation_points: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryData {
    pub entries: Vec<RegistryEntry>,
    pub total: u64,
}
