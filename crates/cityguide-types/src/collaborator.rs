//! Data capabilities owned by external collaborators.
//!
//! The business directory, the landmark directory and the cultural archive are
//! backed by whatever the deployment provides (a CSV export, a remote API). Their failures are plain
//! strings: the tools wrapping them turn every failure into a degraded result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query for the business directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessQuery {
    /// Business category or type (e.g. "restaurant", "bakery").
    pub category: String,
    /// Optional refinement matched against name, address, description.
    #[serde(default)]
    pub keyword: String,
    /// Maximum number of records.
    pub limit: usize,
}

/// One business returned by the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
}

/// Search capability over the business directory.
#[async_trait]
pub trait BusinessDirectory: Send + Sync {
    async fn search(&self, query: &BusinessQuery) -> Result<Vec<BusinessRecord>, String>;
}

/// Query for the landmark directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkQuery {
    pub city: String,
    /// Kind of landmark (cultural, historical, museum, ...).
    pub landmark_type: String,
    pub limit: usize,
}

/// One landmark returned by the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

/// Discovery capability over cultural landmarks and notable places.
#[async_trait]
pub trait LandmarkDirectory: Send + Sync {
    async fn discover(&self, query: &LandmarkQuery) -> Result<Vec<LandmarkRecord>, String>;
}

/// Narrative fields known about a business or landmark. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CulturalFact {
    #[serde(default)]
    pub cultural_context: Option<String>,
    #[serde(default)]
    pub historical_significance: Option<String>,
    #[serde(default)]
    pub community_impact: Option<String>,
    #[serde(default)]
    pub visit_context: Option<String>,
}

/// Lookup capability over cultural and historical narratives.
#[async_trait]
pub trait CulturalArchive: Send + Sync {
    /// `Ok(None)` means the archive has nothing on this place.
    async fn lookup(
        &self,
        business_name: &str,
        location: &str,
    ) -> Result<Option<CulturalFact>, String>;
}
