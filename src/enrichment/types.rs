use serde::{Deserialize, Serialize};

/// Enrichment payload returned by the enrichment endpoint for one website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub website: String,
    pub name: String,
    #[serde(default)]
    pub alternative_names: Vec<String>,
    pub primary_location: PrimaryLocation,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub evidence: Evidence,
}

/// Headquarters location with the model's confidence (0..=1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryLocation {
    pub city: String,
    pub region: String,
    pub country: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(default)]
    pub websites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Source links backing each enriched category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub name_sources: Vec<String>,
    #[serde(default)]
    pub location_sources: Vec<String>,
    #[serde(default)]
    pub competitor_sources: Vec<String>,
}

/// Request body sent to the enrichment endpoint
#[derive(Debug, Clone, Serialize)]
pub(crate) struct EnrichRequest<'a> {
    pub website: &'a str,
}

/// Error body returned by the enrichment endpoint on failure
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
