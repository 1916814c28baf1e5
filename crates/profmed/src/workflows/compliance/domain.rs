use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::workflows::ids::{ContraindicationId, FactorId, ProfessionId};

/// Occupational hazard from the Order 131 annex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmfulFactor {
    pub id: FactorId,
    pub code: String,
    pub name: String,
    pub periodicity_months: u32,
    pub required_doctors: BTreeSet<String>,
    pub required_tests: BTreeSet<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    pub id: ProfessionId,
    pub name: String,
    pub harmful_factors: Vec<FactorId>,
    /// Decreed professions need sanitary-book checks regardless of factors.
    pub is_decreed: bool,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Moderate,
    Minor,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contraindication {
    pub id: ContraindicationId,
    pub factor_id: FactorId,
    pub condition: String,
    /// ICD-10 code, e.g. `J44`.
    pub icd_code: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchChannel {
    FindingsText,
    IcdCode,
}

/// One hit produced by the contraindication check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContraindicationMatch {
    pub contraindication_id: ContraindicationId,
    pub condition: String,
    pub icd_code: Option<String>,
    pub severity: Severity,
    pub channel: MatchChannel,
}

/// Whether a contraindication hit by both text and ICD code is reported once or twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContraindicationMatching {
    #[default]
    PerChannel,
    Deduplicated,
}

impl ContraindicationMatching {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "per_channel" | "per-channel" => Some(Self::PerChannel),
            "deduplicated" | "dedupe" => Some(Self::Deduplicated),
            _ => None,
        }
    }
}
