//! Lookups and matching over the reference catalog. Nothing here mutates state.

use std::collections::{BTreeSet, HashSet};

use super::catalog::ReferenceCatalog;
use super::domain::{
    ContraindicationMatch, ContraindicationMatching, HarmfulFactor, MatchChannel, Profession,
};
use crate::workflows::ids::FactorId;

/// Resolves a free-text job title to the active harmful factors of the closest profession.
///
/// Tries an exact (case-insensitive) name, then the profession keywords, then a partial
/// name match. The first profession found wins; no match yields an empty list.
pub fn auto_map_factors<'a>(
    catalog: &'a ReferenceCatalog,
    profession_name: &str,
) -> Vec<&'a HarmfulFactor> {
    match match_profession(catalog, profession_name) {
        Some(profession) => catalog.active_factors_of(profession),
        None => Vec::new(),
    }
}

pub fn match_profession<'a>(
    catalog: &'a ReferenceCatalog,
    profession_name: &str,
) -> Option<&'a Profession> {
    let needle = profession_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = catalog.profession_by_name(&needle) {
        return Some(exact);
    }

    let professions = catalog.professions();
    professions
        .iter()
        .find(|profession| {
            profession.keywords.iter().any(|keyword| {
                let keyword = keyword.to_lowercase();
                keyword.contains(&needle) || needle.contains(&keyword)
            })
        })
        .or_else(|| {
            professions
                .iter()
                .find(|profession| profession.name.to_lowercase().contains(&needle))
        })
        .copied()
}

pub fn required_doctors_for<'a, I>(factors: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a HarmfulFactor>,
{
    factors
        .into_iter()
        .flat_map(|factor| factor.required_doctors.iter().cloned())
        .collect()
}

pub fn required_tests_for<'a, I>(factors: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a HarmfulFactor>,
{
    factors
        .into_iter()
        .flat_map(|factor| factor.required_tests.iter().cloned())
        .collect()
}

/// Flags the factor's contraindications that the findings text or ICD codes point at.
///
/// Text matching is case-insensitive containment in either direction; blank findings never
/// match by text. ICD codes compare trimmed and case-insensitively.
pub fn check_contraindications(
    catalog: &ReferenceCatalog,
    factor: FactorId,
    findings: &str,
    icd_codes: &[String],
    matching: ContraindicationMatching,
) -> Vec<ContraindicationMatch> {
    let findings = findings.trim().to_lowercase();
    let codes: HashSet<String> = icd_codes
        .iter()
        .map(|code| code.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .collect();

    let mut matches = Vec::new();
    for contraindication in catalog.contraindications_for(factor) {
        let condition = contraindication.condition.to_lowercase();
        let text_hit = !findings.is_empty()
            && (findings.contains(&condition) || condition.contains(&findings));
        let code_hit = contraindication
            .icd_code
            .as_ref()
            .map(|code| codes.contains(&code.trim().to_ascii_uppercase()))
            .unwrap_or(false);

        let channels = [
            (text_hit, MatchChannel::FindingsText),
            (code_hit, MatchChannel::IcdCode),
        ];
        for (hit, channel) in channels {
            if !hit {
                continue;
            }
            matches.push(ContraindicationMatch {
                contraindication_id: contraindication.id,
                condition: contraindication.condition.clone(),
                icd_code: contraindication.icd_code.clone(),
                severity: contraindication.severity,
                channel,
            });
            if matching == ContraindicationMatching::Deduplicated {
                break;
            }
        }
    }
    matches
}
