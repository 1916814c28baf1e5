//! Baseline Order 131 reference data.

use super::catalog::{NewHarmfulFactor, ReferenceCatalog};
use super::domain::Severity;
use crate::workflows::error::WorkflowError;

struct FactorSeed {
    code: &'static str,
    name: &'static str,
    doctors: &'static [&'static str],
    tests: &'static [&'static str],
}

const FACTORS: &[FactorSeed] = &[
    FactorSeed {
        code: "1.1.1",
        name: "Industrial dust",
        doctors: &["therapist", "otolaryngologist", "pulmonologist"],
        tests: &["chest x-ray", "spirometry"],
    },
    FactorSeed {
        code: "1.2.1",
        name: "Noise",
        doctors: &["otolaryngologist", "neurologist"],
        tests: &["audiometry"],
    },
    FactorSeed {
        code: "1.3.1",
        name: "Ultraviolet radiation",
        doctors: &["ophthalmologist", "dermatologist"],
        tests: &["fundus examination"],
    },
    FactorSeed {
        code: "2.1.1",
        name: "Welding aerosols",
        doctors: &["therapist", "otolaryngologist", "pulmonologist"],
        tests: &["chest x-ray", "spirometry", "complete blood count"],
    },
    FactorSeed {
        code: "3.1.1",
        name: "Work at height",
        doctors: &["therapist", "ophthalmologist", "neurologist"],
        tests: &["ECG", "vestibulometry"],
    },
];

type ProfessionSeed = (&'static str, &'static [&'static str], bool, &'static [&'static str]);

const PROFESSIONS: &[ProfessionSeed] = &[
    (
        "Electric Welder",
        &["2.1.1", "1.3.1", "1.2.1"],
        false,
        &["welder", "welding", "electric welder"],
    ),
    ("Miner", &["1.1.1", "1.2.1"], false, &["miner", "mine", "mining"]),
    (
        "Crane Operator",
        &["3.1.1", "1.2.1"],
        false,
        &["crane operator", "crane", "crane driver"],
    ),
    ("Cook", &[], true, &["cook", "kitchen", "catering"]),
    ("Teacher", &[], true, &["teacher", "educator", "lecturer"]),
];

const CONTRAINDICATIONS: &[(&str, &str, &str)] = &[
    (
        "1.1.1",
        "Chronic lung disease with respiratory failure",
        "J44",
    ),
    ("1.2.1", "Persistent hearing loss", "H90"),
    ("3.1.1", "Visual acuity below 0.8", "H52"),
    ("3.1.1", "Epilepsy", "G40"),
];

/// Factors, professions and contraindications every deployment starts with.
pub fn order_131_catalog() -> Result<ReferenceCatalog, WorkflowError> {
    let mut catalog = ReferenceCatalog::default();

    for seed in FACTORS {
        catalog.add_factor(NewHarmfulFactor {
            code: seed.code.to_string(),
            name: seed.name.to_string(),
            periodicity_months: 12,
            required_doctors: seed.doctors.iter().map(|doctor| doctor.to_string()).collect(),
            required_tests: seed.tests.iter().map(|test| test.to_string()).collect(),
        })?;
    }

    for (name, factor_codes, is_decreed, keywords) in PROFESSIONS {
        catalog.add_profession(name, factor_codes, *is_decreed, keywords)?;
    }

    for (factor_code, condition, icd_code) in CONTRAINDICATIONS {
        catalog.add_contraindication(factor_code, condition, Some(*icd_code), Severity::Critical)?;
    }

    Ok(catalog)
}
