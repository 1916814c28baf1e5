//! Compliance rules: professions to harmful factors, factors to doctors and tests,
//! findings to contraindications.

pub mod catalog;
pub mod domain;
pub mod rules;
pub mod seed;

pub use catalog::{NewHarmfulFactor, ReferenceCatalog};
pub use domain::{
    Contraindication, ContraindicationMatch, ContraindicationMatching, HarmfulFactor,
    MatchChannel, Profession, Severity,
};
pub use rules::{
    auto_map_factors, check_contraindications, match_profession, required_doctors_for,
    required_tests_for,
};
pub use seed::order_131_catalog;
