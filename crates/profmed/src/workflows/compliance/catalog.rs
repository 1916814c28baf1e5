use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::{Contraindication, HarmfulFactor, Profession, Severity};
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{ContraindicationId, FactorId, ProfessionId};

/// Reference data: harmful factors, professions and contraindications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    factors: BTreeMap<FactorId, HarmfulFactor>,
    professions: BTreeMap<ProfessionId, Profession>,
    contraindications: BTreeMap<ContraindicationId, Contraindication>,
    next_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewHarmfulFactor {
    pub code: String,
    pub name: String,
    pub periodicity_months: u32,
    pub required_doctors: Vec<String>,
    pub required_tests: Vec<String>,
}

impl ReferenceCatalog {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_factor(&mut self, factor: NewHarmfulFactor) -> Result<FactorId, WorkflowError> {
        let code = factor.code.trim().to_string();
        if code.is_empty() || factor.name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "harmful factor needs a code and a name".to_string(),
            ));
        }
        if factor.periodicity_months == 0 {
            return Err(WorkflowError::Validation(format!(
                "harmful factor {code} needs a periodicity of at least one month"
            )));
        }
        if self.factor_by_code(&code).is_some() {
            return Err(WorkflowError::Conflict(format!(
                "harmful factor code {code} already exists"
            )));
        }

        let id = FactorId(self.allocate());
        self.factors.insert(
            id,
            HarmfulFactor {
                id,
                code,
                name: factor.name.trim().to_string(),
                periodicity_months: factor.periodicity_months,
                required_doctors: normalize_set(factor.required_doctors),
                required_tests: normalize_set(factor.required_tests),
                is_active: true,
            },
        );
        Ok(id)
    }

    pub fn add_profession(
        &mut self,
        name: &str,
        factor_codes: &[&str],
        is_decreed: bool,
        keywords: &[&str],
    ) -> Result<ProfessionId, WorkflowError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkflowError::Validation(
                "profession name is required".to_string(),
            ));
        }
        if self.profession_by_name(name).is_some() {
            return Err(WorkflowError::Conflict(format!(
                "profession {name} already exists"
            )));
        }

        let harmful_factors = factor_codes
            .iter()
            .map(|code| {
                self.factor_by_code(code)
                    .map(|factor| factor.id)
                    .ok_or_else(|| WorkflowError::not_found("harmful factor", code))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = ProfessionId(self.allocate());
        self.professions.insert(
            id,
            Profession {
                id,
                name: name.to_string(),
                harmful_factors,
                is_decreed,
                keywords: keywords
                    .iter()
                    .map(|keyword| keyword.trim().to_string())
                    .filter(|keyword| !keyword.is_empty())
                    .collect(),
            },
        );
        Ok(id)
    }

    pub fn add_contraindication(
        &mut self,
        factor_code: &str,
        condition: &str,
        icd_code: Option<&str>,
        severity: Severity,
    ) -> Result<ContraindicationId, WorkflowError> {
        let factor_id = self
            .factor_by_code(factor_code)
            .map(|factor| factor.id)
            .ok_or_else(|| WorkflowError::not_found("harmful factor", factor_code))?;
        if condition.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "contraindication condition is required".to_string(),
            ));
        }

        let id = ContraindicationId(self.allocate());
        self.contraindications.insert(
            id,
            Contraindication {
                id,
                factor_id,
                condition: condition.trim().to_string(),
                icd_code: icd_code
                    .map(|code| code.trim().to_string())
                    .filter(|code| !code.is_empty()),
                severity,
            },
        );
        Ok(id)
    }

    pub fn set_factor_active(&mut self, id: FactorId, active: bool) -> Result<(), WorkflowError> {
        let factor = self
            .factors
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("harmful factor", id))?;
        factor.is_active = active;
        Ok(())
    }

    pub fn set_factor_periodicity(&mut self, id: FactorId, months: u32) -> Result<(), WorkflowError> {
        if months == 0 {
            return Err(WorkflowError::Validation(format!(
                "harmful factor {id} needs a periodicity of at least one month"
            )));
        }
        let factor = self
            .factors
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("harmful factor", id))?;
        factor.periodicity_months = months;
        Ok(())
    }

    pub fn factor(&self, id: FactorId) -> Option<&HarmfulFactor> {
        self.factors.get(&id)
    }

    pub fn factor_by_code(&self, code: &str) -> Option<&HarmfulFactor> {
        let code = code.trim();
        self.factors.values().find(|factor| factor.code == code)
    }

    pub fn profession(&self, id: ProfessionId) -> Option<&Profession> {
        self.professions.get(&id)
    }

    pub fn profession_by_name(&self, name: &str) -> Option<&Profession> {
        let name = name.trim().to_lowercase();
        self.professions
            .values()
            .find(|profession| profession.name.to_lowercase() == name)
    }

    /// Professions in name order, the order fuzzy lookups walk them in.
    pub fn professions(&self) -> Vec<&Profession> {
        let mut professions: Vec<_> = self.professions.values().collect();
        professions.sort_by_key(|profession| profession.name.to_lowercase());
        professions
    }

    pub fn active_factors_of(&self, profession: &Profession) -> Vec<&HarmfulFactor> {
        profession
            .harmful_factors
            .iter()
            .filter_map(|id| self.factors.get(id))
            .filter(|factor| factor.is_active)
            .collect()
    }

    pub fn active_factors_for_profession(&self, id: ProfessionId) -> Vec<&HarmfulFactor> {
        self.profession(id)
            .map(|profession| self.active_factors_of(profession))
            .unwrap_or_default()
    }

    pub fn contraindications_for(
        &self,
        factor: FactorId,
    ) -> impl Iterator<Item = &Contraindication> + '_ {
        self.contraindications
            .values()
            .filter(move |contraindication| contraindication.factor_id == factor)
    }
}

fn normalize_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}
