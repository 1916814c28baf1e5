use chrono::{DateTime, Datelike, Utc};

use super::roster::UNSPECIFIED_POSITION;
use crate::store::Ledger;
use crate::workflows::directory::Organization;
use crate::workflows::documents::{
    FinalActContent, FinalActEntry, FinalActStatistics, TransferEntry,
};
use crate::workflows::examinations::{ExaminationResult, ExaminationStatus, MedicalExamination};

fn completed_in_year(examination: &MedicalExamination, year: i32) -> bool {
    examination.status() == ExaminationStatus::Completed
        && examination
            .completed_at()
            .map_or(false, |at| at.year() == year)
}

/// Tallies the employer's examinations completed at `clinic` during `year`.
pub(crate) fn build_final_act(
    ledger: &Ledger,
    employer: &Organization,
    clinic: &Organization,
    year: i32,
    now: DateTime<Utc>,
) -> FinalActContent {
    let mut statistics = FinalActStatistics::default();
    let mut professional_diseases = Vec::new();
    let mut transfer_needed = Vec::new();

    let examinations = ledger.examinations().filter(|examination| {
        examination.employer_id == employer.id
            && examination.clinic_id == clinic.id
            && completed_in_year(examination, year)
    });

    for examination in examinations {
        statistics.total_examined += 1;
        let Some(result) = examination.result() else {
            continue;
        };

        let employee = ledger.employee(examination.employee_id);
        let full_name = employee.map(|e| e.full_name()).unwrap_or_default();
        let position = employee
            .and_then(|e| e.position)
            .and_then(|id| ledger.catalog().profession(id))
            .map(|profession| profession.name.clone())
            .unwrap_or_else(|| UNSPECIFIED_POSITION.to_string());

        match result {
            ExaminationResult::Fit => statistics.fit += 1,
            ExaminationResult::Unfit => {
                statistics.unfit += 1;
                professional_diseases.push(FinalActEntry {
                    employee_id: examination.employee_id,
                    full_name,
                    position,
                });
            }
            ExaminationResult::Limited => {
                statistics.limited += 1;
                let recommendations = examination
                    .doctor_examinations
                    .iter()
                    .map(|record| record.recommendations.trim())
                    .find(|text| !text.is_empty())
                    .unwrap_or_default()
                    .to_string();
                transfer_needed.push(TransferEntry {
                    employee_id: examination.employee_id,
                    full_name,
                    position,
                    recommendations,
                });
            }
        }
    }

    FinalActContent {
        employer_name: employer.name.clone(),
        clinic_name: clinic.name.clone(),
        year,
        statistics,
        professional_diseases,
        transfer_needed,
        generated_at: now,
    }
}
