use crate::infra::{parse_date, seeded_workflows};
use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use profmed::clock::{Clock, FixedClock};
use profmed::config::WorkflowSettings;
use profmed::error::AppError;
use profmed::notifications::RecordingSender;
use profmed::workflows::documents::{DocumentContent, SignatureAudit, SignerRole};
use profmed::workflows::examinations::{DoctorFindings, ExaminationResult};
use profmed::workflows::scheduling::CalendarPlanRequest;
use profmed::workflows::WorkflowError;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Demo start date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// First day of the calendar plan (YYYY-MM-DD). Defaults to a week after `today`.
    #[arg(long, value_parser = parse_date)]
    pub(crate) plan_start: Option<NaiveDate>,
    /// Verdict the final reviewer gives: fit, unfit or limited.
    #[arg(long, value_parser = parse_result)]
    pub(crate) result: Option<ExaminationResult>,
    /// Print the final act as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_result(raw: &str) -> Result<ExaminationResult, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "fit" => Ok(ExaminationResult::Fit),
        "unfit" => Ok(ExaminationResult::Unfit),
        "limited" => Ok(ExaminationResult::Limited),
        other => Err(format!("unknown result '{other}' (expected fit, unfit or limited)")),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        plan_start,
        result,
        json,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let plan_start = plan_start.unwrap_or(today + Duration::days(7));
    let result = result.unwrap_or(ExaminationResult::Fit);
    let year = plan_start.year();

    let start = today
        .and_hms_opt(8, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| WorkflowError::Validation(format!("cannot start the demo on {today}")))?;
    let clock = Arc::new(FixedClock::new(start));
    let sender = RecordingSender::default();
    let seeded = seeded_workflows(
        Arc::new(sender.clone()),
        WorkflowSettings::default(),
        clock.clone(),
    )?;
    let workflows = &seeded.workflows;
    let dir = &seeded.directory;

    println!("Order 131 workflow demo ({today})");

    let roster = workflows.schedule.generate_roster(dir.employer, year)?;
    if let DocumentContent::Roster(content) = &roster.content {
        println!("\nRoster {} for {year}: {} employee(s) due", roster.id, content.total_count);
        for entry in &content.employees {
            println!(
                "  - {} | {} | {} | factors: {}",
                entry.full_name, entry.position, entry.department, entry.harmful_factors
            );
        }
    }

    let scheduled = workflows.schedule.generate_calendar_plan(CalendarPlanRequest {
        employer_id: dir.employer,
        clinic_id: dir.clinic,
        year,
        start_date: plan_start,
        end_date: None,
    })?;
    println!(
        "\nCalendar plan {}: {} day(s), {} examination(s) booked",
        scheduled.document.id,
        scheduled.plan.plan_data.len(),
        scheduled.examinations.len()
    );
    for (day, slots) in &scheduled.plan.plan_data {
        let names: Vec<&str> = slots.iter().map(|slot| slot.full_name.as_str()).collect();
        println!("  - {day}: {}", names.join(", "));
    }

    let Some(booked) = scheduled.examinations.first() else {
        println!("\nNothing booked; demo stops here.");
        return Ok(());
    };

    if let Some(visit) = plan_start
        .and_hms_opt(9, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
    {
        clock.set(visit);
    }
    let view = workflows
        .examinations
        .front_desk_view(booked.access_token.as_str())?;
    println!(
        "\nFront desk: {} at {} ({})",
        view.employee_name,
        view.clinic_name,
        view.status.label()
    );

    let examination_id = view.examination_id;
    workflows.examinations.start_examination(examination_id)?;
    for (doctor, code) in [(dir.otolaryngologist, "1.2.1"), (dir.therapist, "2.1.1")] {
        let factor_id = workflows.examinations.harmful_factor(code)?.id;
        let recorded = workflows.examinations.add_doctor_examination(
            examination_id,
            DoctorFindings {
                doctor_id: doctor,
                factor_id,
                result,
                findings: "Within normal limits".to_string(),
                recommendations: match result {
                    ExaminationResult::Limited => {
                        "Limit exposure to industrial noise".to_string()
                    }
                    _ => String::new(),
                },
                icd_codes: Vec::new(),
            },
        )?;
        println!(
            "  - {} findings recorded ({} contraindication hit(s))",
            code,
            recorded.flagged.len()
        );
    }
    let progress = workflows
        .examinations
        .get_examination_progress(examination_id)?;
    println!(
        "  Route progress: {}/{} ({}%)",
        progress.completed_count, progress.total_required, progress.percent
    );

    let completed =
        workflows
            .examinations
            .complete_examination(examination_id, result, dir.final_reviewer)?;
    println!(
        "  Completed: {} -> certificate {}",
        result.display(),
        completed.certificate.id
    );

    let act = workflows
        .schedule
        .generate_final_act(dir.employer, dir.clinic, year)?;
    println!("\nFinal act {} ({})", act.id, act.title);
    let signers = [
        (SignerRole::Clinic, dir.clinic_owner.phone.as_str()),
        (SignerRole::Employer, dir.employer_owner.phone.as_str()),
    ];
    for (role, _) in signers {
        workflows.documents.request_signature(act.id, role)?;
    }
    for (role, phone) in signers {
        clock.advance(Duration::minutes(1));
        let code = latest_code(&sender, phone).ok_or_else(|| {
            WorkflowError::Precondition(format!("no signing code reached {phone}"))
        })?;
        workflows.documents.verify_and_sign(
            act.id,
            role,
            &code,
            SignatureAudit {
                ip_address: None,
                user_agent: Some("profmed-demo".to_string()),
            },
        )?;
        println!("  - signed by the {} at {}", role.label(), clock.now());
    }
    let approved = workflows.documents.approve_document(act.id)?;
    println!("  Status: {}", approved.status().label());

    if json {
        match serde_json::to_string_pretty(&approved.content) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("  Final act payload unavailable: {err}"),
        }
    }

    let sent = sender.sent();
    println!("\nMessages sent: {}", sent.len());
    for (recipient, message) in sent {
        let first_line = message.lines().next().unwrap_or_default();
        println!("  - {recipient}: {first_line}");
    }

    Ok(())
}

fn latest_code(sender: &RecordingSender, phone: &str) -> Option<String> {
    sender.sent_to(phone).iter().rev().find_map(|message| {
        let (prefix, code) = message.lines().next()?.rsplit_once(": ")?;
        prefix
            .starts_with("Code for signing document")
            .then(|| code.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_parse_case_insensitively() {
        assert_eq!(parse_result(" Limited "), Ok(ExaminationResult::Limited));
        assert!(parse_result("maybe").is_err());
    }

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs {
            today: NaiveDate::from_ymd_opt(2025, 3, 3),
            plan_start: NaiveDate::from_ymd_opt(2025, 4, 1),
            result: Some(ExaminationResult::Limited),
            json: false,
        })
        .expect("demo completes");
    }
}
