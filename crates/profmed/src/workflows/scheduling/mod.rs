//! Rosters, calendar plans and final acts.

pub mod calendar;
mod final_act;
pub mod refresher;
pub mod roster;
mod service;

#[cfg(test)]
mod tests;

pub use calendar::{allocate, Allocation, CalendarPlan, CalendarPlanRequest};
pub use refresher::RosterRefresher;
pub use roster::{
    birth_date_from_national_id, gender_from_national_id, needs_examination, tenure_label,
};
pub use service::{ScheduleService, ScheduledPlan};
