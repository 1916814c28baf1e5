use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::documents::PlanSlot;
use crate::workflows::ids::{DocumentId, OrganizationId};

/// Which clinic sees which employees on which day, one per employer and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarPlan {
    pub employer_id: OrganizationId,
    pub clinic_id: OrganizationId,
    pub year: i32,
    pub plan_data: BTreeMap<NaiveDate, Vec<PlanSlot>>,
    pub overflow_date: Option<NaiveDate>,
    pub document_id: Option<DocumentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarPlan {
    pub fn scheduled_count(&self) -> usize {
        self.plan_data.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarPlanRequest {
    pub employer_id: OrganizationId,
    pub clinic_id: OrganizationId,
    pub year: i32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<T> {
    pub days: BTreeMap<NaiveDate, Vec<T>>,
    /// Set when the range ran out and the rest went onto the end date over capacity.
    pub overflow_date: Option<NaiveDate>,
}

/// Fills each day up to `capacity`, in order, starting at `start`.
///
/// With an `end` date, whatever is left once the range is exhausted lands on `end`
/// regardless of capacity. Days never receive an empty list.
pub fn allocate<T>(
    items: impl IntoIterator<Item = T>,
    capacity: u32,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Allocation<T> {
    let capacity = capacity.max(1) as usize;
    let mut days: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    let mut overflow_date = None;
    let mut current = Some(start);

    for item in items {
        let day = match (current, end) {
            (Some(day), Some(end)) if day <= end => day,
            (Some(day), None) => day,
            (_, Some(end)) => {
                days.entry(end).or_default().push(item);
                overflow_date = Some(end);
                continue;
            }
            (None, None) => {
                // Calendar exhausted; nothing sensible is left to schedule onto.
                break;
            }
        };

        let slots = days.entry(day).or_default();
        slots.push(item);
        if slots.len() >= capacity {
            current = day.succ_opt();
        }
    }

    Allocation {
        days,
        overflow_date,
    }
}
