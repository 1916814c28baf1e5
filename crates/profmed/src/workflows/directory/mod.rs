//! Organizations, staff, employees and clinic partnerships.

pub mod access;
pub mod domain;
pub mod employees;
pub mod events;
pub mod partnerships;

#[cfg(test)]
mod tests;

pub use access::{OpenAccess, SubscriptionGate};
pub use domain::{
    Employee, NewEmployee, Organization, OrganizationKind, Partnership, PartnershipStatus,
    StaffMember, StaffRole, UserRef,
};
pub use employees::{EmployeeDirectory, EmployeeUpdate};
pub use events::{employee_event_channel, EmployeeEvent, EmployeeEventPublisher, NoopEvents};
pub use partnerships::{clinics_available_to, AvailableClinic, PartnershipService, PartnershipTerms};
