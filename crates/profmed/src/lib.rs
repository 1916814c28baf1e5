//! Workflow core for Order 131 occupational health examinations.
//!
//! Employers, clinics and employees meet here: rosters of employees due for an
//! examination, capacity-bounded calendar plans, the examination state machine and
//! the legal documents (with OTP signatures) that fall out of it.

pub mod clock;
pub mod config;
pub mod error;
pub mod notifications;
pub mod store;
pub mod telemetry;
pub mod workflows;
