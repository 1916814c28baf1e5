//! Ledger-assigned identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{:06}"), self.0)
            }
        }
    };
}

ledger_id!(OrganizationId => "org");
ledger_id!(
    /// Account of a person who can log in and sign (organization owners, staff).
    UserId => "usr"
);
ledger_id!(
    /// A staff membership of a user inside one organization.
    MemberId => "mbr"
);
ledger_id!(EmployeeId => "emp");
ledger_id!(PartnershipId => "prt");
ledger_id!(FactorId => "hf");
ledger_id!(ProfessionId => "prof");
ledger_id!(ContraindicationId => "ci");
ledger_id!(ExaminationId => "exam");
ledger_id!(DoctorExaminationId => "dexam");
ledger_id!(LabResultId => "lab");
ledger_id!(DocumentId => "doc");
