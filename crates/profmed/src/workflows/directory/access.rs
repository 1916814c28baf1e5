use crate::workflows::ids::OrganizationId;

/// Subscription check consulted before an organization may mutate workflow state.
pub trait SubscriptionGate: Send + Sync {
    fn has_access(&self, organization: OrganizationId) -> bool;
}

/// Gate that lets every organization through.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAccess;

impl SubscriptionGate for OpenAccess {
    fn has_access(&self, _organization: OrganizationId) -> bool {
        true
    }
}
