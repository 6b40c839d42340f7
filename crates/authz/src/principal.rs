//! Resolved actor identity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use recordflow_core::{OrgId, RoleId, UserId};

/// A fully resolved principal for authorization decisions.
///
/// Resolved once per request by the identity collaborator and immutable for
/// the request's lifetime. Construction is decoupled from transport: the
/// calling layer derives memberships from its session/directory source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    /// Organization units the user belongs to.
    pub orgs: HashSet<OrgId>,
    /// Roles the user holds.
    pub roles: HashSet<RoleId>,
}

impl Principal {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            orgs: HashSet::new(),
            roles: HashSet::new(),
        }
    }

    pub fn with_org(mut self, org: OrgId) -> Self {
        self.orgs.insert(org);
        self
    }

    pub fn with_role(mut self, role: RoleId) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn in_org(&self, org: OrgId) -> bool {
        self.orgs.contains(&org)
    }

    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}
