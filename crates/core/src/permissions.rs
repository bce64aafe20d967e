//! Request identity and the owner-or-admin authorization rule.
//!
//! An [`Identity`] is resolved fresh for every request and passed
//! explicitly to [`can_act`]; nothing here is cached across requests, so a
//! role change or ownership change takes effect on the very next call.

use serde::Serialize;

use crate::roles::Role;
use crate::types::DbId;

/// The resolved actor behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    Anonymous,
    User { user_id: DbId, role: Role },
}

impl Identity {
    pub fn user(user_id: DbId, role: Role) -> Self {
        Identity::User { user_id, role }
    }

    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Identity::Anonymous => None,
            Identity::User { user_id, .. } => Some(*user_id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Identity::User {
                role: Role::Admin,
                ..
            }
        )
    }
}

/// Decide whether `identity` may mutate a resource owned by `owner_id`.
///
/// 1. Anonymous identities may never act.
/// 2. Admins may act on anything, regardless of ownership.
/// 3. Users may act only on resources they own.
///
/// `owner_id` is `None` when the owning account no longer exists; such
/// resources are admin-only.
pub fn can_act(identity: &Identity, owner_id: Option<DbId>) -> bool {
    match identity {
        Identity::Anonymous => false,
        Identity::User {
            role: Role::Admin, ..
        } => true,
        Identity::User {
            user_id,
            role: Role::User,
        } => owner_id == Some(*user_id),
    }
}
