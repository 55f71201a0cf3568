//! Authorization: principals, permissions and the pre/post policy wrapped around every service call.

mod permissions;
mod policy;
mod principal;

pub use permissions::{AllowAll, DenyAll, FnEvaluator, Grantee, PermissionEvaluator, PermissionTable};
pub use policy::{AuthorizationPolicy, DEFAULT_SUPER_ADMIN_ROLE};
pub use principal::Principal;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action checked against an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::Create => "CREATE",
            Permission::Read => "READ",
            Permission::Update => "UPDATE",
            Permission::Delete => "DELETE",
        };
        f.write_str(s)
    }
}
