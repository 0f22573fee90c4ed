//! Per-RPC permission enforcement driven by a static method table.
//!
//! Each service declares its methods once as a `&'static [MethodRule]`. The
//! table is compiled into a [`PermissionPolicy`] at startup and shared
//! read-only for the lifetime of the process.

use std::collections::HashMap;

use tonic::Status;

use crate::authz::CallerContext;

/// Methods that never require a caller identity.
pub const SYSTEM_METHODS: &[&str] = &[
    "/envoy.service.auth.v3.Authorization/Check",
    "/grpc.health.v1.Health/Check",
    "/grpc.health.v1.Health/Watch",
    "/grpc.reflection.v1alpha.ServerReflection/ServerReflectionInfo",
];

/// Access rule for one fully-qualified method (`/package.Service/Method`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRule {
    pub method: &'static str,
    pub permission: Option<&'static str>,
    pub public: bool,
}

impl MethodRule {
    /// Callable without an identity.
    pub const fn public(method: &'static str) -> Self {
        Self {
            method,
            permission: None,
            public: true,
        }
    }

    /// Any authenticated caller.
    pub const fn authenticated(method: &'static str) -> Self {
        Self {
            method,
            permission: None,
            public: false,
        }
    }

    /// Authenticated caller holding `permission` (`resource:action`).
    pub const fn requires(method: &'static str, permission: &'static str) -> Self {
        Self {
            method,
            permission: Some(permission),
            public: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Authenticated,
    Permission(&'static str),
}

#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    rules: HashMap<&'static str, Access>,
}

impl PermissionPolicy {
    /// Build the lookup table. System methods are always public; a later rule
    /// for the same method replaces an earlier one.
    pub fn from_rules(rules: &[MethodRule]) -> Self {
        let mut table: HashMap<&'static str, Access> = SYSTEM_METHODS
            .iter()
            .map(|method| (*method, Access::Public))
            .collect();

        for rule in rules {
            let access = match (rule.public, rule.permission) {
                (true, _) => Access::Public,
                (false, Some(permission)) => Access::Permission(permission),
                (false, None) => Access::Authenticated,
            };
            table.insert(rule.method, access);
        }

        tracing::debug!(methods = table.len(), "Permission policy built");
        Self { rules: table }
    }

    pub fn is_public(&self, method: &str) -> bool {
        matches!(self.rules.get(method), Some(Access::Public))
    }

    /// Permission required by `method`, if any.
    pub fn required_permission(&self, method: &str) -> Option<&'static str> {
        match self.rules.get(method) {
            Some(Access::Permission(permission)) => Some(permission),
            _ => None,
        }
    }

    /// Decide whether `caller` may invoke `method`.
    ///
    /// Methods without a rule require authentication only.
    pub fn authorize(&self, method: &str, caller: Option<&CallerContext>) -> Result<(), Status> {
        let access = self
            .rules
            .get(method)
            .copied()
            .unwrap_or(Access::Authenticated);

        if access == Access::Public {
            return Ok(());
        }

        let Some(caller) = caller else {
            return Err(Status::unauthenticated("Caller identity not found"));
        };

        match access {
            Access::Permission(permission) if !caller.has_permission(permission) => {
                tracing::warn!(
                    method = %method,
                    user_id = %caller.user_id,
                    permission = %permission,
                    "Permission denied"
                );
                Err(Status::permission_denied(format!(
                    "Missing permission {}",
                    permission
                )))
            }
            _ => Ok(()),
        }
    }
}
