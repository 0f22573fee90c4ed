use std::fmt;

use uuid::Uuid;
use validator::Validate;

/// How a caller names a role: by id or by its unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRef {
    Id(Uuid),
    Name(String),
}

impl RoleRef {
    /// Anything that parses as a UUID is an id; everything else is a name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(match Uuid::parse_str(value) {
            Ok(id) => RoleRef::Id(id),
            Err(_) => RoleRef::Name(value.to_string()),
        })
    }
}

impl fmt::Display for RoleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleRef::Id(id) => write!(f, "{}", id),
            RoleRef::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct CreateRole {
    #[validate(length(min = 2, max = 50, message = "Role name must be 2 to 50 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Validate)]
pub struct UpdateRole {
    pub id: Uuid,

    #[validate(length(min = 2, max = 50, message = "Role name must be 2 to 50 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

impl UpdateRole {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoleFilter {
    /// Case-insensitive substring of the role name.
    pub name: Option<String>,
}

impl RoleFilter {
    pub fn name_pattern(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ref_detects_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(RoleRef::parse(&id.to_string()), Some(RoleRef::Id(id)));
        assert_eq!(
            RoleRef::parse(" admin "),
            Some(RoleRef::Name("admin".to_string()))
        );
        assert_eq!(RoleRef::parse("   "), None);
    }

    #[test]
    fn test_create_role_limits_count_characters() {
        let ok = CreateRole {
            name: "ад".to_string(),
            description: String::new(),
        };
        assert!(ok.validate().is_ok());

        let short = CreateRole {
            name: "a".to_string(),
            description: String::new(),
        };
        assert!(short.validate().is_err());

        let long_description = CreateRole {
            name: "auditor".to_string(),
            description: "x".repeat(501),
        };
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_update_role_emptiness() {
        let update = UpdateRole {
            id: Uuid::new_v4(),
            name: None,
            description: None,
        };
        assert!(update.is_empty());
    }
}
