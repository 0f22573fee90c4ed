use service_core::authz::Permission;
use uuid::Uuid;
use validator::Validate;

/// How a caller names a permission: by id or by its `resource:action` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRef {
    Id(Uuid),
    Key { resource: String, action: String },
}

impl PermissionRef {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(id) = Uuid::parse_str(value) {
            return Some(PermissionRef::Id(id));
        }
        Permission::parse_key(value).map(|(resource, action)| PermissionRef::Key { resource, action })
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct PermissionFilter {
    /// Only permissions granted to this role.
    pub role_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100))]
    pub resource: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub action: Option<String>,
}

fn pattern(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_lowercase())
}

impl PermissionFilter {
    pub fn resource_pattern(&self) -> Option<String> {
        pattern(self.resource.as_deref())
    }

    pub fn action_pattern(&self) -> Option<String> {
        pattern(self.action.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_ref_parse() {
        let id = Uuid::new_v4();
        assert_eq!(
            PermissionRef::parse(&format!(" {} ", id)),
            Some(PermissionRef::Id(id))
        );
        assert_eq!(
            PermissionRef::parse("roles:read"),
            Some(PermissionRef::Key {
                resource: "roles".to_string(),
                action: "read".to_string(),
            })
        );
        assert_eq!(PermissionRef::parse(""), None);
        assert_eq!(PermissionRef::parse("roles"), None);
    }
}
