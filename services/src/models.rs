use serde::{Deserialize, Serialize};

/// Collection holding one profile document per credential subject,
/// keyed by the subject id.
pub const USERS_COLLECTION: &str = "Users";

/// Collection holding the submitted forms. Documents are open-ended
/// string-keyed maps; they are written once and never mutated.
pub const FORMS_COLLECTION: &str = "Formularios";

/// Profile document stored under `Users/{uid}`.
///
/// Older documents may miss fields, so everything defaults: an absent
/// `isActive` counts as active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub created_by: Option<String>,
    pub updated_at: Option<String>,
    pub updated_by: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: String::new(),
            email: String::new(),
            full_name: String::new(),
            phone: String::new(),
            role: String::new(),
            is_active: true,
            created_at: None,
            created_by: None,
            updated_at: None,
            updated_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UserProfile;
    use serde_json::json;

    #[test]
    fn test_absent_is_active_defaults_true() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "email": "a@b.co",
            "role": "user"
        }))
        .unwrap();

        assert!(profile.is_active);
        assert_eq!(profile.full_name, "");
    }

    #[test]
    fn test_explicit_inactive() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "isActive": false
        }))
        .unwrap();

        assert!(!profile.is_active);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": "u1",
            "lastLogout": "2026-01-01T00:00:00Z",
            "extra": 42
        }))
        .unwrap();

        assert_eq!(profile.id, "u1");
    }
}
