//! Users act as tour guides and review authors. Deactivated users are
//! kept in the collection but excluded from every query.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Model, ValidationErrors};
use crate::query::DocumentQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    User,
    Guide,
    LeadGuide,
    Admin,
}

fn default_photo() -> String {
    "default.jpg".to_string()
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,

    pub email: String,

    #[serde(default = "default_photo")]
    pub photo: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default = "default_active")]
    pub active: bool,
}

impl Model for User {
    const COLLECTION: &'static str = "users";
    const HIDDEN_FIELDS: &'static [&'static str] = &["active"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["email"];

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        errors
            .check(!self.name.is_empty(), "name", "Please tell us your name")
            .check(is_email(&self.email), "email", "Please provide a valid email");

        errors.into_result()
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }

    fn scope_query(query: DocumentQuery) -> DocumentQuery {
        query.where_field("active", json!({ "$ne": false }))
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let user: User = serde_json::from_value(json!({
            "name": "Leo Gillespie",
            "email": "leo@example.io"
        }))
        .unwrap();

        assert_eq!(user.photo, "default.jpg");
        assert_eq!(user.role, Role::User);
        assert!(user.active);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_role_kebab_case() {
        let user: User = serde_json::from_value(json!({
            "name": "Steve T",
            "email": "steve@example.io",
            "role": "lead-guide"
        }))
        .unwrap();

        assert_eq!(user.role, Role::LeadGuide);
    }

    #[test]
    fn test_email_normalized_and_checked() {
        let mut user: User = serde_json::from_value(json!({
            "name": "Kate",
            "email": "  Kate@Example.IO "
        }))
        .unwrap();
        user.normalize();
        assert_eq!(user.email, "kate@example.io");
        assert!(user.validate().is_ok());

        for bad in ["kate", "@example.io", "kate@", "kate@example", "a@b@c.io"] {
            assert!(!is_email(bad), "{bad}");
        }
    }
}
