use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered lead, one row of the `users` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub message: String,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub email_message_id: Option<String>,
    pub admin_notification_sent: bool,
    pub admin_notification_sent_at: Option<DateTime<Utc>>,
    pub admin_notification_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated data for a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub message: String,
}

/// Partial update. `None` leaves the column untouched.
///
/// Required text columns cannot be blanked: a value that trims to nothing is
/// treated as omitted. `message` may be set to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

impl UserPatch {
    /// Column/value pairs that would actually be written, in column order.
    pub fn assignments(&self) -> Vec<(&'static str, String)> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("company", &self.company),
            ("phone", &self.phone),
        ];

        let mut assignments: Vec<(&'static str, String)> = required
            .into_iter()
            .filter_map(|(column, value)| {
                let value = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
                let value = if column == "email" {
                    normalize_email(value)
                } else {
                    value.to_string()
                };
                Some((column, value))
            })
            .collect();

        if let Some(message) = &self.message {
            assignments.push(("message", message.trim().to_string()));
        }

        assignments
    }

    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyCount {
    pub name: String,
    pub count: i64,
}

/// Lower-cased and trimmed, the only form in which emails are stored or compared.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Short view returned after registration and by the admin listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            company: user.company.clone(),
            created_at: user.created_at,
        }
    }
}

/// Full view used by the registration listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserListing {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            company: user.company.clone(),
            phone: user.phone.clone(),
            message: user.message.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  John@Example.COM "), "john@example.com");
    }

    #[test]
    fn empty_patch_has_no_assignments() {
        assert!(UserPatch::default().is_empty());
    }

    #[test]
    fn blank_required_fields_are_ignored() {
        let patch = UserPatch {
            first_name: Some("   ".to_string()),
            company: Some(" Acme ".to_string()),
            ..Default::default()
        };

        assert_eq!(patch.assignments(), vec![("company", "Acme".to_string())]);
    }

    #[test]
    fn message_can_be_cleared() {
        let patch = UserPatch {
            message: Some(String::new()),
            ..Default::default()
        };

        assert!(!patch.is_empty());
        assert_eq!(patch.assignments(), vec![("message", String::new())]);
    }

    #[test]
    fn patch_email_is_normalized() {
        let patch = UserPatch {
            email: Some(" New@Example.com".to_string()),
            ..Default::default()
        };

        assert_eq!(
            patch.assignments(),
            vec![("email", "new@example.com".to_string())]
        );
    }

    #[test]
    fn summary_serializes_in_camel_case() {
        let now = Utc::now();
        let user = User {
            id: 7,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john@example.com".to_string(),
            company: "Acme".to_string(),
            phone: "+1234567890".to_string(),
            message: String::new(),
            email_sent: false,
            email_sent_at: None,
            email_message_id: None,
            admin_notification_sent: false,
            admin_notification_sent_at: None,
            admin_notification_message_id: None,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(UserSummary::from(&user)).unwrap();
        assert_eq!(value["firstName"], "John");
        assert_eq!(value["lastName"], "Doe");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("phone").is_none());
    }
}
