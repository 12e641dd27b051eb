use serde::Deserialize;

pub const CONTACT_ACKNOWLEDGEMENT: &str =
    "Your message has been submitted. We will review and respond soon.";

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Name, email, and message are required")]
    MissingFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

/// A validated contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: String,
}

impl ContactRequest {
    pub fn into_submission(self) -> Result<ContactSubmission, ContactError> {
        let (Some(name), Some(email), Some(message)) = (
            non_blank(self.name),
            non_blank(self.email),
            non_blank(self.message),
        ) else {
            return Err(ContactError::MissingFields);
        };

        Ok(ContactSubmission {
            name,
            email,
            company: non_blank(self.company),
            phone: non_blank(self.phone),
            service: non_blank(self.service),
            message,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts contact-form submissions. Submissions are recorded in the log
/// only; nothing is persisted or forwarded.
#[derive(Debug, Default, Clone)]
pub struct ContactService;

impl ContactService {
    pub fn new() -> Self {
        Self
    }

    pub fn submit(&self, request: ContactRequest) -> Result<ContactSubmission, ContactError> {
        let submission = request.into_submission()?;

        tracing::info!(
            name = %submission.name,
            email = %submission.email,
            company = submission.company.as_deref().unwrap_or(""),
            service = submission.service.as_deref().unwrap_or(""),
            message_length = submission.message.len(),
            "Contact form submission received"
        );

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            name: Some("Jane Roe".to_string()),
            email: Some("jane@example.com".to_string()),
            message: Some("We need a new website".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_valid_request() {
        let submission = ContactService::new().submit(request()).unwrap();
        assert_eq!(submission.name, "Jane Roe");
        assert_eq!(submission.company, None);
    }

    #[test]
    fn test_optional_fields_are_kept() {
        let mut req = request();
        req.service = Some(" Cloud migration ".to_string());
        req.phone = Some("".to_string());

        let submission = ContactService::new().submit(req).unwrap();
        assert_eq!(submission.service.as_deref(), Some("Cloud migration"));
        assert_eq!(submission.phone, None);
    }

    #[test]
    fn test_each_required_field_is_enforced() {
        let mut no_name = request();
        no_name.name = None;
        let mut no_email = request();
        no_email.email = Some(" ".to_string());
        let mut no_message = request();
        no_message.message = None;

        for req in [no_name, no_email, no_message] {
            assert!(matches!(
                ContactService::new().submit(req),
                Err(ContactError::MissingFields)
            ));
        }
    }

    #[test]
    fn test_multiline_and_special_characters() {
        let mut req = request();
        req.message = Some("line 1\nline 2 <>&\"'".to_string());

        let submission = ContactService::new().submit(req).unwrap();
        assert!(submission.message.contains('\n'));
    }
}
