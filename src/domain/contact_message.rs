//! Messages sent from the public contact form.

use serde::{Deserialize, Serialize};

use crate::error::SiteError;

/// One submission of the contact form. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    /// Sender's name.
    #[serde(default)]
    pub name: String,
    /// Reply address.
    #[serde(default)]
    pub email: String,
    /// Optional phone number.
    #[serde(default)]
    pub phone: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Message body.
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::Validation`] naming the first blank field, or
    /// when the email has no `@`.
    pub fn validate(&self) -> Result<(), SiteError> {
        for (label, value) in [
            ("Name", &self.name),
            ("Email", &self.email),
            ("Subject", &self.subject),
            ("Message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(SiteError::validation(format!("{label} is required")));
            }
        }
        if !self.email.contains('@') {
            return Err(SiteError::validation("Email must be a valid address"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Amina Hassan".to_string(),
            email: "amina@example.co.tz".to_string(),
            phone: String::new(),
            subject: "Bulk diesel".to_string(),
            message: "We need 20,000 L monthly in Mwanza.".to_string(),
        }
    }

    #[test]
    fn phone_is_optional() {
        assert!(message().validate().is_ok());
    }

    #[test]
    fn blank_subject_is_rejected() {
        let msg = ContactMessage {
            subject: "  ".to_string(),
            ..message()
        };
        assert_eq!(
            msg.validate().err().map(|e| e.to_string()).as_deref(),
            Some("Subject is required")
        );
    }

    #[test]
    fn email_needs_an_at_sign() {
        let msg = ContactMessage {
            email: "amina.example.co.tz".to_string(),
            ..message()
        };
        assert!(msg.validate().is_err());
    }
}
