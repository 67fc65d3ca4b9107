//! Resolved customer contact details for a given account.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Contact details required for notification dispatch. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: i64,
    pub account_id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Email address, or empty when the customer has none on record.
    pub email: String,
    /// Phone number in E.164 format (e.g. "+2348031234567"), or empty.
    pub phone: String,
}

impl CustomerProfile {
    pub fn new(
        customer_id: i64,
        account_id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            customer_id,
            account_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// True only if this profile has a non-blank email.
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// True only if this profile has a non-blank phone number.
    pub fn has_phone(&self) -> bool {
        !self.phone.trim().is_empty()
    }
}

// Display masks contact details so profiles are safe to log.
impl fmt::Display for CustomerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CustomerProfile{{customer_id={}, account_id={}, email={}, phone={}}}",
            self.customer_id,
            self.account_id,
            mask_email(&self.email),
            mask_phone(&self.phone),
        )
    }
}

/// Keep at most the first three characters of the local part.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at) if at > 1 => {
            let keep = at.min(3);
            format!("{}***{}", &email[..keep], &email[at..])
        }
        Some(_) => "***".to_string(),
        None if email.is_empty() => "(none)".to_string(),
        None => "***".to_string(),
    }
}

/// Keep the country code and carrier prefix only.
pub fn mask_phone(phone: &str) -> String {
    if phone.is_empty() {
        "(none)".to_string()
    } else if phone.len() < 6 {
        "***".to_string()
    } else {
        format!("{}***", &phone[..6])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(email: &str, phone: &str) -> CustomerProfile {
        CustomerProfile::new(1001, 100001, "Adaeze", "Okafor", email, phone)
    }

    #[test]
    fn has_email_requires_non_blank() {
        assert!(profile("adaeze@test.com", "").has_email());
        assert!(!profile("", "").has_email());
        assert!(!profile("   ", "").has_email());
    }

    #[test]
    fn has_phone_requires_non_blank() {
        assert!(profile("", "+2348031001001").has_phone());
        assert!(!profile("", "").has_phone());
        assert!(!profile("", "  ").has_phone());
    }

    #[test]
    fn full_name_joins_first_and_last() {
        assert_eq!(profile("", "").full_name(), "Adaeze Okafor");
    }

    #[test]
    fn display_masks_contact_details() {
        let rendered = profile("adaeze.okafor@email.com", "+2348031001001").to_string();
        assert!(rendered.contains("ada***@email.com"));
        assert!(rendered.contains("+23480***"));
        assert!(!rendered.contains("adaeze.okafor@email.com"));
        assert!(!rendered.contains("+2348031001001"));
    }

    #[test]
    fn mask_email_handles_short_and_empty_values() {
        assert_eq!(mask_email(""), "(none)");
        assert_eq!(mask_email("a@b.com"), "***");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
