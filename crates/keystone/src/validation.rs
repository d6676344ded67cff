//! Request validation performed before anything reaches the OTP manager.

use keystone_common::constants::{CODE_LENGTH, limits};
use keystone_common::{ContactSubmission, KeystoneError};
use regex::Regex;
use std::sync::LazyLock;

use crate::catalog;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

static DIAL_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{0,3}$").expect("dial code regex is valid"));

/// Trim and syntax-check an email address
pub fn email(raw: &str) -> Result<String, KeystoneError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(KeystoneError::InvalidInput("Email is required.".into()));
    }
    if email.len() > limits::EMAIL_MAX_LEN || !EMAIL_REGEX.is_match(email) {
        return Err(KeystoneError::InvalidInput("Please enter a valid email address.".into()));
    }
    Ok(email.to_string())
}

/// Join a dial code (`+91`) and a national number into E.164.
///
/// Spaces, dashes, dots and parentheses in the national number are
/// ignored; anything else non-numeric is rejected.
pub fn phone(dial_code: &str, national: &str) -> Result<String, KeystoneError> {
    let dial_code = dial_code.trim();
    if !DIAL_CODE_REGEX.is_match(dial_code) {
        return Err(KeystoneError::InvalidInput(
            "Please select a valid country dial code.".into(),
        ));
    }

    let mut digits = String::with_capacity(national.len());
    for c in national.trim().chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => {
                return Err(KeystoneError::InvalidInput(
                    "Phone number must contain digits only.".into(),
                ));
            }
        }
    }

    let total_digits = dial_code.len() - 1 + digits.len();
    if digits.len() < limits::NATIONAL_MIN_DIGITS
        || digits.len() > limits::NATIONAL_MAX_DIGITS
        || total_digits > limits::E164_MAX_DIGITS
    {
        return Err(KeystoneError::InvalidInput("Please enter a valid phone number.".into()));
    }

    Ok(format!("{dial_code}{digits}"))
}

/// Require exactly six ASCII digits
pub fn code(raw: &str) -> Result<&str, KeystoneError> {
    let code = raw.trim();
    if code.len() != CODE_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeystoneError::InvalidInput(
            "Verification code must be exactly 6 digits.".into(),
        ));
    }
    Ok(code)
}

/// Contact form fields as posted by the site
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub dial_code: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Validate and normalise a contact form
pub fn contact(form: ContactForm) -> Result<ContactSubmission, KeystoneError> {
    let name = required_text(&form.name, "Name", limits::NAME_MAX_LEN)?;
    let email = email(&form.email)?;
    let message = required_text(&form.message, "Message", limits::MESSAGE_MAX_LEN)?;

    let phone = match non_empty(form.phone.as_deref()) {
        Some(national) => {
            let dial_code = non_empty(form.dial_code.as_deref()).ok_or_else(|| {
                KeystoneError::InvalidInput("Please select a country dial code.".into())
            })?;
            Some(phone(dial_code, national)?)
        }
        None => None,
    };

    let company = match non_empty(form.company.as_deref()) {
        Some(company) if company.chars().count() > limits::COMPANY_MAX_LEN => {
            return Err(KeystoneError::InvalidInput("Company name is too long.".into()));
        }
        other => other.map(str::to_string),
    };

    let service = match non_empty(form.service.as_deref()) {
        Some(slug) if catalog::find(slug).is_none() => {
            return Err(KeystoneError::InvalidInput(format!("Unknown service: {slug}")));
        }
        other => other.map(str::to_string),
    };

    Ok(ContactSubmission {
        name,
        email,
        phone,
        company,
        service,
        message,
    })
}

fn required_text(raw: &str, field: &str, max_chars: usize) -> Result<String, KeystoneError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(KeystoneError::InvalidInput(format!("{field} is required.")));
    }
    if value.chars().count() > max_chars {
        return Err(KeystoneError::InvalidInput(format!(
            "{field} must be at most {max_chars} characters."
        )));
    }
    Ok(value.to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert_eq!(email("  user@plant.io ").unwrap(), "user@plant.io");
        assert_eq!(email("first.last+tag@sub.example.co").unwrap(), "first.last+tag@sub.example.co");

        for bad in ["", "   ", "plainaddress", "a@b", "a@@b.com", "a b@c.com", "@c.com", "a@-c.com"] {
            assert!(email(bad).is_err(), "accepted {bad:?}");
        }

        let long = format!("{}@example.com", "a".repeat(250));
        assert!(email(&long).is_err());
    }

    #[test]
    fn test_phone_joins_dial_code() {
        assert_eq!(phone("+91", "1234567890").unwrap(), "+911234567890");
        assert_eq!(phone(" +1 ", "(555) 010-0200").unwrap(), "+15550100200");
    }

    #[test]
    fn test_phone_rejects_bad_input() {
        assert!(phone("91", "1234567890").is_err());
        assert!(phone("+0", "1234567890").is_err());
        assert!(phone("+12345", "1234567890").is_err());
        assert!(phone("+91", "12345").is_err());
        assert!(phone("+91", "12345abc90").is_err());
        assert!(phone("+1234", "123456789012").is_err());
    }

    #[test]
    fn test_code_validation() {
        assert_eq!(code(" 012345 ").unwrap(), "012345");
        for bad in ["", "12345", "1234567", "12a456", "１２３４５６"] {
            assert!(code(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_contact_validation() {
        let form = ContactForm {
            name: " Ada ".into(),
            email: "ada@plant.io".into(),
            dial_code: Some("+44".into()),
            phone: Some("7700 900123".into()),
            company: Some("  ".into()),
            service: Some("plc-programming".into()),
            message: "Please quote a retrofit.".into(),
        };
        let submission = contact(form).unwrap();
        assert_eq!(submission.name, "Ada");
        assert_eq!(submission.phone.as_deref(), Some("+447700900123"));
        assert_eq!(submission.company, None);
        assert_eq!(submission.service.as_deref(), Some("plc-programming"));
    }

    #[test]
    fn test_contact_rejects_missing_and_unknown_fields() {
        let base = ContactForm {
            name: "Ada".into(),
            email: "ada@plant.io".into(),
            message: "Hello".into(),
            ..Default::default()
        };
        assert!(contact(base.clone()).is_ok());

        let no_name = ContactForm { name: "".into(), ..base.clone() };
        assert!(contact(no_name).is_err());

        let unknown_service = ContactForm {
            service: Some("time-travel".into()),
            ..base.clone()
        };
        assert!(contact(unknown_service).is_err());

        let phone_without_dial = ContactForm {
            phone: Some("1234567890".into()),
            ..base.clone()
        };
        assert!(contact(phone_without_dial).is_err());

        let long_message = ContactForm {
            message: "x".repeat(5001),
            ..base
        };
        assert!(contact(long_message).is_err());
    }
}
