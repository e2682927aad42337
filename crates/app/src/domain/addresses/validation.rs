//! Address validation

use std::fmt::{Display, Formatter, Result as FmtResult};

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::domain::addresses::Address;

const POSTCODE_PATTERN: &str = r"(?i)^(GIR ?0AA|[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2})$";
const PHONE_PATTERN: &str = r"^0[0-9]{9,10}$";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Address field a violation refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    Name,
    Line1,
    City,
    Postcode,
    Country,
    Phone,
    Email,
}

impl Display for AddressField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let field = match self {
            AddressField::Name => "name",
            AddressField::Line1 => "line1",
            AddressField::City => "city",
            AddressField::Postcode => "postcode",
            AddressField::Country => "country",
            AddressField::Phone => "phone",
            AddressField::Email => "email",
        };

        f.write_str(field)
    }
}

/// A single problem with an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressViolation {
    pub field: AddressField,
    pub message: &'static str,
}

/// Every problem found with an address.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("address has {} invalid field(s)", .violations.len())]
pub struct InvalidAddress {
    pub violations: Vec<AddressViolation>,
}

impl InvalidAddress {
    /// Whether `field` has a violation.
    pub fn has(&self, field: AddressField) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

/// Structural address checks. Patterns are compiled once and shared.
#[derive(Debug, Clone)]
pub struct AddressValidator {
    postcode: Regex,
    phone: Regex,
    email: Regex,
}

impl AddressValidator {
    /// Compile the validation patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            postcode: Regex::new(POSTCODE_PATTERN)?,
            phone: Regex::new(PHONE_PATTERN)?,
            email: Regex::new(EMAIL_PATTERN)?,
        })
    }

    /// Check every field of `address`, collecting all violations.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAddress`] listing each invalid field.
    pub fn validate(&self, address: &Address) -> Result<(), InvalidAddress> {
        let mut violations = Vec::new();

        let mut require = |field, value: &str| {
            if value.trim().is_empty() {
                violations.push(AddressViolation {
                    field,
                    message: "is required",
                });
            }
        };

        require(AddressField::Name, &address.name);
        require(AddressField::Line1, &address.line1);
        require(AddressField::City, &address.city);
        require(AddressField::Country, &address.country);

        if !self.postcode.is_match(address.postcode.trim()) {
            violations.push(AddressViolation {
                field: AddressField::Postcode,
                message: "is not a valid UK postcode",
            });
        }

        if !self.phone.is_match(&normalize_phone(&address.phone)) {
            violations.push(AddressViolation {
                field: AddressField::Phone,
                message: "is not a valid UK phone number",
            });
        }

        if !self.email.is_match(address.email.trim()) {
            violations.push(AddressViolation {
                field: AddressField::Email,
                message: "is not a valid email address",
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(InvalidAddress { violations })
        }
    }
}

/// Strip formatting characters and rewrite an international `+44` prefix to the national `0`.
fn normalize_phone(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    match digits.strip_prefix("+44") {
        Some(national) => format!("0{}", national.trim_start_matches('0')),
        None => digits,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn address() -> Address {
        Address {
            name: "Ada Lovelace".to_string(),
            line1: "10 Downing Street".to_string(),
            line2: None,
            city: "London".to_string(),
            postcode: "SW1A 1AA".to_string(),
            country: "GB".to_string(),
            phone: "07700 900123".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn valid_address_is_accepted() -> TestResult {
        AddressValidator::new()?.validate(&address())?;

        Ok(())
    }

    #[test]
    fn numeric_postcode_is_rejected() -> TestResult {
        let validator = AddressValidator::new()?;

        let result = validator.validate(&Address {
            postcode: "1234".to_string(),
            ..address()
        });

        let err = result.err().ok_or("expected postcode violation")?;

        assert!(err.has(AddressField::Postcode), "violations: {err:?}");
        assert_eq!(err.violations.len(), 1, "violations: {err:?}");

        Ok(())
    }

    #[test]
    fn postcode_without_space_or_in_lowercase_is_accepted() -> TestResult {
        let validator = AddressValidator::new()?;

        for postcode in ["sw1a1aa", "M1 1AE", "b33 8th", "GIR 0AA"] {
            validator.validate(&Address {
                postcode: postcode.to_string(),
                ..address()
            })?;
        }

        Ok(())
    }

    #[test]
    fn short_phone_is_rejected() -> TestResult {
        let validator = AddressValidator::new()?;

        let result = validator.validate(&Address {
            phone: "12345".to_string(),
            ..address()
        });

        let err = result.err().ok_or("expected phone violation")?;

        assert!(err.has(AddressField::Phone), "violations: {err:?}");

        Ok(())
    }

    #[test]
    fn international_mobile_number_is_accepted() -> TestResult {
        let validator = AddressValidator::new()?;

        for phone in ["+44 7700 900123", "+44 (0)7700-900123", "020 7946 0958"] {
            validator.validate(&Address {
                phone: phone.to_string(),
                ..address()
            })?;
        }

        Ok(())
    }

    #[test]
    fn every_violation_is_reported() -> TestResult {
        let validator = AddressValidator::new()?;

        let result = validator.validate(&Address {
            name: " ".to_string(),
            line1: String::new(),
            line2: None,
            city: String::new(),
            postcode: "1234".to_string(),
            country: String::new(),
            phone: "12345".to_string(),
            email: "not-an-email".to_string(),
        });

        let err = result.err().ok_or("expected violations")?;

        assert_eq!(err.violations.len(), 7, "violations: {err:?}");

        Ok(())
    }
}
