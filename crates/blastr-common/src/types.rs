//! Common types for Blastr

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for tenants
pub type TenantId = Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for campaign batches
pub type BatchId = Uuid;

/// Unique identifier for contacts
pub type ContactId = Uuid;

/// Unique identifier for gateway instances
pub type InstanceId = Uuid;

/// A normalized phone number in international digits-only form.
///
/// The gateway addresses recipients by bare digit strings (country code
/// included, no `+`, spaces, or punctuation), so numbers are canonicalized
/// once at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a phone number from a string, stripping formatting characters.
    ///
    /// Accepts 8 to 15 digits after normalization (E.164 bounds the national
    /// significant number at 15 digits).
    pub fn parse(s: &str) -> Option<Self> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 8 || digits.len() > 15 {
            return None;
        }
        // Reject inputs with characters other than digits and common
        // formatting marks, so garbage doesn't normalize into a number.
        if !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'))
        {
            return None;
        }
        Some(Self(digits))
    }

    /// The canonical digits-only form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::Validation("Invalid phone number".to_string()))
    }
}

/// Timestamp wrapper
pub type Timestamp = DateTime<Utc>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number_parse() {
        let phone = PhoneNumber::parse("+55 (11) 98765-4321").unwrap();
        assert_eq!(phone.as_str(), "5511987654321");
        assert_eq!(phone.to_string(), "5511987654321");
    }

    #[test]
    fn test_phone_number_plain_digits() {
        let phone = PhoneNumber::parse("5511987654321").unwrap();
        assert_eq!(phone.as_str(), "5511987654321");
    }

    #[test]
    fn test_phone_number_invalid() {
        assert!(PhoneNumber::parse("12345").is_none());
        assert!(PhoneNumber::parse("not a number").is_none());
        assert!(PhoneNumber::parse("123456789012345678").is_none());
        assert!(PhoneNumber::parse("").is_none());
    }
}
