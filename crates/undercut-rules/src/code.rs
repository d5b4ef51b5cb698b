//! Room codes: short identifiers players type to join a game.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of digits in a room code.
const CODE_LEN: usize = 5;

/// A room identifier: exactly 5 ASCII digits.
///
/// Newtype wrapper so a code can't be confused with a username or any
/// other string floating through the engine. Uniqueness among live rooms
/// is the registry's job; this type only guarantees the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Samples a random 5-digit code. The caller (the registry) retries
    /// until the code is unused.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let digits: String = (0..CODE_LEN)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        Self(digits)
    }

    /// Parses a code supplied by a client. Returns `None` unless the
    /// input is exactly 5 ASCII digits.
    pub fn parse(input: &str) -> Option<Self> {
        if input.len() == CODE_LEN
            && input.bytes().all(|b| b.is_ascii_digit())
        {
            Some(Self(input.to_string()))
        } else {
            None
        }
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_five_ascii_digits() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), 5);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn test_parse_accepts_valid_code() {
        let code = RoomCode::parse("04217").unwrap();
        assert_eq!(code.as_str(), "04217");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(RoomCode::parse("1234").is_none());
        assert!(RoomCode::parse("123456").is_none());
        assert!(RoomCode::parse("").is_none());
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(RoomCode::parse("12a45").is_none());
        assert!(RoomCode::parse("１２３４５").is_none()); // full-width digits
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let code = RoomCode::parse("90210").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"90210\"");
    }
}
