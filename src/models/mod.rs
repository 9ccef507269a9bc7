use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signature algorithms a `srv_jwt` can be issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-512
    Rs512,
    /// ECDSA using P-256 and SHA-256
    Es256,
    /// ECDSA using P-521 and SHA-512
    Es512,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Rs512 => "RS512",
            Algorithm::Es256 => "ES256",
            Algorithm::Es512 => "ES512",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RS512" => Ok(Algorithm::Rs512),
            "ES256" => Ok(Algorithm::Es256),
            "ES512" => Ok(Algorithm::Es512),
            _ => Err(format!("Invalid algorithm: {}", s)),
        }
    }
}

/// JOSE header of an issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: Algorithm,
    pub typ: String,
}

impl TokenHeader {
    pub fn new(alg: Algorithm) -> Self {
        Self {
            alg,
            typ: "JWT".to_string(),
        }
    }
}

/// `srv_jwt` claims: only the issuance time, in UTC epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerClaims {
    pub issued: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_display() {
        assert_eq!(Algorithm::Rs512.to_string(), "RS512");
        assert_eq!(Algorithm::Es256.to_string(), "ES256");
        assert_eq!(Algorithm::Es512.to_string(), "ES512");
    }

    #[test]
    fn test_algorithm_parse_case_insensitive() {
        assert_eq!("es512".parse::<Algorithm>().unwrap(), Algorithm::Es512);
        assert_eq!("Rs512".parse::<Algorithm>().unwrap(), Algorithm::Rs512);
        assert!("HS256".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_header_serialization() {
        let json = serde_json::to_string(&TokenHeader::new(Algorithm::Es512)).unwrap();
        assert_eq!(json, r#"{"alg":"ES512","typ":"JWT"}"#);
    }

    #[test]
    fn test_claims_serialization() {
        let json = serde_json::to_string(&ServerClaims { issued: 1700000000 }).unwrap();
        assert_eq!(json, r#"{"issued":1700000000}"#);
    }
}
