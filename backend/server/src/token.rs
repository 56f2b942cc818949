//! # Access Tokens
//!
//! Compact JWTs signed with HMAC-SHA256, handed out on login and sent back as `Authorization: Bearer <token>`.
//!
//! ## Format
//!
//! `base64url(header).base64url(claims).base64url(signature)`, unpadded.
//!
//! - Header: `{"alg":"HS256","typ":"JWT"}`
//! - Claims: `sub` (email), `uid`, `role`, `iat`, `exp` (seconds since epoch)
//! - Signature covers the first two segments exactly as sent
//!
//! ## Key
//!
//! `JWT_SECRET_KEY` is base64 and must decode to at least 32 bytes.
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use chrono::Utc;
use contract::Role;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const MIN_KEY_LEN: usize = 32;
const MAX_TOKEN_LEN: usize = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT claims string is empty")]
    Empty,

    #[error("Invalid JWT token")]
    Malformed,

    #[error("Unsupported JWT token")]
    Unsupported,

    #[error("Invalid JWT signature")]
    InvalidSignature,

    #[error("Expired JWT token")]
    Expired,

    #[error("Invalid JWT key: {0}")]
    InvalidKey(String),
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub uid: u64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenProvider {
    key: Vec<u8>,
    expiration_ms: u64,
}

impl TokenProvider {
    pub fn new(secret_base64: &str, expiration_ms: u64) -> Result<Self, TokenError> {
        let key = STANDARD
            .decode(secret_base64.trim())
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;

        if key.len() < MIN_KEY_LEN {
            return Err(TokenError::InvalidKey(format!(
                "key is {} bytes, need at least {MIN_KEY_LEN}",
                key.len()
            )));
        }

        Ok(Self { key, expiration_ms })
    }

    pub fn generate_token(&self, user_id: u64, email: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp_millis();
        let expiration = i64::try_from(self.expiration_ms).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: email.to_string(),
            uid: user_id,
            role,
            iat: now / 1000,
            exp: now.saturating_add(expiration).saturating_add(999) / 1000,
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let header = serde_json::to_vec(&header).map_err(|_| TokenError::Malformed)?;
        let claims = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );

        let signature = self.mac(&signing_input)?.finalize().into_bytes();

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| TokenError::InvalidKey(e.to_string()))?;
        mac.update(signing_input.as_bytes());

        Ok(mac)
    }

    pub fn claims(&self, token: &str) -> Result<Claims, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Empty);
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Malformed);
        }

        let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let (header, claims) = signing_input.split_once('.').ok_or(TokenError::Malformed)?;
        if claims.contains('.') {
            return Err(TokenError::Malformed);
        }

        let header: Header = decode_segment(header)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Unsupported);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;
        self.mac(signing_input)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: Claims = decode_segment(claims)?;
        if Utc::now().timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Like [`claims`](Self::claims), logging why a token was refused.
    pub fn verified_claims(&self, token: &str) -> Option<Claims> {
        self.claims(token).map_err(|e| error!("{e}")).ok()
    }

    pub fn validate_token(&self, token: &str) -> bool {
        self.verified_claims(token).is_some()
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;

    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "c3RhbmRhcmQtYm9hcmQtdGVzdC1zZWNyZXQta2V5LTAxMjM0NTY3ODk=";

    fn provider() -> TokenProvider {
        TokenProvider::new(SECRET, 60_000).unwrap()
    }

    fn segments(token: &str) -> Vec<String> {
        token.split('.').map(str::to_string).collect()
    }

    #[test]
    fn issued_token_carries_claims() {
        let provider = provider();
        let token = provider.generate_token(7, "login@test.com", Role::User).unwrap();

        assert_eq!(segments(&token).len(), 3);
        assert!(provider.validate_token(&token));

        let claims = provider.claims(&token).unwrap();
        assert_eq!(claims.sub, "login@test.com");
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.role, Role::User);
        assert!((60..=61).contains(&(claims.exp - claims.iat)));
    }

    #[test]
    fn rejects_short_or_invalid_keys() {
        assert!(matches!(
            TokenProvider::new("c2hvcnQ=", 1000),
            Err(TokenError::InvalidKey(_))
        ));
        assert!(matches!(
            TokenProvider::new("not base64!", 1000),
            Err(TokenError::InvalidKey(_))
        ));
    }

    #[test]
    fn token_from_other_key_fails_signature() {
        let other = TokenProvider::new(
            "YW5vdGhlci1zZWNyZXQta2V5LXRoYXQtaXMtbG9uZy1lbm91Z2g=",
            60_000,
        )
        .unwrap();
        let token = other.generate_token(1, "a@b.co", Role::Admin).unwrap();

        assert_eq!(provider().claims(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn tampered_claims_fail_signature() {
        let provider = provider();
        let token = provider.generate_token(1, "a@b.co", Role::User).unwrap();
        let parts = segments(&token);

        let forged = provider
            .generate_token(1, "a@b.co", Role::Admin)
            .unwrap();
        let forged_claims = &segments(&forged)[1];

        let tampered = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert_eq!(provider.claims(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let provider = provider();
        let now = Utc::now().timestamp();
        let token = provider
            .sign(&Claims {
                sub: "a@b.co".to_string(),
                uid: 1,
                role: Role::User,
                iat: now - 120,
                exp: now - 60,
            })
            .unwrap();

        assert_eq!(provider.claims(&token), Err(TokenError::Expired));
        assert!(!provider.validate_token(&token));
    }

    #[test]
    fn sub_second_lifetime_is_valid_on_issue() {
        let provider = TokenProvider::new(SECRET, 900).unwrap();

        for id in 0..200 {
            let token = provider.generate_token(id, "a@b.co", Role::User).unwrap();
            assert!(provider.validate_token(&token), "token {id} expired on issue");
        }
    }

    #[test]
    fn token_is_valid_through_its_exp_second() {
        let provider = provider();
        let now = Utc::now().timestamp();
        let token = provider
            .sign(&Claims {
                sub: "a@b.co".to_string(),
                uid: 1,
                role: Role::User,
                iat: now - 60,
                exp: now + 1,
            })
            .unwrap();

        assert!(provider.verified_claims(&token).is_some());
    }

    #[test]
    fn rejects_other_algorithms() {
        let provider = provider();
        let token = provider.generate_token(1, "a@b.co", Role::User).unwrap();
        let parts = segments(&token);
        let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);

        let downgraded = format!("{none_header}.{}.{}", parts[1], parts[2]);
        assert_eq!(provider.claims(&downgraded), Err(TokenError::Unsupported));
    }

    #[test]
    fn malformed_and_empty_tokens() {
        let provider = provider();

        assert_eq!(provider.claims("  "), Err(TokenError::Empty));
        assert_eq!(provider.claims("abc"), Err(TokenError::Malformed));
        assert_eq!(provider.claims("a.b.c.d"), Err(TokenError::Malformed));
        assert_eq!(provider.claims("!!.??.**"), Err(TokenError::Malformed));
    }
}
