use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderMap, header::AUTHORIZATION},
};
use contract::Violation;
use tracing::debug;

use crate::error::AppError::{self, InvalidInput, MalformedPayload};

pub const TOKEN_PREFIX: &str = "Bearer ";

pub fn parse_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        debug!("Rejected payload: {rejection}");
        MalformedPayload
    })
}

/// Reports the first violation, fields are checked in declaration order.
pub fn ensure_valid(violations: Vec<Violation>) -> Result<(), AppError> {
    match violations.into_iter().next() {
        Some(violation) => Err(InvalidInput(violation.message.to_string())),
        None => Ok(()),
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(TOKEN_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn ignores_other_schemes_and_blank_tokens() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn first_violation_wins() {
        let result = ensure_valid(vec![
            Violation {
                field: "email",
                message: "Email is required.",
            },
            Violation {
                field: "password",
                message: "Password is required.",
            },
        ]);

        assert!(matches!(result, Err(InvalidInput(message)) if message == "Email is required."));
        assert!(ensure_valid(Vec::new()).is_ok());
    }
}
