use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const EMAIL_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 20;
pub const NICKNAME_MIN: usize = 2;
pub const NICKNAME_MAX: usize = 50;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"#,
    )
    .expect("email pattern compiles")
});

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A single failed field check, in the order the fields are declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: &'static str,
}

// Missing fields decode as empty strings so they are reported as blank rather than malformed.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub nickname: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignUpResponse {
    pub id: u64,
    pub email: String,
    pub nickname: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: u64,
    pub email: String,
    pub nickname: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub application: String,
    pub version: String,
}

impl SignUpRequest {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        check_email(&self.email, Some(EMAIL_MAX), &mut violations);

        if is_blank(&self.password) {
            violations.push(violation("password", "Password is required."));
        } else if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&self.password.chars().count()) {
            violations.push(violation(
                "password",
                "Password must be between 8 and 20 characters.",
            ));
        }

        if is_blank(&self.nickname) {
            violations.push(violation("nickname", "Nickname is required."));
        } else if !(NICKNAME_MIN..=NICKNAME_MAX).contains(&self.nickname.chars().count()) {
            violations.push(violation(
                "nickname",
                "Nickname must be between 2 and 50 characters.",
            ));
        }

        violations
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        check_email(&self.email, None, &mut violations);

        if is_blank(&self.password) {
            violations.push(violation("password", "Password is required."));
        } else if self.password.chars().count() < PASSWORD_MIN {
            violations.push(violation(
                "password",
                "Password must be at least 8 characters.",
            ));
        }

        violations
    }
}

fn check_email(email: &str, max: Option<usize>, violations: &mut Vec<Violation>) {
    if is_blank(email) {
        violations.push(violation("email", "Email is required."));
        return;
    }

    if !EMAIL.is_match(email) {
        violations.push(violation("email", "Invalid email format."));
    }

    if max.is_some_and(|max| email.chars().count() > max) {
        violations.push(violation("email", "Email must be at most 100 characters."));
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn violation(field: &'static str, message: &'static str) -> Violation {
    Violation { field, message }
}
