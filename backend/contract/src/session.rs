//! # Session
//!
//! Client side record of who is logged in.
//!
//! - `login` stores the user returned by the login endpoint together with the access token
//! - `logout` clears both
//! - Persisting is optional, a missing file simply means nobody is logged in
//! - [`Session::clear`] overwrites the file without reading it, so a corrupt file can always be reset
use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::payloads::{LoginResponse, Role};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: u64,
    pub email: String,
    pub nickname: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<UserInfo>,
    pub access_token: Option<String>,
}

impl From<&LoginResponse> for UserInfo {
    fn from(response: &LoginResponse) -> Self {
        Self {
            user_id: response.user_id,
            email: response.email.clone(),
            nickname: response.nickname.clone(),
            role: response.role,
        }
    }
}

impl Session {
    pub fn login(&mut self, user: UserInfo, access_token: impl Into<String>) {
        self.is_authenticated = true;
        self.user = Some(user);
        self.access_token = Some(access_token.into());
    }

    pub fn logout(&mut self) {
        *self = Self::default();
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(io::Error::from),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No session at {}, starting logged out", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, serde_json::to_vec_pretty(self)?)
    }

    pub fn clear(path: &Path) -> io::Result<()> {
        Self::default().save(path)
    }
}
