//! Accounts: guests and hosts alike.

mod builder;
mod repository;
mod service;

pub use builder::*;
pub use repository::*;
pub use service::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Avatar served when an account does not provide one.
pub const DEFAULT_AVATAR: &str =
    "https://t3.ftcdn.net/jpg/01/18/01/98/360_F_118019822_6CKXP6rXmVhDOzbXZlLqEM2ya4HhYzSV.jpg";

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub avatar: String,
    #[serde(skip)]
    pub password: String,
    /// Tokens issued before this instant are no longer honored.
    #[serde(skip)]
    pub password_changed_at: Option<DateTime<Utc>>,
    /// Digest of the outstanding reset token, if any.
    #[serde(skip)]
    pub reset_token: Option<String>,
    #[serde(skip)]
    pub reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the password changed after a token issued at `iat`
    /// (seconds since the epoch).
    pub fn changed_password_after(&self, iat: u64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| changed.timestamp().max(0) as u64 > iat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(changed_at: Option<DateTime<Utc>>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.org".into(),
            phone_number: None,
            avatar: DEFAULT_AVATAR.into(),
            password: String::new(),
            password_changed_at: changed_at,
            reset_token: None,
            reset_expires: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn password_change_invalidates_older_tokens() {
        let changed = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let account = user(Some(changed));

        let before = (changed.timestamp() - 60) as u64;
        let after = (changed.timestamp() + 60) as u64;

        assert!(account.changed_password_after(before));
        assert!(!account.changed_password_after(after));
        assert!(!user(None).changed_password_after(before));
    }

    #[test]
    fn sensitive_fields_never_serialize() {
        let mut account = user(None);
        account.password = "$argon2id$secret".into();
        account.reset_token = Some("digest".into());

        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("resetToken").is_none());
        assert!(json.get("email").is_some());
    }
}
