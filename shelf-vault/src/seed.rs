use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_GROUP;
use crate::password::PasswordScheme;
use crate::records::UserRecord;

/// One candidate account from the credential list supplied at startup.
///
/// Optional fields are filled at the boundary: the display name falls back
/// to the username, the group list to `["User"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub name: Option<String>,
    pub password: String,
    pub groups: Option<Vec<String>>,
}

impl SeedUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            password: password.into(),
            groups: None,
        }
    }

    pub(crate) fn into_record(self, scheme: &dyn PasswordScheme) -> UserRecord {
        let name = self.name.unwrap_or_else(|| self.username.clone());
        let groups = match self.groups {
            Some(groups) if !groups.is_empty() => groups,
            _ => vec![DEFAULT_GROUP.to_string()],
        };
        UserRecord {
            username: self.username,
            name,
            password: scheme.protect(&self.password),
            groups,
        }
    }
}
