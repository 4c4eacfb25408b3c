use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::utils::crypto::offline_uuid;

mod yggdrasil;

pub use yggdrasil::login;

#[derive(Default, Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserType {
    Mojang,
    #[default]
    Legacy,
}

impl Display for UserType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ut = format!("{self:?}").to_ascii_lowercase();

        write!(f, "{ut}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub uuid: String,
    pub token: String,
    pub user_type: UserType,
}

impl Account {
    /// Offline sessions carry the deterministic uuid the client derives
    /// from the player name and the "0" sentinel token.
    pub fn offline(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            uuid: offline_uuid(&name),
            token: "0".to_string(),
            user_type: UserType::Legacy,
        }
    }

    pub fn is_online(&self) -> bool {
        !self.token.is_empty() && self.token != "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_type_displays_lowercase() {
        assert_eq!(UserType::Mojang.to_string(), "mojang");
        assert_eq!(UserType::Legacy.to_string(), "legacy");
    }

    #[test]
    fn offline_account_is_not_online() {
        let acc = Account::offline("Steve");
        assert_eq!(acc.token, "0");
        assert!(!acc.is_online());
    }
}
