use anyhow::{
    Result,
    anyhow,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    str::FromStr,
};

/// Chain address that owns a registry partition.
///
/// Kept in the casing it was received with. Comparisons that need identity
/// semantics go through [`WalletIdentity::matches`], which ignores ASCII case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletIdentity(String);

impl WalletIdentity {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(anyhow!("wallet identity must not be empty"));
        }
        // the identity doubles as a file name in the file-backed store
        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!(
                "wallet identity '{raw}' must only contain ASCII letters and digits"
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl FromStr for WalletIdentity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletIdentity {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<WalletIdentity> for String {
    fn from(value: WalletIdentity) -> Self {
        value.0
    }
}

impl AsRef<str> for WalletIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
