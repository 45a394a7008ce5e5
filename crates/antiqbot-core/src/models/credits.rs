use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value;

/// Response of `GET /user/credits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Credits {
    /// Raw balance as sent; see [`Credits::balance`].
    #[serde(default, rename = "balance", skip_serializing_if = "Option::is_none")]
    pub raw_balance: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credits {
    /// Balance as a whole number. Missing, null or unreadable reads as zero;
    /// floats are truncated.
    pub fn balance(&self) -> i64 {
        value::count(self.raw_balance.as_ref()).unwrap_or(0)
    }

    /// Whether at least one analysis can be paid for.
    pub fn can_analyze(&self) -> bool {
        self.balance() >= 1
    }
}
