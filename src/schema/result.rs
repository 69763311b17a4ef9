//! Result shape returned by the cached accessors

use serde::{Deserialize, Serialize};

/// `{ success, ...fields }` as seen by callers.
///
/// Accessors never return an error: when the data cannot be produced,
/// `success` is false and `data` holds the payload's default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResult<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T> CachedResult<T> {
    /// Successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T: Default> CachedResult<T> {
    /// Unsuccessful result carrying the default payload
    pub fn failed() -> Self {
        Self {
            success: false,
            data: T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BalanceData;
    use serde_json::json;

    #[test]
    fn test_success_flattens_payload() {
        let result = CachedResult::ok(BalanceData {
            balance: 500.0,
            total_deposited: 500.0,
            total_withdrawn: 0.0,
            lifetime_pnl: 0.0,
        });

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "balance": 500.0,
                "totalDeposited": 500.0,
                "totalWithdrawn": 0.0,
                "lifetimePnL": 0.0
            })
        );
    }

    #[test]
    fn test_failed_uses_defaults() {
        let result: CachedResult<BalanceData> = CachedResult::failed();
        assert!(!result.is_success());
        assert_eq!(result.into_data(), BalanceData::default());
    }
}
