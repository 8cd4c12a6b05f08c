use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};

/// lending product configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    /// flat interest charged once on the principal
    pub interest_rate: Rate,
    pub min_amount: Money,
    pub max_amount: Money,
    pub min_purpose_chars: usize,
    pub min_repayment_days: u32,
    pub max_repayment_days: u32,
    /// display code for amounts, e.g. "KSh"
    pub currency: String,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            interest_rate: Rate::from_decimal(dec!(0.30)),
            min_amount: Money::from_major(1_000),
            max_amount: Money::from_major(100_000),
            min_purpose_chars: 10,
            min_repayment_days: 30,
            max_repayment_days: 365,
            currency: "KSh".to_string(),
        }
    }
}

impl LendingConfig {
    /// parse a json document; missing keys fall back to the defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LendingConfig =
            serde_json::from_str(json).map_err(|e| LendingError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// reject bounds that would make every application fail
    pub fn validate(&self) -> Result<()> {
        if self.interest_rate.is_negative() {
            return Err(invalid(format!(
                "interest rate must not be negative, got {}",
                self.interest_rate
            )));
        }
        if !self.min_amount.is_positive() {
            return Err(invalid(format!(
                "minimum amount must be positive, got {}",
                self.min_amount
            )));
        }
        if self.min_amount > self.max_amount {
            return Err(invalid(format!(
                "minimum amount {} exceeds maximum {}",
                self.min_amount, self.max_amount
            )));
        }
        if self.min_repayment_days == 0 {
            return Err(invalid("minimum repayment period must be at least one day".to_string()));
        }
        if self.min_repayment_days > self.max_repayment_days {
            return Err(invalid(format!(
                "minimum repayment period {} exceeds maximum {}",
                self.min_repayment_days, self.max_repayment_days
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(invalid("currency code is required".to_string()));
        }
        Ok(())
    }

    /// format an amount for display, e.g. "KSh 13000.00"
    pub fn display_amount(&self, amount: Money) -> String {
        format!("{} {}", self.currency, amount)
    }
}

fn invalid(message: String) -> LendingError {
    LendingError::InvalidConfiguration { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_product_terms() {
        let config = LendingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.interest_rate, Rate::from_percentage(30));
        assert_eq!(config.min_amount, Money::from_major(1_000));
        assert_eq!(config.max_amount, Money::from_major(100_000));
        assert_eq!(config.min_purpose_chars, 10);
        assert_eq!((config.min_repayment_days, config.max_repayment_days), (30, 365));
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let config = LendingConfig::from_json_str(
            r#"{ "interest_rate": "0.25", "max_amount": "50000", "currency": "USD" }"#,
        )
        .unwrap();

        assert_eq!(config.interest_rate, Rate::from_percentage(25));
        assert_eq!(config.max_amount, Money::from_major(50_000));
        assert_eq!(config.min_amount, Money::from_major(1_000));
        assert_eq!(config.display_amount(Money::from_major(10)), "USD 10.00");
    }

    #[test]
    fn test_inconsistent_bounds_rejected() {
        let err = LendingConfig::from_json_str(r#"{ "min_amount": "5000", "max_amount": "1000" }"#)
            .unwrap_err();
        assert!(matches!(err, LendingError::InvalidConfiguration { .. }));

        let err = LendingConfig::from_json_str(r#"{ "min_repayment_days": 400 }"#).unwrap_err();
        assert!(matches!(err, LendingError::InvalidConfiguration { .. }));

        let err = LendingConfig::from_json_str(r#"{ "interest_rate": "-0.1" }"#).unwrap_err();
        assert!(matches!(err, LendingError::InvalidConfiguration { .. }));

        assert!(LendingConfig::from_json_str("not json").is_err());
    }
}
