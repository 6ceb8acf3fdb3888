// 7.0 config.rs: shared configuration store. fee rate and cap, delegate fee
// cap, execution toggle, treasury, oracle freshness. read-only from the
// account's perspective; operators mutate it between batches, never inside one.

use crate::types::{Address, Bps};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // Order-flow fee applied to qualifying trades
    pub fee_rate: Bps,
    // Ceiling the fee rate is clamped to at imposition time
    pub max_fee: Bps,
    // Ceiling on per-delegate fees
    pub max_delegate_fee: Bps,
    // Global kill switch. false fails every call, conditional execution included
    pub execution_enabled: bool,
    // Where collected fees are forwarded
    pub treasury: Address,
    // Primary oracle freshness window in milliseconds
    pub oracle_freshness_ms: i64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            fee_rate: Bps::new(5),          // 0.05%
            max_fee: Bps::new(1_000),       // 10%
            max_delegate_fee: Bps::new(200), // 2%
            execution_enabled: true,
            treasury: Address(0xFEE5),
            oracle_freshness_ms: 60_000,
        }
    }
}

impl SystemConfig {
    // Free trading preset used by integration environments
    pub fn zero_fee() -> Self {
        Self {
            fee_rate: Bps::zero(),
            ..Self::default()
        }
    }

    // Conservative preset: tight oracle window, low fee ceiling
    pub fn conservative() -> Self {
        Self {
            fee_rate: Bps::new(10),
            max_fee: Bps::new(100),
            max_delegate_fee: Bps::new(50),
            oracle_freshness_ms: 15_000,
            ..Self::default()
        }
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_fee.value() > Bps::MAX_BPS {
            return Err(ConfigError::InvalidFees {
                reason: "fee cap above 100%".to_string(),
            });
        }
        if self.max_delegate_fee.value() > Bps::MAX_BPS {
            return Err(ConfigError::InvalidFees {
                reason: "delegate fee cap above 100%".to_string(),
            });
        }
        if self.treasury.is_zero() {
            return Err(ConfigError::InvalidTreasury);
        }
        if self.oracle_freshness_ms <= 0 {
            return Err(ConfigError::InvalidOracleWindow {
                window_ms: self.oracle_freshness_ms,
            });
        }
        Ok(())
    }

    /// Effective fee rate after the cap.
    pub fn effective_fee_rate(&self) -> Bps {
        self.fee_rate.min(self.max_fee)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid fee configuration: {reason}")]
    InvalidFees { reason: String },

    #[error("treasury address must be nonzero")]
    InvalidTreasury,

    #[error("oracle freshness window must be positive, got {window_ms}ms")]
    InvalidOracleWindow { window_ms: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        assert!(SystemConfig::default().validate().is_ok());
    }

    #[test]
    fn presets_valid() {
        assert!(SystemConfig::zero_fee().validate().is_ok());
        assert!(SystemConfig::conservative().validate().is_ok());
        assert!(SystemConfig::zero_fee().fee_rate.is_zero());
    }

    #[test]
    fn effective_rate_clamped() {
        let mut config = SystemConfig::default();
        config.fee_rate = Bps::new(10_000);
        assert_eq!(config.effective_fee_rate(), Bps::new(1_000));
    }

    #[test]
    fn invalid_treasury_rejected() {
        let mut config = SystemConfig::default();
        config.treasury = Address::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTreasury));
    }

    #[test]
    fn invalid_oracle_window_rejected() {
        let mut config = SystemConfig::default();
        config.oracle_freshness_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOracleWindow { .. })
        ));
    }

    #[test]
    fn config_serialization() {
        let config = SystemConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fee_rate, config.fee_rate);
        assert_eq!(back.treasury, config.treasury);
    }
}
