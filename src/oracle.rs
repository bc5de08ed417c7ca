use thiserror::Error;

/// Reference-currency units per one native unit, fixed-point scaled by
/// `10^decimals`.
///
/// A rate is only valid for the single operation that fetched it; the
/// feed may answer differently on the next call, so handlers re-query it
/// every time instead of caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub answer: u128,
    pub decimals: u32,
}

impl Rate {
    /// Converts `amount` base units of native value into reference units
    /// at this rate, truncating toward zero. Returns `None` when the
    /// intermediate product does not fit `u128`.
    pub fn to_reference_value(&self, amount: u128) -> Option<u128> {
        let scale = 10u128.checked_pow(self.decimals)?;
        amount.checked_mul(self.answer)?.checked_div(scale)
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Price feed is unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("Price feed returned a non-positive answer")]
    NonPositiveAnswer,
}

/// Read side of the external price feed consumed by the escrow.
pub trait PriceOracle {
    fn rate(&self) -> Result<Rate, OracleError>;
}

/// Deterministic oracle answering with one configured rate. Stands in
/// for a live feed in the binary and in tests.
#[derive(Debug, Clone)]
pub struct FixedRateOracle {
    rate: Rate,
}

impl FixedRateOracle {
    pub fn new(answer: u128, decimals: u32) -> Self {
        Self {
            rate: Rate { answer, decimals },
        }
    }
}

impl PriceOracle for FixedRateOracle {
    fn rate(&self) -> Result<Rate, OracleError> {
        if self.rate.answer == 0 {
            return Err(OracleError::NonPositiveAnswer);
        }
        Ok(self.rate)
    }
}
