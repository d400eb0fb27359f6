//! Platform fee fractions charged on top of a swap or deposit.

use serde::{Deserialize, Serialize};

use crate::error::{SwapError, SwapResult};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fees {
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub deposit_fee_numerator: u64,
    pub deposit_fee_denominator: u64,
}

/// `amount * numerator / denominator`, with a minimum of one base unit once
/// any fee applies. `None` on overflow or a zero denominator.
pub fn calculate_fee(token_amount: u128, fee_numerator: u128, fee_denominator: u128) -> Option<u128> {
    if fee_numerator == 0 || token_amount == 0 {
        return Some(0);
    }
    let fee = token_amount
        .checked_mul(fee_numerator)?
        .checked_div(fee_denominator)?;
    Some(fee.max(1))
}

fn validate_fraction(numerator: u64, denominator: u64) -> SwapResult<()> {
    if numerator == 0 && denominator == 0 {
        Ok(())
    } else if numerator >= denominator {
        Err(SwapError::InvalidFee)
    } else {
        Ok(())
    }
}

impl Fees {
    pub fn trading_fee(&self, trading_tokens: u128) -> Option<u128> {
        calculate_fee(
            trading_tokens,
            u128::from(self.trade_fee_numerator),
            u128::from(self.trade_fee_denominator),
        )
    }

    pub fn deposit_fee(&self, deposit_tokens: u128) -> Option<u128> {
        calculate_fee(
            deposit_tokens,
            u128::from(self.deposit_fee_numerator),
            u128::from(self.deposit_fee_denominator),
        )
    }

    pub fn validate(&self) -> SwapResult<()> {
        validate_fraction(self.trade_fee_numerator, self.trade_fee_denominator)?;
        validate_fraction(self.deposit_fee_numerator, self.deposit_fee_denominator)
    }
}
