//! Fixed-point token amounts.
//!
//! A `TokenAmount` carries its magnitude as a `Decimal` together with the mint's
//! decimal count and whether the magnitude is already in base units. Converting
//! whole-token amounts to base units floors any remainder below one base unit;
//! nothing is ever rounded up.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants::MAX_DECIMALS;
use crate::error::{SwapError, SwapResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAmount {
    magnitude: Decimal,
    decimals: u8,
    is_base_units: bool,
}

impl TokenAmount {
    pub fn new(magnitude: Decimal, decimals: u8, is_base_units: bool) -> SwapResult<Self> {
        if magnitude < Decimal::ZERO {
            return Err(SwapError::InvalidAmount(format!(
                "negative magnitude {}",
                magnitude
            )));
        }
        if decimals > MAX_DECIMALS {
            return Err(SwapError::InvalidAmount(format!(
                "{} decimals exceeds the maximum of {}",
                decimals, MAX_DECIMALS
            )));
        }
        if is_base_units && !magnitude.fract().is_zero() {
            return Err(SwapError::InvalidAmount(format!(
                "base-unit magnitude {} has a fractional part",
                magnitude
            )));
        }
        Ok(Self {
            magnitude,
            decimals,
            is_base_units,
        })
    }

    /// Amount in whole-token units, e.g. `0.0001` SOL.
    pub fn from_ui(magnitude: Decimal, decimals: u8) -> SwapResult<Self> {
        Self::new(magnitude, decimals, false)
    }

    /// Amount as read from a token account or the chain, e.g. `100000` lamports.
    pub fn from_base_units(amount: u64, decimals: u8) -> SwapResult<Self> {
        Self::new(Decimal::from(amount), decimals, true)
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Integer base units, `floor(magnitude * 10^decimals)` for whole-token amounts.
    pub fn to_base_units(&self) -> SwapResult<u128> {
        let base = if self.is_base_units {
            self.magnitude
        } else {
            self.magnitude
                .checked_mul(scale(self.decimals)?)
                .ok_or(SwapError::AmountOverflow)?
        };
        base.floor().to_u128().ok_or(SwapError::AmountOverflow)
    }

    /// Base units narrowed to the 8-byte field instruction payloads carry.
    pub fn to_wire_units(&self) -> SwapResult<u64> {
        u64::try_from(self.to_base_units()?).map_err(|_| SwapError::AmountOverflow)
    }

    /// Whole-token value as an exact decimal.
    pub fn ui_amount(&self) -> SwapResult<Decimal> {
        if self.is_base_units {
            self.magnitude
                .checked_div(scale(self.decimals)?)
                .ok_or(SwapError::AmountOverflow)
        } else {
            Ok(self.magnitude)
        }
    }

    /// Whole-token value as a float, for display only.
    pub fn to_ui_amount(&self) -> f64 {
        self.ui_amount()
            .ok()
            .and_then(|value| value.to_f64())
            .unwrap_or(f64::NAN)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ui_amount() {
            Ok(value) => write!(f, "{}", value.normalize()),
            Err(_) => write!(f, "{}e-{}", self.magnitude, self.decimals),
        }
    }
}

fn scale(decimals: u8) -> SwapResult<Decimal> {
    Decimal::try_from_i128_with_scale(10i128.pow(decimals as u32), 0)
        .map_err(|_| SwapError::AmountOverflow)
}
