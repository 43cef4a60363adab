//! Exchange rate storage and resolution.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use paraledger_shared::types::Currency;

/// Rate type distinguishing valuation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    /// Transaction-date spot rate.
    Spot,
    /// Period-closing rate; used for parallel-ledger translation.
    Closing,
    /// Period-average rate.
    Average,
}

impl RateType {
    /// Returns the string representation of the rate type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Closing => "closing",
            Self::Average => "average",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored exchange rate quotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Rate type.
    pub rate_type: RateType,
    /// Date the rate is effective from.
    pub rate_date: NaiveDate,
    /// Rate value (1 `from` = `rate` `to`).
    pub rate: Decimal,
}

/// Exchange rate resolution errors.
#[derive(Debug, Error)]
pub enum RateError {
    /// No rate stored on or before the requested date.
    ///
    /// Absence is a hard error; amounts are never silently translated
    /// at 1.0.
    #[error("No {rate_type} rate for {from}->{to} on or before {date}")]
    RateNotFound {
        /// Source currency.
        from: Currency,
        /// Target currency.
        to: Currency,
        /// Requested date.
        date: NaiveDate,
        /// Requested rate type.
        rate_type: RateType,
    },

    /// A stored rate must be strictly positive.
    #[error("Rate for {from}->{to} on {date} is not positive")]
    NonPositiveRate {
        /// Source currency.
        from: Currency,
        /// Target currency.
        to: Currency,
        /// Rate date.
        date: NaiveDate,
    },
}

/// In-memory table of exchange rates with historical lookup.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: Vec<ExchangeRate>,
}

impl RateTable {
    /// Builds a rate table, rejecting non-positive rates.
    ///
    /// # Errors
    ///
    /// Returns `RateError::NonPositiveRate` for a zero or negative rate.
    pub fn new(rates: Vec<ExchangeRate>) -> Result<Self, RateError> {
        for r in &rates {
            if r.rate <= Decimal::ZERO {
                return Err(RateError::NonPositiveRate {
                    from: r.from,
                    to: r.to,
                    date: r.rate_date,
                });
            }
        }
        Ok(Self { rates })
    }

    /// Resolves the rate for a currency pair at a date.
    ///
    /// Same-currency pairs short-circuit to 1 without a lookup.
    /// Historical lookups use the latest rate with
    /// `rate_date <= requested date` for the given type.
    ///
    /// # Errors
    ///
    /// Returns `RateError::RateNotFound` when no applicable rate exists.
    pub fn rate(
        &self,
        from: Currency,
        to: Currency,
        date: NaiveDate,
        rate_type: RateType,
    ) -> Result<Decimal, RateError> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        self.rates
            .iter()
            .filter(|r| {
                r.from == from && r.to == to && r.rate_type == rate_type && r.rate_date <= date
            })
            .max_by_key(|r| r.rate_date)
            .map(|r| r.rate)
            .ok_or(RateError::RateNotFound {
                from,
                to,
                date,
                rate_type,
            })
    }
}
