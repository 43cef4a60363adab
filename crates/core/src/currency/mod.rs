//! Exchange rates and currency translation.

pub mod conversion;
pub mod rates;

pub use conversion::{convert_amount, round_half_up};
pub use rates::{ExchangeRate, RateError, RateTable, RateType};
