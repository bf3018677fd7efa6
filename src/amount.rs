//! Fixed-point input rules.
//!
//! Amounts and prices entering the ledger carry at most [`MAX_DECIMAL_PLACES`] fractional
//! digits and lie in `[MIN_AMOUNT, MAX_AMOUNT]`. Derived values (notionals) are not
//! rounded; they stay exact so balances are conserved.

use rust_decimal::Decimal;

use crate::error::LedgerError;

pub const MAX_DECIMAL_PLACES: u32 = 4;

/// Smallest transferable unit, 0.0001.
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Largest amount or balance, 999_999_999_999_999.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 0);

pub const MAX_NAME_LEN: usize = 128;

/// Validates an input amount or price. Trailing zeros do not count as precision,
/// so `1.0000` and `1.00000` are both accepted; `1.00005` is not.
pub fn validate_amount(value: Decimal) -> Result<Decimal, LedgerError> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(value));
    }
    let normalized = value.normalize();
    if normalized.scale() > MAX_DECIMAL_PLACES {
        return Err(LedgerError::TooManyDecimalPlaces(value));
    }
    if normalized < MIN_AMOUNT || normalized > MAX_AMOUNT {
        return Err(LedgerError::InvalidAmount(value));
    }
    Ok(normalized)
}

/// Quote value of `amount` base units at `price`. A product that overflows or exceeds
/// [`MAX_AMOUNT`] could never be held by one account, so it is an `InvalidAmount`.
pub fn notional(price: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    price
        .checked_mul(amount)
        .filter(|n| *n <= MAX_AMOUNT)
        .ok_or(LedgerError::InvalidAmount(amount))
}

/// Uppercases and checks a ticker: 3 to 4 ASCII letters.
pub fn normalize_ticker(ticker: &str) -> Result<String, LedgerError> {
    let t = ticker.trim();
    let len = t.chars().count();
    if !(3..=4).contains(&len) || !t.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LedgerError::InvalidTicker(ticker.to_string()));
    }
    Ok(t.to_ascii_uppercase())
}

/// Trims a currency name and checks it is non-empty and at most [`MAX_NAME_LEN`] chars.
pub fn normalize_name(name: &str) -> Result<String, LedgerError> {
    let n = name.trim();
    if n.is_empty() || n.chars().count() > MAX_NAME_LEN {
        return Err(LedgerError::InvalidName(name.to_string()));
    }
    Ok(n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn bounds_constants_have_expected_values() {
        assert_eq!(MIN_AMOUNT, d("0.0001"));
        assert_eq!(MAX_AMOUNT, d("999999999999999"));
    }

    #[test]
    fn four_decimal_places_accepted_five_rejected() {
        assert_eq!(validate_amount(d("1.0000")).unwrap(), Decimal::ONE);
        assert_eq!(
            validate_amount(d("1.00005")),
            Err(LedgerError::TooManyDecimalPlaces(d("1.00005")))
        );
        assert!(validate_amount(d("1.00000")).is_ok());
    }

    #[test]
    fn non_positive_and_out_of_range_rejected() {
        assert!(matches!(validate_amount(Decimal::ZERO), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(validate_amount(d("-3")), Err(LedgerError::InvalidAmount(_))));
        assert!(validate_amount(d("0.0001")).is_ok());
        assert!(validate_amount(d("999999999999999")).is_ok());
        assert!(matches!(
            validate_amount(d("1000000000000000")),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn notional_overflow_is_an_error() {
        assert_eq!(notional(d("2.5"), d("4")), Ok(d("10")));
        assert_eq!(notional(MAX_AMOUNT, MAX_AMOUNT), Err(LedgerError::InvalidAmount(MAX_AMOUNT)));
        assert!(notional(d("1000"), MAX_AMOUNT).is_err());
    }

    #[test]
    fn ticker_rules() {
        assert_eq!(normalize_ticker("xcn").unwrap(), "XCN");
        assert_eq!(normalize_ticker(" Usdt ").unwrap(), "USDT");
        assert!(normalize_ticker("XC").is_err());
        assert!(normalize_ticker("XCNDE").is_err());
        assert!(normalize_ticker("X1N").is_err());
    }

    #[test]
    fn name_rules() {
        assert_eq!(normalize_name("  Coin ").unwrap(), "Coin");
        assert!(normalize_name("   ").is_err());
        assert!(normalize_name(&"a".repeat(129)).is_err());
    }
}
