//! Error taxonomy for ledger, transfer and matching operations.
//!
//! Every operation returns `Result<_, LedgerError>`; nothing is retried internally.
//! [`LedgerError::kind`] is a stable machine-readable code for collaborators.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{AccountId, CurrencyId, OrderId, OrderStatus, TransactionId};

/// Which side of an operation lacked an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRole {
    Sender,
    Holder,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRole::Sender => f.write_str("sender"),
            AccountRole::Holder => f.write_str("holder"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("too many decimal places in {0} (max 4)")]
    TooManyDecimalPlaces(Decimal),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("account {0:?} is disabled")]
    AccountDisabled(AccountId),

    #[error("{0} account missing")]
    AccountMissing(AccountRole),

    #[error("account {0:?} not found")]
    AccountNotFound(AccountId),

    #[error("sender and receiver are the same account")]
    SameAccount,

    #[error("currency not found")]
    CurrencyNotFound,

    #[error("currency {0:?} is disabled")]
    CurrencyDisabled(CurrencyId),

    #[error("currency name already exists: {0}")]
    DuplicateCurrencyName(String),

    #[error("currency ticker already exists: {0}")]
    DuplicateTicker(String),

    #[error("invalid ticker {0:?}: expected 3-4 letters")]
    InvalidTicker(String),

    #[error("invalid currency name {0:?}")]
    InvalidName(String),

    #[error("owner already created a currency")]
    CurrencyLimitReached,

    #[error("base and quote currency must differ")]
    IdenticalPair,

    #[error("order {0:?} not found")]
    OrderNotFound(OrderId),

    #[error("order {id:?} is already {status}")]
    OrderNotOpen { id: OrderId, status: OrderStatus },

    #[error("order {0:?} belongs to another owner")]
    NotOrderOwner(OrderId),

    #[error("invalid account number {0:?}")]
    InvalidAccountNumber(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    /// Stable snake_case code, one per variant.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::TooManyDecimalPlaces(_) => "too_many_decimal_places",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::AccountDisabled(_) => "account_disabled",
            LedgerError::AccountMissing(AccountRole::Sender) => "sender_account_missing",
            LedgerError::AccountMissing(AccountRole::Holder) => "account_missing",
            LedgerError::AccountNotFound(_) => "account_not_found",
            LedgerError::SameAccount => "same_account",
            LedgerError::CurrencyNotFound => "currency_not_found",
            LedgerError::CurrencyDisabled(_) => "currency_disabled",
            LedgerError::DuplicateCurrencyName(_) => "duplicate_currency_name",
            LedgerError::DuplicateTicker(_) => "duplicate_ticker",
            LedgerError::InvalidTicker(_) => "invalid_ticker",
            LedgerError::InvalidName(_) => "invalid_name",
            LedgerError::CurrencyLimitReached => "currency_limit_reached",
            LedgerError::IdenticalPair => "identical_pair",
            LedgerError::OrderNotFound(_) => "order_not_found",
            LedgerError::OrderNotOpen { .. } => "order_not_open",
            LedgerError::NotOrderOwner(_) => "not_order_owner",
            LedgerError::InvalidAccountNumber(_) => "invalid_account_number",
            LedgerError::TransactionNotFound(_) => "transaction_not_found",
            LedgerError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}
