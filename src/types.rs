//! Core types and IDs for the ledger and the order book.
//!
//! Numeric identifiers are newtype wrappers over `u64`, allocated sequentially by the
//! store. [`TransactionId`] is a UUID because transactions are referenced outside the
//! ledger (receipts). All timestamps are UTC.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LedgerError;

/// Currency identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyId(pub u64);

/// Account identifier (one account per owner and currency).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

/// External owner identifier (the front end's user id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

/// Order identifier. Allocated monotonically, so a lower id was created earlier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// Trade log entry identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeLogId(pub u64);

/// Transaction identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order lifecycle. `Closed` and `Canceled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Closed => "CLOSED",
            OrderStatus::Canceled => "CANCELED",
        };
        f.write_str(s)
    }
}

/// A base/quote currency pair. Base and quote are never equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub base: CurrencyId,
    pub quote: CurrencyId,
}

impl Pair {
    pub fn new(base: CurrencyId, quote: CurrencyId) -> Self {
        Self { base, quote }
    }
}

/// A virtual currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub name: String,
    /// 3-4 uppercase letters, globally unique.
    pub ticker: String,
    pub disabled: bool,
    /// Owner that created the currency (one currency per creator).
    pub creator: OwnerId,
    /// Central (reserve) account created together with the currency.
    pub genesis_account_id: AccountId,
    /// Initial supply plus mints minus burns.
    pub supply: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Balance of one owner in one currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner: OwnerId,
    pub currency_id: CurrencyId,
    pub balance: Decimal,
    pub disabled: bool,
}

/// Immutable record of a balance movement between two accounts.
///
/// The genesis of a currency is the self-transaction `sender == receiver == genesis account`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub sender_account_id: AccountId,
    pub receiver_account_id: AccountId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A limit order. `amount` is the remaining base quantity and only ever decreases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: OwnerId,
    pub side: Side,
    pub pair: Pair,
    /// Quote units per base unit.
    pub price: Decimal,
    pub amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Open)
    }

    /// Funds the book holds for this order while it rests: quote notional for a buy,
    /// base amount for a sell. Zero once the order is terminal.
    pub fn held(&self) -> (CurrencyId, Decimal) {
        if !self.is_open() {
            return match self.side {
                Side::Buy => (self.pair.quote, Decimal::ZERO),
                Side::Sell => (self.pair.base, Decimal::ZERO),
            };
        }
        match self.side {
            Side::Buy => (self.pair.quote, self.amount.saturating_mul(self.price)),
            Side::Sell => (self.pair.base, self.amount),
        }
    }
}

/// One executed trade price, append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub id: TradeLogId,
    pub pair: Pair,
    pub executed_price: Decimal,
    pub traded_at: DateTime<Utc>,
}

/// How a collaborator refers to a currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyLookup {
    Id(CurrencyId),
    Name(String),
    /// Case-insensitive; normalised to uppercase.
    Ticker(String),
    /// The currency an account is denominated in.
    Account(AccountId),
}

/// Human-facing account number: `<TICKER>-<owner>`, e.g. `XCN-42`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNumber {
    pub ticker: String,
    pub owner: OwnerId,
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ticker, self.owner.0)
    }
}

impl FromStr for AccountNumber {
    type Err = LedgerError;

    /// Accepts `XCN-42` and the undelimited `XCN42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidAccountNumber(s.to_string());
        let s = s.trim();
        let (ticker, owner) = match s.split_once('-') {
            Some((t, o)) => (t.to_string(), o.to_string()),
            None => {
                let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
                (s[..split].to_string(), s[split..].to_string())
            }
        };
        let ticker = crate::amount::normalize_ticker(&ticker).map_err(|_| invalid())?;
        let owner: u64 = owner.parse().map_err(|_| invalid())?;
        Ok(Self {
            ticker,
            owner: OwnerId(owner),
        })
    }
}

/// One page of a listing. Pages are 1-based.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    /// At least 1, even for an empty listing.
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slices an already ordered listing.
    pub fn paginate(all: Vec<T>, page: usize, limit: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_items = all.len();
        let total_pages = total_items.div_ceil(limit).max(1);
        let items = all
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();
        Self {
            items,
            page,
            limit,
            total_items,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
