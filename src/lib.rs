//! # Ledger Exchange
//!
//! Virtual multi-currency ledger with peer transfers and a price-time priority limit
//! order book per currency pair. Balances, orders and the trade log live in one
//! transactional store; every operation either commits fully or leaves no trace.
//!
//! ## Entry point
//!
//! Use [`Exchange`] as the single entry point: create currencies, move balances with
//! [`Exchange::transfer`], trade with [`Exchange::submit`] and [`Exchange::cancel`],
//! and read prices with [`Exchange::quote`] and [`Exchange::series`].
//!
//! ## Example
//!
//! ```rust
//! use ledger_exchange::{Exchange, FillResult, NewCurrency, OrderRequest, OwnerId, Side};
//! use rust_decimal::Decimal;
//!
//! let ex = Exchange::new();
//! let xcn = ex.create_currency(&NewCurrency {
//!     owner: OwnerId(1),
//!     name: "Xcoin".into(),
//!     ticker: "xcn".into(),
//!     initial_supply: Decimal::from(1_000_000),
//! }).unwrap();
//! let usd = ex.create_currency(&NewCurrency {
//!     owner: OwnerId(2),
//!     name: "Dollar".into(),
//!     ticker: "USD".into(),
//!     initial_supply: Decimal::from(1_000_000),
//! }).unwrap();
//!
//! let sell = OrderRequest {
//!     owner: OwnerId(1),
//!     side: Side::Sell,
//!     base: xcn.id,
//!     quote: usd.id,
//!     price: Decimal::from(2),
//!     amount: Decimal::from(100),
//! };
//! assert!(matches!(ex.submit(&sell).unwrap(), FillResult::Listed { .. }));
//!
//! let buy = OrderRequest { owner: OwnerId(2), side: Side::Buy, ..sell };
//! let result = ex.submit(&buy).unwrap();
//! assert_eq!(result.fills().len(), 1);
//! ```
//!
//! ## Lower-level API
//!
//! The component modules ([`catalog`], [`accounts`], [`transfer`], [`matching`],
//! [`trade_log`]) take a [`store::Txn`] or [`store::LedgerState`] directly if you
//! manage store transactions yourself.

pub mod accounts;
pub mod amount;
pub mod api;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod matching;
pub mod order_book;
pub mod order_flow_gen;
pub mod persistence;
pub mod store;
pub mod trade_log;
pub mod transfer;
pub mod types;

pub use catalog::NewCurrency;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ServerConfig;
pub use engine::{Exchange, SupplyReport};
pub use error::{AccountRole, LedgerError};
pub use execution::{Fill, FillResult, OrderRequest};
pub use matching::OrderFilter;
pub use order_book::OrderBook;
pub use persistence::FilePersistence;
pub use store::{LedgerSnapshot, LedgerState, Store};
pub use trade_log::{MarketQuote, PricePoint, SeriesOrder};
pub use transfer::Swap;
pub use types::{
    Account, AccountId, AccountNumber, Currency, CurrencyId, CurrencyLookup, Order, OrderId,
    OrderStatus, OwnerId, Page, Pair, Side, TradeLogEntry, TradeLogId, Transaction, TransactionId,
};
pub use order_flow_gen::{bootstrap_pair, replay_into_exchange, FlowEvent, Generator, GeneratorConfig};
