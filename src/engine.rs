//! Single-entry exchange facade.
//!
//! [`Exchange`] owns the ledger store and a clock. Every mutating call runs as one store
//! transaction stamped with one clock reading, logs the outcome, and (when persistence
//! is attached) writes the snapshot before committing. Queries read committed state.

use chrono::{DateTime, Duration, Utc};
use log::{error, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::accounts;
use crate::catalog::{self, NewCurrency};
use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::execution::{FillResult, OrderRequest};
use crate::matching::{self, OrderFilter};
use crate::order_book::LevelSummary;
use crate::persistence::FilePersistence;
use crate::store::{LedgerSnapshot, LedgerState, Store, Txn};
use crate::trade_log::{self, MarketQuote, PricePoint, SeriesOrder};
use crate::transfer::{self, Swap};
use crate::types::{
    Account, AccountId, AccountNumber, Currency, CurrencyId, CurrencyLookup, Order, OrderId,
    OwnerId, Page, Pair, Side, TradeLogId, Transaction, TransactionId,
};

/// Supply accounting for one currency. `balanced` holds when
/// `circulating + held_in_book == supply`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplyReport {
    pub currency_id: CurrencyId,
    pub supply: Decimal,
    pub circulating: Decimal,
    pub held_in_book: Decimal,
    pub balanced: bool,
}

pub struct Exchange {
    store: Store,
    clock: Arc<dyn Clock>,
    persistence: Option<FilePersistence>,
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange {
    /// Empty ledger on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::from_state(LedgerState::new(), clock)
    }

    pub fn from_state(state: LedgerState, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Store::from_state(state),
            clock,
            persistence: None,
        }
    }

    /// Loads the ledger from `persistence` (empty if the file is missing) and keeps
    /// saving to it after every mutation.
    pub fn open(persistence: FilePersistence, clock: Arc<dyn Clock>) -> Result<Self, LedgerError> {
        let state = persistence.load().map_err(|e| {
            error!("ledger load failed path={} error={}", persistence.path().display(), e);
            LedgerError::StoreUnavailable(e.to_string())
        })?;
        let state = state.unwrap_or_default();
        info!(
            "ledger opened path={} currencies={} accounts={} orders={}",
            persistence.path().display(),
            state.currencies().count(),
            state.accounts().count(),
            state.orders().count()
        );
        Ok(Self {
            store: Store::from_state(state),
            clock,
            persistence: Some(persistence),
        })
    }

    // ---- currencies ----

    pub fn create_currency(&self, req: &NewCurrency) -> Result<Currency, LedgerError> {
        let currency = self.write("create_currency", |txn, at| catalog::create(txn, req, at))?;
        info!(
            "currency created id={} ticker={} name={} owner={} supply={} genesis_account={}",
            currency.id.0,
            currency.ticker,
            currency.name,
            currency.creator.0,
            currency.supply,
            currency.genesis_account_id.0
        );
        Ok(currency)
    }

    pub fn find_currency(&self, lookup: &CurrencyLookup) -> Result<Option<Currency>, LedgerError> {
        self.store.read(|s| s.find_currency(lookup).cloned())
    }

    pub fn rename_currency(&self, id: CurrencyId, name: &str, ticker: &str) -> Result<Currency, LedgerError> {
        let currency = self.write("rename_currency", |txn, _| catalog::rename(txn, id, name, ticker))?;
        info!("currency renamed id={} ticker={} name={}", id.0, currency.ticker, currency.name);
        Ok(currency)
    }

    pub fn set_currency_disabled(&self, id: CurrencyId, disabled: bool) -> Result<(), LedgerError> {
        self.write("set_currency_disabled", |txn, _| catalog::set_disabled(txn, id, disabled))?;
        info!("currency status id={} disabled={}", id.0, disabled);
        Ok(())
    }

    /// Mints into the genesis account. Returns its new balance.
    pub fn mint(&self, id: CurrencyId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let balance = self.write("mint", |txn, _| catalog::mint(txn, id, amount))?;
        info!("minted currency={} amount={} genesis_balance={}", id.0, amount, balance);
        Ok(balance)
    }

    /// Burns from the owner's account. Returns its new balance.
    pub fn burn(&self, owner: OwnerId, id: CurrencyId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let balance = self.write("burn", |txn, _| catalog::burn(txn, owner, id, amount))?;
        info!("burned currency={} owner={} amount={} balance={}", id.0, owner.0, amount, balance);
        Ok(balance)
    }

    pub fn list_currencies(
        &self,
        disabled: Option<bool>,
        page: usize,
        limit: usize,
    ) -> Result<Page<Currency>, LedgerError> {
        self.store.read(|s| catalog::list(s, disabled, page, limit))
    }

    // ---- accounts ----

    pub fn get_or_create_account(&self, owner: OwnerId, currency: CurrencyId) -> Result<Account, LedgerError> {
        let account = self.write("get_or_create_account", |txn, _| {
            accounts::get_or_create(txn, owner, currency)
        })?;
        info!("account ready id={} owner={} currency={}", account.id.0, owner.0, currency.0);
        Ok(account)
    }

    pub fn set_account_disabled(&self, account: AccountId, disabled: bool) -> Result<(), LedgerError> {
        self.write("set_account_disabled", |txn, _| accounts::set_disabled(txn, account, disabled))?;
        info!("account status account={} disabled={}", account.0, disabled);
        Ok(())
    }

    pub fn is_central(&self, account: AccountId) -> Result<bool, LedgerError> {
        self.store.read(|s| accounts::is_central(s, account))?
    }

    pub fn view_balance(&self, owner: OwnerId, currency: &CurrencyLookup) -> Result<Decimal, LedgerError> {
        self.store.read(|s| accounts::view_balance(s, owner, currency))?
    }

    /// Resolves `XCN-42` (or `XCN42`) to an existing account.
    pub fn resolve_account_number(&self, number: &str) -> Result<Account, LedgerError> {
        let number: AccountNumber = number.parse()?;
        self.store.read(|s| accounts::resolve(s, &number))?
    }

    pub fn account_number(&self, account: AccountId) -> Result<AccountNumber, LedgerError> {
        self.store.read(|s| accounts::account_number(s, account))?
    }

    pub fn list_accounts(&self, owner: OwnerId) -> Result<Vec<Account>, LedgerError> {
        self.store.read(|s| accounts::list(s, owner))
    }

    // ---- transfers ----

    pub fn transfer(
        &self,
        sender: OwnerId,
        receiver: OwnerId,
        currency: CurrencyId,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        let tx = self.write("transfer", |txn, at| {
            transfer::transfer(txn, sender, receiver, currency, amount, at)
        })?;
        log_transfer(&tx, sender, receiver);
        Ok(tx)
    }

    pub fn transfer_to_account_number(
        &self,
        sender: OwnerId,
        receiver: &str,
        amount: Decimal,
    ) -> Result<Transaction, LedgerError> {
        let number: AccountNumber = logged("transfer", receiver.parse())?;
        let tx = self.write("transfer", |txn, at| {
            transfer::transfer_to_account_number(txn, sender, &number, amount, at)
        })?;
        log_transfer(&tx, sender, number.owner);
        Ok(tx)
    }

    /// Direct two-party exchange of `base_amount` base for `quote_amount` quote.
    pub fn swap(
        &self,
        pair: Pair,
        sender: OwnerId,
        receiver: OwnerId,
        base_amount: Decimal,
        quote_amount: Decimal,
    ) -> Result<Swap, LedgerError> {
        let done = self.write("swap", |txn, at| {
            transfer::swap(txn, pair, sender, receiver, base_amount, quote_amount, at)
        })?;
        info!(
            "swap sender={} receiver={} base={} quote={} base_amount={} quote_amount={} price={} trade_log={}",
            sender.0,
            receiver.0,
            pair.base.0,
            pair.quote.0,
            done.base_leg.amount,
            done.quote_leg.amount,
            done.price,
            done.trade_log_id.0
        );
        Ok(done)
    }

    pub fn list_transactions(
        &self,
        owner: OwnerId,
        recent_first: bool,
        page: usize,
        limit: usize,
    ) -> Result<Page<Transaction>, LedgerError> {
        self.store
            .read(|s| transfer::history(s, owner, recent_first, page, limit))
    }

    pub fn transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.store.read(|s| transfer::find(s, id))?
    }

    // ---- orders ----

    pub fn submit(&self, req: &OrderRequest) -> Result<FillResult, LedgerError> {
        info!(
            "order submitted owner={} side={:?} base={} quote={} price={} amount={}",
            req.owner.0, req.side, req.base.0, req.quote.0, req.price, req.amount
        );
        let result = self.write("submit", |txn, at| matching::submit(txn, req, at))?;
        for fill in result.fills() {
            info!(
                "fill resting_order={} counterparty={} price={} quantity={} resting_closed={} trade_log={}",
                fill.resting_order_id.0,
                fill.counterparty.0,
                fill.price,
                fill.quantity,
                fill.resting_fully_filled,
                fill.trade_log_id.0
            );
        }
        if let Some(id) = result.listed() {
            info!("order listed order_id={} owner={}", id.0, req.owner.0);
        }
        Ok(result)
    }

    pub fn cancel(&self, owner: OwnerId, order_id: OrderId) -> Result<Order, LedgerError> {
        let order = self.write("cancel", |txn, at| matching::cancel(txn, owner, order_id, at))?;
        let (currency, _) = order.held();
        info!(
            "order canceled order_id={} owner={} refunded_currency={} remaining={}",
            order_id.0, owner.0, currency.0, order.amount
        );
        Ok(order)
    }

    pub fn order(&self, id: OrderId) -> Result<Order, LedgerError> {
        self.store
            .read(|s| s.order(id).cloned())?
            .ok_or(LedgerError::OrderNotFound(id))
    }

    pub fn list_orders(&self, filter: &OrderFilter, page: usize, limit: usize) -> Result<Page<Order>, LedgerError> {
        self.store.read(|s| matching::list_orders(s, filter, page, limit))
    }

    /// Resolves a pair from two tickers.
    pub fn pair_by_tickers(&self, base: &str, quote: &str) -> Result<Pair, LedgerError> {
        self.store.read(|s| {
            let find = |t: &str| catalog::find(s, &CurrencyLookup::Ticker(t.to_string()));
            Ok(Pair::new(find(base)?.id, find(quote)?.id))
        })?
    }

    // ---- trade log ----

    /// Records a trade price directly (imports, corrections). Matching appends its own.
    pub fn append_trade_log(&self, pair: Pair, price: Decimal) -> Result<TradeLogId, LedgerError> {
        let id = self.write("append_trade_log", |txn, at| trade_log::append(txn, pair, price, at))?;
        info!("trade logged id={} base={} quote={} price={}", id.0, pair.base.0, pair.quote.0, price);
        Ok(id)
    }

    pub fn last_price(&self, pair: Pair) -> Result<Option<Decimal>, LedgerError> {
        self.store.read(|s| trade_log::last_price(s, pair))
    }

    pub fn best_bid(&self, pair: Pair) -> Result<Option<Decimal>, LedgerError> {
        self.store.read(|s| trade_log::best_bid(s, pair))
    }

    pub fn best_ask(&self, pair: Pair) -> Result<Option<Decimal>, LedgerError> {
        self.store.read(|s| trade_log::best_ask(s, pair))
    }

    pub fn quote(&self, pair: Pair) -> Result<MarketQuote, LedgerError> {
        self.store.read(|s| trade_log::quote(s, pair))
    }

    pub fn depth(&self, pair: Pair, side: Side) -> Result<Vec<LevelSummary>, LedgerError> {
        self.store
            .read(|s| s.book(pair).map(|b| b.depth(side)).unwrap_or_default())
    }

    pub fn series(
        &self,
        pair: Pair,
        since: Option<DateTime<Utc>>,
        order: SeriesOrder,
    ) -> Result<Vec<PricePoint>, LedgerError> {
        self.store.read(|s| trade_log::series(s, pair, since, order))
    }

    pub fn percentage_changes(&self, pair: Pair, window: Duration) -> Result<Vec<Decimal>, LedgerError> {
        self.store.read(|s| trade_log::percentage_changes(s, pair, window))
    }

    // ---- whole ledger ----

    pub fn supply_report(&self, currency: CurrencyId) -> Result<SupplyReport, LedgerError> {
        self.store.read(|s| {
            let c = catalog::find(s, &CurrencyLookup::Id(currency))?;
            let circulating = s.circulating(currency);
            let held_in_book = s.held_in_book(currency);
            Ok(SupplyReport {
                currency_id: currency,
                supply: c.supply,
                circulating,
                held_in_book,
                balanced: circulating + held_in_book == c.supply,
            })
        })?
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        self.store.read(LedgerState::snapshot)
    }

    /// Read-only access to committed state.
    pub fn with_state<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T, LedgerError> {
        self.store.read(f)
    }

    /// One store transaction at one instant. The snapshot is saved before commit, so a
    /// failed save rolls the mutation back.
    fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Txn<'_>, DateTime<Utc>) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let at = self.clock.now();
        let result = self.store.transaction(|txn| {
            let out = f(txn, at)?;
            if let Some(p) = &self.persistence {
                p.save(&txn.snapshot()).map_err(|e| {
                    error!("ledger save failed path={} error={}", p.path().display(), e);
                    LedgerError::StoreUnavailable(e.to_string())
                })?;
            }
            Ok(out)
        });
        logged(op, result)
    }
}

fn logged<T>(op: &str, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
    if let Err(e) = &result {
        warn!("{} rejected kind={} error={}", op, e.kind(), e);
    }
    result
}

fn log_transfer(tx: &Transaction, sender: OwnerId, receiver: OwnerId) {
    info!(
        "transfer id={} sender={} receiver={} from_account={} to_account={} amount={}",
        tx.id, sender.0, receiver.0, tx.sender_account_id.0, tx.receiver_account_id.0, tx.amount
    );
}
