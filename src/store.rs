//! Ledger store: authoritative balances, orders and logs behind one lock.
//!
//! Writers go through [`Store::transaction`], which serializes all mutations and hands
//! the closure a [`Txn`]. Every mutation made through a `Txn` records an undo entry;
//! if the closure returns `Err` (or unwinds) the journal is replayed in reverse, so a
//! failed operation leaves no trace. Readers use [`Store::read`] and only ever see
//! committed state.

use chrono::{DateTime, Utc};
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Deref;
use std::sync::RwLock;

use crate::amount::MAX_AMOUNT;
use crate::error::LedgerError;
use crate::order_book::{build_books, OrderBook};
use crate::types::{
    Account, AccountId, Currency, CurrencyId, CurrencyLookup, Order, OrderId, OrderStatus,
    OwnerId, Pair, Side, TradeLogEntry, TradeLogId, Transaction, TransactionId,
};

/// Id counters. Each holds the next id to hand out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub next_currency_id: u64,
    pub next_account_id: u64,
    pub next_order_id: u64,
    pub next_trade_log_id: u64,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            next_currency_id: 1,
            next_account_id: 1,
            next_order_id: 1,
            next_trade_log_id: 1,
        }
    }
}

/// Serializable form of the ledger: the five persisted tables plus id counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub currencies: Vec<Currency>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub orders: Vec<Order>,
    pub trade_log: Vec<TradeLogEntry>,
    pub counters: Counters,
}

/// In-memory ledger tables plus derived indexes (account lookup, per-pair books).
#[derive(Debug, Default)]
pub struct LedgerState {
    currencies: BTreeMap<CurrencyId, Currency>,
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    orders: BTreeMap<OrderId, Order>,
    trade_log: Vec<TradeLogEntry>,
    counters: Counters,
    account_index: HashMap<(OwnerId, CurrencyId), AccountId>,
    books: HashMap<Pair, OrderBook>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the state and its indexes from a snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let account_index = snapshot
            .accounts
            .iter()
            .map(|a| ((a.owner, a.currency_id), a.id))
            .collect();
        let books = build_books(&snapshot.orders);
        Self {
            currencies: snapshot.currencies.into_iter().map(|c| (c.id, c)).collect(),
            accounts: snapshot.accounts.into_iter().map(|a| (a.id, a)).collect(),
            transactions: snapshot.transactions,
            orders: snapshot.orders.into_iter().map(|o| (o.id, o)).collect(),
            trade_log: snapshot.trade_log,
            counters: snapshot.counters,
            account_index,
            books,
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            currencies: self.currencies.values().cloned().collect(),
            accounts: self.accounts.values().cloned().collect(),
            transactions: self.transactions.clone(),
            orders: self.orders.values().cloned().collect(),
            trade_log: self.trade_log.clone(),
            counters: self.counters,
        }
    }

    pub fn currency(&self, id: CurrencyId) -> Option<&Currency> {
        self.currencies.get(&id)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    /// Resolves a lookup. Ticker matching is case-insensitive.
    pub fn find_currency(&self, lookup: &CurrencyLookup) -> Option<&Currency> {
        match lookup {
            CurrencyLookup::Id(id) => self.currency(*id),
            CurrencyLookup::Name(name) => {
                let name = name.trim();
                self.currencies.values().find(|c| c.name == name)
            }
            CurrencyLookup::Ticker(ticker) => {
                let ticker = ticker.trim().to_ascii_uppercase();
                self.currencies.values().find(|c| c.ticker == ticker)
            }
            CurrencyLookup::Account(id) => self
                .account(*id)
                .and_then(|a| self.currency(a.currency_id)),
        }
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn account_for(&self, owner: OwnerId, currency: CurrencyId) -> Option<&Account> {
        self.account_index
            .get(&(owner, currency))
            .and_then(|id| self.accounts.get(id))
    }

    /// All accounts of one owner, by account id.
    pub fn accounts_of(&self, owner: OwnerId) -> impl Iterator<Item = &Account> {
        self.accounts.values().filter(move |a| a.owner == owner)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Balance of `owner` in `currency`; zero when no account exists yet.
    pub fn balance(&self, owner: OwnerId, currency: CurrencyId) -> Decimal {
        self.account_for(owner, currency)
            .map(|a| a.balance)
            .unwrap_or(Decimal::ZERO)
    }

    /// Transactions in commit order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// All orders (any status), by id.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn book(&self, pair: Pair) -> Option<&OrderBook> {
        self.books.get(&pair)
    }

    /// Trade log in append order.
    pub fn trade_log(&self) -> &[TradeLogEntry] {
        &self.trade_log
    }

    /// Funds escrowed by open orders in `currency`.
    pub fn held_in_book(&self, currency: CurrencyId) -> Decimal {
        self.orders
            .values()
            .map(Order::held)
            .filter(|(c, _)| *c == currency)
            .map(|(_, held)| held)
            .sum()
    }

    /// Sum of all account balances in `currency`.
    pub fn circulating(&self, currency: CurrencyId) -> Decimal {
        self.accounts
            .values()
            .filter(|a| a.currency_id == currency)
            .map(|a| a.balance)
            .sum()
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    fn book_insert(&mut self, order: &Order) {
        if order.is_open() {
            self.books.entry(order.pair).or_default().insert(order);
        }
    }

    fn book_remove(&mut self, order: &Order) {
        if let Some(book) = self.books.get_mut(&order.pair) {
            book.remove(order.side, order.price, order.id);
        }
    }
}

#[derive(Debug)]
enum Undo {
    CurrencyInserted(CurrencyId),
    CurrencyReplaced(Currency),
    AccountInserted(AccountId),
    AccountReplaced(Account),
    TransactionAppended,
    OrderInserted(OrderId),
    OrderReplaced(Order),
    TradeLogAppended,
}

/// A scoped write transaction. Dropped without [`Txn::commit`] it rolls back.
#[derive(Debug)]
pub struct Txn<'a> {
    state: &'a mut LedgerState,
    journal: Vec<Undo>,
    counters: Counters,
    committed: bool,
}

impl<'a> Txn<'a> {
    pub fn begin(state: &'a mut LedgerState) -> Self {
        let counters = state.counters;
        Self {
            state,
            journal: Vec::new(),
            counters,
            committed: false,
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
    }

    pub fn allocate_currency_id(&mut self) -> CurrencyId {
        let id = self.state.counters.next_currency_id;
        self.state.counters.next_currency_id += 1;
        CurrencyId(id)
    }

    pub fn insert_currency(&mut self, currency: Currency) {
        self.journal.push(Undo::CurrencyInserted(currency.id));
        self.state.currencies.insert(currency.id, currency);
    }

    /// Applies `f` to a currency, journaling the previous value.
    pub fn update_currency(
        &mut self,
        id: CurrencyId,
        f: impl FnOnce(&mut Currency),
    ) -> Result<(), LedgerError> {
        let currency = self
            .state
            .currencies
            .get_mut(&id)
            .ok_or(LedgerError::CurrencyNotFound)?;
        self.journal.push(Undo::CurrencyReplaced(currency.clone()));
        f(currency);
        Ok(())
    }

    /// Returns the owner's account in `currency`, creating it with balance 0 if absent.
    pub fn get_or_create_account(&mut self, owner: OwnerId, currency: CurrencyId) -> AccountId {
        if let Some(id) = self.state.account_index.get(&(owner, currency)) {
            return *id;
        }
        let id = AccountId(self.state.counters.next_account_id);
        self.state.counters.next_account_id += 1;
        self.state.accounts.insert(
            id,
            Account {
                id,
                owner,
                currency_id: currency,
                balance: Decimal::ZERO,
                disabled: false,
            },
        );
        self.state.account_index.insert((owner, currency), id);
        self.journal.push(Undo::AccountInserted(id));
        id
    }

    pub fn set_account_disabled(&mut self, id: AccountId, disabled: bool) -> Result<(), LedgerError> {
        self.update_account(id, |a| a.disabled = disabled)
    }

    /// Adds `amount` to an enabled account. Returns the new balance.
    pub fn credit(&mut self, id: AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let account = self.writable_account(id, amount)?;
        let balance = account
            .balance
            .checked_add(amount)
            .filter(|b| *b <= MAX_AMOUNT)
            .ok_or(LedgerError::InvalidAmount(amount))?;
        self.update_account(id, |a| a.balance = balance)?;
        Ok(balance)
    }

    /// Removes `amount` from an enabled account. Returns the new balance.
    pub fn debit(&mut self, id: AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let account = self.writable_account(id, amount)?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: account.balance,
            });
        }
        let balance = account.balance - amount;
        self.update_account(id, |a| a.balance = balance)?;
        Ok(balance)
    }

    pub fn append_transaction(
        &mut self,
        sender: AccountId,
        receiver: AccountId,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Transaction {
        let tx = Transaction {
            id: TransactionId::new(),
            sender_account_id: sender,
            receiver_account_id: receiver,
            amount,
            timestamp,
        };
        self.state.transactions.push(tx.clone());
        self.journal.push(Undo::TransactionAppended);
        tx
    }

    /// Rests a new OPEN order on its book. Ids are monotonic, so the new order is
    /// last in time priority at its price.
    pub fn insert_order(
        &mut self,
        owner: OwnerId,
        side: Side,
        pair: Pair,
        price: Decimal,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> OrderId {
        let id = OrderId(self.state.counters.next_order_id);
        self.state.counters.next_order_id += 1;
        let order = Order {
            id,
            owner,
            side,
            pair,
            price,
            amount,
            status: OrderStatus::Open,
            created_at: at,
            updated_at: at,
        };
        self.state.book_insert(&order);
        self.state.orders.insert(id, order);
        self.journal.push(Undo::OrderInserted(id));
        id
    }

    /// Reduces an open order by `quantity`; closes it and takes it off the book at zero.
    /// Returns true if the order is now fully filled.
    pub fn fill_order(
        &mut self,
        id: OrderId,
        quantity: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let order = self.open_order(id)?;
        if quantity <= Decimal::ZERO || quantity > order.amount {
            return Err(LedgerError::InvalidAmount(quantity));
        }
        let mut next = order.clone();
        next.amount -= quantity;
        next.updated_at = at;
        if next.amount.is_zero() {
            next.status = OrderStatus::Closed;
        }
        let closed = next.status == OrderStatus::Closed;
        self.replace_order(next);
        Ok(closed)
    }

    /// Marks an open order CANCELED and removes it from the book.
    pub fn cancel_order(&mut self, id: OrderId, at: DateTime<Utc>) -> Result<Order, LedgerError> {
        let mut next = self.open_order(id)?.clone();
        next.status = OrderStatus::Canceled;
        next.updated_at = at;
        self.replace_order(next.clone());
        Ok(next)
    }

    pub fn append_trade(&mut self, pair: Pair, price: Decimal, at: DateTime<Utc>) -> TradeLogId {
        let id = TradeLogId(self.state.counters.next_trade_log_id);
        self.state.counters.next_trade_log_id += 1;
        self.state.trade_log.push(TradeLogEntry {
            id,
            pair,
            executed_price: price,
            traded_at: at,
        });
        self.journal.push(Undo::TradeLogAppended);
        id
    }

    fn open_order(&self, id: OrderId) -> Result<&Order, LedgerError> {
        let order = self.state.order(id).ok_or(LedgerError::OrderNotFound(id))?;
        if !order.is_open() {
            return Err(LedgerError::OrderNotOpen {
                id,
                status: order.status,
            });
        }
        Ok(order)
    }

    fn replace_order(&mut self, next: Order) {
        if let Some(prev) = self.state.orders.insert(next.id, next.clone()) {
            self.state.book_remove(&prev);
            self.journal.push(Undo::OrderReplaced(prev));
        }
        self.state.book_insert(&next);
    }

    fn writable_account(&self, id: AccountId, amount: Decimal) -> Result<&Account, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let account = self
            .state
            .account(id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        if account.disabled {
            return Err(LedgerError::AccountDisabled(id));
        }
        Ok(account)
    }

    fn update_account(&mut self, id: AccountId, f: impl FnOnce(&mut Account)) -> Result<(), LedgerError> {
        let account = self
            .state
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        self.journal.push(Undo::AccountReplaced(account.clone()));
        f(account);
        Ok(())
    }

    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            let state = &mut *self.state;
            match undo {
                Undo::CurrencyInserted(id) => {
                    state.currencies.remove(&id);
                }
                Undo::CurrencyReplaced(prev) => {
                    state.currencies.insert(prev.id, prev);
                }
                Undo::AccountInserted(id) => {
                    if let Some(a) = state.accounts.remove(&id) {
                        state.account_index.remove(&(a.owner, a.currency_id));
                    }
                }
                Undo::AccountReplaced(prev) => {
                    state.accounts.insert(prev.id, prev);
                }
                Undo::TransactionAppended => {
                    state.transactions.pop();
                }
                Undo::OrderInserted(id) => {
                    if let Some(order) = state.orders.remove(&id) {
                        state.book_remove(&order);
                    }
                }
                Undo::OrderReplaced(prev) => {
                    if let Some(current) = state.orders.insert(prev.id, prev.clone()) {
                        state.book_remove(&current);
                    }
                    state.book_insert(&prev);
                }
                Undo::TradeLogAppended => {
                    state.trade_log.pop();
                }
            }
        }
        self.state.counters = self.counters;
    }
}

impl Deref for Txn<'_> {
    type Target = LedgerState;

    fn deref(&self) -> &LedgerState {
        &*self.state
    }
}

impl Drop for Txn<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

/// Shared handle to the ledger: one writer at a time, concurrent readers.
#[derive(Debug, Default)]
pub struct Store {
    state: RwLock<LedgerState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Runs `f` against committed state.
    pub fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> Result<T, LedgerError> {
        let guard = self.state.read().unwrap_or_else(|poisoned| {
            self.recover();
            poisoned.into_inner()
        });
        Ok(f(&guard))
    }

    /// Runs `f` in a write transaction: `Ok` commits, `Err` rolls everything back.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut Txn<'_>) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut guard = self.state.write().unwrap_or_else(|poisoned| {
            self.recover();
            poisoned.into_inner()
        });
        let mut txn = Txn::begin(&mut guard);
        let out = f(&mut txn)?;
        txn.commit();
        Ok(out)
    }

    /// A writer panicked. Its `Txn` was dropped during the unwind and replayed its
    /// journal, so the state behind the lock is the last committed one.
    fn recover(&self) {
        error!("ledger lock poisoned by a panicked writer, state was rolled back; clearing");
        self.state.clear_poison();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;

    fn seed(state: &mut LedgerState) -> (CurrencyId, AccountId) {
        let mut txn = Txn::begin(state);
        let cid = txn.allocate_currency_id();
        let acc = txn.get_or_create_account(OwnerId(1), cid);
        txn.insert_currency(Currency {
            id: cid,
            name: "Coin".into(),
            ticker: "CON".into(),
            disabled: false,
            creator: OwnerId(1),
            genesis_account_id: acc,
            supply: Decimal::from(100),
            created_at: Utc::now(),
        });
        txn.credit(acc, Decimal::from(100)).unwrap();
        txn.commit();
        (cid, acc)
    }

    #[test]
    fn dropped_txn_rolls_back_every_mutation() {
        let mut state = LedgerState::new();
        let (cid, acc) = seed(&mut state);
        let before = state.snapshot();
        {
            let mut txn = Txn::begin(&mut state);
            let other = txn.get_or_create_account(OwnerId(2), cid);
            txn.debit(acc, Decimal::from(40)).unwrap();
            txn.credit(other, Decimal::from(40)).unwrap();
            txn.append_transaction(acc, other, Decimal::from(40), Utc::now());
            txn.insert_order(
                OwnerId(2),
                Side::Sell,
                Pair::new(cid, CurrencyId(9)),
                Decimal::ONE,
                Decimal::ONE,
                Utc::now(),
            );
            txn.append_trade(Pair::new(cid, CurrencyId(9)), Decimal::ONE, Utc::now());
        }
        assert_eq!(state.snapshot(), before);
        assert!(state.account_for(OwnerId(2), cid).is_none());
        assert!(state.book(Pair::new(cid, CurrencyId(9))).map_or(true, |b| b.is_empty()));
    }

    #[test]
    fn debit_beyond_balance_and_non_positive_amounts_rejected() {
        let mut state = LedgerState::new();
        let (_, acc) = seed(&mut state);
        let mut txn = Txn::begin(&mut state);
        assert_eq!(
            txn.debit(acc, Decimal::from(101)),
            Err(LedgerError::InsufficientFunds {
                required: Decimal::from(101),
                available: Decimal::from(100),
            })
        );
        assert_eq!(txn.credit(acc, Decimal::ZERO), Err(LedgerError::InvalidAmount(Decimal::ZERO)));
        assert_eq!(txn.debit(acc, Decimal::from(100)), Ok(Decimal::ZERO));
    }

    #[test]
    fn disabled_account_rejects_credit_and_debit() {
        let mut state = LedgerState::new();
        let (_, acc) = seed(&mut state);
        let mut txn = Txn::begin(&mut state);
        txn.set_account_disabled(acc, true).unwrap();
        assert_eq!(txn.credit(acc, Decimal::ONE), Err(LedgerError::AccountDisabled(acc)));
        assert_eq!(txn.debit(acc, Decimal::ONE), Err(LedgerError::AccountDisabled(acc)));
    }

    #[test]
    fn credit_past_max_balance_rejected() {
        let mut state = LedgerState::new();
        let (_, acc) = seed(&mut state);
        let mut txn = Txn::begin(&mut state);
        assert!(matches!(txn.credit(acc, MAX_AMOUNT), Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn fill_rollback_restores_order_and_book() {
        let mut state = LedgerState::new();
        let (cid, _) = seed(&mut state);
        let pair = Pair::new(cid, CurrencyId(9));
        let id = {
            let mut txn = Txn::begin(&mut state);
            let id = txn.insert_order(OwnerId(1), Side::Buy, pair, Decimal::ONE, Decimal::from(5), Utc::now());
            txn.commit();
            id
        };
        {
            let mut txn = Txn::begin(&mut state);
            assert_eq!(txn.fill_order(id, Decimal::from(5), Utc::now()), Ok(true));
            assert!(txn.book(pair).unwrap().is_empty());
        }
        assert_eq!(state.order(id).unwrap().amount, Decimal::from(5));
        assert_eq!(state.book(pair).unwrap().best_bid(), Some(Decimal::ONE));
        assert_eq!(state.held_in_book(CurrencyId(9)), Decimal::from(5));
    }

    #[test]
    fn cancel_of_terminal_order_is_rejected() {
        let mut state = LedgerState::new();
        let (cid, _) = seed(&mut state);
        let mut txn = Txn::begin(&mut state);
        let id = txn.insert_order(
            OwnerId(1),
            Side::Sell,
            Pair::new(cid, CurrencyId(9)),
            Decimal::ONE,
            Decimal::ONE,
            Utc::now(),
        );
        txn.cancel_order(id, Utc::now()).unwrap();
        assert_eq!(
            txn.cancel_order(id, Utc::now()),
            Err(LedgerError::OrderNotOpen { id, status: OrderStatus::Canceled })
        );
        assert_eq!(txn.cancel_order(OrderId(99), Utc::now()), Err(LedgerError::OrderNotFound(OrderId(99))));
    }

    #[test]
    fn store_transaction_commits_on_ok_and_rolls_back_on_err() {
        let store = Store::new();
        let cid = CurrencyId(1);
        store
            .transaction(|txn| {
                txn.get_or_create_account(OwnerId(1), cid);
                Ok(())
            })
            .unwrap();
        let err = store.transaction(|txn| {
            txn.get_or_create_account(OwnerId(2), cid);
            Err::<(), _>(LedgerError::SameAccount)
        });
        assert_eq!(err, Err(LedgerError::SameAccount));
        let owners = store
            .read(|s| s.accounts().map(|a| a.owner).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(owners, vec![OwnerId(1)]);
    }

    #[test]
    fn panicked_writer_leaves_store_usable_and_unchanged() {
        let store = Store::new();
        store
            .transaction(|txn| {
                txn.get_or_create_account(OwnerId(1), CurrencyId(1));
                Ok(())
            })
            .unwrap();
        let before = store.read(LedgerState::snapshot).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.transaction(|txn| {
                let id = txn.get_or_create_account(OwnerId(2), CurrencyId(1));
                if txn.account(id).is_some() {
                    panic!("writer failed mid-transaction");
                }
                Ok(())
            })
        }));
        assert!(outcome.is_err());

        assert_eq!(store.read(LedgerState::snapshot).unwrap(), before);
        store
            .transaction(|txn| {
                txn.get_or_create_account(OwnerId(3), CurrencyId(1));
                Ok(())
            })
            .unwrap();
        let owners = store
            .read(|s| s.accounts().map(|a| a.owner).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(owners, vec![OwnerId(1), OwnerId(3)]);
    }

    #[test]
    fn snapshot_round_trip_rebuilds_indexes() {
        let mut state = LedgerState::new();
        let (cid, acc) = seed(&mut state);
        let pair = Pair::new(cid, CurrencyId(9));
        {
            let mut txn = Txn::begin(&mut state);
            txn.insert_order(OwnerId(1), Side::Sell, pair, Decimal::from(3), Decimal::ONE, Utc::now());
            txn.commit();
        }
        let restored = LedgerState::from_snapshot(state.snapshot());
        assert_eq!(restored.account_for(OwnerId(1), cid).map(|a| a.id), Some(acc));
        assert_eq!(restored.book(pair).unwrap().best_ask(), Some(Decimal::from(3)));
        assert_eq!(restored.counters(), state.counters());
    }
}
