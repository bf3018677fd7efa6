//! Currency catalog: creation, lookup, renaming, supply changes.
//!
//! Creating a currency opens the creator's genesis (central) account holding the initial
//! supply and records the genesis self-transaction. The genesis account id is stored on
//! the currency itself; the self-transaction remains as the historical record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{normalize_name, normalize_ticker, validate_amount};
use crate::error::{AccountRole, LedgerError};
use crate::store::{LedgerState, Txn};
use crate::types::{Currency, CurrencyId, CurrencyLookup, OwnerId, Page};

/// Currencies a single owner may create.
pub const CURRENCIES_PER_OWNER: usize = 1;

/// Creation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCurrency {
    pub owner: OwnerId,
    pub name: String,
    pub ticker: String,
    pub initial_supply: Decimal,
}

pub fn create(txn: &mut Txn<'_>, req: &NewCurrency, at: DateTime<Utc>) -> Result<Currency, LedgerError> {
    let name = normalize_name(&req.name)?;
    let ticker = normalize_ticker(&req.ticker)?;
    let supply = validate_amount(req.initial_supply)?;
    ensure_unique(txn, &name, &ticker, None)?;
    if txn.currencies().filter(|c| c.creator == req.owner).count() >= CURRENCIES_PER_OWNER {
        return Err(LedgerError::CurrencyLimitReached);
    }

    let id = txn.allocate_currency_id();
    let genesis = txn.get_or_create_account(req.owner, id);
    let currency = Currency {
        id,
        name,
        ticker,
        disabled: false,
        creator: req.owner,
        genesis_account_id: genesis,
        supply,
        created_at: at,
    };
    txn.insert_currency(currency.clone());
    txn.credit(genesis, supply)?;
    txn.append_transaction(genesis, genesis, supply, at);
    Ok(currency)
}

pub fn find(state: &LedgerState, lookup: &CurrencyLookup) -> Result<Currency, LedgerError> {
    state
        .find_currency(lookup)
        .cloned()
        .ok_or(LedgerError::CurrencyNotFound)
}

/// Changes name and ticker under the same rules as creation; the currency's own
/// current values do not count as duplicates.
pub fn rename(
    txn: &mut Txn<'_>,
    id: CurrencyId,
    name: &str,
    ticker: &str,
) -> Result<Currency, LedgerError> {
    let name = normalize_name(name)?;
    let ticker = normalize_ticker(ticker)?;
    find(txn, &CurrencyLookup::Id(id))?;
    ensure_unique(txn, &name, &ticker, Some(id))?;
    txn.update_currency(id, |c| {
        c.name = name;
        c.ticker = ticker;
    })?;
    find(txn, &CurrencyLookup::Id(id))
}

pub fn set_disabled(txn: &mut Txn<'_>, id: CurrencyId, disabled: bool) -> Result<(), LedgerError> {
    txn.update_currency(id, |c| c.disabled = disabled)
}

/// Adds new supply to the genesis account. Returns the genesis account's new balance.
pub fn mint(txn: &mut Txn<'_>, id: CurrencyId, amount: Decimal) -> Result<Decimal, LedgerError> {
    let amount = validate_amount(amount)?;
    let currency = active(txn, id)?;
    let balance = txn.credit(currency.genesis_account_id, amount)?;
    txn.update_currency(id, |c| c.supply += amount)?;
    Ok(balance)
}

/// Destroys `amount` from the owner's account. Returns the account's new balance.
pub fn burn(
    txn: &mut Txn<'_>,
    owner: OwnerId,
    id: CurrencyId,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    let amount = validate_amount(amount)?;
    active(txn, id)?;
    let account = txn
        .account_for(owner, id)
        .map(|a| a.id)
        .ok_or(LedgerError::AccountMissing(AccountRole::Holder))?;
    let balance = txn.debit(account, amount)?;
    txn.update_currency(id, |c| c.supply -= amount)?;
    Ok(balance)
}

/// Currencies by id, optionally only enabled (`Some(false)`) or disabled (`Some(true)`) ones.
pub fn list(state: &LedgerState, disabled: Option<bool>, page: usize, limit: usize) -> Page<Currency> {
    let all = state
        .currencies()
        .filter(|c| disabled.map_or(true, |d| c.disabled == d))
        .cloned()
        .collect();
    Page::paginate(all, page, limit)
}

/// Looks up a currency and rejects it if disabled.
pub fn active(state: &LedgerState, id: CurrencyId) -> Result<Currency, LedgerError> {
    let currency = find(state, &CurrencyLookup::Id(id))?;
    if currency.disabled {
        return Err(LedgerError::CurrencyDisabled(id));
    }
    Ok(currency)
}

fn ensure_unique(
    state: &LedgerState,
    name: &str,
    ticker: &str,
    except: Option<CurrencyId>,
) -> Result<(), LedgerError> {
    let others = move || state.currencies().filter(move |c| Some(c.id) != except);
    if others().any(|c| c.name == name) {
        return Err(LedgerError::DuplicateCurrencyName(name.to_string()));
    }
    if others().any(|c| c.ticker == ticker) {
        return Err(LedgerError::DuplicateTicker(ticker.to_string()));
    }
    Ok(())
}
