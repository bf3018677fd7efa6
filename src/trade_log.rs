//! Trade log queries: last price, top of book, and price series for charting.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::LedgerError;
use crate::store::{LedgerState, Txn};
use crate::types::{Pair, TradeLogEntry, TradeLogId};

/// Direction of a price series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: Decimal,
    pub traded_at: DateTime<Utc>,
}

/// Last trade and top of book for one pair.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub last: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
}

/// Records an execution price. Both currencies must exist.
pub fn append(
    txn: &mut Txn<'_>,
    pair: Pair,
    price: Decimal,
    at: DateTime<Utc>,
) -> Result<TradeLogId, LedgerError> {
    catalog::find(txn, &crate::types::CurrencyLookup::Id(pair.base))?;
    catalog::find(txn, &crate::types::CurrencyLookup::Id(pair.quote))?;
    Ok(txn.append_trade(pair, price, at))
}

fn entries(state: &LedgerState, pair: Pair) -> impl DoubleEndedIterator<Item = &TradeLogEntry> {
    state.trade_log().iter().filter(move |e| e.pair == pair)
}

pub fn last_price(state: &LedgerState, pair: Pair) -> Option<Decimal> {
    entries(state, pair).next_back().map(|e| e.executed_price)
}

/// Highest open BUY price on the pair.
pub fn best_bid(state: &LedgerState, pair: Pair) -> Option<Decimal> {
    state.book(pair).and_then(|b| b.best_bid())
}

/// Lowest open SELL price on the pair.
pub fn best_ask(state: &LedgerState, pair: Pair) -> Option<Decimal> {
    state.book(pair).and_then(|b| b.best_ask())
}

pub fn quote(state: &LedgerState, pair: Pair) -> MarketQuote {
    MarketQuote {
        last: last_price(state, pair),
        bid: best_bid(state, pair),
        ask: best_ask(state, pair),
    }
}

/// Prices traded at or after `since` (all when `None`), in the requested order.
pub fn series(
    state: &LedgerState,
    pair: Pair,
    since: Option<DateTime<Utc>>,
    order: SeriesOrder,
) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = entries(state, pair)
        .filter(|e| since.map_or(true, |s| e.traded_at >= s))
        .map(|e| PricePoint {
            price: e.executed_price,
            traded_at: e.traded_at,
        })
        .collect();
    if order == SeriesOrder::Desc {
        points.reverse();
    }
    points
}

/// Percent change between consecutive prices traded within `window` of the last trade,
/// rounded to 4 places. Empty with fewer than two prices.
pub fn percentage_changes(state: &LedgerState, pair: Pair, window: Duration) -> Vec<Decimal> {
    let Some(last) = entries(state, pair).next_back() else {
        return Vec::new();
    };
    let from = last.traded_at - window;
    let prices: Vec<Decimal> = series(state, pair, Some(from), SeriesOrder::Asc)
        .into_iter()
        .map(|p| p.price)
        .collect();
    prices
        .windows(2)
        .map(|w| {
            ((w[1] - w[0]) * Decimal::ONE_HUNDRED)
                .checked_div(w[0])
                .unwrap_or(Decimal::ZERO)
                .round_dp(4)
        })
        .collect()
}
