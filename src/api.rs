//! REST API router over the [`Exchange`].
//!
//! Used by the binary and by integration tests. Create with [`create_router`].
//! Uses Extension for state so the router is `Router<()>` and works with `into_make_service()`.
//! Currencies are addressed by ticker on the wire. Errors are
//! `{ "error": <kind>, "message": <text> }` with a 4xx status, or 503 when the store is unavailable.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::NewCurrency;
use crate::engine::Exchange;
use crate::error::LedgerError;
use crate::execution::OrderRequest;
use crate::matching::OrderFilter;
use crate::order_book::LevelSummary;
use crate::trade_log::SeriesOrder;
use crate::types::{CurrencyId, CurrencyLookup, OrderId, OrderStatus, OwnerId, Pair, Side};

const DEFAULT_PAGE_LIMIT: usize = 20;

/// Shared app state: one exchange per process.
#[derive(Clone)]
pub struct AppState {
    pub(crate) exchange: Arc<Exchange>,
}

/// Builds the REST router with state. Returns `Router<()>` so you can call `.into_make_service()` for `axum::serve`.
pub fn create_router(exchange: Arc<Exchange>) -> Router<()> {
    let state = AppState { exchange };
    Router::new()
        .route("/health", get(health))
        .route("/currencies", post(create_currency).get(find_currency))
        .route("/balances/:owner/:ticker", get(view_balance))
        .route("/transfers", post(transfer))
        .route("/swaps", post(swap))
        .route("/orders", post(submit_order).get(list_orders))
        .route("/orders/cancel", post(cancel_order))
        .route("/markets/:base/:quote", get(market))
        .route("/markets/:base/:quote/series", get(series))
        .layer(Extension(state))
}

/// Error body and status for a failed request.
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError::Ledger(e)
    }
}

fn status_for(e: &LedgerError) -> StatusCode {
    match e {
        LedgerError::CurrencyNotFound
        | LedgerError::OrderNotFound(_)
        | LedgerError::AccountNotFound(_)
        | LedgerError::TransactionNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::NotOrderOwner(_) => StatusCode::FORBIDDEN,
        LedgerError::DuplicateCurrencyName(_)
        | LedgerError::DuplicateTicker(_)
        | LedgerError::CurrencyLimitReached
        | LedgerError::OrderNotOpen { .. } => StatusCode::CONFLICT,
        LedgerError::InsufficientFunds { .. }
        | LedgerError::AccountDisabled(_)
        | LedgerError::CurrencyDisabled(_)
        | LedgerError::AccountMissing(_)
        | LedgerError::SameAccount => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::InvalidAmount(_)
        | LedgerError::TooManyDecimalPlaces(_)
        | LedgerError::InvalidTicker(_)
        | LedgerError::InvalidName(_)
        | LedgerError::IdenticalPair
        | LedgerError::InvalidAccountNumber(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Ledger(e) => (status_for(&e), e.kind(), e.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
        };
        (status, Json(serde_json::json!({ "error": kind, "message": message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn create_currency(
    Extension(state): Extension<AppState>,
    Json(body): Json<NewCurrency>,
) -> Result<Response, ApiError> {
    let currency = state.exchange.create_currency(&body)?;
    Ok((StatusCode::CREATED, Json(currency)).into_response())
}

#[derive(Deserialize)]
struct CurrencyQuery {
    id: Option<u64>,
    name: Option<String>,
    ticker: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

/// One currency by id, name or ticker; without a selector, a page of all currencies.
async fn find_currency(
    Extension(state): Extension<AppState>,
    Query(q): Query<CurrencyQuery>,
) -> Result<Response, ApiError> {
    let lookup = match (q.id, q.name, q.ticker) {
        (Some(id), _, _) => CurrencyLookup::Id(CurrencyId(id)),
        (None, Some(name), _) => CurrencyLookup::Name(name),
        (None, None, Some(ticker)) => CurrencyLookup::Ticker(ticker),
        (None, None, None) => {
            let page = state.exchange.list_currencies(
                None,
                q.page.unwrap_or(1),
                q.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            )?;
            return Ok(Json(page).into_response());
        }
    };
    let currency = state
        .exchange
        .find_currency(&lookup)?
        .ok_or(LedgerError::CurrencyNotFound)?;
    Ok(Json(currency).into_response())
}

#[derive(Serialize)]
struct BalanceOut {
    owner: OwnerId,
    ticker: String,
    balance: Decimal,
}

async fn view_balance(
    Extension(state): Extension<AppState>,
    Path((owner, ticker)): Path<(u64, String)>,
) -> ApiResult<BalanceOut> {
    let balance = state
        .exchange
        .view_balance(OwnerId(owner), &CurrencyLookup::Ticker(ticker.clone()))?;
    Ok(Json(BalanceOut {
        owner: OwnerId(owner),
        ticker: ticker.to_ascii_uppercase(),
        balance,
    }))
}

/// Either `account_number`, or `receiver` plus `ticker`.
#[derive(Deserialize)]
struct TransferBody {
    sender: OwnerId,
    amount: Decimal,
    receiver: Option<OwnerId>,
    ticker: Option<String>,
    account_number: Option<String>,
}

async fn transfer(
    Extension(state): Extension<AppState>,
    Json(body): Json<TransferBody>,
) -> Result<Response, ApiError> {
    let tx = match (body.account_number, body.receiver, body.ticker) {
        (Some(number), _, _) => state
            .exchange
            .transfer_to_account_number(body.sender, &number, body.amount)?,
        (None, Some(receiver), Some(ticker)) => {
            let currency = state
                .exchange
                .find_currency(&CurrencyLookup::Ticker(ticker))?
                .ok_or(LedgerError::CurrencyNotFound)?;
            state
                .exchange
                .transfer(body.sender, receiver, currency.id, body.amount)?
        }
        _ => {
            return Err(ApiError::BadRequest(
                "expected account_number, or receiver and ticker".into(),
            ))
        }
    };
    Ok((StatusCode::CREATED, Json(tx)).into_response())
}

#[derive(Deserialize)]
struct SwapBody {
    sender: OwnerId,
    receiver: OwnerId,
    base: String,
    quote: String,
    base_amount: Decimal,
    quote_amount: Decimal,
}

async fn swap(
    Extension(state): Extension<AppState>,
    Json(body): Json<SwapBody>,
) -> Result<Response, ApiError> {
    let pair = state.exchange.pair_by_tickers(&body.base, &body.quote)?;
    let done = state.exchange.swap(
        pair,
        body.sender,
        body.receiver,
        body.base_amount,
        body.quote_amount,
    )?;
    Ok((StatusCode::CREATED, Json(done)).into_response())
}

#[derive(Deserialize)]
struct SubmitBody {
    owner: OwnerId,
    side: Side,
    base: String,
    quote: String,
    price: Decimal,
    amount: Decimal,
}

async fn submit_order(
    Extension(state): Extension<AppState>,
    Json(body): Json<SubmitBody>,
) -> ApiResult<crate::execution::FillResult> {
    let pair = state.exchange.pair_by_tickers(&body.base, &body.quote)?;
    let result = state.exchange.submit(&OrderRequest {
        owner: body.owner,
        side: body.side,
        base: pair.base,
        quote: pair.quote,
        price: body.price,
        amount: body.amount,
    })?;
    Ok(Json(result))
}

#[derive(Deserialize)]
struct CancelBody {
    owner: OwnerId,
    order_id: OrderId,
}

async fn cancel_order(
    Extension(state): Extension<AppState>,
    Json(body): Json<CancelBody>,
) -> ApiResult<crate::types::Order> {
    Ok(Json(state.exchange.cancel(body.owner, body.order_id)?))
}

#[derive(Deserialize)]
struct OrdersQuery {
    owner: Option<u64>,
    base: Option<String>,
    quote: Option<String>,
    side: Option<Side>,
    status: Option<OrderStatus>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_orders(
    Extension(state): Extension<AppState>,
    Query(q): Query<OrdersQuery>,
) -> ApiResult<crate::types::Page<crate::types::Order>> {
    let pair = match (q.base, q.quote) {
        (Some(base), Some(quote)) => Some(state.exchange.pair_by_tickers(&base, &quote)?),
        (None, None) => None,
        _ => return Err(ApiError::BadRequest("base and quote go together".into())),
    };
    let filter = OrderFilter {
        owner: q.owner.map(OwnerId),
        pair,
        side: q.side,
        status: q.status,
    };
    let page = state.exchange.list_orders(
        &filter,
        q.page.unwrap_or(1),
        q.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    )?;
    Ok(Json(page))
}

#[derive(Serialize)]
struct MarketOut {
    pair: Pair,
    last: Option<Decimal>,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
    bids: Vec<LevelSummary>,
    asks: Vec<LevelSummary>,
}

async fn market(
    Extension(state): Extension<AppState>,
    Path((base, quote)): Path<(String, String)>,
) -> ApiResult<MarketOut> {
    let pair = state.exchange.pair_by_tickers(&base, &quote)?;
    let q = state.exchange.quote(pair)?;
    Ok(Json(MarketOut {
        pair,
        last: q.last,
        bid: q.bid,
        ask: q.ask,
        bids: state.exchange.depth(pair, Side::Buy)?,
        asks: state.exchange.depth(pair, Side::Sell)?,
    }))
}

#[derive(Deserialize)]
struct SeriesQuery {
    since: Option<DateTime<Utc>>,
    #[serde(default)]
    order: SeriesOrder,
}

async fn series(
    Extension(state): Extension<AppState>,
    Path((base, quote)): Path<(String, String)>,
    Query(q): Query<SeriesQuery>,
) -> ApiResult<Vec<crate::trade_log::PricePoint>> {
    let pair = state.exchange.pair_by_tickers(&base, &quote)?;
    Ok(Json(state.exchange.series(pair, q.since, q.order)?))
}
