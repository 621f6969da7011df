pub mod file;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::SourceError;
use crate::model::{CandleSeries, Interval, Quote, Span};

/// Where quotes, candles and symbol lists come from.
///
/// Uses `BoxFuture` instead of `async fn` in trait to keep the trait
/// object-safe (`dyn MarketData`).
pub trait MarketData: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_quote(&self, symbol: &str) -> BoxFuture<'_, Result<Quote, Report<SourceError>>>;

    /// Historical candles, already normalized into a series.
    fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        span: Span,
    ) -> BoxFuture<'_, Result<CandleSeries, Report<SourceError>>>;

    /// Symbols of the market's top movers today.
    fn top_movers(&self) -> BoxFuture<'_, Result<Vec<String>, Report<SourceError>>>;

    /// Symbols of the watchlist whose display name matches `name`, ignoring
    /// case.
    fn watchlist(&self, name: &str) -> BoxFuture<'_, Result<Vec<String>, Report<SourceError>>>;
}
