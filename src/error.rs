use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("failed to read {resource} from {source_name}")]
    Read {
        source_name: String,
        resource: String,
    },
    #[display("failed to parse {resource} from {source_name}")]
    ResponseParse {
        source_name: String,
        resource: String,
    },
    #[display("{resource} not found in {source_name}")]
    NotFound {
        source_name: String,
        resource: String,
    },
    #[display("request for {resource} timed out")]
    Timeout { resource: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum SignalError {
    #[display("no candles for {symbol}")]
    EmptySeries { symbol: String },
    #[display("unusable quote for {symbol}: {price}")]
    InvalidQuote { symbol: String, price: f64 },
    #[display("analysis of {symbol} failed")]
    Upstream { symbol: String },
}

#[derive(Debug, Display, Error)]
pub enum ReportError {
    #[display("report column set is empty")]
    EmptyColumns,
    #[display("unknown report column \"{name}\"")]
    UnknownColumn { name: String },
    #[display("failed to render report")]
    Render,
}
