use std::fmt;

use chrono::{DateTime, Utc};
use error_stack::{Report, bail};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::ReportError;
use crate::signal::SignalRecord;
use crate::trend::TrendRecord;

/// Records gathered by one batch run, in universe order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<T> {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub records: Vec<T>,
}

impl<T> RunReport<T> {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            records: Vec::new(),
        }
    }
}

impl<T> Default for RunReport<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type SignalReport = RunReport<SignalRecord>;
pub type TrendReport = RunReport<TrendRecord>;

/// Columns of a signal report, declared in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Column {
    Symbol,
    LastTradePrice,
    MaShort,
    MaLong,
    Rsi,
    BasicCriteria,
    BullishMacd,
    BollingerBounce,
    VolumeSpike,
    BullishEngulfing,
    BullishHammer,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Self::Symbol,
        Self::LastTradePrice,
        Self::MaShort,
        Self::MaLong,
        Self::Rsi,
        Self::BasicCriteria,
        Self::BullishMacd,
        Self::BollingerBounce,
        Self::VolumeSpike,
        Self::BullishEngulfing,
        Self::BullishHammer,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::LastTradePrice => "last_trade_price",
            Self::MaShort => "ma_short",
            Self::MaLong => "ma_long",
            Self::Rsi => "rsi",
            Self::BasicCriteria => "basic_criteria",
            Self::BullishMacd => "bullish_macd",
            Self::BollingerBounce => "bollinger_bounce",
            Self::VolumeSpike => "volume_spike",
            Self::BullishEngulfing => "bullish_engulfing",
            Self::BullishHammer => "bullish_hammer",
        }
    }

    pub fn cell(self, record: &SignalRecord) -> Cell {
        match self {
            Self::Symbol => Cell::Text(record.symbol.clone()),
            Self::LastTradePrice => Cell::Number(Some(record.last_trade_price)),
            Self::MaShort => Cell::Number(record.ma_short),
            Self::MaLong => Cell::Number(record.ma_long),
            Self::Rsi => Cell::Number(record.rsi),
            Self::BasicCriteria => Cell::Flag(record.basic_criteria),
            Self::BullishMacd => Cell::Flag(record.bullish_macd),
            Self::BollingerBounce => Cell::Flag(record.bollinger_bounce),
            Self::VolumeSpike => Cell::Flag(record.volume_spike),
            Self::BullishEngulfing => Cell::Flag(record.bullish_engulfing),
            Self::BullishHammer => Cell::Flag(record.bullish_hammer),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value of a report row. Undefined numbers serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(Option<f64>),
    Flag(bool),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(Some(value)) => write!(f, "{value:.2}"),
            Self::Number(None) => f.write_str("-"),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// The subset of columns a sink renders, always in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    columns: Vec<Column>,
}

impl Projection {
    pub fn all() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
        }
    }

    /// Build a projection from column names.
    ///
    /// `None` keeps every column. An empty list or an unknown name is an
    /// error. Duplicates collapse and the requested order is ignored.
    pub fn from_names(names: Option<&[String]>) -> Result<Self, Report<ReportError>> {
        let Some(names) = names else {
            return Ok(Self::all());
        };
        if names.is_empty() {
            bail!(ReportError::EmptyColumns);
        }

        let mut columns = names
            .iter()
            .map(|name| {
                let name = name.trim();
                Column::from_str(name).ok_or_else(|| {
                    Report::new(ReportError::UnknownColumn {
                        name: name.to_owned(),
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        columns.sort();
        columns.dedup();

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row(&self, record: &SignalRecord) -> Vec<Cell> {
        self.columns.iter().map(|c| c.cell(record)).collect()
    }

    pub fn apply<'a>(&'a self, report: &'a SignalReport) -> ProjectedReport<'a> {
        ProjectedReport {
            run_id: report.run_id,
            created_at: report.created_at,
            records: report
                .records
                .iter()
                .map(|record| ProjectedRecord {
                    record,
                    columns: &self.columns,
                })
                .collect(),
        }
    }
}

/// A signal report restricted to a projection, ready to serialize.
#[derive(Debug, Serialize)]
pub struct ProjectedReport<'a> {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub records: Vec<ProjectedRecord<'a>>,
}

#[derive(Debug)]
pub struct ProjectedRecord<'a> {
    record: &'a SignalRecord,
    columns: &'a [Column],
}

impl Serialize for ProjectedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column.as_str(), &column.cell(self.record))?;
        }
        map.end()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(symbol: &str, rsi: Option<f64>) -> SignalRecord {
        SignalRecord {
            symbol: symbol.into(),
            last_trade_price: 101.5,
            ma_short: Some(100.25),
            ma_long: Some(98.0),
            rsi,
            basic_criteria: true,
            bullish_macd: false,
            bollinger_bounce: false,
            volume_spike: true,
            bullish_engulfing: false,
            bullish_hammer: false,
        }
    }

    pub fn report(records: Vec<SignalRecord>) -> SignalReport {
        SignalReport {
            records,
            ..SignalReport::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{record, report};
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn column_names_round_trip() {
        for column in Column::ALL {
            assert_eq!(Column::from_str(column.as_str()), Some(column));
        }
        assert_eq!(Column::from_str("macd"), None);
    }

    #[test]
    fn missing_projection_keeps_all_columns() {
        let projection = Projection::from_names(None).unwrap();
        assert_eq!(projection.columns(), &Column::ALL);
    }

    #[test]
    fn projection_keeps_fixed_order() {
        let requested = names(&["rsi", "symbol", "rsi", "volume_spike"]);
        let projection = Projection::from_names(Some(&requested)).unwrap();
        assert_eq!(
            projection.columns(),
            &[Column::Symbol, Column::Rsi, Column::VolumeSpike]
        );
    }

    #[test]
    fn empty_projection_rejected() {
        let err = Projection::from_names(Some(&[])).unwrap_err();
        assert!(matches!(err.current_context(), ReportError::EmptyColumns));
    }

    #[test]
    fn unknown_column_rejected() {
        let requested = names(&["symbol", "sharpe"]);
        let err = Projection::from_names(Some(&requested)).unwrap_err();
        assert!(matches!(
            err.current_context(),
            ReportError::UnknownColumn { name } if name == "sharpe"
        ));
    }

    #[test]
    fn row_cells_follow_projection() {
        let requested = names(&["symbol", "rsi", "basic_criteria"]);
        let projection = Projection::from_names(Some(&requested)).unwrap();
        let row = projection.row(&record("ACME", None));
        assert_eq!(
            row,
            vec![
                Cell::Text("ACME".into()),
                Cell::Number(None),
                Cell::Flag(true)
            ]
        );
        let rendered: Vec<String> = row.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["ACME", "-", "true"]);
    }

    #[test]
    fn projected_json_keeps_column_order() {
        let requested = names(&["rsi", "symbol", "last_trade_price"]);
        let projection = Projection::from_names(Some(&requested)).unwrap();
        let report = report(vec![record("ACME", Some(55.5))]);

        let json = serde_json::to_string(&projection.apply(&report)).unwrap();
        assert!(json.contains(r#"{"symbol":"ACME","last_trade_price":101.5,"rsi":55.5}"#));
        assert!(json.contains(&report.run_id.to_string()));
    }

    #[test]
    fn undefined_values_serialize_as_null() {
        let projection = Projection::from_names(Some(&names(&["rsi"]))).unwrap();
        let report = report(vec![record("ACME", None)]);
        let json = serde_json::to_string(&projection.apply(&report)).unwrap();
        assert!(json.contains(r#"{"rsi":null}"#));
    }

    #[test]
    fn every_run_gets_its_own_id() {
        assert_ne!(SignalReport::new().run_id, SignalReport::new().run_id);
    }
}
