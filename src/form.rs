use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, FormError, TICKER_REQUIRED};

lazy_static! {
    static ref LEADING_INT: Regex = Regex::new(r"^\s*([+-]?[0-9]+)").unwrap();
}

/// One editable table row. Rows have no id; their position is their identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl Row {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i64) -> Self {
        Row {
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Copy of this row with one field replaced. `age` input goes through [`parse_age`].
    pub fn with_field(&self, field: RowField, value: &str) -> Row {
        let mut row = self.clone();
        match field {
            RowField::Name => row.name = value.to_string(),
            RowField::Email => row.email = value.to_string(),
            RowField::Age => row.age = parse_age(value),
        }
        row
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowField {
    Name,
    Email,
    Age,
}

impl RowField {
    pub const ALL: [RowField; 3] = [RowField::Name, RowField::Email, RowField::Age];

    pub fn as_str(&self) -> &'static str {
        match self {
            RowField::Name => "name",
            RowField::Email => "email",
            RowField::Age => "age",
        }
    }
}

impl FromStr for RowField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(RowField::Name),
            "email" => Ok(RowField::Email),
            "age" => Ok(RowField::Age),
            _ => Err(FormError::UnknownField(s.to_string())),
        }
    }
}

/// Leading integer of `value` the way a browser `parseInt` reads it, or 0.
///
/// `"42"` and `"42 years"` give 42, `"3.9"` gives 3, `"abc"` and `""` give 0.
/// Values that do not fit in an `i64` also give 0.
pub fn parse_age(value: &str) -> i64 {
    LEADING_INT
        .captures(value)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Stock symbol, trimmed and uppercased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(input: &str) -> Result<Self, FormError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FormError::EmptyTicker);
        }
        Ok(Ticker(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-computed debt-to-equity ratio for one fiscal year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioRow {
    pub year: i32,
    pub debt_to_equity: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiStatus {
    pub loading: bool,
    pub error: String,
}

/// The three CSV downloads the backend offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    /// The edited table, serialized by the backend
    Generic,
    DebtToEquity,
    CashFlow,
}

impl ExportKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            ExportKind::Generic => "/api/generate-csv",
            ExportKind::DebtToEquity => "/api/debt-to-equity-csv",
            ExportKind::CashFlow => "/api/cash-flow-csv",
        }
    }

    /// Prefix of the saved file name.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            ExportKind::Generic => "data",
            ExportKind::DebtToEquity => "debt_to_equity",
            ExportKind::CashFlow => "cash_flow",
        }
    }

    pub fn needs_ticker(&self) -> bool {
        !matches!(self, ExportKind::Generic)
    }

    /// Shown when the server gave no error message of its own.
    pub fn failure_message(&self) -> &'static str {
        match self {
            ExportKind::Generic => "Failed to generate CSV. Please try again.",
            ExportKind::DebtToEquity => "Failed to download debt-to-equity CSV. Please try again.",
            ExportKind::CashFlow => "Failed to download cash flow CSV. Please try again.",
        }
    }
}

pub const QUERY_FAILURE: &str = "Failed to fetch debt-to-equity data. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Export(ExportKind),
    Query,
}

impl Action {
    /// Text shown while this action is in flight.
    pub fn loading_label(&self) -> &'static str {
        match self {
            Action::Export(_) => "Generating...",
            Action::Query => "Loading...",
        }
    }
}

/// JSON body of an export request: `{"rows": [...]}` or `{"ticker": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportPayload {
    Rows { rows: Vec<Row> },
    Ticker { ticker: Ticker },
}

impl ExportPayload {
    pub fn ticker(&self) -> Option<&Ticker> {
        match self {
            ExportPayload::Ticker { ticker } => Some(ticker),
            ExportPayload::Rows { .. } => None,
        }
    }
}

/// Request to run once an action has started. Built from a snapshot of the
/// form, so later edits do not reach a request already in flight.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Export {
        kind: ExportKind,
        payload: ExportPayload,
    },
    Query {
        ticker: Ticker,
    },
}

/// All in-memory UI state: the table, the ticker input, the last ratio
/// result and the loading/error line.
#[derive(Clone, Debug)]
pub struct FormState {
    rows: Vec<Row>,
    ticker_input: String,
    ratios: Vec<RatioRow>,
    ratio_ticker: Option<Ticker>,
    status: UiStatus,
    pending: Option<Action>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    /// Form seeded with the sample rows.
    pub fn new() -> Self {
        Self::with_rows(vec![
            Row::new("John Doe", "john@example.com", 30),
            Row::new("Jane Smith", "jane@example.com", 25),
            Row::new("Bob Johnson", "bob@example.com", 35),
        ])
    }

    pub fn empty() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        FormState {
            rows,
            ticker_input: String::new(),
            ratios: Vec::new(),
            ratio_ticker: None,
            status: UiStatus::default(),
            pending: None,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn ticker_input(&self) -> &str {
        &self.ticker_input
    }

    pub fn ratios(&self) -> &[RatioRow] {
        &self.ratios
    }

    /// Ticker the displayed ratios belong to.
    pub fn ratio_ticker(&self) -> Option<&Ticker> {
        self.ratio_ticker.as_ref()
    }

    pub fn status(&self) -> &UiStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status.loading
    }

    /// Action currently in flight, if any.
    pub fn pending(&self) -> Option<Action> {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        if self.status.error.is_empty() {
            None
        } else {
            Some(&self.status.error)
        }
    }

    pub fn add_row(&mut self) {
        self.rows.push(Row::default());
    }

    pub fn update_row(&mut self, index: usize, field: RowField, value: &str) -> Result<(), FormError> {
        let len = self.rows.len();
        let row = self
            .rows
            .get(index)
            .ok_or(FormError::RowIndex { index, len })?;
        let updated = row.with_field(field, value);
        self.rows[index] = updated;
        Ok(())
    }

    /// Remove the row at `index`, keeping the order of the rest.
    pub fn delete_row(&mut self, index: usize) -> Result<Row, FormError> {
        if index >= self.rows.len() {
            return Err(FormError::RowIndex {
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Raw ticker text as typed. Normalized only when an action starts.
    pub fn set_ticker(&mut self, input: &str) {
        self.ticker_input = input.to_string();
    }

    /// Idle -> Loading. Validates input, clears the previous error and returns
    /// the request to send. Nothing changes when another action is loading.
    pub fn begin(&mut self, action: Action) -> Result<Effect, FormError> {
        match action {
            Action::Export(kind) => Ok(Effect::Export {
                kind,
                payload: self.begin_export(kind)?,
            }),
            Action::Query => Ok(Effect::Query {
                ticker: self.begin_query()?,
            }),
        }
    }

    /// [`begin`](Self::begin) for an export, returning just the payload.
    pub fn begin_export(&mut self, kind: ExportKind) -> Result<ExportPayload, FormError> {
        self.start()?;
        let payload = if kind.needs_ticker() {
            ExportPayload::Ticker {
                ticker: self.validated_ticker()?,
            }
        } else {
            ExportPayload::Rows {
                rows: self.rows.clone(),
            }
        };
        self.status.loading = true;
        self.pending = Some(Action::Export(kind));
        Ok(payload)
    }

    /// [`begin`](Self::begin) for a ratio lookup, returning the ticker to query.
    pub fn begin_query(&mut self) -> Result<Ticker, FormError> {
        self.start()?;
        let ticker = self.validated_ticker()?;
        self.status.loading = true;
        self.pending = Some(Action::Query);
        Ok(ticker)
    }

    fn start(&mut self) -> Result<(), FormError> {
        if self.status.loading {
            return Err(FormError::Busy);
        }
        self.status.error.clear();
        Ok(())
    }

    fn validated_ticker(&mut self) -> Result<Ticker, FormError> {
        Ticker::parse(&self.ticker_input).inspect_err(|_| {
            self.status.error = TICKER_REQUIRED.to_string();
        })
    }

    /// Loading -> Idle after an export.
    pub fn finish_export<T>(&mut self, kind: ExportKind, outcome: &Result<T, Error>) {
        self.status.loading = false;
        self.pending = None;
        if let Err(err) = outcome {
            self.status.error = err
                .server_message()
                .unwrap_or(kind.failure_message())
                .to_string();
        }
    }

    /// Loading -> Idle after a ratio lookup. Success replaces the ratios;
    /// failure keeps whatever was shown before.
    pub fn finish_query(&mut self, ticker: Ticker, outcome: &Result<Vec<RatioRow>, Error>) {
        self.status.loading = false;
        self.pending = None;
        match outcome {
            Ok(data) => {
                self.status.error.clear();
                self.ratios = data.clone();
                self.ratio_ticker = Some(ticker);
            }
            Err(err) => {
                self.status.error = err.server_message().unwrap_or(QUERY_FAILURE).to_string();
            }
        }
    }

    /// Drop the loading flag without touching anything else. Used when an
    /// action is abandoned before it could report an outcome.
    pub fn abandon(&mut self) {
        self.status.loading = false;
        self.pending = None;
    }
}
