use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Every field accepted by the prediction form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LoanField {
    MonthsDelinquent,
    CreditScore,
    MonthsInRepayment,
    NumBorrowers,
    Channel,
    #[serde(rename = "LTV")]
    Ltv,
    FirstTimeHomebuyer,
    #[serde(rename = "OCLTV")]
    Ocltv,
    #[serde(rename = "DTI")]
    Dti,
    OrigInterestRate,
    #[serde(rename = "OrigUPB")]
    OrigUpb,
    OrigLoanTerm,
}

/// How a raw value for a field is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Real,
    Categorical,
}

impl FieldKind {
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Real => "real",
            FieldKind::Categorical => "categorical",
        }
    }
}

impl LoanField {
    /// Column order the model was fitted against.
    pub const COLUMN_ORDER: [LoanField; 12] = [
        LoanField::MonthsDelinquent,
        LoanField::CreditScore,
        LoanField::MonthsInRepayment,
        LoanField::NumBorrowers,
        LoanField::Channel,
        LoanField::Ltv,
        LoanField::FirstTimeHomebuyer,
        LoanField::Ocltv,
        LoanField::Dti,
        LoanField::OrigInterestRate,
        LoanField::OrigUpb,
        LoanField::OrigLoanTerm,
    ];

    /// Order in which numeric ranges are checked and reported.
    pub const NUMERIC_CHECK_ORDER: [LoanField; 10] = [
        LoanField::MonthsDelinquent,
        LoanField::CreditScore,
        LoanField::MonthsInRepayment,
        LoanField::NumBorrowers,
        LoanField::Ltv,
        LoanField::Ocltv,
        LoanField::Dti,
        LoanField::OrigInterestRate,
        LoanField::OrigUpb,
        LoanField::OrigLoanTerm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LoanField::MonthsDelinquent => "MonthsDelinquent",
            LoanField::CreditScore => "CreditScore",
            LoanField::MonthsInRepayment => "MonthsInRepayment",
            LoanField::NumBorrowers => "NumBorrowers",
            LoanField::Channel => "Channel",
            LoanField::Ltv => "LTV",
            LoanField::FirstTimeHomebuyer => "FirstTimeHomebuyer",
            LoanField::Ocltv => "OCLTV",
            LoanField::Dti => "DTI",
            LoanField::OrigInterestRate => "OrigInterestRate",
            LoanField::OrigUpb => "OrigUPB",
            LoanField::OrigLoanTerm => "OrigLoanTerm",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::COLUMN_ORDER
            .into_iter()
            .find(|field| field.name() == name)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            LoanField::Channel | LoanField::FirstTimeHomebuyer => FieldKind::Categorical,
            LoanField::OrigInterestRate => FieldKind::Real,
            _ => FieldKind::Integer,
        }
    }

    /// Inclusive domain range; `None` for categorical fields.
    pub fn bounds(self) -> Option<FieldBounds> {
        let (min, max) = match self {
            LoanField::MonthsDelinquent => (0, 120),
            LoanField::CreditScore => (300, 850),
            LoanField::MonthsInRepayment => (0, 360),
            LoanField::NumBorrowers => (1, 10),
            LoanField::Ltv | LoanField::Ocltv | LoanField::Dti => (0, 100),
            LoanField::OrigInterestRate => (0, 20),
            LoanField::OrigUpb => (0, 1_000_000),
            LoanField::OrigLoanTerm => (0, 360),
            LoanField::Channel | LoanField::FirstTimeHomebuyer => return None,
        };
        Some(FieldBounds { min, max })
    }
}

impl fmt::Display for LoanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive numeric range for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldBounds {
    pub min: i64,
    pub max: i64,
}

impl FieldBounds {
    pub fn admits_integer(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// NaN and infinities are never admitted.
    pub fn admits_real(&self, value: f64) -> bool {
        value.is_finite() && (self.min as f64..=self.max as f64).contains(&value)
    }

    pub fn violation_message(&self, field: LoanField) -> String {
        format!(
            "Please select {} between {} and {}.",
            field,
            group_thousands(self.min),
            group_thousands(self.max)
        )
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Raw value supplied by a caller for a single field, before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Integer(value) => write!(f, "{value}"),
            RawValue::Real(value) => write!(f, "{value}"),
            RawValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// Field-name-to-value mapping exactly as submitted; echoed back on failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSubmission(BTreeMap<String, RawValue>);

impl RawSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: LoanField) -> Option<&RawValue> {
        self.0.get(field.name())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, field: LoanField) -> Option<RawValue> {
        self.0.remove(field.name())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, RawValue)> for RawSubmission {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<HashMap<String, String>> for RawSubmission {
    fn from(fields: HashMap<String, String>) -> Self {
        fields
            .into_iter()
            .map(|(name, value)| (name, RawValue::Text(value)))
            .collect()
    }
}

/// Origination channel. Unlisted values are carried through rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Retail,
    Broker,
    Correspondent,
    Unlisted(String),
}

impl Channel {
    pub const CHOICES: [&'static str; 3] = ["Retail", "Broker", "Correspondent"];

    pub fn parse(raw: &str) -> Self {
        match raw {
            "Retail" => Self::Retail,
            "Broker" => Self::Broker,
            "Correspondent" => Self::Correspondent,
            other => Self::Unlisted(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Channel::Retail => "Retail",
            Channel::Broker => "Broker",
            Channel::Correspondent => "Correspondent",
            Channel::Unlisted(raw) => raw,
        }
    }

    pub fn is_listed(&self) -> bool {
        !matches!(self, Channel::Unlisted(_))
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// First-time homebuyer flag, submitted as `Y` or `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstTimeHomebuyer {
    Yes,
    No,
    Unlisted(String),
}

impl FirstTimeHomebuyer {
    pub const CHOICES: [&'static str; 2] = ["Y", "N"];

    pub fn parse(raw: &str) -> Self {
        match raw {
            "Y" => Self::Yes,
            "N" => Self::No,
            other => Self::Unlisted(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FirstTimeHomebuyer::Yes => "Y",
            FirstTimeHomebuyer::No => "N",
            FirstTimeHomebuyer::Unlisted(raw) => raw,
        }
    }

    pub fn is_listed(&self) -> bool {
        !matches!(self, FirstTimeHomebuyer::Unlisted(_))
    }
}

impl Serialize for FirstTimeHomebuyer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One validated loan-attribute observation. Only the validator builds these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    #[serde(rename = "MonthsDelinquent")]
    pub months_delinquent: i64,
    #[serde(rename = "CreditScore")]
    pub credit_score: i64,
    #[serde(rename = "MonthsInRepayment")]
    pub months_in_repayment: i64,
    #[serde(rename = "NumBorrowers")]
    pub num_borrowers: i64,
    #[serde(rename = "Channel")]
    pub channel: Channel,
    #[serde(rename = "LTV")]
    pub ltv: i64,
    #[serde(rename = "FirstTimeHomebuyer")]
    pub first_time_homebuyer: FirstTimeHomebuyer,
    #[serde(rename = "OCLTV")]
    pub ocltv: i64,
    #[serde(rename = "DTI")]
    pub dti: i64,
    #[serde(rename = "OrigInterestRate")]
    pub orig_interest_rate: f64,
    #[serde(rename = "OrigUPB")]
    pub orig_upb: i64,
    #[serde(rename = "OrigLoanTerm")]
    pub orig_loan_term: i64,
}

impl FeatureRecord {
    pub fn cell(&self, field: LoanField) -> FeatureCell {
        match field {
            LoanField::MonthsDelinquent => FeatureCell::Numeric(self.months_delinquent as f64),
            LoanField::CreditScore => FeatureCell::Numeric(self.credit_score as f64),
            LoanField::MonthsInRepayment => FeatureCell::Numeric(self.months_in_repayment as f64),
            LoanField::NumBorrowers => FeatureCell::Numeric(self.num_borrowers as f64),
            LoanField::Channel => FeatureCell::Categorical(self.channel.as_str().to_string()),
            LoanField::Ltv => FeatureCell::Numeric(self.ltv as f64),
            LoanField::FirstTimeHomebuyer => {
                FeatureCell::Categorical(self.first_time_homebuyer.as_str().to_string())
            }
            LoanField::Ocltv => FeatureCell::Numeric(self.ocltv as f64),
            LoanField::Dti => FeatureCell::Numeric(self.dti as f64),
            LoanField::OrigInterestRate => FeatureCell::Numeric(self.orig_interest_rate),
            LoanField::OrigUpb => FeatureCell::Numeric(self.orig_upb as f64),
            LoanField::OrigLoanTerm => FeatureCell::Numeric(self.orig_loan_term as f64),
        }
    }

    /// Twelve-column view in [`LoanField::COLUMN_ORDER`].
    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector {
            cells: LoanField::COLUMN_ORDER.map(|field| self.cell(field)),
        }
    }
}

/// A single model input cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureCell {
    Numeric(f64),
    Categorical(String),
}

/// Ordered model input built from a [`FeatureRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    cells: [FeatureCell; 12],
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, field: LoanField) -> &FeatureCell {
        let idx = LoanField::COLUMN_ORDER
            .iter()
            .position(|column| *column == field)
            .unwrap_or_default();
        &self.cells[idx]
    }

    pub fn columns(&self) -> impl Iterator<Item = (LoanField, &FeatureCell)> {
        LoanField::COLUMN_ORDER.into_iter().zip(self.cells.iter())
    }
}
