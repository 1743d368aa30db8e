use std::fmt;
use std::num::IntErrorKind;

use serde::Serialize;
use tracing::warn;

use super::domain::{
    Channel, FeatureRecord, FieldBounds, FieldKind, FirstTimeHomebuyer, LoanField, RawSubmission,
    RawValue,
};

/// Ordered violation messages collected while validating one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    violations: Vec<String>,
}

impl ValidationReport {
    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Single user-facing line, e.g. `Attention: Please select ...`.
    pub fn message(&self) -> String {
        format!("Attention: {}", self.violations.join(", "))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Converts raw submissions into [`FeatureRecord`]s, reporting every problem at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputValidator;

impl InputValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, submission: &RawSubmission) -> Result<FeatureRecord, ValidationReport> {
        let mut checker = FieldChecker {
            submission,
            report: ValidationReport::default(),
        };

        let months_delinquent = checker.integer(LoanField::MonthsDelinquent);
        let credit_score = checker.integer(LoanField::CreditScore);
        let months_in_repayment = checker.integer(LoanField::MonthsInRepayment);
        let num_borrowers = checker.integer(LoanField::NumBorrowers);
        let ltv = checker.integer(LoanField::Ltv);
        let ocltv = checker.integer(LoanField::Ocltv);
        let dti = checker.integer(LoanField::Dti);
        let orig_interest_rate = checker.real(LoanField::OrigInterestRate);
        let orig_upb = checker.integer(LoanField::OrigUpb);
        let orig_loan_term = checker.integer(LoanField::OrigLoanTerm);
        let channel = checker
            .categorical(LoanField::Channel)
            .map(|raw| Channel::parse(&raw));
        let first_time_homebuyer = checker
            .categorical(LoanField::FirstTimeHomebuyer)
            .map(|raw| FirstTimeHomebuyer::parse(&raw));

        if let Some(Channel::Unlisted(raw)) = &channel {
            warn!(value = %raw, "Channel outside advertised choices");
        }
        if let Some(FirstTimeHomebuyer::Unlisted(raw)) = &first_time_homebuyer {
            warn!(value = %raw, "FirstTimeHomebuyer outside advertised choices");
        }

        let report = checker.report;
        if !report.is_empty() {
            return Err(report);
        }

        match (
            months_delinquent,
            credit_score,
            months_in_repayment,
            num_borrowers,
            channel,
            ltv,
            first_time_homebuyer,
            ocltv,
            dti,
            orig_interest_rate,
            orig_upb,
            orig_loan_term,
        ) {
            (
                Some(months_delinquent),
                Some(credit_score),
                Some(months_in_repayment),
                Some(num_borrowers),
                Some(channel),
                Some(ltv),
                Some(first_time_homebuyer),
                Some(ocltv),
                Some(dti),
                Some(orig_interest_rate),
                Some(orig_upb),
                Some(orig_loan_term),
            ) => Ok(FeatureRecord {
                months_delinquent,
                credit_score,
                months_in_repayment,
                num_borrowers,
                channel,
                ltv,
                first_time_homebuyer,
                ocltv,
                dti,
                orig_interest_rate,
                orig_upb,
                orig_loan_term,
            }),
            // every `None` above recorded a violation
            _ => Err(report),
        }
    }
}

/// Accumulator walking fields in reporting order; never short-circuits.
struct FieldChecker<'a> {
    submission: &'a RawSubmission,
    report: ValidationReport,
}

impl<'a> FieldChecker<'a> {
    fn integer(&mut self, field: LoanField) -> Option<i64> {
        let raw = self.present(field)?;
        let bounds = field_bounds(field);
        let value = match parse_integer(raw) {
            Ok(value) => value,
            Err(IntegerIssue::Unparsable) => {
                self.report.push(type_message(field));
                return None;
            }
            Err(IntegerIssue::Overflow) => {
                self.report.push(bounds.violation_message(field));
                return None;
            }
        };
        if bounds.admits_integer(value) {
            Some(value)
        } else {
            self.report.push(bounds.violation_message(field));
            None
        }
    }

    fn real(&mut self, field: LoanField) -> Option<f64> {
        let raw = self.present(field)?;
        let Some(value) = parse_real(raw) else {
            self.report.push(type_message(field));
            return None;
        };
        let bounds = field_bounds(field);
        if bounds.admits_real(value) {
            Some(value)
        } else {
            self.report.push(bounds.violation_message(field));
            None
        }
    }

    fn categorical(&mut self, field: LoanField) -> Option<String> {
        self.present(field).map(RawValue::to_string)
    }

    fn present(&mut self, field: LoanField) -> Option<&'a RawValue> {
        let value = self.submission.get(field);
        if value.is_none() {
            self.report.push(format!("Please provide {field}."));
        }
        value
    }
}

fn field_bounds(field: LoanField) -> FieldBounds {
    field
        .bounds()
        .unwrap_or(FieldBounds { min: i64::MIN, max: i64::MAX })
}

fn type_message(field: LoanField) -> String {
    format!("{field} must be a number of type {}.", field.kind().label())
}

enum IntegerIssue {
    Unparsable,
    /// A whole number too large for `i64`; necessarily outside every range.
    Overflow,
}

fn parse_integer(raw: &RawValue) -> Result<i64, IntegerIssue> {
    match raw {
        RawValue::Integer(value) => Ok(*value),
        // JSON integers beyond i64 deserialize as reals
        RawValue::Real(value) if value.fract() == 0.0 && value.abs() >= i64::MAX as f64 => {
            Err(IntegerIssue::Overflow)
        }
        RawValue::Real(_) => Err(IntegerIssue::Unparsable),
        RawValue::Text(text) => text.trim().parse::<i64>().map_err(|err| match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => IntegerIssue::Overflow,
            _ => IntegerIssue::Unparsable,
        }),
    }
}

fn parse_real(raw: &RawValue) -> Option<f64> {
    match raw {
        RawValue::Integer(value) => Some(*value as f64),
        RawValue::Real(value) => Some(*value),
        RawValue::Text(text) => text.trim().parse().ok(),
    }
}

/// Categorical choices and default values used to render an input form.
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub categorical: Vec<CategoricalFieldSpec>,
    pub numeric: Vec<NumericFieldSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalFieldSpec {
    pub field: LoanField,
    pub choices: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericFieldSpec {
    pub field: LoanField,
    pub kind: FieldKind,
    pub default: RawValue,
    pub min: i64,
    pub max: i64,
}

pub fn form_schema() -> FormSchema {
    let categorical = vec![
        CategoricalFieldSpec {
            field: LoanField::Channel,
            choices: Channel::CHOICES.to_vec(),
        },
        CategoricalFieldSpec {
            field: LoanField::FirstTimeHomebuyer,
            choices: FirstTimeHomebuyer::CHOICES.to_vec(),
        },
    ];

    let numeric = LoanField::NUMERIC_CHECK_ORDER
        .into_iter()
        .map(|field| {
            let bounds = field_bounds(field);
            NumericFieldSpec {
                field,
                kind: field.kind(),
                default: default_value(field),
                min: bounds.min,
                max: bounds.max,
            }
        })
        .collect();

    FormSchema {
        categorical,
        numeric,
    }
}

fn default_value(field: LoanField) -> RawValue {
    match field {
        LoanField::CreditScore => RawValue::Integer(700),
        LoanField::MonthsInRepayment => RawValue::Integer(12),
        LoanField::NumBorrowers => RawValue::Integer(1),
        LoanField::Ltv => RawValue::Integer(80),
        LoanField::Ocltv => RawValue::Integer(75),
        LoanField::Dti => RawValue::Integer(36),
        LoanField::OrigInterestRate => RawValue::Real(3.5),
        LoanField::OrigUpb => RawValue::Integer(300_000),
        LoanField::OrigLoanTerm => RawValue::Integer(360),
        _ => RawValue::Integer(0),
    }
}
