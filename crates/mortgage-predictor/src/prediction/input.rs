use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::domain::{RawSubmission, RawValue};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionInputError {
    #[error("failed to read submissions from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid CSV submissions: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON submissions: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(RawSubmission),
    Many(Vec<RawSubmission>),
}

/// Load submissions from a `.csv` file (one row each) or a JSON object/array.
pub fn submissions_from_path<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<RawSubmission>, SubmissionInputError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| SubmissionInputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        submissions_from_csv(file)
    } else {
        submissions_from_json(std::io::BufReader::new(file))
    }
}

pub fn submissions_from_json<R: Read>(
    reader: R,
) -> Result<Vec<RawSubmission>, SubmissionInputError> {
    Ok(match serde_json::from_reader(reader)? {
        OneOrMany::One(submission) => vec![submission],
        OneOrMany::Many(submissions) => submissions,
    })
}

/// Header row names the fields; blank cells are treated as missing fields.
pub fn submissions_from_csv<R: Read>(
    reader: R,
) -> Result<Vec<RawSubmission>, SubmissionInputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut submissions = Vec::new();
    for row in reader.records() {
        let row = row?;
        let submission = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.to_string(), RawValue::Text(value.to_string())))
            .collect();
        submissions.push(submission);
    }
    Ok(submissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::domain::LoanField;

    #[test]
    fn csv_rows_become_text_submissions() {
        let csv = "CreditScore,Channel,DTI\n700,Retail,\n650, Broker ,40\n";
        let submissions = submissions_from_csv(csv.as_bytes()).expect("csv parses");
        assert_eq!(submissions.len(), 2);
        assert_eq!(
            submissions[0].get(LoanField::CreditScore),
            Some(&RawValue::from("700"))
        );
        assert_eq!(submissions[0].get(LoanField::Dti), None);
        assert_eq!(
            submissions[1].get(LoanField::Channel),
            Some(&RawValue::from("Broker"))
        );
    }

    #[test]
    fn json_accepts_single_object_or_array() {
        let one = submissions_from_json(r#"{"CreditScore": 700}"#.as_bytes()).expect("object");
        assert_eq!(one.len(), 1);
        let many =
            submissions_from_json(r#"[{"CreditScore": 700}, {"LTV": "80"}]"#.as_bytes())
                .expect("array");
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].get(LoanField::Ltv), Some(&RawValue::from("80")));
    }
}
