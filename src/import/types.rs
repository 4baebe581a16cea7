use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Whole-request failures. Raised before the row loop (or when the commit
/// transaction itself fails); a row that merely breaks a business rule is
/// reported inside the [`ImportReport`] instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file must contain a header row and at least one data row")]
    EmptyFile,
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("could not parse CSV: {0}")]
    Csv(String),
    #[error("unknown school: {0}")]
    UnknownSchool(String),
    #[error("timetableId is required for timetable imports")]
    MissingTimetableId,
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("commit failed: {0}")]
    Commit(String),
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::EmptyFile | ImportError::MissingColumn(_) | ImportError::Csv(_) => {
                "invalid_file"
            }
            ImportError::UnknownSchool(_) => "not_found",
            ImportError::MissingTimetableId => "bad_params",
            ImportError::Db(_) => "db_query_failed",
            ImportError::Commit(_) => "db_write_failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Ok,
    Update,
    Error,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedRow {
    pub row_index: usize,
    pub data: BTreeMap<String, String>,
    pub status: RowStatus,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<String>,
}

impl ValidatedRow {
    /// Classification rule shared by every validator: any error wins, then a
    /// match means update-in-place, otherwise the row is a create.
    /// `matched_id` is only kept for `UPDATE` rows.
    pub fn classify(
        row_index: usize,
        data: BTreeMap<String, String>,
        errors: Vec<String>,
        matched: Option<String>,
    ) -> Self {
        if !errors.is_empty() {
            return ValidatedRow {
                row_index,
                data,
                status: RowStatus::Error,
                errors,
                matched_id: None,
            };
        }
        match matched {
            Some(id) => ValidatedRow {
                row_index,
                data,
                status: RowStatus::Update,
                errors,
                matched_id: Some(id),
            },
            None => ValidatedRow {
                row_index,
                data,
                status: RowStatus::Ok,
                errors,
                matched_id: None,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total: usize,
    pub rows: Vec<ValidatedRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,
}
