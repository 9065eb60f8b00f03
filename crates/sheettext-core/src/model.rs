use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Text or error for a single sheet. Serialized as a `text` or `error` key
/// next to the sheet name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetOutcome {
    Text(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: SheetOutcome,
}

impl SheetResult {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        SheetResult {
            name: name.into(),
            outcome: SheetOutcome::Text(text.into()),
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        SheetResult {
            name: name.into(),
            outcome: SheetOutcome::Error(message.into()),
        }
    }

    /// Build a result from the outcome of processing one sheet.
    pub fn from_result(name: impl Into<String>, result: Result<String, ExtractError>) -> Self {
        match result {
            Ok(text) => SheetResult::text(name, text),
            Err(e) => SheetResult::error(name, e.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.outcome {
            SheetOutcome::Text(t) => Some(t),
            SheetOutcome::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match &self.outcome {
            SheetOutcome::Error(e) => Some(e),
            SheetOutcome::Text(_) => None,
        }
    }
}

/// The document printed on stdout.
///
/// A fatal error carries `error` and an empty sheet list; otherwise only
/// `sheets` is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sheets: Vec<SheetResult>,
    /// Set when the input was rejected before extraction started.
    #[serde(skip)]
    pub preflight_failed: bool,
}

impl ExtractionOutput {
    pub fn from_result(result: Result<Vec<SheetResult>, ExtractError>) -> Self {
        match result {
            Ok(sheets) => ExtractionOutput {
                error: None,
                sheets,
                preflight_failed: false,
            },
            Err(e) => ExtractionOutput {
                error: Some(e.to_string()),
                sheets: Vec::new(),
                preflight_failed: e.is_preflight(),
            },
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.error.is_some()
    }

    /// Process exit code: 1 only when the input was rejected up front.
    /// Extraction failures still print their error body and exit 0.
    pub fn exit_code(&self) -> i32 {
        if self.preflight_failed {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_sheet_text_serializes_flat() {
        let sheet = SheetResult::text("Sheet1", "a,b\n");
        let json = serde_json::to_string(&sheet).unwrap();
        assert_eq!(json, r#"{"name":"Sheet1","text":"a,b\n"}"#);
    }

    #[test]
    fn test_sheet_error_serializes_flat() {
        let sheet = SheetResult::error("Broken", "bad range");
        let json = serde_json::to_string(&sheet).unwrap();
        assert_eq!(json, r#"{"name":"Broken","error":"bad range"}"#);
    }

    #[test]
    fn test_sheet_result_deserializes() {
        let sheet: SheetResult = serde_json::from_str(r#"{"name":"S","error":"x"}"#).unwrap();
        assert_eq!(sheet.as_error(), Some("x"));
        assert_eq!(sheet.as_text(), None);
    }

    #[test]
    fn test_fatal_output_has_error_before_sheets() {
        let output = ExtractionOutput::from_result(Err(ExtractError::NotFound(PathBuf::from(
            "/nope.xlsx",
        ))));
        assert!(output.is_fatal());
        assert_eq!(output.exit_code(), 1);
        let json = serde_json::to_string(&output).unwrap();
        assert_eq!(
            json,
            r#"{"error":"File does not exist: /nope.xlsx","sheets":[]}"#
        );
    }

    #[test]
    fn test_extraction_failure_exits_zero() {
        let output = ExtractionOutput::from_result(Err(ExtractError::Workbook(
            "failed to open xls: not an OLE file".into(),
        )));
        assert!(output.is_fatal());
        assert!(!output.preflight_failed);
        assert_eq!(output.exit_code(), 0);
    }

    #[test]
    fn test_missing_path_exits_one() {
        let output = ExtractionOutput::from_result(Err(ExtractError::MissingPath));
        assert!(output.preflight_failed);
        assert_eq!(output.exit_code(), 1);
    }

    #[test]
    fn test_success_output_omits_error() {
        let output = ExtractionOutput::from_result(Ok(vec![SheetResult::text("CSV", "")]));
        assert!(!output.is_fatal());
        assert_eq!(output.exit_code(), 0);
        let json = serde_json::to_string(&output).unwrap();
        assert_eq!(json, r#"{"sheets":[{"name":"CSV","text":""}]}"#);
    }
}
