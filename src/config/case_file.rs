use crate::domain::model::Case;
use crate::utils::error::{Result, TrainerError};
use crate::utils::validation::{validate_non_empty_list, validate_non_empty_string, Validate};
use serde::Deserialize;
use std::path::Path;

const SAMPLE_CASE: &str = include_str!("../../cases/fatigue-gp.toml");

#[derive(Debug, Deserialize)]
struct CaseFile {
    case: Case,
}

pub fn parse_case(content: &str) -> Result<Case> {
    let file: CaseFile = toml::from_str(content)
        .map_err(|e| TrainerError::config(format!("case file parsing error: {}", e)))?;
    file.case.validate()?;
    Ok(file.case)
}

pub fn load_case<P: AsRef<Path>>(path: P) -> Result<Case> {
    let content = std::fs::read_to_string(&path)?;
    tracing::debug!("Loaded case file: {}", path.as_ref().display());
    parse_case(&content)
}

/// 內建範例病例 (GP 疲倦)
pub fn sample_case() -> Result<Case> {
    parse_case(SAMPLE_CASE)
}

impl Validate for Case {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("case.scenario", &self.scenario)?;
        validate_non_empty_list("case.tasks", &self.tasks)?;
        validate_non_empty_string("case.rubric", &self.rubric)?;
        Ok(())
    }
}
