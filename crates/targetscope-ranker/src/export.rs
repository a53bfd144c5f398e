//! CSV export of ranked targets.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use targetscope_common::{EngineError, Result};
use tracing::info;

use crate::scorer::TargetScore;

pub const CSV_HEADER: [&str; 8] = [
    "protein_id",
    "druggability_score",
    "centrality_score",
    "pathway_score",
    "disease_score",
    "final_score",
    "confidence_score",
    "rank",
];

/// Lower-cased disease name with runs of non-alphanumerics collapsed to `_`.
pub fn disease_slug(disease: &str) -> String {
    let mut slug = String::with_capacity(disease.len());
    let mut pending_sep = false;
    for c in disease.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("disease");
    }
    slug
}

/// `{slug}_{YYYYMMDD_HHMMSS}.csv`
pub fn export_filename(disease: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.csv", disease_slug(disease), at.format("%Y%m%d_%H%M%S"))
}

/// Write `scores` under `dir` (created if missing) and return the file path.
pub fn write_csv(scores: &[TargetScore], dir: &Path, disease: &str, at: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(disease, at));

    let mut writer = csv::Writer::from_path(&path).map_err(|e| EngineError::Export(e.to_string()))?;
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| EngineError::Export(e.to_string()))?;
    for s in scores {
        writer
            .write_record([
                s.protein_id.to_string(),
                format!("{:.6}", s.druggability_score),
                format!("{:.6}", s.centrality_score),
                format!("{:.6}", s.pathway_score),
                format!("{:.6}", s.disease_score),
                format!("{:.6}", s.final_score),
                format!("{:.6}", s.confidence_score),
                s.rank.to_string(),
            ])
            .map_err(|e| EngineError::Export(e.to_string()))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = scores.len(), "Exported ranking");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_slug() {
        assert_eq!(disease_slug("Breast Cancer"), "breast_cancer");
        assert_eq!(disease_slug("  Alzheimer's -- disease "), "alzheimer_s_disease");
        assert_eq!(disease_slug("???"), "disease");
    }

    #[test]
    fn test_filename_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        assert_eq!(export_filename("Type 2 Diabetes", at), "type_2_diabetes_20240309_070502.csv");
    }

    #[test]
    fn test_header_only_for_empty_ranking() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let path = write_csv(&[], dir.path(), "cancer", at).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(
            content.trim_end(),
            "protein_id,druggability_score,centrality_score,pathway_score,disease_score,final_score,confidence_score,rank"
        );
    }
}
