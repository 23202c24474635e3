//! Stages the two raw source files into the standardized data tree.
//!
//! Contents are copied byte-for-byte; nothing is parsed here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// What happened to one staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The source existed and was copied over the staged copy.
    Copied { bytes: u64 },
    /// The source was absent but a staged copy already existed; left as is.
    KeptExisting,
    /// The source already is the staged file.
    AlreadyInPlace,
}

#[derive(Debug, Clone, Serialize)]
pub struct StagedFile {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub mortality: StagedFile,
    pub laws: StagedFile,
}

/// Creates `raw/`, `interim/` and `processed/` under the data directory.
pub fn ensure_layout(config: &PipelineConfig) -> Result<()> {
    for dir in config.layout() {
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Directory ready");
    }
    Ok(())
}

/// Copies `source` to `staged`, or accepts an existing staged copy when
/// `source` is missing.
///
/// # Errors
///
/// Returns [`PipelineError::MissingSource`] if neither file exists.
pub fn stage_file(what: &'static str, source: &Path, staged: &Path) -> Result<StageOutcome> {
    if source.is_file() {
        if staged.is_file() && fs::canonicalize(source)? == fs::canonicalize(staged)? {
            return Ok(StageOutcome::AlreadyInPlace);
        }
        let bytes = fs::copy(source, staged)?;
        info!(
            what,
            source = %source.display(),
            staged = %staged.display(),
            bytes,
            "Copied source file"
        );
        return Ok(StageOutcome::Copied { bytes });
    }

    if staged.is_file() {
        info!(what, staged = %staged.display(), "Source not found, keeping existing staged copy");
        return Ok(StageOutcome::KeptExisting);
    }

    Err(PipelineError::MissingSource {
        what,
        given: source.to_path_buf(),
        staged: staged.to_path_buf(),
    })
}

/// Runs the fetch step: lays out the data tree and stages both sources.
///
/// The mortality file is handled first; a missing mortality source fails the
/// step before the law workbook is looked at.
#[tracing::instrument(
    skip(config, mortality, laws),
    fields(mortality = %mortality.display(), laws = %laws.display())
)]
pub fn fetch(config: &PipelineConfig, mortality: &Path, laws: &Path) -> Result<FetchReport> {
    ensure_layout(config)?;

    let mortality_staged = config.raw_mortality();
    let mortality_outcome = stage_file("mortality CSV", mortality, &mortality_staged)?;

    let laws_staged = config.raw_laws();
    let laws_outcome = stage_file("law database", laws, &laws_staged)?;

    Ok(FetchReport {
        mortality: StagedFile {
            path: mortality_staged,
            outcome: mortality_outcome,
        },
        laws: StagedFile {
            path: laws_staged,
            outcome: laws_outcome,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PipelineConfig) {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(dir.path().join("Data"));
        (dir, config)
    }

    #[test]
    fn test_ensure_layout_is_idempotent() {
        let (_dir, config) = setup();
        ensure_layout(&config).unwrap();
        ensure_layout(&config).unwrap();

        for dir in config.layout() {
            assert!(dir.is_dir());
        }
    }

    #[test]
    fn test_stage_file_copies_and_overwrites() {
        let (dir, config) = setup();
        ensure_layout(&config).unwrap();
        let source = dir.path().join("src.csv");
        let staged = config.raw_mortality();

        fs::write(&staged, b"stale").unwrap();
        fs::write(&source, b"STATE,YEAR\r\nAL,2014\n").unwrap();

        let outcome = stage_file("mortality CSV", &source, &staged).unwrap();
        assert_eq!(outcome, StageOutcome::Copied { bytes: 20 });
        assert_eq!(fs::read(&staged).unwrap(), b"STATE,YEAR\r\nAL,2014\n");
    }

    #[test]
    fn test_stage_file_keeps_existing_copy() {
        let (dir, config) = setup();
        ensure_layout(&config).unwrap();
        let staged = config.raw_laws();
        fs::write(&staged, b"workbook").unwrap();

        let outcome = stage_file("law database", &dir.path().join("nope.xlsx"), &staged).unwrap();
        assert_eq!(outcome, StageOutcome::KeptExisting);
        assert_eq!(fs::read(&staged).unwrap(), b"workbook");
    }

    #[test]
    fn test_stage_file_same_path_is_untouched() {
        let (_dir, config) = setup();
        ensure_layout(&config).unwrap();
        let staged = config.raw_mortality();
        fs::write(&staged, b"keep me").unwrap();

        let outcome = stage_file("mortality CSV", &staged, &staged).unwrap();
        assert_eq!(outcome, StageOutcome::AlreadyInPlace);
        assert_eq!(fs::read(&staged).unwrap(), b"keep me");
    }

    #[test]
    fn test_stage_file_missing_everything() {
        let (dir, config) = setup();
        ensure_layout(&config).unwrap();

        let source = dir.path().join("nope.csv");
        let err = stage_file("mortality CSV", &source, &config.raw_mortality()).unwrap_err();
        assert!(err.is_missing_input());
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_fetch_fails_on_mortality_before_laws() {
        let (dir, config) = setup();
        let laws = dir.path().join("laws.xlsx");
        fs::write(&laws, b"xlsx").unwrap();

        let err = fetch(&config, &dir.path().join("missing.csv"), &laws).unwrap_err();
        assert!(matches!(err, PipelineError::MissingSource { what: "mortality CSV", .. }));
        assert!(!config.raw_laws().exists());
    }
}
