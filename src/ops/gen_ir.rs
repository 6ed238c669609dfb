//! Implementation of a gen-ir run: project and log in, IR out.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::buildlog::LogSource;
use crate::postprocess::{OutputPostprocessor, RunReport, REPORT_FILE};
use crate::project::{DecodeOptions, Workspace};
use crate::runner::CommandRunner;
use crate::util::context::GlobalContext;
use crate::util::fs::{ensure_dir, find_project_path};

/// IR directory inside the archive.
pub const IR_DIR: &str = "IR";

/// Directory under the IR root holding per-target runner output.
pub const TARGETS_DIR: &str = "Targets";

/// Options for a gen-ir run.
#[derive(Debug, Clone)]
pub struct GenIrOptions {
    /// Build log to read
    pub log: LogSource,

    /// The `.xcarchive` to write IR into
    pub archive: PathBuf,

    /// Project or workspace (None = look in the working directory)
    pub project_path: Option<PathBuf>,

    /// Show a progress bar while compiling
    pub show_progress: bool,
}

/// What a finished run produced.
#[derive(Debug)]
pub struct GenIrOutcome {
    pub report: RunReport,
    pub report_path: PathBuf,
    pub ir_root: PathBuf,
}

/// Check an archive path, dropping a trailing `IR` component.
///
/// Older releases took the IR folder itself as the output path.
pub fn validate_archive_path(path: &Path) -> Result<PathBuf> {
    let mut archive = path.to_path_buf();
    if archive.file_name().is_some_and(|name| name == IR_DIR) {
        archive.pop();
    }

    if !archive.extension().is_some_and(|ext| ext == "xcarchive") {
        bail!(
            "xcarchive path must have an .xcarchive extension, found `{}`",
            archive
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| archive.display().to_string())
        );
    }

    Ok(archive)
}

/// Run the whole pipeline.
pub fn gen_ir(ctx: &GlobalContext, opts: &GenIrOptions) -> Result<GenIrOutcome> {
    let archive = validate_archive_path(&ctx.resolve_path(&opts.archive))?;
    let ir_root = archive.join(IR_DIR);

    let project_path = match &opts.project_path {
        Some(path) => ctx.resolve_path(path),
        None => find_project_path(ctx.cwd())?,
    };
    if !project_path.exists() {
        bail!("project doesn't exist at path: {}", project_path.display());
    }

    let decode = DecodeOptions {
        verbose: ctx.config().model.verbose,
    };
    let workspace = Workspace::load(&project_path, decode)
        .with_context(|| format!("failed to load project {}", project_path.display()))?;
    let graph = workspace
        .dependency_graph()
        .with_context(|| {
            format!(
                "failed to resolve dependencies of {}",
                workspace.path().display()
            )
        })?;

    let log = match &opts.log {
        LogSource::File(path) => LogSource::File(ctx.resolve_path(path)),
        LogSource::Stdin => LogSource::Stdin,
    };
    let echo = log.is_stdin() && !ctx.config().log.quieter;
    let parsed = log.parse(|line| {
        if echo {
            println!("{}", line);
        }
    })?;

    if parsed.build_failed {
        tracing::warn!("the build log reports a failed build; IR may be incomplete");
    }
    if parsed.invocation_count() == 0 {
        tracing::warn!("no compiler invocations found in {}", log.describe());
    }

    ensure_dir(&ir_root)?;
    let report_path = ir_root.join(REPORT_FILE);

    let runner = CommandRunner::new(ctx).show_progress(opts.show_progress);
    let results = match runner.run(
        &parsed.invocations,
        &workspace.targets_to_products(),
        &ir_root.join(TARGETS_DIR),
    ) {
        Ok(results) => results,
        Err(e) => {
            if let Some(results) = e.results() {
                let mut report = RunReport::from_results(results);
                report.log_warnings = parsed.warnings.clone();
                report.build_failed = parsed.build_failed;
                report.write(&report_path)?;
                report.log_summary();
            }
            return Err(e.into());
        }
    };

    let mut report = OutputPostprocessor::new(&workspace, &graph).process(&results, &ir_root)?;
    report.log_warnings = parsed.warnings;
    report.build_failed = parsed.build_failed;

    report.write(&report_path)?;
    report.log_summary();
    tracing::info!("report written to {}", report_path.display());

    Ok(GenIrOutcome {
        report,
        report_path,
        ir_root,
    })
}

/// Fail when the share of failed invocations is above `threshold`.
pub fn enforce_failure_threshold(report: &RunReport, threshold: Option<f64>) -> Result<()> {
    if report.exceeds_threshold(threshold) {
        bail!(
            "{} of {} invocation(s) failed, above the failure threshold of {}",
            report.failed.len(),
            report.attempted,
            threshold.unwrap_or_default()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::model::PBXPROJ_FILE;
    use crate::test_support::SAMPLE_PBXPROJ;
    use crate::util::config::Config;
    use tempfile::TempDir;

    #[test]
    fn test_validate_archive_path() {
        assert_eq!(
            validate_archive_path(Path::new("/out/App.xcarchive")).unwrap(),
            PathBuf::from("/out/App.xcarchive")
        );
        assert_eq!(
            validate_archive_path(Path::new("/out/App.xcarchive/IR")).unwrap(),
            PathBuf::from("/out/App.xcarchive")
        );

        let err = validate_archive_path(Path::new("/out/App")).unwrap_err();
        assert!(err.to_string().contains(".xcarchive"));
    }

    fn sample_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let bundle = tmp.path().join("Sample.xcodeproj");
        std::fs::create_dir(&bundle).unwrap();
        std::fs::write(bundle.join(PBXPROJ_FILE), SAMPLE_PBXPROJ).unwrap();
        tmp
    }

    #[test]
    fn test_log_without_invocations_writes_report() {
        let tmp = sample_dir();
        let log = tmp.path().join("build.log");
        std::fs::write(&log, "note: Using new build system\n** ARCHIVE FAILED **\n").unwrap();

        let ctx = GlobalContext::with_config(tmp.path(), Config::default());
        let opts = GenIrOptions {
            log: LogSource::File(PathBuf::from("build.log")),
            archive: PathBuf::from("Sample.xcarchive"),
            project_path: None,
            show_progress: false,
        };

        let outcome = gen_ir(&ctx, &opts).unwrap();
        assert_eq!(outcome.report.attempted, 0);
        assert!(outcome.report.build_failed);
        assert_eq!(outcome.report.empty_targets, vec!["App".to_string(), "Core".to_string()]);
        assert_eq!(outcome.ir_root, tmp.path().join("Sample.xcarchive").join(IR_DIR));
        assert!(outcome.report_path.is_file());
    }

    #[test]
    fn test_missing_project() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_config(tmp.path(), Config::default());
        let opts = GenIrOptions {
            log: LogSource::Stdin,
            archive: PathBuf::from("Sample.xcarchive"),
            project_path: Some(PathBuf::from("Missing.xcodeproj")),
            show_progress: false,
        };

        let err = gen_ir(&ctx, &opts).unwrap_err();
        assert!(err.to_string().contains("project doesn't exist"));
    }

    #[test]
    fn test_enforce_failure_threshold() {
        let mut report = RunReport {
            attempted: 4,
            ..RunReport::default()
        };
        report.failed.push(crate::postprocess::FailureEntry {
            target: "App".to_string(),
            module: "main".to_string(),
            exit_code: Some(1),
            diagnostic: String::new(),
            command: String::new(),
        });

        assert!(enforce_failure_threshold(&report, None).is_ok());
        assert!(enforce_failure_threshold(&report, Some(0.5)).is_ok());
        assert!(enforce_failure_threshold(&report, Some(0.1)).is_err());
    }
}
