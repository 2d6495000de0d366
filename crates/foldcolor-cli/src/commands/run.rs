use crate::cli::RunArgs;
use crate::config::FileConfig;
use crate::error::Result;
use crate::tools::ToolLocator;
use crate::utils::progress::CliProgressHandler;
use foldcolor::engine::progress::ProgressReporter;
use foldcolor::engine::render::Renderer;
use foldcolor::engine::warning::Warnings;
use foldcolor::workflows::batch::{self, BatchSummary};
use tracing::{info, warn};

pub fn run(args: RunArgs, file_config: FileConfig, threads: Option<usize>) -> Result<()> {
    let mut warnings = Warnings::new();
    info!("Merging configuration from file, profile and CLI arguments...");
    let settings = file_config.merge_with_cli(&args, threads, &mut warnings)?;

    let locator = ToolLocator::new();
    let engine = locator.folding_engine(&settings.tools);
    let renderer = if args.skip_render {
        info!("Rendering disabled with --skip-render; scripts are written but not run.");
        None
    } else {
        Some(locator.renderer(&settings.tools)?)
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Folding sequences from {}...", args.input.display());
    info!("Invoking the batch workflow...");
    let summary = batch::run(
        &args.input,
        &settings.output_root,
        settings.pipeline,
        &engine,
        renderer.as_ref().map(|r| r as &dyn Renderer),
        &reporter,
    )?;

    let warning_count = warnings.len() + summary.warnings.len();
    if warning_count > 0 {
        warn!("{} warning(s) were raised during the run.", warning_count);
    }
    print!("{}", format_summary(&summary, warning_count));
    Ok(())
}

fn format_summary(summary: &BatchSummary, warning_count: usize) -> String {
    let mut out = format!(
        "\nAll results saved in: {}\nMaster summary: {}\n",
        summary.run_dir.display(),
        summary.master_summary.display()
    );
    out.push_str(&format!(
        "Successfully processed: {} sequence(s)\nErrors: {}\n",
        summary.succeeded(),
        summary.failed()
    ));
    for error in &summary.errors {
        out.push_str(&format!("  - {}: {}\n", error.name, error.message));
    }
    if let Some(path) = &summary.error_log {
        out.push_str(&format!("Error log: {}\n", path.display()));
    }
    let unrendered = summary.results.iter().filter(|r| !r.rendered).count();
    if unrendered > 0 {
        out.push_str(&format!("Not rendered: {} sequence(s)\n", unrendered));
    }
    if warning_count > 0 {
        out.push_str(&format!("Warnings: {}\n", warning_count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use foldcolor::workflows::batch::BatchError;
    use foldcolor::workflows::sequence::SequenceOutcome;
    use std::path::PathBuf;

    fn outcome(name: &str, rendered: bool) -> SequenceOutcome {
        SequenceOutcome {
            name: name.to_string(),
            length: 8,
            output_dir: PathBuf::from("outputs").join(name),
            structure: "((....))".to_string(),
            mfe: -1.2,
            script: PathBuf::from("outputs")
                .join(name)
                .join(format!("{}_rnartist_script.kts", name)),
            colorbars: Vec::new(),
            rendered,
        }
    }

    #[test]
    fn summary_lists_counts_and_errors() {
        let summary = BatchSummary {
            run_dir: PathBuf::from("outputs"),
            results: vec![outcome("a", true), outcome("b", false)],
            errors: vec![BatchError::new("c", "Folding failed for 'c': rejected")],
            warnings: Vec::new(),
            master_summary: PathBuf::from("outputs/master_summary.txt"),
            error_log: Some(PathBuf::from("outputs/error_log.txt")),
        };

        let text = format_summary(&summary, 2);
        assert!(text.contains("Successfully processed: 2 sequence(s)"));
        assert!(text.contains("Errors: 1"));
        assert!(text.contains("  - c: Folding failed for 'c': rejected"));
        assert!(text.contains("Error log: outputs/error_log.txt"));
        assert!(text.contains("Not rendered: 1 sequence(s)"));
        assert!(text.contains("Warnings: 2"));
    }

    #[test]
    fn clean_run_omits_error_lines() {
        let summary = BatchSummary {
            run_dir: PathBuf::from("outputs"),
            results: vec![outcome("a", true)],
            errors: Vec::new(),
            warnings: Vec::new(),
            master_summary: PathBuf::from("outputs/master_summary.txt"),
            error_log: None,
        };

        let text = format_summary(&summary, 0);
        assert!(text.contains("Errors: 0"));
        assert!(!text.contains("Error log"));
        assert!(!text.contains("Not rendered"));
        assert!(!text.contains("Warnings"));
    }
}
