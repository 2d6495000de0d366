use crate::core::models::sequence::SequenceRecord;
use crate::engine::colorbar::write_colorbars;
use crate::engine::coloring::assign_colors;
use crate::engine::config::{PipelineConfig, RenderPolicy};
use crate::engine::error::EngineError;
use crate::engine::folding::{FoldingEngine, fold_record};
use crate::engine::probability::per_base_stats;
use crate::engine::render::Renderer;
use crate::engine::report::{ReportInput, artifact_path, write_reports};
use crate::engine::script::{ScriptInput, generate_script};
use crate::engine::warning::{ConfigWarning, Warnings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// What a successfully processed sequence produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOutcome {
    pub name: String,
    pub length: usize,
    pub output_dir: PathBuf,
    pub structure: String,
    pub mfe: f64,
    pub script: PathBuf,
    pub colorbars: Vec<PathBuf>,
    /// `false` when rendering was skipped or degraded under the best-effort policy.
    pub rendered: bool,
}

/// The terminal record of one job, successful or not.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub sequence_name: String,
    pub result: Result<SequenceOutcome, String>,
    pub warnings: Vec<ConfigWarning>,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }
}

/// Runs one sequence through every stage and converts any failure into the outcome.
///
/// Warnings raised along the way are kept even when the job fails.
pub fn run_job(
    record: &SequenceRecord,
    run_dir: &Path,
    config: &PipelineConfig,
    engine: &dyn FoldingEngine,
    renderer: Option<&dyn Renderer>,
) -> JobOutcome {
    let mut warnings = Warnings::new();
    let result = process_sequence(record, run_dir, config, engine, renderer, &mut warnings)
        .map_err(|e| e.to_string());
    JobOutcome {
        sequence_name: record.name().to_string(),
        result,
        warnings: warnings.into_vec(),
    }
}

/// The per-sequence pipeline: fold, aggregate, color, write reports and legends, generate the
/// RNArtist script and render it.
///
/// Everything is written into `<run_dir>/<name>/`. Stages run strictly in that order.
#[instrument(skip_all, name = "sequence_pipeline", fields(sequence = %record.name(), length = record.len()))]
pub fn process_sequence(
    record: &SequenceRecord,
    run_dir: &Path,
    config: &PipelineConfig,
    engine: &dyn FoldingEngine,
    renderer: Option<&dyn Renderer>,
    warnings: &mut Warnings,
) -> Result<SequenceOutcome, EngineError> {
    let name = record.name();
    let length = record.len();
    let output_dir = std::path::absolute(run_dir.join(name))
        .map_err(|e| EngineError::io(run_dir.join(name), e))?;
    fs::create_dir_all(&output_dir).map_err(|e| EngineError::io(&output_dir, e))?;

    let model = config.model.fitted_to(name, length, warnings);
    let result = fold_record(engine, record, &model, config.partition_function)?;
    let stats = per_base_stats(&result, length)?;
    let colors = assign_colors(&stats, config.coloring_mode, &config.gradient);

    let rna = record.to_rna();
    let reports = write_reports(
        &output_dir,
        &ReportInput {
            name,
            residues: record.residues(),
            rna: &rna,
            result: &result,
            stats: &stats,
            colors: &colors,
        },
    )?;
    let colorbars = write_colorbars(&output_dir, name, &config.gradient, &config.colorbar)?;

    let script_text = generate_script(&ScriptInput {
        output_dir: &output_dir,
        vienna_file: &reports.vienna,
        residues: record.residues(),
        values: &colors.values,
        colors: &colors.colors,
        theme: &config.theme,
        formats: &config.render.formats,
    });
    let script = artifact_path(&output_dir, name, "rnartist_script", "kts");
    fs::write(&script, script_text).map_err(|e| EngineError::io(&script, e))?;

    let rendered = match renderer {
        Some(renderer) => render_script(renderer, name, &script, config.render.policy, warnings)?,
        None => false,
    };

    info!(mfe = result.mfe, rendered, "Sequence processed");
    Ok(SequenceOutcome {
        name: name.to_string(),
        length,
        output_dir,
        structure: result.structure,
        mfe: result.mfe,
        script,
        colorbars,
        rendered,
    })
}

fn render_script(
    renderer: &dyn Renderer,
    name: &str,
    script: &Path,
    policy: RenderPolicy,
    warnings: &mut Warnings,
) -> Result<bool, EngineError> {
    let failure = match renderer.render(script) {
        Ok(output) if output.success => return Ok(true),
        Ok(output) => EngineError::Render {
            sequence: name.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        },
        Err(e) => e,
    };

    match policy {
        RenderPolicy::Required => Err(failure),
        RenderPolicy::BestEffort => {
            warnings.raise(ConfigWarning::RenderDegraded {
                sequence: name.to_string(),
                reason: failure.to_string(),
            });
            Ok(false)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::config::PipelineConfigBuilder;
    use crate::engine::folding::tests::{BalancedFolder, RejectingFolder};
    use crate::engine::render::RenderOutput;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records every script it is asked to render and answers with a fixed exit status.
    pub(crate) struct RecordingRenderer {
        pub scripts: Mutex<Vec<PathBuf>>,
        pub succeed: bool,
    }

    impl RecordingRenderer {
        pub(crate) fn new(succeed: bool) -> Self {
            Self {
                scripts: Mutex::new(Vec::new()),
                succeed,
            }
        }
    }

    impl Renderer for RecordingRenderer {
        fn render(&self, script: &Path) -> Result<RenderOutput, EngineError> {
            self.scripts.lock().unwrap().push(script.to_path_buf());
            Ok(RenderOutput {
                success: self.succeed,
                status: if self.succeed { "exit status: 0" } else { "exit status: 1" }.to_string(),
                stdout: String::new(),
                stderr: if self.succeed { "" } else { "Exception in thread \"main\"" }.to_string(),
            })
        }
    }

    fn config(policy: &str) -> PipelineConfig {
        PipelineConfigBuilder::new()
            .render_policy(policy)
            .build(&mut Warnings::new())
            .unwrap()
    }

    fn hairpin() -> SequenceRecord {
        SequenceRecord::new(Some("a".to_string()), "GGGGCCCC")
    }

    #[test]
    fn hairpin_produces_every_artifact() {
        let dir = tempdir().unwrap();
        let renderer = RecordingRenderer::new(true);
        let mut warnings = Warnings::new();
        let outcome = process_sequence(
            &hairpin(),
            dir.path(),
            &config("best-effort"),
            &BalancedFolder,
            Some(&renderer),
            &mut warnings,
        )
        .unwrap();

        assert_eq!(outcome.structure.len(), 8);
        assert_eq!(
            outcome.structure.matches('(').count(),
            outcome.structure.matches(')').count()
        );
        assert!(outcome.rendered);
        assert!(warnings.is_empty());

        let seq_dir = dir.path().join("a");
        for file in [
            "a_summary.txt",
            "a_basepair_probabilities.txt",
            "a_structure_basepair_probs.txt",
            "a_base_pairing_probabilities_per_base.txt",
            "a_structure.vienna",
            "a_rnartist_script.kts",
        ] {
            assert!(seq_dir.join(file).is_file(), "missing {}", file);
        }
        assert_eq!(outcome.colorbars.len(), 1);
        assert!(outcome.colorbars[0].is_file());
        assert_eq!(renderer.scripts.lock().unwrap().as_slice(), &[outcome.script.clone()]);
    }

    #[test]
    fn script_points_at_absolute_vienna_file() {
        let dir = tempdir().unwrap();
        let outcome = process_sequence(
            &hairpin(),
            dir.path(),
            &config("best-effort"),
            &BalancedFolder,
            None,
            &mut Warnings::new(),
        )
        .unwrap();
        let script = fs::read_to_string(&outcome.script).unwrap();
        assert!(outcome.output_dir.is_absolute());
        assert!(script.contains("a_structure.vienna"));
        assert!(script.matches(" to ").count() >= 8);
        assert!(!outcome.rendered);
    }

    #[test]
    fn best_effort_render_failure_keeps_job_succeeded() {
        let dir = tempdir().unwrap();
        let renderer = RecordingRenderer::new(false);
        let outcome = run_job(
            &hairpin(),
            dir.path(),
            &config("best-effort"),
            &BalancedFolder,
            Some(&renderer),
        );
        assert!(outcome.succeeded());
        assert!(!outcome.result.as_ref().unwrap().rendered);
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::RenderDegraded { sequence, .. } if sequence == "a"))
        );
    }

    #[test]
    fn required_render_failure_fails_job() {
        let dir = tempdir().unwrap();
        let renderer = RecordingRenderer::new(false);
        let outcome = run_job(
            &hairpin(),
            dir.path(),
            &config("required"),
            &BalancedFolder,
            Some(&renderer),
        );
        assert!(!outcome.succeeded());
        assert!(outcome.error_message().unwrap().contains("Rendering failed for 'a'"));
    }

    #[test]
    fn folding_failure_is_captured_in_outcome() {
        let dir = tempdir().unwrap();
        let outcome = run_job(
            &hairpin(),
            dir.path(),
            &config("best-effort"),
            &RejectingFolder { marker: "GGGG" },
            None,
        );
        assert_eq!(outcome.sequence_name, "a");
        assert!(outcome.error_message().unwrap().contains("'a'"));
    }

    #[test]
    fn mismatched_constraint_is_dropped_with_warning() {
        let dir = tempdir().unwrap();
        let mut config = config("best-effort");
        config.model.constraint = Some("((.))".to_string());
        let outcome = run_job(&hairpin(), dir.path(), &config, &BalancedFolder, None);
        assert!(outcome.succeeded());
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::ConstraintLengthMismatch { .. }))
        );
    }
}
