use super::sequence::{JobOutcome, SequenceOutcome, run_job};
use crate::core::io::fasta::{FastaFile, RECOGNIZED_EXTENSIONS};
use crate::core::models::sequence::SequenceRecord;
use crate::engine::config::{OutputLayout, PipelineConfig};
use crate::engine::error::EngineError;
use crate::engine::folding::{FoldingEngine, FoldingError};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::render::Renderer;
use crate::engine::warning::{ConfigWarning, Warnings};
use chrono::NaiveDateTime;
use std::any::Any;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use tracing::{debug, error, info, instrument};

pub const MASTER_SUMMARY_FILE: &str = "master_summary.txt";
pub const ERROR_LOG_FILE: &str = "error_log.txt";

/// A failure recorded under a sequence or input file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub name: String,
    pub message: String,
}

impl BatchError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Records ready for dispatch plus the input files that could not be read.
#[derive(Debug, Default)]
pub struct QueuedInput {
    pub records: Vec<SequenceRecord>,
    pub errors: Vec<BatchError>,
}

#[derive(Debug)]
pub struct BatchSummary {
    pub run_dir: PathBuf,
    /// Successful jobs in submission order.
    pub results: Vec<SequenceOutcome>,
    pub errors: Vec<BatchError>,
    pub warnings: Vec<ConfigWarning>,
    pub master_summary: PathBuf,
    pub error_log: Option<PathBuf>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

enum WorkerMessage {
    Started { index: usize },
    Finished { index: usize, outcome: JobOutcome },
}

/// Expands the input path into the files to read.
///
/// A directory yields every file with a recognized extension, sorted by path. A file is taken
/// as is, whatever its extension.
pub fn collect_input_files(input: &Path) -> Result<Vec<PathBuf>, EngineError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(EngineError::Input(format!(
            "input path '{}' does not exist",
            input.display()
        )));
    }

    let entries = fs::read_dir(input).map_err(|e| EngineError::io(input, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| EngineError::io(input, e))?.path();
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| RECOGNIZED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if recognized && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(EngineError::Input(format!(
            "no FASTA files found in directory '{}'",
            input.display()
        )));
    }
    Ok(files)
}

/// Reads every file into one job list. Unreadable files become errors and never abort the
/// batch; read warnings and duplicate derived names are raised into `warnings`.
pub fn queue_records(files: &[PathBuf], warnings: &mut Warnings) -> QueuedInput {
    let mut queued = QueuedInput::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for file in files {
        info!(file = %file.display(), "Reading input file");
        let contents = match FastaFile::read_from_path(file) {
            Ok(contents) => contents,
            Err(e) => {
                error!(file = %file.display(), "{}", e);
                queued.errors.push(BatchError::new(file_label(file), e.to_string()));
                continue;
            }
        };

        for warning in contents.warnings {
            warnings.raise(warning.into());
        }
        for record in contents.records {
            let count = seen.entry(record.name().to_string()).or_default();
            *count += 1;
            if *count == 2 {
                warnings.raise(ConfigWarning::DuplicateSequenceName {
                    name: record.name().to_string(),
                });
            }
            info!(sequence = record.name(), length = record.len(), "Queued sequence");
            queued.records.push(record);
        }
    }
    queued
}

/// The effective pool size: the requested count, or one worker per logical CPU.
pub fn resolve_worker_count(requested: Option<usize>) -> usize {
    match requested {
        Some(count) if count > 0 => count,
        _ => num_cpus::get().max(1),
    }
}

/// Where this run writes its per-sequence directories and summaries.
pub fn run_directory(root: &Path, layout: OutputLayout, now: &NaiveDateTime) -> PathBuf {
    match layout {
        OutputLayout::Flat => root.to_path_buf(),
        OutputLayout::DateGroup => root.join(now.format("%Y-%m-%d").to_string()),
        OutputLayout::NestedTimestamp => {
            root.join(format!("run_{}", now.format("%Y-%m-%d_%H-%M-%S")))
        }
    }
}

/// Probes the external tools once before anything is dispatched.
pub fn check_dependencies(
    engine: &dyn FoldingEngine,
    renderer: Option<&dyn Renderer>,
) -> Result<(), EngineError> {
    engine.check_available().map_err(|e| match e {
        FoldingError::BackendUnavailable { name, hint } => {
            EngineError::DependencyMissing { name, hint }
        }
        other => EngineError::DependencyMissing {
            name: "folding backend".to_string(),
            hint: other.to_string(),
        },
    })?;
    if let Some(renderer) = renderer {
        renderer.check_available()?;
    }
    Ok(())
}

pub fn write_master_summary<W: Write>(writer: &mut W, results: &[SequenceOutcome]) -> io::Result<()> {
    writeln!(writer, "Sequence\tLength\tMFE\tOutputDir")?;
    for result in results {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            result.name,
            result.length,
            result.mfe,
            result.output_dir.display()
        )?;
    }
    Ok(())
}

pub fn write_error_log<W: Write>(writer: &mut W, errors: &[BatchError]) -> io::Result<()> {
    for error in errors {
        writeln!(writer, "{}: {}", error.name, error.message)?;
    }
    Ok(())
}

/// Runs a whole batch: collect and parse input, check the external tools, fold every record on
/// a dedicated worker pool and write the run-level summaries.
///
/// Only setup failures are returned as errors. Per-sequence failures are collected in the
/// summary and never abort sibling jobs.
#[instrument(skip_all, name = "batch_workflow", fields(input = %input.display()))]
pub fn run(
    input: &Path,
    output_root: &Path,
    config: PipelineConfig,
    engine: &dyn FoldingEngine,
    renderer: Option<&dyn Renderer>,
    reporter: &ProgressReporter,
) -> Result<BatchSummary, EngineError> {
    let mut warnings = Warnings::new();

    reporter.report(Progress::PhaseStart {
        name: "Reading input",
    });
    let files = collect_input_files(input)?;
    let QueuedInput { records, errors } = queue_records(&files, &mut warnings);
    if records.is_empty() {
        return Err(EngineError::Input(format!(
            "no usable sequence records found in '{}'",
            input.display()
        )));
    }
    reporter.report(Progress::Message(format!(
        "Queued {} sequence(s) from {} file(s)",
        records.len(),
        files.len()
    )));
    reporter.report(Progress::PhaseFinish);

    check_dependencies(engine, renderer)?;

    let now = chrono::Local::now().naive_local();
    let run_dir = run_directory(output_root, config.output_layout, &now);
    fs::create_dir_all(&run_dir).map_err(|e| EngineError::io(&run_dir, e))?;

    let workers = resolve_worker_count(config.max_workers);
    info!(workers, jobs = records.len(), run_dir = %run_dir.display(), "Dispatching jobs");
    let outcomes = dispatch(
        &records,
        &run_dir,
        Arc::new(config),
        workers,
        engine,
        renderer,
        reporter,
    )?;

    let mut summary = BatchSummary {
        master_summary: run_dir.join(MASTER_SUMMARY_FILE),
        run_dir,
        results: Vec::new(),
        errors,
        warnings: warnings.into_vec(),
        error_log: None,
    };
    for outcome in outcomes {
        summary.warnings.extend(outcome.warnings);
        match outcome.result {
            Ok(result) => summary.results.push(result),
            Err(message) => summary
                .errors
                .push(BatchError::new(outcome.sequence_name, message)),
        }
    }

    write_file(&summary.master_summary, |w| {
        write_master_summary(w, &summary.results)
    })?;
    if !summary.errors.is_empty() {
        let path = summary.run_dir.join(ERROR_LOG_FILE);
        write_file(&path, |w| write_error_log(w, &summary.errors))?;
        summary.error_log = Some(path);
    }

    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "Batch finished"
    );
    reporter.report(Progress::Message(format!(
        "Successfully processed {} sequence(s). Errors: {}",
        summary.succeeded(),
        summary.failed()
    )));
    Ok(summary)
}

/// Spawns every job up front and collects outcomes in completion order.
///
/// The returned outcomes are indexed by submission order. A worker panic is caught and
/// recorded under the job's sequence name.
fn dispatch(
    records: &[SequenceRecord],
    run_dir: &Path,
    config: Arc<PipelineConfig>,
    workers: usize,
    engine: &dyn FoldingEngine,
    renderer: Option<&dyn Renderer>,
    reporter: &ProgressReporter,
) -> Result<Vec<JobOutcome>, EngineError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("fold-worker-{}", index))
        .build()
        .map_err(|e| EngineError::Internal(format!("failed to build worker pool: {}", e)))?;

    reporter.report(Progress::PhaseStart {
        name: "Folding sequences",
    });
    reporter.report(Progress::TaskStart {
        total_steps: records.len() as u64,
    });

    let mut states = vec![JobState::Queued; records.len()];
    let mut outcomes: Vec<Option<JobOutcome>> = (0..records.len()).map(|_| None).collect();
    let (tx, rx) = mpsc::channel::<WorkerMessage>();

    pool.in_place_scope(|scope| {
        for (index, record) in records.iter().enumerate() {
            let tx = tx.clone();
            let config = Arc::clone(&config);
            scope.spawn(move |_| {
                let _ = tx.send(WorkerMessage::Started { index });
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_job(record, run_dir, &config, engine, renderer)
                }))
                .unwrap_or_else(|payload| JobOutcome {
                    sequence_name: record.name().to_string(),
                    result: Err(format!("worker panicked: {}", panic_message(payload.as_ref()))),
                    warnings: Vec::new(),
                });
                let _ = tx.send(WorkerMessage::Finished { index, outcome });
            });
        }
        drop(tx);

        for message in rx {
            match message {
                WorkerMessage::Started { index } => {
                    states[index] = JobState::Running;
                    debug!(sequence = records[index].name(), "Job started");
                }
                WorkerMessage::Finished { index, outcome } => {
                    let succeeded = outcome.succeeded();
                    states[index] = if succeeded {
                        JobState::Succeeded
                    } else {
                        JobState::Failed
                    };
                    if let Some(message) = outcome.error_message() {
                        error!(sequence = %outcome.sequence_name, "{}", message);
                    }
                    reporter.report(Progress::TaskIncrement);
                    reporter.report(Progress::JobCompleted {
                        name: outcome.sequence_name.clone(),
                        succeeded,
                    });
                    outcomes[index] = Some(outcome);
                }
            }
        }
    });

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    Ok(outcomes
        .into_iter()
        .zip(states)
        .zip(records)
        .map(|((outcome, state), record)| match outcome {
            Some(outcome) if state.is_terminal() => outcome,
            _ => JobOutcome {
                sequence_name: record.name().to_string(),
                result: Err("worker exited without reporting a result".to_string()),
                warnings: Vec::new(),
            },
        })
        .collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn write_file<F>(path: &Path, write: F) -> Result<(), EngineError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| EngineError::io(path, e))
}
