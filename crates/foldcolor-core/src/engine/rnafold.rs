//! The ViennaRNA `RNAfold` command-line program as a [`FoldingEngine`].
//!
//! Each call runs in a private temporary directory so that the dot-plot file `RNAfold` writes
//! next to itself never collides between concurrent jobs.

use super::folding::{EnsembleSolution, FoldingEngine, FoldingError, MfeSolution};
use super::model::ModelConfig;
use crate::core::models::fold::BasePairProbability;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

pub const RNAFOLD_ENV: &str = "FOLDCOLOR_RNAFOLD_BIN";
pub const DEFAULT_RNAFOLD: &str = "RNAfold";

/// Record id fed on stdin; `RNAfold` names the dot plot `<id>_dp.ps`.
const RECORD_ID: &str = "fold";
const INSTALL_HINT: &str = "install ViennaRNA (https://www.tbi.univie.ac.at/RNA/) or point tools.rnafold / FOLDCOLOR_RNAFOLD_BIN at the RNAfold executable";

#[derive(Debug, Clone)]
pub struct RnafoldCli {
    executable: PathBuf,
    parameter_dir: Option<PathBuf>,
}

impl RnafoldCli {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            parameter_dir: None,
        }
    }

    /// Uses `explicit` if given, else the environment override, else `RNAfold` on `PATH`.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let executable = explicit
            .or_else(|| std::env::var_os(RNAFOLD_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RNAFOLD));
        Self::new(executable)
    }

    pub fn with_parameter_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.parameter_dir = dir;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Command-line flags for one invocation.
    pub fn arguments(&self, model: &ModelConfig, ensemble: bool) -> Vec<String> {
        let mut args = vec![
            "-T".to_string(),
            model.temperature.to_string(),
            format!("--dangles={}", model.dangling_mode.level()),
        ];
        if model.avoid_isolated_pairs {
            args.push("--noLP".to_string());
        }
        if model.disallow_gu {
            args.push("--noGU".to_string());
        }
        if model.disallow_closing_gu {
            args.push("--noClosingGU".to_string());
        }
        if model.g_quadruplex {
            args.push("--gquad".to_string());
        }
        if model.circular {
            args.push("--circ".to_string());
        }
        if let Some(span) = model.max_span {
            args.push(format!("--maxBPspan={}", span));
        }
        if let Some(salt) = model.salt_molar {
            args.push(format!("--salt={}", salt));
        }
        if let Some(file) = model.parameter_table.file_name() {
            let path = match &self.parameter_dir {
                Some(dir) => dir.join(file),
                None => PathBuf::from(file),
            };
            args.push("-P".to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        if model.constraint.is_some() {
            args.push("-C".to_string());
            args.push("--enforceConstraint".to_string());
        }
        args.push("--noPS".to_string());
        if ensemble {
            args.push("-p".to_string());
        }
        args
    }

    fn run(
        &self,
        sequence: &str,
        model: &ModelConfig,
        ensemble: bool,
    ) -> Result<(String, tempfile::TempDir), FoldingError> {
        let workdir = tempfile::tempdir()
            .map_err(|e| FoldingError::Rejected(format!("cannot create work directory: {}", e)))?;
        let args = self.arguments(model, ensemble);
        debug!(executable = %self.executable.display(), ?args, "Running RNAfold");

        let mut child = Command::new(&self.executable)
            .args(&args)
            .current_dir(workdir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut input = format!(">{}\n{}\n", RECORD_ID, sequence);
        if let Some(constraint) = &model.constraint {
            input.push_str(constraint);
            input.push('\n');
        }
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(|e| FoldingError::Rejected(format!("cannot write to RNAfold: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| FoldingError::Rejected(format!("RNAfold did not finish: {}", e)))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(%stdout, %stderr, "RNAfold output");

        if !output.status.success() {
            return Err(FoldingError::Rejected(format!(
                "RNAfold exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok((stdout, workdir))
    }

    fn spawn_error(&self, error: std::io::Error) -> FoldingError {
        if error.kind() == ErrorKind::NotFound {
            FoldingError::BackendUnavailable {
                name: self.executable.display().to_string(),
                hint: INSTALL_HINT.to_string(),
            }
        } else {
            FoldingError::Rejected(format!(
                "cannot start '{}': {}",
                self.executable.display(),
                error
            ))
        }
    }
}

impl FoldingEngine for RnafoldCli {
    fn fold_mfe(&self, sequence: &str, model: &ModelConfig) -> Result<MfeSolution, FoldingError> {
        let (stdout, _workdir) = self.run(sequence, model, false)?;
        parse_mfe(&stdout)
    }

    fn fold_ensemble(
        &self,
        sequence: &str,
        model: &ModelConfig,
    ) -> Result<EnsembleSolution, FoldingError> {
        let (stdout, workdir) = self.run(sequence, model, true)?;
        let dot_plot = workdir.path().join(format!("{}_dp.ps", RECORD_ID));
        let plot = std::fs::read_to_string(&dot_plot).map_err(|e| {
            FoldingError::MalformedOutput(format!("cannot read {}: {}", dot_plot.display(), e))
        })?;

        let mut pairing_list = parse_dot_plot(&plot);
        pairing_list.push(BasePairProbability::sentinel());

        Ok(EnsembleSolution {
            ensemble_energy: parse_ensemble_energy(&stdout)?,
            pairing_list,
            mean_bp_distance: parse_diversity(&stdout).unwrap_or(0.0),
        })
    }

    fn check_available(&self) -> Result<(), FoldingError> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "RNAfold is available"
        );
        Ok(())
    }
}

/// Splits `<structure> <open><energy><close>` into its parts.
fn parse_energy_line(line: &str, open: char, close: char) -> Option<(&str, f64)> {
    let line = line.trim();
    let split = line.find(char::is_whitespace)?;
    let (structure, rest) = line.split_at(split);
    let energy = rest
        .trim()
        .strip_prefix(open)?
        .strip_suffix(close)?
        .trim()
        .parse()
        .ok()?;
    Some((structure, energy))
}

pub fn parse_mfe(stdout: &str) -> Result<MfeSolution, FoldingError> {
    stdout
        .lines()
        .filter(|line| !line.starts_with('>'))
        .find_map(|line| parse_energy_line(line, '(', ')'))
        .map(|(structure, mfe)| MfeSolution {
            structure: structure.to_string(),
            mfe,
        })
        .ok_or_else(|| FoldingError::MalformedOutput("no MFE line in RNAfold output".to_string()))
}

pub fn parse_ensemble_energy(stdout: &str) -> Result<f64, FoldingError> {
    stdout
        .lines()
        .find_map(|line| parse_energy_line(line, '[', ']'))
        .map(|(_, energy)| energy)
        .ok_or_else(|| {
            FoldingError::MalformedOutput("no ensemble energy line in RNAfold output".to_string())
        })
}

pub fn parse_diversity(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .find(|line| line.contains("ensemble diversity"))
        .and_then(|line| line.split_whitespace().last())
        .and_then(|token| token.parse().ok())
}

/// Reads `i j sqrt(p) ubox` entries from a dot-plot PostScript file.
pub fn parse_dot_plot(plot: &str) -> Vec<BasePairProbability> {
    plot.lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [i, j, sqrt_p, "ubox"] => {
                    let i = i.parse().ok()?;
                    let j = j.parse().ok()?;
                    let sqrt_p: f64 = sqrt_p.parse().ok()?;
                    Some(BasePairProbability::new(i, j, sqrt_p * sqrt_p))
                }
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::{DanglingMode, ParameterTable};

    const PF_OUTPUT: &str = ">fold\nGGGGAAAACCCC\n((((....)))) ( -4.30)\n((((....)))) [ -4.56]\n((((....)))) { -4.30 d=0.44}\n frequency of mfe structure in ensemble 0.654; ensemble diversity 0.82  \n";

    #[test]
    fn default_model_flags() {
        let cli = RnafoldCli::new("RNAfold");
        let args = cli.arguments(&ModelConfig::default(), false);
        assert_eq!(args, vec!["-T", "37", "--dangles=2", "--noLP", "--noPS"]);
    }

    #[test]
    fn full_model_flags() {
        let model = ModelConfig {
            temperature: 25.5,
            dangling_mode: DanglingMode::Ignore,
            avoid_isolated_pairs: false,
            disallow_gu: true,
            disallow_closing_gu: true,
            g_quadruplex: true,
            circular: true,
            max_span: Some(100),
            parameter_table: ParameterTable::Turner1999,
            salt_molar: Some(0.5),
            constraint: Some("((..))".to_string()),
        };
        let cli = RnafoldCli::new("RNAfold").with_parameter_dir(Some(PathBuf::from("/params")));
        let args = cli.arguments(&model, true);
        assert_eq!(
            args,
            vec![
                "-T",
                "25.5",
                "--dangles=0",
                "--noGU",
                "--noClosingGU",
                "--gquad",
                "--circ",
                "--maxBPspan=100",
                "--salt=0.5",
                "-P",
                "/params/rna_turner1999.par",
                "-C",
                "--enforceConstraint",
                "--noPS",
                "-p",
            ]
        );
    }

    #[test]
    fn parses_mfe_line() {
        let mfe = parse_mfe(PF_OUTPUT).unwrap();
        assert_eq!(mfe.structure, "((((....))))");
        assert_eq!(mfe.mfe, -4.30);
        let tight = parse_mfe(">fold\nGGGGAAAACCCC\n((((....)))) (-12.30)\n").unwrap();
        assert_eq!(tight.mfe, -12.30);
    }

    #[test]
    fn parses_ensemble_statistics() {
        assert_eq!(parse_ensemble_energy(PF_OUTPUT).unwrap(), -4.56);
        assert_eq!(parse_diversity(PF_OUTPUT), Some(0.82));
    }

    #[test]
    fn missing_mfe_line_is_malformed() {
        assert!(matches!(
            parse_mfe(">fold\nACGU\n"),
            Err(FoldingError::MalformedOutput(_))
        ));
    }

    #[test]
    fn dot_plot_squares_ubox_entries_and_skips_lbox() {
        let plot = "%!PS-Adobe-3.0 EPSF-3.0\n/ubox {\n} def\n1 12 0.9 ubox\n2 11 0.5 ubox\n1 12 0.95 lbox\n";
        let list = parse_dot_plot(plot);
        assert_eq!(list.len(), 2);
        assert_eq!((list[0].i, list[0].j), (1, 12));
        assert!((list[0].p - 0.81).abs() < 1e-12);
        assert!((list[1].p - 0.25).abs() < 1e-12);
    }

    #[test]
    fn missing_executable_is_backend_unavailable() {
        let cli = RnafoldCli::new("/nonexistent/foldcolor-test/RNAfold");
        let err = cli.fold_mfe("ACGU", &ModelConfig::default()).unwrap_err();
        assert!(matches!(err, FoldingError::BackendUnavailable { .. }));
        assert!(matches!(
            cli.check_available(),
            Err(FoldingError::BackendUnavailable { .. })
        ));
    }
}
