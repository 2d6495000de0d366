use super::error::EngineError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

pub const JAR_ENV: &str = "FOLDCOLOR_RNARTIST_JAR";
pub const JAR_NAME: &str = "RNArtistCore.jar";
pub const SNAPSHOT_JAR_NAME: &str = "rnartistcore-0.4.6-SNAPSHOT-jar-with-dependencies.jar";

const JAVA_HINT: &str = "install a Java runtime (version 8 or higher, e.g. https://adoptium.net/) and make sure `java` is on PATH, or pass --java";

/// What the external renderer reported. It produces no structured result beyond this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub success: bool,
    /// Human-readable exit status, e.g. `exit status: 1`.
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl RenderOutput {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub trait Renderer: Send + Sync {
    /// Runs the renderer on a script. `Err` means the process could not be run at all; a
    /// process that ran and failed is reported through [`RenderOutput::success`].
    fn render(&self, script: &Path) -> Result<RenderOutput, EngineError>;

    /// Checked once before any job is dispatched.
    fn check_available(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Runs `<java> -jar <jar> <script>` with plain argument vectors.
#[derive(Debug, Clone)]
pub struct RnartistRenderer {
    java: PathBuf,
    jar: PathBuf,
}

impl RnartistRenderer {
    pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }

    pub fn jar(&self) -> &Path {
        &self.jar
    }

    fn java_missing(&self) -> EngineError {
        EngineError::DependencyMissing {
            name: self.java.display().to_string(),
            hint: JAVA_HINT.to_string(),
        }
    }
}

impl Renderer for RnartistRenderer {
    fn render(&self, script: &Path) -> Result<RenderOutput, EngineError> {
        let mut command = Command::new(&self.java);
        command
            .arg("-jar")
            .arg(&self.jar)
            .arg(script)
            .stdin(Stdio::null());
        if let Some(dir) = script.parent() {
            command.current_dir(dir);
        }
        debug!(java = %self.java.display(), jar = %self.jar.display(), script = %script.display(), "Running RNArtistCore");

        let output = command.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                self.java_missing()
            } else {
                EngineError::io(&self.java, e)
            }
        })?;
        let output = RenderOutput::from_output(output);
        if !output.stdout.trim().is_empty() {
            debug!(stdout = %output.stdout.trim(), "RNArtistCore output");
        }
        if !output.stderr.trim().is_empty() {
            debug!(stderr = %output.stderr.trim(), "RNArtistCore errors/warnings");
        }
        Ok(output)
    }

    fn check_available(&self) -> Result<(), EngineError> {
        let output = Command::new(&self.java)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|_| self.java_missing())?;
        if !output.status.success() {
            return Err(self.java_missing());
        }
        // `java -version` prints to stderr.
        let version = String::from_utf8_lossy(&output.stderr);
        info!(
            java = %self.java.display(),
            version = version.lines().next().unwrap_or_default(),
            "Java runtime found"
        );

        if !self.jar.is_file() {
            return Err(EngineError::DependencyMissing {
                name: JAR_NAME.to_string(),
                hint: format!(
                    "no renderer jar at '{}'; pass --jar, set {}, or place {} in a bin/ directory",
                    self.jar.display(),
                    JAR_ENV,
                    JAR_NAME
                ),
            });
        }
        Ok(())
    }
}

/// The conventional jar locations, in lookup order.
pub fn default_jar_candidates(exe_dir: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = exe_dir {
        candidates.push(dir.join("bin").join(JAR_NAME));
        candidates.push(dir.join("bin").join(SNAPSHOT_JAR_NAME));
    }
    if let Some(dir) = cwd {
        candidates.push(dir.join("bin").join(JAR_NAME));
    }
    candidates
}

/// The first existing file among `candidates`.
pub fn locate_jar<I>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    candidates.into_iter().find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn candidates_follow_lookup_order() {
        let candidates =
            default_jar_candidates(Some(Path::new("/opt/fc")), Some(Path::new("/work")));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/opt/fc/bin/RNArtistCore.jar"),
                PathBuf::from("/opt/fc/bin").join(SNAPSHOT_JAR_NAME),
                PathBuf::from("/work/bin/RNArtistCore.jar"),
            ]
        );
    }

    #[test]
    fn locate_jar_returns_first_existing() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join(SNAPSHOT_JAR_NAME), b"jar").unwrap();

        let found = locate_jar(default_jar_candidates(Some(dir.path()), None));
        assert_eq!(found, Some(bin.join(SNAPSHOT_JAR_NAME)));
        assert_eq!(locate_jar(Vec::new()), None);
    }

    #[test]
    fn missing_java_is_a_missing_dependency() {
        let renderer = RnartistRenderer::new("/nonexistent/foldcolor-test/java", "x.jar");
        assert!(matches!(
            renderer.check_available(),
            Err(EngineError::DependencyMissing { .. })
        ));
        assert!(matches!(
            renderer.render(Path::new("/tmp/script.kts")),
            Err(EngineError::DependencyMissing { .. })
        ));
    }
}
