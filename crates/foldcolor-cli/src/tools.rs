use crate::config::ToolSettings;
use crate::error::Result;
use directories::ProjectDirs;
use foldcolor::engine::error::EngineError;
use foldcolor::engine::render::{
    JAR_ENV, JAR_NAME, RnartistRenderer, default_jar_candidates, locate_jar,
};
use foldcolor::engine::rnafold::RnafoldCli;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "foldcolor.toml";
const DEFAULT_JAVA: &str = "java";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "foldcolor", "foldcolor")
}

/// `<user config dir>/foldcolor.toml`, when the platform has a config directory.
pub fn user_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Finds the external programs from explicit settings, environment variables and the
/// conventional install locations.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    exe_dir: Option<PathBuf>,
    cwd: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl ToolLocator {
    pub fn new() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let locator = Self {
            exe_dir,
            cwd: std::env::current_dir().ok(),
            data_dir: project_dirs().map(|dirs| dirs.data_dir().to_path_buf()),
        };
        debug!("Tool locator initialized: {:?}", &locator);
        locator
    }

    pub fn folding_engine(&self, tools: &ToolSettings) -> RnafoldCli {
        RnafoldCli::resolve(tools.rnafold.clone()).with_parameter_dir(tools.parameter_dir.clone())
    }

    /// Jar lookup order: explicit setting, `FOLDCOLOR_RNARTIST_JAR`, then the conventional
    /// locations next to the executable, in the working directory and in the data directory.
    pub fn jar_candidates(&self, explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = explicit {
            candidates.push(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(JAR_ENV) {
            candidates.push(PathBuf::from(path));
        }
        candidates.extend(default_jar_candidates(
            self.exe_dir.as_deref(),
            self.cwd.as_deref(),
        ));
        if let Some(dir) = &self.data_dir {
            candidates.push(dir.join(JAR_NAME));
        }
        candidates
    }

    pub fn locate_jar(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        let candidates = self.jar_candidates(explicit);
        locate_jar(candidates.iter().cloned()).ok_or_else(|| {
            let searched = candidates
                .iter()
                .map(|path| format!("  {}", path.display()))
                .collect::<Vec<_>>()
                .join("\n");
            EngineError::DependencyMissing {
                name: JAR_NAME.to_string(),
                hint: format!(
                    "pass --jar or set {}. Searched:\n{}",
                    JAR_ENV, searched
                ),
            }
            .into()
        })
    }

    pub fn renderer(&self, tools: &ToolSettings) -> Result<RnartistRenderer> {
        let jar = self.locate_jar(tools.rnartist_jar.as_deref())?;
        let java = tools
            .java
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_JAVA));
        debug!(java = %java.display(), jar = %jar.display(), "Renderer resolved");
        Ok(RnartistRenderer::new(java, jar))
    }
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new()
    }
}
