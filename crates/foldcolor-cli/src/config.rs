use crate::cli::{RunArgs, ToolArgs};
use crate::error::{CliError, Result};
use crate::tools::{CONFIG_FILE_NAME, user_config_file};
use foldcolor::core::color::catalog::ColormapCatalog;
use foldcolor::engine::config::{
    ColorbarConfig, ImageFormat, Orientation, PipelineConfig, PipelineConfigBuilder, ThemeConfig,
};
use foldcolor::engine::profile::Profile;
use foldcolor::engine::warning::{ConfigWarning, Warnings};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_OUTPUT_ROOT: &str = "outputs";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct FileColormapConfig {
    name: Option<String>,
    catalog: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct FileColoringModeConfig {
    mode: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct FileOutputConfig {
    structure: Option<String>,
    root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct FilePerformanceConfig {
    #[serde(rename = "max-workers")]
    max_workers: Option<i64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct FileColorbarConfig {
    formats: Option<Vec<String>>,
    orientation: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    font_size: Option<f64>,
    line_width: Option<f64>,
    transparency: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct FileRenderConfig {
    formats: Option<Vec<String>>,
    policy: Option<String>,
}

/// Where the external tools live. Every field is optional; unset fields fall back to the
/// environment and the conventional locations.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ToolSettings {
    pub rnafold: Option<PathBuf>,
    pub java: Option<PathBuf>,
    pub rnartist_jar: Option<PathBuf>,
    pub parameter_dir: Option<PathBuf>,
}

impl ToolSettings {
    /// Command-line paths win over the configuration file.
    pub fn with_args(mut self, args: &ToolArgs) -> Self {
        if let Some(path) = &args.rnafold {
            self.rnafold = Some(path.clone());
        }
        if let Some(path) = &args.java {
            self.java = Some(path.clone());
        }
        if let Some(path) = &args.jar {
            self.rnartist_jar = Some(path.clone());
        }
        self
    }
}

/// The global TOML configuration as written on disk. Every section is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    colormap: Option<FileColormapConfig>,
    #[serde(rename = "coloring-mode")]
    coloring_mode: Option<FileColoringModeConfig>,
    output: Option<FileOutputConfig>,
    performance: Option<FilePerformanceConfig>,
    colorbar: Option<FileColorbarConfig>,
    theme: Option<ThemeConfig>,
    render: Option<FileRenderConfig>,
    tools: Option<ToolSettings>,
}

/// Everything the `run` command needs after all layers are merged.
#[derive(Debug)]
pub struct RunSettings {
    pub pipeline: PipelineConfig,
    pub output_root: PathBuf,
    pub tools: ToolSettings,
}

impl FileConfig {
    pub fn parse_str(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content, path)
    }

    /// Loads `explicit` if given, else `foldcolor.toml` in the working directory, else the
    /// one in the user config directory. No file at all yields the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidates = [Some(PathBuf::from(CONFIG_FILE_NAME)), user_config_file()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                info!("Using configuration file {:?}", &path);
                return Self::from_file(&path);
            }
        }
        debug!("No configuration file found, using defaults.");
        Ok(Self::default())
    }

    pub fn tools(&self) -> ToolSettings {
        self.tools.clone().unwrap_or_default()
    }

    pub fn output_root(&self) -> PathBuf {
        self.output
            .as_ref()
            .and_then(|output| output.root.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT))
    }

    /// The built-in catalog, extended by the file named in `colormap.catalog`.
    pub fn catalog(&self) -> Result<ColormapCatalog> {
        let mut catalog = ColormapCatalog::builtin();
        if let Some(path) = self.colormap.as_ref().and_then(|c| c.catalog.as_ref()) {
            debug!("Loading colormap catalog from {:?}", path);
            let extra = ColormapCatalog::load(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?;
            catalog.merge(extra);
        }
        Ok(catalog)
    }

    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let value = value_str.to_string();

            match key {
                "colormap.name" => {
                    self.colormap.get_or_insert_with(Default::default).name = Some(value);
                }
                "coloring-mode.mode" => {
                    self.coloring_mode.get_or_insert_with(Default::default).mode = Some(value);
                }
                "output.structure" => {
                    self.output.get_or_insert_with(Default::default).structure = Some(value);
                }
                "output.root" => {
                    self.output.get_or_insert_with(Default::default).root =
                        Some(PathBuf::from(value));
                }
                "performance.max-workers" => {
                    self.performance
                        .get_or_insert_with(Default::default)
                        .max_workers = Some(value_str.parse().map_err(|_| {
                        CliError::Config(format!(
                            "Invalid integer value for {}: {}",
                            key, value_str
                        ))
                    })?);
                }
                "render.policy" => {
                    self.render.get_or_insert_with(Default::default).policy = Some(value);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Seeds a pipeline builder with the file values.
    fn builder(&self, warnings: &mut Warnings) -> Result<PipelineConfigBuilder> {
        let mut builder = PipelineConfigBuilder::new().catalog(self.catalog()?);

        if let Some(name) = self.colormap.as_ref().and_then(|c| c.name.clone()) {
            builder = builder.colormap(name);
        }
        if let Some(mode) = self.coloring_mode.as_ref().and_then(|c| c.mode.clone()) {
            builder = builder.coloring_mode(mode);
        }
        if let Some(structure) = self.output.as_ref().and_then(|o| o.structure.clone()) {
            builder = builder.output_layout(structure);
        }
        if let Some(workers) = self.performance.as_ref().and_then(|p| p.max_workers) {
            builder = builder.max_workers(workers);
        }
        if let Some(colorbar) = &self.colorbar {
            builder = builder.colorbar(merge_colorbar(colorbar, warnings));
            if let Some(formats) = &colorbar.formats {
                builder = builder.colorbar_formats(formats.clone());
            }
        }
        if let Some(theme) = &self.theme {
            builder = builder.theme(theme.clone());
        }
        if let Some(render) = &self.render {
            if let Some(formats) = &render.formats {
                let formats = parse_render_formats(formats, warnings);
                if !formats.is_empty() {
                    builder = builder.render_formats(formats);
                }
            }
            if let Some(policy) = &render.policy {
                builder = builder.render_policy(policy.clone());
            }
        }
        Ok(builder)
    }

    /// Merges the layers in precedence order: this file (with `--set` applied), the JSON
    /// profile, then the command-line flags.
    pub fn merge_with_cli(
        mut self,
        args: &RunArgs,
        threads: Option<usize>,
        warnings: &mut Warnings,
    ) -> Result<RunSettings> {
        self.apply_set_values(&args.set_values)?;
        let mut builder = self.builder(warnings)?;

        if let Some(path) = &args.profile {
            info!("Loading folding profile from {:?}", path);
            let profile = Profile::load_or_default(path, warnings);
            builder = builder.apply_profile(&profile);
        }

        if let Some(name) = &args.colormap {
            builder = builder.colormap(name.clone());
        }
        if let Some(mode) = &args.coloring_mode {
            builder = builder.coloring_mode(mode.clone());
        }
        if let Some(threads) = threads {
            builder = builder.max_workers(i64::try_from(threads).unwrap_or(i64::MAX));
        }

        let pipeline = builder
            .build(warnings)
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(RunSettings {
            pipeline,
            output_root: args.output.clone().unwrap_or_else(|| self.output_root()),
            tools: self.tools().with_args(&args.tools),
        })
    }
}

fn merge_colorbar(file: &FileColorbarConfig, warnings: &mut Warnings) -> ColorbarConfig {
    let defaults = ColorbarConfig::default();
    let orientation = file
        .orientation
        .as_deref()
        .map_or(defaults.orientation, |o| Orientation::parse_lenient(o, warnings));
    ColorbarConfig {
        formats: defaults.formats,
        orientation,
        width: file.width.unwrap_or(defaults.width),
        height: file.height.unwrap_or(defaults.height),
        font_size: file.font_size.unwrap_or(defaults.font_size),
        line_width: file.line_width.unwrap_or(defaults.line_width),
        transparency: file.transparency.unwrap_or(defaults.transparency),
    }
}

/// Unknown names are skipped with a warning; an empty result keeps the default formats.
fn parse_render_formats(names: &[String], warnings: &mut Warnings) -> Vec<ImageFormat> {
    names
        .iter()
        .filter_map(|name| {
            let format = ImageFormat::from_name(name);
            if format.is_none() {
                warnings.raise(ConfigWarning::UnsupportedRenderFormat {
                    format: name.clone(),
                });
            }
            format
        })
        .collect()
}
