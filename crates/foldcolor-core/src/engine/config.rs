use super::model::ModelConfig;
use super::profile::{ConstraintSettings, FoldingParams, Profile};
use super::warning::{ConfigWarning, Warnings};
use crate::core::color::catalog::{ColormapCatalog, DEFAULT_COLORMAP};
use crate::core::color::gradient::Gradient;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Which scalar a residue is colored by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColoringMode {
    /// Paired residues by `pi`, unpaired residues by `1 - pi`.
    #[default]
    PairedOnly,
    /// Every residue by `pi`.
    AllPi,
}

impl ColoringMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "paired_only" => Some(Self::PairedOnly),
            "all_pi" => Some(Self::AllPi),
            _ => None,
        }
    }

    /// Unrecognized names color by `pi` for every residue, with a warning.
    pub fn parse_lenient(name: &str, warnings: &mut Warnings) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warnings.raise(ConfigWarning::UnknownColoringMode {
                requested: name.to_string(),
            });
            Self::AllPi
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PairedOnly => "paired_only",
            Self::AllPi => "all_pi",
        }
    }
}

/// How run directories are laid out under the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    Flat,
    DateGroup,
    #[default]
    NestedTimestamp,
}

impl OutputLayout {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(Self::Flat),
            "date_group" => Some(Self::DateGroup),
            "nested_timestamp" => Some(Self::NestedTimestamp),
            _ => None,
        }
    }

    pub fn parse_lenient(name: &str, warnings: &mut Warnings) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warnings.raise(ConfigWarning::UnknownOutputStructure {
                requested: name.to_string(),
            });
            Self::default()
        })
    }
}

/// Whether a failed render fails the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPolicy {
    #[default]
    BestEffort,
    Required,
}

impl RenderPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "best-effort" => Some(Self::BestEffort),
            "required" => Some(Self::Required),
            _ => None,
        }
    }

    pub fn parse_lenient(name: &str, warnings: &mut Warnings) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warnings.raise(ConfigWarning::UnknownRenderPolicy {
                requested: name.to_string(),
            });
            Self::default()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }

    pub fn parse_lenient(name: &str, warnings: &mut Warnings) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            warnings.raise(ConfigWarning::UnknownOrientation {
                requested: name.to_string(),
            });
            Self::default()
        })
    }
}

/// Legend image settings. Sizes are in inches, fonts and lines in points.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorbarConfig {
    pub formats: Vec<ImageFormat>,
    pub orientation: Orientation,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub line_width: f64,
    pub transparency: f64,
}

impl Default for ColorbarConfig {
    fn default() -> Self {
        Self {
            formats: vec![ImageFormat::Png],
            orientation: Orientation::Horizontal,
            width: 8.0,
            height: 1.5,
            font_size: 12.0,
            line_width: 2.0,
            transparency: 1.0,
        }
    }
}

/// A directive field value: numbers are written with one decimal, text is quoted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DirectiveValue {
    Number(f64),
    Text(String),
}

/// One renderer theme rule. Every field is optional and only emitted when present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeDirective {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<DirectiveValue>,
    pub to: Option<DirectiveValue>,
    pub location: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ThemeConfig {
    pub details_level: Option<u32>,
    /// Residue letter to hex color; overrides the gradient color of matching residues.
    pub base_colors: BTreeMap<String, String>,
    pub base_label_color: Option<String>,
    pub custom_colors: Vec<ThemeDirective>,
    pub show: Vec<ThemeDirective>,
    pub hide: Vec<ThemeDirective>,
    pub line: Vec<ThemeDirective>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Image blocks declared in the generated script.
    pub formats: Vec<ImageFormat>,
    pub policy: RenderPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            formats: vec![ImageFormat::Svg, ImageFormat::Png],
            policy: RenderPolicy::default(),
        }
    }
}

/// Everything a run needs, resolved once at start and shared read-only by every job.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub model: ModelConfig,
    pub partition_function: bool,
    pub gradient: Gradient,
    pub coloring_mode: ColoringMode,
    pub output_layout: OutputLayout,
    /// `None` means one worker per logical CPU.
    pub max_workers: Option<usize>,
    pub colorbar: ColorbarConfig,
    pub theme: ThemeConfig,
    pub render: RenderConfig,
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    model: Option<ModelConfig>,
    folding: FoldingParams,
    constraints: ConstraintSettings,
    partition_function: Option<bool>,
    catalog: Option<ColormapCatalog>,
    colormap: Option<String>,
    coloring_mode: Option<String>,
    output_layout: Option<String>,
    max_workers: Option<i64>,
    colorbar: Option<ColorbarConfig>,
    colorbar_formats: Option<Vec<String>>,
    theme: Option<ThemeConfig>,
    render_formats: Option<Vec<ImageFormat>>,
    render_policy: Option<String>,
    shape_file: Option<String>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: ModelConfig) -> Self {
        self.model = Some(model);
        self
    }
    pub fn partition_function(mut self, enabled: bool) -> Self {
        self.partition_function = Some(enabled);
        self
    }
    pub fn catalog(mut self, catalog: ColormapCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }
    pub fn colormap(mut self, name: impl Into<String>) -> Self {
        self.colormap = Some(name.into());
        self
    }
    pub fn coloring_mode(mut self, mode: impl Into<String>) -> Self {
        self.coloring_mode = Some(mode.into());
        self
    }
    pub fn output_layout(mut self, layout: impl Into<String>) -> Self {
        self.output_layout = Some(layout.into());
        self
    }
    pub fn max_workers(mut self, workers: i64) -> Self {
        self.max_workers = Some(workers);
        self
    }
    pub fn colorbar(mut self, colorbar: ColorbarConfig) -> Self {
        self.colorbar = Some(colorbar);
        self
    }
    /// Format names for the legend; unsupported names are dropped with a warning at build time.
    pub fn colorbar_formats(mut self, formats: Vec<String>) -> Self {
        self.colorbar_formats = Some(formats);
        self
    }
    pub fn theme(mut self, theme: ThemeConfig) -> Self {
        self.theme = Some(theme);
        self
    }
    pub fn render_formats(mut self, formats: Vec<ImageFormat>) -> Self {
        self.render_formats = Some(formats);
        self
    }
    pub fn render_policy(mut self, policy: impl Into<String>) -> Self {
        self.render_policy = Some(policy.into());
        self
    }

    /// Layers a profile over whatever has been set so far; only values present in the
    /// profile replace earlier ones.
    pub fn apply_profile(mut self, profile: &Profile) -> Self {
        self.folding = profile.folding_params.clone();
        self.constraints = profile.constraints.clone();
        if let Some(enabled) = profile.algorithms.partition_function {
            self.partition_function = Some(enabled);
        }
        if let Some(name) = profile.colormap() {
            self.colormap = Some(name.to_string());
        }
        if let Some(mode) = profile.coloring_mode() {
            self.coloring_mode = Some(mode.to_string());
        }
        if let Some(workers) = profile.performance.max_workers {
            self.max_workers = Some(workers);
        }
        if let Some(structure) = &profile.output.structure {
            self.output_layout = Some(structure.clone());
        }
        if let Some(file) = &profile.shape_reactivity.file {
            self.shape_file = Some(file.clone());
        }
        self
    }

    pub fn build(self, warnings: &mut Warnings) -> Result<PipelineConfig, ConfigError> {
        let model = match self.model {
            Some(model) => model,
            None => ModelConfig::from_profile(&self.folding, &self.constraints, warnings),
        };
        if !model.temperature.is_finite() || model.kelvin() <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "temperature",
                reason: format!("{} °C is below absolute zero", model.temperature),
            });
        }

        if let Some(file) = self.shape_file.filter(|f| !f.trim().is_empty()) {
            info!(file = %file, "SHAPE reactivity data is not used by this pipeline");
            warnings.raise(ConfigWarning::ShapeDataUnsupported { file });
        }

        let catalog = self.catalog.unwrap_or_else(ColormapCatalog::builtin);
        let requested = self
            .colormap
            .unwrap_or_else(|| DEFAULT_COLORMAP.to_string());
        let gradient = catalog.get(&requested).unwrap_or_else(|| {
            let fallback = catalog.fallback();
            warnings.raise(ConfigWarning::UnknownColormap {
                requested: requested.clone(),
                fallback: fallback.name().to_string(),
            });
            fallback
        });

        let coloring_mode = self
            .coloring_mode
            .map(|m| ColoringMode::parse_lenient(&m, warnings))
            .unwrap_or_default();
        let output_layout = self
            .output_layout
            .map(|l| OutputLayout::parse_lenient(&l, warnings))
            .unwrap_or_default();
        let policy = self
            .render_policy
            .map(|p| RenderPolicy::parse_lenient(&p, warnings))
            .unwrap_or_default();

        let mut colorbar = self.colorbar.unwrap_or_default();
        if let Some(names) = self.colorbar_formats {
            colorbar.formats = names
                .iter()
                .filter_map(|name| {
                    let format = ImageFormat::from_name(name);
                    if format.is_none() {
                        warnings.raise(ConfigWarning::UnsupportedColorbarFormat {
                            format: name.clone(),
                        });
                    }
                    format
                })
                .collect();
        }
        validate_colorbar(&colorbar)?;

        let mut render = RenderConfig {
            policy,
            ..RenderConfig::default()
        };
        if let Some(formats) = self.render_formats {
            render.formats = formats;
        }

        Ok(PipelineConfig {
            model,
            partition_function: self.partition_function.unwrap_or(true),
            gradient,
            coloring_mode,
            output_layout,
            max_workers: self
                .max_workers
                .filter(|w| *w > 0)
                .and_then(|w| usize::try_from(w).ok()),
            colorbar,
            theme: self.theme.unwrap_or_default(),
            render,
        })
    }
}

fn validate_colorbar(colorbar: &ColorbarConfig) -> Result<(), ConfigError> {
    let positive = |key: &'static str, value: f64| {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                key,
                reason: format!("expected a positive number, got {}", value),
            })
        }
    };
    positive("colorbar.width", colorbar.width)?;
    positive("colorbar.height", colorbar.height)?;
    positive("colorbar.font-size", colorbar.font_size)?;
    positive("colorbar.line-width", colorbar.line_width)?;
    if !(0.0..=1.0).contains(&colorbar.transparency) {
        return Err(ConfigError::InvalidValue {
            key: "colorbar.transparency",
            reason: format!("expected a value in [0, 1], got {}", colorbar.transparency),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(builder: PipelineConfigBuilder) -> (PipelineConfig, Warnings) {
        let mut warnings = Warnings::new();
        let config = builder.build(&mut warnings).unwrap();
        (config, warnings)
    }

    #[test]
    fn defaults_without_any_input() {
        let (config, warnings) = build(PipelineConfigBuilder::new());
        assert!(warnings.is_empty());
        assert_eq!(config.gradient.name(), "Spectral_r");
        assert_eq!(config.coloring_mode, ColoringMode::PairedOnly);
        assert_eq!(config.output_layout, OutputLayout::NestedTimestamp);
        assert_eq!(config.render.policy, RenderPolicy::BestEffort);
        assert!(config.partition_function);
        assert_eq!(config.max_workers, None);
        assert_eq!(config.colorbar.formats, vec![ImageFormat::Png]);
    }

    #[test]
    fn unknown_colormap_falls_back_to_viridis() {
        let (config, warnings) = build(PipelineConfigBuilder::new().colormap("nonexistent"));
        assert_eq!(config.gradient.name(), "viridis");
        assert!(matches!(
            warnings.iter().next(),
            Some(ConfigWarning::UnknownColormap { requested, .. }) if requested == "nonexistent"
        ));
    }

    #[test]
    fn unknown_mode_strings_fall_back_silently_to_defaults() {
        let (config, warnings) = build(
            PipelineConfigBuilder::new()
                .coloring_mode("rainbow")
                .output_layout("weekly")
                .render_policy("sometimes"),
        );
        assert_eq!(config.coloring_mode, ColoringMode::AllPi);
        assert_eq!(config.output_layout, OutputLayout::NestedTimestamp);
        assert_eq!(config.render.policy, RenderPolicy::BestEffort);
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn profile_values_override_earlier_settings() {
        let profile = Profile::from_json_str(
            r#"{
                "visualization": {"colormap": "plasma", "coloring_mode": "all_pi"},
                "performance": {"max_workers": 3},
                "output": {"structure": "flat"},
                "algorithms": {"partition_function": 0}
            }"#,
        )
        .unwrap();
        let (config, _) = build(
            PipelineConfigBuilder::new()
                .colormap("magma")
                .max_workers(8)
                .apply_profile(&profile),
        );
        assert_eq!(config.gradient.name(), "plasma");
        assert_eq!(config.coloring_mode, ColoringMode::AllPi);
        assert_eq!(config.max_workers, Some(3));
        assert_eq!(config.output_layout, OutputLayout::Flat);
        assert!(!config.partition_function);
    }

    #[test]
    fn zero_or_negative_workers_mean_auto() {
        let (config, _) = build(PipelineConfigBuilder::new().max_workers(0));
        assert_eq!(config.max_workers, None);
        let (config, _) = build(PipelineConfigBuilder::new().max_workers(-2));
        assert_eq!(config.max_workers, None);
    }

    #[test]
    fn unsupported_colorbar_formats_are_dropped_with_warning() {
        let (config, warnings) = build(PipelineConfigBuilder::new().colorbar_formats(vec![
            "svg".to_string(),
            "pdf".to_string(),
            "PNG".to_string(),
        ]));
        assert_eq!(
            config.colorbar.formats,
            vec![ImageFormat::Svg, ImageFormat::Png]
        );
        assert!(matches!(
            warnings.iter().next(),
            Some(ConfigWarning::UnsupportedColorbarFormat { format }) if format == "pdf"
        ));
    }

    #[test]
    fn shape_file_is_reported_as_unsupported() {
        let profile =
            Profile::from_json_str(r#"{"shape_reactivity": {"file": "probe.shape"}}"#).unwrap();
        let (_, warnings) = build(PipelineConfigBuilder::new().apply_profile(&profile));
        assert!(matches!(
            warnings.iter().next(),
            Some(ConfigWarning::ShapeDataUnsupported { file }) if file == "probe.shape"
        ));
    }

    #[test]
    fn invalid_colorbar_size_is_rejected() {
        let colorbar = ColorbarConfig {
            width: 0.0,
            ..Default::default()
        };
        let mut warnings = Warnings::new();
        let result = PipelineConfigBuilder::new()
            .colorbar(colorbar)
            .build(&mut warnings);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "colorbar.width", .. })
        ));
    }

    #[test]
    fn theme_parses_from_toml() {
        let theme: ThemeConfig = toml::from_str(
            r##"
            details-level = 5
            base-label-color = "#000000"
            [base-colors]
            A = "#ff0000"
            [[custom-colors]]
            type = "N"
            value = "#00ff00"
            location = [1, 4]
            [[line]]
            type = "phosphodiester_bond"
            value = 2.5
        "##,
        )
        .unwrap();
        assert_eq!(theme.details_level, Some(5));
        assert_eq!(theme.base_colors["A"], "#ff0000");
        assert_eq!(theme.custom_colors[0].location, Some([1.0, 4.0]));
        assert_eq!(theme.line[0].value, Some(DirectiveValue::Number(2.5)));
    }

    #[test]
    fn orientation_falls_back_to_horizontal() {
        let mut warnings = Warnings::new();
        assert_eq!(Orientation::parse_lenient(" Vertical ", &mut warnings), Orientation::Vertical);
        assert!(warnings.is_empty());

        assert_eq!(Orientation::parse_lenient("diagonal", &mut warnings), Orientation::Horizontal);
        assert_eq!(
            warnings.iter().next(),
            Some(&ConfigWarning::UnknownOrientation {
                requested: "diagonal".to_string()
            })
        );
    }
}
