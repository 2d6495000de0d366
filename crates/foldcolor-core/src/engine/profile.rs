//! The JSON run profile produced by front ends.
//!
//! Every section and field is optional; absent values fall back to the documented defaults when
//! the profile is turned into a [`PipelineConfig`](super::config::PipelineConfig).

use super::warning::{ConfigWarning, Warnings};
use serde::{Deserialize, Deserializer};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub folding_params: FoldingParams,
    pub constraints: ConstraintSettings,
    pub algorithms: AlgorithmSettings,
    pub visualization: VisualizationSettings,
    /// Top-level alias of `visualization.colormap`.
    pub colormap: Option<String>,
    /// Top-level alias of `visualization.coloring_mode`.
    pub coloring_mode: Option<String>,
    pub performance: PerformanceSettings,
    pub output: OutputSettings,
    pub shape_reactivity: ShapeSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FoldingParams {
    pub temperature: Option<f64>,
    pub dangles: Option<i64>,
    #[serde(rename = "noLP", deserialize_with = "flag")]
    pub no_lp: Option<bool>,
    #[serde(rename = "noGU", deserialize_with = "flag")]
    pub no_gu: Option<bool>,
    #[serde(rename = "noClosingGU", deserialize_with = "flag")]
    pub no_closing_gu: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub gquad: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub circ: Option<bool>,
    pub max_bp_span: Option<i64>,
    pub param_set: Option<String>,
    pub salt: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConstraintSettings {
    pub enforce: Option<bool>,
    pub string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlgorithmSettings {
    #[serde(deserialize_with = "flag")]
    pub partition_function: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub mfe: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisualizationSettings {
    pub colormap: Option<String>,
    pub coloring_mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    pub max_workers: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub structure: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShapeSettings {
    pub file: Option<String>,
}

/// Accepts `true`/`false` as well as integer flags (`0` is false, anything else true).
fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    }))
}

impl Profile {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Loads a profile, degrading to the default profile with a warning when the file is
    /// missing or malformed.
    pub fn load_or_default(path: &Path, warnings: &mut Warnings) -> Self {
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| Self::from_json_str(&text).map_err(|e| e.to_string()));
        match loaded {
            Ok(profile) => profile,
            Err(reason) => {
                warnings.raise(ConfigWarning::ProfileUnreadable {
                    path: path.to_path_buf(),
                    reason,
                });
                Self::default()
            }
        }
    }

    pub fn colormap(&self) -> Option<&str> {
        self.visualization
            .colormap
            .as_deref()
            .or(self.colormap.as_deref())
    }

    pub fn coloring_mode(&self) -> Option<&str> {
        self.visualization
            .coloring_mode
            .as_deref()
            .or(self.coloring_mode.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn empty_object_is_default_profile() {
        assert_eq!(Profile::from_json_str("{}").unwrap(), Profile::default());
    }

    #[test]
    fn flags_accept_bools_and_integers() {
        let profile = Profile::from_json_str(
            r#"{"folding_params": {"noLP": 0, "noGU": true, "gquad": 1, "circ": false}}"#,
        )
        .unwrap();
        let params = &profile.folding_params;
        assert_eq!(params.no_lp, Some(false));
        assert_eq!(params.no_gu, Some(true));
        assert_eq!(params.gquad, Some(true));
        assert_eq!(params.circ, Some(false));
        assert_eq!(params.no_closing_gu, None);
    }

    #[test]
    fn parses_full_profile() {
        let text = r#"{
            "folding_params": {"temperature": 25, "dangles": 0, "param_set": "turner1999", "salt": 1.021},
            "constraints": {"enforce": true, "string": "((....))"},
            "algorithms": {"partition_function": false},
            "visualization": {"colormap": "plasma", "coloring_mode": "all_pi"},
            "performance": {"max_workers": 0},
            "output": {"structure": "flat"},
            "shape_reactivity": {"file": "shape.dat"}
        }"#;
        let profile = Profile::from_json_str(text).unwrap();
        assert_eq!(profile.folding_params.temperature, Some(25.0));
        assert_eq!(profile.folding_params.dangles, Some(0));
        assert_eq!(profile.constraints.string.as_deref(), Some("((....))"));
        assert_eq!(profile.algorithms.partition_function, Some(false));
        assert_eq!(profile.colormap(), Some("plasma"));
        assert_eq!(profile.coloring_mode(), Some("all_pi"));
        assert_eq!(profile.performance.max_workers, Some(0));
        assert_eq!(profile.output.structure.as_deref(), Some("flat"));
        assert_eq!(profile.shape_reactivity.file.as_deref(), Some("shape.dat"));
    }

    #[test]
    fn visualization_section_wins_over_top_level_alias() {
        let profile = Profile::from_json_str(
            r#"{"colormap": "magma", "visualization": {"colormap": "plasma"}, "coloring_mode": "all_pi"}"#,
        )
        .unwrap();
        assert_eq!(profile.colormap(), Some("plasma"));
        assert_eq!(profile.coloring_mode(), Some("all_pi"));
    }

    #[test]
    fn missing_profile_warns_and_defaults() {
        let dir = tempdir().unwrap();
        let mut warnings = Warnings::new();
        let profile = Profile::load_or_default(&dir.path().join("nope.json"), &mut warnings);
        assert_eq!(profile, Profile::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn malformed_profile_warns_and_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let mut warnings = Warnings::new();
        let profile = Profile::load_or_default(&path, &mut warnings);
        assert_eq!(profile, Profile::default());
        assert!(matches!(
            warnings.iter().next(),
            Some(ConfigWarning::ProfileUnreadable { .. })
        ));
    }
}
