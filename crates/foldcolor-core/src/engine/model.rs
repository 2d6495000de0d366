use super::profile::{ConstraintSettings, FoldingParams};
use super::warning::{ConfigWarning, Warnings};

pub const DEFAULT_TEMPERATURE: f64 = 37.0;

/// How dangling-end energies are treated at helix ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingMode {
    Ignore,
    Single,
    #[default]
    Double,
    Coaxial,
}

impl DanglingMode {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Self::Ignore),
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Coaxial),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Ignore => 0,
            Self::Single => 1,
            Self::Double => 2,
            Self::Coaxial => 3,
        }
    }
}

/// The thermodynamic parameter table the folding backend should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterTable {
    #[default]
    Turner2004,
    Turner1999,
    Andronescu2007,
    DnaMathews2004,
}

impl ParameterTable {
    /// Matches profile names case-insensitively; both spellings of the DNA table are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "turner2004" | "rna_turner2004" => Some(Self::Turner2004),
            "turner1999" | "rna_turner1999" => Some(Self::Turner1999),
            "andronescu2007" | "rna_andronescu2007" => Some(Self::Andronescu2007),
            "dna_matthews2004" | "dna_mathews2004" => Some(Self::DnaMathews2004),
            _ => None,
        }
    }

    /// The parameter file to load, or `None` for the backend's built-in default table.
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            Self::Turner2004 => None,
            Self::Turner1999 => Some("rna_turner1999.par"),
            Self::Andronescu2007 => Some("rna_andronescu2007.par"),
            Self::DnaMathews2004 => Some("dna_mathews2004.par"),
        }
    }
}

/// Explicit parameter set handed to the folding backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub temperature: f64,
    pub dangling_mode: DanglingMode,
    pub avoid_isolated_pairs: bool,
    pub disallow_gu: bool,
    pub disallow_closing_gu: bool,
    pub g_quadruplex: bool,
    pub circular: bool,
    pub max_span: Option<u32>,
    pub parameter_table: ParameterTable,
    pub salt_molar: Option<f64>,
    pub constraint: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            dangling_mode: DanglingMode::default(),
            avoid_isolated_pairs: true,
            disallow_gu: false,
            disallow_closing_gu: false,
            g_quadruplex: false,
            circular: false,
            max_span: None,
            parameter_table: ParameterTable::default(),
            salt_molar: None,
            constraint: None,
        }
    }
}

impl ModelConfig {
    /// Translates profile sections into a model, filling every absent field with its default.
    ///
    /// Unknown parameter tables and out-of-range dangling modes fall back to the defaults with
    /// a warning. A constraint is only kept when `enforce` is true (the default) and the
    /// string is non-empty; its length is checked later by [`ModelConfig::fitted_to`].
    pub fn from_profile(
        params: &FoldingParams,
        constraints: &ConstraintSettings,
        warnings: &mut Warnings,
    ) -> Self {
        let defaults = Self::default();

        let dangling_mode = match params.dangles {
            None => defaults.dangling_mode,
            Some(level) => DanglingMode::from_level(level).unwrap_or_else(|| {
                warnings.raise(ConfigWarning::DanglingModeOutOfRange { requested: level });
                defaults.dangling_mode
            }),
        };

        let parameter_table = match params.param_set.as_deref() {
            None => defaults.parameter_table,
            Some(name) => ParameterTable::from_name(name).unwrap_or_else(|| {
                warnings.raise(ConfigWarning::UnknownParameterTable {
                    requested: name.to_string(),
                });
                defaults.parameter_table
            }),
        };

        let constraint = if constraints.enforce.unwrap_or(true) {
            constraints
                .string
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        Self {
            temperature: params.temperature.unwrap_or(defaults.temperature),
            dangling_mode,
            avoid_isolated_pairs: params.no_lp.unwrap_or(defaults.avoid_isolated_pairs),
            disallow_gu: params.no_gu.unwrap_or(false),
            disallow_closing_gu: params.no_closing_gu.unwrap_or(false),
            g_quadruplex: params.gquad.unwrap_or(false),
            circular: params.circ.unwrap_or(false),
            max_span: params
                .max_bp_span
                .filter(|span| *span > 0)
                .and_then(|span| u32::try_from(span).ok()),
            parameter_table,
            salt_molar: params.salt,
            constraint,
        }
    }

    /// Returns the model to use for one sequence, dropping a constraint whose length differs
    /// from the sequence length.
    pub fn fitted_to(&self, sequence: &str, sequence_len: usize, warnings: &mut Warnings) -> Self {
        let mut model = self.clone();
        if let Some(constraint) = &self.constraint {
            let constraint_len = constraint.chars().count();
            if constraint_len != sequence_len {
                warnings.raise(ConfigWarning::ConstraintLengthMismatch {
                    sequence: sequence.to_string(),
                    constraint_len,
                    sequence_len,
                });
                model.constraint = None;
            }
        }
        model
    }

    pub fn kelvin(&self) -> f64 {
        self.temperature + 273.15
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(params: FoldingParams, constraints: ConstraintSettings) -> (ModelConfig, Warnings) {
        let mut warnings = Warnings::new();
        let model = ModelConfig::from_profile(&params, &constraints, &mut warnings);
        (model, warnings)
    }

    #[test]
    fn empty_profile_yields_documented_defaults() {
        let (model, warnings) = build(FoldingParams::default(), ConstraintSettings::default());
        assert_eq!(model, ModelConfig::default());
        assert_eq!(model.temperature, 37.0);
        assert_eq!(model.dangling_mode.level(), 2);
        assert!(model.avoid_isolated_pairs);
        assert!(!model.disallow_gu && !model.g_quadruplex && !model.circular);
        assert_eq!(model.parameter_table, ParameterTable::Turner2004);
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_table_and_bad_dangles_fall_back_with_warnings() {
        let params = FoldingParams {
            dangles: Some(5),
            param_set: Some("turner2099".to_string()),
            ..Default::default()
        };
        let (model, warnings) = build(params, ConstraintSettings::default());
        assert_eq!(model.dangling_mode, DanglingMode::Double);
        assert_eq!(model.parameter_table, ParameterTable::Turner2004);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn both_dna_table_spellings_are_recognized() {
        assert_eq!(
            ParameterTable::from_name("dna_matthews2004"),
            Some(ParameterTable::DnaMathews2004)
        );
        assert_eq!(
            ParameterTable::from_name("DNA_Mathews2004"),
            Some(ParameterTable::DnaMathews2004)
        );
        assert_eq!(ParameterTable::Turner2004.file_name(), None);
        assert_eq!(
            ParameterTable::Andronescu2007.file_name(),
            Some("rna_andronescu2007.par")
        );
    }

    #[test]
    fn non_positive_span_means_unlimited() {
        let params = FoldingParams {
            max_bp_span: Some(-1),
            ..Default::default()
        };
        assert_eq!(build(params, ConstraintSettings::default()).0.max_span, None);

        let params = FoldingParams {
            max_bp_span: Some(150),
            ..Default::default()
        };
        assert_eq!(build(params, ConstraintSettings::default()).0.max_span, Some(150));
    }

    #[test]
    fn constraint_dropped_when_not_enforced() {
        let constraints = ConstraintSettings {
            enforce: Some(false),
            string: Some("((..))".to_string()),
        };
        let (model, _) = build(FoldingParams::default(), constraints);
        assert_eq!(model.constraint, None);
    }

    #[test]
    fn mismatched_constraint_is_discarded_with_warning() {
        let constraints = ConstraintSettings {
            enforce: None,
            string: Some("((..))".to_string()),
        };
        let (model, _) = build(FoldingParams::default(), constraints);
        assert_eq!(model.constraint.as_deref(), Some("((..))"));

        let mut warnings = Warnings::new();
        let fitted = model.fitted_to("a", 8, &mut warnings);
        assert_eq!(fitted.constraint, None);
        assert!(matches!(
            warnings.iter().next(),
            Some(ConfigWarning::ConstraintLengthMismatch {
                constraint_len: 6,
                sequence_len: 8,
                ..
            })
        ));

        let mut warnings = Warnings::new();
        let fitted = model.fitted_to("b", 6, &mut warnings);
        assert_eq!(fitted.constraint.as_deref(), Some("((..))"));
        assert!(warnings.is_empty());
    }
}
