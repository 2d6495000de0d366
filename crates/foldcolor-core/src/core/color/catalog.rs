use super::gradient::{Gradient, Rgb};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_COLORMAP: &str = "Spectral_r";
pub const FALLBACK_COLORMAP: &str = "viridis";

const REVERSED_SUFFIX: &str = "_r";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read colormap catalog '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse colormap catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Colormap '{name}' has an invalid stop '{stop}'")]
    InvalidStop { name: String, stop: String },
    #[error("Colormap '{name}' defines no stops")]
    EmptyGradient { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub description: String,
    pub gradient: Gradient,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Category {
    pub description: String,
    pub entries: BTreeMap<String, CatalogEntry>,
}

/// Named gradients grouped into categories.
///
/// Lookups accept any stored name, plus the same name with an `_r` suffix for the reversed
/// gradient.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColormapCatalog {
    categories: BTreeMap<String, Category>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    categories: BTreeMap<String, String>,
    #[serde(flatten)]
    groups: BTreeMap<String, BTreeMap<String, GradientDef>>,
}

#[derive(Debug, Deserialize)]
struct GradientDef {
    #[serde(default)]
    description: String,
    stops: Vec<String>,
}

impl ColormapCatalog {
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (category, description, gradients) in BUILTIN {
            for (name, entry_description, stops) in *gradients {
                let stops = stops.iter().filter_map(|s| Rgb::from_hex(s)).collect();
                if let Some(gradient) = Gradient::new(*name, stops) {
                    catalog.insert(category, description, *name, entry_description, gradient);
                }
            }
        }
        catalog
    }

    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        let mut catalog = Self::default();

        for (category, gradients) in file.groups {
            let description = file.categories.get(&category).cloned().unwrap_or_default();
            for (name, def) in gradients {
                let stops = def
                    .stops
                    .iter()
                    .map(|s| {
                        Rgb::from_hex(s).ok_or_else(|| CatalogError::InvalidStop {
                            name: name.clone(),
                            stop: s.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let gradient = Gradient::new(name.clone(), stops)
                    .ok_or_else(|| CatalogError::EmptyGradient { name: name.clone() })?;
                catalog.insert(&category, &description, &name, &def.description, gradient);
            }
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    /// Adds every entry of `other`, replacing entries with the same category and name.
    pub fn merge(&mut self, other: ColormapCatalog) {
        for (category_name, category) in other.categories {
            let target = self.categories.entry(category_name).or_default();
            if !category.description.is_empty() {
                target.description = category.description;
            }
            target.entries.extend(category.entries);
        }
    }

    fn insert(
        &mut self,
        category: &str,
        category_description: &str,
        name: &str,
        description: &str,
        gradient: Gradient,
    ) {
        let target = self.categories.entry(category.to_string()).or_default();
        if target.description.is_empty() {
            target.description = category_description.to_string();
        }
        target.entries.insert(
            name.to_string(),
            CatalogEntry {
                description: description.to_string(),
                gradient,
            },
        );
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    fn find(&self, name: &str) -> Option<&Gradient> {
        self.categories
            .values()
            .find_map(|c| c.entries.get(name))
            .map(|e| &e.gradient)
    }

    /// Resolves `name`, or its base name reversed when it ends in `_r`.
    pub fn get(&self, name: &str) -> Option<Gradient> {
        if let Some(gradient) = self.find(name) {
            return Some(gradient.clone());
        }
        name.strip_suffix(REVERSED_SUFFIX)
            .and_then(|base| self.find(base))
            .map(Gradient::reversed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(|c| c.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The gradient used when a requested name is not in the catalog.
    pub fn fallback(&self) -> Gradient {
        self.get(FALLBACK_COLORMAP).unwrap_or_else(builtin_viridis)
    }
}

fn builtin_viridis() -> Gradient {
    Gradient {
        name: FALLBACK_COLORMAP.to_string(),
        stops: VIRIDIS.iter().filter_map(|s| Rgb::from_hex(s)).collect(),
    }
}

type BuiltinGradient = (&'static str, &'static str, &'static [&'static str]);

const VIRIDIS: &[&str] = &[
    "440154", "482878", "3e4989", "31688e", "26828e", "1f9e89", "35b779", "6ece58", "b5de2b",
    "fde725",
];

const BUILTIN: &[(&str, &str, &[BuiltinGradient])] = &[
    (
        "perceptual",
        "Perceptually uniform sequential colormaps",
        &[
            ("viridis", "Blue through green to yellow", VIRIDIS),
            (
                "plasma",
                "Blue through purple to yellow",
                &[
                    "0d0887", "46039f", "7201a8", "9c179e", "bd3786", "d8576b", "ed7953",
                    "fb9f3a", "fdca26", "f0f921",
                ],
            ),
            (
                "inferno",
                "Black through red to pale yellow",
                &[
                    "000004", "1b0c41", "4a0c6b", "781c6d", "a52c60", "cf4446", "ed6925",
                    "fb9b06", "f7d13d", "fcffa4",
                ],
            ),
            (
                "magma",
                "Black through purple to cream",
                &[
                    "000004", "180f3d", "440f76", "721f81", "9e2f7f", "cd4071", "f1605d",
                    "fd9668", "feca8d", "fcfdbf",
                ],
            ),
            (
                "cividis",
                "Blue to yellow, color-vision-deficiency friendly",
                &[
                    "00224e", "123570", "3b496c", "575d6d", "707173", "8a8678", "a59c74",
                    "c3b369", "e1cc55", "fee838",
                ],
            ),
        ],
    ),
    (
        "diverging",
        "Diverging colormaps with a neutral midpoint",
        &[
            (
                "Spectral",
                "Red through yellow to blue",
                &[
                    "9e0142", "d53e4f", "f46d43", "fdae61", "fee08b", "ffffbf", "e6f598",
                    "abdda4", "66c2a5", "3288bd", "5e4fa2",
                ],
            ),
            (
                "RdBu",
                "Red to white to blue",
                &[
                    "67001f", "b2182b", "d6604d", "f4a582", "fddbc7", "f7f7f7", "d1e5f0",
                    "92c5de", "4393c3", "2166ac", "053061",
                ],
            ),
            (
                "coolwarm",
                "Cool blue to warm red",
                &[
                    "3b4cc0", "6788ee", "9abbff", "c9d7f0", "edd1c2", "f7a889", "e26952",
                    "b40426",
                ],
            ),
            (
                "seismic",
                "Dark blue through white to dark red",
                &["00004c", "0000ff", "ffffff", "ff0000", "800000"],
            ),
        ],
    ),
    (
        "sequential",
        "Single-hue sequential colormaps",
        &[
            (
                "Greys",
                "White to black",
                &[
                    "ffffff", "f0f0f0", "d9d9d9", "bdbdbd", "969696", "737373", "525252",
                    "252525", "000000",
                ],
            ),
            (
                "Blues",
                "White to dark blue",
                &[
                    "f7fbff", "deebf7", "c6dbef", "9ecae1", "6baed6", "4292c6", "2171b5",
                    "08519c", "08306b",
                ],
            ),
            (
                "Reds",
                "White to dark red",
                &[
                    "fff5f0", "fee0d2", "fcbba1", "fc9272", "fb6a4a", "ef3b2c", "cb181d",
                    "a50f15", "67000d",
                ],
            ),
            (
                "YlOrRd",
                "Yellow through orange to red",
                &[
                    "ffffcc", "ffeda0", "fed976", "feb24c", "fd8d3c", "fc4e2a", "e31a1c",
                    "bd0026", "800026",
                ],
            ),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_three_categories() {
        let catalog = ColormapCatalog::builtin();
        let names: Vec<_> = catalog.categories().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["diverging", "perceptual", "sequential"]);
        assert_eq!(catalog.len(), 13);
    }

    #[test]
    fn default_colormap_resolves_as_reversed_spectral() {
        let catalog = ColormapCatalog::builtin();
        let gradient = catalog.get(DEFAULT_COLORMAP).unwrap();
        assert_eq!(gradient.name(), "Spectral_r");
        assert_eq!(gradient.sample(0.0), Rgb::from_hex("5e4fa2").unwrap());
        assert_eq!(gradient.sample(1.0), Rgb::from_hex("9e0142").unwrap());
    }

    #[test]
    fn unknown_name_is_absent_and_fallback_is_viridis() {
        let catalog = ColormapCatalog::builtin();
        assert!(catalog.get("not_a_map").is_none());
        assert!(catalog.get("not_a_map_r").is_none());
        assert_eq!(catalog.fallback().name(), FALLBACK_COLORMAP);
    }

    #[test]
    fn toml_catalog_parses_categories_and_stops() {
        let text = r##"
            [categories]
            custom = "House colormaps"

            [custom.ocean]
            description = "Black to blue"
            stops = ["#000000", "#0000ff"]
        "##;
        let catalog = ColormapCatalog::from_toml_str(text).unwrap();
        let category = catalog.category("custom").unwrap();
        assert_eq!(category.description, "House colormaps");
        assert_eq!(category.entries["ocean"].description, "Black to blue");
        assert_eq!(
            catalog.get("ocean_r").unwrap().sample(0.0),
            Rgb::new(0, 0, 255)
        );
    }

    #[test]
    fn toml_catalog_rejects_bad_stops() {
        let text = r##"
            [custom.broken]
            stops = ["#00000"]
        "##;
        assert!(matches!(
            ColormapCatalog::from_toml_str(text),
            Err(CatalogError::InvalidStop { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn merge_overrides_entries_with_same_name() {
        let mut catalog = ColormapCatalog::builtin();
        let extra = ColormapCatalog::from_toml_str(
            r##"
            [perceptual.viridis]
            stops = ["#ffffff"]
        "##,
        )
        .unwrap();
        catalog.merge(extra);
        assert_eq!(catalog.len(), 13);
        assert_eq!(
            catalog.get("viridis").unwrap().sample(0.3),
            Rgb::new(255, 255, 255)
        );
        assert_eq!(
            catalog.category("perceptual").unwrap().description,
            "Perceptually uniform sequential colormaps"
        );
    }
}
