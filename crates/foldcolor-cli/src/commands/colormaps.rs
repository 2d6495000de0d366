use crate::cli::ColormapsArgs;
use crate::config::FileConfig;
use crate::error::{CliError, Result};
use foldcolor::core::color::catalog::{ColormapCatalog, DEFAULT_COLORMAP};

pub fn run(args: ColormapsArgs, file_config: &FileConfig) -> Result<()> {
    let catalog = file_config.catalog()?;
    let listing = match args.category.as_deref() {
        Some(name) => list_category(&catalog, name)?,
        None => list_categories(&catalog),
    };
    print!("{}", listing);
    Ok(())
}

fn list_categories(catalog: &ColormapCatalog) -> String {
    let mut out = String::from("Available colormap categories:\n");
    for (name, category) in catalog.categories() {
        out.push_str(&format!(
            "  {:<16} {:>3} colormaps  {}\n",
            name,
            category.entries.len(),
            category.description
        ));
    }
    out.push_str(&format!(
        "\nEvery colormap is also available reversed with an `_r` suffix. Default: {}\n",
        DEFAULT_COLORMAP
    ));
    out
}

fn list_category(catalog: &ColormapCatalog, name: &str) -> Result<String> {
    let category = catalog.category(name).ok_or_else(|| {
        let known: Vec<_> = catalog.categories().map(|(name, _)| name).collect();
        CliError::Argument(format!(
            "Unknown colormap category '{}'. Available: {}",
            name,
            known.join(", ")
        ))
    })?;

    let mut out = format!("{} - {}\n", name, category.description);
    for (entry_name, entry) in &category.entries {
        out.push_str(&format!("  {:<16} {}\n", entry_name, entry.description));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_lists_every_builtin_category() {
        let listing = list_categories(&ColormapCatalog::builtin());
        for category in ["perceptual", "diverging", "sequential"] {
            assert!(listing.contains(category), "missing {}", category);
        }
        assert!(listing.contains("Default: Spectral_r"));
    }

    #[test]
    fn category_listing_shows_its_colormaps() {
        let listing = list_category(&ColormapCatalog::builtin(), "perceptual").unwrap();
        assert!(listing.starts_with("perceptual - "));
        assert!(listing.contains("viridis"));
        assert!(!listing.contains("Spectral"));
    }

    #[test]
    fn unknown_category_is_an_argument_error() {
        let err = list_category(&ColormapCatalog::builtin(), "pastel").unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
        assert!(err.to_string().contains("diverging"));
    }
}
