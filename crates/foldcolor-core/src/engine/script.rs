//! Generation of the RNArtist (`.kts`) drawing script.
//!
//! Directive order inside the `theme` block is fixed: per-residue colors, custom colors, show
//! rules, hide rules, line rules, then the optional nucleotide label color. The renderer
//! applies rules in file order, so later rules override earlier ones.

use super::config::{DirectiveValue, ImageFormat, ThemeConfig, ThemeDirective};
use crate::core::color::gradient::Rgb;
use std::path::Path;

pub const DEFAULT_DETAILS_LEVEL: u32 = 4;

/// Renders a path with forward slashes, as the script syntax expects.
pub fn script_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub struct ScriptInput<'a> {
    /// Directory the renderer writes images into.
    pub output_dir: &'a Path,
    pub vienna_file: &'a Path,
    pub residues: &'a str,
    /// Mode-adjusted coloring values, one per residue.
    pub values: &'a [f64],
    pub colors: &'a [Rgb],
    pub theme: &'a ThemeConfig,
    pub formats: &'a [ImageFormat],
}

/// Builds the script text. Identical inputs always produce byte-identical output.
pub fn generate_script(input: &ScriptInput<'_>) -> String {
    let mut out = String::new();
    let output_dir = script_path(input.output_dir);

    out.push_str("rnartist {\n");
    for format in input.formats {
        out.push_str(&format!(
            "  {} {{\n    path = \"{}/\"\n  }}\n",
            format.extension(),
            output_dir
        ));
    }
    out.push_str(&format!(
        "  ss {{\n    vienna {{\n      file = \"{}\"\n    }}\n  }}\n",
        script_path(input.vienna_file)
    ));

    out.push_str("  data {\n");
    for (index, value) in input.values.iter().enumerate() {
        out.push_str(&format!("    {:.1} to {:.10}\n", (index + 1) as f64, value));
    }
    out.push_str("  }\n");

    out.push_str("  theme {\n");
    out.push_str(&format!(
        "    details {{\n      value = {}\n    }}\n",
        input.theme.details_level.unwrap_or(DEFAULT_DETAILS_LEVEL)
    ));

    for (index, (base, color)) in input.residues.chars().zip(input.colors).enumerate() {
        let position = index + 1;
        let hex = input
            .theme
            .base_colors
            .get(base.to_string().as_str())
            .cloned()
            .unwrap_or_else(|| color.to_hex());
        out.push_str(&format!(
            "    color {{\n      location {{\n        {} to {}\n      }}\n      value = \"{}\"\n    }}\n",
            position, position, hex
        ));
    }

    for (block, directives) in [
        ("color", &input.theme.custom_colors),
        ("show", &input.theme.show),
        ("hide", &input.theme.hide),
        ("line", &input.theme.line),
    ] {
        for directive in directives {
            out.push_str(&directive_block(block, directive));
        }
    }

    if let Some(label_color) = &input.theme.base_label_color {
        out.push_str(&format!(
            "    color {{\n      type = \"n\"\n      value = \"{}\"\n    }}\n",
            label_color
        ));
    }

    out.push_str("  }\n}\n");
    out
}

fn value_line(key: &str, value: &DirectiveValue) -> String {
    match value {
        DirectiveValue::Number(n) => format!("      {} = {:.1}\n", key, n),
        DirectiveValue::Text(s) => format!("      {} = \"{}\"\n", key, s),
    }
}

fn directive_block(block: &str, directive: &ThemeDirective) -> String {
    let mut out = format!("    {} {{\n", block);
    if let Some(kind) = &directive.kind {
        out.push_str(&format!("      type = \"{}\"\n", kind));
    }
    if let Some(value) = &directive.value {
        out.push_str(&value_line("value", value));
    }
    if let Some(to) = &directive.to {
        out.push_str(&value_line("to", to));
    }
    if let Some([start, end]) = directive.location {
        out.push_str(&format!(
            "      location {{\n        {:.1} to {:.1}\n      }}\n",
            start, end
        ));
    }
    out.push_str("    }\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn fixture(theme: &ThemeConfig) -> String {
        let out = PathBuf::from("/runs/a");
        let vienna = PathBuf::from("/runs/a/a_structure.vienna");
        let input = ScriptInput {
            output_dir: &out,
            vienna_file: &vienna,
            residues: "GA",
            values: &[0.9, 0.25],
            colors: &[Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)],
            theme,
            formats: &[ImageFormat::Svg, ImageFormat::Png],
        };
        generate_script(&input)
    }

    #[test]
    fn default_theme_script_matches_expected_text() {
        let expected = "rnartist {
  svg {
    path = \"/runs/a/\"
  }
  png {
    path = \"/runs/a/\"
  }
  ss {
    vienna {
      file = \"/runs/a/a_structure.vienna\"
    }
  }
  data {
    1.0 to 0.9000000000
    2.0 to 0.2500000000
  }
  theme {
    details {
      value = 4
    }
    color {
      location {
        1 to 1
      }
      value = \"#ff0000\"
    }
    color {
      location {
        2 to 2
      }
      value = \"#0000ff\"
    }
  }
}
";
        assert_eq!(fixture(&ThemeConfig::default()), expected);
    }

    #[test]
    fn generation_is_idempotent() {
        let theme = ThemeConfig {
            details_level: Some(5),
            custom_colors: vec![ThemeDirective {
                kind: Some("N".to_string()),
                value: Some(DirectiveValue::Text("#00ff00".to_string())),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(fixture(&theme), fixture(&theme));
    }

    #[test]
    fn directives_follow_fixed_order_and_grammar() {
        let theme = ThemeConfig {
            details_level: Some(2),
            base_colors: BTreeMap::from([("A".to_string(), "#123456".to_string())]),
            base_label_color: Some("#ffffff".to_string()),
            custom_colors: vec![ThemeDirective {
                kind: Some("R".to_string()),
                value: Some(DirectiveValue::Text("#abcdef".to_string())),
                to: Some(DirectiveValue::Number(3.0)),
                location: Some([1.0, 2.0]),
            }],
            show: vec![ThemeDirective {
                kind: Some("helix".to_string()),
                ..Default::default()
            }],
            hide: vec![ThemeDirective {
                location: Some([5.0, 9.0]),
                ..Default::default()
            }],
            line: vec![ThemeDirective {
                kind: Some("phosphodiester_bond".to_string()),
                value: Some(DirectiveValue::Number(2.5)),
                ..Default::default()
            }],
        };
        let text = fixture(&theme);

        assert!(text.contains("    details {\n      value = 2\n    }\n"));
        assert!(text.contains("        2 to 2\n      }\n      value = \"#123456\"\n"));
        assert!(text.contains(
            "    color {\n      type = \"R\"\n      value = \"#abcdef\"\n      to = 3.0\n      location {\n        1.0 to 2.0\n      }\n    }\n"
        ));
        assert!(text.contains("    hide {\n      location {\n        5.0 to 9.0\n      }\n    }\n"));
        assert!(text.contains("    line {\n      type = \"phosphodiester_bond\"\n      value = 2.5\n    }\n"));
        assert!(text.ends_with("    color {\n      type = \"n\"\n      value = \"#ffffff\"\n    }\n  }\n}\n"));

        let order: Vec<usize> = [
            "value = \"#ff0000\"",
            "type = \"R\"",
            "show {",
            "hide {",
            "line {",
            "type = \"n\"",
        ]
        .iter()
        .map(|needle| text.find(needle).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn windows_separators_are_normalized() {
        assert_eq!(
            script_path(Path::new(r"C:\runs\a")),
            "C:/runs/a"
        );
    }

    #[test]
    fn raw_values_outside_unit_interval_are_written_verbatim() {
        let out = PathBuf::from("/o");
        let input = ScriptInput {
            output_dir: &out,
            vienna_file: &out,
            residues: "G",
            values: &[-0.2],
            colors: &[Rgb::new(0, 0, 0)],
            theme: &ThemeConfig::default(),
            formats: &[],
        };
        assert!(generate_script(&input).contains("    1.0 to -0.2000000000\n"));
    }
}
