use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb` (case-insensitive).
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// A named color gradient defined by evenly spaced stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub(super) name: String,
    pub(super) stops: Vec<Rgb>,
}

impl Gradient {
    /// Returns `None` if `stops` is empty.
    pub fn new(name: impl Into<String>, stops: Vec<Rgb>) -> Option<Self> {
        if stops.is_empty() {
            return None;
        }
        Some(Self {
            name: name.into(),
            stops,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }

    /// The same gradient traversed end to start, named with an `_r` suffix.
    pub fn reversed(&self) -> Self {
        let mut stops = self.stops.clone();
        stops.reverse();
        Self {
            name: format!("{}_r", self.name),
            stops,
        }
    }

    /// Samples the gradient at `t`, clamping to `[0, 1]` first. NaN samples the start.
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        if self.stops.len() == 1 {
            return self.stops[0];
        }
        let position = t * (self.stops.len() - 1) as f64;
        let lower = position.floor() as usize;
        if lower >= self.stops.len() - 1 {
            return self.stops[self.stops.len() - 1];
        }
        self.stops[lower].lerp(self.stops[lower + 1], position - lower as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_to_white() -> Gradient {
        Gradient::new("bw", vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)]).unwrap()
    }

    #[test]
    fn hex_parsing_accepts_optional_hash() {
        assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("FF8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("#ff80"), None);
        assert_eq!(Rgb::from_hex("#gg8000"), None);
    }

    #[test]
    fn hex_formatting_is_lowercase() {
        assert_eq!(Rgb::new(171, 205, 239).to_hex(), "#abcdef");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "(1, 2, 3)");
    }

    #[test]
    fn sample_hits_endpoints_and_midpoint() {
        let g = black_to_white();
        assert_eq!(g.sample(0.0), Rgb::new(0, 0, 0));
        assert_eq!(g.sample(1.0), Rgb::new(255, 255, 255));
        assert_eq!(g.sample(0.5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn sample_clamps_out_of_range_values() {
        let g = black_to_white();
        assert_eq!(g.sample(1.7), g.sample(1.0));
        assert_eq!(g.sample(-0.3), g.sample(0.0));
        assert_eq!(g.sample(f64::NAN), g.sample(0.0));
    }

    #[test]
    fn reversed_swaps_ends_and_renames() {
        let g = black_to_white().reversed();
        assert_eq!(g.name(), "bw_r");
        assert_eq!(g.sample(0.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn empty_stops_are_rejected() {
        assert!(Gradient::new("none", Vec::new()).is_none());
    }
}
