//! Score color scale.
//!
//! Scores run from 0 to 100 and are mapped through a three-stop linear RGB
//! scale: red, amber, green.

use std::fmt;

/// Fill for places without a usable score.
pub const NEUTRAL: Rgb = Rgb::new(0xf5, 0xf5, 0xf5);
/// Place outlines.
pub const OUTLINE: Rgb = Rgb::new(0x2d, 0x2d, 0x2d);

pub const SCORE_STOPS: [Rgb; 3] = [
    Rgb::new(0xff, 0x00, 0x00),
    Rgb::new(0xed, 0xcf, 0x3b),
    Rgb::new(0x7a, 0xb8, 0x00),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Evenly spaced color stops over a numeric domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    stops: Vec<Rgb>,
    min: f64,
    max: f64,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new(SCORE_STOPS.to_vec(), 0.0, 100.0)
    }
}

impl ColorScale {
    pub fn new(stops: Vec<Rgb>, min: f64, max: f64) -> Self {
        Self { stops, min, max }
    }

    /// Color at `value`; values outside the domain clamp to the end stops.
    pub fn color_at(&self, value: f64) -> Rgb {
        match self.stops.as_slice() {
            [] => NEUTRAL,
            [only] => *only,
            stops => {
                let span = self.max - self.min;
                let t = if span > 0.0 {
                    ((value - self.min) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let segments = (stops.len() - 1) as f64;
                let pos = t * segments;
                let index = (pos.floor() as usize).min(stops.len() - 2);
                stops[index].lerp(stops[index + 1], pos - index as f64)
            }
        }
    }

    /// Scale color for a raw score, or [`NEUTRAL`] when it does not parse.
    pub fn color_for_score(&self, raw: Option<&str>) -> Rgb {
        raw.and_then(parse_score)
            .map(|score| self.color_at(score as f64))
            .unwrap_or(NEUTRAL)
    }
}

/// Leading base-10 integer of `raw`, the way `parseInt(raw, 10)` reads it:
/// `"72"`, `" 72"` and `"72.9"` are all 72, `"n/a"` is `None`.
pub fn parse_score(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Only overflow can fail here; saturate the way a huge parseInt clamps.
    let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_at(0.0).hex(), "#ff0000");
        assert_eq!(scale.color_at(50.0).hex(), "#edcf3b");
        assert_eq!(scale.color_at(100.0).hex(), "#7ab800");
    }

    #[test]
    fn test_interpolates_between_stops() {
        let scale = ColorScale::default();
        // 72 is 44% of the way from amber to green.
        assert_eq!(scale.color_at(72.0), Rgb::new(186, 197, 33));
    }

    #[test]
    fn test_clamps_outside_domain() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_at(-20.0), SCORE_STOPS[0]);
        assert_eq!(scale.color_at(140.0), SCORE_STOPS[2]);
    }

    #[test]
    fn test_missing_or_bad_score_is_neutral() {
        let scale = ColorScale::default();
        assert_eq!(scale.color_for_score(None), NEUTRAL);
        assert_eq!(scale.color_for_score(Some("n/a")), NEUTRAL);
        assert_eq!(scale.color_for_score(Some("")), NEUTRAL);
        assert_eq!(NEUTRAL.hex(), "#f5f5f5");
    }

    #[test]
    fn test_parse_score_like_parse_int() {
        assert_eq!(parse_score("72"), Some(72));
        assert_eq!(parse_score("  40"), Some(40));
        assert_eq!(parse_score("72.9"), Some(72));
        assert_eq!(parse_score("55abc"), Some(55));
        assert_eq!(parse_score("-3"), Some(-3));
        assert_eq!(parse_score("abc"), None);
        assert_eq!(parse_score("-"), None);
    }

    #[test]
    fn test_overflowing_score_saturates() {
        assert_eq!(parse_score("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_score("-99999999999999999999"), Some(-i64::MAX));
        let scale = ColorScale::default();
        assert_eq!(
            scale.color_for_score(Some("99999999999999999999")).hex(),
            "#7ab800"
        );
    }

    #[test]
    fn test_single_stop_scale() {
        let scale = ColorScale::new(vec![OUTLINE], 0.0, 1.0);
        assert_eq!(scale.color_at(0.7), OUTLINE);
    }
}
