//! Named colormaps, looked up as `name` or `package/name`.
//!
//! Packages are searched in order `matplotlib`, then `cmocean`. A `_r`
//! suffix reverses a map.

use limno_data::error::{LimnoError, Result};
use plotters::style::RGBColor;

type Stops = &'static [(u8, u8, u8)];

const MATPLOTLIB: &[(&str, Stops)] = &[
    (
        "jet",
        &[
            (0, 0, 127),
            (0, 0, 255),
            (0, 127, 255),
            (0, 255, 255),
            (127, 255, 127),
            (255, 255, 0),
            (255, 127, 0),
            (255, 0, 0),
            (127, 0, 0),
        ],
    ),
    (
        "viridis",
        &[
            (68, 1, 84),
            (72, 40, 120),
            (62, 74, 137),
            (49, 104, 142),
            (38, 130, 142),
            (31, 158, 137),
            (53, 183, 121),
            (109, 205, 89),
            (180, 222, 44),
            (253, 231, 37),
        ],
    ),
    (
        "plasma",
        &[
            (13, 8, 135),
            (84, 2, 163),
            (139, 10, 165),
            (185, 50, 137),
            (219, 92, 104),
            (244, 136, 73),
            (254, 188, 43),
            (240, 249, 33),
        ],
    ),
    (
        "coolwarm",
        &[
            (59, 76, 192),
            (98, 130, 234),
            (141, 176, 254),
            (184, 208, 249),
            (221, 221, 221),
            (245, 196, 173),
            (244, 154, 123),
            (222, 96, 77),
            (180, 4, 38),
        ],
    ),
    (
        "Spectral",
        &[
            (158, 1, 66),
            (213, 62, 79),
            (244, 109, 67),
            (253, 174, 97),
            (254, 224, 139),
            (255, 255, 191),
            (230, 245, 152),
            (171, 221, 164),
            (102, 194, 165),
            (50, 136, 189),
            (94, 79, 162),
        ],
    ),
    (
        "RdBu",
        &[
            (103, 0, 31),
            (178, 24, 43),
            (214, 96, 77),
            (244, 165, 130),
            (253, 219, 199),
            (247, 247, 247),
            (209, 229, 240),
            (146, 197, 222),
            (67, 147, 195),
            (33, 102, 172),
            (5, 48, 97),
        ],
    ),
    ("gray", &[(0, 0, 0), (255, 255, 255)]),
];

const CMOCEAN: &[(&str, Stops)] = &[
    (
        "thermal",
        &[
            (4, 35, 51),
            (23, 51, 122),
            (85, 59, 157),
            (129, 79, 143),
            (175, 95, 130),
            (222, 112, 101),
            (249, 146, 66),
            (249, 196, 65),
            (232, 250, 91),
        ],
    ),
    (
        "haline",
        &[
            (42, 24, 108),
            (33, 50, 162),
            (15, 90, 145),
            (40, 118, 137),
            (59, 146, 135),
            (79, 175, 126),
            (120, 203, 104),
            (193, 221, 100),
            (253, 239, 154),
        ],
    ),
    (
        "ice",
        &[
            (4, 6, 19),
            (29, 28, 57),
            (50, 48, 100),
            (61, 72, 144),
            (61, 103, 173),
            (69, 136, 188),
            (96, 168, 201),
            (143, 199, 214),
            (195, 228, 232),
            (234, 253, 253),
        ],
    ),
    (
        "deep",
        &[
            (253, 254, 204),
            (171, 222, 166),
            (102, 190, 164),
            (64, 150, 163),
            (58, 108, 154),
            (64, 67, 135),
            (52, 40, 88),
            (40, 26, 44),
        ],
    ),
    (
        "balance",
        &[
            (24, 28, 67),
            (37, 74, 186),
            (61, 138, 204),
            (166, 186, 214),
            (241, 236, 235),
            (221, 163, 143),
            (192, 85, 62),
            (150, 26, 43),
            (60, 9, 18),
        ],
    ),
    (
        "dense",
        &[
            (230, 241, 241),
            (169, 210, 224),
            (128, 175, 228),
            (123, 131, 229),
            (128, 85, 205),
            (120, 46, 160),
            (98, 22, 107),
            (54, 14, 54),
        ],
    ),
];

/// Packages in search order.
const PACKAGES: &[(&str, &[(&str, Stops)])] = &[("matplotlib", MATPLOTLIB), ("cmocean", CMOCEAN)];

fn package_table(package: &str) -> Option<&'static [(&'static str, Stops)]> {
    match package {
        "matplotlib" | "matplotlib.cm" => Some(MATPLOTLIB),
        "cmocean" | "cmocean.cm" => Some(CMOCEAN),
        _ => None,
    }
}

/// A linear segmented colormap with evenly spaced stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<RGBColor>,
}

impl Colormap {
    fn from_stops(name: &str, stops: Stops) -> Self {
        Colormap {
            name: name.to_string(),
            stops: stops.iter().map(|(r, g, b)| RGBColor(*r, *g, *b)).collect(),
        }
    }

    pub fn reversed(&self) -> Self {
        Colormap {
            name: format!("{}_r", self.name),
            stops: self.stops.iter().rev().copied().collect(),
        }
    }

    /// Colour at `t` in `[0, 1]`; values outside are clamped.
    pub fn color_at(&self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = self.stops.len().saturating_sub(1);
        if segments == 0 {
            return self.stops.first().copied().unwrap_or(RGBColor(0, 0, 0));
        }
        let position = t * segments as f64;
        let lower = (position.floor() as usize).min(segments - 1);
        let frac = position - lower as f64;
        let (RGBColor(r0, g0, b0), RGBColor(r1, g1, b1)) = (self.stops[lower], self.stops[lower + 1]);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
        RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }

    /// Colour for `value` scaled into `(vmin, vmax)`.
    pub fn color_for(&self, value: f64, vmin: f64, vmax: f64) -> RGBColor {
        let span = vmax - vmin;
        let t = if span > 0.0 { (value - vmin) / span } else { 0.5 };
        self.color_at(t)
    }
}

fn find(table: &[(&str, Stops)], name: &str) -> Option<Colormap> {
    if let Some((found, stops)) = table.iter().find(|(n, _)| *n == name) {
        return Some(Colormap::from_stops(found, stops));
    }
    let base = name.strip_suffix("_r")?;
    table
        .iter()
        .find(|(n, _)| *n == base)
        .map(|(found, stops)| Colormap::from_stops(found, stops).reversed())
}

/// Look up `spec` (`name`, `package/name` or `/name`).
pub fn get_colormap(spec: &str) -> Result<Colormap> {
    let (package, name) = spec.split_once('/').unwrap_or(("", spec));
    let found = if package.is_empty() {
        PACKAGES.iter().find_map(|(_, table)| find(table, name))
    } else {
        let table = package_table(package).ok_or_else(|| LimnoError::UnrecognizedKind {
            what: "colormap package",
            value: package.to_string(),
        })?;
        find(table, name)
    };
    found.ok_or_else(|| LimnoError::ColormapNotFound(spec.to_string()))
}

/// Every registered map as `package/name`.
pub fn available_colormaps() -> Vec<String> {
    PACKAGES
        .iter()
        .flat_map(|(package, table)| table.iter().map(move |(name, _)| format!("{}/{}", package, name)))
        .collect()
}

/// Parse `#rrggbb`.
pub fn parse_hex_color(spec: &str) -> Result<RGBColor> {
    let invalid = || LimnoError::UnrecognizedKind {
        what: "colour (expected #rrggbb)",
        value: spec.to_string(),
    };
    let hex = spec.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_forms() {
        assert_eq!(get_colormap("jet").unwrap().name, "jet");
        assert_eq!(get_colormap("cmocean/thermal").unwrap().name, "thermal");
        assert_eq!(get_colormap("ice").unwrap().name, "ice");
        assert_eq!(get_colormap("/Spectral_r").unwrap().name, "Spectral_r");
    }

    #[test]
    fn test_unknown_names() {
        assert!(matches!(get_colormap("nope"), Err(LimnoError::ColormapNotFound(_))));
        assert!(matches!(get_colormap("matplotlib/thermal"), Err(LimnoError::ColormapNotFound(_))));
        assert!(matches!(get_colormap("seaborn/jet"), Err(LimnoError::UnrecognizedKind { .. })));
    }

    #[test]
    fn test_reversed_swaps_ends() {
        let gray = get_colormap("gray").unwrap();
        assert_eq!(gray.color_at(0.0), RGBColor(0, 0, 0));
        assert_eq!(gray.color_at(1.0), RGBColor(255, 255, 255));
        assert_eq!(gray.color_at(0.5), RGBColor(128, 128, 128));
        let reversed = get_colormap("gray_r").unwrap();
        assert_eq!(reversed.color_at(0.0), RGBColor(255, 255, 255));
    }

    #[test]
    fn test_color_for_clamps() {
        let gray = get_colormap("gray").unwrap();
        assert_eq!(gray.color_for(-5.0, 0.0, 10.0), RGBColor(0, 0, 0));
        assert_eq!(gray.color_for(50.0, 0.0, 10.0), RGBColor(255, 255, 255));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#603a17").unwrap(), RGBColor(0x60, 0x3a, 0x17));
        assert!(parse_hex_color("603a17").is_err());
        assert!(parse_hex_color("#60zz17").is_err());
    }

    #[test]
    fn test_available_lists_packages_in_order() {
        let all = available_colormaps();
        assert_eq!(all[0], "matplotlib/jet");
        assert!(all.contains(&"cmocean/thermal".to_string()));
    }
}
