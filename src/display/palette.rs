// Color palettes
//
// Two kinds of palette live here:
// - The 4-shade LCD palettes used to expand 2-bit pixel indices from the
//   emulation core (standard green-tinted and grayscale variants).
// - The fixed palette of the external canvas surface. Canvas pixels are
//   one byte each: `base * 4 + shade`. Base 0 is transparent.

use serde::{Deserialize, Serialize};

/// Standard 4-color LCD palette (lightest to darkest), 0xRRGGBB
pub const LCD_PALETTE_STANDARD: [u32; 4] = [0xE6F8DA, 0x99C886, 0x437969, 0x051F2A];

/// Grayscale 4-shade LCD ramp (lightest to darkest), 0xRRGGBB
pub const LCD_PALETTE_GRAYSCALE: [u32; 4] = [0xFFFFFF, 0xAAAAAA, 0x555555, 0x000000];

/// Which LCD palette a pipeline expands indexed pixels through
///
/// Chosen once at construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKind {
    /// Natural green-tinted LCD colors
    #[default]
    Standard,
    /// Neutral 4-shade gray ramp
    Grayscale,
}

impl PaletteKind {
    /// The four colors of this palette, lightest first
    pub fn colors(self) -> &'static [u32; 4] {
        match self {
            PaletteKind::Standard => &LCD_PALETTE_STANDARD,
            PaletteKind::Grayscale => &LCD_PALETTE_GRAYSCALE,
        }
    }

    /// Expand a 2-bit pixel index to 0xRRGGBB
    ///
    /// Only the low two bits of `index` are used.
    #[inline]
    pub fn color(self, index: u8) -> u32 {
        self.colors()[(index & 0x03) as usize]
    }
}

/// Base colors of the canvas surface, one per material (0xRRGGBB)
///
/// Entry 0 is the transparent slot and is never produced by quantization.
pub const CANVAS_BASE_COLORS: [u32; 62] = [
    // 0-15
    0x000000, 0x7FB238, 0xF7E9A3, 0xC7C7C7, 0xFF0000, 0xA0A0FF, 0xA7A7A7, 0x007C00,
    0xFFFFFF, 0xA4A8B8, 0x976D4D, 0x707070, 0x4040FF, 0x8F7748, 0xFFFCF5, 0xD87F33,
    // 16-31
    0xB24CD8, 0x6699D8, 0xE5E533, 0x7FCC19, 0xF27FA5, 0x4C4C4C, 0x999999, 0x4C7F99,
    0x7F3FB2, 0x334CB2, 0x664C33, 0x667F33, 0x993333, 0x191919, 0xFAEE4D, 0x5CDBD5,
    // 32-47
    0x4A80FF, 0x00D93A, 0x815631, 0x700200, 0xD1B1A1, 0x9F5224, 0x95576C, 0x706C8A,
    0xBA8524, 0x677535, 0xA04D4E, 0x392923, 0x876B62, 0x575C5C, 0x7A4958, 0x4C3E5C,
    // 48-61
    0x4C3223, 0x4C522A, 0x8E3C2E, 0x251610, 0xBD3031, 0x943F61, 0x5C191D, 0x167E86,
    0x3A8E8C, 0x562C3E, 0x14B485, 0x646464, 0xD8AF93, 0x7FA796,
];

/// Brightness multipliers (out of 255) for the four shades of a base color
pub const CANVAS_SHADE_MULTIPLIERS: [u32; 4] = [180, 220, 255, 135];

/// A single canvas pixel: an index into the canvas palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CanvasColor(pub u8);

impl CanvasColor {
    /// The transparent canvas color
    pub const TRANSPARENT: CanvasColor = CanvasColor(0);

    /// Build a color from a base color index and a shade (0-3)
    #[inline]
    pub fn new(base: u8, shade: u8) -> Self {
        CanvasColor(base * 4 + (shade & 0x03))
    }

    #[inline]
    pub fn base(self) -> u8 {
        self.0 / 4
    }

    #[inline]
    pub fn shade(self) -> u8 {
        self.0 % 4
    }
}

/// Apply a shade multiplier to a packed RGB color
fn shade_rgb(rgb: u32, multiplier: u32) -> u32 {
    let r = ((rgb >> 16) & 0xFF) * multiplier / 255;
    let g = ((rgb >> 8) & 0xFF) * multiplier / 255;
    let b = (rgb & 0xFF) * multiplier / 255;
    (r << 16) | (g << 8) | b
}

/// Squared Euclidean distance between two packed RGB colors
#[inline]
pub fn rgb_distance_sq(a: u32, b: u32) -> u32 {
    let dr = ((a >> 16) & 0xFF) as i32 - ((b >> 16) & 0xFF) as i32;
    let dg = ((a >> 8) & 0xFF) as i32 - ((b >> 8) & 0xFF) as i32;
    let db = (a & 0xFF) as i32 - (b & 0xFF) as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// The fixed palette of the external canvas surface
///
/// Holds every shaded color indexed by its `CanvasColor` byte.
#[derive(Debug, Clone)]
pub struct CanvasPalette {
    colors: Vec<u32>,
}

impl CanvasPalette {
    /// Build the canvas palette from the base color table
    pub fn new() -> Self {
        let colors = CANVAS_BASE_COLORS
            .iter()
            .flat_map(|&base| {
                CANVAS_SHADE_MULTIPLIERS
                    .iter()
                    .map(move |&multiplier| shade_rgb(base, multiplier))
            })
            .collect();

        Self { colors }
    }

    /// Number of entries, transparent slots included
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// RGB value of a canvas color, or `None` for transparent / unknown
    pub fn rgb(&self, color: CanvasColor) -> Option<u32> {
        if color.base() == 0 {
            return None;
        }
        self.colors.get(color.0 as usize).copied()
    }

    /// Find the canvas color closest to `rgb`
    ///
    /// Squared Euclidean distance in RGB; ties go to the lowest index.
    /// Transparent entries are skipped, so every input maps to exactly one
    /// opaque canvas color.
    pub fn closest(&self, rgb: u32) -> CanvasColor {
        let mut best_index = 4;
        let mut best_distance = u32::MAX;

        for (index, &candidate) in self.colors.iter().enumerate().skip(4) {
            let distance = rgb_distance_sq(rgb, candidate);
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
                if distance == 0 {
                    break;
                }
            }
        }

        CanvasColor(best_index as u8)
    }
}

impl Default for CanvasPalette {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcd_palette_lookup() {
        assert_eq!(PaletteKind::Standard.color(0), 0xE6F8DA);
        assert_eq!(PaletteKind::Standard.color(3), 0x051F2A);
        assert_eq!(PaletteKind::Grayscale.color(1), 0xAAAAAA);

        // Only the low two bits select the shade
        assert_eq!(PaletteKind::Grayscale.color(6), PaletteKind::Grayscale.color(2));
    }

    #[test]
    fn test_palette_kind_serde_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            palette: PaletteKind,
        }

        let parsed: Wrapper = toml::from_str("palette = \"grayscale\"").unwrap();
        assert_eq!(parsed.palette, PaletteKind::Grayscale);
        assert_eq!(PaletteKind::default(), PaletteKind::Standard);
    }

    #[test]
    fn test_canvas_palette_size() {
        let palette = CanvasPalette::new();
        assert_eq!(palette.len(), CANVAS_BASE_COLORS.len() * 4);
        assert!(palette.len() <= 256);
    }

    #[test]
    fn test_canvas_color_parts() {
        let color = CanvasColor::new(8, 2);
        assert_eq!(color, CanvasColor(34));
        assert_eq!(color.base(), 8);
        assert_eq!(color.shade(), 2);
    }

    #[test]
    fn test_canvas_shades() {
        let palette = CanvasPalette::new();
        // Base 8 is white; shade 2 keeps full brightness
        assert_eq!(palette.rgb(CanvasColor::new(8, 2)), Some(0xFFFFFF));
        assert_eq!(palette.rgb(CanvasColor::new(8, 0)), Some(0xB4B4B4));
        assert_eq!(palette.rgb(CanvasColor::new(8, 3)), Some(0x878787));
        assert_eq!(palette.rgb(CanvasColor::TRANSPARENT), None);
        assert_eq!(palette.rgb(CanvasColor(3)), None);
        assert_eq!(palette.rgb(CanvasColor(255)), None);
    }

    #[test]
    fn test_closest_exact_matches() {
        let palette = CanvasPalette::new();
        assert_eq!(palette.closest(0xFFFFFF), CanvasColor::new(8, 2));
        assert_eq!(palette.closest(0xFF0000), CanvasColor::new(4, 2));

        for index in 4..palette.len() {
            let color = CanvasColor(index as u8);
            let rgb = palette.rgb(color).unwrap();
            let found = palette.closest(rgb);
            assert_eq!(palette.rgb(found), Some(rgb));
        }
    }

    #[test]
    fn test_closest_never_transparent() {
        let palette = CanvasPalette::new();
        for rgb in [0x000000, 0x010203, 0x808080, 0xFFFFFF, 0x00FF00, 0x0000FF] {
            assert_ne!(palette.closest(rgb).base(), 0);
        }
        // Black lands on the darkest shade of the black base
        assert_eq!(palette.closest(0x000000), CanvasColor::new(29, 3));
    }

    #[test]
    fn test_distance() {
        assert_eq!(rgb_distance_sq(0x000000, 0x000000), 0);
        assert_eq!(rgb_distance_sq(0x010203, 0x000000), 1 + 4 + 9);
        assert_eq!(rgb_distance_sq(0xFF0000, 0x000000), 255 * 255);
    }
}
