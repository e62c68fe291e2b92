//! Conversion between unit-range colour triples (as stored in settings) and
//! 8-bit RGB (as used by colour pickers).

/// Quantize a `[0, 1]` colour triple to 8-bit RGB. Out-of-range components
/// are clamped.
pub fn list_to_rgb(color: [f64; 3]) -> [u8; 3] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Expand 8-bit RGB to a `[0, 1]` colour triple.
pub fn rgb_to_list(rgb: [u8; 3]) -> [f64; 3] {
    rgb.map(|c| f64::from(c) / 255.0)
}
