//! Colour maps for score grids and brain slices.

/// Fill used for undefined values.
pub const UNDEFINED: &str = "#bdbdbd";
/// Fill used outside the brain mask.
pub const BACKGROUND: &str = "#f0f0f0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Black through red and yellow to white
    Hot,
    /// Dark blue to light green
    BlueGreen,
    /// White to black
    Gray,
}

impl Colormap {
    /// Colour of `value` on the `[vmin, vmax]` scale, clamped at both ends.
    pub fn color(&self, value: f64, vmin: f64, vmax: f64) -> String {
        if value.is_nan() {
            return UNDEFINED.to_string();
        }
        let t = normalize(value, vmin, vmax);
        match self {
            Colormap::Hot => rgb_to_hex(
                (3.0 * t).clamp(0.0, 1.0),
                (3.0 * t - 1.0).clamp(0.0, 1.0),
                (3.0 * t - 2.0).clamp(0.0, 1.0),
            ),
            Colormap::BlueGreen => hsl_to_hex(230.0 - 100.0 * t, 0.65, 0.25 + 0.45 * t),
            Colormap::Gray => hsl_to_hex(0.0, 0.0, 1.0 - t),
        }
    }
}

/// Position of `value` in `[vmin, vmax]` as a fraction in `[0, 1]`.
pub fn normalize(value: f64, vmin: f64, vmax: f64) -> f64 {
    if vmax <= vmin {
        return 0.5;
    }
    ((value - vmin) / (vmax - vmin)).clamp(0.0, 1.0)
}

pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}

/// Convert HSL to hex colour string.
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let h = ((h % 360.0) + 360.0) % 360.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    rgb_to_hex(r + m, g + m, b + m)
}
