use serde::{Deserialize, Serialize};

pub const CLUSTER_PALETTE: [&str; 10] = [
    "#2c7da0", "#a23b72", "#3a7d44", "#8a5a44", "#6f4a8e", "#b36a1c", "#1e6f5c", "#b24545",
    "#4c6faf", "#7a6f24",
];

const DEFAULT_CLUSTER: &str = "default";
const DARK_MIX: (f64, f64, f64) = (255.0, 255.0, 255.0);
const DARK_MIX_WEIGHT: f64 = 0.22;
const LIGHT_MIX: (f64, f64, f64) = (0.0, 0.0, 0.0);
const LIGHT_MIX_WEIGHT: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" | "default" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    pub fn edge_color(self, cluster: &str) -> String {
        cluster_theme_color(cluster, self.is_dark())
    }
}

/// 32-bit polynomial rolling hash (multiplier 31) over UTF-16 code units,
/// wrapping on overflow.
pub fn hash_cluster_id(value: &str) -> i32 {
    value.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

pub fn cluster_palette_index(cluster: &str) -> usize {
    let key = if cluster.is_empty() {
        DEFAULT_CLUSTER
    } else {
        cluster
    };
    // Widen before abs so i32::MIN does not overflow.
    (i64::from(hash_cluster_id(key)).abs() % CLUSTER_PALETTE.len() as i64) as usize
}

pub fn cluster_base_color(cluster: &str) -> &'static str {
    CLUSTER_PALETTE[cluster_palette_index(cluster)]
}

/// Base color blended toward white on dark backgrounds and toward black on
/// light ones.
pub fn cluster_theme_color(cluster: &str, is_dark: bool) -> String {
    let base = cluster_base_color(cluster);
    let Some(rgb) = parse_hex_rgb(base) else {
        return base.to_string();
    };
    if is_dark {
        mix_color(rgb, DARK_MIX, DARK_MIX_WEIGHT)
    } else {
        mix_color(rgb, LIGHT_MIX, LIGHT_MIX_WEIGHT)
    }
}

pub fn mix_color(base: (f64, f64, f64), toward: (f64, f64, f64), weight: f64) -> String {
    let channel = |a: f64, b: f64| a * (1.0 - weight) + b * weight;
    rgb_to_hex(
        channel(base.0, toward.0),
        channel(base.1, toward.1),
        channel(base.2, toward.2),
    )
}

pub fn parse_hex_rgb(hex: &str) -> Option<(f64, f64, f64)> {
    let raw = hex.trim().trim_start_matches('#');
    let full: String = match raw.len() {
        3 => raw.chars().flat_map(|ch| [ch, ch]).collect(),
        6 => raw.to_string(),
        _ => return None,
    };
    let num = u32::from_str_radix(&full, 16).ok()?;
    Some((
        f64::from((num >> 16) & 0xff),
        f64::from((num >> 8) & 0xff),
        f64::from(num & 0xff),
    ))
}

fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    let clamp = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", clamp(r), clamp(g), clamp(b))
}
