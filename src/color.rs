use nalgebra::Vector3;

/// Color used for any classification code without an entry in [`CLASS_COLORS`].
pub const DEFAULT_CLASS_COLOR: [f32; 3] = [0.5, 0.5, 0.5];

pub struct ClassInfo {
    pub code: u8,
    pub name: &'static str,
    pub color: [f32; 3],
}

/// ASPRS LAS classification codes
pub static CLASS_COLORS: [ClassInfo; 16] = [
    ClassInfo {
        code: 0,
        name: "never classified",
        color: [0.5, 0.5, 0.5],
    },
    ClassInfo {
        code: 1,
        name: "unclassified",
        color: [0.3, 0.3, 0.3],
    },
    ClassInfo {
        code: 2,
        name: "ground",
        color: [0.6, 0.4, 0.2],
    },
    ClassInfo {
        code: 3,
        name: "low vegetation",
        color: [0.2, 0.6, 0.2],
    },
    ClassInfo {
        code: 4,
        name: "medium vegetation",
        color: [0.1, 0.7, 0.1],
    },
    ClassInfo {
        code: 5,
        name: "high vegetation",
        color: [0.0, 0.8, 0.0],
    },
    ClassInfo {
        code: 6,
        name: "building",
        color: [0.9, 0.1, 0.1],
    },
    ClassInfo {
        code: 7,
        name: "low point (noise)",
        color: [0.9, 0.9, 0.0],
    },
    ClassInfo {
        code: 9,
        name: "water",
        color: [0.0, 0.5, 0.9],
    },
    ClassInfo {
        code: 10,
        name: "rail",
        color: [0.5, 0.0, 0.9],
    },
    ClassInfo {
        code: 11,
        name: "road surface",
        color: [0.3, 0.3, 0.3],
    },
    ClassInfo {
        code: 13,
        name: "wire guard",
        color: [0.8, 0.8, 0.2],
    },
    ClassInfo {
        code: 14,
        name: "wire conductor",
        color: [0.9, 0.5, 0.0],
    },
    ClassInfo {
        code: 15,
        name: "transmission tower",
        color: [0.7, 0.3, 0.0],
    },
    ClassInfo {
        code: 17,
        name: "bridge deck",
        color: [0.4, 0.4, 0.4],
    },
    ClassInfo {
        code: 18,
        name: "high noise",
        color: [0.0, 0.8, 0.8],
    },
];

fn class_info(code: u32) -> Option<&'static ClassInfo> {
    CLASS_COLORS.iter().find(|c| c.code as u32 == code)
}

/// Color for a single classification code. Unknown codes map to gray.
pub fn colorize_code(code: u32) -> Vector3<f32> {
    class_info(code)
        .map_or(DEFAULT_CLASS_COLOR, |c| c.color)
        .into()
}

pub fn colorize(codes: &[u8]) -> Vec<Vector3<f32>> {
    codes.iter().map(|&c| colorize_code(c as u32)).collect()
}

pub fn class_name(code: u8) -> String {
    class_info(code as u32).map_or_else(|| format!("class {}", code), |c| c.name.to_string())
}

/// Blue (low) to green to red (high) ramp over the z range.
pub fn height_colormap(heights: &[f32]) -> Vec<Vector3<f32>> {
    let (h_min, h_max) = heights
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });
    let range = h_max - h_min;

    heights
        .iter()
        .map(|&h| {
            let t = if range > 0. { (h - h_min) / range } else { 0. };
            Vector3::new(
                (1.5 * t - 0.5).clamp(0., 1.),
                (1. - 2. * (t - 0.5).abs()).clamp(0., 1.),
                (1.5 * (1. - t) - 0.5).clamp(0., 1.),
            )
        })
        .collect()
}
