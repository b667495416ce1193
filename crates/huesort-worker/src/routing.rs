//! Dominant colour selection and destination folder resolution.

use huesort_models::{ColorProfile, ColorShare, Configuration, DominantColors, MultiColorPolicy};

/// Separator between colour names under [`MultiColorPolicy::JoinedNames`].
pub const JOINED_NAME_SEPARATOR: &str = "_";

/// Colours covering at least `min_percent`, largest first.
///
/// The sort is stable, so colours with equal shares keep taxonomy order.
pub fn select_dominant_colors(profile: &ColorProfile, min_percent: f64) -> DominantColors {
    let mut selected: Vec<ColorShare> = profile
        .iter()
        .filter(|share| share.percentage >= min_percent)
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    DominantColors(selected)
}

/// Folder name a clip with these dominant colours belongs in.
pub fn resolve_destination(dominant: &DominantColors, config: &Configuration) -> String {
    let top = match dominant.top() {
        None => return config.unidentified_folder.clone(),
        Some(top) if dominant.len() == 1 => return top.name.clone(),
        Some(top) => top,
    };

    match config.multi_color_policy {
        MultiColorPolicy::Majority => {
            if top.percentage > config.majority_threshold {
                top.name.clone()
            } else {
                config.mixed_folder.clone()
            }
        }
        MultiColorPolicy::JoinedNames => {
            let mut names = dominant.names();
            names.sort_unstable();
            names.join(JOINED_NAME_SEPARATOR)
        }
    }
}
