//! Environment configuration.
//!
//! `RUNSTAB_*` variables override the pipeline defaults. Unparseable values
//! fall back to the default.

use std::str::FromStr;

use runstab_media::StabilizeConfig;

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn flag_or(value: Option<String>, default: bool) -> bool {
    match value.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

/// Build the pipeline configuration from the process environment.
pub fn stabilize_config_from_env() -> StabilizeConfig {
    stabilize_config_from(|key| std::env::var(key).ok())
}

/// Build the pipeline configuration from a variable lookup.
pub fn stabilize_config_from(var: impl Fn(&str) -> Option<String>) -> StabilizeConfig {
    let defaults = StabilizeConfig::default();
    let mut config = defaults.clone();

    let t = &mut config.tracking;
    t.roi_top = parse_or(var("RUNSTAB_ROI_TOP"), defaults.tracking.roi_top);
    t.roi_bottom = parse_or(var("RUNSTAB_ROI_BOTTOM"), defaults.tracking.roi_bottom);
    t.detection_scale = parse_or(var("RUNSTAB_DETECTION_SCALE"), defaults.tracking.detection_scale);
    t.ransac_trials = parse_or(var("RUNSTAB_RANSAC_TRIALS"), defaults.tracking.ransac_trials);
    t.inlier_threshold = parse_or(
        var("RUNSTAB_INLIER_THRESHOLD"),
        defaults.tracking.inlier_threshold,
    );
    t.seed = parse_or(var("RUNSTAB_SEED"), defaults.tracking.seed);
    t.secondary_rejection = flag_or(
        var("RUNSTAB_SECONDARY_REJECTION"),
        defaults.tracking.secondary_rejection,
    );

    let c = &mut config.crop;
    c.crop_height_ratio = parse_or(
        var("RUNSTAB_CROP_HEIGHT_RATIO"),
        defaults.crop.crop_height_ratio,
    );
    c.output_width = parse_or(var("RUNSTAB_OUTPUT_WIDTH"), defaults.crop.output_width);
    c.output_height = parse_or(var("RUNSTAB_OUTPUT_HEIGHT"), defaults.crop.output_height);

    let e = &mut config.encoding;
    e.crf = parse_or(var("RUNSTAB_CRF"), defaults.encoding.crf);
    if let Some(preset) = var("RUNSTAB_PRESET").filter(|p| !p.trim().is_empty()) {
        e.preset = preset.trim().to_string();
    }

    config.cache_frames = flag_or(var("RUNSTAB_CACHE_FRAMES"), defaults.cache_frames);

    config
}
