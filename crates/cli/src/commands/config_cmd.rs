//! `liveproof config` — configuration validation and display.

use std::path::Path;

use liveproof_config::EditorConfig;

pub async fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    let config = match path {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    config.validate()?;
    println!("   ✅ All checks passed");
    println!();
    println!("   Drag threshold:    {} px", config.gesture.drag_threshold_px);
    println!("   Text-click window: {} ms", config.gesture.text_click_max_ms);
    println!("   Min element size:  {} px", config.gesture.min_element_size_px);
    println!("   Mask warmup:       {} ms", config.mask.warmup_ms);
    println!("   Zoom bounds:       {}–{}", config.zoom.min, config.zoom.max);
    println!(
        "   Nudge:             {} px (×{} shift, ×{} alt)",
        config.nudge.step_px, config.nudge.shift_scale, config.nudge.alt_scale
    );
    println!("   Z-extrema default: {}", config.layers.default_z_extremum);
    println!("   Channel capacity:  {}", config.channel.capacity);

    Ok(())
}
