// Result chart rendering
//
// One bar per region of interest showing the mean correlation across
// subjects, with a standard-deviation error bar on top.

use std::path::Path;
use anyhow::{Result, anyhow, bail};
use plotters::prelude::*;

use crate::constants::{CHART_HEIGHT, CHART_WIDTH};

pub fn render_roi_chart(
    output_path: &Path,
    title: &str,
    rois: &[String],
    means: &[f32],
    stds: &[f32],
) -> Result<()> {
    if rois.is_empty() || rois.len() != means.len() || rois.len() != stds.len() {
        bail!(
            "chart input mismatch: {} rois, {} means, {} stds",
            rois.len(),
            means.len(),
            stds.len()
        );
    }

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let y_low = means
        .iter()
        .zip(stds)
        .map(|(m, s)| m - s)
        .fold(0.0f32, f32::min);
    let y_high = means
        .iter()
        .zip(stds)
        .map(|(m, s)| m + s)
        .fold(0.0f32, f32::max);
    let pad = ((y_high - y_low) * 0.1).max(0.05);

    let root = BitMapBackend::new(output_path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("chart render failed: {}", e))?;

    // Bars are centered on integer x positions, so the integer axis ticks
    // land under the bar centers.
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(
            -0.5f32..(rois.len() as f32 - 0.5),
            (y_low - pad)..(y_high + pad),
        )
        .map_err(|e| anyhow!("chart render failed: {}", e))?;

    let roi_labels = rois.to_vec();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rois.len())
        .x_label_formatter(&move |x: &f32| roi_label_at(*x, &roi_labels))
        .x_desc("Region of interest")
        .y_desc("Correlation")
        .axis_desc_style(("sans-serif", 25))
        .label_style(("sans-serif", 18))
        .draw()
        .map_err(|e| anyhow!("chart render failed: {}", e))?;

    chart
        .draw_series(means.iter().enumerate().map(|(i, &mean)| {
            Rectangle::new(
                [(i as f32 - 0.35, 0.0), (i as f32 + 0.35, mean)],
                BLUE.mix(0.5).filled(),
            )
        }))
        .map_err(|e| anyhow!("chart render failed: {}", e))?;

    chart
        .draw_series(means.iter().zip(stds).enumerate().map(|(i, (&mean, &std))| {
            ErrorBar::new_vertical(
                i as f32,
                mean - std,
                mean,
                mean + std,
                BLACK.filled(),
                12,
            )
        }))
        .map_err(|e| anyhow!("chart render failed: {}", e))?;

    root.present()
        .map_err(|e| anyhow!("chart render failed: {}", e))?;

    log::info!("wrote chart to {}", output_path.display());
    Ok(())
}

/// Label for the tick nearest to `x`; ticks sit on the integer bar centers.
fn roi_label_at(x: f32, rois: &[String]) -> String {
    let i = x.round();
    if i < 0.0 {
        return String::new();
    }
    rois.get(i as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_sit_on_bar_centers() {
        let rois: Vec<String> = ["V1", "V2", "V3"].iter().map(|s| s.to_string()).collect();
        // Bar i is centered on x = i
        assert_eq!(roi_label_at(0.0, &rois), "V1");
        assert_eq!(roi_label_at(1.0, &rois), "V2");
        assert_eq!(roi_label_at(2.0, &rois), "V3");
        // Nearby ticks snap to the same bar, out-of-range ticks are blank
        assert_eq!(roi_label_at(0.9, &rois), "V2");
        assert_eq!(roi_label_at(-0.5, &rois), "");
        assert_eq!(roi_label_at(3.0, &rois), "");
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_roi_chart(
            &dir.path().join("chart.png"),
            "Layer 1",
            &["V1".to_string()],
            &[0.1, 0.2],
            &[0.05],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_roi_chart(&dir.path().join("chart.png"), "Layer 1", &[], &[], &[]);
        assert!(err.is_err());
    }
}
