//! Exploratory plots rendered to bitmap files

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::dataset::Frame;
use super::stats::{
    category_counts, category_means, pearson, sqrt_bins, BoxStats, Histogram, Kde,
};
use crate::{EnergyError, Result};

fn plot_err<E: std::fmt::Display>(e: E) -> EnergyError {
    EnergyError::Plot(e.to_string())
}

/// Pad a degenerate range so the chart has a visible extent
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

fn label_at(labels: &[String], x: f64) -> String {
    let i = x.floor();
    if i < 0.0 || x - i > 1e-6 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

/// Box plot strip shared by the distribution and density plots
fn draw_box<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    (x_lo, x_hi): (f64, f64),
    stats: &BoxStats,
) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .y_label_area_size(40)
        .build_cartesian_2d(x_lo..x_hi, 0f64..1f64)
        .map_err(plot_err)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(stats.q1, 0.25), (stats.q3, 0.75)],
            BLUE.mix(0.4).filled(),
        )))
        .map_err(plot_err)?;
    let lines = vec![
        vec![(stats.median, 0.25), (stats.median, 0.75)],
        vec![(stats.whisker_low, 0.5), (stats.q1, 0.5)],
        vec![(stats.q3, 0.5), (stats.whisker_high, 0.5)],
        vec![(stats.whisker_low, 0.35), (stats.whisker_low, 0.65)],
        vec![(stats.whisker_high, 0.35), (stats.whisker_high, 0.65)],
    ];
    chart
        .draw_series(lines.into_iter().map(|l| PathElement::new(l, BLACK)))
        .map_err(plot_err)?;
    chart
        .draw_series(
            stats
                .outliers
                .iter()
                .map(|&x| Circle::new((x, 0.5), 3, BLACK.filled())),
        )
        .map_err(plot_err)?;
    Ok(())
}

fn no_values(column: &str) -> EnergyError {
    EnergyError::Plot(format!("Column {:?} has no values", column))
}

/// Box plot over a histogram of one numeric column, with a density curve
/// scaled to counts
pub fn distribution_plot(
    frame: &Frame,
    column: &str,
    title: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let values = frame.numeric(column)?;
    let hist = Histogram::new(&values, sqrt_bins(values.len())).ok_or_else(|| no_values(column))?;
    let stats = BoxStats::new(&values).ok_or_else(|| no_values(column))?;
    let last_edge = hist.min + hist.width * hist.counts.len() as f64;
    let x_range = padded(hist.min, last_edge);

    // Density times n times bin width is in count units
    let curve: Vec<(f64, f64)> = Kde::new(&values)
        .map(|kde| {
            let scale = kde.len() as f64 * hist.width;
            kde.curve(0.0, 200)
                .into_iter()
                .map(|(x, d)| (x, d * scale))
                .collect()
        })
        .unwrap_or_default();
    let curve_max = curve.iter().map(|p| p.1).fold(0.0, f64::max);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let (upper, lower) = root.split_vertically(size.1 / 5);

    draw_box(&upper, title, x_range, &stats)?;

    let y_max = (hist.max_count().max(1) as f64).max(curve_max) * 1.05;
    let mut hist_chart = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(x_range.0..x_range.1, 0f64..y_max)
        .map_err(plot_err)?;

    hist_chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(column)
        .y_desc("Count")
        .draw()
        .map_err(plot_err)?;

    hist_chart
        .draw_series(hist.bins().map(|(lo, hi, count)| {
            Rectangle::new([(lo, 0.0), (hi, count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(plot_err)?;
    hist_chart
        .draw_series(LineSeries::new(curve, BLUE.stroke_width(2)))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Saved distribution plot of {} to {}", column, path.display());
    Ok(())
}

/// Box plot over a kernel density curve of one numeric column
pub fn density_plot(
    frame: &Frame,
    column: &str,
    title: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let values = frame.numeric(column)?;
    let stats = BoxStats::new(&values).ok_or_else(|| no_values(column))?;
    let kde = Kde::new(&values).ok_or_else(|| {
        EnergyError::Plot(format!(
            "Column {:?} needs at least two distinct values for a density",
            column
        ))
    })?;
    let curve = kde.curve(3.0, 200);
    let x_range = match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => padded(first.0, last.0),
        _ => return Err(no_values(column)),
    };
    let y_max = curve.iter().map(|p| p.1).fold(0.0, f64::max) * 1.05;

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let (upper, lower) = root.split_vertically(size.1 / 5);

    draw_box(&upper, title, x_range, &stats)?;

    let mut chart = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(column)
        .y_desc("Density")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(curve, BLUE.stroke_width(2)))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Saved density plot of {} to {}", column, path.display());
    Ok(())
}

/// Bar chart of label frequencies in one column
pub fn count_plot(frame: &Frame, column: &str, title: &str, path: &Path, size: (u32, u32)) -> Result<()> {
    let counts = category_counts(&frame.labels(column)?);
    if counts.is_empty() {
        return Err(no_values(column));
    }
    let labels: Vec<String> = counts.iter().map(|(l, _)| l.clone()).collect();
    let y_max = counts.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64 * 1.05;

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(counts.len() as f64 - 0.5), 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&|x| label_at(&labels, *x))
        .x_desc(column)
        .y_desc("Count")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, (_, count))| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *count as f64)], GREEN.mix(0.7).filled())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Saved count plot of {} to {}", column, path.display());
    Ok(())
}

/// Mean of a numeric column per category, drawn as a line
pub fn trend_plot(
    frame: &Frame,
    category: &str,
    value: &str,
    title: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let means = category_means(&frame.grouped(category, value)?);
    if means.is_empty() {
        return Err(EnergyError::Plot(format!(
            "No rows with both {:?} and {:?}",
            category, value
        )));
    }
    let labels: Vec<String> = means.iter().map(|(l, _)| l.clone()).collect();
    let (y_lo, y_hi) = means
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, m)| {
            (lo.min(*m), hi.max(*m))
        });
    let (y_lo, y_hi) = padded(y_lo, y_hi);
    let margin = (y_hi - y_lo) * 0.05;

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(
            -0.5f64..(means.len() as f64 - 0.5),
            (y_lo - margin)..(y_hi + margin),
        )
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_labels(means.len())
        .x_label_formatter(&|x| label_at(&labels, *x))
        .x_desc(category)
        .y_desc(format!("mean {}", value))
        .draw()
        .map_err(plot_err)?;

    let points: Vec<(f64, f64)> = means
        .iter()
        .enumerate()
        .map(|(i, (_, m))| (i as f64, *m))
        .collect();
    chart
        .draw_series(LineSeries::new(points.iter().copied(), &RED))
        .map_err(plot_err)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, RED.filled())))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Saved trend plot of {} by {} to {}", value, category, path.display());
    Ok(())
}

/// Pairwise Pearson correlations between numeric columns
///
/// Undefined coefficients (constant or too-short columns) are NaN.
pub fn correlation_matrix(frame: &Frame, columns: &[&str]) -> Result<Vec<Vec<f64>>> {
    let mut matrix = vec![vec![f64::NAN; columns.len()]; columns.len()];
    for (i, a) in columns.iter().enumerate() {
        for (j, b) in columns.iter().enumerate().skip(i) {
            let r = pearson(&frame.paired(a, b)?).unwrap_or(f64::NAN);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    Ok(matrix)
}

/// Diverging colour: blue for -1, white for 0, red for +1
fn heat_color(r: f64) -> RGBColor {
    if !r.is_finite() {
        return RGBColor(200, 200, 200);
    }
    let t = r.clamp(-1.0, 1.0);
    let fade = |full: u8, amount: f64| (255.0 - (255.0 - full as f64) * amount) as u8;
    if t >= 0.0 {
        RGBColor(fade(180, t), fade(30, t), fade(40, t))
    } else {
        RGBColor(fade(30, -t), fade(70, -t), fade(180, -t))
    }
}

/// Annotated heatmap of [`correlation_matrix`]
pub fn correlation_heatmap(
    frame: &Frame,
    columns: &[&str],
    title: &str,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    if columns.is_empty() {
        return Err(EnergyError::Plot("No numeric columns to correlate".to_string()));
    }
    let matrix = correlation_matrix(frame, columns)?;
    let n = columns.len();
    let labels: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    // Rows are drawn top to bottom
    let row_labels: Vec<String> = labels.iter().rev().cloned().collect();

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(120)
        .y_label_area_size(160)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), -0.5f64..(n as f64 - 0.5))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|x| label_at(&labels, *x))
        .y_label_formatter(&|y| label_at(&row_labels, *y))
        .draw()
        .map_err(plot_err)?;

    let cells: Vec<(f64, f64, f64)> = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| (j as f64, (n - 1 - i) as f64, matrix[i][j]))
        .collect();

    chart
        .draw_series(cells.iter().map(|&(x, y, r)| {
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], heat_color(r).filled())
        }))
        .map_err(plot_err)?;
    chart
        .draw_series(cells.iter().map(|&(x, y, r)| {
            Text::new(format!("{:.2}", r), (x - 0.15, y), ("sans-serif", 14).into_font())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Saved correlation heatmap of {} columns to {}", n, path.display());
    Ok(())
}
