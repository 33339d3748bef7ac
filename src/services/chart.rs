// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Inline SVG line chart for heart-rate streams.

use crate::models::HeartRateStream;
use anyhow::Result;
use plotters::prelude::*;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 300;
const LINE_COLOR: RGBColor = RGBColor(252, 76, 2);
/// Vertical headroom above and below the observed HR range, in bpm.
const HR_PADDING: i64 = 5;

/// Render `stream` as an SVG line chart, or `None` if it has no points.
pub fn heartrate_svg(stream: &HeartRateStream) -> Result<Option<String>> {
    if stream.is_empty() {
        return Ok(None);
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        draw_heartrate(root, stream)?;
    }

    Ok(Some(svg))
}

fn draw_heartrate<DB>(
    root: DrawingArea<DB, plotters::coord::Shift>,
    stream: &HeartRateStream,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (t_min, t_max) = bounds(&stream.time);
    let (hr_min, hr_max) = bounds(&stream.heartrate);

    // A single sample still needs a non-empty time axis
    let t_max = t_max.max(t_min + 1);

    let area = root;
    area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&area)
        .margin(15)
        .set_label_area_size(LabelAreaPosition::Left, 45)
        .set_label_area_size(LabelAreaPosition::Bottom, 35)
        .build_cartesian_2d(
            t_min..t_max,
            (hr_min - HR_PADDING)..(hr_max + HR_PADDING),
        )?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("HR")
        .draw()?;

    chart.draw_series(LineSeries::new(stream.points(), &LINE_COLOR))?;

    area.present()?;
    Ok(())
}

fn bounds(values: &[i64]) -> (i64, i64) {
    let lo = values.iter().copied().min().unwrap_or(0);
    let hi = values.iter().copied().max().unwrap_or(0);
    (lo, hi)
}
