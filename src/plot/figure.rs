//! Plotters-powered figure: error-bar scatter plus the fitted line, saved as SVG.
//!
//! The canvas is `width_in × height_in` inches at `dpi`, and every font size and
//! stroke width is given in points and scaled by the same factor, so a higher
//! dpi produces a larger but identically proportioned drawing.

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::domain::{MeasurementSet, PlotOptions};
use crate::error::AppError;
use crate::plot::ascii::{pad_range, span};

/// Matplotlib's default first-series blue.
const DATA_COLOR: RGBColor = RGBColor(31, 119, 180);
const FIT_COLOR: RGBColor = RED;

/// Draw the figure and write it to `opts.output_path`.
pub fn render_figure(data: &MeasurementSet, curve: &[(f64, f64)], opts: &PlotOptions) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::plot("Nothing to plot: the measurement set is empty."));
    }
    if opts.dpi == 0 || !(opts.width_in > 0.0 && opts.height_in > 0.0) {
        return Err(AppError::plot("Figure size and dpi must be positive."));
    }

    let size = opts.pixel_size();
    let root = SVGBackend::new(&opts.output_path, size).into_drawing_area();

    draw(&root, data, curve, opts).map_err(|e| {
        AppError::plot(format!(
            "Failed to render figure '{}': {e}",
            opts.output_path.display()
        ))
    })?;
    root.present().map_err(|e| {
        AppError::plot(format!(
            "Failed to write figure '{}': {e}",
            opts.output_path.display()
        ))
    })?;

    log::info!(
        "wrote figure '{}' ({}x{} px at {} dpi)",
        opts.output_path.display(),
        size.0,
        size.1,
        opts.dpi
    );
    Ok(())
}

fn draw(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    data: &MeasurementSet,
    curve: &[(f64, f64)],
    opts: &PlotOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    // Pixels per typographic point.
    let pt = f64::from(opts.dpi) / 72.0;
    let px = |points: f64| (points * pt).round().max(1.0) as u32;
    let font = |points: f64| ("sans-serif", points * pt);

    let xs = data
        .iter()
        .flat_map(|m| [m.x - m.x_err.abs(), m.x + m.x_err.abs()])
        .chain(curve.iter().map(|&(x, _)| x));
    let ys = data
        .iter()
        .flat_map(|m| [m.y - m.y_err.abs(), m.y + m.y_err.abs()])
        .chain(curve.iter().map(|&(_, y)| y));
    let (x0, x1) = span(xs).map_or((0.0, 1.0), |(lo, hi)| pad_range(lo, hi, 0.05));
    let (y0, y1) = span(ys).map_or((0.0, 1.0), |(lo, hi)| pad_range(lo, hi, 0.05));

    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(px(8.0))
        .x_label_area_size(px(36.0))
        .y_label_area_size(px(48.0));
    if !opts.labels.title.is_empty() {
        builder.caption(&opts.labels.title, font(12.0));
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc(opts.labels.x.as_str())
        .y_desc(opts.labels.y.as_str())
        .x_labels(8)
        .y_labels(8)
        .label_style(font(10.0))
        .axis_desc_style(font(10.0))
        .axis_style(BLACK.stroke_width(px(0.8)))
        .draw()?;

    let line_width = px(1.5);
    let bar_width = px(1.0);
    let marker = px(2.0);
    let legend_len = px(20.0) as i32;

    // 1) Fitted line.
    chart
        .draw_series(LineSeries::new(
            curve.iter().copied(),
            FIT_COLOR.stroke_width(line_width),
        ))?
        .label("Linear Fit")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + legend_len, y)], FIT_COLOR.stroke_width(line_width))
        });

    // 2) Error bars, x then y.
    chart.draw_series(data.iter().map(|m| {
        PathElement::new(
            vec![(m.x - m.x_err.abs(), m.y), (m.x + m.x_err.abs(), m.y)],
            DATA_COLOR.stroke_width(bar_width),
        )
    }))?;
    chart.draw_series(data.iter().map(|m| {
        PathElement::new(
            vec![(m.x, m.y - m.y_err.abs()), (m.x, m.y + m.y_err.abs())],
            DATA_COLOR.stroke_width(bar_width),
        )
    }))?;

    // 3) Observed points.
    chart
        .draw_series(
            data.iter()
                .map(|m| Circle::new((m.x, m.y), marker, DATA_COLOR.filled())),
        )?
        .label("Data")
        .legend(move |(x, y)| Circle::new((x + legend_len / 2, y), marker, DATA_COLOR.filled()));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(font(10.0))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .margin(px(6.0))
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AxisLabels, LinearParams, Measurement};
    use crate::models::fitted_curve;

    fn options(name: &str) -> PlotOptions {
        PlotOptions {
            output_path: std::env::temp_dir().join(format!("odr-plot-figure-{name}-{}.svg", std::process::id())),
            labels: AxisLabels {
                x: "V_in / V".to_string(),
                y: "V_out / V".to_string(),
                title: "Output vs Input".to_string(),
            },
            dpi: 100,
            width_in: 6.4,
            height_in: 4.8,
        }
    }

    #[test]
    fn writes_svg_with_labels_and_legend() {
        let data: MeasurementSet = (0..5)
            .map(|i| {
                let x = i as f64;
                Measurement { x, y: 0.5 * x + 0.2, x_err: 0.05, y_err: 0.1 }
            })
            .collect();
        let curve = fitted_curve(&LinearParams::new(0.5, 0.2), 0.0, 4.0, 1000);
        let opts = options("basic");

        render_figure(&data, &curve, &opts).unwrap();
        let svg = std::fs::read_to_string(&opts.output_path).unwrap();
        let _ = std::fs::remove_file(&opts.output_path);

        assert!(svg.contains("<svg"));
        assert!(svg.contains("width=\"640\""));
        assert!(svg.contains("Linear Fit"));
        assert!(svg.contains("Data"));
        assert!(svg.contains("V_out / V"));
        assert!(svg.contains("Output vs Input"));
    }

    #[test]
    fn empty_data_is_a_plot_error() {
        let err = render_figure(&MeasurementSet::new(), &[], &options("empty")).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
