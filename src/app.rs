//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the load + fit pipeline
//! - prints the solver report and reduced chi-squared
//! - saves the figure and draws the terminal plot
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, FigureArgs, FitArgs, PlotArgs, SampleArgs};
use crate::data::{SampleConfig, generate_sample, write_sample};
use crate::domain::{AxisLabels, FitConfig, IngestOptions, LinearParams, PlotOptions};
use crate::error::AppError;

pub mod pipeline;

/// Rows shown in the chi-squared contribution table.
const WORST_POINTS: usize = 5;

/// Entry point for the `odrplot` binary.
pub fn run() -> Result<(), AppError> {
    // `odrplot` and `odrplot data.csv --skip-header` behave like `odrplot fit ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Sample(args) => handle_sample(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let stage = pipeline::load_and_fit(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&config.input_path, &stage.ingest, &stage.fit)
    );
    println!();
    println!("{}", crate::report::format_odr_output(&stage.fit));

    let run = pipeline::finish_run(stage, &config)?;
    println!("{}", crate::report::format_reduced_chi(run.reduced_chi_squared));
    println!();
    println!("Largest chi-squared contributions:");
    print!(
        "{}",
        crate::report::format_worst_points(&run.residuals, &run.ingest.lines, WORST_POINTS)
    );

    crate::plot::render_figure(&run.ingest.data, &run.curve, &config.plot)?;
    println!("Saved figure to {}", config.plot.output_path.display());

    if config.show {
        println!(
            "{}",
            crate::plot::render_ascii_plot(
                &run.ingest.data,
                &run.curve,
                &config.plot.labels,
                config.show_width,
                config.show_height,
            )
        );
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.residuals)?;
    }
    if let Some(path) = &config.export_fit {
        let fit_file = crate::io::fit_file::build_fit_file(
            &config.input_path,
            &run.ingest.data,
            &run.fit,
            run.chi_squared,
            run.reduced_chi_squared,
            &config.plot.labels,
            &run.curve,
        );
        crate::io::fit_file::write_fit_json(path, &fit_file)?;
    }

    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        count: args.count,
        line: LinearParams::new(args.slope, args.intercept),
        x_min: args.x_min,
        x_max: args.x_max,
        x_err: args.x_err,
        y_err: args.y_err,
        seed: args.seed,
    };
    let data = generate_sample(&config)?;
    write_sample(&args.output, &data, args.delimiter, args.header)?;
    println!("Wrote {} rows to {}", data.len(), args.output.display());
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let fit_file = crate::io::fit_file::read_fit_json(&args.fit)?;
    let plot = plot_options_from_args(&args.figure, fit_file.labels.clone());
    let curve = fit_file.grid.points();

    println!(
        "Fit from {}: y = {:.6}·x + {:.6}",
        fit_file.source, fit_file.beta.slope, fit_file.beta.intercept
    );
    println!("{}", crate::report::format_reduced_chi(fit_file.reduced_chi_squared));

    crate::plot::render_figure(&fit_file.data, &curve, &plot)?;
    println!("Saved figure to {}", plot.output_path.display());

    if !args.figure.no_show {
        println!(
            "{}",
            crate::plot::render_ascii_plot(
                &fit_file.data,
                &curve,
                &plot.labels,
                args.figure.width,
                args.figure.height,
            )
        );
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    if !args.delimiter.is_ascii() {
        return Err(AppError::input(format!(
            "Delimiter must be a single ASCII character, got '{}'.",
            args.delimiter
        )));
    }
    if args.curve_points < 2 {
        return Err(AppError::input("--curve-points must be at least 2."));
    }

    let labels = AxisLabels {
        x: args.x_label.clone(),
        y: args.y_label.clone(),
        title: args.title.clone(),
    };

    Ok(FitConfig {
        input_path: args.input.clone(),
        ingest: IngestOptions {
            delimiter: args.delimiter,
            skip_header: args.skip_header,
            require_positive_uncertainty: args.require_positive_uncertainty,
        },
        beta0: LinearParams::new(args.beta0_slope, args.beta0_intercept),
        max_iterations: args.max_iter,
        curve_points: args.curve_points,
        plot: plot_options_from_args(&args.figure, labels),
        show: !args.figure.no_show,
        show_width: args.figure.width,
        show_height: args.figure.height,
        export_results: args.export.clone(),
        export_fit: args.export_fit.clone(),
    })
}

fn plot_options_from_args(args: &FigureArgs, labels: AxisLabels) -> PlotOptions {
    PlotOptions {
        output_path: args.output.clone(),
        labels,
        dpi: args.dpi,
        width_in: args.fig_width,
        height_in: args.fig_height,
    }
}

/// Rewrite argv so `odrplot` defaults to `odrplot fit`.
///
/// Rules:
/// - `odrplot`                       -> `odrplot fit`
/// - `odrplot data.csv ...`          -> `odrplot fit data.csv ...`
/// - `odrplot --skip-header ...`     -> `odrplot fit --skip-header ...`
/// - `odrplot --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "sample" | "plot");
    if is_subcommand {
        return argv;
    }

    // Anything else (a flag or a file path) belongs to `fit`.
    argv.insert(1, "fit".to_string());
    argv
}
