#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use csv::WriterBuilder;
use ndarray::ArrayView1;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use scorecard::data::{load_bin_spec, load_frame, numeric_column, performance_from_frame};
use scorecard::scorecard::scores_to_probabilities;
use scorecard::{FitOptions, Model, Scorecard};

#[derive(Parser)]
#[command(
    name = "scorecard",
    about = "Shape-constrained logistic scorecards over pre-binned predictors",
    long_about = "Fits ridge-penalized logistic regressions on binned predictors, \
                 with monotonicity, tie and neutral-bin constraints per variable."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct InputArgs {
    /// Path to a tab-separated data file with a header row
    #[arg(long, value_name = "PATH")]
    data: PathBuf,

    /// TOML file listing the binned variables
    #[arg(long, value_name = "PATH")]
    bins: PathBuf,

    /// Name of the 0/1 outcome column
    #[arg(long, default_value = "target")]
    target: String,

    /// Optional name of a non-negative row weight column
    #[arg(long)]
    weights: Option<String>,
}

#[derive(Args)]
struct FitArgs {
    #[command(flatten)]
    input: InputArgs,

    /// TOML file with fit options (alpha, steps, ridge_gradient, [solver])
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Name of a column holding a fixed offset added to the linear predictor
    #[arg(long)]
    offset: Option<String>,

    /// Write linear scores and probabilities of the training rows to this TSV
    #[arg(long, value_name = "PATH")]
    scores: Option<PathBuf>,
}

#[derive(Args)]
struct SummaryArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Also print the bin table of this variable
    #[arg(long)]
    variable: Option<String>,

    /// Additional tab-separated files with the same columns, reported next to
    /// the training data in bin tables
    #[arg(long = "eval", value_name = "PATH")]
    eval: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a scorecard and print its coefficients
    #[command(about = "Fit a constrained scorecard (prints coefficients per bin)")]
    Fit(FitArgs),

    /// Summarize every binned variable over a dataset
    #[command(about = "Print per-variable summaries and bin tables")]
    Summary(SummaryArgs),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Fit(args)) => fit(args),
        Some(Commands::Summary(args)) => summary(args),
        None => Cli::command().print_help().map_err(|e| e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_scorecard(input: &InputArgs) -> Result<Scorecard, Box<dyn std::error::Error>> {
    let variables = load_bin_spec(&input.bins)?;
    let data = load_frame(&input.data)?;
    let perf = performance_from_frame(&data, &input.target, input.weights.as_deref())?;
    println!(
        "Loaded {} rows and {} variables from '{}'",
        data.height(),
        variables.len(),
        input.data.display()
    );
    Ok(Scorecard::new(variables)?.with_data(data, perf)?)
}

fn fit(args: FitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut scorecard = load_scorecard(&args.input)?;

    let mut options = match &args.config {
        Some(path) => toml::from_str::<FitOptions>(&fs::read_to_string(path)?)?,
        None => FitOptions::default(),
    };
    if let Some(column) = &args.offset {
        let data = scorecard.data().ok_or("training data is not loaded")?;
        options.offset = Some(numeric_column(data, column)?);
    }

    let model = scorecard.fit(None, None, &options)?;
    print_model(model);

    if let Some(path) = &args.scores {
        let scores = scorecard.predict(None)?;
        write_scores(path, scores.view())?;
        println!("Scores written to '{}'", path.display());
    }
    Ok(())
}

fn print_model(model: &Model) {
    let diagnostics = model.diagnostics();
    println!(
        "\n{}: status {:?}, {} iterations ({} outer), objective {:.6}, max violation {:.2e}",
        model.name(),
        diagnostics.status,
        diagnostics.iterations,
        diagnostics.outer_iterations,
        diagnostics.objective,
        diagnostics.max_violation
    );
    println!("{:<24} {:<28} {:>12}", "variable", "bin", "coefficient");
    for block in &model.layout().blocks {
        let Some(variable) = model.variables().get(&block.name) else {
            continue;
        };
        for (bin, col) in variable.bins().iter().zip(block.col_range.clone()) {
            println!(
                "{:<24} {:<28} {:>12.6}",
                block.name,
                bin.label(),
                model.coefficients()[col]
            );
        }
    }
    println!("{:<24} {:<28} {:>12.6}", "(intercept)", "", model.intercept());
}

fn write_scores(path: &Path, scores: ArrayView1<f64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;
    wtr.write_record(["score", "probability"])?;
    let probabilities = scores_to_probabilities(scores);
    for (score, p) in scores.iter().zip(probabilities.iter()) {
        wtr.write_record([format!("{score:.12}"), format!("{p:.12}")])?;
    }
    wtr.flush()?;
    Ok(())
}

fn summary(args: SummaryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut scorecard = load_scorecard(&args.input)?;

    if !args.eval.is_empty() {
        let mut sets = Vec::with_capacity(args.eval.len());
        for path in &args.eval {
            let data = load_frame(path)?;
            let perf =
                performance_from_frame(&data, &args.input.target, args.input.weights.as_deref())?;
            sets.push((data, perf));
        }
        scorecard.set_eval_sets(Some(sets))?;
    }

    println!(
        "\n{:<24} {:>6} {:>6} {:>12} {:>12} {:>10}",
        "variable", "step", "bins", "count", "event_rate", "iv"
    );
    for s in scorecard.summary(None, None)? {
        println!(
            "{:<24} {:>6} {:>6} {:>12.1} {:>12.4} {:>10.4}",
            s.name, s.step, s.bins, s.count, s.event_rate, s.information_value
        );
    }

    if let Some(name) = &args.variable {
        for display in scorecard.display_variable(name, None, None, true)? {
            println!("\n{name} [{}]", display.sample);
            println!(
                "{:<28} {:>12} {:>12} {:>10} {:>10} {:>10}",
                "bin", "count", "events", "rate", "woe", "iv"
            );
            for row in display.rows {
                println!(
                    "{:<28} {:>12.1} {:>12.1} {:>10.4} {:>10.4} {:>10.4}",
                    row.bin, row.count, row.events, row.event_rate, row.woe, row.iv
                );
            }
        }
    }
    Ok(())
}
