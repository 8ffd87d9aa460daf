use clap::{Parser, Subcommand, ValueEnum};
use lf_app::{
    AppResult, RunMode, RunOptions, RunProgressEvent, RunRequest, RunStage, project_service,
    query, run_service,
};
use lf_core::timing::{self, engine_timing};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "lf-cli")]
#[command(about = "Lakeflow CLI - regulated lake hydrology, nutrients and release optimization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file, engine configuration and forcing coverage
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Run a scenario or optimization
    Run {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Override the project's simulation type
        #[arg(long = "type", value_enum)]
        run_type: Option<RunTypeArg>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Worker threads for optimization (0 = all cores)
        #[arg(long)]
        workers: Option<usize>,
        /// Print accumulated engine timings after the run
        #[arg(long)]
        timing: bool,
    },
    /// List cached runs for a project
    Runs {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one daily series from a run as CSV
    ExportSeries {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Series name (e.g. stage_ft, s77_tp_load_kg)
        series: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the Pareto set of an optimization run as CSV
    Pareto {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RunTypeArg {
    Scenario,
    OptimizationValidation,
    OptimizationScenario,
}

impl From<RunTypeArg> for RunMode {
    fn from(arg: RunTypeArg) -> Self {
        match arg {
            RunTypeArg::Scenario => RunMode::Scenario,
            RunTypeArg::OptimizationValidation => RunMode::OptimizationValidation,
            RunTypeArg::OptimizationScenario => RunMode::OptimizationScenario,
        }
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            run_type,
            no_cache,
            workers,
            timing,
        } => cmd_run(
            &project_path,
            RunOptions {
                use_cache: !no_cache,
                mode: run_type.map(RunMode::from),
                workers,
                ..RunOptions::default()
            },
            timing,
        ),
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
        Commands::ExportSeries {
            project_path,
            run_id,
            series,
            output,
        } => cmd_export_series(&project_path, &run_id, &series, output.as_deref()),
        Commands::Pareto {
            project_path,
            run_id,
            output,
        } => cmd_pareto(&project_path, &run_id, output.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let summary = project_service::validate_project(project_path)?;
    println!("✓ Project is valid");
    println!("  Name: {}", summary.name);
    println!(
        "  Type: {} ({} to {}, {} days)",
        summary.simulation_type.as_str(),
        summary.start,
        summary.end,
        summary.days
    );
    println!("  Structures: {}", summary.structure_ids.join(", "));
    println!(
        "  Nutrient engine: {}",
        if summary.nutrient_enabled { "on" } else { "off" }
    );
    if summary.decision_variables > 0 {
        println!(
            "  Decision variables: {}  objectives: {}  constraints: {}",
            summary.decision_variables, summary.objectives, summary.constraints
        );
    }
    Ok(())
}

fn cmd_run(project_path: &Path, options: RunOptions, show_timing: bool) -> AppResult<()> {
    if show_timing {
        timing::enable_timing();
        engine_timing::reset_all();
    }
    println!("Running project: {}", project_path.display());

    let request = RunRequest {
        project_path,
        options,
    };

    let mut last_emit = Instant::now();
    let mut last_stage = String::new();
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let stage_key = format!("{:?}", event.stage);
            let emit_now = stage_key != last_stage
                || event.optimization.is_some()
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = stage_key;
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ {} completed: {}", response.mode.as_str(), response.run_id);
    }

    print_timing_summary(&response.timing);
    if let Some(opt) = &response.manifest.optimization {
        println!("\nOptimization:");
        println!("  Evaluations: {} ({} failed)", opt.evaluations, opt.failures);
        println!("  Generations: {}", opt.generations);
        println!("  Stopped by:  {}", opt.stop_reason);
        println!("  Pareto set:  {} members", opt.pareto_size);
    }

    let (_manifest, records) = run_service::load_run(project_path, &response.run_id)?;
    let summary = query::get_run_summary(&records)?;
    println!("  Days: {}", summary.record_count);
    println!("  Series: {}", summary.series_count);

    if show_timing {
        engine_timing::print_summary();
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.optimization) {
        (RunStage::Optimizing, Some(p)) => {
            let fraction = match (p.max_generations, p.max_evaluations) {
                (_, Some(max)) => p.evaluations as f64 / max as f64,
                (Some(max), None) => p.generation as f64 / max as f64,
                (None, None) => 0.0,
            }
            .min(1.0);
            let width = 28usize;
            let filled = ((fraction * width as f64).round() as usize).min(width);
            print!(
                "\r[{}{}] gen={}  evals={}  failed={}  pareto={} ({} feasible)  elapsed={:.1}s",
                "#".repeat(filled),
                "-".repeat(width - filled),
                p.generation,
                p.evaluations,
                p.failures,
                p.archive_size,
                p.feasible_in_archive,
                event.elapsed_wall_s
            );
            let _ = io::stdout().flush();
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
            let _ = io::stdout().flush();
        }
    }
}

fn print_timing_summary(timing: &lf_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let pct = |t: f64| 100.0 * t / total;

    println!("\nTiming summary:");
    println!(
        "  Compile:  {:.3}s ({:.1}%)",
        timing.compile_time_s,
        pct(timing.compile_time_s)
    );
    if timing.optimize_time_s > 0.0 {
        println!(
            "  Optimize: {:.3}s ({:.1}%)",
            timing.optimize_time_s,
            pct(timing.optimize_time_s)
        );
    }
    println!(
        "  Simulate: {:.3}s ({:.1}%)",
        timing.simulate_time_s,
        pct(timing.simulate_time_s)
    );
    println!(
        "  Save:     {:.3}s ({:.1}%)",
        timing.save_time_s,
        pct(timing.save_time_s)
    );
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    }
    println!("  Total:    {:.3}s", timing.total_time_s);
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;

    if runs.is_empty() {
        println!("No cached runs found for: {}", project_path.display());
    } else {
        println!("Cached runs:");
        for manifest in runs {
            println!(
                "  {} {:<24} ({})",
                manifest.run_id,
                manifest.run_type.label(),
                manifest.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, records) = run_service::load_run(project_path, run_id)?;
    let summary = query::get_run_summary(&records)?;

    println!("\nRun Summary:");
    println!("  Project: {}", manifest.project_name);
    println!("  Type: {}", manifest.run_type.label());
    println!("  Created: {}", manifest.timestamp);
    println!("  Days: {}", summary.record_count);
    println!("  Date range: {} - {}", summary.first_date, summary.last_date);

    if !manifest.parameters.is_empty() {
        println!("\nParameters:");
        for (name, value) in &manifest.parameters {
            println!("  {} = {}", name, value);
        }
    }

    println!("\nSeries:");
    for name in query::list_series_names(&records) {
        println!("  {}", name);
    }

    Ok(())
}

fn write_or_print(csv: String, rows: usize, output: Option<&Path>) -> AppResult<()> {
    if let Some(path) = output {
        std::fs::write(path, csv)?;
        println!("✓ Exported {} rows to {}", rows, path.display());
    } else {
        print!("{}", csv);
    }
    Ok(())
}

fn cmd_export_series(
    project_path: &Path,
    run_id: &str,
    series: &str,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_manifest, records) = run_service::load_run(project_path, run_id)?;
    let data = query::extract_series(&records, series)?;

    let mut csv = format!("date,{}\n", series);
    for (date, val) in &data {
        csv.push_str(&format!("{},{}\n", date, val));
    }
    write_or_print(csv, data.len(), output)
}

fn cmd_pareto(project_path: &Path, run_id: &str, output: Option<&Path>) -> AppResult<()> {
    let pareto = run_service::load_pareto(project_path, run_id)?;

    let mut header = vec!["id".to_string(), "generation".to_string(), "feasible".to_string()];
    header.extend(pareto.decision_names.iter().cloned());
    header.extend(pareto.objective_names.iter().cloned());
    header.extend(pareto.constraint_names.iter().cloned());
    let mut csv = header.join(",");
    csv.push('\n');

    for m in &pareto.members {
        let mut row = vec![
            m.id.to_string(),
            m.generation.to_string(),
            m.is_feasible().to_string(),
        ];
        row.extend(m.decision.iter().map(|v| v.to_string()));
        row.extend(m.objectives.iter().map(|v| v.to_string()));
        row.extend(m.constraints.iter().map(|v| v.to_string()));
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    write_or_print(csv, pareto.members.len(), output)
}
