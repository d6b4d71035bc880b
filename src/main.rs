use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use unity_context_analyzer::{analyze, render_prompt, AnalysisOptions, AnalysisResult};

#[derive(Parser)]
#[command(name = "analyzer")]
#[command(about = "Structural analyzer for Unity-style C# projects with LLM context synthesis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Analyze a project directory or a single source file")]
    Analyze {
        /// Project root or source file
        root: PathBuf,
        #[arg(short, long, help = "TOML file with analysis options")]
        config: Option<PathBuf>,
        #[arg(long)]
        output_json: Option<PathBuf>,
        #[arg(long, help = "Print the synthesized context prompt")]
        prompt: bool,
        #[arg(short, long, help = "Worker threads (defaults to the number of CPUs)")]
        threads: Option<usize>,
        #[arg(long, help = "Include file glob, replaces the default *.cs (repeatable)")]
        include: Vec<String>,
        #[arg(long, help = "Exclude file glob (repeatable)")]
        exclude: Vec<String>,
        #[arg(short, long)]
        verbose: bool,
    },
    #[command(about = "Render the context prompt from a saved analysis result")]
    Prompt {
        /// JSON written by `analyze --output-json`
        result_json: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            root,
            config,
            output_json,
            prompt,
            threads,
            include,
            exclude,
            verbose,
        } => {
            init_logging(verbose);
            let options = build_options(config, threads, include, exclude, verbose)?;
            run_analysis(root, options, output_json, prompt)
        }
        Commands::Prompt { result_json } => {
            init_logging(false);
            print_prompt(result_json)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn build_options(
    config: Option<PathBuf>,
    threads: Option<usize>,
    include: Vec<String>,
    exclude: Vec<String>,
    verbose: bool,
) -> Result<AnalysisOptions> {
    let mut options = match config {
        Some(path) => AnalysisOptions::from_file(&path)?,
        None => AnalysisOptions::default(),
    };

    if let Some(threads) = threads {
        options = options.with_threads(threads);
    }
    if !include.is_empty() {
        options.include_file_patterns = include;
    }
    options.exclude_file_patterns.extend(exclude);
    options.verbose_logging |= verbose;
    Ok(options)
}

fn run_analysis(
    root: PathBuf,
    options: AnalysisOptions,
    output_json: Option<PathBuf>,
    print_prompt: bool,
) -> Result<()> {
    eprintln!("🔍 Analyzing {}", root.display());
    let result = analyze(&root, &options);

    if !result.success {
        bail!("Analysis failed: {}", result.error_message);
    }

    eprintln!("📊 Analysis complete in {} ms", result.duration_ms);
    for warning in &result.warnings {
        eprintln!("  ⚠️ {}", warning);
    }

    println!("Architecture: {}", result.architecture_label);
    println!("Quality Score: {} ({})", result.quality_score, result.health());
    println!("Files Analyzed: {}", result.files_analyzed);
    println!("Components: {}", result.component_count);
    println!(
        "Dependencies: {} ({} unresolved)",
        result.dependency_count, result.unresolved_dependency_count
    );
    println!("Patterns: {}", result.pattern_count);
    for finding in &result.patterns {
        println!(
            "  - {} ({:.2}): {}",
            finding.pattern_name,
            finding.confidence,
            finding.components.join(", ")
        );
    }

    if let Some(output_path) = output_json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize analysis result")?;
        std::fs::write(&output_path, json)
            .with_context(|| format!("Failed to write results to {}", output_path.display()))?;
        eprintln!("💾 Results written to {:?}", output_path);
    }

    if print_prompt {
        let prompt = if result.prompt.is_empty() {
            render_prompt(&result)?
        } else {
            result.prompt.clone()
        };
        println!();
        print!("{}", prompt);
    }

    Ok(())
}

fn print_prompt(result_json: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&result_json)
        .with_context(|| format!("Failed to read analysis result: {}", result_json.display()))?;
    let result: AnalysisResult = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse analysis result: {}", result_json.display()))?;

    let prompt = render_prompt(&result)?;
    print!("{}", prompt);
    Ok(())
}
