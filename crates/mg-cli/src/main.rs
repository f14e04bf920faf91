//! Command-line front end: BodyMovin JSON in, factory source or a YAML
//! graph dump out.

use clap::{Parser, ValueEnum};
use mg_core::codegen::CodegenConfiguration;
use mg_core::issues::IssueSeverity;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Rust factory module rebuilding the graph through mg-core.
    Codegen,
    /// Human-readable YAML dump of the graph.
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "mg", about = "Compile BodyMovin animations to composition factories")]
struct Args {
    /// Input BodyMovin .json file.
    input: PathBuf,

    /// Output file; stdout if omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emission format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Codegen)]
    format: OutputFormat,

    /// Factory struct name (defaults to a name derived from the input file).
    #[arg(long)]
    name: Option<String>,

    /// Codegen configuration as JSON; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the graph optimizer.
    #[arg(long)]
    no_optimize: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let json = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("cannot read {}: {e}", args.input.display()))?;

    let mut issues = mg_core::Issues::new();
    let composition = mg_core::parse(&json, &mut issues)?;
    let mut graph = mg_core::translate(&composition, &mut issues);

    for issue in issues.iter() {
        match issue.severity {
            IssueSeverity::Error => log::error!("{issue}"),
            IssueSeverity::Warning => log::warn!("{issue}"),
            IssueSeverity::Info => log::info!("{issue}"),
        }
    }

    if !args.no_optimize {
        mg_core::optimize(&mut graph);
    }

    let output = match args.format {
        OutputFormat::Yaml => mg_core::to_yaml(&graph),
        OutputFormat::Codegen => {
            let mut config = match &args.config {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
                    serde_json::from_str::<CodegenConfiguration>(&text)
                        .map_err(|e| format!("invalid codegen config: {e}"))?
                }
                None => CodegenConfiguration::default(),
            };
            config.class_name = args
                .name
                .clone()
                .or(composition.name.clone())
                .unwrap_or_else(|| class_name_of(&args.input));
            config.width = composition.width;
            config.height = composition.height;
            config.duration_nanos = composition.duration_nanos();
            config.disable_optimization = args.no_optimize;
            config
                .source_metadata
                .push(format!("source: {}", args.input.display()));
            for marker in &composition.markers {
                config.source_metadata.push(format!(
                    "marker: {} at frame {} (+{} frames)",
                    marker.name, marker.frame, marker.duration_frames
                ));
            }
            mg_core::generate(&graph, &config)
        }
    };

    match &args.output {
        Some(path) => std::fs::write(path, output)
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?,
        None => print!("{output}"),
    }
    Ok(())
}

/// Derive a PascalCase struct name from the input file stem.
fn class_name_of(path: &std::path::Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Composition");
    let mut out = String::with_capacity(stem.len());
    let mut upper = true;
    for c in stem.chars() {
        if c.is_alphanumeric() {
            if upper {
                out.extend(c.to_uppercase());
                upper = false;
            } else {
                out.push(c);
            }
        } else {
            upper = true;
        }
    }
    if out.is_empty() { "Composition".into() } else { out }
}
