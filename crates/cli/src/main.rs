mod definition;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use definition::Definition;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Fluent API type-state generator.
#[derive(Parser)]
#[command(name = "typeweave", version, about = "Fluent API type-state generator")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the fluent interface code for a definition file
    Generate {
        /// Path to the JSON definition file
        definition: PathBuf,

        /// Inject the generated code into this file instead of printing
        #[arg(long, requires = "region")]
        into: Option<PathBuf>,

        /// Region identifier between typeweave markers
        #[arg(long)]
        region: Option<String>,

        /// Exit with status 1 if the target region is out of date,
        /// without writing anything
        #[arg(long, requires = "into")]
        check: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate {
            ref definition,
            ref into,
            ref region,
            check,
        } => run_generate(
            cli.output,
            definition,
            into.as_deref(),
            region.as_deref(),
            check,
        ),
    };
    if let Err(message) = result {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}

fn load_definition(path: &Path) -> Result<Definition, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid definition {}: {}", path.display(), e))
}

fn run_generate(
    output: OutputFormat,
    definition_path: &Path,
    into: Option<&Path>,
    region: Option<&str>,
    check: bool,
) -> Result<(), String> {
    let definition = load_definition(definition_path)?;
    let generated = definition::generate(&definition)?;

    let Some(target) = into else {
        match output {
            OutputFormat::Text => print!("{}", generated),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "generated": generated }));
            }
        }
        return Ok(());
    };
    let Some(region) = region else {
        return Err("--into requires --region".to_string());
    };

    if check {
        let up_to_date = typeweave_inject::is_up_to_date(target, region, &generated)
            .map_err(|e| format!("{}: {}", target.display(), e))?;
        if !up_to_date {
            return Err(format!(
                "{} region '{}' is out of date",
                target.display(),
                region
            ));
        }
        report(output, target, region, "up-to-date");
        return Ok(());
    }

    let rewritten = typeweave_inject::inject_file(target, region, &generated)
        .map_err(|e| format!("{}: {}", target.display(), e))?;
    report(
        output,
        target,
        region,
        if rewritten { "rewritten" } else { "unchanged" },
    );
    Ok(())
}

fn report(output: OutputFormat, target: &Path, region: &str, status: &str) {
    match output {
        OutputFormat::Text => println!("{} [{}]: {}", target.display(), region, status),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "file": target.display().to_string(),
                "region": region,
                "status": status,
            })
        ),
    }
}
