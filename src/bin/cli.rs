use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ruleshift::config::Config;
use ruleshift::error::ShiftError;
use ruleshift::ir::Dialect;
use ruleshift::output::OutputFormat;
use ruleshift::ConvertOptions;

#[derive(Parser)]
#[command(
    name = "ruleshift",
    about = "Convert IDS rules between Snort and Suricata",
    version,
    author
)]
struct Cli {
    /// Emit debug diagnostics on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a rule file to the other dialect
    Convert {
        /// Rule file, or - for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Target dialect (snort, suricata); defaults to the opposite of the detected one
        #[arg(long, short = 't')]
        to: Option<String>,

        /// Config file path
        #[arg(long, short = 'c', env = "RULESHIFT_CONFIG")]
        config: Option<PathBuf>,

        /// Output format (console, json, rules)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Analyze every converted rule
        #[arg(long)]
        analyze: bool,
    },

    /// Guess which dialect a rule file is written in
    Detect {
        /// Rule file, or - for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Output format (text, json)
        #[arg(long, short = 'f', default_value = "text")]
        format: String,
    },

    /// Print every parsed rule as one JSON line
    Parse {
        /// Rule file, or - for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// List the active dialect signatures
    ListSignatures {
        /// Config file path
        #[arg(long, short = 'c', env = "RULESHIFT_CONFIG")]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .ruleshift.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input,
            to,
            config,
            format,
            output,
            analyze,
        } => cmd_convert(input, to, config, format, output, analyze),
        Commands::Detect { input, format } => cmd_detect(input, format),
        Commands::Parse { input } => cmd_parse(input),
        Commands::ListSignatures { config, format } => cmd_list_signatures(config, format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String, ShiftError> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn cmd_convert(
    input: PathBuf,
    to: Option<String>,
    config: Option<PathBuf>,
    format_str: String,
    output_path: Option<PathBuf>,
    analyze: bool,
) -> Result<i32, ShiftError> {
    let requested = match to {
        Some(name) => {
            Some(Dialect::from_str_lenient(&name).ok_or(ShiftError::UnsupportedTarget(name))?)
        }
        None => None,
    };

    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let options = ConvertOptions {
        config_path: config,
        format,
        analyze,
    };

    let text = read_input(&input)?;
    let target = ruleshift::resolve_target(&text, requested)?;
    let report = ruleshift::convert(&text, target, &options)?;
    let rendered = ruleshift::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = all converted, 1 = some rules kept as-is
    Ok(if report.is_clean() { 0 } else { 1 })
}

fn cmd_detect(input: PathBuf, format_str: String) -> Result<i32, ShiftError> {
    let text = read_input(&input)?;
    let classification = Config::load(Path::new(".ruleshift.toml"))?
        .classifier
        .signature_table()
        .classify(&text);

    match format_str.as_str() {
        "json" => {
            let json = serde_json::json!({
                "detected": classification.verdict(),
                "snort": classification.snort,
                "suricata": classification.suricata,
                "rules_scored": classification.rules_scored,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            println!(
                "{} (snort {}, suricata {}, {} rule(s) scored)",
                classification.verdict(),
                classification.snort,
                classification.suricata,
                classification.rules_scored,
            );
        }
    }

    Ok(0)
}

fn cmd_parse(input: PathBuf) -> Result<i32, ShiftError> {
    let text = read_input(&input)?;
    let mut failures = 0;

    for (idx, line) in text.lines().enumerate() {
        if !ruleshift::is_valid_rule(line) {
            continue;
        }
        match ruleshift::parse_rule(line) {
            Ok(rule) => println!("{}", serde_json::to_string(&rule)?),
            Err(e) => {
                eprintln!("line {}: {}", idx + 1, e);
                failures += 1;
            }
        }
    }

    Ok(if failures == 0 { 0 } else { 1 })
}

fn cmd_list_signatures(config: Option<PathBuf>, format_str: String) -> Result<i32, ShiftError> {
    let path = config.unwrap_or_else(|| PathBuf::from(".ruleshift.toml"));
    let table = Config::load(&path)?.classifier.signature_table();
    let signatures = table.signatures();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(signatures)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<10} {:<8} SIGNAL", "DIALECT", "WEIGHT");
            println!("{}", "-".repeat(60));
            for signature in signatures {
                println!(
                    "{:<10} {:<8} {}",
                    signature.dialect.to_string(),
                    signature.weight,
                    signature.matcher,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, ShiftError> {
    let path = PathBuf::from(".ruleshift.toml");

    if path.exists() && !force {
        eprintln!(".ruleshift.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .ruleshift.toml");

    Ok(0)
}
