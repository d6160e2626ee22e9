//! CompatGuard CLI - electrical product compatibility checks from the command line.

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use compatguard::rules::CompatibilityRule;
use compatguard::{
    size_ev_circuit, CompatGuardError, CompatibilityChecker, Comparison, NemaRating, ProductSpec,
    VerdictResult,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "compatguard")]
#[command(about = "Electrical product compatibility checker", long_about = None)]
#[command(version)]
struct Cli {
    /// Rules file (overrides COMPATGUARD_RULES and data/compatibility_rules.json)
    #[arg(long, value_name = "PATH", global = true)]
    rules: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    log_verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether two products are compatible
    Check {
        /// First product description
        #[arg(long, value_name = "TEXT", conflicts_with_all = ["a_file", "url_a"])]
        a: Option<String>,

        /// Read the first product description from a file (`-` for stdin)
        #[arg(long, value_name = "PATH", conflicts_with = "url_a")]
        a_file: Option<PathBuf>,

        /// Product page URL (not supported)
        #[arg(long, value_name = "URL")]
        url_a: Option<String>,

        /// Second product description
        #[arg(long, value_name = "TEXT", conflicts_with_all = ["b_file", "url_b", "require_nema"])]
        b: Option<String>,

        /// Read the second product description from a file (`-` for stdin)
        #[arg(long, value_name = "PATH", conflicts_with_all = ["url_b", "require_nema"])]
        b_file: Option<PathBuf>,

        /// Product page URL (not supported)
        #[arg(long, value_name = "URL", conflicts_with = "require_nema")]
        url_b: Option<String>,

        /// Check the first product against an installation site requiring this NEMA rating
        #[arg(long, value_name = "RATING")]
        require_nema: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if the verdict is at or below this confidence
        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,
    },

    /// Show the specification guessed from a product description
    Extract {
        /// Product description (`-` for stdin)
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List the loaded compatibility rules
    Rules {
        /// Show constraints and notes
        #[arg(long)]
        verbose: bool,
    },

    /// Size the circuit for an EV charger (125% continuous load)
    EvSize {
        /// Charger output current in amps
        #[arg(value_name = "AMPS")]
        amps: f64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[derive(Clone, ValueEnum)]
enum FailOn {
    /// Fail only on an incompatible verdict
    Incompatible,
    /// Fail on incompatible or undetermined verdicts
    Undetermined,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_verbosity);

    let exit_code = match cli.command {
        Commands::Check {
            a,
            a_file,
            url_a,
            b,
            b_file,
            url_b,
            require_nema,
            format,
            fail_on,
        } => {
            let inputs = CheckInputs {
                a: ProductInput::from_args(a, a_file, url_a),
                b: ProductInput::from_args(b, b_file, url_b),
                require_nema,
            };
            handle_check(cli.rules.as_deref(), inputs, format, fail_on)
        }
        Commands::Extract { text, format } => handle_extract(cli.rules.as_deref(), &text, format),
        Commands::Rules { verbose } => handle_rules(cli.rules.as_deref(), verbose),
        Commands::EvSize { amps, format } => handle_ev_size(amps, format),
    };

    process::exit(exit_code);
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_checker(rules: Option<&Path>) -> Result<CompatibilityChecker, CompatGuardError> {
    let checker = CompatibilityChecker::from_config(rules)?;
    tracing::info!(
        "Using {} rules from {}",
        checker.rules().len(),
        checker.rules().source()
    );
    Ok(checker)
}

/// Where one product's description comes from
enum ProductInput {
    Text(String),
    File(PathBuf),
    Url(String),
    Missing,
}

impl ProductInput {
    fn from_args(text: Option<String>, file: Option<PathBuf>, url: Option<String>) -> Self {
        match (text, file, url) {
            (_, _, Some(url)) => ProductInput::Url(url),
            (Some(text), _, _) => ProductInput::Text(text),
            (_, Some(path), _) => ProductInput::File(path),
            _ => ProductInput::Missing,
        }
    }

    fn reads_stdin(&self) -> bool {
        matches!(self, ProductInput::File(path) if path.as_os_str() == "-")
    }

    fn read(self, label: &str) -> anyhow::Result<String> {
        match self {
            ProductInput::Text(text) => Ok(text),
            ProductInput::File(path) => read_text(&path)
                .with_context(|| format!("failed to read product {} from {}", label, path.display())),
            ProductInput::Url(url) => Err(CompatGuardError::UrlInputDisabled(url).into()),
            ProductInput::Missing => bail!(
                "product {} is required (--{} <TEXT> or --{}-file <PATH>)",
                label,
                label.to_ascii_lowercase(),
                label.to_ascii_lowercase()
            ),
        }
    }
}

struct CheckInputs {
    a: ProductInput,
    b: ProductInput,
    require_nema: Option<String>,
}

fn read_text(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn handle_check(
    rules: Option<&Path>,
    inputs: CheckInputs,
    format: OutputFormat,
    fail_on: Option<FailOn>,
) -> i32 {
    let checker = match load_checker(rules) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let comparison = match run_check(&checker, inputs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return 1;
        }
    };

    if let Err(e) = output_comparison(&checker, &comparison, &format) {
        eprintln!("Error: {:#}", e);
        return 1;
    }

    match fail_on {
        Some(threshold) if should_fail(comparison.verdict.result, &threshold) => 1,
        _ => 0,
    }
}

fn run_check(checker: &CompatibilityChecker, inputs: CheckInputs) -> anyhow::Result<Comparison> {
    if inputs.a.reads_stdin() && inputs.b.reads_stdin() {
        bail!("only one product can be read from stdin");
    }

    let text_a = inputs.a.read("A")?;
    if let Some(rating) = inputs.require_nema {
        let required: NemaRating = rating.parse()?;
        return Ok(checker.check_environment(&text_a, required));
    }
    let text_b = inputs.b.read("B")?;
    Ok(checker.check_text(&text_a, &text_b))
}

fn should_fail(result: VerdictResult, threshold: &FailOn) -> bool {
    match threshold {
        FailOn::Incompatible => result == VerdictResult::Incompatible,
        FailOn::Undetermined => result != VerdictResult::Compatible,
    }
}

fn output_comparison(
    checker: &CompatibilityChecker,
    comparison: &Comparison,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let report = checker.report(comparison);
    match format {
        OutputFormat::Human => {
            print!("{}", report.to_human());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "product_a": comparison.product_a,
                "product_b": comparison.product_b,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn handle_extract(rules: Option<&Path>, text: &str, format: OutputFormat) -> i32 {
    let checker = match load_checker(rules) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let text = if text == "-" {
        match read_text(Path::new("-")) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error: failed to read stdin: {}", e);
                return 1;
            }
        }
    } else {
        text.to_string()
    };

    let spec = checker.extract(&text);
    match format {
        OutputFormat::Human => output_spec_human(&spec),
        OutputFormat::Json => match serde_json::to_string_pretty(&spec) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    }
    0
}

fn output_spec_human(spec: &ProductSpec) {
    fn field(name: &str, value: Option<String>) {
        println!("  {:<12} {}", format!("{}:", name), value.unwrap_or_else(|| "-".to_string()));
    }

    println!("{}", spec.describe());
    println!("{}", "─".repeat(40));
    field("Category", spec.category.map(|c| c.as_str().to_string()));
    field("Brand", spec.brand.clone());
    field("Series", spec.series.clone());
    field("Amperage", spec.amperage.map(compatguard::product::format_amps));
    field("Voltage", spec.voltage_label());
    field("Poles", spec.poles.map(|p| p.to_string()));
    field("Phase", spec.phase.map(|p| p.to_string()));
    field("NEMA rating", spec.nema_rating.map(|r| r.to_string()));
    field("Plug config", spec.plug_config.clone());
    field("Model", spec.model.clone());
}

fn handle_rules(rules: Option<&Path>, verbose: bool) -> i32 {
    let checker = match load_checker(rules) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let rule_set = checker.rules();

    println!(
        "{} compatibility rules ({}):\n",
        rule_set.len(),
        rule_set.source()
    );
    for rule in rule_set.rules() {
        print_rule(rule, verbose);
    }

    if !verbose {
        println!("\nUse --verbose for constraints and notes");
    }
    0
}

fn print_rule(rule: &CompatibilityRule, verbose: bool) {
    let [x, y] = rule.category_pair;
    println!("  {:<36} {} ↔ {}  ({})", rule.id, x, y, rule.subject());
    if verbose {
        for constraint in &rule.constraints {
            let marker = if constraint.required { "  (required)" } else { "" };
            println!("      {} = {}{}", constraint.key, constraint.value, marker);
        }
        if let Some(ref note) = rule.note {
            println!("      Note: {}", note);
        }
        println!();
    }
}

fn handle_ev_size(amps: f64, format: OutputFormat) -> i32 {
    if !amps.is_finite() || amps <= 0.0 {
        eprintln!("Error: charger amps must be a positive number");
        return 1;
    }
    let sizing = size_ev_circuit(amps);
    match format {
        OutputFormat::Human => println!("{}", sizing.summary()),
        OutputFormat::Json => match serde_json::to_string_pretty(&sizing) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    }
    0
}
