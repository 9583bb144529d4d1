//! Visual estimate task CLI
//!
//! Usage:
//!   visual-estimate                               # Interactive terminal session
//!   visual-estimate --simulate --seed 7           # Simulated participant
//!   visual-estimate --serve                       # HTTP API server
//!   visual-estimate --participant P017 --json     # Seed from participant id, JSON lines

use clap::Parser;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

use visual_estimate::config::{seed_from_participant, ExperimentConfig};
use visual_estimate::core::{
    normalize_angle, run_server, ClickPrompt, Command, CommandParser, CsvSink, Cue,
    NullRenderer, ParticipantInput, Renderer, SessionSummary, SimulatedParticipant,
    TrialOrchestrator,
};
use visual_estimate::types::{Circle, Condition, Point, TrialOutcome};
use visual_estimate::{Error, Result, VERSION};

/// Participant-facing line: stdout, or stderr when stdout carries JSON
macro_rules! say {
    ($to_stderr:expr) => {
        if $to_stderr { eprintln!() } else { println!() }
    };
    ($to_stderr:expr, $($arg:tt)*) => {
        if $to_stderr { eprintln!($($arg)*) } else { println!($($arg)*) }
    };
}

#[derive(Parser, Debug)]
#[command(
    name = "visual-estimate",
    version = VERSION,
    about = "Visual estimate task - judge a target on a circle, see a partner, revise",
    long_about = "Runs the visual estimate experiment.\n\n\
                  A target flashes on a circle; the participant estimates its angle and\n\
                  rates confidence; a simulated partner answers; the participant may\n\
                  revise inside the minor arc between the two estimates.\n\n\
                  Modes:\n  \
                  (default)   Interactive terminal session\n  \
                  --simulate  Simulated participant\n  \
                  --serve     HTTP API server mode\n\n\
                  Conditions:\n  \
                  susceptible    Partner moves strongly toward you\n  \
                  insusceptible  Partner mostly holds its estimate\n  \
                  baseline       Blend, weighted by --lambda"
)]
struct Args {
    /// Run with a simulated participant instead of terminal input
    #[arg(long)]
    simulate: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<String>,

    /// Trials per condition block
    #[arg(short, long)]
    trials: Option<u32>,

    /// Condition order, comma separated
    #[arg(long, value_delimiter = ',')]
    conditions: Option<Vec<String>>,

    /// Baseline transition lambda in [0, 1]
    #[arg(long)]
    lambda: Option<f64>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Participant id; seeds the RNG when --seed is absent
    #[arg(short, long)]
    participant: Option<String>,

    /// Results CSV (appended)
    #[arg(short, long)]
    output: Option<String>,

    /// Revision probability for the simulated participant
    #[arg(long, default_value_t = 0.5)]
    revise_probability: f64,

    /// Output each trial as a JSON line
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show every display cue (simulated mode)
    #[arg(long)]
    verbose: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("Configuration error: {}", e).red());
            std::process::exit(2);
        }
    };

    let outcome = if args.serve {
        run_serve(&args, config).await;
        Ok(())
    } else if args.simulate {
        run_simulated(&args, config)
    } else {
        run_interactive(&args, config)
    };

    if let Err(e) = outcome {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Defaults, then config file, then flags
fn build_config(args: &Args) -> Result<ExperimentConfig> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig::default(),
    };

    if let Some(trials) = args.trials {
        config.trials_per_condition = trials;
    }
    if let Some(ref names) = args.conditions {
        config.conditions = names
            .iter()
            .map(|s| s.parse::<Condition>())
            .collect::<Result<Vec<_>>>()?;
    }
    if let Some(lambda) = args.lambda {
        config.transition_lambda = lambda;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    } else if let Some(ref id) = args.participant {
        config.seed = Some(seed_from_participant(id));
    }
    if let Some(ref output) = args.output {
        config.output_path = output.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run an interactive terminal session
fn run_interactive(args: &Args, config: ExperimentConfig) -> Result<()> {
    // JSON mode keeps stdout to one object per line
    if !args.json {
        print_header("Interactive", args.no_color);
        println!("Type a click as 'x y' or an angle as '45deg'. Type 'quit' to exit.");
        println!(
            "Circle: center ({:.0}, {:.0}), radius {:.0}. {} trials. Results: {}",
            config.circle.center.x,
            config.circle.center.y,
            config.circle.radius,
            config.total_trials(),
            config.output_path
        );
        println!();
    }

    let mut input = TerminalInput::new(config.circle, args.json);
    let mut renderer = TerminalRenderer::new(config.circle, args.json);
    let mut sink = CsvSink::open(&config.output_path)?;
    let rng = config.rng();
    let mut orchestrator = TrialOrchestrator::new(config, rng)?;

    let json = args.json;
    let summary = orchestrator.run_with(&mut input, &mut renderer, &mut sink, |outcome| {
        print_outcome(outcome, json);
    })?;

    print_summary(&summary, sink.path().display().to_string(), json);
    Ok(())
}

/// Run a session with a simulated participant
fn run_simulated(args: &Args, config: ExperimentConfig) -> Result<()> {
    let participant_seed = config.seed.unwrap_or_else(rand::random).wrapping_add(1);
    let mut input = SimulatedParticipant::new(config.circle, StdRng::seed_from_u64(participant_seed))
        .with_revise_probability(args.revise_probability);
    let mut sink = CsvSink::open(&config.output_path)?;
    let circle = config.circle;
    let total_trials = config.total_trials();
    let rng = config.rng();
    let mut orchestrator = TrialOrchestrator::new(config, rng)?;

    if !args.json {
        print_header("Simulated", args.no_color);
        println!("{} trials, revise probability {:.2}", total_trials, args.revise_probability);
        println!();
    }

    let json = args.json;
    let on_trial = |outcome: &TrialOutcome| print_outcome(outcome, json);
    let summary = if args.verbose {
        orchestrator.run_with(&mut input, &mut TerminalRenderer::new(circle, json), &mut sink, on_trial)?
    } else {
        orchestrator.run_with(&mut input, &mut NullRenderer, &mut sink, on_trial)?
    };

    print_summary(&summary, sink.path().display().to_string(), json);
    Ok(())
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: ExperimentConfig) {
    print_header("API Server", args.no_color);
    if let Err(e) = run_server(&args.addr, config).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// TERMINAL COLLABORATORS
// =============================================================================

/// Participant input typed on stdin
struct TerminalInput {
    circle: Circle,
    parser: CommandParser,
    /// Prompts go to stderr while stdout carries JSON lines
    to_stderr: bool,
}

impl TerminalInput {
    fn new(circle: Circle, to_stderr: bool) -> Self {
        Self {
            circle,
            parser: CommandParser::new(),
            to_stderr,
        }
    }

    /// Next parsed line; end of input counts as quit
    fn next_command(&self) -> Result<Command> {
        if self.to_stderr {
            eprint!("> ");
        } else {
            print!("> ");
            io::stdout().flush()?;
        }

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(Error::Quit);
        }
        match self.parser.parse(&line) {
            Command::Quit => Err(Error::Quit),
            command => Ok(command),
        }
    }
}

impl ParticipantInput for TerminalInput {
    fn click(&mut self, _prompt: &ClickPrompt) -> Result<Point> {
        loop {
            if let Some(point) = self.next_command()?.to_click(&self.circle) {
                return Ok(point);
            }
            say!(self.to_stderr, "{}", "Enter a click as 'x y' or an angle as '45deg'".yellow());
        }
    }

    fn confidence(&mut self, max: u8) -> Result<u8> {
        loop {
            if let Command::Digit(d) = self.next_command()? {
                return Ok(d);
            }
            say!(self.to_stderr, "{}", format!("Enter a digit from 1 to {}", max).yellow());
        }
    }

    fn wants_revision(&mut self) -> Result<bool> {
        loop {
            match self.next_command()? {
                Command::Yes => return Ok(true),
                Command::No => return Ok(false),
                _ => say!(self.to_stderr, "{}", "Enter Y or N".yellow()),
            }
        }
    }
}

/// Colored text rendering: participant blue, partner red, target yellow, arc green
struct TerminalRenderer {
    circle: Circle,
    to_stderr: bool,
}

impl TerminalRenderer {
    fn new(circle: Circle, to_stderr: bool) -> Self {
        Self { circle, to_stderr }
    }

    fn describe(&self, point: &Point) -> String {
        let (_, angle) = self.circle.angle_from_click(*point);
        format!(
            "{:6.1}° at ({:.0}, {:.0})",
            normalize_angle(angle).to_degrees(),
            point.x,
            point.y
        )
    }
}

impl Renderer for TerminalRenderer {
    fn show(&mut self, cue: &Cue) {
        match cue {
            Cue::BlockStarting(condition) => {
                say!(self.to_stderr);
                say!(self.to_stderr, "{}", format!("=== Condition: {} ===", condition).bold());
            }
            Cue::TrialStarting { condition, trial, of } => {
                say!(self.to_stderr);
                say!(self.to_stderr, "Trial {}/{} for {}", trial, of, condition);
            }
            Cue::Target(p) => say!(self.to_stderr, "{} {}", "Target:".yellow(), self.describe(p).yellow()),
            Cue::Distractors(points) => say!(self.to_stderr, "{}", format!("({} distractors)", points.len()).dimmed()),
            Cue::AwaitEstimate => say!(self.to_stderr, "Click on the circle to estimate the target location."),
            Cue::ParticipantEstimate(p) => say!(self.to_stderr, "{} {}", "You:    ".blue(), self.describe(p).blue()),
            Cue::AwaitConfidence { max } => say!(self.to_stderr, "Select your confidence on the target from 1-{}", max),
            Cue::PartnerEstimate(p) => say!(self.to_stderr, "{} {}", "Partner:".red(), self.describe(p).red()),
            Cue::OfferRevision => say!(self.to_stderr, "Do you want to revise your estimate? (Y/N)"),
            Cue::AllowedArc(arc) => {
                say!(
                    self.to_stderr,
                    "{}",
                    format!(
                        "Allowed arc: {:.1}° .. {:.1}°",
                        arc.min_angle.to_degrees(),
                        arc.max_angle.to_degrees()
                    )
                    .green()
                );
                say!(self.to_stderr, "Click within the allowed arc to revise your estimate.");
            }
            Cue::ClickRejected(p) => {
                say!(self.to_stderr, "{} {}", "Clicked outside the allowed arc:".yellow(), self.describe(p))
            }
            Cue::PartnerRevised(p) => {
                say!(self.to_stderr, "{} {}", "Partner's revised estimate:".red(), self.describe(p).red())
            }
            Cue::FinalEstimate(p) => say!(self.to_stderr, "{} {}", "Final estimate:".blue(), self.describe(p).blue()),
        }
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_header(mode: &str, no_color: bool) {
    let title = format!("  Visual Estimate v{} - {}", VERSION, mode);
    println!("========================================");
    if no_color {
        println!("{}", title);
    } else {
        println!("{}", title.bold());
    }
    println!("========================================");
    println!();
}

fn print_outcome(outcome: &TrialOutcome, json: bool) {
    if json {
        match serde_json::to_string(outcome) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("JSON error: {}", e),
        }
    } else {
        println!("{}", outcome.to_parseable_string().dimmed());
    }
}

fn print_summary(summary: &SessionSummary, path: String, json: bool) {
    if json {
        match serde_json::to_string(summary) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("JSON error: {}", e),
        }
        return;
    }

    println!();
    if summary.aborted {
        println!("{}", "Session ended early.".yellow());
    }
    println!("Trials recorded: {} -> {}", summary.trials_recorded, path);
    for c in &summary.conditions {
        println!(
            "  {:<14} trials={:<3} revisions={:<3} mean influence={:.3}",
            c.condition.to_string(),
            c.trials,
            c.revisions,
            c.mean_influence_ratio
        );
    }
}
