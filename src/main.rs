//! picoMIPS Simulator - CLI Entry Point
//!
//! Commands:
//! - `picomips-sim run <program>` - Load a built-in program and run it
//! - `picomips-sim debug <program>` - Interactive debugger
//! - `picomips-sim list` - List the built-in programs
//! - `picomips-sim dump <program>` - Show the loaded memory image

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use picomips::host::{ConfirmPrompt, DEFAULT_MAX_STEPS};
use picomips::trace::{format_memory, Tracer};
use picomips::{programs, ProgramImage, Session, SimConfig};

#[derive(Parser)]
#[command(name = "picomips-sim")]
#[command(version = "0.1.0")]
#[command(about = "An instruction-set simulator for the 16-bit picoMIPS teaching architecture")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        #[command(flatten)]
        program: ProgramArgs,
        /// Maximum number of steps to run (0 for no limit)
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: u64,
        /// Print every instruction and the register file
        #[arg(short, long)]
        trace: bool,
        /// Wait for Enter before each instruction
        #[arg(short, long)]
        step: bool,
        /// Print the run report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        #[command(flatten)]
        program: ProgramArgs,
    },
    /// List the built-in programs
    List,
    /// Show the data and code segments of a program
    Dump {
        #[command(flatten)]
        program: ProgramArgs,
    },
}

#[derive(Args)]
struct ProgramArgs {
    /// Built-in program name (see `list`)
    name: String,
    /// Override operand A
    #[arg(short = 'a', long, allow_hyphen_values = true)]
    a: Option<i16>,
    /// Override operand B
    #[arg(short = 'b', long, allow_hyphen_values = true)]
    b: Option<i16>,
}

impl ProgramArgs {
    fn image(&self) -> ProgramImage {
        match programs::with_operands(&self.name, self.a, self.b) {
            Some(image) => image,
            None => {
                eprintln!("❌ Unknown program '{}'. Known: {}", self.name, programs::NAMES.join(", "));
                std::process::exit(1);
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Run { program, max_steps, trace, step, json }) => {
            let config = SimConfig {
                max_steps: (max_steps > 0).then_some(max_steps),
                trace,
                confirm: step,
            };
            run_program(program.image(), &config, json);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program }) => {
            debug_program(program.image());
        }
        Some(Commands::List) => list_programs(),
        Some(Commands::Dump { program }) => dump_program(program.image()),
        None => {
            println!("picoMIPS Simulator v0.1.0");
            println!();
            println!("Use --help for available commands");
            println!();
            list_programs();
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("⚠️  Failed to initialise logging: {}", e);
    }
}

fn load_session(image: ProgramImage) -> Session {
    match Session::load(image) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("❌ Failed to load program: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_segments(session: &Session) {
    let mem = &session.machine.mem;
    let program = &session.program;
    print!("{}", format_memory(mem, Some("DATA"), program.data.start, program.data.end));
    print!("{}", format_memory(mem, Some("CODE"), program.code.start, program.code.end));
}

fn run_program(image: ProgramImage, config: &SimConfig, json: bool) {
    use std::io::{self, Write};

    let mut session = load_session(image);

    if !json {
        println!("========================================");
        println!(" picoMIPS Simulator: {}", session.image.name);
        println!("   {}", session.image.description);
        println!("========================================");
        println!("*** Load ***");
        print_segments(&session);
        println!("*** Run ***");
    }

    // Trace goes to stderr when stdout carries JSON
    let tracer = config.trace.then(|| {
        let out: Box<dyn Write> = if json {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        };
        Tracer::new(out)
    });
    let prompt = config
        .confirm
        .then(|| ConfirmPrompt::new(io::stdin().lock(), io::stderr()));

    let mut hooks = (tracer, prompt);
    let report = session.run(config, &mut hooks);

    if let Some(tracer) = hooks.0 {
        if let Err(e) = tracer.finish() {
            eprintln!("⚠️  Trace output failed: {}", e);
        }
    }

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("❌ Failed to encode report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("*** Exit {} ({}) after {} steps ***", report.exit_code, report.termination, report.steps);
        let program = &session.program;
        print!(
            "{}",
            format_memory(&session.machine.mem, Some("DATA"), program.data.start, program.data.end)
        );
    }

    std::process::exit(report.exit_code);
}

#[cfg(feature = "tui")]
fn debug_program(image: ProgramImage) {
    use picomips::run_debugger;

    println!("🔍 Loading: {}", image.name);

    if let Err(e) = run_debugger(image) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn list_programs() {
    println!("Built-in programs:");
    for name in programs::NAMES {
        if let Some(image) = programs::find(name) {
            let a = image.data.words[0] as i16;
            let b = image.data.words[1] as i16;
            println!("  {:<12} {}  (A = {}, B = {})", name, image.description, a, b);
        }
    }
}

fn dump_program(image: ProgramImage) {
    let session = load_session(image);
    println!("{}: {}", session.image.name, session.image.description);
    println!("entry: {:04X}", session.program.entry);
    print_segments(&session);
}
