mod report;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser as ClapParser, Subcommand};
use dlsim::{BigInt, BigUint, Simulator, SimulatorOptions};
use miette::{IntoDiagnostic, Result, miette};
use report::{PinsReport, RunReport};

#[derive(ClapParser)]
#[command(name = "dlsim", version, about = "Simulate combinational netlists")]
struct Cli {
    /// Log build and run progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the pins of the top module
    Pins {
        file: PathBuf,
        #[arg(long)]
        top: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Set inputs, run once and print every output
    Run {
        file: PathBuf,
        #[arg(long)]
        top: String,
        /// Input assignment such as `A=5`, `B=-3` or `Op=0x8`
        #[arg(long = "set", value_name = "PIN=VALUE")]
        sets: Vec<String>,
        /// TOML file with a `[simulation]` table
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write a VCD dump of the run
        #[arg(long)]
        vcd: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

/// A value from the command line, written signed only when it is negative.
#[derive(Debug, Clone, PartialEq)]
enum PinValue {
    Unsigned(BigUint),
    Signed(BigInt),
}

fn parse_assignment(text: &str) -> Result<(&str, PinValue)> {
    let (pin, value) = text
        .split_once('=')
        .ok_or_else(|| miette!("expected PIN=VALUE, got `{text}`"))?;
    let pin = pin.trim();
    if pin.is_empty() {
        return Err(miette!("missing pin name in `{text}`"));
    }
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    let digits = digits.replace('_', "");
    let magnitude = BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| miette!("invalid value `{value}` for pin `{pin}`"))?;
    let value = if negative {
        PinValue::Signed(-BigInt::from(magnitude))
    } else {
        PinValue::Unsigned(magnitude)
    };
    Ok((pin, value))
}

fn apply(sim: &mut Simulator, pin: &str, value: PinValue) -> Result<()> {
    match value {
        PinValue::Unsigned(v) => sim.set_pin_wide(pin, v)?,
        PinValue::Signed(v) => sim.set_pin_signed_wide(pin, &v)?,
    }
    Ok(())
}

fn build(file: &Path, top: &str, options: SimulatorOptions) -> Result<Simulator> {
    let code = fs::read_to_string(file)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("cannot read {}", file.display())))?;
    let name = file.display().to_string();
    let sim = Simulator::builder(&code, top)
        .source_name(&name)
        .options(options)
        .build()?;
    Ok(sim)
}

fn emit<T: serde::Serialize + std::fmt::Display>(report: &T, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).into_diagnostic()?;
        println!("{text}");
    } else {
        print!("{report}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::Pins { file, top, json } => {
            let sim = build(&file, &top, SimulatorOptions::default())?;
            emit(&PinsReport::new(&sim), json)
        }
        Command::Run {
            file,
            top,
            sets,
            config,
            vcd,
            json,
        } => {
            let mut options = match config {
                Some(path) => SimulatorOptions::load(path)?,
                None => SimulatorOptions::default(),
            };
            if vcd.is_some() {
                options.vcd = vcd;
            }
            let mut sim = build(&file, &top, options)?;
            for text in &sets {
                let (pin, value) = parse_assignment(text)?;
                log::debug!("{pin} <- {value:?}");
                apply(&mut sim, pin, value)?;
            }
            sim.run()?;
            emit(&RunReport::collect(&sim)?, json)
        }
    }
}
