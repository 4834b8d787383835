use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use ls8::{Output, Program, RunState};

/// An emulator and toolchain for the LS-8, a tiny 8-bit teaching machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.ls8` or binary `.bin` file directly and output to terminal
    Run {
        /// `.ls8` or `.bin` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Print machine state before every instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the register file once the machine stops
        #[arg(short, long)]
        registers: bool,
    },
    /// Create binary `.bin` file to run later
    Compile {
        /// `.ls8` file to compile
        name: PathBuf,
        /// Destination to output `.bin` file
        dest: Option<PathBuf>,
    },
    /// Check a `.ls8` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    ls8::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                minimal,
                trace,
                registers,
            } => run(&name, minimal, trace, registers),
            Command::Compile { name, dest } => {
                file_message(Green, "Assembling", &name);
                let program = load(&name)?;

                let out_file_name = match dest {
                    Some(dest) => dest,
                    None => match name.with_extension("bin").file_name() {
                        Some(file_name) => file_name.into(),
                        None => bail!("Cannot derive output name from {}", name.display()),
                    },
                };
                let mut file = File::create(&out_file_name).into_diagnostic()?;
                file.write_all(&program.emit()).into_diagnostic()?;

                message(Green, "Finished", &format!("emit {} bytes", program.len()));
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let _ = load(&name)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, false, false, false)
    } else {
        println!("\n~ ls8 v{VERSION} ~");
        println!("{}", LOGO.truecolor(120, 200, 255).bold());
        println!("{SHORT_INFO}");
        Ok(())
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, minimal: bool, trace: bool, registers: bool) -> Result<()> {
    Output::set_minimal(minimal || ls8::env::is_minimal());

    file_message(MsgColor::Green, "Loading", name);
    let program = load(name)?;
    let mut state = RunState::try_from(&program)?;
    state.set_trace(trace || ls8::env::is_trace_enabled());

    message(MsgColor::Green, "Running", &format!("{} bytes", program.len()));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let res = state.run(&mut out);
    out.flush().into_diagnostic()?;

    if registers {
        Output::print_registers(&state);
    }
    match res {
        Ok(()) => {
            message(MsgColor::Cyan, "Halted", &format!("at address 0x{:02X}", state.pc()));
            Ok(())
        }
        Err(err) => {
            message(MsgColor::Red, "Aborted", &format!("at address 0x{:02X}", err.pc));
            Err(ls8::error::runtime_error(err))
        }
    }
}

/// Read a program from either the text or raw binary format, chosen by extension.
fn load(name: &Path) -> Result<Program> {
    let Some(ext) = name.extension() else {
        bail!("File has no extension. Exiting...");
    };
    match ext.to_str() {
        Some("ls8") => {
            let contents = fs::read_to_string(name).into_diagnostic()?;
            Program::parse(&contents)
        }
        Some("bin") => {
            let raw = fs::read(name).into_diagnostic()?;
            Program::from_raw(&raw)
        }
        _ => bail!("File has unknown extension. Exiting..."),
    }
}

const LOGO: &str = r#"
 _      ____    ___
| |    / ___|  ( _ )
| |    \___ \  / _ \
| |___  ___) || (_) |
|_____||____/  \___/"#;

const SHORT_INFO: &str = r"
Welcome to ls8, an emulator for the LS-8 eight-bit machine.
Programs are plain text files with one binary byte per line.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
