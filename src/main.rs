use atac_nta::dispatcher::Dispatcher;
use atac_nta::instruction::Instruction;
use atac_nta::registry::Session;
use atac_nta::{config, emitter};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "atac-compile", version, about = "Timed-automaton assembly compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Builds an NTA document from an instruction stream.
    Build {
        /// Newline-delimited JSON instruction stream.
        instructions: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Optional file to write the resolved queries to, one per line.
        #[arg(long)]
        queries: Option<PathBuf>,
    },
    /// Runs the instruction stream through the builder without emitting
    /// anything, reporting every construction and finalize error found.
    Check { instructions: PathBuf },
}

fn run_session(path: &PathBuf) -> (Session, Dispatcher, usize) {
    let mut session = Session::new();
    let mut dispatcher = Dispatcher::new();
    let mut error_count = 0;

    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} could not read {}: {e}", "error:".red().bold(), path.display());
            return (session, dispatcher, 1);
        }
    };

    for (line_number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let instr: Instruction = match serde_json::from_str(line) {
            Ok(i) => i,
            Err(e) => {
                eprintln!(
                    "{} line {}: malformed instruction: {e}",
                    "error:".red().bold(),
                    line_number + 1
                );
                error_count += 1;
                continue;
            }
        };
        if let Err(e) = dispatcher.process(&mut session, instr) {
            eprintln!("{} line {}: {e}", "error:".red().bold(), line_number + 1);
            error_count += 1;
        }
    }

    for (template, e) in dispatcher.finalize(&mut session) {
        eprintln!("{} template '{}': {e}", "error:".red().bold(), template);
        error_count += 1;
    }

    (session, dispatcher, error_count)
}

fn main() -> ExitCode {
    config::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Check { instructions } => {
            let (_, _, errors) = run_session(&instructions);
            if errors == 0 {
                println!("{}", "ok".green().bold());
                ExitCode::SUCCESS
            } else {
                eprintln!("{} {errors} error(s)", "failed:".red().bold());
                ExitCode::FAILURE
            }
        }
        Command::Build { instructions, out, queries } => {
            let (session, dispatcher, errors) = run_session(&instructions);
            if errors > 0 {
                eprintln!("{} {errors} error(s), nothing written", "failed:".red().bold());
                return ExitCode::FAILURE;
            }

            let xml = match emitter::emit(&session) {
                Ok(xml) => xml,
                Err(e) => {
                    eprintln!("{} {e}", "error:".red().bold());
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = fs::write(&out, xml) {
                eprintln!("{} could not write {}: {e}", "error:".red().bold(), out.display());
                return ExitCode::FAILURE;
            }

            if let Some(queries_path) = queries {
                let text = dispatcher.queries().join("\n");
                match fs::File::create(&queries_path).and_then(|mut f| writeln!(f, "{text}")) {
                    Ok(()) => {}
                    Err(e) => {
                        eprintln!(
                            "{} could not write {}: {e}",
                            "error:".red().bold(),
                            queries_path.display()
                        );
                        return ExitCode::FAILURE;
                    }
                }
            }

            println!("{} wrote {}", "ok:".green().bold(), out.display());
            ExitCode::SUCCESS
        }
    }
}
