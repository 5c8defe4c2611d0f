use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use hotwatch::notify::Event;
use hotwatch::{
    blocking::{Flow, Hotwatch},
    EventKind,
};
use miette::{bail, miette, IntoDiagnostic, Result};

use lmc::output::Output;
use lmc::{Assembly, Halt, History, LabelTable, Processor, Status, TerminalHooks};

/// lmc is an assembler and virtual machine for a small 8-bit accumulator computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.asm` or binary `.bin` file directly and output to terminal
    Run {
        /// `.asm` or `.bin` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Give up after this many instructions, 0 for no limit
        #[arg(long)]
        max_steps: Option<u64>,
        /// Print registers and memory once the program halts
        #[arg(short, long)]
        dump: bool,
    },
    /// Create binary `.bin` memory image to run later
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination to output .bin file
        dest: Option<PathBuf>,
    },
    /// Check a `.asm` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Print the instructions held by a `.asm` or `.bin` file
    Disasm {
        /// `.asm` or `.bin` file to disassemble
        name: PathBuf,
    },
    /// Place a watch on a `.asm` file to receive constant assembler updates
    Watch {
        /// `.asm` file to watch
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    lmc::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(lmc::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                minimal,
                max_steps,
                dump,
            } => {
                let max_steps = max_steps.unwrap_or_else(lmc::env::max_steps);
                run(&name, minimal || lmc::env::is_minimal(), max_steps, dump)
            }
            Command::Compile { name, dest } => {
                file_message(Green, "Assembling", &name);
                let contents = fs::read_to_string(&name).into_diagnostic()?;
                let assembly = assemble(&contents)?;

                let out_file_name = dest.unwrap_or_else(|| name.with_extension("bin"));
                let bytes: Vec<u8> = assembly
                    .image()
                    .iter()
                    .flat_map(|word| word.to_be_bytes())
                    .collect();
                fs::write(&out_file_name, bytes).into_diagnostic()?;

                message(Green, "Finished", "emit binary");
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let contents = fs::read_to_string(&name).into_diagnostic()?;
                let _ = assemble(&contents)?;
                message(Green, "Success", "no errors found!");
                Ok(())
            }
            Command::Disasm { name } => {
                let (image, labels) = load(&name)?;
                // Trailing empty cells are padding
                let used = image
                    .iter()
                    .rposition(|word| *word != 0)
                    .map_or(image.len().min(1), |last| last + 1);
                let lines = lmc::disassemble_image(&image[..used], labels.as_ref());
                for (addr, (word, line)) in image.iter().zip(lines).enumerate() {
                    println!("{:>3}  {}  {}", addr, format!("{word:04x}").as_str().dimmed(), line);
                }
                Ok(())
            }
            Command::Watch { name } => watch(name),
        }
    } else if let Some(path) = args.path {
        run(&path, lmc::env::is_minimal(), lmc::env::max_steps(), false)
    } else {
        println!("\n~ lmc v{VERSION} - Copyright (c) 2024 Artemis Rosman ~");
        println!("{}", LOGO.truecolor(255, 183, 197).bold());
        println!("{SHORT_INFO}");
        std::process::exit(0);
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

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
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

fn run(name: &Path, minimal: bool, max_steps: u64, dump: bool) -> Result<()> {
    Output::set_minimal(minimal);
    file_message(MsgColor::Green, "Assembling", name);
    let (image, _) = load(name)?;

    let hooks = TerminalHooks {
        dump_memory: dump,
        ..TerminalHooks::new()
    };
    let mut processor = Processor::new(hooks);
    processor.load_memory(&image).into_diagnostic()?;

    message(MsgColor::Green, "Running", "emitted binary");
    let mut steps = 0;
    let halt = loop {
        if max_steps != 0 && steps >= max_steps {
            Output::Normal.start_new_line();
            bail!(
                code = "run::step_limit",
                help = "raise the limit with `--max-steps` or `LMC_MAX_STEPS`, 0 disables it",
                "Program did not halt within {max_steps} instructions"
            );
        }
        let status = processor.run_next_instruction().map_err(|fault| {
            miette!(
                code = "run::fault",
                help = "this word was not produced by the assembler",
                "Execution stopped: {fault}"
            )
        })?;
        match status {
            Status::Running => steps += 1,
            Status::Halted(halt) => break halt,
        }
    };
    Output::Normal.start_new_line();

    if dump {
        let registers = processor.registers();
        Output::Diagnostic(lmc::output::Condition::Always).print_registers(&registers);
        Output::Diagnostic(lmc::output::Condition::Always)
            .print_memory(processor.memory(), Some(registers.pc));
    }

    match halt {
        Halt::Error { kind, code: raised } => bail!(
            code = "run::err",
            "Program stopped with error {raised} ({kind})"
        ),
        Halt::End | Halt::Break => {
            file_message(MsgColor::Green, "Completed", name);
            Ok(())
        }
    }
}

/// Memory image of a `.asm` or `.bin` file, with labels when assembled.
fn load(name: &Path) -> Result<(Vec<u16>, Option<LabelTable>)> {
    let Some(ext) = name.extension() else {
        bail!("File has no extension. Exiting...");
    };
    match ext.to_str() {
        Some("bin") => {
            let buffer = fs::read(name).into_diagnostic()?;
            if buffer.len() % 2 != 0 {
                bail!("File is not aligned to 16 bits")
            }
            if buffer.len() > 2 * lmc::isa::MEMORY_SIZE {
                bail!(
                    "File holds {} words, memory only has room for {}",
                    buffer.len() / 2,
                    lmc::isa::MEMORY_SIZE
                )
            }
            let image = buffer
                .chunks_exact(2)
                .map(|word| u16::from_be_bytes([word[0], word[1]]))
                .collect();
            Ok((image, None))
        }
        Some("asm") => {
            let contents = fs::read_to_string(name).into_diagnostic()?;
            let assembly = assemble(&contents)?;
            let labels = assembly.labels().clone();
            Ok((assembly.into_image(), Some(labels)))
        }
        _ => bail!("File has unknown extension. Exiting..."),
    }
}

/// Translate source, printing every diagnostic if it fails.
fn assemble(contents: &str) -> Result<Assembly> {
    let assembly = lmc::AsmParser::new(contents).parse();
    if assembly.is_ok() {
        return Ok(assembly);
    }
    for diag in assembly.diagnostics() {
        eprintln!("{:?}", diag.report(contents));
    }
    Err(lmc::asm_failed(assembly.diagnostics().len()))
}

fn watch(name: PathBuf) -> Result<()> {
    use MsgColor::*;
    if !name.exists() {
        bail!("File does not exist. Exiting...")
    }
    // Vim breaks if watching a single file
    let folder_path = match name.parent() {
        Some(pth) if pth.is_dir() => pth.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    // Clear screen and move cursor to top left
    print!("\x1B[2J\x1B[2;1H");
    file_message(Green, "Watching", &name);
    message(Cyan, "Help", "press CTRL+C to exit");

    // Editors often emit several events for one save
    let mut revisions = History::new(fs::read_to_string(&name).into_diagnostic()?);

    let mut watcher =
        Hotwatch::new_with_custom_delay(Duration::from_millis(500)).into_diagnostic()?;

    watcher
        .watch(folder_path, move |event: Event| match event.kind {
            // Watch remove for vim changes
            EventKind::Modify(_) | EventKind::Remove(_) => {
                let contents = match fs::read_to_string(&name) {
                    Ok(cts) => cts,
                    Err(e) => {
                        eprintln!("{e}. Exiting...");
                        std::process::exit(1)
                    }
                };
                if *revisions.present() == contents {
                    return Flow::Continue;
                }
                revisions.push(contents);

                // Clear screen
                print!("\x1B[2J\x1B[2;1H");
                file_message(Green, "Watching", &name);
                message(Green, "Re-checking", "file change detected");
                message(Cyan, "Help", "press CTRL+C to exit");

                // Now we are developing software (makes reruns more obvious)
                sleep(Duration::from_millis(50));

                match assemble(revisions.present()) {
                    Ok(_) => message(Green, "Success", "no errors found!"),
                    Err(e) => println!("\n{:?}", e),
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        })
        .into_diagnostic()?;
    watcher.run();
    Ok(())
}

const LOGO: &str = r#"
 ___
|   |    _____   ____
|   |   /     \_/ ___\
|   |__|  Y Y  \  \___
|_____ \__|_|  /\___  >
      \/     \/     \/     "#;

const SHORT_INFO: &str = r"
Welcome to lmc, an assembler and virtual machine for a small
8-bit accumulator computer in the Little Man Computer tradition.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
