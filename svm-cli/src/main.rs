//! Command-line driver: `svm help|asm|run`. Deliberately thin and kept
//! outside the core's testable surface (§1's "deliberately out of
//! scope" list) — this crate owns file I/O and the demonstration host;
//! the core crates own everything else.

#[macro_use]
extern crate clap;

mod host_demo;

use std::process;

use clap::{AppSettings, Arg, SubCommand};

use host_demo::DemoHost;
use svm::{ImageMeta, Vm};

#[derive(Debug)]
enum CliError {
    Io(std::io::Error, &'static str),
    Asm(svm_asm::AssemblerError),
    Vm(svm::VmError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CliError::Io(err, what) => write!(f, "{} failed: {}", what, err),
            CliError::Asm(err) => write!(f, "assembling input failed: {}", err),
            CliError::Vm(err) => write!(f, "execution faulted: {}", err),
        }
    }
}

impl CliError {
    /// Numeric exit code. `0` is reserved for success and `1` for a
    /// usage error, so both namespaces start at `2` and run in
    /// declaration order (§6/§7: "any svm_error or svm_asm_error
    /// numeric value on fault").
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Io(..) => 1,
            CliError::Asm(err) => 20 + asm_error_index(err),
            CliError::Vm(err) => 40 + vm_error_index(err),
        }
    }
}

fn asm_error_index(err: &svm_asm::AssemblerError) -> i32 {
    use svm_asm::AssemblerError::*;
    match err {
        ExpectedToken(_) => 0,
        ArgConstraintUnsatisfied { .. } => 1,
        UndefinedLabel(_) => 2,
    }
}

fn vm_error_index(err: &svm::VmError) -> i32 {
    use svm::VmError::*;
    match err {
        NotRunning => 0,
        CodeOverflow => 1,
        ArgNotReg => 2,
        PushArgBadOrder => 3,
        JmpOverflow => 4,
        CallStackOverflow => 5,
        CallStackUnderflow => 6,
        StackOverflow => 7,
        StackUnderflow => 8,
        TaskNotFound => 9,
        TaskSwitchBlocked => 10,
        UnknownInstruction => 11,
        DivisionByZero => 12,
        NoLiveTasks => 13,
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let matches = app_from_crate!()
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("asm")
                .about("Assembles a source file and prints a hex dump of the image")
                .arg(Arg::with_name("FILE").required(true).index(1)),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("Assembles and executes a source file")
                .arg(Arg::with_name("FILE").required(true).index(1))
                .arg(
                    Arg::with_name("max_cycles")
                        .short("c")
                        .long("max-cycles")
                        .takes_value(true)
                        .value_name("N")
                        .help("Stops after N cycles even if the program hasn't hit END"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("asm", Some(sub)) => cmd_asm(sub.value_of("FILE").unwrap()),
        ("run", Some(sub)) => {
            let max_cycles: u64 = sub
                .value_of("max_cycles")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000_000);
            cmd_run(sub.value_of("FILE").unwrap(), max_cycles)
        }
        // `SubcommandRequiredElseHelp` guarantees one of the above (or
        // clap's own built-in `help`) already matched and exited.
        _ => unreachable!(),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(err.exit_code());
    }
}

fn read_source(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|err| CliError::Io(err, "reading input file"))
}

fn cmd_asm(path: &str) -> Result<(), CliError> {
    let source = read_source(path)?;
    let code = svm_asm::assemble(&source).map_err(CliError::Asm)?;
    for word in &code {
        println!("{:08x}", word);
    }
    Ok(())
}

fn cmd_run(path: &str, max_cycles: u64) -> Result<(), CliError> {
    let source = read_source(path)?;
    let code = svm_asm::assemble(&source).map_err(CliError::Asm)?;

    let mut vm = Vm::new(&code, ImageMeta::default(), DemoHost);
    let mut cycles = 0u64;
    while vm.is_running() && cycles < max_cycles {
        vm.cycle().map_err(CliError::Vm)?;
        cycles += 1;
    }

    let task = vm.current_task();
    println!("cycles executed: {}", cycles);
    println!("registers: {:?}", task.registers());
    Ok(())
}
