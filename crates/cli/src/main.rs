//! Workload driver for the vmachine translation core.
//!
//! Stands in for the instruction executor and the kernel: it builds a
//! machine from a JSON configuration plus flag overrides, runs synthetic
//! user programs in round-robin over their own address spaces and reports
//! translation statistics.

use std::process;

use clap::{Parser, ValueEnum};
use log::info;

use vmachine::{Config, Machine, MachineError, ThreadId, TranslationMode, VirtualDisk};

mod workload;

use crate::workload::{Kernel, Program, RandomProgram, SortProgram};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Cached,
    Direct,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WorkloadArg {
    /// Bubble-sort a reverse-ordered array in every thread.
    Sort,
    /// Random reads and writes checked against a shadow copy.
    Random,
}

#[derive(Parser, Debug)]
#[command(
    name = "vmachine",
    author,
    version,
    about = "Runs paging workloads over the simulated user machine",
    long_about = None,
)]
struct Cli {
    /// JSON machine configuration.
    #[arg(short, long)]
    config: Option<String>,

    /// Translation strategy (overrides the configuration).
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// TLB slots (overrides the configuration).
    #[arg(long)]
    tlb_size: Option<usize>,

    /// Physical frames (overrides the configuration).
    #[arg(long)]
    frames: Option<usize>,

    /// Seed for victim selection and the random workload.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, value_enum, default_value = "sort")]
    workload: WorkloadArg,

    /// Number of user threads.
    #[arg(short, long, default_value_t = 2)]
    threads: u32,

    /// Array length per thread for the sort workload.
    #[arg(long, default_value_t = 128)]
    elements: u32,

    /// References per thread for the random workload.
    #[arg(long, default_value_t = 5_000)]
    accesses: u32,

    /// Steps a thread runs before the next one is scheduled.
    #[arg(long, default_value_t = 64)]
    quantum: u32,

    /// Log every translation.
    #[arg(long)]
    trace: bool,

    /// Print statistics as JSON instead of the text report.
    #[arg(long)]
    json_stats: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("\n\x1b[1;31m[!] FATAL:\x1b[0m {}", e);
        process::exit(1);
    }
}

fn build_config(cli: &Cli) -> Result<Config, MachineError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(mode) = cli.mode {
        config.translation.mode = match mode {
            ModeArg::Cached => TranslationMode::Cached,
            ModeArg::Direct => TranslationMode::Direct,
        };
    }
    if let Some(size) = cli.tlb_size {
        config.translation.tlb_size = size;
    }
    if let Some(frames) = cli.frames {
        config.memory.num_phys_pages = frames;
    }
    if let Some(seed) = cli.seed {
        config.translation.random_seed = seed;
    }
    if cli.trace {
        config.general.trace = true;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), MachineError> {
    let config = build_config(cli)?;
    if cli.threads == 0 {
        return Err(MachineError::InvalidConfig("need at least one thread".into()));
    }
    let mut machine = Machine::new(&config)?;
    info!(
        "[*] {:?} translation, {} frames x {} bytes, {} thread(s)",
        machine.translation_mode(),
        config.memory.num_phys_pages,
        config.memory.page_size,
        cli.threads
    );

    let space_bytes = config.memory.backing_size() as u32;
    let mut programs: Vec<(ThreadId, Box<dyn Program>)> = Vec::new();
    for t in 1..=cli.threads {
        let tid = ThreadId(t);
        machine.register_thread(tid, Box::new(VirtualDisk::new(space_bytes as usize)))?;
        let program: Box<dyn Program> = match cli.workload {
            WorkloadArg::Sort => Box::new(SortProgram::new(cli.elements, space_bytes)?),
            WorkloadArg::Random => {
                let seed = cli.seed.unwrap_or(config.translation.random_seed);
                Box::new(RandomProgram::new(
                    seed ^ u64::from(t).wrapping_mul(0x9E37_79B9),
                    cli.accesses,
                    space_bytes,
                ))
            }
        };
        programs.push((tid, program));
    }

    let mut kernel = Kernel::default();
    for (tid, program) in programs.iter_mut() {
        machine.switch_to(*tid)?;
        program.load(&mut machine, &mut kernel)?;
    }

    // Round-robin until every program finishes.
    let mut live = programs.len();
    while live > 0 {
        live = 0;
        for (tid, program) in programs.iter_mut() {
            if program.finished() {
                continue;
            }
            machine.switch_to(*tid)?;
            for _ in 0..cli.quantum {
                if program.step(&mut machine, &mut kernel)? {
                    break;
                }
                machine.advance_pc();
            }
            if !program.finished() {
                live += 1;
            }
        }
    }

    for (tid, program) in programs.iter_mut() {
        machine.switch_to(*tid)?;
        program.verify(&mut machine, &mut kernel)?;
        info!("[*] thread {} verified", tid);
    }

    if cli.json_stats {
        match serde_json::to_string_pretty(machine.stats()) {
            Ok(json) => println!("{}", json),
            Err(e) => return Err(MachineError::Handler(format!("stats encoding: {}", e))),
        }
    } else {
        machine.stats().print();
    }
    Ok(())
}
