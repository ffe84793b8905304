//! Run a Z80 program on the interpreter and report where it stopped.
//!
//! Usage:
//!   z80-runner game.bin --load 0x8000 --max-tacts 3500000
//!   z80-runner --mode cpm zexdoc.com

mod cpm;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use emu_core::{MasterClock, Observable, SimpleBus};
use log::{LevelFilter, info, warn};
use zilog_z80::{BranchEvent, BranchObserver, Z80};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Load the image at `--load` and run until HALT with interrupts off.
    Raw,
    /// Load a CP/M `.com` at 0100h with a BDOS console.
    Cpm,
}

#[derive(Parser, Debug)]
#[command(name = "z80-runner", about = "Run a Z80 binary or CP/M program on the interpreter")]
struct Args {
    /// Program image.
    image: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Raw)]
    mode: Mode,

    /// Load address for raw images (decimal, 0x-prefixed or H-suffixed hex).
    #[arg(long, value_parser = parse_address, default_value = "0x8000")]
    load: u16,

    /// Start address for raw images; defaults to the load address.
    #[arg(long, value_parser = parse_address)]
    start: Option<u16>,

    /// Stop after this many T-states.
    #[arg(long, value_name = "N")]
    max_tacts: Option<u64>,

    /// Raise a maskable interrupt every 50 Hz frame of a 3.5 MHz machine.
    #[arg(long, default_value_t = false)]
    frame_interrupts: bool,

    /// Log every branch at info level.
    #[arg(long, default_value_t = false)]
    trace_branches: bool,

    /// Enable debug logging (RUST_LOG overrides).
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_address(text: &str) -> Result<u16, String> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else if let Some(hex) = text.strip_suffix(['h', 'H']) {
        u16::from_str_radix(hex, 16)
    } else {
        text.parse()
    };
    parsed.map_err(|e| format!("invalid address '{text}': {e}"))
}

/// T-states the ULA holds INT low at the start of a frame.
const INT_LENGTH: u64 = 32;

struct BranchTrace;

impl BranchObserver for BranchTrace {
    fn on_branch(&mut self, event: &BranchEvent) {
        if event.taken {
            info!("{:>12} {:04X} {} -> {:04X}", event.tacts, event.address, event.mnemonic, event.target);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new().filter_level(default_level).parse_default_env().init();

    let image = std::fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    if image.is_empty() {
        bail!("{} is empty", args.image.display());
    }

    match args.mode {
        Mode::Raw => run_raw(&args, &image),
        Mode::Cpm => run_cpm(&args, &image),
    }
}

fn run_raw(args: &Args, image: &[u8]) -> Result<()> {
    if image.len() > 0x10000 {
        bail!("image is {} bytes, larger than the 64K address space", image.len());
    }
    let mut bus = SimpleBus::new();
    bus.load(args.load, image);

    let mut cpu = Z80::new();
    cpu.regs_mut().pc = args.start.unwrap_or(args.load);
    if args.trace_branches {
        cpu.set_branch_observer(Some(Box::new(BranchTrace)));
    }

    let frame = MasterClock::SPECTRUM_48K.tacts_per_frame(50);
    let mut next_frame = frame;
    let started = Instant::now();
    let mut instructions: u64 = 0;

    loop {
        if args.max_tacts.is_some_and(|limit| cpu.tacts() >= limit) {
            info!("tact limit reached");
            break;
        }
        if cpu.regs().halted && !(args.frame_interrupts && cpu.regs().iff1) {
            info!("halted at {:04X}", cpu.regs().pc);
            break;
        }
        if args.frame_interrupts {
            if cpu.tacts() >= next_frame {
                cpu.request_interrupt(0xFF);
                next_frame += frame;
            } else if cpu.interrupt_pending() && cpu.tacts() >= next_frame - frame + INT_LENGTH {
                cpu.cancel_interrupt();
            }
        }
        cpu.execute_one(&mut bus);
        instructions += 1;
    }

    report(&cpu, instructions, started);
    info!("{} port writes", bus.port_writes.len());
    Ok(())
}

fn run_cpm(args: &Args, image: &[u8]) -> Result<()> {
    let mut machine = cpm::CpmMachine::new(image);
    if args.trace_branches {
        machine.cpu.set_branch_observer(Some(Box::new(BranchTrace)));
    }
    let started = Instant::now();
    let exit = machine.run(args.max_tacts, |text| {
        print!("{text}");
        if let Err(e) = std::io::stdout().flush() {
            warn!("console flush failed: {e}");
        }
    });
    println!();
    info!("{exit:?} at {:04X}", machine.cpu.regs().pc);
    report(&machine.cpu, 0, started);
    if machine.output.contains("ERROR") {
        bail!("program reported errors");
    }
    Ok(())
}

fn report(cpu: &Z80, instructions: u64, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    if instructions > 0 {
        info!("{instructions} instructions, {} tacts in {elapsed:.2}s", cpu.tacts());
    } else {
        info!("{} tacts in {elapsed:.2}s", cpu.tacts());
    }
    let line: Vec<String> = cpu
        .snapshot()
        .into_iter()
        .filter(|(path, _)| !path.starts_with("flags.") && path.len() <= 3)
        .map(|(path, value)| format!("{path}={value}"))
        .collect();
    info!("{}", line.join(" "));
}
