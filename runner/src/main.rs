use std::{error::Error, fmt, path::PathBuf};

use common::utils;
use log::{error, info};
use mos6502::{
  cpu::{Cpu, Variant},
  error::Fault,
  memory::Memory,
  mos6502::{Mos6502, Outcome},
  registers::Reg,
};
use structopt::StructOpt;

mod logging;

#[derive(StructOpt, Debug)]
#[structopt(name = "mos6502-run", about = "Runs a raw 6502 binary image")]
struct Cli {
  path: PathBuf,
  /// Where the image goes in memory
  #[structopt(long, default_value = "0000", parse(try_from_str = utils::parse_hex))]
  load_base: u16,
  /// Start address, unless --reset
  #[structopt(short, long, default_value = "0400", parse(try_from_str = utils::parse_hex))]
  entry: u16,
  /// Start from the reset vector at $FFFC
  #[structopt(short, long)]
  reset: bool,
  /// Stop successfully once PC gets here
  #[structopt(short, long, parse(try_from_str = utils::parse_hex))]
  success: Option<u16>,
  #[structopt(short, long, default_value = "100000000")]
  max_instructions: u64,
  /// Print the registers after every instruction
  #[structopt(short, long)]
  trace: bool,
  /// NES 2A03, ADC/SBC ignore the D flag
  #[structopt(long)]
  decimal_disabled: bool,
}

#[derive(Debug)]
enum RunnerError {
  Io(std::io::Error),
  EmptyImage,
  Fault(Fault),
  Trapped(u16),
  LimitReached(u64),
}

impl fmt::Display for RunnerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunnerError::Io(e) => write!(f, "failed to read image: {}", e),
      RunnerError::EmptyImage => write!(f, "image is empty"),
      RunnerError::Fault(fault) => write!(f, "{}", fault),
      RunnerError::Trapped(pc) => write!(f, "trapped at {:#06x}", pc),
      RunnerError::LimitReached(n) => write!(f, "no success after {} instructions", n),
    }
  }
}

impl Error for RunnerError {}

impl From<std::io::Error> for RunnerError {
  fn from(e: std::io::Error) -> Self {
    RunnerError::Io(e)
  }
}

impl From<Fault> for RunnerError {
  fn from(fault: Fault) -> Self {
    RunnerError::Fault(fault)
  }
}

fn main() -> Result<(), Box<dyn Error>> {
  let args: Cli = Cli::from_args();
  let _logger = logging::init()?;

  if let Err(e) = run(&args) {
    error!("{}", e);
    return Err(e.into());
  }

  Ok(())
}

fn run(args: &Cli) -> Result<(), RunnerError> {
  let image = std::fs::read(&args.path)?;
  if image.is_empty() {
    return Err(RunnerError::EmptyImage);
  }
  info!("Loaded {} bytes from {:?} at {:#06x}", image.len(), args.path, args.load_base);

  let variant = if args.decimal_disabled { Variant::Ricoh2A03 } else { Variant::Nmos };
  let mut cpu = Cpu::with_variant(Memory::load(&image, args.load_base), variant);

  if args.reset {
    cpu.reset();
  } else {
    // Test images set up their own stack, but not all of them.
    cpu.regs[Reg::SP] = 0xff;
    cpu.set_pc(args.entry);
  }
  info!("Starting at {:#06x} ({:?})", cpu.pc(), variant);

  let trace = args.trace;
  let success = args.success;
  let mut machine = Mos6502::new(cpu);
  let outcome = machine.run_until(
    |cpu| {
      if trace {
        println!("{}", cpu);
      }
      Some(cpu.pc()) == success
    },
    args.max_instructions,
  );

  info!(
    "{} instructions, {} cycles, pc {:#06x}",
    machine.instructions(),
    machine.cycles(),
    machine.cpu().pc()
  );

  match outcome? {
    Outcome::Reached => {
      info!("Reached success address");
      Ok(())
    }
    Outcome::Trapped(pc) => Err(RunnerError::Trapped(pc)),
    Outcome::LimitReached if success.is_none() => Ok(()),
    Outcome::LimitReached => Err(RunnerError::LimitReached(args.max_instructions)),
  }
}
