use log::trace;

use crate::cpu::Cpu;
use crate::error::Fault;
use crate::memory::Bus;

/// How `run_until` stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
  /// The predicate held after an instruction.
  Reached,
  /// An instruction left PC where it was, e.g. `JMP *` or `BNE *`. Test
  /// ROMs park there on failure.
  Trapped(u16),
  LimitReached,
}

pub struct Mos6502<B> {
  pub cpu: Cpu<B>,
  instructions: u64,
}

impl<B: Bus> Mos6502<B> {
  pub fn new(cpu: Cpu<B>) -> Self {
    Self { cpu, instructions: 0 }
  }

  pub fn cpu(&self) -> &Cpu<B> {
    &self.cpu
  }

  pub fn cpu_mut(&mut self) -> &mut Cpu<B> {
    &mut self.cpu
  }

  /// Instructions executed so far. Interrupt entries and faults don't count.
  pub fn instructions(&self) -> u64 {
    self.instructions
  }

  pub fn cycles(&self) -> u64 {
    self.cpu.cycles()
  }

  // The clock ticks Hzhzhzhz
  pub fn step(&mut self) -> Result<u64, Fault> {
    trace!("{}", self.cpu);
    let servicing_interrupt = self.cpu.interrupt_pending();
    let cycles = self.cpu.step()?;
    if !servicing_interrupt {
      self.instructions += 1;
    }
    Ok(cycles)
  }

  /// Runs whole instructions until at least `budget` cycles have passed.
  /// Returns the cycles actually spent, which can overshoot by part of an
  /// instruction.
  pub fn run_for(&mut self, budget: u64) -> Result<u64, Fault> {
    let start = self.cpu.cycles();
    while self.cpu.cycles() - start < budget {
      self.step()?;
    }
    Ok(self.cpu.cycles() - start)
  }

  /// Steps until `done` holds after an instruction, PC stops moving, or
  /// `max_instructions` have run.
  pub fn run_until<F>(&mut self, mut done: F, max_instructions: u64) -> Result<Outcome, Fault>
  where
    F: FnMut(&Cpu<B>) -> bool,
  {
    for _ in 0..max_instructions {
      let pc = self.cpu.pc();
      self.step()?;

      if done(&self.cpu) {
        return Ok(Outcome::Reached);
      }

      if self.cpu.pc() == pc {
        return Ok(Outcome::Trapped(pc));
      }
    }

    Ok(Outcome::LimitReached)
  }
}
