#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod address_mode;
mod alu;
pub mod cpu;
pub mod instructions;
pub mod memory;
pub mod mos6502;
pub mod registers;

pub use address_mode::AddressMode;

pub mod error {
  use core::fmt;

  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub enum Fault {
    /// `opcode` at `pc` has no entry in the dispatch table.
    IllegalOpcode { opcode: u8, pc: u16 },
  }

  impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self {
        Fault::IllegalOpcode { opcode, pc } => {
          write!(f, "illegal opcode {:#04x} at {:#06x}", opcode, pc)
        }
      }
    }
  }

  #[cfg(feature = "std")]
  impl std::error::Error for Fault {}
}
