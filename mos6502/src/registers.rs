use core::ops::{Index, IndexMut};

use bitflags::bitflags;

bitflags! {
  pub struct Flag: u8 {
      const C = 0b00000001; // Carry
      const Z = 0b00000010; // Zero
      const I = 0b00000100; // Interrupt (IRQ disable)
      const D = 0b00001000; // Decimal (use BCD for arithmetics)
      const B = 0b00010000; // Break (only meaningful in the copy pushed to the stack)
      const UNUSED = 0b00100000; // Unused, always reads 1
      const V = 0b01000000; // Overflow
      const N = 0b10000000; // Negative

      const BUNUSEDMASK = Self::B.bits() | Self::UNUSED.bits();
  }
}

impl Flag {
  /// Status byte as it lands on the stack. PHP and BRK push B set, IRQ and NMI push it clear.
  pub fn pack(self, brk: bool) -> u8 {
    let mut res = self.bits() | Flag::UNUSED.bits();
    if brk {
      res |= Flag::B.bits();
    } else {
      res &= !Flag::B.bits();
    }
    res
  }

  /// Status byte pulled by PLP/RTI. Bits 4 and 5 aren't stored in the
  /// register, so they keep whatever `self` had.
  pub fn unpack(self, val: u8) -> Flag {
    let original_b_and_unused = self.bits() & Flag::BUNUSEDMASK.bits();
    Flag::from_bits_truncate((val & !Flag::BUNUSEDMASK.bits()) | original_b_and_unused)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
  AC = 0,
  X = 1,
  Y = 2,
  SP = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registers {
  pub pc: u16,
  pub flags: Flag,
  regs: [u8; 4],
}

impl Registers {
  // LIFO, top-down, 8 bit range, 0x0100 - 0x01FF
  pub const STACK_PAGE: u16 = 0x0100;

  /// Power-on values. S reaches $FD once a reset has run.
  pub fn new() -> Self {
    Self {
      pc: 0,
      flags: Flag::UNUSED | Flag::I,
      regs: [0; 4],
    }
  }

  pub fn flag(&self, flag: Flag) -> bool {
    self.flags.contains(flag)
  }

  pub fn set_flag(&mut self, flag: Flag, on: bool) {
    self.flags.set(flag, on);
  }

  /// Loads `reg` and recomputes N/Z from the loaded value.
  pub fn load(&mut self, reg: Reg, val: u8) {
    self[reg] = val;
    self.set_neg_zero(val);
  }

  pub fn set_neg_zero(&mut self, res: u8) {
    self.flags.set(Flag::Z, res == 0);
    self.flags.set(Flag::N, common::bits::is_signed(res));
  }

  /// Address the next push writes to. S moves down after the write.
  pub(crate) fn push_address(&mut self) -> u16 {
    let address = self.stack_address();
    self[Reg::SP] = self[Reg::SP].wrapping_sub(1);
    address
  }

  /// Address the next pull reads from. S moves up before the read.
  pub(crate) fn pull_address(&mut self) -> u16 {
    self[Reg::SP] = self[Reg::SP].wrapping_add(1);
    self.stack_address()
  }

  pub fn stack_address(&self) -> u16 {
    Self::STACK_PAGE | self[Reg::SP] as u16
  }
}

impl Default for Registers {
  fn default() -> Self {
    Self::new()
  }
}

impl Index<Reg> for Registers {
  type Output = u8;

  fn index(&self, reg: Reg) -> &u8 {
    &self.regs[reg as usize]
  }
}

impl IndexMut<Reg> for Registers {
  fn index_mut(&mut self, reg: Reg) -> &mut u8 {
    &mut self.regs[reg as usize]
  }
}
