use alloc::boxed::Box;
use common::kilobytes;

/// Everything the CPU can see. Reads take `&mut self` since reading a device
/// register may change it (acknowledge, auto-increment, ...).
pub trait Bus {
  fn read8(&mut self, address: u16) -> u8;
  fn write8(&mut self, address: u16, val: u8);
}

impl<B: Bus + ?Sized> Bus for &mut B {
  fn read8(&mut self, address: u16) -> u8 {
    (**self).read8(address)
  }

  fn write8(&mut self, address: u16, val: u8) {
    (**self).write8(address, val)
  }
}

/// Flat 64K of RAM, no mirroring, no devices.
pub struct Memory(Box<[u8; kilobytes::KB64]>);

impl Memory {
  pub fn new() -> Self {
    Self(Box::new([0x00; kilobytes::KB64]))
  }

  /// Copies `program` to `base`. Whatever doesn't fit below 0x10000 is dropped.
  pub fn load(program: &[u8], base: u16) -> Self {
    let mut mem = Self::new();
    mem.copy_from(program, base);
    mem
  }

  pub fn copy_from(&mut self, program: &[u8], base: u16) {
    let base = base as usize;
    let len = program.len().min(kilobytes::KB64 - base);
    self.0[base..base + len].copy_from_slice(&program[..len]);
  }

  /// Little-endian word, e.g. for setting up vectors.
  pub fn write16(&mut self, address: u16, val: u16) {
    self.0[address as usize] = common::bits::lo(val);
    self.0[address.wrapping_add(1) as usize] = common::bits::hi(val);
  }

  pub fn peek(&self, address: u16) -> u8 {
    self.0[address as usize]
  }
}

impl Default for Memory {
  fn default() -> Self {
    Self::new()
  }
}

impl Bus for Memory {
  fn read8(&mut self, address: u16) -> u8 {
    self.0[address as usize]
  }

  fn write8(&mut self, address: u16, val: u8) {
    self.0[address as usize] = val;
  }
}
