use common::bits;

use crate::{cpu::Cpu, memory::Bus, registers::Reg};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
  Abs,
  AbsX,
  AbsY,
  Acc,
  Imm,
  Impl,
  Ind,
  IndX,
  IndY,
  Rel,
  Zero,
  ZeroX,
  ZeroY,
}

/// What the instruction is going to do at the effective address. Indexed
/// reads only pay for the high-byte fixup when the low byte carried; writes
/// and read-modify-writes always spend that cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Access {
  Read,
  Write,
}

impl AddressMode {
  pub fn operand_bytes(&self) -> u8 {
    match self {
      AddressMode::Acc | AddressMode::Impl => 0,
      AddressMode::Abs | AddressMode::AbsX | AddressMode::AbsY | AddressMode::Ind => 2,
      _ => 1,
    }
  }

  /// Effective address of the operand. Consumes the operand bytes at PC and
  /// charges every bus cycle spent on the way, dead ones included. Only
  /// called for modes that have one; `Imm` hands back the address of the
  /// immediate byte itself so the caller's read charges its cycle.
  pub(crate) fn resolve<B: Bus>(&self, cpu: &mut Cpu<B>, access: Access) -> u16 {
    match self {
      AddressMode::Imm => {
        let address = cpu.regs.pc;
        cpu.regs.pc = cpu.regs.pc.wrapping_add(1);
        address
      }
      AddressMode::Zero => cpu.fetch() as u16,
      AddressMode::ZeroX => self.resolve_zeropage_indexed(cpu, Reg::X),
      AddressMode::ZeroY => self.resolve_zeropage_indexed(cpu, Reg::Y),
      AddressMode::Abs => cpu.fetch16(),
      AddressMode::AbsX => {
        let base = cpu.fetch16();
        let index = cpu.regs[Reg::X];
        self.cycle_aware_add(cpu, base, index, access)
      }
      AddressMode::AbsY => {
        let base = cpu.fetch16();
        let index = cpu.regs[Reg::Y];
        self.cycle_aware_add(cpu, base, index, access)
      }
      AddressMode::Ind => {
        let pointer = cpu.fetch16();
        self.read16_same_page(cpu, pointer)
      }
      AddressMode::IndX => {
        // Zeropage, no carry
        let zp = cpu.fetch();
        let _ = cpu.read(zp as u16);
        let pointer = zp.wrapping_add(cpu.regs[Reg::X]);
        self.read16_same_page(cpu, pointer as u16)
      }
      AddressMode::IndY => {
        let zp = cpu.fetch();
        let base = self.read16_same_page(cpu, zp as u16);
        let index = cpu.regs[Reg::Y];
        self.cycle_aware_add(cpu, base, index, access)
      }
      AddressMode::Acc | AddressMode::Impl | AddressMode::Rel => {
        unreachable!("{:?} has no effective address", self)
      }
    }
  }

  fn resolve_zeropage_indexed<B: Bus>(&self, cpu: &mut Cpu<B>, index: Reg) -> u16 {
    let zp = cpu.fetch();
    // The index is added while the unindexed address is on the bus.
    let _ = cpu.read(zp as u16);
    zp.wrapping_add(cpu.regs[index]) as u16
  }

  fn cycle_aware_add<B: Bus>(&self, cpu: &mut Cpu<B>, base: u16, index: u8, access: Access) -> u16 {
    let address = base.wrapping_add(index as u16);
    let crossed_page = bits::is_page_crossed(base, address);
    if crossed_page || access == Access::Write {
      // Low byte added, high byte not fixed up yet.
      let unfixed = bits::word(bits::lo(address), bits::hi(base));
      let _ = cpu.read(unfixed);
    }
    address
  }

  /// Pointer lookups never carry into the next page: `($30ff)` takes its
  /// high byte from $3000, `($ff),y` from $0000.
  fn read16_same_page<B: Bus>(&self, cpu: &mut Cpu<B>, pointer: u16) -> u16 {
    let low = cpu.read(pointer);
    let high = cpu.read(bits::word(bits::lo(pointer).wrapping_add(1), bits::hi(pointer)));
    bits::word(low, high)
  }
}
