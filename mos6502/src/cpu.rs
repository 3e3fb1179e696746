use core::fmt;

use common::bits;
use log::{debug, trace, warn};

use crate::address_mode::{Access, AddressMode};
use crate::error::Fault;
use crate::instructions::{Instruction, Opcode, Shape};
use crate::memory::Bus;
use crate::registers::{Flag, Reg, Registers};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
  /// Stock NMOS 6502, BCD arithmetic when D is set.
  #[default]
  Nmos,
  /// NES CPU. The D flag exists but ADC/SBC ignore it.
  Ricoh2A03,
}

impl Variant {
  pub fn has_decimal_mode(&self) -> bool {
    matches!(self, Variant::Nmos)
  }
}

pub struct Cpu<B> {
  pub regs: Registers,
  pub bus: B,
  cycles: u64,
  variant: Variant,
  nmi_pending: bool,
  irq_line: bool,
  // I as the IRQ poll sees it for one instruction after CLI, SEI or PLP.
  polled_i: Option<bool>,
}

impl<B: Bus> Cpu<B> {
  const NMI_VECTOR: u16 = 0xfffa;
  const RESET_VECTOR: u16 = 0xfffc;
  const IRQ_VECTOR: u16 = 0xfffe;

  pub fn new(bus: B) -> Self {
    Self::with_variant(bus, Variant::Nmos)
  }

  /// Power-on state, nothing touches the bus until the first `reset` or `step`.
  pub fn with_variant(bus: B, variant: Variant) -> Self {
    Self {
      regs: Registers::new(),
      bus,
      cycles: 0,
      variant,
      nmi_pending: false,
      irq_line: false,
      polled_i: None,
    }
  }

  pub fn pc(&self) -> u16 {
    self.regs.pc
  }

  pub fn set_pc(&mut self, pc: u16) {
    self.regs.pc = pc
  }

  /// Cycles elapsed since construction. Never goes backwards.
  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  pub fn variant(&self) -> Variant {
    self.variant
  }

  pub fn into_bus(self) -> B {
    self.bus
  }

  /// Executes one instruction, or services a pending interrupt instead, and
  /// returns the cycles it took. An illegal opcode leaves everything as it
  /// was except the cycle spent fetching it.
  pub fn step(&mut self) -> Result<u64, Fault> {
    let start = self.cycles;
    let irq_masked = self.irq_masked();
    self.polled_i = None;

    if self.nmi_pending {
      self.nmi_pending = false;
      debug!("nmi at {:#06x}", self.regs.pc);
      self.interrupt(Self::NMI_VECTOR);
      return Ok(self.cycles - start);
    }

    if self.irq_line && !irq_masked {
      debug!("irq at {:#06x}", self.regs.pc);
      self.interrupt(Self::IRQ_VECTOR);
      return Ok(self.cycles - start);
    }

    let pc = self.regs.pc;
    let opbyte = self.fetch();
    let inst = match Instruction::decode(opbyte) {
      Some(inst) => inst,
      None => {
        self.regs.pc = pc;
        warn!("illegal opcode {:#04x} at {:#06x}", opbyte, pc);
        return Err(Fault::IllegalOpcode { opcode: opbyte, pc });
      }
    };

    trace!("{:#06x} {:#04x} {} {:?}", pc, opbyte, inst.opcode(), inst.mode());
    if matches!(inst.opcode(), Opcode::CLI | Opcode::SEI | Opcode::PLP) {
      // The poll happens before these change I.
      self.polled_i = Some(self.regs.flag(Flag::I));
    }
    self.execute(inst);

    Ok(self.cycles - start)
  }

  fn execute(&mut self, inst: &Instruction) {
    let opcode = inst.opcode();
    let mode = inst.mode();

    match opcode.shape() {
      Shape::Read => {
        let address = mode.resolve(self, Access::Read);
        let val = self.read(address);
        let decimal = self.variant.has_decimal_mode();
        self.regs.read_op(opcode, val, decimal);
      }
      Shape::Write => {
        let address = mode.resolve(self, Access::Write);
        let val = self.regs.store_op(opcode);
        self.write(address, val);
      }
      Shape::ReadModifyWrite if mode == AddressMode::Acc => {
        self.dummy_read_pc();
        let val = self.regs[Reg::AC];
        self.regs[Reg::AC] = self.regs.modify_op(opcode, val);
      }
      Shape::ReadModifyWrite => {
        let address = mode.resolve(self, Access::Write);
        let val = self.read(address);
        // NMOS writes the unmodified value back while the ALU works.
        self.write(address, val);
        let res = self.regs.modify_op(opcode, val);
        self.write(address, res);
      }
      Shape::Implied => {
        self.dummy_read_pc();
        self.regs.implied_op(opcode);
      }
      Shape::Branch => self.branch(opcode),
      Shape::Control => self.control(opcode, mode),
    }
  }

  fn branch(&mut self, opcode: Opcode) {
    let offset = self.fetch();
    if !self.regs.branch_taken(opcode) {
      return;
    }

    let pc = self.regs.pc;
    let _ = self.read(pc);
    let branch_target = Self::calc_offset_pc(pc, offset);

    if bits::is_page_crossed(pc, branch_target) {
      let _ = self.read(bits::word(bits::lo(branch_target), bits::hi(pc)));
    }

    self.regs.pc = branch_target;
  }

  fn control(&mut self, opcode: Opcode, mode: AddressMode) {
    match opcode {
      Opcode::JMP => {
        self.regs.pc = mode.resolve(self, Access::Read);
      }
      Opcode::JSR => {
        let low = self.fetch();
        let _ = self.read(self.regs.stack_address());
        // Return address is the last byte of the JSR itself.
        self.push_word(self.regs.pc);
        let high = self.read(self.regs.pc);
        self.regs.pc = bits::word(low, high);
      }
      Opcode::RTS => {
        self.dummy_read_pc();
        let _ = self.read(self.regs.stack_address());
        let ret = self.pull_word();
        let _ = self.read(ret);
        self.regs.pc = ret.wrapping_add(1);
      }
      Opcode::BRK => {
        // Padding byte, skipped
        let _ = self.fetch();
        self.push_word(self.regs.pc);
        self.push(self.regs.flags.pack(true));
        self.regs.set_flag(Flag::I, true);
        self.regs.pc = self.read16(Self::IRQ_VECTOR);
      }
      Opcode::RTI => {
        self.dummy_read_pc();
        let _ = self.read(self.regs.stack_address());
        let flags = self.pull();
        self.regs.flags = self.regs.flags.unpack(flags);
        self.regs.pc = self.pull_word();
      }
      Opcode::PHA => {
        self.dummy_read_pc();
        self.push(self.regs[Reg::AC]);
      }
      Opcode::PHP => {
        self.dummy_read_pc();
        self.push(self.regs.flags.pack(true));
      }
      Opcode::PLA => {
        self.dummy_read_pc();
        let _ = self.read(self.regs.stack_address());
        let res = self.pull();
        self.regs.load(Reg::AC, res);
      }
      Opcode::PLP => {
        self.dummy_read_pc();
        let _ = self.read(self.regs.stack_address());
        let res = self.pull();
        self.regs.flags = self.regs.flags.unpack(res);
      }
      _ => unreachable!("{} is not a control instruction", opcode),
    }
  }

  /// The RESET sequence: seven cycles, three of them fake pushes that only
  /// move S, then PC from $FFFC.
  pub fn reset(&mut self) {
    self.dummy_read_pc();
    self.dummy_read_pc();
    for _ in 0..3 {
      let address = self.regs.push_address();
      let _ = self.read(address);
    }
    self.regs.set_flag(Flag::I, true);
    self.regs.flags |= Flag::UNUSED;
    self.nmi_pending = false;
    self.polled_i = None;

    let start = self.read16(Self::RESET_VECTOR);
    self.set_pc(start);
    debug!("reset, pc {:#06x}", start);
  }

  /// True when the next `step` enters an interrupt handler instead of
  /// executing an instruction.
  pub fn interrupt_pending(&self) -> bool {
    self.nmi_pending || (self.irq_line && !self.irq_masked())
  }

  fn irq_masked(&self) -> bool {
    self.polled_i.unwrap_or_else(|| self.regs.flag(Flag::I))
  }

  /// Edge triggered, serviced before the next instruction no matter what I says.
  pub fn nmi(&mut self) {
    self.nmi_pending = true;
  }

  /// Level of the IRQ line. Serviced before each instruction for as long as
  /// it is held and I is clear. CLI, SEI and PLP take effect one instruction
  /// late, RTI immediately.
  pub fn set_irq(&mut self, asserted: bool) {
    self.irq_line = asserted;
  }

  fn interrupt(&mut self, vector: u16) {
    // The opcode fetch and the operand fetch both happen and are thrown away.
    self.dummy_read_pc();
    self.dummy_read_pc();
    self.push_word(self.regs.pc);
    self.push(self.regs.flags.pack(false));
    self.regs.set_flag(Flag::I, true);
    self.regs.pc = self.read16(vector);
  }

  pub fn calc_offset_pc(pc: u16, offset: u8) -> u16 {
    pc.wrapping_add(offset as i8 as u16)
  }

  // Every bus access is one cycle.

  pub(crate) fn read(&mut self, address: u16) -> u8 {
    self.cycles += 1;
    self.bus.read8(address)
  }

  pub(crate) fn write(&mut self, address: u16, val: u8) {
    self.cycles += 1;
    self.bus.write8(address, val);
  }

  pub(crate) fn fetch(&mut self) -> u8 {
    let val = self.read(self.regs.pc);
    self.regs.pc = self.regs.pc.wrapping_add(1);
    val
  }

  pub(crate) fn fetch16(&mut self) -> u16 {
    let low = self.fetch();
    let high = self.fetch();
    bits::word(low, high)
  }

  fn dummy_read_pc(&mut self) {
    let _ = self.read(self.regs.pc);
  }

  fn read16(&mut self, address: u16) -> u16 {
    let low = self.read(address);
    let high = self.read(address.wrapping_add(1));
    bits::word(low, high)
  }

  fn push(&mut self, val: u8) {
    let address = self.regs.push_address();
    self.write(address, val);
  }

  fn pull(&mut self) -> u8 {
    let address = self.regs.pull_address();
    self.read(address)
  }

  fn push_word(&mut self, val: u16) {
    self.push(bits::hi(val));
    self.push(bits::lo(val));
  }

  fn pull_word(&mut self) -> u16 {
    let low = self.pull();
    let high = self.pull();
    bits::word(low, high)
  }
}

impl<B> fmt::Display for Cpu<B> {
  // One trace line per instruction
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
      self.regs.pc,
      self.regs[Reg::AC],
      self.regs[Reg::X],
      self.regs[Reg::Y],
      self.regs.flags.bits(),
      self.regs[Reg::SP],
      self.cycles
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::Memory;

  struct TestBus {
    mem: [u8; 0xffff + 1],
    log: alloc::vec::Vec<(u16, Option<u8>)>,
  }

  impl Bus for TestBus {
    fn read8(&mut self, address: u16) -> u8 {
      self.log.push((address, None));
      self.mem[address as usize]
    }

    fn write8(&mut self, address: u16, val: u8) {
      self.log.push((address, Some(val)));
      self.mem[address as usize] = val;
    }
  }

  fn sut(program: &[u8]) -> Cpu<Memory> {
    let mut cpu = Cpu::new(Memory::load(program, 0x0600));
    cpu.set_pc(0x0600);
    cpu.regs[Reg::SP] = 0xff;
    cpu
  }

  #[test]
  fn test_lda() {
    let mut cpu = sut(&[0xad, 0x66, 0x06]);
    cpu.bus.write8(0x0666, 0xaa);
    assert_eq!(cpu.step(), Ok(4));
    assert_eq!(cpu.regs[Reg::AC], 0xaa);
    assert_eq!(cpu.pc(), 0x0603);
    assert!(cpu.regs.flag(Flag::N));
  }

  #[test]
  fn illegal_opcode_restores_pc() {
    let mut cpu = sut(&[0x02]);
    let before = cpu.regs;
    assert_eq!(cpu.step(), Err(Fault::IllegalOpcode { opcode: 0x02, pc: 0x0600 }));
    assert_eq!(cpu.regs, before);
    assert_eq!(cpu.cycles(), 1);
  }

  #[test]
  fn pha_pla_round_trip() {
    let mut cpu = sut(&[0x48, 0xa9, 0x00, 0x68]);
    cpu.regs[Reg::AC] = 0x42;
    assert_eq!(cpu.step(), Ok(3));
    assert_eq!(cpu.regs[Reg::SP], 0xfe);
    assert_eq!(cpu.bus.peek(0x01ff), 0x42);
    cpu.step().unwrap();
    assert_eq!(cpu.regs[Reg::AC], 0x00);
    assert_eq!(cpu.step(), Ok(4));
    assert_eq!(cpu.regs[Reg::AC], 0x42);
    assert_eq!(cpu.regs[Reg::SP], 0xff);
  }

  #[test]
  fn stack_pop_push_should_wrap() {
    let mut cpu = sut(&[0x48, 0x68]);
    cpu.regs[Reg::SP] = 0;
    cpu.regs[Reg::AC] = 42;

    cpu.step().unwrap();
    assert_eq!(cpu.regs[Reg::SP], 0xff);
    assert_eq!(cpu.bus.peek(0x0100), 42);

    cpu.regs[Reg::AC] = 0;
    cpu.step().unwrap();
    assert_eq!(cpu.regs[Reg::AC], 42);
    assert_eq!(cpu.regs[Reg::SP], 0);
  }

  #[test]
  fn php_plp() {
    let mut cpu = sut(&[0x08, 0x28]);
    cpu.regs.flags = Flag::UNUSED | Flag::C | Flag::N;
    cpu.step().unwrap();
    assert_eq!(cpu.bus.peek(0x01ff), 0b10110001);

    cpu.bus.write8(0x01ff, 0b01011110);
    cpu.step().unwrap();
    assert_eq!(cpu.regs.flags, Flag::UNUSED | Flag::V | Flag::D | Flag::I | Flag::Z);
  }

  #[test]
  fn jsr_rts() {
    let mut cpu = sut(&[0x20, 0x10, 0x06]);
    cpu.bus.write8(0x0610, 0x60); // RTS
    assert_eq!(cpu.step(), Ok(6));
    assert_eq!(cpu.pc(), 0x0610);
    assert_eq!(cpu.bus.peek(0x01ff), 0x06);
    assert_eq!(cpu.bus.peek(0x01fe), 0x02);
    assert_eq!(cpu.step(), Ok(6));
    assert_eq!(cpu.pc(), 0x0603);
    assert_eq!(cpu.regs[Reg::SP], 0xff);
  }

  #[test]
  fn brk_rti() {
    let mut cpu = sut(&[0x00, 0xff, 0xea]);
    cpu.bus.write16(0xfffe, 0x0700);
    cpu.bus.write8(0x0700, 0x40); // RTI
    cpu.regs.flags = Flag::UNUSED | Flag::C;

    assert_eq!(cpu.step(), Ok(7));
    assert_eq!(cpu.pc(), 0x0700);
    assert!(cpu.regs.flag(Flag::I));
    assert_eq!(cpu.bus.peek(0x01ff), 0x06);
    assert_eq!(cpu.bus.peek(0x01fe), 0x02);
    assert_eq!(cpu.bus.peek(0x01fd), 0b00110001);

    assert_eq!(cpu.step(), Ok(6));
    assert_eq!(cpu.pc(), 0x0602);
    assert!(!cpu.regs.flag(Flag::I));
    assert!(cpu.regs.flag(Flag::C));
    assert_eq!(cpu.regs[Reg::SP], 0xff);
  }

  #[test]
  fn jmp_indirect_page_wrap() {
    let mut cpu = sut(&[0x6c, 0xff, 0x30]);
    cpu.bus.write8(0x30ff, 0x34);
    cpu.bus.write8(0x3000, 0x12);
    cpu.bus.write8(0x3100, 0x56);
    assert_eq!(cpu.step(), Ok(5));
    assert_eq!(cpu.pc(), 0x1234);
  }

  #[test]
  fn branch_cycles() {
    // not taken
    let mut cpu = sut(&[0xd0, 0x10]);
    cpu.regs.set_flag(Flag::Z, true);
    assert_eq!(cpu.step(), Ok(2));
    assert_eq!(cpu.pc(), 0x0602);

    // taken, same page
    let mut cpu = sut(&[0xd0, 0x10]);
    assert_eq!(cpu.step(), Ok(3));
    assert_eq!(cpu.pc(), 0x0612);

    // taken backwards across a page
    let mut cpu = sut(&[0xd0, 0xfc]);
    cpu.set_pc(0x0600);
    assert_eq!(cpu.step(), Ok(4));
    assert_eq!(cpu.pc(), 0x05fe);

    // offset 0 is a taken branch to the next instruction
    let mut cpu = sut(&[0xf0, 0x00]);
    cpu.regs.set_flag(Flag::Z, true);
    assert_eq!(cpu.step(), Ok(3));
    assert_eq!(cpu.pc(), 0x0602);
  }

  #[test]
  fn offset_pc() {
    assert_eq!(Cpu::<Memory>::calc_offset_pc(0x10, 1), 0x11); // + 1
    assert_eq!(Cpu::<Memory>::calc_offset_pc(0x20, 0xf4), 0x14); // -12
    assert_eq!(Cpu::<Memory>::calc_offset_pc(0x0000, 255), 0xffff); // -1
    assert_eq!(Cpu::<Memory>::calc_offset_pc(0xffff, 1), 0x0000); // +1
    assert_eq!(Cpu::<Memory>::calc_offset_pc(0x0000, 0xc1), 0xffc1); // -63
  }

  #[test]
  fn rmw_bus_pattern() {
    let mut mem = [0u8; 0xffff + 1];
    mem[0x0600] = 0xfe; // INC $20ff,X
    mem[0x0601] = 0xff;
    mem[0x0602] = 0x20;
    mem[0x2100] = 0x41;
    let mut cpu = Cpu::new(TestBus { mem, log: alloc::vec::Vec::new() });
    cpu.set_pc(0x0600);
    cpu.regs[Reg::X] = 1;

    assert_eq!(cpu.step(), Ok(7));
    let expected: [(u16, Option<u8>); 7] = [
      (0x0600, None),
      (0x0601, None),
      (0x0602, None),
      (0x2000, None),
      (0x2100, None),
      (0x2100, Some(0x41)),
      (0x2100, Some(0x42)),
    ];
    assert_eq!(cpu.bus.log, expected);
  }

  #[test]
  fn store_does_not_read_target() {
    let mem = [0u8; 0xffff + 1];
    let mut cpu = Cpu::new(TestBus { mem, log: alloc::vec::Vec::new() });
    cpu.bus.mem[0x0000] = 0x85; // STA $10
    cpu.bus.mem[0x0001] = 0x10;
    cpu.regs[Reg::AC] = 0x99;

    assert_eq!(cpu.step(), Ok(3));
    let expected: [(u16, Option<u8>); 3] = [(0x0000, None), (0x0001, None), (0x0010, Some(0x99))];
    assert_eq!(cpu.bus.log, expected);
  }

  #[test]
  fn reset_reads_vector() {
    let mut mem = Memory::new();
    mem.write16(0xfffc, 0xc000);
    let mut cpu = Cpu::new(mem);
    cpu.regs.set_flag(Flag::I, false);
    cpu.reset();
    assert_eq!(cpu.pc(), 0xc000);
    assert_eq!(cpu.regs[Reg::SP], 0xfd);
    assert!(cpu.regs.flag(Flag::I));
    assert_eq!(cpu.cycles(), 7);
  }

  #[test]
  fn irq_respects_interrupt_disable() {
    let mut cpu = sut(&[0xea, 0x58, 0xea]);
    cpu.bus.write16(0xfffe, 0x0800);
    cpu.regs.set_flag(Flag::I, true);
    cpu.set_irq(true);

    assert_eq!(cpu.step(), Ok(2)); // NOP, masked
    assert_eq!(cpu.step(), Ok(2)); // CLI
    assert!(!cpu.interrupt_pending());
    assert_eq!(cpu.step(), Ok(2)); // NOP, I still looks set
    assert!(cpu.interrupt_pending());
    assert_eq!(cpu.step(), Ok(7)); // serviced
    assert_eq!(cpu.pc(), 0x0800);
    assert!(cpu.regs.flag(Flag::I));
    assert_eq!(cpu.bus.peek(0x01ff), 0x06);
    assert_eq!(cpu.bus.peek(0x01fe), 0x03);
    // B clear on the stack
    assert_eq!(cpu.bus.peek(0x01fd) & Flag::B.bits(), 0);
    assert_eq!(cpu.bus.peek(0x01fd) & Flag::UNUSED.bits(), Flag::UNUSED.bits());
  }

  #[test]
  fn irq_slips_in_after_sei() {
    let mut cpu = sut(&[0x78, 0xea]);
    cpu.bus.write16(0xfffe, 0x0800);
    cpu.regs.set_flag(Flag::I, false);

    assert_eq!(cpu.step(), Ok(2)); // SEI
    cpu.set_irq(true);
    assert_eq!(cpu.step(), Ok(7));
    assert_eq!(cpu.pc(), 0x0800);
    // the pushed status already has I set
    assert_eq!(cpu.bus.peek(0x01fd) & Flag::I.bits(), Flag::I.bits());
    assert_eq!(cpu.bus.peek(0x01fe), 0x01);

    // from here on I holds it off
    cpu.bus.write8(0x0800, 0xea);
    assert_eq!(cpu.step(), Ok(2));
    assert_eq!(cpu.pc(), 0x0801);
  }

  #[test]
  fn plp_clearing_i_waits_an_instruction() {
    let mut cpu = sut(&[0x28, 0xea, 0xea]);
    cpu.bus.write16(0xfffe, 0x0800);
    cpu.regs.set_flag(Flag::I, true);
    cpu.regs[Reg::SP] = 0xfe;
    cpu.bus.write8(0x01ff, 0x00);
    cpu.set_irq(true);

    assert_eq!(cpu.step(), Ok(4)); // PLP, I now clear
    assert!(!cpu.regs.flag(Flag::I));
    assert_eq!(cpu.step(), Ok(2)); // NOP
    assert_eq!(cpu.step(), Ok(7));
    assert_eq!(cpu.bus.peek(0x01fe), 0x02);
  }

  #[test]
  fn nmi_ignores_interrupt_disable() {
    let mut cpu = sut(&[0xea]);
    cpu.bus.write16(0xfffa, 0x0900);
    cpu.regs.set_flag(Flag::I, true);
    cpu.nmi();
    assert_eq!(cpu.step(), Ok(7));
    assert_eq!(cpu.pc(), 0x0900);
    // edge, not level
    cpu.bus.write8(0x0900, 0xea);
    assert_eq!(cpu.step(), Ok(2));
    assert_eq!(cpu.pc(), 0x0901);
  }

  #[test]
  fn ricoh_ignores_decimal_flag() {
    let program = [0xf8, 0x18, 0xa9, 0x19, 0x69, 0x28]; // SED CLC LDA #$19 ADC #$28
    let mut cpu = Cpu::with_variant(Memory::load(&program, 0x0600), Variant::Ricoh2A03);
    cpu.set_pc(0x0600);
    for _ in 0..4 {
      cpu.step().unwrap();
    }
    assert_eq!(cpu.regs[Reg::AC], 0x41);

    let mut cpu = sut(&program);
    for _ in 0..4 {
      cpu.step().unwrap();
    }
    assert_eq!(cpu.regs[Reg::AC], 0x47);
  }

  #[test]
  fn trace_line() {
    let mut cpu = sut(&[0xa2, 0x05]);
    cpu.step().unwrap();
    assert_eq!(cpu.to_string(), "PC:0602 A:00 X:05 Y:00 P:24 SP:FF CYC:2");
  }
}
