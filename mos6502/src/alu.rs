use common::bits;

use crate::{
  instructions::Opcode,
  registers::{Flag, Reg, Registers},
};

/// Instruction semantics. Everything here works on the register file alone;
/// the step engine does the bus traffic and hands over the operand.
impl Registers {
  /// Read instructions: consume `val`, never touch memory.
  pub(crate) fn read_op(&mut self, opcode: Opcode, val: u8, decimal: bool) {
    match opcode {
      Opcode::LDA => self.load(Reg::AC, val),
      Opcode::LDX => self.load(Reg::X, val),
      Opcode::LDY => self.load(Reg::Y, val),
      Opcode::ORA => self.load(Reg::AC, self[Reg::AC] | val),
      Opcode::AND => self.load(Reg::AC, self[Reg::AC] & val),
      Opcode::EOR => self.load(Reg::AC, self[Reg::AC] ^ val),
      Opcode::ADC => self.add_with_carry(val, decimal),
      Opcode::SBC => self.sub_with_borrow(val, decimal),
      Opcode::CMP => self.cmp(Reg::AC, val),
      Opcode::CPX => self.cmp(Reg::X, val),
      Opcode::CPY => self.cmp(Reg::Y, val),
      Opcode::BIT => self.bit(val),
      _ => unreachable!("{} is not a read instruction", opcode),
    }
  }

  /// Read-modify-write instructions: replacement byte for `val`.
  pub(crate) fn modify_op(&mut self, opcode: Opcode, val: u8) -> u8 {
    let res = match opcode {
      Opcode::INC => val.wrapping_add(1),
      Opcode::DEC => val.wrapping_sub(1),
      Opcode::ASL => self.shift_left(val),
      Opcode::LSR => self.shift_right(val),
      Opcode::ROL => self.rotate_left(val),
      Opcode::ROR => self.rotate_right(val),
      _ => unreachable!("{} is not a read-modify-write instruction", opcode),
    };
    self.set_neg_zero(res);
    res
  }

  /// Write instructions: the byte to store. Flags are left alone.
  pub(crate) fn store_op(&self, opcode: Opcode) -> u8 {
    match opcode {
      Opcode::STA => self[Reg::AC],
      Opcode::STX => self[Reg::X],
      Opcode::STY => self[Reg::Y],
      _ => unreachable!("{} is not a write instruction", opcode),
    }
  }

  pub(crate) fn implied_op(&mut self, opcode: Opcode) {
    match opcode {
      Opcode::CLC => self.set_flag(Flag::C, false),
      Opcode::CLD => self.set_flag(Flag::D, false),
      Opcode::CLI => self.set_flag(Flag::I, false),
      Opcode::CLV => self.set_flag(Flag::V, false),
      Opcode::SEC => self.set_flag(Flag::C, true),
      Opcode::SED => self.set_flag(Flag::D, true),
      Opcode::SEI => self.set_flag(Flag::I, true),
      Opcode::NOP => {}
      Opcode::INX => self.load(Reg::X, self[Reg::X].wrapping_add(1)),
      Opcode::INY => self.load(Reg::Y, self[Reg::Y].wrapping_add(1)),
      Opcode::DEX => self.load(Reg::X, self[Reg::X].wrapping_sub(1)),
      Opcode::DEY => self.load(Reg::Y, self[Reg::Y].wrapping_sub(1)),
      Opcode::TAX => self.load(Reg::X, self[Reg::AC]),
      Opcode::TAY => self.load(Reg::Y, self[Reg::AC]),
      Opcode::TSX => self.load(Reg::X, self[Reg::SP]),
      Opcode::TXA => self.load(Reg::AC, self[Reg::X]),
      Opcode::TYA => self.load(Reg::AC, self[Reg::Y]),
      // The only transfer that leaves N/Z alone.
      Opcode::TXS => self[Reg::SP] = self[Reg::X],
      _ => unreachable!("{} is not an implied instruction", opcode),
    }
  }

  pub(crate) fn branch_taken(&self, opcode: Opcode) -> bool {
    match opcode {
      Opcode::BPL => !self.flag(Flag::N),
      Opcode::BMI => self.flag(Flag::N),
      Opcode::BVC => !self.flag(Flag::V),
      Opcode::BVS => self.flag(Flag::V),
      Opcode::BCC => !self.flag(Flag::C),
      Opcode::BCS => self.flag(Flag::C),
      Opcode::BNE => !self.flag(Flag::Z),
      Opcode::BEQ => self.flag(Flag::Z),
      _ => unreachable!("{} is not a branch", opcode),
    }
  }

  fn cmp(&mut self, reg: Reg, val: u8) {
    let (res, borrow) = self[reg].overflowing_sub(val);
    self.set_flag(Flag::C, !borrow);
    self.set_neg_zero(res);
  }

  fn bit(&mut self, val: u8) {
    self.set_flag(Flag::Z, self[Reg::AC] & val == 0);
    self.set_flag(Flag::N, val & (1 << 7) != 0);
    self.set_flag(Flag::V, val & (1 << 6) != 0);
  }

  fn add_with_carry(&mut self, rhs: u8, decimal: bool) {
    if decimal && self.flag(Flag::D) {
      self.add_decimal(rhs);
      return;
    }

    let lhs = self[Reg::AC];
    let (step1, carry1) = lhs.overflowing_add(self.flag(Flag::C) as u8);
    let (res, carry2) = step1.overflowing_add(rhs);
    self.set_flag(Flag::V, bits::is_overflow(res, lhs, rhs));
    self.set_flag(Flag::C, carry1 || carry2);
    self.load(Reg::AC, res);
  }

  fn sub_with_borrow(&mut self, rhs: u8, decimal: bool) {
    if decimal && self.flag(Flag::D) {
      self.sub_decimal(rhs);
      return;
    }

    // A - M - !C == A + !M + C
    self.add_with_carry(rhs ^ 0xff, false)
  }

  /// NMOS BCD add. Z comes from the plain binary sum, N and V from the sum
  /// after only the low nibble was adjusted.
  fn add_decimal(&mut self, rhs: u8) {
    let lhs = self[Reg::AC];
    let carry_in = self.flag(Flag::C) as u16;

    let binary = lhs.wrapping_add(rhs).wrapping_add(carry_in as u8);

    let mut low = (lhs & 0x0f) as u16 + (rhs & 0x0f) as u16 + carry_in;
    if low >= 0x0a {
      low = ((low + 0x06) & 0x0f) + 0x10;
    }
    let mut sum = (lhs & 0xf0) as u16 + (rhs & 0xf0) as u16 + low;

    let intermediate = sum as u8;
    self.set_flag(Flag::N, bits::is_signed(intermediate));
    self.set_flag(Flag::V, bits::is_overflow(intermediate, lhs, rhs));
    self.set_flag(Flag::Z, binary == 0);

    if sum >= 0xa0 {
      sum += 0x60;
    }
    self.set_flag(Flag::C, sum >= 0x100);
    self[Reg::AC] = sum as u8;
  }

  /// NMOS BCD subtract. Flags are those of the binary subtraction.
  fn sub_decimal(&mut self, rhs: u8) {
    let lhs = self[Reg::AC];
    let borrow = !self.flag(Flag::C) as i16;

    self.add_with_carry(rhs ^ 0xff, false);

    let mut low = (lhs & 0x0f) as i16 - (rhs & 0x0f) as i16 - borrow;
    if low < 0 {
      low = ((low - 0x06) & 0x0f) - 0x10;
    }
    let mut res = (lhs & 0xf0) as i16 - (rhs & 0xf0) as i16 + low;
    if res < 0 {
      res -= 0x60;
    }
    self[Reg::AC] = res as u8;
  }

  // All shift and rotate instructions preserve the bit shifted out in the carry flag.

  fn shift_right(&mut self, val: u8) -> u8 {
    self.set_flag(Flag::C, val & 1 != 0);
    val >> 1
  }

  fn shift_left(&mut self, val: u8) -> u8 {
    self.set_flag(Flag::C, val & (1 << 7) != 0);
    val << 1
  }

  fn rotate_left(&mut self, val: u8) -> u8 {
    let carry_bit_before_shift = self.flag(Flag::C) as u8;
    self.set_flag(Flag::C, val & (1 << 7) != 0);
    (val << 1) | carry_bit_before_shift
  }

  fn rotate_right(&mut self, val: u8) -> u8 {
    let carry_bit_before_shift = self.flag(Flag::C) as u8;
    self.set_flag(Flag::C, val & 1 != 0);
    (val >> 1) | (carry_bit_before_shift << 7)
  }
}
