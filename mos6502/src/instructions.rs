use core::fmt;

use crate::address_mode::AddressMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Opcode {
  ADC, // Add Memory to Accumulator with Carry
  AND, // AND Memory with Accumulator
  ASL, // Shift Left One Bit (Memory or Accumulator)
  BCC, // Branch on Carry Clear
  BCS, // Branch on Carry Set
  BEQ, // Branch on Result Zero
  BIT, // Test Bits in Memory with Accumulator
  BMI, // Branch on Result Minus
  BNE, // Branch on Result not Zero
  BPL, // Branch on Result Plus
  BRK, // Force Break, Software interrupt
  BVC, // Branch on Overflow Clear
  BVS, // Branch on Overflow Set
  CLC,
  CLD,
  CLI,
  CLV,
  CMP, // Compare Memory with Accumulator
  CPX,
  CPY,
  DEC, // Decrement Memory by One
  DEX,
  DEY,
  EOR, // Exclusive-OR Memory with Accumulator
  INC, // Increment Memory by One
  INX,
  INY,
  JMP,
  JSR, // Jump to New Location Saving Return Address
  LDA,
  LDX,
  LDY,
  LSR, // Shift One Bit Right (Memory or Accumulator)
  NOP,
  ORA, // OR Memory with Accumulator
  PHA,
  PHP,
  PLA,
  PLP,
  ROL, // Rotate One Bit Left (Memory or Accumulator)
  ROR, // Rotate One Bit Right (Memory or Accumulator)
  RTI, // Return from Interrupt
  RTS, // Return from Subroutine
  SBC, // Subtract Memory from Accumulator with Borrow
  SEC,
  SED,
  SEI,
  STA,
  STX,
  STY,
  TAX,
  TAY,
  TSX,
  TXA,
  TXS,
  TYA,
}

/// How an instruction talks to the bus, which decides the cycle pattern
/// the resolver has to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
  /// One operand byte in, registers/flags out.
  Read,
  /// Register out to the effective address.
  Write,
  /// Operand in, replacement byte back to the same place.
  ReadModifyWrite,
  /// Registers only.
  Implied,
  Branch,
  /// Jumps, subroutines, interrupts and the stack.
  Control,
}

impl Opcode {
  pub const fn shape(self) -> Shape {
    use Opcode::*;
    match self {
      LDA | LDX | LDY | ORA | AND | EOR | ADC | SBC | CMP | CPX | CPY | BIT => Shape::Read,
      INC | DEC | ASL | LSR | ROL | ROR => Shape::ReadModifyWrite,
      STA | STX | STY => Shape::Write,
      CLC | CLD | CLI | CLV | SEC | SED | SEI | NOP | INX | INY | DEX | DEY | TAX | TAY | TSX
      | TXA | TXS | TYA => Shape::Implied,
      BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS => Shape::Branch,
      JMP | JSR | RTS | RTI | BRK | PHA | PHP | PLA | PLP => Shape::Control,
    }
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
  opcode: Opcode,
  mode: AddressMode,
  cycles: u8,
}

impl Instruction {
  const fn new(opcode: Opcode, mode: AddressMode, cycles: u8) -> Option<Self> {
    Some(Self { opcode, mode, cycles })
  }

  /// Dispatch entry for `opbyte`, `None` for the undocumented ones.
  pub fn decode(opbyte: u8) -> Option<&'static Instruction> {
    INSTRUCTIONS[opbyte as usize].as_ref()
  }

  pub fn opcode(&self) -> Opcode {
    self.opcode
  }

  pub fn mode(&self) -> AddressMode {
    self.mode
  }

  /// Published cycle count, before page-crossing and branch penalties.
  pub fn cycles(&self) -> u8 {
    self.cycles
  }

  /// Bytes the instruction occupies, BRK's padding byte included.
  pub fn size(&self) -> u8 {
    match self.opcode {
      // Padding byte, skipped but never read as an operand
      Opcode::BRK => 2,
      _ => 1 + self.mode.operand_bytes(),
    }
  }
}

pub static INSTRUCTIONS: [Option<Instruction>; 256] = {
  let mut table = [None; 256];
  let mut opbyte = 0;
  while opbyte < 256 {
    table[opbyte] = disassemble(opbyte as u8);
    opbyte += 1;
  }
  table
};

const fn disassemble(opbyte: u8) -> Option<Instruction> {
  use AddressMode::*;
  use Opcode::*;

  match opbyte {
    0x00 => Instruction::new(BRK, Impl, 7),
    0x40 => Instruction::new(RTI, Impl, 6),

    0x38 => Instruction::new(SEC, Impl, 2),
    0xf8 => Instruction::new(SED, Impl, 2),
    0x78 => Instruction::new(SEI, Impl, 2),

    0x18 => Instruction::new(CLC, Impl, 2),
    0xd8 => Instruction::new(CLD, Impl, 2),
    0x58 => Instruction::new(CLI, Impl, 2),
    0xb8 => Instruction::new(CLV, Impl, 2),

    0xaa => Instruction::new(TAX, Impl, 2),
    0xa8 => Instruction::new(TAY, Impl, 2),
    0xba => Instruction::new(TSX, Impl, 2),
    0x8a => Instruction::new(TXA, Impl, 2),
    0x9a => Instruction::new(TXS, Impl, 2),
    0x98 => Instruction::new(TYA, Impl, 2),

    0x24 => Instruction::new(BIT, Zero, 3),
    0x2c => Instruction::new(BIT, Abs, 4),

    0x69 => Instruction::new(ADC, Imm, 2),
    0x65 => Instruction::new(ADC, Zero, 3),
    0x75 => Instruction::new(ADC, ZeroX, 4),
    0x6d => Instruction::new(ADC, Abs, 4),
    0x7d => Instruction::new(ADC, AbsX, 4),
    0x79 => Instruction::new(ADC, AbsY, 4),
    0x61 => Instruction::new(ADC, IndX, 6),
    0x71 => Instruction::new(ADC, IndY, 5),

    0xe9 => Instruction::new(SBC, Imm, 2),
    0xe5 => Instruction::new(SBC, Zero, 3),
    0xf5 => Instruction::new(SBC, ZeroX, 4),
    0xed => Instruction::new(SBC, Abs, 4),
    0xfd => Instruction::new(SBC, AbsX, 4),
    0xf9 => Instruction::new(SBC, AbsY, 4),
    0xe1 => Instruction::new(SBC, IndX, 6),
    0xf1 => Instruction::new(SBC, IndY, 5),

    0x49 => Instruction::new(EOR, Imm, 2),
    0x45 => Instruction::new(EOR, Zero, 3),
    0x55 => Instruction::new(EOR, ZeroX, 4),
    0x4d => Instruction::new(EOR, Abs, 4),
    0x5d => Instruction::new(EOR, AbsX, 4),
    0x59 => Instruction::new(EOR, AbsY, 4),
    0x41 => Instruction::new(EOR, IndX, 6),
    0x51 => Instruction::new(EOR, IndY, 5),

    0x09 => Instruction::new(ORA, Imm, 2),
    0x05 => Instruction::new(ORA, Zero, 3),
    0x15 => Instruction::new(ORA, ZeroX, 4),
    0x0d => Instruction::new(ORA, Abs, 4),
    0x1d => Instruction::new(ORA, AbsX, 4),
    0x19 => Instruction::new(ORA, AbsY, 4),
    0x01 => Instruction::new(ORA, IndX, 6),
    0x11 => Instruction::new(ORA, IndY, 5),

    0x29 => Instruction::new(AND, Imm, 2),
    0x25 => Instruction::new(AND, Zero, 3),
    0x35 => Instruction::new(AND, ZeroX, 4),
    0x2d => Instruction::new(AND, Abs, 4),
    0x3d => Instruction::new(AND, AbsX, 4),
    0x39 => Instruction::new(AND, AbsY, 4),
    0x21 => Instruction::new(AND, IndX, 6),
    0x31 => Instruction::new(AND, IndY, 5),

    0xa9 => Instruction::new(LDA, Imm, 2),
    0xa5 => Instruction::new(LDA, Zero, 3),
    0xb5 => Instruction::new(LDA, ZeroX, 4),
    0xad => Instruction::new(LDA, Abs, 4),
    0xbd => Instruction::new(LDA, AbsX, 4),
    0xb9 => Instruction::new(LDA, AbsY, 4),
    0xa1 => Instruction::new(LDA, IndX, 6),
    0xb1 => Instruction::new(LDA, IndY, 5),

    0xa2 => Instruction::new(LDX, Imm, 2),
    0xa6 => Instruction::new(LDX, Zero, 3),
    0xb6 => Instruction::new(LDX, ZeroY, 4),
    0xae => Instruction::new(LDX, Abs, 4),
    0xbe => Instruction::new(LDX, AbsY, 4),

    0xa0 => Instruction::new(LDY, Imm, 2),
    0xa4 => Instruction::new(LDY, Zero, 3),
    0xb4 => Instruction::new(LDY, ZeroX, 4),
    0xac => Instruction::new(LDY, Abs, 4),
    0xbc => Instruction::new(LDY, AbsX, 4),

    0x85 => Instruction::new(STA, Zero, 3),
    0x95 => Instruction::new(STA, ZeroX, 4),
    0x8d => Instruction::new(STA, Abs, 4),
    0x9d => Instruction::new(STA, AbsX, 5),
    0x99 => Instruction::new(STA, AbsY, 5),
    0x81 => Instruction::new(STA, IndX, 6),
    0x91 => Instruction::new(STA, IndY, 6),

    0x86 => Instruction::new(STX, Zero, 3),
    0x96 => Instruction::new(STX, ZeroY, 4),
    0x8e => Instruction::new(STX, Abs, 4),

    0x84 => Instruction::new(STY, Zero, 3),
    0x94 => Instruction::new(STY, ZeroX, 4),
    0x8c => Instruction::new(STY, Abs, 4),

    0x4c => Instruction::new(JMP, Abs, 3),
    0x6c => Instruction::new(JMP, Ind, 5),
    0x20 => Instruction::new(JSR, Abs, 6),
    0x60 => Instruction::new(RTS, Impl, 6),

    0xd0 => Instruction::new(BNE, Rel, 2),
    0xf0 => Instruction::new(BEQ, Rel, 2),
    0x10 => Instruction::new(BPL, Rel, 2),
    0x30 => Instruction::new(BMI, Rel, 2),
    0x90 => Instruction::new(BCC, Rel, 2),
    0xb0 => Instruction::new(BCS, Rel, 2),
    0x50 => Instruction::new(BVC, Rel, 2),
    0x70 => Instruction::new(BVS, Rel, 2),

    0xca => Instruction::new(DEX, Impl, 2),
    0x88 => Instruction::new(DEY, Impl, 2),
    0xe8 => Instruction::new(INX, Impl, 2),
    0xc8 => Instruction::new(INY, Impl, 2),

    0xc6 => Instruction::new(DEC, Zero, 5),
    0xd6 => Instruction::new(DEC, ZeroX, 6),
    0xce => Instruction::new(DEC, Abs, 6),
    0xde => Instruction::new(DEC, AbsX, 7),

    0xe6 => Instruction::new(INC, Zero, 5),
    0xf6 => Instruction::new(INC, ZeroX, 6),
    0xee => Instruction::new(INC, Abs, 6),
    0xfe => Instruction::new(INC, AbsX, 7),

    0xea => Instruction::new(NOP, Impl, 2),

    0xc0 => Instruction::new(CPY, Imm, 2),
    0xc4 => Instruction::new(CPY, Zero, 3),
    0xcc => Instruction::new(CPY, Abs, 4),

    0xe0 => Instruction::new(CPX, Imm, 2),
    0xe4 => Instruction::new(CPX, Zero, 3),
    0xec => Instruction::new(CPX, Abs, 4),

    0xc9 => Instruction::new(CMP, Imm, 2),
    0xc5 => Instruction::new(CMP, Zero, 3),
    0xd5 => Instruction::new(CMP, ZeroX, 4),
    0xcd => Instruction::new(CMP, Abs, 4),
    0xdd => Instruction::new(CMP, AbsX, 4),
    0xd9 => Instruction::new(CMP, AbsY, 4),
    0xc1 => Instruction::new(CMP, IndX, 6),
    0xd1 => Instruction::new(CMP, IndY, 5),

    0x4a => Instruction::new(LSR, Acc, 2),
    0x46 => Instruction::new(LSR, Zero, 5),
    0x56 => Instruction::new(LSR, ZeroX, 6),
    0x4e => Instruction::new(LSR, Abs, 6),
    0x5e => Instruction::new(LSR, AbsX, 7),

    0x0a => Instruction::new(ASL, Acc, 2),
    0x06 => Instruction::new(ASL, Zero, 5),
    0x16 => Instruction::new(ASL, ZeroX, 6),
    0x0e => Instruction::new(ASL, Abs, 6),
    0x1e => Instruction::new(ASL, AbsX, 7),

    0x2a => Instruction::new(ROL, Acc, 2),
    0x26 => Instruction::new(ROL, Zero, 5),
    0x36 => Instruction::new(ROL, ZeroX, 6),
    0x2e => Instruction::new(ROL, Abs, 6),
    0x3e => Instruction::new(ROL, AbsX, 7),

    0x6a => Instruction::new(ROR, Acc, 2),
    0x66 => Instruction::new(ROR, Zero, 5),
    0x76 => Instruction::new(ROR, ZeroX, 6),
    0x6e => Instruction::new(ROR, Abs, 6),
    0x7e => Instruction::new(ROR, AbsX, 7),

    0x48 => Instruction::new(PHA, Impl, 3),
    0x68 => Instruction::new(PLA, Impl, 4),
    0x08 => Instruction::new(PHP, Impl, 3),
    0x28 => Instruction::new(PLP, Impl, 4),

    // KIL/JAM, the unofficial NOPs and the combined RMW+ALU ops all land here.
    _ => None,
  }
}
