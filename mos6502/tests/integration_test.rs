use std::path::PathBuf;

use mos6502::{
  cpu::{Cpu, Variant},
  memory::Memory,
  mos6502::{Mos6502, Outcome},
};

// Most of these need far more instructions than this to finish.
const MAX_INSTRUCTIONS: u64 = 200_000_000;

fn rom_path(file: &str) -> PathBuf {
  let dir = std::env::var("MOS6502_TEST_ROMS").unwrap_or_else(|_| "../test-roms/bin".into());
  PathBuf::from(dir).join(file)
}

fn run_test_rom(
  file: &str,
  variant: Variant,
  load_base: u16,
  entry_point: u16,
  success_address: u16,
) -> Option<(Outcome, u64)> {
  let path = rom_path(file);
  let program = match std::fs::read(&path) {
    Ok(program) => program,
    Err(e) => {
      eprintln!("skipping, {}: {}", path.display(), e);
      return None;
    }
  };

  let mut cpu = Cpu::with_variant(Memory::load(&program[..], load_base), variant);
  cpu.set_pc(entry_point);
  let mut machine = Mos6502::new(cpu);

  let outcome = machine
    .run_until(|cpu| cpu.pc() == success_address, MAX_INSTRUCTIONS)
    .expect("fault");

  Some((outcome, machine.instructions()))
}

#[test]
#[ignore = "needs test ROMs, set MOS6502_TEST_ROMS"]
fn functional_test_bcd_disabled() {
  let expected_instructions = 26765879;
  if let Some((outcome, instructions)) = run_test_rom(
    "functional_test_bcd_disabled.bin",
    Variant::Ricoh2A03,
    0x000,
    0x400,
    0x336d,
  ) {
    assert_eq!(outcome, Outcome::Reached, "trapped");
    assert_eq!(expected_instructions, instructions, "wrong instruction count");
  }
}

#[test]
#[ignore = "needs test ROMs, set MOS6502_TEST_ROMS"]
fn functional_test_full() {
  if let Some((outcome, _)) =
    run_test_rom("functional_test_full.bin", Variant::Nmos, 0x000, 0x400, 0x3469)
  {
    assert_eq!(outcome, Outcome::Reached, "trapped");
  }
}

#[test]
#[ignore = "needs test ROMs, set MOS6502_TEST_ROMS"]
fn ttl6502() {
  let expected_instructions = 2738;
  if let Some((outcome, instructions)) =
    run_test_rom("TTL6502.bin", Variant::Nmos, 0xe000, 0xe000, 0xf5b6)
  {
    assert_eq!(outcome, Outcome::Reached, "trapped");
    assert_eq!(expected_instructions, instructions, "wrong instruction count");
  }
}
