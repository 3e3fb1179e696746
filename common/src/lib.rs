#![cfg_attr(not(test), no_std)]

pub mod kilobytes {
  pub const KB64: usize = 65536;
}

pub mod utils {
  /// Parses `c000`, `C000`, `0xc000` or `$c000`.
  pub fn parse_hex(src: &str) -> core::result::Result<u16, core::num::ParseIntError> {
    let digits = src
      .strip_prefix("0x")
      .or_else(|| src.strip_prefix("0X"))
      .or_else(|| src.strip_prefix('$'))
      .unwrap_or(src);
    u16::from_str_radix(digits, 16)
  }
}

pub mod bits {
  pub fn is_signed(n: u8) -> bool {
    n & (1 << 7) != 0
  }

  /// Signed overflow of `lhs + rhs = res`: both operands share a sign the result doesn't.
  pub fn is_overflow(res: u8, lhs: u8, rhs: u8) -> bool {
    (!(lhs ^ rhs) & (lhs ^ res)) & 0x80 != 0
  }

  pub fn lo(word: u16) -> u8 {
    (word & 0x00ff) as u8
  }

  pub fn hi(word: u16) -> u8 {
    (word >> 8) as u8
  }

  pub fn word(lo: u8, hi: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
  }

  pub fn is_page_crossed(from: u16, to: u16) -> bool {
    from & 0xff00 != to & 0xff00
  }
}
