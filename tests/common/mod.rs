//! Helpers for crafting VP8L payloads by hand.

/// Minimal LSB-first bit packer.
pub struct Bits {
    bytes: Vec<u8>,
    acc: u64,
    used: u8,
}

impl Bits {
    pub fn new() -> Self {
        Bits {
            bytes: Vec::new(),
            acc: 0,
            used: 0,
        }
    }

    pub fn push(&mut self, value: u64, n: u8) -> &mut Self {
        self.acc |= value << self.used;
        self.used += n;
        while self.used >= 8 {
            self.bytes.push(self.acc as u8);
            self.acc >>= 8;
            self.used -= 8;
        }
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        if self.used > 0 {
            self.bytes.push(self.acc as u8);
        }
        self.bytes
    }
}

pub fn wrap_in_riff(payload: &[u8]) -> Vec<u8> {
    let mut webp = Vec::new();
    webp.extend_from_slice(b"RIFF");
    webp.extend_from_slice(&((8 + payload.len()) as u32).to_le_bytes());
    webp.extend_from_slice(b"WEBP");
    webp.extend_from_slice(b"VP8L");
    webp.extend_from_slice(payload);
    webp
}
