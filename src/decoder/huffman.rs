//! Canonical Huffman codes and the arena-backed decode tree.

use alloc::vec::Vec;

use crate::decoder::api::DecodeError;
use crate::decoder::bit_reader::BitReader;

/// Longest code length the VP8L bitstream can describe.
pub const MAX_ALLOWED_CODE_LENGTH: u8 = 15;

/// Sentinel stored for symbols whose code length is zero.
pub const NON_EXISTENT_CODE: u32 = u32::MAX;

/// Assign canonical codes to `code_lengths`, shorter codes numerically first
/// and ties broken by symbol order. Returns `None` if a length exceeds the
/// allowed maximum. Zero-length symbols get [`NON_EXISTENT_CODE`].
pub fn make_canonical_codes(code_lengths: &[u8]) -> Option<Vec<u32>> {
    let mut count = [0u32; MAX_ALLOWED_CODE_LENGTH as usize + 1];
    for &len in code_lengths {
        if len > MAX_ALLOWED_CODE_LENGTH {
            return None;
        }
        count[len as usize] += 1;
    }
    count[0] = 0;

    let mut next_code = [0u32; MAX_ALLOWED_CODE_LENGTH as usize + 1];
    let mut code = 0u32;
    for len in 1..=MAX_ALLOWED_CODE_LENGTH as usize {
        code = (code + count[len - 1]) << 1;
        next_code[len] = code;
    }

    let mut codes = Vec::with_capacity(code_lengths.len());
    for &len in code_lengths {
        if len == 0 {
            codes.push(NON_EXISTENT_CODE);
        } else {
            codes.push(next_code[len as usize]);
            next_code[len as usize] += 1;
        }
    }
    Some(codes)
}

#[derive(Debug, Clone, Copy)]
struct Node {
    symbol: u16,
    /// Negative: unassigned, 0: leaf, positive: offset to the left child.
    children: i32,
}

impl Node {
    const fn empty() -> Self {
        Self {
            symbol: 0,
            children: -1,
        }
    }
}

/// Decode tree stored as a flat arena. A valid code of N symbols always
/// builds exactly 2N-1 nodes; anything else is a malformed bitstream.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    max_nodes: usize,
}

impl HuffmanTree {
    fn with_leaves(num_leaves: usize) -> Result<Self, DecodeError> {
        if num_leaves == 0 {
            return Err(DecodeError::HuffmanError);
        }
        let max_nodes = 2 * num_leaves - 1;
        let mut nodes = Vec::with_capacity(max_nodes);
        nodes.push(Node::empty());
        Ok(Self { nodes, max_nodes })
    }

    /// Build from per-symbol code lengths. A single coded symbol yields the
    /// one-node tree that consumes no bits.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self, DecodeError> {
        let num_leaves = code_lengths.iter().filter(|&&len| len > 0).count();
        if num_leaves == 1 {
            let symbol = code_lengths
                .iter()
                .position(|&len| len > 0)
                .ok_or(DecodeError::HuffmanError)?;
            let mut tree = Self::with_leaves(1)?;
            tree.add_symbol(symbol as u16, 0, 0)?;
            return Ok(tree);
        }
        let codes = make_canonical_codes(code_lengths).ok_or(DecodeError::HuffmanError)?;
        let mut tree = Self::with_leaves(num_leaves)?;
        for (symbol, (&len, &code)) in code_lengths.iter().zip(&codes).enumerate() {
            if len > 0 {
                tree.add_symbol(symbol as u16, code, len)?;
            }
        }
        tree.check_full()?;
        Ok(tree)
    }

    /// Build from explicit (length, code, symbol) triples, as transmitted by
    /// the simple-code path.
    pub fn from_explicit(
        code_lengths: &[u8],
        codes: &[u32],
        symbols: &[u16],
    ) -> Result<Self, DecodeError> {
        debug_assert!(code_lengths.len() == codes.len() && codes.len() == symbols.len());
        let mut tree = Self::with_leaves(symbols.len())?;
        for ((&len, &code), &symbol) in code_lengths.iter().zip(codes).zip(symbols) {
            tree.add_symbol(symbol, code, len)?;
        }
        tree.check_full()?;
        Ok(tree)
    }

    fn add_symbol(&mut self, symbol: u16, code: u32, code_length: u8) -> Result<(), DecodeError> {
        let mut node = 0usize;
        let mut length = code_length;
        loop {
            if length == 0 {
                if self.nodes[node].children >= 0 {
                    // Slot already taken by a shorter or equal code.
                    return Err(DecodeError::HuffmanError);
                }
                self.nodes[node].children = 0;
                self.nodes[node].symbol = symbol;
                return Ok(());
            }
            match self.nodes[node].children {
                0 => return Err(DecodeError::HuffmanError),
                c if c < 0 => {
                    if self.nodes.len() + 2 > self.max_nodes {
                        return Err(DecodeError::HuffmanError);
                    }
                    self.nodes[node].children = (self.nodes.len() - node) as i32;
                    self.nodes.push(Node::empty());
                    self.nodes.push(Node::empty());
                }
                _ => {}
            }
            length -= 1;
            let bit = (code >> length) & 1;
            node = node + self.nodes[node].children as usize + bit as usize;
        }
    }

    fn check_full(&self) -> Result<(), DecodeError> {
        let full = self.nodes.len() == self.max_nodes
            && self.nodes.iter().all(|n| n.children >= 0);
        if full {
            Ok(())
        } else {
            Err(DecodeError::HuffmanError)
        }
    }

    /// Walk the tree one bit at a time. A one-node tree returns its symbol
    /// without consuming input.
    pub fn read_symbol(&self, reader: &mut BitReader<'_>) -> u16 {
        let mut node = 0usize;
        while self.nodes[node].children > 0 {
            let bit = reader.read_bit() as usize;
            node = node + self.nodes[node].children as usize + bit;
        }
        self.nodes[node].symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn canonical_codes_match_reference_assignment() {
        // Classic DEFLATE example: lengths (2, 1, 3, 3).
        let codes = make_canonical_codes(&[2, 1, 3, 3]).unwrap();
        assert_eq!(codes, vec![0b10, 0b0, 0b110, 0b111]);
    }

    #[test]
    fn canonical_codes_are_prefix_free() {
        let lengths = [3u8, 3, 3, 3, 3, 2, 4, 4];
        let codes = make_canonical_codes(&lengths).unwrap();
        for i in 0..lengths.len() {
            for j in 0..lengths.len() {
                if i == j {
                    continue;
                }
                let (short, long) = if lengths[i] <= lengths[j] { (i, j) } else { (j, i) };
                let shift = lengths[long] - lengths[short];
                assert_ne!(codes[long] >> shift, codes[short], "{i} vs {j}");
            }
        }
    }

    #[test]
    fn canonical_codes_reject_overlong() {
        assert!(make_canonical_codes(&[16]).is_none());
    }

    #[test]
    fn tree_decodes_its_own_codes() {
        let lengths = [2u8, 1, 3, 3];
        let tree = HuffmanTree::from_code_lengths(&lengths).unwrap();
        // Symbol 2 has code 110; tree steps are MSB-first, so the bits
        // arrive as 1, 1, 0 and pack LSB-first into 0b011.
        let data = [0b0000_0011u8];
        let mut reader = BitReader::new(&data);
        assert_eq!(tree.read_symbol(&mut reader), 2);
        assert_eq!(reader.bit_position(), 3);
    }

    #[test]
    fn single_symbol_tree_consumes_no_bits() {
        let mut lengths = [0u8; 40];
        lengths[7] = 1;
        let tree = HuffmanTree::from_code_lengths(&lengths).unwrap();
        let mut reader = BitReader::new(&[0xffu8]);
        assert_eq!(tree.read_symbol(&mut reader), 7);
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn incomplete_code_is_rejected() {
        // Lengths (1, 2) leave a hole at code 11.
        assert!(HuffmanTree::from_code_lengths(&[1, 2]).is_err());
        // Over-subscribed: three codes of length 1.
        assert!(HuffmanTree::from_code_lengths(&[1, 1, 1]).is_err());
        // No symbols at all.
        assert!(HuffmanTree::from_code_lengths(&[0, 0]).is_err());
    }

    #[test]
    fn explicit_two_symbol_tree() {
        let tree = HuffmanTree::from_explicit(&[1, 1], &[0, 1], &[200, 5]).unwrap();
        let mut reader = BitReader::new(&[0b10u8]);
        assert_eq!(tree.read_symbol(&mut reader), 200);
        assert_eq!(tree.read_symbol(&mut reader), 5);
    }
}
