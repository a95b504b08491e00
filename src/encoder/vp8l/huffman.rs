//! Huffman code construction and tree serialization for the encoder.

use alloc::vec;
use alloc::vec::Vec;

use crate::decoder::huffman::make_canonical_codes;
use crate::decoder::lossless::{CODE_LENGTH_CODES, CODE_LENGTH_CODE_ORDER};
use crate::encoder::api::EncodeError;
use crate::encoder::vp8l::bitwriter::BitWriter;

/// Depth bound for the five image trees.
pub const MAX_CODE_LENGTH: u8 = 15;

/// Depth bound for the secondary code-length tree; its lengths travel in
/// 3-bit fields.
const MAX_CODE_LENGTH_CODE_DEPTH: u8 = 7;

/// Canonical code lengths and LSB-first codes for one alphabet.
pub struct HuffmanTreeCodes {
    lengths: Vec<u8>,
    codes: Vec<u16>,
    num_coded: usize,
}

#[derive(Clone, Copy)]
struct TreeNode {
    weight: u64,
    symbol: u32,
    // usize::MAX marks a leaf.
    left: usize,
    right: usize,
}

const LEAF: usize = usize::MAX;

impl HuffmanTreeCodes {
    /// Build length-limited canonical codes for `histo`. Fails hard when the
    /// optimal tree is deeper than `max_allowed`.
    pub fn from_histogram(histo: &[u32], max_allowed: u8) -> Result<Self, EncodeError> {
        debug_assert!(max_allowed <= MAX_CODE_LENGTH);
        let mut lengths = vec![0u8; histo.len()];

        let mut nodes: Vec<TreeNode> = histo
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(symbol, &count)| TreeNode {
                weight: u64::from(count),
                symbol: symbol as u32,
                left: LEAF,
                right: LEAF,
            })
            .collect();
        let num_coded = nodes.len();

        match num_coded {
            0 => {}
            1 => {
                // One coded symbol: length 1, canonical code 0. Emission is
                // suppressed for trivial trees, so no bits ever carry it.
                lengths[nodes[0].symbol as usize] = 1;
            }
            _ => {
                let mut roots: Vec<usize> = (0..nodes.len()).collect();
                while roots.len() > 1 {
                    // Stable sort keeps symbol order among equal weights, so
                    // the merge order is deterministic.
                    roots.sort_by_key(|&i| nodes[i].weight);
                    let left = roots[0];
                    let right = roots[1];
                    nodes.push(TreeNode {
                        weight: nodes[left].weight + nodes[right].weight,
                        symbol: 0,
                        left,
                        right,
                    });
                    let parent = nodes.len() - 1;
                    roots.remove(0);
                    roots[0] = parent;
                }

                let mut max_depth = 0u8;
                let mut stack = vec![(roots[0], 0u8)];
                while let Some((index, depth)) = stack.pop() {
                    let node = nodes[index];
                    if node.left == LEAF {
                        lengths[node.symbol as usize] = depth;
                        max_depth = max_depth.max(depth);
                    } else {
                        stack.push((node.left, depth + 1));
                        stack.push((node.right, depth + 1));
                    }
                }
                if max_depth > max_allowed {
                    return Err(EncodeError::CodeLengthTooLong {
                        max_allowed,
                        got: max_depth,
                    });
                }
            }
        }

        let canonical = match make_canonical_codes(&lengths) {
            Some(codes) => codes,
            // Lengths are bounded by max_allowed <= 15, so this cannot fail.
            None => return Err(EncodeError::CodeLengthTooLong {
                max_allowed,
                got: MAX_CODE_LENGTH,
            }),
        };
        let codes = lengths
            .iter()
            .zip(&canonical)
            .map(|(&len, &code)| {
                if len == 0 {
                    0
                } else {
                    reverse_bits(code, len)
                }
            })
            .collect();
        Ok(Self {
            lengths,
            codes,
            num_coded,
        })
    }

    /// Build codes that always respect the depth bound: on failure the
    /// per-symbol counts are clamped upward with a doubling floor, which
    /// flattens the histogram until the tree fits.
    pub fn from_histogram_clamped(histo: &[u32], max_allowed: u8) -> Self {
        let mut count_min = 1u32;
        loop {
            let clamped: Vec<u32> = histo
                .iter()
                .map(|&c| if c == 0 { 0 } else { c.max(count_min) })
                .collect();
            match Self::from_histogram(&clamped, max_allowed) {
                Ok(codes) => return codes,
                Err(_) => count_min *= 2,
            }
        }
    }

    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    /// Fewer than two coded symbols: the symbol stream carries zero bits per
    /// symbol and the decoder's one-node tree consumes none.
    pub fn is_trivial(&self) -> bool {
        self.num_coded < 2
    }

    /// Emit the code for `symbol`, or nothing for a trivial tree.
    #[inline]
    pub fn write_symbol(&self, w: &mut BitWriter, symbol: usize) {
        if !self.is_trivial() {
            w.write_bits(u64::from(self.codes[symbol]), self.lengths[symbol]);
        }
    }
}

/// Reverse `len` low bits: canonical codes assign MSB-first, the stream
/// wants the first tree step in the lowest bit.
fn reverse_bits(code: u32, len: u8) -> u16 {
    let mut reversed = 0u16;
    for i in 0..len {
        reversed |= (((code >> i) & 1) as u16) << (len - 1 - i);
    }
    reversed
}

/// One RLE token of the code-length sequence: a code-length code in 0..19
/// plus its extra-bits payload for codes 16/17/18.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RleToken {
    code: u8,
    extra: u8,
}

fn push_repeated_zeros(mut reps: usize, tokens: &mut Vec<RleToken>) {
    while reps >= 1 {
        if reps < 3 {
            for _ in 0..reps {
                tokens.push(RleToken { code: 0, extra: 0 });
            }
            break;
        } else if reps < 11 {
            tokens.push(RleToken {
                code: 17,
                extra: (reps - 3) as u8,
            });
            break;
        } else if reps < 139 {
            tokens.push(RleToken {
                code: 18,
                extra: (reps - 11) as u8,
            });
            break;
        } else {
            tokens.push(RleToken {
                code: 18,
                extra: 127,
            });
            reps -= 138;
        }
    }
}

fn push_repeated_values(value: u8, prev: u8, mut reps: usize, tokens: &mut Vec<RleToken>) {
    if value != prev {
        tokens.push(RleToken {
            code: value,
            extra: 0,
        });
        reps -= 1;
    }
    while reps >= 1 {
        if reps < 3 {
            for _ in 0..reps {
                tokens.push(RleToken {
                    code: value,
                    extra: 0,
                });
            }
            break;
        } else if reps < 7 {
            tokens.push(RleToken {
                code: 16,
                extra: (reps - 3) as u8,
            });
            break;
        } else {
            tokens.push(RleToken { code: 16, extra: 3 });
            reps -= 6;
        }
    }
}

/// RLE-compress a code length sequence into code-length codes. Mirrors the
/// repeat semantics the decoder expands (16: repeat previous, 17/18: runs
/// of zeros).
fn compress_code_lengths(lengths: &[u8]) -> Vec<RleToken> {
    let mut tokens = Vec::new();
    // The decoder's "previous length" starts at 8.
    let mut prev = 8u8;
    let mut i = 0usize;
    while i < lengths.len() {
        let value = lengths[i];
        let mut run = 1usize;
        while i + run < lengths.len() && lengths[i + run] == value {
            run += 1;
        }
        if value == 0 {
            push_repeated_zeros(run, &mut tokens);
        } else {
            push_repeated_values(value, prev, run, &mut tokens);
            prev = value;
        }
        i += run;
    }
    tokens
}

/// Serialize a tree description the decoder's code reader understands.
pub fn write_huffman_tree(w: &mut BitWriter, codes: &HuffmanTreeCodes) {
    let mut count = 0usize;
    let mut symbols = [0usize; 2];
    for (symbol, &len) in codes.lengths().iter().enumerate() {
        if len != 0 {
            if count < 2 {
                symbols[count] = symbol;
            }
            count += 1;
            if count > 2 {
                break;
            }
        }
    }

    if count == 0 {
        // No symbols: a simple code carrying the 1-bit symbol 0. The decoder
        // builds a one-node tree it will never walk.
        w.write_bit(true);
        w.write_bit(false);
        w.write_bit(false);
        w.write_bit(false);
    } else if count <= 2 && symbols[0] < 256 && symbols[1] < 256 {
        w.write_bit(true);
        w.write_bit(count == 2);
        if symbols[0] <= 1 {
            w.write_bit(false);
            w.write_bit(symbols[0] == 1);
        } else {
            w.write_bit(true);
            w.write_bits(symbols[0] as u64, 8);
        }
        if count == 2 {
            w.write_bits(symbols[1] as u64, 8);
        }
    } else {
        w.write_bit(false);
        write_compressed_tree(w, codes);
    }
}

fn write_compressed_tree(w: &mut BitWriter, codes: &HuffmanTreeCodes) {
    let tokens = compress_code_lengths(codes.lengths());
    let mut histo = [0u32; CODE_LENGTH_CODES];
    for token in &tokens {
        histo[usize::from(token.code)] += 1;
    }
    let rle_codes = HuffmanTreeCodes::from_histogram_clamped(&histo, MAX_CODE_LENGTH_CODE_DEPTH);

    // Trim trailing zero length-codes in transmission order, keeping at
    // least four.
    let mut codes_to_store = CODE_LENGTH_CODES;
    while codes_to_store > 4 {
        let i = CODE_LENGTH_CODE_ORDER[codes_to_store - 1];
        if rle_codes.lengths()[i] != 0 {
            break;
        }
        codes_to_store -= 1;
    }
    w.write_bits((codes_to_store - 4) as u64, 4);
    for &i in CODE_LENGTH_CODE_ORDER.iter().take(codes_to_store) {
        w.write_bits(u64::from(rle_codes.lengths()[i]), 3);
    }

    // No max-symbol cap.
    w.write_bit(false);

    for token in &tokens {
        rle_codes.write_symbol(w, usize::from(token.code));
        match token.code {
            16 => w.write_bits(u64::from(token.extra), 2),
            17 => w.write_bits(u64::from(token.extra), 3),
            18 => w.write_bits(u64::from(token.extra), 7),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kraft_sum(lengths: &[u8]) -> f64 {
        lengths
            .iter()
            .filter(|&&l| l > 0)
            .map(|&l| 1.0 / f64::from(1u32 << l))
            .sum()
    }

    #[test]
    fn balanced_histogram_gives_balanced_tree() {
        let histo = [1u32; 16];
        let codes = HuffmanTreeCodes::from_histogram(&histo, 15).unwrap();
        assert!(codes.lengths().iter().all(|&l| l == 4));
    }

    #[test]
    fn skewed_histogram_favors_frequent_symbols() {
        let histo = [1000u32, 1, 1, 1];
        let codes = HuffmanTreeCodes::from_histogram(&histo, 15).unwrap();
        assert_eq!(codes.lengths()[0], 1);
        assert!((kraft_sum(codes.lengths()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_and_single_histograms() {
        let codes = HuffmanTreeCodes::from_histogram(&[0u32; 8], 15).unwrap();
        assert!(codes.is_trivial());
        assert!(codes.lengths().iter().all(|&l| l == 0));

        let mut histo = [0u32; 8];
        histo[5] = 42;
        let codes = HuffmanTreeCodes::from_histogram(&histo, 15).unwrap();
        assert!(codes.is_trivial());
        assert_eq!(codes.lengths()[5], 1);
    }

    #[test]
    fn depth_limit_errors_then_clamping_recovers() {
        // Fibonacci weights force a maximally skewed tree.
        let mut histo = [0u32; 16];
        let (mut a, mut b) = (1u32, 1u32);
        for slot in histo.iter_mut() {
            *slot = a;
            let next = a + b;
            a = b;
            b = next;
        }
        let err = HuffmanTreeCodes::from_histogram(&histo, 7);
        assert!(matches!(
            err,
            Err(EncodeError::CodeLengthTooLong { max_allowed: 7, .. })
        ));
        let codes = HuffmanTreeCodes::from_histogram_clamped(&histo, 7);
        assert!(codes.lengths().iter().all(|&l| l <= 7));
        assert!((kraft_sum(codes.lengths()) - 1.0).abs() < 1e-9);
    }

    /// Expand RLE tokens exactly the way the bitstream reader does.
    fn expand(tokens: &[RleToken], total: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut prev = 8u8;
        for t in tokens {
            match t.code {
                16 => {
                    for _ in 0..t.extra + 3 {
                        out.push(prev);
                    }
                }
                17 => {
                    for _ in 0..t.extra + 3 {
                        out.push(0);
                    }
                }
                18 => {
                    for _ in 0..u16::from(t.extra) + 11 {
                        out.push(0);
                    }
                }
                code => {
                    out.push(code);
                    if code != 0 {
                        prev = code;
                    }
                }
            }
        }
        assert!(out.len() <= total);
        out.resize(total, 0);
        out
    }

    #[test]
    fn rle_compression_expands_back() {
        let cases: [&[u8]; 5] = [
            &[0; 40],
            &[8, 8, 8, 8, 8, 8, 8, 8, 8, 8],
            &[5, 5, 5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3],
            &[1, 2, 3, 4, 5, 6, 7],
            &[2; 300],
        ];
        for lengths in cases {
            let tokens = compress_code_lengths(lengths);
            assert_eq!(expand(&tokens, lengths.len()), lengths, "{lengths:?}");
        }
    }

    #[test]
    fn long_zero_runs_split_at_138() {
        let lengths = [0u8; 200];
        let tokens = compress_code_lengths(&lengths);
        assert_eq!(tokens[0], RleToken { code: 18, extra: 127 });
        assert_eq!(expand(&tokens, 200), lengths);
    }

    #[test]
    fn codes_reverse_canonical_bits() {
        // Lengths (2, 1, 3, 3) get canonical codes (10, 0, 110, 111);
        // LSB-first emission stores them bit-reversed.
        let histo = [2u32, 4, 1, 1];
        let codes = HuffmanTreeCodes::from_histogram(&histo, 15).unwrap();
        assert_eq!(codes.lengths(), &[2, 1, 3, 3]);
        assert_eq!(codes.codes, alloc::vec![0b01, 0b0, 0b011, 0b111]);
    }
}
