//! Greedy LZ77 matcher over ARGB pixels.

use alloc::vec::Vec;

/// Matches may reach this many pixels back.
pub const MAX_DISTANCE: usize = 1024;

/// Longest transmittable match.
pub const MAX_LENGTH: usize = 128;

/// One token of the pixel stream: a literal pixel or a back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixOrCopy {
    Literal(u32),
    Copy { distance: u32, length: u32 },
}

/// Scan `data` with a greedy windowed matcher.
///
/// Every candidate distance within the window is tried; a match never reads
/// past the cursor (length <= distance), and among equal lengths the
/// smallest distance wins. Any match of length >= 1 becomes a copy token.
pub fn get_backward_references(data: &[u32]) -> Vec<PixOrCopy> {
    let mut tokens = Vec::new();
    let mut i = 0usize;
    while i < data.len() {
        let mut best_length = 0usize;
        let mut best_distance = 0usize;
        let window = i.min(MAX_DISTANCE);
        for distance in 1..=window {
            let start = i - distance;
            let limit = MAX_LENGTH.min(distance).min(data.len() - i);
            let mut length = 0usize;
            while length < limit && data[start + length] == data[i + length] {
                length += 1;
            }
            if length > best_length {
                best_length = length;
                best_distance = distance;
            }
        }
        if best_length >= 1 {
            tokens.push(PixOrCopy::Copy {
                distance: best_distance as u32,
                length: best_length as u32,
            });
            i += best_length;
        } else {
            tokens.push(PixOrCopy::Literal(data[i]));
            i += 1;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn expand(tokens: &[PixOrCopy]) -> Vec<u32> {
        let mut out = Vec::new();
        for token in tokens {
            match *token {
                PixOrCopy::Literal(pixel) => out.push(pixel),
                PixOrCopy::Copy { distance, length } => {
                    for _ in 0..length {
                        let pixel = out[out.len() - distance as usize];
                        out.push(pixel);
                    }
                }
            }
        }
        out
    }

    #[test]
    fn all_distinct_pixels_are_literals() {
        let data: Vec<u32> = (0..16).map(|i| 0xff000000 | i).collect();
        let tokens = get_backward_references(&data);
        assert_eq!(tokens.len(), data.len());
        assert!(tokens.iter().all(|t| matches!(t, PixOrCopy::Literal(_))));
    }

    #[test]
    fn run_of_equal_pixels_becomes_copies() {
        let data = vec![0xff123456u32; 20];
        let tokens = get_backward_references(&data);
        assert_eq!(tokens[0], PixOrCopy::Literal(0xff123456));
        // Matches never overlap the cursor, so run lengths double.
        assert_eq!(
            tokens[1],
            PixOrCopy::Copy {
                distance: 1,
                length: 1
            }
        );
        assert_eq!(expand(&tokens), data);
    }

    #[test]
    fn ties_prefer_most_recent_offset() {
        // The same pair appears twice; the second occurrence is nearer.
        let data = vec![1u32, 2, 1, 2, 1, 2];
        let tokens = get_backward_references(&data);
        for token in &tokens {
            if let PixOrCopy::Copy { distance, length } = token {
                assert_eq!(*distance, 2, "length {length}");
            }
        }
        assert_eq!(expand(&tokens), data);
    }

    #[test]
    fn length_never_exceeds_distance() {
        let mut data = vec![7u32; 300];
        data.extend((0..50).map(|i| i as u32));
        let tokens = get_backward_references(&data);
        for token in &tokens {
            if let PixOrCopy::Copy { distance, length } = *token {
                assert!(length <= distance);
                assert!(length as usize <= MAX_LENGTH);
                assert!(distance as usize <= MAX_DISTANCE);
            }
        }
        assert_eq!(expand(&tokens), data);
    }
}
