//! Length/distance prefix coding and the 2D distance-code mapping.
//!
//! VP8L transmits LZ77 lengths and distances as a small prefix symbol that
//! selects a bucket, plus raw extra bits selecting the exact value inside the
//! bucket. Distances additionally go through a 120-entry table of short
//! (dx, dy) pixel offsets before prefix coding, so that near-in-2D references
//! get the smallest codes; anything past the table is `distance + 120`.

/// Distance codes 1..=120 map through the (dx, dy) neighbor table.
pub const BORDER_DISTANCE_CODE: u32 = 120;

/// Number of distance prefix symbols.
pub const NUM_DISTANCE_CODES: usize = 40;

/// Number of length prefix symbols folded into the green alphabet.
pub const NUM_LENGTH_CODES: usize = 24;

/// Neighbor offsets for distance codes 1..=120, ordered by 2D closeness.
/// Entry `code - 1` holds (dx, dy); the linear distance is `dx + dy * xsize`.
const DIST_CODE_TO_NEIGHBOR: [(i8, i8); BORDER_DISTANCE_CODE as usize] = [
    (0, 1), (1, 0), (1, 1), (-1, 1), (0, 2), (2, 0), (1, 2), (-1, 2),
    (2, 1), (-2, 1), (2, 2), (-2, 2), (0, 3), (3, 0), (1, 3), (-1, 3),
    (3, 1), (-3, 1), (2, 3), (-2, 3), (3, 2), (-3, 2), (0, 4), (4, 0),
    (1, 4), (-1, 4), (4, 1), (-4, 1), (3, 3), (-3, 3), (2, 4), (-2, 4),
    (4, 2), (-4, 2), (0, 5), (3, 4), (-3, 4), (4, 3), (-4, 3), (5, 0),
    (1, 5), (-1, 5), (5, 1), (-5, 1), (2, 5), (-2, 5), (5, 2), (-5, 2),
    (4, 4), (-4, 4), (3, 5), (-3, 5), (5, 3), (-5, 3), (0, 6), (6, 0),
    (1, 6), (-1, 6), (6, 1), (-6, 1), (2, 6), (-2, 6), (6, 2), (-6, 2),
    (4, 5), (-4, 5), (5, 4), (-5, 4), (3, 6), (-3, 6), (6, 3), (-6, 3),
    (0, 7), (7, 0), (1, 7), (-1, 7), (5, 5), (-5, 5), (7, 1), (-7, 1),
    (4, 6), (-4, 6), (6, 4), (-6, 4), (2, 7), (-2, 7), (7, 2), (-7, 2),
    (3, 7), (-3, 7), (7, 3), (-7, 3), (5, 6), (-5, 6), (6, 5), (-6, 5),
    (8, 0), (4, 7), (-4, 7), (7, 4), (-7, 4), (8, 1), (8, 2), (6, 6),
    (-6, 6), (8, 3), (5, 7), (-5, 7), (7, 5), (-7, 5), (8, 4), (6, 7),
    (-6, 7), (7, 6), (-7, 6), (8, 5), (7, 7), (-7, 7), (8, 6), (8, 7),
];

/// Inverse of the neighbor table, indexed by `yoffset * 16 + 8 - xoffset`
/// (or the mirrored form for wrap-around offsets). 255 marks unused slots.
const NEIGHBOR_TO_DIST_CODE: [u8; 128] = [
    96, 73, 55, 39, 23, 13, 5, 1, 255, 255, 255, 255, 255, 255, 255, 255,
    101, 78, 58, 42, 26, 16, 8, 2, 0, 3, 9, 17, 27, 43, 59, 79,
    102, 86, 62, 46, 32, 20, 10, 6, 4, 7, 11, 21, 33, 47, 63, 87,
    105, 90, 70, 52, 37, 28, 18, 14, 12, 15, 19, 29, 38, 53, 71, 91,
    110, 99, 82, 66, 48, 35, 30, 24, 22, 25, 31, 36, 49, 67, 83, 100,
    115, 108, 94, 76, 64, 50, 44, 40, 34, 41, 45, 51, 65, 77, 95, 109,
    118, 113, 103, 92, 80, 68, 60, 56, 54, 57, 61, 69, 81, 93, 104, 114,
    119, 116, 111, 106, 97, 88, 84, 74, 72, 75, 85, 89, 98, 107, 112, 117,
];

/// Number of extra bits carried by a prefix symbol.
#[inline]
pub fn prefix_extra_bits(symbol: u16) -> u8 {
    if symbol < 4 {
        0
    } else {
        ((symbol - 2) >> 1) as u8
    }
}

/// Reconstruct a value from its prefix symbol and extra bits.
#[inline]
pub fn prefix_decode(symbol: u16, extra_bits: u32) -> u32 {
    if symbol < 4 {
        return u32::from(symbol) + 1;
    }
    let shift = (symbol - 2) >> 1;
    let offset = (2 + u32::from(symbol & 1)) << shift;
    offset + extra_bits + 1
}

/// Split a value (>= 1) into (prefix symbol, extra bit count, extra bits).
pub fn prefix_encode(value: u32) -> (u16, u8, u32) {
    debug_assert!(value >= 1);
    let v = value - 1;
    if v == 0 {
        return (0, 0, 0);
    }
    let highest_bit = 31 - v.leading_zeros();
    if highest_bit == 0 {
        return (1, 0, 0);
    }
    let second_highest_bit = (v >> (highest_bit - 1)) & 1;
    let symbol = (2 * highest_bit + second_highest_bit) as u16;
    let extra_bits_count = (highest_bit - 1) as u8;
    let extra_bits_value = v & ((1 << extra_bits_count) - 1);
    (symbol, extra_bits_count, extra_bits_value)
}

/// Map a distance code back to a linear pixel distance.
pub fn distance_code_to_distance(xsize: u32, distance_code: u32) -> u32 {
    if distance_code > BORDER_DISTANCE_CODE {
        return distance_code - BORDER_DISTANCE_CODE;
    }
    let (dx, dy) = DIST_CODE_TO_NEIGHBOR[(distance_code - 1) as usize];
    let distance = i64::from(dx) + i64::from(dy) * i64::from(xsize);
    if distance >= 1 {
        distance as u32
    } else {
        1
    }
}

/// Map a linear pixel distance to its distance code.
pub fn distance_to_dist_code(xsize: u32, distance: u32) -> u32 {
    let yoffset = distance / xsize;
    let xoffset = distance - yoffset * xsize;
    if xoffset <= 8 && yoffset < 8 {
        let code = NEIGHBOR_TO_DIST_CODE[(yoffset * 16 + 8 - xoffset) as usize];
        if code != 255 {
            return u32::from(code) + 1;
        }
    } else if xsize >= 8 && xoffset > xsize - 8 && yoffset < 7 {
        let code = NEIGHBOR_TO_DIST_CODE[((yoffset + 1) * 16 + 8 + (xsize - xoffset)) as usize];
        if code != 255 {
            return u32::from(code) + 1;
        }
    }
    distance + BORDER_DISTANCE_CODE
}
