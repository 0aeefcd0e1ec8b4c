//! Morton (Z-order) codec for tile grid coordinates.
//!
//! `x` occupies the even bits of the key and `y` the odd bits. The key is
//! monotone in each axis, so the keys of a rectangle's min and max corners
//! bound every tile inside it. The bound is not tight: keys inside the numeric
//! range can belong to tiles outside the rectangle wherever the range crosses
//! a quadrant boundary.

/// Interleave `x` and `y` into one key.
#[inline]
pub fn encode(x: u32, y: u32) -> u64 {
    spread(x) | (spread(y) << 1)
}

/// Split a key back into `(x, y)`.
#[inline]
pub fn decode(key: u64) -> (u32, u32) {
    (compact(key), compact(key >> 1))
}

#[inline]
fn spread(v: u32) -> u64 {
    let mut x = u64::from(v);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

#[inline]
fn compact(v: u64) -> u32 {
    let mut x = v & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_small_values() {
        assert_eq!(encode(0, 0), 0);
        assert_eq!(encode(1, 0), 1);
        assert_eq!(encode(0, 1), 2);
        assert_eq!(encode(1, 1), 3);
        assert_eq!(encode(2, 0), 4);
        assert_eq!(encode(128, 128), 49152);
    }

    #[test]
    fn test_roundtrip() {
        let max_24 = (1u32 << 24) - 1;
        let samples = [
            (0, 0),
            (1, 2),
            (128, 128),
            (4095, 17),
            (max_24, 0),
            (0, max_24),
            (max_24, max_24),
            (u32::MAX, u32::MAX),
            (0xDEAD_BEEF, 0x0BAD_F00D),
        ];
        for (x, y) in samples {
            assert_eq!(decode(encode(x, y)), (x, y), "roundtrip of ({}, {})", x, y);
        }
    }

    #[test]
    fn test_corner_keys_bound_rectangle() {
        let (min_x, max_x, min_y, max_y) = (3u32, 9u32, 2u32, 7u32);
        let low = encode(min_x, min_y);
        let high = encode(max_x, max_y);
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                let key = encode(x, y);
                assert!(low <= key && key <= high, "({}, {}) outside range", x, y);
            }
        }
    }

    #[test]
    fn test_range_is_superset() {
        // Tiles x 1..=2, y 0..=1 span keys 1..=6, which also contains (0, 1) = 2
        let low = encode(1, 0);
        let high = encode(2, 1);
        let outside = encode(0, 1);
        assert!(low <= outside && outside <= high);
    }
}
