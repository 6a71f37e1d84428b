/// Bit-reversal table: `FLIP[i]` holds the bits of `i` in reverse order.
pub const FLIP: [u8; 256] = [
    0, 128, 64, 192, 32, 160, 96, 224, 16, 144, 80, 208, 48, 176, 112, 240,
    8, 136, 72, 200, 40, 168, 104, 232, 24, 152, 88, 216, 56, 184, 120, 248,
    4, 132, 68, 196, 36, 164, 100, 228, 20, 148, 84, 212, 52, 180, 116, 244,
    12, 140, 76, 204, 44, 172, 108, 236, 28, 156, 92, 220, 60, 188, 124, 252,
    2, 130, 66, 194, 34, 162, 98, 226, 18, 146, 82, 210, 50, 178, 114, 242,
    10, 138, 74, 202, 42, 170, 106, 234, 26, 154, 90, 218, 58, 186, 122, 250,
    6, 134, 70, 198, 38, 166, 102, 230, 22, 150, 86, 214, 54, 182, 118, 246,
    14, 142, 78, 206, 46, 174, 110, 238, 30, 158, 94, 222, 62, 190, 126, 254,
    1, 129, 65, 193, 33, 161, 97, 225, 17, 145, 81, 209, 49, 177, 113, 241,
    9, 137, 73, 201, 41, 169, 105, 233, 25, 153, 89, 217, 57, 185, 121, 249,
    5, 133, 69, 197, 37, 165, 101, 229, 21, 149, 85, 213, 53, 181, 117, 245,
    13, 141, 77, 205, 45, 173, 109, 237, 29, 157, 93, 221, 61, 189, 125, 253,
    3, 131, 67, 195, 35, 163, 99, 227, 19, 147, 83, 211, 51, 179, 115, 243,
    11, 139, 75, 203, 43, 171, 107, 235, 27, 155, 91, 219, 59, 187, 123, 251,
    7, 135, 71, 199, 39, 167, 103, 231, 23, 151, 87, 215, 55, 183, 119, 247,
    15, 143, 79, 207, 47, 175, 111, 239, 31, 159, 95, 223, 63, 191, 127, 255,
];

/// An 8x8 bitmap with an attribute byte and an optional mask.
///
/// Each data byte is one pixel row, most significant bit leftmost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub attr: u8,
    pub data: [u8; 8],
    pub mask: Option<[u8; 8]>,
}

impl Tile {
    pub fn new(attr: u8, data: [u8; 8]) -> Self {
        Self {
            attr,
            data,
            mask: None,
        }
    }

    pub fn with_mask(attr: u8, data: [u8; 8], mask: [u8; 8]) -> Self {
        Self {
            attr,
            data,
            mask: Some(mask),
        }
    }

    /// Flip the tile in place: bit 0 of `mode` flips horizontally, bit 1
    /// flips vertically.
    pub fn flip(&mut self, mode: u32) {
        if mode & 1 != 0 {
            flip_rows(&mut self.data);
            if let Some(mask) = self.mask.as_mut() {
                flip_rows(mask);
            }
        }
        if mode & 2 != 0 {
            self.data.reverse();
            if let Some(mask) = self.mask.as_mut() {
                mask.reverse();
            }
        }
    }

    /// Rotate the tile 90 degrees clockwise `times` times (mod 4).
    pub fn rotate(&mut self, times: u32) {
        for _ in 0..times & 3 {
            self.data = rotate_rows(&self.data);
            if let Some(mask) = self.mask.as_mut() {
                *mask = rotate_rows(mask);
            }
        }
    }
}

/// Copy up to eight bytes into tile rows; missing rows are blank.
pub(crate) fn to_rows(bytes: &[u8]) -> [u8; 8] {
    let mut rows = [0; 8];
    for (row, byte) in rows.iter_mut().zip(bytes) {
        *row = *byte;
    }
    rows
}

fn flip_rows(rows: &mut [u8; 8]) {
    for row in rows.iter_mut() {
        *row = FLIP[*row as usize];
    }
}

// Bit plane 1 of the input becomes the bottom output row, bit plane 128 the
// top one. Within a plane the first input row lands in bit 0.
fn rotate_rows(rows: &[u8; 8]) -> [u8; 8] {
    let mut rotated = [0; 8];
    let mut bit = 1u8;
    for out in (0..8).rev() {
        let mut rbyte = 0u8;
        for byte in rows {
            rbyte >>= 1;
            if byte & bit != 0 {
                rbyte |= 128;
            }
        }
        rotated[out] = rbyte;
        bit = bit.wrapping_shl(1);
    }
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn sample() -> Tile {
        Tile::with_mask(
            56,
            [0x80, 0x40, 0x21, 0x13, 0x0f, 0xf0, 0x3c, 0x01],
            [0xff, 0x7f, 0x3f, 0x1f, 0x0f, 0x07, 0x03, 0x01],
        )
    }

    #[test]
    fn test_flip_table_is_bit_reversal() {
        for i in 0..=255u8 {
            assert_eq!(FLIP[i as usize], i.reverse_bits());
        }
    }

    #[test]
    fn test_flip() {
        let tests = vec![
            (1, [0x01, 0x02, 0x84, 0xc8, 0xf0, 0x0f, 0x3c, 0x80]),
            (2, [0x01, 0x3c, 0xf0, 0x0f, 0x13, 0x21, 0x40, 0x80]),
            (3, [0x80, 0x3c, 0x0f, 0xf0, 0xc8, 0x84, 0x02, 0x01]),
        ];
        for (mode, expected) in tests {
            let mut tile = sample();
            tile.flip(mode);
            assert_eq!(tile.data, expected);
        }
    }

    #[test]
    fn test_flip_twice_is_identity() {
        for mode in 1..4 {
            let mut tile = sample();
            tile.flip(mode);
            assert_ne!(tile, sample());
            tile.flip(mode);
            assert_eq!(tile, sample());
        }
    }

    #[test]
    fn test_rotate_once() {
        // A vertical bar on the left edge becomes a horizontal bar on top.
        let mut tile = Tile::new(0, [0x80; 8]);
        tile.rotate(1);
        assert_eq!(tile.data, [0xff, 0, 0, 0, 0, 0, 0, 0]);

        // The top-left pixel moves to the top-right corner.
        let mut tile = Tile::new(0, [0x80, 0, 0, 0, 0, 0, 0, 0]);
        tile.rotate(1);
        assert_eq!(tile.data, [0x01, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_rotate_properties() {
        let mut four = sample();
        four.rotate(4);
        assert_eq!(four, sample());

        let mut twice = sample();
        twice.rotate(1);
        twice.rotate(1);
        let mut two = sample();
        two.rotate(2);
        assert_eq!(twice, two);

        let mut flipped = sample();
        flipped.flip(3);
        assert_eq!(two, flipped);
    }

    #[test]
    fn test_rotate_mask() {
        let mut tile = sample();
        tile.rotate(3);
        let mut mask_only = Tile::new(56, sample().mask.unwrap());
        mask_only.rotate(3);
        assert_eq!(tile.mask, Some(mask_only.data));
    }

    #[test]
    fn test_equality_requires_matching_mask() {
        let plain = Tile::new(56, [1; 8]);
        let masked = Tile::with_mask(56, [1; 8], [0; 8]);
        assert_ne!(plain, masked);
        assert_ne!(plain, Tile::new(57, [1; 8]));
        assert_eq!(plain.clone(), plain);
    }
}
