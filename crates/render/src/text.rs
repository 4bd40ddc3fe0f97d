//! Bitmap-font text meshes.
//!
//! The font is an embedded 8×8 uppercase bitmap covering ASCII 32..95,
//! rasterized into a 16×4 glyph atlas at startup; no image files are loaded.
//! [`generate_text_mesh`] emits one UV-mapped quad per character for the
//! scene graph's 2D text node.

use beatbounce_core::Vertex;

pub const FONT_COLS: u32 = 16;
pub const FONT_ROWS: u32 = 4;
pub const GLYPH_W: u32 = 8;
pub const GLYPH_H: u32 = 8;
pub const ATLAS_W: u32 = FONT_COLS * GLYPH_W; // 128
pub const ATLAS_H: u32 = FONT_ROWS * GLYPH_H; // 32

/// First covered code point (space). Lowercase input is uppercased; anything
/// else outside 32..95 renders as space.
const FIRST_GLYPH: u32 = 32;
const GLYPH_COUNT: u32 = FONT_COLS * FONT_ROWS;

/// 8×8 bitmap font for ASCII 32..95 (64 glyphs, 8 bytes each).
/// Each byte is one row, MSB = leftmost pixel.
#[rustfmt::skip]
const FONT_DATA: [u8; (GLYPH_COUNT * 8) as usize] = [
    0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x00, // 32 ' '
    0x18,0x18,0x18,0x18,0x18,0x00,0x18,0x00, // 33 '!'
    0x6C,0x6C,0x24,0x00,0x00,0x00,0x00,0x00, // 34 '"'
    0x6C,0x6C,0xFE,0x6C,0xFE,0x6C,0x6C,0x00, // 35 '#'
    0x18,0x7E,0xC0,0x7C,0x06,0xFC,0x18,0x00, // 36 '$'
    0x00,0xC6,0xCC,0x18,0x30,0x66,0xC6,0x00, // 37 '%'
    0x38,0x6C,0x38,0x76,0xDC,0xCC,0x76,0x00, // 38 '&'
    0x18,0x18,0x30,0x00,0x00,0x00,0x00,0x00, // 39 '\''
    0x0C,0x18,0x30,0x30,0x30,0x18,0x0C,0x00, // 40 '('
    0x30,0x18,0x0C,0x0C,0x0C,0x18,0x30,0x00, // 41 ')'
    0x00,0x66,0x3C,0xFF,0x3C,0x66,0x00,0x00, // 42 '*'
    0x00,0x18,0x18,0x7E,0x18,0x18,0x00,0x00, // 43 '+'
    0x00,0x00,0x00,0x00,0x00,0x18,0x18,0x30, // 44 ','
    0x00,0x00,0x00,0x7E,0x00,0x00,0x00,0x00, // 45 '-'
    0x00,0x00,0x00,0x00,0x00,0x18,0x18,0x00, // 46 '.'
    0x06,0x0C,0x18,0x30,0x60,0xC0,0x80,0x00, // 47 '/'
    0x7C,0xC6,0xCE,0xD6,0xE6,0xC6,0x7C,0x00, // 48 '0'
    0x18,0x38,0x18,0x18,0x18,0x18,0x7E,0x00, // 49 '1'
    0x7C,0xC6,0x06,0x1C,0x30,0x60,0xFE,0x00, // 50 '2'
    0x7C,0xC6,0x06,0x3C,0x06,0xC6,0x7C,0x00, // 51 '3'
    0x1C,0x3C,0x6C,0xCC,0xFE,0x0C,0x0C,0x00, // 52 '4'
    0xFE,0xC0,0xFC,0x06,0x06,0xC6,0x7C,0x00, // 53 '5'
    0x38,0x60,0xC0,0xFC,0xC6,0xC6,0x7C,0x00, // 54 '6'
    0xFE,0xC6,0x0C,0x18,0x30,0x30,0x30,0x00, // 55 '7'
    0x7C,0xC6,0xC6,0x7C,0xC6,0xC6,0x7C,0x00, // 56 '8'
    0x7C,0xC6,0xC6,0x7E,0x06,0x0C,0x78,0x00, // 57 '9'
    0x00,0x18,0x18,0x00,0x00,0x18,0x18,0x00, // 58 ':'
    0x00,0x18,0x18,0x00,0x00,0x18,0x18,0x30, // 59 ';'
    0x06,0x0C,0x18,0x30,0x18,0x0C,0x06,0x00, // 60 '<'
    0x00,0x00,0x7E,0x00,0x7E,0x00,0x00,0x00, // 61 '='
    0x60,0x30,0x18,0x0C,0x18,0x30,0x60,0x00, // 62 '>'
    0x7C,0xC6,0x0C,0x18,0x18,0x00,0x18,0x00, // 63 '?'
    0x7C,0xC6,0xDE,0xDE,0xDE,0xC0,0x7C,0x00, // 64 '@'
    0x38,0x6C,0xC6,0xC6,0xFE,0xC6,0xC6,0x00, // 65 'A'
    0xFC,0xC6,0xC6,0xFC,0xC6,0xC6,0xFC,0x00, // 66 'B'
    0x3C,0x66,0xC0,0xC0,0xC0,0x66,0x3C,0x00, // 67 'C'
    0xF8,0xCC,0xC6,0xC6,0xC6,0xCC,0xF8,0x00, // 68 'D'
    0xFE,0xC0,0xC0,0xF8,0xC0,0xC0,0xFE,0x00, // 69 'E'
    0xFE,0xC0,0xC0,0xF8,0xC0,0xC0,0xC0,0x00, // 70 'F'
    0x3C,0x66,0xC0,0xCE,0xC6,0x66,0x3E,0x00, // 71 'G'
    0xC6,0xC6,0xC6,0xFE,0xC6,0xC6,0xC6,0x00, // 72 'H'
    0x7E,0x18,0x18,0x18,0x18,0x18,0x7E,0x00, // 73 'I'
    0x06,0x06,0x06,0x06,0xC6,0xC6,0x7C,0x00, // 74 'J'
    0xC6,0xCC,0xD8,0xF0,0xD8,0xCC,0xC6,0x00, // 75 'K'
    0xC0,0xC0,0xC0,0xC0,0xC0,0xC0,0xFE,0x00, // 76 'L'
    0xC6,0xEE,0xFE,0xD6,0xC6,0xC6,0xC6,0x00, // 77 'M'
    0xC6,0xE6,0xF6,0xDE,0xCE,0xC6,0xC6,0x00, // 78 'N'
    0x7C,0xC6,0xC6,0xC6,0xC6,0xC6,0x7C,0x00, // 79 'O'
    0xFC,0xC6,0xC6,0xFC,0xC0,0xC0,0xC0,0x00, // 80 'P'
    0x7C,0xC6,0xC6,0xC6,0xD6,0xCC,0x76,0x00, // 81 'Q'
    0xFC,0xC6,0xC6,0xFC,0xD8,0xCC,0xC6,0x00, // 82 'R'
    0x7C,0xC6,0xC0,0x7C,0x06,0xC6,0x7C,0x00, // 83 'S'
    0xFF,0x18,0x18,0x18,0x18,0x18,0x18,0x00, // 84 'T'
    0xC6,0xC6,0xC6,0xC6,0xC6,0xC6,0x7C,0x00, // 85 'U'
    0xC6,0xC6,0xC6,0xC6,0xC6,0x6C,0x38,0x00, // 86 'V'
    0xC6,0xC6,0xC6,0xD6,0xFE,0xEE,0xC6,0x00, // 87 'W'
    0xC6,0x6C,0x38,0x10,0x38,0x6C,0xC6,0x00, // 88 'X'
    0x66,0x66,0x66,0x3C,0x18,0x18,0x18,0x00, // 89 'Y'
    0xFE,0x0C,0x18,0x30,0x60,0xC0,0xFE,0x00, // 90 'Z'
    0x3C,0x30,0x30,0x30,0x30,0x30,0x3C,0x00, // 91 '['
    0xC0,0x60,0x30,0x18,0x0C,0x06,0x02,0x00, // 92 '\\'
    0x3C,0x0C,0x0C,0x0C,0x0C,0x0C,0x3C,0x00, // 93 ']'
    0x10,0x38,0x6C,0xC6,0x00,0x00,0x00,0x00, // 94 '^'
    0x00,0x00,0x00,0x00,0x00,0x00,0x00,0xFF, // 95 '_'
];

/// Rasterize the embedded font into R8 atlas pixels (row-major, top-down).
pub fn build_font_atlas() -> Vec<u8> {
    let mut pixels = vec![0u8; (ATLAS_W * ATLAS_H) as usize];
    for glyph in 0..GLYPH_COUNT {
        let col = glyph % FONT_COLS;
        let row = glyph / FONT_COLS;
        for y in 0..GLYPH_H {
            let byte = FONT_DATA[(glyph * 8 + y) as usize];
            for x in 0..GLYPH_W {
                let px = col * GLYPH_W + x;
                let py = row * GLYPH_H + y;
                let bit = (byte >> (7 - x)) & 1;
                pixels[(py * ATLAS_W + px) as usize] = bit * 255;
            }
        }
    }
    pixels
}

/// Atlas cell for a character: lowercase folds to uppercase, anything not in
/// the covered range renders as space.
fn glyph_index(c: char) -> u32 {
    let code = c.to_ascii_uppercase() as u32;
    if (FIRST_GLYPH..FIRST_GLYPH + GLYPH_COUNT).contains(&code) {
        code - FIRST_GLYPH
    } else {
        0
    }
}

/// Generate a text mesh in the XY plane: one quad per character, laid out
/// left to right from the origin. `total_width` is divided evenly between
/// the characters; `height_over_width` sets the character aspect ratio.
pub fn generate_text_mesh(
    text: &str,
    height_over_width: f32,
    total_width: f32,
) -> (Vec<Vertex>, Vec<u32>) {
    let count = text.chars().count().max(1);
    let char_width = total_width / count as f32;
    let char_height = height_over_width * char_width;

    let mut vertices = Vec::with_capacity(count * 4);
    let mut indices = Vec::with_capacity(count * 6);

    for (i, c) in text.chars().enumerate() {
        let x0 = i as f32 * char_width;
        let x1 = x0 + char_width;

        let glyph = glyph_index(c);
        let col = glyph % FONT_COLS;
        let row = glyph / FONT_COLS;
        let u0 = (col * GLYPH_W) as f32 / ATLAS_W as f32;
        let u1 = ((col + 1) * GLYPH_W) as f32 / ATLAS_W as f32;
        // Atlas rows run top-down; quad Y runs bottom-up.
        let v_top = (row * GLYPH_H) as f32 / ATLAS_H as f32;
        let v_bottom = ((row + 1) * GLYPH_H) as f32 / ATLAS_H as f32;

        let base = vertices.len() as u32;
        let normal = [0.0, 0.0, 1.0];
        vertices.push(Vertex::new([x0, 0.0, 0.0], normal, [u0, v_bottom]));
        vertices.push(Vertex::new([x1, 0.0, 0.0], normal, [u1, v_bottom]));
        vertices.push(Vertex::new([x1, char_height, 0.0], normal, [u1, v_top]));
        vertices.push(Vertex::new([x0, char_height, 0.0], normal, [u0, v_top]));

        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_quad_per_character() {
        let (vertices, indices) = generate_text_mesh("READY", 39.0 / 29.0, 500.0);
        assert_eq!(vertices.len(), 5 * 4);
        assert_eq!(indices.len(), 5 * 6);
    }

    #[test]
    fn test_characters_tile_the_requested_width() {
        let (vertices, _) = generate_text_mesh("ABCD", 1.0, 100.0);
        // Second character starts where the first ends.
        assert!((vertices[4].position[0] - 25.0).abs() < 1e-5);
        // Last character's right edge lands on the total width.
        assert!((vertices[13].position[0] - 100.0).abs() < 1e-5);
    }

    #[test]
    fn test_glyph_uv_addresses_atlas_cell() {
        // 'A' is glyph 33: column 1, row 2.
        let (vertices, _) = generate_text_mesh("A", 1.0, 8.0);
        assert!((vertices[0].uv[0] - 1.0 / 16.0).abs() < 1e-6);
        assert!((vertices[0].uv[1] - 3.0 / 4.0).abs() < 1e-6);
        assert!((vertices[2].uv[1] - 2.0 / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_lowercase_folds_to_uppercase() {
        assert_eq!(glyph_index('a'), glyph_index('A'));
        assert_eq!(glyph_index('~'), glyph_index(' '));
    }

    #[test]
    fn test_atlas_dimensions() {
        let pixels = build_font_atlas();
        assert_eq!(pixels.len(), (ATLAS_W * ATLAS_H) as usize);
        // Space is blank.
        assert!(pixels[..8].iter().all(|&p| p == 0));
        // '!' (glyph 1) has ink in its top row segment.
        assert!(pixels[8..16].iter().any(|&p| p == 255));
    }
}
