use std::fmt::Write;

const BYTES_PER_ROW: usize = 16;

/// Render bytes as offset, hex and ASCII columns, 16 bytes per row.
///
/// ```text
/// 0x0000: 00 19 d1 f7 be e5 00 04  96 1d 34 20 08 00 45 00  ........ ..4 ..E.
/// ```
pub fn hexdump(data: &[u8]) -> Vec<String> {
    data.chunks(BYTES_PER_ROW)
        .enumerate()
        .map(|(row, chunk)| render_row(row * BYTES_PER_ROW, chunk))
        .collect()
}

fn render_row(offset: usize, chunk: &[u8]) -> String {
    let mut line = format!("0x{:04x}:", offset);

    for i in 0..BYTES_PER_ROW {
        if i == BYTES_PER_ROW / 2 {
            line.push(' ');
        }
        match chunk.get(i) {
            Some(byte) => {
                let _ = write!(line, " {:02x}", byte);
            }
            None => line.push_str("   "),
        }
    }

    line.push_str("  ");
    for (i, &byte) in chunk.iter().enumerate() {
        if i == BYTES_PER_ROW / 2 {
            line.push(' ');
        }
        line.push(if byte.is_ascii_graphic() || byte == b' ' {
            byte as char
        } else {
            '.'
        });
    }

    line
}
