//! Letter-case inversion used by every string field of the Thales formats.
//!
//! The instrument stores text with upper and lower case exchanged. Reading
//! and writing both apply the same inversion, so the transform is its own
//! inverse. Only ASCII letters are touched.

/// Invert the case of a single ASCII byte. Non-letters pass through.
#[inline]
pub fn swap_ascii_case(b: u8) -> u8 {
    if b.is_ascii_alphabetic() {
        b ^ 0x20
    } else {
        b
    }
}

/// Invert the case of every ASCII letter in place.
pub fn swap_case_in_place(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        *b = swap_ascii_case(*b);
    }
}

/// Return `text` with the case of every ASCII letter inverted.
pub fn swap_case(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else if c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}
