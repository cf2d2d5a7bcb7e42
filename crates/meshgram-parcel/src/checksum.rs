//! Reassembly checksum.
//!
//! Four letters computed over the full message body: the Unicode scalar
//! values of the body's characters are summed and the sum is written out as
//! base-26 digits, least significant first, using `A..=Z`.
//!
//! This is a lightweight integrity gate sized for the wire budget, not a
//! cryptographic digest.

use crate::CHECKSUM_LEN;

/// Compute the 4-letter checksum of a message body.
pub fn checksum(body: &str) -> String {
    let mut sum: u64 = body.chars().map(|c| c as u64).sum();
    let mut out = String::with_capacity(CHECKSUM_LEN);
    for _ in 0..CHECKSUM_LEN {
        out.push(char::from(b'A' + (sum % 26) as u8));
        sum /= 26;
    }
    out
}
