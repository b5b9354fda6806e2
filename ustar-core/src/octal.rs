//! Octal ASCII fields as found in USTAR headers

use crate::Error;

fn is_terminator(byte: u8) -> bool {
    byte == 0 || byte == b' '
}

/// Decode a NUL- or space-terminated octal ASCII field.
///
/// Trailing terminators are skipped to find the last significant digit, and
/// leading spaces or NULs are treated as padding. Every byte in between must
/// be an octal digit. A field with no digits decodes to 0.
pub fn decode(field: &'static str, data: &[u8]) -> Result<u64, Error> {
    let end = match data.iter().rposition(|&b| !is_terminator(b)) {
        Some(last) => last + 1,
        None => return Ok(0),
    };
    let start = data[..end]
        .iter()
        .position(|&b| !is_terminator(b))
        .unwrap_or(end);

    let digits = &data[start..end];
    if let Some(&byte) = digits.iter().find(|b| !(b'0'..=b'7').contains(*b)) {
        return Err(Error::InvalidOctal { field, byte });
    }

    let mut value: u64 = 0;
    for (position, &byte) in digits.iter().rev().enumerate() {
        let digit = u64::from(byte - b'0');
        if digit == 0 {
            continue;
        }
        let weight = u32::try_from(position)
            .ok()
            .and_then(|p| 8u64.checked_pow(p))
            .ok_or(Error::Overflow)?;
        value = digit
            .checked_mul(weight)
            .and_then(|d| value.checked_add(d))
            .ok_or(Error::Overflow)?;
    }
    Ok(value)
}

/// Encode `value` as zero-padded octal digits followed by a NUL, the way
/// USTAR writers fill numeric fields.
pub fn encode(value: u64, out: &mut [u8]) -> Result<(), Error> {
    let (last, digits) = out.split_last_mut().ok_or(Error::Overflow)?;
    *last = 0;

    let mut rest = value;
    for slot in digits.iter_mut().rev() {
        *slot = b'0' + (rest & 7) as u8;
        rest >>= 3;
    }
    if rest != 0 {
        return Err(Error::Overflow);
    }
    Ok(())
}
