//! RFC 3492 Punycode, the bootstring parameterization used by IDNA for the
//! ASCII-compatible encoding of a single domain label.

use super::error::PunycodeError;

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;
const DELIMITER: char = '-';

fn adapt(mut delta: u32, num_points: u32, first_time: bool) -> u32 {
    delta /= if first_time { DAMP } else { 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

fn digit_to_basic(digit: u32) -> u8 {
    // 0..=25 -> 'a'..='z', 26..=35 -> '0'..='9'
    if digit < 26 { b'a' + digit as u8 } else { b'0' + (digit - 26) as u8 }
}

fn basic_to_digit(code_point: u8) -> Option<u32> {
    match code_point {
        b'0'..=b'9' => Some(u32::from(code_point - b'0') + 26),
        b'A'..=b'Z' => Some(u32::from(code_point - b'A')),
        b'a'..=b'z' => Some(u32::from(code_point - b'a')),
        _ => None,
    }
}

/// Encode one label (a sequence of Unicode code points, no dots) into its
/// `xn--`-prefixed ASCII form. Returns the label unprefixed if it is already
/// all-ASCII.
pub fn encode(input: &str) -> Result<String, PunycodeError> {
    if input.is_ascii() {
        return Ok(input.to_string());
    }

    let mut output: Vec<u8> = input.chars().filter(|c| c.is_ascii()).map(|c| c as u8).collect();
    let basic_length = output.len();
    if basic_length > 0 {
        output.push(DELIMITER as u8);
    }

    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;
    let mut handled = basic_length as u32;
    let input_length = input.chars().count() as u32;

    while handled < input_length {
        let m = input.chars().map(|c| c as u32).filter(|&cp| cp >= n).min().ok_or(PunycodeError::Overflow)?;

        delta = delta.checked_add((m - n).checked_mul(handled + 1).ok_or(PunycodeError::Overflow)?)
            .ok_or(PunycodeError::Overflow)?;
        n = m;

        for c in input.chars() {
            let cp = c as u32;
            if cp < n {
                delta = delta.checked_add(1).ok_or(PunycodeError::Overflow)?;
            }
            if cp == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = if k <= bias { TMIN } else if k >= bias + TMAX { TMAX } else { k - bias };
                    if q < t {
                        break;
                    }
                    output.push(digit_to_basic(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                output.push(digit_to_basic(q));
                bias = adapt(delta, handled + 1, handled == basic_length as u32);
                delta = 0;
                handled += 1;
            }
        }
        delta += 1;
        n += 1;
    }

    Ok(String::from_utf8(output).expect("punycode output is ASCII by construction"))
}

/// Decode one `xn--`-prefixed label (without the prefix) back to Unicode.
pub fn decode(input: &str) -> Result<String, PunycodeError> {
    if !input.is_ascii() {
        return Err(PunycodeError::BadDigit);
    }
    let bytes = input.as_bytes();

    let basic_end = bytes.iter().rposition(|&b| b == DELIMITER as u8);
    let mut output: Vec<u32> = Vec::new();
    let mut input_pos = 0;
    if let Some(end) = basic_end {
        output.extend(bytes[..end].iter().map(|&b| u32::from(b)));
        input_pos = end + 1;
    }

    let mut n = INITIAL_N;
    let mut i: u32 = 0;
    let mut bias = INITIAL_BIAS;

    while input_pos < bytes.len() {
        let old_i = i;
        let mut w = 1u32;
        let mut k = BASE;
        loop {
            let byte = *bytes.get(input_pos).ok_or(PunycodeError::EmptyLabel)?;
            input_pos += 1;
            let digit = basic_to_digit(byte).ok_or(PunycodeError::BadDigit)?;
            i = i.checked_add(digit.checked_mul(w).ok_or(PunycodeError::Overflow)?)
                .ok_or(PunycodeError::Overflow)?;
            let t = if k <= bias { TMIN } else if k >= bias + TMAX { TMAX } else { k - bias };
            if digit < t {
                break;
            }
            w = w.checked_mul(BASE - t).ok_or(PunycodeError::Overflow)?;
            k += BASE;
        }
        let num_points = output.len() as u32 + 1;
        bias = adapt(i - old_i, num_points, old_i == 0);
        n = n.checked_add(i / num_points).ok_or(PunycodeError::Overflow)?;
        i %= num_points;
        output.insert(i as usize, n);
        i += 1;
    }

    output.into_iter().map(char::from_u32).collect::<Option<String>>().ok_or(PunycodeError::BadDigit)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ascii_passthrough() {
        assert_eq!(encode("example").unwrap(), "example");
    }

    #[test]
    fn snowman_round_trip() {
        let encoded = encode("☃").unwrap();
        assert_eq!(encoded, "n3h");
        assert_eq!(decode(&encoded).unwrap(), "☃");
    }

    #[test]
    fn mixed_label_round_trip() {
        let label = "bücher";
        let encoded = encode(label).unwrap();
        assert_eq!(decode(&encoded).unwrap(), label);
    }
}
