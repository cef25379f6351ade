use derive_more::Display;
use rust_decimal::Decimal as WrappedDecimal;
use serde::Serialize;
use std::{fmt::Write as _, str::FromStr};
use thiserror::Error as ThisError;

///
/// CONSTANTS
///

/// Largest fractional scale the wrapped decimal can hold.
const MAX_SCALE: u32 = 28;

/// Largest number of significant digits the wrapped mantissa can hold.
const MAX_DIGITS: usize = 29;

/// Exponents beyond this magnitude are clamped; the result is always out of range.
const EXPONENT_CLAMP: i64 = 1_000_000;

/// Triple words are base 10^7 limbs.
const TRIPLE_WORD_BASE: u32 = 10_000_000;

/// Triple exponents beyond this magnitude can never produce an in-range value.
const MAX_TRIPLE_EXPONENT: i64 = 1_000;

///
/// DecimalError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DecimalError {
    #[error("empty numeric literal")]
    Empty,

    #[error("'{0}' is not a valid numeric literal")]
    InvalidLiteral(String),

    #[error("radix literal '{0}' is not accepted")]
    RadixDisabled(String),

    #[error("decimal must be finite")]
    NonFinite,

    #[error("decimal is outside the supported range or precision")]
    OutOfRange,

    #[error("invalid decimal triple: {0}")]
    InvalidTriple(&'static str),
}

///
/// Decimal
///
/// Canonical arbitrary-precision value every accepted decimal
/// representation normalizes to. Equality is numeric, so `12.5` and
/// `12.50` compare equal while keeping their own scale.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Decimal(WrappedDecimal);

impl Decimal {
    pub const ZERO: Self = Self(WrappedDecimal::ZERO);

    #[must_use]
    /// Construct a decimal from mantissa and scale.
    pub fn new(num: i64, scale: u32) -> Self {
        Self(WrappedDecimal::new(num, scale))
    }

    /// Parse a numeric literal.
    ///
    /// Grammar, tried as one alternation:
    /// - `-?Infinity` and `NaN` (grammatical but rejected as non-finite)
    /// - `-?0[xX]hex(.hex)?([pP][+-]?dec)?`, and the `0o` / `0b` analogues
    /// - `-?(\d+|\d*\.\d+)([eE][+-]?\d+)?`
    ///
    /// Anything else, including grouping separators, whitespace, or a
    /// leading `+`, is rejected.
    pub fn parse_literal(text: &str, radix_literals: bool) -> Result<Self, DecimalError> {
        if text.is_empty() {
            return Err(DecimalError::Empty);
        }

        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        if body == "Infinity" || (!negative && body == "NaN") {
            return Err(DecimalError::NonFinite);
        }

        if let Some((bits, digits)) = radix_prefix(body) {
            if !radix_literals {
                return Err(DecimalError::RadixDisabled(text.to_string()));
            }

            return parse_radix(negative, bits, digits, text);
        }

        parse_decimal(negative, body, text)
    }

    /// Normalize a structured triple through its fixed-point rendering.
    pub fn from_triple(triple: &DecimalTriple) -> Result<Self, DecimalError> {
        Self::parse_literal(&triple.to_fixed(), false)
    }

    /// Returns the number of fractional decimal places.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Returns the mantissa component.
    #[must_use]
    pub const fn mantissa(&self) -> i128 {
        self.0.mantissa()
    }

    /// Returns `true` if the value is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if the value is negative.
    #[must_use]
    pub const fn is_sign_negative(&self) -> bool {
        self.0.is_sign_negative()
    }

    #[must_use]
    /// Normalize trailing zeros.
    pub fn normalize(&self) -> Self {
        Self(self.0.normalize())
    }

    fn from_parts(mantissa: i128, scale: u32) -> Result<Self, DecimalError> {
        WrappedDecimal::try_from_i128_with_scale(mantissa, scale)
            .map(Self)
            .map_err(|_| DecimalError::OutOfRange)
    }
}

impl From<WrappedDecimal> for Decimal {
    fn from(d: WrappedDecimal) -> Self {
        Self(d)
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Self(WrappedDecimal::from(n))
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_literal(s, true)
    }
}

// Split a `0x` / `0o` / `0b` prefix, returning bits per digit.
fn radix_prefix(body: &str) -> Option<(u32, &str)> {
    let mut chars = body.chars();
    if chars.next() != Some('0') {
        return None;
    }

    let bits = match chars.next()? {
        'x' | 'X' => 4,
        'o' | 'O' => 3,
        'b' | 'B' => 1,
        _ => return None,
    };

    Some((bits, &body[2..]))
}

// Parse `[+-]?\d+`, clamping magnitudes that can never be in range.
fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'+' => (false, &text[1..]),
        b'-' => (true, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let magnitude = digits
        .parse::<i64>()
        .map_or(EXPONENT_CLAMP, |n| n.min(EXPONENT_CLAMP));

    Some(if negative { -magnitude } else { magnitude })
}

fn split_mantissa<'a>(
    mantissa: &'a str,
    original: &str,
) -> Result<(&'a str, &'a str), DecimalError> {
    match mantissa.split_once('.') {
        Some((_, "")) => Err(DecimalError::InvalidLiteral(original.to_string())),
        Some(parts) => Ok(parts),
        None if mantissa.is_empty() => Err(DecimalError::InvalidLiteral(original.to_string())),
        None => Ok((mantissa, "")),
    }
}

fn parse_decimal(negative: bool, body: &str, original: &str) -> Result<Decimal, DecimalError> {
    let invalid = || DecimalError::InvalidLiteral(original.to_string());

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], parse_exponent(&body[at + 1..]).ok_or_else(invalid)?),
        None => (body, 0),
    };
    let (int_part, frac_part) = split_mantissa(mantissa, original)?;
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let joined = format!("{int_part}{frac_part}");
    let mut digits = joined.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let frac_len = i64::try_from(frac_part.len()).map_err(|_| DecimalError::OutOfRange)?;
    let mut scale = frac_len - exponent;

    // Shed trailing zeros only when the literal would not fit as written.
    while (scale > i64::from(MAX_SCALE) || digits.len() > MAX_DIGITS) && digits.ends_with('0') {
        digits = &digits[..digits.len() - 1];
        scale -= 1;
    }
    if scale > i64::from(MAX_SCALE) || digits.len() > MAX_DIGITS {
        return Err(DecimalError::OutOfRange);
    }

    let mut mantissa: i128 = digits.parse().map_err(|_| DecimalError::OutOfRange)?;
    if scale < 0 {
        let shift = u32::try_from(-scale).map_err(|_| DecimalError::OutOfRange)?;
        let factor = 10i128
            .checked_pow(shift)
            .ok_or(DecimalError::OutOfRange)?;
        mantissa = mantissa
            .checked_mul(factor)
            .ok_or(DecimalError::OutOfRange)?;
        scale = 0;
    }
    if negative {
        mantissa = -mantissa;
    }

    let scale = u32::try_from(scale).map_err(|_| DecimalError::OutOfRange)?;
    Decimal::from_parts(mantissa, scale)
}

// value = M * 2^(exponent - bits * frac_len), computed exactly:
// a negative power of two becomes M * 5^k / 10^k.
fn parse_radix(
    negative: bool,
    bits: u32,
    body: &str,
    original: &str,
) -> Result<Decimal, DecimalError> {
    let invalid = || DecimalError::InvalidLiteral(original.to_string());

    let (mantissa_text, exponent) = match body.find(['p', 'P']) {
        Some(at) => (&body[..at], parse_exponent(&body[at + 1..]).ok_or_else(invalid)?),
        None => (body, 0),
    };
    let (int_part, frac_part) = split_mantissa(mantissa_text, original)?;
    if int_part.is_empty() {
        return Err(invalid());
    }

    let radix = 1u32 << bits;
    let mut mantissa: i128 = 0;
    for ch in int_part.chars().chain(frac_part.chars()) {
        let digit = ch.to_digit(radix).ok_or_else(invalid)?;
        mantissa = mantissa
            .checked_mul(i128::from(radix))
            .and_then(|m| m.checked_add(i128::from(digit)))
            .ok_or(DecimalError::OutOfRange)?;
    }
    if mantissa == 0 {
        return Ok(Decimal::ZERO);
    }

    let frac_bits = i64::try_from(frac_part.len())
        .map_err(|_| DecimalError::OutOfRange)?
        .saturating_mul(i64::from(bits));
    let shift = exponent.saturating_sub(frac_bits);

    let scale = if shift >= 0 {
        let shift = u32::try_from(shift).map_err(|_| DecimalError::OutOfRange)?;
        let factor = 2i128.checked_pow(shift).ok_or(DecimalError::OutOfRange)?;
        mantissa = mantissa
            .checked_mul(factor)
            .ok_or(DecimalError::OutOfRange)?;
        0
    } else {
        let mut places = -shift;
        while places > 0 && mantissa % 2 == 0 {
            mantissa /= 2;
            places -= 1;
        }
        let places = u32::try_from(places).map_err(|_| DecimalError::OutOfRange)?;
        if places > MAX_SCALE {
            return Err(DecimalError::OutOfRange);
        }
        let factor = 5i128.checked_pow(places).ok_or(DecimalError::OutOfRange)?;
        mantissa = mantissa
            .checked_mul(factor)
            .ok_or(DecimalError::OutOfRange)?;
        places
    };

    if negative {
        mantissa = -mantissa;
    }

    Decimal::from_parts(mantissa, scale)
}

///
/// DecimalTriple
///
/// Structured `{d, e, s}` decimal representation:
/// - `digits`: base 10^7 words, the first unpadded, the rest 7-digit padded
/// - `exponent`: base-10 exponent of the leading significant digit
/// - `negative`: sign (`s = -1`)
///
/// A leading zero word is only legal for the single-word zero value;
/// anything else would make the digit alignment ambiguous.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecimalTriple {
    digits: Vec<u32>,
    exponent: i64,
    negative: bool,
}

impl DecimalTriple {
    pub fn new(digits: Vec<u32>, exponent: i64, sign: i64) -> Result<Self, DecimalError> {
        if digits.is_empty() {
            return Err(DecimalError::InvalidTriple("digit list is empty"));
        }
        if digits.iter().any(|word| *word >= TRIPLE_WORD_BASE) {
            return Err(DecimalError::InvalidTriple("digit word exceeds 9999999"));
        }
        if digits.len() > 1 && digits[0] == 0 {
            return Err(DecimalError::InvalidTriple("leading digit word is zero"));
        }
        if !(-MAX_TRIPLE_EXPONENT..=MAX_TRIPLE_EXPONENT).contains(&exponent) {
            return Err(DecimalError::OutOfRange);
        }
        let negative = match sign {
            1 => false,
            -1 => true,
            _ => return Err(DecimalError::InvalidTriple("sign must be 1 or -1")),
        };

        Ok(Self {
            digits,
            exponent,
            negative,
        })
    }

    /// Decompose a decimal into triple form, aligning words on the decimal point.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Self {
        let normalized = value.normalize();
        let digits = normalized.mantissa().unsigned_abs().to_string();
        if normalized.is_zero() {
            return Self {
                digits: vec![0],
                exponent: 0,
                negative: false,
            };
        }

        let scale = i64::from(normalized.scale());
        let exponent = i64::try_from(digits.len()).unwrap_or(i64::MAX) - 1 - scale;
        let first_len = usize::try_from(exponent.rem_euclid(7)).unwrap_or(0) + 1;

        let mut padded = digits;
        if padded.len() < first_len {
            padded.push_str(&"0".repeat(first_len - padded.len()));
        }
        let tail_len = padded.len() - first_len;
        if tail_len % 7 != 0 {
            padded.push_str(&"0".repeat(7 - tail_len % 7));
        }

        let mut words = vec![padded[..first_len].parse().unwrap_or(0)];
        let mut at = first_len;
        while at < padded.len() {
            words.push(padded[at..at + 7].parse().unwrap_or(0));
            at += 7;
        }

        Self {
            digits: words,
            exponent,
            negative: normalized.is_sign_negative(),
        }
    }

    #[must_use]
    pub fn digits(&self) -> &[u32] {
        &self.digits
    }

    #[must_use]
    pub const fn exponent(&self) -> i64 {
        self.exponent
    }

    #[must_use]
    pub const fn sign(&self) -> i64 {
        if self.negative { -1 } else { 1 }
    }

    /// Render as a plain fixed-point literal (no exponent).
    #[must_use]
    pub fn to_fixed(&self) -> String {
        let mut text = String::new();
        for (index, word) in self.digits.iter().enumerate() {
            if index == 0 {
                let _ = write!(text, "{word}");
            } else {
                let _ = write!(text, "{word:07}");
            }
        }

        let len = i64::try_from(text.len()).unwrap_or(i64::MAX);
        let point = self.exponent + 1;
        let zeros = |n: i64| "0".repeat(usize::try_from(n).unwrap_or(0));

        let body = if point <= 0 {
            format!("0.{}{text}", zeros(-point))
        } else if point >= len {
            format!("{text}{}", zeros(point - len))
        } else {
            let split = usize::try_from(point).unwrap_or(0);
            format!("{}.{}", &text[..split], &text[split..])
        };

        let is_zero = self.digits.iter().all(|word| *word == 0);
        if self.negative && !is_zero {
            format!("-{body}")
        } else {
            body
        }
    }
}

///
/// TESTS
///
