//! Recognizers for the operand forms of the assembly language.
//!
//! Each recognizer is independent; the assembler runs all of them on an operand and picks the
//! one compatible with the instruction.

use std::fmt;

use crate::error::DiagnosticKind;
use crate::isa::{Mnemonic, MAX_INT};
use crate::symbol::Register;

/// Reason an operand does not match a given form.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LiteralError {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl LiteralError {
    fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        LiteralError {
            kind,
            message: message.into(),
        }
    }

    fn malformed(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::MalformedInstruction, message)
    }
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Immediate number: `#` decimal, `B` binary or `&` hexadecimal.
pub fn number(s: &str) -> Result<u8, LiteralError> {
    let mut chars = s.chars();
    let radix = match chars.next() {
        Some('#') => 10,
        Some('B') => 2,
        Some('&') => 16,
        _ => {
            return Err(LiteralError::malformed(format!(
                "`{s}` has to be prefixed with `#` (decimal), `B` (binary) or `&` (hexadecimal) to be a number"
            )))
        }
    };
    let digits = chars.as_str();
    if digits.is_empty() {
        return Err(LiteralError::malformed(format!(
            "expected base {radix} digits after `{}`",
            &s[..1]
        )));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(LiteralError::malformed(format!(
            "the digit `{bad}` is not allowed in base {radix}"
        )));
    }
    in_range(u32::from_str_radix(digits, radix).ok(), || {
        format!("the number `{s}` is not in the allowed range of 0 to {MAX_INT}")
    })
}

/// Memory address: bare base 10 integer.
pub fn address(s: &str) -> Result<u8, LiteralError> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(LiteralError::malformed(format!(
            "the address `{s}` has to be a base 10 number"
        )));
    }
    in_range(s.parse::<u32>().ok(), || {
        format!("the address `{s}` is not in the allowed range of 0 to {MAX_INT}")
    })
}

fn in_range(value: Option<u32>, message: impl FnOnce() -> String) -> Result<u8, LiteralError> {
    match value {
        Some(value) if value as i64 <= MAX_INT => Ok(value as u8),
        _ => Err(LiteralError::new(DiagnosticKind::OutOfRange, message())),
    }
}

/// Register name, such as `ACC` or `IX`.
pub fn register(s: &str) -> Result<Register, LiteralError> {
    s.parse::<Register>().map_err(|_| {
        LiteralError::new(
            DiagnosticKind::UnrecognizedRegister,
            format!("the register `{s}` is not an allowed register"),
        )
    })
}

fn is_label_start(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_' | '$')
}

fn is_label_char(c: char) -> bool {
    is_label_start(c) || c.is_ascii_digit()
}

/// Label reference.
pub fn label(s: &str) -> Result<&str, LiteralError> {
    let invalid = |message: String| LiteralError::new(DiagnosticKind::InvalidLabel, message);

    if register(s).is_ok() {
        return Err(invalid(format!(
            "the label cannot be named `{s}` because it is the same as a register"
        )));
    }
    if s.parse::<Mnemonic>().is_ok() {
        return Err(invalid(format!(
            "the label cannot be named `{s}` because it is the same as an instruction"
        )));
    }
    let mut chars = s.chars();
    match chars.next() {
        None => return Err(invalid("labels cannot be empty".to_string())),
        Some(first) if !is_label_start(first) => {
            return Err(invalid(format!("a label cannot start with `{first}`")))
        }
        Some(_) => (),
    }
    if let Some(bad) = chars.find(|c| !is_label_char(*c)) {
        return Err(invalid(format!("a label cannot contain `{bad}`")));
    }
    Ok(s)
}

/// Label declaration: a label followed by `:`.
pub fn label_decl(s: &str) -> Result<&str, LiteralError> {
    match s.strip_suffix(':') {
        Some(name) => label(name),
        None => Err(LiteralError::new(
            DiagnosticKind::InvalidLabel,
            format!("`{s}` has to end with a `:` to declare a label"),
        )),
    }
}

/// Every reading of a single operand token.
#[derive(Debug)]
pub struct Operand<'a> {
    pub text: &'a str,
    pub number: Result<u8, LiteralError>,
    pub address: Result<u8, LiteralError>,
    pub register: Result<Register, LiteralError>,
    pub label: Result<&'a str, LiteralError>,
}

impl<'a> Operand<'a> {
    pub fn classify(text: &'a str) -> Self {
        Operand {
            text,
            number: number(text),
            address: address(text),
            register: register(text),
            label: label(text),
        }
    }

    /// The form this operand is read as when nothing else decides.
    pub fn describe(&self) -> &'static str {
        if self.number.is_ok() {
            "#n"
        } else if self.address.is_ok() || self.label.is_ok() {
            "<address>"
        } else if self.register.is_ok() {
            "<register>"
        } else {
            "unrecognized"
        }
    }
}
