use std::fmt;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::isa::MEMORY_SIZE;
use crate::span::Span;

// Translation diagnostics

/// Category of a translation diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DiagnosticKind {
    MalformedInstruction,
    UnrecognizedOpcode,
    UnrecognizedRegister,
    InvalidLabel,
    UndefinedLabel,
    DuplicateLabel,
    OutOfRange,
    TooManyTokens,
    ProgramTooLong,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            MalformedInstruction => "asm::malformed",
            UnrecognizedOpcode => "asm::unknown_opcode",
            UnrecognizedRegister => "asm::unknown_register",
            InvalidLabel => "asm::bad_label",
            UndefinedLabel => "asm::undefined_label",
            DuplicateLabel => "asm::duplicate_label",
            OutOfRange => "asm::out_of_range",
            TooManyTokens => "asm::too_many_tokens",
            ProgramTooLong => "asm::too_long",
        }
    }

    pub fn help(self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            MalformedInstruction => "check the operand this instruction expects",
            UnrecognizedOpcode => "lines start with an optional `label:` then an instruction or a number literal",
            UnrecognizedRegister => "the available registers are ACC and IX",
            InvalidLabel => "labels start with a letter, `_` or `$` and cannot reuse register or instruction names",
            UndefinedLabel => "declare the label with `name:` at the start of a line",
            DuplicateLabel => "prefix labels are only allowed once per file",
            OutOfRange => "numbers and addresses range from 0 to 255",
            TooManyTokens => "a line is at most `label: INSTRUCTION operand`",
            ProgramTooLong => "every non-empty line takes one memory cell",
        }
    }

    fn label(self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            MalformedInstruction => "malformed instruction",
            UnrecognizedOpcode => "unknown instruction",
            UnrecognizedRegister => "unknown register",
            InvalidLabel => "invalid label",
            UndefinedLabel => "undefined label",
            DuplicateLabel => "duplicate label",
            OutOfRange => "out-of-range literal",
            TooManyTokens => "too many tokens",
            ProgramTooLong => "program too long",
        }
    }
}

/// Problem found on one source line during translation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    /// Line inside the source, counting from 0
    pub line: usize,
    /// Memory address assigned to the line, if it got that far
    pub address: Option<u8>,
    pub kind: DiagnosticKind,
    /// Human-readable explanations, usually one
    pub messages: Vec<String>,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            line,
            address: None,
            kind,
            messages: vec![message.into()],
            span,
        }
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn too_long(lines: usize) -> Self {
        Diagnostic::new(
            0,
            DiagnosticKind::ProgramTooLong,
            format!(
                "the program given is too long ({lines} lines). The max amount of instructions is {MEMORY_SIZE}."
            ),
            Span::default(),
        )
    }

    /// Render with the source code for terminal display.
    pub fn report(&self, src: &str) -> Report {
        let labels = if self.span.is_empty() {
            vec![]
        } else {
            vec![LabeledSpan::at(self.span, self.kind.label())]
        };
        miette!(
            severity = Severity::Error,
            code = self.kind.code(),
            help = self.kind.help(),
            labels = labels,
            "{}",
            self.messages.join("\n"),
        )
        .with_source_code(src.to_owned())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = format!("line {}: ", self.line);
        let indent = " ".repeat(prefix.len());
        write!(f, "{prefix}")?;
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                write!(f, "\n{indent}")?;
            }
            write!(f, "{message}")?;
        }
        Ok(())
    }
}

/// Summary report for a failed translation.
pub fn asm_failed(count: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::failed",
        help = "fix the errors above and try again",
        "Could not assemble program due to {count} previous error{}",
        if count == 1 { "" } else { "s" },
    )
}

// Processor errors

/// Invalid processor construction or memory load.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConfigError {
    /// Memory image does not have the right number of words
    MemoryLength { expected: usize, found: usize },
    /// Initial register value outside of `0..=255`
    RegisterRange { register: &'static str, value: u32 },
    /// Status register is not a binary string of at most 4 digits
    StatusRegister(String),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemoryLength { expected, found } => write!(
                f,
                "the memory passed has to be of length {expected}, found {found}"
            ),
            Self::RegisterRange { register, value } => write!(
                f,
                "the register {register} cannot hold {value}, it has to be in the range 0 to 255"
            ),
            Self::StatusRegister(sr) => write!(
                f,
                "the status register `{sr}` has to be a 4 bit binary string"
            ),
        }
    }
}

/// Internal error encountered while executing. Execution cannot continue.
///
/// Assembled programs never trigger these; only hand-made images can.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fault {
    UnrecognizedOpcode { opcode: u8, addr: u16 },
    UnrecognizedRegister { operand: u8, addr: u16 },
}

impl std::error::Error for Fault {}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedOpcode { opcode, addr } => write!(
                f,
                "unrecognized opcode 0x{opcode:02x} at address {addr}"
            ),
            Self::UnrecognizedRegister { operand, addr } => write!(
                f,
                "the register {operand} at address {addr} is not a valid register"
            ),
        }
    }
}
