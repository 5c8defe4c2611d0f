// Parsing
mod air;
pub use air::{Air, AirOperand, AirStmt};
mod lexer;
pub mod parse;
mod parser;
pub use parser::{translate, AsmParser, Assembly, TranslateHooks};

// Instruction set
pub mod isa;
mod span;
pub use span::Span;
mod symbol;
pub use symbol::{ErrorCode, LabelTable, Register};

// Running
mod hooks;
pub use hooks::{BufferedHooks, Flow, Hooks};
mod runtime;
pub use runtime::{Flag, Halt, Processor, ProcessorOptions, Registers, Status, StatusRegister};
pub mod output;
mod term;
pub use term::TerminalHooks;

// Tooling
mod disasm;
pub use disasm::{disassemble, disassemble_image};
mod history;
pub use history::History;

mod error;
pub use error::{asm_failed, ConfigError, Diagnostic, DiagnosticKind, Fault};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
