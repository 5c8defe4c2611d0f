use std::io::{stdin, stdout, IsTerminal, Read, Write};

use console::Term;

use crate::dprintln;
use crate::hooks::{Flow, Hooks};
use crate::output::{Condition::Always, Output};
use crate::runtime::Registers;
use crate::symbol::ErrorCode;

/// Hooks connecting a program to the terminal.
///
/// `OUT` writes to stdout and `IN` reads a single unbuffered character.
/// Breakpoints and errors are reported on stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalHooks {
    /// Answer given to every breakpoint
    pub on_break: Flow,
    /// Print the memory grid at breakpoints
    pub dump_memory: bool,
}

impl TerminalHooks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Hooks for TerminalHooks {
    fn output(&mut self, ch: char) {
        Output::Normal.print_char(ch);
        let _ = stdout().flush();
    }

    fn input(&mut self) -> Option<char> {
        read_input()
    }

    fn on_break(&mut self, registers: &Registers, memory: &[u16]) -> Flow {
        Output::Diagnostic(Always).start_new_line();
        // PC has already moved past the `BRK`
        dprintln!(
            Always,
            "Breakpoint at address {}",
            registers.pc.saturating_sub(1)
        );
        Output::Diagnostic(Always).print_registers(registers);
        if self.dump_memory {
            Output::Diagnostic(Always).print_memory(memory, Some(registers.pc));
        }
        self.on_break
    }

    fn on_error(&mut self, kind: ErrorCode, code: u8) {
        Output::Diagnostic(Always).start_new_line();
        dprintln!(Always, "Program raised error {}: {}", code, kind);
    }
}

/// Read one character from stdin or unbuffered terminal.
fn read_input() -> Option<char> {
    if stdin().is_terminal() {
        Term::stdout().read_char().ok()
    } else {
        let mut buf = [0; 1];
        match stdin().read(&mut buf) {
            Ok(1) => Some(buf[0] as char),
            _ => None,
        }
    }
}
