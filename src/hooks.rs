use std::collections::VecDeque;

use crate::runtime::Registers;
use crate::symbol::ErrorCode;

/// Whether execution should go on after a breakpoint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Flow {
    #[default]
    Continue,
    Stop,
}

/// Side effects of a running program, injected into the processor.
pub trait Hooks {
    /// Emit a character for `OUT`.
    fn output(&mut self, ch: char);

    /// Provide a character for `IN`. `None` loads 0.
    fn input(&mut self) -> Option<char> {
        None
    }

    /// Called by `BRK` with a snapshot of the machine.
    fn on_break(&mut self, _registers: &Registers, _memory: &[u16]) -> Flow {
        Flow::Continue
    }

    /// Called by `ERR` before execution halts.
    fn on_error(&mut self, _kind: ErrorCode, _code: u8) {}
}

impl<H: Hooks + ?Sized> Hooks for &mut H {
    fn output(&mut self, ch: char) {
        (**self).output(ch)
    }
    fn input(&mut self) -> Option<char> {
        (**self).input()
    }
    fn on_break(&mut self, registers: &Registers, memory: &[u16]) -> Flow {
        (**self).on_break(registers, memory)
    }
    fn on_error(&mut self, kind: ErrorCode, code: u8) {
        (**self).on_error(kind, code)
    }
}

/// Hooks keeping everything in memory, for embedding and tests.
#[derive(Clone, Debug, Default)]
pub struct BufferedHooks {
    /// Characters written by `OUT`
    pub output: String,
    /// Characters consumed by `IN`, front first
    pub input: VecDeque<char>,
    /// Register snapshots taken at each `BRK`
    pub breaks: Vec<Registers>,
    /// Errors raised by `ERR`
    pub errors: Vec<(ErrorCode, u8)>,
    /// Answer given to every breakpoint
    pub on_break: Flow,
}

impl BufferedHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: &str) -> Self {
        BufferedHooks {
            input: input.chars().collect(),
            ..Self::default()
        }
    }

    pub fn stop_on_break(mut self) -> Self {
        self.on_break = Flow::Stop;
        self
    }
}

impl Hooks for BufferedHooks {
    fn output(&mut self, ch: char) {
        self.output.push(ch);
    }

    fn input(&mut self) -> Option<char> {
        self.input.pop_front()
    }

    fn on_break(&mut self, registers: &Registers, _memory: &[u16]) -> Flow {
        self.breaks.push(*registers);
        self.on_break
    }

    fn on_error(&mut self, kind: ErrorCode, code: u8) {
        self.errors.push((kind, code));
    }
}
