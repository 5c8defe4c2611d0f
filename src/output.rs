use std::cell::RefCell;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::runtime::Registers;

#[macro_export]
macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Diagnostic($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Diagnostic($cond).print_str(&s);
    }};
    // Trigger type error if missing condition
    ( $fmt:literal $($tt:tt)* ) => {{
        $crate::output::Output::Diagnostic($fmt);
    }};
}

/// Destination of printed text.
///
/// `Normal` is program output on stdout. `Diagnostic` is everything the
/// toolchain reports about a program (breakpoints, errors, dumps) on stderr.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    Normal,
    Diagnostic(Condition),
}

/// Whether diagnostic text survives minimal mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    Sometimes,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

const WORDS_PER_ROW: usize = 16;

impl Output {
    thread_local! {
        static IS_LINE_START: RefCell<bool> = const { RefCell::new(true) };
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_line_start(new_value: bool) -> bool {
        Self::IS_LINE_START.with(|value| value.replace(new_value))
    }
    /// Private. Use [`Output::start_new_line`].
    fn is_line_start() -> bool {
        Self::IS_LINE_START.with(|value| *value.borrow())
    }
    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    fn set_line_start_from_str(string: &str) {
        if let Some(ch) = Decolored::new(string).last() {
            Output::set_line_start(ch == '\n');
        }
    }

    pub fn print_char(&self, ch: char) {
        match self {
            Self::Normal => print!("{}", ch),
            Self::Diagnostic(_) => eprint!("{}", ch),
        }
        Output::set_line_start(ch == '\n');
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                print!("{}", string);
                Self::set_line_start_from_str(string);
            }
            Self::Diagnostic(condition) => match (Self::is_minimal(), *condition) {
                (false, _) => {
                    eprint!("{}", ColoredString::from(string).blue());
                    Self::set_line_start_from_str(string);
                }
                (true, Condition::Always) => {
                    eprint_colorless(string);
                    Self::set_line_start_from_str(string);
                }
                (true, Condition::Sometimes) => (),
            },
        }
    }

    pub fn start_new_line(&self) {
        if !Self::is_line_start() {
            self.print_char('\n');
        }
    }

    pub fn print_registers(&self, registers: &Registers) {
        if Self::is_minimal() {
            for line in minimal_registers(registers) {
                self.print_str(&line);
                self.print_char('\n');
            }
            return;
        }

        self.print_str("\x1b[2m┌──────────────────────────────────┐\x1b[0m\n");
        self.print_row("", "  \x1b[3mhex   uint   char\x1b[0m", 8);
        self.print_row("ACC", &integer_columns(registers.acc), 0);
        self.print_row("IX", &integer_columns(registers.ix), 0);
        self.print_row(
            "PC",
            &format!("  0x{:02x}            SR {}", registers.pc, registers.sr),
            0,
        );
        self.print_row(
            "MAR",
            &format!(
                "  0x{:04x}  MDR 0x{:02x}  CIR 0x{:02x}",
                registers.mar, registers.mdr, registers.cir
            ),
            0,
        );
        self.print_str("\x1b[2m└──────────────────────────────────┘\x1b[0m\n");
    }

    /// `hidden` is the number of escape characters inside `rest`.
    fn print_row(&self, name: &str, rest: &str, hidden: usize) {
        let width = 28 + hidden;
        self.print_str(&format!(
            "\x1b[2m│\x1b[0m \x1b[1m{name:<4}\x1b[0m{rest:<width$} \x1b[2m│\x1b[0m\n"
        ));
    }

    /// Print memory as rows of hexadecimal words, marking the word at `pc`.
    pub fn print_memory(&self, memory: &[u16], pc: Option<u16>) {
        for (row, words) in memory.chunks(WORDS_PER_ROW).enumerate() {
            let base = row * WORDS_PER_ROW;
            if Self::is_minimal() {
                let words: Vec<_> = words.iter().map(|word| format!("{word:04x}")).collect();
                self.print_str(&format!("{base:02x} {}\n", words.join(" ")));
                continue;
            }
            self.print_str(&format!("\x1b[2m0x{base:02x} │\x1b[0m"));
            for (i, word) in words.iter().enumerate() {
                if pc == Some((base + i) as u16) {
                    self.print_str(&format!(" \x1b[1;7m{word:04x}\x1b[0m"));
                } else if *word == 0 {
                    self.print_str(&format!(" \x1b[2m{word:04x}\x1b[0m"));
                } else {
                    self.print_str(&format!(" {word:04x}"));
                }
            }
            self.print_char('\n');
        }
    }
}

/// One `NAME value` line per register, as printed in minimal mode.
fn minimal_registers(registers: &Registers) -> Vec<String> {
    vec![
        format!("ACC {}", registers.acc),
        format!("IX {}", registers.ix),
        format!("PC {}", registers.pc),
        format!("MAR {}", registers.mar),
        format!("MDR {}", registers.mdr),
        format!("CIR {}", registers.cir),
        format!("SR {}", registers.sr),
    ]
}

fn integer_columns(value: u8) -> String {
    format!("  0x{:02x}  {:>4}   {}", value, value, char_display(value))
}

/// Three character wide rendering of a byte as a character.
fn char_display(value: u8) -> String {
    match value {
        // ASCII control characters which are arbitrarily considered significant
        0x00 => "NUL".into(),
        0x08 => "BS ".into(),
        0x09 => "HT ".into(),
        0x0a => "LF ".into(),
        0x0d => "CR ".into(),
        0x1b => "ESC".into(),
        0x7f => "DEL".into(),
        0x20 => "[_]".into(),
        0x21..=0x7e => format!("{:<3}", value as char),
        0x00..=0x7f => "───".into(),
        0x80.. => "┄┄┄".into(),
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let string: String = Decolored::new(string).collect();
    eprint!("{}", string);
}
