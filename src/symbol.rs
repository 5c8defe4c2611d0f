use std::fmt;
use std::str::FromStr;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Registers that can be named as an instruction operand.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    /// Accumulator
    Acc = 0x00,
    /// Index register
    Ix = 0x01,
}

impl Register {
    pub fn as_str(self) -> &'static str {
        match self {
            Register::Acc => "ACC",
            Register::Ix => "IX",
        }
    }
}

impl FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACC" => Ok(Register::Acc),
            "IX" => Ok(Register::Ix),
            _ => Err(()),
        }
    }
}

impl TryFrom<u8> for Register {
    type Error = u8;
    fn try_from(operand: u8) -> Result<Self, Self::Error> {
        match operand {
            0x00 => Ok(Register::Acc),
            0x01 => Ok(Register::Ix),
            other => Err(other),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error kinds reported by the `ERR` instruction, indexed by its operand.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorCode {
    UnknownError = 0,
    MalformedInstruction,
    FailedAssertion,
    UnrecognizedRegister,
    UnrecognizedOpcode,
    UnrecognizedInstruction,
    UnrecognizedOperand,
}

impl ErrorCode {
    /// Kind named by an `ERR` operand, falling back to `UnknownError`.
    pub fn from_code(code: u8) -> Self {
        use ErrorCode::*;
        match code {
            1 => MalformedInstruction,
            2 => FailedAssertion,
            3 => UnrecognizedRegister,
            4 => UnrecognizedOpcode,
            5 => UnrecognizedInstruction,
            6 => UnrecognizedOperand,
            _ => UnknownError,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Label name to address mapping, built by the assembler's first pass.
///
/// Iteration follows declaration order.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct LabelTable {
    map: FxMap<String, u8>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `addr`. Existing bindings are never overwritten.
    ///
    /// Returns the address already bound on collision.
    pub fn insert(&mut self, name: &str, addr: u8) -> Result<(), u8> {
        if let Some(existing) = self.map.get(name) {
            return Err(*existing);
        }
        self.map.insert(name.to_owned(), addr);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u8> {
        self.map.get(name).copied()
    }

    /// First label declared at `addr`, if any.
    pub fn name_at(&self, addr: u8) -> Option<&str> {
        self.map
            .iter()
            .find(|(_, bound)| **bound == addr)
            .map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.map.iter().map(|(name, addr)| (name.as_str(), *addr))
    }
}

impl std::ops::Index<&str> for LabelTable {
    type Output = u8;
    fn index(&self, name: &str) -> &Self::Output {
        &self.map[name]
    }
}
