use crate::isa::{self, Opcode};
use crate::span::Span;
use crate::symbol::{ErrorCode, LabelTable};

/// Operand of a statement, possibly still referring to a label.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AirOperand {
    Value(u8),
    /// Resolved during the second pass
    Label { name: String, span: Span },
}

/// Assembly intermediate representation of a single line, produced by the first pass.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AirStmt {
    pub opcode: Opcode,
    pub operand: AirOperand,
    /// Source line the statement came from
    pub line: usize,
}

impl AirStmt {
    pub fn new(opcode: Opcode, operand: u8, line: usize) -> Self {
        AirStmt {
            opcode,
            operand: AirOperand::Value(operand),
            line,
        }
    }

    /// Placeholder for a line that failed to parse.
    pub fn malformed(line: usize) -> Self {
        AirStmt::new(Opcode::ERR, ErrorCode::MalformedInstruction.code(), line)
    }

    /// Encode into a memory word, resolving a label operand.
    ///
    /// Returns the operand label name if it is not in `labels`; the word then uses operand 0.
    pub fn emit(&self, labels: &LabelTable) -> (u16, Option<(&str, Span)>) {
        let (operand, missing) = match &self.operand {
            AirOperand::Value(value) => (*value, None),
            AirOperand::Label { name, span } => match labels.get(name) {
                Some(addr) => (addr, None),
                None => (0, Some((name.as_str(), *span))),
            },
        };
        (isa::combine(self.opcode.code(), operand), missing)
    }
}

/// Statements of a program in address order.
#[derive(Clone, Default, Debug)]
pub struct Air {
    stmts: Vec<AirStmt>,
}

impl Air {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stmt(&mut self, stmt: AirStmt) {
        self.stmts.push(stmt)
    }

    pub fn get(&self, idx: usize) -> &AirStmt {
        &self.stmts[idx]
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AirStmt> {
        self.stmts.iter()
    }
}

impl<'a> IntoIterator for &'a Air {
    type Item = &'a AirStmt;
    type IntoIter = std::slice::Iter<'a, AirStmt>;
    fn into_iter(self) -> Self::IntoIter {
        self.stmts.iter()
    }
}
