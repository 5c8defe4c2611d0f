use crate::{
    air::{Air, AirOperand, AirStmt},
    error::{Diagnostic, DiagnosticKind},
    isa::{Mnemonic, Opcode, OperandShape, MEMORY_SIZE},
    lexer::{self, Line, Token},
    parse::{self, LiteralError, Operand},
    symbol::LabelTable,
};

/// Most words allowed on a line: `label: INSTRUCTION operand`.
const MAX_TOKENS: usize = 3;

/// Receives translation results as they become final.
pub trait TranslateHooks {
    /// Called once with the complete label table, only if translation succeeded.
    fn on_label(&mut self, _labels: &LabelTable) {}
    /// Called for every diagnostic, in the order they were found.
    fn on_diagnostic(&mut self, _line: usize, _messages: &[String]) {}
}

impl TranslateHooks for () {}

/// Result of translating a whole program.
#[derive(Debug)]
pub struct Assembly {
    /// Full memory image, or empty if any diagnostic was emitted
    image: Vec<u16>,
    labels: LabelTable,
    diagnostics: Vec<Diagnostic>,
    air: Air,
}

impl Assembly {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn image(&self) -> &[u16] {
        &self.image
    }

    pub fn into_image(self) -> Vec<u16> {
        self.image
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn air(&self) -> &Air {
        &self.air
    }
}

/// Translate assembly source into a memory image.
///
/// The image is empty if translation failed; `hooks` receives the reasons.
pub fn translate(src: &str, hooks: &mut impl TranslateHooks) -> Vec<u16> {
    let assembly = AsmParser::new(src).parse();
    for diag in assembly.diagnostics() {
        hooks.on_diagnostic(diag.line, &diag.messages);
    }
    if assembly.is_ok() {
        hooks.on_label(assembly.labels());
    }
    assembly.into_image()
}

/// Two-pass translator from source text to memory words.
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    labels: LabelTable,
    diagnostics: Vec<Diagnostic>,
    /// Assembly intermediate representation
    air: Air,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Self {
        AsmParser {
            src,
            labels: LabelTable::new(),
            diagnostics: Vec::new(),
            air: Air::new(),
        }
    }

    /// Run both passes. Diagnostics are collected for every line rather than stopping early.
    pub fn parse(mut self) -> Assembly {
        let lines = lexer::preprocess(self.src);
        if lines.len() > MEMORY_SIZE {
            self.diagnostics.push(Diagnostic::too_long(lines.len()));
            return Assembly {
                image: Vec::new(),
                labels: self.labels,
                diagnostics: self.diagnostics,
                air: self.air,
            };
        }

        // First pass: statements and label declarations
        for (address, line) in lines.iter().enumerate() {
            let stmt = self.parse_line(address as u8, line);
            self.air.add_stmt(stmt);
        }

        // Second pass: resolve label operands
        let mut image = vec![0; MEMORY_SIZE];
        for (address, stmt) in self.air.iter().enumerate() {
            let (word, missing) = stmt.emit(&self.labels);
            if let Some((name, span)) = missing {
                self.diagnostics.push(
                    Diagnostic::new(
                        stmt.line,
                        DiagnosticKind::UndefinedLabel,
                        format!("the label `{name}` has not been defined"),
                        span,
                    )
                    .with_address(address as u8),
                );
            }
            image[address] = word;
        }

        if !self.diagnostics.is_empty() {
            image.clear();
        }
        Assembly {
            image,
            labels: self.labels,
            diagnostics: self.diagnostics,
            air: self.air,
        }
    }

    fn error(&mut self, line: &Line, address: u8, err: Diagnostic) {
        debug_assert_eq!(err.line, line.number);
        self.diagnostics.push(err.with_address(address));
    }

    fn parse_line(&mut self, address: u8, line: &Line<'a>) -> AirStmt {
        let tokens = line.tokens();
        if tokens.len() > MAX_TOKENS {
            let diag = Diagnostic::new(
                line.number,
                DiagnosticKind::TooManyTokens,
                format!(
                    "cannot have more than {MAX_TOKENS} words on a line, found {}",
                    tokens.len()
                ),
                line.span(),
            );
            self.error(line, address, diag);
            return AirStmt::malformed(line.number);
        }

        // Add prefix label to symbol table if exists
        let label_decl = parse::label_decl(tokens[0].text);
        let rest = match label_decl {
            Ok(name) => {
                if let Err(prev) = self.labels.insert(name, address) {
                    let diag = Diagnostic::new(
                        line.number,
                        DiagnosticKind::DuplicateLabel,
                        format!("the label `{name}` has already been used at address {prev}"),
                        tokens[0].span,
                    );
                    self.error(line, address, diag);
                }
                &tokens[1..]
            }
            Err(_) => &tokens[..],
        };

        let Some((head, operands)) = rest.split_first() else {
            // Line with only a label, implied `END 0`
            return AirStmt::new(Opcode::END, 0, line.number);
        };

        match head.text.parse::<Mnemonic>() {
            Ok(mnemonic) => self.parse_instr(mnemonic, head, operands, line, address),
            Err(()) => self.parse_value(head, operands, label_decl.err(), line, address),
        }
    }

    /// Process a mnemonic and its operand into a statement.
    fn parse_instr(
        &mut self,
        mnemonic: Mnemonic,
        head: &Token,
        operands: &[Token],
        line: &Line,
        address: u8,
    ) -> AirStmt {
        let shape = mnemonic.shape();
        let tok = match operands {
            [] => {
                if let Some(opcode) = mnemonic.opcode(OperandShape::None) {
                    return AirStmt::new(opcode, 0, line.number);
                }
                let diag = Diagnostic::new(
                    line.number,
                    DiagnosticKind::MalformedInstruction,
                    format!("the instruction `{mnemonic}` needs a `{shape}` operand and none was provided"),
                    head.span,
                );
                self.error(line, address, diag);
                return AirStmt::malformed(line.number);
            }
            [tok] => tok,
            [_, extra, ..] => {
                let diag = Diagnostic::new(
                    line.number,
                    DiagnosticKind::TooManyTokens,
                    format!("the instruction `{mnemonic}` takes at most one operand"),
                    extra.span,
                );
                self.error(line, address, diag);
                return AirStmt::malformed(line.number);
            }
        };

        let operand = Operand::classify(tok.text);
        if let Some((given, value)) = select_operand(shape, &operand, tok) {
            if let Some(opcode) = mnemonic.opcode(given) {
                return AirStmt {
                    opcode,
                    operand: value,
                    line: line.number,
                };
            }
        }

        let diag = operand_mismatch(mnemonic, &operand, tok, line);
        self.error(line, address, diag);
        AirStmt::malformed(line.number)
    }

    /// Process a line that does not start with a mnemonic, which can only be a number constant.
    fn parse_value(
        &mut self,
        head: &Token,
        operands: &[Token],
        label_err: Option<LiteralError>,
        line: &Line,
        address: u8,
    ) -> AirStmt {
        let not_instruction = format!("`{}` is not a valid instruction", head.text);

        let diag = if operands.is_empty() {
            match parse::number(head.text) {
                // Constant cell, encoded as `END n`
                Ok(value) => return AirStmt::new(Opcode::END, value, line.number),
                Err(err) if err.kind == DiagnosticKind::OutOfRange => {
                    Diagnostic::new(line.number, err.kind, err.message, head.span)
                }
                Err(err) => Diagnostic::new(
                    line.number,
                    DiagnosticKind::UnrecognizedOpcode,
                    format!("either instruction error: {not_instruction}"),
                    head.span,
                )
                .with_message(format!("or number error: {err}")),
            }
        } else {
            match label_err {
                // Head was meant as a label declaration, e.g. missing `:`
                Some(err) if operands.len() == 2 || operands[0].text.parse::<Mnemonic>().is_ok() => {
                    Diagnostic::new(line.number, err.kind, err.message, head.span)
                }
                Some(err) if parse::number(operands[0].text).is_ok() => Diagnostic::new(
                    line.number,
                    DiagnosticKind::UnrecognizedOpcode,
                    format!("either label error: {err}"),
                    head.span,
                )
                .with_message(format!("or instruction error: {not_instruction}")),
                _ => Diagnostic::new(
                    line.number,
                    DiagnosticKind::UnrecognizedOpcode,
                    not_instruction,
                    head.span,
                ),
            }
        };
        self.error(line, address, diag);
        AirStmt::malformed(line.number)
    }
}

/// Pick the reading of `operand` compatible with `shape`.
///
/// Number literals take priority over labels for instructions accepting both.
fn select_operand(
    shape: OperandShape,
    operand: &Operand,
    tok: &Token,
) -> Option<(OperandShape, AirOperand)> {
    let number = || {
        operand
            .number
            .as_ref()
            .ok()
            .map(|n| (OperandShape::Number, AirOperand::Value(*n)))
    };
    let address = || {
        let value = match (&operand.address, &operand.label) {
            (Ok(addr), _) => AirOperand::Value(*addr),
            (_, Ok(name)) => AirOperand::Label {
                name: name.to_string(),
                span: tok.span,
            },
            _ => return None,
        };
        Some((OperandShape::Address, value))
    };

    match shape {
        OperandShape::None => None,
        OperandShape::Number => number(),
        OperandShape::Address => address(),
        OperandShape::AddressOrNumber => number().or_else(address),
        OperandShape::Register => operand
            .register
            .as_ref()
            .ok()
            .map(|reg| (OperandShape::Register, AirOperand::Value(*reg as u8))),
    }
}

/// Explain why `operand` does not fit `mnemonic`.
fn operand_mismatch(mnemonic: Mnemonic, operand: &Operand, tok: &Token, line: &Line) -> Diagnostic {
    let shape = mnemonic.shape();
    let relevant: Vec<&LiteralError> = match shape {
        OperandShape::None => vec![],
        OperandShape::Number => vec![operand.number.as_ref().err()],
        OperandShape::Register => vec![operand.register.as_ref().err()],
        OperandShape::Address => vec![operand.address.as_ref().err(), operand.label.as_ref().err()],
        OperandShape::AddressOrNumber => vec![
            operand.number.as_ref().err(),
            operand.address.as_ref().err(),
            operand.label.as_ref().err(),
        ],
    }
    .into_iter()
    .flatten()
    .collect();

    if let Some(err) = relevant.iter().find(|err| err.kind == DiagnosticKind::OutOfRange) {
        return Diagnostic::new(line.number, err.kind, err.message.clone(), tok.span);
    }

    match (shape, operand.describe()) {
        (OperandShape::None, _) => Diagnostic::new(
            line.number,
            DiagnosticKind::MalformedInstruction,
            format!("the instruction `{mnemonic}` does not take an operand, found `{}`", tok.text),
            tok.span,
        ),
        (OperandShape::Register, _) => {
            let message = match &operand.register {
                Err(err) => err.message.clone(),
                Ok(reg) => format!("the register `{reg}` cannot be used here"),
            };
            Diagnostic::new(line.number, DiagnosticKind::UnrecognizedRegister, message, tok.span)
        }
        (_, "unrecognized") => {
            let diag = Diagnostic::new(
                line.number,
                DiagnosticKind::MalformedInstruction,
                format!(
                    "`{}` is not a valid operand, the instruction `{mnemonic}` needs a `{shape}` operand",
                    tok.text
                ),
                tok.span,
            );
            match likely_error(operand, &relevant) {
                Some(err) => diag.with_message(err.message.clone()),
                None => diag,
            }
        }
        (_, given) => Diagnostic::new(
            line.number,
            DiagnosticKind::MalformedInstruction,
            format!(
                "the instruction `{mnemonic}` needs a `{shape}` operand and a `{given}` operand was provided instead"
            ),
            tok.span,
        ),
    }
}

/// The error most likely to explain an unreadable operand, judged by its first character.
fn likely_error<'o>(operand: &'o Operand, relevant: &[&LiteralError]) -> Option<&'o LiteralError> {
    let first = operand.text.chars().next()?;
    let wanted = match first {
        '#' | '&' => &operand.number,
        c if c.is_ascii_digit() => {
            return operand.address.as_ref().err().filter(|err| relevant.contains(err))
        }
        _ => return operand.label.as_ref().err().filter(|err| relevant.contains(err)),
    };
    wanted.as_ref().err().filter(|err| relevant.contains(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::combine;

    fn assemble(src: &str) -> Assembly {
        AsmParser::new(src).parse()
    }

    fn kinds(assembly: &Assembly) -> Vec<DiagnosticKind> {
        assembly.diagnostics().iter().map(|diag| diag.kind).collect()
    }

    #[test]
    fn parse_basic_program() {
        let asm = assemble(
            r#"
            LDM #200
            ADD #100
            OUT
            END
            "#,
        );
        assert!(asm.is_ok());
        assert_eq!(asm.image().len(), MEMORY_SIZE);
        assert_eq!(
            &asm.image()[..4],
            &[
                combine(Opcode::LDM.code(), 200),
                combine(Opcode::ADDN.code(), 100),
                combine(Opcode::OUT.code(), 0),
                combine(Opcode::END.code(), 0),
            ]
        );
        assert!(asm.image()[4..].iter().all(|word| *word == 0));
    }

    #[test]
    fn parse_label_loop() {
        let asm = assemble("loop: JMP loop");
        assert!(asm.is_ok());
        assert_eq!(asm.labels()["loop"], 0);
        assert_eq!(asm.image()[0], combine(Opcode::JMP.code(), 0));
    }

    #[test]
    fn parse_forward_labels() {
        let asm = assemble(
            r#"
            start: LDD value
                   JMP done
            value: &2A
            done:  END
            "#,
        );
        assert!(asm.is_ok());
        assert_eq!(asm.labels().get("value"), Some(2));
        assert_eq!(asm.labels().get("done"), Some(3));
        assert_eq!(asm.image()[0], 0x0202);
        assert_eq!(asm.image()[1], 0x0E03);
        assert_eq!(asm.image()[2], 0x002A);
        assert_eq!(asm.image()[3], 0x0000);
    }

    #[test]
    fn parse_addressing_modes() {
        let asm = assemble(
            r#"
            ADD 7
            ADD #7
            SUB B111
            SUB &7
            CMP cell
            AND #1
            OR 3
            XOR &F0
            cell: #0
            "#,
        );
        assert!(asm.is_ok(), "{:?}", asm.diagnostics());
        let opcodes = asm.air().iter().map(|stmt| stmt.opcode).collect::<Vec<_>>();
        assert_eq!(
            opcodes,
            vec![
                Opcode::ADDA,
                Opcode::ADDN,
                Opcode::SUBN,
                Opcode::SUBN,
                Opcode::CMPA,
                Opcode::ANDN,
                Opcode::ORA,
                Opcode::XORN,
                Opcode::END,
            ]
        );
        assert_eq!(asm.image()[4], combine(Opcode::CMPA.code(), 8));
    }

    #[test]
    fn parse_registers() {
        let asm = assemble("INC ACC\nDEC IX\nMOV IX");
        assert!(asm.is_ok());
        assert_eq!(asm.image()[0], 0x0C00);
        assert_eq!(asm.image()[1], 0x0D01);
        assert_eq!(asm.image()[2], 0x0601);
    }

    #[test]
    fn parse_label_only_lines_and_constants() {
        let asm = assemble("counter:\ntotal:\n#5\nB11\n&ff");
        assert!(asm.is_ok());
        assert_eq!(asm.labels()["counter"], 0);
        assert_eq!(asm.labels()["total"], 1);
        assert_eq!(&asm.image()[..5], &[0, 0, 5, 3, 0xFF]);
    }

    #[test]
    fn binary_literal_wins_over_label() {
        let asm = assemble("ADD B101\nJMP B101\nB101: END");
        assert!(asm.is_ok(), "{:?}", asm.diagnostics());
        assert_eq!(asm.image()[0], combine(Opcode::ADDN.code(), 5));
        assert_eq!(asm.image()[1], combine(Opcode::JMP.code(), 2));
    }

    #[test]
    fn undefined_label() {
        let asm = assemble("JMP missing");
        assert!(!asm.is_ok());
        assert!(asm.image().is_empty());
        assert_eq!(kinds(&asm), vec![DiagnosticKind::UndefinedLabel]);
        assert!(asm.diagnostics()[0].messages[0].contains("missing"));
    }

    #[test]
    fn duplicate_label() {
        let asm = assemble("a: END\na: END");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::DuplicateLabel]);
        assert_eq!(asm.diagnostics()[0].line, 1);
        assert_eq!(asm.labels()["a"], 0);
    }

    #[test]
    fn program_too_long() {
        let src = "OUT\n".repeat(257);
        let asm = assemble(&src);
        assert_eq!(asm.diagnostics().len(), 1);
        let diag = &asm.diagnostics()[0];
        assert_eq!(diag.line, 0);
        assert_eq!(diag.kind, DiagnosticKind::ProgramTooLong);
        assert!(diag.messages[0].contains("256"));
        assert!(asm.image().is_empty());
    }

    #[test]
    fn program_of_exactly_full_memory() {
        let src = "OUT\n".repeat(256);
        let asm = assemble(&src);
        assert!(asm.is_ok());
        assert_eq!(asm.image()[255], combine(Opcode::OUT.code(), 0));
    }

    #[test]
    fn comments_do_not_take_addresses() {
        let asm = assemble("// intro\n\n   // more\nend: END // done\n");
        assert!(asm.is_ok());
        assert_eq!(asm.labels()["end"], 0);
    }

    #[test]
    fn diagnostics_use_source_lines() {
        let asm = assemble("// comment\n\nLDM 5\nOUT\nJMP 999");
        assert_eq!(asm.diagnostics().len(), 2);
        assert_eq!(asm.diagnostics()[0].line, 2);
        assert_eq!(asm.diagnostics()[0].address, Some(0));
        assert_eq!(asm.diagnostics()[1].line, 4);
        assert_eq!(asm.diagnostics()[1].address, Some(2));
    }

    #[test]
    fn collects_every_error() {
        let asm = assemble(
            r#"
            LDM 5
            INC PC
            FOO
            LDM #300
            a b c d
            JMP nowhere
            "#,
        );
        assert_eq!(
            kinds(&asm),
            vec![
                DiagnosticKind::MalformedInstruction,
                DiagnosticKind::UnrecognizedRegister,
                DiagnosticKind::UnrecognizedOpcode,
                DiagnosticKind::OutOfRange,
                DiagnosticKind::TooManyTokens,
                DiagnosticKind::UndefinedLabel,
            ]
        );
        assert!(asm.image().is_empty());
    }

    #[test]
    fn operand_shape_mismatches() {
        let asm = assemble("OUT 5");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::MalformedInstruction]);
        let asm = assemble("JMP");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::MalformedInstruction]);
        let asm = assemble("LDD #4");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::MalformedInstruction]);
        assert!(asm.diagnostics()[0].messages[0].contains("<address>"));
        let asm = assemble("STO 256");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::OutOfRange]);
        let asm = assemble("ADD ACC");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::MalformedInstruction]);
        let asm = assemble("JMP OUT 4");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::TooManyTokens]);
    }

    #[test]
    fn trailing_token_after_operand_is_rejected() {
        let asm = assemble("x: LDM #1 x");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::TooManyTokens]);
        assert!(asm.diagnostics()[0].messages[0].contains("`LDM`"));
        assert!(asm.image().is_empty());
    }

    #[test]
    fn unreadable_operand_explains_itself() {
        let asm = assemble("LDM #1z");
        let diag = &asm.diagnostics()[0];
        assert_eq!(diag.messages.len(), 2);
        assert!(diag.messages[1].contains("`z`"));
    }

    #[test]
    fn unrecognized_head() {
        let asm = assemble("HELLO");
        let diag = &asm.diagnostics()[0];
        assert_eq!(diag.kind, DiagnosticKind::UnrecognizedOpcode);
        assert_eq!(diag.messages.len(), 2);
        assert!(diag.messages[0].starts_with("either instruction error"));

        // Missing colon on a label
        let asm = assemble("loop JMP loop");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::InvalidLabel]);
        let asm = assemble("loop OUT");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::InvalidLabel]);

        // Either a bad label or a bad instruction
        let asm = assemble("value #4");
        assert_eq!(asm.diagnostics()[0].messages.len(), 2);

        let asm = assemble("x: FOO 3");
        assert_eq!(kinds(&asm), vec![DiagnosticKind::UnrecognizedOpcode]);
    }

    #[test]
    fn label_names_are_restricted() {
        let asm = assemble("ACC: END");
        assert!(!asm.is_ok());
        let asm = assemble("JMP: END");
        assert!(!asm.is_ok());
    }

    #[test]
    fn translate_hooks() {
        #[derive(Default)]
        struct Collect {
            labels: Option<LabelTable>,
            lines: Vec<(usize, Vec<String>)>,
        }
        impl TranslateHooks for Collect {
            fn on_label(&mut self, labels: &LabelTable) {
                self.labels = Some(labels.clone());
            }
            fn on_diagnostic(&mut self, line: usize, messages: &[String]) {
                self.lines.push((line, messages.to_vec()));
            }
        }

        let mut hooks = Collect::default();
        let image = translate("start: OUT\nJMP start", &mut hooks);
        assert_eq!(image.len(), MEMORY_SIZE);
        assert_eq!(hooks.labels.unwrap()["start"], 0);
        assert!(hooks.lines.is_empty());

        let mut hooks = Collect::default();
        let image = translate("start: OUT\nJMP finish", &mut hooks);
        assert!(image.is_empty());
        assert!(hooks.labels.is_none());
        assert_eq!(hooks.lines.len(), 1);
        assert_eq!(hooks.lines[0].0, 1);

        assert!(translate("", &mut ()).len() == MEMORY_SIZE);
    }
}
