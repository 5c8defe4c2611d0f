use crate::isa::{self, Opcode, OperandShape};
use crate::parse;
use crate::symbol::{LabelTable, Register};

/// Render a memory word as a line of assembly.
///
/// Address operands use the first label bound to them when `labels` is given.
/// Words that are not valid instructions come out as a comment holding the raw
/// hexadecimal word.
pub fn disassemble(word: u16, labels: Option<&LabelTable>) -> String {
    let operand = isa::operand_of(word);
    let Ok(opcode) = Opcode::try_from(isa::opcode_of(word)) else {
        return raw(word);
    };

    if opcode == Opcode::END && operand != 0 {
        return format!("#{operand}");
    }

    let mnemonic = opcode.mnemonic();
    match opcode.operand_kind() {
        OperandShape::None => mnemonic.to_string(),
        OperandShape::Number => format!("{mnemonic} #{operand}"),
        OperandShape::Address => {
            let name = labels
                .and_then(|labels| labels.name_at(operand))
                // A label spelled like a number reads back as an immediate
                .filter(|name| {
                    mnemonic.shape() == OperandShape::Address || parse::number(name).is_err()
                });
            match name {
                Some(name) => format!("{mnemonic} {name}"),
                None => format!("{mnemonic} {operand}"),
            }
        }
        OperandShape::Register => match Register::try_from(operand) {
            Ok(register) => format!("{mnemonic} {register}"),
            Err(_) => raw(word),
        },
        // Every opcode picks one side
        OperandShape::AddressOrNumber => unreachable!(),
    }
}

/// Disassemble a whole image, declaring labels in front of the words they name.
pub fn disassemble_image(image: &[u16], labels: Option<&LabelTable>) -> Vec<String> {
    image
        .iter()
        .enumerate()
        .map(|(addr, word)| {
            let text = disassemble(*word, labels);
            let name = u8::try_from(addr)
                .ok()
                .and_then(|addr| labels.and_then(|labels| labels.name_at(addr)));
            match name {
                Some(name) => format!("{name}: {text}"),
                None => text,
            }
        })
        .collect()
}

fn raw(word: u16) -> String {
    format!("// &{word:04X}")
}
