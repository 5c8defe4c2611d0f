use std::fmt;
use std::str::FromStr;

/// Number of addressable memory words.
pub const MEMORY_SIZE: usize = 0x100;
/// Largest value held by a register or operand.
pub const MAX_INT: i64 = 0xFF;
/// Smallest value held by a register or operand.
pub const MIN_INT: i64 = 0;

/// Instruction opcodes, stored in the high byte of a memory word.
///
/// Codes are fixed: saved images depend on them.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    /// Return control to the operating system
    END = 0x00,
    /// Load the number n to ACC
    LDM,
    /// Load the contents of the given address to ACC
    LDD,
    /// Load the contents of the address stored at the given address to ACC
    LDI,
    /// Load the contents of `address + IX` to ACC
    LDX,
    /// Load the number n to IX
    LDR,
    /// Move the contents of ACC to the given register
    MOV,
    /// Store the contents of ACC at the given address
    STO,
    ADDA,
    ADDN,
    SUBA,
    SUBN,
    /// Add 1 to the given register
    INC,
    /// Subtract 1 from the given register
    DEC,
    JMP,
    CMPA,
    CMPN,
    /// Compare ACC with the contents of the address stored at the given address
    CMI,
    /// Jump if the last compare was true
    JPE,
    /// Jump if the last compare was false
    JPN,
    /// Read a character code into ACC
    IN,
    /// Output the character whose code is in ACC
    OUT,
    LSL,
    LSR,
    ANDN,
    ANDA,
    XORN,
    XORA,
    ORN,
    ORA,
    /// Dump the machine state, possibly pausing execution
    BRK = 0xFE,
    /// Halt with the error code given as operand
    ERR = 0xFF,
}

impl Opcode {
    pub const ALL: [Opcode; 32] = [
        Opcode::END,
        Opcode::LDM,
        Opcode::LDD,
        Opcode::LDI,
        Opcode::LDX,
        Opcode::LDR,
        Opcode::MOV,
        Opcode::STO,
        Opcode::ADDA,
        Opcode::ADDN,
        Opcode::SUBA,
        Opcode::SUBN,
        Opcode::INC,
        Opcode::DEC,
        Opcode::JMP,
        Opcode::CMPA,
        Opcode::CMPN,
        Opcode::CMI,
        Opcode::JPE,
        Opcode::JPN,
        Opcode::IN,
        Opcode::OUT,
        Opcode::LSL,
        Opcode::LSR,
        Opcode::ANDN,
        Opcode::ANDA,
        Opcode::XORN,
        Opcode::XORA,
        Opcode::ORN,
        Opcode::ORA,
        Opcode::BRK,
        Opcode::ERR,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Surface mnemonic used to write this opcode in assembly.
    pub fn mnemonic(self) -> Mnemonic {
        use Opcode::*;
        match self {
            END => Mnemonic::End,
            LDM => Mnemonic::Ldm,
            LDD => Mnemonic::Ldd,
            LDI => Mnemonic::Ldi,
            LDX => Mnemonic::Ldx,
            LDR => Mnemonic::Ldr,
            MOV => Mnemonic::Mov,
            STO => Mnemonic::Sto,
            ADDA | ADDN => Mnemonic::Add,
            SUBA | SUBN => Mnemonic::Sub,
            INC => Mnemonic::Inc,
            DEC => Mnemonic::Dec,
            JMP => Mnemonic::Jmp,
            CMPA | CMPN => Mnemonic::Cmp,
            CMI => Mnemonic::Cmi,
            JPE => Mnemonic::Jpe,
            JPN => Mnemonic::Jpn,
            IN => Mnemonic::In,
            OUT => Mnemonic::Out,
            LSL => Mnemonic::Lsl,
            LSR => Mnemonic::Lsr,
            ANDN | ANDA => Mnemonic::And,
            XORN | XORA => Mnemonic::Xor,
            ORN | ORA => Mnemonic::Or,
            BRK => Mnemonic::Brk,
            ERR => Mnemonic::Err,
        }
    }

    /// Shape of the operand this opcode was assembled from.
    pub fn operand_kind(self) -> OperandShape {
        use Opcode::*;
        match self {
            ADDA | SUBA | CMPA | ANDA | XORA | ORA => OperandShape::Address,
            ADDN | SUBN | CMPN | ANDN | XORN | ORN => OperandShape::Number,
            other => other.mnemonic().shape(),
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00..=0x1D => Ok(Opcode::ALL[code as usize]),
            0xFE => Ok(Opcode::BRK),
            0xFF => Ok(Opcode::ERR),
            _ => Err(code),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Operand requirement of a mnemonic.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandShape {
    /// No operand
    None,
    /// Prefixed literal: `#` decimal, `B` binary, `&` hexadecimal
    Number,
    /// Bare decimal integer or label
    Address,
    /// Register name
    Register,
    /// Either an address or a number, choosing between the `A` and `N` opcode variants
    AddressOrNumber,
}

impl fmt::Display for OperandShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperandShape::None => "no operand",
            OperandShape::Number => "#n",
            OperandShape::Address => "<address>",
            OperandShape::Register => "<register>",
            OperandShape::AddressOrNumber => "<address> or #n",
        };
        f.write_str(s)
    }
}

/// Instruction names as written in assembly source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mnemonic {
    Ldm,
    Ldd,
    Ldi,
    Ldx,
    Ldr,
    Mov,
    Sto,
    Add,
    Sub,
    Inc,
    Dec,
    Jmp,
    Cmp,
    Cmi,
    Jpe,
    Jpn,
    In,
    Out,
    End,
    And,
    Or,
    Xor,
    Lsl,
    Lsr,
    Brk,
    Err,
}

impl Mnemonic {
    pub const ALL: [Mnemonic; 26] = [
        Mnemonic::Ldm,
        Mnemonic::Ldd,
        Mnemonic::Ldi,
        Mnemonic::Ldx,
        Mnemonic::Ldr,
        Mnemonic::Mov,
        Mnemonic::Sto,
        Mnemonic::Add,
        Mnemonic::Sub,
        Mnemonic::Inc,
        Mnemonic::Dec,
        Mnemonic::Jmp,
        Mnemonic::Cmp,
        Mnemonic::Cmi,
        Mnemonic::Jpe,
        Mnemonic::Jpn,
        Mnemonic::In,
        Mnemonic::Out,
        Mnemonic::End,
        Mnemonic::And,
        Mnemonic::Or,
        Mnemonic::Xor,
        Mnemonic::Lsl,
        Mnemonic::Lsr,
        Mnemonic::Brk,
        Mnemonic::Err,
    ];

    pub fn as_str(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Ldm => "LDM",
            Ldd => "LDD",
            Ldi => "LDI",
            Ldx => "LDX",
            Ldr => "LDR",
            Mov => "MOV",
            Sto => "STO",
            Add => "ADD",
            Sub => "SUB",
            Inc => "INC",
            Dec => "DEC",
            Jmp => "JMP",
            Cmp => "CMP",
            Cmi => "CMI",
            Jpe => "JPE",
            Jpn => "JPN",
            In => "IN",
            Out => "OUT",
            End => "END",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
            Lsl => "LSL",
            Lsr => "LSR",
            Brk => "BRK",
            Err => "ERR",
        }
    }

    pub fn shape(self) -> OperandShape {
        use Mnemonic::*;
        match self {
            Ldm | Ldr | Lsl | Lsr | Err => OperandShape::Number,
            Ldd | Ldi | Ldx | Sto | Jmp | Cmi | Jpe | Jpn => OperandShape::Address,
            Mov | Inc | Dec => OperandShape::Register,
            Add | Sub | Cmp | And | Or | Xor => OperandShape::AddressOrNumber,
            In | Out | End | Brk => OperandShape::None,
        }
    }

    /// Opcode for an operand of the given shape.
    ///
    /// Returns `None` if the mnemonic does not accept that shape.
    pub fn opcode(self, operand: OperandShape) -> Option<Opcode> {
        use Mnemonic as M;
        use OperandShape as S;
        let opcode = match (self, self.shape(), operand) {
            (M::Add, S::AddressOrNumber, S::Address) => Opcode::ADDA,
            (M::Add, S::AddressOrNumber, S::Number) => Opcode::ADDN,
            (M::Sub, S::AddressOrNumber, S::Address) => Opcode::SUBA,
            (M::Sub, S::AddressOrNumber, S::Number) => Opcode::SUBN,
            (M::Cmp, S::AddressOrNumber, S::Address) => Opcode::CMPA,
            (M::Cmp, S::AddressOrNumber, S::Number) => Opcode::CMPN,
            (M::And, S::AddressOrNumber, S::Address) => Opcode::ANDA,
            (M::And, S::AddressOrNumber, S::Number) => Opcode::ANDN,
            (M::Or, S::AddressOrNumber, S::Address) => Opcode::ORA,
            (M::Or, S::AddressOrNumber, S::Number) => Opcode::ORN,
            (M::Xor, S::AddressOrNumber, S::Address) => Opcode::XORA,
            (M::Xor, S::AddressOrNumber, S::Number) => Opcode::XORN,
            (_, S::AddressOrNumber, _) => return None,
            (mnemonic, required, given) if required == given => mnemonic.direct_opcode()?,
            _ => return None,
        };
        Some(opcode)
    }

    /// Opcode for mnemonics that have a single addressing mode.
    fn direct_opcode(self) -> Option<Opcode> {
        use Mnemonic::*;
        let opcode = match self {
            Ldm => Opcode::LDM,
            Ldd => Opcode::LDD,
            Ldi => Opcode::LDI,
            Ldx => Opcode::LDX,
            Ldr => Opcode::LDR,
            Mov => Opcode::MOV,
            Sto => Opcode::STO,
            Inc => Opcode::INC,
            Dec => Opcode::DEC,
            Jmp => Opcode::JMP,
            Cmi => Opcode::CMI,
            Jpe => Opcode::JPE,
            Jpn => Opcode::JPN,
            In => Opcode::IN,
            Out => Opcode::OUT,
            End => Opcode::END,
            Lsl => Opcode::LSL,
            Lsr => Opcode::LSR,
            Brk => Opcode::BRK,
            Err => Opcode::ERR,
            Add | Sub | Cmp | And | Or | Xor => return None,
        };
        Some(opcode)
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    // Mnemonics are case-sensitive
    fn from_str(s: &str) -> Result<Self, <Self as FromStr>::Err> {
        Mnemonic::ALL
            .into_iter()
            .find(|mnemonic| mnemonic.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pack opcode into the high byte and operand into the low byte of a word.
#[inline]
pub fn combine(opcode: u8, operand: u8) -> u16 {
    ((opcode as u16) << 8) | operand as u16
}

/// High byte of a word.
#[inline]
pub fn opcode_of(word: u16) -> u8 {
    ((word & 0xFF00) >> 8) as u8
}

/// Low byte of a word.
#[inline]
pub fn operand_of(word: u16) -> u8 {
    (word & 0x00FF) as u8
}

/// Wrap a value into `MIN_INT..=MAX_INT`, as registers overflow and underflow.
pub fn make_int_valid(value: i64) -> u8 {
    value.rem_euclid(MAX_INT + 1) as u8
}

/// Whether a value fits in a register without wrapping.
pub fn is_safe_int(value: i64) -> bool {
    (MIN_INT..=MAX_INT).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_codes() {
        assert_eq!(Opcode::END.code(), 0x00);
        assert_eq!(Opcode::ADDA.code(), 0x08);
        assert_eq!(Opcode::ADDN.code(), 0x09);
        assert_eq!(Opcode::JMP.code(), 0x0E);
        assert_eq!(Opcode::ANDN.code(), 0x18);
        assert_eq!(Opcode::ANDA.code(), 0x19);
        assert_eq!(Opcode::ORA.code(), 0x1D);
        assert_eq!(Opcode::BRK.code(), 0xFE);
        assert_eq!(Opcode::ERR.code(), 0xFF);
    }

    #[test]
    fn opcode_table_is_in_code_order() {
        for (i, opcode) in Opcode::ALL[..30].iter().enumerate() {
            assert_eq!(opcode.code() as usize, i);
            assert_eq!(Opcode::try_from(i as u8), Ok(*opcode));
        }
        assert_eq!(Opcode::try_from(0x1E), Err(0x1E));
        assert_eq!(Opcode::try_from(0xFD), Err(0xFD));
        assert_eq!(Opcode::try_from(0xFE), Ok(Opcode::BRK));
    }

    #[test]
    fn mnemonic_lookup() {
        assert_eq!("ADD".parse::<Mnemonic>(), Ok(Mnemonic::Add));
        assert_eq!("OUT".parse::<Mnemonic>(), Ok(Mnemonic::Out));
        assert!("add".parse::<Mnemonic>().is_err());
        assert!("ADDA".parse::<Mnemonic>().is_err());
        for mnemonic in Mnemonic::ALL {
            assert_eq!(mnemonic.as_str().parse::<Mnemonic>(), Ok(mnemonic));
        }
    }

    #[test]
    fn mode_selection() {
        use OperandShape as S;
        assert_eq!(Mnemonic::Add.opcode(S::Address), Some(Opcode::ADDA));
        assert_eq!(Mnemonic::Add.opcode(S::Number), Some(Opcode::ADDN));
        assert_eq!(Mnemonic::And.opcode(S::Number), Some(Opcode::ANDN));
        assert_eq!(Mnemonic::Cmp.opcode(S::Register), None);
        assert_eq!(Mnemonic::Jmp.opcode(S::Address), Some(Opcode::JMP));
        assert_eq!(Mnemonic::Jmp.opcode(S::Number), None);
        assert_eq!(Mnemonic::Out.opcode(S::None), Some(Opcode::OUT));
        assert_eq!(Mnemonic::Out.opcode(S::Address), None);
        assert_eq!(Mnemonic::Inc.opcode(S::Register), Some(Opcode::INC));
    }

    #[test]
    fn every_opcode_is_reachable_from_its_mnemonic() {
        for opcode in Opcode::ALL {
            assert_eq!(opcode.mnemonic().opcode(opcode.operand_kind()), Some(opcode));
        }
    }

    #[test]
    fn words() {
        let word = combine(Opcode::JMP.code(), 0x2A);
        assert_eq!(word, 0x0E2A);
        assert_eq!(opcode_of(word), 0x0E);
        assert_eq!(operand_of(word), 0x2A);
        assert_eq!(combine(0xFF, 0xFF), 0xFFFF);
    }

    #[test]
    fn wraparound() {
        assert_eq!(make_int_valid(0), 0);
        assert_eq!(make_int_valid(255), 255);
        assert_eq!(make_int_valid(256), 0);
        assert_eq!(make_int_valid(300), 44);
        assert_eq!(make_int_valid(-1), 255);
        assert_eq!(make_int_valid(-257), 255);
        assert_eq!(make_int_valid(1 << 20), 0);
        assert!(is_safe_int(255));
        assert!(!is_safe_int(256));
        assert!(!is_safe_int(-1));
    }
}
