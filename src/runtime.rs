use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::str::FromStr;

use crate::error::{ConfigError, Fault};
use crate::hooks::{Flow, Hooks};
use crate::isa::{self, make_int_valid, Opcode, MAX_INT, MEMORY_SIZE, MIN_INT};
use crate::symbol::{ErrorCode, Register};

/// Bit positions inside the status register.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flag {
    /// Set by a compare that found equality
    Zero = 0,
    Carry = 1,
    Overflow = 2,
    Negative = 3,
}

/// 4 bit status register, rendered as `NVCZ`.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct StatusRegister(u8);

impl StatusRegister {
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn get(self, flag: Flag) -> bool {
        self.0 & (1 << flag as u8) != 0
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        if value {
            self.0 |= 1 << flag as u8;
        } else {
            self.0 &= !(1 << flag as u8);
        }
    }
}

impl FromStr for StatusRegister {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = (1..=4).contains(&s.len()) && s.chars().all(|c| matches!(c, '0' | '1'));
        match u8::from_str_radix(s, 2) {
            Ok(bits) if valid => Ok(StatusRegister(bits)),
            _ => Err(ConfigError::StatusRegister(s.to_string())),
        }
    }
}

impl fmt::Display for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

impl fmt::Debug for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusRegister({self})")
    }
}

/// Snapshot of every register.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Registers {
    pub acc: u8,
    pub ix: u8,
    pub pc: u16,
    /// Whole word fetched last
    pub mar: u16,
    /// Operand fetched last
    pub mdr: u8,
    /// Opcode fetched last
    pub cir: u8,
    pub sr: StatusRegister,
}

/// Initial state of a processor. Values are range-checked on construction.
#[derive(Clone, Debug, Default)]
pub struct ProcessorOptions {
    /// Complete memory image, exactly 256 words
    pub memory: Option<Vec<u16>>,
    pub pc: Option<u32>,
    pub acc: Option<u32>,
    pub ix: Option<u32>,
    /// Binary string such as `"0110"`
    pub sr: Option<String>,
}

/// Reason a run came to an end.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Halt {
    /// `END` instruction
    End,
    /// `BRK` instruction whose hook asked to stop
    Break,
    /// `ERR` instruction
    Error { kind: ErrorCode, code: u8 },
}

/// Outcome of a single step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Running,
    Halted(Halt),
}

/// What an instruction asks of the fetch-execute cycle.
enum Effect {
    Next,
    Jump(u8),
    End(Halt),
}

/// Represents complete machine state during runtime.
pub struct Processor<H> {
    memory: Box<[u16; MEMORY_SIZE]>,
    /// Accumulator, only written through `set_acc`
    acc: u8,
    /// Index register
    ix: u8,
    /// Program counter
    pc: u16,
    /// Memory address register
    mar: u16,
    /// Memory data register
    mdr: u8,
    /// Current instruction register
    cir: u8,
    sr: StatusRegister,
    hooks: H,
}

impl<H: Hooks> Processor<H> {
    /// Processor with zeroed memory and registers.
    pub fn new(hooks: H) -> Self {
        Processor {
            memory: Box::new([0; MEMORY_SIZE]),
            acc: 0,
            ix: 0,
            pc: 0,
            mar: 0,
            mdr: 0,
            cir: 0,
            sr: StatusRegister::default(),
            hooks,
        }
    }

    pub fn with_options(opts: ProcessorOptions, hooks: H) -> Result<Self, ConfigError> {
        let mut processor = Self::new(hooks);
        if let Some(memory) = opts.memory {
            if memory.len() != MEMORY_SIZE {
                return Err(ConfigError::MemoryLength {
                    expected: MEMORY_SIZE,
                    found: memory.len(),
                });
            }
            processor.memory.copy_from_slice(&memory);
        }
        if let Some(pc) = opts.pc {
            processor.pc = checked_register("PC", pc)? as u16;
        }
        if let Some(acc) = opts.acc {
            processor.acc = checked_register("ACC", acc)?;
        }
        if let Some(ix) = opts.ix {
            processor.ix = checked_register("IX", ix)?;
        }
        if let Some(sr) = opts.sr {
            processor.sr = sr.parse()?;
        }
        Ok(processor)
    }

    /// Copy `image` to the start of memory. Words past the image are left untouched.
    pub fn load_memory(&mut self, image: &[u16]) -> Result<(), ConfigError> {
        if image.len() > MEMORY_SIZE {
            return Err(ConfigError::MemoryLength {
                expected: MEMORY_SIZE,
                found: image.len(),
            });
        }
        self.memory[..image.len()].copy_from_slice(image);
        Ok(())
    }

    pub fn memory(&self) -> &[u16] {
        &self.memory[..]
    }

    /// Words within `range`, clamped to the end of memory.
    pub fn memory_slice(&self, range: impl RangeBounds<usize>) -> &[u16] {
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.saturating_add(1),
            Bound::Excluded(&end) => end,
            Bound::Unbounded => MEMORY_SIZE,
        };
        let end = end.min(MEMORY_SIZE);
        &self.memory[start.min(end)..end]
    }

    pub fn memory_at(&self, addr: u8) -> u16 {
        self.memory[addr as usize]
    }

    /// Zero memory, ACC, IX and the status register.
    pub fn clear_memory(&mut self) {
        self.acc = 0;
        self.ix = 0;
        self.sr = StatusRegister::default();
        self.memory.fill(0);
    }

    pub fn registers(&self) -> Registers {
        Registers {
            acc: self.acc,
            ix: self.ix,
            pc: self.pc,
            mar: self.mar,
            mdr: self.mdr,
            cir: self.cir,
            sr: self.sr,
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.sr.get(flag)
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u8) {
        self.pc = pc as u16;
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Run from `start` until the program halts.
    ///
    /// There is no step limit: callers that need one should drive
    /// [`Processor::run_next_instruction`] themselves.
    pub fn run_code(&mut self, start: u8) -> Result<Halt, Fault> {
        self.pc = start as u16;
        loop {
            if let Status::Halted(halt) = self.run_next_instruction()? {
                return Ok(halt);
            }
        }
    }

    /// Perform one fetch-execute cycle.
    pub fn run_next_instruction(&mut self) -> Result<Status, Fault> {
        let addr = self.pc;
        // Past the end of memory reads as `END`
        let word = self.memory.get(addr as usize).copied().unwrap_or(0);

        self.mar = word;
        self.mdr = isa::operand_of(word);
        self.cir = isa::opcode_of(word);
        // PC incremented before instruction is performed
        self.pc = self.pc.saturating_add(1);

        let opcode = Opcode::try_from(self.cir)
            .map_err(|opcode| Fault::UnrecognizedOpcode { opcode, addr })?;
        match self.execute(opcode, self.mdr, addr)? {
            Effect::Next => Ok(Status::Running),
            Effect::Jump(target) => {
                self.pc = target as u16;
                Ok(Status::Running)
            }
            Effect::End(halt) => Ok(Status::Halted(halt)),
        }
    }

    /// Write the accumulator, wrapping the value and updating flags.
    fn set_acc(&mut self, value: i64) {
        if value > MAX_INT {
            self.sr.set(Flag::Negative, false);
            self.sr.set(Flag::Overflow, true);
            self.sr.set(Flag::Carry, true);
        } else if value < MIN_INT {
            self.sr.set(Flag::Negative, true);
            self.sr.set(Flag::Overflow, true);
            self.sr.set(Flag::Carry, false);
        } else {
            self.sr.set(Flag::Zero, false);
        }
        self.acc = make_int_valid(value);
    }

    /// Operand half of the word at `addr`.
    fn data(&self, addr: u8) -> u8 {
        isa::operand_of(self.memory[addr as usize])
    }

    /// Replace the operand half of the word at `addr`, keeping its opcode.
    fn store(&mut self, addr: u8, value: u8) {
        let opcode = isa::opcode_of(self.memory[addr as usize]);
        self.memory[addr as usize] = isa::combine(opcode, value);
    }

    fn register(operand: u8, addr: u16) -> Result<Register, Fault> {
        Register::try_from(operand).map_err(|operand| Fault::UnrecognizedRegister { operand, addr })
    }

    fn execute(&mut self, opcode: Opcode, operand: u8, addr: u16) -> Result<Effect, Fault> {
        use Opcode::*;
        let acc = self.acc as i64;
        let effect = match opcode {
            END => Effect::End(Halt::End),
            LDM => {
                self.set_acc(operand.into());
                Effect::Next
            }
            LDD => {
                self.set_acc(self.data(operand).into());
                Effect::Next
            }
            LDI => {
                let ptr = self.data(operand);
                self.set_acc(self.data(ptr).into());
                Effect::Next
            }
            LDX => {
                let ptr = make_int_valid(self.ix as i64 + operand as i64);
                self.set_acc(self.data(ptr).into());
                Effect::Next
            }
            LDR => {
                self.ix = operand;
                Effect::Next
            }
            MOV => {
                match Self::register(operand, addr)? {
                    Register::Acc => self.set_acc(acc),
                    Register::Ix => self.ix = self.acc,
                }
                Effect::Next
            }
            STO => {
                self.store(operand, self.acc);
                Effect::Next
            }
            ADDA => self.accumulate(acc + self.data(operand) as i64),
            ADDN => self.accumulate(acc + operand as i64),
            SUBA => self.accumulate(acc - self.data(operand) as i64),
            SUBN => self.accumulate(acc - operand as i64),
            INC => {
                match Self::register(operand, addr)? {
                    Register::Acc => self.set_acc(acc + 1),
                    Register::Ix => self.ix = self.ix.wrapping_add(1),
                }
                Effect::Next
            }
            DEC => {
                match Self::register(operand, addr)? {
                    Register::Acc => self.set_acc(acc - 1),
                    Register::Ix => self.ix = self.ix.wrapping_sub(1),
                }
                Effect::Next
            }
            JMP => Effect::Jump(operand),
            CMPA => self.compare(self.data(operand)),
            CMPN => self.compare(operand),
            CMI => {
                let ptr = self.data(operand);
                self.compare(self.data(ptr))
            }
            JPE => self.jump_if(self.flag(Flag::Zero), operand),
            JPN => self.jump_if(!self.flag(Flag::Zero), operand),
            IN => {
                let code = self.hooks.input().map_or(0, |ch| ch as u32);
                self.set_acc(code.into());
                Effect::Next
            }
            OUT => {
                self.hooks.output(char::from(self.acc));
                Effect::Next
            }
            // Shift counts past 32 cannot change the wrapped result
            LSL => self.accumulate(acc << operand.min(32)),
            LSR => self.accumulate(acc >> operand.min(32)),
            ANDN => self.accumulate(acc & operand as i64),
            ANDA => self.accumulate(acc & self.data(operand) as i64),
            XORN => self.accumulate(acc ^ operand as i64),
            XORA => self.accumulate(acc ^ self.data(operand) as i64),
            ORN => self.accumulate(acc | operand as i64),
            ORA => self.accumulate(acc | self.data(operand) as i64),
            BRK => {
                let registers = self.registers();
                match self.hooks.on_break(&registers, &self.memory[..]) {
                    Flow::Continue => Effect::Next,
                    Flow::Stop => Effect::End(Halt::Break),
                }
            }
            ERR => {
                let kind = ErrorCode::from_code(operand);
                self.hooks.on_error(kind, operand);
                Effect::End(Halt::Error {
                    kind,
                    code: operand,
                })
            }
        };
        Ok(effect)
    }

    fn accumulate(&mut self, value: i64) -> Effect {
        self.set_acc(value);
        Effect::Next
    }

    fn compare(&mut self, value: u8) -> Effect {
        self.sr.set(Flag::Zero, value == self.acc);
        Effect::Next
    }

    fn jump_if(&self, cond: bool, target: u8) -> Effect {
        if cond {
            Effect::Jump(target)
        } else {
            Effect::Next
        }
    }
}

fn checked_register(register: &'static str, value: u32) -> Result<u8, ConfigError> {
    if isa::is_safe_int(value as i64) {
        Ok(value as u8)
    } else {
        Err(ConfigError::RegisterRange { register, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::BufferedHooks;
    use crate::isa::combine;
    use crate::parser::AsmParser;

    fn load(src: &str, hooks: BufferedHooks) -> Processor<BufferedHooks> {
        let asm = AsmParser::new(src).parse();
        assert!(asm.is_ok(), "{:?}", asm.diagnostics());
        let mut processor = Processor::new(hooks);
        processor.load_memory(asm.image()).unwrap();
        processor
    }

    fn run(src: &str) -> Processor<BufferedHooks> {
        let mut processor = load(src, BufferedHooks::new());
        assert_eq!(processor.run_code(0), Ok(Halt::End));
        processor
    }

    #[test]
    fn add_overflow_and_output() {
        let processor = run("LDM #200\nADD #100\nOUT\nEND");
        assert_eq!(processor.registers().acc, 44);
        assert_eq!(processor.hooks().output, "\u{2c}");
        assert!(!processor.flag(Flag::Negative));
        assert!(processor.flag(Flag::Overflow));
        assert!(processor.flag(Flag::Carry));
        assert_eq!(processor.registers().sr.to_string(), "0110");
    }

    #[test]
    fn sub_underflow() {
        let processor = run("LDM #5\nSUB #10\nEND");
        assert_eq!(processor.registers().acc, 251);
        assert_eq!(processor.registers().sr.to_string(), "1100");
    }

    #[test]
    fn in_range_write_only_clears_zero() {
        let mut processor = Processor::with_options(
            ProcessorOptions {
                sr: Some("1111".to_string()),
                ..Default::default()
            },
            BufferedHooks::new(),
        )
        .unwrap();
        let image = [combine(Opcode::LDM.code(), 1), 0];
        processor.load_memory(&image).unwrap();
        processor.run_code(0).unwrap();
        assert_eq!(processor.registers().sr.to_string(), "1110");
    }

    #[test]
    fn arithmetic_matches_modular_result() {
        let values = [0u8, 1, 55, 100, 128, 200, 255];
        for a in values {
            for b in values {
                for (mnemonic, result) in [("ADD", a as i64 + b as i64), ("SUB", a as i64 - b as i64)] {
                    let processor = run(&format!("LDM #{a}\n{mnemonic} #{b}\nEND"));
                    let regs = processor.registers();
                    assert_eq!(regs.acc as i64, result.rem_euclid(256), "{a} {mnemonic} {b}");
                    if result > 255 {
                        assert_eq!(regs.sr.bits() & 0b1110, 0b0110);
                    } else if result < 0 {
                        assert_eq!(regs.sr.bits() & 0b1110, 0b1100);
                    } else {
                        assert!(!processor.flag(Flag::Zero));
                    }
                }
            }
        }
    }

    #[test]
    fn add_and_sub_from_memory() {
        let processor = run(
            r#"
            LDM #10
            ADD ten
            SUB one
            END
            ten: #10
            one: #1
            "#,
        );
        assert_eq!(processor.registers().acc, 19);
    }

    #[test]
    fn inc_dec_wraparound() {
        let processor = run("LDM #255\nINC ACC\nEND");
        assert_eq!(processor.registers().acc, 0);
        let processor = run("LDM #0\nDEC ACC\nEND");
        assert_eq!(processor.registers().acc, 255);
        let processor = run("LDR #255\nINC IX\nEND");
        assert_eq!(processor.registers().ix, 0);
        assert_eq!(processor.registers().sr.bits(), 0);
        let processor = run("LDR #0\nDEC IX\nDEC IX\nEND");
        assert_eq!(processor.registers().ix, 254);
    }

    #[test]
    fn bitwise_immediates() {
        let (a, b) = (0b1010_1010u8, 0b0101_1010u8);
        let processor = run(&format!("LDM #{a}\nAND #{b}\nEND"));
        assert_eq!(processor.registers().acc, a & b);
        let processor = run(&format!("LDM #{a}\nOR B{b:b}\nEND"));
        assert_eq!(processor.registers().acc, a | b);
        let processor = run(&format!("LDM #{a}\nXOR &{b:x}\nEND"));
        assert_eq!(processor.registers().acc, a ^ b);
    }

    #[test]
    fn bitwise_addresses() {
        let processor = run("LDM #12\nAND val\nEND\nval: B1010");
        assert_eq!(processor.registers().acc, 8);
        let processor = run("LDM #12\nOR val\nEND\nval: B1010");
        assert_eq!(processor.registers().acc, 14);
        let processor = run("LDM #12\nXOR val\nEND\nval: B1010");
        assert_eq!(processor.registers().acc, 6);
    }

    #[test]
    fn shifts() {
        let processor = run("LDM #8\nLSL #1\nEND");
        assert_eq!(processor.registers().acc, 16);
        let processor = run("LDM #16\nLSR #3\nEND");
        assert_eq!(processor.registers().acc, 2);
        let processor = run("LDM #255\nLSL #1\nEND");
        assert_eq!(processor.registers().acc, 254);
        assert!(processor.flag(Flag::Overflow));
        let processor = run("LDM #1\nLSL #200\nEND");
        assert_eq!(processor.registers().acc, 0);
        let processor = run("LDM #255\nLSR #9\nEND");
        assert_eq!(processor.registers().acc, 0);
    }

    #[test]
    fn addressing_modes() {
        let src = r#"
            LDD a
            STO out1
            LDI ptr
            STO out2
            LDR #2
            LDX a
            STO out3
            END
            a:    #7
            ptr:  #8
            b:    #9
            out1:
            out2:
            out3:
            "#;
        let processor = run(src);
        let data = |addr: u8| isa::operand_of(processor.memory_at(addr));
        assert_eq!(data(11), 7);
        assert_eq!(data(12), 7);
        assert_eq!(data(13), 9);
    }

    #[test]
    fn indirect_load_follows_pointer() {
        let processor = run("LDI ptr\nEND\nptr: #3\nval: #42");
        assert_eq!(processor.registers().acc, 42);
    }

    #[test]
    fn indexed_address_wraps() {
        let processor = run("LDR #255\nLDX 2\nEND");
        // 255 + 2 wraps to address 1, which holds `LDX 2`
        assert_eq!(processor.registers().acc, 2);
    }

    #[test]
    fn store_keeps_opcode() {
        let processor = run("LDM #9\nSTO target\nEND\ntarget: JMP 0");
        assert_eq!(processor.memory_at(3), combine(Opcode::JMP.code(), 9));
    }

    #[test]
    fn mov_copies_acc() {
        let processor = run("LDM #77\nMOV IX\nEND");
        assert_eq!(processor.registers().ix, 77);
    }

    #[test]
    fn compare_and_jump() {
        let processor = run(
            r#"
            LDM #3
            CMP #3
            JPE equal
            OUT
            equal: CMP #4
            JPN done
            OUT
            done: END
            "#,
        );
        assert_eq!(processor.hooks().output, "");
        assert!(!processor.flag(Flag::Zero));
    }

    #[test]
    fn compare_indirect() {
        let processor = run("LDM #5\nCMI ptr\nEND\nptr: #4\nval: #5");
        assert!(processor.flag(Flag::Zero));
        let processor = run("LDM #5\nCMP val\nEND\nval: #6");
        assert!(!processor.flag(Flag::Zero));
    }

    #[test]
    fn hello_world() {
        let processor = run(
            r#"
            start: LDX string
                   CMP #0
                   JPE end
                   OUT
                   INC IX
                   JMP start
            end:   END
            string: &48
                    &69
                    &0A
                    #0
            "#,
        );
        assert_eq!(processor.hooks().output, "Hi\n");
    }

    #[test]
    fn input_characters() {
        let mut processor = load("IN\nOUT\nIN\nEND", BufferedHooks::with_input("A"));
        processor.run_code(0).unwrap();
        assert_eq!(processor.hooks().output, "A");
        // Second `IN` had no input left
        assert_eq!(processor.registers().acc, 0);
    }

    #[test]
    fn breakpoint_resumes() {
        let mut processor = load("LDM #1\nBRK\nLDM #2\nEND", BufferedHooks::new());
        assert_eq!(processor.run_code(0), Ok(Halt::End));
        assert_eq!(processor.hooks().breaks.len(), 1);
        assert_eq!(processor.hooks().breaks[0].acc, 1);
        assert_eq!(processor.registers().acc, 2);
    }

    #[test]
    fn breakpoint_can_stop() {
        let mut processor = load("LDM #1\nBRK\nLDM #2\nEND", BufferedHooks::new().stop_on_break());
        assert_eq!(processor.run_code(0), Ok(Halt::Break));
        assert_eq!(processor.registers().acc, 1);
    }

    #[test]
    fn error_instruction_halts() {
        let mut processor = load("ERR #2\nOUT", BufferedHooks::new());
        assert_eq!(
            processor.run_code(0),
            Ok(Halt::Error {
                kind: ErrorCode::FailedAssertion,
                code: 2
            })
        );
        assert_eq!(processor.hooks().errors, vec![(ErrorCode::FailedAssertion, 2)]);

        let mut processor = load("ERR #99", BufferedHooks::new());
        processor.run_code(0).unwrap();
        assert_eq!(processor.hooks().errors, vec![(ErrorCode::UnknownError, 99)]);
    }

    #[test]
    fn faults_on_bad_words() {
        let mut processor = Processor::new(BufferedHooks::new());
        processor.load_memory(&[0x2000]).unwrap();
        assert_eq!(
            processor.run_code(0),
            Err(Fault::UnrecognizedOpcode { opcode: 0x20, addr: 0 })
        );

        let mut processor = Processor::new(BufferedHooks::new());
        processor.load_memory(&[0x0101, 0x0605]).unwrap();
        assert_eq!(
            processor.run_code(0),
            Err(Fault::UnrecognizedRegister { operand: 5, addr: 1 })
        );
    }

    #[test]
    fn fetch_cycle_registers() {
        let mut processor = load("LDM #7\nJMP 0", BufferedHooks::new());
        assert_eq!(processor.run_next_instruction(), Ok(Status::Running));
        let regs = processor.registers();
        assert_eq!(regs.mar, 0x0107);
        assert_eq!(regs.mdr, 7);
        assert_eq!(regs.cir, Opcode::LDM.code());
        assert_eq!(regs.pc, 1);
        processor.run_next_instruction().unwrap();
        assert_eq!(processor.registers().pc, 0);
    }

    #[test]
    fn stepping_matches_running() {
        let src = "LDM #9\nADD #250\nMOV IX\nSTO 10\nLSL #2\nXOR #3\nCMP #3\nOUT\nEND";
        let mut stepped = load(src, BufferedHooks::new());
        for _ in 0..8 {
            assert_eq!(stepped.run_next_instruction(), Ok(Status::Running));
        }
        assert_eq!(stepped.run_next_instruction(), Ok(Status::Halted(Halt::End)));

        let mut ran = load(src, BufferedHooks::new());
        ran.run_code(0).unwrap();

        assert_eq!(stepped.registers(), ran.registers());
        assert_eq!(stepped.memory(), ran.memory());
        assert_eq!(stepped.hooks().output, ran.hooks().output);
    }

    #[test]
    fn running_off_the_end() {
        let image = vec![combine(Opcode::INC.code(), Register::Ix as u8); MEMORY_SIZE];
        let mut processor = Processor::with_options(
            ProcessorOptions {
                memory: Some(image),
                ..Default::default()
            },
            BufferedHooks::new(),
        )
        .unwrap();
        assert_eq!(processor.run_code(0), Ok(Halt::End));
        assert_eq!(processor.registers().ix, 0);
        assert_eq!(processor.pc(), 257);
    }

    #[test]
    fn construction_is_validated() {
        let with = |opts: ProcessorOptions| Processor::with_options(opts, BufferedHooks::new());
        assert!(with(ProcessorOptions {
            pc: Some(256),
            ..Default::default()
        })
        .is_err());
        assert!(with(ProcessorOptions {
            acc: Some(1000),
            ..Default::default()
        })
        .is_err());
        assert!(with(ProcessorOptions {
            sr: Some("10000".to_string()),
            ..Default::default()
        })
        .is_err());
        assert!(with(ProcessorOptions {
            sr: Some("12".to_string()),
            ..Default::default()
        })
        .is_err());
        assert!(with(ProcessorOptions {
            memory: Some(vec![0; 10]),
            ..Default::default()
        })
        .is_err());

        let processor = with(ProcessorOptions {
            pc: Some(3),
            acc: Some(255),
            ix: Some(4),
            sr: Some("0101".to_string()),
            ..Default::default()
        })
        .unwrap();
        let regs = processor.registers();
        assert_eq!((regs.pc, regs.acc, regs.ix), (3, 255, 4));
        assert!(processor.flag(Flag::Zero));
        assert!(processor.flag(Flag::Overflow));
    }

    #[test]
    fn load_rejects_oversized_image() {
        let mut processor = Processor::new(BufferedHooks::new());
        assert!(processor.load_memory(&vec![0; MEMORY_SIZE + 1]).is_err());
    }

    #[test]
    fn memory_access() {
        let mut processor = run("LDM #3\nMOV IX\nEND");
        assert_eq!(processor.memory_slice(..2), &[0x0103, 0x0601]);
        assert_eq!(processor.memory_slice(250..300).len(), 6);
        assert_eq!(processor.memory_slice(..).len(), MEMORY_SIZE);
        assert_eq!(processor.memory_slice(300..).len(), 0);
        assert_eq!(processor.memory_slice(0..=usize::MAX).len(), MEMORY_SIZE);
        let empty = (Bound::Excluded(usize::MAX), Bound::Unbounded);
        assert!(processor.memory_slice(empty).is_empty());
        processor.clear_memory();
        assert!(processor.memory().iter().all(|word| *word == 0));
        assert_eq!(processor.registers().acc, 0);
        assert_eq!(processor.registers().ix, 0);
    }
}
