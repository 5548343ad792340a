use thiserror::Error;

use crate::{
    bus::{Bus, BusError},
    config::Config,
    cpu::{
        flags::Status,
        interrupt::{InterruptLine, PendingInterrupt},
        opcode::{self, Extra, Mnemonic, Mode, Opcode},
        trace,
    },
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const STACK_BASE: u16 = 0x0100;
const RESET_STATUS: u8 = 0x34;
const RESET_SP: u8 = 0xFD;
const RESET_CYCLES: usize = 7;
const INTERRUPT_CYCLES: usize = 7;
const DMA_STALL_CYCLES: usize = 513;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    #[error("CPU halted at ${pc:04X} after a fault; reset to resume")]
    Halted { pc: u16 },

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Resolved operand: the value (if the instruction reads one) and the effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub value: u8,
    /// None for implied, accumulator and immediate operands.
    pub addr: Option<u16>,
    pub page_crossed: bool,
}

impl Operand {
    const fn inline(value: u8) -> Self {
        Self {
            value,
            addr: None,
            page_crossed: false,
        }
    }
}

/// Where PC goes after an instruction. Taken branches are jumps too.
enum Flow {
    Next,
    Jump(u16),
}

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: Status,
    pub cycles: usize,
    pub bus: B,
    pub halted: bool,
    interrupts: InterruptLine,
    config: Config,
}

impl<B: Bus> CPU<B> {
    /// Registers at power-up values; call [`CPU::reset`] to load PC from the reset vector.
    pub fn new(bus: B, config: Config) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: RESET_SP,
            pc: 0,
            status: Status::unpack(RESET_STATUS),
            cycles: 0,
            bus,
            halted: false,
            interrupts: InterruptLine::new(),
            config,
        }
    }

    pub fn reset(&mut self) -> Result<(), CpuError> {
        self.pc = self.read_word(RESET_VECTOR)?;

        self.sp = RESET_SP;
        self.status = Status::unpack(RESET_STATUS);

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.halted = false;
        self.interrupts.clear();

        self.cycles = RESET_CYCLES;
        log::debug!("CPU reset, PC=${:04X}", self.pc);
        Ok(())
    }

    /// Handle for devices that raise interrupts.
    pub fn interrupt_line(&self) -> InterruptLine {
        self.interrupts.clone()
    }

    pub fn request_nmi(&self) {
        self.interrupts.request_nmi();
    }

    pub fn request_irq(&self) {
        self.interrupts.request_irq();
    }

    pub fn pending_interrupt(&self) -> PendingInterrupt {
        self.interrupts.pending()
    }

    /// Run one instruction, or service one pending interrupt. Returns the cycles it took.
    /// Any fault halts the CPU until the next reset.
    pub fn step(&mut self) -> Result<usize, CpuError> {
        if self.halted {
            return Err(CpuError::Halted { pc: self.pc });
        }
        match self.run() {
            Ok(cycles) => {
                self.cycles += cycles;
                Ok(cycles)
            }
            Err(err) => {
                self.halted = true;
                log::error!("CPU halted: {err}");
                Err(err)
            }
        }
    }

    fn run(&mut self) -> Result<usize, CpuError> {
        if let Some(vector) = self.poll_interrupt() {
            self.interrupt(vector)?;
            return Ok(INTERRUPT_CYCLES);
        }

        let pc = self.pc;
        let code = self.bus.read(pc)?;
        let decoded = self.decode(code);
        if self.config.trace {
            log::trace!(
                "{}",
                trace::line(self, pc, code, decoded, self.config.trace_color)
            );
        }
        let Some(opcode) = decoded else {
            return Err(CpuError::IllegalOpcode { opcode: code, pc });
        };
        self.pc = pc.wrapping_add(1);

        let operand = self.resolve(opcode)?;
        let mut cycles = opcode.cycles as usize;
        if opcode.extra == Extra::PageCross && operand.page_crossed {
            cycles += 1;
        }

        match self.execute(opcode, operand)? {
            Flow::Next => {}
            Flow::Jump(target) => {
                if opcode.extra == Extra::Branch {
                    let next = pc.wrapping_add(opcode.bytes as u16);
                    cycles += 1 + page_crossed(next, target) as usize;
                }
                self.pc = target;
            }
        }

        if self.bus.take_dma_stall() {
            cycles += DMA_STALL_CYCLES + (self.cycles + cycles) % 2;
        }
        Ok(cycles)
    }

    fn decode(&self, code: u8) -> Option<&'static Opcode> {
        opcode::lookup(code).filter(|op| op.official || self.config.unofficial_opcodes)
    }

    fn poll_interrupt(&mut self) -> Option<u16> {
        match self.interrupts.pending() {
            PendingInterrupt::Nmi => {
                self.interrupts.clear();
                Some(NMI_VECTOR)
            }
            PendingInterrupt::Irq if !self.status.interrupt_disable => {
                self.interrupts.clear();
                Some(IRQ_VECTOR)
            }
            _ => None,
        }
    }

    /// Hardware interrupt entry: PC and P (B clear) to the stack, I set, PC from `vector`.
    fn interrupt(&mut self, vector: u16) -> Result<(), BusError> {
        log::trace!("interrupt via ${vector:04X} from PC=${:04X}", self.pc);
        self.push_word(self.pc)?;
        self.push(self.status.pushed(false))?;
        self.status.interrupt_disable = true;
        self.pc = self.read_word(vector)?;
        Ok(())
    }

    fn fetch_byte(&mut self) -> Result<u8, BusError> {
        let byte = self.bus.read(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(byte)
    }

    fn fetch_word(&mut self) -> Result<u16, BusError> {
        let lo = self.fetch_byte()? as u16;
        let hi = self.fetch_byte()? as u16;
        Ok((hi << 8) | lo)
    }

    fn read_word(&mut self, addr: u16) -> Result<u16, BusError> {
        let lo = self.bus.read(addr)? as u16;
        let hi = self.bus.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    /// Little-endian pointer in page zero; the high byte wraps to $00.
    fn read_zero_page_word(&mut self, ptr: u8) -> Result<u16, BusError> {
        let lo = self.bus.read(ptr as u16)? as u16;
        let hi = self.bus.read(ptr.wrapping_add(1) as u16)? as u16;
        Ok((hi << 8) | lo)
    }

    pub fn push(&mut self, value: u8) -> Result<(), BusError> {
        self.bus.write(STACK_BASE | self.sp as u16, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    pub fn pull(&mut self) -> Result<u8, BusError> {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(STACK_BASE | self.sp as u16)
    }

    /// High byte first, so the low byte ends up at the lower address.
    pub fn push_word(&mut self, value: u16) -> Result<(), BusError> {
        self.push((value >> 8) as u8)?;
        self.push(value as u8)
    }

    pub fn pull_word(&mut self) -> Result<u16, BusError> {
        let lo = self.pull()? as u16;
        let hi = self.pull()? as u16;
        Ok((hi << 8) | lo)
    }

    /// Fetch operand bytes and compute the effective address. Memory is only read for
    /// instructions that consume the value.
    fn resolve(&mut self, opcode: &Opcode) -> Result<Operand, BusError> {
        let (addr, page_crossed) = match opcode.mode {
            Mode::Implied => return Ok(Operand::inline(0)),
            Mode::Accumulator => return Ok(Operand::inline(self.a)),
            Mode::Immediate => return Ok(Operand::inline(self.fetch_byte()?)),
            Mode::ZeroPage => (self.fetch_byte()? as u16, false),
            Mode::ZeroPageX => (self.fetch_byte()?.wrapping_add(self.x) as u16, false),
            Mode::ZeroPageY => (self.fetch_byte()?.wrapping_add(self.y) as u16, false),
            Mode::Absolute => (self.fetch_word()?, false),
            Mode::AbsoluteX => {
                let base = self.fetch_word()?;
                let addr = base.wrapping_add(self.x as u16);
                (addr, page_crossed(base, addr))
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word()?;
                let addr = base.wrapping_add(self.y as u16);
                (addr, page_crossed(base, addr))
            }
            Mode::Indirect => {
                // 6502 bug: the pointer's high byte is fetched from the same page
                let ptr = self.fetch_word()?;
                let lo = self.bus.read(ptr)? as u16;
                let hi = self.bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF))? as u16;
                ((hi << 8) | lo, false)
            }
            Mode::IndirectX => {
                let ptr = self.fetch_byte()?.wrapping_add(self.x);
                (self.read_zero_page_word(ptr)?, false)
            }
            Mode::IndirectY => {
                let ptr = self.fetch_byte()?;
                let base = self.read_zero_page_word(ptr)?;
                let addr = base.wrapping_add(self.y as u16);
                (addr, page_crossed(base, addr))
            }
            Mode::Relative => {
                let offset = self.fetch_byte()? as i8;
                (self.pc.wrapping_add(offset as u16), false)
            }
        };

        let value = if opcode.mnemonic.reads_operand() {
            self.bus.read(addr)?
        } else {
            0
        };
        Ok(Operand {
            value,
            addr: Some(addr),
            page_crossed,
        })
    }

    /// Store a result to the operand's address, or to A for accumulator-mode shifts.
    fn write_back(&mut self, operand: Operand, value: u8) -> Result<(), BusError> {
        match operand.addr {
            Some(addr) => self.bus.write(addr, value),
            None => {
                self.a = value;
                Ok(())
            }
        }
    }

    fn store(&mut self, operand: Operand, value: u8) -> Result<(), BusError> {
        match operand.addr {
            Some(addr) => self.bus.write(addr, value),
            None => Ok(()),
        }
    }

    fn execute(&mut self, opcode: &Opcode, operand: Operand) -> Result<Flow, BusError> {
        let value = operand.value;
        match opcode.mnemonic {
            // Loads, stores, transfers
            Mnemonic::Lda => {
                self.a = value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Ldx => {
                self.x = value;
                self.status.set_zn(self.x);
            }
            Mnemonic::Ldy => {
                self.y = value;
                self.status.set_zn(self.y);
            }
            Mnemonic::Sta => self.store(operand, self.a)?,
            Mnemonic::Stx => self.store(operand, self.x)?,
            Mnemonic::Sty => self.store(operand, self.y)?,
            Mnemonic::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Mnemonic::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Mnemonic::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Mnemonic::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Mnemonic::Txs => self.sp = self.x,
            Mnemonic::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }

            // Arithmetic and logic
            Mnemonic::Adc => self.adc(value),
            Mnemonic::Sbc => self.sbc(value),
            Mnemonic::And => {
                self.a &= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Ora => {
                self.a |= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Eor => {
                self.a ^= value;
                self.status.set_zn(self.a);
            }
            Mnemonic::Bit => {
                self.status.zero = self.a & value == 0;
                self.status.overflow = value & 0x40 != 0;
                self.status.negative = value & 0x80 != 0;
            }
            Mnemonic::Cmp => self.compare(self.a, value),
            Mnemonic::Cpx => self.compare(self.x, value),
            Mnemonic::Cpy => self.compare(self.y, value),

            // Increments and decrements
            Mnemonic::Inc => {
                let result = value.wrapping_add(1);
                self.status.set_zn(result);
                self.write_back(operand, result)?;
            }
            Mnemonic::Dec => {
                let result = value.wrapping_sub(1);
                self.status.set_zn(result);
                self.write_back(operand, result)?;
            }
            Mnemonic::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Mnemonic::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Mnemonic::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Shifts and rotates
            Mnemonic::Asl => {
                let result = self.asl(value);
                self.write_back(operand, result)?;
            }
            Mnemonic::Lsr => {
                let result = self.lsr(value);
                self.write_back(operand, result)?;
            }
            Mnemonic::Rol => {
                let result = self.rol(value);
                self.write_back(operand, result)?;
            }
            Mnemonic::Ror => {
                let result = self.ror(value);
                self.write_back(operand, result)?;
            }

            // Branches
            Mnemonic::Bcc => return Ok(branch(!self.status.carry, operand)),
            Mnemonic::Bcs => return Ok(branch(self.status.carry, operand)),
            Mnemonic::Beq => return Ok(branch(self.status.zero, operand)),
            Mnemonic::Bne => return Ok(branch(!self.status.zero, operand)),
            Mnemonic::Bmi => return Ok(branch(self.status.negative, operand)),
            Mnemonic::Bpl => return Ok(branch(!self.status.negative, operand)),
            Mnemonic::Bvs => return Ok(branch(self.status.overflow, operand)),
            Mnemonic::Bvc => return Ok(branch(!self.status.overflow, operand)),

            // Jumps, calls, interrupts
            Mnemonic::Jmp => return Ok(jump(operand)),
            Mnemonic::Jsr => {
                // Return address minus one; RTS adds it back
                self.push_word(self.pc.wrapping_sub(1))?;
                return Ok(jump(operand));
            }
            Mnemonic::Rts => {
                let ret = self.pull_word()?.wrapping_add(1);
                return Ok(Flow::Jump(ret));
            }
            Mnemonic::Brk => {
                // Skips the padding byte after the opcode
                self.push_word(self.pc.wrapping_add(1))?;
                self.push(self.status.pushed(true))?;
                self.status.interrupt_disable = true;
                let target = self.read_word(IRQ_VECTOR)?;
                return Ok(Flow::Jump(target));
            }
            Mnemonic::Rti => {
                let status = self.pull()?;
                self.status = Status::pulled(status);
                let ret = self.pull_word()?;
                return Ok(Flow::Jump(ret));
            }

            // Stack
            Mnemonic::Pha => self.push(self.a)?,
            Mnemonic::Php => self.push(self.status.pushed(true))?,
            Mnemonic::Pla => {
                self.a = self.pull()?;
                self.status.set_zn(self.a);
            }
            Mnemonic::Plp => {
                let status = self.pull()?;
                self.status = Status::pulled(status);
            }

            // Flags
            Mnemonic::Clc => self.status.carry = false,
            Mnemonic::Cld => self.status.decimal = false,
            Mnemonic::Cli => self.status.interrupt_disable = false,
            Mnemonic::Clv => self.status.overflow = false,
            Mnemonic::Sec => self.status.carry = true,
            Mnemonic::Sed => self.status.decimal = true,
            Mnemonic::Sei => self.status.interrupt_disable = true,

            Mnemonic::Nop => {}

            // Undocumented combinations
            Mnemonic::Lax => {
                self.a = value;
                self.x = value;
                self.status.set_zn(value);
            }
            Mnemonic::Sax => self.store(operand, self.a & self.x)?,
            Mnemonic::Dcp => {
                let result = value.wrapping_sub(1);
                self.write_back(operand, result)?;
                self.compare(self.a, result);
            }
            Mnemonic::Isc => {
                let result = value.wrapping_add(1);
                self.write_back(operand, result)?;
                self.sbc(result);
            }
            Mnemonic::Slo => {
                let result = self.asl(value);
                self.write_back(operand, result)?;
                self.a |= result;
                self.status.set_zn(self.a);
            }
            Mnemonic::Rla => {
                let result = self.rol(value);
                self.write_back(operand, result)?;
                self.a &= result;
                self.status.set_zn(self.a);
            }
            Mnemonic::Sre => {
                let result = self.lsr(value);
                self.write_back(operand, result)?;
                self.a ^= result;
                self.status.set_zn(self.a);
            }
            Mnemonic::Rra => {
                let result = self.ror(value);
                self.write_back(operand, result)?;
                self.adc(result);
            }
        }
        Ok(Flow::Next)
    }

    /// Binary add with carry. Decimal mode is ignored on the 2A03.
    fn adc(&mut self, value: u8) {
        let a = self.a;
        let sum = a as u16 + value as u16 + self.status.carry as u16;
        let result = sum as u8;
        self.status.carry = sum > 0xFF;
        self.status.overflow = (a ^ value) & 0x80 == 0 && (a ^ result) & 0x80 != 0;
        self.a = result;
        self.status.set_zn(result);
    }

    fn sbc(&mut self, value: u8) {
        let a = self.a;
        let diff = a as i16 - value as i16 - (!self.status.carry) as i16;
        let result = diff as u8;
        self.status.carry = diff >= 0;
        self.status.overflow = (a ^ value) & 0x80 != 0 && (a ^ result) & 0x80 != 0;
        self.a = result;
        self.status.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.carry = register >= value;
        self.status.set_zn(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.status.carry = value & 0x80 != 0;
        let result = value << 1;
        self.status.set_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.status.carry = value & 0x01 != 0;
        let result = value >> 1;
        self.status.set_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let result = (value << 1) | self.status.carry as u8;
        self.status.carry = value & 0x80 != 0;
        self.status.set_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | ((self.status.carry as u8) << 7);
        self.status.carry = value & 0x01 != 0;
        self.status.set_zn(result);
        result
    }
}

fn page_crossed(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

fn branch(condition: bool, operand: Operand) -> Flow {
    match operand.addr {
        Some(target) if condition => Flow::Jump(target),
        _ => Flow::Next,
    }
}

fn jump(operand: Operand) -> Flow {
    operand.addr.map_or(Flow::Next, Flow::Jump)
}
