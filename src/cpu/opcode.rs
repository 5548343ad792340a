//! Opcode table: one descriptor per byte value.
//!
//! See [6502 instructions](https://www.nesdev.org/wiki/Instruction_reference) and
//! [CPU unofficial opcodes](https://www.nesdev.org/wiki/CPU_unofficial_opcodes). Bytes with no
//! entry (the KIL/JAM family and the unstable undocumented opcodes) fault when decoded.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl Mode {
    pub const fn operand_bytes(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator => 0,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Undocumented, stable on the 2A03
    Lax,
    Sax,
    Dcp,
    Isc,
    Slo,
    Rla,
    Sre,
    Rra,
}

impl Mnemonic {
    pub const fn name(self) -> &'static str {
        match self {
            Mnemonic::Adc => "ADC",
            Mnemonic::And => "AND",
            Mnemonic::Asl => "ASL",
            Mnemonic::Bcc => "BCC",
            Mnemonic::Bcs => "BCS",
            Mnemonic::Beq => "BEQ",
            Mnemonic::Bit => "BIT",
            Mnemonic::Bmi => "BMI",
            Mnemonic::Bne => "BNE",
            Mnemonic::Bpl => "BPL",
            Mnemonic::Brk => "BRK",
            Mnemonic::Bvc => "BVC",
            Mnemonic::Bvs => "BVS",
            Mnemonic::Clc => "CLC",
            Mnemonic::Cld => "CLD",
            Mnemonic::Cli => "CLI",
            Mnemonic::Clv => "CLV",
            Mnemonic::Cmp => "CMP",
            Mnemonic::Cpx => "CPX",
            Mnemonic::Cpy => "CPY",
            Mnemonic::Dec => "DEC",
            Mnemonic::Dex => "DEX",
            Mnemonic::Dey => "DEY",
            Mnemonic::Eor => "EOR",
            Mnemonic::Inc => "INC",
            Mnemonic::Inx => "INX",
            Mnemonic::Iny => "INY",
            Mnemonic::Jmp => "JMP",
            Mnemonic::Jsr => "JSR",
            Mnemonic::Lda => "LDA",
            Mnemonic::Ldx => "LDX",
            Mnemonic::Ldy => "LDY",
            Mnemonic::Lsr => "LSR",
            Mnemonic::Nop => "NOP",
            Mnemonic::Ora => "ORA",
            Mnemonic::Pha => "PHA",
            Mnemonic::Php => "PHP",
            Mnemonic::Pla => "PLA",
            Mnemonic::Plp => "PLP",
            Mnemonic::Rol => "ROL",
            Mnemonic::Ror => "ROR",
            Mnemonic::Rti => "RTI",
            Mnemonic::Rts => "RTS",
            Mnemonic::Sbc => "SBC",
            Mnemonic::Sec => "SEC",
            Mnemonic::Sed => "SED",
            Mnemonic::Sei => "SEI",
            Mnemonic::Sta => "STA",
            Mnemonic::Stx => "STX",
            Mnemonic::Sty => "STY",
            Mnemonic::Tax => "TAX",
            Mnemonic::Tay => "TAY",
            Mnemonic::Tsx => "TSX",
            Mnemonic::Txa => "TXA",
            Mnemonic::Txs => "TXS",
            Mnemonic::Tya => "TYA",
            Mnemonic::Lax => "LAX",
            Mnemonic::Sax => "SAX",
            Mnemonic::Dcp => "DCP",
            Mnemonic::Isc => "ISC",
            Mnemonic::Slo => "SLO",
            Mnemonic::Rla => "RLA",
            Mnemonic::Sre => "SRE",
            Mnemonic::Rra => "RRA",
        }
    }

    /// Whether the instruction loads its memory operand. Stores and jumps only need the
    /// address, so they must not touch read-sensitive registers like $2002 or $2007.
    pub const fn reads_operand(self) -> bool {
        matches!(
            self,
            Mnemonic::Adc
                | Mnemonic::And
                | Mnemonic::Asl
                | Mnemonic::Bit
                | Mnemonic::Cmp
                | Mnemonic::Cpx
                | Mnemonic::Cpy
                | Mnemonic::Dec
                | Mnemonic::Eor
                | Mnemonic::Inc
                | Mnemonic::Lda
                | Mnemonic::Ldx
                | Mnemonic::Ldy
                | Mnemonic::Lsr
                | Mnemonic::Nop
                | Mnemonic::Ora
                | Mnemonic::Rol
                | Mnemonic::Ror
                | Mnemonic::Sbc
                | Mnemonic::Lax
                | Mnemonic::Dcp
                | Mnemonic::Isc
                | Mnemonic::Slo
                | Mnemonic::Rla
                | Mnemonic::Sre
                | Mnemonic::Rra
        )
    }
}

/// Cycles added on top of the base count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extra {
    None,
    /// +1 when indexing crosses a page.
    PageCross,
    /// +1 when taken, +1 more when the target is on another page.
    Branch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: Mnemonic,
    pub mode: Mode,
    pub bytes: u8,
    pub cycles: u8,
    pub extra: Extra,
    pub official: bool,
}

impl Opcode {
    const fn new(
        code: u8,
        mnemonic: Mnemonic,
        mode: Mode,
        cycles: u8,
        page: bool,
        official: bool,
    ) -> Self {
        let extra = if matches!(mode, Mode::Relative) {
            Extra::Branch
        } else if page {
            Extra::PageCross
        } else {
            Extra::None
        };
        Self {
            code,
            mnemonic,
            mode,
            bytes: 1 + mode.operand_bytes(),
            cycles,
            extra,
            official,
        }
    }
}

/// (opcode, mnemonic, mode, base cycles, +1 on page cross)
type Row = (u8, Mnemonic, Mode, u8, bool);

const P: bool = true;
const F: bool = false;

#[rustfmt::skip]
const OFFICIAL: &[Row] = {
    use self::Mnemonic::*;
    use self::Mode::*;
    &[
        (0x69, Adc, Immediate, 2, F), (0x65, Adc, ZeroPage, 3, F), (0x75, Adc, ZeroPageX, 4, F),
        (0x6D, Adc, Absolute, 4, F), (0x7D, Adc, AbsoluteX, 4, P), (0x79, Adc, AbsoluteY, 4, P),
        (0x61, Adc, IndirectX, 6, F), (0x71, Adc, IndirectY, 5, P),

        (0x29, And, Immediate, 2, F), (0x25, And, ZeroPage, 3, F), (0x35, And, ZeroPageX, 4, F),
        (0x2D, And, Absolute, 4, F), (0x3D, And, AbsoluteX, 4, P), (0x39, And, AbsoluteY, 4, P),
        (0x21, And, IndirectX, 6, F), (0x31, And, IndirectY, 5, P),

        (0x0A, Asl, Accumulator, 2, F), (0x06, Asl, ZeroPage, 5, F), (0x16, Asl, ZeroPageX, 6, F),
        (0x0E, Asl, Absolute, 6, F), (0x1E, Asl, AbsoluteX, 7, F),

        (0x90, Bcc, Relative, 2, F), (0xB0, Bcs, Relative, 2, F), (0xF0, Beq, Relative, 2, F),
        (0x30, Bmi, Relative, 2, F), (0xD0, Bne, Relative, 2, F), (0x10, Bpl, Relative, 2, F),
        (0x50, Bvc, Relative, 2, F), (0x70, Bvs, Relative, 2, F),

        (0x24, Bit, ZeroPage, 3, F), (0x2C, Bit, Absolute, 4, F),

        (0x00, Brk, Implied, 7, F),

        (0x18, Clc, Implied, 2, F), (0xD8, Cld, Implied, 2, F), (0x58, Cli, Implied, 2, F),
        (0xB8, Clv, Implied, 2, F),

        (0xC9, Cmp, Immediate, 2, F), (0xC5, Cmp, ZeroPage, 3, F), (0xD5, Cmp, ZeroPageX, 4, F),
        (0xCD, Cmp, Absolute, 4, F), (0xDD, Cmp, AbsoluteX, 4, P), (0xD9, Cmp, AbsoluteY, 4, P),
        (0xC1, Cmp, IndirectX, 6, F), (0xD1, Cmp, IndirectY, 5, P),

        (0xE0, Cpx, Immediate, 2, F), (0xE4, Cpx, ZeroPage, 3, F), (0xEC, Cpx, Absolute, 4, F),
        (0xC0, Cpy, Immediate, 2, F), (0xC4, Cpy, ZeroPage, 3, F), (0xCC, Cpy, Absolute, 4, F),

        (0xC6, Dec, ZeroPage, 5, F), (0xD6, Dec, ZeroPageX, 6, F), (0xCE, Dec, Absolute, 6, F),
        (0xDE, Dec, AbsoluteX, 7, F),
        (0xCA, Dex, Implied, 2, F), (0x88, Dey, Implied, 2, F),

        (0x49, Eor, Immediate, 2, F), (0x45, Eor, ZeroPage, 3, F), (0x55, Eor, ZeroPageX, 4, F),
        (0x4D, Eor, Absolute, 4, F), (0x5D, Eor, AbsoluteX, 4, P), (0x59, Eor, AbsoluteY, 4, P),
        (0x41, Eor, IndirectX, 6, F), (0x51, Eor, IndirectY, 5, P),

        (0xE6, Inc, ZeroPage, 5, F), (0xF6, Inc, ZeroPageX, 6, F), (0xEE, Inc, Absolute, 6, F),
        (0xFE, Inc, AbsoluteX, 7, F),
        (0xE8, Inx, Implied, 2, F), (0xC8, Iny, Implied, 2, F),

        (0x4C, Jmp, Absolute, 3, F), (0x6C, Jmp, Indirect, 5, F),
        (0x20, Jsr, Absolute, 6, F),

        (0xA9, Lda, Immediate, 2, F), (0xA5, Lda, ZeroPage, 3, F), (0xB5, Lda, ZeroPageX, 4, F),
        (0xAD, Lda, Absolute, 4, F), (0xBD, Lda, AbsoluteX, 4, P), (0xB9, Lda, AbsoluteY, 4, P),
        (0xA1, Lda, IndirectX, 6, F), (0xB1, Lda, IndirectY, 5, P),

        (0xA2, Ldx, Immediate, 2, F), (0xA6, Ldx, ZeroPage, 3, F), (0xB6, Ldx, ZeroPageY, 4, F),
        (0xAE, Ldx, Absolute, 4, F), (0xBE, Ldx, AbsoluteY, 4, P),

        (0xA0, Ldy, Immediate, 2, F), (0xA4, Ldy, ZeroPage, 3, F), (0xB4, Ldy, ZeroPageX, 4, F),
        (0xAC, Ldy, Absolute, 4, F), (0xBC, Ldy, AbsoluteX, 4, P),

        (0x4A, Lsr, Accumulator, 2, F), (0x46, Lsr, ZeroPage, 5, F), (0x56, Lsr, ZeroPageX, 6, F),
        (0x4E, Lsr, Absolute, 6, F), (0x5E, Lsr, AbsoluteX, 7, F),

        (0xEA, Nop, Implied, 2, F),

        (0x09, Ora, Immediate, 2, F), (0x05, Ora, ZeroPage, 3, F), (0x15, Ora, ZeroPageX, 4, F),
        (0x0D, Ora, Absolute, 4, F), (0x1D, Ora, AbsoluteX, 4, P), (0x19, Ora, AbsoluteY, 4, P),
        (0x01, Ora, IndirectX, 6, F), (0x11, Ora, IndirectY, 5, P),

        (0x48, Pha, Implied, 3, F), (0x08, Php, Implied, 3, F),
        (0x68, Pla, Implied, 4, F), (0x28, Plp, Implied, 4, F),

        (0x2A, Rol, Accumulator, 2, F), (0x26, Rol, ZeroPage, 5, F), (0x36, Rol, ZeroPageX, 6, F),
        (0x2E, Rol, Absolute, 6, F), (0x3E, Rol, AbsoluteX, 7, F),

        (0x6A, Ror, Accumulator, 2, F), (0x66, Ror, ZeroPage, 5, F), (0x76, Ror, ZeroPageX, 6, F),
        (0x6E, Ror, Absolute, 6, F), (0x7E, Ror, AbsoluteX, 7, F),

        (0x40, Rti, Implied, 6, F), (0x60, Rts, Implied, 6, F),

        (0xE9, Sbc, Immediate, 2, F), (0xE5, Sbc, ZeroPage, 3, F), (0xF5, Sbc, ZeroPageX, 4, F),
        (0xED, Sbc, Absolute, 4, F), (0xFD, Sbc, AbsoluteX, 4, P), (0xF9, Sbc, AbsoluteY, 4, P),
        (0xE1, Sbc, IndirectX, 6, F), (0xF1, Sbc, IndirectY, 5, P),

        (0x38, Sec, Implied, 2, F), (0xF8, Sed, Implied, 2, F), (0x78, Sei, Implied, 2, F),

        (0x85, Sta, ZeroPage, 3, F), (0x95, Sta, ZeroPageX, 4, F), (0x8D, Sta, Absolute, 4, F),
        (0x9D, Sta, AbsoluteX, 5, F), (0x99, Sta, AbsoluteY, 5, F), (0x81, Sta, IndirectX, 6, F),
        (0x91, Sta, IndirectY, 6, F),

        (0x86, Stx, ZeroPage, 3, F), (0x96, Stx, ZeroPageY, 4, F), (0x8E, Stx, Absolute, 4, F),
        (0x84, Sty, ZeroPage, 3, F), (0x94, Sty, ZeroPageX, 4, F), (0x8C, Sty, Absolute, 4, F),

        (0xAA, Tax, Implied, 2, F), (0xA8, Tay, Implied, 2, F), (0xBA, Tsx, Implied, 2, F),
        (0x8A, Txa, Implied, 2, F), (0x9A, Txs, Implied, 2, F), (0x98, Tya, Implied, 2, F),
    ]
};

#[rustfmt::skip]
const UNOFFICIAL: &[Row] = {
    use self::Mnemonic::*;
    use self::Mode::*;
    &[
        (0x1A, Nop, Implied, 2, F), (0x3A, Nop, Implied, 2, F), (0x5A, Nop, Implied, 2, F),
        (0x7A, Nop, Implied, 2, F), (0xDA, Nop, Implied, 2, F), (0xFA, Nop, Implied, 2, F),
        (0x80, Nop, Immediate, 2, F), (0x82, Nop, Immediate, 2, F), (0x89, Nop, Immediate, 2, F),
        (0xC2, Nop, Immediate, 2, F), (0xE2, Nop, Immediate, 2, F),
        (0x04, Nop, ZeroPage, 3, F), (0x44, Nop, ZeroPage, 3, F), (0x64, Nop, ZeroPage, 3, F),
        (0x14, Nop, ZeroPageX, 4, F), (0x34, Nop, ZeroPageX, 4, F), (0x54, Nop, ZeroPageX, 4, F),
        (0x74, Nop, ZeroPageX, 4, F), (0xD4, Nop, ZeroPageX, 4, F), (0xF4, Nop, ZeroPageX, 4, F),
        (0x0C, Nop, Absolute, 4, F),
        (0x1C, Nop, AbsoluteX, 4, P), (0x3C, Nop, AbsoluteX, 4, P), (0x5C, Nop, AbsoluteX, 4, P),
        (0x7C, Nop, AbsoluteX, 4, P), (0xDC, Nop, AbsoluteX, 4, P), (0xFC, Nop, AbsoluteX, 4, P),

        (0xA7, Lax, ZeroPage, 3, F), (0xB7, Lax, ZeroPageY, 4, F), (0xAF, Lax, Absolute, 4, F),
        (0xBF, Lax, AbsoluteY, 4, P), (0xA3, Lax, IndirectX, 6, F), (0xB3, Lax, IndirectY, 5, P),

        (0x87, Sax, ZeroPage, 3, F), (0x97, Sax, ZeroPageY, 4, F), (0x8F, Sax, Absolute, 4, F),
        (0x83, Sax, IndirectX, 6, F),

        (0xEB, Sbc, Immediate, 2, F),

        (0xC7, Dcp, ZeroPage, 5, F), (0xD7, Dcp, ZeroPageX, 6, F), (0xCF, Dcp, Absolute, 6, F),
        (0xDF, Dcp, AbsoluteX, 7, F), (0xDB, Dcp, AbsoluteY, 7, F), (0xC3, Dcp, IndirectX, 8, F),
        (0xD3, Dcp, IndirectY, 8, F),

        (0xE7, Isc, ZeroPage, 5, F), (0xF7, Isc, ZeroPageX, 6, F), (0xEF, Isc, Absolute, 6, F),
        (0xFF, Isc, AbsoluteX, 7, F), (0xFB, Isc, AbsoluteY, 7, F), (0xE3, Isc, IndirectX, 8, F),
        (0xF3, Isc, IndirectY, 8, F),

        (0x07, Slo, ZeroPage, 5, F), (0x17, Slo, ZeroPageX, 6, F), (0x0F, Slo, Absolute, 6, F),
        (0x1F, Slo, AbsoluteX, 7, F), (0x1B, Slo, AbsoluteY, 7, F), (0x03, Slo, IndirectX, 8, F),
        (0x13, Slo, IndirectY, 8, F),

        (0x27, Rla, ZeroPage, 5, F), (0x37, Rla, ZeroPageX, 6, F), (0x2F, Rla, Absolute, 6, F),
        (0x3F, Rla, AbsoluteX, 7, F), (0x3B, Rla, AbsoluteY, 7, F), (0x23, Rla, IndirectX, 8, F),
        (0x33, Rla, IndirectY, 8, F),

        (0x47, Sre, ZeroPage, 5, F), (0x57, Sre, ZeroPageX, 6, F), (0x4F, Sre, Absolute, 6, F),
        (0x5F, Sre, AbsoluteX, 7, F), (0x5B, Sre, AbsoluteY, 7, F), (0x43, Sre, IndirectX, 8, F),
        (0x53, Sre, IndirectY, 8, F),

        (0x67, Rra, ZeroPage, 5, F), (0x77, Rra, ZeroPageX, 6, F), (0x6F, Rra, Absolute, 6, F),
        (0x7F, Rra, AbsoluteX, 7, F), (0x7B, Rra, AbsoluteY, 7, F), (0x63, Rra, IndirectX, 8, F),
        (0x73, Rra, IndirectY, 8, F),
    ]
};

const fn build() -> [Option<Opcode>; 256] {
    let mut table: [Option<Opcode>; 256] = [None; 256];
    let mut i = 0;
    while i < OFFICIAL.len() {
        let (code, mnemonic, mode, cycles, page) = OFFICIAL[i];
        table[code as usize] = Some(Opcode::new(code, mnemonic, mode, cycles, page, true));
        i += 1;
    }
    let mut i = 0;
    while i < UNOFFICIAL.len() {
        let (code, mnemonic, mode, cycles, page) = UNOFFICIAL[i];
        table[code as usize] = Some(Opcode::new(code, mnemonic, mode, cycles, page, false));
        i += 1;
    }
    table
}

/// Descriptor for every byte value; `None` = illegal.
pub static OPCODES: [Option<Opcode>; 256] = build();

pub fn lookup(code: u8) -> Option<&'static Opcode> {
    OPCODES[code as usize].as_ref()
}
