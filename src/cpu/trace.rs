//! nestest-style trace lines: `PC  OP  MNE A:.. X:.. Y:.. P:.. SP:.. CYC:..`.

use ansi_term::Colour::{Cyan, Red, Yellow};

use crate::{bus::Bus, cpu::cpu::CPU, cpu::opcode::Opcode};

/// Trace line for the instruction about to run at `pc`. Registers are the pre-execution values.
pub fn line<B: Bus>(
    cpu: &CPU<B>,
    pc: u16,
    code: u8,
    opcode: Option<&Opcode>,
    color: bool,
) -> String {
    let name = opcode.map_or("???", |op| op.mnemonic.name());
    let unofficial = opcode.is_some_and(|op| !op.official);
    let registers = format!(
        "A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status.pack(),
        cpu.sp,
        cpu.cycles
    );
    let mnemonic = format!("{}{:<3}", if unofficial { '*' } else { ' ' }, name);

    if !color {
        return format!("{pc:04X}  {code:02X} {mnemonic}  {registers}");
    }
    let mnemonic = if opcode.is_none() {
        Red.bold().paint(mnemonic)
    } else if unofficial {
        Yellow.paint(mnemonic)
    } else {
        Cyan.paint(mnemonic)
    };
    format!("{pc:04X}  {code:02X} {mnemonic}  {registers}")
}
