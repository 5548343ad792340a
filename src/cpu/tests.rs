use crate::{
    bus::{Bus, BusError},
    config::Config,
    cpu::{
        cpu::{CPU, CpuError, IRQ_VECTOR, NMI_VECTOR},
        flags::{FLAG_BREAK, FLAG_CARRY, FLAG_NEGATIVE, FLAG_UNUSED, FLAG_ZERO},
        interrupt::PendingInterrupt,
        opcode::{Mnemonic, OPCODES},
        trace,
    },
};

struct TestBus {
    mem: [u8; 65536],
    reads: Vec<u16>,
    dma_pending: bool,
}

impl TestBus {
    fn new() -> Self {
        Self {
            mem: [0; 65536],
            reads: Vec::new(),
            dma_pending: false,
        }
    }

    /// Program at $8000 with the reset vector pointing at it.
    fn with_program(program: &[u8]) -> Self {
        let mut bus = Self::new();
        bus.load(0x8000, program);
        bus.mem[0xFFFC] = 0x00;
        bus.mem[0xFFFD] = 0x80;
        bus
    }

    fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Bus for TestBus {
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        self.reads.push(addr);
        Ok(self.mem[addr as usize])
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        if addr == 0x4014 {
            self.dma_pending = true;
        }
        self.mem[addr as usize] = data;
        Ok(())
    }

    fn take_dma_stall(&mut self) -> bool {
        std::mem::take(&mut self.dma_pending)
    }
}

fn new_cpu(bus: TestBus) -> CPU<TestBus> {
    let mut cpu = CPU::new(bus, Config::default());
    cpu.reset().unwrap();
    cpu
}

fn run(program: &[u8]) -> CPU<TestBus> {
    new_cpu(TestBus::with_program(program))
}

#[test]
fn reset_loads_vector_and_defaults() {
    let cpu = run(&[]);
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.status.pack(), 0x34);
    assert_eq!((cpu.a, cpu.x, cpu.y), (0, 0, 0));
    assert_eq!(cpu.cycles, 7);
}

#[test]
fn lda_immediate_loads_value() {
    let mut cpu = run(&[0xA9, 0x42]); // LDA #$42
    assert_eq!(cpu.step().unwrap(), 2);
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.pc, 0x8002);
    assert_eq!(cpu.cycles, 9);
}

#[test]
fn lda_sets_zero_and_negative_flags() {
    let mut cpu = run(&[0xA9, 0x00, 0xA9, 0x80]);
    cpu.step().unwrap();
    assert!(cpu.status.zero);
    assert!(!cpu.status.negative);
    cpu.step().unwrap();
    assert!(!cpu.status.zero);
    assert!(cpu.status.negative);
}

#[test]
fn tax_transfers_a_to_x() {
    let mut cpu = run(&[0xA9, 0x10, 0xAA]);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.x, 0x10);
}

#[test]
fn sta_writes_without_reading_target() {
    let mut cpu = run(&[0xA9, 0x37, 0x8D, 0x02, 0x20]); // LDA #$37; STA $2002
    cpu.step().unwrap();
    cpu.bus.reads.clear();
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.bus.mem[0x2002], 0x37);
    assert!(!cpu.bus.reads.contains(&0x2002));
}

#[test]
fn adc_overflow_and_carry() {
    // 0x50 + 0x50: signed overflow, no carry
    let mut cpu = run(&[0xA9, 0x50, 0x69, 0x50]);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0xA0);
    assert!(cpu.status.overflow);
    assert!(!cpu.status.carry);
    assert!(cpu.status.negative);

    // 0xFF + 0x01: carry out, zero, no overflow
    let mut cpu = run(&[0xA9, 0xFF, 0x69, 0x01]);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.status.carry);
    assert!(cpu.status.zero);
    assert!(!cpu.status.overflow);

    // carry in
    let mut cpu = run(&[0x38, 0xA9, 0x01, 0x69, 0x01]);
    for _ in 0..3 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.a, 0x03);
}

#[test]
fn sbc_borrow_and_overflow() {
    let mut cpu = run(&[0x38, 0xA9, 0x50, 0xE9, 0xB0]); // SEC; LDA #$50; SBC #$B0
    for _ in 0..3 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.a, 0xA0);
    assert!(!cpu.status.carry);
    assert!(cpu.status.overflow);

    // borrow in: 0x10 - 0x01 - 1
    let mut cpu = run(&[0x18, 0xA9, 0x10, 0xE9, 0x01]);
    for _ in 0..3 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.a, 0x0E);
    assert!(cpu.status.carry);
}

#[test]
fn cmp_sets_carry_zero_negative() {
    let mut cpu = run(&[0xA9, 0x40, 0xC9, 0x40, 0xC9, 0x41, 0xC9, 0x20]);
    cpu.step().unwrap();

    cpu.step().unwrap();
    assert!(cpu.status.zero && cpu.status.carry);

    cpu.step().unwrap();
    assert!(!cpu.status.carry && cpu.status.negative && !cpu.status.zero);

    cpu.step().unwrap();
    assert!(cpu.status.carry && !cpu.status.zero);
}

#[test]
fn pha_pla_round_trip() {
    // LDA #$99; PHA; LDA #$00; PLA
    let mut cpu = run(&[0xA9, 0x99, 0x48, 0xA9, 0x00, 0x68]);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 3);
    assert_eq!(cpu.sp, 0xFC);
    assert_eq!(cpu.bus.mem[0x01FD], 0x99);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.a, 0x99);
    assert_eq!(cpu.sp, 0xFD);
    assert!(cpu.status.negative);
}

#[test]
fn php_sets_break_and_plp_drops_it() {
    // SEC; PHP; CLC; PLP
    let mut cpu = run(&[0x38, 0x08, 0x18, 0x28]);
    cpu.step().unwrap();
    cpu.step().unwrap();
    let pushed = cpu.bus.mem[0x01FD];
    let expected = FLAG_BREAK | FLAG_UNUSED | FLAG_CARRY;
    assert_eq!(pushed & expected, expected);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.status.carry);
    assert!(!cpu.status.brk);
}

#[test]
fn absolute_x_read_pays_for_page_cross() {
    let mut cpu = run(&[0xA2, 0x01, 0xBD, 0xFF, 0x80, 0xBD, 0x00, 0x80]);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 5); // $80FF + 1 crosses
    assert_eq!(cpu.step().unwrap(), 4);
}

#[test]
fn stores_never_pay_for_page_cross() {
    let mut cpu = run(&[0xA2, 0x01, 0x9D, 0xFF, 0x02, 0x9D, 0x00, 0x02]);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.step().unwrap(), 5);
}

#[test]
fn indirect_y_page_cross() {
    let mut bus = TestBus::with_program(&[0xA0, 0x01, 0xB1, 0x10, 0xB1, 0x20]);
    bus.load(0x0010, &[0xFF, 0x03]); // $03FF + 1 crosses
    bus.load(0x0020, &[0x00, 0x03]);
    bus.mem[0x0400] = 0x77;
    let mut cpu = new_cpu(bus);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.a, 0x77);
    assert_eq!(cpu.step().unwrap(), 5);
}

#[test]
fn branch_cycles() {
    // LDX #$00; BNE +2 (not taken); BEQ +0 (taken, same page)
    let mut cpu = run(&[0xA2, 0x00, 0xD0, 0x02, 0xF0, 0x00]);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 2);
    assert_eq!(cpu.pc, 0x8004);
    assert_eq!(cpu.step().unwrap(), 3);
    assert_eq!(cpu.pc, 0x8006);

    // taken across a page boundary
    let mut bus = TestBus::new();
    bus.load(0x80F0, &[0xA2, 0x00, 0xF0, 0x7F]);
    bus.mem[0xFFFC] = 0xF0;
    bus.mem[0xFFFD] = 0x80;
    let mut cpu = new_cpu(bus);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.pc, 0x80F4 + 0x7F);
}

#[test]
fn branch_backwards() {
    // LDX #$03; DEX; BNE -3
    let mut cpu = run(&[0xA2, 0x03, 0xCA, 0xD0, 0xFD]);
    for _ in 0..7 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.x, 0);
    assert!(cpu.status.zero);
    assert_eq!(cpu.pc, 0x8005);
}

#[test]
fn jsr_pushes_return_minus_one_and_rts_returns() {
    // JSR $9000 ... $9000: RTS
    let mut bus = TestBus::with_program(&[0x20, 0x00, 0x90, 0xEA]);
    bus.mem[0x9000] = 0x60;
    let mut cpu = new_cpu(bus);

    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.pc, 0x9000);
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x02);

    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.pc, 0x8003);
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn jmp_indirect_wraps_within_page() {
    let mut bus = TestBus::with_program(&[0x6C, 0xFF, 0x02]);
    bus.mem[0x02FF] = 0x34;
    bus.mem[0x0200] = 0x12;
    bus.mem[0x0300] = 0x56;
    let mut cpu = new_cpu(bus);
    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn zero_page_indexing_wraps() {
    let mut bus = TestBus::with_program(&[0xA2, 0x01, 0xB5, 0xFF, 0xA1, 0xFF]);
    bus.mem[0x0000] = 0x00; // pointer low for ($FF,X) -> $00/$01
    bus.mem[0x0001] = 0x03;
    bus.mem[0x0300] = 0x5A;
    let mut cpu = new_cpu(bus);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x00); // LDA $FF,X reads $00
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x5A);
}

#[test]
fn indirect_y_pointer_wraps_in_page_zero() {
    let mut bus = TestBus::with_program(&[0xB1, 0xFF]);
    bus.mem[0x00FF] = 0x00;
    bus.mem[0x0000] = 0x04;
    bus.mem[0x0100] = 0x09;
    bus.mem[0x0400] = 0x66;
    let mut cpu = new_cpu(bus);
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x66);
}

#[test]
fn read_modify_write_memory_and_accumulator() {
    // INC $10; ASL A (A=0x81); ROL $11 with carry set
    let mut bus = TestBus::with_program(&[0xE6, 0x10, 0xA9, 0x81, 0x0A, 0x26, 0x11]);
    bus.mem[0x0010] = 0xFF;
    bus.mem[0x0011] = 0x40;
    let mut cpu = new_cpu(bus);

    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.bus.mem[0x0010], 0x00);
    assert!(cpu.status.zero);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.a, 0x02);
    assert!(cpu.status.carry);

    cpu.step().unwrap();
    assert_eq!(cpu.bus.mem[0x0011], 0x81);
    assert!(!cpu.status.carry);
    assert!(cpu.status.negative);
}

#[test]
fn bit_copies_high_bits() {
    let mut bus = TestBus::with_program(&[0xA9, 0x01, 0x24, 0x10]);
    bus.mem[0x0010] = 0xC0;
    let mut cpu = new_cpu(bus);
    cpu.step().unwrap();
    cpu.step().unwrap();
    assert!(cpu.status.zero);
    assert!(cpu.status.overflow);
    assert!(cpu.status.negative);
}

#[test]
fn brk_pushes_pc_plus_two_and_rti_returns() {
    let mut bus = TestBus::with_program(&[0x00, 0xFF, 0xEA]);
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0x90;
    bus.mem[0x9000] = 0x40; // RTI
    let mut cpu = new_cpu(bus);
    cpu.status.interrupt_disable = false;

    assert_eq!(cpu.step().unwrap(), 7);
    assert_eq!(cpu.pc, 0x9000);
    assert!(cpu.status.interrupt_disable);
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x02);
    assert_ne!(cpu.bus.mem[0x01FB] & FLAG_BREAK, 0);

    assert_eq!(cpu.step().unwrap(), 6);
    assert_eq!(cpu.pc, 0x8002);
    assert!(!cpu.status.interrupt_disable);
}

#[test]
fn nmi_is_serviced_as_its_own_step() {
    let mut bus = TestBus::with_program(&[0xEA]);
    bus.mem[0xFFFA] = 0x00;
    bus.mem[0xFFFB] = 0xA0;
    let mut cpu = new_cpu(bus);
    cpu.interrupt_line().request_nmi();

    assert_eq!(cpu.step().unwrap(), 7);
    assert_eq!(cpu.pc, 0xA000);
    assert_eq!(cpu.pending_interrupt(), PendingInterrupt::None);
    assert!(cpu.status.interrupt_disable);
    // return address is the instruction that had not run yet
    assert_eq!(cpu.bus.mem[0x01FD], 0x80);
    assert_eq!(cpu.bus.mem[0x01FC], 0x00);
    let pushed = cpu.bus.mem[0x01FB];
    assert_eq!(pushed & FLAG_BREAK, 0);
    assert_ne!(pushed & FLAG_UNUSED, 0);
    assert_eq!(cpu.sp, 0xFA);
}

#[test]
fn irq_waits_for_interrupt_enable() {
    // NOP; CLI; NOP
    let mut bus = TestBus::with_program(&[0xEA, 0x58, 0xEA]);
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0xB0;
    let mut cpu = new_cpu(bus);
    cpu.request_irq();

    assert_eq!(cpu.step().unwrap(), 2);
    assert_eq!(cpu.pending_interrupt(), PendingInterrupt::Irq);
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 7);
    assert_eq!(cpu.pc, 0xB000);
}

#[test]
fn nmi_takes_priority_over_irq() {
    let mut bus = TestBus::with_program(&[0xEA]);
    bus.mem[0xFFFA] = 0x00;
    bus.mem[0xFFFB] = 0xA0;
    bus.mem[0xFFFE] = 0x00;
    bus.mem[0xFFFF] = 0xB0;
    let mut cpu = new_cpu(bus);
    cpu.status.interrupt_disable = false;
    cpu.request_irq();
    cpu.request_nmi();
    cpu.step().unwrap();
    assert_eq!(cpu.pc, 0xA000);
    assert_eq!(NMI_VECTOR, 0xFFFA);
    assert_eq!(IRQ_VECTOR, 0xFFFE);
}

#[test]
fn illegal_opcode_halts_until_reset() {
    let mut cpu = run(&[0x02]);
    assert_eq!(
        cpu.step(),
        Err(CpuError::IllegalOpcode {
            opcode: 0x02,
            pc: 0x8000
        })
    );
    assert!(cpu.halted);
    assert_eq!(cpu.step(), Err(CpuError::Halted { pc: 0x8000 }));

    cpu.reset().unwrap();
    assert!(!cpu.halted);
}

#[test]
fn unofficial_opcodes_fault_unless_enabled() {
    let mut bus = TestBus::with_program(&[0xA7, 0x10]); // LAX $10
    bus.mem[0x0010] = 0x3C;
    let mut cpu = new_cpu(bus);
    assert!(matches!(cpu.step(), Err(CpuError::IllegalOpcode { opcode: 0xA7, .. })));

    let mut bus = TestBus::with_program(&[0xA7, 0x10]);
    bus.mem[0x0010] = 0x3C;
    let mut cpu = CPU::new(bus, Config::default().with_unofficial_opcodes(true));
    cpu.reset().unwrap();
    assert_eq!(cpu.step().unwrap(), 3);
    assert_eq!((cpu.a, cpu.x), (0x3C, 0x3C));
}

#[test]
fn unofficial_read_modify_write_combos() {
    // LDA #$05; DCP $10 ($06 -> $05, compare equal); ISC $11 ($00 -> $01, A = 5 - 1 - 0)
    let mut bus = TestBus::with_program(&[0xA9, 0x05, 0xC7, 0x10, 0x38, 0xE7, 0x11, 0x87, 0x12]);
    bus.mem[0x0010] = 0x06;
    let mut cpu = CPU::new(bus, Config::default().with_unofficial_opcodes(true));
    cpu.reset().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 5);
    assert_eq!(cpu.bus.mem[0x0010], 0x05);
    assert!(cpu.status.zero && cpu.status.carry);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.bus.mem[0x0011], 0x01);
    assert_eq!(cpu.a, 0x04);

    // SAX $12 with X = 0
    cpu.step().unwrap();
    assert_eq!(cpu.bus.mem[0x0012], 0x00);
}

#[test]
fn every_opcode_advances_pc_by_its_length() {
    let config = Config::default().with_unofficial_opcodes(true);
    for op in OPCODES.iter().flatten() {
        if matches!(
            op.mnemonic,
            Mnemonic::Jmp | Mnemonic::Jsr | Mnemonic::Rts | Mnemonic::Rti | Mnemonic::Brk
        ) {
            continue;
        }
        // operand bytes are zero, so branches land on the next instruction either way
        let mut bus = TestBus::new();
        bus.mem[0x0400] = op.code;
        bus.mem[0xFFFC] = 0x00;
        bus.mem[0xFFFD] = 0x04;
        let mut cpu = CPU::new(bus, config);
        cpu.reset().unwrap();
        let cycles = cpu.step().unwrap();
        assert_eq!(
            cpu.pc,
            0x0400 + op.bytes as u16,
            "opcode {:02X} ({})",
            op.code,
            op.mnemonic.name()
        );
        assert!(cycles >= op.cycles as usize);
    }
}

#[test]
fn oam_dma_stall_is_charged_to_the_writing_instruction() {
    // STA $4014 at cycle 7: 4 + 513, odd total -> +1
    let mut cpu = run(&[0x8D, 0x14, 0x40, 0x8D, 0x14, 0x40]);
    assert_eq!(cpu.step().unwrap(), 4 + 513 + 1);
    assert_eq!(cpu.cycles, 7 + 518);
    // 525 + 4 is odd again
    assert_eq!(cpu.step().unwrap(), 4 + 513 + 1);
}

#[test]
fn oam_dma_stall_on_even_cycle_is_513() {
    // STA $00 (3) leaves the count at 10; 10 + 4 is even
    let mut cpu = run(&[0x85, 0x00, 0x8D, 0x14, 0x40]);
    assert_eq!(cpu.step().unwrap(), 3);
    assert_eq!(cpu.step().unwrap(), 4 + 513);
}

#[test]
fn trace_line_matches_nestest_layout() {
    let cpu = run(&[0xA9, 0x42]);
    let op = OPCODES[0xA9].as_ref();
    let plain = trace::line(&cpu, 0x8000, 0xA9, op, false);
    assert_eq!(plain, "8000  A9  LDA  A:00 X:00 Y:00 P:34 SP:FD CYC:7");

    let colored = trace::line(&cpu, 0x8000, 0xA9, op, true);
    assert!(colored.contains("\u{1b}["));
    assert!(colored.contains("LDA"));

    let unknown = trace::line(&cpu, 0x8000, 0x02, None, false);
    assert!(unknown.contains("???"));
}

/// Collects trace-level log lines emitted on the current test thread.
mod capture {
    use std::{cell::RefCell, sync::Once};

    thread_local! {
        static LINES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    struct Capture;

    impl log::Log for Capture {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() == log::Level::Trace
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                LINES.with(|lines| lines.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: Capture = Capture;
    static INIT: Once = Once::new();

    pub fn start() {
        INIT.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(log::LevelFilter::Trace);
        });
        LINES.with(|lines| lines.borrow_mut().clear());
    }

    pub fn take() -> Vec<String> {
        LINES.with(|lines| std::mem::take(&mut *lines.borrow_mut()))
    }
}

#[test]
fn trace_includes_the_faulting_opcode() {
    capture::start();
    let mut cpu = CPU::new(
        TestBus::with_program(&[0xEA, 0x02]),
        Config::default().with_trace(false),
    );
    cpu.reset().unwrap();
    cpu.step().unwrap();
    assert!(cpu.step().is_err());

    let lines = capture::take();
    assert_eq!(
        lines,
        vec![
            "8000  EA  NOP  A:00 X:00 Y:00 P:34 SP:FD CYC:7".to_string(),
            "8001  02  ???  A:00 X:00 Y:00 P:34 SP:FD CYC:9".to_string(),
        ]
    );
}

#[test]
fn disabled_unofficial_opcode_traces_as_unknown() {
    capture::start();
    let mut cpu = CPU::new(
        TestBus::with_program(&[0xA7, 0x10]),
        Config::default().with_trace(false),
    );
    cpu.reset().unwrap();
    assert!(matches!(cpu.step(), Err(CpuError::IllegalOpcode { opcode: 0xA7, .. })));
    let lines = capture::take();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("8000  A7  ???"));
}

#[test]
fn flags_from_status_byte() {
    let mut cpu = run(&[0xA9, 0x00]);
    cpu.step().unwrap();
    assert_ne!(cpu.status.pack() & FLAG_ZERO, 0);
    assert_eq!(cpu.status.pack() & FLAG_NEGATIVE, 0);
}
