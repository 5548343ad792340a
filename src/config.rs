//! Core configuration.
//!
//! Everything here is decided before the console powers up; nothing is read from files or the
//! environment. The host builds a [`Config`] and hands it to [`crate::console::Console::new`].

/// PPU dots between the NMI rising edge and the CPU seeing the request.
pub const DEFAULT_NMI_DELAY: u8 = 15;

/// Knobs for the CPU decoder, PPU NMI latency and instruction tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Decode the stable undocumented opcodes (LAX, SAX, DCP, ISC, SLO, RLA, SRE, RRA, the NOP
    /// family and SBC $EB). When false they fault exactly like unknown bytes.
    pub unofficial_opcodes: bool,
    /// Dots to wait after `nmiOutput && nmiOccurred` rises before requesting the NMI.
    pub nmi_delay: u8,
    /// Emit a nestest-style line through `log::trace!` for every instruction.
    pub trace: bool,
    /// Colorize trace lines (ANSI escapes).
    pub trace_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unofficial_opcodes: false,
            nmi_delay: DEFAULT_NMI_DELAY,
            trace: false,
            trace_color: false,
        }
    }
}

impl Config {
    pub fn with_unofficial_opcodes(mut self, enabled: bool) -> Self {
        self.unofficial_opcodes = enabled;
        self
    }

    pub fn with_nmi_delay(mut self, dots: u8) -> Self {
        self.nmi_delay = dots;
        self
    }

    /// Enable tracing; `color` picks ANSI-colored lines.
    pub fn with_trace(mut self, color: bool) -> Self {
        self.trace = true;
        self.trace_color = color;
        self
    }
}
