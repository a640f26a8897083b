//! ZX Spectrum 128 AY port plumbing.
//!
//! [`SpectrumPortBus`] turns register writes into the `OUT` pairs a Spectrum
//! driver issues, and [`AyPortDecoder`] decodes such port writes back into
//! register writes using the partial address decoding of the 128K machines.

use crate::registers::RegisterSink;

/// Register select port.
pub const ZX_SELECT_PORT: u16 = 0xFFFD;
/// Register data port.
pub const ZX_DATA_PORT: u16 = 0xBFFD;

const ZX_PORT_MASK: u16 = 0xC002;
const ZX_SELECT_DECODE: u16 = 0xC000;
const ZX_DATA_DECODE: u16 = 0x8000;

/// Receiver of Z80 `OUT` instructions.
pub trait PortWriter {
    /// Write `value` to I/O `port`.
    fn port_out(&mut self, port: u16, value: u8);
}

/// Records every port write in order.
impl PortWriter for Vec<(u16, u8)> {
    fn port_out(&mut self, port: u16, value: u8) {
        self.push((port, value));
    }
}

/// Register sink that emits select/data port writes.
#[derive(Debug, Clone, Default)]
pub struct SpectrumPortBus<P> {
    ports: P,
}

impl<P: PortWriter> SpectrumPortBus<P> {
    /// Wrap a port writer.
    pub fn new(ports: P) -> Self {
        Self { ports }
    }

    /// Underlying port writer.
    pub fn ports(&self) -> &P {
        &self.ports
    }

    /// Unwrap the port writer.
    pub fn into_inner(self) -> P {
        self.ports
    }
}

impl<P: PortWriter> RegisterSink for SpectrumPortBus<P> {
    fn write_register(&mut self, register: u8, value: u8) {
        self.ports.port_out(ZX_SELECT_PORT, register);
        self.ports.port_out(ZX_DATA_PORT, value);
    }
}

/// Port writer that decodes AY accesses into a register sink.
#[derive(Debug, Clone, Default)]
pub struct AyPortDecoder<S> {
    selected_register: u8,
    sink: S,
}

impl<S: RegisterSink> AyPortDecoder<S> {
    /// Decoder feeding `sink`, with register 0 selected.
    pub fn new(sink: S) -> Self {
        Self {
            selected_register: 0,
            sink,
        }
    }

    /// Currently latched register.
    pub fn selected_register(&self) -> u8 {
        self.selected_register
    }

    /// Sink receiving decoded writes.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Unwrap the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: RegisterSink> PortWriter for AyPortDecoder<S> {
    fn port_out(&mut self, port: u16, value: u8) {
        match port & ZX_PORT_MASK {
            ZX_SELECT_DECODE => self.selected_register = value & 0x0F,
            ZX_DATA_DECODE => self.sink.write_register(self.selected_register, value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::ChipRegisters;

    #[test]
    fn bus_emits_select_then_data() {
        let mut bus = SpectrumPortBus::new(Vec::<(u16, u8)>::new());
        bus.write_register(7, 0x38);
        assert_eq!(bus.into_inner(), [(0xFFFD, 7), (0xBFFD, 0x38)]);
    }

    #[test]
    fn decoder_uses_partial_address_decoding() {
        let mut decoder = AyPortDecoder::new(ChipRegisters::new());
        decoder.port_out(0xFFFD, 3);
        decoder.port_out(0xBFFD, 0x0a);
        // mirrors: only A15, A14 and A1 are decoded
        decoder.port_out(0xC0FD, 8);
        decoder.port_out(0x80FD, 0x0f);
        decoder.port_out(0x7FFD, 0x10);
        decoder.port_out(0xFFFF, 9);

        let frame = decoder.sink().frame();
        assert_eq!(frame[3], 0x0a);
        assert_eq!(frame[8], 0x0f);
        assert_eq!(decoder.selected_register(), 8);
    }

    #[test]
    fn bus_into_decoder_round_trips() {
        let mut bus = SpectrumPortBus::new(AyPortDecoder::new(Vec::<(u8, u8)>::new()));
        bus.write_register(13, 0x0e);
        bus.write_register(0, 0xf0);
        assert_eq!(bus.into_inner().into_inner(), [(13, 0x0e), (0, 0xf0)]);
    }
}
