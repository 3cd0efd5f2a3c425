// Little-endian output sink the codecs write packed binary into.
// The codecs only ever write; `position` exists for alignment bookkeeping.

pub trait BinarySink {
    fn write_u8(&mut self, v: u8);
    fn write_bytes(&mut self, data: &[u8]);
    /// Pads with zero bytes up to the next 4-byte boundary.
    fn align(&mut self);
    fn position(&self) -> usize;

    fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }
    fn write_i8(&mut self, v: i8) {
        self.write_u8(v as u8);
    }
    fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }
    fn write_i16(&mut self, v: i16) {
        self.write_bytes(&v.to_le_bytes());
    }
    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }
    fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }
    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }
    fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }
    fn write_f32(&mut self, v: f32) {
        self.write_bytes(&v.to_bits().to_le_bytes());
    }
    fn write_f64(&mut self, v: f64) {
        self.write_bytes(&v.to_bits().to_le_bytes());
    }
    /// `i32` byte count followed by the UTF-8 bytes. No alignment.
    fn write_string(&mut self, s: &str) {
        self.write_i32(s.len() as i32);
        self.write_bytes(s.as_bytes());
    }
}

#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    out: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::with_capacity(1024),
        }
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

impl BinarySink for ByteWriter {
    fn write_u8(&mut self, v: u8) {
        self.out.push(v);
    }
    fn write_bytes(&mut self, data: &[u8]) {
        self.out.extend_from_slice(data);
    }
    fn align(&mut self) {
        let pad = (4 - self.out.len() % 4) % 4;
        self.out.resize(self.out.len() + pad, 0);
    }
    fn position(&self) -> usize {
        self.out.len()
    }
}
