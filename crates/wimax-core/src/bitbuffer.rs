use std::cmp::min;
use std::fmt;

use crate::pdu_parse_error::PduParseErr;

/// MSB-first bit-level buffer backing every wire codec in the stack.
///
/// A single `pos` cursor is shared between reads and writes; map IEs and
/// MAC frames are built by appending and parsed by consuming from the front.
pub struct BitBuffer {
    buffer: Vec<u8>,
    pos: usize,         // next bit offset for read/write
    end: usize,         // bits at or after this are out of window
    autoexpand: bool,   // if true, writes past `end` grow the buffer
}

impl BitBuffer {
    /// Create a zeroed buffer holding exactly `len_bits` bits.
    pub fn new(len_bits: usize) -> Self {
        BitBuffer {
            buffer: vec![0; len_bits.div_ceil(8)],
            pos: 0,
            end: len_bits,
            autoexpand: false,
        }
    }

    /// Create an empty buffer with an initial capacity. Writes advance the
    /// end pointer and reallocate as needed.
    pub fn new_autoexpand(initial_cap_bits: usize) -> Self {
        BitBuffer {
            buffer: vec![0; initial_cap_bits.div_ceil(8)],
            pos: 0,
            end: 0,
            autoexpand: true,
        }
    }

    /// Wrap an existing byte-vector; all bits are initially readable.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len_bits = data.len() * 8;
        BitBuffer { buffer: data, pos: 0, end: len_bits, autoexpand: false }
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Construct directly from a string of '0'/'1' characters.
    /// Panics on any other character. Intended for tests.
    pub fn from_bitstr(bitstr: &str) -> Self {
        let mut buf = BitBuffer::new(bitstr.len());
        for c in bitstr.chars() {
            match c {
                '0' => buf.write_bit(0),
                '1' => buf.write_bit(1),
                other => panic!("from_bitstr: invalid character `{}`; only '0' or '1' allowed", other),
            }
        }
        buf.pos = 0;
        buf
    }

    /// Peek `num_bits` at the current pos without advancing.
    /// Returns None on overflow or if `num_bits > 64`.
    pub fn peek_bits(&self, num_bits: usize) -> Option<u64> {
        if num_bits > 64 || self.pos + num_bits > self.end {
            return None;
        }
        Some(self.read_bits_at_unchecked(self.pos, num_bits))
    }

    /// Peek `num_bits` at `offset` bits past the current pos, without advancing.
    pub fn peek_bits_at(&self, offset: usize, num_bits: usize) -> Option<u64> {
        if num_bits > 64 || self.pos + offset + num_bits > self.end {
            return None;
        }
        Some(self.read_bits_at_unchecked(self.pos + offset, num_bits))
    }

    /// Read `num_bits` at the current pos, advancing on success.
    pub fn read_bits(&mut self, num_bits: usize) -> Option<u64> {
        let v = self.peek_bits(num_bits)?;
        self.pos += num_bits;
        Some(v)
    }

    pub fn read_bit(&mut self) -> Option<u8> {
        self.read_bits(1).map(|v| v as u8)
    }

    /// Like read_bits, but returns PduParseErr::BufferEnded naming the field
    /// if not enough bits remain.
    pub fn read_field(&mut self, num_bits: usize, field: &'static str) -> Result<u64, PduParseErr> {
        self.read_bits(num_bits).ok_or(PduParseErr::BufferEnded { field: Some(field) })
    }

    /// Read `count` bytes at the current pos (must be byte-aligned reads of
    /// payload data; bit alignment of pos itself is not required).
    pub fn read_bytes(&mut self, count: usize) -> Option<Vec<u8>> {
        if self.pos + count * 8 > self.end {
            return None;
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_bits(8)? as u8);
        }
        Some(out)
    }

    fn grow_end(&mut self, extra_bits: usize) {
        let needed = self.end + extra_bits;
        if needed > self.buffer.len() * 8 {
            let new_cap_bits = usize::max(needed, self.buffer.len() * 8 * 2);
            self.buffer.resize(new_cap_bits.div_ceil(8), 0);
        }
        self.end = needed;
    }

    /// Write a single bit at pos.
    pub fn write_bit(&mut self, value: u8) {
        assert!(value <= 1, "write_bit: value must be 0 or 1");
        self.write_bits(value as u64, 1);
    }

    /// Write an arbitrary number of zero-bits.
    pub fn write_zeroes(&mut self, num_bits: usize) {
        let mut remaining = num_bits;
        while remaining > 0 {
            let chunk = min(remaining, 64);
            self.write_bits(0, chunk);
            remaining -= chunk;
        }
    }

    /// Write up to 64 bits, advancing pos.
    /// Panics if the value does not fit `num_bits`, or if the write would
    /// exceed the end of a fixed-size buffer.
    pub fn write_bits(&mut self, value: u64, num_bits: usize) {
        assert!(num_bits <= 64, "can only write up to 64 bits");
        assert!(num_bits == 64 || value >> num_bits == 0,
            "value exceeds num_bits {} {}", value, num_bits);

        if self.pos + num_bits > self.end {
            assert!(self.autoexpand, "write would exceed buffer end");
            let extra = self.pos + num_bits - self.end;
            self.grow_end(extra);
        }

        let mut remaining = num_bits;
        let mut cur = self.pos;

        // head bits up to the next byte boundary
        let head_offset = cur % 8;
        if head_offset != 0 && remaining > 0 {
            let h = min(remaining, 8 - head_offset);
            let bits = ((value >> (remaining - h)) as u8) & ((1 << h) - 1);
            let shift = 8 - (head_offset + h);
            let mask = (((1u16 << h) - 1) as u8) << shift;
            let byte = &mut self.buffer[cur / 8];
            *byte = (*byte & !mask) | (bits << shift);
            cur += h;
            remaining -= h;
        }

        // full bytes
        while remaining >= 8 {
            self.buffer[cur / 8] = ((value >> (remaining - 8)) & 0xFF) as u8;
            cur += 8;
            remaining -= 8;
        }

        // tail bits
        if remaining > 0 {
            let bits = (value as u8) & ((1 << remaining) - 1);
            let shift = 8 - (cur % 8 + remaining);
            let mask = (((1u16 << remaining) - 1) as u8) << shift;
            let byte = &mut self.buffer[cur / 8];
            *byte = (*byte & !mask) | (bits << shift);
        }

        self.pos += num_bits;
    }

    /// Append `count` bytes of payload data at pos.
    pub fn write_bytes(&mut self, data: &[u8]) {
        for b in data {
            self.write_bits(*b as u64, 8);
        }
    }

    /// Extract the internal byte-vector (including any unused trailing bits).
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Window length in bits.
    pub fn get_len(&self) -> usize {
        self.end
    }

    /// Bits left from pos to end.
    pub fn get_len_remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Bits consumed/written so far.
    pub fn get_pos(&self) -> usize {
        self.pos
    }

    /// Seek pos to an absolute bit offset.
    pub fn seek(&mut self, offset: usize) {
        assert!(offset <= self.end,
            "seek out of window: got {}, allowed [0,{}]", offset, self.end);
        self.pos = offset;
    }

    /// Move pos by `offset` bits (may be negative).
    pub fn seek_rel(&mut self, offset: isize) {
        let new_pos = self.pos as isize + offset;
        assert!(new_pos >= 0 && new_pos as usize <= self.end,
            "seek out of window: got {}, allowed [0,{}]", new_pos, self.end);
        self.pos = new_pos as usize;
    }

    /// Dump the window as an uppercase hex string, one digit per 4 bits.
    /// A partial trailing nibble is padded on the right with zeros.
    pub fn dump_hex(&self) -> String {
        let n_nibbles = self.end.div_ceil(4);
        let mut s = String::with_capacity(n_nibbles);
        for i in 0..n_nibbles {
            let bit_pos = i * 4;
            let take = min(4, self.end - bit_pos);
            let v = self.read_bits_at_unchecked(bit_pos, take) as u8;
            let digit = if take < 4 { v << (4 - take) } else { v };
            s.push_str(&format!("{:X}", digit));
        }
        s
    }

    /// Dump the window as a '0'/'1' string with a ^ marker before pos.
    pub fn dump_bin(&self) -> String {
        let mut s = String::with_capacity(self.end + 1);
        for i in 0..self.end {
            if i == self.pos {
                s.push('^');
            }
            let bit = self.read_bits_at_unchecked(i, 1) != 0;
            s.push(if bit { '1' } else { '0' });
        }
        if self.pos == self.end {
            s.push('^');
        }
        s
    }

    /// Reads exactly `num_bits` starting at `bit_pos` as the low bits of a
    /// u64. Caller must ensure `num_bits <= 64` and `bit_pos + num_bits <= end`.
    fn read_bits_at_unchecked(&self, mut bit_pos: usize, num_bits: usize) -> u64 {
        let mut result = 0u64;
        let mut remaining = num_bits;

        // head bits to align to the next byte
        let head = bit_pos % 8;
        if head != 0 && remaining > 0 {
            let take = min(8 - head, remaining);
            let byte = self.buffer[bit_pos / 8];
            let shift = 8 - head - take;
            result = ((byte >> shift) & ((1 << take) - 1)) as u64;
            bit_pos += take;
            remaining -= take;
        }

        // full bytes
        while remaining >= 8 {
            result = (result << 8) | self.buffer[bit_pos / 8] as u64;
            bit_pos += 8;
            remaining -= 8;
        }

        // tail bits
        if remaining > 0 {
            let byte = self.buffer[bit_pos / 8];
            let shift = 8 - (bit_pos % 8) - remaining;
            result = (result << remaining) | ((byte >> shift) & ((1 << remaining) - 1)) as u64;
        }

        result
    }
}

impl fmt::Debug for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitBuffer {{ ^{} >{} {} }}", self.pos, self.end, self.dump_bin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_byte_read_write() {
        let mut bb = BitBuffer::new(16);
        bb.write_bits(0xAB, 8);
        bb.write_bits(0xCD, 8);
        bb.seek(0);
        assert_eq!(bb.read_bits(8).unwrap(), 0xAB);
        assert_eq!(bb.read_bits(8).unwrap(), 0xCD);
    }

    #[test]
    fn test_partial_boundary_read_write() {
        let mut bb = BitBuffer::new(16);
        bb.write_bits(0xA, 4);
        bb.write_bits(0x5, 4);
        bb.write_bits(0xFF, 8);
        bb.seek(0);
        assert_eq!(bb.read_bits(4).unwrap(), 0xA);
        assert_eq!(bb.read_bits(4).unwrap(), 0x5);
        assert_eq!(bb.read_bits(8).unwrap(), 0xFF);
    }

    #[test]
    fn test_unaligned_read_write_across_bytes() {
        let mut bb = BitBuffer::new(48);
        bb.seek(5);
        let pattern: u64 = 0b10_1010_1111_0001_0010;
        bb.write_bits(pattern, 20);
        bb.seek(5);
        assert_eq!(bb.read_bits(20).unwrap(), pattern);
    }

    #[test]
    fn test_read_overflow() {
        let mut bb = BitBuffer::new(10);
        assert!(bb.read_bits(11).is_none());
        assert_eq!(bb.read_bits(0).unwrap(), 0);
    }

    #[test]
    #[should_panic(expected = "write would exceed buffer end")]
    fn test_write_overflow() {
        let mut bb = BitBuffer::new(10);
        bb.write_bits(1, 11);
    }

    #[test]
    #[should_panic(expected = "value exceeds num_bits")]
    fn test_value_above_num_bits() {
        let mut bb = BitBuffer::new(4);
        bb.write_bits(0b11111, 4);
    }

    #[test]
    fn test_write_autoexpand() {
        let mut bb = BitBuffer::new_autoexpand(10);
        bb.write_bits(1, 5);
        assert_eq!(bb.get_pos(), 5);
        assert_eq!(bb.get_len(), 5);
        bb.write_bits(1, 60);
        assert_eq!(bb.get_pos(), 65);
        assert_eq!(bb.get_len(), 65);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut bb = BitBuffer::from_bitstr("10110110");
        let p = bb.peek_bits(4).unwrap();
        assert_eq!(p, 0b1011);
        assert_eq!(bb.get_pos(), 0);
        assert_eq!(bb.read_bits(4).unwrap(), p);
        assert_eq!(bb.get_pos(), 4);
    }

    #[test]
    fn test_peek_bits_at() {
        let mut bb = BitBuffer::from_bitstr("1010101111001101");
        bb.seek(5);
        assert_eq!(bb.peek_bits_at(0, 6).unwrap(), 0b011110);
        assert_eq!(bb.peek_bits_at(6, 4).unwrap(), 0b0110);
        assert_eq!(bb.get_pos(), 5);
        assert!(bb.peek_bits_at(8, 4).is_none());
    }

    #[test]
    fn test_read_write_bytes() {
        let mut bb = BitBuffer::new(40);
        bb.write_bits(0b101, 3);
        bb.write_bytes(&[0xDE, 0xAD, 0xBE]);
        bb.seek(3);
        assert_eq!(bb.read_bytes(3).unwrap(), vec![0xDE, 0xAD, 0xBE]);
    }

    #[test]
    fn test_read_field_error() {
        let mut bb = BitBuffer::new(4);
        assert_eq!(
            bb.read_field(8, "cid"),
            Err(PduParseErr::BufferEnded { field: Some("cid") })
        );
    }

    #[test]
    fn test_dump_hex() {
        let bb = BitBuffer::from_vec(vec![0xAB, 0xCD]);
        assert_eq!(bb.dump_hex(), "ABCD");
    }

    #[test]
    fn test_dump_bin_marker() {
        let mut bb = BitBuffer::from_vec(vec![0xA0]);
        bb.seek(3);
        assert_eq!(bb.dump_bin(), "101^00000");
    }
}
