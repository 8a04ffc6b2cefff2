//! Big-endian read/write primitives shared by the version modules.

use byteorder::{BigEndian, ByteOrder};

use crate::error::CodecError;

pub(crate) fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub(crate) fn put_u16(buf: &mut Vec<u8>, v: u16) {
    let mut tmp = [0u8; 2];
    BigEndian::write_u16(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub(crate) fn put_u32(buf: &mut Vec<u8>, v: u32) {
    let mut tmp = [0u8; 4];
    BigEndian::write_u32(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub(crate) fn put_u64(buf: &mut Vec<u8>, v: u64) {
    let mut tmp = [0u8; 8];
    BigEndian::write_u64(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

pub(crate) fn pad(buf: &mut Vec<u8>, n: usize) {
    buf.extend(std::iter::repeat(0u8).take(n));
}

/// Prepends the common OpenFlow header once the body length is known.
pub(crate) fn header(version: u8, msg_type: u8, length: u16, xid: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(length as usize);
    put_u8(&mut buf, version);
    put_u8(&mut buf, msg_type);
    put_u16(&mut buf, length);
    put_u32(&mut buf, xid);
    buf
}

/// Bounds-checked cursor over a byte slice.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, pos: 0, what }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                what: self.what,
                need: self.pos + n,
                have: self.buf.len(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, CodecError> {
        self.take(1).map(|b| b[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, CodecError> {
        self.take(2).map(BigEndian::read_u16)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, CodecError> {
        self.take(4).map(BigEndian::read_u32)
    }

    pub(crate) fn mac(&mut self) -> Result<[u8; 6], CodecError> {
        self.take(6).map(|b| {
            let mut mac = [0u8; 6];
            mac.copy_from_slice(b);
            mac
        })
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.take(n)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), CodecError> {
        self.take(n).map(|_| ())
    }
}
