//! Little-endian packing helpers for the token wire format.

use std::collections::BTreeMap;

use crate::token::TokenError;

#[derive(Default)]
pub(crate) struct Packer {
    buf: Vec<u8>,
}

impl Packer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Length-prefixed byte string (`u16` length).
    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, TokenError> {
        let len = u16::try_from(bytes.len()).map_err(|_| TokenError::FieldTooLong(bytes.len()))?;
        self.put_u16(len);
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    /// `u16` count followed by `(u16 key, u32 value)` pairs in key order.
    pub(crate) fn put_privileges(
        &mut self,
        map: &BTreeMap<u16, u32>,
    ) -> Result<&mut Self, TokenError> {
        let len = u16::try_from(map.len()).map_err(|_| TokenError::FieldTooLong(map.len()))?;
        self.put_u16(len);
        for (k, v) in map {
            self.put_u16(*k).put_u32(*v);
        }
        Ok(self)
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

pub(crate) struct Unpacker<'a> {
    buf: &'a [u8],
}

impl<'a> Unpacker<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TokenError> {
        if self.buf.len() < n {
            return Err(TokenError::InvalidFormat);
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn get_u16(&mut self) -> Result<u16, TokenError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn get_u32(&mut self) -> Result<u32, TokenError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn get_bytes(&mut self) -> Result<&'a [u8], TokenError> {
        let len = self.get_u16()? as usize;
        self.take(len)
    }

    pub(crate) fn get_privileges(&mut self) -> Result<BTreeMap<u16, u32>, TokenError> {
        let count = self.get_u16()?;
        let mut map = BTreeMap::new();
        for _ in 0..count {
            let k = self.get_u16()?;
            let v = self.get_u32()?;
            map.insert(k, v);
        }
        Ok(map)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
