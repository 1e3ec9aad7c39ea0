use crate::error::ParseError;

/// Width of a length prefix preceding a variable-sized field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenWidth {
    One,
    Two,
}

/// Bounds-checked, forward-only reader over a byte slice.
///
/// All ClientHello decoding goes through this type; there is no manual index
/// arithmetic anywhere above it. Any read that would pass the end of the
/// slice returns [`ParseError::Underrun`] and the caller must abort; the
/// cursor position is unspecified after an error.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if n > self.remaining() {
            return Err(ParseError::Underrun {
                requested: n,
                available: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        self.read_bytes(n).map(|_| ())
    }

    /// Reads a length field of the given width, then returns a sub-cursor
    /// over exactly that many payload bytes, advancing this cursor past both.
    pub fn read_length_prefixed(&mut self, width: LenWidth) -> Result<ByteCursor<'a>, ParseError> {
        let len = match width {
            LenWidth::One => usize::from(self.read_u8()?),
            LenWidth::Two => usize::from(self.read_u16()?),
        };
        let payload = self.read_bytes(len)?;
        Ok(ByteCursor::new(payload))
    }

    /// Like [`read_length_prefixed`](Self::read_length_prefixed) but yields
    /// the raw payload slice.
    pub fn read_length_prefixed_bytes(&mut self, width: LenWidth) -> Result<&'a [u8], ParseError> {
        let len = match width {
            LenWidth::One => usize::from(self.read_u8()?),
            LenWidth::Two => usize::from(self.read_u16()?),
        };
        self.read_bytes(len)
    }

    /// Skips a length field of the given width plus the payload it declares.
    pub fn skip_length_prefixed(&mut self, width: LenWidth) -> Result<(), ParseError> {
        self.read_length_prefixed_bytes(width).map(|_| ())
    }

    /// Drains the rest of this cursor as big-endian u16 values.
    pub fn read_u16_list(&mut self) -> Result<Vec<u16>, ParseError> {
        let mut out = Vec::with_capacity(self.remaining() / 2);
        while !self.is_empty() {
            out.push(self.read_u16()?);
        }
        Ok(out)
    }

    /// Drains the rest of this cursor as single bytes.
    pub fn read_u8_list(&mut self) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::with_capacity(self.remaining());
        while !self.is_empty() {
            out.push(self.read_u8()?);
        }
        Ok(out)
    }
}
