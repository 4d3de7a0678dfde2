use super::error::RecordError;

pub struct RecordReader<'a> {
    payload: &'a [u8],
}

impl<'a> RecordReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), RecordError> {
        if self.payload.len() < needed {
            return Err(RecordError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, RecordError> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(RecordError::TooShort {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], RecordError> {
        self.payload
            .get(range.clone())
            .ok_or(RecordError::TooShort {
                needed: range.end,
                actual: self.payload.len(),
            })
    }

    /// Read a fixed-width ASCII field as text, without trimming.
    ///
    /// The link is 7-bit; anything outside printable ASCII is replaced
    /// rather than rejected, so a garbled field still surfaces as text.
    pub fn read_ascii(&self, range: std::ops::Range<usize>) -> Result<String, RecordError> {
        let bytes = self.read_slice(range)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a fixed-width ASCII field with surrounding spaces trimmed.
    pub fn read_ascii_trimmed(
        &self,
        range: std::ops::Range<usize>,
    ) -> Result<String, RecordError> {
        let text = self.read_ascii(range)?;
        Ok(text.trim_matches(' ').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::RecordReader;

    #[test]
    fn read_ascii_trimmed_strips_padding() {
        let reader = RecordReader::new(b"DC   1.05V   \r");
        assert_eq!(reader.read_ascii_trimmed(0..3).unwrap(), "DC");
        assert_eq!(reader.read_ascii_trimmed(9..13).unwrap(), "V");
    }

    #[test]
    fn read_slice_out_of_bounds() {
        let reader = RecordReader::new(b"DC ");
        let err = reader.read_slice(0..14).unwrap_err();
        assert!(err.to_string().contains("record too short"));
    }
}
