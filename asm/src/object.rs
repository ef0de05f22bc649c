use std::io::Write;

use crate::error::Error;

/// First word of every object file.
pub const MAGIC: u32 = 0x3130_3636;

/// Annotation word written before each block's frame size.
pub const ANNOTATION: u32 = 2;

/// A block after pass 2, ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedBlock {
    pub name: String,
    /// Statements carrying an instruction or directive.
    pub length: u32,
    pub words: Vec<u32>,
    /// `(start, end, handle)` byte addresses.
    pub handlers: Vec<(u32, u32, u32)>,
}

/// Serializes the object file. Words go out most-significant byte first.
pub struct ObjectWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> ObjectWriter<W> {
    pub fn new(out: W) -> Self {
        ObjectWriter { out, written: 0 }
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.out.flush()?;
        Ok(())
    }

    fn bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.out.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    pub fn word(&mut self, word: u32) -> Result<(), Error> {
        self.bytes(&word.to_be_bytes())
    }

    /// NUL-terminated name.
    pub fn name(&mut self, name: &str) -> Result<(), Error> {
        self.bytes(name.as_bytes())?;
        self.bytes(&[0])
    }

    pub fn header(&mut self, block_count: u32) -> Result<(), Error> {
        self.word(MAGIC)?;
        self.word(block_count)
    }

    pub fn block(&mut self, block: &EncodedBlock) -> Result<(), Error> {
        self.name(&block.name)?;
        self.word(ANNOTATION)?;
        // frame size
        self.word(0)?;
        self.word(block.length.saturating_mul(4))?;
        for &word in &block.words {
            self.word(word)?;
        }
        self.word(block.handlers.len() as u32)?;
        for &(start, end, handle) in &block.handlers {
            self.word(start)?;
            self.word(end)?;
            self.word(handle)?;
        }
        for _ in 0..3 {
            self.word(0)?;
        }
        Ok(())
    }
}
