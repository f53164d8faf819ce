//! Variable-width LZW decompression of GIF image data.

use crate::{Error, Result};

const MAX_CODE_SIZE: u8 = 12;
const MAX_CODES: usize = 1 << MAX_CODE_SIZE;

/// Reads LSB-first codes of varying width out of a byte slice.
struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    buffer: u32,
    bits: u8,
}

impl<'a> BitReader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            buffer: 0,
            bits: 0,
        }
    }

    /// Returns `None` once the data runs out.
    fn read_bits(&mut self, n: u8) -> Option<u16> {
        while self.bits < n {
            let byte = *self.data.get(self.position)?;
            self.position += 1;
            self.buffer |= u32::from(byte) << self.bits;
            self.bits += 8;
        }

        let value = (self.buffer & ((1 << n) - 1)) as u16;
        self.buffer >>= n;
        self.bits -= n;

        Some(value)
    }
}

/// Decompresses the code stream of a single image block into palette indices.
pub(crate) struct LzwDecoder {
    min_code_size: u8,
    clear_code: u16,
    end_code: u16,
    code_size: u8,
    next_code: u16,
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    length: Vec<u16>,
}

impl LzwDecoder {
    /// Creates a decoder for the given minimum code size, which is the byte right before the
    /// image data sub-blocks.
    pub fn new(min_code_size: u8) -> Result<Self> {
        if !(1..MAX_CODE_SIZE).contains(&min_code_size) {
            return Err(Error::DecodingError(format!(
                "invalid LZW minimum code size {min_code_size}"
            )));
        }

        let clear_code = 1u16 << min_code_size;
        let mut suffix = vec![0; MAX_CODES];
        let mut length = vec![0; MAX_CODES];

        for literal in 0..clear_code {
            suffix[literal as usize] = literal as u8;
            length[literal as usize] = 1;
        }

        Ok(Self {
            min_code_size,
            clear_code,
            end_code: clear_code + 1,
            code_size: min_code_size + 1,
            next_code: clear_code + 2,
            prefix: vec![0; MAX_CODES],
            suffix,
            length,
        })
    }

    fn reset(&mut self) {
        self.code_size = self.min_code_size + 1;
        self.next_code = self.end_code + 1;
    }

    fn add_entry(&mut self, prefix: u16, suffix: u8) {
        // The table stays frozen once full, until the encoder sends a clear code.
        if self.next_code as usize >= MAX_CODES {
            return;
        }

        let code = self.next_code as usize;
        self.prefix[code] = prefix;
        self.suffix[code] = suffix;
        self.length[code] = self.length[prefix as usize] + 1;
        self.next_code += 1;

        if self.next_code >= 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
            self.code_size += 1;
        }
    }

    /// Appends the string represented by `code` to `out`, returning its first byte.
    fn write_string(&self, code: u16, out: &mut Vec<u8>) -> u8 {
        let start = out.len();
        let len = self.length[code as usize] as usize;
        out.resize(start + len, 0);

        let mut current = code;
        for slot in out[start..].iter_mut().rev() {
            *slot = self.suffix[current as usize];
            current = self.prefix[current as usize];
        }

        out[start]
    }

    /// Decodes exactly `expected` indices out of `data`. Data past that point is ignored.
    ///
    /// # Errors
    /// * `TruncatedData`: The end code or the end of `data` came first.
    /// * `InvalidLzwCode`: A code referred to a table entry that does not exist yet.
    pub fn decode(&mut self, data: &[u8], expected: usize) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(data);
        let mut out = Vec::with_capacity(expected);
        let mut previous: Option<u16> = None;

        self.reset();

        while out.len() < expected {
            let code = reader
                .read_bits(self.code_size)
                .ok_or(Error::TruncatedData("LZW image data"))?;

            if code == self.clear_code {
                self.reset();
                previous = None;
                continue;
            }
            if code == self.end_code {
                break;
            }

            let Some(prev) = previous else {
                // After a clear, only literals are valid.
                if code >= self.clear_code {
                    return Err(Error::InvalidLzwCode {
                        code,
                        table_size: self.next_code,
                    });
                }

                out.push(code as u8);
                previous = Some(code);
                continue;
            };

            if code < self.next_code {
                let first = self.write_string(code, &mut out);
                self.add_entry(prev, first);
            } else if code == self.next_code {
                // KwKwK: the code is being defined by this very step.
                let first = self.write_string(prev, &mut out);
                out.push(first);
                self.add_entry(prev, first);
            } else {
                return Err(Error::InvalidLzwCode {
                    code,
                    table_size: self.next_code,
                });
            }

            previous = Some(code);
        }

        if out.len() < expected {
            return Err(Error::TruncatedData("LZW image data"));
        }
        out.truncate(expected);

        Ok(out)
    }
}
