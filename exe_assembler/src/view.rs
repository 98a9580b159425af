use exe_index::EntityID;
use exe_table::{EntityDescriptor, ENTRY_LEN, TABLE_CAPACITY};

use crate::header::{ImageHeader, HEADER_LEN};
use crate::{Assembler, ImageError, ImageResult};

/// Decoded view over the bytes of a built image
#[derive(Debug)]
pub struct ImageView<'a> {
    pub header: ImageHeader,
    pub entries: Vec<EntityDescriptor>,
    pub code: &'a [u8],
}

impl<'a> ImageView<'a> {
    pub fn parse(bytes: &'a [u8]) -> ImageResult<ImageView<'a>> {
        let header = ImageHeader::parse(bytes)?;

        let code_offset = Assembler::<()>::CODE_OFFSET;
        if bytes.len() < code_offset {
            return Err(ImageError::Malformed {
                reason: format!("{:#x} bytes is shorter than the code offset", bytes.len()),
            });
        }

        let table = &bytes[HEADER_LEN..HEADER_LEN + TABLE_CAPACITY];
        let mut entries = Vec::new();
        for (i, slot) in table.chunks_exact(ENTRY_LEN).enumerate() {
            let mut raw = [0u8; ENTRY_LEN];
            raw.copy_from_slice(slot);
            match EntityDescriptor::from_bytes(EntityID::new(i), &raw) {
                Some(entry) => entries.push(entry),
                None => break,
            }
        }

        let used = entries.len() * ENTRY_LEN;
        if bytes[HEADER_LEN + used..code_offset].iter().any(|b| *b != 0) {
            return Err(ImageError::Malformed {
                reason: "non zero bytes after the last table entry".to_string(),
            });
        }

        let code = &bytes[code_offset..];
        if code.len() != header.code_sz as usize {
            return Err(ImageError::Malformed {
                reason: format!(
                    "CODE_SZ is {:#x} but {:#x} code bytes follow the table",
                    header.code_sz,
                    code.len()
                ),
            });
        }

        Ok(ImageView {
            header,
            entries,
            code,
        })
    }

    pub fn entry(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Sum of the entry sizes, equal to `DATA_SZ` for a well formed image
    pub fn entries_total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size() as u64).sum()
    }
}
