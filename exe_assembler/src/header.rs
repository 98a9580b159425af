use crate::buffer::ImageBuffer;
use crate::{ImageError, ImageResult};

pub const MAGIC_BYTES: &[u8; 4] = b".EXE";

/// Size of the fixed header region
pub const HEADER_LEN: usize = 0x100;

pub const CODE_AD_OFFSET: usize = 0x10;
pub const CODE_SZ_OFFSET: usize = 0x14;
pub const DATA_AD_OFFSET: usize = 0x20;
pub const DATA_SZ_OFFSET: usize = 0x24;

/// Address and size fields of the image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub code_ad: u32,
    pub code_sz: u32,
    pub data_ad: u32,
    pub data_sz: u32,
}

impl ImageHeader {
    pub fn write_to(&self, buffer: &mut ImageBuffer) -> ImageResult<()> {
        let start = buffer.len();

        buffer.put_bytes(MAGIC_BYTES);
        buffer.put_zeroes(CODE_AD_OFFSET - MAGIC_BYTES.len());
        buffer.put_u32_be(self.code_ad);
        buffer.put_u32_be(self.code_sz);
        buffer.put_zeroes(DATA_AD_OFFSET - (CODE_SZ_OFFSET + 4));
        buffer.put_u32_be(self.data_ad);
        buffer.put_u32_be(self.data_sz);
        buffer.put_zeroes(HEADER_LEN - (DATA_SZ_OFFSET + 4));

        buffer.expect_offset(start + HEADER_LEN, "header")
    }

    pub fn parse(bytes: &[u8]) -> ImageResult<ImageHeader> {
        if bytes.len() < HEADER_LEN {
            return Err(ImageError::Malformed {
                reason: format!("{:#x} bytes is shorter than the header", bytes.len()),
            });
        }

        if &bytes[..MAGIC_BYTES.len()] != MAGIC_BYTES {
            return Err(ImageError::Malformed {
                reason: format!("bad magic {:02X?}", &bytes[..MAGIC_BYTES.len()]),
            });
        }

        let field = |offset: usize| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&bytes[offset..offset + 4]);
            u32::from_be_bytes(word)
        };

        Ok(ImageHeader {
            code_ad: field(CODE_AD_OFFSET),
            code_sz: field(CODE_SZ_OFFSET),
            data_ad: field(DATA_AD_OFFSET),
            data_sz: field(DATA_SZ_OFFSET),
        })
    }
}
