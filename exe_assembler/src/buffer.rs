use crate::{ImageError, ImageResult};

/// Growable byte sequence the image is serialized into
#[derive(Debug, Default, Clone)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
}

impl ImageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn put_zeroes(&mut self, count: usize) {
        self.bytes.resize(self.bytes.len() + count, 0);
    }

    pub fn put_u32_be(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn expect_offset(&self, offset: usize, stage: &'static str) -> ImageResult<()> {
        if self.bytes.len() == offset {
            Ok(())
        } else {
            Err(ImageError::Serialization {
                field: stage,
                reason: format!(
                    "ends at {:#x} instead of {:#x}",
                    self.bytes.len(),
                    offset
                ),
            })
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
