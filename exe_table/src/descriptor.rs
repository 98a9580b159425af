use exe_index::EntityID;

use crate::{ENTRY_LEN, NAME_LEN};

/// Lookup table entry for one file of the `DATA` directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    id: EntityID,
    name: String,
    address: u32,
    size: u32,
}

impl EntityDescriptor {
    pub(crate) fn new(id: EntityID, name: String, address: u32, size: u32) -> Self {
        debug_assert!(name.is_ascii() && name.len() <= NAME_LEN);
        Self {
            id,
            name,
            address,
            size,
        }
    }

    pub fn id(&self) -> EntityID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Name padded with NUL to `NAME_LEN`, then big endian address and size
    pub fn to_bytes(&self) -> [u8; ENTRY_LEN] {
        let mut bytes = [0u8; ENTRY_LEN];
        bytes[..self.name.len()].copy_from_slice(self.name.as_bytes());
        bytes[NAME_LEN..NAME_LEN + 4].copy_from_slice(&self.address.to_be_bytes());
        bytes[NAME_LEN + 4..].copy_from_slice(&self.size.to_be_bytes());
        bytes
    }

    /// Decode a serialized entry. Returns `None` for an unused (all zero)
    /// slot or a name which is not ASCII.
    pub fn from_bytes(id: EntityID, bytes: &[u8; ENTRY_LEN]) -> Option<Self> {
        if bytes.iter().all(|b| *b == 0) {
            return None;
        }

        let name = &bytes[..NAME_LEN];
        let end = name.iter().position(|b| *b == 0).unwrap_or(NAME_LEN);
        let name = std::str::from_utf8(&name[..end]).ok()?;
        if !name.is_ascii() {
            return None;
        }

        let mut address = [0u8; 4];
        address.copy_from_slice(&bytes[NAME_LEN..NAME_LEN + 4]);
        let mut size = [0u8; 4];
        size.copy_from_slice(&bytes[NAME_LEN + 4..]);

        Some(Self {
            id,
            name: name.to_owned(),
            address: u32::from_be_bytes(address),
            size: u32::from_be_bytes(size),
        })
    }
}
