use std::{
    error::Error,
    path::{Path, PathBuf},
};

use exe_index::EntityID;
use log::info;

pub mod descriptor;

pub use descriptor::EntityDescriptor;

pub type TableResult<T> = Result<T, TableError>;

/// Fixed size of the lookup table in bytes, entries included
pub const TABLE_CAPACITY: usize = 0x1C2;
/// Length of the NUL padded name field
pub const NAME_LEN: usize = 10;
/// Length of one serialized entry: name, address and size
pub const ENTRY_LEN: usize = NAME_LEN + 4 + 4;
/// Number of entries which fit in the table
pub const MAX_ENTRIES: usize = TABLE_CAPACITY / ENTRY_LEN;

/// Order in which the files of the `DATA` directory receive addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityOrder {
    /// Ascending by file name bytes; output is identical across platforms
    #[default]
    Sorted,
    /// Whatever order the directory listing returns
    Listing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTable {
    entries: Vec<EntityDescriptor>,
    total_data_size: u32,
}

impl EntityTable {
    pub const DIR_NAME: &'static str = "DATA";

    /// Read every entity in `path` and assign addresses from `data_ad`
    pub fn from_dir(path: &Path, data_ad: u32, order: EntityOrder) -> TableResult<EntityTable> {
        let read_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| TableError::Read { path, source }
        };

        let mut entities = Vec::new();
        for entry in std::fs::read_dir(path).map_err(read_err(path))? {
            let entry = entry.map_err(read_err(path))?;
            entities.push((entry.file_name(), entry.path()));
        }

        if order == EntityOrder::Sorted {
            entities.sort_by(|(l, _), (r, _)| l.as_encoded_bytes().cmp(r.as_encoded_bytes()));
        }

        let mut builder = EntityTableBuilder::new(data_ad);
        for (file_name, entity_path) in entities {
            let name = file_name
                .into_string()
                .map_err(|name| TableError::NonAsciiName {
                    name: name.to_string_lossy().into_owned(),
                })?;

            info!("Found entity -> {:?}", name);

            // Size is only known once the whole entity has been read
            let data = std::fs::read(&entity_path).map_err(read_err(&entity_path))?;
            let descriptor = builder.push(&name, data.len())?;

            info!(
                "Loaded entity [{:?}] - Size: {:#x} Addr: {:#x}",
                descriptor.name(),
                descriptor.size(),
                descriptor.address()
            );
        }

        let table = builder.finish();
        info!("Table size: {:#x}", table.table_len());
        Ok(table)
    }

    pub fn entries(&self) -> &[EntityDescriptor] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entity sizes, written to the header as `DATA_SZ`
    pub fn total_data_size(&self) -> u32 {
        self.total_data_size
    }

    /// Bytes taken up by entries, excluding padding
    pub fn table_len(&self) -> usize {
        self.entries.len() * ENTRY_LEN
    }

    pub fn padding_len(&self) -> usize {
        TABLE_CAPACITY - self.table_len()
    }

    /// Entries followed by zero padding, always `TABLE_CAPACITY` bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TABLE_CAPACITY);
        for entry in &self.entries {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes.resize(TABLE_CAPACITY, 0);
        bytes
    }
}

/// Assigns sequential addresses to entities while enforcing the table limits
#[derive(Debug)]
pub struct EntityTableBuilder {
    entries: Vec<EntityDescriptor>,
    next_address: Option<u32>,
    total_len: usize,
    total_size: u32,
}

impl EntityTableBuilder {
    pub fn new(data_ad: u32) -> Self {
        Self {
            entries: Vec::new(),
            next_address: Some(data_ad),
            total_len: 0,
            total_size: 0,
        }
    }

    pub fn push(&mut self, name: &str, size: usize) -> TableResult<&EntityDescriptor> {
        let size = u32::try_from(size).map_err(|_| TableError::SizeOverflow {
            name: name.to_owned(),
            size,
        })?;

        if !name.is_ascii() {
            return Err(TableError::NonAsciiName {
                name: name.to_owned(),
            });
        }

        if name.len() > NAME_LEN {
            return Err(TableError::NameTooLong {
                name: name.to_owned(),
            });
        }

        let total_len = self.total_len + ENTRY_LEN;
        if total_len > TABLE_CAPACITY {
            return Err(TableError::CapacityExceeded {
                name: name.to_owned(),
                required: total_len,
            });
        }

        // The previous entity ended exactly at the top of the address space
        let address = self.next_address.ok_or_else(|| TableError::AddressOverflow {
            name: name.to_owned(),
        })?;

        let total_size =
            self.total_size
                .checked_add(size)
                .ok_or_else(|| TableError::AddressOverflow {
                    name: name.to_owned(),
                })?;

        let end = address as u64 + size as u64;
        if end > u32::MAX as u64 + 1 {
            return Err(TableError::AddressOverflow {
                name: name.to_owned(),
            });
        }

        self.next_address = u32::try_from(end).ok();
        self.total_len = total_len;
        self.total_size = total_size;

        let id = EntityID::new(self.entries.len());
        self.entries
            .push(EntityDescriptor::new(id, name.to_owned(), address, size));

        Ok(&self.entries[id.inner()])
    }

    pub fn finish(self) -> EntityTable {
        EntityTable {
            entries: self.entries,
            total_data_size: self.total_size,
        }
    }
}

#[derive(Debug)]
pub enum TableError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    NonAsciiName {
        name: String,
    },
    NameTooLong {
        name: String,
    },
    CapacityExceeded {
        name: String,
        required: usize,
    },
    SizeOverflow {
        name: String,
        size: usize,
    },
    AddressOverflow {
        name: String,
    },
}

impl TableError {
    /// Entity the error refers to, if any
    pub fn entity(&self) -> Option<&str> {
        match self {
            TableError::Read { .. } => None,
            TableError::NonAsciiName { name }
            | TableError::NameTooLong { name }
            | TableError::CapacityExceeded { name, .. }
            | TableError::SizeOverflow { name, .. }
            | TableError::AddressOverflow { name } => Some(name),
        }
    }
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Read { path, source } => {
                write!(f, "Could not read entity {:?}: {}", path, source)
            }
            TableError::NonAsciiName { name } => {
                write!(f, "Entity name is not ASCII {:?}", name)
            }
            TableError::NameTooLong { name } => write!(
                f,
                "Entity name was too long {:?} ({} > {} bytes)",
                name,
                name.len(),
                NAME_LEN
            ),
            TableError::CapacityExceeded { name, required } => write!(
                f,
                "Too many entities, adding {:?} needs {:#x} bytes but the table holds {:#x} ({} entries)",
                name, required, TABLE_CAPACITY, MAX_ENTRIES
            ),
            TableError::SizeOverflow { name, size } => write!(
                f,
                "Entity {:?} is {:#x} bytes which does not fit a 32-bit size",
                name, size
            ),
            TableError::AddressOverflow { name } => write!(
                f,
                "Entity {:?} does not fit in the 32-bit data address space",
                name
            ),
        }
    }
}

impl Error for TableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TableError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}
