use buffer::ImageBuffer;
use exe_config::{BuildConf, ImageConfig};
use exe_table::{EntityOrder, EntityTable, TABLE_CAPACITY};
use header::{ImageHeader, HEADER_LEN};
use layout::SourceLayout;
use log::{debug, info};
use std::error::Error;
use std::ffi::OsString;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

pub mod buffer;
pub mod header;
pub mod layout;
pub mod view;

pub use exe_config::ConfError;
pub use exe_table::TableError;

pub type ImageResult<T> = Result<T, ImageError>;

/// Serializes an image stage by stage. Each stage can only follow the
/// previous one and checks that it starts at its fixed offset.
#[derive(Debug)]
pub struct Assembler<T> {
    _phantom: PhantomData<T>,
    buffer: ImageBuffer,
    header: Option<ImageHeader>,
}

#[derive(Debug)]
pub struct Header;
#[derive(Debug)]
pub struct Table;
#[derive(Debug)]
pub struct Code;
#[derive(Debug)]
pub struct Out;

impl<T> Assembler<T> {
    pub const TABLE_OFFSET: usize = HEADER_LEN;
    pub const PADDING_LEN: usize = 0x3E;
    pub const CODE_OFFSET: usize = Self::TABLE_OFFSET + TABLE_CAPACITY + Self::PADDING_LEN;

    fn cast<U>(self) -> Assembler<U> {
        Assembler {
            _phantom: Default::default(),
            buffer: self.buffer,
            header: self.header,
        }
    }

    fn header(&self) -> ImageResult<ImageHeader> {
        self.header.ok_or(ImageError::Serialization {
            field: "header",
            reason: "not written".to_string(),
        })
    }
}

impl Default for Assembler<Header> {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler<Header> {
    pub fn new() -> Self {
        Self {
            _phantom: Default::default(),
            buffer: ImageBuffer::new(),
            header: None,
        }
    }

    pub fn write_header(mut self, header: ImageHeader) -> ImageResult<Assembler<Table>> {
        self.buffer.expect_offset(0, "header")?;
        header.write_to(&mut self.buffer)?;
        self.header = Some(header);
        Ok(self.cast())
    }
}

impl Assembler<Table> {
    /// Write the lookup table and the padding block which follows it
    pub fn write_table(mut self, table: &EntityTable) -> ImageResult<Assembler<Code>> {
        self.buffer.expect_offset(Self::TABLE_OFFSET, "table")?;

        let data_sz = self.header()?.data_sz;
        if table.total_data_size() != data_sz {
            return Err(ImageError::Serialization {
                field: "DATA_SZ",
                reason: format!(
                    "header says {:#x} but the table sums to {:#x}",
                    data_sz,
                    table.total_data_size()
                ),
            });
        }

        self.buffer.put_bytes(&table.to_bytes());
        debug!(
            "Table at {:#x}, {} entries, {:#x} bytes padding",
            Self::TABLE_OFFSET,
            table.len(),
            table.padding_len()
        );

        self.buffer.put_zeroes(Self::PADDING_LEN);
        Ok(self.cast())
    }
}

impl Assembler<Code> {
    pub fn write_code(mut self, code: &[u8]) -> ImageResult<Assembler<Out>> {
        self.buffer.expect_offset(Self::CODE_OFFSET, "code")?;

        let code_sz = self.header()?.code_sz;
        if code.len() as u64 != code_sz as u64 {
            return Err(ImageError::Serialization {
                field: "CODE_SZ",
                reason: format!(
                    "header says {:#x} but the code is {:#x} bytes",
                    code_sz,
                    code.len()
                ),
            });
        }

        self.buffer.put_bytes(code);
        debug!("Code at {:#x}, {:#x} bytes", Self::CODE_OFFSET, code.len());
        Ok(self.cast())
    }
}

impl Assembler<Out> {
    pub fn finish(self) -> ImageResult<Image> {
        Ok(Image {
            header: self.header()?,
            bytes: self.buffer.into_bytes(),
        })
    }
}

/// A fully serialized image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    header: ImageHeader,
    bytes: Vec<u8>,
}

impl Image {
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the image to a temporary file next to `path`, then rename it
    /// over `path`
    pub fn write(&self, path: &Path) -> ImageResult<PathBuf> {
        let mut temp_path = OsString::from(path.as_os_str());
        temp_path.push(".temp");
        let temp_path = PathBuf::from(temp_path);

        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ImageError::Write { path, source }
        };

        if let Err(e) = std::fs::write(&temp_path, &self.bytes) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(write_err(&temp_path)(e));
        }
        if let Err(e) = std::fs::rename(&temp_path, path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(write_err(path)(e));
        }

        info!("Wrote {:#x} bytes to {}", self.bytes.len(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Read and validate a source directory and serialize it into an image.
/// Nothing is written to disk.
pub fn build_image(source: &Path, order: EntityOrder) -> ImageResult<Image> {
    let layout = SourceLayout::open(source)?;

    let conf = BuildConf::load(&layout.conf)?;
    let config = ImageConfig::try_from(&conf)?;

    let table = EntityTable::from_dir(&layout.data, config.data_ad, order)?;

    let code = std::fs::read(&layout.code).map_err(|source| ImageError::Read {
        path: layout.code.clone(),
        source,
    })?;

    let code_sz = u32::try_from(code.len()).map_err(|_| ImageError::Serialization {
        field: "CODE_SZ",
        reason: format!("{:#x} does not fit in 32 bits", code.len()),
    })?;

    let header = ImageHeader {
        code_ad: config.code_ad,
        code_sz,
        data_ad: config.data_ad,
        data_sz: table.total_data_size(),
    };

    info!("CODE_AD: {:#x}", header.code_ad);
    info!("CODE_SZ: {:#x}", header.code_sz);
    info!("DATA_AD: {:#x}", header.data_ad);
    info!("DATA_SZ: {:#x}", header.data_sz);

    Assembler::<Header>::new()
        .write_header(header)?
        .write_table(&table)?
        .write_code(&code)?
        .finish()
}

#[derive(Debug)]
pub enum ImageError {
    InvalidLayout { path: PathBuf, found: Vec<String> },
    Config(ConfError),
    Table(TableError),
    Read { path: PathBuf, source: std::io::Error },
    Write { path: PathBuf, source: std::io::Error },
    Serialization { field: &'static str, reason: String },
    Malformed { reason: String },
}

impl From<ConfError> for ImageError {
    fn from(value: ConfError) -> Self {
        ImageError::Config(value)
    }
}

impl From<TableError> for ImageError {
    fn from(value: TableError) -> Self {
        ImageError::Table(value)
    }
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::InvalidLayout { found, .. } => write!(
                f,
                "Invalid format. Entries not matched, found [{}]",
                found.join(", ")
            ),
            ImageError::Config(e) => write!(f, "{}", e),
            ImageError::Table(e) => write!(f, "{}", e),
            ImageError::Read { path, source } => {
                write!(f, "Could not read {:?}: {}", path, source)
            }
            ImageError::Write { path, source } => {
                write!(f, "Could not write {:?}: {}", path, source)
            }
            ImageError::Serialization { field, reason } => {
                write!(f, "Failed to serialize {}: {}", field, reason)
            }
            ImageError::Malformed { reason } => write!(f, "Malformed image: {}", reason),
        }
    }
}

impl Error for ImageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImageError::Config(e) => Some(e),
            ImageError::Table(e) => Some(e),
            ImageError::Read { source, .. } | ImageError::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}
