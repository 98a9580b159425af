use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use exe_config::BuildConf;
use exe_table::EntityTable;

use crate::{ImageError, ImageResult};

/// Paths of the three inputs of a validated source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    pub conf: PathBuf,
    pub code: PathBuf,
    pub data: PathBuf,
}

impl SourceLayout {
    pub const CODE: &'static str = "CODE";
    pub const ENTRIES: [&'static str; 3] = [Self::CODE, BuildConf::FILE_NAME, EntityTable::DIR_NAME];

    /// The directory must hold exactly `CODE`, `CONF` and `DATA`, nothing else
    pub fn open(root: &Path) -> ImageResult<SourceLayout> {
        let read_err = |source| ImageError::Read {
            path: root.to_path_buf(),
            source,
        };

        let mut found = BTreeSet::new();
        for entry in std::fs::read_dir(root).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            found.insert(entry.file_name().to_string_lossy().into_owned());
        }

        let expected = Self::ENTRIES
            .iter()
            .map(|e| e.to_string())
            .collect::<BTreeSet<_>>();

        if found != expected {
            return Err(ImageError::InvalidLayout {
                path: root.to_path_buf(),
                found: found.into_iter().collect(),
            });
        }

        Ok(SourceLayout {
            conf: root.join(BuildConf::FILE_NAME),
            code: root.join(Self::CODE),
            data: root.join(EntityTable::DIR_NAME),
        })
    }
}
