use std::path::{Path, PathBuf};

use exe_assembler::{build_image, layout::SourceLayout, ConfError, ImageError, TableError};
use exe_config::BuildConf;
use exe_diagnostics::Diagnostics;
use exe_error::{ext::ExeErrorExt, ErrorLevel, ExeError};
use exe_table::{EntityOrder, EntityTable, NAME_LEN, TABLE_CAPACITY};
use log::info;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub output: PathBuf,
    pub order: EntityOrder,
}

impl BuildOptions {
    pub const DEFAULT_OUTPUT: &'static str = "out";

    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: PathBuf::from(Self::DEFAULT_OUTPUT),
            order: EntityOrder::default(),
        }
    }
}

pub struct Driver;

impl Driver {
    /// Build the image, reporting any failure through `diag`
    pub fn run(options: &BuildOptions, diag: &mut Diagnostics) -> Result<PathBuf, ()> {
        if !options.source.exists() {
            diag.push_error(
                ExeError::new(ErrorLevel::Error, "The target directory doesn't exist")
                    .with_path(|_| options.source.clone()),
            );
            diag.finish_stage()?;
        }

        match Self::build(options) {
            Ok(path) => {
                diag.finish_stage()?;
                Ok(path)
            }
            Err(e) => {
                diag.push_error(Self::diagnostic(&e, &options.source));
                diag.finish_stage()?;
                Err(())
            }
        }
    }

    /// Build the image and write it to `options.output`
    pub fn build(options: &BuildOptions) -> Result<PathBuf, ImageError> {
        info!("Building image from {}", options.source.display());
        let image = build_image(&options.source, options.order)?;
        image.write(&options.output)
    }

    /// Convert a build failure into a diagnostic pointing at the offending input
    pub fn diagnostic(err: &ImageError, source: &Path) -> ExeError {
        let error = ExeError::new(ErrorLevel::Error, err);
        match err {
            ImageError::InvalidLayout { path, .. } => {
                error.with_path(|_| path.clone()).with_note(|_| {
                    format!(
                        "Make sure the directory holds exactly {}",
                        SourceLayout::ENTRIES.join(", ")
                    )
                })
            }
            ImageError::Config(conf) => {
                let error = error.with_path(|_| source.join(BuildConf::FILE_NAME));
                match conf {
                    ConfError::Incomplete { .. } => error.with_note(|_| {
                        format!(
                            "The config must set {}",
                            BuildConf::REQUIRED_KEYS.join(" and ")
                        )
                    }),
                    ConfError::MalformedLine { .. } | ConfError::InvalidValue { .. } => {
                        error.with_note(|_| "Each line must be KEY=HEXVALUE".to_string())
                    }
                    ConfError::Read(_) => error,
                }
            }
            ImageError::Table(table) => {
                let data = source.join(EntityTable::DIR_NAME);
                let error = match (table, table.entity()) {
                    (TableError::Read { path, .. }, _) => error.with_path(|_| path.clone()),
                    (_, Some(name)) => error.with_path(|_| data.join(name)),
                    (_, None) => error.with_path(|_| data.clone()),
                };
                match table {
                    TableError::NameTooLong { .. } | TableError::NonAsciiName { .. } => error
                        .with_note(|_| {
                            format!("Entity names are limited to {} ASCII bytes", NAME_LEN)
                        }),
                    TableError::CapacityExceeded { .. } => error.with_note(|_| {
                        format!("The lookup table holds {:#x} bytes", TABLE_CAPACITY)
                    }),
                    _ => error,
                }
            }
            ImageError::Read { path, .. } | ImageError::Write { path, .. } => {
                error.with_path(|_| path.clone())
            }
            ImageError::Serialization { .. } | ImageError::Malformed { .. } => error,
        }
    }
}
