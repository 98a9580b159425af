//! Reader for the `CONF` file of an image source directory.
//!
//! The format is one `KEY=VALUE` pair per line where `VALUE` is a
//! hexadecimal integer, e.g.
//!
//! ```text
//! CODE_AD=1000
//! DATA_AD=2000
//! ```

use std::{collections::BTreeMap, error::Error, num::ParseIntError, path::Path};

use log::debug;

pub type ConfResult<T> = Result<T, ConfError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConf {
    values: BTreeMap<String, u32>,
}

impl BuildConf {
    pub const FILE_NAME: &'static str = "CONF";

    pub const CODE_AD: &'static str = "CODE_AD";
    pub const DATA_AD: &'static str = "DATA_AD";
    pub const REQUIRED_KEYS: [&'static str; 2] = [Self::CODE_AD, Self::DATA_AD];

    pub fn load(path: &Path) -> ConfResult<BuildConf> {
        let text = std::fs::read_to_string(path).map_err(ConfError::Read)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> ConfResult<BuildConf> {
        let mut values = BTreeMap::new();

        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            if line.is_empty() {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ConfError::MalformedLine {
                line: line_no,
                text: line.to_owned(),
            })?;

            let parsed = parse_hex(value).map_err(|reason| ConfError::InvalidValue {
                line: line_no,
                key: key.to_owned(),
                value: value.trim().to_owned(),
                reason,
            })?;

            debug!("CONF {} = {:#x}", key, parsed);
            values.insert(key.to_owned(), parsed);
        }

        Ok(BuildConf { values })
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Single `_` separators may sit between digits, or directly after a
/// `0x` prefix. Anything else containing `_` fails to parse.
fn parse_hex(value: &str) -> Result<u32, ParseIntError> {
    let value = value.trim();
    let digits = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(rest) => rest.strip_prefix('_').unwrap_or(rest),
        None => value,
    };

    let separated = digits.contains('_')
        && !digits.starts_with('_')
        && !digits.ends_with('_')
        && !digits.contains("__");

    if separated {
        u32::from_str_radix(&digits.replace('_', ""), 16)
    } else {
        u32::from_str_radix(digits, 16)
    }
}

/// Load addresses required to lay out an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConfig {
    pub code_ad: u32,
    pub data_ad: u32,
}

impl TryFrom<&BuildConf> for ImageConfig {
    type Error = ConfError;

    fn try_from(conf: &BuildConf) -> Result<Self, Self::Error> {
        let missing = BuildConf::REQUIRED_KEYS
            .iter()
            .filter(|key| conf.get(key).is_none())
            .map(|key| key.to_string())
            .collect::<Vec<_>>();

        match (conf.get(BuildConf::CODE_AD), conf.get(BuildConf::DATA_AD)) {
            (Some(code_ad), Some(data_ad)) => Ok(ImageConfig { code_ad, data_ad }),
            _ => Err(ConfError::Incomplete { missing }),
        }
    }
}

#[derive(Debug)]
pub enum ConfError {
    Read(std::io::Error),
    MalformedLine {
        line: usize,
        text: String,
    },
    InvalidValue {
        line: usize,
        key: String,
        value: String,
        reason: ParseIntError,
    },
    Incomplete {
        missing: Vec<String>,
    },
}

impl std::fmt::Display for ConfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfError::Read(e) => write!(f, "Could not read config: {}", e),
            ConfError::MalformedLine { line, text } => {
                write!(f, "Malformed config line {}: {:?} is not KEY=VALUE", line, text)
            }
            ConfError::InvalidValue {
                line,
                key,
                value,
                reason,
            } => write!(
                f,
                "Invalid value for {} on line {}: {:?} is not a 32-bit hex number ({})",
                key, line, value, reason
            ),
            ConfError::Incomplete { missing } => {
                write!(f, "Config incomplete, missing {}", missing.join(", "))
            }
        }
    }
}

impl Error for ConfError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfError::Read(e) => Some(e),
            ConfError::InvalidValue { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
