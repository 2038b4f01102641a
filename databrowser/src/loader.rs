//! Loading of schemas and configuration from files.

use std::{ffi::OsStr, fs, path::Path, str::FromStr};

use log::debug;
use serde::de::DeserializeOwned;

use crate::Error;

/// The file formats from which we can load schemas and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Ok(match lower.as_ref() {
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            _ => return Err(Error::UnsupportedFileType(s.to_string())),
        })
    }
}

/// Deserialize a value from a string in the given format.
pub fn load_as<T: DeserializeOwned>(fmt: FileFormat, content: &str) -> Result<T, Error> {
    Ok(match fmt {
        FileFormat::Json => serde_json::from_str(content)?,
        FileFormat::Yaml => serde_yaml::from_str(content)?,
    })
}

/// Deserialize a value from the given file, detecting its format from the
/// file's extension.
pub fn load_from_file<T, P>(path: P) -> Result<T, Error>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| Error::CannotDetermineFileType(path.to_path_buf()))?;
    let fmt = FileFormat::from_str(ext)?;
    let content = fs::read_to_string(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
    debug!("Read {} bytes of {:?} from {}", content.len(), fmt, path.display());
    load_as(fmt, &content)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn file_formats() {
        assert_eq!(FileFormat::from_str("json").unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_str("YML").unwrap(), FileFormat::Yaml);
        assert!(matches!(
            FileFormat::from_str("toml"),
            Err(Error::UnsupportedFileType(ref ext)) if ext == "toml"
        ));
    }

    #[test]
    fn unloadable_files() {
        assert!(matches!(
            load_from_file::<Vec<String>, _>(PathBuf::from("schema")),
            Err(Error::CannotDetermineFileType(_))
        ));
        assert!(matches!(
            load_from_file::<Vec<String>, _>(PathBuf::from("schema.csv")),
            Err(Error::UnsupportedFileType(_))
        ));
        assert!(matches!(
            load_from_file::<Vec<String>, _>(PathBuf::from("/nonexistent/schema.json")),
            Err(Error::Io(_, _))
        ));
    }
}
