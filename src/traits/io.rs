//! RON I/O
use crate::types::{Error, Result};
use std::fs;

pub trait ConvertToSerializable: Sized {
    //! Convert to/from a serializable representation

    /// The serializable representation
    type SerializableType: serde::Serialize;
    /// Convert to the serializable representation
    fn to_serializable(&self) -> Self::SerializableType;
    /// Rebuild from the serializable representation
    fn from_serializable(data: Self::SerializableType) -> Result<Self>;
}

pub trait RONExport {
    //! Layout export for RON

    /// Generate the RON string for a layout
    fn to_ron_string(&self) -> Result<String>;

    /// Export as RON
    fn export_as_ron(&self, filename: &str) -> Result<()> {
        let ron_s = self.to_ron_string()?;
        fs::write(filename, ron_s).map_err(|e| Error::Serialization {
            message: format!("unable to write {filename}: {e}"),
        })
    }
}

pub trait RONImport: Sized {
    //! Layout import for RON

    /// Parse a layout from a RON string
    fn from_ron_string(s: &str) -> Result<Self>;

    /// Import from RON
    fn import_from_ron(filename: &str) -> Result<Self> {
        let content = fs::read_to_string(filename).map_err(|e| Error::Serialization {
            message: format!("unable to read {filename}: {e}"),
        })?;
        Self::from_ron_string(&content)
    }
}
