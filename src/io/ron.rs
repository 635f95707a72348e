//! RON I/O
use crate::{
    traits::{ConvertToSerializable, RONExport, RONImport},
    types::{Error, Result},
};

impl<L: ConvertToSerializable> RONExport for L {
    fn to_ron_string(&self) -> Result<String> {
        ron::to_string(&self.to_serializable()).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })
    }
}

impl<L: ConvertToSerializable> RONImport for L
where
    for<'a> L::SerializableType: serde::Deserialize<'a>,
{
    fn from_ron_string(s: &str) -> Result<Self> {
        let data = ron::from_str(s).map_err(|e| Error::Serialization {
            message: e.to_string(),
        })?;
        Self::from_serializable(data)
    }
}
