use crate::ObjectError;

/// Opaque file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Any byte sequence is a valid blob.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        Ok(Self::new(content.to_vec()))
    }

    pub fn serialize_content(&self) -> &[u8] {
        &self.data
    }
}
