//! Attributes and exception table structures for Java class files

use crate::common::error::Result;

use super::constpool::ConstantPool;
use super::reader::{read_attributes, ByteReader};

/// An attribute kept in its raw encoded form. The patcher only opens the
/// handful of attributes whose payload contains bytecode offsets; all
/// others round-trip untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self { name_index, info }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(self.info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.info);
        bytes
    }
}

/// Decoded Code attribute payload
#[derive(Debug)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeInfo>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn from_bytes(info: &[u8], pool: &ConstantPool) -> Result<Self> {
        let mut reader = ByteReader::new(info);
        let max_stack = reader.read_u16()?;
        let max_locals = reader.read_u16()?;
        let code_length = reader.read_u32()? as usize;
        let code = reader.read_slice(code_length)?.to_vec();
        let exception_count = reader.read_u16()?;
        let mut exception_table = Vec::with_capacity(exception_count as usize);
        for _ in 0..exception_count {
            exception_table.push(ExceptionTableEntry::new(
                reader.read_u16()?,
                reader.read_u16()?,
                reader.read_u16()?,
                reader.read_u16()?,
            ));
        }
        let attributes = read_attributes(&mut reader, pool)?;
        reader.expect_end("Code attribute")?;
        Ok(Self { max_stack, max_locals, code, exception_table, attributes })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.max_stack.to_be_bytes());
        bytes.extend_from_slice(&self.max_locals.to_be_bytes());
        bytes.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code);
        bytes.extend_from_slice(&(self.exception_table.len() as u16).to_be_bytes());
        for entry in &self.exception_table {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            bytes.extend_from_slice(&attribute.to_bytes());
        }
        bytes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

impl ExceptionTableEntry {
    pub fn new(start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: u16) -> Self {
        Self { start_pc, end_pc, handler_pc, catch_type }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.start_pc.to_be_bytes());
        bytes.extend_from_slice(&self.end_pc.to_be_bytes());
        bytes.extend_from_slice(&self.handler_pc.to_be_bytes());
        bytes.extend_from_slice(&self.catch_type.to_be_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_attribute_round_trip() {
        let pool = ConstantPool::new();
        let mut code = CodeAttribute::new(2, 1, vec![0x03, 0xac]);
        code.exception_table.push(ExceptionTableEntry::new(0, 1, 1, 0));
        let bytes = code.to_bytes();
        let parsed = CodeAttribute::from_bytes(&bytes, &pool).unwrap();
        assert_eq!(parsed.max_stack, 2);
        assert_eq!(parsed.max_locals, 1);
        assert_eq!(parsed.code, vec![0x03, 0xac]);
        assert_eq!(parsed.exception_table, code.exception_table);
        assert!(parsed.attributes.is_empty());
    }

    #[test]
    fn test_truncated_code_attribute() {
        let pool = ConstantPool::new();
        let code = CodeAttribute::new(1, 0, vec![0xb1]);
        let bytes = code.to_bytes();
        assert!(CodeAttribute::from_bytes(&bytes[..bytes.len() - 1], &pool).is_err());
    }
}
