//! Core classfile structures: ClassFile and its top-level helpers

use crate::common::error::Result;

use super::attribute::AttributeInfo;
use super::constpool::ConstantPool;
use super::field::FieldInfo;
use super::method::MethodInfo;
use super::reader;

#[derive(Debug)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        reader::parse_class_file(bytes)
    }

    /// Internal name of this class
    pub fn name(&self) -> Result<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Whether a class-level attribute with the given name is present
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| {
            self.constant_pool
                .utf8(attribute.name_index)
                .map(|attribute_name| attribute_name == name)
                .unwrap_or(false)
        })
    }
}
