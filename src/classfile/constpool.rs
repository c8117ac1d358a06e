//! Constant pool and constants for Java class files

use crate::common::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
    /// Second slot of a Long or Double entry; unusable as an index target
    /// and emits no bytes on re-encoding.
    Reserved,
}

pub mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
    pub const CONSTANT_METHODHANDLE: u8 = 15;
    pub const CONSTANT_METHODTYPE: u8 = 16;
    pub const CONSTANT_DYNAMIC: u8 = 17;
    pub const CONSTANT_INVOKEDYNAMIC: u8 = 18;
    pub const CONSTANT_MODULE: u8 = 19;
    pub const CONSTANT_PACKAGE: u8 = 20;
}

/// Constant pool with 1-based slot indexing. `constants[i]` is pool index
/// `i + 1`; Long and Double occupy two slots, the second being `Reserved`.
#[derive(Debug, Default)]
pub struct ConstantPool {
    pub(crate) constants: Vec<Constant>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self { constants: Vec::new() }
    }

    /// Number of occupied slots (the encoded count field is this plus one)
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    fn push(&mut self, constant: Constant) -> Result<u16> {
        let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
        let slots = if wide { 2 } else { 1 };
        let index = self.constants.len() + 1;
        // The encoded count field is slot count + 1 and is itself a u16,
        // so the last usable slot index is 65534.
        if index + slots > u16::MAX as usize {
            return Err(Error::patch_error("constant pool overflow"));
        }
        self.constants.push(constant);
        if wide {
            self.constants.push(Constant::Reserved);
        }
        Ok(index as u16)
    }

    pub fn add_utf8(&mut self, value: &str) -> Result<u16> {
        self.push(Constant::Utf8(value.to_string()))
    }

    pub fn add_integer(&mut self, value: i32) -> Result<u16> {
        self.push(Constant::Integer(value))
    }

    pub fn add_long(&mut self, value: i64) -> Result<u16> {
        self.push(Constant::Long(value))
    }

    pub fn add_class(&mut self, name: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        self.push(Constant::Class(name_index))
    }

    pub fn add_string(&mut self, value: &str) -> Result<u16> {
        let utf8_index = self.add_utf8(value)?;
        self.push(Constant::String(utf8_index))
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.push(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.push(Constant::FieldRef(class_index, name_and_type_index))
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.push(Constant::MethodRef(class_index, name_and_type_index))
    }

    pub fn add_interface_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.push(Constant::InterfaceMethodRef(class_index, name_and_type_index))
    }

    pub fn add_method_handle(&mut self, reference_kind: u8, reference_index: u16) -> Result<u16> {
        self.push(Constant::MethodHandle(reference_kind, reference_index))
    }

    /// Look up a slot; index 0, out-of-range indexes, and the second slot
    /// of a Long/Double are malformed references.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        if index == 0 {
            return Err(Error::format_error("constant pool index 0"));
        }
        match self.constants.get(index as usize - 1) {
            Some(Constant::Reserved) | None => Err(Error::format_error(format!(
                "invalid constant pool index {index}"
            ))),
            Some(constant) => Ok(constant),
        }
    }

    /// Resolve a CONSTANT_Utf8 entry
    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            _ => Err(Error::format_error(format!(
                "constant pool index {index} is not Utf8"
            ))),
        }
    }

    /// Resolve a CONSTANT_Class entry to its internal name
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Class(name_index) => self.utf8(*name_index),
            _ => Err(Error::format_error(format!(
                "constant pool index {index} is not Class"
            ))),
        }
    }

    /// Owner class of a Methodref or InterfaceMethodref call target.
    /// `invokespecial` owners may be InterfaceMethodref since Java 8.
    pub fn call_owner(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::MethodRef(class_index, _)
            | Constant::InterfaceMethodRef(class_index, _) => self.class_name(*class_index),
            _ => Err(Error::format_error(format!(
                "constant pool index {index} is not a method reference"
            ))),
        }
    }

    /// Owner class of any member reference (field, method, or interface
    /// method); used for method handle constants.
    pub fn member_owner(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::FieldRef(class_index, _)
            | Constant::MethodRef(class_index, _)
            | Constant::InterfaceMethodRef(class_index, _) => self.class_name(*class_index),
            _ => Err(Error::format_error(format!(
                "constant pool index {index} is not a member reference"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexes_are_one_based() {
        let mut pool = ConstantPool::new();
        let a = pool.add_utf8("a").unwrap();
        let b = pool.add_utf8("b").unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(pool.utf8(1).unwrap(), "a");
        assert_eq!(pool.utf8(2).unwrap(), "b");
    }

    #[test]
    fn test_long_occupies_two_slots() {
        let mut pool = ConstantPool::new();
        let long_index = pool.add_long(42).unwrap();
        let next = pool.add_utf8("after").unwrap();
        assert_eq!(long_index, 1);
        assert_eq!(next, 3);
        assert!(pool.get(2).is_err());
        assert_eq!(pool.utf8(3).unwrap(), "after");
    }

    #[test]
    fn test_class_name_resolution() {
        let mut pool = ConstantPool::new();
        let class_index = pool.add_class("java/lang/String").unwrap();
        assert_eq!(pool.class_name(class_index).unwrap(), "java/lang/String");
    }

    #[test]
    fn test_call_owner_rejects_field_ref() {
        let mut pool = ConstantPool::new();
        let field = pool.add_field_ref("pkg/Owner", "f", "I").unwrap();
        assert!(pool.call_owner(field).is_err());
        assert_eq!(pool.member_owner(field).unwrap(), "pkg/Owner");
    }

    #[test]
    fn test_index_zero_is_invalid() {
        let pool = ConstantPool::new();
        assert!(pool.get(0).is_err());
    }
}
