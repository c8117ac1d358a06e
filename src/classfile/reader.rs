//! Classfile decoding: byte cursor and structure parsing
//!
//! The writer half lives in `writer`; this module is its mirror. Every
//! truncation, bad tag, or dangling constant pool index surfaces as a
//! `Format` error so that corruption is never conflated with absence.

use crate::common::error::{Error, Result};

use super::attribute::AttributeInfo;
use super::class::ClassFile;
use super::constpool::{constant_tags::*, Constant, ConstantPool};
use super::defs::MAGIC;
use super::field::FieldInfo;
use super::method::MethodInfo;

/// Big-endian cursor over a classfile byte buffer
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| Error::format_error("unexpected end of class file"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Fail unless the whole buffer was consumed
    pub fn expect_end(&self, what: &str) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(Error::format_error(format!("trailing bytes after {what}")));
        }
        Ok(())
    }
}

pub fn parse_class_file(bytes: &[u8]) -> Result<ClassFile> {
    let mut reader = ByteReader::new(bytes);

    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(Error::format_error(format!("bad magic 0x{magic:08X}")));
    }
    let minor_version = reader.read_u16()?;
    let major_version = reader.read_u16()?;

    let constant_pool = read_constant_pool(&mut reader)?;

    let access_flags = reader.read_u16()?;
    let this_class = reader.read_u16()?;
    let super_class = reader.read_u16()?;
    constant_pool.class_name(this_class)?;
    if super_class != 0 {
        constant_pool.class_name(super_class)?;
    }

    let interface_count = reader.read_u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        let index = reader.read_u16()?;
        constant_pool.class_name(index)?;
        interfaces.push(index);
    }

    let field_count = reader.read_u16()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        let access_flags = reader.read_u16()?;
        let name_index = reader.read_u16()?;
        let descriptor_index = reader.read_u16()?;
        constant_pool.utf8(name_index)?;
        constant_pool.utf8(descriptor_index)?;
        let mut field = FieldInfo::new(access_flags, name_index, descriptor_index);
        field.attributes = read_attributes(&mut reader, &constant_pool)?;
        fields.push(field);
    }

    let method_count = reader.read_u16()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        let access_flags = reader.read_u16()?;
        let name_index = reader.read_u16()?;
        let descriptor_index = reader.read_u16()?;
        constant_pool.utf8(name_index)?;
        constant_pool.utf8(descriptor_index)?;
        let mut method = MethodInfo::new(access_flags, name_index, descriptor_index);
        method.attributes = read_attributes(&mut reader, &constant_pool)?;
        methods.push(method);
    }

    let attributes = read_attributes(&mut reader, &constant_pool)?;
    reader.expect_end("class structure")?;

    Ok(ClassFile {
        magic,
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

fn read_constant_pool(reader: &mut ByteReader) -> Result<ConstantPool> {
    let count = reader.read_u16()? as usize;
    if count == 0 {
        return Err(Error::format_error("constant pool count 0"));
    }
    let mut constants = Vec::with_capacity(count - 1);
    while constants.len() + 1 < count {
        let constant = read_constant(reader)?;
        let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
        constants.push(constant);
        if wide {
            if constants.len() + 1 >= count {
                return Err(Error::format_error("wide constant overruns pool count"));
            }
            constants.push(Constant::Reserved);
        }
    }
    Ok(ConstantPool { constants })
}

fn read_constant(reader: &mut ByteReader) -> Result<Constant> {
    let tag = reader.read_u8()?;
    let constant = match tag {
        CONSTANT_UTF8 => {
            let length = reader.read_u16()? as usize;
            let bytes = reader.read_slice(length)?;
            let value = std::str::from_utf8(bytes)
                .map_err(|_| Error::format_error("invalid Utf8 constant"))?;
            Constant::Utf8(value.to_string())
        }
        CONSTANT_INTEGER => Constant::Integer(reader.read_u32()? as i32),
        CONSTANT_FLOAT => Constant::Float(f32::from_bits(reader.read_u32()?)),
        CONSTANT_LONG => {
            let high = reader.read_u32()? as u64;
            let low = reader.read_u32()? as u64;
            Constant::Long(((high << 32) | low) as i64)
        }
        CONSTANT_DOUBLE => {
            let high = reader.read_u32()? as u64;
            let low = reader.read_u32()? as u64;
            Constant::Double(f64::from_bits((high << 32) | low))
        }
        CONSTANT_CLASS => Constant::Class(reader.read_u16()?),
        CONSTANT_STRING => Constant::String(reader.read_u16()?),
        CONSTANT_FIELDREF => Constant::FieldRef(reader.read_u16()?, reader.read_u16()?),
        CONSTANT_METHODREF => Constant::MethodRef(reader.read_u16()?, reader.read_u16()?),
        CONSTANT_INTERFACEMETHODREF => {
            Constant::InterfaceMethodRef(reader.read_u16()?, reader.read_u16()?)
        }
        CONSTANT_NAMEANDTYPE => Constant::NameAndType(reader.read_u16()?, reader.read_u16()?),
        CONSTANT_METHODHANDLE => Constant::MethodHandle(reader.read_u8()?, reader.read_u16()?),
        CONSTANT_METHODTYPE => Constant::MethodType(reader.read_u16()?),
        CONSTANT_DYNAMIC => Constant::Dynamic(reader.read_u16()?, reader.read_u16()?),
        CONSTANT_INVOKEDYNAMIC => Constant::InvokeDynamic(reader.read_u16()?, reader.read_u16()?),
        CONSTANT_MODULE => Constant::Module(reader.read_u16()?),
        CONSTANT_PACKAGE => Constant::Package(reader.read_u16()?),
        _ => return Err(Error::format_error(format!("unknown constant tag {tag}"))),
    };
    Ok(constant)
}

pub(crate) fn read_attributes(
    reader: &mut ByteReader,
    pool: &ConstantPool,
) -> Result<Vec<AttributeInfo>> {
    let count = reader.read_u16()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = reader.read_u16()?;
        pool.utf8(name_index)?;
        let length = reader.read_u32()? as usize;
        let info = reader.read_slice(length)?.to_vec();
        attributes.push(AttributeInfo::new(name_index, info));
    }
    Ok(attributes)
}
