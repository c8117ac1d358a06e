//! Idempotent rewriting of the one-time class initializer
//!
//! The patcher prepends one touch-pair per external reference to
//! `<clinit>` — a `ldc_w` of the class constant immediately discarded by
//! `pop` — so the loader resolves every external class the moment the
//! entry class initializes. A zero-length marker attribute on the class
//! records that it was patched; a marked class re-encodes unchanged.

mod frames;

use std::collections::BTreeSet;

use crate::classfile::defs::{
    access_flags, CLINIT_DESCRIPTOR, CLINIT_NAME, CODE_ATTRIBUTE,
    LINE_NUMBER_TABLE_ATTRIBUTE, LOCAL_VARIABLE_TABLE_ATTRIBUTE,
    LOCAL_VARIABLE_TYPE_TABLE_ATTRIBUTE, MAX_CODE_LENGTH, PATCHED_ATTRIBUTE,
    STACK_MAP_TABLE_ATTRIBUTE,
};
use crate::classfile::{
    opcodes, AttributeInfo, ClassFile, ClassfileWritable, CodeAttribute, ConstantPool,
    MethodInfo,
};
use crate::common::error::{Error, Result};

pub struct ClinitPatcher<'a> {
    external: &'a BTreeSet<String>,
}

impl<'a> ClinitPatcher<'a> {
    pub fn new(external: &'a BTreeSet<String>) -> Self {
        Self { external }
    }

    /// Rewrite `bytes` so every external reference is touched during
    /// class initialization. A class carrying the marker attribute is
    /// already patched and re-encodes without modification.
    pub fn patch(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut class = ClassFile::from_bytes(bytes)?;
        if class.has_attribute(PATCHED_ATTRIBUTE) {
            return Ok(class.to_classfile_bytes());
        }

        let marker_index = class.constant_pool.add_utf8(PATCHED_ATTRIBUTE)?;
        class.attributes.push(AttributeInfo::new(marker_index, Vec::new()));

        let prefix = self.touch_prefix(&mut class.constant_pool)?;
        match find_clinit(&class)? {
            Some(position) => inject(&mut class, position, prefix)?,
            None => synthesize(&mut class, prefix)?,
        }
        Ok(class.to_classfile_bytes())
    }

    /// One `ldc_w`/`pop` pair per external name, in sorted order. Every
    /// pair is 4 bytes wide, so the prefix stays a multiple of four and
    /// switch padding in the shifted body — which depends on pc mod 4 —
    /// is preserved.
    fn touch_prefix(&self, pool: &mut ConstantPool) -> Result<Vec<u8>> {
        let mut prefix = Vec::with_capacity(4 * self.external.len());
        for name in self.external {
            let class_index = pool.add_class(name)?;
            prefix.push(opcodes::LDC_W);
            prefix.extend_from_slice(&class_index.to_be_bytes());
            prefix.push(opcodes::POP);
        }
        Ok(prefix)
    }
}

/// Locate `<clinit>` by exact name and descriptor. A method named
/// `<clinit>` with any other shape is broken input, not a repair target.
fn find_clinit(class: &ClassFile) -> Result<Option<usize>> {
    let pool = &class.constant_pool;
    for (position, method) in class.methods.iter().enumerate() {
        if method.name(pool)? != CLINIT_NAME {
            continue;
        }
        let descriptor = method.descriptor(pool)?;
        if descriptor != CLINIT_DESCRIPTOR {
            return Err(Error::shape_error(format!(
                "<clinit> has descriptor {descriptor}"
            )));
        }
        if method.access_flags & access_flags::ACC_STATIC == 0 {
            return Err(Error::shape_error("<clinit> is not static"));
        }
        return Ok(Some(position));
    }
    Ok(None)
}

/// Prepend the touch-pairs to an existing `<clinit>` body, moving every
/// absolute bytecode offset the Code attribute carries along with it
fn inject(class: &mut ClassFile, position: usize, prefix: Vec<u8>) -> Result<()> {
    if prefix.is_empty() {
        return Ok(());
    }

    let pool = &class.constant_pool;
    let method = &class.methods[position];
    let mut code_position = None;
    for (index, attribute) in method.attributes.iter().enumerate() {
        if pool.utf8(attribute.name_index)? == CODE_ATTRIBUTE
            && code_position.replace(index).is_some()
        {
            return Err(Error::shape_error("<clinit> has more than one Code attribute"));
        }
    }
    let code_position = code_position
        .ok_or_else(|| Error::shape_error("<clinit> has no Code attribute"))?;
    let mut code = CodeAttribute::from_bytes(&method.attributes[code_position].info, pool)?;

    if code.code.len() + prefix.len() > MAX_CODE_LENGTH {
        return Err(Error::patch_error(
            "patched <clinit> exceeds the method bytecode size limit",
        ));
    }
    let shift = prefix.len() as u16;

    let mut patched = prefix;
    patched.extend_from_slice(&code.code);
    code.code = patched;
    code.max_stack = code.max_stack.max(1);

    for entry in &mut code.exception_table {
        entry.start_pc = frames::shifted(entry.start_pc, shift)?;
        entry.end_pc = frames::shifted(entry.end_pc, shift)?;
        entry.handler_pc = frames::shifted(entry.handler_pc, shift)?;
    }
    for attribute in &mut code.attributes {
        attribute.info = match pool.utf8(attribute.name_index)? {
            STACK_MAP_TABLE_ATTRIBUTE => frames::shift_stack_map(&attribute.info, shift)?,
            LINE_NUMBER_TABLE_ATTRIBUTE => {
                frames::shift_line_numbers(&attribute.info, shift)?
            }
            LOCAL_VARIABLE_TABLE_ATTRIBUTE | LOCAL_VARIABLE_TYPE_TABLE_ATTRIBUTE => {
                frames::shift_local_variables(&attribute.info, shift)?
            }
            _ => continue,
        };
    }

    class.methods[position].attributes[code_position].info = code.to_bytes();
    Ok(())
}

/// Build `<clinit>` from scratch: the touch-pairs and a bare return.
/// One touch-pair needs a single stack slot.
fn synthesize(class: &mut ClassFile, prefix: Vec<u8>) -> Result<()> {
    let pool = &mut class.constant_pool;
    let name_index = pool.add_utf8(CLINIT_NAME)?;
    let descriptor_index = pool.add_utf8(CLINIT_DESCRIPTOR)?;
    let code_name_index = pool.add_utf8(CODE_ATTRIBUTE)?;

    let mut code = prefix;
    code.push(opcodes::RETURN);
    let code_attribute = CodeAttribute::new(1, 0, code);

    let mut method = MethodInfo::new(access_flags::ACC_STATIC, name_index, descriptor_index);
    method
        .attributes
        .push(AttributeInfo::new(code_name_index, code_attribute.to_bytes()));
    class.methods.push(method);
    Ok(())
}
