//! Reference decoding from method bytecode
//!
//! Only instruction forms that force the loader to resolve a class are
//! reported: statically-dispatched calls, object construction, reference
//! array allocation, and constant loads of class or method handle
//! entries. Field access, virtual and interface dispatch, branches, and
//! primitive operations never name a class the loader must touch here.

use crate::classfile::defs::CODE_ATTRIBUTE;
use crate::classfile::descriptor::referenced_class;
use crate::classfile::opcodes::*;
use crate::classfile::{ClassFile, CodeAttribute, Constant, ConstantPool};
use crate::common::error::{Error, Result};

/// Decode every method body of `class` and collect the classes its
/// instructions require to be resolvable. Order follows the instruction
/// stream and may repeat; consumers insert into a set.
pub fn class_references(class: &ClassFile) -> Result<Vec<String>> {
    let pool = &class.constant_pool;
    let mut references = Vec::new();
    for method in &class.methods {
        for attribute in &method.attributes {
            if pool.utf8(attribute.name_index)? == CODE_ATTRIBUTE {
                let code = CodeAttribute::from_bytes(&attribute.info, pool)?;
                collect_references(pool, &code.code, &mut references)?;
            }
        }
    }
    Ok(references)
}

/// Walk one bytecode array, emitting referenced class names into `out`
pub fn collect_references(
    pool: &ConstantPool,
    code: &[u8],
    out: &mut Vec<String>,
) -> Result<()> {
    let mut pc = 0;
    while pc < code.len() {
        match code[pc] {
            opcode @ (LDC | LDC_W) => {
                let index = if opcode == LDC {
                    u16::from(read_u8_at(code, pc + 1)?)
                } else {
                    read_u16_at(code, pc + 1)?
                };
                loaded_constant(pool, index, out)?;
            }
            INVOKESTATIC | INVOKESPECIAL => {
                let index = read_u16_at(code, pc + 1)?;
                emit(pool.call_owner(index)?, out);
            }
            NEW | ANEWARRAY | MULTIANEWARRAY => {
                let index = read_u16_at(code, pc + 1)?;
                emit(pool.class_name(index)?, out);
            }
            _ => {}
        }
        pc += instruction_length(code, pc)?;
    }
    Ok(())
}

/// `ldc` of a Class constant names the class itself; a MethodHandle
/// constant names the owner of the referenced member. Everything else a
/// constant load can push (strings, numbers, method types, dynamic
/// constants) resolves no class.
fn loaded_constant(pool: &ConstantPool, index: u16, out: &mut Vec<String>) -> Result<()> {
    match pool.get(index)? {
        Constant::Class(name_index) => emit(pool.utf8(*name_index)?, out),
        Constant::MethodHandle(_, reference_index) => {
            emit(pool.member_owner(*reference_index)?, out)
        }
        _ => {}
    }
    Ok(())
}

fn emit(name: &str, out: &mut Vec<String>) {
    if let Some(class) = referenced_class(name) {
        out.push(class.to_string());
    }
}

/// Encoded length of the instruction at `pc`, operands included.
/// Switch instructions pad to a 4-byte boundary relative to the start of
/// the code array, so their length depends on their own position.
pub fn instruction_length(code: &[u8], pc: usize) -> Result<usize> {
    let opcode = code[pc];
    let length = match opcode {
        WIDE => {
            if read_u8_at(code, pc + 1)? == IINC {
                6
            } else {
                4
            }
        }
        TABLESWITCH => {
            let padding = switch_padding(pc);
            let base = pc + 1 + padding;
            let low = read_i32_at(code, base + 4)?;
            let high = read_i32_at(code, base + 8)?;
            if low > high {
                return Err(Error::format_error("tableswitch bounds inverted"));
            }
            let cases = (i64::from(high) - i64::from(low) + 1) as usize;
            1 + padding + 12 + 4 * cases
        }
        LOOKUPSWITCH => {
            let padding = switch_padding(pc);
            let base = pc + 1 + padding;
            let pairs = read_i32_at(code, base + 4)?;
            if pairs < 0 {
                return Err(Error::format_error("negative lookupswitch pair count"));
            }
            1 + padding + 8 + 8 * pairs as usize
        }
        _ => fixed_length(opcode).ok_or_else(|| {
            Error::format_error(format!("undefined opcode 0x{opcode:02x} at pc {pc}"))
        })?,
    };
    if pc + length > code.len() {
        return Err(Error::format_error(format!(
            "instruction at pc {pc} runs past end of code"
        )));
    }
    Ok(length)
}

fn switch_padding(pc: usize) -> usize {
    (4 - (pc + 1) % 4) % 4
}

fn read_u8_at(code: &[u8], at: usize) -> Result<u8> {
    code.get(at)
        .copied()
        .ok_or_else(|| Error::format_error("truncated instruction operand"))
}

fn read_u16_at(code: &[u8], at: usize) -> Result<u16> {
    Ok(u16::from_be_bytes([read_u8_at(code, at)?, read_u8_at(code, at + 1)?]))
}

fn read_i32_at(code: &[u8], at: usize) -> Result<i32> {
    Ok(i32::from_be_bytes([
        read_u8_at(code, at)?,
        read_u8_at(code, at + 1)?,
        read_u8_at(code, at + 2)?,
        read_u8_at(code, at + 3)?,
    ]))
}
