//! Offset shifting for pc-bearing Code sub-attributes
//!
//! Prepending to a method body moves every original instruction by a
//! fixed amount. Branches are pc-relative and survive untouched, but the
//! debug tables carry absolute offsets, and the first stack map frame's
//! offset delta is measured from the start of the method.

use crate::common::error::{Error, Result};

pub(crate) fn shifted(offset: u16, shift: u16) -> Result<u16> {
    offset
        .checked_add(shift)
        .ok_or_else(|| Error::patch_error("bytecode offset overflow"))
}

/// Shift a StackMapTable payload. Frames after the first encode deltas
/// between consecutive frames and do not move; only the first frame's
/// delta grows, with promotion to the extended tag form when the
/// compressed encoding no longer fits.
pub(crate) fn shift_stack_map(info: &[u8], shift: u16) -> Result<Vec<u8>> {
    let count = read_u16(info, 0)?;
    if count == 0 {
        return Ok(info.to_vec());
    }
    let tag = read_u8(info, 2)?;
    match tag {
        // same_frame: delta is the tag itself
        0..=63 => {
            let delta = shifted(u16::from(tag), shift)?;
            if delta <= 63 {
                let mut out = info.to_vec();
                out[2] = delta as u8;
                Ok(out)
            } else {
                Ok(splice(info, 2, 3, &[251, (delta >> 8) as u8, delta as u8]))
            }
        }
        // same_locals_1_stack_item_frame: delta is tag - 64, one
        // verification type follows and stays in place
        64..=127 => {
            let delta = shifted(u16::from(tag - 64), shift)?;
            if delta <= 63 {
                let mut out = info.to_vec();
                out[2] = 64 + delta as u8;
                Ok(out)
            } else {
                Ok(splice(info, 2, 3, &[247, (delta >> 8) as u8, delta as u8]))
            }
        }
        // extended, chop, append, and full frames all carry an explicit
        // u16 delta right after the tag
        247..=255 => {
            let delta = shifted(read_u16(info, 3)?, shift)?;
            let mut out = info.to_vec();
            out[3] = (delta >> 8) as u8;
            out[4] = delta as u8;
            Ok(out)
        }
        _ => Err(Error::format_error(format!("reserved stack map frame type {tag}"))),
    }
}

/// Shift every start_pc in a LineNumberTable payload
pub(crate) fn shift_line_numbers(info: &[u8], shift: u16) -> Result<Vec<u8>> {
    let count = read_u16(info, 0)? as usize;
    if info.len() != 2 + count * 4 {
        return Err(Error::format_error("LineNumberTable length mismatch"));
    }
    let mut out = info.to_vec();
    for entry in 0..count {
        let at = 2 + entry * 4;
        write_u16(&mut out, at, shifted(read_u16(info, at)?, shift)?);
    }
    Ok(out)
}

/// Shift every start_pc in a LocalVariableTable or
/// LocalVariableTypeTable payload; entry lengths are spans and stay put
pub(crate) fn shift_local_variables(info: &[u8], shift: u16) -> Result<Vec<u8>> {
    let count = read_u16(info, 0)? as usize;
    if info.len() != 2 + count * 10 {
        return Err(Error::format_error("local variable table length mismatch"));
    }
    let mut out = info.to_vec();
    for entry in 0..count {
        let at = 2 + entry * 10;
        write_u16(&mut out, at, shifted(read_u16(info, at)?, shift)?);
    }
    Ok(out)
}

fn splice(info: &[u8], start: usize, end: usize, replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(info.len() - (end - start) + replacement.len());
    out.extend_from_slice(&info[..start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&info[end..]);
    out
}

fn read_u8(info: &[u8], at: usize) -> Result<u8> {
    info.get(at)
        .copied()
        .ok_or_else(|| Error::format_error("truncated attribute payload"))
}

fn read_u16(info: &[u8], at: usize) -> Result<u16> {
    Ok(u16::from_be_bytes([read_u8(info, at)?, read_u8(info, at + 1)?]))
}

fn write_u16(info: &mut [u8], at: usize, value: u16) {
    info[at..at + 2].copy_from_slice(&value.to_be_bytes());
}
