//! Little-endian readers over untrusted firmware bytes.
//!
//! Every reader returns `None` instead of panicking when the read would leave the slice.

pub(crate) fn read_u8(bytes: &[u8], offset: usize) -> Option<u8> {
    bytes.get(offset).copied()
}

pub(crate) fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    let slice = bytes.get(offset..end)?;
    Some(u16::from_le_bytes([slice[0], slice[1]]))
}

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let slice = bytes.get(offset..end)?;
    Some(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

pub(crate) fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    bytes.get(offset..end)?.try_into().ok()
}

/// Reads a NUL-terminated byte string starting at `offset`, capped at `max_len` bytes.
pub(crate) fn read_cstr(bytes: &[u8], offset: usize, max_len: usize) -> Option<&[u8]> {
    let tail = bytes.get(offset..)?;
    let window = &tail[..tail.len().min(max_len)];
    let nul = window.iter().position(|&b| b == 0)?;
    Some(&window[..nul])
}
