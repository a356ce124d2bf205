//! Typed blob persistence: every saved object is prepended with a 4-byte magic and a 4-byte
//! version, and `save_if_modified` avoids flash wear by only writing when content actually
//! changed.

use crate::pal::Pal;

/// Outcome of [`save_if_modified`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No file previously existed; this write created it.
    New,
    /// A file existed with different content; this write replaced it.
    Updated,
    /// A file existed with identical content; nothing was written.
    Unchanged,
}

/// A typed file: `magic` + `version` identify the payload shape so that loading a file written by
/// an incompatible version fails instead of silently misinterpreting bytes.
pub trait FileBlob: Sized {
    /// 4-byte tag identifying this blob type on disk.
    const MAGIC: [u8; 4];
    /// Payload format version. Loading fails if the stored version differs.
    const VERSION: u32;

    fn to_bytes(&self) -> Vec<u8>;
    fn from_bytes(bytes: &[u8]) -> Option<Self>;
}

const PREAMBLE_LEN: usize = 8;

fn frame<T: FileBlob>(object: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREAMBLE_LEN + 64);
    out.extend_from_slice(&T::MAGIC);
    out.extend_from_slice(&T::VERSION.to_le_bytes());
    out.extend_from_slice(&object.to_bytes());
    out
}

fn unframe<T: FileBlob>(raw: &[u8]) -> Option<T> {
    if raw.len() < PREAMBLE_LEN {
        return None;
    }
    let (preamble, payload) = raw.split_at(PREAMBLE_LEN);
    if preamble[0..4] != T::MAGIC {
        return None;
    }
    let version = u32::from_le_bytes(preamble[4..8].try_into().ok()?);
    if version != T::VERSION {
        return None;
    }
    T::from_bytes(payload)
}

/// Join `directory` and `name` with a single `/`, inserted iff `directory` is non-empty and does
/// not already end in `/`. Mirrors `pf_file_join_directory_filename`: fails only if `name` is
/// empty.
pub fn join(directory: &str, name: &str) -> Result<String, ()> {
    if name.is_empty() {
        return Err(());
    }
    if directory.is_empty() {
        return Ok(name.to_string());
    }
    if directory.ends_with('/') {
        Ok(format!("{directory}{name}"))
    } else {
        Ok(format!("{directory}/{name}"))
    }
}

/// Save `object` under `(directory, name)`, magic+version framed.
pub fn save<T: FileBlob>(pal: &mut impl Pal, directory: &str, name: &str, object: &T) -> Result<(), crate::error::TransientError> {
    if name.is_empty() {
        return Err(crate::error::TransientError::FileSave);
    }
    let bytes = frame(object);
    pal.file_write(directory, name, &bytes)
        .map_err(|_| crate::error::TransientError::FileSave)
}

/// Load a previously [`save`]d object. Fails if the file is absent, or the magic/version
/// preamble does not match `T`.
pub fn load<T: FileBlob>(pal: &impl Pal, directory: &str, name: &str) -> Result<T, crate::error::NotFoundError> {
    let raw = pal
        .file_read(directory, name)
        .map_err(|_| crate::error::NotFoundError::File)?;
    unframe::<T>(&raw).ok_or(crate::error::NotFoundError::File)
}

/// Remove a previously saved blob, if present. Never errors: a missing file is simply a no-op.
pub fn clear(pal: &mut impl Pal, directory: &str, name: &str) {
    if name.is_empty() {
        return;
    }
    // Overwriting with an empty, unrecognisable blob makes a subsequent `load` fail just like a
    // deleted file would, without requiring the PAL to support removal.
    let _ = pal.file_write(directory, name, &[]);
}

/// Save `object` only if it differs from what is currently on disk under `(directory, name)`.
pub fn save_if_modified<T: FileBlob + PartialEq>(
    pal: &mut impl Pal,
    directory: &str,
    name: &str,
    object: &T,
) -> SaveOutcome {
    match load::<T>(pal, directory, name) {
        Ok(existing) if &existing == object => SaveOutcome::Unchanged,
        Ok(_) => {
            let _ = save(pal, directory, name, object);
            SaveOutcome::Updated
        }
        Err(_) => {
            let _ = save(pal, directory, name, object);
            SaveOutcome::New
        }
    }
}
