use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// The text edit primitive: byte-span replacement over an in-memory snapshot.
///
/// Every patch rule compiles down to one of these. Rules decide *where* to
/// edit by matching against the current text; application only splices.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "TextEdit does nothing until apply() is called"]
pub struct TextEdit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to place at [byte_start, byte_end)
    pub new_text: String,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Invalid byte range: [{byte_start}, {byte_end}) in text of length {text_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        text_len: usize,
    },

    #[error("Byte offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TextEdit {
    /// Pure insertion at `at`.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            byte_start: at,
            byte_end: at,
            new_text: text.into(),
        }
    }

    /// Replace [byte_start, byte_end) with `text`.
    pub fn replace(byte_start: usize, byte_end: usize, text: impl Into<String>) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: text.into(),
        }
    }

    fn validate(&self, content: &str) -> Result<(), EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                text_len: content.len(),
            });
        }
        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }

    /// Produce a new string with this edit spliced in.
    pub fn apply(&self, content: &str) -> Result<String, EditError> {
        self.validate(content)?;

        let mut out = String::with_capacity(
            content.len() + self.new_text.len() - (self.byte_end - self.byte_start),
        );
        out.push_str(&content[..self.byte_start]);
        out.push_str(&self.new_text);
        out.push_str(&content[self.byte_end..]);
        Ok(out)
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The target's permissions are carried over to the replacement, and a
/// symlinked target is resolved first so the link itself survives.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    let target = match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(path)?,
        _ => path.to_path_buf(),
    };

    // Same directory keeps the rename on one filesystem
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;

    if let Ok(meta) = fs::metadata(&target) {
        temp.as_file().set_permissions(meta.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(&target).map_err(|e| e.error)?;

    Ok(())
}
