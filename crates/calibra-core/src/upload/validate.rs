use crate::consts::{FITS_EXTENSIONS, RAW_EXTENSIONS, TIFF_EXTENSIONS, XISF_EXTENSION};
use crate::error::{CalibraError, Result};

/// Container format recognized by the local sanity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Fits,
    Xisf,
    Tiff,
    /// Camera raw; contents are only checked remotely.
    CameraRaw,
}

const FITS_MAGIC: &[u8] = b"SIMPLE";
const XISF_MAGIC: &[u8] = b"XISF0100";
const TIFF_MAGIC_LE: &[u8] = b"II*\0";
const TIFF_MAGIC_BE: &[u8] = b"MM\0*";

fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Local file-format sanity check, run before anything is uploaded.
///
/// Rejections carry a human-readable reason in [`CalibraError::InvalidFile`].
pub fn check_local(name: &str, bytes: &[u8]) -> Result<FileFormat> {
    if bytes.is_empty() {
        return Err(CalibraError::InvalidFile(format!("{name} is empty")));
    }
    let Some(ext) = extension(name) else {
        return Err(CalibraError::InvalidFile(format!("{name} has no file extension")));
    };

    if FITS_EXTENSIONS.contains(&ext.as_str()) {
        if !bytes.starts_with(FITS_MAGIC) {
            return Err(CalibraError::InvalidFile(format!(
                "{name} is not a valid FITS file (missing SIMPLE card)"
            )));
        }
        return Ok(FileFormat::Fits);
    }
    if ext == XISF_EXTENSION {
        if !bytes.starts_with(XISF_MAGIC) {
            return Err(CalibraError::InvalidFile(format!("{name} is not a valid XISF file")));
        }
        return Ok(FileFormat::Xisf);
    }
    if TIFF_EXTENSIONS.contains(&ext.as_str()) {
        if !bytes.starts_with(TIFF_MAGIC_LE) && !bytes.starts_with(TIFF_MAGIC_BE) {
            return Err(CalibraError::InvalidFile(format!("{name} is not a valid TIFF file")));
        }
        return Ok(FileFormat::Tiff);
    }
    if RAW_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(FileFormat::CameraRaw);
    }
    Err(CalibraError::InvalidFile(format!("{name}: unsupported file type .{ext}")))
}

/// Strip directories and replace characters unsafe in storage keys.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
