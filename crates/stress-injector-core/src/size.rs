//! Human readable byte sizes.

/// Unit symbols, indexed by power of 1024.
pub const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Bytes in one kibibyte.
pub const KIB: u64 = 1024;
/// Bytes in one mebibyte.
pub const MIB: u64 = KIB * 1024;
/// Bytes in one gibibyte.
pub const GIB: u64 = MIB * 1024;

/// Errors from [`format_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SizeError {
    /// Zero has no logarithm, so it has no unit.
    #[error("cannot format a size of zero bytes: logarithm is undefined")]
    ZeroBytes,
}

/// Formats `bytes` as `"<value> <unit>"`.
///
/// The unit index is `floor(log1024(bytes))`, the value is scaled by that
/// power of 1024 and rounded to two decimals. Trailing zeros are not printed.
///
/// # Examples
///
/// ```
/// use stress_injector_core::format_size;
///
/// assert_eq!(format_size(1024).unwrap(), "1 KB");
/// assert_eq!(format_size(1536).unwrap(), "1.5 KB");
/// assert_eq!(format_size(1024 * 1024 * 1024).unwrap(), "1 GB");
/// assert!(format_size(0).is_err());
/// ```
pub fn format_size(bytes: u64) -> Result<String, SizeError> {
    let index = unit_index(bytes)?;
    let scaled = bytes as f64 / (KIB as f64).powi(index as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    Ok(format!("{} {}", rounded, UNITS[index]))
}

/// Returns `floor(log1024(bytes))`, computed without floating point so exact
/// powers of 1024 never land one unit short.
pub fn unit_index(bytes: u64) -> Result<usize, SizeError> {
    if bytes == 0 {
        return Err(SizeError::ZeroBytes);
    }
    let mut index = 0;
    let mut remaining = bytes;
    while remaining >= KIB && index < UNITS.len() - 1 {
        remaining /= KIB;
        index += 1;
    }
    Ok(index)
}
