use std::io::Write;
use std::path::Path;

/// Write `content` to `path` atomically.
///
/// Writes to a temp file in the same directory and renames it over the
/// target, so readers never observe a half-written blob. Creates the parent
/// directory if needed.
pub fn atomic_write_str(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Render a number for export and display.
///
/// Integral values print without a fractional part (`1198`, not `1198.0`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        // Collapses -0.0 as well
        return "0".to_string();
    }
    format!("{}", value)
}

/// Two-decimal display used for prices and amounts.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_integral() {
        assert_eq!(format_number(1198.0), "1198");
        assert_eq!(format_number(113810.0), "113810");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_format_number_fractional() {
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_format_number_non_finite() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(113810.0), "113810.00");
        assert_eq!(format_amount(12.346), "12.35");
        assert_eq!(format_amount(1198.5), "1198.50");
        assert_eq!(format_amount(0.0), "0.00");
    }

    #[test]
    fn test_atomic_write_creates_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("blob.json");

        atomic_write_str(&path, "first").expect("first write");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        atomic_write_str(&path, "second").expect("second write");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(leftovers.len(), 1, "temp file should be renamed away");
    }
}
