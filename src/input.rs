//! Email text acquisition for the CLI caller.
//!
//! Everything here runs before the pipeline; the pipeline assumes its input
//! already passed `validate_email_text`.

use std::io::Read;
use std::path::Path;

use crate::error::InputError;

/// Minimum email length after trimming.
pub const MIN_EMAIL_CHARS: usize = 10;

/// Check the minimum-length contract and return the trimmed text.
pub fn validate_email_text(raw: &str) -> Result<&str, InputError> {
    let trimmed = raw.trim();
    let actual = trimmed.chars().count();
    if actual < MIN_EMAIL_CHARS {
        return Err(InputError::TooShort {
            actual,
            min: MIN_EMAIL_CHARS,
        });
    }
    Ok(trimmed)
}

/// Read a `.txt` email file. Invalid UTF-8 is replaced, not rejected.
pub fn read_email_file(path: &Path) -> Result<String, InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("txt") => {
            let bytes = std::fs::read(path)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        other => Err(InputError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

/// Read the whole of `reader` as lossy UTF-8.
pub fn read_email_from<R: Read>(mut reader: R) -> Result<String, InputError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn rejects_short_text() {
        let err = validate_email_text("   oi!   ").unwrap_err();
        assert!(matches!(err, InputError::TooShort { actual: 3, min: 10 }));
    }

    #[test]
    fn accepts_and_trims_valid_text() {
        assert_eq!(
            validate_email_text("\n  Preciso de ajuda  \n").unwrap(),
            "Preciso de ajuda"
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 10 accented chars, 20 bytes.
        assert!(validate_email_text("éééééééééé").is_ok());
    }

    #[test]
    fn reads_txt_file_lossily() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"Ol\xe1, preciso do relat\xf3rio").unwrap();

        let text = read_email_file(file.path()).unwrap();
        assert!(text.starts_with("Ol"));
        assert!(text.contains("preciso do relat"));
    }

    #[test]
    fn rejects_pdf() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = read_email_file(file.path()).unwrap_err();
        assert!(matches!(err, InputError::UnsupportedFormat(ref ext) if ext == "pdf"));
    }

    #[test]
    fn reads_from_reader() {
        let text = read_email_from("Bom dia, equipe!".as_bytes()).unwrap();
        assert_eq!(text, "Bom dia, equipe!");
    }
}
