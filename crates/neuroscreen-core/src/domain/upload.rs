//! Upload filename validation.

use std::fmt;

use crate::error::AnalysisError;

/// Image extensions accepted for upload (compared case-insensitively).
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A validated upload filename.
///
/// Holds the caller's filename with any directory components stripped, and
/// its lowercased extension. The display name is never used as a storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    display: String,
    extension: String,
}

impl UploadName {
    /// Validates a caller-supplied filename.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidUpload`] if the name is empty or its
    /// extension is not one of [`ACCEPTED_EXTENSIONS`].
    pub fn parse(filename: &str) -> Result<Self, AnalysisError> {
        // Both separators: uploads from Windows browsers may carry full paths.
        let display = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if display.is_empty() {
            return Err(AnalysisError::InvalidUpload("No file selected".to_string()));
        }

        let extension = display
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| AnalysisError::InvalidUpload("Invalid file type".to_string()))?;

        Ok(Self {
            display: display.to_string(),
            extension,
        })
    }

    /// Filename as supplied by the caller, without directories.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display
    }

    /// Lowercased extension without the dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for UploadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_gif() {
        let err = UploadName::parse("photo.gif");
        assert!(matches!(err, Err(AnalysisError::InvalidUpload(ref m)) if m == "Invalid file type"));
    }

    #[test]
    fn test_rejects_empty() {
        let err = UploadName::parse("");
        assert!(matches!(err, Err(AnalysisError::InvalidUpload(ref m)) if m == "No file selected"));
    }

    #[test]
    fn test_accepts_uppercase_extension() {
        let name = UploadName::parse("photo.JPG");
        assert!(name.is_ok());
        let name = name.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(name.extension(), "jpg");
        assert_eq!(name.display_name(), "photo.JPG");
    }

    #[test]
    fn test_accepts_all_extensions() {
        for name in ["a.png", "b.jpg", "c.jpeg", "d.PnG", "e.JPEG"] {
            assert!(UploadName::parse(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_rejects_missing_extension() {
        assert!(UploadName::parse("photo").is_err());
        assert!(UploadName::parse("png").is_err());
        assert!(UploadName::parse("photo.jpg.exe").is_err());
    }

    #[test]
    fn test_strips_directories() {
        let name = UploadName::parse("../../etc/face.png").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(name.display_name(), "face.png");

        let name = UploadName::parse(r"C:\Users\me\face.jpeg").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(name.display_name(), "face.jpeg");
    }

    #[test]
    fn test_directory_only_is_empty() {
        assert!(matches!(
            UploadName::parse("uploads/"),
            Err(AnalysisError::InvalidUpload(_))
        ));
    }
}
