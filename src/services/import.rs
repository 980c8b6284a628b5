use garde::Validate;
use image::ImageFormat;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::requests::UploadRequest;
use crate::models::upload::PhotoFile;

const IMPORTABLE: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

fn photo_format(path: &Path) -> Option<ImageFormat> {
    ImageFormat::from_path(path)
        .ok()
        .filter(|format| IMPORTABLE.contains(format))
}

/// Check the command-line metadata with the same rules the HTTP API applies.
pub fn import_request(
    barcode_prefix: &str,
    employee_id: i64,
) -> Result<UploadRequest, garde::Report> {
    let request = UploadRequest {
        barcode_prefix: barcode_prefix.to_string(),
        employee_id,
    };
    request.validate()?;
    Ok(request)
}

/// List the photo files directly inside `dir`, sorted by name.
pub fn collect_photos(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut photos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && photo_format(&path).is_some() {
            photos.push(path);
        }
    }
    photos.sort();
    Ok(photos)
}

/// Read a photo from disk, taking its content type from the extension.
pub fn load_photo(path: &Path) -> io::Result<PhotoFile> {
    let format = photo_format(path).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a supported photo", path.display()),
        )
    })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo")
        .to_string();
    let bytes = std::fs::read(path)?;

    Ok(PhotoFile::new(file_name, format.to_mime_type(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("booth-import-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_collects_only_photos_in_name_order() {
        let dir = scratch_dir();
        for name in ["b.PNG", "a.jpg", "c.jpeg", "notes.txt", "d.webp"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.join("nested.jpg")).unwrap();

        let found: Vec<String> = collect_photos(&dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a.jpg", "b.PNG", "c.jpeg", "d.webp"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_photo_sets_content_type() {
        let dir = scratch_dir();
        let path = dir.join("IMG_7.png");
        std::fs::write(&path, b"png bytes").unwrap();

        let photo = load_photo(&path).unwrap();
        assert_eq!(photo.file_name, "IMG_7.png");
        assert_eq!(photo.content_type, "image/png");
        assert_eq!(photo.bytes, b"png bytes");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_import_request_accepts_valid_metadata() {
        let request = import_request("QX7R2", 42).unwrap();
        assert_eq!(request.barcode_prefix, "QX7R2");
        assert_eq!(request.employee_id, 42);
    }

    #[test]
    fn test_import_request_rejects_bad_barcode_or_owner() {
        assert!(import_request("X", 42).is_err());
        assert!(import_request("QX7R2", -3).is_err());
        assert!(import_request("QX7R2", 0).is_err());
    }

    #[test]
    fn test_load_photo_rejects_other_files() {
        let err = load_photo(Path::new("/tmp/readme.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
