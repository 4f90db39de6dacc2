use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::ShopError;

/// Image extensions accepted for product uploads.
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Whether a filename carries an allowed image extension.
pub fn allowed_file(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Store an uploaded product image under `dir` with a unique name.
///
/// The stored name is `<uuid>.<ext>`; the returned string is what the
/// catalog row records. Empty payloads and disallowed extensions fail with
/// `MissingUploadFile` and write nothing.
pub fn save_product_image(
    dir: impl AsRef<Path>,
    original_filename: &str,
    data: &[u8],
) -> Result<String, ShopError> {
    if data.is_empty() || !allowed_file(original_filename) {
        return Err(ShopError::MissingUploadFile);
    }

    // allowed_file already guaranteed the extension is present
    let ext = extension_of(original_filename).ok_or(ShopError::MissingUploadFile)?;
    let stored_name = format!("{}.{}", Uuid::new_v4(), ext);

    fs::create_dir_all(dir.as_ref())?;
    fs::write(dir.as_ref().join(&stored_name), data)?;

    Ok(stored_name)
}
