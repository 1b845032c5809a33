//! Shared naming rules for storage backends.
//!
//! Object key layout is `{partition}/{name}` on every backend. Both segments must be a
//! single path component, so a caller-supplied name can never leave its partition.

use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

fn validate_segment(kind: &str, value: &str) -> StorageResult<()> {
    if value.is_empty() {
        return Err(StorageError::InvalidKey(format!("{} must not be empty", kind)));
    }
    if value.starts_with('.') {
        return Err(StorageError::InvalidKey(format!(
            "{} must not start with '.'",
            kind
        )));
    }
    if value.contains('/') || value.contains('\\') || value.contains("..") {
        return Err(StorageError::InvalidKey(format!(
            "{} contains invalid characters",
            kind
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(StorageError::InvalidKey(format!(
            "{} contains control characters",
            kind
        )));
    }
    Ok(())
}

pub fn validate_partition(partition: &str) -> StorageResult<()> {
    validate_segment("partition", partition)
}

pub fn validate_name(name: &str) -> StorageResult<()> {
    validate_segment("object name", name)
}

/// Key of an object inside a flat namespace (bucket / container).
pub fn object_key(partition: &str, name: &str) -> StorageResult<String> {
    validate_partition(partition)?;
    validate_name(name)?;
    Ok(format!("{}/{}", partition, name))
}

/// `{uuid-v4}.{extension}`. The extension is used verbatim.
pub fn generate_object_name(extension: &str) -> StorageResult<String> {
    let name = format!("{}.{}", Uuid::new_v4(), extension);
    validate_name(&name)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        assert_eq!(object_key("tenant-42", "a.txt").unwrap(), "tenant-42/a.txt");
    }

    #[test]
    fn test_rejects_traversal_and_separators() {
        assert!(validate_name("../secret").is_err());
        assert!(validate_name("a/b.txt").is_err());
        assert!(validate_name("a\\b.txt").is_err());
        assert!(validate_name(".staging").is_err());
        assert!(validate_name("bad\nname").is_err());
        assert!(validate_partition("").is_err());
        assert!(object_key("tenant-1/../tenant-2", "a.txt").is_err());
    }

    #[test]
    fn test_generated_name_keeps_extension_verbatim() {
        let name = generate_object_name("PNG").unwrap();
        let (id, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "PNG");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_generated_name_rejects_path_extension() {
        assert!(generate_object_name("png/../../x").is_err());
    }
}
