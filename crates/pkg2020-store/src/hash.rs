//! Blake3 hashing for sources and snapshots

use std::io;
use std::path::Path;

/// Hash a file's contents (memory-mapped for large CSV extracts).
pub fn hash_file(path: &Path) -> io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap(path)?;
    Ok(hasher.finalize())
}

pub fn hash_bytes(data: &[u8]) -> blake3::Hash {
    blake3::hash(data)
}

/// Fold an ordered list of hashes into one. Order is significant.
pub fn combine_hashes(hashes: &[blake3::Hash]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hasher.finalize()
}

/// First 8 hex characters, used for store directory names.
pub fn short_hash(hash: &blake3::Hash) -> String {
    hash.to_hex()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_source_same_hash() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "PMID,AND_ID\n1,2\n").unwrap();
        std::fs::write(&b, "PMID,AND_ID\n1,2\n").unwrap();
        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
        assert_eq!(hash_file(&a).unwrap(), hash_bytes(b"PMID,AND_ID\n1,2\n"));
    }

    #[test]
    fn edited_source_changes_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.csv");
        std::fs::write(&path, "PMID,AND_ID\n1,2\n").unwrap();
        let before = hash_file(&path).unwrap();
        std::fs::write(&path, "PMID,AND_ID\n1,3\n").unwrap();
        assert_ne!(before, hash_file(&path).unwrap());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(hash_file(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn combination_is_ordered() {
        let a = hash_bytes(b"authors");
        let b = hash_bytes(b"affiliations");
        assert_eq!(combine_hashes(&[a, b]), combine_hashes(&[a, b]));
        assert_ne!(combine_hashes(&[a, b]), combine_hashes(&[b, a]));
    }

    #[test]
    fn short_hash_is_prefix() {
        let h = hash_bytes(b"snapshot");
        let short = short_hash(&h);
        assert_eq!(short.len(), 8);
        assert!(h.to_hex().starts_with(&short));
    }
}
