use sha1::{Digest, Sha1};

/// Lower-hex SHA-1 digest of a byte slice.
///
/// Used to key the on-disk AST cache and to stamp module roots, so two
/// files with identical contents share one serialized tree.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        // sha1("abc")
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn same_content_same_digest() {
        assert_eq!(sha1_hex(b"x = 1\n"), sha1_hex(b"x = 1\n"));
        assert_ne!(sha1_hex(b"x = 1\n"), sha1_hex(b"x = 2\n"));
    }
}
