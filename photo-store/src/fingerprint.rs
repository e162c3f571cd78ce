use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;

const READ_CHUNK: usize = 64 * 1024;

/// SHA-256 identity of a photo's bytes, as 64 lowercase hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint bytes that are already in memory
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Fingerprint a stream chunk by chunk without buffering it whole
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Accepts a stored hex value; anything else is rejected
    pub fn from_hex(hex: &str) -> Option<Self> {
        let valid = hex.len() == 64
            && hex
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(hex.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Self::from_hex(&hex).ok_or_else(|| format!("invalid fingerprint {:?}", hex))
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_identical_bytes_share_fingerprint() {
        let a = Fingerprint::of_bytes(b"same pixels");
        let b = Fingerprint::of_bytes(b"same pixels");
        let c = Fingerprint::of_bytes(b"other pixels");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_known_digest() {
        let empty = Fingerprint::of_bytes(b"");
        assert_eq!(
            empty.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_reader_matches_bytes_across_chunks() {
        // Larger than one read chunk so the streaming loop runs several times
        let data: Vec<u8> = (0..(READ_CHUNK * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = Fingerprint::from_reader(Cursor::new(&data)).unwrap();
        assert_eq!(streamed, Fingerprint::of_bytes(&data));
    }

    #[test]
    fn test_from_hex_validation() {
        let fp = Fingerprint::of_bytes(b"x");
        assert_eq!(Fingerprint::from_hex(fp.as_str()), Some(fp.clone()));
        assert_eq!(Fingerprint::from_hex("abc"), None);
        assert_eq!(Fingerprint::from_hex(&fp.as_str().to_uppercase()), None);
        assert_eq!(fp.short().len(), 12);
    }

    #[test]
    fn test_deserialize_rejects_malformed_hex() {
        let fp = Fingerprint::of_bytes(b"x");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.as_str()));
        assert_eq!(serde_json::from_str::<Fingerprint>(&json).unwrap(), fp);

        assert!(serde_json::from_str::<Fingerprint>("\"abc\"").is_err());
    }
}
