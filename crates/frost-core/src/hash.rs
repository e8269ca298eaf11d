//! Content hashing for deterministic output verification.
//!
//! Produces a SHA-256 hash of image buffer contents, so two runs of the same
//! blur chain can be compared bit-exactly.

use sha2::{Digest, Sha256};

use crate::frame::ImageBuffer;

/// A content hash digest (SHA-256, 32 bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash {
    bytes: [u8; 32],
}

impl ContentHash {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

fn update_with(hasher: &mut Sha256, image: &ImageBuffer) {
    // Dimensions and format are part of the digest so equal texels at a
    // different size never collide.
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(format!("{:?}", image.format()).as_bytes());
    for px in image.pixels() {
        for c in px {
            hasher.update(c.to_bits().to_le_bytes());
        }
    }
}

/// Compute the content hash of a single image.
pub fn hash_image(image: &ImageBuffer) -> ContentHash {
    let mut hasher = Sha256::new();
    update_with(&mut hasher, image);
    ContentHash::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, GraphicsFormat};

    #[test]
    fn test_hash_deterministic() {
        let a = ImageBuffer::solid(10, 10, GraphicsFormat::R8G8B8A8Unorm, &Color::RED).unwrap();
        let b = ImageBuffer::solid(10, 10, GraphicsFormat::R8G8B8A8Unorm, &Color::RED).unwrap();
        assert_eq!(hash_image(&a), hash_image(&b));
    }

    #[test]
    fn test_hash_differs_by_size() {
        let a = ImageBuffer::solid(10, 10, GraphicsFormat::R8G8B8A8Unorm, &Color::RED).unwrap();
        let b = ImageBuffer::solid(5, 20, GraphicsFormat::R8G8B8A8Unorm, &Color::RED).unwrap();
        assert_ne!(hash_image(&a), hash_image(&b));
    }

    #[test]
    fn test_hash_hex_length() {
        let a = ImageBuffer::new(1, 1, GraphicsFormat::R8G8B8A8Unorm).unwrap();
        assert_eq!(hash_image(&a).to_hex().len(), 64);
    }
}
