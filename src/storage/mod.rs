// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Blob storage for post images.

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseStorage;
pub use memory::MemoryBlobStore;

use crate::error::Result;
use async_trait::async_trait;

/// File upload returning a retrievable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path` and return its download URL.
    async fn upload_blob(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Object path for a post image: `posts/{uid}_{millis}.jpg`.
pub fn post_image_path(uid: &str, millis: i64) -> String {
    format!("posts/{}_{}.jpg", uid, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_image_path() {
        assert_eq!(
            post_image_path("uid-1", 1_700_000_000_000),
            "posts/uid-1_1700000000000.jpg"
        );
    }
}
