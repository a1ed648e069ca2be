//! Dockerfile base-image handling
//!
//! Parses the first `FROM` of a project Dockerfile, names cache tags for
//! it, and swaps the reference in place without disturbing any other byte.

pub mod parser;
pub mod rewrite;
pub mod tag;

pub use parser::{parse, ArgDeclaration, BuildFileImage, ImageReference};
pub use rewrite::{reduced_build_file, restore, rewrite, rewrite_parsed};
pub use tag::{compute_cache_tag, is_cache_tag, MAX_TAG_LEN};

impl BuildFileImage {
    /// Cache tag for this base image under `namespace`
    pub fn cache_tag(&self, namespace: &str) -> String {
        compute_cache_tag(
            namespace,
            &self.image.name,
            self.image.tag.as_deref(),
            self.image.digest.as_deref(),
        )
    }
}
