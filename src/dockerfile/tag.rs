//! Cache tag naming
//!
//! Cache tags live under a dedicated namespace so they can never be
//! mistaken for a user's own base image:
//!
//! | Source reference            | Cache tag                                   |
//! |-----------------------------|---------------------------------------------|
//! | `base:1.0`                  | `<ns>/base:1.0`                             |
//! | `base@sha256:<hash>`        | `<ns>/base:from_sha256__<hash>` (truncated) |
//! | `base`                      | `<ns>/base:latest`                          |

/// Registry limit on the length of the tag component
pub const MAX_TAG_LEN: usize = 128;

/// Compute the cache tag for a base image.
///
/// A tag takes precedence over a digest when both are present. Digest tags
/// keep their `from_<algorithm>__` prefix and lose trailing hash characters
/// when the tag component would exceed [`MAX_TAG_LEN`].
pub fn compute_cache_tag(
    namespace: &str,
    image_name: &str,
    tag: Option<&str>,
    digest: Option<&str>,
) -> String {
    let tag = match (tag, digest) {
        (Some(tag), _) => sanitize_tag(tag),
        (None, Some(digest)) => {
            let (algorithm, hash) = digest.split_once(':').unwrap_or(("digest", digest));
            let prefix = sanitize_tag(&format!("from_{}__", algorithm));
            let room = MAX_TAG_LEN.saturating_sub(prefix.len());
            let hash: String = sanitize_tag(hash).chars().take(room).collect();
            format!("{}{}", prefix, hash)
        }
        (None, None) => "latest".to_string(),
    };

    format!("{}/{}:{}", namespace, image_name, tag)
}

/// Whether a reference points into the cache namespace
pub fn is_cache_tag(reference: &str, namespace: &str) -> bool {
    reference
        .strip_prefix(namespace)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Replace characters that are not valid in a tag and enforce the
/// length limit. Tags may not start with `.` or `-`.
fn sanitize_tag(raw: &str) -> String {
    let mut tag: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_TAG_LEN)
        .collect();

    if tag.starts_with(['.', '-']) {
        tag.replace_range(..1, "_");
    }
    if tag.is_empty() {
        tag.push_str("latest");
    }
    tag
}
