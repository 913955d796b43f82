//! Sharder implementation.
//!
//! Rollout buckets and variation picks must be identical across process restarts, machines and
//! language ports, so sharding uses a fixed MD5-derived hash rather than `std::hash`.

/// Maps a key to a shard in `0..total_shards`.
pub trait Sharder {
    /// Shard `parts` joined by `':'`. `total_shards` must be non-zero.
    fn get_shard(&self, parts: &[&str], total_shards: u64) -> u64;
}

/// The default (and only) sharder: first four bytes of the MD5 digest, big-endian, modulo
/// `total_shards`.
pub struct Md5Sharder;

impl Sharder for Md5Sharder {
    fn get_shard(&self, parts: &[&str], total_shards: u64) -> u64 {
        // Streaming the parts avoids allocating the joined key on every evaluation.
        let mut context = md5::Context::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                context.consume(b":");
            }
            context.consume(part.as_bytes());
        }
        let hash = context.compute();
        let value = u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]);
        u64::from(value) % total_shards
    }
}

#[cfg(test)]
mod tests {
    use super::{Md5Sharder, Sharder};

    #[test]
    fn test_md5_sharder() {
        assert_eq!(Md5Sharder.get_shard(&["test-input"], 10_000), 5619);
        assert_eq!(Md5Sharder.get_shard(&["alice"], 10_000), 3170);
        assert_eq!(Md5Sharder.get_shard(&["alice"], 100), 70);
    }

    #[test]
    fn parts_are_joined_with_colon() {
        assert_eq!(
            Md5Sharder.get_shard(&["user-1", "new-checkout"], 10_000),
            Md5Sharder.get_shard(&["user-1:new-checkout"], 10_000)
        );
        assert_eq!(Md5Sharder.get_shard(&["user-1", "new-checkout"], 10_000), 7861);
        assert_eq!(Md5Sharder.get_shard(&["u1", "f1"], 100), 69);
        assert_eq!(Md5Sharder.get_shard(&["u1", "f2"], 100), 12);
    }
}
