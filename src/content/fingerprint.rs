use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use image::{DynamicImage, RgbImage};
use image_hasher::{HashAlg, HasherConfig};
use tokio::time::Instant;

/// Cache key for a screenshot. The perceptual hash alone folds small
/// brightness or colour shifts together, so the raw pixel bytes are hashed
/// too and only byte-identical frames share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub phash: String,
    pub content_hash: u64,
    pub width: u32,
    pub height: u32,
}

pub fn fingerprint(image: &RgbImage) -> Fingerprint {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::DoubleGradient)
        .hash_size(8, 8)
        .to_hasher();

    let (width, height) = image.dimensions();
    let hash = hasher.hash_image(&DynamicImage::ImageRgb8(image.clone()));

    let mut bytes = DefaultHasher::new();
    image.as_raw().hash(&mut bytes);

    Fingerprint {
        phash: hash.to_base64(),
        content_hash: bytes.finish(),
        width,
        height,
    }
}

/// Small bounded TTL cache. Entries expire `ttl` after insertion; when full
/// the oldest entry is evicted.
pub struct ResultCache<V> {
    ttl: Duration,
    capacity: usize,
    entries: VecDeque<(Fingerprint, Instant, V)>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &Fingerprint, now: Instant) -> Option<V> {
        self.evict_expired(now);
        self.entries
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, _, value)| value.clone())
    }

    pub fn insert(&mut self, key: Fingerprint, value: V, now: Instant) {
        self.evict_expired(now);
        self.entries.retain(|(k, _, _)| k != &key);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, now, value));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_expired(&mut self, now: Instant) {
        // Insertion order is also expiry order.
        while let Some((_, inserted, _)) = self.entries.front() {
            if now.duration_since(*inserted) < self.ttl {
                break;
            }
            self.entries.pop_front();
        }
    }
}
