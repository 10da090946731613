use crate::common::{error::Error, Key};

use std::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;

// Stretches one seed into the four keys ahash takes. Fractional digits of pi.
const PI: [u64; 3] = [0x243f_6a88_85a3_08d3, 0x1319_8a2e_0370_7344, 0xa409_3822_299f_31d0];

/// The two independent hash functions of a table.
pub(crate) struct LevelHasher {
    f_seed: u64,
    s_seed: u64,
    first: RandomState,
    second: RandomState,
}

impl LevelHasher {
    /// Creates the hash functions from two seeds drawn from the OS entropy
    /// source. Draws repeat until the seeds differ.
    pub(crate) fn random() -> Result<Self, Error> {
        loop {
            let f_seed = random_seed()?;
            let s_seed = random_seed()?;
            if f_seed != s_seed {
                return Self::with_seeds(f_seed, s_seed);
            }
        }
    }

    pub(crate) fn with_seeds(f_seed: u64, s_seed: u64) -> Result<Self, Error> {
        if f_seed == s_seed {
            return Err(Error::InvalidSeeds);
        }
        Ok(Self {
            f_seed,
            s_seed,
            first: build_hasher(f_seed),
            second: build_hasher(s_seed),
        })
    }

    pub(crate) fn seeds(&self) -> (u64, u64) {
        (self.f_seed, self.s_seed)
    }

    #[inline]
    pub(crate) fn first_hash(&self, key: &Key) -> u64 {
        hash(&self.first, key)
    }

    #[inline]
    pub(crate) fn second_hash(&self, key: &Key) -> u64 {
        hash(&self.second, key)
    }

    #[inline]
    pub(crate) fn hashes(&self, key: &Key) -> Hashes {
        Hashes {
            first: self.first_hash(key),
            second: self.second_hash(key),
        }
    }
}

/// Both hashes of one key, computed once per operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Hashes {
    pub(crate) first: u64,
    pub(crate) second: u64,
}

impl Hashes {
    /// Returns the two candidate bucket indices of this key in a level of
    /// `capacity` buckets.
    #[inline]
    pub(crate) fn indices(&self, capacity: usize) -> (usize, usize) {
        (
            first_index(self.first, capacity),
            second_index(self.second, capacity),
        )
    }
}

/// Maps a hash into the lower half of a level of `capacity` buckets.
#[inline]
pub(crate) fn first_index(hash: u64, capacity: usize) -> usize {
    (hash % (capacity as u64 / 2)) as usize
}

/// Maps a hash into the upper half of a level of `capacity` buckets, so it
/// can never collide with `first_index` of the same level.
#[inline]
pub(crate) fn second_index(hash: u64, capacity: usize) -> usize {
    let half = capacity as u64 / 2;
    (hash % half + half) as usize
}

fn hash<H: BuildHasher>(build_hasher: &H, key: &Key) -> u64 {
    let mut hasher = build_hasher.build_hasher();
    key.hash(&mut hasher);

    hasher.finish()
}

fn build_hasher(seed: u64) -> RandomState {
    RandomState::with_seeds(seed, seed ^ PI[0], seed.rotate_left(32) ^ PI[1], !seed ^ PI[2])
}

fn random_seed() -> Result<u64, Error> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf).map_err(|e| Error::SeedGeneration(e.to_string()))?;
    Ok(u64::from_ne_bytes(buf))
}
