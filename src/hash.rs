use std::fmt::{self, Display};
use std::hash::Hasher;
use std::str::FromStr;

use md5::{Digest, Md5};
#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher;

use crate::error::Error;

const FNV_32_INIT: u32 = 0x811c_9dc5;
const FNV_32_PRIME: u32 = 0x0100_0193;
const FNV_64_INIT: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_64_PRIME: u64 = 0x0000_0100_0000_01b3;
const FNV_128_INIT: u128 = 0x6c62_272e_07bb_0142_62b8_2175_6295_c58d;
const FNV_128_PRIME: u128 = 0x0000_0000_0100_0000_0000_0000_0000_013b;

/// HashAlgorithm turns a key into one or more positions on the ring
///
/// All variants are deterministic and stateless. Every variant returns exactly one
/// position per call except [`HashAlgorithm::Ketama`], which returns four: the MD5 digest
/// of the key split into four little-endian `u32` chunks.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "derive", serde(rename_all = "kebab-case"))]
pub enum HashAlgorithm {
    /// IEEE CRC-32
    Crc32,
    /// CRC-32 shifted right by 16 and masked to 15 bits, as libmemcached and Perl clients do
    Crc32Perl,
    #[cfg_attr(feature = "derive", serde(rename = "fnv1-32"))]
    Fnv1_32,
    #[cfg_attr(feature = "derive", serde(rename = "fnv1a-32"))]
    Fnv1a_32,
    #[cfg_attr(feature = "derive", serde(rename = "fnv1-64"))]
    Fnv1_64,
    #[cfg_attr(feature = "derive", serde(rename = "fnv1a-64"))]
    Fnv1a_64,
    #[cfg_attr(feature = "derive", serde(rename = "fnv1-128"))]
    Fnv1_128,
    #[cfg_attr(feature = "derive", serde(rename = "fnv1a-128"))]
    Fnv1a_128,
    /// SipHash-2-4 with zero keys
    Sip,
    /// MD5 based, four positions per call
    #[default]
    Ketama,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 10] = [
        HashAlgorithm::Crc32,
        HashAlgorithm::Crc32Perl,
        HashAlgorithm::Fnv1_32,
        HashAlgorithm::Fnv1a_32,
        HashAlgorithm::Fnv1_64,
        HashAlgorithm::Fnv1a_64,
        HashAlgorithm::Fnv1_128,
        HashAlgorithm::Fnv1a_128,
        HashAlgorithm::Sip,
        HashAlgorithm::Ketama,
    ];

    /// Hash `key` into a non-empty list of ring positions.
    pub fn hash(&self, key: &[u8]) -> Vec<u32> {
        match self {
            HashAlgorithm::Ketama => ketama(key).to_vec(),
            _ => vec![self.hash_first(key)],
        }
    }

    /// The first position `hash` would return. This is the position used to look up keys.
    pub fn hash_first(&self, key: &[u8]) -> u32 {
        match self {
            HashAlgorithm::Crc32 => crc32fast::hash(key),
            HashAlgorithm::Crc32Perl => (crc32fast::hash(key) >> 16) & 0x7fff,
            HashAlgorithm::Fnv1_32 => key.iter().fold(FNV_32_INIT, |hash, b| {
                hash.wrapping_mul(FNV_32_PRIME) ^ u32::from(*b)
            }),
            HashAlgorithm::Fnv1a_32 => key.iter().fold(FNV_32_INIT, |hash, b| {
                (hash ^ u32::from(*b)).wrapping_mul(FNV_32_PRIME)
            }),
            HashAlgorithm::Fnv1_64 => key.iter().fold(FNV_64_INIT, |hash, b| {
                hash.wrapping_mul(FNV_64_PRIME) ^ u64::from(*b)
            }) as u32,
            HashAlgorithm::Fnv1a_64 => key.iter().fold(FNV_64_INIT, |hash, b| {
                (hash ^ u64::from(*b)).wrapping_mul(FNV_64_PRIME)
            }) as u32,
            HashAlgorithm::Fnv1_128 => key.iter().fold(FNV_128_INIT, |hash, b| {
                hash.wrapping_mul(FNV_128_PRIME) ^ u128::from(*b)
            }) as u32,
            HashAlgorithm::Fnv1a_128 => key.iter().fold(FNV_128_INIT, |hash, b| {
                (hash ^ u128::from(*b)).wrapping_mul(FNV_128_PRIME)
            }) as u32,
            HashAlgorithm::Sip => {
                let mut hasher = SipHasher::new();
                hasher.write(key);
                hasher.finish() as u32
            }
            HashAlgorithm::Ketama => ketama(key)[0],
        }
    }

    /// Number of positions a single call to `hash` yields.
    pub fn width(&self) -> usize {
        match self {
            HashAlgorithm::Ketama => 4,
            _ => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Crc32 => "crc32",
            HashAlgorithm::Crc32Perl => "crc32-perl",
            HashAlgorithm::Fnv1_32 => "fnv1-32",
            HashAlgorithm::Fnv1a_32 => "fnv1a-32",
            HashAlgorithm::Fnv1_64 => "fnv1-64",
            HashAlgorithm::Fnv1a_64 => "fnv1a-64",
            HashAlgorithm::Fnv1_128 => "fnv1-128",
            HashAlgorithm::Fnv1a_128 => "fnv1a-128",
            HashAlgorithm::Sip => "sip",
            HashAlgorithm::Ketama => "ketama",
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HashAlgorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownHashAlgorithm(s.to_string()))
    }
}

fn ketama(key: &[u8]) -> [u32; 4] {
    let digest = Md5::digest(key);
    let mut positions = [0u32; 4];
    for (position, chunk) in positions.iter_mut().zip(digest.chunks_exact(4)) {
        *position = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    positions
}
