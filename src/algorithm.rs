use std::fmt;

use serde::Serialize;

/// An algorithm registered with the Linux kernel crypto API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Algorithm {
    pub name: String,
    pub driver: String,
    pub module: String,
    /// Zero when the kernel omits the priority attribute.
    pub priority: u32,
    /// Raw `cra_flags` of the algorithm.
    pub flags: u32,
    pub ref_count: u32,
    #[serde(rename = "type")]
    pub alg_type: AlgorithmType,
}

/// The kind of an algorithm, determined by which report attribute the kernel
/// sent with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AlgorithmType {
    /// No report was sent, or its kind is not modeled.
    #[default]
    Unknown,
    Cipher(Cipher),
    Hash(Hash),
}

/// A cipher algorithm, from `struct crypto_report_cipher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cipher {
    pub block_size: u32,
    pub min_key_size: u32,
    pub max_key_size: u32,
    /// Kernel type label, e.g. "cipher".
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A hash algorithm, from `struct crypto_report_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hash {
    pub block_size: u32,
    pub digest_size: u32,
    /// Kernel type label, e.g. "shash".
    #[serde(rename = "type")]
    pub type_name: String,
}

impl AlgorithmType {
    /// The type label reported by the kernel.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            AlgorithmType::Unknown => None,
            AlgorithmType::Cipher(c) => Some(&c.type_name),
            AlgorithmType::Hash(h) => Some(&h.type_name),
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmType::Unknown => write!(f, "unknown"),
            AlgorithmType::Cipher(c) => write!(
                f,
                "{}: {} {}/{}",
                c.type_name, c.block_size, c.min_key_size, c.max_key_size
            ),
            AlgorithmType::Hash(h) => {
                write!(f, "{}: {} {}", h.type_name, h.digest_size, h.block_size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name() {
        let hash = AlgorithmType::Hash(Hash {
            block_size: 64,
            digest_size: 20,
            type_name: "shash".to_string(),
        });
        assert_eq!(hash.type_name(), Some("shash"));
        assert_eq!(AlgorithmType::Unknown.type_name(), None);
    }

    #[test]
    fn test_display() {
        let cipher = AlgorithmType::Cipher(Cipher {
            block_size: 16,
            min_key_size: 16,
            max_key_size: 32,
            type_name: "cipher".to_string(),
        });
        assert_eq!(cipher.to_string(), "cipher: 16 16/32");

        let hash = AlgorithmType::Hash(Hash {
            block_size: 64,
            digest_size: 20,
            type_name: "shash".to_string(),
        });
        assert_eq!(hash.to_string(), "shash: 20 64");
    }

    #[test]
    fn test_serialize_tags_kind() {
        let alg = Algorithm {
            name: "sha1".to_string(),
            driver: "sha1-generic".to_string(),
            module: "kernel".to_string(),
            priority: 100,
            flags: 0,
            ref_count: 1,
            alg_type: AlgorithmType::Hash(Hash {
                block_size: 64,
                digest_size: 20,
                type_name: "shash".to_string(),
            }),
        };

        let value = serde_json::to_value(&alg).unwrap();
        assert_eq!(value["name"], "sha1");
        assert_eq!(value["type"]["kind"], "hash");
        assert_eq!(value["type"]["type"], "shash");
        assert_eq!(value["type"]["digest_size"], 20);

        let unknown = serde_json::to_value(AlgorithmType::Unknown).unwrap();
        assert_eq!(unknown["kind"], "unknown");
    }
}
