//! # Record Ids
//!
//! 12 bytes, shown as 24 hex characters so ids look the same as the ones the
//! old Mongo-backed frontend already links to.
//!
//! - 4 bytes: big-endian creation time in seconds
//! - 5 bytes: random per process
//! - 3 bytes: counter, starts at a random value
use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::{
        OnceLock,
        atomic::{AtomicU32, Ordering},
    },
};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

pub const ID_LEN: usize = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cast to ObjectId failed for value \"{0}\"")]
pub struct ParseIdError(pub String);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId([u8; ID_LEN]);

static PROCESS_BYTES: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

impl RecordId {
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let process = PROCESS_BYTES.get_or_init(rand::random::<[u8; 5]>);
        let count = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>()))
            .fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        // low 24 bits of the counter
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        Self(bytes)
    }
}

impl FromStr for RecordId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LEN * 2 {
            return Err(ParseIdError(s.to_string()));
        }

        let mut bytes = [0u8; ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseIdError(s.to_string()))?;

        Ok(Self(bytes))
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({self})")
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: RecordId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();
        assert_eq!(id.to_string(), "65a1b2c3d4e5f60718293a4b");

        let upper: RecordId = "65A1B2C3D4E5F60718293A4B".parse().unwrap();
        assert_eq!(upper, id);
    }

    #[test]
    fn test_zero_id_is_well_formed() {
        let id: RecordId = "000000000000000000000000".parse().unwrap();
        assert_eq!(id.to_string(), "0".repeat(ID_LEN * 2));
    }

    #[test]
    fn test_malformed() {
        assert!("".parse::<RecordId>().is_err());
        assert!("1234".parse::<RecordId>().is_err());
        assert!("zzzzzzzzzzzzzzzzzzzzzzzz".parse::<RecordId>().is_err());
        assert!("000000000000000000000000a".parse::<RecordId>().is_err());

        let err = "nope".parse::<RecordId>().unwrap_err();
        assert!(err.to_string().contains("\"nope\""));
    }

    #[test]
    fn test_generate_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);

        let (a, b) = (a.to_string(), b.to_string());
        assert_eq!(a[8..18], b[8..18]);
        assert_ne!(&a[..8], "00000000");
    }

    #[test]
    fn test_serde_as_string() {
        let id: RecordId = "65a1b2c3d4e5f60718293a4b".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65a1b2c3d4e5f60718293a4b\"");
        assert_eq!(serde_json::from_str::<RecordId>(&json).unwrap(), id);
        assert!(serde_json::from_str::<RecordId>("\"bad\"").is_err());
    }
}
