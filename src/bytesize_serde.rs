//! Serialises `ByteSize` values as plain byte counts.

use bytesize::ByteSize;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialise `ByteSize` as a u64 byte count for lossless round-tripping.
pub(crate) fn serialize<S: Serializer>(size: &ByteSize, serializer: S) -> Result<S::Ok, S::Error> {
    size.as_u64().serialize(serializer)
}

/// Deserialise `ByteSize` from a u64 byte count.
pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ByteSize, D::Error> {
    let bytes = u64::deserialize(deserializer)?;
    Ok(ByteSize(bytes))
}
