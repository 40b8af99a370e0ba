use serde_json::Value;
use thiserror::Error;

/// Errors produced while normalizing a `getblockheader` result object.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("missing field `{0}` in block header object")]
    MissingField(&'static str),
    #[error("field `{field}` is not of the expected type: {got}")]
    UnexpectedType { field: &'static str, got: String },
    #[error("field `bits` is not a base-16 unsigned integer: `{0}`")]
    MalformedBits(String),
    #[error("field `{field}` is not a 64-character hex string: `{value}`")]
    MalformedHash { field: &'static str, value: String },
}

/// One fetched block header, normalized for caching.
///
/// Records are immutable once constructed. Both construction paths, the
/// verbose `getblockheader` result and a cache row, yield value-identical
/// records for the same block.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub height: u32,
    pub n_tx: u32,
    /// Compact difficulty target. Arrives as a hex string over RPC and is
    /// persisted as a plain unsigned integer.
    pub bits: u32,
    pub difficulty: f64,
    /// Unix timestamp of the block, in seconds.
    pub time: i64,
    /// Median timestamp of the preceding blocks, in seconds.
    pub mediantime: i64,
    /// Block hash, the unique key within any persisted collection.
    pub hash: String,
    /// Successor block hash, or empty when the node knows no successor yet.
    pub nextblockhash: String,
}

impl HeaderRecord {
    /// Builds a record from the JSON object returned by a verbose
    /// `getblockheader` call.
    ///
    /// `nextblockhash` is absent for the chain tip and defaults to empty.
    /// `difficulty` is accepted as either a JSON integer or a float; any
    /// other type is an error.
    pub fn from_rpc_object(obj: &Value) -> Result<Self, HeaderError> {
        let height = require_u32(obj, "height")?;
        let n_tx = require_u32(obj, "nTx")?;

        let bits_hex = require_str(obj, "bits")?;
        let bits = u32::from_str_radix(bits_hex, 16)
            .map_err(|_| HeaderError::MalformedBits(bits_hex.to_string()))?;

        let difficulty_value = obj
            .get("difficulty")
            .ok_or(HeaderError::MissingField("difficulty"))?;
        let difficulty = difficulty_value
            .as_f64()
            .ok_or_else(|| HeaderError::UnexpectedType {
                field: "difficulty",
                got: difficulty_value.to_string(),
            })?;

        let time = require_i64(obj, "time")?;
        let mediantime = require_i64(obj, "mediantime")?;

        let hash = require_str(obj, "hash")?;
        validate_block_hash("hash", hash)?;

        let nextblockhash = match obj.get("nextblockhash") {
            None => String::new(),
            Some(_) => {
                let next = require_str(obj, "nextblockhash")?;
                if !next.is_empty() {
                    validate_block_hash("nextblockhash", next)?;
                }
                next.to_string()
            }
        };

        Ok(HeaderRecord {
            height,
            n_tx,
            bits,
            difficulty,
            time,
            mediantime,
            hash: hash.to_string(),
            nextblockhash,
        })
    }

    /// True when the node reported a successor for this block.
    pub fn has_successor(&self) -> bool {
        !self.nextblockhash.is_empty()
    }
}

fn require<'a>(obj: &'a Value, field: &'static str) -> Result<&'a Value, HeaderError> {
    obj.get(field).ok_or(HeaderError::MissingField(field))
}

fn require_u32(obj: &Value, field: &'static str) -> Result<u32, HeaderError> {
    let value = require(obj, field)?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| HeaderError::UnexpectedType {
            field,
            got: value.to_string(),
        })
}

fn require_i64(obj: &Value, field: &'static str) -> Result<i64, HeaderError> {
    let value = require(obj, field)?;
    value.as_i64().ok_or_else(|| HeaderError::UnexpectedType {
        field,
        got: value.to_string(),
    })
}

fn require_str<'a>(obj: &'a Value, field: &'static str) -> Result<&'a str, HeaderError> {
    let value = require(obj, field)?;
    value.as_str().ok_or_else(|| HeaderError::UnexpectedType {
        field,
        got: value.to_string(),
    })
}

fn validate_block_hash(field: &'static str, value: &str) -> Result<(), HeaderError> {
    if value.len() != 64 || hex::decode(value).is_err() {
        return Err(HeaderError::MalformedHash {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hash_of(ch: char) -> String {
        std::iter::repeat(ch).take(64).collect()
    }

    fn rpc_object() -> Value {
        json!({
            "hash": hash_of('a'),
            "height": 100,
            "nTx": 4,
            "bits": "1d00ffff",
            "difficulty": 3007383866.8123455_f64,
            "time": 1_231_469_665,
            "mediantime": 1_231_469_065,
            "nextblockhash": hash_of('b'),
        })
    }

    #[test]
    fn builds_from_full_rpc_object() {
        let record = HeaderRecord::from_rpc_object(&rpc_object()).unwrap();
        assert_eq!(record.height, 100);
        assert_eq!(record.n_tx, 4);
        assert_eq!(record.bits, 0x1d00ffff);
        assert_eq!(record.difficulty, 3007383866.8123455);
        assert_eq!(record.time, 1_231_469_665);
        assert_eq!(record.mediantime, 1_231_469_065);
        assert_eq!(record.hash, hash_of('a'));
        assert_eq!(record.nextblockhash, hash_of('b'));
        assert!(record.has_successor());
    }

    #[test]
    fn missing_nextblockhash_defaults_to_empty() {
        let mut obj = rpc_object();
        obj.as_object_mut().unwrap().remove("nextblockhash");
        let record = HeaderRecord::from_rpc_object(&obj).unwrap();
        assert_eq!(record.nextblockhash, "");
        assert!(!record.has_successor());
    }

    #[test]
    fn integer_difficulty_is_accepted() {
        let mut obj = rpc_object();
        obj["difficulty"] = json!(1);
        let record = HeaderRecord::from_rpc_object(&obj).unwrap();
        assert_eq!(record.difficulty, 1.0);
    }

    #[test]
    fn non_numeric_difficulty_is_rejected() {
        let mut obj = rpc_object();
        obj["difficulty"] = json!("high");
        let err = HeaderRecord::from_rpc_object(&obj).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::UnexpectedType { field: "difficulty", .. }
        ));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut obj = rpc_object();
        obj.as_object_mut().unwrap().remove("mediantime");
        let err = HeaderRecord::from_rpc_object(&obj).unwrap_err();
        assert!(matches!(err, HeaderError::MissingField("mediantime")));
    }

    #[test]
    fn unparseable_bits_is_rejected() {
        let mut obj = rpc_object();
        obj["bits"] = json!("not-hex");
        let err = HeaderRecord::from_rpc_object(&obj).unwrap_err();
        assert!(matches!(err, HeaderError::MalformedBits(_)));
    }

    #[test]
    fn short_hash_is_rejected() {
        let mut obj = rpc_object();
        obj["hash"] = json!("abcdef");
        let err = HeaderRecord::from_rpc_object(&obj).unwrap_err();
        assert!(matches!(err, HeaderError::MalformedHash { field: "hash", .. }));
    }
}
