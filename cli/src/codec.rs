//! JSON payload codec reading `header.stamp`.

use serde_json::{Map, Value};
use stampsync_engine::{Codec, Error, Result, Stamp, Stamped};

/// A decoded JSON message with its header stamp pulled out.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    value: Value,
    stamp: Stamp,
}

impl Stamped for JsonRecord {
    fn stamp(&self) -> Stamp {
        self.stamp
    }

    fn set_stamp(&mut self, stamp: Stamp) {
        self.stamp = stamp;
    }
}

/// Codec for JSON payloads shaped like ROS messages:
/// `{"header": {"stamp": {"sec": .., "nanosec": ..}, ..}, ..}`.
///
/// Encoding only replaces the two stamp fields; key order is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStampCodec;

fn stamp_object(value: &Value) -> Option<&Map<String, Value>> {
    value.get("header")?.get("stamp")?.as_object()
}

impl Codec for JsonStampCodec {
    type Record = JsonRecord;

    fn decode(&self, stream: &str, data: &[u8]) -> Result<JsonRecord> {
        let value: Value = serde_json::from_slice(data).map_err(|e| Error::decode(stream, e))?;
        let stamp = stamp_object(&value)
            .ok_or_else(|| Error::decode(stream, "missing header.stamp"))?;

        let sec = stamp
            .get("sec")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::decode(stream, "header.stamp.sec is not an integer"))?;
        let nanosec = stamp
            .get("nanosec")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| Error::decode(stream, "header.stamp.nanosec is not a u32"))?;

        Ok(JsonRecord {
            stamp: Stamp::new(sec, nanosec),
            value,
        })
    }

    fn encode(&self, stream: &str, record: &JsonRecord) -> Result<Vec<u8>> {
        let mut value = record.value.clone();
        let stamp = value
            .pointer_mut("/header/stamp")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| Error::encode(stream, "missing header.stamp"))?;
        stamp.insert("sec".into(), record.stamp.sec.into());
        stamp.insert("nanosec".into(), record.stamp.nanosec.into());

        serde_json::to_vec(&value).map_err(|e| Error::encode(stream, e))
    }
}
