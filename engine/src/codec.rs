//! Payload codecs.
//!
//! A [`Codec`] turns raw payload bytes into a record that exposes its header
//! stamp, and back. Everything the engine does not touch must survive the
//! round trip unchanged.

use crate::{
    error::{Error, Result},
    timestamp::{Stamp, Timestamp},
};

/// A decoded record carrying a header stamp.
pub trait Stamped {
    /// The header stamp as decoded.
    fn stamp(&self) -> Stamp;

    /// Replace the header stamp, leaving every other field as is.
    fn set_stamp(&mut self, stamp: Stamp);
}

/// Decoder/encoder for the payloads of a session.
pub trait Codec {
    type Record: Stamped;

    /// Decode a payload read from `stream`.
    fn decode(&self, stream: &str, data: &[u8]) -> Result<Self::Record>;

    /// Encode a record for `stream`.
    fn encode(&self, stream: &str, record: &Self::Record) -> Result<Vec<u8>>;

    /// Decode a payload and return its validated header time.
    ///
    /// An out-of-range nanosecond field is reported as a decode error.
    fn timestamp(&self, stream: &str, data: &[u8]) -> Result<Timestamp> {
        let record = self.decode(stream, data)?;
        Timestamp::try_from(record.stamp()).map_err(|e| Error::decode(stream, e))
    }
}

const HEADER_LEN: usize = 12;

/// Record produced by [`FixedHeaderCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub stamp: Stamp,
    pub body: Vec<u8>,
}

impl Stamped for HeaderRecord {
    fn stamp(&self) -> Stamp {
        self.stamp
    }

    fn set_stamp(&mut self, stamp: Stamp) {
        self.stamp = stamp;
    }
}

/// Binary codec for payloads that start with a fixed 12-byte header:
/// `sec` as little-endian `i64`, then `nanosec` as little-endian `u32`.
/// The rest of the payload is carried through opaquely.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedHeaderCodec;

impl FixedHeaderCodec {
    /// Build a payload from a stamp and an opaque body.
    pub fn payload(stamp: Stamp, body: &[u8]) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_LEN + body.len());
        data.extend_from_slice(&stamp.sec.to_le_bytes());
        data.extend_from_slice(&stamp.nanosec.to_le_bytes());
        data.extend_from_slice(body);
        data
    }

    /// Build a payload stamped at `ts`.
    pub fn payload_at(ts: Timestamp, body: &[u8]) -> Vec<u8> {
        Self::payload(ts.to_stamp(), body)
    }
}

impl Codec for FixedHeaderCodec {
    type Record = HeaderRecord;

    fn decode(&self, stream: &str, data: &[u8]) -> Result<HeaderRecord> {
        if data.len() < HEADER_LEN {
            return Err(Error::decode(
                stream,
                format!("payload is {} bytes, header needs {}", data.len(), HEADER_LEN),
            ));
        }
        let (sec, rest) = data.split_at(8);
        let (nanosec, body) = rest.split_at(4);
        let sec = i64::from_le_bytes(sec.try_into().map_err(|e| Error::decode(stream, e))?);
        let nanosec =
            u32::from_le_bytes(nanosec.try_into().map_err(|e| Error::decode(stream, e))?);

        Ok(HeaderRecord {
            stamp: Stamp::new(sec, nanosec),
            body: body.to_vec(),
        })
    }

    fn encode(&self, _stream: &str, record: &HeaderRecord) -> Result<Vec<u8>> {
        Ok(Self::payload(record.stamp, &record.body))
    }
}
