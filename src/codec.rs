use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Encoding of request and response payloads carried as gRPC bytes.
pub trait PayloadCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T>;
}

// MessagePack codec (wire format between runner and clients)
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl PayloadCodec for MsgPackCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let buf = rmp_serde::to_vec_named(value)?;
        Ok(buf)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        let value = rmp_serde::from_slice(data)?;
        Ok(value)
    }
}

// JSON codec, for debugging and the CLI's file input
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}
