use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Bytes of the image-length prefix at the front of every payload.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Build the self-describing payload `u32_le(image.len()) || image || metadata`.
///
/// Neither buffer is inspected; the image is expected to already be an
/// encoded JPEG and the metadata a compact UTF-8 JSON document, but the
/// framer carries arbitrary bytes.
pub fn frame(image: &[u8], metadata: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + image.len() + metadata.len());
    buf.put_u32_le(image.len() as u32);
    buf.put_slice(image);
    buf.put_slice(metadata);
    buf.freeze()
}

/// Split a reconstructed payload back into `(image, metadata)`.
///
/// The metadata segment is bounded only by the payload length, so the zero
/// bytes the terminal block's padding appended are trimmed from its tail.
/// Metadata that legitimately ends in zero bytes would lose them; the wire
/// format carries no metadata length to tell the difference.
pub fn deframe(payload: &Bytes) -> Result<(Bytes, Bytes)> {
    if payload.len() < LENGTH_PREFIX_SIZE {
        return Err(Error::ErrPayloadTooShort);
    }

    let mut reader = payload.clone();
    let image_len = reader.get_u32_le() as usize;
    if image_len > reader.remaining() {
        return Err(Error::ErrImageLengthOutOfRange {
            image_len,
            payload_len: payload.len(),
        });
    }

    let image = payload.slice(LENGTH_PREFIX_SIZE..LENGTH_PREFIX_SIZE + image_len);

    let metadata_raw = &payload[LENGTH_PREFIX_SIZE + image_len..];
    let trimmed = metadata_raw.len() - metadata_raw.iter().rev().take_while(|&&b| b == 0).count();
    let metadata = payload.slice(
        LENGTH_PREFIX_SIZE + image_len..LENGTH_PREFIX_SIZE + image_len + trimmed,
    );

    Ok((image, metadata))
}

#[cfg(test)]
mod payload_test;
