use bytes::{Bytes, BytesMut};

use super::*;

#[test]
fn test_fragment_header_roundtrip() -> Result<()> {
    let header = FragmentHeader {
        message_id: 0xDEAD_BEEF,
        frag_idx: 19,
        n: 20,
        k: 16,
        padlen: 16375,
        block_idx: 2,
        num_blocks: 3,
    };

    let raw = header.marshal()?;
    assert_eq!(raw.len(), HEADER_SIZE, "header must marshal to exactly {HEADER_SIZE} bytes");

    let parsed = FragmentHeader::unmarshal(&raw)?;
    assert_eq!(parsed, header, "unmarshal should invert marshal");

    Ok(())
}

#[test]
fn test_fragment_header_wire_layout() -> Result<()> {
    let header = FragmentHeader {
        message_id: 0x0403_0201,
        frag_idx: 0x0605,
        n: 0x0807,
        k: 0x0A09,
        padlen: 0x0E0D_0C0B,
        block_idx: 0x1211_100F,
        num_blocks: 0x1413,
    };

    let raw = header.marshal()?;
    let expected: Vec<u8> = (1..=20).collect();
    assert_eq!(
        &raw[..],
        &expected[..],
        "every field must sit at its little-endian offset"
    );

    Ok(())
}

#[test]
fn test_fragment_header_too_small() {
    for len in 0..HEADER_SIZE {
        let raw = Bytes::from(vec![0u8; len]);
        let result = FragmentHeader::unmarshal(&raw);
        assert_eq!(
            result,
            Err(Error::ErrHeaderTooSmall),
            "a {len}-byte buffer must be rejected"
        );
    }
}

#[test]
fn test_fragment_header_ignores_body() -> Result<()> {
    let header = FragmentHeader {
        message_id: 7,
        frag_idx: 0,
        n: 20,
        k: 16,
        padlen: 0,
        block_idx: 0,
        num_blocks: 1,
    };

    let mut datagram = BytesMut::new();
    header.marshal_to(&mut datagram)?;
    datagram.extend_from_slice(&[0xAB; 1024]);

    let parsed = FragmentHeader::unmarshal(&datagram.freeze())?;
    assert_eq!(parsed, header, "trailing fragment bytes must not affect the header");

    Ok(())
}
