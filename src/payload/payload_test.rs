use super::*;

#[test]
fn test_frame_layout() {
    let payload = frame(&[0x01, 0x02, 0x03], b"{}");
    assert_eq!(
        &payload[..],
        &[0x03, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x7B, 0x7D],
        "payload is u32_le(image_len) || image || metadata"
    );
}

#[test]
fn test_frame_deframe_roundtrip() -> Result<()> {
    let image = vec![0xFFu8; 300];
    let metadata = br#"{"targets":[{"id":4,"score":0.92}]}"#;

    let payload = frame(&image, metadata);
    let (got_image, got_metadata) = deframe(&payload)?;

    assert_eq!(&got_image[..], &image[..]);
    assert_eq!(&got_metadata[..], &metadata[..]);

    Ok(())
}

#[test]
fn test_deframe_trims_trailing_zeros() -> Result<()> {
    let image = [0x10u8, 0x20];
    let metadata = b"{\"a\":1}";

    let mut padded = frame(&image, metadata).to_vec();
    padded.extend_from_slice(&[0u8; 517]);

    let (got_image, got_metadata) = deframe(&Bytes::from(padded))?;
    assert_eq!(&got_image[..], &image[..]);
    assert_eq!(&got_metadata[..], &metadata[..], "block padding must be stripped");

    Ok(())
}

#[test]
fn test_deframe_keeps_interior_zeros() -> Result<()> {
    let image = [0u8, 0, 0];
    let metadata = [0x7Bu8, 0x00, 0x00, 0x7D];

    let payload = frame(&image, &metadata);
    let (got_image, got_metadata) = deframe(&payload)?;

    assert_eq!(&got_image[..], &image[..], "zero bytes inside the image survive");
    assert_eq!(
        &got_metadata[..],
        &metadata[..],
        "only trailing zeros are trimmed"
    );

    Ok(())
}

#[test]
fn test_deframe_empty_segments() -> Result<()> {
    let payload = frame(&[], &[]);
    let (image, metadata) = deframe(&payload)?;
    assert!(image.is_empty());
    assert!(metadata.is_empty());
    Ok(())
}

#[test]
fn test_deframe_short_payload() {
    for len in 0..LENGTH_PREFIX_SIZE {
        let payload = Bytes::from(vec![0u8; len]);
        assert_eq!(deframe(&payload), Err(Error::ErrPayloadTooShort));
    }
}

#[test]
fn test_deframe_image_length_past_end() {
    let payload = frame(&[1, 2, 3], b"{}");
    let mut corrupted = payload.to_vec();
    corrupted[0] = 0xFF;
    corrupted[1] = 0xFF;

    let result = deframe(&Bytes::from(corrupted));
    assert_eq!(
        result,
        Err(Error::ErrImageLengthOutOfRange {
            image_len: 0xFFFF,
            payload_len: 9,
        })
    );
}
