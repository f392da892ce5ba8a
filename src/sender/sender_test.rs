use super::*;
use crate::config::TransportConfig;
use crate::fragment::FragmentHeader;

fn config() -> TransportConfig {
    TransportConfig::default()
}

#[test]
fn test_encode_message_emits_full_grid() -> Result<()> {
    let config = config();
    let image: Vec<u8> = (0..30_000).map(|i| (i % 256) as u8).collect();
    let message = encode_message(77, &image, br#"{"n":1}"#, &config)?;

    assert_eq!(
        message.datagrams.len(),
        message.params.num_blocks as usize * message.params.n as usize,
        "every block contributes N datagrams"
    );
    for datagram in &message.datagrams {
        assert_eq!(datagram.len(), HEADER_SIZE + config.fragment_size);
    }

    Ok(())
}

#[test]
fn test_encode_message_headers_are_consistent() -> Result<()> {
    let config = config();
    let image: Vec<u8> = vec![0x5A; 40_000];
    let message = encode_message(78, &image, b"{}", &config)?;
    let params = message.params;

    let payload_len = 4 + image.len() + 2;
    let tail = payload_len % params.block_payload_size;
    let terminal_padlen = (params.block_payload_size - tail) as u32;

    for (i, datagram) in message.datagrams.iter().enumerate() {
        let header = FragmentHeader::unmarshal(datagram)?;
        assert_eq!(header.message_id, 78);
        assert_eq!(header.k, params.k);
        assert_eq!(header.n, params.n);
        assert_eq!(header.num_blocks, params.num_blocks);
        assert_eq!(header.block_idx, (i / params.n as usize) as u32);
        assert_eq!(header.frag_idx, (i % params.n as usize) as u16);

        if header.block_idx == u32::from(params.num_blocks) - 1 {
            assert_eq!(header.padlen, terminal_padlen, "terminal block carries the pad");
        } else {
            assert_eq!(header.padlen, 0, "non-terminal blocks are unpadded");
        }
    }

    Ok(())
}

#[test]
fn test_encode_message_is_systematic_on_the_wire() -> Result<()> {
    let config = config();
    let image: Vec<u8> = (0..20_000).map(|i| (i * 3 % 256) as u8).collect();
    let metadata = br#"{"chk":true}"#;
    let message = encode_message(79, &image, metadata, &config)?;

    let payload = crate::payload::frame(&image, metadata);
    for (i, datagram) in message.datagrams.iter().enumerate() {
        let header = FragmentHeader::unmarshal(datagram)?;
        if header.frag_idx >= header.k {
            continue;
        }
        let offset = header.block_idx as usize * message.params.block_payload_size
            + header.frag_idx as usize * config.fragment_size;
        let end = (offset + config.fragment_size).min(payload.len());
        if offset >= payload.len() {
            continue;
        }
        assert_eq!(
            &datagram[HEADER_SIZE..HEADER_SIZE + (end - offset)],
            &payload[offset..end],
            "data fragment {i} must carry payload bytes verbatim"
        );
    }

    Ok(())
}

#[test]
fn test_encode_minimal_message_parameters() -> Result<()> {
    let message = encode_message(1, &[0x01, 0x02, 0x03], b"{}", &config())?;

    assert_eq!(message.params.k, 16);
    assert_eq!(message.params.n, 20);
    assert_eq!(message.params.num_blocks, 1);
    assert_eq!(message.datagrams.len(), 20);

    Ok(())
}
