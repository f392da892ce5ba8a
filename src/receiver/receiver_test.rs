use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::*;
use crate::fragment::FragmentHeader;
use crate::sender::{encode_message, send_message};

fn test_config() -> TransportConfig {
    TransportConfig {
        pacing_delay: Duration::ZERO,
        drain_delay: Duration::ZERO,
        ..TransportConfig::default()
    }
}

#[tokio::test]
async fn test_loopback_roundtrip() -> Result<()> {
    let config = test_config();
    let receiver = Receiver::bind("127.0.0.1:0".parse().map_err(|_| Error::Other("addr".into()))?, &config)?;
    let addr = receiver.local_addr()?;

    let (delivery_tx, mut delivery_rx) = mpsc::channel(1);
    let handle = tokio::spawn(receiver.run(delivery_tx));

    let image = vec![0xC3u8; 5000];
    let metadata = br#"{"loopback":true}"#;
    let message = encode_message(91, &image, metadata, &config)?;

    let sock = UdpSocket::bind("127.0.0.1:0").await?;
    sock.connect(addr).await?;
    send_message(&sock, &message, &config).await?;

    let delivered = timeout(Duration::from_secs(5), delivery_rx.recv())
        .await
        .map_err(|_| Error::Other("timed out waiting for delivery".into()))?
        .ok_or_else(|| Error::Other("receive loop ended early".into()))?;

    assert_eq!(delivered.message_id, 91);
    assert_eq!(&delivered.image[..], &image[..]);
    assert_eq!(&delivered.metadata[..], metadata);

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_loopback_survives_loss_and_noise() -> Result<()> {
    let config = test_config();
    let receiver = Receiver::bind("127.0.0.1:0".parse().map_err(|_| Error::Other("addr".into()))?, &config)?;
    let addr = receiver.local_addr()?;

    let (delivery_tx, mut delivery_rx) = mpsc::channel(1);
    let handle = tokio::spawn(receiver.run(delivery_tx));

    let image = vec![0x11u8; 2000];
    let metadata = b"{}";
    let message = encode_message(92, &image, metadata, &config)?;

    let sock = UdpSocket::bind("127.0.0.1:0").await?;
    sock.connect(addr).await?;

    // A runt datagram the loop must reject without falling over.
    sock.send(&[0u8; 5]).await?;

    // Only the K lowest-indexed fragments of each block.
    for datagram in &message.datagrams {
        let header = FragmentHeader::unmarshal(datagram)?;
        if header.frag_idx < header.k {
            sock.send(datagram).await?;
        }
    }

    let delivered = timeout(Duration::from_secs(5), delivery_rx.recv())
        .await
        .map_err(|_| Error::Other("timed out waiting for delivery".into()))?
        .ok_or_else(|| Error::Other("receive loop ended early".into()))?;

    assert_eq!(delivered.message_id, 92);
    assert_eq!(&delivered.image[..], &image[..]);
    assert_eq!(&delivered.metadata[..], metadata);

    handle.abort();
    Ok(())
}

#[tokio::test]
async fn test_run_stops_when_consumer_drops() -> Result<()> {
    let config = test_config();
    let receiver = Receiver::bind("127.0.0.1:0".parse().map_err(|_| Error::Other("addr".into()))?, &config)?;
    let addr = receiver.local_addr()?;

    let (delivery_tx, delivery_rx) = mpsc::channel(1);
    let handle = tokio::spawn(receiver.run(delivery_tx));
    drop(delivery_rx);

    let message = encode_message(93, &[0x01], b"{}", &config)?;
    let sock = UdpSocket::bind("127.0.0.1:0").await?;
    sock.connect(addr).await?;
    send_message(&sock, &message, &config).await?;

    let result = timeout(Duration::from_secs(5), handle)
        .await
        .map_err(|_| Error::Other("loop did not stop".into()))?;
    match result {
        Ok(inner) => inner?,
        Err(e) => return Err(Error::Other(format!("join failed: {e}"))),
    }

    Ok(())
}
