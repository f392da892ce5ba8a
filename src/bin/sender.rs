use std::io::Write;

use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg};
use tokio::net::UdpSocket;

use fecbridge::{encode_message, send_message, TransportConfig};

// RUST_LOG=debug cargo run --bin sender -- --server 127.0.0.1:5005 --image img_src/small_plant.jpg --features feature_src/starter.json

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} [{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                chrono::Local::now().format("%H:%M:%S.%6f"),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let mut app = App::new("FEC Bridge Sender")
        .version("0.1.0")
        .author("FEC Bridge Developers")
        .about("Sends an image and a metadata document over a lossy one-way link")
        .setting(AppSettings::DeriveDisplayOrder)
        .arg(
            Arg::with_name("FULLHELP")
                .help("Prints more detailed help information")
                .long("fullhelp"),
        )
        .arg(
            Arg::with_name("server")
                .required_unless("FULLHELP")
                .takes_value(true)
                .long("server")
                .help("Receiver address, e.g. 127.0.0.1:5005"),
        )
        .arg(
            Arg::with_name("image")
                .required_unless("FULLHELP")
                .takes_value(true)
                .long("image")
                .help("Path to the JPEG image to send"),
        )
        .arg(
            Arg::with_name("features")
                .required_unless("FULLHELP")
                .takes_value(true)
                .long("features")
                .help("Path to the JSON metadata document to send"),
        )
        .arg(
            Arg::with_name("message-id")
                .takes_value(true)
                .long("message-id")
                .help("Message identifier (random when omitted)"),
        )
        .arg(
            Arg::with_name("fragment-size")
                .takes_value(true)
                .long("fragment-size")
                .help("Fragment size in bytes (must match the receiver)"),
        );

    let matches = app.clone().get_matches();

    if matches.is_present("FULLHELP") {
        app.print_long_help().unwrap();
        std::process::exit(0);
    }

    let server = matches.value_of("server").unwrap();
    let image_path = matches.value_of("image").unwrap();
    let features_path = matches.value_of("features").unwrap();

    let mut config = TransportConfig::default();
    if let Some(fragment_size) = matches.value_of("fragment-size") {
        config.fragment_size = fragment_size
            .parse()
            .context("fragment-size must be a positive integer")?;
    }

    let message_id = match matches.value_of("message-id") {
        Some(id) => id.parse().context("message-id must be a u32")?,
        None => rand::random::<u32>(),
    };

    let image = std::fs::read(image_path)
        .with_context(|| format!("failed to read image {image_path}"))?;

    // Round-trip the metadata document so the wire carries its compact form.
    let features_raw = std::fs::read(features_path)
        .with_context(|| format!("failed to read features {features_path}"))?;
    let features: serde_json::Value = serde_json::from_slice(&features_raw)
        .with_context(|| format!("{features_path} is not valid JSON"))?;
    let metadata = serde_json::to_vec(&features)?;

    let message = encode_message(message_id, &image, &metadata, &config)?;
    log::info!(
        "payload is {} image bytes + {} metadata bytes; {}",
        image.len(),
        metadata.len(),
        message.params
    );

    let sock = UdpSocket::bind("0.0.0.0:0").await?;
    sock.connect(server)
        .await
        .with_context(|| format!("failed to connect to {server}"))?;

    send_message(&sock, &message, &config).await?;
    log::info!("message {message_id} sent");

    Ok(())
}
