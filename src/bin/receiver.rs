use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg};
use tokio::sync::mpsc;

use fecbridge::{DeliveredMessage, Receiver, TransportConfig};

// RUST_LOG=debug cargo run --bin receiver -- --listen 127.0.0.1:5005

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

    let mut app = App::new("FEC Bridge Receiver")
        .version("0.1.0")
        .author("FEC Bridge Developers")
        .about("Reassembles images and metadata from a lossy one-way link")
        .setting(AppSettings::DeriveDisplayOrder)
        .arg(
            Arg::with_name("FULLHELP")
                .help("Prints more detailed help information")
                .long("fullhelp"),
        )
        .arg(
            Arg::with_name("listen")
                .takes_value(true)
                .long("listen")
                .default_value("127.0.0.1:5005")
                .help("Address to bind"),
        )
        .arg(
            Arg::with_name("image-dest")
                .takes_value(true)
                .long("image-dest")
                .default_value("img_dest")
                .help("Directory that receives the reconstructed image"),
        )
        .arg(
            Arg::with_name("features-dest")
                .takes_value(true)
                .long("features-dest")
                .default_value("feature_dest")
                .help("Directory that receives the reconstructed metadata"),
        )
        .arg(
            Arg::with_name("fragment-size")
                .takes_value(true)
                .long("fragment-size")
                .help("Fragment size in bytes (must match the sender)"),
        );

    let matches = app.clone().get_matches();

    if matches.is_present("FULLHELP") {
        app.print_long_help().unwrap();
        std::process::exit(0);
    }

    let listen: SocketAddr = matches
        .value_of("listen")
        .unwrap()
        .parse()
        .context("listen must be an IP:port address")?;
    let image_dest = Path::new(matches.value_of("image-dest").unwrap());
    let features_dest = Path::new(matches.value_of("features-dest").unwrap());

    let mut config = TransportConfig::default();
    if let Some(fragment_size) = matches.value_of("fragment-size") {
        config.fragment_size = fragment_size
            .parse()
            .context("fragment-size must be a positive integer")?;
    }

    std::fs::create_dir_all(image_dest)?;
    std::fs::create_dir_all(features_dest)?;

    let (delivery_tx, mut delivery_rx) = mpsc::channel::<DeliveredMessage>(16);
    let receiver = Receiver::bind(listen, &config)?;
    let loop_handle = tokio::spawn(receiver.run(delivery_tx));

    let sinks = async {
        while let Some(message) = delivery_rx.recv().await {
            deliver_to_sinks(&message, image_dest, features_dest)?;
        }
        anyhow::Ok(())
    };

    tokio::select! {
        res = sinks => res?,
        _ = tokio::signal::ctrl_c() => {
            log::info!("ctrl-c received, exiting");
            return Ok(());
        }
    }

    // The loop ended on its own; a fatal deframe error surfaces here as a
    // nonzero exit.
    loop_handle.await??;
    Ok(())
}

fn deliver_to_sinks(
    message: &DeliveredMessage,
    image_dest: &Path,
    features_dest: &Path,
) -> Result<()> {
    let image_path = image_dest.join("received.jpg");
    std::fs::write(&image_path, &message.image)
        .with_context(|| format!("failed to write {}", image_path.display()))?;

    let features: serde_json::Value = serde_json::from_slice(&message.metadata)
        .with_context(|| format!("metadata of message {} is not valid JSON", message.message_id))?;
    let features_path = features_dest.join("received_features.json");
    std::fs::write(&features_path, serde_json::to_string_pretty(&features)?)
        .with_context(|| format!("failed to write {}", features_path.display()))?;

    log::info!(
        "message {} saved to {} and {}",
        message.message_id,
        image_path.display(),
        features_path.display()
    );
    Ok(())
}
