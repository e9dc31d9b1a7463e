use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use dnslookup::{Name, RecordType, Resolver, ResolverConfig, ResourceRecord};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dnslookup")]
#[command(about = "Send a single DNS query over UDP and print the response")]
struct Cli {
    /// Name to resolve
    name: String,

    /// Record type, as a mnemonic (A, MX, ...) or TYPE<n>
    #[arg(short = 't', long = "type", default_value = "A")]
    record_type: RecordType,

    /// Server to query
    #[arg(short = 's', long, default_value = "8.8.8.8:53")]
    server: SocketAddr,

    /// How long to wait for a response
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Receive buffer size in bytes
    #[arg(long, default_value = "512")]
    buffer_size: usize,
}

fn format_data(record: &ResourceRecord) -> String {
    match record.ipv4() {
        Some(addr) => addr.to_string(),
        None => record.data.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = ResolverConfig::default()
        .with_server(cli.server)
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_recv_buffer_size(cli.buffer_size);
    let resolver = Resolver::new(config);

    let name = Name::new(&cli.name)?;
    info!(%name, record_type = %cli.record_type, server = %cli.server, "querying");

    let message = resolver.query(name, cli.record_type).await?;
    let flags = message.header.flags;

    println!(
        "id={:#06x} rcode={} aa={} tc={} ra={}",
        message.header.id,
        flags.rcode(),
        flags.aa(),
        flags.tc(),
        flags.ra()
    );

    for (section, records) in [
        ("answer", &message.answers),
        ("authority", &message.authorities),
        ("additional", &message.additionals),
    ] {
        for record in records {
            println!(
                "{section}\t{}\t{}\t{}\t{}\t{}",
                record.name,
                record.ttl,
                record.rclass,
                record.rtype,
                format_data(record)
            );
        }
    }

    Ok(())
}
