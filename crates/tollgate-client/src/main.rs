//! tollgate-client: mints proofs of work and fetches quotes.
//!
//! Flags:
//!
//!   --host <host>    server host (default localhost)
//!   --port <port>    server port (default 8080)
//!   -n <count>       how many quotes to fetch (default 1)
//!   --depth <d>      tree depth to build (default 20)
//!   --leaves <l>     proof leaves per witness (default 5)
//!   --hash <name>    hash algorithm, md5 or sha256 (default md5)

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use tollgate_admission::{generate_header, MERKLE_CHECK_HEADER};

struct Args {
    host: String,
    port: u16,
    count: usize,
    depth: u32,
    leaves: usize,
    hash: String,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            count: 1,
            depth: 20,
            leaves: 5,
            hash: "md5".to_string(),
        }
    }
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = |what: &str| iter.next().with_context(|| format!("{flag} needs {what}"));
        match flag.as_str() {
            "--host" => args.host = value("a host")?,
            "--port" => args.port = value("a port")?.parse().context("parsing --port")?,
            "-n" => args.count = value("a count")?.parse().context("parsing -n")?,
            "--depth" => args.depth = value("a depth")?.parse().context("parsing --depth")?,
            "--leaves" => args.leaves = value("a count")?.parse().context("parsing --leaves")?,
            "--hash" => args.hash = value("a hash name")?,
            other => bail!("unknown flag {other:?}"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args()?;
    for _ in 0..args.count {
        // A fresh witness per request; tokens are single-use by design.
        let header = generate_header(&args.hash, args.depth, args.leaves)
            .context("generating proof of work")?;
        debug!(bytes = header.len(), "witness header minted");

        let quote = fetch_quote(&args.host, args.port, &header).await?;
        println!("{quote}");
    }
    Ok(())
}

/// One request over a fresh connection; returns the decoded quote.
async fn fetch_quote(host: &str, port: u16, header: &str) -> anyhow::Result<String> {
    let stream = TcpStream::connect((host, port))
        .await
        .with_context(|| format!("connecting to {host}:{port}"))?;
    let (reader, mut writer) = stream.into_split();

    let request = format!(
        "GET /v0/quote HTTP/1.1\r\nHost: {host}\r\n{MERKLE_CHECK_HEADER}: {header}\r\nConnection: close\r\n\r\n"
    );
    writer.write_all(request.as_bytes()).await?;
    writer.flush().await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let status: u16 = line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .with_context(|| format!("malformed status line {line:?}"))?;

    // Skip the response headers; the body is close-delimited.
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }
    let mut body = String::new();
    reader.read_to_string(&mut body).await?;

    if status != 200 {
        bail!("server refused the request with status {status}: {body}");
    }
    serde_json::from_str(&body).context("decoding the quote body")
}
