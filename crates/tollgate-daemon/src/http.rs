//! A deliberately minimal HTTP/1.1 boundary.
//!
//! The admission protocol lives entirely in the request head, so this
//! module only reads the request line and the headers and writes fixed
//! responses. Hosting the gate inside a full HTTP framework is the expected
//! production setup; this reader keeps the example self-contained.

use anyhow::{bail, Context};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on one request head; a legitimate witness header for the
/// deepest admissible tree stays well under this.
const MAX_HEAD_BYTES: usize = 256 * 1024;

/// A parsed request head: method, path, and raw headers in arrival order.
#[derive(Debug)]
pub struct RequestHead {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Request path, e.g. `/v0/quote`.
    pub path: String,
    headers: Vec<(String, String)>,
}

impl RequestHead {
    /// All values of a header, name compared case-insensitively, in order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
            .collect()
    }
}

/// Read one request head from the stream. Returns `None` on a clean EOF
/// before the first byte of a request.
pub async fn read_request_head<R>(reader: &mut R) -> anyhow::Result<Option<RequestHead>>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0usize;
    let mut line = String::new();

    if read_head_line(reader, &mut line, &mut consumed).await? == 0 {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(path), Some(_version)) => (method.to_string(), path.to_string()),
        _ => bail!("malformed request line {line:?}"),
    };

    let mut headers = Vec::new();
    loop {
        if read_head_line(reader, &mut line, &mut consumed).await? == 0 {
            bail!("connection closed inside the request head");
        }
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .with_context(|| format!("malformed header line {line:?}"))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    Ok(Some(RequestHead {
        method,
        path,
        headers,
    }))
}

/// Read one CRLF-terminated line into `line` (stripped), enforcing the
/// total head budget. Returns the raw byte count, 0 at EOF.
async fn read_head_line<R>(
    reader: &mut R,
    line: &mut String,
    consumed: &mut usize,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let bytes_read = reader.read_line(line).await?;
    *consumed += bytes_read;
    if *consumed > MAX_HEAD_BYTES {
        bail!("request head exceeds {MAX_HEAD_BYTES} bytes");
    }
    while line.ends_with('\r') || line.ends_with('\n') {
        line.pop();
    }
    Ok(bytes_read)
}

/// Write a complete response with a JSON body and close-delimited framing.
pub async fn write_response<W>(
    writer: &mut W,
    status: u16,
    reason: &str,
    body: &str,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
