//! The accept loop and request routing.

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use tollgate_admission::{Gate, MERKLE_CHECK_HEADER};
use tollgate_quote::QuoteStore;

use crate::http::{read_request_head, write_response, RequestHead};

/// Everything a request handler needs; shared across connections.
pub struct ServerState {
    /// The admission gate, owner of the replay cache.
    pub gate: Gate,
    /// The payload store.
    pub quotes: QuoteStore,
}

/// A response about to be written: status, reason, JSON body.
struct Reply {
    status: u16,
    reason: &'static str,
    body: String,
}

/// Accept connections until the listener dies; one task per connection.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> anyhow::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "serving quotes behind the gate");
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(error) = handle_connection(state, stream).await {
                        warn!(%error, "connection error");
                    }
                });
            }
            Err(error) => {
                error!(%error, "accept error");
            }
        }
    }
}

/// Serve one connection: a single request, a single response.
async fn handle_connection(state: Arc<ServerState>, stream: TcpStream) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let Some(head) = read_request_head(&mut reader).await? else {
        return Ok(());
    };
    let reply = route(&state, &head);
    write_response(&mut writer, reply.status, reply.reason, &reply.body).await
}

/// Admission first, then routing; the gate sees every request.
fn route(state: &ServerState, head: &RequestHead) -> Reply {
    let header_values = head.header_values(MERKLE_CHECK_HEADER);
    if let Err(error) = state.gate.check(&header_values) {
        // The error detail stays in the log; clients get one uniform word.
        warn!(%error, path = head.path, "request refused admission");
        return Reply {
            status: 406,
            reason: "Not Acceptable",
            body: serde_json::json!({"error": "proof of work verification failed"}).to_string(),
        };
    }

    match (head.method.as_str(), head.path.as_str()) {
        ("GET", "/v0/quote") => match state.quotes.random_quote() {
            Ok(quote) => Reply {
                status: 200,
                reason: "OK",
                // The body is the quote as one JSON string.
                body: serde_json::json!(quote).to_string(),
            },
            Err(error) => {
                error!(%error, "quote store failure");
                Reply {
                    status: 500,
                    reason: "Internal Server Error",
                    body: serde_json::json!({"error": "no quotes available"}).to_string(),
                }
            }
        },
        _ => Reply {
            status: 404,
            reason: "Not Found",
            body: serde_json::json!({"error": "no such endpoint"}).to_string(),
        },
    }
}
