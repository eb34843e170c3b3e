//! Push channel client (hosted backend realtime)
//!
//! Speaks the change-feed frame protocol over TCP: on connect the client
//! sends the protocol version (little-endian u16), then the server streams
//! frames of `[kind: u8][len: u32 le][json TableChange]`. A background task
//! decodes frames and fans them out over a broadcast channel; per-table
//! subscriptions filter on the table name.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::{CancellationToken, DropGuard};

use shared::realtime::{ChangeKind, PUSH_PROTOCOL_VERSION, TableChange};

use crate::error::{ClientError, ClientResult};

/// Upper bound on a single frame payload; a table change is one JSON row,
/// so anything near this is a corrupt or hostile stream.
const MAX_FRAME_LEN: usize = 1 << 20;

/// Connected push channel
#[derive(Debug, Clone)]
pub struct PushChannel {
    events: broadcast::Sender<TableChange>,
    shutdown: CancellationToken,
    _writer: Arc<Mutex<OwnedWriteHalf>>,
    // cancels the read task when the last clone goes away
    _guard: Arc<DropGuard>,
}

impl PushChannel {
    /// Connect, send the version hello, and start the read loop.
    pub async fn connect(addr: &str) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ClientError::Network(format!("push channel connect failed: {e}")))?;
        let (reader, mut writer) = stream.into_split();

        writer
            .write_all(&PUSH_PROTOCOL_VERSION.to_le_bytes())
            .await
            .map_err(|e| ClientError::Network(format!("push channel hello failed: {e}")))?;

        let (events, _) = broadcast::channel(1024);
        let shutdown = CancellationToken::new();
        let task_token = shutdown.clone();

        let channel = Self {
            events: events.clone(),
            shutdown: shutdown.clone(),
            _writer: Arc::new(Mutex::new(writer)),
            _guard: Arc::new(shutdown.drop_guard()),
        };

        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    tracing::debug!("push channel shut down");
                }
                result = Self::read_loop(reader, events) => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "push channel read loop ended");
                    }
                }
            }
        });

        Ok(channel)
    }

    async fn read_loop(
        mut reader: OwnedReadHalf,
        events: broadcast::Sender<TableChange>,
    ) -> ClientResult<()> {
        loop {
            let change = Self::read_frame(&mut reader).await?;
            // No subscribers yet is fine; changes before the first
            // subscription are simply dropped.
            if events.send(change).is_err() {
                tracing::debug!("no subscribers for table change");
            }
        }
    }

    async fn read_frame(reader: &mut OwnedReadHalf) -> ClientResult<TableChange> {
        let mut kind_buf = [0u8; 1];
        reader
            .read_exact(&mut kind_buf)
            .await
            .map_err(|e| ClientError::Network(format!("push channel read failed: {e}")))?;
        let kind = ChangeKind::try_from(kind_buf[0])
            .map_err(|_| ClientError::InvalidResponse("unknown change kind tag".into()))?;

        let mut len_buf = [0u8; 4];
        reader
            .read_exact(&mut len_buf)
            .await
            .map_err(|e| ClientError::Network(format!("push channel read failed: {e}")))?;
        let len = validate_frame_len(u32::from_le_bytes(len_buf) as usize)?;

        let mut payload = vec![0u8; len];
        reader
            .read_exact(&mut payload)
            .await
            .map_err(|e| ClientError::Network(format!("push channel read failed: {e}")))?;

        let change: TableChange = serde_json::from_slice(&payload)
            .map_err(|e| ClientError::InvalidResponse(format!("bad change frame: {e}")))?;
        if change.kind != kind {
            return Err(ClientError::InvalidResponse(
                "frame tag does not match payload kind".into(),
            ));
        }
        Ok(change)
    }

    /// Subscribe to the raw change stream.
    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.events.subscribe()
    }

    /// Stop the read loop and drop the connection.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

/// Reject lengths no legitimate change frame can carry before allocating.
fn validate_frame_len(len: usize) -> ClientResult<usize> {
    if len > MAX_FRAME_LEN {
        return Err(ClientError::InvalidResponse(format!(
            "frame length {len} exceeds the {MAX_FRAME_LEN}-byte cap"
        )));
    }
    Ok(len)
}

/// Encode a frame the way the server does. Used by tests and by any
/// embedded server emitting changes.
pub fn encode_frame(change: &TableChange) -> ClientResult<Vec<u8>> {
    let payload = serde_json::to_vec(change)?;
    let mut frame = Vec::with_capacity(5 + payload.len());
    frame.push(change.kind as u8);
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}
