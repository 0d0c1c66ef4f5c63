//! Unix domain socket server for IPC
//!
//! The main thread owns all application state, so this server never touches
//! it directly: every command is forwarded over a channel together with a
//! oneshot the main loop answers on.

use anyhow::Result;
use pomo_ipc::{Command, Response, SOCKET_PATH};
use std::sync::mpsc::Sender;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::oneshot;
use tracing::{error, info};

/// A command from a ctl client plus the channel its reply goes back on.
pub struct IpcRequest {
    pub command: Command,
    pub reply: oneshot::Sender<Response>,
}

pub async fn start(requests: Sender<IpcRequest>) -> Result<()> {
    // Remove old socket if it exists
    let _ = std::fs::remove_file(SOCKET_PATH);

    let listener = UnixListener::bind(SOCKET_PATH)?;
    info!("IPC server listening on {}", SOCKET_PATH);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let requests = requests.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, requests).await {
                        error!("Error handling client: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(stream: UnixStream, requests: Sender<IpcRequest>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    // Read command
    reader.read_line(&mut line).await?;
    let command: Command = serde_json::from_str(&line)?;

    // Hand it to the main loop and wait for the verdict
    let (reply_tx, reply_rx) = oneshot::channel();
    requests
        .send(IpcRequest {
            command,
            reply: reply_tx,
        })
        .map_err(|_| anyhow::anyhow!("main loop is no longer accepting commands"))?;
    let response = match reply_rx.await {
        Ok(response) => response,
        Err(_) => Response::Error("pomo is shutting down".to_string()),
    };

    // Send response
    let response_json = serde_json::to_vec(&response)?;
    writer.write_all(&response_json).await?;

    Ok(())
}
