//! Inter-process communication between pomo and pomoctl
//!
//! We use Unix domain sockets for local IPC - they're fast, secure,
//! and perfect for this use case.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Commands that pomoctl can send to pomo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    Start,
    Stop,
    Reset { to_break: bool },
    Status,
    AddTodo { title: String },
    ListTodos,
    ToggleTodo { id: u32 },
    RemoveTodo { id: u32 },
    CheckUpdates,
}

/// Responses from pomo back to pomoctl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Status(TimerStatus),
    Todos(Vec<TodoItem>),
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStatus {
    pub state: TimerState,
    pub remaining: u64, // seconds
    pub total: u64,     // seconds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u32,
    pub title: String,
    pub done: bool,
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection refused - is pomo running?")]
    ConnectionRefused,
}

pub const SOCKET_PATH: &str = "/tmp/pomo.sock";

/// Send a single command to a running pomo instance and wait for the reply.
pub async fn send_command(cmd: &Command) -> Result<Response, IpcError> {
    let mut stream = UnixStream::connect(SOCKET_PATH).await.map_err(|e| {
        match e.kind() {
            std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound => {
                IpcError::ConnectionRefused
            }
            _ => IpcError::Io(e),
        }
    })?;

    let msg = serde_json::to_vec(cmd)?;
    stream.write_all(&msg).await?;
    stream.write_all(b"\n").await?;

    let mut buf = vec![0; 64 * 1024];
    let n = stream.read(&mut buf).await?;
    let response: Response = serde_json::from_slice(&buf[..n])?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_round_trip() {
        let cmd = Command::AddTodo {
            title: "write report".to_string(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        match back {
            Command::AddTodo { title } => assert_eq!(title, "write report"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn reset_carries_break_flag() {
        let json = serde_json::to_string(&Command::Reset { to_break: true }).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Command::Reset { to_break: true }));
    }

    #[test]
    fn status_response_round_trip() {
        let resp = Response::Status(TimerStatus {
            state: TimerState::Running,
            remaining: 90,
            total: 1500,
        });
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        match back {
            Response::Status(status) => {
                assert_eq!(status.state, TimerState::Running);
                assert_eq!(status.remaining, 90);
                assert_eq!(status.total, 1500);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn todos_response_round_trip() {
        let resp = Response::Todos(vec![TodoItem {
            id: 3,
            title: "water plants".to_string(),
            done: false,
        }]);
        let json = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        match back {
            Response::Todos(todos) => {
                assert_eq!(todos.len(), 1);
                assert_eq!(todos[0].id, 3);
                assert!(!todos[0].done);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
