use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Unexpected first frame, expected Hello: {0}")]
    Handshake(String),
    #[error("Gateway closed the connection with fatal code {0}")]
    Fatal(u16),
}
