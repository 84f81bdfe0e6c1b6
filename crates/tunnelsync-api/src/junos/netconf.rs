// NETCONF 1.0 framing over any byte stream
//
// Messages are terminated by `]]>]]>`. The session is generic over the
// stream so the SSH channel can be swapped for an in-memory pipe.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::error::Error;

pub(crate) const END_OF_MESSAGE: &[u8] = b"]]>]]>";

const CLIENT_HELLO: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">"#,
    "<capabilities><capability>urn:ietf:params:netconf:base:1.0</capability></capabilities>",
    "</hello>",
);

const READ_CHUNK: usize = 8192;

/// An `<rpc-error>` element found in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub severity: String,
    pub message: String,
}

/// A NETCONF session after the hello exchange.
pub struct Netconf<S> {
    stream: S,
    buffer: Vec<u8>,
    message_id: u64,
    server_capabilities: usize,
}

impl<S> Netconf<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Exchange `<hello>` messages and return a ready session.
    pub async fn handshake(stream: S) -> Result<Self, Error> {
        let mut session = Self {
            stream,
            buffer: Vec::new(),
            message_id: 0,
            server_capabilities: 0,
        };

        session.send(CLIENT_HELLO).await?;
        let hello = session.receive().await?;
        session.server_capabilities = hello.matches("<capability>").count();
        debug!(
            capabilities = session.server_capabilities,
            "NETCONF hello exchanged"
        );
        Ok(session)
    }

    /// Number of capabilities the server advertised in its hello.
    pub fn server_capabilities(&self) -> usize {
        self.server_capabilities
    }

    /// Send one framed message.
    pub async fn send(&mut self, message: &str) -> Result<(), Error> {
        trace!(message, "NETCONF send");
        self.stream.write_all(message.as_bytes()).await?;
        self.stream.write_all(END_OF_MESSAGE).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read up to the next end-of-message marker.
    pub async fn receive(&mut self) -> Result<String, Error> {
        loop {
            if let Some(pos) = find_delimiter(&self.buffer) {
                let mut message: Vec<u8> =
                    self.buffer.drain(..pos + END_OF_MESSAGE.len()).collect();
                message.truncate(pos);
                let text = String::from_utf8(message).map_err(|e| {
                    Error::deserialization(&e, &String::from_utf8_lossy(e.as_bytes()))
                })?;
                trace!(message = %text, "NETCONF receive");
                return Ok(text);
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::UnexpectedEof);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Wrap `body` in an `<rpc>` envelope, send it, and return the reply.
    ///
    /// Replies carrying an `<rpc-error>` of severity `error` fail;
    /// warnings are logged and the reply is returned.
    pub async fn rpc(&mut self, body: &str) -> Result<String, Error> {
        self.message_id += 1;
        let request = format!(
            r#"<rpc message-id="{}" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">{body}</rpc>"#,
            self.message_id
        );
        self.send(&request).await?;
        let reply = self.receive().await?;

        let (errors, warnings): (Vec<_>, Vec<_>) = rpc_errors(&reply)?
            .into_iter()
            .partition(|e| e.severity != "warning");

        for warning in &warnings {
            warn!(message = %warning.message, "NETCONF warning");
        }

        if errors.is_empty() {
            Ok(reply)
        } else {
            Err(Error::Rpc {
                messages: errors.into_iter().map(|e| e.message).collect(),
            })
        }
    }

    /// Send `<close-session/>` and shut the write side down.
    pub async fn close(mut self) -> Result<(), Error> {
        self.rpc("<close-session/>").await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(END_OF_MESSAGE.len())
        .position(|window| window == END_OF_MESSAGE)
}

#[derive(Clone, Copy)]
enum ErrorField {
    Severity,
    Message,
}

/// Collect every `<rpc-error>` in a reply, at any depth.
pub(crate) fn rpc_errors(reply: &str) -> Result<Vec<RpcError>, Error> {
    let mut reader = Reader::from_str(reply);
    reader.config_mut().trim_text(true);

    let mut errors = Vec::new();
    let mut current: Option<RpcError> = None;
    let mut field: Option<ErrorField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"rpc-error" => {
                    current = Some(RpcError {
                        severity: "error".into(),
                        message: String::new(),
                    });
                }
                b"error-severity" => field = Some(ErrorField::Severity),
                b"error-message" => field = Some(ErrorField::Message),
                _ => {}
            },
            Ok(Event::Text(text)) => {
                if let (Some(err), Some(f)) = (current.as_mut(), field) {
                    let value = text
                        .unescape()
                        .map_err(|e| Error::deserialization(e, reply))?
                        .trim()
                        .to_owned();
                    match f {
                        ErrorField::Severity => err.severity = value,
                        ErrorField::Message => err.message = value,
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"rpc-error" => {
                    if let Some(mut err) = current.take() {
                        if err.message.is_empty() {
                            err.message = "unspecified RPC error".into();
                        }
                        errors.push(err);
                    }
                }
                b"error-severity" | b"error-message" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::deserialization(e, reply)),
        }
    }

    Ok(errors)
}
