// Junos router access over NETCONF-on-SSH
//
// `JuniperDevice` is the immutable access descriptor; every operation opens
// its own `JunosSession`, runs its RPCs, and closes the session again.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use russh::Disconnect;
use russh::client::{self, Handle};
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::error::Error;
use crate::junos::models::InterfaceInformation;
use crate::junos::netconf::Netconf;

pub const DEFAULT_SSH_PORT: u16 = 22;

const NETCONF_SUBSYSTEM: &str = "netconf";

const LOCK_CANDIDATE: &str = "<lock><target><candidate/></target></lock>";
const UNLOCK_CANDIDATE: &str = "<unlock><target><candidate/></target></unlock>";
const COMMIT: &str = "<commit-configuration/>";
const GET_INTERFACE_INFORMATION: &str = "<get-interface-information/>";

/// Anything a NETCONF session can run over.
pub trait NetconfStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> NetconfStream for T {}

/// Router access descriptor: where to connect and how to authenticate.
#[derive(Debug, Clone)]
pub struct JuniperDevice {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub key_file: PathBuf,
    pub passphrase: Option<SecretString>,
}

impl JuniperDevice {
    /// Open an authenticated NETCONF session.
    pub async fn session(&self) -> Result<JunosSession, Error> {
        debug!(hostname = %self.hostname, port = self.port, "opening SSH session");

        let config = Arc::new(client::Config::default());
        let mut handle =
            client::connect(config, (self.hostname.as_str(), self.port), HostKeyLogger).await?;

        let key = russh_keys::load_secret_key(
            &self.key_file,
            self.passphrase.as_ref().map(|p| p.expose_secret()),
        )
        .map_err(|source| Error::KeyLoad {
            path: self.key_file.display().to_string(),
            source,
        })?;

        let authenticated = handle
            .authenticate_publickey(&self.username, Arc::new(key))
            .await?;
        if !authenticated {
            return Err(Error::PublicKeyRejected {
                username: self.username.clone(),
            });
        }

        let mut channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, NETCONF_SUBSYSTEM).await?;

        let stream: Box<dyn NetconfStream> = Box::new(channel.into_stream());
        let netconf = Netconf::handshake(stream).await?;

        Ok(JunosSession {
            handle: Some(handle),
            netconf,
        })
    }

    /// Read the interface view in a one-off session.
    pub async fn interface_information(&self) -> Result<InterfaceInformation, Error> {
        let mut session = self.session().await?;
        let result = session.interface_information().await;
        let closed = session.close().await;
        let information = result?;
        closed?;
        Ok(information)
    }

    /// Point a tunnel interface's source at `address` and commit.
    ///
    /// Issues `set interfaces <interface> tunnel source <address>`.
    pub async fn set_tunnel_source(&self, interface: &str, address: &str) -> Result<(), Error> {
        let statement = format!("set interfaces {interface} tunnel source {address}");
        let mut session = self.session().await?;
        let result = session.load_set(&statement).await;
        let closed = session.close().await;
        result?;
        closed
    }
}

/// An open NETCONF session with a Junos device.
pub struct JunosSession {
    handle: Option<Handle<HostKeyLogger>>,
    netconf: Netconf<Box<dyn NetconfStream>>,
}

impl JunosSession {
    /// Run a session over an arbitrary stream (no SSH underneath).
    pub async fn over_stream(stream: Box<dyn NetconfStream>) -> Result<Self, Error> {
        Ok(Self {
            handle: None,
            netconf: Netconf::handshake(stream).await?,
        })
    }

    /// `<get-interface-information/>`
    pub async fn interface_information(&mut self) -> Result<InterfaceInformation, Error> {
        let reply = self.netconf.rpc(GET_INTERFACE_INFORMATION).await?;
        InterfaceInformation::from_reply(&reply)
    }

    /// Load one `set`-style statement into the candidate and commit it.
    ///
    /// The candidate is locked for the duration and unlocked even when
    /// the load or commit fails.
    pub async fn load_set(&mut self, statement: &str) -> Result<(), Error> {
        info!(statement, "loading configuration");

        self.netconf.rpc(LOCK_CANDIDATE).await?;

        let load = format!(
            r#"<load-configuration action="set" format="text"><configuration-set>{}</configuration-set></load-configuration>"#,
            quick_xml::escape::escape(statement)
        );
        let result = async {
            self.netconf.rpc(&load).await?;
            self.netconf.rpc(COMMIT).await?;
            Ok::<(), Error>(())
        }
        .await;

        let unlocked = self.netconf.rpc(UNLOCK_CANDIDATE).await;
        result?;
        unlocked?;

        debug!("configuration committed");
        Ok(())
    }

    /// Close the NETCONF session and disconnect SSH.
    pub async fn close(self) -> Result<(), Error> {
        self.netconf.close().await?;
        if let Some(handle) = self.handle {
            handle
                .disconnect(Disconnect::ByApplication, "", "en")
                .await?;
        }
        Ok(())
    }
}

/// SSH client handler. Accepts the router's host key and logs its
/// fingerprint; the router is addressed by a configured hostname.
struct HostKeyLogger;

#[async_trait]
impl client::Handler for HostKeyLogger {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(fingerprint = %server_public_key.fingerprint(), "router host key");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

    use super::*;
    use crate::junos::netconf::END_OF_MESSAGE;

    async fn read_message(server: &mut DuplexStream) -> String {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        while !buf.ends_with(END_OF_MESSAGE) {
            server.read_exact(&mut byte).await.unwrap();
            buf.push(byte[0]);
        }
        buf.truncate(buf.len() - END_OF_MESSAGE.len());
        String::from_utf8(buf).unwrap()
    }

    async fn reply(server: &mut DuplexStream, body: &str) {
        server.write_all(body.as_bytes()).await.unwrap();
        server.write_all(END_OF_MESSAGE).await.unwrap();
    }

    #[tokio::test]
    async fn load_set_locks_loads_commits_unlocks() {
        let (client, mut server) = duplex(64 * 1024);

        let router = tokio::spawn(async move {
            read_message(&mut server).await;
            reply(&mut server, "<hello><capabilities/></hello>").await;

            let mut seen = Vec::new();
            for _ in 0..4 {
                let rpc = read_message(&mut server).await;
                reply(&mut server, "<rpc-reply><ok/></rpc-reply>").await;
                seen.push(rpc);
            }
            seen
        });

        let mut session = JunosSession::over_stream(Box::new(client)).await.unwrap();
        session
            .load_set("set interfaces ip-0/0/0.0 tunnel source 203.0.113.9")
            .await
            .unwrap();

        let seen = router.await.unwrap();
        assert!(seen[0].contains("<lock>"));
        assert!(seen[1].contains(
            "<configuration-set>set interfaces ip-0/0/0.0 tunnel source 203.0.113.9</configuration-set>"
        ));
        assert!(seen[2].contains("<commit-configuration/>"));
        assert!(seen[3].contains("<unlock>"));
    }

    #[tokio::test]
    async fn failed_commit_still_unlocks() {
        let (client, mut server) = duplex(64 * 1024);

        let router = tokio::spawn(async move {
            read_message(&mut server).await;
            reply(&mut server, "<hello><capabilities/></hello>").await;

            let mut seen = Vec::new();
            for step in 0..4 {
                let rpc = read_message(&mut server).await;
                if step == 2 {
                    reply(
                        &mut server,
                        "<rpc-reply><rpc-error><error-severity>error</error-severity>\
                         <error-message>commit failed</error-message></rpc-error></rpc-reply>",
                    )
                    .await;
                } else {
                    reply(&mut server, "<rpc-reply><ok/></rpc-reply>").await;
                }
                seen.push(rpc);
            }
            seen
        });

        let mut session = JunosSession::over_stream(Box::new(client)).await.unwrap();
        let result = session.load_set("set interfaces ip-0/0/0.0 tunnel source 203.0.113.9").await;
        assert!(matches!(result, Err(Error::Rpc { .. })));

        let seen = router.await.unwrap();
        assert!(seen[3].contains("<unlock>"));
    }
}
