// Tunnel broker HTTP client
//
// Two endpoints, both authenticated with HTTP basic auth:
// `tunnelInfo.php` lists the account's tunnels as XML, and the
// dyndns-style `nic/update` endpoint moves a tunnel's client address.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::tunnelbroker::models::{TunnelInfo, UpdateOutcome};

pub const DEFAULT_INFO_URL: &str = "https://tunnelbroker.net/tunnelInfo.php";
pub const DEFAULT_UPDATE_URL: &str = "https://ipv4.tunnelbroker.net/nic/update";

/// Account credentials for the tunnel broker.
#[derive(Debug, Clone)]
pub struct BrokerCredentials {
    pub username: String,
    pub password: SecretString,
    /// Per-tunnel update key. The update endpoint accepts the account
    /// password too, so this is optional.
    pub update_key: Option<SecretString>,
}

/// Raw HTTP client for the tunnel broker.
pub struct TunnelBrokerClient {
    http: reqwest::Client,
    credentials: BrokerCredentials,
    info_url: Url,
    update_url: Url,
}

impl TunnelBrokerClient {
    /// Create a client against the public tunnelbroker.net endpoints.
    pub fn new(credentials: BrokerCredentials, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            credentials,
            Url::parse(DEFAULT_INFO_URL)?,
            Url::parse(DEFAULT_UPDATE_URL)?,
        ))
    }

    /// Create a client with a pre-built `reqwest::Client` and explicit endpoints.
    pub fn with_client(
        http: reqwest::Client,
        credentials: BrokerCredentials,
        info_url: Url,
        update_url: Url,
    ) -> Self {
        Self {
            http,
            credentials,
            info_url,
            update_url,
        }
    }

    /// Point the client at different endpoints (mirrors, test servers).
    pub fn with_endpoints(mut self, info_url: Url, update_url: Url) -> Self {
        self.info_url = info_url;
        self.update_url = update_url;
        self
    }

    /// List the tunnels registered on the account.
    ///
    /// `GET tunnelInfo.php`
    pub async fn tunnel_info(&self) -> Result<TunnelInfo, Error> {
        debug!(url = %self.info_url, "fetching tunnel info");

        let resp = self
            .http
            .get(self.info_url.clone())
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await?;

        let body = Self::check_status(resp).await?;
        TunnelInfo::from_xml(&body)
    }

    /// Set the client (near-side) IPv4 address of a tunnel.
    ///
    /// `GET nic/update?hostname={tunnel_id}&myip={address}`
    pub async fn update_tunnel(
        &self,
        tunnel_id: &str,
        client_v4: &str,
    ) -> Result<UpdateOutcome, Error> {
        let mut url = self.update_url.clone();
        url.query_pairs_mut()
            .append_pair("hostname", tunnel_id)
            .append_pair("myip", client_v4);

        debug!(tunnel_id, client_v4, "updating tunnel client address");

        let secret = self
            .credentials
            .update_key
            .as_ref()
            .unwrap_or(&self.credentials.password);

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.credentials.username, Some(secret.expose_secret()))
            .send()
            .await?;

        let body = Self::check_status(resp).await?;
        let outcome = UpdateOutcome::from_body(&body)?;
        debug!(?outcome, "tunnel update accepted");
        Ok(outcome)
    }

    /// Map HTTP status to errors and return the body on success.
    async fn check_status(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("tunnel broker returned HTTP {status}"),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::TunnelBroker {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(resp.text().await?)
    }
}
