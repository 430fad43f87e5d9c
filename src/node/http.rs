//! REST implementation of [`NodeClient`]

use crate::config::ClientConfig;
use crate::core::{Address, SignedTransaction, SuggestedParams, MAX_TXN_LIFE};
use crate::logic::CompiledProgram;
use crate::node::{NodeClient, NodeError, NodeStatus, PendingTransactionInfo};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

/// Header carrying the API token
pub const API_TOKEN_HEADER: &str = "X-Node-API-Token";

// ===== Wire types =====

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct StatusResponse {
    last_round: u64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct PendingResponse {
    #[serde(default)]
    confirmed_round: u64,
    #[serde(default)]
    pool_error: String,
    /// Base64 of the encoded signed transaction
    #[serde(default)]
    txn: Option<String>,
}

impl PendingResponse {
    fn into_info(self) -> Result<PendingTransactionInfo, NodeError> {
        let txn = match self.txn {
            Some(encoded) => Some(SignedTransaction::decode(&STANDARD.decode(encoded)?)?),
            None => None,
        };
        Ok(PendingTransactionInfo {
            confirmed_round: self.confirmed_round,
            pool_error: self.pool_error,
            txn,
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct ParamsResponse {
    fee: u64,
    min_fee: u64,
    last_round: u64,
    genesis_id: String,
    /// Base64 of the 32-byte genesis hash
    genesis_hash: String,
}

impl ParamsResponse {
    /// Validity window starts at the node's last round and spans the maximum life
    fn into_params(self) -> Result<SuggestedParams, NodeError> {
        let hash = STANDARD.decode(&self.genesis_hash)?;
        let genesis_hash: [u8; 32] = hash.as_slice().try_into().map_err(|_| {
            NodeError::InvalidResponse(format!("genesis hash has {} bytes", hash.len()))
        })?;

        Ok(SuggestedParams {
            fee: self.fee,
            min_fee: self.min_fee,
            flat_fee: false,
            first_valid: self.last_round,
            last_valid: self.last_round.saturating_add(MAX_TXN_LIFE),
            genesis_id: self.genesis_id,
            genesis_hash,
        })
    }
}

#[derive(Deserialize, Debug)]
struct CompileResponse {
    /// Escrow address of the program
    hash: String,
    /// Base64 of the program bytes
    result: String,
}

impl CompileResponse {
    /// Decode the program and check the node's hash against our own
    fn into_compiled(self) -> Result<CompiledProgram, NodeError> {
        let program = STANDARD.decode(&self.result)?;
        let reported: Address = self
            .hash
            .parse()
            .map_err(|e| NodeError::InvalidResponse(format!("bad program hash: {}", e)))?;

        let compiled = CompiledProgram::new(program);
        if compiled.hash != reported {
            return Err(NodeError::InvalidResponse(format!(
                "program hash mismatch: node reported {}, computed {}",
                reported, compiled.hash
            )));
        }
        Ok(compiled)
    }
}

#[derive(Deserialize, Debug)]
struct ErrorResponse {
    message: String,
}

/// Extract `message` from an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ===== Client =====

/// Node client over the REST API
#[derive(Debug, Clone)]
pub struct HttpNode {
    base_url: Url,
    api_token: Option<String>,
    http_client: HttpClient,
}

impl HttpNode {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, NodeError> {
        let mut base_url = Url::parse(&config.node_url)?;
        // Relative joins replace the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base_url,
            api_token: config.api_token.clone(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, NodeError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, NodeError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);
        let mut request = self.http_client.request(method, url);
        if let Some(token) = &self.api_token {
            request = request.header(API_TOKEN_HEADER, token);
        }
        Ok(request)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, NodeError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NodeError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl NodeClient for HttpNode {
    async fn status(&self) -> Result<NodeStatus, NodeError> {
        let response: StatusResponse = Self::send(self.request(Method::GET, "v2/status")?).await?;
        Ok(NodeStatus {
            last_round: response.last_round,
        })
    }

    async fn status_after_round(&self, round: u64) -> Result<NodeStatus, NodeError> {
        let path = format!("v2/status/wait-for-block-after/{}", round);
        let response: StatusResponse = Self::send(self.request(Method::GET, &path)?).await?;
        Ok(NodeStatus {
            last_round: response.last_round,
        })
    }

    async fn pending_transaction_info(
        &self,
        txid: &str,
    ) -> Result<PendingTransactionInfo, NodeError> {
        if txid.is_empty() || !txid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(NodeError::InvalidRequest(format!(
                "invalid transaction id: {:?}",
                txid
            )));
        }
        let path = format!("v2/transactions/pending/{}", txid);
        let response: PendingResponse = Self::send(self.request(Method::GET, &path)?).await?;
        response.into_info()
    }

    async fn submit_raw(&self, bytes: &[u8]) -> Result<String, NodeError> {
        let request = self
            .request(Method::POST, "v2/transactions")?
            .header(CONTENT_TYPE, "application/x-binary")
            .body(bytes.to_vec());
        let response: SubmitResponse = Self::send(request).await?;
        Ok(response.tx_id)
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, NodeError> {
        let response: ParamsResponse =
            Self::send(self.request(Method::GET, "v2/transactions/params")?).await?;
        response.into_params()
    }

    async fn compile(&self, source: &str) -> Result<CompiledProgram, NodeError> {
        let request = self
            .request(Method::POST, "v2/scripts/compile")?
            .header(CONTENT_TYPE, "text/plain")
            .body(source.to_string());
        let response: CompileResponse = Self::send(request).await?;
        response.into_compiled()
    }
}
