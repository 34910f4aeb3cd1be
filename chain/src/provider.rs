//! JSON-RPC provider over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use agora_types::{Address, BlockNumber, BlockTag, ChainId};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ChainError;
use crate::events::{LogFilter, RawLog, Topic};
use crate::{BlockSource, ContractReader, LogQuery};

/// HTTP client for an Ethereum JSON-RPC endpoint.
///
/// Wraps `reqwest::Client` with the endpoint URL and implements the read
/// capabilities the loader and aggregator need.
pub struct HttpProvider {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogJson {
    address: String,
    topics: Vec<String>,
    data: String,
    block_number: Option<String>,
    transaction_hash: Option<String>,
    log_index: Option<String>,
    #[serde(default)]
    removed: bool,
}

fn decode_hex(field: &str, s: &str) -> Result<Vec<u8>, ChainError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ChainError::InvalidResponse(format!("{field}: {e}")))
}

fn parse_quantity(field: &str, s: &str) -> Result<u64, ChainError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidResponse(format!("{field}: missing 0x prefix")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::InvalidResponse(format!("{field}: {e}")))
}

fn parse_topic(s: &str) -> Result<Topic, ChainError> {
    decode_hex("topic", s)?
        .try_into()
        .map_err(|_| ChainError::InvalidResponse(format!("topic is not 32 bytes: {s}")))
}

impl LogJson {
    /// `None` for pending or reorged-out logs.
    fn into_raw(self) -> Result<Option<RawLog>, ChainError> {
        let (Some(block), Some(tx), Some(index)) =
            (self.block_number, self.transaction_hash, self.log_index)
        else {
            return Ok(None);
        };
        if self.removed {
            return Ok(None);
        }
        Ok(Some(RawLog {
            address: self.address.parse::<Address>()?,
            topics: self
                .topics
                .iter()
                .map(|t| parse_topic(t))
                .collect::<Result<_, _>>()?,
            data: decode_hex("data", &self.data)?,
            block_number: BlockNumber::new(parse_quantity("blockNumber", &block)?),
            tx_hash: tx.parse()?,
            log_index: parse_quantity("logIndex", &index)?,
        }))
    }
}

impl HttpProvider {
    /// Create a provider for `url` (e.g. `https://rpc.sepolia.org`).
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ChainError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a JSON-RPC request and return the `result` field.
    pub async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("{method} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ChainError::Transport(format!(
                "{method}: endpoint returned HTTP {}",
                response.status()
            )));
        }

        let mut json: Value = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("{method}: invalid JSON: {e}")))?;

        if let Some(err) = json.get("error") {
            let err: RpcErrorBody = serde_json::from_value(err.clone()).map_err(|e| {
                ChainError::InvalidResponse(format!("{method}: malformed error object: {e}"))
            })?;
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        json.get_mut("result")
            .map(Value::take)
            .ok_or_else(|| ChainError::InvalidResponse(format!("{method}: missing result")))
    }

    async fn quantity(&self, method: &str) -> Result<u64, ChainError> {
        let result = self.rpc_call(method, json!([])).await?;
        let s = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse(format!("{method}: expected a string")))?;
        parse_quantity(method, s)
    }
}

fn filter_json(filter: &LogFilter) -> Value {
    let topics: Vec<Value> = filter
        .topics
        .iter()
        .map(|t| match t {
            Some(topic) => Value::String(format!("0x{}", hex::encode(topic))),
            None => Value::Null,
        })
        .collect();
    json!({
        "address": filter.address.to_string(),
        "topics": topics,
        "fromBlock": filter.from_block.to_rpc(),
        "toBlock": filter.to_block.to_rpc(),
    })
}

impl ContractReader for HttpProvider {
    async fn call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        block: BlockTag,
    ) -> Result<Vec<u8>, ChainError> {
        let params = json!([
            { "to": to.to_string(), "data": format!("0x{}", hex::encode(&calldata)) },
            block.to_rpc(),
        ]);
        let result = self.rpc_call("eth_call", params).await?;
        let s = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse("eth_call: expected a string".into()))?;
        decode_hex("eth_call", s)
    }
}

impl LogQuery for HttpProvider {
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, ChainError> {
        let result = self
            .rpc_call("eth_getLogs", json!([filter_json(filter)]))
            .await?;
        let logs: Vec<LogJson> = serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("eth_getLogs: {e}")))?;

        let mut out = Vec::with_capacity(logs.len());
        for log in logs {
            if let Some(raw) = log.into_raw()? {
                out.push(raw);
            }
        }
        tracing::debug!(count = out.len(), address = %filter.address, "fetched logs");
        Ok(out)
    }
}

impl BlockSource for HttpProvider {
    async fn block_number(&self) -> Result<BlockNumber, ChainError> {
        Ok(BlockNumber::new(self.quantity("eth_blockNumber").await?))
    }

    async fn chain_id(&self) -> Result<ChainId, ChainError> {
        Ok(ChainId::new(self.quantity("eth_chainId").await?))
    }
}
