//! Plugin event logs: filters, raw logs and typed decoders.

use agora_governance::{Action, EventId, VoteKind, VoteOption, VoteRecord};
use agora_types::{Address, BlockNumber, BlockTag, ContentHash, Timestamp, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::abi::{encode, event_topic, u256_word, Decoder, Token};
use crate::error::ChainError;
use crate::plugin::{actions_token, decode_actions};

pub type Topic = [u8; 32];

/// A log as returned by `eth_getLogs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<Topic>,
    pub data: Vec<u8>,
    pub block_number: BlockNumber,
    pub tx_hash: TxHash,
    pub log_index: u64,
}

impl RawLog {
    pub fn event_id(&self) -> EventId {
        EventId {
            block_number: self.block_number,
            tx_hash: self.tx_hash,
            log_index: self.log_index,
        }
    }

    fn topic(&self, index: usize) -> Result<&Topic, ChainError> {
        self.topics
            .get(index)
            .ok_or_else(|| ChainError::Abi(format!("log is missing topic {index}")))
    }

    fn expect_signature(&self, signature: &str) -> Result<(), ChainError> {
        if *self.topic(0)? != event_topic(signature) {
            return Err(ChainError::Abi(format!("log is not a {signature} event")));
        }
        Ok(())
    }

    fn topic_uint(&self, index: usize) -> Result<U256, ChainError> {
        Ok(U256::from_be_bytes(*self.topic(index)?))
    }

    fn topic_address(&self, index: usize) -> Result<Address, ChainError> {
        Ok(Address::from_word(self.topic(index)?))
    }
}

/// Address and topic filter for `eth_getLogs`. `None` topics match anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<Option<Topic>>,
    pub from_block: BlockTag,
    pub to_block: BlockTag,
}

impl LogFilter {
    /// Logs of event `signature` whose first indexed argument is `proposal_id`.
    pub fn for_proposal(
        address: Address,
        signature: &str,
        proposal_id: U256,
        from_block: BlockNumber,
    ) -> Self {
        Self {
            address,
            topics: vec![Some(event_topic(signature)), Some(u256_word(proposal_id))],
            from_block: BlockTag::Number(from_block),
            to_block: BlockTag::Latest,
        }
    }

    /// Whether `log` passes this filter. Block bounds on `Latest` are open.
    pub fn matches(&self, log: &RawLog) -> bool {
        if log.address != self.address {
            return false;
        }
        if let BlockTag::Number(from) = self.from_block {
            if log.block_number < from {
                return false;
            }
        }
        if let BlockTag::Number(to) = self.to_block {
            if log.block_number > to {
                return false;
            }
        }
        self.topics.iter().enumerate().all(|(i, wanted)| match wanted {
            None => true,
            Some(topic) => log.topics.get(i) == Some(topic),
        })
    }
}

// ── ProposalCreated ─────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalCreated {
    pub proposal_id: U256,
    pub creator: Address,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    /// Raw metadata pointer, normally the UTF-8 bytes of `ipfs://<cid>`.
    pub metadata: Vec<u8>,
    pub actions: Vec<Action>,
    pub allow_failure_map: U256,
}

impl ProposalCreated {
    pub const SIGNATURE: &'static str =
        "ProposalCreated(uint256,address,uint64,uint64,bytes,(address,uint256,bytes)[],uint256)";

    pub fn decode(log: &RawLog) -> Result<Self, ChainError> {
        log.expect_signature(Self::SIGNATURE)?;
        let d = Decoder::new(&log.data);
        Ok(Self {
            proposal_id: log.topic_uint(1)?,
            creator: log.topic_address(2)?,
            start_date: Timestamp::new(d.u64(0)?),
            end_date: Timestamp::new(d.u64(1)?),
            metadata: d.bytes(2)?,
            actions: decode_actions(&d, 3)?,
            allow_failure_map: d.uint(4)?,
        })
    }

    pub fn content_hash(&self) -> Result<ContentHash, ChainError> {
        Ok(ContentHash::from_metadata_bytes(&self.metadata)?)
    }

    pub fn to_log(&self, address: Address, event: EventId) -> RawLog {
        RawLog {
            address,
            topics: vec![
                event_topic(Self::SIGNATURE),
                u256_word(self.proposal_id),
                self.creator.to_word(),
            ],
            data: encode(&[
                Token::uint(self.start_date.as_secs()),
                Token::uint(self.end_date.as_secs()),
                Token::Bytes(self.metadata.clone()),
                actions_token(&self.actions),
                Token::Uint(self.allow_failure_map),
            ]),
            block_number: event.block_number,
            tx_hash: event.tx_hash,
            log_index: event.log_index,
        }
    }
}

// ── Tally events ────────────────────────────────────────────────────────

/// An event that records a voter's participation in a proposal.
pub trait TallyEvent: Send + Sync + 'static {
    const SIGNATURE: &'static str;

    fn decode_record(log: &RawLog) -> Result<VoteRecord, ChainError>;

    /// Encode `record` as the log its plugin would emit.
    fn to_log(address: Address, record: &VoteRecord) -> RawLog;

    fn filter(address: Address, proposal_id: U256, from_block: BlockNumber) -> LogFilter {
        LogFilter::for_proposal(address, Self::SIGNATURE, proposal_id, from_block)
    }
}

fn indexed_log(address: Address, signature: &str, record: &VoteRecord, data: Vec<u8>) -> RawLog {
    RawLog {
        address,
        topics: vec![
            event_topic(signature),
            u256_word(record.proposal_id),
            record.voter.to_word(),
        ],
        data,
        block_number: record.event.block_number,
        tx_hash: record.event.tx_hash,
        log_index: record.event.log_index,
    }
}

/// `VoteCast(uint256 indexed proposalId, address indexed voter, uint8 voteOption, uint256 votingPower)`
pub struct VoteCast;

impl TallyEvent for VoteCast {
    const SIGNATURE: &'static str = "VoteCast(uint256,address,uint8,uint256)";

    fn decode_record(log: &RawLog) -> Result<VoteRecord, ChainError> {
        log.expect_signature(Self::SIGNATURE)?;
        let d = Decoder::new(&log.data);
        let option =
            VoteOption::try_from(d.u8(0)?).map_err(|e| ChainError::Abi(e.to_string()))?;
        Ok(VoteRecord {
            proposal_id: log.topic_uint(1)?,
            voter: log.topic_address(2)?,
            kind: VoteKind::Vote(option),
            voting_power: d.uint(1)?,
            event: log.event_id(),
        })
    }

    fn to_log(address: Address, record: &VoteRecord) -> RawLog {
        let option = match record.kind {
            VoteKind::Vote(option) => option,
            _ => VoteOption::None,
        };
        let data = encode(&[
            Token::uint(option.as_u8()),
            Token::Uint(record.voting_power),
        ]);
        indexed_log(address, Self::SIGNATURE, record, data)
    }
}

/// `VetoCast(uint256 indexed proposalId, address indexed voter, uint256 votingPower)`
pub struct VetoCast;

impl TallyEvent for VetoCast {
    const SIGNATURE: &'static str = "VetoCast(uint256,address,uint256)";

    fn decode_record(log: &RawLog) -> Result<VoteRecord, ChainError> {
        log.expect_signature(Self::SIGNATURE)?;
        let d = Decoder::new(&log.data);
        Ok(VoteRecord {
            proposal_id: log.topic_uint(1)?,
            voter: log.topic_address(2)?,
            kind: VoteKind::Veto,
            voting_power: d.uint(0)?,
            event: log.event_id(),
        })
    }

    fn to_log(address: Address, record: &VoteRecord) -> RawLog {
        let data = encode(&[Token::Uint(record.voting_power)]);
        indexed_log(address, Self::SIGNATURE, record, data)
    }
}

/// `Approved(uint256 indexed proposalId, address indexed approver)`, emitted
/// by emergency multisig plugins.
pub struct Approved;

impl TallyEvent for Approved {
    const SIGNATURE: &'static str = "Approved(uint256,address)";

    fn decode_record(log: &RawLog) -> Result<VoteRecord, ChainError> {
        log.expect_signature(Self::SIGNATURE)?;
        Ok(VoteRecord {
            proposal_id: log.topic_uint(1)?,
            voter: log.topic_address(2)?,
            kind: VoteKind::Approval,
            voting_power: U256::ZERO,
            event: log.event_id(),
        })
    }

    fn to_log(address: Address, record: &VoteRecord) -> RawLog {
        indexed_log(address, Self::SIGNATURE, record, Vec::new())
    }
}
