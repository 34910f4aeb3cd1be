//! Governance plugin calls: `getProposal`, `proposalCount`, `getVotingToken`.

use agora_governance::{
    Action, MajorityParameters, MetadataState, OptimisticParameters, Proposal, ProposalParameters,
    Ratio, Tally,
};
use agora_types::{Address, BlockNumber, BlockTag, ContentHash, Timestamp, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::abi::{encode, encode_call, Decoder, Token};
use crate::error::ChainError;
use crate::ContractReader;

pub const GET_PROPOSAL: &str = "getProposal(uint256)";
pub const PROPOSAL_COUNT: &str = "proposalCount()";
pub const GET_VOTING_TOKEN: &str = "getVotingToken()";

/// Which voting variant a plugin implements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    #[default]
    TokenVoting,
    Optimistic,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenVoting => f.write_str("token_voting"),
            Self::Optimistic => f.write_str("optimistic"),
        }
    }
}

impl FromStr for PluginKind {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token_voting" | "token-voting" | "majority" => Ok(Self::TokenVoting),
            "optimistic" => Ok(Self::Optimistic),
            other => Err(ChainError::Other(format!("unknown plugin kind: {other}"))),
        }
    }
}

pub fn get_proposal_call(id: U256) -> Vec<u8> {
    encode_call(GET_PROPOSAL, &[Token::Uint(id)])
}

pub fn proposal_count_call() -> Vec<u8> {
    encode_call(PROPOSAL_COUNT, &[])
}

pub fn voting_token_call() -> Vec<u8> {
    encode_call(GET_VOTING_TOKEN, &[])
}

/// Decode a `(address,uint256,bytes)[]` whose offset sits at head word `index`.
pub(crate) fn decode_actions(d: &Decoder<'_>, index: usize) -> Result<Vec<Action>, ChainError> {
    d.array(index, true, 0, |item| {
        Ok(Action {
            to: item.address(0)?,
            value: item.uint(1)?,
            data: item.bytes(2)?,
        })
    })
}

pub(crate) fn actions_token(actions: &[Action]) -> Token {
    Token::Array(
        actions
            .iter()
            .map(|a| {
                Token::Tuple(vec![
                    Token::Address(a.to),
                    Token::Uint(a.value),
                    Token::Bytes(a.data.clone()),
                ])
            })
            .collect(),
    )
}

/// Decode a `getProposal` return value.
///
/// `Ok(None)` means the proposal was never created: the plugin returns a
/// zeroed struct (or nothing at all) for unknown ids. The returned proposal
/// has no creator and pending metadata; both come from the creation event.
pub fn decode_proposal(kind: PluginKind, id: U256, data: &[u8]) -> Result<Option<Proposal>, ChainError> {
    if data.is_empty() {
        return Ok(None);
    }
    let d = Decoder::new(data);
    let active = d.bool(0)?;
    let executed = d.bool(1)?;
    let start_date = Timestamp::new(d.u64(3)?);
    let end_date = Timestamp::new(d.u64(4)?);
    if start_date == Timestamp::EPOCH && end_date == Timestamp::EPOCH {
        return Ok(None);
    }
    let ratio = |index| -> Result<Ratio, ChainError> {
        Ratio::new(d.u32(index)?).map_err(|e| ChainError::Abi(e.to_string()))
    };

    let (parameters, tally, actions_at, failure_map_at) = match kind {
        PluginKind::TokenVoting => (
            ProposalParameters::Majority(MajorityParameters {
                support_threshold: ratio(2)?,
                start_date,
                end_date,
                snapshot_block: BlockNumber::new(d.u64(5)?),
                min_voting_power: d.uint(6)?,
            }),
            Tally::Majority {
                abstain: d.uint(7)?,
                yes: d.uint(8)?,
                no: d.uint(9)?,
            },
            10,
            11,
        ),
        PluginKind::Optimistic => (
            ProposalParameters::Optimistic(OptimisticParameters {
                min_veto_ratio: ratio(2)?,
                start_date,
                end_date,
                snapshot_epoch: BlockNumber::new(d.u64(5)?),
            }),
            Tally::Veto {
                weight: d.uint(6)?,
            },
            8,
            9,
        ),
    };

    Ok(Some(Proposal {
        id,
        active,
        executed,
        parameters,
        tally,
        creator: None,
        actions: decode_actions(&d, actions_at)?,
        allow_failure_map: d.uint(failure_map_at)?,
        metadata: MetadataState::Pending,
    }))
}

/// Encode `proposal` the way its plugin returns it from `getProposal`.
///
/// Optimistic plugins also return the metadata URI; `metadata` fills it.
pub fn encode_proposal(proposal: &Proposal, metadata: Option<&ContentHash>) -> Vec<u8> {
    let mut tokens = vec![Token::Bool(proposal.active), Token::Bool(proposal.executed)];

    match (&proposal.parameters, &proposal.tally) {
        (ProposalParameters::Majority(p), tally) => {
            tokens.push(Token::Tuple(vec![
                Token::uint(p.support_threshold.parts_per_million()),
                Token::uint(p.start_date.as_secs()),
                Token::uint(p.end_date.as_secs()),
                Token::uint(p.snapshot_block.as_u64()),
                Token::Uint(p.min_voting_power),
            ]));
            let (yes, no, abstain) = match tally {
                Tally::Majority { yes, no, abstain } => (*yes, *no, *abstain),
                Tally::Veto { .. } => (U256::ZERO, U256::ZERO, U256::ZERO),
            };
            tokens.push(Token::Tuple(vec![
                Token::Uint(abstain),
                Token::Uint(yes),
                Token::Uint(no),
            ]));
        }
        (ProposalParameters::Optimistic(p), tally) => {
            tokens.push(Token::Tuple(vec![
                Token::uint(p.min_veto_ratio.parts_per_million()),
                Token::uint(p.start_date.as_secs()),
                Token::uint(p.end_date.as_secs()),
                Token::uint(p.snapshot_epoch.as_u64()),
            ]));
            let veto = match tally {
                Tally::Veto { weight } => *weight,
                Tally::Majority { .. } => U256::ZERO,
            };
            tokens.push(Token::Uint(veto));
            let uri = metadata.map(ContentHash::to_uri).unwrap_or_default();
            tokens.push(Token::Bytes(uri.into_bytes()));
        }
    }

    tokens.push(actions_token(&proposal.actions));
    tokens.push(Token::Uint(proposal.allow_failure_map));
    encode(&tokens)
}

pub fn decode_uint(data: &[u8]) -> Result<U256, ChainError> {
    Decoder::new(data).uint(0)
}

pub fn decode_address(data: &[u8]) -> Result<Address, ChainError> {
    Decoder::new(data).address(0)
}

/// Typed calls against one plugin contract.
pub struct PluginContract<'a, C> {
    reader: &'a C,
    address: Address,
    kind: PluginKind,
}

impl<'a, C: ContractReader> PluginContract<'a, C> {
    pub fn new(reader: &'a C, address: Address, kind: PluginKind) -> Self {
        Self {
            reader,
            address,
            kind,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    pub async fn proposal(&self, id: U256, block: BlockTag) -> Result<Option<Proposal>, ChainError> {
        let data = self
            .reader
            .call(self.address, get_proposal_call(id), block)
            .await?;
        decode_proposal(self.kind, id, &data)
    }

    pub async fn proposal_count(&self) -> Result<U256, ChainError> {
        let data = self
            .reader
            .call(self.address, proposal_count_call(), BlockTag::Latest)
            .await?;
        decode_uint(&data)
    }

    pub async fn voting_token(&self) -> Result<Address, ChainError> {
        let data = self
            .reader
            .call(self.address, voting_token_call(), BlockTag::Latest)
            .await?;
        decode_address(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn majority() -> Proposal {
        Proposal {
            id: U256::new(4),
            active: false,
            executed: false,
            parameters: ProposalParameters::Majority(MajorityParameters {
                support_threshold: Ratio::new(500_000).unwrap(),
                start_date: Timestamp::new(1_700_000_000),
                end_date: Timestamp::new(1_700_086_400),
                snapshot_block: BlockNumber::new(19_000_000),
                min_voting_power: U256::new(50),
            }),
            tally: Tally::Majority {
                yes: U256::new(70),
                no: U256::new(30),
                abstain: U256::new(5),
            },
            creator: None,
            actions: vec![Action {
                to: Address::new([0xaa; 20]),
                value: U256::new(1_000),
                data: vec![0xde, 0xad, 0xbe, 0xef],
            }],
            allow_failure_map: U256::ONE,
            metadata: MetadataState::Pending,
        }
    }

    fn optimistic() -> Proposal {
        Proposal {
            id: U256::new(9),
            active: true,
            executed: false,
            parameters: ProposalParameters::Optimistic(OptimisticParameters {
                min_veto_ratio: Ratio::new(100_000).unwrap(),
                start_date: Timestamp::new(10),
                end_date: Timestamp::new(20),
                snapshot_epoch: BlockNumber::new(7),
            }),
            tally: Tally::Veto {
                weight: U256::new(1_234),
            },
            creator: None,
            actions: vec![],
            allow_failure_map: U256::ZERO,
            metadata: MetadataState::Pending,
        }
    }

    #[test]
    fn selectors_prefix_calls() {
        let call = get_proposal_call(U256::new(4));
        assert_eq!(call.len(), 4 + 32);
        assert_eq!(&call[..4], &crate::abi::selector(GET_PROPOSAL));
        assert_eq!(call[35], 4);
    }

    #[test]
    fn majority_layout_has_twelve_head_words() {
        let p = majority();
        let data = encode_proposal(&p, None);
        let d = Decoder::new(&data);
        assert_eq!(d.u64(10).unwrap(), 12 * 32);
        assert_eq!(d.uint(8).unwrap(), U256::new(70));
        assert_eq!(decode_proposal(PluginKind::TokenVoting, p.id, &data).unwrap(), Some(p));
    }

    #[test]
    fn optimistic_layout_skips_metadata_uri() {
        let p = optimistic();
        let cid = ContentHash::new("QmTest").unwrap();
        let data = encode_proposal(&p, Some(&cid));
        let d = Decoder::new(&data);
        assert_eq!(d.bytes(7).unwrap(), b"ipfs://QmTest");
        assert_eq!(decode_proposal(PluginKind::Optimistic, p.id, &data).unwrap(), Some(p));
    }

    #[test]
    fn zeroed_struct_is_not_found() {
        let mut p = majority();
        p.actions.clear();
        if let ProposalParameters::Majority(params) = &mut p.parameters {
            params.start_date = Timestamp::EPOCH;
            params.end_date = Timestamp::EPOCH;
        }
        let data = encode_proposal(&p, None);
        assert_eq!(decode_proposal(PluginKind::TokenVoting, p.id, &data).unwrap(), None);
        assert_eq!(decode_proposal(PluginKind::TokenVoting, p.id, &[]).unwrap(), None);
    }

    #[test]
    fn truncated_response_is_an_error() {
        let data = encode_proposal(&majority(), None);
        assert!(decode_proposal(PluginKind::TokenVoting, U256::new(4), &data[..200]).is_err());
    }

    #[test]
    fn plugin_kind_parses() {
        assert_eq!("optimistic".parse::<PluginKind>().unwrap(), PluginKind::Optimistic);
        assert_eq!("token-voting".parse::<PluginKind>().unwrap(), PluginKind::TokenVoting);
        assert!("multisig".parse::<PluginKind>().is_err());
    }
}
