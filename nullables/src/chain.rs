//! Nullable chain: an in-memory EVM node for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use agora_chain::abi::{encode, selector, Decoder, Token};
use agora_chain::events::{LogFilter, RawLog, TallyEvent};
use agora_chain::plugin::{encode_proposal, GET_PROPOSAL, GET_VOTING_TOKEN, PROPOSAL_COUNT};
use agora_chain::token::{DECIMALS, GET_PAST_TOTAL_SUPPLY, GET_PAST_VOTES, SYMBOL, TOTAL_SUPPLY};
use agora_chain::{BlockSource, ChainError, ContractReader, LogQuery, ProposalCreated};
use agora_governance::{EventId, Proposal, VoteRecord};
use agora_types::{Address, BlockNumber, BlockTag, ChainId, ContentHash, TxHash, U256};

#[derive(Default)]
struct Token20 {
    decimals: u8,
    symbol: String,
    /// Supply checkpoints by block.
    supply: BTreeMap<BlockNumber, U256>,
    votes: HashMap<Address, BTreeMap<BlockNumber, U256>>,
}

fn checkpoint_at(checkpoints: &BTreeMap<BlockNumber, U256>, at: BlockNumber) -> U256 {
    checkpoints
        .range(..=at)
        .next_back()
        .map(|(_, v)| *v)
        .unwrap_or(U256::ZERO)
}

struct ChainState {
    head: BlockNumber,
    chain_id: ChainId,
    proposals: HashMap<(Address, U256), (Proposal, Option<ContentHash>)>,
    voting_tokens: HashMap<Address, Address>,
    tokens: HashMap<Address, Token20>,
    logs: Vec<RawLog>,
    next_log: u64,
    failing_calls: usize,
    failing_log_queries: usize,
    calls: usize,
    log_queries: usize,
}

/// A deterministic chain for testing.
///
/// Contract state is set directly; logs are appended as if emitted. The
/// head only moves when you tell it to. Failures can be injected to
/// exercise transient error paths.
pub struct NullChain {
    state: Mutex<ChainState>,
}

impl NullChain {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            state: Mutex::new(ChainState {
                head: BlockNumber::new(1),
                chain_id,
                proposals: HashMap::new(),
                voting_tokens: HashMap::new(),
                tokens: HashMap::new(),
                logs: Vec::new(),
                next_log: 0,
                failing_calls: 0,
                failing_log_queries: 0,
                calls: 0,
                log_queries: 0,
            }),
        }
    }

    pub fn head(&self) -> BlockNumber {
        self.state.lock().unwrap().head
    }

    pub fn set_head(&self, head: BlockNumber) {
        self.state.lock().unwrap().head = head;
    }

    /// Mine `blocks` empty blocks.
    pub fn advance(&self, blocks: u64) -> BlockNumber {
        let mut state = self.state.lock().unwrap();
        state.head = BlockNumber::new(state.head.as_u64() + blocks);
        state.head
    }

    /// Store `proposal` on `plugin`. Optimistic plugins also return `metadata`.
    pub fn set_proposal(&self, plugin: Address, proposal: Proposal, metadata: Option<ContentHash>) {
        self.state
            .lock()
            .unwrap()
            .proposals
            .insert((plugin, proposal.id), (proposal, metadata));
    }

    /// Change a stored proposal in place (tallies, flags).
    pub fn update_proposal(&self, plugin: Address, id: U256, f: impl FnOnce(&mut Proposal)) {
        if let Some((proposal, _)) = self.state.lock().unwrap().proposals.get_mut(&(plugin, id)) {
            f(proposal);
        }
    }

    pub fn set_voting_token(&self, plugin: Address, token: Address) {
        self.state.lock().unwrap().voting_tokens.insert(plugin, token);
    }

    pub fn set_token(&self, token: Address, symbol: &str, decimals: u8) {
        let mut state = self.state.lock().unwrap();
        let entry = state.tokens.entry(token).or_default();
        entry.symbol = symbol.to_string();
        entry.decimals = decimals;
    }

    /// Checkpoint the total supply of `token` at `block`.
    pub fn set_supply(&self, token: Address, block: BlockNumber, supply: U256) {
        self.state
            .lock()
            .unwrap()
            .tokens
            .entry(token)
            .or_default()
            .supply
            .insert(block, supply);
    }

    /// Checkpoint the voting power of `account` at `block`.
    pub fn set_votes(&self, token: Address, account: Address, block: BlockNumber, votes: U256) {
        self.state
            .lock()
            .unwrap()
            .tokens
            .entry(token)
            .or_default()
            .votes
            .entry(account)
            .or_default()
            .insert(block, votes);
    }

    /// Next event identity at the current head.
    pub fn next_event(&self) -> EventId {
        let mut state = self.state.lock().unwrap();
        state.next_log += 1;
        let mut tx = [0u8; 32];
        tx[24..].copy_from_slice(&state.next_log.to_be_bytes());
        EventId {
            block_number: state.head,
            tx_hash: TxHash::new(tx),
            log_index: state.next_log,
        }
    }

    pub fn push_log(&self, log: RawLog) {
        self.state.lock().unwrap().logs.push(log);
    }

    /// Emit the creation event of `created` at the current head.
    pub fn emit_created(&self, plugin: Address, created: &ProposalCreated) -> EventId {
        let event = self.next_event();
        self.push_log(created.to_log(plugin, event));
        event
    }

    /// Emit a vote, veto or approval event. `record.event` is used as given.
    pub fn emit<E: TallyEvent>(&self, plugin: Address, record: &VoteRecord) {
        self.push_log(E::to_log(plugin, record));
    }

    /// The next `n` contract calls fail with a transport error.
    pub fn fail_calls(&self, n: usize) {
        self.state.lock().unwrap().failing_calls = n;
    }

    /// The next `n` log queries fail with a transport error.
    pub fn fail_log_queries(&self, n: usize) {
        self.state.lock().unwrap().failing_log_queries = n;
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn log_query_count(&self) -> usize {
        self.state.lock().unwrap().log_queries
    }
}

fn injected() -> ChainError {
    ChainError::Transport("null chain: injected failure".into())
}

fn reverted() -> ChainError {
    ChainError::Rpc {
        code: 3,
        message: "execution reverted".into(),
    }
}

impl ChainState {
    fn execute(&self, to: Address, calldata: &[u8], block: BlockTag) -> Result<Vec<u8>, ChainError> {
        if calldata.len() < 4 {
            return Err(reverted());
        }
        let (sel, args) = calldata.split_at(4);
        let args = Decoder::new(args);
        let at = match block {
            BlockTag::Latest => self.head,
            BlockTag::Number(n) => n,
        };

        if sel == selector(GET_PROPOSAL) {
            let id = args.uint(0)?;
            // Unknown ids read as a zeroed struct, like the plugins do.
            return Ok(match self.proposals.get(&(to, id)) {
                Some((proposal, metadata)) => encode_proposal(proposal, metadata.as_ref()),
                None => encode(&vec![Token::Uint(U256::ZERO); 12]),
            });
        }
        if sel == selector(PROPOSAL_COUNT) {
            let count = self.proposals.keys().filter(|(plugin, _)| *plugin == to).count();
            return Ok(encode(&[Token::uint(count as u64)]));
        }
        if sel == selector(GET_VOTING_TOKEN) {
            let token = self.voting_tokens.get(&to).ok_or_else(reverted)?;
            return Ok(encode(&[Token::Address(*token)]));
        }

        let token = self.tokens.get(&to).ok_or_else(reverted)?;
        if sel == selector(TOTAL_SUPPLY) {
            Ok(encode(&[Token::Uint(checkpoint_at(&token.supply, at))]))
        } else if sel == selector(GET_PAST_TOTAL_SUPPLY) {
            let timepoint = BlockNumber::new(args.u64(0)?);
            if timepoint >= self.head {
                // ERC20Votes rejects lookups that are not yet in the past.
                return Err(reverted());
            }
            Ok(encode(&[Token::Uint(checkpoint_at(&token.supply, timepoint))]))
        } else if sel == selector(GET_PAST_VOTES) {
            let account = args.address(0)?;
            let timepoint = BlockNumber::new(args.u64(1)?);
            if timepoint >= self.head {
                return Err(reverted());
            }
            let votes = token
                .votes
                .get(&account)
                .map(|c| checkpoint_at(c, timepoint))
                .unwrap_or(U256::ZERO);
            Ok(encode(&[Token::Uint(votes)]))
        } else if sel == selector(DECIMALS) {
            Ok(encode(&[Token::uint(token.decimals)]))
        } else if sel == selector(SYMBOL) {
            Ok(encode(&[Token::Bytes(token.symbol.clone().into_bytes())]))
        } else {
            Err(reverted())
        }
    }
}

impl ContractReader for NullChain {
    async fn call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        block: BlockTag,
    ) -> Result<Vec<u8>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.failing_calls > 0 {
            state.failing_calls -= 1;
            return Err(injected());
        }
        state.execute(to, &calldata, block)
    }
}

impl LogQuery for NullChain {
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.log_queries += 1;
        if state.failing_log_queries > 0 {
            state.failing_log_queries -= 1;
            return Err(injected());
        }
        let head = state.head;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.block_number <= head && filter.matches(log))
            .cloned()
            .collect())
    }
}

impl BlockSource for NullChain {
    async fn block_number(&self) -> Result<BlockNumber, ChainError> {
        Ok(self.head())
    }

    async fn chain_id(&self) -> Result<ChainId, ChainError> {
        Ok(self.state.lock().unwrap().chain_id)
    }
}
