//! Integration tests exercising the read pipeline end to end:
//! contract state + creation event + metadata → loader → status,
//! and vote/veto logs → aggregator, all against the in-memory nullables.

use std::sync::Arc;
use std::time::Duration;

use agora_chain::{Approved, PluginKind, ProposalCreated, VetoCast, VoteCast};
use agora_governance::{
    veto_percentage, Acceptance, EventId, MajorityParameters, MetadataState, OptimisticParameters,
    Percent, Proposal, ProposalMetadata, ProposalParameters, ProposalStatus, Ratio, Rejection,
    Resource, Tally, VoteKind, VoteOption, VoteRecord,
};
use agora_metadata::ProposalDraft;
use agora_node::{
    submit_draft, submit_vote, BlockPoller, LoadOutcome, LoaderError, LogAggregator, NodeError,
    PluginTarget, ProposalLoader, QueryCache, ShutdownController, SubmitError, TokenInfo,
};
use agora_nullables::{NullChain, NullMetadata, NullWriter, Submission};
use agora_types::{Address, BlockNumber, ChainId, ContentHash, Timestamp, TxHash, U256};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PLUGIN: Address = Address::new([0x11; 20]);
const TOKEN: Address = Address::new([0x70; 20]);
const CREATOR: Address = Address::new([0xc0; 20]);

type Loader = ProposalLoader<Arc<NullChain>, Arc<NullChain>, Arc<NullMetadata>>;

struct Harness {
    chain: Arc<NullChain>,
    metadata: Arc<NullMetadata>,
    loader: Loader,
}

fn harness(kind: PluginKind) -> Harness {
    let chain = Arc::new(NullChain::new(ChainId::SEPOLIA));
    chain.set_head(BlockNumber::new(100));
    let metadata = Arc::new(NullMetadata::new());
    let target = PluginTarget {
        chain_id: ChainId::SEPOLIA,
        address: PLUGIN,
        kind,
    };
    let loader = ProposalLoader::new(
        chain.clone(),
        chain.clone(),
        metadata.clone(),
        target,
        QueryCache::new(Duration::from_secs(60)),
    );
    Harness {
        chain,
        metadata,
        loader,
    }
}

fn cid(n: u8) -> ContentHash {
    ContentHash::new(format!("QmProposal{n}")).unwrap()
}

fn document(title: &str) -> ProposalMetadata {
    ProposalMetadata {
        title: title.into(),
        summary: "summary".into(),
        description: "<p>body</p>".into(),
        resources: vec![Resource {
            name: "Forum".into(),
            url: "https://forum.example.org/t/1".into(),
        }],
    }
}

fn majority(id: u64, yes: u128, no: u128, abstain: u128) -> Proposal {
    Proposal {
        id: U256::from(id),
        active: false,
        executed: false,
        parameters: ProposalParameters::Majority(MajorityParameters {
            support_threshold: Ratio::new(500_000).unwrap(),
            start_date: Timestamp::new(1_700_000_000),
            end_date: Timestamp::new(1_700_600_000),
            snapshot_block: BlockNumber::new(50),
            min_voting_power: U256::new(100),
        }),
        tally: Tally::Majority {
            yes: U256::new(yes),
            no: U256::new(no),
            abstain: U256::new(abstain),
        },
        creator: None,
        actions: vec![],
        allow_failure_map: U256::ZERO,
        metadata: MetadataState::Pending,
    }
}

fn optimistic(id: u64, veto: u128) -> Proposal {
    Proposal {
        id: U256::from(id),
        active: false,
        executed: false,
        parameters: ProposalParameters::Optimistic(OptimisticParameters {
            min_veto_ratio: Ratio::new(100_000).unwrap(),
            start_date: Timestamp::new(1_700_000_000),
            end_date: Timestamp::new(1_700_600_000),
            snapshot_epoch: BlockNumber::new(50),
        }),
        tally: Tally::Veto {
            weight: U256::new(veto),
        },
        creator: None,
        actions: vec![],
        allow_failure_map: U256::ZERO,
        metadata: MetadataState::Pending,
    }
}

fn created(proposal: &Proposal, metadata: &ContentHash) -> ProposalCreated {
    ProposalCreated {
        proposal_id: proposal.id,
        creator: CREATOR,
        start_date: proposal.parameters.start_date(),
        end_date: proposal.parameters.end_date(),
        metadata: metadata.to_uri().into_bytes(),
        actions: proposal.actions.clone(),
        allow_failure_map: proposal.allow_failure_map,
    }
}

/// Store `proposal`, emit its creation event and serve its metadata.
fn publish(h: &Harness, proposal: &Proposal, n: u8) {
    h.chain.set_proposal(PLUGIN, proposal.clone(), Some(cid(n)));
    h.chain.emit_created(PLUGIN, &created(proposal, &cid(n)));
    h.metadata.insert(cid(n), document(&format!("Proposal {n}")));
}

fn record(id: u64, voter: u8, kind: VoteKind, power: u128, event: EventId) -> VoteRecord {
    VoteRecord {
        proposal_id: U256::from(id),
        voter: Address::new([voter; 20]),
        kind,
        voting_power: U256::new(power),
        event,
    }
}

fn found(outcome: LoadOutcome) -> Proposal {
    match outcome {
        LoadOutcome::Found(p) => p,
        other => panic!("expected a proposal, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

#[tokio::test]
async fn loads_majority_proposal_with_metadata() {
    let h = harness(PluginKind::TokenVoting);
    publish(&h, &majority(1, 700, 300, 0), 1);

    let proposal = found(h.loader.load(U256::ONE).await.unwrap());
    assert_eq!(proposal.title(), "Proposal 1");
    assert_eq!(proposal.creator, Some(CREATOR));
    assert_eq!(proposal.resources().len(), 1);
    // Scenario: threshold 50%, 70% support, no actions.
    assert_eq!(
        h.loader.status(&proposal).await.unwrap(),
        ProposalStatus::Accepted(Acceptance::Passed)
    );
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let h = harness(PluginKind::TokenVoting);
    assert_eq!(h.loader.load(U256::from(9u64)).await.unwrap(), LoadOutcome::NotFound);
}

#[tokio::test]
async fn creation_event_before_state_is_pending_and_not_cached() {
    let h = harness(PluginKind::TokenVoting);
    let proposal = majority(1, 0, 0, 0);
    h.chain.emit_created(PLUGIN, &created(&proposal, &cid(1)));
    h.metadata.insert(cid(1), document("late"));

    assert_eq!(h.loader.load(U256::ONE).await.unwrap(), LoadOutcome::Pending);
    assert!(h.loader.cache().is_empty());

    h.chain.set_proposal(PLUGIN, proposal, None);
    let proposal = found(h.loader.load(U256::ONE).await.unwrap());
    assert_eq!(proposal.title(), "late");
}

#[tokio::test]
async fn missing_creation_log_keeps_proposal_usable() {
    let h = harness(PluginKind::TokenVoting);
    h.chain.set_proposal(PLUGIN, majority(1, 0, 0, 0), None);

    let proposal = found(h.loader.load(U256::ONE).await.unwrap());
    assert_eq!(proposal.metadata, MetadataState::Unavailable("no creation logs".into()));
    assert_eq!(proposal.creator, None);
    // Scenario: nobody voted.
    assert_eq!(
        h.loader.status(&proposal).await.unwrap(),
        ProposalStatus::Rejected(Rejection::Defeated)
    );
}

#[tokio::test]
async fn broken_document_is_unavailable() {
    let h = harness(PluginKind::TokenVoting);
    let proposal = majority(1, 50, 10, 0);
    h.chain.set_proposal(PLUGIN, proposal.clone(), None);
    h.chain.emit_created(PLUGIN, &created(&proposal, &cid(1)));
    h.metadata.insert_broken(cid(1), "not json");

    let proposal = found(h.loader.load(U256::ONE).await.unwrap());
    assert!(matches!(proposal.metadata, MetadataState::Unavailable(_)));
    assert_eq!(proposal.creator, Some(CREATOR));
    // Scenario: 60 of 100 required.
    assert_eq!(
        h.loader.status(&proposal).await.unwrap(),
        ProposalStatus::Rejected(Rejection::LowTurnout)
    );
}

#[tokio::test]
async fn failed_log_query_is_retried_next_load() {
    let h = harness(PluginKind::TokenVoting);
    publish(&h, &majority(1, 1, 0, 0), 1);
    h.chain.fail_log_queries(1);

    let first = found(h.loader.load(U256::ONE).await.unwrap());
    match &first.metadata {
        MetadataState::Unavailable(reason) => assert!(reason.starts_with("creation log query failed")),
        other => panic!("unexpected metadata state {other:?}"),
    }

    let second = found(h.loader.load(U256::ONE).await.unwrap());
    assert_eq!(second.title(), "Proposal 1");
}

#[tokio::test]
async fn transport_failure_is_transient_error() {
    let h = harness(PluginKind::TokenVoting);
    publish(&h, &majority(1, 1, 0, 0), 1);
    h.chain.fail_calls(1);

    let err = h.loader.load(U256::ONE).await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(err, LoaderError::Transient(_)));
    assert!(h.loader.cache().is_empty());
    assert!(h.loader.load(U256::ONE).await.is_ok());
}

#[tokio::test]
async fn repeated_loads_are_equal_and_cached() {
    let h = harness(PluginKind::TokenVoting);
    publish(&h, &majority(1, 700, 300, 0), 1);

    let first = h.loader.load(U256::ONE).await.unwrap();
    let calls = h.chain.call_count();
    let second = h.loader.load(U256::ONE).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(h.chain.call_count(), calls);
    assert_eq!(h.metadata.fetched().len(), 1);
}

#[tokio::test]
async fn new_block_refreshes_tally_but_not_metadata() {
    let h = harness(PluginKind::TokenVoting);
    publish(&h, &majority(1, 10, 0, 0), 1);
    let before = found(h.loader.load(U256::ONE).await.unwrap());

    h.chain.update_proposal(PLUGIN, U256::ONE, |p| {
        p.tally = Tally::Majority {
            yes: U256::new(10),
            no: U256::new(500),
            abstain: U256::ZERO,
        };
    });
    let head = h.chain.advance(1);
    let after = found(h.loader.refresh_on_block(U256::ONE, head).await.unwrap());

    assert_ne!(before.tally, after.tally);
    assert_eq!(h.loader.cache().block_of(&key(U256::ONE)), Some(head));
    assert_eq!(h.metadata.fetched().len(), 1);
}

#[tokio::test]
async fn stale_head_does_not_replace_newer_read() {
    let h = harness(PluginKind::TokenVoting);
    publish(&h, &majority(1, 10, 0, 0), 1);
    let head = h.chain.advance(5);
    let fresh = h.loader.refresh_on_block(U256::ONE, head).await.unwrap();

    h.chain.update_proposal(PLUGIN, U256::ONE, |p| p.executed = true);
    let late = h
        .loader
        .refresh_on_block(U256::ONE, BlockNumber::new(head.as_u64() - 3))
        .await
        .unwrap();
    assert_eq!(late, fresh);
    assert_eq!(h.loader.cache().block_of(&key(U256::ONE)), Some(head));
}

#[tokio::test]
async fn optimistic_status_uses_snapshot_supply() {
    let h = harness(PluginKind::Optimistic);
    h.chain.set_voting_token(PLUGIN, TOKEN);
    h.chain.set_supply(TOKEN, BlockNumber::new(10), U256::new(1_000_000));

    // Scenario: 10% of one million is needed to veto.
    publish(&h, &optimistic(1, 99_999), 1);
    publish(&h, &optimistic(2, 100_000), 2);

    let accepted = found(h.loader.load(U256::ONE).await.unwrap());
    assert_eq!(
        h.loader.status(&accepted).await.unwrap(),
        ProposalStatus::Accepted(Acceptance::Executable)
    );
    let vetoed = found(h.loader.load(U256::from(2u64)).await.unwrap());
    assert_eq!(h.loader.status(&vetoed).await.unwrap(), ProposalStatus::Vetoed);

    let supply = h.loader.snapshot_supply(&vetoed).await.unwrap();
    assert_eq!(supply, Some(U256::new(1_000_000)));
    let ratio = h.loader.min_veto_ratio(&vetoed);
    let Tally::Veto { weight: veto } = vetoed.tally else {
        unreachable!()
    };
    assert_eq!(veto_percentage(veto, supply, ratio), Percent::from_hundredths(10_000));
}

#[tokio::test]
async fn optimistic_status_waits_for_snapshot() {
    let h = harness(PluginKind::Optimistic);
    h.chain.set_voting_token(PLUGIN, TOKEN);
    h.chain.set_supply(TOKEN, BlockNumber::new(10), U256::new(1_000_000));
    let mut proposal = optimistic(1, 0);
    if let ProposalParameters::Optimistic(p) = &mut proposal.parameters {
        p.snapshot_epoch = h.chain.head();
    }
    publish(&h, &proposal, 1);

    let proposal = found(h.loader.load(U256::ONE).await.unwrap());
    assert_eq!(h.loader.snapshot_supply(&proposal).await.unwrap(), None);
    assert_eq!(h.loader.status(&proposal).await.unwrap(), ProposalStatus::Loading);
}

#[tokio::test]
async fn veto_ratio_override_applies() {
    let h = harness(PluginKind::Optimistic);
    h.chain.set_voting_token(PLUGIN, TOKEN);
    h.chain.set_supply(TOKEN, BlockNumber::new(10), U256::new(1_000_000));
    publish(&h, &optimistic(1, 60_000), 1);

    let Harness { chain, metadata, .. } = h;
    let loader = ProposalLoader::new(
        chain.clone(),
        chain.clone(),
        metadata,
        PluginTarget {
            chain_id: ChainId::SEPOLIA,
            address: PLUGIN,
            kind: PluginKind::Optimistic,
        },
        QueryCache::new(Duration::from_secs(60)),
    )
    .with_token(TOKEN)
    .with_min_veto_ratio(Ratio::new(50_000).unwrap());

    let proposal = found(loader.load(U256::ONE).await.unwrap());
    assert_eq!(loader.status(&proposal).await.unwrap(), ProposalStatus::Vetoed);
}

#[tokio::test]
async fn token_info_reads_current_token_state() {
    let h = harness(PluginKind::TokenVoting);
    h.chain.set_voting_token(PLUGIN, TOKEN);
    h.chain.set_token(TOKEN, "AGR", 6);
    h.chain.set_supply(TOKEN, BlockNumber::new(10), U256::new(1_000_000));
    h.chain.set_supply(TOKEN, BlockNumber::new(90), U256::new(1_500_000));

    let info = h.loader.token_info().await.unwrap();
    assert_eq!(
        info,
        TokenInfo {
            address: TOKEN,
            symbol: "AGR".into(),
            decimals: 6,
            total_supply: U256::new(1_500_000),
        }
    );
}

#[tokio::test]
async fn voting_power_is_read_at_the_snapshot() {
    let h = harness(PluginKind::TokenVoting);
    h.chain.set_voting_token(PLUGIN, TOKEN);
    let voter = Address::new([0x01; 20]);
    h.chain.set_votes(TOKEN, voter, BlockNumber::new(40), U256::new(300));
    h.chain.set_votes(TOKEN, voter, BlockNumber::new(60), U256::new(900));
    publish(&h, &majority(1, 0, 0, 0), 1);

    let proposal = found(h.loader.load(U256::ONE).await.unwrap());
    assert_eq!(
        h.loader.voting_power(voter, &proposal).await.unwrap(),
        Some(U256::new(300))
    );
    let stranger = Address::new([0x02; 20]);
    assert_eq!(
        h.loader.voting_power(stranger, &proposal).await.unwrap(),
        Some(U256::ZERO)
    );

    let mut fresh = proposal.clone();
    if let ProposalParameters::Majority(p) = &mut fresh.parameters {
        p.snapshot_block = h.chain.head();
    }
    assert_eq!(h.loader.voting_power(voter, &fresh).await.unwrap(), None);
}

#[tokio::test]
async fn chain_mismatch_is_reported() {
    let chain = Arc::new(NullChain::new(ChainId::MAINNET));
    let loader = ProposalLoader::new(
        chain.clone(),
        chain,
        NullMetadata::new(),
        PluginTarget {
            chain_id: ChainId::SEPOLIA,
            address: PLUGIN,
            kind: PluginKind::TokenVoting,
        },
        QueryCache::new(Duration::from_secs(60)),
    );
    assert!(matches!(
        loader.check_chain().await,
        Err(NodeError::ChainMismatch { .. })
    ));
}

#[tokio::test]
async fn proposal_count_lists_plugin_proposals() {
    let h = harness(PluginKind::TokenVoting);
    publish(&h, &majority(0, 1, 0, 0), 0);
    publish(&h, &majority(1, 1, 0, 0), 1);
    assert_eq!(h.loader.proposal_count().await.unwrap(), U256::from(2u64));
}

#[tokio::test]
async fn proposal_ids_newest_first() {
    let h = harness(PluginKind::TokenVoting);
    for n in 0..3u8 {
        publish(&h, &majority(n.into(), 1, 0, 0), n);
    }
    let ids = h.loader.proposal_ids(2).await.unwrap();
    assert_eq!(ids, vec![U256::from(2u64), U256::from(1u64)]);
}

#[tokio::test]
async fn optimistic_ids_come_from_creation_events() {
    let h = harness(PluginKind::Optimistic);
    let packed = |index: u64| {
        agora_governance::ProposalIdParts {
            index,
            start_date: Timestamp::new(1_700_000_000),
            end_date: Timestamp::new(1_700_600_000),
        }
        .encode()
    };
    for index in 0..3u64 {
        let mut proposal = optimistic(0, 0);
        proposal.id = packed(index);
        h.chain.set_proposal(PLUGIN, proposal.clone(), Some(cid(1)));
        h.chain.emit_created(PLUGIN, &created(&proposal, &cid(1)));
    }
    let ids = h.loader.proposal_ids(10).await.unwrap();
    assert_eq!(ids, vec![packed(2), packed(1), packed(0)]);
}

fn key(id: U256) -> agora_node::CacheKey {
    agora_node::CacheKey {
        chain_id: ChainId::SEPOLIA,
        plugin: PLUGIN,
        proposal_id: id,
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn votes_are_aggregated_once_per_event() {
    let chain = NullChain::new(ChainId::SEPOLIA);
    chain.set_head(BlockNumber::new(60));
    let first = chain.next_event();
    chain.emit::<VoteCast>(PLUGIN, &record(1, 1, VoteKind::Vote(VoteOption::Yes), 10, first));
    chain.emit::<VoteCast>(
        PLUGIN,
        &record(1, 2, VoteKind::Vote(VoteOption::No), 5, chain.next_event()),
    );
    // Another proposal's vote.
    chain.emit::<VoteCast>(
        PLUGIN,
        &record(2, 3, VoteKind::Vote(VoteOption::Yes), 1, chain.next_event()),
    );

    let mut votes = LogAggregator::<VoteCast>::new(PLUGIN, U256::ONE, BlockNumber::new(50));
    assert_eq!(votes.sync(&chain).await.unwrap(), 2);
    assert_eq!(votes.sync(&chain).await.unwrap(), 0);
    assert_eq!(votes.len(), 2);
    assert!(votes.has_voted(&Address::new([1; 20])));
    assert!(!votes.has_voted(&Address::new([3; 20])));
    assert_eq!(votes.records()[0].event, first);
}

#[tokio::test]
async fn latest_vote_per_voter_wins() {
    let chain = NullChain::new(ChainId::SEPOLIA);
    chain.set_head(BlockNumber::new(60));
    chain.emit::<VoteCast>(
        PLUGIN,
        &record(1, 1, VoteKind::Vote(VoteOption::Yes), 10, chain.next_event()),
    );
    chain.advance(1);
    chain.emit::<VoteCast>(
        PLUGIN,
        &record(1, 1, VoteKind::Vote(VoteOption::Abstain), 10, chain.next_event()),
    );

    let mut votes = LogAggregator::<VoteCast>::new(PLUGIN, U256::ONE, BlockNumber::GENESIS);
    votes.sync(&chain).await.unwrap();
    assert_eq!(votes.records().len(), 2);
    let latest = votes.latest_by_voter();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].kind, VoteKind::Vote(VoteOption::Abstain));
}

#[tokio::test]
async fn failed_sync_keeps_records() {
    let chain = NullChain::new(ChainId::SEPOLIA);
    chain.set_head(BlockNumber::new(60));
    chain.emit::<VetoCast>(PLUGIN, &record(1, 1, VoteKind::Veto, 10, chain.next_event()));

    let mut vetoes = LogAggregator::<VetoCast>::new(PLUGIN, U256::ONE, BlockNumber::GENESIS);
    assert_eq!(vetoes.sync(&chain).await.unwrap(), 1);

    chain.advance(1);
    chain.emit::<VetoCast>(PLUGIN, &record(1, 2, VoteKind::Veto, 20, chain.next_event()));
    chain.fail_log_queries(1);
    let err = vetoes.sync(&chain).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(vetoes.len(), 1);

    assert_eq!(vetoes.sync(&chain).await.unwrap(), 1);
    assert_eq!(vetoes.len(), 2);
}

#[tokio::test]
async fn incremental_sync_starts_at_last_seen_block() {
    let chain = NullChain::new(ChainId::SEPOLIA);
    chain.set_head(BlockNumber::new(60));
    chain.emit::<Approved>(PLUGIN, &record(1, 1, VoteKind::Approval, 0, chain.next_event()));

    let mut approvals = LogAggregator::<Approved>::new(PLUGIN, U256::ONE, BlockNumber::GENESIS);
    approvals.sync(&chain).await.unwrap();

    // Same block, emitted after the first sync.
    chain.emit::<Approved>(PLUGIN, &record(1, 2, VoteKind::Approval, 0, chain.next_event()));
    chain.advance(3);
    chain.emit::<Approved>(PLUGIN, &record(1, 3, VoteKind::Approval, 0, chain.next_event()));
    assert_eq!(approvals.sync(&chain).await.unwrap(), 2);
    assert_eq!(approvals.latest_by_voter().len(), 3);
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poller_publishes_new_heads_until_shutdown() {
    let chain = Arc::new(NullChain::new(ChainId::SEPOLIA));
    chain.set_head(BlockNumber::new(7));
    let shutdown = ShutdownController::new();
    let poller = BlockPoller::spawn(chain.clone(), Duration::from_millis(5), shutdown.subscribe());
    let mut heads = poller.subscribe();

    heads.changed().await.unwrap();
    assert_eq!(*heads.borrow_and_update(), BlockNumber::new(7));

    chain.advance(2);
    heads.changed().await.unwrap();
    assert_eq!(*heads.borrow_and_update(), BlockNumber::new(9));
    assert_eq!(poller.latest(), BlockNumber::new(9));

    shutdown.shutdown();
    tokio::time::timeout(Duration::from_secs(1), poller.join())
        .await
        .expect("poller should stop");
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_draft_never_reaches_writer() {
    let writer = NullWriter::new();
    let draft = ProposalDraft {
        title: "Fund the grants program".into(),
        ..Default::default()
    };
    let err = submit_draft(
        &writer,
        &draft,
        &cid(1),
        Timestamp::new(1),
        Timestamp::new(2),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SubmitError::InvalidDraft(_)));
    assert!(writer.submitted().is_empty());
}

#[tokio::test]
async fn valid_draft_is_submitted() {
    let writer = NullWriter::new();
    let draft = ProposalDraft {
        title: "Fund the grants program".into(),
        summary: "Moves 10 ETH to the grants multisig".into(),
        ..Default::default()
    };
    let tx = submit_draft(&writer, &draft, &cid(1), Timestamp::new(1), Timestamp::new(2))
        .await
        .unwrap();
    assert_ne!(tx, TxHash::ZERO);
    assert!(matches!(
        writer.submitted().as_slice(),
        [Submission::Proposal { metadata_uri, .. }] if *metadata_uri == cid(1)
    ));
}

#[tokio::test]
async fn votes_only_while_open() {
    let writer = NullWriter::new();
    let mut proposal = majority(1, 0, 0, 0);
    assert!(matches!(
        submit_vote(&writer, &proposal, VoteOption::Yes, false).await,
        Err(SubmitError::VotingClosed(_))
    ));

    proposal.active = true;
    submit_vote(&writer, &proposal, VoteOption::Yes, false).await.unwrap();
    assert_eq!(writer.submitted().len(), 1);
}
