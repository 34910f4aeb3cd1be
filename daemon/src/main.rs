//! Agora command line: inspect governance proposals from a JSON-RPC node.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use futures_util::future::join_all;
use serde::Serialize;

use agora_chain::{Approved, HttpProvider, PluginKind, TallyEvent, VetoCast, VoteCast};
use agora_governance::{
    display_summary, display_title, format_units, participation_percentage, ratio_to_percent,
    support_percentage, veto_percentage, vote_percentages, CardState, Proposal, ProposalIdParts, ProposalParameters,
    ProposalStatus, Ratio, Tally,
};
use agora_metadata::{IpfsGateway, ProposalDraft};
use agora_node::{
    init_logging, AgoraConfig, BlockPoller, LoadOutcome, LogAggregator, PluginTarget,
    ProposalLoader, QueryCache, ShutdownController, TokenInfo,
};
use agora_types::{Address, ChainId, Timestamp, U256};

type Loader = ProposalLoader<Arc<HttpProvider>, Arc<HttpProvider>, IpfsGateway>;

#[derive(Parser)]
#[command(name = "agora", about = "Governance proposal inspector")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    /// Ethereum JSON-RPC endpoint.
    #[arg(long, env = "AGORA_RPC_URL")]
    rpc_url: Option<String>,

    /// IPFS gateway for proposal metadata.
    #[arg(long, env = "AGORA_IPFS_GATEWAY")]
    ipfs_gateway: Option<String>,

    /// Expected chain id; the RPC endpoint must serve this chain.
    #[arg(long, env = "AGORA_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Governance plugin address.
    #[arg(long = "plugin", env = "AGORA_PLUGIN")]
    plugin_address: Option<Address>,

    /// Plugin voting variant: "token_voting" or "optimistic".
    #[arg(long = "kind", env = "AGORA_PLUGIN_KIND")]
    plugin_kind: Option<PluginKind>,

    /// Voting token address (read from the plugin when omitted).
    #[arg(long = "token", env = "AGORA_TOKEN")]
    token_address: Option<Address>,

    /// Decimals used to render token amounts when the voting token
    /// cannot be read.
    #[arg(long, env = "AGORA_TOKEN_DECIMALS")]
    token_decimals: Option<u8>,

    /// Override the minimum veto ratio, in parts per million.
    #[arg(long, env = "AGORA_MIN_VETO_RATIO")]
    min_veto_ratio: Option<u32>,

    /// Head polling interval in milliseconds (for `proposal watch`).
    #[arg(long, env = "AGORA_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGORA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGORA_LOG_FORMAT")]
    log_format: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Read proposals from the configured plugin.
    #[command(name = "proposal")]
    Proposal {
        #[command(subcommand)]
        action: ProposalAction,
    },
    /// Work with proposal drafts.
    #[command(name = "draft")]
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(clap::Subcommand)]
enum ProposalAction {
    /// Show one proposal with its status and tally.
    Show {
        #[arg(value_parser = parse_proposal_id)]
        id: U256,
        /// Also show this account's voting power at the snapshot.
        #[arg(long)]
        voter: Option<Address>,
    },
    /// List the latest vote, veto or approval of every participant.
    Votes {
        #[arg(value_parser = parse_proposal_id)]
        id: U256,
        /// Read emergency multisig approvals instead of votes.
        #[arg(long)]
        approvals: bool,
    },
    /// List the newest proposals with their status.
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Follow a proposal block by block until interrupted.
    Watch {
        #[arg(value_parser = parse_proposal_id)]
        id: U256,
    },
}

#[derive(clap::Subcommand)]
enum DraftAction {
    /// Validate a draft JSON file and print the document to pin.
    Check { file: PathBuf },
}

/// Accept decimal or `0x` hex ids; optimistic ids are packed and large.
fn parse_proposal_id(s: &str) -> Result<U256, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(s, 10),
    };
    parsed.map_err(|e| format!("invalid proposal id {s}: {e}"))
}

impl Cli {
    /// Configuration file (or defaults) with flags and env vars on top.
    fn config(&self) -> anyhow::Result<AgoraConfig> {
        let mut config = match &self.config {
            Some(path) => AgoraConfig::from_toml_file(path)?,
            None => AgoraConfig::default(),
        };
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(gateway) = &self.ipfs_gateway {
            config.ipfs_gateway = gateway.clone();
        }
        if let Some(id) = self.chain_id {
            config.chain_id = Some(ChainId::new(id));
        }
        if let Some(plugin) = self.plugin_address {
            config.plugin_address = plugin;
        }
        if let Some(kind) = self.plugin_kind {
            config.plugin_kind = kind;
        }
        if let Some(token) = self.token_address {
            config.token_address = Some(token);
        }
        if let Some(decimals) = self.token_decimals {
            config.token_decimals = decimals;
        }
        if let Some(ratio) = self.min_veto_ratio {
            config.min_veto_ratio = Some(Ratio::new(ratio)?);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Draft {
            action: DraftAction::Check { file },
        } => {
            agora_utils::init_tracing();
            check_draft(file)
        }
        Command::Proposal { action } => {
            let config = cli.config()?;
            init_logging(config.log_format()?, &config.log_level)?;
            let provider = Arc::new(HttpProvider::new(
                config.rpc_url.clone(),
                config.request_timeout(),
            )?);
            let loader = connect(&config, provider.clone()).await?;
            let token = match loader.token_info().await {
                Ok(token) => Some(token),
                Err(e) => {
                    // Multisig plugins have no voting token.
                    tracing::debug!(error = %e, "voting token not readable");
                    None
                }
            };
            let out = Output {
                json: cli.json,
                decimals: token.as_ref().map_or(config.token_decimals, |t| t.decimals),
                token,
            };

            match action {
                ProposalAction::Show { id, voter } => show(&loader, &out, *id, *voter).await,
                ProposalAction::Votes { id, approvals } => {
                    if *approvals {
                        votes::<Approved>(&loader, &provider, &out, *id).await
                    } else if config.plugin_kind == PluginKind::Optimistic {
                        votes::<VetoCast>(&loader, &provider, &out, *id).await
                    } else {
                        votes::<VoteCast>(&loader, &provider, &out, *id).await
                    }
                }
                ProposalAction::List { limit } => list(&loader, &out, *limit).await,
                ProposalAction::Watch { id } => watch(&loader, provider, &config, &out, *id).await,
            }
        }
    }
}

/// Build the loader, checking the endpoint against the configured chain.
async fn connect(config: &AgoraConfig, provider: Arc<HttpProvider>) -> anyhow::Result<Loader> {
    use agora_chain::BlockSource;

    let served = provider
        .chain_id()
        .await
        .with_context(|| format!("cannot reach {}", provider.url()))?;
    let chain_id = config.chain_id.unwrap_or(served);
    tracing::info!(rpc = %provider.url(), chain = %served, plugin = %config.plugin_address, "connected");

    let target = PluginTarget {
        chain_id,
        address: config.plugin_address,
        kind: config.plugin_kind,
    };
    let gateway = IpfsGateway::with_timeout(config.ipfs_gateway.clone(), config.request_timeout());
    let mut loader = ProposalLoader::new(
        provider.clone(),
        provider,
        gateway,
        target,
        QueryCache::new(config.cache_ttl()),
    );
    if let Some(token) = config.token_address {
        loader = loader.with_token(token);
    }
    if let Some(ratio) = config.min_veto_ratio {
        loader = loader.with_min_veto_ratio(ratio);
    }
    loader.check_chain().await?;
    Ok(loader)
}

// ── Output ─────────────────────────────────────────────────────────────

struct Output {
    json: bool,
    decimals: u8,
    token: Option<TokenInfo>,
}

impl Output {
    fn amount(&self, value: U256) -> String {
        let amount = format_units(value, self.decimals);
        match &self.token {
            Some(token) if !token.symbol.is_empty() => format!("{amount} {}", token.symbol),
            _ => amount,
        }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ProposalReport {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<u64>,
    title: String,
    summary: String,
    status: &'static str,
    variant: &'static str,
    card: String,
    window: String,
    creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<TokenLine>,
    tally: Vec<TallyLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voter: Option<VoterLine>,
    actions: usize,
}

#[derive(Serialize)]
struct TokenLine {
    address: String,
    symbol: String,
    total_supply: String,
}

#[derive(Serialize)]
struct VoterLine {
    address: String,
    /// `None` until the snapshot block is in the past.
    voting_power: Option<String>,
}

#[derive(Serialize)]
struct TallyLine {
    label: &'static str,
    amount: String,
    percent: String,
}

async fn report(loader: &Loader, out: &Output, proposal: &Proposal) -> anyhow::Result<ProposalReport> {
    let status = loader.status(proposal).await?;
    let tally = match (&proposal.tally, &proposal.parameters) {
        (Tally::Majority { yes, no, abstain }, ProposalParameters::Majority(params)) => {
            let shares = vote_percentages(*yes, *no, *abstain);
            vec![
                TallyLine {
                    label: "yes",
                    amount: out.amount(*yes),
                    percent: shares.yes.to_string(),
                },
                TallyLine {
                    label: "no",
                    amount: out.amount(*no),
                    percent: shares.no.to_string(),
                },
                TallyLine {
                    label: "abstain",
                    amount: out.amount(*abstain),
                    percent: shares.abstain.to_string(),
                },
                TallyLine {
                    label: "support",
                    amount: format!("needs > {}", ratio_to_percent(params.support_threshold)),
                    percent: support_percentage(*yes, *no).to_string(),
                },
                TallyLine {
                    label: "participation",
                    amount: format!(
                        "{} of min {}",
                        out.amount(proposal.tally.total()),
                        out.amount(params.min_voting_power)
                    ),
                    percent: participation_percentage(
                        proposal.tally.total(),
                        params.min_voting_power,
                    )
                    .to_string(),
                },
            ]
        }
        (Tally::Veto { weight: veto }, _) => {
            let supply = loader.snapshot_supply(proposal).await?;
            let ratio = loader.min_veto_ratio(proposal);
            vec![TallyLine {
                label: "veto",
                amount: out.amount(*veto),
                percent: format!(
                    "{} of threshold ({} of supply)",
                    veto_percentage(*veto, supply, ratio),
                    ratio.map(ratio_to_percent).unwrap_or_else(|| "?".into())
                ),
            }]
        }
        _ => Vec::new(),
    };

    let index = ProposalIdParts::is_packed(proposal.id)
        .then(|| ProposalIdParts::decode(proposal.id).ok().map(|p| p.index))
        .flatten();
    let window = agora_utils::voting_window(
        proposal.parameters.start_date(),
        proposal.parameters.end_date(),
        Timestamp::now(),
    );

    Ok(ProposalReport {
        id: proposal.id.to_string(),
        index,
        title: display_title(proposal).to_string(),
        summary: display_summary(proposal).to_string(),
        status: status.label(),
        variant: status.variant().as_str(),
        card: format!("{:?}", CardState::of(Some(proposal))),
        window,
        creator: proposal.creator.map(|c| c.to_string()),
        token: out.token.as_ref().map(|t| TokenLine {
            address: t.address.to_string(),
            symbol: t.symbol.clone(),
            total_supply: out.amount(t.total_supply),
        }),
        tally,
        voter: None,
        actions: proposal.actions.len(),
    })
}

/// Packed ids are unreadable; show the creation index instead.
fn short_id(report: &ProposalReport) -> String {
    report
        .index
        .map(|i| i.to_string())
        .unwrap_or_else(|| report.id.clone())
}

fn render(report: &ProposalReport) -> String {
    let mut text = format!(
        "#{}  {}\n[{}]  {}\n{}\n",
        short_id(report),
        report.title,
        report.status,
        report.window,
        report.summary,
    );
    if let Some(token) = &report.token {
        text.push_str(&format!(
            "  token {} ({}), supply {}\n",
            token.symbol, token.address, token.total_supply
        ));
    }
    for line in &report.tally {
        text.push_str(&format!("  {:<14} {:>28}  {}\n", line.label, line.amount, line.percent));
    }
    if let Some(voter) = &report.voter {
        let power = voter
            .voting_power
            .as_deref()
            .unwrap_or("not known until the snapshot block");
        text.push_str(&format!("  {} voting power: {}\n", voter.address, power));
    }
    text.push_str(&format!("  {} action(s)", report.actions));
    text
}

// ── Commands ───────────────────────────────────────────────────────────

async fn show(loader: &Loader, out: &Output, id: U256, voter: Option<Address>) -> anyhow::Result<()> {
    match loader.load(id).await? {
        LoadOutcome::Found(proposal) => {
            let mut report = report(loader, out, &proposal).await?;
            if let Some(voter) = voter {
                let power = loader.voting_power(voter, &proposal).await?;
                report.voter = Some(VoterLine {
                    address: voter.to_string(),
                    voting_power: power.map(|p| out.amount(p)),
                });
            }
            out.emit(&report, || render(&report))
        }
        LoadOutcome::Pending => {
            println!("proposal {id} was just created and is not readable yet; try again shortly");
            Ok(())
        }
        LoadOutcome::NotFound => bail!("proposal {id} not found"),
    }
}

#[derive(Serialize)]
struct VoteLine {
    voter: String,
    kind: String,
    voting_power: String,
    block: u64,
    tx: String,
}

async fn votes<E: TallyEvent>(
    loader: &Loader,
    provider: &Arc<HttpProvider>,
    out: &Output,
    id: U256,
) -> anyhow::Result<()> {
    let Some(proposal) = loader.load(id).await?.into_proposal() else {
        bail!("proposal {id} not found");
    };
    let mut aggregator = LogAggregator::<E>::new(
        loader.target().address,
        id,
        proposal.parameters.snapshot_block(),
    );
    aggregator.sync(provider).await?;

    let lines: Vec<VoteLine> = aggregator
        .latest_by_voter()
        .into_iter()
        .map(|r| VoteLine {
            voter: r.voter.to_string(),
            kind: r.kind.to_string(),
            voting_power: out.amount(r.voting_power),
            block: r.event.block_number.as_u64(),
            tx: r.event.tx_hash.to_string(),
        })
        .collect();
    out.emit(&lines, || {
        let mut text = format!("{} participant(s)", lines.len());
        for line in &lines {
            text.push_str(&format!("\n{}  {:<8} {:>28}", line.voter, line.kind, line.voting_power));
        }
        text
    })
}

async fn list(loader: &Loader, out: &Output, limit: usize) -> anyhow::Result<()> {
    let ids = loader.proposal_ids(limit).await?;
    let loads = ids.iter().map(|id| async move {
        let outcome = loader.load(*id).await?;
        let report = match outcome.proposal() {
            Some(proposal) => Some(report(loader, out, proposal).await?),
            None => None,
        };
        anyhow::Ok((*id, report))
    });

    let mut reports = Vec::new();
    for result in join_all(loads).await {
        match result {
            Ok((_, Some(report))) => reports.push(report),
            Ok((id, None)) => tracing::debug!(%id, "listed proposal not readable yet"),
            Err(e) => tracing::warn!(error = %e, "failed to load proposal"),
        }
    }

    out.emit(&reports, || {
        reports
            .iter()
            .map(|r| format!("{:<10} {:<12} {}", short_id(r), r.status, r.title))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

async fn watch(
    loader: &Loader,
    provider: Arc<HttpProvider>,
    config: &AgoraConfig,
    out: &Output,
    id: U256,
) -> anyhow::Result<()> {
    let shutdown = Arc::new(ShutdownController::new());
    let signals = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };
    let poller = BlockPoller::spawn(provider, config.poll_interval(), shutdown.subscribe());
    let mut heads = poller.subscribe();
    let mut stop = shutdown.subscribe();
    let mut last: Option<(ProposalStatus, Tally)> = None;

    loop {
        tokio::select! {
            _ = stop.recv() => break,
            changed = heads.changed() => {
                if changed.is_err() {
                    break;
                }
                let head = *heads.borrow_and_update();
                let proposal = match loader.refresh_on_block(id, head).await {
                    Ok(LoadOutcome::Found(proposal)) => proposal,
                    Ok(LoadOutcome::Pending) => continue,
                    Ok(LoadOutcome::NotFound) => {
                        shutdown.shutdown();
                        bail!("proposal {id} not found");
                    }
                    Err(e) if e.is_transient() => {
                        tracing::warn!(error = %e, head = head.as_u64(), "refresh failed, waiting for the next block");
                        continue;
                    }
                    Err(e) => {
                        shutdown.shutdown();
                        return Err(e.into());
                    }
                };
                let status = match loader.status(&proposal).await {
                    Ok(status) => status,
                    Err(e) => {
                        tracing::warn!(error = %e, "status unavailable at this block");
                        continue;
                    }
                };
                let current = (status, proposal.tally.clone());
                if last.as_ref() != Some(&current) {
                    let report = report(loader, out, &proposal).await?;
                    out.emit(&report, || format!("block {}\n{}", head.as_u64(), render(&report)))?;
                    if status.is_final() {
                        tracing::info!(status = status.label(), "proposal reached a final status");
                    }
                    last = Some(current);
                }
            }
        }
    }

    poller.join().await;
    signals.abort();
    Ok(())
}

fn check_draft(file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let draft: ProposalDraft =
        serde_json::from_str(&content).with_context(|| format!("{} is not a draft", file.display()))?;
    let pin = draft.to_pin_json()?;
    println!("{pin}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_ids_parse_in_both_bases() {
        assert_eq!(parse_proposal_id("42").unwrap(), U256::from(42u64));
        assert_eq!(parse_proposal_id("0x2a").unwrap(), U256::from(42u64));
        assert!(parse_proposal_id("forty-two").is_err());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agora.toml");
        std::fs::write(
            &path,
            "plugin_address = \"0x1111111111111111111111111111111111111111\"\ntoken_decimals = 6\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "agora",
            "--config",
            path.to_str().unwrap(),
            "--kind",
            "optimistic",
            "--min-veto-ratio",
            "200000",
            "proposal",
            "list",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(config.plugin_kind, PluginKind::Optimistic);
        assert_eq!(config.token_decimals, 6);
        assert_eq!(config.min_veto_ratio, Some(Ratio::new(200_000).unwrap()));
    }

    #[test]
    fn amounts_carry_the_token_symbol() {
        let mut out = Output {
            json: false,
            decimals: 2,
            token: None,
        };
        assert_eq!(out.amount(U256::new(1_250)), "12.5");
        out.token = Some(TokenInfo {
            address: Address::ZERO,
            symbol: "AGR".into(),
            decimals: 2,
            total_supply: U256::ZERO,
        });
        assert_eq!(out.amount(U256::new(1_250)), "12.5 AGR");
    }

    #[test]
    fn show_accepts_a_voter() {
        let cli = Cli::parse_from([
            "agora",
            "proposal",
            "show",
            "7",
            "--voter",
            "0x2222222222222222222222222222222222222222",
        ]);
        let Command::Proposal {
            action: ProposalAction::Show { id, voter },
        } = cli.command
        else {
            panic!("expected proposal show");
        };
        assert_eq!(id, U256::new(7));
        assert_eq!(voter, Some(Address::new([0x22; 20])));
    }

    #[test]
    fn missing_plugin_is_rejected() {
        let cli = Cli::parse_from(["agora", "proposal", "list"]);
        if std::env::var_os("AGORA_PLUGIN").is_none() {
            assert!(cli.config().is_err());
        }
    }
}
