//! Simulated taste test: one host, N tasters voting concurrently each round.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail, ensure};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tastr_core::RoundCoordinator;
use tastr_core::domain::{
    CategoryId, EloRating, Item, ItemId, SessionEvent, SessionId, UserId, VoteOutcome,
};
use tastr_core::impls::BroadcastHub;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct Plan {
    pub category: CategoryId,
    pub items: Vec<String>,
    pub tasters: usize,
    pub rounds: u32,
    pub seed: Option<u64>,
}

impl Plan {
    /// Item ids are 1-based positions, zero padded so they sort in order.
    fn names(&self) -> BTreeMap<ItemId, String> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, name)| (item_id(i), name.clone()))
            .collect()
    }

    /// Hidden quality the simulated tasters judge by: later items are better.
    fn quality(&self) -> BTreeMap<ItemId, f64> {
        (0..self.items.len())
            .map(|i| (item_id(i), i as f64 * 100.0))
            .collect()
    }
}

fn item_id(index: usize) -> ItemId {
    ItemId::new(format!("{:02}", index + 1))
}

pub async fn run(
    coordinator: Arc<RoundCoordinator>,
    hub: Arc<BroadcastHub>,
    plan: &Plan,
) -> Result<Vec<Item>> {
    ensure!(plan.tasters > 0, "need at least one taster");

    coordinator
        .create_category(plan.category.clone(), plan.names())
        .await?;

    let host = UserId::new("host");
    let session = coordinator
        .find_or_create_session(&plan.category, &host)
        .await?;
    let session_id = session.session_id;
    let printer = print_events(hub.subscribe(session_id));

    let tasters: Vec<UserId> = (1..=plan.tasters)
        .map(|i| UserId::new(format!("taster-{i}")))
        .collect();
    for taster in &tasters {
        coordinator.join_session(session_id, taster).await?;
    }
    coordinator.start_session(session_id, &host).await?;

    let quality = Arc::new(plan.quality());
    for round in 1..=plan.rounds {
        let handles: Vec<JoinHandle<Result<VoteOutcome>>> = tasters
            .iter()
            .enumerate()
            .map(|(i, taster)| {
                let rng = match plan.seed {
                    Some(seed) => StdRng::seed_from_u64(seed ^ (u64::from(round) << 32) ^ i as u64),
                    None => StdRng::from_entropy(),
                };
                tokio::spawn(taste(
                    coordinator.clone(),
                    session_id,
                    taster.clone(),
                    round,
                    quality.clone(),
                    rng,
                ))
            })
            .collect();

        let mut advanced = false;
        for handle in handles {
            if let VoteOutcome::RoundAdvanced { .. } = handle.await.context("taster task")?? {
                advanced = true;
            }
        }
        if !advanced {
            bail!("round {round} did not advance after every taster voted");
        }
    }

    coordinator.close_session(session_id, &host).await?;
    hub.remove(session_id);
    let delivered = printer.await.context("event printer")?;
    info!(session = %session_id, events = delivered, "simulation finished");

    Ok(coordinator.leaderboard(&plan.category).await?)
}

/// One taster's turn: fetch the pinned matchup, pick by hidden quality with ELO noise.
async fn taste(
    coordinator: Arc<RoundCoordinator>,
    session_id: SessionId,
    taster: UserId,
    round: u32,
    quality: Arc<BTreeMap<ItemId, f64>>,
    mut rng: StdRng,
) -> Result<VoteOutcome> {
    let selection = coordinator.request_matchup(session_id, &taster).await?;
    let (a, b) = (selection.matchup.item_a, selection.matchup.item_b);

    let diff = quality.get(&a).copied().unwrap_or_default()
        - quality.get(&b).copied().unwrap_or_default();
    let a_wins = rng.gen_bool(EloRating::default_v1().expected_win_prob(diff));
    let (winner, loser) = if a_wins { (a, b) } else { (b, a) };

    Ok(coordinator
        .submit_vote(session_id, &taster, round, &winner, &loser)
        .await?)
}

fn print_events(mut rx: tokio::sync::broadcast::Receiver<SessionEvent>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    delivered += 1;
                    println!("[{}] round {}", event.name(), event.round);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        delivered
    })
}
