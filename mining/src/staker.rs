//! The staking loop: a single long-running worker that gates on wallet and
//! sync state, drives the assembler in proof-of-stake mode and submits
//! winning blocks to the chain processor.

use crate::block_template::errors::BuilderError;
use crate::errors::MiningManagerError;
use crate::manager::MiningManager;
use crate::payments::NodePayments;
use crate::stake::NodeWallet;
use diadem_consensus_core::api::ChainStateLock;
use diadem_consensus_core::script::Script;
use diadem_core::task::tick::{TickReason, TickService};
use diadem_core::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const WALLET_LOCKED_INTERVAL: Duration = Duration::from_secs(60);
const GATE_INTERVAL: Duration = Duration::from_secs(10);
const NO_COINS_INTERVAL: Duration = Duration::from_secs(600);
const STAKE_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Host-side view of the initial sync state the staking gate consults.
pub trait SyncMonitor: Send + Sync {
    fn is_blockchain_synced(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct StakerConfig {
    /// Ignore the initial-sync gate and stake immediately.
    pub jumpstart: bool,
    /// Whether this node is configured as a masternode or a systemnode;
    /// only service nodes stake.
    pub is_service_node: bool,
    /// Startup grace period that lets the host finish wiring peers and
    /// indices before the first candidate is attempted.
    pub cold_start_delay: Duration,
}

impl Default for StakerConfig {
    fn default() -> Self {
        Self { jumpstart: false, is_service_node: false, cold_start_delay: Duration::from_secs(180) }
    }
}

pub struct Staker {
    manager: Arc<MiningManager>,
    chain: Arc<ChainStateLock>,
    wallet: Arc<dyn NodeWallet>,
    payments: Arc<dyn NodePayments>,
    sync: Arc<dyn SyncMonitor>,
    config: StakerConfig,
    tick_service: Arc<TickService>,
}

/// Owned handle to a started staking worker. Dropping the handle leaves the
/// worker running; [`StakerHandle::stop`] shuts it down and joins it.
pub struct StakerHandle {
    tick_service: Arc<TickService>,
    join_handle: JoinHandle<()>,
}

impl StakerHandle {
    /// Requests shutdown without waiting. The worker exits at its next sleep
    /// boundary.
    pub fn shutdown(&self) {
        self.tick_service.shutdown()
    }

    /// Requests shutdown and waits for the worker to exit.
    pub async fn stop(self) {
        self.tick_service.shutdown();
        let _ = self.join_handle.await;
    }

    /// Whether the worker has exited, on request or on its own.
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

impl Staker {
    pub fn new(
        manager: Arc<MiningManager>,
        chain: Arc<ChainStateLock>,
        wallet: Arc<dyn NodeWallet>,
        payments: Arc<dyn NodePayments>,
        sync: Arc<dyn SyncMonitor>,
        config: StakerConfig,
    ) -> Self {
        Self { manager, chain, wallet, payments, sync, config, tick_service: Arc::new(TickService::new()) }
    }

    /// Spawns the worker on the current runtime and returns its handle.
    pub fn start(self: Arc<Self>) -> StakerHandle {
        let tick_service = self.tick_service.clone();
        let join_handle = tokio::spawn(async move { self.worker().await });
        StakerHandle { tick_service, join_handle }
    }

    async fn worker(self: Arc<Self>) {
        info!("stake worker started");
        if self.tick_service.tick(self.config.cold_start_delay).await == TickReason::Shutdown {
            return;
        }

        loop {
            while self.wallet.is_locked() {
                info!("not staking, wallet is locked");
                if self.tick_service.tick(WALLET_LOCKED_INTERVAL).await == TickReason::Shutdown {
                    return;
                }
            }

            let (next_height, tip_time, now) = {
                let chain = self.chain.read();
                let tip = chain.tip();
                (tip.height + 1, tip.time as u64, chain.adjusted_time())
            };

            // Stake only as a service node, past the proof-of-stake start
            // height, and never on top of a tip from the future.
            if next_height < self.manager.params().pos_start_height || !self.config.is_service_node || tip_time > now {
                if self.tick_service.tick(GATE_INTERVAL).await == TickReason::Shutdown {
                    return;
                }
                continue;
            }

            if !self.sync.is_blockchain_synced() && !self.config.jumpstart {
                if self.tick_service.tick(GATE_INTERVAL).await == TickReason::Shutdown {
                    return;
                }
                continue;
            }

            if !self.wallet.has_stakeable_coins() {
                info!("stake worker: no stakeable coins");
                if self.tick_service.tick(NO_COINS_INTERVAL).await == TickReason::Shutdown {
                    return;
                }
                continue;
            }

            // Assembly is synchronous and can sleep while holding the chain
            // and mempool locks; it runs on the blocking pool.
            let manager = self.manager.clone();
            let chain = self.chain.clone();
            let wallet = self.wallet.clone();
            let payments = self.payments.clone();
            let built = tokio::task::spawn_blocking(move || {
                manager.create_new_block(&chain, wallet.as_ref(), payments.as_ref(), &Script::new(), true)
            })
            .await
            .unwrap();

            match built {
                Ok(template) => {
                    let height = template.height;
                    let submitted = self.chain.write().process_new_block(template.block);
                    match submitted {
                        Ok(()) => info!("stake worker: submitted block at height {}", height),
                        Err(err) => {
                            // A rejected stake is a bug, not a transient condition
                            error!("stake worker: block not accepted: {}", err);
                            return;
                        }
                    }
                }
                Err(MiningManagerError::BlockTemplateBuilder(
                    err @ (BuilderError::StakeNotFound | BuilderError::SignatureFailure),
                )) => {
                    debug!("stake worker: {}", err);
                    if self.tick_service.tick(STAKE_RETRY_INTERVAL).await == TickReason::Shutdown {
                        return;
                    }
                }
                Err(err) => {
                    error!("stake worker: {}", err);
                    return;
                }
            }
        }
    }
}
