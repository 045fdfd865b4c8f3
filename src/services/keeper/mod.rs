// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod fleet;
pub mod node;
pub mod orchestrator;
pub mod proxy_pool;
pub mod report;
pub mod signer;

pub use fleet::{FleetScheduler, FleetTimings, prepare_accounts};
pub use node::{NodeLifecycleManager, NodeState};
pub use orchestrator::{AccountOrchestrator, Schedule};
pub use proxy_pool::ProxyPool;
