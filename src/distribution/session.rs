// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Explicit session context handed to every pipeline call.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::DistributionError;
use crate::blockchain::{DistributorBackend, NameService, Network};

/// Default number of blocks scanned when rebuilding history.
pub const DEFAULT_HISTORY_LOOKBACK: u64 = 1000;

/// Connected account, selected network and the collaborators behind them.
///
/// At most one submit attempt may run per session; [`Session::begin_attempt`]
/// fails fast instead of queueing. The guard is owned, so it can move into the
/// task that runs the attempt and outlive the request that started it.
pub struct Session {
    backend: Arc<dyn DistributorBackend>,
    names: Arc<dyn NameService>,
    history_lookback: u64,
    active: Arc<Mutex<()>>,
}

/// Held for the lifetime of one submit attempt.
pub type AttemptGuard = OwnedMutexGuard<()>;

impl Session {
    pub fn new(backend: Arc<dyn DistributorBackend>, names: Arc<dyn NameService>) -> Self {
        Self {
            backend,
            names,
            history_lookback: DEFAULT_HISTORY_LOOKBACK,
            active: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_history_lookback(mut self, blocks: u64) -> Self {
        self.history_lookback = blocks;
        self
    }

    pub fn account(&self) -> Address {
        self.backend.account()
    }

    pub fn network(&self) -> Network {
        self.backend.network()
    }

    pub fn distributor(&self) -> Address {
        self.backend.distributor()
    }

    pub fn history_lookback(&self) -> u64 {
        self.history_lookback
    }

    pub fn backend(&self) -> &dyn DistributorBackend {
        self.backend.as_ref()
    }

    pub fn names(&self) -> &dyn NameService {
        self.names.as_ref()
    }

    /// Claim the session for a submit attempt.
    pub fn begin_attempt(&self) -> Result<AttemptGuard, DistributionError> {
        Arc::clone(&self.active)
            .try_lock_owned()
            .map_err(|_| DistributionError::AttemptInProgress)
    }

    /// Whether a submit attempt is currently running.
    pub fn is_busy(&self) -> bool {
        self.active.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::{MockBackend, MockNames, ACCOUNT};

    fn session() -> Session {
        Session::new(
            Arc::new(MockBackend::new(Network::Base)),
            Arc::new(MockNames::default()),
        )
    }

    #[test]
    fn test_exposes_backend_identity() {
        let session = session().with_history_lookback(50);
        assert_eq!(session.account(), ACCOUNT);
        assert_eq!(session.network(), Network::Base);
        assert_eq!(session.history_lookback(), 50);
    }

    #[test]
    fn test_second_attempt_fails_fast() {
        let session = session();
        let guard = session.begin_attempt().unwrap();
        assert!(session.is_busy());
        assert!(matches!(
            session.begin_attempt(),
            Err(DistributionError::AttemptInProgress)
        ));
        drop(guard);
        assert!(!session.is_busy());
        assert!(session.begin_attempt().is_ok());
    }

    #[tokio::test]
    async fn test_guard_outlives_caller_when_moved_into_task() {
        let session = session();
        let guard = session.begin_attempt().unwrap();
        let (release, released) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _guard = guard;
            let _ = released.await;
        });

        assert!(session.is_busy());
        release.send(()).unwrap();
        task.await.unwrap();
        assert!(!session.is_busy());
    }
}
