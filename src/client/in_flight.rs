use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::ApiError;

/// Guards a submission so a second one is refused while the first is outstanding.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

/// Marks the owning [`InFlight`] busy until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn try_begin(&self) -> Result<InFlightGuard, ApiError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ApiError::AlreadyInFlight)?;
        Ok(InFlightGuard {
            busy: self.busy.clone(),
        })
    }

    /// Runs `call` unless another call guarded by this flag is still pending.
    pub async fn run<F, T>(&self, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let _guard = self.try_begin()?;
        call.await
    }
}
