//! Async Bridge for Mobile Platforms
//!
//! The profile lookup is the only async operation in the library. Mobile
//! hosts call it synchronously and receive the result through a
//! `UserInfoCallback`, so the future runs on a runtime owned by the client.
//!
//! # Example (Callback Style)
//!
//! ```ignore
//! // From Swift
//! client.fetchUserInfo(openId: openId, accessToken: token, callback: ProfileHandler())
//! // ProfileHandler.onComplete(status:nickname:headImgUrl:) runs on a runtime thread
//! ```

use crate::{HandoffMobileError, Result};

/// Async runtime wrapper for mobile.
pub struct AsyncRuntime {
    runtime: tokio::runtime::Runtime,
}

impl AsyncRuntime {
    /// Create with a fixed number of worker threads.
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(num_threads.max(1))
            .enable_all()
            .build()
            .map(|runtime| Self { runtime })
            .map_err(|e| HandoffMobileError::Internal {
                msg: format!("Failed to create runtime: {}", e),
            })
    }

    /// Spawn an async task (fire and forget).
    pub fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(future);
    }
}

impl std::fmt::Debug for AsyncRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncRuntime").finish_non_exhaustive()
    }
}
