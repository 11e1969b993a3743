use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::service::PermissionChecker;

/// Prompts for microphone permission where the platform supports it
#[async_trait::async_trait]
pub trait PermissionRequester: Send + Sync {
    /// Resolves to whether permission is granted after the request.
    async fn request_permission(&self) -> Result<bool>;
}

/// Permission state fixed by configuration, for hosts without a prompt
#[derive(Debug, Default)]
pub struct ConfiguredPermission {
    granted: AtomicBool,
}

impl ConfiguredPermission {
    pub fn new(granted: bool) -> Arc<Self> {
        Arc::new(Self {
            granted: AtomicBool::new(granted),
        })
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    /// Checker view sharing this state
    pub fn checker(self: &Arc<Self>) -> PermissionChecker {
        let permission = Arc::clone(self);
        Arc::new(move || permission.is_granted())
    }
}

#[async_trait::async_trait]
impl PermissionRequester for ConfiguredPermission {
    async fn request_permission(&self) -> Result<bool> {
        Ok(self.is_granted())
    }
}
