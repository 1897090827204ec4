// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A shared flag that lets a scope tell its children (and itself, on the
//! next loop iteration) to stop — set once on an unrecoverable error so
//! in-flight coroutine branches wind down instead of outliving their parent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
