// ABOUTME: Operator-toggled fault injection observed by token issuance and the request pipeline
// ABOUTME: One-shot expired-token flag plus sticky invalid-signature and forced-500 flags
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Flags {
    next_token_expired: bool,
    invalid_signature: bool,
    simulate_500: bool,
}

/// Fault-injection switches.
///
/// `next_token_expired` is one-shot: the next issuance consumes it and it
/// resets to false. The other two are sticky until toggled off. All
/// read-modify-writes happen under one mutex so a consume is atomic with
/// respect to concurrent toggles.
#[derive(Debug, Default)]
pub struct ChaosFlags {
    inner: Mutex<Flags>,
}

impl ChaosFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the one-shot expired-token flag, returning the new value
    pub fn toggle_next_token_expired(&self) -> bool {
        let mut flags = self.inner.lock();
        flags.next_token_expired = !flags.next_token_expired;
        flags.next_token_expired
    }

    /// Read and clear the one-shot expired-token flag in one critical section
    pub fn consume_next_token_expired(&self) -> bool {
        let mut flags = self.inner.lock();
        std::mem::take(&mut flags.next_token_expired)
    }

    /// Flip the sticky invalid-signature flag, returning the new value
    pub fn toggle_invalid_signature(&self) -> bool {
        let mut flags = self.inner.lock();
        flags.invalid_signature = !flags.invalid_signature;
        flags.invalid_signature
    }

    #[must_use]
    pub fn invalid_signature(&self) -> bool {
        self.inner.lock().invalid_signature
    }

    /// Flip the sticky forced-500 flag, returning the new value
    pub fn toggle_simulate_500(&self) -> bool {
        let mut flags = self.inner.lock();
        flags.simulate_500 = !flags.simulate_500;
        flags.simulate_500
    }

    #[must_use]
    pub fn simulate_500(&self) -> bool {
        self.inner.lock().simulate_500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_token_expired_is_one_shot() {
        let chaos = ChaosFlags::new();
        assert!(!chaos.consume_next_token_expired());

        assert!(chaos.toggle_next_token_expired());
        assert!(chaos.consume_next_token_expired());
        // consumed: the flag reset itself
        assert!(!chaos.consume_next_token_expired());
    }

    #[test]
    fn sticky_flags_stay_set_until_toggled() {
        let chaos = ChaosFlags::new();

        assert!(chaos.toggle_invalid_signature());
        assert!(chaos.invalid_signature());
        assert!(chaos.invalid_signature());
        assert!(!chaos.toggle_invalid_signature());
        assert!(!chaos.invalid_signature());

        assert!(chaos.toggle_simulate_500());
        assert!(chaos.simulate_500());
        assert!(!chaos.toggle_simulate_500());
    }
}
