//! OTP issuance, verification, and expiry sweeping.

use chrono::TimeDelta;
use keystone_common::constants::{
    DEFAULT_CODE_EXPIRY_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RESEND_COOLDOWN_SECS,
    DEFAULT_SWEEP_GRACE_SECS,
};
use keystone_common::{Channel, CooldownError, IssuedCode, VerificationKey, VerifyError, VerifyOutcome};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Clock, CodeSource, RandomCodes, SystemClock, VerificationRecord};

/// Timing and attempt limits applied to every key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    /// Validity window of an issued code
    pub expiry: TimeDelta,
    /// Minimum gap between two issuances for one key
    pub cooldown: TimeDelta,
    /// Match attempts allowed per code
    pub max_attempts: u32,
    /// How long past expiry a record survives the sweeper
    pub sweep_grace: TimeDelta,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            expiry: TimeDelta::seconds(DEFAULT_CODE_EXPIRY_SECS as i64),
            cooldown: TimeDelta::seconds(DEFAULT_RESEND_COOLDOWN_SECS as i64),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            sweep_grace: TimeDelta::seconds(DEFAULT_SWEEP_GRACE_SECS as i64),
        }
    }
}

/// Runtime counters
#[derive(Default)]
struct OtpStats {
    issued: AtomicU64,
    cooldown_rejections: AtomicU64,
    verified: AtomicU64,
    failed_verifications: AtomicU64,
    swept: AtomicU64,
}

/// Snapshot of OTP counters for the metrics endpoint
#[derive(Clone, Debug, Serialize)]
pub struct OtpStatsSnapshot {
    pub active_records: usize,
    pub issued: u64,
    pub cooldown_rejections: u64,
    pub verified: u64,
    pub failed_verifications: u64,
    pub swept: u64,
}

/// Owns every outstanding verification record.
///
/// A single mutex guards the map, so each operation's read-modify-write is
/// atomic with respect to every other operation, including the sweeper.
pub struct OtpManager {
    policy: OtpPolicy,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeSource>,
    records: Mutex<HashMap<VerificationKey, VerificationRecord>>,
    stats: OtpStats,
}

impl OtpManager {
    pub fn new(policy: OtpPolicy, clock: Arc<dyn Clock>, codes: Arc<dyn CodeSource>) -> Self {
        Self {
            policy,
            clock,
            codes,
            records: Mutex::new(HashMap::new()),
            stats: OtpStats::default(),
        }
    }

    /// Manager backed by wall-clock time and the system CSPRNG
    pub fn with_system_clock(policy: OtpPolicy) -> Self {
        Self::new(policy, Arc::new(SystemClock), Arc::new(RandomCodes))
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    /// Issue a fresh code for `(channel, identifier)`.
    ///
    /// The identifier must already be validated by the caller. Any previous
    /// code for the key is discarded. Delivery is the caller's job.
    pub fn issue(&self, channel: Channel, identifier: &str) -> Result<IssuedCode, CooldownError> {
        let key = VerificationKey::new(channel, identifier);
        let now = self.clock.now();
        let mut records = self.lock();

        if let Some(existing) = records.get(&key) {
            if now < existing.cooldown_until {
                let remaining_secs = ceil_secs(existing.cooldown_until - now);
                self.stats.cooldown_rejections.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, remaining_secs, "Code requested during cooldown");
                return Err(CooldownError { remaining_secs });
            }
        }

        let record = VerificationRecord::new(self.codes.generate(), now, &self.policy);
        let issued = IssuedCode {
            code: record.code.clone(),
            expires_at: record.expires_at,
            cooldown_until: record.cooldown_until,
        };

        let replaced = records.insert(key.clone(), record).is_some();
        self.stats.issued.fetch_add(1, Ordering::Relaxed);

        tracing::info!(key = %key, replaced, "Verification code issued");

        Ok(issued)
    }

    /// Check a submitted code against the stored one.
    ///
    /// The attempt counter is bumped before comparing, so a correct guess on
    /// the final allowed attempt still verifies; only the call after that
    /// fails with `AttemptsExhausted`.
    pub fn verify(
        &self,
        channel: Channel,
        identifier: &str,
        submitted: &str,
    ) -> Result<VerifyOutcome, VerifyError> {
        let key = VerificationKey::new(channel, identifier);
        let now = self.clock.now();
        let mut records = self.lock();

        let Some(record) = records.get_mut(&key) else {
            self.stats.failed_verifications.fetch_add(1, Ordering::Relaxed);
            return Err(VerifyError::NotFound);
        };

        if record.verified {
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        if now > record.expires_at {
            records.remove(&key);
            self.stats.failed_verifications.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "Verification code expired");
            return Err(VerifyError::Expired);
        }

        if record.attempts >= self.policy.max_attempts {
            records.remove(&key);
            self.stats.failed_verifications.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(key = %key, "Verification attempts exhausted");
            return Err(VerifyError::AttemptsExhausted);
        }

        record.attempts += 1;

        if submitted.trim() != record.code {
            let remaining_attempts = self.policy.max_attempts - record.attempts;
            self.stats.failed_verifications.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, remaining_attempts, "Verification code mismatch");
            return Err(VerifyError::Mismatch { remaining_attempts });
        }

        record.verified = true;
        self.stats.verified.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            key = %key,
            attempts = record.attempts,
            age_secs = (now - record.issued_at).num_seconds(),
            "Verification succeeded"
        );

        Ok(VerifyOutcome::Verified)
    }

    /// True iff a record exists, has been verified and is not claimed.
    /// No expiry check.
    pub fn is_verified(&self, channel: Channel, identifier: &str) -> bool {
        let key = VerificationKey::new(channel, identifier);
        self.lock()
            .get(&key)
            .is_some_and(|record| record.verified && !record.claimed)
    }

    /// Drop the record for a key, verified or not
    pub fn clear(&self, channel: Channel, identifier: &str) {
        let key = VerificationKey::new(channel, identifier);
        if self.lock().remove(&key).is_some() {
            tracing::debug!(key = %key, "Verification record cleared");
        }
    }

    /// Claim a verified record for a single use.
    ///
    /// Check and claim share one critical section, so of several concurrent
    /// callers at most one gets `true`. A claimed record no longer counts as
    /// verified; finish with [`clear`](Self::clear) or hand it back with
    /// [`release_claim`](Self::release_claim).
    pub fn claim_verified(&self, channel: Channel, identifier: &str) -> bool {
        let key = VerificationKey::new(channel, identifier);
        let mut records = self.lock();

        match records.get_mut(&key) {
            Some(record) if record.verified && !record.claimed => {
                record.claimed = true;
                tracing::debug!(key = %key, "Verified record claimed");
                true
            }
            _ => false,
        }
    }

    /// Undo a claim so the verification can be used again
    pub fn release_claim(&self, channel: Channel, identifier: &str) {
        let key = VerificationKey::new(channel, identifier);
        if let Some(record) = self.lock().get_mut(&key).filter(|record| record.claimed) {
            record.claimed = false;
            tracing::debug!(key = %key, "Verification claim released");
        }
    }

    /// Remove records that expired more than the grace period ago.
    ///
    /// Returns the number of records removed.
    pub fn sweep(&self) -> usize {
        let cutoff = self.clock.now() - self.policy.sweep_grace;
        let mut records = self.lock();

        let before = records.len();
        records.retain(|_, record| record.expires_at >= cutoff);
        let removed = before - records.len();

        self.stats.swept.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of records currently held
    pub fn active_records(&self) -> usize {
        self.lock().len()
    }

    pub fn get_stats(&self) -> OtpStatsSnapshot {
        OtpStatsSnapshot {
            active_records: self.active_records(),
            issued: self.stats.issued.load(Ordering::Relaxed),
            cooldown_rejections: self.stats.cooldown_rejections.load(Ordering::Relaxed),
            verified: self.stats.verified.load(Ordering::Relaxed),
            failed_verifications: self.stats.failed_verifications.load(Ordering::Relaxed),
            swept: self.stats.swept.load(Ordering::Relaxed),
        }
    }

    // Every critical section leaves the map consistent, so a panic elsewhere
    // while holding the lock does not invalidate the data.
    fn lock(&self) -> MutexGuard<'_, HashMap<VerificationKey, VerificationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Whole seconds in `delta`, rounded up, never below 1
fn ceil_secs(delta: TimeDelta) -> u64 {
    let micros = delta.num_microseconds().unwrap_or(i64::MAX).max(0) as u64;
    micros.div_ceil(1_000_000).max(1)
}
