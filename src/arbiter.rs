//! GPU resource arbitration
//!
//! The language model and the audio model share one GPU and are never
//! concurrently resident. Only the arbiter requests loads and unloads;
//! everything else receives a `GpuLease` capability token instead of
//! device access. Offload and cleanup are best-effort guards: a failure
//! is logged and the pipeline proceeds, because the explicit cooldown
//! plus the host's own cache release is usually sufficient.

use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::error::Result;

/// Something that can occupy the GPU and be asked to vacate it.
pub trait GpuOccupant {
    /// Identifier for logs.
    fn occupant_name(&self) -> &str;

    /// Request release of this occupant's GPU allocation. Returns `false`
    /// when the host lacks the capability; a warning, not an error.
    fn offload(&self) -> Result<bool>;

    /// Drop cached allocations and synchronize the device.
    fn reclaim(&self) -> Result<()> {
        Ok(())
    }
}

/// Capability token proving the audio stage went through the handoff
/// protocol. Not cloneable; dropped (or explicitly released) when the
/// stage ends.
#[derive(Debug)]
pub struct GpuLease {
    granted_at: Instant,
}

impl GpuLease {
    pub fn held_for(&self) -> Duration {
        self.granted_at.elapsed()
    }
}

/// Enforces mutually-exclusive GPU occupancy with a cooldown protocol.
pub struct ResourceArbiter {
    cooldown: Duration,
}

impl ResourceArbiter {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    /// Hand the GPU from the language model to the audio model.
    ///
    /// Protocol: best-effort language-model offload, then a cleanup pass
    /// on the audio host, then a fixed real-time cooldown so driver-level
    /// deallocation settles before the next occupant loads.
    pub fn handoff_to_audio(
        &self,
        language_model: &dyn GpuOccupant,
        audio_host: &dyn GpuOccupant,
    ) -> GpuLease {
        match language_model.offload() {
            Ok(true) => info!(
                "Offloaded {} from the GPU",
                language_model.occupant_name()
            ),
            Ok(false) => warn!(
                "{} has no offload capability; relying on cleanup + cooldown",
                language_model.occupant_name()
            ),
            Err(e) => warn!(
                "Offload of {} failed ({e}); proceeding anyway",
                language_model.occupant_name()
            ),
        }

        self.force_cleanup(audio_host);

        GpuLease {
            granted_at: Instant::now(),
        }
    }

    /// Return the GPU to a clean baseline after the audio stage.
    pub fn release_audio(&self, lease: GpuLease, audio_host: &dyn GpuOccupant) {
        info!(
            "Audio stage held the GPU for {:.1}s",
            lease.held_for().as_secs_f64()
        );
        if let Err(e) = audio_host.offload() {
            warn!(
                "Unload of {} failed ({e}); proceeding anyway",
                audio_host.occupant_name()
            );
        }
        self.force_cleanup(audio_host);
    }

    /// Release cached allocations, synchronize, then wait the cooldown.
    fn force_cleanup(&self, host: &dyn GpuOccupant) {
        if let Err(e) = host.reclaim() {
            warn!(
                "GPU cleanup on {} failed ({e}); proceeding anyway",
                host.occupant_name()
            );
        }
        if !self.cooldown.is_zero() {
            thread::sleep(self.cooldown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        name: &'static str,
        offloads: AtomicUsize,
        reclaims: AtomicUsize,
        offload_supported: bool,
    }

    impl Recorder {
        fn new(name: &'static str, offload_supported: bool) -> Self {
            Self {
                name,
                offloads: AtomicUsize::new(0),
                reclaims: AtomicUsize::new(0),
                offload_supported,
            }
        }
    }

    impl GpuOccupant for Recorder {
        fn occupant_name(&self) -> &str {
            self.name
        }

        fn offload(&self) -> Result<bool> {
            self.offloads.fetch_add(1, Ordering::SeqCst);
            Ok(self.offload_supported)
        }

        fn reclaim(&self) -> Result<()> {
            self.reclaims.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_handoff_runs_offload_then_cleanup() {
        let lm = Recorder::new("lm", true);
        let audio = Recorder::new("audio", true);
        let arbiter = ResourceArbiter::new(Duration::ZERO);

        let lease = arbiter.handoff_to_audio(&lm, &audio);
        assert_eq!(lm.offloads.load(Ordering::SeqCst), 1);
        assert_eq!(audio.reclaims.load(Ordering::SeqCst), 1);

        arbiter.release_audio(lease, &audio);
        assert_eq!(audio.offloads.load(Ordering::SeqCst), 1);
        assert_eq!(audio.reclaims.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_offload_capability_is_not_fatal() {
        let lm = Recorder::new("lm", false);
        let audio = Recorder::new("audio", true);
        let arbiter = ResourceArbiter::new(Duration::ZERO);

        // Must not panic or error; the lease is still granted.
        let lease = arbiter.handoff_to_audio(&lm, &audio);
        arbiter.release_audio(lease, &audio);
    }
}
