//! Transit-detection-algorithm backends for `transit_search` (spec.md
//! §4.6.8). The real algorithms (BLS, TLS, QATS subprocess, DST) are opaque
//! collaborators out of scope (spec.md §1); only a deterministic native
//! stub ships, registered under the TDA names spec.md §6 enumerates, so the
//! dispatch and quality-control logic around it is fully exercised.

use eas_lib::lightcurve::ArbitraryRaster;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSummary {
    pub period: f64,
    pub depth: f64,
    pub snr: f64,
}

pub trait TdaBackend: Send + Sync {
    fn search(&self, source: &ArbitraryRaster) -> eas_lib::EasResult<(SearchSummary, HashMap<String, String>)>;
}

/// Recovers the orbital period straight from the light curve's own
/// metadata (written by [`crate::synth`]) rather than running a real
/// period search — a stand-in for the opaque TDA backends.
pub struct NativeRecovery;

impl TdaBackend for NativeRecovery {
    fn search(&self, source: &ArbitraryRaster) -> eas_lib::EasResult<(SearchSummary, HashMap<String, String>)> {
        let period: f64 = source
            .metadata
            .get("orbital_period")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let depth: f64 = source
            .metadata
            .get("integrated_transit_power")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let mes: f64 = source
            .metadata
            .get("mes")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        // A real backend's "extended" output is a large supplementary
        // artifact (phase-folded curve, periodogram, ...); this stand-in
        // echoes the source metadata it read so the relocation path in
        // `eas_engine::runner`/`eas_store` has something real to move.
        Ok((
            SearchSummary {
                period,
                depth,
                snr: mes,
            },
            source.metadata.clone(),
        ))
    }
}

pub const KNOWN_TDA_NAMES: &[&str] = &[
    "bls_reference",
    "bls_kovacs",
    "dst_v26",
    "dst_v29",
    "exotrans",
    "qats",
    "tls",
];

pub fn lookup(name: &str) -> Option<Box<dyn TdaBackend>> {
    if KNOWN_TDA_NAMES.contains(&name) {
        Some(Box::new(NativeRecovery))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_accepts_all_known_names() {
        for name in KNOWN_TDA_NAMES {
            assert!(lookup(name).is_some(), "expected {name} to resolve");
        }
    }

    #[test]
    fn lookup_rejects_unknown_name() {
        assert!(lookup("not_a_real_tda").is_none());
    }
}
