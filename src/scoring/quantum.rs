//! Decorative "quantum" score.
//!
//! Pseudo-random state dressed up with quantum vocabulary for the dashboard.
//! It has no physical or cryptographic meaning and never looks at the threat
//! history. Every derived view is recomputed from the qubit register plus
//! fresh randomness on each call.

use rand::Rng;
use serde::Serialize;
use std::f64::consts::TAU;

pub const QUBIT_COUNT: usize = 64;
pub const SUPERPOSITION_STATES: usize = 8;
pub const MAX_ENTANGLED_PAIRS: usize = QUBIT_COUNT / 2;

pub const BARRIER_HEIGHT: f64 = 1.0;
pub const BARRIER_WIDTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Qubit {
    pub state: u8,
    pub phase: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SuperpositionState {
    pub amplitude: f64,
    pub phase: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntangledPair {
    pub first: usize,
    pub second: usize,
    pub correlation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tunneling {
    pub energy: f64,
    pub momentum: f64,
    pub probability: f64,
    pub tunneled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantumScore {
    pub score: u32,
    pub label: &'static str,
    pub superposition: f64,
    pub entanglement: f64,
    pub tunneling: f64,
}

impl QuantumScore {
    /// Zeroed score shown in fallback mode
    pub fn zeroed() -> Self {
        Self {
            score: 0,
            label: quantum_label(0.0),
            superposition: 0.0,
            entanglement: 0.0,
            tunneling: 0.0,
        }
    }
}

/// Map an unscaled composite in [0, 1] to its label.
pub fn quantum_label(value: f64) -> &'static str {
    if value >= 0.8 {
        "Quantum Secure"
    } else if value >= 0.6 {
        "Quantum Protected"
    } else if value >= 0.4 {
        "Quantum Aware"
    } else if value >= 0.2 {
        "Quantum Vulnerable"
    } else {
        "Quantum Exposed"
    }
}

/// Barrier penetration probability; 1.0 once the energy clears the barrier.
pub fn tunneling_probability(energy: f64) -> f64 {
    if energy >= BARRIER_HEIGHT {
        return 1.0;
    }
    let gap = (BARRIER_HEIGHT - energy).max(0.0);
    (-2.0 * BARRIER_WIDTH * (2.0 * gap).sqrt()).exp().clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct QuantumScoreEngine {
    qubits: Vec<Qubit>,
}

impl QuantumScoreEngine {
    /// Initialize the register from `rng`. The register is never regenerated.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let qubits = (0..QUBIT_COUNT)
            .map(|_| Qubit {
                state: u8::from(rng.gen::<bool>()),
                phase: rng.gen::<f64>() * TAU,
                amplitude: rng.gen::<f64>(),
            })
            .collect();
        Self { qubits }
    }

    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    pub fn superposition<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SuperpositionState> {
        let raw: Vec<(f64, f64)> = (0..SUPERPOSITION_STATES)
            .map(|_| (rng.gen::<f64>(), rng.gen::<f64>() * TAU))
            .collect();
        let norm: f64 = raw.iter().map(|(a, _)| a * a).sum();

        raw.into_iter()
            .map(|(amplitude, phase)| SuperpositionState {
                amplitude,
                phase,
                probability: if norm > 0.0 {
                    amplitude * amplitude / norm
                } else {
                    1.0 / SUPERPOSITION_STATES as f64
                },
            })
            .collect()
    }

    pub fn entanglement<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<EntangledPair> {
        (0..self.qubits.len() / 2)
            .map(|i| EntangledPair {
                first: 2 * i,
                second: 2 * i + 1,
                correlation: rng.gen::<f64>(),
            })
            .collect()
    }

    pub fn tunneling<R: Rng + ?Sized>(&self, rng: &mut R) -> Tunneling {
        let energy = rng.gen::<f64>();
        let momentum = rng.gen::<f64>();
        Self::tunnel_with(energy, momentum, rng)
    }

    /// Tunneling for a given particle.
    pub fn tunnel_with<R: Rng + ?Sized>(energy: f64, momentum: f64, rng: &mut R) -> Tunneling {
        let probability = tunneling_probability(energy);
        Tunneling {
            energy,
            momentum,
            probability,
            tunneled: rng.gen::<f64>() < probability,
        }
    }

    pub fn score<R: Rng + ?Sized>(&self, rng: &mut R) -> QuantumScore {
        let states = self.superposition(rng);
        let superposition =
            states.iter().map(|s| s.probability).sum::<f64>() / states.len() as f64;
        let entanglement = self.entanglement(rng).len() as f64 / MAX_ENTANGLED_PAIRS as f64;
        let tunneling = self.tunneling(rng).probability;

        let composite = (superposition + entanglement + tunneling) / 3.0;
        QuantumScore {
            score: (composite * 100.0).round() as u32,
            label: quantum_label(composite),
            superposition,
            entanglement,
            tunneling,
        }
    }

    /// Decorative key: one bit per measured qubit, hex encoded. Not suitable
    /// for any cryptographic use.
    pub fn generate_key<R: Rng + ?Sized>(&self, bits: usize, rng: &mut R) -> String {
        let mut bytes = vec![0u8; (bits + 7) / 8];
        for i in 0..bits {
            let qubit = &self.qubits[i % self.qubits.len()];
            let one_probability = qubit.amplitude * qubit.amplitude;
            let measured = if rng.gen::<f64>() < one_probability {
                1 - qubit.state
            } else {
                qubit.state
            };
            bytes[i / 8] |= measured << (7 - i % 8);
        }
        hex::encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine() -> (QuantumScoreEngine, StdRng) {
        let mut rng = StdRng::seed_from_u64(2024);
        (QuantumScoreEngine::new(&mut rng), rng)
    }

    #[test]
    fn test_register_shape() {
        let (engine, _) = engine();
        assert_eq!(engine.qubits().len(), QUBIT_COUNT);
        for q in engine.qubits() {
            assert!(q.state <= 1);
            assert!((0.0..TAU).contains(&q.phase));
            assert!((0.0..1.0).contains(&q.amplitude));
        }
    }

    #[test]
    fn test_superposition_normalized() {
        let (engine, mut rng) = engine();
        let states = engine.superposition(&mut rng);
        assert_eq!(states.len(), SUPERPOSITION_STATES);
        let total: f64 = states.iter().map(|s| s.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_entanglement_pairs_sequential() {
        let (engine, mut rng) = engine();
        let pairs = engine.entanglement(&mut rng);
        assert_eq!(pairs.len(), MAX_ENTANGLED_PAIRS);
        assert_eq!((pairs[0].first, pairs[0].second), (0, 1));
        assert_eq!((pairs[31].first, pairs[31].second), (62, 63));
        assert!(pairs.iter().all(|p| (0.0..1.0).contains(&p.correlation)));
    }

    #[test]
    fn test_tunneling_above_barrier() {
        let mut rng = StdRng::seed_from_u64(1);
        for energy in [1.0, 1.5] {
            let t = QuantumScoreEngine::tunnel_with(energy, 0.3, &mut rng);
            assert_eq!(t.probability, 1.0);
            assert!(t.tunneled);
        }
    }

    #[test]
    fn test_tunneling_below_barrier() {
        let p = tunneling_probability(0.5);
        // exp(-2 * 0.5 * sqrt(1.0)) = e^-1
        assert!((p - (-1.0f64).exp()).abs() < 1e-12);
        assert!(tunneling_probability(0.0) < p);
    }

    #[test]
    fn test_score_bounds_and_label() {
        let (engine, mut rng) = engine();
        for _ in 0..100 {
            let score = engine.score(&mut rng);
            assert!(score.score <= 100);
            assert!((score.superposition - 0.125).abs() < 1e-9);
            assert_eq!(score.entanglement, 1.0);
            let composite = (score.superposition + score.entanglement + score.tunneling) / 3.0;
            assert_eq!(score.label, quantum_label(composite));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(quantum_label(0.8), "Quantum Secure");
        assert_eq!(quantum_label(0.79), "Quantum Protected");
        assert_eq!(quantum_label(0.4), "Quantum Aware");
        assert_eq!(quantum_label(0.2), "Quantum Vulnerable");
        assert_eq!(quantum_label(0.19), "Quantum Exposed");
    }

    #[test]
    fn test_key_length() {
        let (engine, mut rng) = engine();
        assert_eq!(engine.generate_key(128, &mut rng).len(), 32);
        assert_eq!(engine.generate_key(12, &mut rng).len(), 4);
    }
}
