//! Single-contract recommendation selection.
//!
//! Filters a merged option chain down to eligible out-of-the-money
//! contracts, scores each against the probability model, and picks the
//! one closest to spot among those with positive edge.

use tracing::debug;

use crate::config::SelectorConfig;
use crate::strategy::pricing::ProbabilityModel;
use crate::types::OptionContract;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// An eligible contract with its computed scores. Transient: exists only
/// during selection and is never persisted.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub contract: OptionContract,
    pub distance_from_spot: f64,
    pub probability_itm: f64,
    pub edge_percent: f64,
}

impl Candidate {
    /// Display label for the recommendation row, e.g. "OTM CALL".
    ///
    /// The ITM branch of `moneyness_at` is unreachable here because
    /// eligibility was already restricted to OTM contracts; the flip is
    /// kept for output compatibility with the original screener.
    pub fn option_label(&self, spot: f64) -> String {
        format!(
            "{} {}",
            self.contract.moneyness_at(spot),
            self.contract.option_type
        )
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// Picks at most one contract per ticker per cycle. Pure function of the
/// chain, the spot price, and its configuration — no side effects.
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    config: SelectorConfig,
    model: ProbabilityModel,
}

impl CandidateSelector {
    pub fn new(config: SelectorConfig, model: ProbabilityModel) -> Self {
        Self { config, model }
    }

    /// Access the selector configuration.
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select the best-edge contract from a merged chain, or `None`.
    ///
    /// Filters, in order: premium ceiling, OTM-only moneyness, positive
    /// edge. Among survivors the contract closest to spot wins; ties keep
    /// the earliest in chain order.
    pub fn select_best(&self, contracts: &[OptionContract], spot: f64) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;

        for contract in contracts {
            if contract.last_price > self.config.premium_ceiling {
                continue;
            }
            if !contract.is_otm_at(spot) {
                continue;
            }

            let probability_itm =
                self.model
                    .probability_itm(spot, contract.strike, contract.implied_volatility);
            let edge_percent = (probability_itm / self.config.target_probability - 1.0) * 100.0;

            // NaN edges fail this comparison and are dropped with the rest.
            if !(edge_percent > 0.0) {
                continue;
            }

            let distance_from_spot = (contract.strike - spot).abs();

            debug!(
                contract = %contract.contract_symbol,
                distance = format!("{distance_from_spot:.2}"),
                probability = format!("{probability_itm:.4}"),
                edge = format!("{edge_percent:.2}%"),
                "Candidate scored"
            );

            // Strict comparison keeps the first contract on ties,
            // preserving chain order for determinism.
            let better = match &best {
                Some(b) => distance_from_spot < b.distance_from_spot,
                None => true,
            };
            if better {
                best = Some(Candidate {
                    contract: contract.clone(),
                    distance_from_spot,
                    probability_itm,
                    edge_percent,
                });
            }
        }

        best
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
