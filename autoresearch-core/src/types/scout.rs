//! ABOUTME: `ScoutResult` and `GateDecision` — scout pass output and the gate policy's verdict

use super::config_snapshot::GateThresholds;
use super::retrieval::RetrievalDocument;
use serde::{Deserialize, Serialize};

/// Raw signal values computed by the scout pass (§4.2, §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateSignals {
    pub retrieval_overlap: f64,
    pub claim_conflict: f64,
    pub multi_hop_required: bool,
    pub graph_contradiction: bool,
}

/// A cheap first attempt: a draft answer plus the signals the gate policy
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutResult {
    pub draft_answer: String,
    pub retrieval_bundle: Vec<RetrievalDocument>,
    pub cache_hit: bool,
    pub signals: GateSignals,
}

/// Exit-vs-debate decision (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    Exit,
    Debate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub action: GateAction,
    pub max_cycles: u32,
    pub rationale: String,
    pub thresholds_used: GateThresholds,
    pub signals: GateSignals,
}

impl GateDecision {
    /// Evaluate the gate policy (§4.3): exit only if all four signals are
    /// within threshold; otherwise debate for `loops` cycles. Threshold
    /// overrides always win — scout signals are never re-interpreted.
    #[must_use]
    pub fn evaluate(signals: GateSignals, thresholds: &GateThresholds, loops: u32) -> Self {
        let overlap_ok = signals.retrieval_overlap >= thresholds.retrieval_overlap_min;
        let conflict_ok = signals.claim_conflict <= thresholds.claim_conflict_max;
        let multi_hop_ok =
            !signals.multi_hop_required || thresholds.multi_hop_required_allowed;
        let contradiction_ok =
            !signals.graph_contradiction || thresholds.graph_contradiction_allowed;

        if overlap_ok && conflict_ok && multi_hop_ok && contradiction_ok {
            Self {
                action: GateAction::Exit,
                max_cycles: 0,
                rationale: "all gate signals within threshold".to_string(),
                thresholds_used: thresholds.clone(),
                signals,
            }
        } else {
            Self {
                action: GateAction::Debate,
                max_cycles: loops,
                rationale: "one or more gate signals exceeded threshold".to_string(),
                thresholds_used: thresholds.clone(),
                signals,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_signals_within_threshold_exits() {
        let signals = GateSignals {
            retrieval_overlap: 0.8,
            claim_conflict: 0.1,
            multi_hop_required: false,
            graph_contradiction: false,
        };
        let decision = GateDecision::evaluate(signals, &GateThresholds::default(), 3);
        assert_eq!(decision.action, GateAction::Exit);
        assert_eq!(decision.max_cycles, 0);
    }

    #[test]
    fn low_overlap_forces_debate_with_configured_loops() {
        let signals = GateSignals {
            retrieval_overlap: 0.2,
            claim_conflict: 0.1,
            multi_hop_required: false,
            graph_contradiction: false,
        };
        let decision = GateDecision::evaluate(signals, &GateThresholds::default(), 3);
        assert_eq!(decision.action, GateAction::Debate);
        assert_eq!(decision.max_cycles, 3);
    }
}
