//! ABOUTME: `ModelProfile` — static cost and identity metadata for one routable model

/// Static description of a model the router may select. Observed
/// latency is tracked separately (it changes at runtime); price is
/// treated as a fixed catalog value supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub name: String,
    pub price_per_token: f64,
}

impl ModelProfile {
    #[must_use]
    pub fn new(name: impl Into<String>, price_per_token: f64) -> Self {
        Self {
            name: name.into(),
            price_per_token,
        }
    }
}
