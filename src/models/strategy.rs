//! # models::strategy
//!
//! [`StrategyState`] — the single moving-average strategy instance.
//!
//! Initialised disabled with no signal; never persisted.  The Command Surface
//! owns `enabled`, the strategy evaluator owns `last_signal`.

use serde::Serialize;

use crate::models::{Destination, Signal};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrategyState {
    pub enabled: bool,
    /// Last signal a trade was successfully submitted for.
    pub last_signal: Signal,
    /// Where strategy notices go; set by whoever switched the strategy on.
    pub notify_to: Option<Destination>,
    /// Bumped by every admin reset; a tick that started under an older
    /// generation must not write `last_signal`.
    #[serde(skip)]
    pub generation: u64,
}
