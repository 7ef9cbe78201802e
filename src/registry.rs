#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Name → strategy lookup.
//!
//! The registry is an ordinary value: build it once (usually with
//! [`StrategyRegistry::with_builtins`]) and share it by reference. It is only
//! read after construction, so any number of threads may judge through it.

use serde::Serialize;
use tabled::Tabled;

use crate::{
    constants,
    judge::{
        EventSeqStrategy, IoStrategy, JudgeInput, JudgeResult, JudgeStrategy, LedStrategy,
        MusicStrategy, PixelStrategy,
    },
};

/// A registered strategy as shown by `judge list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct StrategyInfo {
    /// Registry key.
    #[tabled(rename = "Strategy")]
    pub name:        String,
    /// Human-readable summary.
    #[tabled(rename = "Description")]
    pub description: String,
}

/// Maps strategy names to their implementations.
pub struct StrategyRegistry {
    /// Registered strategies in registration order.
    strategies: Vec<(String, Box<dyn JudgeStrategy>)>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StrategyRegistry {
    /// A registry with nothing registered.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// A registry holding the five built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(IoStrategy);
        registry.register(LedStrategy);
        registry.register(EventSeqStrategy);
        registry.register(PixelStrategy);
        registry.register(MusicStrategy);
        registry
    }

    /// Registers `strategy` under its own name. A later registration with
    /// the same name replaces the earlier one.
    pub fn register(&mut self, strategy: impl JudgeStrategy + 'static) -> &mut Self {
        self.register_as(strategy.name(), strategy)
    }

    /// Registers `strategy` under `name`; see [`StrategyRegistry::register`].
    pub fn register_as(
        &mut self,
        name: impl Into<String>,
        strategy: impl JudgeStrategy + 'static,
    ) -> &mut Self {
        let name = name.into();
        let boxed: Box<dyn JudgeStrategy> = Box::new(strategy);
        match self.strategies.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                tracing::debug!("Replacing strategy `{name}`");
                slot.1 = boxed;
            }
            None => self.strategies.push((name, boxed)),
        }
        self
    }

    /// The strategy registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn JudgeStrategy> {
        self.strategies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, strategy)| strategy.as_ref())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Description of `name`, or `"Unknown strategy"`.
    pub fn describe(&self, name: &str) -> &'static str {
        self.get(name)
            .map_or(constants::UNKNOWN_STRATEGY, |strategy| strategy.description())
    }

    /// Name and description of every registered strategy.
    pub fn info(&self) -> Vec<StrategyInfo> {
        self.strategies
            .iter()
            .map(|(name, strategy)| StrategyInfo {
                name:        name.clone(),
                description: strategy.description().to_string(),
            })
            .collect()
    }

    /// Judges `input` with the strategy named by `input.strategy`.
    pub fn judge(&self, input: &JudgeInput) -> JudgeResult {
        match self.get(&input.strategy) {
            Some(strategy) => strategy.judge(input),
            None => {
                tracing::warn!("No strategy registered as `{}`", input.strategy);
                JudgeResult::failed(format!("Unknown strategy: {}", input.strategy)).with_details(
                    format!("Registered strategies: {}", self.names().join(", ")),
                )
            }
        }
    }
}
