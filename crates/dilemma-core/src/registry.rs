//! Named strategy factories

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::strategy::Agent;

/// Zero-argument factory producing a fresh agent of one strategy kind
pub type AgentFactory = Box<dyn Fn() -> Box<dyn Agent> + Send + Sync>;

/// Tag identifying a strategy kind by its position in a [`StrategyRegistry`].
///
/// Kinds are only meaningful for the registry that handed them out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StrategyKind(usize);

impl StrategyKind {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered mapping from strategy name to agent factory.
///
/// Registration order is significant: it drives the initial population
/// layout and breaks score ties in leaderboards.
#[derive(Default)]
pub struct StrategyRegistry {
    entries: Vec<(String, AgentFactory)>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a strategy. Names must be non-empty and unique.
    pub fn register<F, A>(&mut self, name: impl Into<String>, factory: F) -> Result<StrategyKind>
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: Agent + 'static,
    {
        self.register_boxed(
            name,
            Box::new(move || Box::new(factory()) as Box<dyn Agent>),
        )
    }

    /// Add a strategy whose factory already returns boxed agents
    pub fn register_boxed(
        &mut self,
        name: impl Into<String>,
        factory: AgentFactory,
    ) -> Result<StrategyKind> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SimulationError::config(
                "registry",
                "strategy names must not be empty",
            ));
        }
        if self.find(&name).is_some() {
            return Err(SimulationError::config(
                "registry",
                format!("strategy `{name}` is registered twice"),
            ));
        }

        self.entries.push((name, factory));
        Ok(StrategyKind(self.entries.len() - 1))
    }

    /// Builder-style [`StrategyRegistry::register`]
    pub fn with<F, A>(mut self, name: impl Into<String>, factory: F) -> Result<Self>
    where
        F: Fn() -> A + Send + Sync + 'static,
        A: Agent + 'static,
    {
        self.register(name, factory)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = StrategyKind> + Clone + '_ {
        (0..self.entries.len()).map(StrategyKind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn find(&self, name: &str) -> Option<StrategyKind> {
        self.entries
            .iter()
            .position(|(n, _)| n == name)
            .map(StrategyKind)
    }

    /// # Panics
    ///
    /// Panics if `kind` came from a different, larger registry.
    pub fn name(&self, kind: StrategyKind) -> &str {
        &self.entries[kind.0].0
    }

    /// Build a fresh agent of the given kind.
    ///
    /// # Panics
    ///
    /// Panics if `kind` came from a different, larger registry.
    pub fn instantiate(&self, kind: StrategyKind) -> Box<dyn Agent> {
        (self.entries[kind.0].1)()
    }

    pub(crate) fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            Err(SimulationError::config(
                "registry",
                "at least one strategy must be registered",
            ))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
