// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! The strategy registry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;

use crate::mutator::{Error, Result};
use crate::strategy::{self, Strategy, StrategyInfo};

////////////////////////////////////////////////////////////////////////
// REGISTRY                                                           //
////////////////////////////////////////////////////////////////////////

/// A set of strategies keyed by name, each with an effective weight.
///
/// The registry remembers registration order, which is the order in
/// which a [`Mutator`](crate::mutator::Mutator) considers strategies
/// when sampling. Listing, on the other hand, is sorted by name.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

#[derive(Clone, Debug)]
struct Entry {
    strategy: Arc<dyn Strategy>,
    weight: f64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry of built-in strategies from descriptors.
    /// Disabled descriptors are skipped; a descriptor without a weight
    /// keeps the strategy's default weight.
    pub fn from_descriptors(descriptors: &[StrategyDescriptor]) -> Result<Self> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            let name = descriptor.name.as_str();
            let strategy = strategy::builtin(name)
                .ok_or_else(|| Error::NoSuchStrategy(name.to_owned()))?;
            if !descriptor.enabled {
                debug!("Strategy {} is disabled.", name);
                continue;
            }
            registry.register(strategy);
            if let Some(weight) = descriptor.weight {
                registry.set_weight(name, weight)?;
            }
        }
        Ok(registry)
    }

    /// Registers a strategy at its default weight. A strategy already
    /// registered under the same name is replaced in place and
    /// returned.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) -> Option<Arc<dyn Strategy>> {
        let entry = Entry {
            weight: strategy.weight(),
            strategy,
        };
        match self.position(entry.strategy.name()) {
            Some(index) => {
                debug!("Replacing strategy {}.", entry.strategy.name());
                Some(std::mem::replace(&mut self.entries[index], entry).strategy)
            }
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Removes a strategy. Returns whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                debug!("Unregistered strategy {}.", name);
                true
            }
            None => false,
        }
    }

    /// Looks up a strategy by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.position(name)
            .map(|index| self.entries[index].strategy.clone())
    }

    /// Returns the effective weight of a registered strategy.
    pub fn weight(&self, name: &str) -> Option<f64> {
        self.position(name).map(|index| self.entries[index].weight)
    }

    /// Overrides the weight of a registered strategy. The weight must
    /// be finite and non-negative.
    pub fn set_weight(&mut self, name: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeight(name.to_owned()));
        }
        let index = self
            .position(name)
            .ok_or_else(|| Error::NoSuchStrategy(name.to_owned()))?;
        self.entries[index].weight = weight;
        Ok(())
    }

    /// Lists the registered strategies, sorted by name, with their
    /// effective weights.
    pub fn list(&self) -> Vec<StrategyInfo> {
        let mut infos: Vec<StrategyInfo> = self
            .entries
            .iter()
            .map(|entry| StrategyInfo {
                weight: entry.weight,
                ..entry.strategy.info()
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Iterates over the strategies and their effective weights in
    /// registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<dyn Strategy>, f64)> {
        self.entries.iter().map(|entry| (&entry.strategy, entry.weight))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.strategy.name() == name)
    }
}

////////////////////////////////////////////////////////////////////////
// NAMES AND DESCRIPTORS                                              //
////////////////////////////////////////////////////////////////////////

/// A validated strategy name: one or more lowercase ASCII letters,
/// digits, `_`, or `-`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StrategyName(String);

impl StrategyName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StrategyName {
    type Err = InvalidNameError;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        let valid = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-';
        if text.is_empty() {
            Err(InvalidNameError::Empty)
        } else if let Some(c) = text.chars().find(|c| !c.is_ascii() || !valid(*c as u8)) {
            Err(InvalidNameError::BadCharacter(c))
        } else {
            Ok(Self(text.to_owned()))
        }
    }
}

impl AsRef<str> for StrategyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An error signaling that text is not a valid [`StrategyName`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InvalidNameError {
    Empty,
    BadCharacter(char),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("strategy name is empty"),
            Self::BadCharacter(c) => write!(f, "strategy name contains invalid character {:?}", c),
        }
    }
}

impl std::error::Error for InvalidNameError {}

/// A configuration entry for one built-in strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyDescriptor {
    pub name: StrategyName,
    pub enabled: bool,

    /// A weight overriding the strategy's default weight.
    pub weight: Option<f64>,
}

impl StrategyDescriptor {
    /// Creates a descriptor that enables a strategy at its default
    /// weight.
    pub fn enabled(name: StrategyName) -> Self {
        Self {
            name,
            enabled: true,
            weight: None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::basic::{RandomQueryId, RandomQueryName};
    use crate::strategy::header::ZeroQueryId;

    fn name(text: &str) -> StrategyName {
        text.parse().unwrap()
    }

    #[test]
    fn registration_keeps_order_and_replaces() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.register(Arc::new(ZeroQueryId)).is_none());
        assert!(registry.register(Arc::new(RandomQueryId)).is_none());
        assert!(registry.register(Arc::new(ZeroQueryId)).is_some());
        assert_eq!(registry.len(), 2);
        let order: Vec<&str> = registry.iter().map(|(s, _)| s.name()).collect();
        assert_eq!(order, ["zero_query_id", "random_query_id"]);
    }

    #[test]
    fn list_is_sorted_with_effective_weights() {
        let mut registry = Registry::new();
        registry.register(Arc::new(ZeroQueryId));
        registry.register(Arc::new(RandomQueryName));
        registry.set_weight("zero_query_id", 4.5).unwrap();
        let list = registry.list();
        assert_eq!(list[0].name, "random_query_name");
        assert_eq!(list[0].weight, 2.0);
        assert_eq!(list[1].name, "zero_query_id");
        assert_eq!(list[1].weight, 4.5);
    }

    #[test]
    fn unregister_and_get() {
        let mut registry = Registry::new();
        registry.register(Arc::new(RandomQueryId));
        assert!(registry.get("random_query_id").is_some());
        assert!(registry.unregister("random_query_id"));
        assert!(!registry.unregister("random_query_id"));
        assert!(registry.get("random_query_id").is_none());
    }

    #[test]
    fn weights_are_validated() {
        let mut registry = Registry::new();
        registry.register(Arc::new(RandomQueryId));
        assert_eq!(
            registry.set_weight("random_query_id", -1.0),
            Err(Error::InvalidWeight("random_query_id".to_owned()))
        );
        assert!(registry.set_weight("random_query_id", f64::NAN).is_err());
        assert_eq!(
            registry.set_weight("nope", 1.0),
            Err(Error::NoSuchStrategy("nope".to_owned()))
        );
        assert!(registry.set_weight("random_query_id", 0.0).is_ok());
        assert_eq!(registry.weight("random_query_id"), Some(0.0));
    }

    #[test]
    fn descriptors_build_registries() {
        let descriptors = [
            StrategyDescriptor {
                name: name("random_query_id"),
                enabled: true,
                weight: Some(3.0),
            },
            StrategyDescriptor {
                name: name("case_variation"),
                enabled: false,
                weight: None,
            },
            StrategyDescriptor::enabled(name("cname_loop")),
        ];
        let registry = Registry::from_descriptors(&descriptors).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.weight("random_query_id"), Some(3.0));
        assert_eq!(registry.weight("cname_loop"), Some(0.7));
        assert!(registry.get("case_variation").is_none());

        let unknown = [StrategyDescriptor::enabled(name("no_such_thing"))];
        assert_eq!(
            Registry::from_descriptors(&unknown).unwrap_err(),
            Error::NoSuchStrategy("no_such_thing".to_owned())
        );
        let bad_weight = [StrategyDescriptor {
            weight: Some(f64::INFINITY),
            ..StrategyDescriptor::enabled(name("zero_query_id"))
        }];
        assert!(matches!(
            Registry::from_descriptors(&bad_weight),
            Err(Error::InvalidWeight(_))
        ));
    }

    #[test]
    fn strategy_names() {
        assert!("random_query_id".parse::<StrategyName>().is_ok());
        assert!("x-1".parse::<StrategyName>().is_ok());
        assert_eq!("".parse::<StrategyName>(), Err(InvalidNameError::Empty));
        assert_eq!(
            "Random".parse::<StrategyName>(),
            Err(InvalidNameError::BadCharacter('R'))
        );
        assert!("a b".parse::<StrategyName>().is_err());
        assert!("é".parse::<StrategyName>().is_err());
    }
}
