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

//! The [`Mutator`], which applies strategies to messages.
//!
//! A mutator owns a seeded random number generator, a [`Registry`] of
//! strategies, and a history of the mutations it has performed. All
//! randomness, both for choosing strategies and inside them, comes from
//! the mutator's generator, so a mutator created with a given seed and
//! registry always produces the same sequence of outputs for the same
//! sequence of inputs.
//!
//! A mutator is meant to be owned by a single worker. Workers that run
//! concurrently should each have their own.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::message::Message;
use crate::registry::{Registry, StrategyDescriptor};
use crate::strategy::{self, Strategy, StrategyInfo};
use crate::util::fnv1a_64;

mod error;

pub use error::{Error, Result};

/// The seed used when none is supplied.
pub const DEFAULT_SEED: u64 = 114514;

////////////////////////////////////////////////////////////////////////
// SEEDS                                                              //
////////////////////////////////////////////////////////////////////////

/// A seed for a [`Mutator`]'s generator: an integer, or text that is
/// hashed to one.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Seed {
    Int(u64),
    Text(String),
}

impl Seed {
    /// Returns the integer seed.
    pub fn value(&self) -> u64 {
        match self {
            Self::Int(value) => *value,
            Self::Text(text) => fnv1a_64(text),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::Int(DEFAULT_SEED)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Seed {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl FromStr for Seed {
    type Err = std::convert::Infallible;

    /// Parses text as an integer seed if it is one, and as a text seed
    /// otherwise.
    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        Ok(text.parse().map(Self::Int).unwrap_or_else(|_| text.into()))
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "{:?}", text),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// HISTORY                                                            //
////////////////////////////////////////////////////////////////////////

/// A record of one call to [`Mutator::mutate`] or
/// [`Mutator::run_chain`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MutationRecord {
    pub original_id: u16,
    pub mutated_id: u16,

    /// The names of the strategies applied, in order.
    pub strategies: Vec<String>,

    /// The number of strategies applied. This is less than the number
    /// of rounds requested if the mutation stopped early.
    pub count: usize,
}

////////////////////////////////////////////////////////////////////////
// CHAINS                                                             //
////////////////////////////////////////////////////////////////////////

/// A fixed sequence of strategies, resolved when the chain is created.
///
/// Applying a chain applies each strategy in turn to the result of the
/// previous one, skipping strategies that do not apply to the message
/// at that point.
#[derive(Clone, Debug)]
pub struct Chain {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl Chain {
    /// Returns the names of the strategies in the chain.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Applies the chain to `message`. Returns the result and the names
    /// of the strategies that were actually applied.
    pub fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> (Message, Vec<String>) {
        let mut current = message.clone();
        let mut applied = Vec::new();
        for strategy in &self.strategies {
            if strategy.can_apply(&current) {
                current = strategy.apply(&current, rng);
                applied.push(strategy.name().to_owned());
            } else {
                debug!("Chain skipped strategy {}.", strategy.name());
            }
        }
        (current, applied)
    }
}

////////////////////////////////////////////////////////////////////////
// MUTATOR                                                            //
////////////////////////////////////////////////////////////////////////

/// Applies weighted, randomly selected strategies to messages. See the
/// [module documentation](self).
#[derive(Debug)]
pub struct Mutator {
    rng: StdRng,
    registry: Registry,
    history: Vec<MutationRecord>,
}

impl Mutator {
    /// Creates a mutator with an empty registry.
    pub fn new(seed: impl Into<Seed>) -> Self {
        Self::with_registry(seed, Registry::new())
    }

    /// Creates a mutator with every built-in strategy registered.
    pub fn with_default_strategies(seed: impl Into<Seed>) -> Self {
        let mut registry = Registry::new();
        strategy::register_all(&mut registry);
        Self::with_registry(seed, registry)
    }

    /// Creates a mutator around an existing registry.
    pub fn with_registry(seed: impl Into<Seed>, registry: Registry) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed.into().value()),
            registry,
            history: Vec::new(),
        }
    }

    /// Registers a strategy at its default weight, replacing any
    /// strategy of the same name.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        debug!("Registering strategy {}.", strategy.name());
        self.registry.register(strategy);
    }

    /// Removes a strategy. Returns whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    /// Lists the registered strategies, sorted by name.
    pub fn list(&self) -> Vec<StrategyInfo> {
        self.registry.list()
    }

    /// Looks up a registered strategy.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Replaces the registry with one built from descriptors. On
    /// error, the current registry is left alone.
    pub fn configure(&mut self, descriptors: &[StrategyDescriptor]) -> Result<()> {
        self.registry = Registry::from_descriptors(descriptors)?;
        Ok(())
    }

    /// Reseeds the generator. The history is kept.
    pub fn set_seed(&mut self, seed: impl Into<Seed>) {
        self.rng = StdRng::seed_from_u64(seed.into().value());
    }

    /// Applies `count` rounds of mutation to a copy of `message`.
    ///
    /// With a `strategy` name, every round applies that strategy,
    /// whether or not it considers itself applicable. Otherwise each
    /// round picks among the strategies applicable to the message as
    /// it stands after the previous round, with probability
    /// proportional to weight; if none applies, mutation stops early
    /// and the result so far is returned.
    ///
    /// One [`MutationRecord`] is added to the history per call.
    pub fn mutate(
        &mut self,
        message: &Message,
        strategy: Option<&str>,
        count: usize,
    ) -> Result<Message> {
        if self.registry.is_empty() {
            return Err(Error::NoStrategiesRegistered);
        }
        let named = match strategy {
            Some(name) => Some(
                self.registry
                    .get(name)
                    .ok_or_else(|| Error::NoSuchStrategy(name.to_owned()))?,
            ),
            None => None,
        };

        let mut current = message.clone();
        let mut applied = Vec::with_capacity(count);
        for round in 1..=count {
            let chosen = match named {
                Some(ref strategy) => strategy.clone(),
                None => match self.sample(&current) {
                    Some(strategy) => strategy,
                    None => {
                        debug!("No applicable strategy in round {}; stopping.", round);
                        break;
                    }
                },
            };
            debug!("Round {}: applying {}.", round, chosen.name());
            current = chosen.apply(&current, &mut self.rng);
            applied.push(chosen.name().to_owned());
        }

        self.history.push(MutationRecord {
            original_id: message.id,
            mutated_id: current.id,
            count: applied.len(),
            strategies: applied,
        });
        Ok(current)
    }

    /// Mutates each message in turn with `count` rounds each. The
    /// generator is consumed in the order of `messages`.
    pub fn mutate_batch(&mut self, messages: &[Message], count: usize) -> Result<Vec<Message>> {
        messages
            .iter()
            .map(|message| self.mutate(message, None, count))
            .collect()
    }

    /// Resolves a chain of registered strategies.
    pub fn create_chain<S: AsRef<str>>(&self, names: &[S]) -> Result<Chain> {
        let strategies = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.registry
                    .get(name)
                    .ok_or_else(|| Error::NoSuchStrategy(name.to_owned()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Chain { strategies })
    }

    /// Applies a chain using this mutator's generator, recording the
    /// result in the history.
    pub fn run_chain(&mut self, chain: &Chain, message: &Message) -> Message {
        let (mutated, applied) = chain.apply(message, &mut self.rng);
        self.history.push(MutationRecord {
            original_id: message.id,
            mutated_id: mutated.id,
            count: applied.len(),
            strategies: applied,
        });
        mutated
    }

    /// Returns a copy of the history.
    pub fn history(&self) -> Vec<MutationRecord> {
        self.history.clone()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Counts how many times each strategy has been applied over the
    /// recorded history.
    pub fn stats(&self) -> BTreeMap<String, usize> {
        let mut stats = BTreeMap::new();
        for name in self.history.iter().flat_map(|r| r.strategies.iter()) {
            *stats.entry(name.clone()).or_insert(0) += 1;
        }
        stats
    }

    ////////////////////////////////////////////////////////////////////
    // PRIVATE HELPERS                                                //
    ////////////////////////////////////////////////////////////////////

    /// Picks an applicable strategy with probability proportional to
    /// its weight.
    ///
    /// The draw is a uniform value in `[0, total)`, and the pick is the
    /// first applicable strategy, in registration order, whose
    /// cumulative weight exceeds it. If every applicable strategy has
    /// weight zero, the pick is uniform instead.
    fn sample(&mut self, message: &Message) -> Option<Arc<dyn Strategy>> {
        let applicable: Vec<(&Arc<dyn Strategy>, f64)> = self
            .registry
            .iter()
            .filter(|(strategy, _)| strategy.can_apply(message))
            .collect();
        if applicable.is_empty() {
            return None;
        }

        let total: f64 = applicable.iter().map(|(_, weight)| weight).sum();
        if total <= 0.0 {
            let index = self.rng.gen_range(0..applicable.len());
            return Some(applicable[index].0.clone());
        }

        let draw = self.rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (strategy, weight) in &applicable {
            cumulative += weight;
            if cumulative > draw {
                return Some((*strategy).clone());
            }
        }
        // Rounding can leave the draw at or above the final sum.
        applicable.last().map(|(strategy, _)| (*strategy).clone())
    }
}

impl Default for Mutator {
    fn default() -> Self {
        Self::with_default_strategies(Seed::default())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBuilder;
    use crate::strategy::basic::{CaseVariation, RandomQueryId, RandomQueryName};
    use crate::strategy::header::{QueryAsResponse, RandomRcode, ZeroQueryId};

    fn query() -> Message {
        MessageBuilder::new()
            .id(12345)
            .question("example.com", "A", "IN")
            .build()
    }

    #[test]
    fn random_query_id_end_to_end() {
        let mut mutator = Mutator::new(42u64);
        mutator.register(Arc::new(RandomQueryId));
        let original = query();
        let mutated = mutator.mutate(&original, None, 1).unwrap();
        assert_eq!(mutated.question, original.question);
        assert_eq!(mutated.is_response, original.is_response);
        assert_eq!(
            mutator.history(),
            [MutationRecord {
                original_id: 12345,
                mutated_id: mutated.id,
                strategies: vec!["random_query_id".to_owned()],
                count: 1,
            }]
        );
        assert_eq!(original, query());
    }

    #[test]
    fn mutation_is_deterministic() {
        let run = || {
            let mut mutator = Mutator::with_default_strategies("determinism");
            let mut outputs = Vec::new();
            for _ in 0..20 {
                outputs.push(mutator.mutate(&query(), None, 3).unwrap());
            }
            (outputs, mutator.history())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn empty_registry_is_an_error() {
        let mut mutator = Mutator::new(1u64);
        for count in [0, 1, 5] {
            assert_eq!(
                mutator.mutate(&query(), None, count),
                Err(Error::NoStrategiesRegistered)
            );
        }
        assert!(mutator.history().is_empty());
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let mut mutator = Mutator::with_default_strategies(1u64);
        assert_eq!(
            mutator.mutate(&query(), Some("nope"), 1),
            Err(Error::NoSuchStrategy("nope".to_owned()))
        );
        assert!(matches!(
            mutator.create_chain(&["random_query_id", "nope"]),
            Err(Error::NoSuchStrategy(name)) if name == "nope"
        ));
    }

    #[test]
    fn weights_skew_selection() {
        let mut heavy = 0;
        for seed in 0..100u64 {
            let mut mutator = Mutator::new(seed);
            mutator.register(Arc::new(RandomQueryId));
            mutator.register(Arc::new(ZeroQueryId));
            mutator.registry_mut().set_weight("random_query_id", 0.1).unwrap();
            mutator.registry_mut().set_weight("zero_query_id", 10.0).unwrap();
            mutator.mutate(&query(), None, 1).unwrap();
            if mutator.history()[0].strategies == ["zero_query_id"] {
                heavy += 1;
            }
        }
        assert!(heavy > 50, "{}", heavy);
    }

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        let mut mutator = Mutator::new(9u64);
        mutator.register(Arc::new(RandomQueryId));
        mutator.registry_mut().set_weight("random_query_id", 0.0).unwrap();
        mutator.mutate(&query(), None, 3).unwrap();
        assert_eq!(mutator.history()[0].count, 3);
    }

    #[test]
    fn mutation_stops_without_applicable_strategies() {
        // random_rcode only applies to responses.
        let mut mutator = Mutator::new(5u64);
        mutator.register(Arc::new(RandomRcode));
        let mutated = mutator.mutate(&query(), None, 4).unwrap();
        assert_eq!(mutated, query());
        assert_eq!(mutator.history()[0].count, 0);

        // Applicability is checked against the message as mutated so
        // far: once the query becomes a response, random_rcode applies
        // and query_as_response does not.
        mutator.register(Arc::new(QueryAsResponse));
        let mutated = mutator.mutate(&query(), None, 3).unwrap();
        assert!(mutated.is_response);
        let history = mutator.history();
        assert_eq!(
            history[1].strategies,
            ["query_as_response", "random_rcode", "random_rcode"]
        );
    }

    #[test]
    fn named_strategy_is_used_every_round() {
        let mut mutator = Mutator::with_default_strategies(2u64);
        let mutated = mutator.mutate(&query(), Some("case_variation"), 4).unwrap();
        assert!(mutated.question.name.eq_ignore_ascii_case("example.com"));
        assert_eq!(mutator.history()[0].strategies, ["case_variation"; 4]);
        assert_eq!(mutator.stats().get("case_variation"), Some(&4));
    }

    #[test]
    fn chains_apply_in_order() {
        let mut mutator = Mutator::new(8u64);
        mutator.register(Arc::new(RandomQueryName));
        mutator.register(Arc::new(CaseVariation::default()));
        let chain = mutator
            .create_chain(&["random_query_name", "case_variation"])
            .unwrap();
        assert_eq!(chain.names(), ["random_query_name", "case_variation"]);

        let mut rng = StdRng::seed_from_u64(77);
        let (by_chain, applied) = chain.apply(&query(), &mut rng);
        let mut rng = StdRng::seed_from_u64(77);
        let first = RandomQueryName.apply(&query(), &mut rng);
        let by_hand = CaseVariation::default().apply(&first, &mut rng);
        assert_eq!(by_chain, by_hand);
        assert_eq!(applied, ["random_query_name", "case_variation"]);
    }

    #[test]
    fn chains_skip_inapplicable_strategies() {
        let mut mutator = Mutator::new(8u64);
        mutator.register(Arc::new(RandomRcode));
        mutator.register(Arc::new(ZeroQueryId));
        let chain = mutator.create_chain(&["random_rcode", "zero_query_id"]).unwrap();
        let mutated = mutator.run_chain(&chain, &query());
        assert_eq!(mutated.rcode, query().rcode);
        assert_eq!(mutator.history()[0].strategies, ["zero_query_id"]);
    }

    #[test]
    fn batches_thread_one_generator() {
        let messages = vec![query(); 5];
        let mut batch = Mutator::with_default_strategies(3u64);
        let mut single = Mutator::with_default_strategies(3u64);
        let from_batch = batch.mutate_batch(&messages, 2).unwrap();
        let one_by_one: Vec<Message> = messages
            .iter()
            .map(|m| single.mutate(m, None, 2).unwrap())
            .collect();
        assert_eq!(from_batch, one_by_one);
        assert_eq!(batch.history().len(), 5);
    }

    #[test]
    fn reseeding_keeps_history() {
        let mut mutator = Mutator::with_default_strategies(Seed::default());
        let first = mutator.mutate(&query(), None, 2).unwrap();
        mutator.set_seed(DEFAULT_SEED);
        let second = mutator.mutate(&query(), None, 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(mutator.history().len(), 2);
        mutator.clear_history();
        assert!(mutator.history().is_empty());
        assert!(mutator.stats().is_empty());
    }

    #[test]
    fn configure_replaces_the_registry() {
        let mut mutator = Mutator::with_default_strategies(1u64);
        let descriptors = [StrategyDescriptor::enabled("zero_query_id".parse().unwrap())];
        mutator.configure(&descriptors).unwrap();
        assert_eq!(mutator.list().len(), 1);
        assert!(mutator.get("zero_query_id").is_some());

        let bad = [StrategyDescriptor::enabled("missing".parse().unwrap())];
        assert!(mutator.configure(&bad).is_err());
        assert_eq!(mutator.list().len(), 1);
        assert!(mutator.unregister("zero_query_id"));
    }

    #[test]
    fn seeds() {
        assert_eq!("12".parse::<Seed>().unwrap(), Seed::Int(12));
        assert_eq!("abc".parse::<Seed>().unwrap(), Seed::Text("abc".to_owned()));
        assert_eq!(Seed::from("abc").value(), fnv1a_64("abc"));
        assert_eq!(Seed::default().value(), DEFAULT_SEED);
    }
}
