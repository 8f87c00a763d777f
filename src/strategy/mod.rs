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

//! The [`Strategy`] trait and the built-in strategies.
//!
//! A strategy is a named, weighted transform over a [`Message`]. It
//! never modifies the message it is given: [`Strategy::apply`] returns
//! a new message, usually a clone with a few fields changed. The
//! built-in strategies are grouped into [`basic`] (question and ID
//! fields), [`header`] (header flags, opcode, RCODE, EDNS), [`record`]
//! (record sections), and [`logical`] (multi-record scenarios). Each
//! group has a registration function, and [`register_all`] calls all of
//! them.

use std::fmt;
use std::sync::Arc;

use log::debug;
use rand::RngCore;

use crate::message::Message;
use crate::registry::Registry;

/// Implements the identity methods of [`Strategy`] from literals.
macro_rules! identity {
    ($name:literal, $weight:literal, $description:literal) => {
        fn name(&self) -> &str {
            $name
        }

        fn description(&self) -> &str {
            $description
        }

        fn weight(&self) -> f64 {
            $weight
        }
    };
}

pub mod basic;
pub mod catalog;
pub mod header;
pub mod helpers;
pub mod logical;
pub mod record;

////////////////////////////////////////////////////////////////////////
// STRATEGIES                                                         //
////////////////////////////////////////////////////////////////////////

/// A mutation strategy.
///
/// Strategies are stateless apart from their configuration, so one
/// instance can be shared (through an [`Arc`]) between any number of
/// registries and chains. All randomness comes from the generator
/// passed to [`apply`](Strategy::apply).
pub trait Strategy: Send + Sync {
    /// The unique name of the strategy: lowercase ASCII alphanumerics,
    /// `_`, and `-`.
    fn name(&self) -> &str;

    /// A one-line human-readable description.
    fn description(&self) -> &str;

    /// The default selection weight. A registry may override it.
    fn weight(&self) -> f64;

    /// Returns whether the strategy is meaningful for `message`. This
    /// must be a pure function of the message.
    fn can_apply(&self, _message: &Message) -> bool {
        true
    }

    /// Returns a mutated copy of `message`. Implementations must not
    /// fail; when the input leaves nothing sensible to do they return
    /// an unchanged clone.
    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message;

    /// Returns the identity of the strategy.
    fn info(&self) -> StrategyInfo {
        StrategyInfo {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            weight: self.weight(),
        }
    }
}

impl fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name())
            .field("weight", &self.weight())
            .finish()
    }
}

/// The identity of a strategy, as listed by a
/// [`Registry`](crate::registry::Registry).
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    pub weight: f64,
}

impl fmt::Display for StrategyInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:<28} {:>5.2}  {}", self.name, self.weight, self.description)
    }
}

////////////////////////////////////////////////////////////////////////
// REGISTRATION                                                       //
////////////////////////////////////////////////////////////////////////

fn register_group(registry: &mut Registry, group: &str, strategies: Vec<Arc<dyn Strategy>>) {
    let count = strategies.len();
    for strategy in strategies {
        registry.register(strategy);
    }
    debug!("Registered {} {} strategies.", count, group);
}

/// Registers the question and ID strategies of [`basic`].
pub fn register_basic_strategies(registry: &mut Registry) {
    register_group(registry, "basic", basic::all());
}

/// Registers the header strategies of [`header`].
pub fn register_header_strategies(registry: &mut Registry) {
    register_group(registry, "header", header::all());
}

/// Registers the record-section strategies of [`record`].
pub fn register_record_strategies(registry: &mut Registry) {
    register_group(registry, "record", record::all());
}

/// Registers the scenario strategies of [`logical`].
pub fn register_logical_strategies(registry: &mut Registry) {
    register_group(registry, "logical", logical::all());
}

/// Registers every built-in strategy, group by group.
pub fn register_all(registry: &mut Registry) {
    register_basic_strategies(registry);
    register_header_strategies(registry);
    register_record_strategies(registry);
    register_logical_strategies(registry);
}

/// Returns every built-in strategy, in registration order.
pub fn builtins() -> Vec<Arc<dyn Strategy>> {
    let mut all = basic::all();
    all.extend(header::all());
    all.extend(record::all());
    all.extend(logical::all());
    all
}

/// Looks up a built-in strategy by name.
pub fn builtin(name: &str) -> Option<Arc<dyn Strategy>> {
    builtins().into_iter().find(|s| s.name() == name)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::message::MessageBuilder;
    use crate::registry::StrategyName;
    use crate::rr::{Record, Type};

    #[test]
    fn builtin_names_are_unique_and_valid() {
        let all = builtins();
        assert_eq!(all.len(), 11 + 9 + 9 + 7);
        let mut names = HashSet::new();
        for strategy in &all {
            assert!(names.insert(strategy.name().to_owned()), "{}", strategy.name());
            assert!(strategy.name().parse::<StrategyName>().is_ok());
            assert!(strategy.weight() >= 0.0);
            assert!(!strategy.description().is_empty());
        }
    }

    #[test]
    fn register_all_registers_every_builtin() {
        let mut registry = Registry::new();
        register_all(&mut registry);
        assert_eq!(registry.len(), builtins().len());
        assert!(builtin("cname_loop").is_some());
        assert!(builtin("nonexistent").is_none());
    }

    #[test]
    fn no_strategy_aliases_its_input() {
        let original = MessageBuilder::new()
            .response(true)
            .answer(Record::internet("a.example.com.", Type::A, 60, "192.0.2.1"))
            .authority(Record::internet("example.com.", Type::NS, 60, "ns1.example.com."))
            .additional(Record::internet("ns1.example.com.", Type::A, 60, "192.0.2.53"))
            .edns_option(10, vec![1, 2, 3, 4])
            .build();
        let snapshot = original.clone();
        let mut rng = StdRng::seed_from_u64(3);
        for strategy in builtins() {
            for _ in 0..5 {
                let mut mutated = strategy.apply(&original, &mut rng);
                for section in crate::message::Section::ALL {
                    for record in mutated.section_mut(section) {
                        record.ttl = 12345;
                        record.rdata.push('x');
                    }
                    mutated.section_mut(section).push(Record::default());
                }
                if let Some(edns) = mutated.edns.as_mut() {
                    edns.options.clear();
                }
                assert_eq!(original, snapshot, "{}", strategy.name());
            }
        }
    }
}
