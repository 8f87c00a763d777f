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

//! A DNS message mutation engine.
//!
//! The crate is organized around the [`Mutator`](mutator::Mutator),
//! which owns a seeded random number generator and a
//! [`Registry`](registry::Registry) of [`Strategy`](strategy::Strategy)
//! implementations. Each call to [`Mutator::mutate`] takes a
//! [`Message`](message::Message) and returns a new, independently owned
//! message with one or more strategies applied. Strategies that need
//! more than single-field changes (NS records with glue, CNAME chains,
//! whole zones) draw on the [`scenario`] module.
//!
//! Sending and receiving packets is left to the caller; the
//! [`message::writer`] module provides a permissive serializer so that
//! mutated messages can be put on the wire even when they are
//! malformed.
//!
//! [`Mutator::mutate`]: mutator::Mutator::mutate

pub mod class;
pub mod message;
pub mod mutator;
pub mod registry;
pub mod rr;
pub mod scenario;
pub mod strategy;
mod util;
