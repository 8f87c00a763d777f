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

//! Implementation of the [`Error`] type for mutation errors.

use std::fmt;

/// Errors that arise when configuring or running a
/// [`Mutator`](super::Mutator).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The registry was empty when a mutation was requested.
    NoStrategiesRegistered,

    /// No strategy is registered (or built in) under the given name.
    NoSuchStrategy(String),

    /// The weight given for the named strategy is negative or not
    /// finite.
    InvalidWeight(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoStrategiesRegistered => f.write_str("no strategies are registered"),
            Self::NoSuchStrategy(name) => write!(f, "no strategy named {}", name),
            Self::InvalidWeight(name) => {
                write!(f, "the weight for strategy {} must be finite and non-negative", name)
            }
        }
    }
}

impl std::error::Error for Error {}

/// The result type for mutator operations.
pub type Result<T> = std::result::Result<T, Error>;
