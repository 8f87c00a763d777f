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

//! Implementation of the [`Class`] type for record classes.

use std::fmt;
use std::str::FromStr;

use crate::message::Qclass;
use crate::util::Caseless;

/// The class of a resource record, as written on the wire.
///
/// [`Record`](crate::rr::Record)s and [`Question`]s carry their class as
/// free-form text so that strategies can put anything there (an empty
/// string, `"Any"`, lowercase variants). `Class` is what that text
/// turns into when a message is serialized: a wrapper around [`u16`]
/// that understands the RFC 1035 mnemonics and the RFC 3597 `CLASSnnn`
/// form.
///
/// [`Question`]: crate::message::Question
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Class(u16);

impl Class {
    pub const IN: Self = Self(1);
    pub const CH: Self = Self(3);
    pub const HS: Self = Self(4);

    /// The classes with mnemonics, in the order strategies draw them.
    pub const KNOWN: [Self; 3] = [Self::IN, Self::CH, Self::HS];
}

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        Class(value)
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        class.0
    }
}

impl From<Qclass> for Class {
    fn from(qclass: Qclass) -> Self {
        Self(qclass.into())
    }
}

impl FromStr for Class {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let caseless = Caseless(text);
        if let Some(&class) = Self::KNOWN
            .iter()
            .find(|class| caseless == Caseless(&class.to_string()))
        {
            Ok(class)
        } else if text
            .get(0..5)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("CLASS"))
        {
            text[5..]
                .parse::<u16>()
                .map(Self::from)
                .or(Err("class value is not a valid unsigned 16-bit integer"))
        } else {
            Err("unknown class")
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", *self)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::IN => f.write_str("IN"),
            Self::CH => f.write_str("CH"),
            Self::HS => f.write_str("HS"),
            Self(value) => write!(f, "CLASS{}", value),
        }
    }
}
