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

//! Implementation of the [`Record`] structure.

use std::fmt;

use super::Type;
use crate::class::Class;

/// A resource record as held in the answer, authority, and additional
/// sections of a [`Message`](crate::message::Message).
///
/// Every field is kept as free-form text (or a wide integer, for the
/// TTL) rather than a validated type. Strategies routinely put values
/// here that no well-behaved DNS implementation would produce, and the
/// data model must be able to hold them until they reach the wire.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Record {
    /// The owner name. May be relative, absolute, empty, or otherwise
    /// malformed.
    pub name: String,

    /// The record type mnemonic (e.g. `"A"`) or generic `TYPEnnn` form.
    pub rr_type: String,

    /// The class mnemonic (e.g. `"IN"`).
    pub class: String,

    /// The TTL. Valid TTLs fit in 32 bits, but negative and oversized
    /// values are deliberately representable.
    pub ttl: i64,

    /// The record data in presentation format.
    pub rdata: String,
}

impl Record {
    /// Creates a new record.
    pub fn new(
        name: impl Into<String>,
        rr_type: impl Into<String>,
        class: impl Into<String>,
        ttl: i64,
        rdata: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rr_type: rr_type.into(),
            class: class.into(),
            ttl,
            rdata: rdata.into(),
        }
    }

    /// Creates a new record of class IN.
    pub fn internet(
        name: impl Into<String>,
        rr_type: Type,
        ttl: i64,
        rdata: impl Into<String>,
    ) -> Self {
        Self::new(name, rr_type.to_string(), Class::IN.to_string(), ttl, rdata)
    }

    /// Parses the record type, if it is valid.
    pub fn parsed_type(&self) -> Option<Type> {
        self.rr_type.parse().ok()
    }

    /// Returns whether this record has the given type. The comparison
    /// is made on parsed types, so `"a"` and `"TYPE1"` both match
    /// [`Type::A`].
    pub fn is_type(&self, rr_type: Type) -> bool {
        self.parsed_type() == Some(rr_type)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.class, self.rr_type, self.rdata
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internet_records_use_mnemonics() {
        let record = Record::internet("www.example.com.", Type::AAAA, 300, "::1");
        assert_eq!(record.rr_type, "AAAA");
        assert_eq!(record.class, "IN");
        assert!(record.is_type(Type::AAAA));
        assert_eq!(record.to_string(), "www.example.com.\t300\tIN\tAAAA\t::1");
    }

    #[test]
    fn type_matching_is_on_parsed_types() {
        assert!(Record::new("a.", "type1", "IN", 0, "").is_type(Type::A));
        assert!(!Record::new("a.", "bogus", "IN", 0, "").is_type(Type::A));
    }
}
