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

//! Strategies that mutate the question and the message ID.

use std::sync::Arc;

use rand::{Rng, RngCore};

use super::catalog::{
    BOUNDARY_IDS, CLASSES, INVALID_CHARS, INVALID_CLASS, RECORD_TYPES, SPECIAL_DOMAINS,
};
use super::helpers::{self, named_kinds, pick, random_domain_name, random_string, NumericMutation};
use super::Strategy;
use crate::message::Message;
use crate::rr::Type;

/// Returns one instance of every basic strategy, with default settings.
pub fn all() -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(RandomQueryName),
        Arc::new(RandomQueryType::default()),
        Arc::new(RandomQueryClass::default()),
        Arc::new(RandomQueryId),
        Arc::new(BoundaryQueryId),
        Arc::new(LongQueryName::default()),
        Arc::new(InvalidCharacters::default()),
        Arc::new(EmptyFields::default()),
        Arc::new(CaseVariation::default()),
        Arc::new(NumericQueryName),
        Arc::new(SpecialDomains),
    ]
}

////////////////////////////////////////////////////////////////////////
// RANDOMIZERS                                                        //
////////////////////////////////////////////////////////////////////////

/// Replaces the QNAME with a random domain name.
#[derive(Debug, Default)]
pub struct RandomQueryName;

impl Strategy for RandomQueryName {
    identity!("random_query_name", 2.0, "Replace query name with random domain name");

    fn can_apply(&self, message: &Message) -> bool {
        !message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let max_labels = rng.gen_range(1..=5);
        let levels: helpers::Levels = if rng.gen() {
            &[(0, "com")]
        } else if rng.gen() {
            &[]
        } else {
            helpers::DEFAULT_LEVELS
        };
        mutated.question.name = random_domain_name(rng, max_labels, levels);
        mutated
    }
}

/// Replaces the QTYPE with a record type drawn from a catalog.
#[derive(Debug)]
pub struct RandomQueryType {
    types: Vec<Type>,
}

impl RandomQueryType {
    pub fn with_types(types: Vec<Type>) -> Self {
        Self { types }
    }
}

impl Default for RandomQueryType {
    fn default() -> Self {
        Self::with_types(RECORD_TYPES.to_vec())
    }
}

impl Strategy for RandomQueryType {
    identity!("random_query_type", 1.5, "Replace query type with random type");

    fn can_apply(&self, message: &Message) -> bool {
        !message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        if let Some(rr_type) = pick(rng, &self.types) {
            mutated.question.qtype = rr_type.to_string();
        }
        mutated
    }
}

/// Replaces the QCLASS with a class drawn from a catalog. The default
/// catalog includes the bogus mnemonic `Any`.
#[derive(Debug)]
pub struct RandomQueryClass {
    classes: Vec<String>,
}

impl RandomQueryClass {
    pub fn with_classes(classes: Vec<String>) -> Self {
        Self { classes }
    }
}

impl Default for RandomQueryClass {
    fn default() -> Self {
        let mut classes: Vec<String> = CLASSES.iter().map(|&c| c.to_owned()).collect();
        classes.push(INVALID_CLASS.to_owned());
        Self::with_classes(classes)
    }
}

impl Strategy for RandomQueryClass {
    identity!("random_query_class", 1.0, "Replace query class with random class");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        if let Some(class) = pick(rng, &self.classes) {
            mutated.question.qclass = class;
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// MESSAGE IDS                                                        //
////////////////////////////////////////////////////////////////////////

/// Mutates the message ID with one of the numeric field mutations.
#[derive(Debug, Default)]
pub struct RandomQueryId;

impl Strategy for RandomQueryId {
    identity!("random_query_id", 1.0, "Replace query ID with random value");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let id = helpers::mutate_numeric_field(
            rng,
            message.id.into(),
            0,
            u16::MAX.into(),
            NumericMutation::ALL,
        );
        mutated.id = u16::try_from(id).unwrap_or(message.id);
        mutated
    }
}

/// Sets the message ID to a 16-bit boundary value.
#[derive(Debug, Default)]
pub struct BoundaryQueryId;

impl Strategy for BoundaryQueryId {
    identity!("boundary_query_id", 0.8, "Set query ID to boundary values (0, 65535, etc.)");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        if let Some(id) = pick(rng, BOUNDARY_IDS) {
            mutated.id = id;
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// NAME GENERATORS                                                    //
////////////////////////////////////////////////////////////////////////

named_kinds! {
    /// How [`LongQueryName`] builds its name.
    LongNameMethod {
        SingleLongLabel => "single_long_label",
        ManyLabels => "many_labels",
        MaxLength => "max_length",
    }
}

/// Replaces the QNAME with a name at or beyond the length limits.
#[derive(Debug)]
pub struct LongQueryName {
    methods: Vec<LongNameMethod>,
}

impl LongQueryName {
    pub fn with_methods(methods: Vec<LongNameMethod>) -> Self {
        Self { methods }
    }
}

impl Default for LongQueryName {
    fn default() -> Self {
        Self::with_methods(LongNameMethod::ALL.to_vec())
    }
}

impl Strategy for LongQueryName {
    identity!("long_query_name", 0.5, "Generate very long query names to test parsing limits");

    fn can_apply(&self, message: &Message) -> bool {
        !message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let name = match pick(rng, &self.methods) {
            Some(LongNameMethod::SingleLongLabel) => {
                // Up to 7 octets over the label limit
                let length = rng.gen_range(60..=70);
                format!("{}.com", random_string(rng, length))
            }
            Some(LongNameMethod::ManyLabels) => {
                let count = rng.gen_range(10..=30);
                let labels: Vec<String> = (0..count)
                    .map(|_| {
                        let length = rng.gen_range(3..=10);
                        random_string(rng, length)
                    })
                    .collect();
                labels.join(".")
            }
            Some(LongNameMethod::MaxLength) => {
                let target = rng.gen_range(250..=300);
                let mut labels = Vec::new();
                let mut current = 0;
                while current < target {
                    let remaining = target - current;
                    let length = rng.gen_range(3..=15).min(remaining - 1);
                    if length == 0 {
                        break;
                    }
                    labels.push(random_string(rng, length));
                    current += length + 1;
                }
                labels.join(".")
            }
            None => return mutated,
        };
        mutated.question.name = name;
        mutated
    }
}

named_kinds! {
    /// How [`InvalidCharacters`] places its character.
    InvalidCharMethod {
        ReplaceChar => "replace_char",
        InsertChar => "insert_char",
        AppendChar => "append_char",
    }
}

/// Puts a character that does not belong in host names into the QNAME.
#[derive(Debug)]
pub struct InvalidCharacters {
    methods: Vec<InvalidCharMethod>,
    chars: Vec<char>,
}

impl InvalidCharacters {
    pub fn with_methods(methods: Vec<InvalidCharMethod>) -> Self {
        Self {
            methods,
            chars: INVALID_CHARS.to_vec(),
        }
    }

    /// Replaces the characters to insert.
    pub fn with_chars(mut self, chars: Vec<char>) -> Self {
        self.chars = chars;
        self
    }
}

impl Default for InvalidCharacters {
    fn default() -> Self {
        Self::with_methods(InvalidCharMethod::ALL.to_vec())
    }
}

impl Strategy for InvalidCharacters {
    identity!("invalid_characters", 0.7, "Insert invalid characters in query name");

    fn can_apply(&self, message: &Message) -> bool {
        !message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let method = pick(rng, &self.methods);
        let invalid = match pick(rng, &self.chars) {
            Some(c) => c,
            None => return mutated,
        };
        let mut chars: Vec<char> = message.question.name.chars().collect();
        match method {
            Some(InvalidCharMethod::ReplaceChar) if !chars.is_empty() => {
                let position = rng.gen_range(0..chars.len());
                chars[position] = invalid;
            }
            Some(InvalidCharMethod::InsertChar) => {
                let position = rng.gen_range(0..=chars.len());
                chars.insert(position, invalid);
            }
            _ => chars.push(invalid),
        }
        mutated.question.name = chars.into_iter().collect();
        mutated
    }
}

named_kinds! {
    /// A question field that [`EmptyFields`] can blank out.
    EmptyTarget {
        Qname => "qname",
        Qtype => "qtype",
        Qclass => "qclass",
    }
}

/// Sets one of the question fields to the empty string.
#[derive(Debug)]
pub struct EmptyFields {
    targets: Vec<EmptyTarget>,
}

impl EmptyFields {
    pub fn with_targets(targets: Vec<EmptyTarget>) -> Self {
        Self { targets }
    }
}

impl Default for EmptyFields {
    fn default() -> Self {
        Self::with_targets(EmptyTarget::ALL.to_vec())
    }
}

impl Strategy for EmptyFields {
    identity!("empty_fields", 0.6, "Set query name or other fields to empty values");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        match pick(rng, &self.targets) {
            Some(EmptyTarget::Qname) => mutated.question.name.clear(),
            Some(EmptyTarget::Qtype) => mutated.question.qtype.clear(),
            Some(EmptyTarget::Qclass) => mutated.question.qclass.clear(),
            None => (),
        }
        mutated
    }
}

named_kinds! {
    /// How [`CaseVariation`] changes letter case.
    CaseMethod {
        AllUpper => "all_upper",
        AllLower => "all_lower",
        RandomCase => "random_case",
        Alternating => "alternating",
    }
}

/// Changes the letter case of the QNAME.
#[derive(Debug)]
pub struct CaseVariation {
    methods: Vec<CaseMethod>,
}

impl CaseVariation {
    pub fn with_methods(methods: Vec<CaseMethod>) -> Self {
        Self { methods }
    }
}

impl Default for CaseVariation {
    fn default() -> Self {
        Self::with_methods(CaseMethod::ALL.to_vec())
    }
}

impl Strategy for CaseVariation {
    identity!("case_variation", 1.2, "Randomly vary case of characters in query name");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let name = &message.question.name;
        mutated.question.name = match pick(rng, &self.methods) {
            Some(CaseMethod::AllUpper) => name.to_uppercase(),
            Some(CaseMethod::AllLower) => name.to_lowercase(),
            Some(CaseMethod::RandomCase) => {
                let mut result = String::with_capacity(name.len());
                for c in name.chars() {
                    if !c.is_alphabetic() {
                        result.push(c);
                    } else if rng.gen() {
                        result.extend(c.to_uppercase());
                    } else {
                        result.extend(c.to_lowercase());
                    }
                }
                result
            }
            Some(CaseMethod::Alternating) => {
                let mut result = String::with_capacity(name.len());
                let mut upper = true;
                for c in name.chars() {
                    if !c.is_alphabetic() {
                        result.push(c);
                        continue;
                    }
                    if upper {
                        result.extend(c.to_uppercase());
                    } else {
                        result.extend(c.to_lowercase());
                    }
                    upper = !upper;
                }
                result
            }
            None => return mutated,
        };
        mutated
    }
}

/// Replaces the QNAME with 1 to 4 all-digit labels.
#[derive(Debug, Default)]
pub struct NumericQueryName;

impl Strategy for NumericQueryName {
    identity!("numeric_query_name", 0.8, "Generate query names with only numeric characters");

    fn can_apply(&self, message: &Message) -> bool {
        !message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let count = rng.gen_range(1..=4);
        let labels: Vec<String> = (0..count)
            .map(|_| {
                let length = rng.gen_range(1..=10);
                helpers::random_string_from(rng, length, b"0123456789")
            })
            .collect();
        mutated.question.name = labels.join(".");
        mutated
    }
}

/// Replaces the QNAME with a special-use or otherwise odd name.
#[derive(Debug, Default)]
pub struct SpecialDomains;

impl Strategy for SpecialDomains {
    identity!("special_domains", 0.9, "Use special or reserved domain names");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        if let Some(domain) = pick(rng, SPECIAL_DOMAINS) {
            mutated.question.name = domain.to_owned();
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
