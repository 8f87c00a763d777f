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

//! Strategies that mutate or add resource records.
//!
//! The strategies that change existing records visit every record of
//! every section and change each one with probability 1/2. The ones
//! that add records append to the answer section and mark the message
//! as a response.

use std::sync::Arc;

use rand::seq::index;
use rand::{Rng, RngCore};

use super::catalog::{invalid_rdata, wildcard_patterns, CLASSES, RECORD_TYPES, SPECIAL_TTLS};
use super::helpers::{
    pick, random_domain_name, random_ipv4, random_ipv6, random_string, random_text, DEFAULT_LEVELS,
};
use super::Strategy;
use crate::message::{Message, Section};
use crate::rr::{Record, Type};

/// Returns one instance of every record strategy, with default
/// settings.
pub fn all() -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(RandomRecordType::default()),
        Arc::new(InvalidRecordData::default()),
        Arc::new(RecordTtlMutation::default()),
        Arc::new(DuplicateRecords),
        Arc::new(EmptyRecordSections),
        Arc::new(MismatchedRecords),
        Arc::new(LargeRecords),
        Arc::new(RecordCompression),
        Arc::new(WildcardRecords),
    ]
}

/// Calls `f` on each record of `message` with probability 1/2, making
/// an independent draw per record.
fn mutate_each<F>(message: &mut Message, rng: &mut dyn RngCore, mut f: F)
where
    F: FnMut(&mut Record, &mut dyn RngCore),
{
    for section in Section::ALL {
        for record in message.section_mut(section) {
            if rng.gen() {
                f(record, &mut *rng);
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// FIELD MUTATIONS                                                    //
////////////////////////////////////////////////////////////////////////

/// Changes record types.
#[derive(Debug)]
pub struct RandomRecordType {
    types: Vec<Type>,
}

impl RandomRecordType {
    pub fn with_types(types: Vec<Type>) -> Self {
        Self { types }
    }
}

impl Default for RandomRecordType {
    fn default() -> Self {
        Self::with_types(RECORD_TYPES.to_vec())
    }
}

impl Strategy for RandomRecordType {
    identity!(
        "random_record_type",
        1.2,
        "Change record types to random or invalid values"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.has_records()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        mutate_each(&mut mutated, rng, |record, rng| {
            if let Some(rr_type) = pick(rng, &self.types) {
                record.rr_type = rr_type.to_string();
            }
        });
        mutated
    }
}

/// Replaces rdata with malformed patterns.
#[derive(Debug)]
pub struct InvalidRecordData {
    patterns: Vec<String>,
}

impl InvalidRecordData {
    pub fn with_patterns(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

impl Default for InvalidRecordData {
    fn default() -> Self {
        Self::with_patterns(invalid_rdata())
    }
}

impl Strategy for InvalidRecordData {
    identity!(
        "invalid_record_data",
        1.0,
        "Generate records with invalid or malformed rdata"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.has_records()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        mutate_each(&mut mutated, rng, |record, rng| {
            if let Some(rdata) = pick(rng, &self.patterns) {
                record.rdata = rdata;
            }
        });
        mutated
    }
}

/// Sets TTLs to unusual values, including ones outside the 32-bit
/// unsigned range.
#[derive(Debug)]
pub struct RecordTtlMutation {
    ttls: Vec<i64>,
}

impl RecordTtlMutation {
    pub fn with_ttls(ttls: Vec<i64>) -> Self {
        Self { ttls }
    }
}

impl Default for RecordTtlMutation {
    fn default() -> Self {
        Self::with_ttls(SPECIAL_TTLS.to_vec())
    }
}

impl Strategy for RecordTtlMutation {
    identity!("record_ttl_mutation", 0.8, "Set unusual or invalid TTL values");

    fn can_apply(&self, message: &Message) -> bool {
        message.has_records()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        mutate_each(&mut mutated, rng, |record, rng| {
            if let Some(ttl) = pick(rng, &self.ttls) {
                record.ttl = ttl;
            }
        });
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// SECTION MUTATIONS                                                  //
////////////////////////////////////////////////////////////////////////

/// Appends copies of 1 to 3 distinct records of one section to that
/// section. Each copy gets a new TTL with probability 1/2.
#[derive(Debug, Default)]
pub struct DuplicateRecords;

impl Strategy for DuplicateRecords {
    identity!("duplicate_records", 0.7, "Add duplicate records to response sections");

    fn can_apply(&self, message: &Message) -> bool {
        message.has_records()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let sections: Vec<Section> = Section::ALL
            .into_iter()
            .filter(|&s| !message.section(s).is_empty())
            .collect();
        let section = match pick(rng, &sections) {
            Some(section) => section,
            None => return mutated,
        };

        let records = mutated.section_mut(section);
        let amount = records.len().min(rng.gen_range(1..=3));
        for i in index::sample(rng, records.len(), amount) {
            let mut duplicate = records[i].clone();
            if rng.gen() {
                duplicate.ttl = rng.gen_range(0..=86400);
            }
            records.push(duplicate);
        }
        mutated
    }
}

/// Marks the message as a response and empties 1 to 3 sections, drawn
/// with replacement.
#[derive(Debug, Default)]
pub struct EmptyRecordSections;

impl Strategy for EmptyRecordSections {
    identity!("empty_record_sections", 0.6, "Clear record sections in responses");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        mutated.is_response = true;
        let count = rng.gen_range(1..=3);
        for _ in 0..count {
            if let Some(section) = pick(rng, &Section::ALL) {
                mutated.section_mut(section).clear();
            }
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// SYNTHETIC RECORDS                                                  //
////////////////////////////////////////////////////////////////////////

/// Answers with 1 to 3 records unrelated to the question.
#[derive(Debug, Default)]
pub struct MismatchedRecords;

impl Strategy for MismatchedRecords {
    identity!(
        "mismatched_records",
        1.0,
        "Add records that don't match the original query"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        const TYPES: [Type; 5] = [Type::A, Type::AAAA, Type::CNAME, Type::MX, Type::TXT];
        let mut mutated = message.clone();
        mutated.is_response = true;
        let count = rng.gen_range(1..=3);
        for _ in 0..count {
            let name = random_domain_name(rng, 5, DEFAULT_LEVELS);
            let rr_type = pick(rng, &TYPES).unwrap_or(Type::A);
            let class = pick(rng, CLASSES).unwrap_or("IN");
            let ttl = rng.gen_range(0..=86400);
            let rdata = random_text(rng);
            mutated
                .answers
                .push(Record::new(name, rr_type.to_string(), class, ttl, rdata));
        }
        mutated
    }
}

/// Answers with 1 or 2 records carrying very long TXT data or very
/// long target names.
#[derive(Debug, Default)]
pub struct LargeRecords;

impl Strategy for LargeRecords {
    identity!("large_records", 1.0, "Create records with large data fields");

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        const TYPES: [Type; 4] = [Type::TXT, Type::CNAME, Type::NS, Type::PTR];
        let mut mutated = message.clone();
        mutated.is_response = true;
        let count = rng.gen_range(1..=2);
        for _ in 0..count {
            let rr_type = pick(rng, &TYPES).unwrap_or(Type::TXT);
            let rdata = if rr_type == Type::TXT {
                let length = rng.gen_range(500..=2000);
                random_string(rng, length)
            } else {
                let mut labels = Vec::new();
                let mut total = 0;
                while total < 200 && labels.len() < 10 {
                    let length = rng.gen_range(10..=50);
                    labels.push(random_string(rng, length));
                    total += length + 1;
                }
                format!("{}.example.com", labels.join("."))
            };
            let ttl = rng.gen_range(0..=86400);
            mutated.answers.push(Record::new(
                message.question.name.clone(),
                rr_type.to_string(),
                message.question.qclass.clone(),
                ttl,
                rdata,
            ));
        }
        mutated
    }
}

/// Answers with 3 to 6 records owned by the query name or its children,
/// so that a serializer has many chances to compress.
#[derive(Debug, Default)]
pub struct RecordCompression;

impl Strategy for RecordCompression {
    identity!(
        "record_compression",
        1.0,
        "Test DNS name compression and decompression"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        const TYPES: [Type; 4] = [Type::A, Type::AAAA, Type::CNAME, Type::NS];
        let mut mutated = message.clone();
        mutated.is_response = true;
        let base = &message.question.name;
        let count = rng.gen_range(3..=6);
        for _ in 0..count {
            let name = if rng.gen() {
                base.clone()
            } else {
                let length = rng.gen_range(3..=10);
                format!("{}.{}", random_string(rng, length), base)
            };
            let rr_type = pick(rng, &TYPES).unwrap_or(Type::A);
            let rdata = match rr_type {
                Type::AAAA => random_ipv6(rng),
                Type::CNAME | Type::NS => random_domain_name(rng, 5, DEFAULT_LEVELS),
                _ => random_ipv4(rng),
            };
            let ttl = rng.gen_range(0..=86400);
            mutated
                .answers
                .push(Record::internet(name, rr_type, ttl, rdata));
        }
        mutated
    }
}

/// Answers with 3 to 6 records owned by wildcard names, some of them
/// malformed.
#[derive(Debug, Default)]
pub struct WildcardRecords;

impl Strategy for WildcardRecords {
    identity!(
        "wildcard_records",
        1.0,
        "Create wildcard records and test wildcard handling"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        const TYPES: [Type; 4] = [Type::A, Type::AAAA, Type::CNAME, Type::TXT];
        let mut mutated = message.clone();
        mutated.is_response = true;
        let patterns = wildcard_patterns(&message.question.name);
        let count = rng.gen_range(3..=6);
        for _ in 0..count {
            let name = pick(rng, &patterns).unwrap_or_default();
            let rr_type = pick(rng, &TYPES).unwrap_or(Type::A);
            let ttl = rng.gen_range(0..=86400);
            let rdata = random_ipv4(rng);
            mutated
                .answers
                .push(Record::internet(name, rr_type, ttl, rdata));
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
