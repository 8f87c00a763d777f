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

//! Strategies that mutate the header: opcode, RCODE, flags, and EDNS.

use std::sync::Arc;

use rand::{Rng, RngCore};

use super::catalog::{
    Flag, EDNS_PAYLOAD_SIZES, EDNS_VERSIONS, FLAG_COMBINATIONS, RECORD_TYPES, SPECIAL_IDS,
};
use super::helpers::{named_kinds, pick, random_rdata, random_record, random_text};
use super::Strategy;
use crate::message::{Edns, Message, Opcode, Rcode};
use crate::rr::{Record, Type};

/// Returns one instance of every header strategy, with default
/// settings.
pub fn all() -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(RandomOpcode),
        Arc::new(RandomRcode),
        Arc::new(RandomFlags::default()),
        Arc::new(InvalidFlagCombinations),
        Arc::new(QueryAsResponse),
        Arc::new(ResponseAsQuery),
        Arc::new(EdnsMutation::default()),
        Arc::new(TruncatedFlag::default()),
        Arc::new(ZeroQueryId),
    ]
}

////////////////////////////////////////////////////////////////////////
// OPCODE AND RCODE                                                   //
////////////////////////////////////////////////////////////////////////

/// Sets the opcode to a named or unassigned value.
#[derive(Debug, Default)]
pub struct RandomOpcode;

impl Strategy for RandomOpcode {
    identity!("random_opcode", 1.0, "Set random or invalid opcode values");

    fn can_apply(&self, message: &Message) -> bool {
        !message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let opcodes: Vec<Opcode> = Opcode::NAMED
            .into_iter()
            .chain((6..=15u8).filter_map(|v| Opcode::try_from(v).ok()))
            .collect();
        if let Some(opcode) = pick(rng, &opcodes) {
            mutated.opcode = opcode;
        }
        mutated
    }
}

/// Sets the RCODE to any value that fits in the header.
#[derive(Debug, Default)]
pub struct RandomRcode;

impl Strategy for RandomRcode {
    identity!("random_rcode", 1.0, "Set random or invalid response code values");

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let rcodes: Vec<Rcode> = Rcode::NAMED
            .into_iter()
            .chain((6..=15u8).filter_map(|v| Rcode::try_from(v).ok()))
            .collect();
        if let Some(rcode) = pick(rng, &rcodes) {
            mutated.rcode = rcode;
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// FLAGS                                                              //
////////////////////////////////////////////////////////////////////////

/// Sets 1 to 3 header flags, drawn with replacement, to random values.
#[derive(Debug)]
pub struct RandomFlags {
    flags: Vec<Flag>,
}

impl RandomFlags {
    pub fn with_flags(flags: Vec<Flag>) -> Self {
        Self { flags }
    }
}

impl Default for RandomFlags {
    fn default() -> Self {
        Self::with_flags(Flag::ALL.to_vec())
    }
}

impl Strategy for RandomFlags {
    identity!("random_flags", 1.5, "Randomly set DNS header flags");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let count = rng.gen_range(1..=3);
        for _ in 0..count {
            if let Some(flag) = pick(rng, &self.flags) {
                flag.set(&mut mutated, rng.gen());
            }
        }
        mutated
    }
}

/// Applies one of the contradictory flag combinations.
#[derive(Debug, Default)]
pub struct InvalidFlagCombinations;

impl Strategy for InvalidFlagCombinations {
    identity!(
        "invalid_flag_combinations",
        0.8,
        "Create unusual or invalid combinations of DNS flags"
    );

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        if let Some(combination) = pick(rng, FLAG_COMBINATIONS) {
            for &(flag, value) in combination {
                flag.set(&mut mutated, value);
            }
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// DIRECTION                                                          //
////////////////////////////////////////////////////////////////////////

/// Turns a query into a response, possibly with answers for the
/// question.
#[derive(Debug, Default)]
pub struct QueryAsResponse;

impl QueryAsResponse {
    fn answer_for(message: &Message, rng: &mut dyn RngCore) -> Record {
        let question = &message.question;
        let ttl = rng.gen_range(0..=86400);
        let rdata = match question.qtype.parse::<Type>() {
            Ok(rr_type) => random_rdata(rng, rr_type),
            Err(_) => random_text(rng),
        };
        Record::new(
            question.name.clone(),
            question.qtype.clone(),
            question.qclass.clone(),
            ttl,
            rdata,
        )
    }
}

impl Strategy for QueryAsResponse {
    identity!("query_as_response", 1.2, "Convert query packet to response format");

    fn can_apply(&self, message: &Message) -> bool {
        !message.is_response
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        mutated.is_response = true;
        mutated.authoritative = rng.gen();
        mutated.recursion_available = rng.gen();
        if rng.gen() {
            mutated.answers = vec![Self::answer_for(message, rng)];
            while rng.gen_range(0..=5) != 0 {
                mutated.answers.push(Self::answer_for(message, rng));
            }
        }
        mutated
    }
}

/// Turns a response into a query, possibly dropping its records.
#[derive(Debug, Default)]
pub struct ResponseAsQuery;

impl Strategy for ResponseAsQuery {
    identity!("response_as_query", 0.8, "Convert response packet to query format");

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        mutated.is_response = false;
        mutated.authoritative = false;
        mutated.recursion_available = false;
        if rng.gen() {
            mutated.clear_records();
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// EDNS                                                               //
////////////////////////////////////////////////////////////////////////

named_kinds! {
    /// An EDNS field that [`EdnsMutation`] can change.
    EdnsField {
        Version => "version",
        PayloadSize => "payload_size",
        DnssecOk => "dnssec_ok",
    }
}

/// Changes 1 to 3 EDNS fields, drawn with replacement. A message
/// without EDNS gets the default EDNS parameters first.
#[derive(Debug)]
pub struct EdnsMutation {
    fields: Vec<EdnsField>,
}

impl EdnsMutation {
    pub fn with_fields(fields: Vec<EdnsField>) -> Self {
        Self { fields }
    }
}

impl Default for EdnsMutation {
    fn default() -> Self {
        Self::with_fields(EdnsField::ALL.to_vec())
    }
}

impl Strategy for EdnsMutation {
    identity!("edns_mutation", 1.0, "Mutate EDNS version, payload size, and flags");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let edns = mutated.edns.get_or_insert_with(Edns::default);
        let count = rng.gen_range(1..=3);
        for _ in 0..count {
            match pick(rng, &self.fields) {
                Some(EdnsField::Version) => {
                    edns.version = pick(rng, EDNS_VERSIONS).unwrap_or(edns.version);
                }
                Some(EdnsField::PayloadSize) => {
                    edns.payload_size = pick(rng, EDNS_PAYLOAD_SIZES).unwrap_or(edns.payload_size);
                }
                Some(EdnsField::DnssecOk) => edns.dnssec_ok = rng.gen(),
                None => (),
            }
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// TRUNCATION                                                         //
////////////////////////////////////////////////////////////////////////

named_kinds! {
    /// The kind of message [`TruncatedFlag`] dresses the TC bit in.
    TruncatedContext {
        QueryTruncated => "query_truncated",
        ResponseTruncated => "response_truncated",
        EmptyTruncated => "empty_truncated",
    }
}

/// Sets the TC bit, on a query, a response with extra answers, or an
/// empty response.
#[derive(Debug)]
pub struct TruncatedFlag {
    contexts: Vec<TruncatedContext>,
}

impl TruncatedFlag {
    pub fn with_contexts(contexts: Vec<TruncatedContext>) -> Self {
        Self { contexts }
    }
}

impl Default for TruncatedFlag {
    fn default() -> Self {
        Self::with_contexts(TruncatedContext::ALL.to_vec())
    }
}

impl Strategy for TruncatedFlag {
    identity!("truncated_flag", 0.7, "Set truncated flag in various contexts");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        mutated.truncated = true;
        match pick(rng, &self.contexts) {
            Some(TruncatedContext::QueryTruncated) => mutated.is_response = false,
            Some(TruncatedContext::ResponseTruncated) => {
                mutated.is_response = true;
                mutated.authoritative = rng.gen();
                let count = rng.gen_range(1..=3);
                for _ in 0..count {
                    mutated.answers.push(random_record(rng, RECORD_TYPES));
                }
            }
            Some(TruncatedContext::EmptyTruncated) => {
                mutated.is_response = true;
                mutated.clear_records();
            }
            None => (),
        }
        mutated
    }
}

/// Sets the message ID to zero or another special value.
#[derive(Debug, Default)]
pub struct ZeroQueryId;

impl Strategy for ZeroQueryId {
    identity!("zero_query_id", 0.6, "Set query ID to zero or other special values");

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        if let Some(id) = pick(rng, SPECIAL_IDS) {
            mutated.id = id;
        }
        mutated
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(114514)
    }

    #[test]
    fn applicability() {
        let query = Message::query("example.com", "A");
        let response = Message::response("example.com", "A", "192.0.2.1");
        assert!(RandomOpcode.can_apply(&query));
        assert!(!RandomOpcode.can_apply(&response));
        assert!(!RandomRcode.can_apply(&query));
        assert!(RandomRcode.can_apply(&response));
        assert!(QueryAsResponse.can_apply(&query));
        assert!(!QueryAsResponse.can_apply(&response));
        assert!(!ResponseAsQuery.can_apply(&query));
        assert!(ResponseAsQuery.can_apply(&response));

        // Records alone make a message response-like.
        let mut with_records = query.clone();
        with_records.additional.push(Record::internet("a.example.", Type::A, 0, "192.0.2.2"));
        assert!(ResponseAsQuery.can_apply(&with_records));
    }

    #[test]
    fn opcodes_and_rcodes_fit_in_four_bits() {
        let mut rng = rng();
        let query = Message::query("example.com", "A");
        let response = Message::response("example.com", "A", "192.0.2.1");
        for _ in 0..100 {
            assert!(u8::from(RandomOpcode.apply(&query, &mut rng).opcode) <= 15);
            assert!(u8::from(RandomRcode.apply(&response, &mut rng).rcode) <= 15);
        }
    }

    #[test]
    fn flag_combinations_are_applied() {
        let mut rng = rng();
        let message = Message::default();
        for _ in 0..20 {
            let mutated = InvalidFlagCombinations.apply(&message, &mut rng);
            let matched = FLAG_COMBINATIONS.iter().any(|combination| {
                let mut expected = message.clone();
                for &(flag, value) in combination.iter() {
                    flag.set(&mut expected, value);
                }
                expected == mutated
            });
            assert!(matched);
        }
    }

    #[test]
    fn query_as_response_answers_the_question() {
        let mut rng = rng();
        let query = Message::query("example.com", "AAAA");
        for _ in 0..20 {
            let mutated = QueryAsResponse.apply(&query, &mut rng);
            assert!(mutated.is_response);
            for answer in &mutated.answers {
                assert_eq!(answer.name, "example.com");
                assert_eq!(answer.rr_type, "AAAA");
                assert_eq!(answer.class, "IN");
                assert!((0..=86400).contains(&answer.ttl));
                assert_eq!(answer.rdata.split(':').count(), 8);
            }
        }
    }

    #[test]
    fn response_as_query_clears_response_flags() {
        let mut rng = rng();
        let response = Message::response("example.com", "A", "192.0.2.1");
        let mutated = ResponseAsQuery.apply(&response, &mut rng);
        assert!(!mutated.is_response);
        assert!(!mutated.authoritative);
        assert!(!mutated.recursion_available);
        assert_eq!(mutated.question, response.question);
    }

    #[test]
    fn edns_mutation_enables_edns() {
        let mut rng = rng();
        let mut message = Message::default();
        message.edns = None;
        for _ in 0..20 {
            let edns = EdnsMutation::default().apply(&message, &mut rng).edns.unwrap();
            assert!(EDNS_VERSIONS.contains(&edns.version));
            assert!(edns.payload_size == 1232 || EDNS_PAYLOAD_SIZES.contains(&edns.payload_size));
        }
    }

    #[test]
    fn truncated_contexts() {
        let mut rng = rng();
        let query = Message::query("example.com", "A");

        let strategy = TruncatedFlag::with_contexts(vec![TruncatedContext::ResponseTruncated]);
        let mutated = strategy.apply(&query, &mut rng);
        assert!(mutated.truncated);
        assert!(mutated.is_response);
        assert!(mutated.answers.len() > query.answers.len());
        assert!(mutated.answers.len() <= query.answers.len() + 3);

        let strategy = TruncatedFlag::with_contexts(vec![TruncatedContext::EmptyTruncated]);
        let response = Message::response("example.com", "A", "192.0.2.1");
        let mutated = strategy.apply(&response, &mut rng);
        assert!(mutated.truncated && mutated.is_response);
        assert!(!mutated.has_records());

        let strategy = TruncatedFlag::with_contexts(vec![TruncatedContext::QueryTruncated]);
        let mutated = strategy.apply(&response, &mut rng);
        assert!(mutated.truncated && !mutated.is_response);
        assert_eq!(mutated.answers, response.answers);
    }

    #[test]
    fn zero_query_id_uses_special_ids() {
        let mut rng = rng();
        let message = Message::default();
        for _ in 0..20 {
            assert!(SPECIAL_IDS.contains(&ZeroQueryId.apply(&message, &mut rng).id));
        }
    }

    #[test]
    fn kind_names_parse_and_display() {
        assert_eq!("payload_size".parse(), Ok(EdnsField::PayloadSize));
        assert_eq!(TruncatedContext::EmptyTruncated.to_string(), "empty_truncated");
        assert_eq!(
            TruncatedContext::ALL
                .iter()
                .map(|context| context.name())
                .collect::<Vec<_>>(),
            ["query_truncated", "response_truncated", "empty_truncated"]
        );
        assert!("dnssec".parse::<EdnsField>().is_err());
    }
}
