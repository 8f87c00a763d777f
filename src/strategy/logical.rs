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

//! Strategies that add logically related groups of records.
//!
//! Apart from [`LogicalRecord`], these only apply to messages that are
//! or look like responses. None of them touch the header: the records
//! are appended to an otherwise unchanged copy of the message.

use std::sync::Arc;

use rand::RngCore;

use super::Strategy;
use crate::message::Message;
use crate::scenario::{LogicalRecordGenerator, ScenarioCatalog, ScenarioParams, ScenarioType};

/// Returns one instance of every logical strategy, with default
/// settings.
pub fn all() -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(LogicalRecord::default()),
        Arc::new(NsGlue),
        Arc::new(CnameChain::default()),
        Arc::new(CnameLoop::default()),
        Arc::new(ZoneStructure),
        Arc::new(AuthorityAdditionalRecords),
        Arc::new(LogicalWildcardRecord),
    ]
}

/// Appends the records of a scenario to the additional section of a
/// copy of `message`.
fn append_scenario(
    message: &Message,
    rng: &mut dyn RngCore,
    ty: ScenarioType,
    params: &ScenarioParams,
) -> Message {
    let mut mutated = message.clone();
    let records = LogicalRecordGenerator::new().generate_with(rng, ty, params);
    mutated.additional.extend(records);
    mutated
}

/// Appends the records of a scenario, fixed or picked at random each
/// time, to the additional section.
#[derive(Debug, Default)]
pub struct LogicalRecord {
    scenario: Option<ScenarioType>,
}

impl LogicalRecord {
    pub fn with_scenario(scenario: ScenarioType) -> Self {
        Self {
            scenario: Some(scenario),
        }
    }
}

impl Strategy for LogicalRecord {
    identity!(
        "logical_record",
        1.0,
        "Generate logically related DNS records for realistic scenarios"
    );

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let ty = match self.scenario {
            Some(ty) => ty,
            None => ScenarioCatalog::new().pick(rng),
        };
        append_scenario(message, rng, ty, &ScenarioParams::default())
    }
}

/// Appends NS records with glue.
#[derive(Debug, Default)]
pub struct NsGlue;

impl Strategy for NsGlue {
    identity!(
        "ns_glue",
        0.8,
        "Generate NS records with corresponding glue records"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        append_scenario(message, rng, ScenarioType::NsWithGlue, &ScenarioParams::default())
    }
}

/// Appends a CNAME chain ending in an A record.
#[derive(Debug, Default)]
pub struct CnameChain {
    chain_length: Option<usize>,
}

impl CnameChain {
    pub fn with_chain_length(chain_length: usize) -> Self {
        Self {
            chain_length: Some(chain_length),
        }
    }
}

impl Strategy for CnameChain {
    identity!("cname_chain", 0.7, "Generate CNAME chains");

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let params = ScenarioParams {
            chain_length: self.chain_length,
            ..Default::default()
        };
        append_scenario(message, rng, ScenarioType::CnameChain, &params)
    }
}

/// Appends a CNAME chain that loops back to its first name.
#[derive(Debug, Default)]
pub struct CnameLoop {
    chain_length: Option<usize>,
}

impl CnameLoop {
    pub fn with_chain_length(chain_length: usize) -> Self {
        Self {
            chain_length: Some(chain_length),
        }
    }
}

impl Strategy for CnameLoop {
    identity!("cname_loop", 0.7, "Generate CNAME loops");

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let params = ScenarioParams {
            chain_length: self.chain_length,
            ..Default::default()
        };
        append_scenario(message, rng, ScenarioType::CnameLoop, &params)
    }
}

/// Appends the records of a whole zone.
#[derive(Debug, Default)]
pub struct ZoneStructure;

impl Strategy for ZoneStructure {
    identity!(
        "zone_structure",
        0.5,
        "Generate complete DNS zone structures with SOA, NS, and various records"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        append_scenario(message, rng, ScenarioType::ZoneStructure, &ScenarioParams::default())
    }
}

/// Adds an answer for the query name, NS records for its zone, and
/// addresses for the name servers, each in its own section.
#[derive(Debug, Default)]
pub struct AuthorityAdditionalRecords;

impl Strategy for AuthorityAdditionalRecords {
    identity!(
        "authority_additional",
        0.9,
        "Generate authority and additional records with logical relationships"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        let mut mutated = message.clone();
        let split = LogicalRecordGenerator::new()
            .authority_additional(rng, Some(&message.question.name));
        mutated.answers.extend(split.answers);
        mutated.authorities.extend(split.authorities);
        mutated.additional.extend(split.additional);
        mutated
    }
}

/// Appends a wildcard record with specific overrides.
#[derive(Debug, Default)]
pub struct LogicalWildcardRecord;

impl Strategy for LogicalWildcardRecord {
    identity!(
        "logical_wildcard_record",
        0.4,
        "Generate wildcard DNS records with specific overrides"
    );

    fn can_apply(&self, message: &Message) -> bool {
        message.is_response_like()
    }

    fn apply(&self, message: &Message, rng: &mut dyn RngCore) -> Message {
        append_scenario(message, rng, ScenarioType::WildcardRecords, &ScenarioParams::default())
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
    use crate::rr::Type;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(114514)
    }

    #[test]
    fn only_logical_record_applies_to_queries() {
        let query = Message::query("example.com", "A");
        let response = Message::response("example.com", "A", "192.0.2.1");
        for strategy in all() {
            assert!(strategy.can_apply(&response), "{}", strategy.name());
            assert_eq!(
                strategy.can_apply(&query),
                strategy.name() == "logical_record",
                "{}",
                strategy.name()
            );
        }
    }

    #[test]
    fn records_are_appended_to_additional() {
        let mut rng = rng();
        let response = Message::response("example.com", "A", "192.0.2.1");
        for strategy in all() {
            if strategy.name() == "authority_additional" {
                continue;
            }
            let mutated = strategy.apply(&response, &mut rng);
            assert_eq!(mutated.answers, response.answers, "{}", strategy.name());
            assert!(mutated.authorities.is_empty());
            assert!(!mutated.additional.is_empty(), "{}", strategy.name());
            assert_eq!(mutated.is_response, response.is_response);
        }
    }

    #[test]
    fn fixed_scenarios() {
        let mut rng = rng();
        let response = Message::response("example.com", "A", "192.0.2.1");
        let mutated =
            LogicalRecord::with_scenario(ScenarioType::WildcardRecords).apply(&response, &mut rng);
        assert_eq!(mutated.additional.len(), 4);
        assert!(mutated.additional[0].name.starts_with("*."));

        let mutated = CnameLoop::with_chain_length(3).apply(&response, &mut rng);
        assert_eq!(mutated.additional.len(), 2);
        assert_eq!(mutated.additional[1].rdata, mutated.additional[0].name);

        let mutated = CnameChain::with_chain_length(3).apply(&response, &mut rng);
        assert_eq!(mutated.additional.len(), 3);
        assert!(mutated.additional[2].is_type(Type::A));
    }

    #[test]
    fn authority_additional_uses_the_query_name() {
        let mut rng = rng();
        let response = Message::response("www.example.com", "A", "192.0.2.1");
        let mutated = AuthorityAdditionalRecords.apply(&response, &mut rng);
        assert_eq!(mutated.answers.len(), 2);
        assert_eq!(mutated.answers[1].name, "www.example.com");
        assert!(mutated
            .authorities
            .iter()
            .all(|r| r.is_type(Type::NS) && r.name == "example.com"));
        assert!(mutated
            .additional
            .iter()
            .all(|r| r.name.starts_with("ns") && r.name.ends_with(".example.com")));
    }
}
