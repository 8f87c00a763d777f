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

//! Generation of logically related groups of records.
//!
//! A *scenario* is a recipe for records that hang together the way
//! they would in a real zone: NS records with glue, CNAME chains,
//! referral-style authority and additional sections, and so on. The
//! records are realistic in structure but use random names and
//! addresses, so strategies can drop them into messages where they do
//! not belong.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::rr::Record;
use crate::util::Caseless;

mod generator;

pub use generator::LogicalRecordGenerator;

////////////////////////////////////////////////////////////////////////
// SCENARIO TYPES                                                     //
////////////////////////////////////////////////////////////////////////

/// The kinds of scenario that [`LogicalRecordGenerator`] can produce.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScenarioType {
    /// 2 to 4 NS records for a zone, each with in-zone glue.
    NsWithGlue,

    /// A chain of 2 to 5 CNAME records ending in an A record.
    CnameChain,

    /// A chain of CNAME records whose last link points at the first.
    CnameLoop,

    /// An answer, NS records for its zone, and addresses for the NS
    /// targets.
    AuthorityAdditional,

    /// A zone: SOA, NS with glue, A records, and MX records with
    /// addresses for their exchanges.
    ZoneStructure,

    /// A child zone delegated with NS records and glue.
    Delegation,

    /// A wildcard A record and specific records beneath the same zone.
    WildcardRecords,
}

impl ScenarioType {
    pub const ALL: [Self; 7] = [
        Self::NsWithGlue,
        Self::CnameChain,
        Self::CnameLoop,
        Self::AuthorityAdditional,
        Self::ZoneStructure,
        Self::Delegation,
        Self::WildcardRecords,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::NsWithGlue => "ns_with_glue",
            Self::CnameChain => "cname_chain",
            Self::CnameLoop => "cname_loop",
            Self::AuthorityAdditional => "authority_additional",
            Self::ZoneStructure => "zone_structure",
            Self::Delegation => "delegation",
            Self::WildcardRecords => "wildcard_records",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioType {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| Caseless(ty.name()) == Caseless(text))
            .ok_or("unknown scenario type")
    }
}

////////////////////////////////////////////////////////////////////////
// PARAMETERS AND RESULTS                                             //
////////////////////////////////////////////////////////////////////////

/// Overrides for the random choices a scenario makes. Fields left as
/// [`None`] are generated.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScenarioParams {
    /// The zone for NS, zone-structure, and wildcard scenarios, and the
    /// parent zone for delegations.
    pub zone: Option<String>,

    /// The query name that an authority/additional scenario answers.
    pub query_name: Option<String>,

    /// The number of names in a CNAME chain or loop.
    pub chain_length: Option<usize>,
}

impl ScenarioParams {
    pub fn with_zone(zone: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
            ..Default::default()
        }
    }

    pub fn with_query_name(query_name: impl Into<String>) -> Self {
        Self {
            query_name: Some(query_name.into()),
            ..Default::default()
        }
    }

    pub fn with_chain_length(chain_length: usize) -> Self {
        Self {
            chain_length: Some(chain_length),
            ..Default::default()
        }
    }
}

/// The records of an authority/additional scenario, split by the
/// section they belong in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AuthorityAdditional {
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additional: Vec<Record>,
}

impl AuthorityAdditional {
    /// Concatenates the three sections in wire order.
    pub fn into_records(self) -> Vec<Record> {
        let mut records = self.answers;
        records.extend(self.authorities);
        records.extend(self.additional);
        records
    }
}

////////////////////////////////////////////////////////////////////////
// CATALOG                                                            //
////////////////////////////////////////////////////////////////////////

/// Enumerates the scenario types and dispatches to a
/// [`LogicalRecordGenerator`].
#[derive(Debug, Default)]
pub struct ScenarioCatalog {
    generator: LogicalRecordGenerator,
}

impl ScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every scenario type.
    pub fn types(&self) -> &'static [ScenarioType] {
        &ScenarioType::ALL
    }

    /// Returns a one-line description of a scenario type.
    pub fn describe(&self, ty: ScenarioType) -> &'static str {
        match ty {
            ScenarioType::NsWithGlue => "NS records with corresponding glue records",
            ScenarioType::CnameChain => "CNAME chain terminated by an A record",
            ScenarioType::CnameLoop => "CNAME chain that loops back to its start",
            ScenarioType::AuthorityAdditional => {
                "answer with NS authority records and their addresses"
            }
            ScenarioType::ZoneStructure => "complete zone with SOA, NS, A, and MX records",
            ScenarioType::Delegation => "child zone delegated with NS records and glue",
            ScenarioType::WildcardRecords => "wildcard A record with specific overrides",
        }
    }

    /// Picks a scenario type uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> ScenarioType {
        ScenarioType::ALL[rng.gen_range(0..ScenarioType::ALL.len())]
    }

    /// Generates the records of one scenario.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ty: ScenarioType,
        params: &ScenarioParams,
    ) -> Vec<Record> {
        self.generator.generate_with(rng, ty, params)
    }

    /// Generates the records of a randomly picked scenario.
    pub fn generate_random<R: Rng + ?Sized>(&self, rng: &mut R) -> (ScenarioType, Vec<Record>) {
        let ty = self.pick(rng);
        (ty, self.generator.generate(rng, ty))
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

    #[test]
    fn scenario_names_round_trip() {
        for ty in ScenarioType::ALL {
            assert_eq!(ty.to_string().parse::<ScenarioType>(), Ok(ty));
        }
        assert_eq!("NS_WITH_GLUE".parse::<ScenarioType>(), Ok(ScenarioType::NsWithGlue));
        assert!("ns-with-glue".parse::<ScenarioType>().is_err());
    }

    #[test]
    fn catalog_covers_every_type() {
        let catalog = ScenarioCatalog::new();
        assert_eq!(catalog.types().len(), 7);
        for &ty in catalog.types() {
            assert!(!catalog.describe(ty).is_empty());
        }
    }

    #[test]
    fn catalog_generation_is_reproducible() {
        let catalog = ScenarioCatalog::new();
        let first = catalog.generate_random(&mut StdRng::seed_from_u64(7));
        let second = catalog.generate_random(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
        assert!(!first.1.is_empty());
    }

    #[test]
    fn authority_additional_flattens_in_wire_order() {
        let split = LogicalRecordGenerator::new()
            .authority_additional(&mut StdRng::seed_from_u64(1), Some("www.example.com."));
        let (answers, authorities) = (split.answers.len(), split.authorities.len());
        let records = split.clone().into_records();
        assert_eq!(records[0], split.answers[0]);
        assert_eq!(records[answers], split.authorities[0]);
        assert_eq!(records[answers + authorities], split.additional[0]);
    }
}
