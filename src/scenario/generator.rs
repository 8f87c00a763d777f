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

//! The scenario generator.

use rand::Rng;

use super::{AuthorityAdditional, ScenarioParams, ScenarioType};
use crate::rr::{Record, Type};
use crate::strategy::catalog::GENERATOR_TLDS;
use crate::strategy::helpers::{pick, random_ipv6, random_string};

const REFRESH_VALUES: [u32; 4] = [3600, 7200, 14400, 28800];
const RETRY_VALUES: [u32; 3] = [1800, 3600, 7200];
const EXPIRE_VALUES: [u32; 3] = [604800, 1209600, 2419200];
const MINIMUM_VALUES: [u32; 3] = [300, 600, 3600];

/// Generates the records of a [`ScenarioType`].
///
/// The generator holds no state; every call draws everything it needs
/// from the generator passed in. Generated names are absolute, made of
/// 3 to 8 character lowercase alphanumeric labels under a
/// generic TLD, and generated IPv4 addresses avoid 0 and 255 in every
/// octet.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogicalRecordGenerator;

impl LogicalRecordGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates a scenario with every choice left random.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, ty: ScenarioType) -> Vec<Record> {
        self.generate_with(rng, ty, &ScenarioParams::default())
    }

    /// Generates a scenario, taking the overrides in `params` into
    /// account. The three sections of an authority/additional scenario
    /// are concatenated.
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ty: ScenarioType,
        params: &ScenarioParams,
    ) -> Vec<Record> {
        let zone = params.zone.as_deref();
        match ty {
            ScenarioType::NsWithGlue => self.ns_with_glue(rng, zone),
            ScenarioType::CnameChain => self.cname_chain(rng, params.chain_length, false),
            ScenarioType::CnameLoop => self.cname_chain(rng, params.chain_length, true),
            ScenarioType::AuthorityAdditional => self
                .authority_additional(rng, params.query_name.as_deref())
                .into_records(),
            ScenarioType::ZoneStructure => self.zone_structure(rng, zone),
            ScenarioType::Delegation => self.delegation(rng, zone),
            ScenarioType::WildcardRecords => self.wildcard(rng, zone),
        }
    }

    /// Generates 2 to 4 NS records for `zone`, each naming an in-zone
    /// server `nsN.<zone>` followed by its A glue record and, half the
    /// time, an AAAA glue record.
    pub fn ns_with_glue<R: Rng + ?Sized>(&self, rng: &mut R, zone: Option<&str>) -> Vec<Record> {
        let zone = self.zone_or_random(rng, zone);
        let mut records = Vec::new();
        let count = rng.gen_range(2..=4);
        for i in 1..=count {
            let server = format!("ns{i}.{zone}");
            records.push(Record::internet(
                zone.clone(),
                Type::NS,
                rng.gen_range(3600..=86400),
                server.clone(),
            ));
            records.push(Record::internet(
                server.clone(),
                Type::A,
                rng.gen_range(3600..=86400),
                self.ipv4(rng),
            ));
            if rng.gen() {
                records.push(Record::internet(
                    server,
                    Type::AAAA,
                    rng.gen_range(3600..=86400),
                    random_ipv6(rng),
                ));
            }
        }
        records
    }

    /// Generates a CNAME chain over `length` names (2 to 5 if not
    /// given; never fewer than 2). The chain ends in an A record, or,
    /// if `create_loop` is set, its last CNAME points at the first
    /// name.
    pub fn cname_chain<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        length: Option<usize>,
        create_loop: bool,
    ) -> Vec<Record> {
        let length = match length {
            Some(length) => length.max(2),
            None => rng.gen_range(2..=5),
        };
        let names: Vec<String> = (0..length)
            .map(|i| {
                let domain = self.domain_name(rng, 2);
                if i == 0 {
                    format!("alias1.{domain}")
                } else {
                    format!("target{i}.{domain}")
                }
            })
            .collect();

        let mut records = Vec::with_capacity(length);
        for (i, pair) in names.windows(2).enumerate() {
            let target = if create_loop && i == length - 2 {
                &names[0]
            } else {
                &pair[1]
            };
            records.push(Record::internet(
                pair[0].clone(),
                Type::CNAME,
                rng.gen_range(300..=3600),
                target.clone(),
            ));
        }
        if !create_loop {
            records.push(Record::internet(
                names[length - 1].clone(),
                Type::A,
                rng.gen_range(300..=3600),
                self.ipv4(rng),
            ));
        }
        records
    }

    /// Generates a referral-style response for `query_name`: an A
    /// answer, 2 to 4 NS records for the zone formed by its last two
    /// labels, and A (plus, half the time, AAAA) records for each NS
    /// target.
    pub fn authority_additional<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        query_name: Option<&str>,
    ) -> AuthorityAdditional {
        let query_name = match query_name {
            Some(name) => name.to_owned(),
            None => self.domain_name(rng, 3),
        };
        let zone = enclosing_zone(&query_name);

        let mut result = AuthorityAdditional::default();
        result.answers.push(Record::internet(
            query_name.clone(),
            Type::A,
            rng.gen_range(300..=3600),
            self.ipv4(rng),
        ));

        let count = rng.gen_range(2..=4);
        let servers: Vec<String> = (1..=count).map(|i| format!("ns{i}.{zone}")).collect();
        for server in &servers {
            result.authorities.push(Record::internet(
                zone.clone(),
                Type::NS,
                rng.gen_range(3600..=86400),
                server.clone(),
            ));
        }
        for server in servers {
            result.additional.push(Record::internet(
                server.clone(),
                Type::A,
                rng.gen_range(3600..=86400),
                self.ipv4(rng),
            ));
            if rng.gen() {
                result.additional.push(Record::internet(
                    server,
                    Type::AAAA,
                    rng.gen_range(3600..=86400),
                    random_ipv6(rng),
                ));
            }
        }
        result
    }

    /// Generates a whole zone: the SOA record, NS records with glue, 3
    /// to 8 A records (the first at the apex), and 1 to 3 MX records,
    /// each followed by an A record for its exchange.
    pub fn zone_structure<R: Rng + ?Sized>(&self, rng: &mut R, zone: Option<&str>) -> Vec<Record> {
        let zone = self.zone_or_random(rng, zone);
        let mut records = Vec::new();

        let serial = rng.gen_range(2020010101u32..=2024123199);
        let refresh = pick(rng, &REFRESH_VALUES).unwrap_or(REFRESH_VALUES[0]);
        let retry = pick(rng, &RETRY_VALUES).unwrap_or(RETRY_VALUES[0]);
        let expire = pick(rng, &EXPIRE_VALUES).unwrap_or(EXPIRE_VALUES[0]);
        let minimum = pick(rng, &MINIMUM_VALUES).unwrap_or(MINIMUM_VALUES[0]);
        records.push(Record::internet(
            zone.clone(),
            Type::SOA,
            rng.gen_range(3600..=86400),
            format!("ns1.{zone} admin.{zone} {serial} {refresh} {retry} {expire} {minimum}"),
        ));

        records.extend(self.ns_with_glue(rng, Some(&zone)));

        let count = rng.gen_range(3..=8);
        for i in 0..count {
            let name = if i == 0 {
                zone.clone()
            } else {
                let length = rng.gen_range(3..=10);
                format!("{}.{zone}", random_string(rng, length))
            };
            records.push(Record::internet(
                name,
                Type::A,
                rng.gen_range(300..=3600),
                self.ipv4(rng),
            ));
        }

        let count = rng.gen_range(1..=3);
        for i in 1..=count {
            let exchange = format!("mail{i}.{zone}");
            records.push(Record::internet(
                zone.clone(),
                Type::MX,
                rng.gen_range(3600..=86400),
                format!("{} {exchange}", i * 10),
            ));
            records.push(Record::internet(
                exchange,
                Type::A,
                rng.gen_range(300..=3600),
                self.ipv4(rng),
            ));
        }
        records
    }

    /// Generates a delegation of a child zone `<label>.<parent>`: NS
    /// records with glue for the child.
    pub fn delegation<R: Rng + ?Sized>(&self, rng: &mut R, parent: Option<&str>) -> Vec<Record> {
        let parent = self.zone_or_random(rng, parent);
        let length = rng.gen_range(3..=8);
        let child = format!("{}.{parent}", random_string(rng, length));
        self.ns_with_glue(rng, Some(&child))
    }

    /// Generates a wildcard A record `*.<zone>` followed by A records
    /// for `www`, `mail`, and `ftp` under the same zone.
    pub fn wildcard<R: Rng + ?Sized>(&self, rng: &mut R, zone: Option<&str>) -> Vec<Record> {
        let zone = self.zone_or_random(rng, zone);
        ["*", "www", "mail", "ftp"]
            .into_iter()
            .map(|label| {
                Record::internet(
                    format!("{label}.{zone}"),
                    Type::A,
                    rng.gen_range(300..=3600),
                    self.ipv4(rng),
                )
            })
            .collect()
    }

    ////////////////////////////////////////////////////////////////////
    // PRIVATE HELPERS                                                //
    ////////////////////////////////////////////////////////////////////

    fn zone_or_random<R: Rng + ?Sized>(&self, rng: &mut R, zone: Option<&str>) -> String {
        match zone {
            Some(zone) => zone.to_owned(),
            None => self.domain_name(rng, 2),
        }
    }

    /// Generates an absolute name of 1 to `max_labels` random labels
    /// under a generic TLD.
    fn domain_name<R: Rng + ?Sized>(&self, rng: &mut R, max_labels: usize) -> String {
        let count = rng.gen_range(1..=max_labels.max(1));
        let mut labels: Vec<String> = (0..count)
            .map(|_| {
                let length = rng.gen_range(3..=8);
                random_string(rng, length)
            })
            .collect();
        labels.push(pick(rng, GENERATOR_TLDS).unwrap_or("com").to_owned());
        format!("{}.", labels.join("."))
    }

    fn ipv4<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let octets: Vec<String> = (0..4).map(|_| rng.gen_range(1..=254u8).to_string()).collect();
        octets.join(".")
    }
}

/// Returns the zone formed by the last two labels of `name`, keeping a
/// trailing dot. Names with fewer labels are their own zone.
fn enclosing_zone(name: &str) -> String {
    let (relative, dot) = match name.strip_suffix('.') {
        Some(relative) => (relative, "."),
        None => (name, ""),
    };
    let labels: Vec<&str> = relative.split('.').collect();
    if labels.len() >= 2 {
        format!("{}{dot}", labels[labels.len() - 2..].join("."))
    } else {
        name.to_owned()
    }
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

    fn of_type(records: &[Record], rr_type: Type) -> Vec<&Record> {
        records.iter().filter(|r| r.is_type(rr_type)).collect()
    }

    fn is_generated_ipv4(text: &str) -> bool {
        let octets: Vec<&str> = text.split('.').collect();
        octets.len() == 4
            && octets
                .iter()
                .all(|o| matches!(o.parse::<u8>(), Ok(v) if (1..=254).contains(&v)))
    }

    #[test]
    fn every_ns_record_has_glue() {
        let generator = LogicalRecordGenerator::new();
        for seed in 0..50 {
            let records =
                generator.generate(&mut StdRng::seed_from_u64(seed), ScenarioType::NsWithGlue);
            let ns = of_type(&records, Type::NS);
            assert!((2..=4).contains(&ns.len()));
            let zone = &ns[0].name;
            assert!(zone.ends_with('.'));
            for record in &ns {
                assert_eq!(&record.name, zone);
                assert!((3600..=86400).contains(&record.ttl));
                assert!(records.iter().any(|r| r.is_type(Type::A)
                    && r.name == record.rdata
                    && is_generated_ipv4(&r.rdata)));
            }
            for aaaa in of_type(&records, Type::AAAA) {
                assert!(ns.iter().any(|r| r.rdata == aaaa.name));
            }
        }
    }

    #[test]
    fn cname_chains_link_up() {
        let generator = LogicalRecordGenerator::new();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let records = generator.cname_chain(&mut rng, None, false);
            let cnames = of_type(&records, Type::CNAME);
            assert!((1..=4).contains(&cnames.len()));
            assert!(cnames[0].name.starts_with("alias1."));
            for pair in cnames.windows(2) {
                assert_eq!(pair[0].rdata, pair[1].name);
            }
            let last = records.last().unwrap();
            assert!(last.is_type(Type::A));
            assert_eq!(last.name, cnames[cnames.len() - 1].rdata);
            assert!(records.iter().all(|r| (300..=3600).contains(&r.ttl)));
        }
    }

    #[test]
    fn cname_loops_close() {
        let generator = LogicalRecordGenerator::new();
        let mut rng = StdRng::seed_from_u64(4);
        let records = generator.generate_with(
            &mut rng,
            ScenarioType::CnameLoop,
            &ScenarioParams::with_chain_length(4),
        );
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.is_type(Type::CNAME)));
        assert_eq!(records[2].rdata, records[0].name);
        assert!(records[1].name.starts_with("target1."));

        // A loop needs at least two names.
        let records = generator.cname_chain(&mut rng, Some(1), true);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, records[0].rdata);
    }

    #[test]
    fn authority_additional_is_a_referral() {
        let generator = LogicalRecordGenerator::new();
        let mut rng = StdRng::seed_from_u64(5);
        let split = generator.authority_additional(&mut rng, Some("www.example.com."));
        assert_eq!(split.answers.len(), 1);
        assert_eq!(split.answers[0].name, "www.example.com.");
        assert!((2..=4).contains(&split.authorities.len()));
        for (i, ns) in split.authorities.iter().enumerate() {
            assert_eq!(ns.name, "example.com.");
            assert_eq!(ns.rdata, format!("ns{}.example.com.", i + 1));
            assert!(split
                .additional
                .iter()
                .any(|r| r.is_type(Type::A) && r.name == ns.rdata));
        }
    }

    #[test]
    fn enclosing_zones() {
        assert_eq!(enclosing_zone("a.b.example.com."), "example.com.");
        assert_eq!(enclosing_zone("a.b.example.com"), "example.com");
        assert_eq!(enclosing_zone("example.com"), "example.com");
        assert_eq!(enclosing_zone("localhost"), "localhost");
    }

    #[test]
    fn zone_structure_is_complete() {
        let generator = LogicalRecordGenerator::new();
        let mut rng = StdRng::seed_from_u64(6);
        let records = generator.zone_structure(&mut rng, Some("example.org."));
        assert!(records[0].is_type(Type::SOA));
        let soa: Vec<&str> = records[0].rdata.split(' ').collect();
        assert_eq!(soa[0], "ns1.example.org.");
        assert_eq!(soa[1], "admin.example.org.");
        let serial: u32 = soa[2].parse().unwrap();
        assert!((2020010101..=2024123199).contains(&serial));
        assert!(REFRESH_VALUES.contains(&soa[3].parse().unwrap()));
        assert!(MINIMUM_VALUES.contains(&soa[6].parse().unwrap()));

        assert!((2..=4).contains(&of_type(&records, Type::NS).len()));
        let mx = of_type(&records, Type::MX);
        assert!((1..=3).contains(&mx.len()));
        for (i, record) in mx.iter().enumerate() {
            let exchange = format!("mail{}.example.org.", i + 1);
            assert_eq!(record.rdata, format!("{} {exchange}", (i + 1) * 10));
            assert!(records.iter().any(|r| r.is_type(Type::A) && r.name == exchange));
        }
        assert!(records
            .iter()
            .any(|r| r.is_type(Type::A) && r.name == "example.org."));
    }

    #[test]
    fn delegations_are_below_the_parent() {
        let generator = LogicalRecordGenerator::new();
        let mut rng = StdRng::seed_from_u64(8);
        let records = generator.generate_with(
            &mut rng,
            ScenarioType::Delegation,
            &ScenarioParams::with_zone("example.net."),
        );
        let owners: HashSet<&str> = of_type(&records, Type::NS)
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(owners.len(), 1);
        let child = owners.into_iter().next().unwrap();
        assert!(child.ends_with(".example.net."));
        assert_ne!(child, "example.net.");
    }

    #[test]
    fn wildcards_come_with_overrides() {
        let generator = LogicalRecordGenerator::new();
        let records = generator.wildcard(&mut StdRng::seed_from_u64(9), Some("example.com."));
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["*.example.com.", "www.example.com.", "mail.example.com.", "ftp.example.com."]
        );
        assert!(records.iter().all(|r| r.is_type(Type::A) && is_generated_ipv4(&r.rdata)));
    }

    #[test]
    fn generation_is_reproducible() {
        let generator = LogicalRecordGenerator::new();
        for ty in ScenarioType::ALL {
            let first = generator.generate(&mut StdRng::seed_from_u64(11), ty);
            let second = generator.generate(&mut StdRng::seed_from_u64(11), ty);
            assert_eq!(first, second, "{ty}");
        }
    }
}
