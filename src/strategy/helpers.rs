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

//! Free-standing random-generation and field-mutation helpers.
//!
//! Every function takes the random number generator explicitly, so
//! output is reproducible from the generator's seed. They are generic
//! over `R: Rng + ?Sized` and so accept the `&mut dyn RngCore` handed
//! to [`Strategy::apply`](super::Strategy::apply) as well as concrete
//! generators.

use std::fmt;

use rand::distributions::WeightedIndex;
use rand::seq::SliceRandom;
use rand::Rng;

use super::catalog::{CLASSES, RECORD_TYPES};
use crate::rr::{Record, Type};
use crate::scenario::{LogicalRecordGenerator, ScenarioType};

pub const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const LOWERCASE_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Fixed labels for [`random_domain_name`], keyed by level. Level 0 is
/// the rightmost (top-level) label.
pub type Levels<'a> = &'a [(usize, &'a str)];

/// The default levels, which put generated names under `example.com`.
pub const DEFAULT_LEVELS: Levels<'static> = &[(0, "com"), (1, "example")];

////////////////////////////////////////////////////////////////////////
// GENERATORS                                                         //
////////////////////////////////////////////////////////////////////////

/// Picks a uniformly random element of `items`.
pub fn pick<T: Clone, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> Option<T> {
    items.choose(rng).cloned()
}

/// Generates a random string of `length` characters drawn from
/// `charset`.
pub fn random_string_from<R: Rng + ?Sized>(rng: &mut R, length: usize, charset: &[u8]) -> String {
    if charset.is_empty() {
        return String::new();
    }
    (0..length)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Generates a random lowercase alphanumeric string of `length`
/// characters.
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    random_string_from(rng, length, LOWERCASE_ALPHANUMERIC)
}

/// Generates a random lowercase alphanumeric string of 1 to 20
/// characters.
pub fn random_text<R: Rng + ?Sized>(rng: &mut R) -> String {
    let length = rng.gen_range(1..=20);
    random_string(rng, length)
}

/// Generates an absolute domain name of 1 to `max_labels` labels.
///
/// Labels at the levels named in `levels` are fixed; the rest are 1 to
/// 10 random lowercase letters. So with [`DEFAULT_LEVELS`] the result is
/// `com.`, `example.com.`, or some random labels under `example.com.`.
pub fn random_domain_name<R: Rng + ?Sized>(
    rng: &mut R,
    max_labels: usize,
    levels: Levels,
) -> String {
    let count = rng.gen_range(1..=max_labels.max(1));
    let mut labels = Vec::with_capacity(count);
    for level in 0..count {
        match levels.iter().find(|(l, _)| *l == level) {
            Some((_, fixed)) => labels.push((*fixed).to_owned()),
            None => {
                let length = rng.gen_range(1..=10);
                labels.push(random_string_from(rng, length, LOWERCASE));
            }
        }
    }
    labels.reverse();
    let mut name = labels.join(".");
    if !name.ends_with('.') {
        name.push('.');
    }
    name
}

/// Generates a random IPv4 address in dotted-quad form. Any octet
/// value is possible.
pub fn random_ipv4<R: Rng + ?Sized>(rng: &mut R) -> String {
    let octets: [u8; 4] = rng.gen();
    format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
}

/// Generates a random IPv6 address as eight uncompressed groups.
pub fn random_ipv6<R: Rng + ?Sized>(rng: &mut R) -> String {
    let groups: Vec<String> = (0..8)
        .map(|_| format!("{:04x}", rng.gen::<u16>()))
        .collect();
    groups.join(":")
}

/// Generates rdata in presentation format appropriate for `rr_type`.
/// Types without a dedicated generator get a random string.
pub fn random_rdata<R: Rng + ?Sized>(rng: &mut R, rr_type: Type) -> String {
    match rr_type {
        Type::A => random_ipv4(rng),
        Type::AAAA => random_ipv6(rng),
        Type::CNAME | Type::NS | Type::PTR => random_domain_name(rng, 5, DEFAULT_LEVELS),
        Type::MX => {
            let preference = rng.gen_range(0..=100);
            let exchange = random_domain_name(rng, 5, DEFAULT_LEVELS);
            format!("{preference} {exchange}")
        }
        Type::TXT => {
            let length = rng.gen_range(1..=50);
            format!("\"{}\"", random_string(rng, length))
        }
        Type::SOA => {
            let mname = random_domain_name(rng, 5, DEFAULT_LEVELS);
            let rname = random_domain_name(rng, 5, DEFAULT_LEVELS);
            let serial = rng.gen_range(1..=2147483647u32);
            let refresh = rng.gen_range(3600..=86400);
            let retry = rng.gen_range(1800..=7200);
            let expire = rng.gen_range(604800..=2419200);
            let minimum = rng.gen_range(300..=86400);
            format!("{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}")
        }
        _ => random_text(rng),
    }
}

/// Generates a class-IN record of a type drawn from `types` (or from
/// [`RECORD_TYPES`] if `types` is empty), with a random owner, a TTL of
/// up to one day, and type-appropriate rdata.
pub fn random_record<R: Rng + ?Sized>(rng: &mut R, types: &[Type]) -> Record {
    let types = if types.is_empty() { RECORD_TYPES } else { types };
    let rr_type = pick(rng, types).unwrap_or(Type::A);
    let name = random_domain_name(rng, 5, DEFAULT_LEVELS);
    let ttl = rng.gen_range(0..=86400);
    let rdata = random_rdata(rng, rr_type);
    Record::internet(name, rr_type, ttl, rdata)
}

/// Generates `count` random records.
///
/// If `scenario_probability` is given, then with that probability the
/// records instead come from a random logical scenario (cut to `count`,
/// or padded with random records). Otherwise in-zone NS records get
/// glue, and CNAME and MX records may get an address record for their
/// target; these extra records precede the record they support.
///
/// The built-in strategies don't call this; it is here for custom
/// [`Strategy`](super::Strategy) implementations.
pub fn random_records<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    types: &[Type],
    scenario_probability: Option<f64>,
) -> Vec<Record> {
    let mut records = Vec::new();

    if let Some(probability) = scenario_probability {
        if rng.gen::<f64>() < probability {
            let scenario = pick(rng, &ScenarioType::ALL).unwrap_or(ScenarioType::NsWithGlue);
            let generated = LogicalRecordGenerator::new().generate(rng, scenario);
            if !generated.is_empty() {
                records.extend(generated.into_iter().take(count));
                while records.len() < count {
                    records.push(random_record(rng, types));
                }
                return records;
            }
        }
    }

    for _ in 0..count {
        let record = random_record(rng, types);
        if record.is_type(Type::NS) {
            let target = &record.rdata;
            if target == &record.name || target.ends_with(&format!(".{}", record.name)) {
                records.push(Record::internet(
                    target.clone(),
                    Type::A,
                    record.ttl,
                    random_ipv4(rng),
                ));
                if rng.gen() {
                    records.push(Record::internet(
                        target.clone(),
                        Type::AAAA,
                        record.ttl,
                        random_ipv6(rng),
                    ));
                }
            }
        } else if record.is_type(Type::CNAME) {
            if rng.gen() {
                records.push(Record::internet(
                    record.rdata.clone(),
                    Type::A,
                    record.ttl,
                    random_ipv4(rng),
                ));
            }
        } else if record.is_type(Type::MX) {
            if let Some((_, exchange)) = record.rdata.split_once(' ') {
                if rng.gen() {
                    records.push(Record::internet(
                        exchange,
                        Type::A,
                        record.ttl,
                        random_ipv4(rng),
                    ));
                }
            }
        }
        records.push(record);
    }
    records
}

////////////////////////////////////////////////////////////////////////
// FIELD MUTATORS                                                     //
////////////////////////////////////////////////////////////////////////

/// Generates a `FromStr`/`Display` pair and an `ALL` list for an enum
/// of named mutation kinds.
macro_rules! named_kinds {
    ($(#[$meta:meta])* $kind:ident { $($variant:ident => $name:literal,)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum $kind {
            $($variant,)*
        }

        impl $kind {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }

        impl ::std::fmt::Display for $kind {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl ::std::str::FromStr for $kind {
            type Err = &'static str;

            fn from_str(text: &str) -> ::std::result::Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|kind| kind.name() == text)
                    .ok_or(concat!("unknown ", stringify!($kind)))
            }
        }
    };
}

pub(crate) use named_kinds;

named_kinds! {
    /// A way of mutating a string field.
    StringMutation {
        Replace => "replace",
        Append => "append",
        Prepend => "prepend",
        Truncate => "truncate",
        Case => "case",
    }
}

named_kinds! {
    /// A way of mutating a numeric field.
    NumericMutation {
        Random => "random",
        Boundary => "boundary",
        Increment => "increment",
        Decrement => "decrement",
        BitFlip => "bit_flip",
    }
}

named_kinds! {
    /// A way of mutating a list field.
    ListMutation {
        Add => "add",
        Remove => "remove",
        Modify => "modify",
        Shuffle => "shuffle",
        Duplicate => "duplicate",
    }
}

/// Applies one mutation, drawn from `kinds`, to a string.
pub fn mutate_string_field<R: Rng + ?Sized>(
    rng: &mut R,
    value: &str,
    kinds: &[StringMutation],
) -> String {
    let length = value.chars().count();
    match pick(rng, kinds) {
        Some(StringMutation::Replace) => random_string(rng, length),
        Some(StringMutation::Append) => {
            let suffix_length = rng.gen_range(1..=10);
            format!("{value}{}", random_string(rng, suffix_length))
        }
        Some(StringMutation::Prepend) => {
            let prefix_length = rng.gen_range(1..=10);
            format!("{}{value}", random_string(rng, prefix_length))
        }
        Some(StringMutation::Truncate) if length > 1 => {
            let new_length = rng.gen_range(1..length);
            value.chars().take(new_length).collect()
        }
        Some(StringMutation::Case) => {
            if rng.gen() {
                value.to_uppercase()
            } else {
                value.to_lowercase()
            }
        }
        _ => value.to_owned(),
    }
}

/// Applies one mutation, drawn from `kinds`, to a number. The result
/// is clamped to `min..=max`.
pub fn mutate_numeric_field<R: Rng + ?Sized>(
    rng: &mut R,
    value: i64,
    min: i64,
    max: i64,
    kinds: &[NumericMutation],
) -> i64 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let mutated = match pick(rng, kinds) {
        Some(NumericMutation::Random) => rng.gen_range(min..=max),
        Some(NumericMutation::Boundary) => {
            let boundaries: Vec<i64> = [
                Some(min),
                Some(max),
                min.checked_add(1),
                max.checked_sub(1),
            ]
            .into_iter()
            .flatten()
            .filter(|b| (min..=max).contains(b))
            .collect();
            pick(rng, &boundaries).unwrap_or(min)
        }
        Some(NumericMutation::Increment) => value.saturating_add(rng.gen_range(1..=100)),
        Some(NumericMutation::Decrement) => value.saturating_sub(rng.gen_range(1..=100)),
        Some(NumericMutation::BitFlip) => value ^ (1 << rng.gen_range(0..16)),
        None => value,
    };
    mutated.clamp(min, max)
}

/// Applies one mutation, drawn from `kinds`, to a list, returning the
/// new list. `generator` produces items for the `add` and `modify`
/// kinds; without it those kinds leave the list alone. An empty list
/// can only be added to.
///
/// The built-in strategies don't call this; it is here for custom
/// [`Strategy`](super::Strategy) implementations.
pub fn mutate_list_field<T, R, G>(
    rng: &mut R,
    items: &[T],
    mut generator: Option<G>,
    kinds: &[ListMutation],
) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
    G: FnMut(&mut R) -> T,
{
    let mut list = items.to_vec();
    if list.is_empty() && generator.is_none() {
        return list;
    }
    let kinds = if list.is_empty() {
        &[ListMutation::Add][..]
    } else {
        kinds
    };

    match (pick(rng, kinds), generator.as_mut()) {
        (Some(ListMutation::Add), Some(generator)) => {
            let item = generator(rng);
            let position = rng.gen_range(0..=list.len());
            list.insert(position, item);
        }
        (Some(ListMutation::Remove), _) if !list.is_empty() => {
            let index = rng.gen_range(0..list.len());
            list.remove(index);
        }
        (Some(ListMutation::Modify), Some(generator)) if !list.is_empty() => {
            let index = rng.gen_range(0..list.len());
            list[index] = generator(rng);
        }
        (Some(ListMutation::Shuffle), _) if list.len() > 1 => list.shuffle(rng),
        (Some(ListMutation::Duplicate), _) if !list.is_empty() => {
            let index = rng.gen_range(0..list.len());
            let item = list[index].clone();
            let position = rng.gen_range(0..=list.len());
            list.insert(position, item);
        }
        _ => (),
    }
    list
}

/// A field of a [`Record`] that [`mutate_record`] can change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum RecordField {
    Name,
    Type,
    Class,
    Ttl,
    Rdata,
}

const RECORD_FIELD_WEIGHTS: [(RecordField, u32); 5] = [
    (RecordField::Name, 3),
    (RecordField::Type, 2),
    (RecordField::Class, 1),
    (RecordField::Ttl, 2),
    (RecordField::Rdata, 4),
];

/// Returns a copy of `record` with 1 to 3 fields changed.
///
/// Fields are drawn with replacement, weighted towards the rdata and
/// owner name. New rdata is generated for the record's original type.
///
/// The built-in strategies don't call this; it is here for custom
/// [`Strategy`](super::Strategy) implementations.
pub fn mutate_record<R: Rng + ?Sized>(rng: &mut R, record: &Record) -> Record {
    let mut mutated = record.clone();
    let distribution = match WeightedIndex::new(RECORD_FIELD_WEIGHTS.iter().map(|(_, w)| *w)) {
        Ok(distribution) => distribution,
        Err(_) => return mutated,
    };
    let count = rng.gen_range(1..=3);
    for _ in 0..count {
        match RECORD_FIELD_WEIGHTS[rng.sample(&distribution)].0 {
            RecordField::Name => {
                mutated.name = mutate_string_field(
                    rng,
                    &record.name,
                    &[
                        StringMutation::Replace,
                        StringMutation::Append,
                        StringMutation::Prepend,
                    ],
                );
            }
            RecordField::Type => {
                if let Some(rr_type) = pick(rng, RECORD_TYPES) {
                    mutated.rr_type = rr_type.to_string();
                }
            }
            RecordField::Class => {
                if let Some(class) = pick(rng, CLASSES) {
                    mutated.class = class.to_owned();
                }
            }
            RecordField::Ttl => {
                mutated.ttl =
                    mutate_numeric_field(rng, record.ttl, 0, 2147483647, NumericMutation::ALL);
            }
            RecordField::Rdata => {
                mutated.rdata = match record.parsed_type() {
                    Some(rr_type) => random_rdata(rng, rr_type),
                    None => random_text(rng),
                };
            }
        }
    }
    mutated
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(114514)
    }

    #[test]
    fn strings_use_the_requested_charset() {
        let mut rng = rng();
        let text = random_string_from(&mut rng, 64, b"xy");
        assert_eq!(text.len(), 64);
        assert!(text.chars().all(|c| c == 'x' || c == 'y'));
        for _ in 0..100 {
            let text = random_text(&mut rng);
            assert!((1..=20).contains(&text.len()));
            assert!(text.bytes().all(|b| LOWERCASE_ALPHANUMERIC.contains(&b)));
        }
    }

    #[test]
    fn domain_names_honor_levels_from_the_right() {
        let mut rng = rng();
        for _ in 0..100 {
            let name = random_domain_name(&mut rng, 5, DEFAULT_LEVELS);
            assert!(name.ends_with('.'));
            let labels: Vec<&str> = name.trim_end_matches('.').split('.').collect();
            assert!((1..=5).contains(&labels.len()));
            assert_eq!(labels[labels.len() - 1], "com");
            if labels.len() >= 2 {
                assert_eq!(labels[labels.len() - 2], "example");
            }
        }
        let name = random_domain_name(&mut rng, 1, &[]);
        assert!(name.trim_end_matches('.').bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn addresses_parse() {
        let mut rng = rng();
        for _ in 0..50 {
            assert!(random_ipv4(&mut rng).parse::<Ipv4Addr>().is_ok());
            assert!(random_ipv6(&mut rng).parse::<Ipv6Addr>().is_ok());
        }
    }

    #[test]
    fn helpers_accept_trait_object_rngs() {
        let mut concrete = rng();
        let rng: &mut dyn RngCore = &mut concrete;
        let record = random_record(rng, &[Type::MX]);
        let (preference, exchange) = record.rdata.split_once(' ').unwrap();
        assert!(preference.parse::<u8>().unwrap() <= 100);
        assert!(exchange.ends_with("com."));
    }

    #[test]
    fn soa_rdata_stays_in_range() {
        let mut rng = rng();
        let rdata = random_rdata(&mut rng, Type::SOA);
        let fields: Vec<&str> = rdata.split(' ').collect();
        assert_eq!(fields.len(), 7);
        let numbers: Vec<u32> = fields[2..].iter().map(|f| f.parse().unwrap()).collect();
        assert!((3600..=86400).contains(&numbers[1]));
        assert!((1800..=7200).contains(&numbers[2]));
        assert!((604800..=2419200).contains(&numbers[3]));
        assert!((300..=86400).contains(&numbers[4]));
    }

    #[test]
    fn random_records_add_supporting_records() {
        let mut rng = rng();
        for _ in 0..20 {
            let records = random_records(&mut rng, 3, &[Type::CNAME, Type::MX], None);
            assert!(records.len() >= 3);
            let primary = records
                .iter()
                .filter(|r| r.is_type(Type::CNAME) || r.is_type(Type::MX))
                .count();
            assert_eq!(primary, 3);
            for a in records.iter().filter(|r| r.is_type(Type::A)) {
                assert!(records.iter().any(|r| r.rdata.ends_with(&a.name)));
            }
        }
    }

    #[test]
    fn random_records_can_come_from_scenarios() {
        let mut rng = rng();
        let records = random_records(&mut rng, 2, &[], Some(1.0));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn string_mutations_behave() {
        let mut rng = rng();
        assert_eq!(
            mutate_string_field(&mut rng, "Example", &[StringMutation::Case]).to_lowercase(),
            "example"
        );
        let truncated = mutate_string_field(&mut rng, "example", &[StringMutation::Truncate]);
        assert!("example".starts_with(&truncated) && !truncated.is_empty() && truncated.len() < 7);
        assert_eq!(mutate_string_field(&mut rng, "x", &[StringMutation::Truncate]), "x");
        assert_eq!(mutate_string_field(&mut rng, "abc", &[StringMutation::Replace]).len(), 3);
        assert!(mutate_string_field(&mut rng, "abc", &[StringMutation::Append]).starts_with("abc"));
        assert!(mutate_string_field(&mut rng, "abc", &[StringMutation::Prepend]).ends_with("abc"));
    }

    #[test]
    fn numeric_mutations_stay_in_range() {
        let mut rng = rng();
        for _ in 0..500 {
            let value = mutate_numeric_field(&mut rng, 65535, 0, 65535, NumericMutation::ALL);
            assert!((0..=65535).contains(&value));
        }
        let boundary = mutate_numeric_field(&mut rng, 5, 0, 10, &[NumericMutation::Boundary]);
        assert!([0, 1, 9, 10].contains(&boundary));
        assert_eq!(mutate_numeric_field(&mut rng, 5, 0, 10, &[]), 5);
    }

    #[test]
    fn list_mutations_behave() {
        let mut rng = rng();
        let empty: Vec<u8> = Vec::new();
        let no_generator = None::<fn(&mut StdRng) -> u8>;
        assert!(mutate_list_field(&mut rng, &empty, no_generator, ListMutation::ALL).is_empty());
        let added = mutate_list_field(
            &mut rng,
            &empty,
            Some(|_: &mut StdRng| 7u8),
            ListMutation::ALL,
        );
        assert_eq!(added, vec![7]);

        let items = vec![1, 2, 3];
        let no_generator = None::<fn(&mut StdRng) -> i32>;
        let removed = mutate_list_field(&mut rng, &items, no_generator, &[ListMutation::Remove]);
        assert_eq!(removed.len(), 2);
        let duplicated =
            mutate_list_field(&mut rng, &items, no_generator, &[ListMutation::Duplicate]);
        assert_eq!(duplicated.len(), 4);
        let mut shuffled =
            mutate_list_field(&mut rng, &items, no_generator, &[ListMutation::Shuffle]);
        shuffled.sort_unstable();
        assert_eq!(shuffled, items);
    }

    #[test]
    fn mutate_record_changes_a_copy() {
        let mut rng = rng();
        let record = Record::internet("www.example.com.", Type::A, 300, "192.0.2.1");
        let mut changed = 0;
        for _ in 0..20 {
            if mutate_record(&mut rng, &record) != record {
                changed += 1;
            }
        }
        assert!(changed > 0);
        assert_eq!(record.rdata, "192.0.2.1");
    }

    #[test]
    fn kinds_parse_by_name() {
        assert_eq!("bit_flip".parse::<NumericMutation>(), Ok(NumericMutation::BitFlip));
        assert_eq!(ListMutation::Shuffle.to_string(), "shuffle");
        assert!("flip".parse::<StringMutation>().is_err());
    }
}
