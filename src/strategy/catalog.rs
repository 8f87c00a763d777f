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

//! Fixed catalogs of values that strategies draw from.
//!
//! These are the interesting values: boundary IDs, pathological EDNS
//! sizes, reserved domain names, and so on. Strategies that take a
//! configurable list default to the catalogs here.

use crate::rr::Type;

/// Record types used by the type randomizers and record generators.
/// Includes obsolete and experimental types.
pub const RECORD_TYPES: &[Type] = &[
    Type::A,
    Type::AAAA,
    Type::CNAME,
    Type::MX,
    Type::NS,
    Type::PTR,
    Type::SOA,
    Type::TXT,
    Type::SRV,
    Type::NAPTR,
    Type::DNAME,
    Type::DS,
    Type::RRSIG,
    Type::NSEC,
    Type::NSEC3,
    Type::TLSA,
    Type::CAA,
    Type::SVCB,
    Type::HTTPS,
    Type::AFSDB,
    Type::APL,
    Type::CERT,
    Type::DHCID,
    Type::DLV,
    Type::DNSKEY,
    Type::HIP,
    Type::IPSECKEY,
    Type::KEY,
    Type::KX,
    Type::LOC,
    Type::MINFO,
    Type::NID,
    Type::NIMLOC,
    Type::NINFO,
    Type::RKEY,
    Type::RP,
    Type::SIG,
    Type::SINK,
    Type::TA,
    Type::TKEY,
    Type::TSIG,
    Type::URI,
    Type::X25,
];

/// Record classes. The query class randomizer adds [`INVALID_CLASS`].
pub const CLASSES: &[&str] = &["IN", "CH", "HS"];

/// A class mnemonic that is not a real class mnemonic, although many
/// parsers accept it as QCLASS *.
pub const INVALID_CLASS: &str = "Any";

/// Boundary values for 16-bit message IDs.
pub const BOUNDARY_IDS: &[u16] = &[0, 1, 32767, 32768, 65534, 65535];

/// IDs that implementations are likely to special-case.
pub const SPECIAL_IDS: &[u16] = &[0, 1, 65535, 32768, 16384];

/// Characters that do not belong in host names.
pub const INVALID_CHARS: &[char] = &[
    '\u{00}', '\u{01}', '\u{1f}', '\u{7f}', '\u{ff}', ' ', '\t', '\n', '\\', '"', '\'', '<', '>',
    '|', '*', '?', '/', ':',
];

/// Special-use, reserved, and otherwise odd domain names.
pub const SPECIAL_DOMAINS: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "127.0.0.1",
    "::1",
    "0.0.0.0",
    "255.255.255.255",
    "example.com",
    "example.org",
    "example.net",
    "test",
    "invalid",
    "local",
    "onion",
    "exit",
    "i2p",
    "_tcp.example.com",
    "_udp.example.com",
    "*.example.com",
    "xn--nxasmq6b",
    "very-long-subdomain-name-that-might-cause-issues.example.com",
];

/// A header flag that strategies can set.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Flag {
    Authoritative,
    Truncated,
    RecursionDesired,
    RecursionAvailable,
    IsResponse,
}

impl Flag {
    pub const ALL: [Self; 5] = [
        Self::Authoritative,
        Self::Truncated,
        Self::RecursionDesired,
        Self::RecursionAvailable,
        Self::IsResponse,
    ];

    /// Sets this flag on `message`.
    pub fn set(self, message: &mut crate::message::Message, value: bool) {
        match self {
            Self::Authoritative => message.authoritative = value,
            Self::Truncated => message.truncated = value,
            Self::RecursionDesired => message.recursion_desired = value,
            Self::RecursionAvailable => message.recursion_available = value,
            Self::IsResponse => message.is_response = value,
        }
    }
}

/// Unusual or contradictory combinations of header flags. Flags not
/// listed in a combination are left alone.
pub const FLAG_COMBINATIONS: &[&[(Flag, bool)]] = &[
    // Query with response flags set
    &[
        (Flag::IsResponse, false),
        (Flag::Authoritative, true),
        (Flag::RecursionAvailable, true),
    ],
    // Truncated non-authoritative response
    &[
        (Flag::IsResponse, true),
        (Flag::Authoritative, false),
        (Flag::RecursionAvailable, false),
        (Flag::Truncated, true),
    ],
    // Everything
    &[
        (Flag::IsResponse, true),
        (Flag::Authoritative, true),
        (Flag::Truncated, true),
        (Flag::RecursionDesired, true),
        (Flag::RecursionAvailable, true),
    ],
    // Bare response
    &[
        (Flag::IsResponse, true),
        (Flag::Authoritative, false),
        (Flag::Truncated, false),
        (Flag::RecursionDesired, false),
        (Flag::RecursionAvailable, false),
    ],
];

/// EDNS versions. Only 0 is defined.
pub const EDNS_VERSIONS: &[u8] = &[0, 1, 2, 255];

/// EDNS UDP payload sizes, from sensible to pathological.
pub const EDNS_PAYLOAD_SIZES: &[u32] = &[512, 1232, 1472, 4096, 65535, 0, 1];

/// TTLs at interesting points, including values that do not fit in an
/// unsigned (or signed) 32-bit field.
pub const SPECIAL_TTLS: &[i64] = &[0, 1, 2147483647, 4294967295, -1, 86400, 604800, 31536000];

/// Malformed rdata. The last two entries are built at runtime; see
/// [`invalid_rdata`].
const INVALID_RDATA: &[&str] = &[
    "",
    "invalid",
    "256.256.256.256",
    "::invalid::",
    "\u{00}\u{01}\u{02}",
    "test..example.com",
    ".example.com",
    "example.com.",
];

/// Returns the malformed rdata patterns.
pub fn invalid_rdata() -> Vec<String> {
    let mut patterns: Vec<String> = INVALID_RDATA.iter().map(|&p| p.to_owned()).collect();
    patterns.insert(4, "a".repeat(1000));
    patterns.push(format!("very-long-{}.example.com", "a".repeat(100)));
    patterns
}

/// Returns the wildcard owner names used for `qname`, including
/// misplaced wildcards.
pub fn wildcard_patterns(qname: &str) -> [String; 5] {
    [
        "*.example.com".to_owned(),
        format!("*.{qname}"),
        "*.*.example.com".to_owned(),
        "*".to_owned(),
        "test.*.example.com".to_owned(),
    ]
}

/// Top-level domains used by the scenario generator.
pub const GENERATOR_TLDS: &[&str] = &["com", "org", "net", "edu", "gov", "mil", "int"];
