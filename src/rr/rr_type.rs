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

//! Provides the [`Type`] structure for DNS RR types.

use std::fmt;
use std::str::FromStr;

use crate::message::Qtype;
use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// Represents the RR type of a DNS record.
///
/// An RR type is represented on the wire as an unsigned 16-bit integer.
/// Hence this is basically a wrapper around `u16` with
/// [`Debug`](fmt::Debug), [`Display`](fmt::Display), and [`FromStr`]
/// implementations for the textual mnemonics. Every mnemonic the
/// strategies can put into a record or question has a constant here,
/// including obsolete and experimental types, since exercising a
/// target's handling of those is the point.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Type(u16);

/// Generates the [`Type`] constants along with the mnemonic tables used
/// by [`FromStr`] and [`Display`](fmt::Display).
macro_rules! rr_types {
    ($($mnemonic:ident = $value:literal,)*) => {
        impl Type {
            $(pub const $mnemonic: Type = Type($value);)*

            /// Every type with a mnemonic, in ascending numeric order.
            pub const KNOWN: &'static [Type] = &[$(Type::$mnemonic,)*];

            /// Returns the mnemonic of this type, if it has one.
            pub fn mnemonic(self) -> Option<&'static str> {
                match self {
                    $(Self::$mnemonic => Some(stringify!($mnemonic)),)*
                    _ => None,
                }
            }

            /// Looks up a type by its mnemonic, ignoring ASCII case.
            fn from_mnemonic(text: &str) -> Option<Self> {
                let text = Caseless(text);
                $(
                    if text == Caseless(stringify!($mnemonic)) {
                        return Some(Self::$mnemonic);
                    }
                )*
                None
            }
        }
    };
}

rr_types! {
    A = 1,
    NS = 2,
    MD = 3,
    MF = 4,
    CNAME = 5,
    SOA = 6,
    MB = 7,
    MG = 8,
    MR = 9,
    NULL = 10,
    WKS = 11,
    PTR = 12,
    HINFO = 13,
    MINFO = 14,
    MX = 15,
    TXT = 16,
    RP = 17,
    AFSDB = 18,
    X25 = 19,
    SIG = 24,
    KEY = 25,
    AAAA = 28,
    LOC = 29,
    NIMLOC = 32,
    SRV = 33,
    NAPTR = 35,
    KX = 36,
    CERT = 37,
    DNAME = 39,
    SINK = 40,
    OPT = 41,
    APL = 42,
    DS = 43,
    IPSECKEY = 45,
    RRSIG = 46,
    NSEC = 47,
    DNSKEY = 48,
    DHCID = 49,
    NSEC3 = 50,
    TLSA = 52,
    HIP = 55,
    NINFO = 56,
    RKEY = 57,
    SVCB = 64,
    HTTPS = 65,
    NID = 104,
    TKEY = 249,
    TSIG = 250,
    URI = 256,
    CAA = 257,
    TA = 32768,
    DLV = 32769,
}

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl From<Qtype> for Type {
    fn from(qtype: Qtype) -> Self {
        Self(qtype.into())
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some(rr_type) = Self::from_mnemonic(text) {
            Ok(rr_type)
        } else if text
            .get(0..4)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("TYPE"))
        {
            text[4..]
                .parse::<u16>()
                .map(Self::from)
                .or(Err("type value is not a valid unsigned 16-bit integer"))
        } else {
            Err("unknown type")
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", self.0), // RFC 3597 § 5
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_type_round_trips_through_its_mnemonic() {
        for &rr_type in Type::KNOWN {
            let text = rr_type.to_string();
            assert_eq!(text.parse::<Type>(), Ok(rr_type), "{text}");
            assert_eq!(text.to_lowercase().parse::<Type>(), Ok(rr_type));
        }
    }

    #[test]
    fn unknown_types_use_the_generic_form() {
        let rr_type = Type::from(0xff00);
        assert_eq!(rr_type.to_string(), "TYPE65280");
        assert_eq!("TYPE65280".parse::<Type>(), Ok(rr_type));
        assert_eq!("TYPE1".parse::<Type>(), Ok(Type::A));
    }

    #[test]
    fn junk_is_rejected() {
        assert!("".parse::<Type>().is_err());
        assert!("NOTATYPE".parse::<Type>().is_err());
        assert!("TYPE65536".parse::<Type>().is_err());
    }
}
