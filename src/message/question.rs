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

//! Implementation of types relating to DNS questions.

use std::fmt;
use std::str::FromStr;

use crate::class::Class;
use crate::rr::Type;
use crate::util::Caseless;

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS message.
///
/// Defined in [RFC 1035 § 4.1.2], a DNS question includes the QNAME,
/// the QTYPE, and the QCLASS. All three are held as text here: the
/// QNAME may be relative or absolute (it is only made absolute when
/// written to the wire), and the QTYPE and QCLASS are mnemonics such as
/// `"AAAA"` and `"IN"` (or generic `TYPEnnn`/`CLASSnnn` forms). They
/// are parsed into [`Qtype`] and [`Qclass`] values by the
/// [writer](super::writer).
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub name: String,
    pub qtype: String,
    pub qclass: String,
}

impl Question {
    /// Creates a new question.
    pub fn new(
        name: impl Into<String>,
        qtype: impl Into<String>,
        qclass: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            qtype: qtype.into(),
            qclass: qclass.into(),
        }
    }
}

impl Default for Question {
    fn default() -> Self {
        Self::new("example.com", "A", "IN")
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.name, self.qclass, self.qtype)
    }
}

////////////////////////////////////////////////////////////////////////
// QTYPES                                                             //
////////////////////////////////////////////////////////////////////////

/// The QTYPE of a DNS [question](Question).
///
/// QTYPE values include data TYPEs (see [`Type`]), but may also
/// include values that ask for a range of TYPEs (e.g.
/// [MAILB](Qtype::MAILB) and [*](Qtype::ANY)) or for zone transfers
/// (e.g. [AXFR](Qtype::AXFR)).
///
/// A QTYPE is represented on the wire as an unsigned 16-bit integer.
/// Hence this is basically a wrapper around [`u16`] with
/// [`Debug`](fmt::Debug), [`Display`](fmt::Display), and [`FromStr`]
/// implementations.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qtype(u16);

impl Qtype {
    // RFC 1995
    pub const IXFR: Self = Self(251);

    // RFC 1035
    pub const AXFR: Self = Self(252);
    pub const MAILB: Self = Self(253);
    pub const MAILA: Self = Self(254);
    pub const ANY: Self = Self(255);
}

impl From<u16> for Qtype {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qtype> for u16 {
    fn from(qtype: Qtype) -> Self {
        qtype.0
    }
}

impl From<Type> for Qtype {
    fn from(rr_type: Type) -> Self {
        Self(rr_type.into())
    }
}

impl fmt::Display for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::IXFR => f.write_str("IXFR"),
            Self::AXFR => f.write_str("AXFR"),
            Self::MAILB => f.write_str("MAILB"),
            Self::MAILA => f.write_str("MAILA"),
            Self::ANY => f.write_str("*"),
            _ => Type::from(*self).fmt(f),
        }
    }
}

impl fmt::Debug for Qtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Qtype {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        const META: [(&str, Qtype); 6] = [
            ("IXFR", Qtype::IXFR),
            ("AXFR", Qtype::AXFR),
            ("MAILB", Qtype::MAILB),
            ("MAILA", Qtype::MAILA),
            ("ANY", Qtype::ANY),
            ("*", Qtype::ANY),
        ];
        let caseless = Caseless(text);
        match META.iter().find(|(m, _)| caseless == Caseless(m)) {
            Some(&(_, qtype)) => Ok(qtype),
            None => Type::from_str(text).map(Into::into),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// QCLASSES                                                           //
////////////////////////////////////////////////////////////////////////

/// The QCLASS of a DNS [question](Question).
///
/// This may be a defined DNS [CLASS](Class), or another value such as
/// [*](Qclass::ANY) that asks for groups of CLASSes.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Qclass(u16);

impl Qclass {
    // RFC 2136
    pub const NONE: Self = Self(254);

    // RFC 1035
    pub const ANY: Self = Self(255);
}

impl From<u16> for Qclass {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Qclass> for u16 {
    fn from(qclass: Qclass) -> Self {
        qclass.0
    }
}

impl From<Class> for Qclass {
    fn from(class: Class) -> Self {
        Self(class.into())
    }
}

impl fmt::Display for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NONE => f.write_str("NONE"),
            Self::ANY => f.write_str("*"),
            _ => Class::from(*self).fmt(f),
        }
    }
}

impl fmt::Debug for Qclass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Qclass {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let caseless = Caseless(text);
        if caseless == Caseless("NONE") {
            Ok(Self::NONE)
        } else if caseless == Caseless("ANY") || text == "*" {
            Ok(Self::ANY)
        } else {
            Class::from_str(text).map(Into::into)
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
    fn qtype_parses_meta_types_and_data_types() {
        assert_eq!("axfr".parse::<Qtype>(), Ok(Qtype::AXFR));
        assert_eq!("*".parse::<Qtype>(), Ok(Qtype::ANY));
        assert_eq!("Any".parse::<Qtype>(), Ok(Qtype::ANY));
        assert_eq!("NSEC3".parse::<Qtype>(), Ok(Qtype::from(Type::NSEC3)));
        assert!("".parse::<Qtype>().is_err());
    }

    #[test]
    fn qclass_accepts_the_any_spellings() {
        assert_eq!("Any".parse::<Qclass>(), Ok(Qclass::ANY));
        assert_eq!("*".parse::<Qclass>(), Ok(Qclass::ANY));
        assert_eq!("ch".parse::<Qclass>(), Ok(Qclass::from(Class::CH)));
        assert!("XX".parse::<Qclass>().is_err());
    }

    #[test]
    fn default_question_is_example_com() {
        let question = Question::default();
        assert_eq!(question.name, "example.com");
        assert_eq!(question.qtype, "A");
        assert_eq!(question.qclass, "IN");
    }
}
