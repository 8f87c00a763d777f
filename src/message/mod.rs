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

//! The structured DNS message model that strategies operate on.
//!
//! A [`Message`] is a plain value: cloning one yields a fully
//! independent copy (the record sections and EDNS options included), so
//! a strategy can derive its output from a clone without any risk of
//! changing the message it was given. Messages are built with a
//! [`MessageBuilder`] or one of the [`Message::query`] and
//! [`Message::response`] shortcuts, and turned into wire-format octets
//! by the [`writer`] module.

use std::fmt;

use rand::Rng;

use crate::rr::Record;

mod constants;
mod opcode;
mod question;
mod rcode;
pub mod writer;
pub use opcode::{IntoOpcodeError, Opcode};
pub use question::{Qclass, Qtype, Question};
pub use rcode::{IntoRcodeError, Rcode};
pub use writer::{to_wire, CompressionMode, Writer};

////////////////////////////////////////////////////////////////////////
// MESSAGES                                                           //
////////////////////////////////////////////////////////////////////////

/// A DNS message, independent of its wire format.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Message {
    pub id: u16,
    pub opcode: Opcode,
    pub rcode: Rcode,
    pub is_response: bool,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub question: Question,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additional: Vec<Record>,

    /// The EDNS parameters, or [`None`] for a message without an OPT
    /// record.
    pub edns: Option<Edns>,
}

impl Message {
    /// Creates a recursive query for `name` and `qtype` in class IN.
    pub fn query(name: impl Into<String>, qtype: impl Into<String>) -> Self {
        MessageBuilder::new().question(name, qtype, "IN").build()
    }

    /// Creates an authoritative response for `name` and `qtype` with a
    /// single answer record carrying `rdata`.
    pub fn response(
        name: impl Into<String>,
        qtype: impl Into<String>,
        rdata: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let qtype = qtype.into();
        MessageBuilder::new()
            .question(name.clone(), qtype.clone(), "IN")
            .response(true)
            .authoritative(true)
            .answer(Record::new(name, qtype, "IN", 300, rdata))
            .build()
    }

    /// Returns the records of one section.
    pub fn section(&self, section: Section) -> &Vec<Record> {
        match section {
            Section::Answer => &self.answers,
            Section::Authority => &self.authorities,
            Section::Additional => &self.additional,
        }
    }

    /// Returns the records of one section, mutably.
    pub fn section_mut(&mut self, section: Section) -> &mut Vec<Record> {
        match section {
            Section::Answer => &mut self.answers,
            Section::Authority => &mut self.authorities,
            Section::Additional => &mut self.additional,
        }
    }

    /// Iterates over the records of all three sections, in wire order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additional.iter())
    }

    /// Returns whether any of the three record sections is non-empty.
    pub fn has_records(&self) -> bool {
        !(self.answers.is_empty() && self.authorities.is_empty() && self.additional.is_empty())
    }

    /// Returns whether the message is, or looks like, a response: the
    /// QR bit is set or it carries records.
    pub fn is_response_like(&self) -> bool {
        self.is_response || self.has_records()
    }

    /// Empties all three record sections.
    pub fn clear_records(&mut self) {
        self.answers.clear();
        self.authorities.clear();
        self.additional.clear();
    }
}

impl Default for Message {
    fn default() -> Self {
        Self {
            id: 0,
            opcode: Opcode::Query,
            rcode: Rcode::NoError,
            is_response: false,
            authoritative: false,
            truncated: false,
            recursion_desired: true,
            recursion_available: false,
            question: Question::default(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additional: Vec::new(),
            edns: Some(Edns::default()),
        }
    }
}

/// One of the three record sections of a message, ordered as they
/// appear on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::Answer, Self::Authority, Self::Additional];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Answer => "ANSWER",
            Self::Authority => "AUTHORITY",
            Self::Additional => "ADDITIONAL",
        })
    }
}

////////////////////////////////////////////////////////////////////////
// EDNS                                                               //
////////////////////////////////////////////////////////////////////////

/// EDNS parameters, carried on the wire in an OPT pseudo-record.
///
/// The fields are wider or looser than the protocol allows where
/// strategies need that: any version can be set, and the payload size
/// is clamped to 16 bits only when the OPT record is written.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Edns {
    pub version: u8,
    pub payload_size: u32,
    pub dnssec_ok: bool,
    pub options: Vec<EdnsOption>,
}

impl Default for Edns {
    fn default() -> Self {
        Self {
            version: 0,
            payload_size: 1232,
            dnssec_ok: false,
            options: Vec::new(),
        }
    }
}

/// An EDNS option: an option code and opaque data.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

////////////////////////////////////////////////////////////////////////
// BUILDER                                                            //
////////////////////////////////////////////////////////////////////////

/// A fluent builder for [`Message`]s.
///
/// The builder starts out holding [`Message::default`]. [`build`] may be
/// called any number of times; each call returns an independent
/// snapshot.
///
/// [`build`]: MessageBuilder::build
#[derive(Clone, Debug, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder from an existing message.
    pub fn from_message(message: Message) -> Self {
        Self { message }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.message.id = id;
        self
    }

    /// Sets a uniformly random ID drawn from `rng`.
    pub fn random_id<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        self.message.id = rng.gen();
        self
    }

    pub fn opcode(mut self, opcode: Opcode) -> Self {
        self.message.opcode = opcode;
        self
    }

    pub fn rcode(mut self, rcode: Rcode) -> Self {
        self.message.rcode = rcode;
        self
    }

    pub fn response(mut self, is_response: bool) -> Self {
        self.message.is_response = is_response;
        self
    }

    pub fn authoritative(mut self, authoritative: bool) -> Self {
        self.message.authoritative = authoritative;
        self
    }

    pub fn truncated(mut self, truncated: bool) -> Self {
        self.message.truncated = truncated;
        self
    }

    pub fn recursion_desired(mut self, recursion_desired: bool) -> Self {
        self.message.recursion_desired = recursion_desired;
        self
    }

    pub fn recursion_available(mut self, recursion_available: bool) -> Self {
        self.message.recursion_available = recursion_available;
        self
    }

    pub fn question(
        mut self,
        name: impl Into<String>,
        qtype: impl Into<String>,
        qclass: impl Into<String>,
    ) -> Self {
        self.message.question = Question::new(name, qtype, qclass);
        self
    }

    pub fn answer(mut self, record: Record) -> Self {
        self.message.answers.push(record);
        self
    }

    pub fn authority(mut self, record: Record) -> Self {
        self.message.authorities.push(record);
        self
    }

    pub fn additional(mut self, record: Record) -> Self {
        self.message.additional.push(record);
        self
    }

    /// Sets the EDNS parameters; [`None`] removes the OPT record.
    pub fn edns(mut self, edns: Option<Edns>) -> Self {
        self.message.edns = edns;
        self
    }

    /// Appends an EDNS option, enabling EDNS with default parameters
    /// first if necessary.
    pub fn edns_option(mut self, code: u16, data: impl Into<Vec<u8>>) -> Self {
        self.message
            .edns
            .get_or_insert_with(Edns::default)
            .options
            .push(EdnsOption {
                code,
                data: data.into(),
            });
        self
    }

    /// Returns the builder to [`Message::default`].
    pub fn reset(mut self) -> Self {
        self.message = Message::default();
        self
    }

    pub fn build(&self) -> Message {
        self.message.clone()
    }
}

////////////////////////////////////////////////////////////////////////
// PRESENTATION                                                       //
////////////////////////////////////////////////////////////////////////

impl fmt::Display for Message {
    /// Renders the message roughly the way `dig` does.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {}, status: {}, id: {}",
            self.opcode, self.rcode, self.id
        )?;
        f.write_str(";; flags:")?;
        for (set, flag) in [
            (self.is_response, "qr"),
            (self.authoritative, "aa"),
            (self.truncated, "tc"),
            (self.recursion_desired, "rd"),
            (self.recursion_available, "ra"),
        ] {
            if set {
                write!(f, " {flag}")?;
            }
        }
        writeln!(
            f,
            "; QUERY: 1, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            self.answers.len(),
            self.authorities.len(),
            self.additional.len(),
        )?;

        if let Some(ref edns) = self.edns {
            writeln!(f, "\n;; OPT PSEUDOSECTION:")?;
            write!(f, "; EDNS: version: {}, flags:", edns.version)?;
            if edns.dnssec_ok {
                f.write_str(" do")?;
            }
            writeln!(f, "; udp: {}", edns.payload_size)?;
            for option in &edns.options {
                write!(f, "; OPTION {}: ", option.code)?;
                for octet in &option.data {
                    write!(f, "{octet:02x}")?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "\n;; QUESTION SECTION:\n;{}", self.question)?;
        for section in Section::ALL {
            let records = self.section(section);
            if !records.is_empty() {
                writeln!(f, "\n;; {section} SECTION:")?;
                for record in records {
                    writeln!(f, "{record}")?;
                }
            }
        }
        Ok(())
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

    #[test]
    fn default_message_is_a_recursive_edns_query() {
        let message = Message::default();
        assert_eq!(message.id, 0);
        assert_eq!(message.opcode, Opcode::Query);
        assert!(message.recursion_desired);
        assert!(!message.is_response);
        assert_eq!(message.question, Question::new("example.com", "A", "IN"));
        let edns = message.edns.unwrap();
        assert_eq!((edns.version, edns.payload_size), (0, 1232));
        assert!(!edns.dnssec_ok);
    }

    #[test]
    fn clones_are_independent() {
        let original = MessageBuilder::new()
            .answer(Record::internet("a.example.", Type::A, 60, "192.0.2.1"))
            .edns_option(10, vec![1, 2, 3])
            .build();
        let snapshot = original.clone();
        let mut copy = original.clone();
        copy.answers[0].ttl = 0;
        copy.answers.push(Record::default());
        copy.authorities.push(Record::default());
        copy.edns.as_mut().unwrap().options[0].data.push(4);
        assert_eq!(original, snapshot);
    }

    #[test]
    fn builder_snapshots_and_resets() {
        let mut rng = StdRng::seed_from_u64(7);
        let builder = MessageBuilder::new()
            .question("example.org", "MX", "CH")
            .response(true)
            .random_id(&mut rng);
        let first = builder.build();
        let second = builder.build();
        assert_eq!(first, second);
        assert!(first.is_response);
        assert_eq!(first.question.qclass, "CH");
        assert_eq!(builder.reset().build(), Message::default());
    }

    #[test]
    fn response_shortcut_carries_one_answer() {
        let message = Message::response("example.com", "A", "192.0.2.7");
        assert!(message.is_response && message.authoritative);
        assert_eq!(message.answers.len(), 1);
        assert!(message.answers[0].is_type(Type::A));
        assert!(message.is_response_like());
        assert!(!Message::query("example.com", "A").is_response_like());
    }

    #[test]
    fn display_renders_sections() {
        let text = Message::response("example.com.", "A", "192.0.2.7").to_string();
        assert!(text.contains("flags: qr aa rd;"));
        assert!(text.contains(";; ANSWER SECTION:\nexample.com.\t300\tIN\tA\t192.0.2.7\n"));
        assert!(!text.contains("AUTHORITY SECTION"));
    }
}
