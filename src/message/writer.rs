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

//! Implementation of the [`Writer`] type to write on-the-wire DNS
//! messages.
//!
//! This is a deliberately permissive serializer. It will put anything
//! a [`Message`] can hold onto the wire as long as the result can still
//! be framed as a DNS message: over-long names, rdata that does not
//! parse for its type, negative TTLs, and reserved header values all go
//! out as-is (or as close to it as the format allows), since sending
//! exactly that sort of data to a target is the whole point.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use arrayvec::ArrayVec;
use log::warn;

use super::constants::*;
use super::{Edns, Message, Opcode, Qclass, Qtype, Question, Rcode, Section};
use crate::class::Class;
use crate::rr::{Record, Type};

////////////////////////////////////////////////////////////////////////
// CONVENIENCE FUNCTIONS                                              //
////////////////////////////////////////////////////////////////////////

/// Serializes a [`Message`] with name compression enabled.
///
/// Records whose type or class cannot be parsed are skipped (with a
/// warning) rather than failing the whole message; a question whose
/// QTYPE or QCLASS cannot be parsed is an error.
pub fn to_wire(message: &Message) -> Result<Vec<u8>> {
    to_wire_with(message, CompressionMode::Enabled)
}

/// Serializes a [`Message`] using the given [`CompressionMode`].
pub fn to_wire_with(message: &Message, mode: CompressionMode) -> Result<Vec<u8>> {
    let mut writer = Writer::new();
    writer.set_compression_mode(mode);
    writer.set_id(message.id);
    writer.set_qr(message.is_response);
    writer.set_opcode(message.opcode);
    writer.set_aa(message.authoritative);
    writer.set_tc(message.truncated);
    writer.set_rd(message.recursion_desired);
    writer.set_ra(message.recursion_available);
    writer.set_rcode(message.rcode);
    writer.add_question(&message.question)?;
    for section in Section::ALL {
        for record in message.section(section) {
            match writer.add_rr(section, record) {
                Err(e @ (Error::UnknownType | Error::UnknownClass)) => {
                    warn!("Skipping {} record for {:?}: {}.", section, record.name, e)
                }
                other => other?,
            }
        }
    }
    if let Some(ref edns) = message.edns {
        writer.set_edns(edns);
    }
    writer.finish()
}

////////////////////////////////////////////////////////////////////////
// WRITER                                                             //
////////////////////////////////////////////////////////////////////////

/// Serializes a DNS message into a growable buffer.
///
/// Header fields are in fixed positions and can be written at any time
/// through the setter methods. Questions and resource records are
/// appended sequentially, so they must be added in wire order
/// (questions, then answer, authority, and additional records).
/// Attempts to go back to an earlier section fail with
/// [`Error::OutOfOrder`]. The header counts are filled in by
/// [`Writer::finish`], which also appends the OPT record for messages
/// set up with [`Writer::set_edns`].
///
/// A failed addition leaves the writer as it was before the call.
pub struct Writer {
    octets: Vec<u8>,
    section: Option<Section>,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
    prior_names: Vec<PriorName>,
    compression_mode: CompressionMode,
    edns: Option<Edns>,
}

/// A name (suffix) already written to the message, available as a
/// compression target.
struct PriorName {
    /// The suffix in lowercased wire form.
    key: Vec<u8>,
    pointer: u16,
}

/// Specifies whether a [`Writer`] compresses domain names.
///
/// With compression enabled, owner names and the names inside NS,
/// CNAME, PTR, MX, and SOA rdata are compressed against earlier names.
/// Matching is ASCII-case-insensitive, so the case of the later
/// occurrence is lost.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CompressionMode {
    #[default]
    Enabled,
    Disabled,
}

impl Writer {
    /// Creates a new `Writer` holding a zeroed header.
    pub fn new() -> Self {
        Self {
            octets: vec![0; HEADER_SIZE],
            section: None,
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
            prior_names: Vec::new(),
            compression_mode: CompressionMode::default(),
            edns: None,
        }
    }

    /// Sets the [`CompressionMode`] used for names added from now on.
    pub fn set_compression_mode(&mut self, mode: CompressionMode) {
        self.compression_mode = mode;
    }

    pub fn set_id(&mut self, id: u16) {
        self.write_u16(ID_START, id);
    }

    pub fn set_qr(&mut self, qr: bool) {
        self.set_flag(QR_BYTE, QR_MASK, qr);
    }

    pub fn set_opcode(&mut self, opcode: Opcode) {
        let value = (u8::from(opcode) << OPCODE_SHIFT) & OPCODE_MASK;
        self.octets[OPCODE_BYTE] = (self.octets[OPCODE_BYTE] & !OPCODE_MASK) | value;
    }

    pub fn set_aa(&mut self, aa: bool) {
        self.set_flag(AA_BYTE, AA_MASK, aa);
    }

    pub fn set_tc(&mut self, tc: bool) {
        self.set_flag(TC_BYTE, TC_MASK, tc);
    }

    pub fn set_rd(&mut self, rd: bool) {
        self.set_flag(RD_BYTE, RD_MASK, rd);
    }

    pub fn set_ra(&mut self, ra: bool) {
        self.set_flag(RA_BYTE, RA_MASK, ra);
    }

    pub fn set_rcode(&mut self, rcode: Rcode) {
        let value = u8::from(rcode) & RCODE_MASK;
        self.octets[RCODE_BYTE] = (self.octets[RCODE_BYTE] & !RCODE_MASK) | value;
    }

    /// Makes this an EDNS message. The OPT record is appended to the
    /// additional section by [`Writer::finish`].
    pub fn set_edns(&mut self, edns: &Edns) {
        self.edns = Some(edns.clone());
    }

    /// Adds a question to the message. This must be used before any
    /// records are added.
    pub fn add_question(&mut self, question: &Question) -> Result<()> {
        if self.section.is_some() {
            return Err(Error::OutOfOrder);
        }
        let qtype: Qtype = question.qtype.parse().or(Err(Error::UnknownQtype))?;
        let qclass: Qclass = question.qclass.parse().or(Err(Error::UnknownQclass))?;
        let new_qdcount = self.qdcount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.write_name(&question.name, true)?;
            this.push_u16(qtype.into());
            this.push_u16(qclass.into());
            Ok(())
        })?;
        self.qdcount = new_qdcount;
        Ok(())
    }

    /// Adds a record to the answer section of the message.
    pub fn add_answer_rr(&mut self, record: &Record) -> Result<()> {
        self.add_rr(Section::Answer, record)
    }

    /// Adds a record to the authority section of the message.
    pub fn add_authority_rr(&mut self, record: &Record) -> Result<()> {
        self.add_rr(Section::Authority, record)
    }

    /// Adds a record to the additional section of the message.
    pub fn add_additional_rr(&mut self, record: &Record) -> Result<()> {
        self.add_rr(Section::Additional, record)
    }

    /// Adds a record to the given section of the message. Records may
    /// not be added to a section that precedes one already written.
    pub fn add_rr(&mut self, section: Section, record: &Record) -> Result<()> {
        if self.section > Some(section) {
            return Err(Error::OutOfOrder);
        }
        let rr_type: Type = record.rr_type.parse().or(Err(Error::UnknownType))?;
        let class = record
            .class
            .parse::<Class>()
            .or_else(|_| record.class.parse::<Qclass>().map(Class::from))
            .or(Err(Error::UnknownClass))?;
        let new_count = self.count(section).checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.write_name(&record.name, true)?;
            this.push_u16(rr_type.into());
            this.push_u16(class.into());
            // Out-of-range TTLs keep their low 32 bits, so -1 becomes
            // 0xffffffff.
            this.push_u32(record.ttl as u32);
            this.write_rdata(rr_type, &record.rdata)
        })?;
        self.section = Some(section);
        *self.count_mut(section) = new_count;
        Ok(())
    }

    /// Finishes the message, returning its octets.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if let Some(edns) = self.edns.take() {
            self.arcount = self.arcount.checked_add(1).ok_or(Error::CountOverflow)?;
            self.write_opt(&edns)?;
        }
        self.write_u16(QDCOUNT_START, self.qdcount);
        self.write_u16(ANCOUNT_START, self.ancount);
        self.write_u16(NSCOUNT_START, self.nscount);
        self.write_u16(ARCOUNT_START, self.arcount);
        Ok(self.octets)
    }

    ////////////////////////////////////////////////////////////////////
    // PRIVATE HELPERS                                                //
    ////////////////////////////////////////////////////////////////////

    fn count(&self, section: Section) -> u16 {
        match section {
            Section::Answer => self.ancount,
            Section::Authority => self.nscount,
            Section::Additional => self.arcount,
        }
    }

    fn count_mut(&mut self, section: Section) -> &mut u16 {
        match section {
            Section::Answer => &mut self.ancount,
            Section::Authority => &mut self.nscount,
            Section::Additional => &mut self.arcount,
        }
    }

    /// Runs `f`, restoring the buffer and the compression state if it
    /// fails.
    fn with_rollback<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved_len = self.octets.len();
        let saved_prior_names = self.prior_names.len();
        let result = f(self);
        if result.is_err() {
            self.octets.truncate(saved_len);
            self.prior_names.truncate(saved_prior_names);
        }
        result
    }

    /// Writes a domain name given in dotted text form.
    ///
    /// Empty labels are dropped (so the trailing dot is optional and
    /// `""` is the root), labels are cut to 63 octets, and no overall
    /// length limit is applied beyond a cap of 128 labels.
    fn write_name(&mut self, name: &str, compress: bool) -> Result<()> {
        let mut labels: ArrayVec<&[u8], MAX_LABELS> = ArrayVec::new();
        for label in name.split('.').filter(|l| !l.is_empty()) {
            let label = label.as_bytes();
            let label = &label[..label.len().min(MAX_LABEL_LEN)];
            labels.try_push(label).or(Err(Error::NameTooLong))?;
        }

        let enabled = self.compression_mode == CompressionMode::Enabled;
        for i in 0..labels.len() {
            let key = suffix_key(&labels[i..]);
            if compress && enabled {
                if let Some(prior) = self.prior_names.iter().find(|p| p.key == key) {
                    let pointer = 0xc000 | prior.pointer;
                    self.push_u16(pointer);
                    return Ok(());
                }
            }
            let position = self.octets.len();
            if enabled && position <= POINTER_MAX {
                self.prior_names.push(PriorName {
                    key,
                    pointer: position as u16,
                });
            }
            self.octets.push(labels[i].len() as u8);
            self.octets.extend_from_slice(labels[i]);
        }
        self.octets.push(0);
        Ok(())
    }

    /// Writes RDLENGTH and RDATA. Rdata that does not parse for its
    /// type is written as its raw text octets.
    fn write_rdata(&mut self, rr_type: Type, rdata: &str) -> Result<()> {
        let rdlength_at = self.octets.len();
        self.push_u16(0);
        let start = self.octets.len();
        let saved_prior_names = self.prior_names.len();
        if !self.write_typed_rdata(rr_type, rdata) {
            self.octets.truncate(start);
            self.prior_names.truncate(saved_prior_names);
            self.octets.extend_from_slice(rdata.as_bytes());
        }
        let rdlength = u16::try_from(self.octets.len() - start).or(Err(Error::RdataTooLong))?;
        self.write_u16(rdlength_at, rdlength);
        Ok(())
    }

    /// Tries to write `rdata` in the wire format of `rr_type`,
    /// returning `false` if the text does not parse. The buffer may
    /// hold partial output when this fails.
    fn write_typed_rdata(&mut self, rr_type: Type, rdata: &str) -> bool {
        match rr_type {
            Type::A => match rdata.trim().parse::<Ipv4Addr>() {
                Ok(address) => {
                    self.octets.extend_from_slice(&address.octets());
                    true
                }
                Err(_) => false,
            },
            Type::AAAA => match rdata.trim().parse::<Ipv6Addr>() {
                Ok(address) => {
                    self.octets.extend_from_slice(&address.octets());
                    true
                }
                Err(_) => false,
            },
            Type::NS | Type::CNAME | Type::PTR => self.write_rdata_name(rdata.trim(), true),

            // RFC 6672 § 2.5
            Type::DNAME => self.write_rdata_name(rdata.trim(), false),

            Type::MX => {
                let mut fields = rdata.split_whitespace();
                match (
                    fields.next().and_then(|p| p.parse::<u16>().ok()),
                    fields.next(),
                    fields.next(),
                ) {
                    (Some(preference), Some(exchange), None) => {
                        self.push_u16(preference);
                        self.write_rdata_name(exchange, true)
                    }
                    _ => false,
                }
            }
            Type::SOA => {
                let fields: Vec<&str> = rdata.split_whitespace().collect();
                if fields.len() != 7 {
                    return false;
                }
                let numbers: Option<Vec<u32>> =
                    fields[2..].iter().map(|f| f.parse().ok()).collect();
                match numbers {
                    Some(numbers) => {
                        if !(self.write_rdata_name(fields[0], true)
                            && self.write_rdata_name(fields[1], true))
                        {
                            return false;
                        }
                        for number in numbers {
                            self.push_u32(number);
                        }
                        true
                    }
                    None => false,
                }
            }
            Type::TXT => {
                self.write_character_strings(rdata);
                true
            }
            _ => false,
        }
    }

    /// Writes a name that appears in rdata. Empty text and text with
    /// whitespace do not count as names.
    fn write_rdata_name(&mut self, text: &str, compress: bool) -> bool {
        !text.is_empty()
            && !text.contains(char::is_whitespace)
            && self.write_name(text, compress).is_ok()
    }

    /// Writes TXT data as a sequence of character-strings of at most
    /// 255 octets each. One pair of enclosing quotes is removed.
    fn write_character_strings(&mut self, text: &str) {
        let text = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        if text.is_empty() {
            self.octets.push(0);
            return;
        }
        for chunk in text.as_bytes().chunks(255) {
            self.octets.push(chunk.len() as u8);
            self.octets.extend_from_slice(chunk);
        }
    }

    /// Writes the OPT pseudo-record (RFC 6891 § 6.1.2).
    fn write_opt(&mut self, edns: &Edns) -> Result<()> {
        self.octets.push(0);
        self.push_u16(Type::OPT.into());
        self.push_u16(u16::try_from(edns.payload_size).unwrap_or(u16::MAX));
        let mut ttl = (edns.version as u32) << 16;
        if edns.dnssec_ok {
            ttl |= EDNS_DO_MASK;
        }
        self.push_u32(ttl);
        let rdlength_at = self.octets.len();
        self.push_u16(0);
        let start = self.octets.len();
        for option in &edns.options {
            let length = u16::try_from(option.data.len()).or(Err(Error::RdataTooLong))?;
            self.push_u16(option.code);
            self.push_u16(length);
            self.octets.extend_from_slice(&option.data);
        }
        let rdlength = u16::try_from(self.octets.len() - start).or(Err(Error::RdataTooLong))?;
        self.write_u16(rdlength_at, rdlength);
        Ok(())
    }

    fn set_flag(&mut self, byte: usize, mask: u8, value: bool) {
        if value {
            self.octets[byte] |= mask;
        } else {
            self.octets[byte] &= !mask;
        }
    }

    fn push_u16(&mut self, data: u16) {
        self.octets.extend_from_slice(&data.to_be_bytes());
    }

    fn push_u32(&mut self, data: u32) {
        self.octets.extend_from_slice(&data.to_be_bytes());
    }

    fn write_u16(&mut self, position: usize, data: u16) {
        self.octets[position..position + 2].copy_from_slice(&data.to_be_bytes());
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the lookup key for a name suffix: its labels in wire form,
/// lowercased.
fn suffix_key(labels: &[&[u8]]) -> Vec<u8> {
    let mut key = Vec::new();
    for label in labels {
        key.push(label.len() as u8);
        key.extend(label.iter().map(u8::to_ascii_lowercase));
    }
    key
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a [`Writer`] operation could not be
/// performed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// Adding the question or resource record would overflow the
    /// corresponding 16-bit counter in the DNS header.
    CountOverflow,

    /// An attempt was made to serialize a question or resource record
    /// in the wrong place in the message (e.g., adding a question after
    /// an answer resource record has already been serialized).
    OutOfOrder,

    /// The QTYPE of the question is not a mnemonic or `TYPEnnn`.
    UnknownQtype,

    /// The QCLASS of the question is not a mnemonic or `CLASSnnn`.
    UnknownQclass,

    /// The type of a record is not a mnemonic or `TYPEnnn`.
    UnknownType,

    /// The class of a record is not a mnemonic or `CLASSnnn`.
    UnknownClass,

    /// A domain name has more labels than can be written.
    NameTooLong,

    /// The RDATA would exceed 65,535 octets.
    RdataTooLong,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::CountOverflow => f.write_str("record count would overflow"),
            Self::OutOfOrder => f.write_str("question or record serialized out of order"),
            Self::UnknownQtype => f.write_str("unknown QTYPE"),
            Self::UnknownQclass => f.write_str("unknown QCLASS"),
            Self::UnknownType => f.write_str("unknown record type"),
            Self::UnknownClass => f.write_str("unknown record class"),
            Self::NameTooLong => f.write_str("domain name has too many labels"),
            Self::RdataTooLong => f.write_str("RDATA is too long"),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible [`Writer`] methods.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;
    use crate::message::{EdnsOption, MessageBuilder};

    lazy_static! {
        static ref QUESTION: Question = Question::new("dnsfuzz.test.", "A", "IN");
        static ref RECORD: Record = Record::internet("dnsfuzz.test.", Type::A, 3600, "127.0.0.1");
        static ref ROOT_QUESTION: Question = Question::new("", "A", "IN");
    }

    #[test]
    fn writer_works() {
        // This is not meant to be exhaustive by any means. Rather, it's
        // just a check that the Writer works in a basic scenario.
        let mut writer = Writer::new();
        writer.set_id(0x0703);
        writer.set_opcode(Opcode::Query);
        writer.set_qr(true);
        writer.set_aa(true);
        writer.set_rcode(Rcode::NoError);
        writer.add_question(&QUESTION).unwrap();
        writer.add_answer_rr(&RECORD).unwrap();
        assert_eq!(
            writer.finish().unwrap(),
            b"\x07\x03\x84\x00\x00\x01\x00\x01\x00\x00\x00\x00\
              \x07dnsfuzz\x04test\x00\x00\x01\x00\x01\
              \xc0\x0c\x00\x01\x00\x01\x00\x00\x0e\x10\x00\x04\
              \x7f\x00\x00\x01"
        );
    }

    #[test]
    fn writer_works_with_edns() {
        let mut writer = Writer::new();
        writer.set_id(0x0703);
        writer.set_opcode(Opcode::Update);
        writer.set_qr(true);
        writer.set_edns(&Edns::default());
        assert_eq!(
            writer.finish().unwrap(),
            b"\x07\x03\xa8\x00\x00\x00\x00\x00\x00\x00\x00\x01\
              \x00\x00\x29\x04\xd0\x00\x00\x00\x00\x00\x00",
        );
    }

    #[test]
    fn opt_record_carries_version_do_bit_and_options() {
        let mut writer = Writer::new();
        writer.set_edns(&Edns {
            version: 255,
            payload_size: 100_000,
            dnssec_ok: true,
            options: vec![EdnsOption {
                code: 10,
                data: vec![0xaa, 0xbb],
            }],
        });
        let octets = writer.finish().unwrap();
        assert_eq!(
            &octets[HEADER_SIZE..],
            b"\x00\x00\x29\xff\xff\x00\xff\x80\x00\x00\x06\x00\x0a\x00\x02\xaa\xbb"
        );
    }

    #[test]
    fn names_are_compressed_case_insensitively() {
        let mut writer = Writer::new();
        writer
            .add_question(&Question::new("Example.COM", "NS", "IN"))
            .unwrap();
        writer
            .add_answer_rr(&Record::internet("example.com.", Type::NS, 60, "ns.example.com"))
            .unwrap();
        let octets = writer.finish().unwrap();
        assert_eq!(
            &octets[HEADER_SIZE..],
            b"\x07Example\x03COM\x00\x00\x02\x00\x01\
              \xc0\x0c\x00\x02\x00\x01\x00\x00\x00\x3c\x00\x05\x02ns\xc0\x0c"
        );
    }

    #[test]
    fn compression_can_be_disabled() {
        let mut message = MessageBuilder::new()
            .question("a.test", "A", "IN")
            .answer(Record::internet("a.test", Type::A, 0, "192.0.2.1"))
            .edns(None)
            .build();
        message.recursion_desired = false;
        let octets = to_wire_with(&message, CompressionMode::Disabled).unwrap();
        assert_eq!(&octets[HEADER_SIZE + 12..HEADER_SIZE + 20], b"\x01a\x04test\x00");
    }

    #[test]
    fn malformed_rdata_is_written_raw() {
        let mut writer = Writer::new();
        writer
            .add_answer_rr(&Record::internet("a.", Type::A, 0, "256.256.256.256"))
            .unwrap();
        let octets = writer.finish().unwrap();
        assert!(octets.ends_with(b"\x00\x0f256.256.256.256"));
    }

    #[test]
    fn negative_ttls_keep_their_low_bits() {
        let mut writer = Writer::new();
        writer
            .add_answer_rr(&Record::internet("", Type::TXT, -1, "\"hi\""))
            .unwrap();
        let octets = writer.finish().unwrap();
        assert_eq!(
            &octets[HEADER_SIZE..],
            b"\x00\x00\x10\x00\x01\xff\xff\xff\xff\x00\x03\x02hi"
        );
    }

    #[test]
    fn long_labels_are_cut_and_label_count_is_capped() {
        let mut writer = Writer::new();
        let long_label = "a".repeat(70);
        writer
            .add_question(&Question::new(long_label, "A", "IN"))
            .unwrap();
        let octets = writer.finish().unwrap();
        assert_eq!(octets[HEADER_SIZE], 63);
        assert_eq!(octets.len(), HEADER_SIZE + 1 + 63 + 1 + 4);

        let many_labels = vec!["x"; MAX_LABELS + 1].join(".");
        let mut writer = Writer::new();
        assert_eq!(
            writer.add_question(&Question::new(many_labels, "A", "IN")),
            Err(Error::NameTooLong)
        );
    }

    #[test]
    fn to_wire_skips_unparseable_records() {
        let message = MessageBuilder::new()
            .answer(Record::new("a.", "BOGUS", "IN", 0, ""))
            .answer(Record::new("a.", "A", "XX", 0, "192.0.2.1"))
            .answer(Record::new("a.", "A", "IN", 0, "192.0.2.1"))
            .build();
        let octets = to_wire(&message).unwrap();
        assert_eq!(&octets[ANCOUNT_START..ANCOUNT_START + 2], b"\x00\x01");
        assert_eq!(&octets[ARCOUNT_START..ARCOUNT_START + 2], b"\x00\x01");
    }

    #[test]
    fn to_wire_rejects_bad_questions() {
        let mut message = Message::default();
        message.question.qtype = String::new();
        assert_eq!(to_wire(&message), Err(Error::UnknownQtype));
        message.question.qtype = "A".to_owned();
        message.question.qclass = "NOPE".to_owned();
        assert_eq!(to_wire(&message), Err(Error::UnknownQclass));
        message.question.qclass = "Any".to_owned();
        assert!(to_wire(&message).is_ok());
    }

    #[test]
    fn writer_enforces_section_order() {
        let mut writer = Writer::new();
        writer.add_additional_rr(&RECORD).unwrap();
        assert_eq!(writer.add_answer_rr(&RECORD), Err(Error::OutOfOrder));
        assert_eq!(writer.add_question(&QUESTION), Err(Error::OutOfOrder));
    }

    #[test]
    fn writer_detects_qdcount_overflow() {
        let mut writer = Writer::new();
        for _ in 0..u16::MAX {
            writer.add_question(&ROOT_QUESTION).unwrap();
        }
        assert_eq!(writer.add_question(&ROOT_QUESTION), Err(Error::CountOverflow));
    }
}
