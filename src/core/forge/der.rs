//! Access to the raw fields of Kerberos messages. Tickets are opaque for
//! the client, so they are moved between messages as the KDC encoded
//! them, without being parsed and built again.

use crate::error::{Error, Result};
use red_asn1::{build_length, parse_length, Tag, TagClass};

/// Field of the ticket in AS-REP and TGS-REP
pub const KDC_REP_TICKET_FIELD: u8 = 5;

/// Field of the ticket in AP-REQ
pub const AP_REQ_TICKET_FIELD: u8 = 3;

/// DER element: the tag, the value and the whole encoded element
struct RawElement<'a> {
    tag: Tag,
    value: &'a [u8],
    raw: &'a [u8],
}

fn parse_element(raw: &[u8]) -> Result<(&[u8], RawElement<'_>)> {
    let (after_tag, tag) = Tag::parse(raw)
        .map_err(|_| Error::DataError(format!("Error parsing DER tag")))?;
    let (after_length, length) = parse_length(after_tag)
        .map_err(|_| Error::DataError(format!("Error parsing DER length")))?;

    if length > after_length.len() {
        return Err(Error::DataError(format!(
            "DER element of {} bytes but only {} available",
            length,
            after_length.len()
        )));
    }

    let header_size = raw.len() - after_length.len();
    let (value, rest) = after_length.split_at(length);
    let element = RawElement {
        tag,
        value,
        raw: &raw[..header_size + length],
    };
    return Ok((rest, element));
}

/// Parses a message with the form `[APPLICATION n] SEQUENCE { fields }`.
/// Returns the tags of the message and the sequence, and the fields.
fn parse_message_fields(raw: &[u8]) -> Result<(Tag, Tag, Vec<RawElement<'_>>)> {
    let (_, message) = parse_element(raw)?;
    let (_, sequence) = parse_element(message.value)?;

    let mut fields = Vec::new();
    let mut rest = sequence.value;
    while !rest.is_empty() {
        let (next, field) = parse_element(rest)?;
        fields.push(field);
        rest = next;
    }

    return Ok((message.tag, sequence.tag, fields));
}

fn is_context_field(tag: &Tag, number: u8) -> bool {
    return tag.class == TagClass::Context && tag.number == number;
}

fn missing_field(number: u8) -> Error {
    return Error::DataError(format!("Missing field [{}] in message", number));
}

fn build_element(tag: &Tag, value: &[u8]) -> Vec<u8> {
    let mut raw = tag.build();
    raw.append(&mut build_length(value.len()));
    raw.extend_from_slice(value);
    return raw;
}

/// Raw value of a context tagged field of the message, as it was encoded
pub fn context_field(raw: &[u8], number: u8) -> Result<&[u8]> {
    let (_, _, fields) = parse_message_fields(raw)?;
    return fields
        .into_iter()
        .find(|field| is_context_field(&field.tag, number))
        .map(|field| field.value)
        .ok_or(missing_field(number));
}

/// Replaces the value of a context tagged field of the message. The rest
/// of fields are kept as they are.
pub fn replace_context_field(
    raw: &[u8],
    number: u8,
    value: &[u8],
) -> Result<Vec<u8>> {
    let (message_tag, sequence_tag, fields) = parse_message_fields(raw)?;

    let mut replaced = false;
    let mut raw_fields = Vec::with_capacity(raw.len() + value.len());
    for field in fields {
        if is_context_field(&field.tag, number) {
            raw_fields.append(&mut build_element(&field.tag, value));
            replaced = true;
        } else {
            raw_fields.extend_from_slice(field.raw);
        }
    }

    if !replaced {
        return Err(missing_field(number));
    }

    let raw_sequence = build_element(&sequence_tag, &raw_fields);
    return Ok(build_element(&message_tag, &raw_sequence));
}
