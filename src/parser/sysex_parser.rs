use crate::parser::primitive_parser::{parse_u8, parse_var_len_bytes, SmfResult};
use nom::combinator::map;
use nom::Parser;

pub const SYSEX_START: u8 = 0xF0;
/// Escape marker, also terminates a sysex message payload.
pub const SYSEX_END: u8 = 0xF7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SysexEvent {
    /// Complete message in a single packet.
    Normal(Vec<u8>),
    /// Message split across several packets, the last one ending with 0xF7.
    Divided(Vec<Vec<u8>>),
    /// 0xF7 escaped bytes, copied as is.
    Authorization(Vec<u8>),
}

impl SysexEvent {
    /// Total payload bytes over all packets.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Normal(payload) | Self::Authorization(payload) => payload.len(),
            Self::Divided(packets) => packets.iter().map(Vec::len).sum(),
        }
    }
}

/// Parse a system exclusive event, input positioned on the 0xF0 or 0xF7 marker.
pub fn parse_sysex_event(i: &[u8]) -> SmfResult<'_, SysexEvent> {
    let (i, marker) = parse_u8(i)?;
    if marker == SYSEX_END {
        log::debug!("Parsing sysex escape packet");
        return map(parse_var_len_bytes, |payload: &[u8]| {
            SysexEvent::Authorization(payload.to_vec())
        })
        .parse(i);
    }

    let mut i = i;
    let mut packets: Vec<Vec<u8>> = Vec::new();
    loop {
        let (inner, packet) = parse_var_len_bytes(i)?;
        i = inner;
        packets.push(packet.to_vec());
        if packet.last() == Some(&SYSEX_END) {
            break;
        }
    }
    log::debug!("Parsed sysex message with {} packet(s)", packets.len());

    let event = if packets.len() == 1 {
        SysexEvent::Normal(packets.swap_remove(0))
    } else {
        SysexEvent::Divided(packets)
    };
    Ok((i, event))
}
