use std::io::Cursor;

use bitfield::bitfield;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{instrument, warn};

use super::Networkable;
use crate::DnsError;

pub const HEADER_LEN: usize = 12;

bitfield! {
    #[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Flags(u16);
    impl Debug;
    u8;
    // query or response
    pub qr, set_qr: 15;
    // query type
    pub opcode, set_opcode: 14, 11;
    // authoritative answerer
    pub aa, set_aa: 10;
    // truncation
    pub tc, set_tc: 9;
    // recursion desired
    pub rd, set_rd: 8;
    // recursion available
    pub ra, set_ra: 7;
    // reserved
    pub z, set_z: 6;
    pub ad, set_ad: 5;
    pub cd, set_cd: 4;
    // response code
    pub rcode, set_rcode: 3, 0;
}

impl Flags {
    pub const RECURSION_DESIRED: u16 = 0x0100;

    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl Header {
    pub fn new(id: u16, flags: Flags) -> Self {
        Self {
            id,
            flags,
            ..Default::default()
        }
    }
}

impl Networkable for Header {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        let mut ret = BytesMut::with_capacity(HEADER_LEN);
        ret.put_u16(self.id);
        ret.put_u16(self.flags.bits());
        ret.put_u16(self.question_count);
        ret.put_u16(self.answer_count);
        ret.put_u16(self.authority_count);
        ret.put_u16(self.additional_count);

        Ok(ret.freeze())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        if bytes.remaining() < HEADER_LEN {
            warn!(remaining = bytes.remaining(), "insufficient bytes for header");
            return Err(DnsError::TruncatedMessage);
        }

        Ok(Self {
            id: bytes.get_u16(),
            flags: Flags::from_bits(bytes.get_u16()),
            question_count: bytes.get_u16(),
            answer_count: bytes.get_u16(),
            authority_count: bytes.get_u16(),
            additional_count: bytes.get_u16(),
        })
    }
}
