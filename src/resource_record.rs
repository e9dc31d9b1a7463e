use std::io::Cursor;
use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{instrument, warn};

use super::{Name, Networkable};
use crate::{Class, DnsError, RecordType};

/// A resource record with opaque RDATA.
///
/// Record data is not interpreted by the codec, so any type/class can be
/// carried through a decode and re-encode unchanged.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub rtype: RecordType,
    pub rclass: Class,
    pub ttl: u32,
    pub data: Bytes,
}

impl ResourceRecord {
    pub fn new(name: Name, rtype: RecordType, ttl: u32, data: impl Into<Bytes>) -> Self {
        Self {
            name,
            rtype,
            rclass: Class::IN,
            ttl,
            data: data.into(),
        }
    }

    /// The address carried by an IN A record.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        if self.rtype != RecordType::A || self.rclass != Class::IN {
            return None;
        }

        let octets = <[u8; 4]>::try_from(&self.data[..]).ok()?;
        Some(Ipv4Addr::from(octets))
    }
}

impl Networkable for ResourceRecord {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        let rd_length =
            u16::try_from(self.data.len()).or(Err(DnsError::RecordDataTooLong(self.data.len())))?;
        let name = self.name.to_bytes()?;

        let mut ret = BytesMut::with_capacity(name.len() + 10 + self.data.len());
        ret.extend_from_slice(&name);
        ret.put_u16(self.rtype.into());
        ret.put_u16(self.rclass.into());
        ret.put_u32(self.ttl);
        ret.put_u16(rd_length);
        ret.extend_from_slice(&self.data);

        Ok(ret.freeze())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let name = Name::from_bytes(bytes)?;

        if bytes.remaining() < 10 {
            return Err(DnsError::TruncatedMessage);
        }

        let rtype = RecordType(bytes.get_u16());
        let rclass = Class(bytes.get_u16());
        let ttl = bytes.get_u32();
        let rd_length = bytes.get_u16() as usize;

        if bytes.remaining() < rd_length {
            warn!(rd_length, remaining = bytes.remaining(), "record data truncated");
            return Err(DnsError::TruncatedMessage);
        }

        let data = bytes.copy_to_bytes(rd_length);

        Ok(Self {
            name,
            rtype,
            rclass,
            ttl,
            data,
        })
    }
}
