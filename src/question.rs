use std::io::Cursor;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::instrument;

use super::{Name, Networkable};
use crate::{Class, DnsError, RecordType};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Question {
    pub name: Name,
    pub qtype: RecordType,
    pub qclass: Class,
}

impl Question {
    pub fn new(name: Name, qtype: RecordType) -> Self {
        Self {
            name,
            qtype,
            qclass: Class::IN,
        }
    }
}

impl Networkable for Question {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        let name = self.name.to_bytes()?;

        let mut ret = BytesMut::with_capacity(name.len() + 4);
        ret.extend_from_slice(&name);
        ret.put_u16(self.qtype.into());
        ret.put_u16(self.qclass.into());

        Ok(ret.freeze())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let name = Name::from_bytes(bytes)?;

        if bytes.remaining() < 4 {
            return Err(DnsError::TruncatedMessage);
        }

        let qtype = RecordType(bytes.get_u16());
        let qclass = Class(bytes.get_u16());

        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }
}
