use std::io::Cursor;

use bytes::Bytes;

mod error;
pub use error::DnsError;

mod header;
pub use header::{Flags, Header};

mod name;
pub use name::Name;

mod message;
pub use message::Message;

mod question;
pub use question::Question;

mod resource_record;
pub use resource_record::ResourceRecord;

mod record_type;
pub use record_type::{Class, RecordType, CLASS_IN, TYPE_A};

pub mod resolver;
pub use resolver::{IdGenerator, RandomIds, ResolveError, Resolver, ResolverConfig};

pub const RECURSION_DESIRED: u16 = Flags::RECURSION_DESIRED;

/// Wire-format encoding and decoding.
///
/// Decoding reads from a cursor over the *whole* message so that
/// compression pointers can seek to absolute offsets.
pub trait Networkable: Sized {
    fn to_bytes(&self) -> Result<Bytes, DnsError>;

    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError>;
}
