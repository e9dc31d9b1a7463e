use std::io::Cursor;

use bytes::{Bytes, BytesMut};
use tracing::{debug, instrument};

use super::{Flags, Header, Networkable, Question, ResourceRecord};
use crate::DnsError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    /// A recursion-desired query carrying a single question.
    pub fn query(id: u16, question: Question) -> Self {
        let mut header = Header::new(id, Flags::from_bits(Flags::RECURSION_DESIRED));
        header.question_count = 1;

        Self {
            header,
            questions: vec![question],
            ..Default::default()
        }
    }

    pub fn add_question(&mut self, question: Question) -> Result<(), DnsError> {
        increment(&mut self.header.question_count)?;
        self.questions.push(question);
        Ok(())
    }

    pub fn add_answer(&mut self, answer: ResourceRecord) -> Result<(), DnsError> {
        increment(&mut self.header.answer_count)?;
        self.answers.push(answer);
        Ok(())
    }

    pub fn add_authority(&mut self, authority: ResourceRecord) -> Result<(), DnsError> {
        increment(&mut self.header.authority_count)?;
        self.authorities.push(authority);
        Ok(())
    }

    pub fn add_additional(&mut self, additional: ResourceRecord) -> Result<(), DnsError> {
        increment(&mut self.header.additional_count)?;
        self.additionals.push(additional);
        Ok(())
    }

    fn check_counts(&self) -> Result<(), DnsError> {
        let header = &self.header;
        let matches = self.questions.len() == header.question_count as usize
            && self.answers.len() == header.answer_count as usize
            && self.authorities.len() == header.authority_count as usize
            && self.additionals.len() == header.additional_count as usize;

        if matches {
            Ok(())
        } else {
            Err(DnsError::SectionCountMismatch)
        }
    }
}

fn increment(count: &mut u16) -> Result<(), DnsError> {
    *count = count.checked_add(1).ok_or(DnsError::SectionFull)?;
    Ok(())
}

fn read_records(
    bytes: &mut Cursor<&[u8]>,
    count: u16,
) -> Result<Vec<ResourceRecord>, DnsError> {
    (0..count)
        .map(|_| ResourceRecord::from_bytes(bytes))
        .collect()
}

impl Networkable for Message {
    #[instrument(level = "debug", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        self.check_counts()?;

        let mut ret = BytesMut::new();
        ret.extend_from_slice(&self.header.to_bytes()?);

        for question in &self.questions {
            ret.extend_from_slice(&question.to_bytes()?);
        }

        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            ret.extend_from_slice(&record.to_bytes()?);
        }

        Ok(ret.freeze())
    }

    #[instrument(level = "debug", skip_all)]
    fn from_bytes(bytes: &mut Cursor<&[u8]>) -> Result<Self, DnsError> {
        let header = Header::from_bytes(bytes)?;
        debug!(
            id = header.id,
            questions = header.question_count,
            answers = header.answer_count,
            authorities = header.authority_count,
            additionals = header.additional_count,
            "parsing message"
        );

        let questions = (0..header.question_count)
            .map(|_| Question::from_bytes(bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let answers = read_records(bytes, header.answer_count)?;
        let authorities = read_records(bytes, header.authority_count)?;
        let additionals = read_records(bytes, header.additional_count)?;

        let message = Self {
            header,
            questions,
            answers,
            authorities,
            additionals,
        };
        message.check_counts()?;

        Ok(message)
    }
}
