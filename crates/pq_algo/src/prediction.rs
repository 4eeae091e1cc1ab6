//! Contest entries and their responses.
//!
//! A response is parsed once into a tagged value; binders and scorers read
//! them through caller-supplied extractor closures.

use std::collections::BTreeMap;

use pq_core::{OwnerId, Subject};

/// A guessed outcome: one subject, or several for multi-pick questions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Guess {
    Scalar(Subject),
    MultiPick(Vec<Subject>),
}

impl Guess {
    /// Picked subjects in the order given.
    pub fn picks(&self) -> &[Subject] {
        match self {
            Guess::Scalar(s) => core::slice::from_ref(s),
            Guess::MultiPick(v) => v,
        }
    }

    pub fn contains(&self, subject: &Subject) -> bool {
        self.picks().contains(subject)
    }
}

/// One answer on an entry form.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Pick(Guess),
    Number(f64),
    Flag(bool),
}

impl From<&str> for Response {
    fn from(s: &str) -> Self { Response::Pick(Guess::Scalar(s.into())) }
}

impl From<f64> for Response {
    fn from(v: f64) -> Self { Response::Number(v) }
}

impl From<bool> for Response {
    fn from(v: bool) -> Self { Response::Flag(v) }
}

impl From<Vec<&str>> for Response {
    fn from(v: Vec<&str>) -> Self {
        Response::Pick(Guess::MultiPick(v.into_iter().map(Subject::from).collect()))
    }
}

/// One participant's form: named responses to every question.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    owner: OwnerId,
    responses: BTreeMap<String, Response>,
}

impl Entry {
    pub fn new(owner: OwnerId) -> Self {
        Self { owner, responses: BTreeMap::new() }
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, response: impl Into<Response>) -> Self {
        self.responses.insert(field.into(), response.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, response: Response) {
        self.responses.insert(field.into(), response);
    }

    pub fn owner(&self) -> &OwnerId { &self.owner }

    pub fn response(&self, field: &str) -> Option<&Response> { self.responses.get(field) }

    pub fn responses(&self) -> impl Iterator<Item = (&str, &Response)> {
        self.responses.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The guess stored under `field`, if it is a pick.
    pub fn guess(&self, field: &str) -> Option<&Guess> {
        match self.responses.get(field)? {
            Response::Pick(g) => Some(g),
            _ => None,
        }
    }

    /// The number stored under `field`, if it is numeric.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.responses.get(field)? {
            Response::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.responses.get(field)? {
            Response::Flag(b) => Some(*b),
            _ => None,
        }
    }
}
