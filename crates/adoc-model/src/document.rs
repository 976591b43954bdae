//! Parsed document: header plus body.

use std::collections::BTreeMap;

use crate::element::Element;

/// Parsed document.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub header: Header,
    pub body: Vec<Element>,
}

/// Document header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Title from the `= Title` line, empty when absent.
    pub title: String,
    pub authors: Vec<Author>,
    pub revision: Option<Revision>,
    /// Attribute entries declared in the header.
    pub attributes: BTreeMap<String, String>,
}

/// Author from the line following the title: `Jane Doe <jane@example.com>`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

/// Revision line: `v1.0, 2024-01-01: Initial draft`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Revision {
    pub number: String,
    pub date: Option<String>,
    pub remark: Option<String>,
}
