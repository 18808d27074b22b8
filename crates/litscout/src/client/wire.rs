//! Wire models for E-utilities JSON responses.
//!
//! Every field defaults so partial payloads still parse; esummary in
//! particular omits fields freely.

use serde::Deserialize;

/// One entry in an esummary `result` map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryEntry {
    /// Article title.
    #[serde(default)]
    pub title: String,

    /// Authors in publication order.
    #[serde(default)]
    pub authors: Vec<SummaryAuthor>,

    /// Full journal name.
    #[serde(default)]
    pub fulljournalname: String,

    /// Publication date string, e.g. "2023 Mar 15".
    #[serde(default)]
    pub pubdate: String,
}

/// Author reference in an esummary entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryAuthor {
    /// Display name, e.g. "Smith J".
    #[serde(default)]
    pub name: String,
}

/// Top-level elink response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ElinkResponse {
    /// One linkset per queried id.
    #[serde(default)]
    pub linksets: Vec<Linkset>,
}

/// Link results for a single source id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Linkset {
    /// One entry per linkname that matched.
    #[serde(default)]
    pub linksetdbs: Vec<LinksetDb>,
}

/// Linked ids for one linkname.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinksetDb {
    /// The relation this list belongs to (e.g. "pubmed_pubmed_citedin").
    #[serde(default)]
    pub linkname: String,

    /// Linked ids, in provider order.
    #[serde(default)]
    pub links: Vec<LinkId>,
}

/// elink serializes ids as numbers in JSON mode, but older mirrors return
/// strings; accept both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LinkId {
    /// Numeric id.
    Num(u64),
    /// String id.
    Str(String),
}

impl LinkId {
    /// Normalize to the string form used everywhere else.
    #[must_use]
    pub fn into_id(self) -> String {
        match self {
            Self::Num(n) => n.to_string(),
            Self::Str(s) => s,
        }
    }
}
