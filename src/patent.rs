//! Bibliographic record types returned by the enrichment endpoint.
//!
//! Only the fields the results table needs are modelled; everything else in
//! the payload is ignored by serde.

use serde::{Deserialize, Serialize};

/// One enriched patent as returned by `POST /api/v1/search/bibliography`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibliographicRecord {
    pub patent_id: String,
    #[serde(default)]
    pub bibliographic_data: BibliographicData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibliographicData {
    /// Titles in one or more languages, first entry is displayed
    #[serde(default)]
    pub invention_title: Vec<InventionTitle>,
    #[serde(default)]
    pub parties: Parties,
    #[serde(default)]
    pub application_reference: DocumentReference,
    #[serde(default)]
    pub publication_reference: DocumentReference,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventionTitle {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parties {
    #[serde(default)]
    pub applicants: Vec<Party>,
    #[serde(default)]
    pub inventors: Vec<Party>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    #[serde(default)]
    pub name: String,
}

/// Application or publication reference; `date` is kept as the API formats it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentReference {
    #[serde(default, deserialize_with = "string_or_number")]
    pub date: String,
}

impl BibliographicRecord {
    /// First invention title, empty when the record has none
    pub fn title(&self) -> &str {
        self.bibliographic_data
            .invention_title
            .first()
            .map(|t| t.text.as_str())
            .unwrap_or_default()
    }

    pub fn applicant_names(&self) -> Vec<&str> {
        self.bibliographic_data
            .parties
            .applicants
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn inventor_names(&self) -> Vec<&str> {
        self.bibliographic_data
            .parties
            .inventors
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn application_date(&self) -> &str {
        &self.bibliographic_data.application_reference.date
    }

    pub fn publication_date(&self) -> &str {
        &self.bibliographic_data.publication_reference.date
    }
}

/// Dates arrive either as `"20200101"` or as a bare number `20200101`
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
