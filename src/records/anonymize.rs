// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Anonymized research derivatives.
//!
//! Identifiers (name, identification number, account) are dropped, age is
//! bucketed to a decade and the timestamp is truncated to the month.

use serde::{Deserialize, Serialize};

use super::PatientRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }
}

/// Record derivative contributed to the research pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchEntry {
    pub age_group: String,
    pub gender: Gender,
    pub health_records: serde_json::Value,
    /// `YYYY-MM`.
    pub truncated_timestamp: String,
}

impl ResearchEntry {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Decade bucket: `Unknown` below zero, `100+` from 100 on.
pub fn age_group(age: i32) -> String {
    if age < 0 {
        "Unknown".to_string()
    } else if age >= 100 {
        "100+".to_string()
    } else {
        let lower = age / 10 * 10;
        format!("{}-{}", lower, lower + 9)
    }
}

pub fn anonymize(record: &PatientRecord) -> ResearchEntry {
    ResearchEntry {
        age_group: age_group(record.age),
        gender: Gender::from_label(&record.gender),
        health_records: record.health_records.clone(),
        truncated_timestamp: record.timestamp.format("%Y-%m").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fixtures::record;

    #[test]
    fn age_buckets() {
        assert_eq!(age_group(-1), "Unknown");
        assert_eq!(age_group(0), "0-9");
        assert_eq!(age_group(9), "0-9");
        assert_eq!(age_group(10), "10-19");
        assert_eq!(age_group(36), "30-39");
        assert_eq!(age_group(99), "90-99");
        assert_eq!(age_group(100), "100+");
        assert_eq!(age_group(130), "100+");
    }

    #[test]
    fn gender_labels() {
        assert_eq!(Gender::from_label("Male"), Gender::Male);
        assert_eq!(Gender::from_label(" FEMALE "), Gender::Female);
        assert_eq!(Gender::from_label("other"), Gender::Unspecified);
        assert_eq!(Gender::from_label(""), Gender::Unspecified);
    }

    #[test]
    fn anonymize_drops_identifiers() {
        let record = record("0xpatient");
        let entry = anonymize(&record);

        assert_eq!(entry.age_group, "30-39");
        assert_eq!(entry.gender, Gender::Female);
        assert_eq!(entry.truncated_timestamp, "2024-03");
        assert_eq!(entry.health_records, record.health_records);

        let json = String::from_utf8(entry.to_bytes().unwrap()).unwrap();
        assert!(!json.contains("Ada Lovelace"));
        assert!(!json.contains("ID-1815-12-10"));
        assert!(!json.contains("0xpatient"));
        assert_eq!(ResearchEntry::from_bytes(json.as_bytes()).unwrap(), entry);
    }
}
