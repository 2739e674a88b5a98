use super::domain::NewProspect;
use crate::funnel::{FunnelSignals, FunnelStage, UnknownStage};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

/// Loads prospect drafts from a CSV export of the prospect table.
///
/// Expected headers: `code,name,stage,action_taken,link_clicked,registered,
/// shop_configured,product_count,link_shared,order_count,timer_started_at`.
/// Only `code` and `name` are required; empty cells read as false/0/none.
pub struct ProspectCsvImporter;

impl ProspectCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<NewProspect>, ProspectImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<NewProspect>, ProspectImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut drafts = Vec::new();

        for (index, record) in csv_reader.deserialize::<ProspectRow>().enumerate() {
            let row = record?;
            // Header is line 1.
            let line = index + 2;
            drafts.push(row.into_draft(line)?);
        }

        Ok(drafts)
    }
}

#[derive(Debug, Deserialize)]
struct ProspectRow {
    code: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    stage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    action_taken: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    link_clicked: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    registered: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    shop_configured: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    product_count: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    link_shared: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    order_count: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    timer_started_at: Option<String>,
}

impl ProspectRow {
    fn into_draft(self, line: usize) -> Result<NewProspect, ProspectImportError> {
        let invalid = |column: &'static str, value: &str| ProspectImportError::InvalidValue {
            line,
            column,
            value: value.to_string(),
        };

        let stage = match self.stage.as_deref() {
            Some(raw) => raw
                .parse::<FunnelStage>()
                .map_err(|source| ProspectImportError::Stage { line, source })?,
            None => FunnelStage::default(),
        };

        let flag = |column: &'static str, value: &Option<String>| match value.as_deref() {
            None => Ok(false),
            Some(raw) => parse_flag(raw).ok_or_else(|| invalid(column, raw)),
        };
        let count = |column: &'static str, value: &Option<String>| match value.as_deref() {
            None => Ok(0),
            Some(raw) => raw.parse::<u32>().map_err(|_| invalid(column, raw)),
        };

        let signals = FunnelSignals {
            action_taken: flag("action_taken", &self.action_taken)?,
            link_clicked: flag("link_clicked", &self.link_clicked)?,
            registered: flag("registered", &self.registered)?,
            shop_configured: flag("shop_configured", &self.shop_configured)?,
            product_count: count("product_count", &self.product_count)?,
            link_shared: flag("link_shared", &self.link_shared)?,
            order_count: count("order_count", &self.order_count)?,
        };

        let timer_started_at = match self.timer_started_at.as_deref() {
            Some(raw) => {
                Some(parse_timestamp(raw).ok_or_else(|| invalid("timer_started_at", raw))?)
            }
            None => None,
        };

        Ok(NewProspect {
            code: self.code,
            name: self.name,
            stage,
            signals,
            timer_started_at,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "x" | "oui" => Some(true),
        "false" | "0" | "no" | "n" | "non" => Some(false),
        _ => None,
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Debug)]
pub enum ProspectImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Stage {
        line: usize,
        source: UnknownStage,
    },
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
}

impl std::fmt::Display for ProspectImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProspectImportError::Io(err) => write!(f, "failed to read prospect export: {}", err),
            ProspectImportError::Csv(err) => write!(f, "invalid prospect CSV data: {}", err),
            ProspectImportError::Stage { line, source } => write!(f, "line {}: {}", line, source),
            ProspectImportError::InvalidValue {
                line,
                column,
                value,
            } => write!(f, "line {}: invalid {} value '{}'", line, column, value),
        }
    }
}

impl std::error::Error for ProspectImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProspectImportError::Io(err) => Some(err),
            ProspectImportError::Csv(err) => Some(err),
            ProspectImportError::Stage { source, .. } => Some(source),
            ProspectImportError::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ProspectImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ProspectImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "code,name,stage,action_taken,link_clicked,registered,shop_configured,product_count,link_shared,order_count,timer_started_at\n";

    #[test]
    fn reads_full_and_sparse_rows() {
        let csv = format!(
            "{HEADER}P-001,Atelier Nord,Catalogue,true,true,true,true,0,,,2025-09-30T08:00:00Z\nP-002,Boutique Sud,,,,,,,,,\n"
        );

        let drafts = ProspectCsvImporter::from_reader(Cursor::new(csv)).expect("parses");
        assert_eq!(drafts.len(), 2);

        let first = &drafts[0];
        assert_eq!(first.code, "P-001");
        assert_eq!(first.stage, FunnelStage::Catalog);
        assert!(first.signals.shop_configured);
        assert_eq!(first.signals.product_count, 0);
        assert_eq!(
            first.timer_started_at,
            Utc.with_ymd_and_hms(2025, 9, 30, 8, 0, 0).single()
        );

        let second = &drafts[1];
        assert_eq!(second.stage, FunnelStage::Prospecting);
        assert_eq!(second.signals, FunnelSignals::default());
        assert!(second.timer_started_at.is_none());
    }

    #[test]
    fn reports_line_of_bad_values() {
        let csv = format!("{HEADER}P-001,Atelier,sales,maybe,,,,,,,\n");
        match ProspectCsvImporter::from_reader(Cursor::new(csv)) {
            Err(ProspectImportError::InvalidValue { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "action_taken");
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_stage() {
        let csv = format!("{HEADER}P-001,Atelier,Churned,,,,,,,,\n");
        assert!(matches!(
            ProspectCsvImporter::from_reader(Cursor::new(csv)),
            Err(ProspectImportError::Stage { line: 2, .. })
        ));
    }

    #[test]
    fn parses_dates_as_utc_midnight() {
        assert_eq!(
            parse_timestamp("2025-09-30"),
            Utc.with_ymd_and_hms(2025, 9, 30, 0, 0, 0).single()
        );
        assert!(parse_timestamp("30/09/2025").is_none());
    }
}
