//! EDGAR-backed implementation of [`FilingSource`].
//!
//! The SEC publishes every registrant's filing history as a JSON document at
//! `data.sec.gov/submissions/CIK##########.json`, with the recent filings in
//! column-oriented arrays. Each 10-K/10-Q filed with financial data also has
//! a machine-generated `Financial_Report.xlsx` in its archive directory —
//! that workbook is what the cleaning pipeline consumes.
//!
//! The locator maps requested fiscal years to accession numbers via the
//! submissions document, then downloads one workbook per year. Years with no
//! filing, or filings without a workbook, are omitted from the result; only
//! transport failures are errors.

use crate::client::EdgarClient;
use crate::error::{ReportError, Result};
use crate::traits::FilingSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// Subset of the submissions document the locator needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub cik: String,
    pub name: String,
    pub filings: FilingsData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilingsData {
    pub recent: RecentFilings,
}

/// Column-oriented recent filings: index `i` across all arrays describes one
/// filing.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentFilings {
    #[serde(rename = "accessionNumber")]
    pub accession_number: Vec<String>,
    #[serde(rename = "filingDate")]
    pub filing_date: Vec<String>,
    #[serde(rename = "reportDate")]
    pub report_date: Option<Vec<String>>,
    pub form: Vec<String>,
}

/// Locates and downloads `Financial_Report.xlsx` workbooks from EDGAR.
#[derive(Debug, Clone)]
pub struct EdgarFilingSource {
    client: EdgarClient,
    form_type: String,
}

impl EdgarFilingSource {
    pub fn new(client: EdgarClient) -> Self {
        EdgarFilingSource {
            client,
            form_type: "10-K".to_string(),
        }
    }

    /// Selects which periodic form to pull (defaults to "10-K").
    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        self.form_type = form_type.into();
        self
    }

    /// Fetches and parses the submissions document for a CIK.
    pub async fn submissions(&self, cik: u64) -> Result<Submission> {
        let url = format!("{}/submissions/CIK{:010}.json", self.client.data_url(), cik);
        let body = self.client.get(&url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn workbook_url(&self, cik: u64, accession_number: &str) -> String {
        format!(
            "{}/data/{}/{}/Financial_Report.xlsx",
            self.client.archives_url(),
            cik,
            accession_number.replace('-', "")
        )
    }
}

fn parse_cik(company_identifier: &str) -> Result<u64> {
    company_identifier.trim().parse::<u64>().map_err(|_| {
        ReportError::ConfigError(format!(
            "company identifier '{company_identifier}' is not a CIK number"
        ))
    })
}

/// The fiscal year a filing reports on: the year of its period-end date when
/// present, otherwise the year it was filed.
fn fiscal_year(recent: &RecentFilings, index: usize) -> Option<&str> {
    let report_date = recent
        .report_date
        .as_ref()
        .and_then(|dates| dates.get(index))
        .map(String::as_str)
        .filter(|d| d.len() >= 4);
    match report_date {
        Some(date) => Some(&date[..4]),
        None => recent
            .filing_date
            .get(index)
            .map(String::as_str)
            .filter(|d| d.len() >= 4)
            .map(|d| &d[..4]),
    }
}

#[async_trait]
impl FilingSource for EdgarFilingSource {
    async fn locate_and_fetch(
        &self,
        company_identifier: &str,
        years: &[String],
    ) -> Result<HashMap<String, Vec<u8>>> {
        let cik = parse_cik(company_identifier)?;
        let submission = self.submissions(cik).await?;
        let recent = &submission.filings.recent;

        // First match per year wins: EDGAR lists filings newest first, so
        // that is the latest (possibly amended) filing for the period.
        let mut accessions: HashMap<String, String> = HashMap::new();
        for (index, form) in recent.form.iter().enumerate() {
            if form != &self.form_type {
                continue;
            }
            let Some(year) = fiscal_year(recent, index) else {
                continue;
            };
            if !years.iter().any(|y| y == year) || accessions.contains_key(year) {
                continue;
            }
            if let Some(accession) = recent.accession_number.get(index) {
                accessions.insert(year.to_string(), accession.clone());
            }
        }

        let mut workbooks = HashMap::new();
        for (year, accession) in accessions {
            let url = self.workbook_url(cik, &accession);
            match self.client.get_bytes(&url).await {
                Ok(bytes) => {
                    tracing::debug!(%year, %accession, company = %submission.name, "downloaded filing workbook");
                    workbooks.insert(year, bytes);
                }
                Err(ReportError::NotFound) => {
                    tracing::warn!(%year, %accession, "filing has no Financial_Report.xlsx; skipping year");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(workbooks)
    }
}
