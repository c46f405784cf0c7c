// company analysis - four documents in, one table per company plus a comparison out

use crate::Error;
use crate::core::ai::{DEFAULT_TIMEOUT, Generator, generate_within};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const COMPANY_COUNT: usize = 4;

/// Per-company text handed to the model, in characters.
pub const MAX_COMPANY_CHARS: usize = 100_000;

const SEGMENT_CHARS: usize = 1_000;

const ANALYST_INSTRUCTION: &str =
    "You are a business analyst. Answer only with well-formed markdown tables as requested.";

const CATEGORIES: [&str; 6] = [
    "Financial Performance",
    "Market Position",
    "Operational Efficiency",
    "Innovation and R&D",
    "Key Strengths",
    "Key Weaknesses",
];

/// Turns a file into ordered text segments.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Vec<String>, Error>;
}

/// Loads utf-8 text files, split on paragraph breaks into ~1000 character segments.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Vec<String>, Error> {
        let text = std::fs::read_to_string(path)?;
        Ok(split_segments(&text, SEGMENT_CHARS))
    }
}

// greedy paragraph packing, a single oversized paragraph stays whole
fn split_segments(text: &str, size: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let needed = if current.is_empty() {
            paragraph.chars().count()
        } else {
            current.chars().count() + 2 + paragraph.chars().count()
        };

        if needed > size && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
}

impl CompanyDocument {
    pub fn load(loader: &dyn DocumentLoader, path: &Path) -> Result<Self, Error> {
        let segments = loader.load(path)?;
        Ok(Self {
            name: None,
            text: segments.join("\n"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyAnalysis {
    pub company: String,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub individual: Vec<CompanyAnalysis>,
    pub comparative: String,
}

pub struct Analyst {
    generator: Arc<dyn Generator>,
    timeout: Duration,
}

impl Analyst {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Analyzes exactly four companies one by one, then compares them.
    /// Unnamed documents are labelled Company A to Company D by position.
    pub async fn analyze(&self, companies: Vec<CompanyDocument>) -> Result<Report, Error> {
        if companies.len() != COMPANY_COUNT {
            return Err(Error::InvalidInput(format!(
                "exactly {COMPANY_COUNT} company documents are required, got {}",
                companies.len()
            )));
        }

        // names and texts are checked up front so a bad request costs no calls
        let mut named: Vec<(String, String)> = Vec::with_capacity(COMPANY_COUNT);
        for (i, doc) in companies.into_iter().enumerate() {
            let company = doc
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| default_name(i));

            if doc.text.trim().is_empty() {
                return Err(Error::InvalidInput(format!("no text for {company}")));
            }
            if named.iter().any(|(seen, _)| *seen == company) {
                return Err(Error::InvalidInput(format!("company {company} appears twice")));
            }
            named.push((company, doc.text));
        }

        let mut individual = Vec::with_capacity(COMPANY_COUNT);
        for (company, text) in named {
            debug!(company = company.as_str(), "analyzing company");
            let prompt = company_prompt(&company, truncate_chars(&text, MAX_COMPANY_CHARS));
            let analysis = self.generate(&prompt).await?;
            individual.push(CompanyAnalysis { company, analysis });
        }

        debug!("comparing companies");
        let comparative = self.generate(&comparison_prompt(&individual)).await?;
        info!(companies = individual.len(), "analysis complete");

        Ok(Report {
            individual,
            comparative,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, Error> {
        Ok(generate_within(self.generator.as_ref(), self.timeout, ANALYST_INSTRUCTION, prompt).await?)
    }
}

fn default_name(index: usize) -> String {
    let letter = (b'A' + index as u8) as char;
    format!("Company {letter}")
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn company_prompt(company: &str, data: &str) -> String {
    let mut rows = String::new();
    for category in CATEGORIES {
        rows.push_str(&format!("| {category} | (analysis here) |\n"));
    }

    format!(
        "Analyze the following data for {company}. Provide a concise summary covering:\n\
         1. Financial Performance\n\
         2. Market Position\n\
         3. Operational Efficiency\n\
         4. Innovation and R&D\n\
         5. Key Strengths and Weaknesses\n\n\
         Data:\n{data}\n\n\
         Provide a brief analysis in the following markdown table format:\n\n\
         | Category | Analysis |\n\
         | --- | --- |\n\
         {rows}\n\
         Make sure every row starts and ends with the | character and that the separator \
         row (| --- | --- |) is included.\n\n\
         Analysis:"
    )
}

fn comparison_prompt(analyses: &[CompanyAnalysis]) -> String {
    let names: Vec<&str> = analyses.iter().map(|a| a.company.as_str()).collect();
    let blocks: Vec<String> = analyses
        .iter()
        .map(|a| format!("{}:\n{}", a.company, a.analysis))
        .collect();

    let header = format!("| Category | {} |", names.join(" | "));
    let separator = format!("|{}", " --- |".repeat(names.len() + 1));
    let cells = vec!["(analysis)"; names.len()].join(" | ");
    let mut rows = String::new();
    for category in CATEGORIES {
        rows.push_str(&format!("| {category} | {cells} |\n"));
    }
    let first = names.first().copied().unwrap_or("the first company");

    format!(
        "Compare the following companies based on their individual analyses:\n\n\
         {}\n\n\
         Provide a comprehensive comparative analysis in the following markdown table format:\n\n\
         {header}\n{separator}\n{rows}\n\
         Then provide strategic recommendations for {first} in a separate markdown table:\n\n\
         | Recommendation | Description |\n\
         | --- | --- |\n\
         | Recommendation 1 | (description) |\n\
         | Recommendation 2 | (description) |\n\
         | Recommendation 3 | (description) |\n\n\
         Make sure every row of both tables starts and ends with the | character and that \
         each table has its separator row.\n\n\
         Comparative Analysis:",
        blocks.join("\n\n")
    )
}
