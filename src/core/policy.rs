// content policies - blocked input/output terms and the refusal for each domain
// plain case-insensitive substring checks, nothing clever

use crate::Error;
use crate::core::Domain;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "PolicyFields")]
pub struct Policy {
    blocked_input: Vec<String>,
    blocked_output: Vec<String>,
    refusal: String,
}

// shape of one table in the policy file
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFields {
    refusal: String,
    #[serde(default)]
    blocked_input: Vec<String>,
    #[serde(default)]
    blocked_output: Vec<String>,
}

impl From<PolicyFields> for Policy {
    fn from(fields: PolicyFields) -> Self {
        Policy::new(fields.blocked_input, fields.blocked_output, fields.refusal)
    }
}

impl Policy {
    pub fn new<I, O, S>(blocked_input: I, blocked_output: O, refusal: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocked_input: normalize(blocked_input),
            blocked_output: normalize(blocked_output),
            refusal: refusal.into(),
        }
    }

    /// first blocked-input term found in `text`, if any
    pub fn blocks_input(&self, text: &str) -> Option<&str> {
        find_term(&self.blocked_input, text)
    }

    /// first blocked-output term found in `text`, if any
    pub fn blocks_output(&self, text: &str) -> Option<&str> {
        find_term(&self.blocked_output, text)
    }

    pub fn refusal(&self) -> &str {
        &self.refusal
    }
}

// patterns are stored lower-cased; empty ones would match everything so they go
fn normalize<I, S>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| p.as_ref().trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn find_term<'a>(terms: &'a [String], text: &str) -> Option<&'a str> {
    let text = text.to_lowercase();
    terms
        .iter()
        .find(|term| text.contains(term.as_str()))
        .map(String::as_str)
}

/// Every domain's policy, fixed after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySet {
    policies: BTreeMap<Domain, Policy>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    legal: Option<Policy>,
    financial: Option<Policy>,
    general: Option<Policy>,
}

impl PolicySet {
    pub fn empty() -> Self {
        Self {
            policies: BTreeMap::new(),
        }
    }

    /// The built-in rails for legal, financial, and general questions.
    pub fn defaults() -> Self {
        Self::empty()
            .with(
                Domain::Legal,
                Policy::new(
                    ["illegal activities"],
                    ["encourage illegal activities"],
                    "I'm not able to assist with requests related to illegal activities. \
                     Is there a legal matter I can help you with instead?",
                ),
            )
            .with(
                Domain::Financial,
                Policy::new(
                    ["illegal financial activities", "money laundering"],
                    ["tax evasion strategies"],
                    "I'm not able to assist with requests related to illegal financial activities. \
                     Is there a legal financial matter I can help you with instead?",
                ),
            )
            .with(
                Domain::General,
                Policy::new(
                    ["illegal activities"],
                    ["instructions for illegal activities"],
                    "I'm not able to assist with requests related to illegal activities. \
                     Is there another topic I can help you with instead?",
                ),
            )
    }

    pub fn with(mut self, domain: Domain, policy: Policy) -> Self {
        self.policies.insert(domain, policy);
        self
    }

    /// Built-in defaults, with any domain named in the toml text replaced.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let file: PolicyFile = toml::from_str(text)?;
        let mut set = Self::defaults();

        let overrides = [
            (Domain::Legal, file.legal),
            (Domain::Financial, file.financial),
            (Domain::General, file.general),
        ];
        for (domain, policy) in overrides {
            if let Some(policy) = policy {
                set.policies.insert(domain, policy);
            }
        }

        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|source| Error::PolicyFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, domain: Domain) -> Option<&Policy> {
        self.policies.get(&domain)
    }

    /// Fails on the first domain with no bound policy.
    pub fn ensure_complete(&self) -> Result<(), Error> {
        match Domain::ALL.into_iter().find(|d| !self.policies.contains_key(d)) {
            Some(domain) => Err(Error::MissingPolicy(domain)),
            None => Ok(()),
        }
    }
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::defaults()
    }
}
