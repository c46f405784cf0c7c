// domain agents - one persona type, configured per domain from a table

use crate::Error;
use crate::core::guard::{Guard, Guarded};
use crate::core::Domain;
use serde::Serialize;
use std::sync::Arc;

/// Static description of one agent.
#[derive(Debug, Clone, Copy)]
pub struct AgentSpec {
    pub domain: Domain,
    pub name: &'static str,
    /// topics this agent handles, shown verbatim to the classifier
    pub description: &'static str,
    pub instruction: &'static str,
}

pub const CATALOGUE: [AgentSpec; 3] = [
    AgentSpec {
        domain: Domain::Legal,
        name: "Legal",
        description: "Expertise in legal matters, including laws, regulations, legal concepts, \
            and general legal information. Can handle questions about legal rights, contract law, \
            legal implications, and legal terminology.",
        instruction: LEGAL_INSTRUCTION,
    },
    AgentSpec {
        domain: Domain::Financial,
        name: "Financial",
        description: "Expertise in financial matters, including economics, investments, budgeting, \
            and financial planning. Can handle questions about financial concepts, market trends, \
            economic indicators, and general money management strategies.",
        instruction: FINANCIAL_INSTRUCTION,
    },
    AgentSpec {
        domain: Domain::General,
        name: "General Knowledge",
        description: "Broad expertise in various fields including science, history, culture, \
            technology, and current events. Can handle general knowledge questions on a wide range \
            of topics not specifically related to law or finance.",
        instruction: GENERAL_INSTRUCTION,
    },
];

const LEGAL_INSTRUCTION: &str = "You are a legal assistant with expertise across many areas of law. \
Provide accurate general legal information while following these rules:

1. Explain legal concepts, laws, and regulations clearly and thoroughly.
2. Give context for legal issues, including how the law has developed and current trends.
3. Explain the possible legal implications of actions or situations.
4. Clarify legal terminology and processes.
5. Point to legal resources where more detailed information can be found.
6. Always recommend consulting a qualified attorney for advice on a specific situation.
7. Do not give specific legal advice or predict the outcome of a case.
8. Stay objective and do not share personal opinions on laws.
9. Respect confidentiality and privacy.

Your purpose is to inform and educate, not to replace professional legal counsel.";

const FINANCIAL_INSTRUCTION: &str = "You are a financial assistant with broad knowledge of finance \
and economics. Provide accurate general financial information while following these rules:

1. Explain financial concepts, instruments, and markets clearly and thoroughly.
2. Give context for financial issues, including historical trends and current conditions.
3. Explain the possible financial implications of decisions or economic events.
4. Clarify financial terminology and processes.
5. Cover financial planning, budgeting, and money management in general terms.
6. Explain economic indicators and what they can mean.
7. Always recommend consulting a qualified financial advisor for advice on a specific situation.
8. Do not give specific investment advice or predict market performance.
9. Stay objective and do not endorse particular products or strategies.
10. Respect confidentiality and privacy.

Your purpose is to inform and educate, not to replace a professional financial advisor.";

const GENERAL_INSTRUCTION: &str = "You are a general knowledge assistant with a broad understanding \
of many subjects. Provide accurate information while following these rules:

1. Explain topics from science and history to culture and technology clearly.
2. Give enough background for the user to understand complex subjects.
3. Use accessible language without sacrificing accuracy.
4. Present multiple perspectives on debated topics.
5. Refer to reputable sources or the general consensus where relevant.
6. Correct common misconceptions.
7. Say so when a question is outside your knowledge and suggest a specialist.
8. Avoid personal opinions and stay neutral on controversial topics.

Your purpose is to inform and educate across a broad range of topics.";

/// A persona bound to the guard that enforces its domain's policy.
pub struct Agent {
    spec: AgentSpec,
    guard: Arc<Guard>,
}

impl Agent {
    pub fn domain(&self) -> Domain {
        self.spec.domain
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn description(&self) -> &'static str {
        self.spec.description
    }

    pub fn instruction(&self) -> &'static str {
        self.spec.instruction
    }

    pub async fn respond(&self, text: &str) -> Result<Guarded, Error> {
        self.guard
            .enforce(self.spec.domain, self.spec.instruction, text)
            .await
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub domain: Domain,
    pub name: &'static str,
    pub description: &'static str,
}

/// Read-only registry of agents, shared by every session.
pub struct Agents {
    agents: Vec<Agent>,
}

impl Agents {
    /// Registers the built-in catalogue.
    pub fn new(guard: Arc<Guard>) -> Result<Self, Error> {
        Self::from_specs(CATALOGUE, guard)
    }

    /// Fails if any agent's domain has no policy in the guard.
    pub fn from_specs(
        specs: impl IntoIterator<Item = AgentSpec>,
        guard: Arc<Guard>,
    ) -> Result<Self, Error> {
        let mut agents: Vec<Agent> = Vec::new();

        for spec in specs {
            if guard.policies().get(spec.domain).is_none() {
                return Err(Error::MissingPolicy(spec.domain));
            }
            // later specs replace earlier ones for the same domain
            agents.retain(|a| a.domain() != spec.domain);
            agents.push(Agent {
                spec,
                guard: Arc::clone(&guard),
            });
        }

        Ok(Self { agents })
    }

    pub fn get(&self, domain: Domain) -> Result<&Agent, Error> {
        self.agents
            .iter()
            .find(|a| a.domain() == domain)
            .ok_or(Error::MissingAgent(domain))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn info(&self) -> Vec<AgentInfo> {
        self.agents
            .iter()
            .map(|a| AgentInfo {
                domain: a.domain(),
                name: a.name(),
                description: a.description(),
            })
            .collect()
    }
}
