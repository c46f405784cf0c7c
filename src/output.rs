// output formatting - readable text for humans or raw json

use crate::core::{Agents, Report, Role, Turn};
use serde::Serialize;

pub struct Output;

impl Output {
    // reply text plus which agent answered
    pub fn pretty(turn: &Turn, agents: &Agents) {
        println!("{}\n", turn.content.trim());

        if turn.role == Role::Assistant {
            match turn.domain.and_then(|d| agents.get(d).ok()) {
                Some(agent) => println!("responded by: {} agent", agent.name()),
                None => println!("responded by: orchestrator"),
            }
        }
    }

    pub fn agents(agents: &Agents) {
        for agent in agents.iter() {
            println!("{:<18} {}", agent.name(), agent.description());
        }
    }

    pub fn report(report: &Report) {
        println!("individual company analyses\n");
        for entry in &report.individual {
            println!("## {}\n", entry.company);
            println!("{}\n", entry.analysis.trim());
        }

        println!("comparative analysis\n");
        println!("{}", report.comparative.trim());
    }

    // raw json for scripts
    pub fn raw<T: Serialize>(value: &T) {
        println!("{}", serde_json::to_string(value).unwrap_or_default());
    }
}
