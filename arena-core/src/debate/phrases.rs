use std::collections::HashMap;

use rand::seq::SliceRandom;

use crate::models::AgentRole;

/// Canned lines each role may say during a debate.
#[derive(Debug, Clone)]
pub struct PhraseTable {
    phrases: HashMap<AgentRole, Vec<String>>,
}

impl PhraseTable {
    pub fn empty() -> Self {
        Self {
            phrases: HashMap::new(),
        }
    }

    pub fn with_phrases<I, S>(mut self, role: AgentRole, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phrases
            .insert(role, phrases.into_iter().map(Into::into).collect());
        self
    }

    pub fn phrases(&self, role: AgentRole) -> &[String] {
        self.phrases.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Uniform pick; `None` when the role has nothing to say.
    pub fn pick(&self, role: AgentRole) -> Option<&str> {
        self.phrases(role)
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    pub fn contains(&self, role: AgentRole, content: &str) -> bool {
        self.phrases(role).iter().any(|p| p == content)
    }
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self::empty()
            .with_phrases(
                AgentRole::Pm,
                [
                    "Let's break down the project requirements. We need to prioritize core features first.",
                    "I suggest we start with the MVP and iterate based on user feedback.",
                    "The timeline looks tight. Let's focus on what delivers the most value.",
                    "We should align on the technical approach before diving into implementation.",
                ],
            )
            .with_phrases(
                AgentRole::Dev,
                [
                    "I can build this using Next.js with TypeScript for type safety.",
                    "We should set up CI/CD early to catch issues fast.",
                    "Let me propose a microservices architecture for better scalability.",
                    "I'll need the API contracts defined before I can start the frontend work.",
                ],
            )
            .with_phrases(
                AgentRole::Ux,
                [
                    "The user flow should be intuitive and minimize cognitive load.",
                    "I recommend doing user research before finalizing the design.",
                    "Let's ensure the interface is accessible and mobile-responsive.",
                    "We need to consider edge cases in the user journey.",
                ],
            )
            .with_phrases(
                AgentRole::Qa,
                [
                    "I'll set up automated testing from the start to prevent regression.",
                    "We should define acceptance criteria for each feature clearly.",
                    "Let's not skip edge case testing - that's where bugs hide.",
                    "I recommend integration tests to ensure components work together.",
                ],
            )
    }
}
