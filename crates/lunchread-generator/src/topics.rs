//! Built-in topic pool

use rand::Rng;

/// A topic articles can be written about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    /// Short kebab-case name
    pub name: &'static str,
    /// Description used in prompts
    pub description: &'static str,
}

impl Topic {
    /// Name with dashes replaced by spaces, used as a fallback tag
    pub fn display_name(&self) -> String {
        self.name.replace('-', " ")
    }
}

/// All topics
pub const TOPICS: &[Topic] = &[
    Topic {
        name: "ai-ethics",
        description: "Ethics and responsible use of artificial intelligence",
    },
    Topic {
        name: "cloud-native",
        description: "Cloud-native application development and architecture",
    },
    Topic {
        name: "cybersecurity",
        description: "Cybersecurity best practices and emerging threats",
    },
    Topic {
        name: "devops",
        description: "DevOps methodologies, tools, and practices",
    },
    Topic {
        name: "web3",
        description: "Web3 technologies including blockchain and decentralized applications",
    },
    Topic {
        name: "microservices",
        description: "Microservice architecture patterns and implementation",
    },
    Topic {
        name: "frontend-frameworks",
        description: "Modern frontend frameworks and development techniques",
    },
    Topic {
        name: "machine-learning",
        description: "Machine learning algorithms, techniques, and applications",
    },
    Topic {
        name: "data-engineering",
        description: "Data engineering, pipelines, and big data technologies",
    },
    Topic {
        name: "api-design",
        description: "API design principles, patterns, and best practices",
    },
];

/// Pick a topic uniformly at random
pub fn select_topic<R: Rng + ?Sized>(rng: &mut R) -> &'static Topic {
    &TOPICS[rng.random_range(0..TOPICS.len())]
}

/// Look a topic up by name
pub fn find_topic(name: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|topic| topic.name == name)
}
