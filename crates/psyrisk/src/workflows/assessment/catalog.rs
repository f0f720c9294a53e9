use serde::{Deserialize, Serialize};
use std::fmt;

/// Wizard block carrying one risk domain's answers. Serialized as `step2`..`step8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKey {
    Step2,
    Step3,
    Step4,
    Step5,
    Step6,
    Step7,
    Step8,
}

impl BlockKey {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Step2,
            Self::Step3,
            Self::Step4,
            Self::Step5,
            Self::Step6,
            Self::Step7,
            Self::Step8,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Step2 => "step2",
            Self::Step3 => "step3",
            Self::Step4 => "step4",
            Self::Step5 => "step5",
            Self::Step6 => "step6",
            Self::Step7 => "step7",
            Self::Step8 => "step8",
        }
    }

    /// Wizard step number, 2 through 8.
    pub const fn step(self) -> u8 {
        match self {
            Self::Step2 => 2,
            Self::Step3 => 3,
            Self::Step4 => 4,
            Self::Step5 => 5,
            Self::Step6 => 6,
            Self::Step7 => 7,
            Self::Step8 => 8,
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        Self::ordered().into_iter().find(|block| block.key() == raw)
    }

    pub fn from_step(step: u8) -> Option<Self> {
        Self::ordered().into_iter().find(|block| block.step() == step)
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One risk domain: its block, display copy, ordered questions, and numbering offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainDefinition {
    pub block: BlockKey,
    pub label: &'static str,
    pub description: &'static str,
    pub question_offset: u16,
    pub questions: Vec<&'static str>,
}

impl DomainDefinition {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Tenant-wide question number for the zero-based index within this domain.
    pub fn question_number(&self, index: usize) -> u16 {
        self.question_offset + index as u16 + 1
    }
}

/// Domain content before offsets are assigned.
#[derive(Debug, Clone)]
pub struct DomainTemplate {
    pub block: BlockKey,
    pub label: &'static str,
    pub description: &'static str,
    pub questions: Vec<&'static str>,
}

/// Ordered risk domains; numbering runs across domains in catalog order.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    domains: Vec<DomainDefinition>,
}

impl QuestionCatalog {
    pub fn standard() -> Self {
        Self::from_templates(standard_domains())
    }

    /// Assign cumulative offsets. A repeated block keeps its first definition.
    pub fn from_templates(templates: Vec<DomainTemplate>) -> Self {
        let mut domains: Vec<DomainDefinition> = Vec::with_capacity(templates.len());
        let mut offset = 0u16;

        for template in templates {
            if domains.iter().any(|domain| domain.block == template.block) {
                continue;
            }
            let count = template.questions.len() as u16;
            domains.push(DomainDefinition {
                block: template.block,
                label: template.label,
                description: template.description,
                question_offset: offset,
                questions: template.questions,
            });
            offset += count;
        }

        Self { domains }
    }

    pub fn domains(&self) -> &[DomainDefinition] {
        &self.domains
    }

    pub fn domain(&self, block: BlockKey) -> Option<&DomainDefinition> {
        self.domains.iter().find(|domain| domain.block == block)
    }

    pub fn total_questions(&self) -> usize {
        self.domains.iter().map(DomainDefinition::question_count).sum()
    }

    pub fn first_block(&self) -> Option<BlockKey> {
        self.domains.first().map(|domain| domain.block)
    }

    /// Block following `block` in catalog order.
    pub fn next_block(&self, block: BlockKey) -> Option<BlockKey> {
        let position = self.domains.iter().position(|domain| domain.block == block)?;
        self.domains.get(position + 1).map(|domain| domain.block)
    }
}

fn standard_domains() -> Vec<DomainTemplate> {
    vec![
        DomainTemplate {
            block: BlockKey::Step2,
            label: "Demands",
            description: "Workload, task pace and cognitive demands.",
            questions: vec![
                "Different groups at work demand things from me that are hard to combine?",
                "I have unachievable deadlines?",
                "I have to work very intensively?",
                "I have to neglect some tasks because I have too much to do?",
                "I am unable to take sufficient breaks?",
                "I am pressured to work long hours?",
                "I have to work very fast?",
                "I have unrealistic time pressures?",
            ],
        },
        DomainTemplate {
            block: BlockKey::Step3,
            label: "Control",
            description: "How much say workers have over how and when their work is done.",
            questions: vec![
                "I can decide when to take a break?",
                "I have a say in my own work speed?",
                "I have a choice in deciding how I do my work?",
                "I have a choice in deciding what I do at work?",
                "I have some say over the way I work?",
                "My working time can be flexible?",
            ],
        },
        DomainTemplate {
            block: BlockKey::Step4,
            label: "Manager Support",
            description: "Support provided by line management for worker wellbeing.",
            questions: vec![
                "I am given supportive feedback on the work I do?",
                "I can rely on my line manager to help me out with a work problem?",
                "I can talk to my line manager about something that has upset or annoyed me about work?",
                "I am supported through emotionally demanding work?",
                "My line manager encourages me at work?",
            ],
        },
        DomainTemplate {
            block: BlockKey::Step5,
            label: "Peer Support",
            description: "Support between colleagues.",
            questions: vec![
                "If work gets difficult, my colleagues will help me?",
                "I get the help and support I need from colleagues?",
                "I receive the respect at work I deserve from my colleagues?",
                "My colleagues are willing to listen to my work-related problems?",
            ],
        },
        DomainTemplate {
            block: BlockKey::Step6,
            label: "Relationships",
            description: "Respect, harassment, conflict and friction between colleagues.",
            questions: vec![
                "I am subject to personal harassment in the form of unkind words or behaviour?",
                "There is friction or anger between colleagues?",
                "I am subject to bullying at work?",
                "Relationships at work are strained?",
            ],
        },
        DomainTemplate {
            block: BlockKey::Step7,
            label: "Role",
            description: "Clarity of each worker's role within the organization.",
            questions: vec![
                "I am clear what is expected of me at work?",
                "I know how to go about getting my job done?",
                "I am clear what my duties and responsibilities are?",
                "I am clear about the goals and objectives for my department?",
                "I understand how my work fits into the overall aim of the organisation?",
            ],
        },
        DomainTemplate {
            block: BlockKey::Step8,
            label: "Change",
            description: "How organizational change is managed and communicated.",
            questions: vec![
                "I have sufficient opportunities to question managers about change at work?",
                "Staff are always consulted about change at work?",
                "When changes are made at work, I am clear how they will work out in practice?",
            ],
        },
    ]
}
