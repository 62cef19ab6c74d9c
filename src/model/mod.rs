// Flowboard — Workflow data model (workflows, steps, playbooks)

pub mod ids;

pub use ids::{StepId, StepIdGenerator, WorkflowId};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Title given to a workflow synthesized by the editor.
pub const DEFAULT_TITLE: &str = "My new workflow";

/// Instruction of the single step a synthesized workflow starts with.
pub const DEFAULT_INSTRUCTION: &str =
    "Add your first step and assign it either to the AI or to a human";

// ---------------------------------------------------------------------------
// Executors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Executor {
    Ai,
    Human,
}

impl Executor {
    pub fn label(&self) -> &'static str {
        match self {
            Executor::Ai => "AI",
            Executor::Human => "Human",
        }
    }
}

/// The fixed set of people a step can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Human {
    #[default]
    #[serde(rename = "Femi Ibrahim")]
    FemiIbrahim,
    #[serde(rename = "Jason Mao")]
    JasonMao,
}

impl Human {
    pub const ALL: [Human; 2] = [Human::FemiIbrahim, Human::JasonMao];

    pub fn name(&self) -> &'static str {
        match self {
            Human::FemiIbrahim => "Femi Ibrahim",
            Human::JasonMao => "Jason Mao",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.name() == name)
    }

    /// Next person in the fixed list, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            Human::FemiIbrahim => Human::JasonMao,
            Human::JasonMao => Human::FemiIbrahim,
        }
    }
}

impl fmt::Display for Human {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who runs a step. A human assignment only exists for human steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignee {
    Ai,
    Human(Human),
}

impl Assignee {
    pub fn executor(&self) -> Executor {
        match self {
            Assignee::Ai => Executor::Ai,
            Assignee::Human(_) => Executor::Human,
        }
    }

    pub fn human(&self) -> Option<Human> {
        match self {
            Assignee::Ai => None,
            Assignee::Human(h) => Some(*h),
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StepRecord", into = "StepRecord")]
pub struct Step {
    pub id: StepId,
    pub instruction: String,
    pub assignee: Assignee,
}

impl Step {
    pub fn new(id: StepId, instruction: impl Into<String>) -> Self {
        Self {
            id,
            instruction: instruction.into(),
            assignee: Assignee::Ai,
        }
    }

    pub fn executor(&self) -> Executor {
        self.assignee.executor()
    }

    /// Switch executor. Moving to human keeps an existing assignment or
    /// picks the first fixed human; moving to AI drops the assignment.
    pub fn set_executor(&mut self, executor: Executor) {
        self.assignee = match (executor, self.assignee) {
            (Executor::Ai, _) => Assignee::Ai,
            (Executor::Human, Assignee::Human(h)) => Assignee::Human(h),
            (Executor::Human, Assignee::Ai) => Assignee::Human(Human::default()),
        };
    }
}

/// Wire shape of a step: `executor` plus an optional `assignedHuman`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StepRecord {
    id: StepId,
    #[serde(default)]
    instruction: String,
    executor: Executor,
    #[serde(
        rename = "assignedHuman",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    assigned_human: Option<String>,
}

impl From<StepRecord> for Step {
    fn from(record: StepRecord) -> Self {
        let assignee = match record.executor {
            Executor::Ai => Assignee::Ai,
            Executor::Human => {
                let human = match record.assigned_human.as_deref() {
                    Some(name) => Human::from_name(name).unwrap_or_else(|| {
                        tracing::warn!(step = %record.id, assignee = name, "Unknown assignee, using default");
                        Human::default()
                    }),
                    None => Human::default(),
                };
                Assignee::Human(human)
            }
        };
        Step {
            id: record.id,
            instruction: record.instruction,
            assignee,
        }
    }
}

impl From<Step> for StepRecord {
    fn from(step: Step) -> Self {
        StepRecord {
            id: step.id,
            instruction: step.instruction,
            executor: step.assignee.executor(),
            assigned_human: step.assignee.human().map(|h| h.name().to_string()),
        }
    }
}

/// Short executor breakdown such as `"2 AI, 1 Human"`.
pub fn step_summary(steps: &[Step]) -> String {
    if steps.is_empty() {
        return "No steps".to_string();
    }

    let ai = steps.iter().filter(|s| s.executor() == Executor::Ai).count();
    let human = steps.len() - ai;

    let mut parts = Vec::with_capacity(2);
    if ai > 0 {
        parts.push(format!("{} AI", ai));
    }
    if human > 0 {
        parts.push(format!("{} Human", human));
    }
    parts.join(", ")
}

// ---------------------------------------------------------------------------
// Playbooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Playbook {
    FailingToClose,
    DealsDropOff,
    NotMovingForward,
    AcvOffWhack,
}

impl Playbook {
    pub const ALL: [Playbook; 4] = [
        Playbook::FailingToClose,
        Playbook::DealsDropOff,
        Playbook::NotMovingForward,
        Playbook::AcvOffWhack,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Playbook::FailingToClose => "failing-to-close",
            Playbook::DealsDropOff => "deals-drop-off",
            Playbook::NotMovingForward => "not-moving-forward",
            Playbook::AcvOffWhack => "acv-off-whack",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn section(&self) -> &'static PlaybookSection {
        &PLAYBOOK_SECTIONS[Self::ALL.iter().position(|p| p == self).unwrap_or(0)]
    }
}

/// Static grouping shown on the Playbooks tab.
#[derive(Debug)]
pub struct PlaybookSection {
    pub id: Playbook,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub static PLAYBOOK_SECTIONS: [PlaybookSection; 4] = [
    PlaybookSection {
        id: Playbook::FailingToClose,
        title: "Rep is failing to close deals",
        description: "Comprehensive playbooks designed to help sales reps overcome common obstacles in the deal closure process, including objection handling, pricing negotiations, and timing issues.",
        icon: "◎",
    },
    PlaybookSection {
        id: Playbook::DealsDropOff,
        title: "Deals drop off in negotiation",
        description: "Strategic approaches to prevent deal abandonment during critical negotiation phases, with focus on maintaining momentum and addressing buyer concerns.",
        icon: "⚡",
    },
    PlaybookSection {
        id: Playbook::NotMovingForward,
        title: "Rep is not moving deals forward in earlier stages",
        description: "Tactical workflows to accelerate deal progression through discovery, qualification, and proposal stages with systematic follow-up strategies.",
        icon: "➶",
    },
    PlaybookSection {
        id: Playbook::AcvOffWhack,
        title: "ACV optimization strategies",
        description: "Data-driven approaches to optimize Annual Contract Value through upselling, cross-selling, and strategic pricing adjustments.",
        icon: "$",
    },
];

/// Unknown categories map to `None` so one odd row cannot fail a whole list.
fn lenient_playbook<'de, D>(deserializer: D) -> Result<Option<Playbook>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|id| {
        let parsed = Playbook::from_id(id);
        if parsed.is_none() {
            tracing::warn!(playbook = id, "Ignoring unknown playbook category");
        }
        parsed
    }))
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// A workflow as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(rename = "isRunning", default)]
    pub is_running: bool,
    #[serde(rename = "isPlaybookWorkflow", default)]
    pub is_playbook_workflow: bool,
    #[serde(default, deserialize_with = "lenient_playbook")]
    pub playbook: Option<Playbook>,
    #[serde(default)]
    pub playbook_description: Option<String>,
}

impl Workflow {
    /// Instruction of the first step, used as the row subtitle.
    pub fn preview(&self) -> Option<&str> {
        self.steps.first().map(|s| s.instruction.as_str())
    }
}

/// The editable fields of a workflow, compared structurally for dirty state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDraft {
    pub title: String,
    pub steps: Vec<Step>,
    pub is_playbook_workflow: bool,
    pub playbook_description: String,
}

impl WorkflowDraft {
    pub fn synthesized(ids: &mut StepIdGenerator) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            steps: vec![Step::new(ids.next_id(), DEFAULT_INSTRUCTION)],
            is_playbook_workflow: false,
            playbook_description: String::new(),
        }
    }

    pub fn document(&self) -> WorkflowDocument {
        WorkflowDocument {
            title: self.title.clone(),
            steps: self.steps.clone(),
            is_playbook_workflow: self.is_playbook_workflow,
            playbook_description: self.playbook_description.clone(),
            playbook: None,
        }
    }
}

impl From<Workflow> for WorkflowDraft {
    fn from(wf: Workflow) -> Self {
        Self {
            title: wf.title,
            steps: wf.steps,
            is_playbook_workflow: wf.is_playbook_workflow,
            playbook_description: wf.playbook_description.unwrap_or_default(),
        }
    }
}

/// Full document sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowDocument {
    pub title: String,
    pub steps: Vec<Step>,
    #[serde(rename = "isPlaybookWorkflow")]
    pub is_playbook_workflow: bool,
    pub playbook_description: String,
    pub playbook: Option<Playbook>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
