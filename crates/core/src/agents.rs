//! Agent Catalog
//!
//! Declarative configuration records for the agents handed to the external
//! orchestration runtime. Nothing here calls a model: each record names the
//! model, carries the instruction text, the key the runtime stores the output
//! under, and the sub-agents it may delegate to.

use crate::{clock::Clock, error::StateError, prompts::PromptLibrary, state::SessionState};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Models assigned to coordinating agents and to leaf generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub manager: String,
    pub worker: String,
}

impl Default for ModelChoice {
    fn default() -> Self {
        Self {
            manager: "gemini-2.5-pro".to_string(),
            worker: "gemini-2.5-flash".to_string(),
        }
    }
}

/// How the runtime drives an agent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// A model call that may delegate to any of its sub-agents.
    #[default]
    Llm,
    /// Runs its sub-agents in order, each seeing the previous outputs. Has no
    /// model or instruction of its own.
    Sequential,
}

/// One agent definition and the agents it delegates to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub kind: AgentKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instruction: String,
    /// Session-state key the runtime writes this agent's final output to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_key: String,
    /// Names of the runtime tools the agent may call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_agents: Vec<AgentSpec>,
}

impl AgentSpec {
    /// Depth-first search for an agent by name, including `self`.
    pub fn find(&self, name: &str) -> Option<&AgentSpec> {
        if self.name == name {
            return Some(self);
        }
        self.sub_agents.iter().find_map(|a| a.find(name))
    }

    /// Every agent in the tree with its depth, parents before children.
    pub fn walk(&self) -> Vec<(usize, &AgentSpec)> {
        let mut out = Vec::new();
        self.walk_into(0, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a AgentSpec)>) {
        out.push((depth, self));
        for child in &self.sub_agents {
            child.walk_into(depth + 1, out);
        }
    }
}

/// Static description of an agent whose instruction comes from a prompt file.
struct Def {
    name: &'static str,
    prompt: &'static str,
    output_key: &'static str,
    description: &'static str,
    tools: &'static [&'static str],
}

const IMAGE_TOOLS: &[&str] = &["generate_image_from_prompt", "render_mermaid_diagram"];

const DIFFERENTIATED_MATERIALS: Def = Def {
    name: "differentiated_materials_agent",
    prompt: "differentiated_materials",
    output_key: "differentiated_materials",
    description: "Creates worksheets, answer keys and grade-adapted variations for multi-grade classrooms.",
    tools: &[],
};

const WORKSHEET_PIPELINE: [Def; 2] = [
    Def {
        name: "worksheet_creator_agent",
        prompt: "worksheet_creator",
        output_key: "baseline_worksheet",
        description: "Creates a baseline worksheet from the given content.",
        tools: &[],
    },
    Def {
        name: "answerkey_creator_agent",
        prompt: "answerkey_creator",
        output_key: "baseline_answersheet",
        description: "Creates the answer key and short-answer rubrics for the baseline worksheet.",
        tools: &["calculator"],
    },
];

const MATERIAL_ADAPTERS: [Def; 2] = [
    Def {
        name: "variation_generator_agent",
        prompt: "variation_generator",
        output_key: "content_variations",
        description: "Generates distinct worksheet variations covering the same concepts.",
        tools: &[],
    },
    Def {
        name: "grade_adapter_agent",
        prompt: "grade_adapter",
        output_key: "simplified_content",
        description: "Adapts content and practice questions to a target grade level.",
        tools: &[],
    },
];

const HYPER_LOCAL_CONTENT: Def = Def {
    name: "hyper_local_content_agent",
    prompt: "hyper_local_content",
    output_key: "hyper_local_content",
    description: "Creates culturally relevant, grade-appropriate content in the teacher's local language.",
    tools: &[],
};

const KNOWLEDGE_BASE: Def = Def {
    name: "knowledge_base_agent",
    prompt: "knowledge_base",
    output_key: "knowledge_base_answer",
    description: "Explains student questions simply, with analogies, in the teacher's preferred language.",
    tools: &[],
};

const VISUAL_AID: Def = Def {
    name: "visual_aid_agent",
    prompt: "visual_aid",
    output_key: "visual_aids",
    description: "Creates mindmaps, diagrams and step-by-step visual guides for a topic and grade level.",
    tools: &[],
};

const VISUAL_GENERATORS: [Def; 3] = [
    Def {
        name: "mindmap_generator_agent",
        prompt: "mindmap_generator",
        output_key: "mindmap_output",
        description: "Creates mindmaps showing how the concepts of a topic relate.",
        tools: &[],
    },
    Def {
        name: "diagram_creator_agent",
        prompt: "diagram_creator",
        output_key: "diagram_output",
        description: "Creates flowcharts, structure diagrams and timelines as Mermaid code.",
        tools: IMAGE_TOOLS,
    },
    Def {
        name: "visual_guide_generator_agent",
        prompt: "visual_guide_generator",
        output_key: "visual_guide_output",
        description: "Breaks a concept into a sequence of step-by-step visual instructions.",
        tools: IMAGE_TOOLS,
    },
];

const FUN_ACTIVITY: Def = Def {
    name: "fun_activity_agent",
    prompt: "fun_activity",
    output_key: "fun_activities",
    description: "Oversees the fun activity generators and presents their output in a structured way.",
    tools: &[],
};

const ACTIVITY_GENERATORS: [Def; 4] = [
    Def {
        name: "quiz_generator_agent",
        prompt: "quiz_generator",
        output_key: "quiz_activities",
        description: "Creates interactive quizzes and knowledge checks for the given topic.",
        tools: &[],
    },
    Def {
        name: "scenario_generator_agent",
        prompt: "scenario_generator",
        output_key: "scenario_activities",
        description: "Develops real-world scenarios and problem-solving activities.",
        tools: &[],
    },
    Def {
        name: "fitb_generator_agent",
        prompt: "fitb_generator",
        output_key: "fitb_activities",
        description: "Creates vocabulary and concept reinforcement activities in fill-in-the-blank format.",
        tools: &[],
    },
    Def {
        name: "word_game_generator_agent",
        prompt: "word_game_generator",
        output_key: "word_game_activities",
        description: "Develops word puzzles, crosswords, and language-based games.",
        tools: &[],
    },
];

const LESSON_PLANNING: Def = Def {
    name: "lesson_planning_agent",
    prompt: "lesson_planning",
    output_key: "weekly_lesson_plan",
    description: "Oversees the creation of comprehensive weekly lesson plans.",
    tools: &[],
};

const PLANNING_STEPS: [Def; 3] = [
    Def {
        name: "subtopic_decomposer_agent",
        prompt: "subtopic_decomposer",
        output_key: "subtopic_breakdown",
        description: "Breaks a topic into age-appropriate sequential subtopics for weekly planning.",
        tools: &[],
    },
    Def {
        name: "objective_mapper_agent",
        prompt: "objective_mapper",
        output_key: "learning_objectives",
        description: "Aligns each subtopic with learning goals such as critical thinking, creativity and communication.",
        tools: &[],
    },
    Def {
        name: "content_planner_agent",
        prompt: "content_planner",
        output_key: "content_plan",
        description: "Generates explanations, analogies, activities and assessments with time recommendations.",
        tools: &[],
    },
];

/// Builds agent trees from a prompt library.
pub struct AgentCatalog;

impl AgentCatalog {
    /// The root assistant and the six specialists it delegates to.
    pub fn standard(prompts: &PromptLibrary, models: &ModelChoice) -> Result<AgentSpec> {
        Ok(AgentSpec {
            name: "sahayak".to_string(),
            kind: AgentKind::Llm,
            model: models.manager.clone(),
            description: "Teaching assistant for multi-grade classrooms that delegates to specialized content agents.".to_string(),
            instruction: prompts.get("sahayak")?.to_string(),
            output_key: "sahayata".to_string(),
            tools: Vec::new(),
            sub_agents: vec![
                Self::differentiated_materials(prompts, models)?,
                Self::hyper_local_content(prompts, models)?,
                Self::knowledge_base(prompts, models)?,
                Self::visual_aid(prompts, models)?,
                Self::fun_activity(prompts, models)?,
                Self::lesson_planning(prompts, models)?,
            ],
        })
    }

    pub fn differentiated_materials(
        prompts: &PromptLibrary,
        models: &ModelChoice,
    ) -> Result<AgentSpec> {
        let mut sub_agents = vec![AgentSpec {
            name: "worksheet_generator_agent".to_string(),
            kind: AgentKind::Sequential,
            model: String::new(),
            description: "Runs worksheet creation, then answer key creation.".to_string(),
            instruction: String::new(),
            output_key: String::new(),
            tools: Vec::new(),
            sub_agents: build(&WORKSHEET_PIPELINE, &models.worker, prompts)?,
        }];
        sub_agents.extend(build(&MATERIAL_ADAPTERS, &models.worker, prompts)?);
        agent(&DIFFERENTIATED_MATERIALS, &models.manager, prompts, sub_agents)
    }

    pub fn hyper_local_content(prompts: &PromptLibrary, models: &ModelChoice) -> Result<AgentSpec> {
        agent(&HYPER_LOCAL_CONTENT, &models.manager, prompts, Vec::new())
    }

    pub fn knowledge_base(prompts: &PromptLibrary, models: &ModelChoice) -> Result<AgentSpec> {
        agent(&KNOWLEDGE_BASE, &models.manager, prompts, Vec::new())
    }

    pub fn visual_aid(prompts: &PromptLibrary, models: &ModelChoice) -> Result<AgentSpec> {
        let sub_agents = build(&VISUAL_GENERATORS, &models.worker, prompts)?;
        agent(&VISUAL_AID, &models.manager, prompts, sub_agents)
    }

    pub fn fun_activity(prompts: &PromptLibrary, models: &ModelChoice) -> Result<AgentSpec> {
        let sub_agents = build(&ACTIVITY_GENERATORS, &models.worker, prompts)?;
        agent(&FUN_ACTIVITY, &models.manager, prompts, sub_agents)
    }

    pub fn lesson_planning(prompts: &PromptLibrary, models: &ModelChoice) -> Result<AgentSpec> {
        let sub_agents = build(&PLANNING_STEPS, &models.worker, prompts)?;
        agent(&LESSON_PLANNING, &models.manager, prompts, sub_agents)
    }
}

fn agent(
    def: &Def,
    model: &str,
    prompts: &PromptLibrary,
    sub_agents: Vec<AgentSpec>,
) -> Result<AgentSpec> {
    Ok(AgentSpec {
        name: def.name.to_string(),
        kind: AgentKind::Llm,
        model: model.to_string(),
        description: def.description.to_string(),
        instruction: prompts.get(def.prompt)?.to_string(),
        output_key: def.output_key.to_string(),
        tools: def.tools.iter().map(|t| t.to_string()).collect(),
        sub_agents,
    })
}

fn build(defs: &[Def], model: &str, prompts: &PromptLibrary) -> Result<Vec<AgentSpec>> {
    defs.iter()
        .map(|def| agent(def, model, prompts, Vec::new()))
        .collect()
}

/// Placeholder values for instruction templates: `cur_date` plus, when a
/// state is given, each of its top-level sections.
pub fn instruction_vars(
    state: Option<&SessionState>,
    clock: &dyn Clock,
) -> Result<Map<String, Value>, StateError> {
    let mut vars = match state {
        Some(state) => state.sections()?,
        None => Map::new(),
    };
    vars.insert(
        "cur_date".to_string(),
        Value::String(clock.now().format("%Y-%m-%d").to_string()),
    );
    Ok(vars)
}

/// Replaces each `{name}` in `template` with the matching value. Strings are
/// inserted as-is, everything else as pretty JSON. Unknown placeholders stay.
///
/// The template is scanned once, so braces inside substituted values are
/// never expanded.
pub fn render_instruction(template: &str, vars: &Map<String, Value>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rendered.push_str(&rest[open..]);
            return rendered;
        };
        match vars.get(&after[..close]) {
            Some(Value::String(s)) => rendered.push_str(s),
            Some(other) => rendered.push_str(
                &serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
            ),
            None => {
                rendered.push('{');
                rest = after;
                continue;
            }
        }
        rest = &after[close + 1..];
    }
    rendered.push_str(rest);
    rendered
}
