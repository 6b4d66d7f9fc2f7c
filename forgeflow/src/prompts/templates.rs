//! Fixed prompt text.

use crate::core::{Skill, Slot};

/// Prefix applied to the backend track's prompt when a frontend is also requested.
pub const BACKEND_ONLY_DIRECTIVE: &str = "Generate the backend service code only. ";

/// File name the generated frontend is served under.
pub const FRONTEND_FILE_NAME: &str = "index.html";

/// Plan slot for the frontend stage.
pub const FRONTEND_INSTRUCTION: &str = "Generate an HTML and CSS frontend for the given backend \
code in a single file named index.html. The page must call the backend's endpoints and must not \
depend on any build step.";

/// Plan slot for the merge stage.
pub const MERGE_INSTRUCTION: &str = "Reconcile the existing backend with the companion frontend. \
Keep the backend's behaviour, make it serve index.html as a static file at the root path and \
make sure every endpoint the frontend calls exists. Return the complete backend code only.";

const PLAN_SYSTEM: &str = "You are an expert code planner. Break the user's request down into \
a step-by-step implementation plan that leads to the most robust and efficient solution. Return \
only the plan.";

const IMPLEMENT_SYSTEM: &str = "You are an expert code builder. Write efficient, structured and \
well-documented code that follows the given plan. Respond with the code only.";

const DEBUG_PLAN_SYSTEM: &str = "You are an expert code debugger. Produce a structured plan for \
finding and fixing the defects in the given code. Name the functions that are wrong and explain \
what is wrong with them.";

const DEBUG_SYSTEM: &str = "You are an expert code debugger. Apply the debug plan to the code and \
fix every issue it identifies. Respond with the complete corrected code only, nothing else.";

const VALIDATE_SYSTEM: &str = "You oversee the whole code-building process. Assess whether the \
final code meets the user's original request and list anything that is missing or wrong.";

const DEPLOY_SYSTEM: &str = "You are a release engineer. Write concise instructions for \
installing the dependencies of the given code, configuring it and running it.";

/// Returns the fixed system instruction for a skill.
#[must_use]
pub const fn system_instruction(skill: Skill) -> &'static str {
    match skill {
        Skill::Plan => PLAN_SYSTEM,
        Skill::Implement => IMPLEMENT_SYSTEM,
        Skill::DebugPlan => DEBUG_PLAN_SYSTEM,
        Skill::Debug => DEBUG_SYSTEM,
        Skill::Validate => VALIDATE_SYSTEM,
        Skill::Deploy => DEPLOY_SYSTEM,
    }
}

/// Heading rendered in front of a slot's value in the human turn.
pub(crate) const fn heading(skill: Skill, slot: Slot) -> &'static str {
    match (skill, slot) {
        (_, Slot::OriginalPrompt) => "The user wants: ",
        (_, Slot::Plan) => "Here is the plan:\n",
        (Skill::Validate, Slot::Code) => "Here is the final output:\n",
        (Skill::Deploy, Slot::Code) => "Here is the code to deploy:\n",
        (_, Slot::Code) => "Here is the code:\n",
        (_, Slot::DebugPlan) => "This is the debug plan:\n",
        (_, Slot::PriorCode) => "Here is the existing backend code:\n",
        (_, Slot::CompanionCode) => "Here is the companion frontend code:\n",
    }
}
