//! Prompt templates for study guide generation and term explanations.
//!
//! Steps 0..=3 have dedicated instructions; later steps fall back to a generic
//! continuation so a guide can run longer than the four fixed stages.

use crate::guide::StudyPreferences;

/// Card titles for the fixed stages
const STEP_TITLES: [&str; 4] = [
    "Foundations",
    "Building Skills",
    "Advanced Topics",
    "Review & Next Steps",
];

/// System prompt carrying the student's context for every step
pub fn system_prompt(prefs: &StudyPreferences) -> String {
    format!(
        "You are creating a personalized study guide for a student with the following context:
- Subject: {}
- Current Level: {}
- Available Time: {} hours/week
- Learning Style: {}
- Learning Goal: {}

Please respond to all requests in a Markdown format. Include links to relevant resources for each step.
Maintain this context for all responses and ensure each step builds upon previous steps.",
        prefs.subject.trim(),
        prefs.current_level.trim(),
        prefs.time_available.trim(),
        prefs.learning_style.trim(),
        prefs.goal.trim(),
    )
}

/// User prompt for a single step of the guide
pub fn step_prompt(step: u32, subject: &str) -> String {
    let subject = subject.trim();
    match step {
        0 => format!(
            "Create the first part of a study guide for {subject}. Include:
1. A clear introduction to the subject
2. Key foundational concepts that must be understood
3. Common misconceptions to avoid
4. Initial learning objectives"
        ),
        1 => "Building on the previous content, outline:
1. Intermediate concepts
2. Practical exercises
3. Study techniques
4. Progress tracking methods"
            .to_string(),
        2 => "For the advanced section, provide:
1. Complex topics and their relationships
2. Real-world applications
3. Advanced resources
4. Mastery indicators"
            .to_string(),
        3 => "Create a summary section with:
1. Review of key points
2. Common pitfalls to avoid
3. Next steps for further learning
4. Self-assessment questions"
            .to_string(),
        _ => format!("Continue the study guide for {subject}, building upon previous content."),
    }
}

pub fn step_title(step: u32) -> String {
    STEP_TITLES
        .get(step as usize)
        .map(|t| t.to_string())
        .unwrap_or_else(|| format!("Step {}", step + 1))
}

/// Persona used when explaining a selected term
pub fn component_system_prompt(subject: &str) -> String {
    format!(
        "You are a fun loving, world-class expert, professor, and educator in {}",
        subject.trim()
    )
}

pub fn component_prompt(component: &str, subject: &str) -> String {
    format!(
        "Descriptively explain the following component of {} in detail: {}
Include:
1. Definition and core concepts
2. Importance and applications
3. Common challenges and solutions
4. Learning resources and tips",
        subject.trim(),
        component.trim()
    )
}
