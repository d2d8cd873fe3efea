//! Builds the synthetic query text embedded for a job role.

use crate::models::job_role::JobRoleSkill;

/// Importance tier label used in the query text.
pub fn importance_tier(importance: u8) -> &'static str {
    match importance {
        4.. => "Critical",
        3 => "Important",
        _ => "Nice to have",
    }
}

/// Renders one numbered line per skill under the role title:
///
/// ```text
/// Job Role: Data Engineer
/// Required Skills:
/// 1. Python (Critical, Required Level: advanced)
/// ```
pub fn build_skill_query(job_role_title: &str, skills: &[JobRoleSkill]) -> String {
    let skill_lines: Vec<String> = skills
        .iter()
        .enumerate()
        .map(|(idx, skill)| {
            format!(
                "{}. {} ({}, Required Level: {})",
                idx + 1,
                skill.name.trim(),
                importance_tier(skill.importance),
                skill.level()
            )
        })
        .collect();

    format!(
        "Job Role: {}\nRequired Skills:\n{}",
        job_role_title.trim(),
        skill_lines.join("\n")
    )
}
