// All prompt text for the tailoring flow.

use crate::llm_client::ChatMessage;
use crate::tailoring::models::TailorRequest;

/// System prompt: the editorial rules every tailoring call runs under.
pub const TAILOR_SYSTEM: &str = "You are ResuMatch.ai, a senior resume writer.
Rules:
- Rewrite to fit the job description precisely.
- Keep facts; do not invent employers, dates, or certifications.
- Prefer action verbs, outcomes, and quantified metrics (%, $, time).
- Remove redundancies and irrelevant details.
- Mirror the job's vocabulary when truthful.
- Output concise, scannable bullets.
";

/// User prompt template.
/// Placeholders: {target_title}, {tone}, {instructions}, {job_text}, {resume_text}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Target Title: {target_title}
Tone: {tone}
Extra Instructions: {instructions}

Job Description:
{job_text}

Candidate Resume:
{resume_text}

Tasks:
1) 2-3 sentence summary tailored to the job.
2) Short "improved resume notes" (what changed & why).
3) One-page cover letter (3-5 short paragraphs).
4) 3-5 sections with improved bullet points (JSON only).

Respond with a JSON object with keys "summary", "improved_resume", "cover_letter"
and "sections" (an array of {"heading", "bullets"} objects)."#;

/// Renders the per-request user prompt.
pub fn build_user_prompt(request: &TailorRequest) -> String {
    render_template(
        TAILOR_PROMPT_TEMPLATE,
        &[
            ("target_title", request.target_title()),
            ("tone", request.tone()),
            ("instructions", request.instructions()),
            ("job_text", &request.job_text),
            ("resume_text", &request.resume_text),
        ],
    )
}

/// The system + user message pair sent on every attempt.
pub fn build_messages(request: &TailorRequest) -> [ChatMessage; 2] {
    [
        ChatMessage::system(TAILOR_SYSTEM),
        ChatMessage::user(build_user_prompt(request)),
    ]
}

/// Single-pass `{name}` substitution. Substituted values are never rescanned,
/// so braces inside resume or job text come through verbatim. Unknown
/// placeholders are left as written.
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;

    fn request() -> TailorRequest {
        TailorRequest {
            resume_text: "Managed a team of 5 engineers".to_string(),
            job_text: "Looking for an engineering manager with team leadership experience"
                .to_string(),
            target_title: Some("Engineering Manager".to_string()),
            tone: None,
            instructions: None,
        }
    }

    #[test]
    fn test_system_prompt_encodes_editorial_rules() {
        assert!(TAILOR_SYSTEM.contains("do not invent employers, dates, or certifications"));
        assert!(TAILOR_SYSTEM.contains("action verbs"));
        assert!(TAILOR_SYSTEM.contains("Mirror the job's vocabulary"));
    }

    #[test]
    fn test_user_prompt_interpolates_request() {
        let prompt = build_user_prompt(&request());
        assert!(prompt.starts_with("Target Title: Engineering Manager\nTone: Professional\n"));
        assert!(prompt.contains("Extra Instructions: \n"));
        assert!(prompt.contains("Job Description:\nLooking for an engineering manager"));
        assert!(prompt.contains("Candidate Resume:\nManaged a team of 5 engineers"));
        assert!(prompt.contains("3-5 sections with improved bullet points (JSON only)"));
    }

    #[test]
    fn test_user_prompt_defaults_target_title() {
        let mut req = request();
        req.target_title = None;
        req.tone = Some("Confident".to_string());
        let prompt = build_user_prompt(&req);
        assert!(prompt.contains("Target Title: the target role"));
        assert!(prompt.contains("Tone: Confident"));
    }

    #[test]
    fn test_user_prompt_is_deterministic() {
        assert_eq!(build_user_prompt(&request()), build_user_prompt(&request()));
    }

    #[test]
    fn test_placeholders_inside_user_text_are_not_expanded() {
        let mut req = request();
        req.job_text = "Must know {resume_text} templating and {tone}".to_string();
        let prompt = build_user_prompt(&req);
        assert!(prompt.contains("Must know {resume_text} templating and {tone}"));
        assert_eq!(prompt.matches("Managed a team of 5 engineers").count(), 1);
    }

    #[test]
    fn test_literal_json_braces_in_template_survive() {
        let prompt = build_user_prompt(&request());
        assert!(prompt.contains(r#"{"heading", "bullets"}"#));
    }

    #[test]
    fn test_messages_are_system_then_user() {
        let [system, user] = build_messages(&request());
        assert_eq!(system.role, Role::System);
        assert_eq!(system.content, TAILOR_SYSTEM);
        assert_eq!(user.role, Role::User);
        assert!(user.content.contains("Engineering Manager"));
    }

    #[test]
    fn test_render_template_handles_unclosed_brace() {
        assert_eq!(render_template("a {b", &[("b", "x")]), "a {b");
        assert_eq!(render_template("{x}{y}", &[("x", "1"), ("y", "2")]), "12");
    }
}
