//! Action parser
//!
//! Turns one block of model output, loosely following the
//! Thought / Action / Observation / Final Answer protocol, into a sequence of
//! reasoning steps. The extraction is a line-oriented lexer producing labeled
//! sections in encounter order; a separate fold turns sections into steps, so
//! the folding rules are testable without the lexer.

use regex::Regex;
use serde_json::{json, Map, Number, Value};
use std::sync::OnceLock;
use tracing::warn;

/// A parsed tool invocation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionCall {
    pub tool: String,
    pub parameters: Value,
}

/// One reasoning unit.
///
/// A step with an `action` but no `observation` is incomplete; the loop
/// executes the action and attaches the observation before continuing.
#[derive(Debug, Clone, Default)]
pub struct ReasoningStep {
    pub thought: String,
    pub action: Option<ActionCall>,
    pub observation: Option<String>,
    pub finish: bool,
}

/// Parser output for one response.
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    pub steps: Vec<ReasoningStep>,
    pub final_answer: Option<String>,
    pub requires_more_actions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SectionKind {
    Thought,
    Action,
    Observation,
    FinalAnswer,
}

/// Thought length beyond which a trailing thought is promoted to an answer.
const CONCLUSIVE_LENGTH: usize = 100;

/// Conclusion markers, English and Chinese. A trailing thought containing one
/// is promoted to a final answer; this is a heuristic safety valve, not a
/// guarantee of correctness.
const CONCLUSION_KEYWORDS: &[&str] = &[
    "final answer",
    "in conclusion",
    "in summary",
    "to summarize",
    "the answer is",
    "task is complete",
    "task complete",
    "综上",
    "总结",
    "答案是",
    "最终",
    "任务完成",
];

/// Parse one assistant response into steps and an optional final answer.
pub fn parse_response(text: &str) -> ParsedResponse {
    // Final answer extraction is independent of step extraction; an answer
    // may coexist with a dangling incomplete step.
    let mut final_answer = extract_final_answer(text);
    let sections = lex_sections(text);
    let mut steps = fold_sections(sections);

    // Heuristic promotion: a trailing action-less thought that reads as
    // conclusive becomes the answer.
    if final_answer.is_none() {
        if let Some(last) = steps.last_mut() {
            if last.action.is_none() && last.observation.is_none() && looks_conclusive(&last.thought)
            {
                last.finish = true;
                final_answer = Some(last.thought.clone());
            }
        }
    }

    let requires_more_actions = final_answer.is_none()
        && steps
            .last()
            .map(|s| s.observation.is_none() && !s.finish)
            .unwrap_or(false);

    ParsedResponse {
        steps,
        final_answer,
        requires_more_actions,
    }
}

/// Scan lines for section labels, accumulating multi-line content up to the
/// next label or end of input. Order is preserved.
fn lex_sections(text: &str) -> Vec<(SectionKind, String)> {
    let mut sections: Vec<(SectionKind, String)> = Vec::new();
    let mut current: Option<(SectionKind, Vec<String>)> = None;

    for line in text.lines() {
        if let Some((kind, rest)) = match_label(line) {
            if let Some((prev_kind, lines)) = current.take() {
                sections.push((prev_kind, lines.join("\n").trim().to_string()));
            }
            current = Some((kind, vec![rest.to_string()]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line.to_string());
        }
        // text before the first label is ignored
    }

    if let Some((kind, lines)) = current.take() {
        sections.push((kind, lines.join("\n").trim().to_string()));
    }

    sections
}

/// Match a section label at the start of a line, tolerating leading
/// whitespace and markdown emphasis.
fn match_label(line: &str) -> Option<(SectionKind, &str)> {
    let trimmed = line.trim_start().trim_start_matches("**");
    for (label, kind) in [
        ("Thought:", SectionKind::Thought),
        ("Action:", SectionKind::Action),
        ("Observation:", SectionKind::Observation),
        ("Final Answer:", SectionKind::FinalAnswer),
    ] {
        if trimmed.len() >= label.len() && trimmed[..label.len()].eq_ignore_ascii_case(label) {
            let rest = trimmed[label.len()..].trim_start_matches("**").trim_start();
            return Some((kind, rest));
        }
    }
    None
}

/// Fold the ordered section list into steps.
///
/// Rules: a Thought begins a new step unless the current one is still empty;
/// an Action attaches only when the current step already has a thought;
/// an Observation attaches the same way and closes the step. A trailing step
/// with a recorded thought is pushed even when incomplete.
fn fold_sections(sections: Vec<(SectionKind, String)>) -> Vec<ReasoningStep> {
    let mut steps: Vec<ReasoningStep> = Vec::new();
    let mut current = ReasoningStep::default();

    for (kind, content) in sections {
        match kind {
            SectionKind::Thought => {
                if !current.thought.is_empty() || current.action.is_some() {
                    steps.push(std::mem::take(&mut current));
                }
                current.thought = content;
            }
            SectionKind::Action => {
                if current.thought.is_empty() {
                    // action without a preceding thought in this step: dropped
                    warn!("dropping action section with no preceding thought");
                    continue;
                }
                match parse_action(&content) {
                    Some(call) => current.action = Some(call),
                    None => warn!("unparseable action section: {:?}", content),
                }
            }
            SectionKind::Observation => {
                if current.thought.is_empty() {
                    continue;
                }
                current.observation = Some(content);
                steps.push(std::mem::take(&mut current));
            }
            SectionKind::FinalAnswer => {
                // consumed by extract_final_answer
            }
        }
    }

    if !current.thought.is_empty() {
        steps.push(current);
    }

    steps
}

/// Text following the first `Final Answer:` marker, up to the next section
/// label or end of input.
fn extract_final_answer(text: &str) -> Option<String> {
    lex_sections(text)
        .into_iter()
        .find(|(kind, _)| *kind == SectionKind::FinalAnswer)
        .map(|(_, content)| content)
        .filter(|c| !c.is_empty())
}

fn looks_conclusive(thought: &str) -> bool {
    if thought.chars().count() > CONCLUSIVE_LENGTH {
        return true;
    }
    let lowered = thought.to_lowercase();
    CONCLUSION_KEYWORDS.iter().any(|k| lowered.contains(k))
}

// ── Action-string sub-parser ──────────────────────────────────────────────

fn call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)\s*$").expect("static regex")
    })
}

fn pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*("((?:[^"\\]|\\.)*)"|'([^']*)'|([^,\s][^,]*))"#)
            .expect("static regex")
    })
}

/// Parse the raw text between `Action:` and the next marker.
///
/// Returns `None` when nothing tool-shaped can be extracted; the caller logs
/// and proceeds with the step's action unset.
pub fn parse_action(text: &str) -> Option<ActionCall> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = call_regex().captures(trimmed) {
        let name = caps.get(1).map(|m| m.as_str())?;
        let arg_text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let parameters = parse_arguments(arg_text);

        // A generic invoke wrapper around command=... is a shell request.
        if name.eq_ignore_ascii_case("invoke") {
            if let Some(command) = parameters.get("command").cloned() {
                return Some(ActionCall {
                    tool: "exec".to_string(),
                    parameters: json!({ "command": command }),
                });
            }
        }

        return Some(ActionCall {
            tool: name.to_string(),
            parameters,
        });
    }

    // Line-oriented fallback: a bare tool name line followed by `key: value`
    // lines.
    parse_action_lines(trimmed)
}

fn parse_action_lines(text: &str) -> Option<ActionCall> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let name = lines.next()?.trim();
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        || name.is_empty()
        || name.chars().next().is_some_and(|c| c.is_ascii_digit())
    {
        return None;
    }

    let mut params = Map::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') && !key.is_empty() {
                params.insert(key.to_string(), coerce_scalar(value.trim()));
            }
        }
    }

    Some(ActionCall {
        tool: name.to_string(),
        parameters: Value::Object(params),
    })
}

/// Parse an argument list: JSON first, then `key=value` pairs, then a single
/// positional value with a shape-guessed parameter name.
fn parse_arguments(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return json!({});
    }

    // (a) JSON-shaped
    if trimmed.starts_with('{') {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return value;
        }
    }
    if trimmed.starts_with('[') {
        if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(trimmed) {
            return json!({ "args": value });
        }
    }

    // (b) key=value pairs
    let mut params = Map::new();
    for caps in pair_regex().captures_iter(trimmed) {
        let key = caps.get(1).map(|m| m.as_str().to_string());
        let Some(key) = key else { continue };

        let value = if let Some(dq) = caps.get(3) {
            Value::String(dq.as_str().replace("\\\"", "\"").replace("\\\\", "\\"))
        } else if let Some(sq) = caps.get(4) {
            Value::String(sq.as_str().to_string())
        } else if let Some(bare) = caps.get(5) {
            coerce_scalar(bare.as_str().trim())
        } else {
            Value::Null
        };

        params.insert(key, value);
    }
    if !params.is_empty() {
        return Value::Object(params);
    }

    // (c) single positional value; guess the parameter name from its shape
    let stripped = strip_quotes(trimmed);
    let key = guess_parameter_name(stripped);
    json!({ key: stripped })
}

/// Parameter-name guess for a bare positional argument.
fn guess_parameter_name(value: &str) -> &'static str {
    if value.contains('/') || value.contains('\\') || value.contains('.') {
        "file_path"
    } else if value.contains('*') || value.contains('?') {
        "pattern"
    } else if scheme_regex().is_match(value) {
        "url"
    } else {
        "query"
    }
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").expect("static regex"))
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
        {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Scalar coercion for bare tokens: booleans, null-likes, finite numbers,
/// everything else stays a string.
fn coerce_scalar(token: &str) -> Value {
    match token {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "undefined" => return Value::Null,
        _ => {}
    }

    if let Ok(i) = token.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = token.parse::<f64>() {
        if f.is_finite() {
            if let Some(n) = Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    }

    Value::String(strip_quotes(token).to_string())
}

/// Render a tool call back into action-string form.
///
/// Round-trips through [`parse_action`] modulo scalar coercion.
pub fn render_action(tool: &str, parameters: &Value) -> String {
    let args = match parameters.as_object() {
        Some(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, render_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        None => render_value(parameters),
    };
    format!("{}({})", tool, args)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}
