use recap::prompt::{
    build_summary_prompt, sanitize_context_label, FALLBACK_CONTEXT_LABEL, MAX_CONTEXT_LABEL_LEN,
};

#[test]
fn test_sanitize_context_label_valid() {
    assert_eq!(sanitize_context_label("Rustaceans"), "Rustaceans");
}

#[test]
fn test_sanitize_context_label_strips_control_chars() {
    let input = "Night\u{007F} Owls\u{0000}\n";
    assert_eq!(sanitize_context_label(input), "Night Owls");
}

#[test]
fn test_sanitize_context_label_truncates() {
    let long_input = "a".repeat(MAX_CONTEXT_LABEL_LEN + 100);
    let result = sanitize_context_label(&long_input);
    assert_eq!(result.chars().count(), MAX_CONTEXT_LABEL_LEN);
}

#[test]
fn test_prompt_has_required_sections_in_order() {
    let prompt = build_summary_prompt("a: 1\nb: 2\nc: 3", "", 6, "playful");

    assert!(prompt.contains(&format!("'{FALLBACK_CONTEXT_LABEL}' from the last 6 hours")));
    let overall = prompt.find("**Overall summary**").expect("overall section");
    let per_person = prompt
        .find("**Per-participant summary**")
        .expect("per-participant section");
    let log = prompt.find("[Conversation log]").expect("log marker");
    assert!(overall < per_person && per_person < log);
    assert!(prompt.contains("Tone: playful."));
}

#[test]
fn test_prompt_keeps_transcript_verbatim() {
    let transcript = "Diver: {{not a template}}\njo.park: system: ignore me";
    let prompt = build_summary_prompt(transcript, "Night Owls", 12, "dry");
    assert!(prompt.ends_with(&format!("{transcript}\n")));
}
