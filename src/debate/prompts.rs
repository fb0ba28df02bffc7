//! Prompt builders for the panel and the host.
//!
//! The host prompt demands strict JSON because its decision must be
//! machine-actionable; the extractor's leniency covers the cases where it
//! does not comply anyway.

/// Initial question fanned out to every panelist.
pub fn initial_prompt(topic: &str) -> String {
    let topic = if topic.trim().is_empty() {
        "Please continue the analysis."
    } else {
        topic
    };
    format!(
        "User question: {}\nAnswer strictly from your own specialist knowledge base.",
        topic
    )
}

/// Host evaluation prompt embedding the rendered transcript.
///
/// The history section is omitted entirely when the transcript is empty.
pub fn host_prompt(history: &str) -> String {
    let mut prompt = String::from(
        "You are the moderator of an expert panel on mineral prospecting. \
         Review the statements so far. If expert opinions conflict, \
         interrogate one specific expert; if the conclusion is clear, emit \
         the final report.\n\
         You MUST reply with a single JSON object and nothing else, in one \
         of these forms:\n\
         {\"action\": \"ASK\", \"target\": \"<expert_key>\", \"content\": \"<question>\"}\n\
         {\"action\": \"FINISH\", \"content\": <report object>}\n\
         For FINISH, the report object should include probability and \
         rationale fields plus map data fields such as \"target_area\", \
         \"drill_sites\", \"geo_anomalies\" and \"chem_anomalies\" where \
         the evidence supports them.",
    );
    if !history.is_empty() {
        prompt.push_str("\nDiscussion so far:\n");
        prompt.push_str(history);
    }
    prompt
}

/// Follow-up question delivered to the interrogated panelist.
pub fn follow_up_prompt(question: &str) -> String {
    format!("Moderator follow-up: {}", question)
}

/// Priority instruction injected outside the round loop.
pub fn intervention_prompt(instruction: &str, history: &str) -> String {
    let mut prompt = format!(
        "[HIGHEST PRIORITY DIRECTIVE] The operator orders: {}. Execute \
         immediately and reply with a single JSON command using the same \
         ASK/FINISH contract as before.",
        instruction
    );
    if !history.is_empty() {
        prompt.push_str("\nDiscussion so far:\n");
        prompt.push_str(history);
    }
    prompt
}

/// Direct single-agent query with history context.
pub fn manual_prompt(question: Option<&str>, history: &str) -> String {
    let mut prompt = match question {
        Some(q) => format!("User question: {}", q),
        None => String::from("Please respond based on the discussion so far."),
    };
    if !history.is_empty() {
        prompt.push_str("\nDiscussion so far:\n");
        prompt.push_str(history);
    }
    prompt
}

/// Append operator-supplied reference material to an outgoing prompt.
pub fn augment(prompt: String, reference_material: Option<&str>) -> String {
    match reference_material {
        Some(material) if !material.trim().is_empty() => format!(
            "{}\n\n[Global external reference material (user supplied)]:\n{}\n\n\
             (Combine this material with your own knowledge base when answering.)",
            prompt, material
        ),
        _ => prompt,
    }
}
