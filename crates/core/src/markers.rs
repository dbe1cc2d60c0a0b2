//! Role and Q/A labels the model tends to emit when it starts writing the
//! next turn on its own.
//!
//! Two lists are kept. [`STOP_SEQUENCES`] goes to the engine, which halts
//! before emitting any of them. [`LEAKAGE_MARKERS`] is scanned after
//! generation, in order, to cut a reply at the first marker that slipped
//! through anyway.

pub const STOP_SEQUENCES: &[&str] = &[
    "用户:",
    "\n用户:",
    "用户：",
    "\n用户：",
    "问题:",
    "\n问题:",
    "问题：",
    "\n问题：",
    "提问:",
    "\n提问:",
    "提问：",
    "\n提问：",
    "助手:",
    "\n助手:",
    "助手：",
    "\n助手：",
    "User:",
    "\nUser:",
    "User：",
    "\nUser：",
    "Assistant:",
    "\nAssistant:",
    "Assistant：",
    "\nAssistant：",
    "Q:",
    "\nQ:",
    "A:",
    "\nA:",
    "Question:",
    "\nQuestion:",
    "Answer:",
    "\nAnswer:",
    "\n\n",
];

// Priority order matters: the first entry found anywhere in the text wins.
pub const LEAKAGE_MARKERS: &[&str] = &[
    "\n用户:",
    "\n用户：",
    "用户:",
    "用户：",
    "\n问题:",
    "\n问题：",
    "问题:",
    "问题：",
    "\n提问:",
    "\n提问：",
    "提问:",
    "提问：",
    "\n助手:",
    "\n助手：",
    "助手:",
    "助手：",
    "\nUser:",
    "\nUser：",
    "User:",
    "User：",
    "\nAssistant:",
    "\nAssistant：",
    "Assistant:",
    "Assistant：",
    "\nQ:",
    "Q:",
    "\nA:",
    "A:",
    "\nQuestion:",
    "Question:",
    "\nAnswer:",
    "Answer:",
];

pub fn stop_sequences() -> Vec<String> {
    STOP_SEQUENCES.iter().map(|s| s.to_string()).collect()
}

/// `base` in order, followed by every stop sequence not already listed.
/// Empty strings are dropped since they would match everywhere.
pub fn merge_markers<S: AsRef<str>>(base: &[S], stop: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(base.len() + stop.len());
    for m in base.iter().map(|m| m.as_ref()).chain(stop.iter().map(String::as_str)) {
        if m.is_empty() || out.iter().any(|o| o == m) {
            continue;
        }
        out.push(m.to_string());
    }
    out
}
