use signspeak_conversation::{ConversationSnapshot, ConversationState};

/// Transcript lines for the change from `prev` to `next`.
pub fn transition_lines(prev: &ConversationSnapshot, next: &ConversationSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    let new_question = next.state.is_running()
        && (!prev.state.is_running() || prev.index != next.index || prev.session_id != next.session_id);
    if new_question {
        if let (Some(progress), Some(question)) = (next.progress_label(), next.question.as_deref()) {
            lines.push(format!("[{progress}] {question}"));
        }
    }

    if next.is_detecting && !prev.is_detecting {
        lines.push("  ...detecting".to_string());
    }

    if next.last_result != prev.last_result {
        if let Some(label) = next.result_label() {
            lines.push(format!("  {label}"));
        }
    }

    if next.state != prev.state {
        match next.state {
            ConversationState::Complete => lines.extend(summary_lines(next)),
            ConversationState::Idle => {
                lines.push("Conversation idle. Type 'start' to begin.".to_string())
            }
            _ => {}
        }
    }

    lines
}

/// Full status, for the `status` command.
pub fn status_lines(snapshot: &ConversationSnapshot) -> Vec<String> {
    let mut lines = vec![format!(
        "state: {} | permissions: camera={} microphone={} speaker={}",
        snapshot.state,
        snapshot.permissions.camera,
        snapshot.permissions.microphone,
        snapshot.permissions.speaker,
    )];
    if let (Some(progress), Some(question)) =
        (snapshot.progress_label(), snapshot.question.as_deref())
    {
        lines.push(format!("[{progress}] {question}"));
    }
    if let Some(label) = snapshot.result_label() {
        lines.push(format!("  {label}"));
    }
    if snapshot.state == ConversationState::Complete {
        lines.extend(summary_lines(snapshot));
    }
    lines
}

fn summary_lines(snapshot: &ConversationSnapshot) -> Vec<String> {
    let mut lines = vec![format!(
        "Conversation complete ({} answers). Type 'reset' to start over.",
        snapshot.answers.len()
    )];
    lines.extend(
        snapshot
            .answers
            .iter()
            .map(|a| format!("  {:>2}. {} {}", a.index + 1, a.question, a.response)),
    );
    lines
}
