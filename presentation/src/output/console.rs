//! Console output formatter for council results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::CouncilTurn;
use council_domain::{
    BackendResult, Conversation, ConversationSummary, CouncilResponseSet, Message,
    RankingOutcome, Synthesis,
};
use serde_json::{Value, json};

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format every stage of a turn
    pub fn format(turn: &CouncilTurn) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Conversation:".cyan().bold(),
            turn.conversation_id
        ));
        output.push_str(&format!(
            "{} {}\n\n",
            "Question:".cyan().bold(),
            turn.question.content()
        ));

        output.push_str(&Self::stages(&turn.stage1, &turn.stage2, &turn.stage3));
        output.push_str(&Self::footer());

        output
    }

    /// Format the turn as pretty JSON
    pub fn format_json(turn: &CouncilTurn) -> String {
        let value = json!({
            "conversation_id": turn.conversation_id,
            "title": turn.title,
            "question": turn.question.content(),
            "stage1": turn.stage1,
            "stage2": turn.stage2,
            "stage3": turn.stage3,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format synthesis only (concise output)
    pub fn format_synthesis_only(turn: &CouncilTurn) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Conclusion ===".cyan().bold()
        ));

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), turn.question.content()));

        let consulted: Vec<String> = turn.responses.models().map(|m| m.to_string()).collect();
        output.push_str(&format!(
            "{} {} ({} answered)\n\n",
            "Models consulted:".dimmed(),
            consulted.join(", "),
            turn.responses.success_count()
        ));

        output.push_str(&Self::synthesis_text(&turn.stage3));
        output.push('\n');

        output.push_str(&format!(
            "\n{} {}\n",
            "Conversation:".dimmed(),
            turn.conversation_id
        ));

        output
    }

    /// Format a stored conversation with all of its turns
    pub fn format_conversation(conversation: &Conversation) -> String {
        let mut output = String::new();

        output.push_str(&Self::header(&conversation.title));
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n{} {}\n",
            "Id:".cyan().bold(),
            conversation.id,
            "Created:".cyan().bold(),
            conversation.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        if conversation.messages.is_empty() {
            output.push_str(&format!("\n{}\n", "(no messages)".dimmed()));
        }

        for message in &conversation.messages {
            match message {
                Message::User { content } => {
                    output.push_str(&format!("\n{} {}\n", "You:".green().bold(), content));
                }
                Message::Assistant {
                    stage1,
                    stage2,
                    stage3,
                } => {
                    output.push_str(&Self::stages(
                        stage1.as_ref().unwrap_or(&Value::Null),
                        stage2.as_ref().unwrap_or(&Value::Null),
                        stage3.as_ref().unwrap_or(&Value::Null),
                    ));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format the conversation listing
    pub fn format_conversation_list(summaries: &[ConversationSummary]) -> String {
        if summaries.is_empty() {
            return format!("{}\n", "No conversations yet.".dimmed());
        }

        let mut output = String::new();
        for summary in summaries {
            output.push_str(&format!(
                "{}  {}  {} {}\n",
                summary.id.yellow(),
                summary.created_at.format("%Y-%m-%d %H:%M"),
                summary.title.bold(),
                format!("({} messages)", summary.message_count).dimmed()
            ));
        }
        output
    }

    /// Format the result of a connectivity check
    pub fn format_check(results: &CouncilResponseSet) -> String {
        let mut output = String::new();
        output.push_str(&Self::section_header("Backend check"));

        for entry in results.iter() {
            match &entry.result {
                BackendResult::Success { content, .. } => {
                    output.push_str(&format!(
                        "{} {}: {}\n",
                        "v".green(),
                        entry.model,
                        Self::preview(content, 60)
                    ));
                }
                BackendResult::Failure { reason } => {
                    output.push_str(&format!("{} {}: {}\n", "x".red(), entry.model, reason.red()));
                }
            }
        }

        output.push_str(&format!(
            "\n{} of {} backends reachable\n",
            results.success_count(),
            results.len()
        ));
        output
    }

    fn stages(stage1: &Value, stage2: &Value, stage3: &Value) -> String {
        let mut output = String::new();

        // Stage 1
        output.push_str(&Self::section_header("Stage 1: Individual Responses"));
        match serde_json::from_value::<CouncilResponseSet>(stage1.clone()) {
            Ok(responses) => {
                for entry in responses.iter() {
                    match &entry.result {
                        BackendResult::Success { content, .. } => output.push_str(&format!(
                            "\n{}\n{}\n",
                            format!("── {} ──", entry.model).yellow().bold(),
                            content
                        )),
                        BackendResult::Failure { reason } => output.push_str(&format!(
                            "\n{}\nError: {}\n",
                            format!("── {} ──", entry.model).red().bold(),
                            reason
                        )),
                    }
                }
            }
            Err(_) => output.push_str(&Self::raw(stage1)),
        }

        // Stage 2
        match serde_json::from_value::<RankingOutcome>(stage2.clone()) {
            Ok(outcome) if !outcome.rankings.is_empty() => {
                output.push_str(&Self::section_header("Stage 2: Peer Rankings"));
                for ranking in &outcome.rankings {
                    let order = if ranking.parsed_ranking.is_empty() {
                        "(unparsed)".to_string()
                    } else {
                        ranking.parsed_ranking.join(" > ")
                    };
                    output.push_str(&format!(
                        "  {} {}\n",
                        format!("{}:", ranking.model).yellow(),
                        order
                    ));
                }
                if !outcome.aggregate_rankings.is_empty() {
                    output.push_str(&format!("\n{}\n", "Aggregate:".cyan().bold()));
                    for (position, rank) in outcome.aggregate_rankings.iter().enumerate() {
                        output.push_str(&format!(
                            "  {}. {} (avg {:.2}, {} votes)\n",
                            position + 1,
                            rank.model,
                            rank.average_rank,
                            rank.rankings_count
                        ));
                    }
                }
            }
            Ok(_) => {}
            Err(_) if stage2.is_null() => {}
            Err(_) => {
                output.push_str(&Self::section_header("Stage 2: Peer Rankings"));
                output.push_str(&Self::raw(stage2));
            }
        }

        // Stage 3
        output.push_str(&Self::section_header("Stage 3: Final Synthesis"));
        if let Ok(synthesis) = serde_json::from_value::<Synthesis>(stage3.clone()) {
            output.push_str(&format!(
                "\n{}\n",
                format!("Chairman: {}", synthesis.model).yellow().bold()
            ));
        }
        output.push('\n');
        output.push_str(&Self::synthesis_text(stage3));
        output.push('\n');

        output
    }

    /// The chairman's answer, or why there is none
    fn synthesis_text(stage3: &Value) -> String {
        match serde_json::from_value::<Synthesis>(stage3.clone()) {
            Ok(Synthesis {
                result: BackendResult::Success { content, .. },
                ..
            }) => content,
            Ok(Synthesis {
                result: BackendResult::Failure { reason },
                ..
            }) => format!("{} {}", "Synthesis failed:".red().bold(), reason),
            Err(_) => Self::raw(stage3),
        }
    }

    fn raw(value: &Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_default()
    }

    fn preview(text: &str, max: usize) -> String {
        let line = text.lines().next().unwrap_or("").trim();
        if line.chars().count() > max {
            format!("{}...", line.chars().take(max).collect::<String>())
        } else {
            line.to_string()
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, turn: &CouncilTurn) -> String {
        Self::format(turn)
    }

    fn format_json(&self, turn: &CouncilTurn) -> String {
        Self::format_json(turn)
    }

    fn format_synthesis_only(&self, turn: &CouncilTurn) -> String {
        Self::format_synthesis_only(turn)
    }
}
