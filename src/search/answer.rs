//! Answer synthesis from ranked decisions.

use std::fmt::Write as _;

use super::ranker::SearchResult;

/// Build the prompt asking for a short answer grounded in `results`.
#[must_use]
pub fn build_answer_prompt(query: &str, results: &[SearchResult]) -> String {
    let mut prompt = String::from(
        "You answer questions about a software project using its recorded technical decisions.\n\
         Use only the decisions below. Answer in at most three sentences and cite decisions by \
         their number. If the decisions do not answer the question, say so.\n\n",
    );

    let _ = writeln!(prompt, "Question: {}\n", query.trim());
    prompt.push_str("Decisions:\n");

    for (i, result) in results.iter().enumerate() {
        let d = &result.decision;
        let _ = writeln!(prompt, "[{}] {} (relevance {:.2})", i + 1, d.title, result.score);
        if let Some(description) = d.description.as_deref().filter(|s| !s.trim().is_empty()) {
            let _ = writeln!(prompt, "{description}");
        }
        if let Some(reason) = d.reason.as_deref().filter(|s| !s.trim().is_empty()) {
            let _ = writeln!(prompt, "Reason: {reason}");
        }
        if let Some(consequences) = d.consequences.as_deref().filter(|s| !s.trim().is_empty()) {
            let _ = writeln!(prompt, "Consequences: {consequences}");
        }
        prompt.push('\n');
    }

    prompt.push_str("Answer:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Decision;

    #[test]
    fn test_prompt_lists_results_in_order() {
        let results = vec![
            SearchResult {
                decision: Decision::new("p", "Use Redis", None, Some("Low latency".into()), None),
                score: 0.91,
                snippet: None,
            },
            SearchResult {
                decision: Decision::new("p", "Use Kafka", Some("Event log".into()), None, None),
                score: 0.52,
                snippet: None,
            },
        ];

        let prompt = build_answer_prompt("  why redis? ", &results);
        assert!(prompt.contains("Question: why redis?\n"));
        let first = prompt.find("[1] Use Redis (relevance 0.91)").unwrap();
        let second = prompt.find("[2] Use Kafka (relevance 0.52)").unwrap();
        assert!(first < second);
        assert!(prompt.contains("Reason: Low latency"));
        assert!(prompt.ends_with("Answer:"));
    }
}
