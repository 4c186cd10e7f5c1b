//! Prompt templates for the ranking and synthesis stages

use crate::council::ranking::FINAL_RANKING_HEADER;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt asking a council member to rank anonymized responses
    pub fn ranking_prompt(question: &str, responses: &[(String, String)]) -> String {
        let mut prompt = format!(
            r#"You are evaluating different responses to the following question:

Question: {}

Here are the responses from different models (anonymized):
"#,
            question
        );

        for (label, content) in responses {
            prompt.push_str(&format!("\n{}:\n{}\n", label, content));
        }

        prompt.push_str(&format!(
            r#"
Your task:
1. Evaluate each response individually. Explain what it does well and what it does poorly.
2. Then, at the very end of your answer, provide a final ranking.

The final ranking MUST be formatted exactly like this:
- Start with the line "{header}" (all caps, with colon)
- Then list the responses from best to worst as a numbered list
- Each line is: number, period, space, then ONLY the response label (e.g. "1. Response A")
- Do not add any other text after the ranking

Example of the required format for the ending of your answer:

{header}
1. Response C
2. Response A
3. Response B"#,
            header = FINAL_RANKING_HEADER
        ));

        prompt
    }

    /// Prompt asking the chairman to synthesize the final answer
    pub fn synthesis_prompt(
        question: &str,
        responses: &[(String, String)],
        rankings: &[(String, String)],
    ) -> String {
        let mut prompt = format!(
            r#"You are the Chairman of an LLM Council. Multiple AI models have provided responses to a user's question, and then ranked each other's responses.

Original question: {}

STAGE 1 - Individual responses:
"#,
            question
        );

        for (model, content) in responses {
            prompt.push_str(&format!("\nModel: {}\nResponse: {}\n", model, content));
        }

        if !rankings.is_empty() {
            prompt.push_str("\nSTAGE 2 - Peer rankings:\n");
            for (model, ranking) in rankings {
                prompt.push_str(&format!("\nModel: {}\nRanking: {}\n", model, ranking));
            }
        }

        prompt.push_str(
            r#"
Your task as Chairman is to synthesize all of this information into a single, comprehensive, accurate answer to the user's original question. Consider the individual responses, the peer rankings and what they reveal about response quality, and any patterns of agreement or disagreement.

Provide a clear, well-reasoned final answer that represents the council's collective wisdom."#,
        );

        prompt
    }
}
