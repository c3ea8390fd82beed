//! Prompt for retrieval-augmented answers.

/// Reply the prompt asks for when the context lacks the answer.
pub const NOT_FOUND_IN_CONTEXT: &str = "Not found in context.";

const RISK_ANALYST_TEMPLATE: &str = "You are a senior financial risk analyst.
Use the following context (10-K disclosure) to answer the question.

Context:
{context}

Question:
{question}

Answer:
- Be concise but precise
- Highlight key risk terms
- If relevant, reference specific regulatory issues (e.g., SOX, SEC 229, Basel)
- If the answer is not found in the context, say \"{not_found}\"";

/// Render the risk-analyst prompt for a context block and question.
pub fn risk_analyst_prompt(context: &str, question: &str) -> String {
    render(
        RISK_ANALYST_TEMPLATE,
        &[
            ("context", context),
            ("question", question.trim()),
            ("not_found", NOT_FOUND_IN_CONTEXT),
        ],
    )
}

/// Fill `{name}` slots in one pass over `template`.
///
/// Substituted values are copied verbatim and never scanned again, so
/// braces inside a question or context stay literal. Unknown slots are kept.
pub(crate) fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after
            .find('}')
            .and_then(|close| {
                let name = &after[..close];
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value, close))
            });

        match slot {
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
