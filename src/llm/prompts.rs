//! Prompt construction for answer generation

/// Build the JSON-only answer prompt from a query and assembled context
pub fn answer_prompt(query: &str, context: &str) -> String {
    format!(
        r"Context:
{context}

User question: {query}

Using ONLY the information in Context, return a JSON object with keys:
  - best_product_id: (integer or null),
  - reasons: (list of why you think is the best match),
  - top_candidates: (list of objects {{product_id:int, score:float}})

Return JSON ONLY. No extra commentary.
"
    )
}
