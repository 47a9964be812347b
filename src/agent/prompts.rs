//! Prompt templates for the text-generation collaborator.
//!
//! Judgment prompts constrain the output space to a single label; the
//! callers parse strictly and treat anything else as a negative verdict.

use crate::search::Document;

/// System framing for meeting-match answer generation.
pub const GENERATE_SYSTEM: &str = "You recommend existing meetings to a user who wants to create \
     a similar one. Reply with JSON only, no prose around it.";

/// Build the answer-generation prompt from the request fields and the
/// retrieved candidate set.
pub fn generate_answer(request_summary: &str, candidates: &[Document]) -> String {
    let mut block = String::new();
    for (i, doc) in candidates.iter().enumerate() {
        let id = doc.meta_str("id").unwrap_or("unknown");
        let title = doc.meta_str("title").unwrap_or("untitled");
        block.push_str(&format!(
            "Candidate {n} (id: {id}, title: {title}):\n{content}\n\n",
            n = i + 1,
            content = doc.content,
        ));
    }

    format!(
        "The user wants to create this meeting:\n{request_summary}\n\n\
         Similar existing meetings:\n{block}\
         Produce a JSON object of the exact shape \
         {{\"summary\": string, \"recommendations\": [{{\"id\": string, \"title\": string}}]}}. \
         The summary is one or two sentences comparing the user's idea to the candidates. \
         Only list candidates that genuinely overlap with the user's idea."
    )
}

/// Binary helpfulness judgment over a generated answer.
pub fn judge_helpfulness(request_summary: &str, answer_json: &str) -> String {
    format!(
        "A user described this meeting idea:\n{request_summary}\n\n\
         An assistant produced this answer:\n{answer_json}\n\n\
         Is the answer helpful for the user, meaning it points at genuinely similar \
         existing meetings? Reply with exactly one word: helpful or unhelpful."
    )
}

/// Ask for a substantively different retrieval query.
pub fn rewrite_query(query: &str) -> String {
    format!(
        "The search query below found nothing useful:\n{query}\n\n\
         Write one replacement query that approaches the same topic from a \
         different angle, with different keywords. Reply with the query text \
         only, no quotes or explanation."
    )
}

/// Closed-label classification of a raw request payload.
pub fn route(payload_preview: &str, labels: &[&str]) -> String {
    format!(
        "Classify the following request payload into exactly one of these labels: \
         {labels}.\n\nPayload:\n{payload_preview}\n\n\
         Reply with the label only, nothing else.",
        labels = labels.join(", "),
    )
}

/// Summarize a normalized survey profile into a couple of sentences.
pub fn profile_summary(profile_json: &str) -> String {
    format!(
        "Summarize this normalized user profile in two or three sentences, \
         focusing on interests, energy, social preference and constraints. \
         Values are 0 to 1.\n\n{profile_json}"
    )
}

/// Context handed to the image-analysis collaborator.
pub fn photo_context(profile_summary: &str) -> String {
    format!(
        "These photos come from a user with this profile: {profile_summary} \
         Describe what the photos suggest about activities or hobbies the user \
         already enjoys, in a short paragraph."
    )
}

/// Compose the final hobby message around the scored recommendations.
pub fn hobby_message(
    profile_summary: &str,
    photo_insight: Option<&str>,
    recommendations_json: &str,
) -> String {
    let photo_block = match photo_insight {
        Some(insight) => format!("What their photos suggest:\n{insight}\n\n"),
        None => String::new(),
    };
    format!(
        "User profile:\n{profile_summary}\n\n{photo_block}\
         Ranked hobby recommendations (with reasons):\n{recommendations_json}\n\n\
         Write a warm, concrete message presenting these recommendations to the \
         user. Keep the ranking order and mention each reason briefly."
    )
}

/// A plain general-interest question outside the other pipelines.
pub fn general_search(query: &str) -> String {
    format!(
        "Answer the following question concisely and factually. If you are not \
         sure, say so.\n\n{query}"
    )
}
