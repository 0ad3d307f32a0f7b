use ai_client::util::truncate_chars;
use serpscope_common::EnrichedResult;

/// Characters of each page's text embedded in the prompt.
const PROMPT_CONTENT_CHARS: usize = 1500;

const NO_CONTENT: &str = "No content available.";
const NO_SUMMARY: &str = "none";

/// Render the per-site context block: `[Site N]` label, title, URL and a
/// bounded slice of the scraped text.
pub fn site_context(results: &[EnrichedResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let content = r
                .content
                .as_deref()
                .map(|c| truncate_chars(c, PROMPT_CONTENT_CHARS))
                .filter(|c| !c.is_empty())
                .unwrap_or(NO_CONTENT);
            format!(
                "[Site {}] Title: {}\nURL: {}\nContent: {}",
                i + 1,
                r.result.title,
                r.result.link,
                content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the analysis prompt for one topic.
pub fn build_prompt(topic: &str, summary: Option<&str>, results: &[EnrichedResult]) -> String {
    let summary = summary.filter(|s| !s.trim().is_empty()).unwrap_or(NO_SUMMARY);
    format!(
        r#"You are an expert agent in SEO and content marketing.
Based on the theme provided by the user, analyze the top {count} Google search results and the AI overview (if any), then extract the following:

1. **Target audience**: which users these pages are written for
2. **Search intent**: what searchers want to learn
3. **Key terms**: co-occurring words and frequently recurring elements
4. **Structure hints**: structural traits shared by the top pages
5. **Winning logic**: why these pages rank at the top; infer the pattern that wins

Write every value in the language of the theme.

## Input
Theme: {topic}
AI Overview: {summary}
Top sites:
{sites}

## Response format
Respond with a single JSON object with exactly these keys:
{{
  "title": "report title",
  "target": "description of the target audience",
  "intent": "description of the search intent",
  "keywords": "keyword 1, keyword 2, ...",
  "logic": "winning logic (conclusion)",
  "content": "detailed analysis report (markdown)",
  "links": "list of the URLs you referred to"
}}
"#,
        count = results.len(),
        topic = topic,
        summary = summary,
        sites = site_context(results),
    )
}
