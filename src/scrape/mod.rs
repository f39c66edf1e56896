//! Fetches a page's rendered text through a reader proxy and builds the
//! extraction prompt around it.

use std::time::Duration;

use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct Scraper {
    reader_base_url: String,
    client: reqwest::Client,
}

impl Scraper {
    pub fn new(reader_base_url: String) -> Self {
        Self {
            reader_base_url: reader_base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the rendered text of `url` via the reader proxy.
    ///
    /// The proxy takes the target URL as its path, so the target is passed
    /// through as-is apart from percent-encoding unsafe characters.
    pub async fn fetch_rendered(&self, url: &str, timeout: Duration) -> Result<String, ApiError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ApiError::BadRequest(format!(
                "URL must be absolute (http/https): {}",
                url
            )));
        }

        let proxied = format!(
            "{}/{}",
            self.reader_base_url,
            urlencoding::encode(url).replace("%2F", "/").replace("%3A", ":")
        );

        let res = self
            .client
            .get(&proxied)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| ApiError::Internal(format!("Failed to fetch {}: {}", url, err)))?;

        if !res.status().is_success() {
            return Err(ApiError::Internal(format!(
                "Reader proxy returned {} for {}",
                res.status(),
                url
            )));
        }

        let body = res.text().await.map_err(ApiError::internal)?;
        Ok(strip_html_tags(&body))
    }
}

/// Prompt that constrains the LLM to extract-only answers over the
/// scraped content, in markdown, with a closing summary section.
pub fn extraction_prompt(scraped_content: &str, question: &str) -> String {
    format!(
        r#"Website Scraped Content:
{scraped_content}

Based on the scraped content, answer the following question and provide answers following these guidelines:
1. **Extract Information:** Only extract the information that directly matches the provided scraped content.
2. **No Extra Content:** Do not include any additional text, comments, or explanations in your response.
3. **Empty Response:** If no information matches the description, return an empty string ('').
4. **Direct Data Only:** Your output should contain only the data that is explicitly requested, with no other text.
5. **Markdown Format:** Format your response in well-structured markdown without using code blocks.
6. **Rendering:** Ensure tables and lists are properly formatted for rendering in markdown.
7. **Summary:** Provide a summary of the extracted information in the response at the end with the title of summary.

question: {question}
"#
    )
}

/// Drop tags plus script/style bodies, keep the visible text.
pub fn strip_html_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;

    let chars: Vec<char> = html.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        if !in_script && starts_with_at(&chars, i, "<script") {
            in_script = true;
        }
        if !in_style && starts_with_at(&chars, i, "<style") {
            in_style = true;
        }
        if in_script && starts_with_at(&chars, i, "</script>") {
            in_script = false;
            i += "</script>".len();
            continue;
        }
        if in_style && starts_with_at(&chars, i, "</style>") {
            in_style = false;
            i += "</style>".len();
            continue;
        }

        if in_script || in_style {
            i += 1;
            continue;
        }

        let c = chars[i];
        if c == '<' {
            in_tag = true;
        } else if c == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(c);
        }
        i += 1;
    }

    let lines: Vec<&str> = result
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

/// Case-insensitive match of an ASCII needle at a char position.
///
/// Compares per position rather than against a pre-lowered copy of the
/// input: lowercasing can change the char count (e.g. `İ`), which would
/// shift every index after it.
fn starts_with_at(haystack: &[char], at: usize, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    if at + needle.len() > haystack.len() {
        return false;
    }
    haystack[at..]
        .iter()
        .zip(needle.iter())
        .all(|(h, n)| h.to_ascii_lowercase() == *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_script_bodies() {
        let html = r#"
            <html>
            <head><script>var x = 1;</script><style>.a { color: red; }</style></head>
            <body><h1>Rooftop Solar</h1><p>Subsidy portal</p></body>
            </html>
        "#;

        let text = strip_html_tags(html);
        assert!(text.contains("Rooftop Solar"));
        assert!(text.contains("Subsidy portal"));
        assert!(!text.contains('<'));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn extraction_prompt_embeds_content_and_question() {
        let prompt = extraction_prompt("scraped body", "What is the tariff?");
        assert!(prompt.contains("scraped body"));
        assert!(prompt.contains("question: What is the tariff?"));
        assert!(prompt.contains("**Summary:**"));
    }

    #[test]
    fn strips_tags_after_case_shifting_unicode() {
        // `İ` lowercases to two chars; per-position matching must not
        // let later tags slip through.
        let html = "<p>İstanbul <SCRIPT>var y = 2;</SCRIPT><B>rooftop</B></p>";
        let text = strip_html_tags(html);
        assert!(text.contains("İstanbul"));
        assert!(text.contains("rooftop"));
        assert!(!text.contains('<'));
        assert!(!text.contains("var y"));
    }

    #[tokio::test]
    async fn rejects_non_http_and_relative_urls() {
        let scraper = Scraper::new("https://r.jina.ai".to_string());

        for url in ["ftp://example.com", "example.com/page"] {
            let err = scraper
                .fetch_rendered(url, Duration::from_secs(5))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "url: {}", url);
        }
    }
}
