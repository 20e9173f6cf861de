//! Builds the instruction text sent to a provider.

/// Wraps the user's request, and any selected source, in the fixed
/// instruction template.
///
/// A non-empty `selection` is appended as `"<prompt>:\n\n<fenced selection>"`.
pub fn build(prompt: &str, selection: Option<&str>, language_tag: &str) -> String {
    let request = match selection {
        Some(selected) if !selected.is_empty() => {
            format!("{}:\n\n{}", prompt, fence(selected, language_tag))
        }
        _ => prompt.to_string(),
    };

    format!(
        "You are an expert programming assistant embedded in a code editor.\n\
         The user is working in a file whose language is \"{language}\".\n\
         Respond ONLY with the code or shell command that fulfils the request.\n\
         Do not include explanations, comments about your answer, or any other prose.\n\
         Do not wrap your response in markdown code fences.\n\
         \n\
         Request: {request}",
        language = language_tag,
        request = request,
    )
}

/// Fences `code` with enough backticks that nothing inside can close it early.
fn fence(code: &str, language_tag: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in code.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let marker = "`".repeat((longest + 1).max(3));
    format!("{marker}{language_tag}\n{code}\n{marker}")
}
