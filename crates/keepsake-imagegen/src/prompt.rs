/// Fill the `{count}` placeholder of a prompt template
///
/// `count` is the number of reference images the user supplied, which
/// can exceed the number actually forwarded to the provider.
pub fn render_prompt(template: &str, count: usize) -> String {
    template.replace("{count}", &count.to_string())
}
