/// Renders an account credential safe for logs, labels, and exports.
///
/// Keeps the first and last four characters of long secrets; anything too
/// short to mask meaningfully is replaced outright.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
