//! Parse raw response header lines collected from libcurl.

/// Parse header lines into `(name, value)` pairs for the final response only.
///
/// libcurl reports headers of every response it sees (interim `100 Continue`,
/// redirects); a new status line resets what was collected so far.
pub fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}
