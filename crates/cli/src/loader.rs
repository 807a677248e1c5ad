use std::path::Path;

use scatter_core::{LoadResult, ScatterError};

/// Read distributions from a JSON array or a JSON-lines file.
pub fn read_load_results(path: &Path) -> Result<Vec<LoadResult>, ScatterError> {
    let text = std::fs::read_to_string(path)?;
    parse_load_results(&text)
}

pub fn parse_load_results(text: &str) -> Result<Vec<LoadResult>, ScatterError> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| ScatterError::Serialize(format!("line {}: {}", idx + 1, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_array() {
        let text = r#"[
            {"pid": "a", "points": [[1, 2], [3, 4]]},
            {"pid": "b", "points": []}
        ]"#;
        let results = parse_load_results(text).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].points[1].y, 4.0);
        assert!(results[1].is_empty());
    }

    #[test]
    fn parses_json_lines() {
        let text = concat!(
            "{\"pid\": \"a\", \"points\": [[0.5, 0.5]]}\n",
            "\n",
            "{\"pid\": \"b\", \"points\": []}\n",
        );
        let results = parse_load_results(text).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].pid, "b");
    }

    #[test]
    fn reports_bad_line() {
        let text = "{\"pid\": \"a\", \"points\": []}\n{\"pid\": 3}\n";
        let err = parse_load_results(text).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
