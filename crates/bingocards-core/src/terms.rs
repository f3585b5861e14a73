// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parsing the raw term list.

/// Split raw text into the term pool: one term per line, trimmed, with blank
/// lines dropped. Order is preserved and duplicates are kept.
pub fn parse_terms(raw: &str) -> Vec<String> {
    raw.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The number of terms `parse_terms` would return, without allocating them.
pub fn count_terms(raw: &str) -> usize {
    raw.split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        assert!(parse_terms("").is_empty());
        assert_eq!(count_terms(""), 0);
    }

    #[test]
    fn test_whitespace_string() {
        assert!(parse_terms("\n  \n\t\n").is_empty());
    }

    #[test]
    fn test_trims_and_keeps_order() {
        let terms = parse_terms("  Synergy \nDeep Dive\n\n\tTouch Base\n");
        assert_eq!(terms, vec!["Synergy", "Deep Dive", "Touch Base"]);
    }

    #[test]
    fn test_keeps_duplicates() {
        let terms = parse_terms("a\nb\na");
        assert_eq!(terms, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_windows_and_old_mac_line_breaks() {
        let terms = parse_terms("one\r\ntwo\rthree\n");
        assert_eq!(terms, vec!["one", "two", "three"]);
        assert!(
            terms
                .iter()
                .all(|t| !t.contains('\n') && !t.contains('\r'))
        );
    }

    #[test]
    fn test_inner_whitespace_preserved() {
        let terms = parse_terms("Think  Outside the Box");
        assert_eq!(terms, vec!["Think  Outside the Box"]);
    }

    #[test]
    fn test_count_matches_parse() {
        let raw = "a\n\n b \r\nc\r\n\r\n";
        assert_eq!(count_terms(raw), parse_terms(raw).len());
    }
}
