//! Page-range expressions.
//!
//! Grammar: comma-separated tokens, each either a single 1-based page number
//! or an inclusive `start-end` range. The parsed result is a deduplicated,
//! ascending set of 0-based page indices filtered to `[0, page_count)`.
//!
//! Tokens that fall outside the document are dropped silently under the
//! default lenient policy; strict mode turns them into a validation error.
//! Malformed tokens (non-numeric, inverted ranges) are always errors.

use std::collections::BTreeSet;

use crate::error::{TransformError, TransformResult};

/// Parse a page-range expression against a document's page count.
///
/// # Errors
///
/// Returns [`TransformError::InvalidParameter`] for malformed tokens (and,
/// in strict mode, for tokens outside the document), and
/// [`TransformError::NoPagesSelected`] when the filtered set is empty.
pub fn parse_page_range(
    expression: &str,
    page_count: usize,
    strict: bool,
) -> TransformResult<Vec<usize>> {
    let mut selected = BTreeSet::new();
    let mut dropped = false;

    for token in expression.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(TransformError::parameter_value(
                "pages",
                "empty_token",
                expression,
            ));
        }

        let (start, end) = match token.split_once('-') {
            Some((lo, hi)) => (parse_page_number(lo, expression)?, parse_page_number(hi, expression)?),
            None => {
                let page = parse_page_number(token, expression)?;
                (page, page)
            }
        };

        if start > end {
            return Err(TransformError::parameter_value(
                "pages",
                "inverted_range",
                token,
            ));
        }

        for page in start..=end {
            // 1-based page N is index N-1.
            let index = page - 1;
            if index < page_count {
                selected.insert(index);
            } else {
                dropped = true;
            }
        }
    }

    if strict && dropped {
        return Err(TransformError::parameter_value(
            "pages",
            "page_out_of_range",
            expression,
        ));
    }
    if selected.is_empty() {
        return Err(TransformError::NoPagesSelected);
    }
    Ok(selected.into_iter().collect())
}

fn parse_page_number(token: &str, expression: &str) -> TransformResult<usize> {
    let page: usize = token
        .trim()
        .parse()
        .map_err(|_| TransformError::parameter_value("pages", "not_a_number", expression))?;
    if page == 0 {
        return Err(TransformError::parameter_value(
            "pages",
            "pages_are_one_based",
            expression,
        ));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_tokens_produce_sorted_zero_based_set() -> TransformResult<()> {
        assert_eq!(parse_page_range("1-3,5", 5, false)?, vec![0, 1, 2, 4]);
        Ok(())
    }

    #[test]
    fn degenerate_range_selects_one_page() -> TransformResult<()> {
        assert_eq!(parse_page_range("2-2", 10, false)?, vec![1]);
        Ok(())
    }

    #[test]
    fn fully_filtered_expression_selects_nothing() {
        assert!(matches!(
            parse_page_range("10", 5, false),
            Err(TransformError::NoPagesSelected)
        ));
    }

    #[test]
    fn out_of_range_tokens_are_dropped_leniently() -> TransformResult<()> {
        assert_eq!(parse_page_range("1,9", 3, false)?, vec![0]);
        Ok(())
    }

    #[test]
    fn strict_mode_rejects_out_of_range_tokens() {
        assert!(matches!(
            parse_page_range("1,9", 3, true),
            Err(TransformError::InvalidParameter { reason: "page_out_of_range", .. })
        ));
    }

    #[test]
    fn duplicates_and_overlaps_collapse() -> TransformResult<()> {
        assert_eq!(parse_page_range("1,1-2,2", 5, false)?, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn malformed_tokens_always_fail() {
        assert!(parse_page_range("a", 5, false).is_err());
        assert!(parse_page_range("3-1", 5, false).is_err());
        assert!(parse_page_range("", 5, false).is_err());
        assert!(parse_page_range("0", 5, false).is_err());
        assert!(parse_page_range("1,,2", 5, false).is_err());
    }

    #[test]
    fn whitespace_around_tokens_is_tolerated() -> TransformResult<()> {
        assert_eq!(parse_page_range(" 1 , 3 - 4 ", 5, false)?, vec![0, 2, 3]);
        Ok(())
    }
}
