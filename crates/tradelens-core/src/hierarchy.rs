//! Classification-code hierarchy lookups.

use std::collections::BTreeMap;

use crate::data_source::{TradeDataSource, TradeSourceError};
use crate::resolution::ResolutionError;
use crate::{CodeNode, HsCode};

/// Immediate children of `code`, keyed by child code.
///
/// Terminal codes (six digits or more) have no children by definition and
/// are answered without contacting the classification service. For shorter
/// codes the service's child set is returned unmodified.
///
/// # Errors
///
/// Propagates the service failure, including "code not found".
pub async fn resolve_children(
    source: &dyn TradeDataSource,
    code: &HsCode,
) -> Result<BTreeMap<HsCode, String>, TradeSourceError> {
    if code.is_terminal() {
        tracing::debug!(%code, "terminal code; skipping children lookup");
        return Ok(BTreeMap::new());
    }
    source.children_codes(code).await
}

/// Description and immediate children of `code`, for the lookup panel.
pub async fn lookup_code(
    source: &dyn TradeDataSource,
    code: &HsCode,
) -> Result<CodeNode, ResolutionError> {
    let description = source
        .product(code)
        .await
        .map_err(|error| ResolutionError::product(code, error))?;
    let children = resolve_children(source, code)
        .await
        .map_err(|error| ResolutionError::product(code, error))?;

    Ok(CodeNode {
        code: code.clone(),
        description,
        children,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::data_source::{CodeMatch, FetchRequest, SearchRequest, SourceFuture};
    use crate::{Country, RawRecord};

    #[derive(Default)]
    struct Chapters {
        children_calls: AtomicUsize,
    }

    impl TradeDataSource for Chapters {
        fn exports_on_period<'a>(&'a self, _: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn imports_on_period<'a>(&'a self, _: &'a FetchRequest) -> SourceFuture<'a, Vec<RawRecord>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn product<'a>(&'a self, code: &'a HsCode) -> SourceFuture<'a, String> {
            Box::pin(async move {
                match code.as_str() {
                    "08" => Ok(String::from("EDIBLE FRUIT AND NUTS")),
                    "080440" => Ok(String::from("AVOCADOS, FRESH OR DRIED")),
                    other => Err(TradeSourceError::not_found(format!("unknown code {other}"))),
                }
            })
        }

        fn children_codes<'a>(&'a self, code: &'a HsCode) -> SourceFuture<'a, BTreeMap<HsCode, String>> {
            self.children_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                let mut children = BTreeMap::new();
                if code.as_str() == "08" {
                    children.insert(HsCode::parse("0804").expect("code"), String::from("DATES, FIGS"));
                    children.insert(HsCode::parse("0805").expect("code"), String::from("CITRUS FRUIT"));
                }
                Ok(children)
            })
        }

        fn country_by_name<'a>(&'a self, _: &'a str) -> SourceFuture<'a, Country> {
            Box::pin(async { Err(TradeSourceError::not_found("none")) })
        }

        fn country_by_code<'a>(&'a self, _: &'a str) -> SourceFuture<'a, Country> {
            Box::pin(async { Err(TradeSourceError::not_found("none")) })
        }

        fn country_by_iso2<'a>(&'a self, _: &'a str) -> SourceFuture<'a, Country> {
            Box::pin(async { Err(TradeSourceError::not_found("none")) })
        }

        fn search_for_code<'a>(&'a self, _: &'a SearchRequest) -> SourceFuture<'a, Vec<CodeMatch>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    fn code(value: &str) -> HsCode {
        HsCode::parse(value).expect("code")
    }

    #[tokio::test]
    async fn terminal_codes_never_reach_the_service() {
        let source = Chapters::default();
        for value in ["080440", "08044000", "0804400010"] {
            let children = resolve_children(&source, &code(value)).await.expect("children");
            assert!(children.is_empty());
        }
        assert_eq!(source.children_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn short_codes_return_the_service_child_set() {
        let source = Chapters::default();
        let children = resolve_children(&source, &code("08")).await.expect("children");

        assert_eq!(children.len(), 2);
        assert_eq!(children.get(&code("0805")).map(String::as_str), Some("CITRUS FRUIT"));
        assert_eq!(source.children_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_builds_a_code_node() {
        let source = Chapters::default();
        let node = lookup_code(&source, &code("08")).await.expect("node");
        assert_eq!(node.description, "EDIBLE FRUIT AND NUTS");
        assert!(!node.is_leaf());

        let leaf = lookup_code(&source, &code("080440")).await.expect("leaf");
        assert!(leaf.is_leaf());
    }

    #[tokio::test]
    async fn unknown_code_is_a_product_resolution_error() {
        let source = Chapters::default();
        let error = lookup_code(&source, &code("99")).await.expect_err("unknown");

        assert!(matches!(error, ResolutionError::Product { .. }));
        assert!(error.is_input_error());
        assert_eq!(source.children_calls.load(Ordering::SeqCst), 0);
    }
}
